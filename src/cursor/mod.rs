//! Cursor module
//!
//! Opaque pagination tokens identifying the document that anchors a page
//! boundary.
//!
//! # Overview
//!
//! - `Cursor` - the decoded tuple of sort values plus the side it was issued for
//! - `CursorCodec` - encode/decode interface, swappable per request
//! - `Base64JsonCodec` - default versioned `v1.<base64url(json)>` token format
//!
//! A token only decodes against the sort plan it was produced with; any
//! difference in field count, paths or directions is reported as
//! `Error::CursorSchemaMismatch`.

mod codec;

pub use codec::{Base64JsonCodec, Cursor, CursorCodec, MAX_TOKEN_LEN, TOKEN_VERSION};
