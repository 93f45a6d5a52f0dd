//! Cursor type and token codecs

use crate::error::{Error, Result};
use crate::sort::SortPlan;
use crate::types::{CursorDirection, Document, JsonValue};
use crate::value::{extract_sort_value, SortValue};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Version tag prefixed to every token
pub const TOKEN_VERSION: &str = "v1";

/// Upper bound on accepted token length
pub const MAX_TOKEN_LEN: usize = 8 * 1024;

// ============================================================================
// Cursor
// ============================================================================

/// Decoded pagination anchor
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    /// Side of the page boundary the cursor was issued for
    pub direction: CursorDirection,
    /// Sort values in plan order
    pub values: Vec<SortValue>,
}

impl Cursor {
    /// Create a cursor from raw values
    pub fn new(direction: CursorDirection, values: Vec<SortValue>) -> Self {
        Self { direction, values }
    }

    /// Take the plan's sort values from a document
    pub fn from_document(
        plan: &SortPlan,
        document: &Document,
        direction: CursorDirection,
    ) -> Result<Self> {
        let values = plan
            .fields()
            .iter()
            .map(|field| extract_sort_value(document, &field.path))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(direction, values))
    }
}

// ============================================================================
// Codec Trait
// ============================================================================

/// Encodes cursors to opaque tokens and back
pub trait CursorCodec: Send + Sync {
    /// Encode a cursor produced under `plan`
    fn encode(&self, plan: &SortPlan, cursor: &Cursor) -> Result<String>;

    /// Decode a token, rejecting tokens produced under a different plan
    fn decode(&self, plan: &SortPlan, token: &str) -> Result<Cursor>;

    /// Encode the anchor taken from `document`
    fn encode_document(
        &self,
        plan: &SortPlan,
        document: &Document,
        direction: CursorDirection,
    ) -> Result<String> {
        let cursor = Cursor::from_document(plan, document, direction)?;
        self.encode(plan, &cursor)
    }
}

// ============================================================================
// Base64 JSON Codec
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    #[serde(rename = "d")]
    direction: CursorDirection,
    #[serde(rename = "k")]
    keys: Vec<String>,
    #[serde(rename = "v")]
    values: Vec<JsonValue>,
}

/// Default codec: `v1.` followed by unpadded base64url of a JSON payload
///
/// Values are written as canonical extended JSON so their BSON types survive
/// the round trip. The payload carries the plan signature so that tokens from
/// another plan are detected rather than misapplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64JsonCodec;

impl Base64JsonCodec {
    /// Create the codec
    pub fn new() -> Self {
        Self
    }
}

impl CursorCodec for Base64JsonCodec {
    fn encode(&self, plan: &SortPlan, cursor: &Cursor) -> Result<String> {
        if cursor.values.len() != plan.len() {
            return Err(Error::CursorSchemaMismatch {
                expected: plan.signature().join(", "),
                actual: format!("{} values", cursor.values.len()),
            });
        }

        let payload = TokenPayload {
            direction: cursor.direction,
            keys: plan.signature(),
            values: cursor.values.iter().map(SortValue::to_extjson).collect(),
        };
        let bytes = serde_json::to_vec(&payload)?;
        Ok(format!("{TOKEN_VERSION}.{}", URL_SAFE_NO_PAD.encode(bytes)))
    }

    fn decode(&self, plan: &SortPlan, token: &str) -> Result<Cursor> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::invalid_cursor("token is empty"));
        }
        if token.len() > MAX_TOKEN_LEN {
            return Err(Error::invalid_cursor(format!(
                "token exceeds {MAX_TOKEN_LEN} bytes"
            )));
        }

        let (version, body) = token
            .split_once('.')
            .ok_or_else(|| Error::invalid_cursor("missing version tag"))?;
        if version != TOKEN_VERSION {
            return Err(Error::invalid_cursor(format!(
                "unsupported token version '{version}'"
            )));
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|e| Error::invalid_cursor(format!("bad encoding: {e}")))?;
        let payload: TokenPayload = serde_json::from_slice(&bytes)
            .map_err(|e| Error::invalid_cursor(format!("bad payload: {e}")))?;

        let expected = plan.signature();
        if payload.keys != expected {
            return Err(Error::schema_mismatch(&expected, &payload.keys));
        }
        if payload.values.len() != payload.keys.len() {
            return Err(Error::invalid_cursor(format!(
                "{} values for {} keys",
                payload.values.len(),
                payload.keys.len()
            )));
        }

        let values = payload
            .values
            .into_iter()
            .map(|v| {
                let message = format!("unsupported value {v}");
                SortValue::from_extjson(v).ok_or_else(|| Error::invalid_cursor(message))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Cursor::new(payload.direction, values))
    }
}
