//! Result envelope assembly

use super::types::{PageInfo, PaginateResult};
use super::window::PageRequest;
use crate::cursor::CursorCodec;
use crate::error::Result;
use crate::types::{CursorDirection, Document, Traversal};

/// Turn an over-fetched window into a page
///
/// The extra row, when present, is dropped and sets the flag on the side it
/// was fetched from. Backward windows are reversed so items are always in
/// forward plan order. An anchored request implies a page on the anchor's
/// side. Boundary cursors fail the whole page if a sort field is missing.
pub fn assemble(
    mut items: Vec<Document>,
    request: &PageRequest,
    codec: &dyn CursorCodec,
    total_count: Option<u64>,
) -> Result<PaginateResult> {
    let has_more = match request.window.page_size() {
        Some(size) if items.len() as u64 > size => {
            items.truncate(size as usize);
            true
        }
        _ => false,
    };

    let anchored = request.is_anchored();
    let (has_next_page, has_previous_page) = match request.traversal {
        Traversal::Forward => (has_more, anchored),
        Traversal::Backward => {
            items.reverse();
            (anchored, has_more)
        }
    };

    let start_cursor = items
        .first()
        .map(|doc| codec.encode_document(&request.plan, doc, CursorDirection::Before))
        .transpose()?;
    let end_cursor = items
        .last()
        .map(|doc| codec.encode_document(&request.plan, doc, CursorDirection::After))
        .transpose()?;

    tracing::trace!(
        items = items.len(),
        has_next_page,
        has_previous_page,
        "page assembled"
    );

    Ok(PaginateResult {
        items,
        page_info: PageInfo {
            has_next_page,
            has_previous_page,
            start_cursor,
            end_cursor,
        },
        total_count,
    })
}
