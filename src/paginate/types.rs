//! Request and response types for paged operations

use crate::error::{Error, Result};
use crate::sort::{sort_fields_from_json, SortField};
use crate::store::Populate;
use crate::types::{Document, JsonValue, Traversal};
use crate::value::document_to_extjson;
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Paginate Options
// ============================================================================

/// Per-request pagination options
///
/// When deserialized, `sort` accepts any form understood by
/// `sort_fields_from_json`, and a `limit` that is not an integer is treated
/// as absent. `next` / `previous` are accepted as aliases for the cursors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginateOptions {
    /// Requested ordering (tie-break appended later)
    #[serde(default, deserialize_with = "deserialize_sort")]
    pub sort: Vec<SortField>,

    /// Page size; absent, negative or zero-when-forbidden means the default
    #[serde(default, deserialize_with = "deserialize_limit")]
    pub limit: Option<i64>,

    /// Return the page after this cursor
    #[serde(default, alias = "next", skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,

    /// Return the page before this cursor
    #[serde(default, alias = "previous", skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
}

fn deserialize_sort<'de, D>(deserializer: D) -> std::result::Result<Vec<SortField>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    sort_fields_from_json(&value).map_err(serde::de::Error::custom)
}

fn deserialize_limit<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(lenient_limit(&value))
}

/// Read a limit the way loosely typed callers send it
pub(crate) fn lenient_limit(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl PaginateOptions {
    /// Create options for the given ordering
    pub fn new(sort: Vec<SortField>) -> Self {
        Self {
            sort,
            ..Default::default()
        }
    }

    /// Set the page size
    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Page forward from a cursor
    #[must_use]
    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    /// Page backward from a cursor
    #[must_use]
    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    /// Reject option combinations that have no meaning
    pub fn validate(&self) -> Result<()> {
        if self.after.is_some() && self.before.is_some() {
            return Err(Error::invalid_options(
                "'after' and 'before' cursors are mutually exclusive",
            ));
        }
        Ok(())
    }

    /// Direction implied by the cursors
    pub fn traversal(&self) -> Traversal {
        if self.before.is_some() {
            Traversal::Backward
        } else {
            Traversal::Forward
        }
    }

    /// The anchoring token, if any
    pub fn anchor_token(&self) -> Option<&str> {
        self.after.as_deref().or(self.before.as_deref())
    }
}

// ============================================================================
// Find Query
// ============================================================================

/// Caller-supplied parts of a paged find
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    /// Base filter (matches everything when absent)
    pub filter: Option<Document>,
    /// Projection applied by the store
    pub projection: Option<Document>,
    /// References resolved on the returned page
    pub populate: Vec<Populate>,
}

impl FindQuery {
    /// Create an empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base filter
    #[must_use]
    pub fn filter(mut self, filter: Document) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the projection
    #[must_use]
    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Add a populate instruction
    #[must_use]
    pub fn populate(mut self, populate: Populate) -> Self {
        self.populate.push(populate);
        self
    }
}

// ============================================================================
// Result Envelope
// ============================================================================

/// Navigation metadata for one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// More items follow the last item
    pub has_next_page: bool,
    /// More items precede the first item
    pub has_previous_page: bool,
    /// Cursor for the page before this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    /// Cursor for the page after this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_cursor: Option<String>,
}

/// One page of documents plus navigation metadata
///
/// `total_count` comes from an independent count and may be stale relative
/// to `items` under concurrent writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginateResult {
    /// Documents in forward plan order
    pub items: Vec<Document>,
    /// Navigation metadata
    pub page_info: PageInfo,
    /// Matching documents, unless suppressed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

impl PaginateResult {
    /// Number of items on the page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the page is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Deserialize the items into a typed model
    pub fn items_as<T: serde::de::DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.items
            .iter()
            .map(|item| bson::from_document(item.clone()).map_err(Error::from))
            .collect()
    }

    /// Render the page with items as relaxed extended JSON
    pub fn to_extjson(&self) -> Result<JsonValue> {
        let items: Vec<JsonValue> = self
            .items
            .iter()
            .map(|item| document_to_extjson(item.clone()))
            .collect();
        let mut out = serde_json::Map::new();
        out.insert("items".to_string(), JsonValue::Array(items));
        out.insert("pageInfo".to_string(), serde_json::to_value(&self.page_info)?);
        if let Some(total) = self.total_count {
            out.insert("totalCount".to_string(), JsonValue::from(total));
        }
        Ok(JsonValue::Object(out))
    }
}
