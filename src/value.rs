//! Sort key values
//!
//! Documents are `bson::Document`s. `SortValue` is the view of a document
//! value that may take part in a sort key: null, a number, a string, an
//! `ObjectId`, a boolean or a `DateTime`. Cursor payloads carry these values
//! as canonical extended JSON so that every BSON type survives the round trip.

use crate::error::{Error, Result};
use crate::types::{Document, JsonValue};
use bson::Bson;
use std::cmp::Ordering;
use std::fmt;

/// A value usable as a sort key component
#[derive(Debug, Clone, PartialEq)]
pub struct SortValue(Bson);

impl SortValue {
    /// Wrap a document value
    ///
    /// Returns `None` for arrays, embedded documents and the exotic BSON
    /// types, since those cannot take part in a keyset comparison.
    pub fn from_bson(value: &Bson) -> Option<Self> {
        match value {
            Bson::Null
            | Bson::Boolean(_)
            | Bson::Int32(_)
            | Bson::Int64(_)
            | Bson::Double(_)
            | Bson::String(_)
            | Bson::ObjectId(_)
            | Bson::DateTime(_) => Some(Self(value.clone())),
            _ => None,
        }
    }

    /// Parse a relaxed or canonical extended JSON value
    pub fn from_extjson(value: JsonValue) -> Option<Self> {
        Bson::try_from(value)
            .ok()
            .and_then(|bson| Self::from_bson(&bson))
    }

    /// Render as canonical extended JSON, keeping the exact BSON type
    pub fn to_extjson(&self) -> JsonValue {
        self.0.clone().into_canonical_extjson()
    }

    /// Borrow the wrapped value
    pub fn as_bson(&self) -> &Bson {
        &self.0
    }

    /// Unwrap into the BSON value
    pub fn into_bson(self) -> Bson {
        self.0
    }

    /// Explicit null
    pub fn is_null(&self) -> bool {
        matches!(self.0, Bson::Null)
    }

    /// Check whether two values belong to the same type bracket
    pub fn same_bracket(&self, other: &Self) -> bool {
        type_rank(&self.0) == type_rank(&other.0)
    }

    /// Total order: type bracket first, then value
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        compare_bson(Some(&self.0), Some(&other.0))
    }
}

impl From<SortValue> for Bson {
    fn from(value: SortValue) -> Self {
        value.0
    }
}

impl fmt::Display for SortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.clone().into_relaxed_extjson())
    }
}

// ============================================================================
// Canonical Order
// ============================================================================

/// Type bracket in the store's cross-type order
///
/// Missing values share the null bracket.
pub fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::MaxKey => 13,
        _ => 12,
    }
}

fn bracket(value: Option<&Bson>) -> u8 {
    value.map_or(1, type_rank)
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(f) => Some(*f),
        _ => None,
    }
}

fn as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        _ => None,
    }
}

fn compare_in_bracket(a: &Bson, b: &Bson) -> Ordering {
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        (Bson::Document(x), Bson::Document(y)) => {
            for ((ka, va), (kb, vb)) in x.iter().zip(y.iter()) {
                let ordering = ka.cmp(kb).then_with(|| compare_bson(Some(va), Some(vb)));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        (Bson::Array(x), Bson::Array(y)) => {
            for (va, vb) in x.iter().zip(y) {
                let ordering = compare_bson(Some(va), Some(vb));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => match (as_i64(a), as_i64(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => match (as_f64(a), as_f64(b)) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.to_string().cmp(&b.to_string()),
            },
        },
    }
}

/// Compare two document values in the canonical cross-type order
///
/// Missing values compare equal to null and sort before every other type.
pub fn compare_bson(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    match bracket(a).cmp(&bracket(b)) {
        Ordering::Equal => match (a, b) {
            (Some(a), Some(b)) => compare_in_bracket(a, b),
            _ => Ordering::Equal,
        },
        ordering => ordering,
    }
}

// ============================================================================
// Paths
// ============================================================================

/// Look up a dotted path (`author.name`) in a document
pub fn get_path<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    match path.split_once('.') {
        None => document.get(path),
        Some((head, rest)) => match document.get(head)? {
            Bson::Document(child) => get_path(child, rest),
            _ => None,
        },
    }
}

/// Set a dotted path in a document, creating intermediate documents
pub fn set_path(document: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(document.get(head), Some(Bson::Document(_))) {
                document.insert(head, Document::new());
            }
            if let Some(Bson::Document(child)) = document.get_mut(head) {
                set_path(child, rest, value);
            }
        }
    }
}

/// Remove a dotted path from a document
pub fn remove_path(document: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            document.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(child)) = document.get_mut(head) {
                remove_path(child, rest);
            }
        }
    }
}

/// Extract the sort value at `path`, failing when it is absent or unsupported
pub fn extract_sort_value(document: &Document, path: &str) -> Result<SortValue> {
    let raw = get_path(document, path).ok_or_else(|| Error::missing_field(path))?;
    SortValue::from_bson(raw).ok_or_else(|| {
        Error::unsupported_value(path, format!("{raw} cannot be used as a sort key"))
    })
}

// ============================================================================
// Extended JSON
// ============================================================================

/// Parse a relaxed or canonical extended JSON object into a document
pub fn document_from_extjson(value: JsonValue) -> Result<Document> {
    match Bson::try_from(value) {
        Ok(Bson::Document(document)) => Ok(document),
        Ok(other) => Err(Error::extended_json(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(Error::extended_json(e.to_string())),
    }
}

/// Render a document as relaxed extended JSON
pub fn document_to_extjson(document: Document) -> JsonValue {
    Bson::Document(document).into_relaxed_extjson()
}
