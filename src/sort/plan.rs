//! Sort field parsing and plan construction

use crate::config::PaginateConfig;
use crate::error::{Error, Result};
use crate::types::{Document, JsonObject, JsonValue, SortDirection, Traversal};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Tie-break field used when none is configured
pub const DEFAULT_TIE_BREAK: &str = "_id";

/// A single `(path, direction)` sort entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    /// Dotted field path
    pub path: String,
    /// Sort direction
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortField {
    /// Create a sort field
    pub fn new(path: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            path: path.into(),
            direction,
        }
    }

    /// Create an ascending sort field
    pub fn asc(path: impl Into<String>) -> Self {
        Self::new(path, SortDirection::Ascending)
    }

    /// Create a descending sort field
    pub fn desc(path: impl Into<String>) -> Self {
        Self::new(path, SortDirection::Descending)
    }

    /// Parse a prefixed token (`-createdAt`, `+name`, `name`)
    fn parse_prefixed(token: &str) -> Result<Self> {
        let (direction, path) = if let Some(rest) = token.strip_prefix('-') {
            (SortDirection::Descending, rest)
        } else if let Some(rest) = token.strip_prefix('+') {
            (SortDirection::Ascending, rest)
        } else {
            (SortDirection::Ascending, token)
        };
        if path.is_empty() {
            return Err(Error::invalid_sort(format!("empty field path in '{token}'")));
        }
        Ok(Self::new(path, direction))
    }

    fn with_direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.direction)
    }
}

/// Parse a textual sort specification
///
/// Accepts comma and/or whitespace separated entries in any of these forms:
/// `-createdAt`, `+name`, `createdAt:desc`, `createdAt desc`.
pub fn parse_sort(spec: &str) -> Result<Vec<SortField>> {
    let mut fields = Vec::new();

    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((path, dir)) = part.split_once(':') {
            let direction = SortDirection::parse(dir)
                .ok_or_else(|| Error::invalid_sort(format!("unknown direction '{dir}'")))?;
            fields.push(SortField::new(path.trim(), direction));
            continue;
        }

        let words: Vec<&str> = part.split_whitespace().collect();
        if let [path, dir] = words.as_slice() {
            if let Some(direction) = SortDirection::parse(dir) {
                fields.push(SortField::parse_prefixed(path)?.with_direction(direction));
                continue;
            }
        }
        for word in words {
            fields.push(SortField::parse_prefixed(word)?);
        }
    }

    Ok(fields)
}

/// Read sort fields from JSON
///
/// Accepts an ordered object (`{"createdAt": -1, "_id": 1}`), a string spec,
/// or an array of strings / `{"path", "direction"}` objects.
pub fn sort_fields_from_json(value: &JsonValue) -> Result<Vec<SortField>> {
    match value {
        JsonValue::Null => Ok(Vec::new()),
        JsonValue::String(spec) => parse_sort(spec),
        JsonValue::Object(map) => fields_from_object(map),
        JsonValue::Array(items) => {
            let mut fields = Vec::new();
            for item in items {
                match item {
                    JsonValue::String(spec) => fields.extend(parse_sort(spec)?),
                    JsonValue::Object(map) if map.contains_key("path") => {
                        fields.push(serde_json::from_value(item.clone()).map_err(|e| {
                            Error::invalid_sort(format!("invalid sort entry {item}: {e}"))
                        })?);
                    }
                    JsonValue::Object(map) => fields.extend(fields_from_object(map)?),
                    other => {
                        return Err(Error::invalid_sort(format!(
                            "unsupported sort entry {other}"
                        )))
                    }
                }
            }
            Ok(fields)
        }
        other => Err(Error::invalid_sort(format!(
            "unsupported sort specification {other}"
        ))),
    }
}

fn fields_from_object(map: &JsonObject) -> Result<Vec<SortField>> {
    map.iter()
        .map(|(path, dir)| -> Result<SortField> {
            let direction = match dir {
                JsonValue::Number(n) => n.as_i64().and_then(SortDirection::from_i64),
                JsonValue::String(s) => SortDirection::parse(s),
                _ => None,
            }
            .ok_or_else(|| Error::invalid_sort(format!("invalid direction {dir} for '{path}'")))?;
            Ok(SortField::new(path.clone(), direction))
        })
        .collect()
}

/// Validated ordering with a guaranteed unique final key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortPlan {
    fields: Vec<SortField>,
    tie_break: String,
}

impl SortPlan {
    /// Build a plan from the requested fields, appending the tie-break field
    ///
    /// The tie-break field is appended ascending unless the caller already
    /// lists it, in which case the caller's entry wins.
    pub fn build(requested: Vec<SortField>, tie_break: &str) -> Result<Self> {
        if tie_break.is_empty() {
            return Err(Error::invalid_sort("tie-break field must not be empty"));
        }
        if requested.is_empty() {
            return Err(Error::invalid_sort(
                "no sort fields requested and no default sort configured",
            ));
        }

        let mut seen = HashSet::new();
        for field in &requested {
            if field.path.is_empty() {
                return Err(Error::invalid_sort("empty field path"));
            }
            if !seen.insert(field.path.as_str()) {
                return Err(Error::invalid_sort(format!(
                    "field '{}' is listed more than once",
                    field.path
                )));
            }
        }

        let mut fields = requested;
        if !fields.iter().any(|f| f.path == tie_break) {
            fields.push(SortField::asc(tie_break));
        }

        Ok(Self {
            fields,
            tie_break: tie_break.to_string(),
        })
    }

    /// Build a plan using the configured default sort and tie-break field
    pub fn resolve(requested: Vec<SortField>, config: &PaginateConfig) -> Result<Self> {
        let requested = if requested.is_empty() {
            config.default_sort.clone().unwrap_or_default()
        } else {
            requested
        };
        Self::build(requested, &config.tie_break_field)
    }

    /// All fields, tie-break included
    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    /// Number of fields in the plan
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Plans are never empty once built
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The unique tie-break path
    pub fn tie_break(&self) -> &str {
        &self.tie_break
    }

    /// `path:dir` entries identifying this plan inside cursor tokens
    pub fn signature(&self) -> Vec<String> {
        self.fields.iter().map(ToString::to_string).collect()
    }

    /// Ordered `{path: 1 | -1}` sort document for the given traversal
    pub fn sort_spec(&self, traversal: Traversal) -> Document {
        let mut spec = Document::new();
        for field in &self.fields {
            spec.insert(field.path.as_str(), traversal.apply(field.direction).as_i32());
        }
        spec
    }
}
