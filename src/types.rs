//! Common types used throughout keyset-pager
//!
//! This module contains shared type definitions, type aliases,
//! and small enums used across multiple modules.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// A stored document
pub type Document = bson::Document;

/// A single aggregation pipeline stage
pub type Stage = bson::Document;

// ============================================================================
// Sort Direction
// ============================================================================

/// Direction of a single sort field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// The opposite direction
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Numeric form used in sort specifications (`1` / `-1`)
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }

    /// Parse the numeric form
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Ascending),
            -1 => Some(Self::Descending),
            _ => None,
        }
    }

    /// Parse a textual direction (`asc`, `desc`, `ascending`, `1`, `-1`, ...)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Some(Self::Ascending),
            "desc" | "descending" | "-1" => Some(Self::Descending),
            _ => None,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}

// ============================================================================
// Traversal
// ============================================================================

/// Which way a request walks relative to the sort plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Traversal {
    /// Pages after an anchor (or the first page)
    #[default]
    Forward,
    /// Pages before an anchor
    Backward,
}

impl Traversal {
    /// Effective direction of a field under this traversal
    pub fn apply(self, direction: SortDirection) -> SortDirection {
        match self {
            Self::Forward => direction,
            Self::Backward => direction.reversed(),
        }
    }
}

// ============================================================================
// Cursor Direction
// ============================================================================

/// The side of a page boundary a cursor was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorDirection {
    /// Issued as an end cursor, meant for `after`
    After,
    /// Issued as a start cursor, meant for `before`
    Before,
}

// ============================================================================
// Explain Verbosity
// ============================================================================

/// Verbosity for query-plan explanations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Verbosity {
    /// Plan selection only
    #[default]
    QueryPlanner,
    /// Plan plus execution statistics of the winning plan
    ExecutionStats,
    /// Execution statistics for every candidate plan
    AllPlansExecution,
}

impl Verbosity {
    /// Wire name of the verbosity mode
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QueryPlanner => "queryPlanner",
            Self::ExecutionStats => "executionStats",
            Self::AllPlansExecution => "allPlansExecution",
        }
    }

    /// Whether execution statistics are included
    pub fn includes_execution(self) -> bool {
        !matches!(self, Self::QueryPlanner)
    }
}
