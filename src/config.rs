//! Engine configuration
//!
//! `PaginateConfig` carries the options recognized by every paged
//! operation. It can be built in code or loaded from a YAML/JSON file.

use crate::error::{Error, Result};
use crate::sort::{SortField, DEFAULT_TIE_BREAK};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Page size used when the caller does not supply a usable limit
pub const DEFAULT_LIMIT: u64 = 10;

// ============================================================================
// Paginate Config
// ============================================================================

/// Options applied to every paged request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PaginateConfig {
    /// Skip the independent count; `total_count` is then absent
    pub suppress_total_count: bool,

    /// Coerce `limit = 0` to `default_limit` instead of fetching everything
    pub forbid_unbounded_fetch: bool,

    /// Limit used when the request's limit is absent, negative or not a number
    pub default_limit: u64,

    /// Unique field appended to every sort plan
    pub tie_break_field: String,

    /// Sort used when a request names no sort fields
    pub default_sort: Option<Vec<SortField>>,

    /// Upper bound on the store phase of one request
    pub store_timeout_ms: Option<u64>,
}

impl Default for PaginateConfig {
    fn default() -> Self {
        Self {
            suppress_total_count: false,
            forbid_unbounded_fetch: false,
            default_limit: DEFAULT_LIMIT,
            tie_break_field: DEFAULT_TIE_BREAK.to_string(),
            default_sort: None,
            store_timeout_ms: None,
        }
    }
}

impl PaginateConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Check invariants that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.default_limit == 0 {
            return Err(Error::invalid_config(
                "default_limit",
                "must be a positive integer",
            ));
        }
        if self.tie_break_field.trim().is_empty() {
            return Err(Error::invalid_config(
                "tie_break_field",
                "must name a unique field",
            ));
        }
        if let Some(sort) = &self.default_sort {
            if sort.iter().any(|f| f.path.is_empty()) {
                return Err(Error::invalid_config(
                    "default_sort",
                    "field paths must not be empty",
                ));
            }
        }
        Ok(())
    }

    /// Store timeout as a duration
    pub fn store_timeout(&self) -> Option<Duration> {
        self.store_timeout_ms.map(Duration::from_millis)
    }

    /// Set whether the total count is skipped
    #[must_use]
    pub fn with_suppress_total_count(mut self, suppress: bool) -> Self {
        self.suppress_total_count = suppress;
        self
    }

    /// Set whether `limit = 0` is coerced to the default limit
    #[must_use]
    pub fn with_forbid_unbounded_fetch(mut self, forbid: bool) -> Self {
        self.forbid_unbounded_fetch = forbid;
        self
    }

    /// Set the default limit
    #[must_use]
    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit;
        self
    }

    /// Set the tie-break field
    #[must_use]
    pub fn with_tie_break_field(mut self, field: impl Into<String>) -> Self {
        self.tie_break_field = field.into();
        self
    }

    /// Set the default sort
    #[must_use]
    pub fn with_default_sort(mut self, sort: Vec<SortField>) -> Self {
        self.default_sort = Some(sort);
        self
    }

    /// Set the store timeout
    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SortDirection;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PaginateConfig::default();
        assert!(!config.suppress_total_count);
        assert!(!config.forbid_unbounded_fetch);
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.tie_break_field, "_id");
        assert!(config.default_sort.is_none());
        assert!(config.store_timeout().is_none());
    }

    #[test]
    fn test_from_yaml_partial() {
        let yaml = r"
suppress_total_count: true
default_limit: 25
default_sort:
  - path: createdAt
    direction: descending
";
        let config = PaginateConfig::from_yaml_str(yaml).unwrap();
        assert!(config.suppress_total_count);
        assert!(!config.forbid_unbounded_fetch);
        assert_eq!(config.default_limit, 25);
        assert_eq!(
            config.default_sort,
            Some(vec![SortField::new("createdAt", SortDirection::Descending)])
        );
    }

    #[test]
    fn test_validate_rejects_zero_default_limit() {
        let err = PaginateConfig::from_yaml_str("default_limit: 0").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidConfigValue { ref field, .. } if field == "default_limit"
        ));
    }

    #[test]
    fn test_validate_rejects_blank_tie_break() {
        let err = PaginateConfig::from_json_str(r#"{"tie_break_field": " "}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }

    #[test]
    fn test_from_file_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("pager.json");
        let mut file = std::fs::File::create(&json_path).unwrap();
        write!(file, r#"{{"forbid_unbounded_fetch": true, "store_timeout_ms": 250}}"#).unwrap();
        let config = PaginateConfig::from_file(&json_path).unwrap();
        assert!(config.forbid_unbounded_fetch);
        assert_eq!(config.store_timeout(), Some(Duration::from_millis(250)));

        let yaml_path = dir.path().join("pager.yaml");
        std::fs::write(&yaml_path, "tie_break_field: uuid\n").unwrap();
        let config = PaginateConfig::from_file(&yaml_path).unwrap();
        assert_eq!(config.tie_break_field, "uuid");
    }

    #[test]
    fn test_from_file_missing() {
        let err = PaginateConfig::from_file("/nonexistent/pager.yaml").unwrap_err();
        assert!(matches!(err, Error::Io { ref path, .. } if path == "/nonexistent/pager.yaml"));
    }

    #[test]
    fn test_builder() {
        let config = PaginateConfig::new()
            .with_suppress_total_count(true)
            .with_forbid_unbounded_fetch(true)
            .with_default_limit(50)
            .with_store_timeout(Duration::from_secs(2));
        assert!(config.suppress_total_count);
        assert!(config.forbid_unbounded_fetch);
        assert_eq!(config.default_limit, 50);
        assert_eq!(config.store_timeout_ms, Some(2000));
    }
}
