//! Table configuration

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use super::debounce::DEFAULT_DEBOUNCE;
use crate::error::ConfigError;
use crate::model::ApiDescriptor;
use crate::model::ColumnSpec;
use crate::model::Columns;

/// Search debounce setting: a number of milliseconds, or `false` to commit
/// every keystroke immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DebounceSetting {
    /// Quiescence interval in milliseconds. `0` disables debouncing.
    Millis(u64),
    /// `false` disables debouncing, `true` uses the default interval.
    Enabled(bool),
}

impl DebounceSetting {
    /// Returns the interval, or `None` when commits are immediate.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            DebounceSetting::Millis(0) | DebounceSetting::Enabled(false) => None,
            DebounceSetting::Millis(ms) => Some(Duration::from_millis(*ms)),
            DebounceSetting::Enabled(true) => Some(DEFAULT_DEBOUNCE),
        }
    }
}

impl Default for DebounceSetting {
    fn default() -> Self {
        DebounceSetting::Enabled(true)
    }
}

/// Everything a table controller is set up with.
///
/// Deserializes from a camelCase JSON document:
///
/// ```json
/// {
///   "endpoint": "http://localhost:3000/api/datatable/v1",
///   "method": "GET",
///   "fieldNames": {
///     "limit": "pagination.limit",
///     "skip": "pagination.skip",
///     "total": "pagination.totalItems",
///     "sortField": "sortBy",
///     "sortOrder": "sortOrder",
///     "searchParam": "search"
///   },
///   "columns": [
///     { "title": "Serial", "serial": true },
///     { "title": "Name", "dataIndex": "name", "sort": true },
///     { "dataSrc": "data" }
///   ],
///   "rowsPerPage": 10,
///   "searchDebounceMs": 1000
/// }
/// ```
///
/// # Example
///
/// ```
/// use datatable_lib::model::{ApiDescriptor, ColumnSpec, FieldNames};
/// use datatable_lib::table::TableConfig;
///
/// let config = TableConfig::new(
///     ApiDescriptor::new("/api/datatable/v2")
///         .field_names(FieldNames::new().total("totalItems").search_route("/search").search_param("search")),
///     vec![ColumnSpec::field("Name", "name").sortable(), ColumnSpec::collection_root("data")],
/// )
/// .rows_per_page(25)
/// .search_debounce_ms(300);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    /// Backend description.
    #[serde(flatten)]
    pub api: ApiDescriptor,
    /// Column definitions.
    pub columns: Vec<ColumnSpec>,
    /// Initial page size.
    #[serde(default = "default_rows_per_page")]
    pub rows_per_page: u64,
    /// Search debounce interval.
    #[serde(default)]
    pub search_debounce_ms: DebounceSetting,
    /// Whether search input is accepted at all.
    #[serde(default = "default_true")]
    pub search_enabled: bool,
    /// Pre-fetched response shown before the first request.
    #[serde(default)]
    pub initial_data: Option<Value>,
}

fn default_rows_per_page() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl TableConfig {
    /// Creates a config with default paging and search settings.
    pub fn new(api: ApiDescriptor, columns: Vec<ColumnSpec>) -> Self {
        Self {
            api,
            columns,
            rows_per_page: default_rows_per_page(),
            search_debounce_ms: DebounceSetting::default(),
            search_enabled: true,
            initial_data: None,
        }
    }

    /// Parses a config from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the initial page size.
    pub fn rows_per_page(mut self, rows: u64) -> Self {
        self.rows_per_page = rows;
        self
    }

    /// Sets the search debounce interval in milliseconds.
    pub fn search_debounce_ms(mut self, ms: u64) -> Self {
        self.search_debounce_ms = DebounceSetting::Millis(ms);
        self
    }

    /// Commits every search keystroke immediately.
    pub fn no_search_debounce(mut self) -> Self {
        self.search_debounce_ms = DebounceSetting::Enabled(false);
        self
    }

    /// Disables search entirely.
    pub fn disable_search(mut self) -> Self {
        self.search_enabled = false;
        self
    }

    /// Sets a pre-fetched response to show before the first request.
    pub fn initial_data(mut self, data: Value) -> Self {
        self.initial_data = Some(data);
        self
    }

    /// Validates the config, returning the checked column list.
    pub fn validate(&self) -> Result<Columns, ConfigError> {
        self.api.validate()?;
        if self.rows_per_page == 0 {
            return Err(ConfigError::InvalidRowsPerPage);
        }
        Columns::new(self.columns.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Method;
    use crate::model::NestedKeys;

    #[test]
    fn test_from_json() {
        let config = TableConfig::from_json(
            r#"{
                "endpoint": "http://localhost:3000/api/datatable/v1",
                "method": "POST",
                "fieldNames": {
                    "limit": "pagination.limit",
                    "total": "pagination.totalItems",
                    "sortField": "sortBy",
                    "sortOrder": "sortOrder",
                    "searchParam": "search"
                },
                "columns": [
                    { "title": "Serial", "serial": true },
                    { "title": "Name", "dataIndex": "name", "sort": true },
                    { "dataSrc": "data" }
                ],
                "staticPayload": { "tenant": "acme" },
                "rowsPerPage": 25,
                "searchDebounceMs": false,
                "nestedKeys": "dotted"
            }"#,
        )
        .unwrap();

        assert_eq!(config.api.method, Method::Post);
        assert_eq!(config.api.nested_keys, NestedKeys::Dotted);
        assert_eq!(config.rows_per_page, 25);
        assert_eq!(config.search_debounce_ms.delay(), None);
        assert!(config.search_enabled);
        assert!(config.initial_data.is_none());

        let columns = config.validate().unwrap();
        assert_eq!(columns.root().map(|p| p.as_str()), Some("data"));
    }

    #[test]
    fn test_defaults() {
        let config = TableConfig::from_json(r#"{ "endpoint": "/x", "columns": [] }"#).unwrap();
        assert_eq!(config.api.method, Method::Get);
        assert_eq!(config.rows_per_page, 10);
        assert_eq!(config.search_debounce_ms.delay(), Some(DEFAULT_DEBOUNCE));
    }

    #[test]
    fn test_debounce_settings() {
        let parse = |raw: &str| serde_json::from_str::<DebounceSetting>(raw).unwrap().delay();
        assert_eq!(parse("1000"), Some(Duration::from_millis(1000)));
        assert_eq!(parse("0"), None);
        assert_eq!(parse("false"), None);
        assert_eq!(parse("true"), Some(DEFAULT_DEBOUNCE));
    }

    #[test]
    fn test_validate_errors() {
        let config = TableConfig::new(ApiDescriptor::new("/x"), Vec::new()).rows_per_page(0);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRowsPerPage)));

        assert!(matches!(
            TableConfig::from_json("{ \"columns\": [] }"),
            Err(ConfigError::Parse(_))
        ));
    }
}
