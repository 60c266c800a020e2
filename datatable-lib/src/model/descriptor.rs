//! Backend descriptor

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use super::FieldPath;
use crate::error::ConfigError;

/// HTTP method used to fetch a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Parameters travel in the query string.
    #[default]
    Get,
    /// Parameters travel in a JSON body.
    Post,
}

impl Method {
    /// Returns the method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// How nested payload keys are flattened into a GET query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NestedKeys {
    /// `pagination[skip]=20`, understood by Express and most query parsers.
    #[default]
    Brackets,
    /// `pagination.skip=20`.
    Dotted,
}

/// Names the backend uses for the engine's concepts.
///
/// Every entry except `search_route` is a dotted path into the request
/// payload and the response body. A missing entry means the capability is
/// not wired to the backend.
///
/// # Example
///
/// ```
/// use datatable_lib::model::FieldNames;
///
/// let names = FieldNames::new()
///     .limit("pagination.limit")
///     .skip("pagination.skip")
///     .total("pagination.totalItems")
///     .sort("sortBy", "sortOrder")
///     .search_param("search");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldNames {
    /// Page size parameter. Defaults to `limit`.
    #[serde(default)]
    pub limit: Option<FieldPath>,
    /// Offset parameter. Defaults to `skip`.
    #[serde(default)]
    pub skip: Option<FieldPath>,
    /// Total item count in the response body.
    #[serde(default)]
    pub total: Option<FieldPath>,
    /// Sort field parameter.
    #[serde(default, alias = "sortBy")]
    pub sort_field: Option<FieldPath>,
    /// Sort order parameter.
    #[serde(default)]
    pub sort_order: Option<FieldPath>,
    /// Path suffix appended to the endpoint while searching.
    #[serde(default)]
    pub search_route: Option<String>,
    /// Search term parameter.
    #[serde(default, alias = "search", alias = "searchPram")]
    pub search_param: Option<FieldPath>,
}

impl FieldNames {
    /// Creates an empty mapping (plain `limit`/`skip`, nothing else wired).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size parameter.
    pub fn limit(mut self, path: impl Into<FieldPath>) -> Self {
        self.limit = Some(path.into());
        self
    }

    /// Sets the offset parameter.
    pub fn skip(mut self, path: impl Into<FieldPath>) -> Self {
        self.skip = Some(path.into());
        self
    }

    /// Sets the total count path in the response.
    pub fn total(mut self, path: impl Into<FieldPath>) -> Self {
        self.total = Some(path.into());
        self
    }

    /// Sets the sort field and sort order parameters.
    pub fn sort(mut self, field: impl Into<FieldPath>, order: impl Into<FieldPath>) -> Self {
        self.sort_field = Some(field.into());
        self.sort_order = Some(order.into());
        self
    }

    /// Sets the search route suffix.
    pub fn search_route(mut self, route: impl Into<String>) -> Self {
        self.search_route = Some(route.into());
        self
    }

    /// Sets the search term parameter.
    pub fn search_param(mut self, path: impl Into<FieldPath>) -> Self {
        self.search_param = Some(path.into());
        self
    }

    /// Returns the page size path, falling back to `limit`.
    pub fn limit_path(&self) -> FieldPath {
        self.limit.clone().unwrap_or_else(|| FieldPath::new("limit"))
    }

    /// Returns the offset path, falling back to `skip`.
    pub fn skip_path(&self) -> FieldPath {
        self.skip.clone().unwrap_or_else(|| FieldPath::new("skip"))
    }

    /// Returns `true` if the backend reports a total count.
    pub fn has_total(&self) -> bool {
        self.total.is_some()
    }

    /// Returns `true` if the backend accepts sort instructions.
    pub fn has_sort(&self) -> bool {
        self.sort_field.is_some()
    }

    /// Returns `true` if the backend accepts a search term.
    pub fn has_search(&self) -> bool {
        self.search_param.is_some()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let paths = [
            ("limit", &self.limit),
            ("skip", &self.skip),
            ("total", &self.total),
            ("sortField", &self.sort_field),
            ("sortOrder", &self.sort_order),
            ("searchParam", &self.search_param),
        ];
        for (field, path) in paths {
            if let Some(path) = path
                && !path.is_valid()
            {
                return Err(ConfigError::InvalidFieldPath {
                    field,
                    path: path.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Description of a list endpoint.
///
/// Passed by value into each controller; there is no process-wide registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDescriptor {
    /// Endpoint URL, absolute or relative to the transport's base URL.
    pub endpoint: String,
    /// HTTP method.
    #[serde(default)]
    pub method: Method,
    /// Backend field names.
    #[serde(default)]
    pub field_names: FieldNames,
    /// Static request headers.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Caller-supplied payload merged before the dynamic fields.
    #[serde(default)]
    pub static_payload: Option<Value>,
    /// Flattening style for nested GET parameters.
    #[serde(default)]
    pub nested_keys: NestedKeys,
}

impl ApiDescriptor {
    /// Creates a GET descriptor with no field names configured.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: Method::Get,
            field_names: FieldNames::default(),
            headers: Vec::new(),
            static_payload: None,
            nested_keys: NestedKeys::default(),
        }
    }

    /// Sets the HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the backend field names.
    pub fn field_names(mut self, field_names: FieldNames) -> Self {
        self.field_names = field_names;
        self
    }

    /// Adds a static request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the static payload.
    pub fn static_payload(mut self, payload: Value) -> Self {
        self.static_payload = Some(payload);
        self
    }

    /// Sets the flattening style for nested GET parameters.
    pub fn nested_keys(mut self, style: NestedKeys) -> Self {
        self.nested_keys = style;
        self
    }

    /// Returns the static payload as an object (empty when unset).
    pub fn static_fields(&self) -> Map<String, Value> {
        match &self.static_payload {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        }
    }

    /// Checks the descriptor for setup errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }

        match &self.static_payload {
            None | Some(Value::Object(_)) => {}
            Some(other) => {
                return Err(ConfigError::InvalidStaticPayload {
                    found: json_type_name(other),
                });
            }
        }

        self.field_names.validate()
    }
}

/// Returns a short name for the JSON type of `value`.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
