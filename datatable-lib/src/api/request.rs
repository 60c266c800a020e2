//! Request construction from a descriptor and the current query.

use serde_json::Map;
use serde_json::Value;

use crate::model::ApiDescriptor;
use crate::model::Columns;
use crate::model::Method;
use crate::model::NestedKeys;
use crate::model::QueryState;

/// A concrete request ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltRequest {
    /// HTTP method.
    pub method: Method,
    /// Endpoint URL, including the search route when one applies.
    pub url: String,
    /// Query parameters (GET only).
    pub query: Option<Vec<(String, String)>>,
    /// JSON body (POST only).
    pub body: Option<Value>,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Whether the search route suffix was applied.
    pub search_route: bool,
}

impl BuiltRequest {
    /// Returns the URL with the encoded query string appended.
    pub fn full_url(&self) -> String {
        match &self.query {
            Some(params) if !params.is_empty() => {
                let separator = if self.url.contains('?') { '&' } else { '?' };
                format!("{}{}{}", self.url, separator, encode_query(params))
            }
            _ => self.url.clone(),
        }
    }
}

/// Builds requests for one endpoint.
///
/// The builder only reads the state it is given; resetting the page when the
/// page size changes is the caller's job.
///
/// # Example
///
/// ```
/// use datatable_lib::api::RequestBuilder;
/// use datatable_lib::model::{ApiDescriptor, ColumnSpec, Columns, FieldNames, QueryState};
///
/// let descriptor = ApiDescriptor::new("https://dummyjson.com/products")
///     .field_names(FieldNames::new().search_route("/search").search_param("q"));
/// let columns = Columns::new(vec![ColumnSpec::field("Title", "title")]).unwrap();
///
/// let mut query = QueryState::new(10);
/// query.page = 2;
/// query.committed_search = "phone".to_string();
///
/// let request = RequestBuilder::new(&descriptor, &columns).build(&query);
/// assert_eq!(
///     request.full_url(),
///     "https://dummyjson.com/products/search?limit=10&skip=10&q=phone"
/// );
/// ```
pub struct RequestBuilder<'a> {
    descriptor: &'a ApiDescriptor,
    columns: &'a Columns,
}

impl<'a> RequestBuilder<'a> {
    /// Creates a builder for a descriptor and its columns.
    pub fn new(descriptor: &'a ApiDescriptor, columns: &'a Columns) -> Self {
        Self { descriptor, columns }
    }

    /// Builds the request for `query`.
    pub fn build(&self, query: &QueryState) -> BuiltRequest {
        let (payload, search_route) = self.payload(query);
        let url = match (search_route, &self.descriptor.field_names.search_route) {
            (true, Some(route)) => join_route(&self.descriptor.endpoint, route),
            _ => self.descriptor.endpoint.clone(),
        };

        let (query_params, body) = match self.descriptor.method {
            Method::Get => (
                Some(flatten(&payload, self.descriptor.nested_keys)),
                None,
            ),
            Method::Post => (None, Some(Value::Object(payload))),
        };

        BuiltRequest {
            method: self.descriptor.method,
            url,
            query: query_params,
            body,
            headers: self.headers(),
            search_route,
        }
    }

    /// Assembles the payload: static fields first, dynamic fields on top.
    ///
    /// Also returns whether the search route applies.
    fn payload(&self, query: &QueryState) -> (Map<String, Value>, bool) {
        let names = &self.descriptor.field_names;
        let mut payload = self.descriptor.static_fields();

        names
            .limit_path()
            .assign(&mut payload, Value::from(query.rows_per_page));
        names.skip_path().assign(&mut payload, Value::from(query.skip()));

        if let (Some(sort), Some(field_path)) = (&query.sort, &names.sort_field) {
            let source = self
                .columns
                .sortable(&sort.column)
                .and_then(|c| c.source.as_ref());
            if let Some(source) = source {
                field_path.assign(&mut payload, Value::from(source.as_str()));
                if let Some(order_path) = &names.sort_order {
                    order_path.assign(&mut payload, Value::from(sort.direction.as_str()));
                }
            }
        }

        let mut search_route = false;
        if let (Some(term), Some(param)) = (query.search_term(), &names.search_param) {
            param.assign(&mut payload, Value::from(term));
            search_route = names
                .search_route
                .as_deref()
                .is_some_and(|r| !r.trim().trim_matches('/').is_empty());
        }

        (payload, search_route)
    }

    fn headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::with_capacity(self.descriptor.headers.len() + 2);
        let has = |name: &str| {
            self.descriptor
                .headers
                .iter()
                .any(|(k, _)| k.eq_ignore_ascii_case(name))
        };

        if !has("Accept") {
            headers.push(("Accept".to_string(), "application/json".to_string()));
        }
        if self.descriptor.method == Method::Post && !has("Content-Type") {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        headers.extend(self.descriptor.headers.iter().cloned());
        headers
    }
}

/// Appends a route suffix to the endpoint path, keeping any query string.
fn join_route(endpoint: &str, route: &str) -> String {
    let (path, existing_query) = match endpoint.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (endpoint, None),
    };

    let mut url = format!(
        "{}/{}",
        path.trim_end_matches('/'),
        route.trim().trim_start_matches('/')
    );
    if let Some(query) = existing_query {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// Flattens a payload into query parameters.
///
/// Nested objects use the configured key style, arrays repeat the key with
/// a `[]` suffix and nulls are dropped.
pub fn flatten(payload: &Map<String, Value>, style: NestedKeys) -> Vec<(String, String)> {
    let mut params = Vec::new();
    for (key, value) in payload {
        flatten_value(key.clone(), value, style, &mut params);
    }
    params
}

fn flatten_value(key: String, value: &Value, style: NestedKeys, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (child, child_value) in map {
                let nested = match style {
                    NestedKeys::Brackets => format!("{}[{}]", key, child),
                    NestedKeys::Dotted => format!("{}.{}", key, child),
                };
                flatten_value(nested, child_value, style, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten_value(format!("{}[]", key), item, style, out);
            }
        }
        Value::String(s) => out.push((key, s.clone())),
        other => out.push((key, other.to_string())),
    }
}

/// Percent-encodes query parameters.
pub fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
