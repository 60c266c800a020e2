//! HttpTransport trait and request/response types

use async_trait::async_trait;
use serde_json::Value;

use crate::api::BuiltRequest;
use crate::error::ApiError;
use crate::model::Method;

/// A request as handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Full URL including the query string.
    pub url: String,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Serialized JSON body.
    pub body: Option<String>,
}

impl From<&BuiltRequest> for HttpRequest {
    fn from(request: &BuiltRequest) -> Self {
        Self {
            method: request.method,
            url: request.full_url(),
            headers: request.headers.clone(),
            body: request.body.as_ref().map(Value::to_string),
        }
    }
}

/// A raw response from the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Creates a new response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Creates a `200 OK` response with a JSON body.
    pub fn json_ok(value: &Value) -> Self {
        Self::new(200, value.to_string())
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON.
    pub fn json(&self) -> Result<Value, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| {
            ApiError::parse_with_body(format!("invalid JSON: {}", e), self.body.clone())
        })
    }
}

/// Trait for the HTTP primitive the controller talks through.
///
/// The controller never mutates the transport; one transport can serve any
/// number of tables. Non-success statuses are returned as responses, not
/// errors: the controller decides how to report them.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use datatable_lib::transport::{HttpRequest, HttpResponse, HttpTransport};
/// use datatable_lib::error::ApiError;
///
/// struct Offline;
///
/// #[async_trait]
/// impl HttpTransport for Offline {
///     async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, ApiError> {
///         Err(ApiError::Transport("offline".to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and returns the raw response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// A transport that answers every request with the same response.
///
/// Useful for tests, demos and previews.
///
/// # Example
///
/// ```
/// use datatable_lib::transport::StaticTransport;
/// use serde_json::json;
///
/// let transport = StaticTransport::json(json!([{ "name": "Jo" }]));
/// ```
#[derive(Debug, Clone)]
pub struct StaticTransport {
    response: HttpResponse,
}

impl StaticTransport {
    /// Creates a transport returning `response`.
    pub fn new(response: HttpResponse) -> Self {
        Self { response }
    }

    /// Creates a transport returning `200 OK` with a JSON body.
    pub fn json(value: Value) -> Self {
        Self::new(HttpResponse::json_ok(&value))
    }
}

#[async_trait]
impl HttpTransport for StaticTransport {
    async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, ApiError> {
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_json_decoding() {
        let ok = HttpResponse::new(200, r#"{"a":1}"#);
        assert!(ok.is_success());
        assert_eq!(ok.json().unwrap(), json!({ "a": 1 }));

        let broken = HttpResponse::new(200, "<html>");
        assert!(matches!(broken.json(), Err(ApiError::Parse { body: Some(_), .. })));

        assert!(!HttpResponse::new(302, "").is_success());
    }

    #[tokio::test]
    async fn test_static_transport() {
        let transport = StaticTransport::json(json!({ "total": 1 }));
        let request = HttpRequest {
            method: Method::Get,
            url: "/x".to_string(),
            headers: Vec::new(),
            body: None,
        };
        let response = transport.send(request).await.unwrap();
        assert_eq!(response.json().unwrap(), json!({ "total": 1 }));
    }
}
