//! reqwest-backed HttpTransport

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::ApiError;
use crate::model::Method;
use crate::transport::HttpRequest;
use crate::transport::HttpResponse;
use crate::transport::HttpTransport;

/// The production [`HttpTransport`], backed by `reqwest`.
///
/// This transport is cheap to clone (uses `Arc` internally) and can be
/// shared by every table in the application.
///
/// # Example
///
/// ```ignore
/// use datatable_lib::ReqwestTransport;
///
/// let transport = ReqwestTransport::builder()
///     .base_url("http://localhost:3000")
///     .timeout(Duration::from_secs(10))
///     .build()?;
///
/// // endpoints like "/api/datatable/v1" now resolve against the base URL
/// ```
#[derive(Clone)]
pub struct ReqwestTransport {
    inner: Arc<ReqwestTransportInner>,
}

struct ReqwestTransportInner {
    base_url: Option<Url>,
    http_client: Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Creates a new builder for constructing a transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new()
    }

    /// Returns the base URL relative endpoints resolve against.
    pub fn base_url(&self) -> Option<&Url> {
        self.inner.base_url.as_ref()
    }

    /// Resolves a request URL, joining relative URLs onto the base URL.
    pub fn resolve_url(&self, url: &str) -> Result<Url, ApiError> {
        match Url::parse(url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.inner.base_url {
                Some(base) => base
                    .join(url)
                    .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", url, e))),
                None => Err(ApiError::InvalidUrl(format!(
                    "{}: relative URL without a base URL",
                    url
                ))),
            },
            Err(e) => Err(ApiError::InvalidUrl(format!("{}: {}", url, e))),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = self.resolve_url(&request.url)?;
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self.inner.http_client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(timeout) = self.inner.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        Ok(HttpResponse { status, body })
    }
}

impl ReqwestTransport {
    fn map_error(&self, err: reqwest::Error) -> ApiError {
        match self.inner.timeout {
            Some(timeout) if err.is_timeout() => ApiError::Timeout(timeout),
            _ => ApiError::from(err),
        }
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.inner.base_url.as_ref().map(Url::as_str))
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for constructing a [`ReqwestTransport`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use datatable_lib::ReqwestTransport;
///
/// let transport = ReqwestTransport::builder()
///     .base_url("http://localhost:3000")
///     .timeout(Duration::from_secs(30))
///     .build()
///     .unwrap();
/// ```
#[derive(Default)]
pub struct ReqwestTransportBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
}

impl ReqwestTransportBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL that relative endpoints resolve against.
    ///
    /// A trailing slash is added when missing so that the last path segment
    /// is kept during joins.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// If not set, a default client will be created.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the [`ReqwestTransport`].
    pub fn build(self) -> Result<ReqwestTransport, ApiError> {
        let base_url = match self.base_url {
            Some(raw) => {
                let normalized = if raw.ends_with('/') {
                    raw
                } else {
                    format!("{}/", raw)
                };
                Some(
                    Url::parse(&normalized)
                        .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", normalized, e)))?,
                )
            }
            None => None,
        };

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(ReqwestTransport {
            inner: Arc::new(ReqwestTransportInner {
                base_url,
                http_client,
                timeout: self.timeout,
            }),
        })
    }
}
