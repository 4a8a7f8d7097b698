//! Raw request/response exchange with the target API.

use super::ApiError;
use async_trait::async_trait;
use http::{HeaderMap, Method, StatusCode};
use octocrab::Octocrab;
use serde_json::Value;

/// A single request against the target API.
///
/// Built fresh for every call and never mutated after construction.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the API root, including any query string.
    pub path: String,
    /// Optional JSON body.
    pub body: Option<Value>,
    /// Optional `Accept` header override (preview media types).
    pub accept: Option<&'static str>,
}

impl ApiRequest {
    /// Creates a `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
            accept: None,
        }
    }

    /// Creates a `POST` request with a JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
            accept: None,
        }
    }

    /// Creates a `DELETE` request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            path: path.into(),
            body: None,
            accept: None,
        }
    }

    /// Sets the `Accept` header.
    #[must_use]
    pub fn with_accept(mut self, accept: &'static str) -> Self {
        self.accept = Some(accept);
        self
    }
}

/// A response as seen by the throttling layer.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers (rate-limit signals live here).
    pub headers: HeaderMap,
    /// Raw response body.
    pub body: String,
}

impl ApiResponse {
    /// Converts non-success statuses into [`ApiError::Status`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] when the status is not 2xx.
    pub fn into_result(self, path: &str) -> Result<Self, ApiError> {
        if self.status.is_success() {
            return Ok(self);
        }
        Err(ApiError::Status {
            path: path.to_string(),
            status: self.status.as_u16(),
            message: error_message(&self.body),
        })
    }
}

/// Extracts GitHub's `message` field from an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Sends requests to the target API without any retry or throttling.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request and returns the response whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] only for failures below HTTP (network, TLS, encoding).
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// [`Transport`] backed by an authenticated [`Octocrab`] client.
#[derive(Clone)]
pub struct OctocrabTransport {
    octocrab: Octocrab,
}

impl OctocrabTransport {
    /// Wraps an authenticated client.
    #[must_use]
    pub fn new(octocrab: Octocrab) -> Self {
        Self { octocrab }
    }
}

#[async_trait]
impl Transport for OctocrabTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut builder = http::Request::builder()
            .method(request.method.clone())
            .uri(request.path.as_str());
        if let Some(accept) = request.accept {
            builder = builder.header(http::header::ACCEPT, accept);
        }

        let http_request = self.octocrab.build_request(builder, request.body.as_ref())?;
        let response = self.octocrab.execute(http_request).await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = self.octocrab.body_to_string(response).await?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
