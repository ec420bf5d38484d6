//! HTTP adapter for the portal backend.
//!
//! Every outbound call goes through [`ApiClient`] - pages never talk to the
//! backend directly. The adapter attaches the bearer token when a session
//! exists, normalizes responses (2xx JSON body, or `None` for an empty or
//! non-JSON body) and failures (status + backend message), and treats a 401
//! on any call as a forced-logout signal via the installed
//! [`UnauthorizedHandler`].

mod error;

pub use error::ApiError;

use parking_lot::RwLock;
use reqwest::{header, Client, Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Observer for 401 responses. Installed once at startup; the portal wires
/// an implementation that clears the session and moves the user to the
/// login page.
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self);
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    token: RwLock<Option<String>>,
    on_unauthorized: RwLock<Option<Arc<dyn UnauthorizedHandler>>>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
            on_unauthorized: RwLock::new(None),
        })
    }

    /// Install or clear the bearer credential attached to every request.
    /// Only the auth session manager writes this.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    pub fn has_token(&self) -> bool {
        self.token.read().is_some()
    }

    pub fn set_unauthorized_handler(&self, handler: Arc<dyn UnauthorizedHandler>) {
        *self.on_unauthorized.write() = Some(handler);
    }

    /// Perform a request with an optional JSON body.
    ///
    /// Any 2xx response resolves to its parsed JSON body, or `None` when the
    /// body is empty or not JSON. Any other status fails with an
    /// [`ApiError::Status`] carrying the backend's message.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, ApiError> {
        let mut request = self.http.request(method.clone(), self.url(path));
        let token = self.token.read().clone();
        if let Some(token) = token.as_deref() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        self.dispatch(method, path, request).await
    }

    /// Perform a multipart upload. The transport sets the multipart
    /// content-type and boundary; forcing JSON here would corrupt the body.
    pub async fn request_multipart(
        &self,
        method: Method,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Option<Value>, ApiError> {
        let mut request = self.http.request(method.clone(), self.url(path));
        let token = self.token.read().clone();
        if let Some(token) = token.as_deref() {
            request = request.bearer_auth(token);
        }
        self.dispatch(method, path, request.multipart(form)).await
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<Value>, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let payload = parse_json_body(response).await;

        if status.is_success() {
            debug!(%method, path, %status, "backend call completed");
            return Ok(payload);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.notify_unauthorized();
        }
        Err(ApiError::from_response(status, payload))
    }

    pub(crate) fn notify_unauthorized(&self) {
        let handler = self.on_unauthorized.read().clone();
        if let Some(handler) = handler {
            handler.on_unauthorized();
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // -------------------------------------------------------------------------
    // Convenience forms
    // -------------------------------------------------------------------------

    pub async fn get(&self, path: &str) -> Result<Option<Value>, ApiError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Option<Value>, ApiError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Option<&Value>) -> Result<Option<Value>, ApiError> {
        self.request(Method::PUT, path, body).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<Option<Value>, ApiError> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Option<Value>, ApiError> {
        self.request(Method::DELETE, path, None).await
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Option<Value>, ApiError> {
        self.request_multipart(Method::POST, path, form).await
    }
}

/// A 2xx response without a JSON body is not an error; the caller gets
/// `None`. Parse failures on a JSON content-type fall back to `None` too.
async fn parse_json_body(response: reqwest::Response) -> Option<Value> {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("application/json"))
        .unwrap_or(false);
    if !is_json {
        return None;
    }
    response.json().await.ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> ApiClient {
        ApiClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = client("http://localhost:3000/api/v1/");
        assert_eq!(client.url("/auth/login"), "http://localhost:3000/api/v1/auth/login");
    }

    #[test]
    fn test_token_slot() {
        let client = client("http://localhost:3000/api/v1");
        assert!(!client.has_token());
        client.set_token(Some("tok-123".to_string()));
        assert!(client.has_token());
        client.set_token(None);
        assert!(!client.has_token());
    }

    #[test]
    fn test_notify_without_handler_is_a_noop() {
        let client = client("http://localhost:3000/api/v1");
        client.notify_unauthorized();
    }

    #[test]
    fn test_handler_receives_unauthorized_signal() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct Counter(AtomicUsize);
        impl UnauthorizedHandler for Counter {
            fn on_unauthorized(&self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let client = client("http://localhost:3000/api/v1");
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        client.set_unauthorized_handler(counter.clone());
        client.notify_unauthorized();
        client.notify_unauthorized();
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }
}
