//! HTTP Client Abstraction
//!
//! Typed request/response model for the two remote services: JSON calls to
//! the store API, form-encoded and multipart posts to the device portal.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Request body variants.
///
/// The store API takes form-encoded logins and plain GETs; the device portal
/// takes form-encoded logins and a multipart upload with one file part.
#[derive(Debug, Clone)]
pub enum HttpBody {
    Raw(Bytes),
    Form(Vec<(String, String)>),
    Multipart(MultipartForm),
}

/// A multipart form with text fields and at most one file part.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub file: Option<FilePart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.file = Some(FilePart {
            name: name.into(),
            path: path.into(),
        });
        self
    }
}

/// A file part referenced by path; the client streams it at send time.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub name: String,
    pub path: PathBuf,
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<HttpBody>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Form-encoded body; the client sets the content type.
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = Some(HttpBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ));
        self
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = Some(HttpBody::Multipart(form));
        self
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(HttpBody::Raw(body));
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// HTTP response
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Parse response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON deserialization failed: {}", e))
        })
    }

    /// Get response body as UTF-8 string
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid UTF-8: {}", e)))
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Error out on non-2xx statuses, passing the response through otherwise.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(BridgeError::Http {
                status: self.status,
                message: String::from_utf8_lossy(&self.body).into_owned(),
            })
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Whether to use exponential backoff
    pub use_exponential_backoff: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            use_exponential_backoff: true,
        }
    }
}

/// Async HTTP client trait
///
/// Implementations are expected to keep cookies across requests (the device
/// portal authenticates by session cookie) and to retry transparently on
/// 429/5xx per the configured [`RetryPolicy`].
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request, buffering the full response body.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Execute an HTTP request with a custom retry policy.
    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let _ = policy;
        self.execute(request).await
    }

    /// Stream a response body to a local file, returning the byte count.
    ///
    /// Used for asset downloads that must not be buffered in memory.
    async fn download_to_file(&self, request: HttpRequest, dest: &Path) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::get("https://example.com")
            .header("User-Agent", "test")
            .timeout(Duration::from_secs(30));

        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.headers.get("User-Agent"), Some(&"test".to_string()));
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_form_body() {
        let request =
            HttpRequest::post("https://example.com/login").form([("username", "u"), ("password", "p")]);

        match request.body {
            Some(HttpBody::Form(fields)) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0], ("username".to_string(), "u".to_string()));
            }
            other => panic!("expected form body, got {:?}", other),
        }
    }

    #[test]
    fn test_multipart_form() {
        let form = MultipartForm::new()
            .text("csrfmiddlewaretoken", "tok")
            .file("file", "/tmp/game.pdx.zip");

        assert_eq!(form.fields.len(), 1);
        let file = form.file.expect("file part");
        assert_eq!(file.name, "file");
        assert_eq!(file.path, PathBuf::from("/tmp/game.pdx.zip"));
    }

    #[test]
    fn test_error_for_status() {
        let ok = HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from("ok"),
        };
        assert!(ok.error_for_status().is_ok());

        let not_found = HttpResponse {
            status: 404,
            headers: HashMap::new(),
            body: Bytes::from("missing"),
        };
        match not_found.error_for_status() {
            Err(BridgeError::Http { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "missing");
            }
            other => panic!("expected http error, got {:?}", other),
        }
    }
}
