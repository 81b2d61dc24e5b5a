//! Request descriptor and response metadata

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::FetchError;

/// An outbound HTTP request, immutable once handed to the fetcher
#[derive(Debug, Clone)]
pub struct FetchRequest {
    method: Method,
    url: Url,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl FetchRequest {
    /// Creates a request with the given method and URL and no headers or body
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Creates a GET request
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Creates a POST request
    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    /// Appends a header. Names are not validated until the request is sent.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a raw request body
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a JSON body and the matching content type
    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .with_header("Content-Type", "application/json")
            .with_body(body))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// A completed HTTP exchange
///
/// Any status code counts as a completed exchange; use [`FetchResponse::error_for_status`]
/// to turn non-2xx statuses into an application-level [`FetchError::Status`].
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Final URL of the exchange
    pub url: Url,
    /// Response headers in arrival order
    pub headers: Vec<(String, String)>,
    /// Raw response body
    pub body: Vec<u8>,
    /// Duration of the attempt that produced this response
    pub elapsed: Duration,
    /// Number of network attempts used, including this one
    pub attempts: u32,
}

impl FetchResponse {
    /// Creates a response with no headers, as produced by a single attempt
    pub fn new(status: u16, url: Url, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            url,
            headers: Vec::new(),
            body: body.into(),
            elapsed: Duration::ZERO,
            attempts: 1,
        }
    }

    /// Whether the status code is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the first header value matching `name`, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Converts a non-2xx response into [`FetchError::Status`]
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Status {
                status: self.status,
                url: self.url.to_string(),
            })
        }
    }

    /// Decodes the body as JSON, falling back to `T::default()` when decoding fails
    ///
    /// This keeps callers simple at the cost of hiding contract breaks in the
    /// API; the failure is only visible in the log.
    pub fn json_or_default<T: DeserializeOwned + Default>(&self) -> T {
        match serde_json::from_slice(&self.body) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "response body did not decode, using empty result");
                T::default()
            }
        }
    }

    /// Body as UTF-8 text, lossy
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn url() -> Url {
        Url::parse("https://example.test/api/v1/jobs/search").unwrap()
    }

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct Payload {
        items: Vec<String>,
    }

    #[test]
    fn test_with_json_sets_body_and_content_type() {
        let req = FetchRequest::post(url())
            .with_json(&serde_json::json!({"q": "rust"}))
            .unwrap();

        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.body(), Some(br#"{"q":"rust"}"#.as_slice()));
        assert!(req
            .headers()
            .iter()
            .any(|(k, v)| k == "Content-Type" && v == "application/json"));
    }

    #[test]
    fn test_error_for_status_keeps_2xx() {
        let resp = FetchResponse::new(204, url(), Vec::new());
        assert!(resp.error_for_status().is_ok());
    }

    #[test]
    fn test_error_for_status_maps_non_2xx_to_soft_error() {
        let err = FetchResponse::new(503, url(), "down")
            .error_for_status()
            .unwrap_err();

        assert!(err.is_soft());
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[test]
    fn test_json_or_default_decodes_valid_body() {
        let resp = FetchResponse::new(200, url(), r#"{"items":["a","b"]}"#);
        let payload: Payload = resp.json_or_default();
        assert_eq!(payload.items, vec!["a", "b"]);
    }

    #[test]
    fn test_json_or_default_falls_back_on_garbage() {
        let resp = FetchResponse::new(200, url(), "<html>maintenance</html>");
        let payload: Payload = resp.json_or_default();
        assert_eq!(payload, Payload::default());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut resp = FetchResponse::new(200, url(), Vec::new());
        resp.headers
            .push(("content-type".to_string(), "application/json".to_string()));
        assert_eq!(resp.header("Content-Type"), Some("application/json"));
        assert_eq!(resp.header("etag"), None);
    }

    #[test]
    fn test_text_replaces_invalid_utf8() {
        let resp = FetchResponse::new(200, url(), vec![b'o', b'k', 0xff]);
        assert_eq!(resp.text(), "ok\u{fffd}");
    }
}
