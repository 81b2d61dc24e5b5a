//! The network seam: one attempt of one request

use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use super::{FetchRequest, FetchResponse, TransportError, TransportErrorKind};

/// Performs a single network attempt
///
/// Implementations must not retry; retrying is the fetcher's job.
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        request: &'a FetchRequest,
    ) -> BoxFuture<'a, Result<FetchResponse, TransportError>>;
}

/// [`Transport`] backed by a shared `reqwest::Client`
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn execute(&self, request: &FetchRequest) -> Result<FetchResponse, TransportError> {
        let headers = header_map(request.headers())?;
        let mut builder = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(headers);
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let url = response.url().clone();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        let body = response.bytes().await?;

        Ok(FetchResponse {
            headers,
            ..FetchResponse::new(status, url, body.to_vec())
        })
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        request: &'a FetchRequest,
    ) -> BoxFuture<'a, Result<FetchResponse, TransportError>> {
        Box::pin(self.execute(request))
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            TransportError::new(
                TransportErrorKind::InvalidRequest,
                format!("invalid header name {name:?}: {e}"),
            )
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            TransportError::new(
                TransportErrorKind::InvalidRequest,
                format!("invalid value for header {name}: {e}"),
            )
        })?;
        map.append(name, value);
    }
    Ok(map)
}
