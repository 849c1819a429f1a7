use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::error::ErrorKind;

const DEFAULT_MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024; // 10MB

/// Ways a proxied fetch can fail.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("proxy request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("proxy answered {0}")]
    HttpStatus(u16),
    #[error("proxy did not answer in time")]
    Timeout,
    #[error("proxy response exceeds the size limit")]
    ResponseTooLarge,
    /// Body is not the `{"contents": ...}` envelope.
    #[error("unreadable proxy envelope: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("proxy envelope carries no document")]
    EmptyContents,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Timeout => ErrorKind::Timeout,
            FetchError::Network(e) if e.is_timeout() => ErrorKind::Timeout,
            _ => ErrorKind::NetworkError,
        }
    }
}

/// JSON envelope returned by allorigins-style proxies.
#[derive(Debug, Deserialize)]
struct ProxyResponse {
    #[serde(default)]
    contents: Option<String>,
}

/// Fetches raw feed documents through a CORS proxy.
///
/// Requests go to `<base>?url=<feed url>&disableCache=true` and the proxy
/// answers with `{"contents": "<document>"}`. The client is cheap to clone
/// (reqwest pools connections internally).
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    base: Url,
    timeout: Duration,
    max_response_bytes: usize,
}

impl ProxyClient {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(http, base, timeout))
    }

    fn with_client(http: reqwest::Client, base: Url, timeout: Duration) -> Self {
        Self {
            http,
            base,
            timeout,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }

    pub fn max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    /// The proxy URL that fetches `feed_url`.
    pub fn proxied_url(&self, feed_url: &str) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("url", feed_url)
            .append_pair("disableCache", "true");
        url
    }

    /// Fetches the raw document for `feed_url`.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Timeout`] if the whole exchange exceeds the timeout
    /// - [`FetchError::Network`] on connection or TLS failures
    /// - [`FetchError::HttpStatus`] on a non-2xx proxy answer
    /// - [`FetchError::ResponseTooLarge`] over the size limit
    /// - [`FetchError::InvalidBody`] / [`FetchError::EmptyContents`] when the
    ///   envelope carries no document
    pub async fn fetch(&self, feed_url: &str) -> Result<String, FetchError> {
        tokio::time::timeout(self.timeout, self.fetch_inner(feed_url))
            .await
            .map_err(|_| FetchError::Timeout)?
    }

    async fn fetch_inner(&self, feed_url: &str) -> Result<String, FetchError> {
        let response = self.http.get(self.proxied_url(feed_url)).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, self.max_response_bytes).await?;
        let envelope: ProxyResponse = serde_json::from_slice(&bytes)?;

        match envelope.contents {
            Some(contents) if !contents.trim().is_empty() => Ok(contents),
            _ => Err(FetchError::EmptyContents),
        }
    }
}

/// Collects the body, giving up as soon as it grows past `limit`.
async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let declared = response.content_length().unwrap_or(0);
    if declared > limit as u64 {
        return Err(FetchError::ResponseTooLarge);
    }

    let mut body = Vec::with_capacity(declared as usize);
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        if body.len() + chunk.len() > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
