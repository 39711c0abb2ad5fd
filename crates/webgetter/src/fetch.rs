//! Executing request descriptors.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue, USER_AGENT};
use tracing::debug;
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::request::{Method, RequestDescriptor};

/// Maximum response body size (5 MB).
pub const MAX_BODY_SIZE: u64 = 5_242_880;

/// A received HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResponse {
    /// Status code. Any status is a response, not an error.
    pub status: u16,
    /// Raw `Content-Type` header.
    pub content_type: Option<String>,
    /// Body bytes.
    pub body: Vec<u8>,
    /// Final URL after redirects.
    pub url: Url,
}

impl FetchedResponse {
    /// A `200` response.
    #[must_use]
    pub fn ok(url: Url, content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: content_type.map(str::to_owned),
            body: body.into(),
            url,
        }
    }

    /// The MIME type: the `Content-Type` header up to the first `;`,
    /// trimmed and lowercased. Empty when there is no header.
    #[must_use]
    pub fn mime_type(&self) -> String {
        self.content_type
            .as_deref()
            .map(mime_type)
            .unwrap_or_default()
    }
}

/// The MIME type part of a `Content-Type` value.
#[must_use]
pub fn mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Executes requests. Implemented over HTTP by [`HttpFetcher`], and by
/// mocks in tests.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform `request`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on transport failures only.
    async fn fetch(&self, request: &RequestDescriptor) -> FetchResult<FetchedResponse>;
}

/// [`Fetcher`] backed by `reqwest`. A client is built per request so every
/// invocation gets its own cookie jar and the descriptor's options.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    max_body_size: Option<u64>,
}

impl HttpFetcher {
    /// Create a fetcher with the default body limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the body size limit.
    #[must_use]
    pub fn with_max_body_size(mut self, limit: u64) -> Self {
        self.max_body_size = Some(limit);
        self
    }

    fn client(request: &RequestDescriptor) -> FetchResult<reqwest::Client> {
        let options = &request.options;
        reqwest::Client::builder()
            .danger_accept_invalid_certs(!options.verify_tls)
            .redirect(reqwest::redirect::Policy::limited(options.max_redirects))
            .cookie_store(options.cookies)
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))
    }
}

fn transport_error(e: &reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(e.to_string())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &RequestDescriptor) -> FetchResult<FetchedResponse> {
        let client = Self::client(request)?;
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = client.request(method, request.url.clone());
        if let Some(agent) = &request.user_agent {
            let value = HeaderValue::from_str(agent)
                .map_err(|e| FetchError::Client(format!("invalid user agent: {e}")))?;
            builder = builder.header(USER_AGENT, value);
        }
        if let Some(body) = &request.body {
            builder = builder
                .header(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/x-www-form-urlencoded"),
                )
                .body(body.clone());
        }

        let mut response = builder.send().await.map_err(|e| transport_error(&e))?;
        let status = response.status().as_u16();
        let url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let limit = self.max_body_size.unwrap_or(MAX_BODY_SIZE);
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(FetchError::BodyTooLarge { limit });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| transport_error(&e))? {
            body.extend_from_slice(&chunk);
            if u64::try_from(body.len()).unwrap_or(u64::MAX) > limit {
                return Err(FetchError::BodyTooLarge { limit });
            }
        }

        debug!(
            status,
            url = %url,
            content_type = content_type.as_deref().unwrap_or_default(),
            bytes = body.len(),
            "fetched response"
        );

        Ok(FetchedResponse {
            status,
            content_type,
            body,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_strips_parameters() {
        assert_eq!(mime_type("text/html; charset=UTF-8"), "text/html");
        assert_eq!(mime_type(" Application/XHTML+XML "), "application/xhtml+xml");
        assert_eq!(mime_type(""), "");
    }

    #[test]
    fn test_response_mime_type() {
        let url = Url::parse("http://x/").unwrap();
        let response = FetchedResponse::ok(url.clone(), Some("text/xml;charset=latin1"), "");
        assert_eq!(response.mime_type(), "text/xml");
        assert_eq!(FetchedResponse::ok(url, None, "").mime_type(), "");
    }

    #[test]
    fn test_client_builds_from_options() {
        let request = RequestDescriptor {
            method: Method::Get,
            url: Url::parse("https://self-signed.example/").unwrap(),
            body: None,
            user_agent: None,
            options: crate::request::NetworkOptions::default(),
        };
        assert!(HttpFetcher::client(&request).is_ok());
    }
}
