//! Error types for the fetch pipeline and the module.

use thiserror::Error;
use webgetter_config::ConfigError;
use webgetter_core::{FormatError, HostError};

/// Errors building a request descriptor.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The rendered URL could not be parsed.
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        /// The rendered URL.
        url: String,
        /// Parser error.
        source: url::ParseError,
    },

    /// A template could not be rendered.
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Convenience alias.
pub type RequestResult<T> = Result<T, RequestError>;

/// Transport-level fetch failures. HTTP error statuses are not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The HTTP client could not be configured.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// Connection, TLS, redirect or protocol failure.
    #[error("{0}")]
    Transport(String),

    /// The response body exceeded the size limit.
    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge {
        /// Limit in bytes.
        limit: u64,
    },
}

/// Convenience alias.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors extracting values from a response.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The response's MIME type is not an HTML or XML type.
    #[error("unsupported content type '{0}'")]
    UnsupportedContentType(String),

    /// An XPath template could not be rendered.
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Convenience alias.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// A single extracted value could not be moved to the effective encoding.
/// The value is kept as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionEncodingError {
    /// The value has characters the document's encoding cannot represent.
    #[error("value is not representable in {encoding}")]
    Unencodable {
        /// Name of the source encoding.
        encoding: &'static str,
    },

    /// The recovered bytes are not valid in the effective encoding.
    #[error("value is not valid {encoding}")]
    Undecodable {
        /// Name of the effective encoding.
        encoding: &'static str,
    },
}

/// Errors surfaced by the module to its host.
#[derive(Debug, Error)]
pub enum WebGetterError {
    /// The configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The host refused a trigger word.
    #[error("Could not register trigger #{index} ({trigger})")]
    Registration {
        /// Trigger index.
        index: usize,
        /// The refused word.
        trigger: String,
    },

    /// Sending a message failed.
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Convenience alias.
pub type WebGetterResult<T> = Result<T, WebGetterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_registration() {
        let err = WebGetterError::Registration {
            index: 2,
            trigger: "weather".to_string(),
        };
        assert_eq!(err.to_string(), "Could not register trigger #2 (weather)");
    }

    #[test]
    fn error_display_fetch() {
        assert_eq!(FetchError::Timeout.to_string(), "request timed out");
        assert_eq!(
            FetchError::BodyTooLarge { limit: 10 }.to_string(),
            "response body exceeds 10 bytes"
        );
    }

    #[test]
    fn error_display_invalid_url() {
        let source = url::Url::parse("not a url").unwrap_err();
        let err = RequestError::InvalidUrl {
            url: "not a url".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("invalid URL 'not a url'"));
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RequestError>();
        assert_send_sync::<FetchError>();
        assert_send_sync::<ExtractError>();
        assert_send_sync::<WebGetterError>();
    }
}
