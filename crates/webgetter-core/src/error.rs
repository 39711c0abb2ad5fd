//! Error types shared by the WebGetter crates.

use thiserror::Error;

/// Errors produced while formatting a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// A positional specifier referenced an argument that was not supplied.
    #[error("missing argument #{index} for format string")]
    MissingArgument {
        /// 1-based argument index.
        index: usize,
    },

    /// A positional specifier used argument number zero.
    #[error("argument number must be greater than zero")]
    InvalidArgumentIndex,

    /// A `%` was followed by something other than `%`, `s`, `d`, `f`
    /// or an explicit `N$` argument index.
    #[error("unsupported format specifier '{specifier}' at byte {position}")]
    UnsupportedSpecifier {
        /// The offending character.
        specifier: char,
        /// Byte offset of the `%` in the format string.
        position: usize,
    },

    /// The format string ends in the middle of a specifier.
    #[error("missing format specifier at end of string")]
    TrailingPercent,
}

/// Convenience alias.
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors returned by a host configuration source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// The key is not present and no default was given.
    #[error("missing parameter '{key}'")]
    Missing {
        /// Dotted parameter key.
        key: String,
    },

    /// The key is present but its value has the wrong shape.
    #[error("parameter '{key}' is not a valid {expected}: {value:?}")]
    Invalid {
        /// Dotted parameter key.
        key: String,
        /// Human readable name of the expected type.
        expected: &'static str,
        /// The raw value found.
        value: String,
    },
}

/// Convenience alias.
pub type ParamResult<T> = Result<T, ParamError>;

/// Errors reported by host collaborators (message delivery and the like).
#[derive(Debug, Error)]
pub enum HostError {
    /// Sending a message failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The host is not connected.
    #[error("host not connected")]
    NotConnected,
}

/// Convenience alias.
pub type HostResult<T> = Result<T, HostError>;
