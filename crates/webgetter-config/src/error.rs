use thiserror::Error;
use webgetter_core::ParamError;

/// Errors that prevent the module from (re)loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    ReadError {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML.
    #[error("failed to parse {path}: {source}")]
    ParseError {
        /// Path of the file (or `<embedded defaults>`).
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// A declared trigger lacks a required key (`url` or `format`).
    #[error("missing {key} for trigger #{index}")]
    MissingKey {
        /// Trigger index.
        index: usize,
        /// Missing key, relative to the trigger (`"url"`, `"format"`).
        key: &'static str,
    },

    /// Two triggers use the same word.
    #[error("trigger #{second} reuses the word '{trigger}' of trigger #{first}")]
    DuplicateTrigger {
        /// The conflicting word.
        trigger: String,
        /// Index of the first declaration.
        first: usize,
        /// Index of the second declaration.
        second: usize,
    },

    /// A value is outside its accepted range or shape.
    #[error("invalid value for {field}: {message}")]
    ValidationError {
        /// Dotted key of the field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The parameter source rejected a lookup.
    #[error(transparent)]
    Param(#[from] ParamError),
}

/// Convenience alias.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_missing_key() {
        let err = ConfigError::MissingKey {
            index: 2,
            key: "url",
        };
        assert_eq!(err.to_string(), "missing url for trigger #2");
    }

    #[test]
    fn error_display_duplicate() {
        let err = ConfigError::DuplicateTrigger {
            trigger: "weather".to_string(),
            first: 1,
            second: 3,
        };
        assert_eq!(
            err.to_string(),
            "trigger #3 reuses the word 'weather' of trigger #1"
        );
    }

    #[test]
    fn error_from_param() {
        let err: ConfigError = ParamError::Missing {
            key: "1.url".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "missing parameter '1.url'");
    }
}
