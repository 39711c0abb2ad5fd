//! Configuration file loading.
//!
//! 1. Parse the embedded `defaults.toml` → base
//! 2. Read the file (size limited) and take its `[webgetter]` table, or the
//!    whole document when there is none
//! 3. Deep-merge it over the base
//! 4. Flatten the merged tree into dotted keys

use std::path::Path;

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::params::FlatParams;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Table holding the module's keys in a shared configuration file.
pub const MODULE_SECTION: &str = "webgetter";

/// Load a configuration file into dotted-key parameters.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is missing, too large or malformed.
pub fn load_params(path: &Path) -> ConfigResult<FlatParams> {
    let Some(overlay) = try_load_file(path)? else {
        return Err(ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    };
    info!(path = %path.display(), "loaded webgetter config");
    merge_with_defaults(&overlay)
}

/// Parse configuration text into dotted-key parameters.
///
/// `origin` names the text in error messages.
///
/// # Errors
///
/// Returns [`ConfigError::ParseError`] if the text is not valid TOML.
pub fn parse_params(content: &str, origin: &str) -> ConfigResult<FlatParams> {
    let overlay: toml::Value = toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: origin.to_owned(),
        source: e,
    })?;
    merge_with_defaults(&overlay)
}

fn merge_with_defaults(document: &toml::Value) -> ConfigResult<FlatParams> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let overlay = match document.get(MODULE_SECTION) {
        Some(section @ toml::Value::Table(_)) => section,
        _ => document,
    };
    deep_merge(&mut merged, overlay);

    let params = FlatParams::from_toml(&merged);
    debug!(keys = params.len(), "flattened webgetter config");
    Ok(params)
}

/// Recursively merge `overlay` into `base`. Tables merge key by key; any
/// other overlay value replaces the base value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

/// Try to load a file, returning `None` if the file doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}
