#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Trigger configuration for the WebGetter module.
//!
//! The host exposes module configuration as flat dotted keys
//! (`"1.trigger"`, `"1.get.2.value"`, `"timeout"`). This crate parses those
//! keys once, at load time, into the typed [`ModuleConfig`] /
//! [`TriggerConfig`] schema and validates it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use webgetter_config::ModuleConfig;
//!
//! let config = ModuleConfig::load_file(std::path::Path::new("webgetter.toml")).unwrap();
//! for trigger in &config.triggers {
//!     println!("#{} {} -> {}", trigger.index, trigger.trigger, trigger.url);
//! }
//! ```
//!
//! # File format
//!
//! TOML, with the module's keys either at the top level or under a
//! `[webgetter]` table. Tables nest into dotted keys and arrays into 1-based
//! indices, so these are equivalent:
//!
//! ```toml
//! [webgetter.1]
//! trigger = "weather"
//! url = "http://example.com/?c=$(0)"
//! vars = ["//span[@class='t']"]
//! format = "$(vars.1) degrees"
//! ```
//!
//! ```toml
//! [webgetter]
//! "1.trigger" = "weather"
//! "1.url" = "http://example.com/?c=$(0)"
//! "1.vars.1" = "//span[@class='t']"
//! "1.format" = "$(vars.1) degrees"
//! ```

/// Configuration error types.
pub mod error;
/// Configuration file loading.
pub mod loader;
/// Flat dotted-key parameter store.
pub mod params;
/// Dotted keys to typed schema.
pub mod schema;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use params::FlatParams;
pub use types::*;

impl ModuleConfig {
    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, or if
    /// the configuration is invalid.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        let params = loader::load_params(path)?;
        Self::from_params(&params)
    }
}
