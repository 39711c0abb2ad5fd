//! WebGetter Core - Foundation types for the WebGetter bot module.
//!
//! This crate provides:
//! - The per-invocation [`Context`] and its [`Value`]s
//! - The named-placeholder formatter (`$(name)` templates)
//! - Locale parsing for the locale fields of a context
//! - The traits through which the module talks to its host bot runtime
//! - A plain formatter usable as a default host formatter
//!
//! # Example
//!
//! ```rust
//! use webgetter_core::{Context, placeholder};
//!
//! let mut ctx = Context::new();
//! ctx.insert("vars.1", "72F");
//! let line = placeholder::render_context("$(vars.1) degrees", &ctx).unwrap();
//! assert_eq!(line, "72F degrees");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod context;
pub mod error;
pub mod host;
pub mod locale;
pub mod placeholder;
pub mod plain;

pub use context::{Context, Value};
pub use error::{FormatError, FormatResult, HostError, HostResult, ParamError, ParamResult};
pub use host::{
    Formatter, FormatterProvider, MatchScope, MessageSender, ParamSource, TextMessage,
    TriggerRegistry, TriggerToken,
};
pub use locale::Locale;
pub use placeholder::FormatArgs;
pub use plain::PlainFormatter;
