//! Common imports for crates built on `webgetter-core`.
//!
//! ```rust
//! use webgetter_core::prelude::*;
//! ```

pub use crate::context::{Context, Value};
pub use crate::error::{FormatError, FormatResult, HostError, HostResult, ParamError, ParamResult};
pub use crate::host::{
    Formatter, FormatterProvider, MatchScope, MessageSender, ParamSource, TextMessage,
    TriggerRegistry, TriggerToken,
};
pub use crate::locale::Locale;
pub use crate::placeholder::{FormatArgs, render, render_context};
