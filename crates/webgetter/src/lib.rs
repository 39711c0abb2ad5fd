//! WebGetter - chat triggers that fetch a page and answer with XPath extracts.
//!
//! Each configured trigger describes one request (URL, query and form
//! parameters), a list of XPath expressions and an output format. When a
//! chat message starts with the trigger word, the module:
//!
//! 1. Builds the request from the message words ([`request`])
//! 2. Fetches it ([`fetch`])
//! 3. Evaluates the expressions into `vars.1`..`vars.N` ([`extract`])
//! 4. Renders the format, once per row when variables hold several values
//!    ([`render`])
//! 5. Sends the lines back through the host ([`module`])
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use webgetter::WebGetter;
//! use webgetter_core::{Formatter, FormatterProvider, PlainFormatter};
//! # use webgetter_core::{HostResult, MatchScope, MessageSender, TriggerRegistry, TriggerToken};
//! # struct Host;
//! # impl TriggerRegistry for Host {
//! #     fn register_triggers(&self, t: &str, _: MatchScope) -> Option<TriggerToken> {
//! #         Some(TriggerToken::new(t))
//! #     }
//! #     fn free_triggers(&self, _: &TriggerToken) -> bool { true }
//! # }
//! # #[async_trait::async_trait]
//! # impl MessageSender for Host {
//! #     async fn send_message(&self, _: &str, _: &str) -> HostResult<()> { Ok(()) }
//! # }
//! # impl FormatterProvider for Host {
//! #     fn formatter(&self, _: Option<&str>) -> Arc<dyn Formatter> {
//! #         Arc::new(PlainFormatter::default())
//! #     }
//! # }
//! # async fn demo(params: &dyn webgetter_core::ParamSource) -> webgetter::WebGetterResult<()> {
//! let host = Arc::new(Host);
//! let module = WebGetter::new(host.clone(), host.clone(), host);
//! module.reload(params)?;
//!
//! let message = webgetter_core::TextMessage::channel("alice", "#chan", "weather paris");
//! if module.matches(&message.text) {
//!     module.handle_request(&message).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod encoding;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod module;
pub mod render;
pub mod request;

pub use error::{
    ExtractError, ExtractResult, ExtractionEncodingError, FetchError, FetchResult, RequestError,
    RequestResult, WebGetterError, WebGetterResult,
};
pub use extract::{SUPPORTED_MIME_TYPES, extract};
pub use fetch::{FetchedResponse, Fetcher, HttpFetcher, MAX_BODY_SIZE};
pub use module::{MODULE_NAME, WebGetter};
pub use render::{Notice, OutputLine, render_rows};
pub use request::{DEFAULT_USER_AGENT, Method, NetworkOptions, RequestDescriptor};
