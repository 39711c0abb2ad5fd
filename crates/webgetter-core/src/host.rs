//! Traits implemented by the host bot runtime.
//!
//! The module never talks to IRC, configuration storage or the translator
//! directly. Everything it needs from its host goes through these traits, so
//! the same module runs inside a real bot, the console host of
//! `webgetter-cli`, or the mocks of `webgetter-test`.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{HostResult, ParamResult};
use crate::locale::Locale;

/// Access to the module's configuration parameters, keyed by dotted paths
/// such as `"1.trigger"` or `"1.get.2.value"`.
pub trait ParamSource: Send + Sync {
    /// All parameter names available to the module.
    fn param_names(&self) -> BTreeSet<String>;

    /// Whether a parameter is set.
    fn has_param(&self, key: &str) -> bool {
        self.param_names().contains(key)
    }

    /// Read a string parameter, falling back to `default` when unset.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::Missing`](crate::ParamError::Missing) when the
    /// key is unset and no default is given.
    fn parse_string(&self, key: &str, default: Option<&str>) -> ParamResult<String>;

    /// Read an integer parameter, falling back to `default` when unset.
    ///
    /// # Errors
    ///
    /// Returns an error when the key is unset without default, or when the
    /// value is not an integer.
    fn parse_int(&self, key: &str, default: Option<i64>) -> ParamResult<i64>;

    /// Read a boolean parameter, falling back to `default` when unset.
    ///
    /// # Errors
    ///
    /// Returns an error when the key is unset without default, or when the
    /// value is not a boolean.
    fn parse_bool(&self, key: &str, default: Option<bool>) -> ParamResult<bool>;
}

/// How a trigger word is registered with the host's trigger registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchScope {
    /// The trigger applies in every channel and in private messages.
    Any,
    /// The trigger applies to the channel the module was loaded for.
    Channel,
}

/// Opaque handle returned by a successful trigger registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TriggerToken(String);

impl TriggerToken {
    /// Wrap a host-issued token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TriggerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The host's registry of command words.
pub trait TriggerRegistry: Send + Sync {
    /// Reserve `trigger`. Returns `None` if another module already owns it.
    fn register_triggers(&self, trigger: &str, scope: MatchScope) -> Option<TriggerToken>;

    /// Release a previously registered trigger. Returns whether the token was
    /// known.
    fn free_triggers(&self, token: &TriggerToken) -> bool;
}

/// Delivers chat messages.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send `text` to a channel or nickname.
    async fn send_message(&self, target: &str, text: &str) -> HostResult<()>;
}

/// The host's i18n formatter for one channel (or the bot itself).
pub trait Formatter: Send + Sync {
    /// Translate a message template with `<var name="..."/>` markers and
    /// render the resulting markup.
    fn translate(&self, template: &str, substitutions: &[(&str, String)]) -> String;

    /// Render markup (`<b>`, `<u>`, entities...) into wire text.
    fn render(&self, markup: &str) -> String;

    /// The formatter's message locale.
    fn locale(&self) -> &Locale;
}

/// Hands out formatters: per channel, or the bot-wide one for `None`.
pub trait FormatterProvider: Send + Sync {
    /// The formatter for `channel`.
    fn formatter(&self, channel: Option<&str>) -> Arc<dyn Formatter>;
}

/// An incoming text message (channel or private).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    /// Nickname of the sender.
    pub source: String,
    /// Channel the message was sent to; `None` for private messages.
    pub channel: Option<String>,
    /// The message text.
    pub text: String,
}

impl TextMessage {
    /// A message sent to a channel.
    #[must_use]
    pub fn channel(
        source: impl Into<String>,
        channel: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            channel: Some(channel.into()),
            text: text.into(),
        }
    }

    /// A private message.
    #[must_use]
    pub fn private(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            channel: None,
            text: text.into(),
        }
    }

    /// Where replies go: the channel, or the sender for private messages.
    #[must_use]
    pub fn reply_target(&self) -> &str {
        self.channel.as_deref().unwrap_or(&self.source)
    }

    /// Whether this is a private message.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.channel.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_target_channel() {
        let msg = TextMessage::channel("alice", "#chan", "weather paris");
        assert_eq!(msg.reply_target(), "#chan");
        assert!(!msg.is_private());
    }

    #[test]
    fn test_reply_target_private() {
        let msg = TextMessage::private("alice", "weather paris");
        assert_eq!(msg.reply_target(), "alice");
        assert!(msg.is_private());
    }
}
