//! Typed configuration schema.

use std::time::Duration;

use serde::Serialize;

/// Default total fetch timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;
/// Default connection timeout, in seconds.
pub const DEFAULT_CONN_TIMEOUT_SECS: u64 = 3;

/// Module-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleConfig {
    /// Total time allowed for one fetch, in seconds.
    #[serde(rename = "timeout")]
    pub timeout_secs: u64,
    /// Time allowed to connect, in seconds.
    #[serde(rename = "conn_timeout")]
    pub conn_timeout_secs: u64,
    /// Configured triggers, ordered by index.
    pub triggers: Vec<TriggerConfig>,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            conn_timeout_secs: DEFAULT_CONN_TIMEOUT_SECS,
            triggers: Vec::new(),
        }
    }
}

impl ModuleConfig {
    /// Total fetch timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connection timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.conn_timeout_secs)
    }

    /// Find a trigger by word, case-insensitively.
    #[must_use]
    pub fn trigger(&self, word: &str) -> Option<&TriggerConfig> {
        let word = word.to_lowercase();
        self.triggers
            .iter()
            .find(|t| t.trigger.to_lowercase() == word)
    }
}

/// A `(name, value)` template pair for a GET or POST parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamTemplate {
    /// Parameter name template.
    pub name: String,
    /// Parameter value template.
    pub value: String,
}

impl ParamTemplate {
    /// Create a pair.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The `User-Agent` policy of a trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserAgent {
    /// Not configured: the module's own user agent is sent.
    #[default]
    Default,
    /// Configured empty: no `User-Agent` header at all.
    Omit,
    /// Configured value.
    Custom(String),
}

impl UserAgent {
    /// Policy for a raw configured value.
    #[must_use]
    pub fn from_configured(value: Option<String>) -> Self {
        match value {
            None => Self::Default,
            Some(v) if v.is_empty() => Self::Omit,
            Some(v) => Self::Custom(v),
        }
    }
}

/// One configured command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerConfig {
    /// 1-based configuration block index.
    pub index: usize,
    /// Command word, matched case-insensitively.
    pub trigger: String,
    /// URL template.
    pub url: String,
    /// Query string parameter templates.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub get_params: Vec<ParamTemplate>,
    /// Form body parameter templates. Any entry selects POST.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_params: Vec<ParamTemplate>,
    /// XPath expression templates for `vars.1..vars.N`.
    pub vars: Vec<String>,
    /// Output template.
    pub format: String,
    /// Input encoding override (WHATWG label).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Preserve whitespace in extracted text and split multi-line values.
    pub pre: bool,
    /// User agent policy.
    pub user_agent: UserAgent,
    /// Usage text for the help provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl TriggerConfig {
    /// A trigger with the required fields and everything else unset.
    #[must_use]
    pub fn new(
        index: usize,
        trigger: impl Into<String>,
        url: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            index,
            trigger: trigger.into(),
            url: url.into(),
            get_params: Vec::new(),
            post_params: Vec::new(),
            vars: Vec::new(),
            format: format.into(),
            encoding: None,
            pre: false,
            user_agent: UserAgent::Default,
            help: None,
        }
    }

    /// Add a GET parameter.
    #[must_use]
    pub fn with_get(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.get_params.push(ParamTemplate::new(name, value));
        self
    }

    /// Add a POST parameter.
    #[must_use]
    pub fn with_post(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.post_params.push(ParamTemplate::new(name, value));
        self
    }

    /// Add an XPath variable.
    #[must_use]
    pub fn with_var(mut self, expression: impl Into<String>) -> Self {
        self.vars.push(expression.into());
        self
    }

    /// Set the encoding override.
    #[must_use]
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Set the preserve-whitespace flag.
    #[must_use]
    pub fn with_pre(mut self, pre: bool) -> Self {
        self.pre = pre;
        self
    }

    /// Set the user agent policy.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: UserAgent) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Set the help text.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Whether requests for this trigger are sent as POST.
    #[must_use]
    pub fn uses_post(&self) -> bool {
        !self.post_params.is_empty()
    }
}
