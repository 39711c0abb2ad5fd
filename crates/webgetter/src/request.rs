//! Request construction.
//!
//! Turns a trigger's templates and an invocation context into a fully
//! specified [`RequestDescriptor`]. Nothing here touches the network.

use std::fmt;
use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;
use webgetter_config::{ModuleConfig, ParamTemplate, TriggerConfig, UserAgent};
use webgetter_core::Context;
use webgetter_core::placeholder::render_context;

use crate::error::{RequestError, RequestResult};

/// Everything outside RFC 3986 "unreserved" is escaped.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// `User-Agent` sent when a trigger does not configure one.
pub const DEFAULT_USER_AGENT: &str = concat!("webgetter/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects followed.
pub const MAX_REDIRECTS: usize = 10;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST` with a form body.
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// Transport options shared by every request of the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkOptions {
    /// Total time allowed.
    pub timeout: Duration,
    /// Time allowed to connect.
    pub connect_timeout: Duration,
    /// Redirect limit.
    pub max_redirects: usize,
    /// Verify TLS certificates and host names. Off: targets are chosen by
    /// the bot operator, not by chat users.
    pub verify_tls: bool,
    /// Keep cookies across the redirects of one request.
    pub cookies: bool,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self::from_config(&ModuleConfig::default())
    }
}

impl NetworkOptions {
    /// Options for a module configuration.
    #[must_use]
    pub fn from_config(config: &ModuleConfig) -> Self {
        Self {
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
            max_redirects: MAX_REDIRECTS,
            verify_tls: false,
            cookies: true,
        }
    }
}

/// A fully resolved outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Method.
    pub method: Method,
    /// Target, with the merged query string.
    pub url: Url,
    /// `application/x-www-form-urlencoded` body, for POST.
    pub body: Option<String>,
    /// `User-Agent` header value; `None` sends no header.
    pub user_agent: Option<String>,
    /// Transport options.
    pub options: NetworkOptions,
}

/// Build the request for `trigger` in `context`.
///
/// # Errors
///
/// Returns [`RequestError::Format`] if a template cannot be rendered and
/// [`RequestError::InvalidUrl`] if the rendered URL does not parse.
pub fn build(
    trigger: &TriggerConfig,
    context: &Context,
    options: &NetworkOptions,
) -> RequestResult<RequestDescriptor> {
    let rendered = render_context(&trigger.url, context)?;
    let mut url = Url::parse(&rendered).map_err(|source| RequestError::InvalidUrl {
        url: rendered.clone(),
        source,
    })?;

    let get = encode_pairs(&trigger.get_params, context)?;
    let query = merge_query(&get, url.query());
    url.set_query(query.as_deref());

    let (method, body) = if trigger.uses_post() {
        (
            Method::Post,
            Some(encode_pairs(&trigger.post_params, context)?),
        )
    } else {
        (Method::Get, None)
    };

    let user_agent = match &trigger.user_agent {
        UserAgent::Default => Some(DEFAULT_USER_AGENT.to_owned()),
        UserAgent::Omit => None,
        UserAgent::Custom(value) => Some(value.clone()),
    };

    Ok(RequestDescriptor {
        method,
        url,
        body,
        user_agent,
        options: options.clone(),
    })
}

/// Percent-encode a string for use as a query or form component.
#[must_use]
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, QUERY_COMPONENT).to_string()
}

/// Render and encode parameter pairs as `name=value&...`. A repeated name
/// overwrites the earlier value in place.
///
/// # Errors
///
/// Returns a [`FormatError`](webgetter_core::FormatError) if a template
/// cannot be rendered.
pub fn encode_pairs(
    pairs: &[ParamTemplate],
    context: &Context,
) -> RequestResult<String> {
    let mut resolved: Vec<(String, String)> = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let name = render_context(&pair.name, context)?;
        let value = render_context(&pair.value, context)?;
        if let Some(existing) = resolved.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = value;
        } else {
            resolved.push((name, value));
        }
    }

    Ok(resolved
        .iter()
        .map(|(n, v)| format!("{}={}", encode_component(n), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&"))
}

/// Join the builder's parameters with the URL's own query: builder first,
/// single `&` separators, no empty parts.
fn merge_query(added: &str, existing: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [added, existing.unwrap_or_default()]
        .into_iter()
        .map(|p| p.trim_matches('&'))
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use webgetter_core::Locale;

    use super::*;

    fn ctx(text: &str) -> Context {
        Context::for_invocation(&Locale::default(), text)
    }

    fn weather() -> TriggerConfig {
        TriggerConfig::new(1, "weather", "http://x/?c=$(0)", "$(vars.1) degrees")
    }

    #[test]
    fn test_url_rendered_from_context() {
        let req = build(&weather(), &ctx("weather paris"), &NetworkOptions::default()).unwrap();
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.url.as_str(), "http://x/?c=paris");
        assert_eq!(req.body, None);
        assert_eq!(req.user_agent.as_deref(), Some(DEFAULT_USER_AGENT));
    }

    #[test]
    fn test_get_params_come_before_existing_query() {
        let trigger = weather().with_get("lang", "$(language)").with_get("q", "$(1)");
        let req = build(&trigger, &ctx("weather paris"), &NetworkOptions::default()).unwrap();
        assert_eq!(req.url.query(), Some("lang=en&q=paris&c=paris"));
    }

    #[test]
    fn test_no_duplicate_separators() {
        let trigger = TriggerConfig::new(1, "w", "http://x/?&a=1&", "f").with_get("b", "2");
        let req = build(&trigger, &ctx("w"), &NetworkOptions::default()).unwrap();
        assert_eq!(req.url.query(), Some("b=2&a=1"));

        let trigger = TriggerConfig::new(1, "w", "http://x/path", "f").with_get("b", "2");
        let req = build(&trigger, &ctx("w"), &NetworkOptions::default()).unwrap();
        assert_eq!(req.url.as_str(), "http://x/path?b=2");
    }

    #[test]
    fn test_no_query_at_all() {
        let trigger = TriggerConfig::new(1, "w", "http://x/path", "f");
        let req = build(&trigger, &ctx("w"), &NetworkOptions::default()).unwrap();
        assert_eq!(req.url.query(), None);
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let trigger = TriggerConfig::new(1, "w", "http://x/", "f").with_get("q", "$(0)");
        let req = build(&trigger, &ctx("w new york & co~"), &NetworkOptions::default()).unwrap();
        assert_eq!(req.url.query(), Some("q=new%20york%20%26%20co~"));
    }

    #[test]
    fn test_repeated_name_replaces_in_place() {
        let pairs = vec![
            ParamTemplate::new("a", "1"),
            ParamTemplate::new("b", "2"),
            ParamTemplate::new("a", "3"),
        ];
        assert_eq!(encode_pairs(&pairs, &Context::new()).unwrap(), "a=3&b=2");
    }

    #[test]
    fn test_post_selected_even_with_get_params() {
        let trigger = weather().with_get("g", "1").with_post("city", "$(0)");
        let req = build(&trigger, &ctx("weather saint étienne"), &NetworkOptions::default())
            .unwrap();
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.body.as_deref(), Some("city=saint%20%C3%A9tienne"));
        assert_eq!(req.url.query(), Some("g=1&c=saint%20%C3%A9tienne"));
    }

    #[test]
    fn test_user_agent_policies() {
        let omit = weather().with_user_agent(UserAgent::Omit);
        let req = build(&omit, &ctx("weather x"), &NetworkOptions::default()).unwrap();
        assert_eq!(req.user_agent, None);

        let custom = weather().with_user_agent(UserAgent::Custom("Mozilla/5.0".into()));
        let req = build(&custom, &ctx("weather x"), &NetworkOptions::default()).unwrap();
        assert_eq!(req.user_agent.as_deref(), Some("Mozilla/5.0"));
    }

    #[test]
    fn test_network_options_from_config() {
        let config = ModuleConfig {
            timeout_secs: 20,
            conn_timeout_secs: 4,
            triggers: Vec::new(),
        };
        let options = NetworkOptions::from_config(&config);
        assert_eq!(options.timeout, Duration::from_secs(20));
        assert_eq!(options.connect_timeout, Duration::from_secs(4));
        assert!(!options.verify_tls);
        assert!(options.cookies);
        assert_eq!(options.max_redirects, 10);
    }

    #[test]
    fn test_invalid_url() {
        let trigger = TriggerConfig::new(1, "w", "$(0)", "f");
        let err = build(&trigger, &ctx("w nowhere"), &NetworkOptions::default()).unwrap_err();
        assert!(matches!(err, RequestError::InvalidUrl { ref url, .. } if url == "nowhere"));
    }
}
