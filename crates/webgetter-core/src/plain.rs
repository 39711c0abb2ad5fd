//! A plain formatter for hosts without their own i18n layer.
//!
//! Messages are not translated. `<var name="..."/>` markers are substituted
//! (values are escaped so they cannot inject markup), `<b>`, `<u>` and `<i>`
//! become IRC control codes, any other tag is dropped, and the five basic
//! entities are decoded.

use std::sync::LazyLock;

use regex::Regex;

use crate::host::Formatter;
use crate::locale::Locale;

/// IRC bold toggle.
const IRC_BOLD: &str = "\x02";
/// IRC underline toggle.
const IRC_UNDERLINE: &str = "\x1f";
/// IRC italic toggle.
const IRC_ITALIC: &str = "\x1d";

/// Escape text for safe inclusion in markup.
///
/// Escapes `&`, `<`, `>`, `"`, and `'` so the output is safe in both text
/// content and attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// Reverse of [`escape_html`] (also accepts `&#39;` and `&apos;`).
#[must_use]
pub fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Formatter that renders markup to IRC text without translating.
#[derive(Debug, Clone, Default)]
pub struct PlainFormatter {
    locale: Locale,
}

impl PlainFormatter {
    /// Create a formatter reporting `locale`.
    #[must_use]
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }
}

impl Formatter for PlainFormatter {
    fn translate(&self, template: &str, substitutions: &[(&str, String)]) -> String {
        static VAR: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r#"<var\s+name=["']([^"']+)["']\s*/>"#).expect("invalid regex")
        });

        let markup = VAR.replace_all(template, |caps: &regex::Captures<'_>| {
            substitutions
                .iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| escape_html(value))
                .unwrap_or_default()
        });
        self.render(&markup)
    }

    fn render(&self, markup: &str) -> String {
        static TAG: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"</?([A-Za-z]+)[^>]*>").expect("invalid regex"));

        let text = TAG.replace_all(markup, |caps: &regex::Captures<'_>| {
            match caps[1].to_ascii_lowercase().as_str() {
                "b" => IRC_BOLD,
                "u" => IRC_UNDERLINE,
                "i" => IRC_ITALIC,
                _ => "",
            }
        });
        unescape_html(&text)
    }

    fn locale(&self) -> &Locale {
        &self.locale
    }
}
