//! Locale tags as used by the bot's translator (`fr_FR`, `en_US.UTF-8`, ...).

use std::fmt;

/// A parsed POSIX-style locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    language: String,
    script: Option<String>,
    region: String,
}

impl Locale {
    /// Parse a locale identifier.
    ///
    /// The codeset (`.UTF-8`) and modifier (`@euro`) suffixes are dropped.
    /// Both `_` and `-` are accepted as subtag separators. Unparseable input
    /// yields an empty language and region.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let base = raw
            .split(['.', '@'])
            .next()
            .unwrap_or_default()
            .trim();

        let mut parts = base.split(['_', '-']).filter(|p| !p.is_empty());
        let language = parts
            .next()
            .filter(|p| p.chars().all(|c| c.is_ascii_alphabetic()))
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let mut script = None;
        let mut region = String::new();
        for part in parts {
            let alpha = part.chars().all(|c| c.is_ascii_alphabetic());
            let digits = part.chars().all(|c| c.is_ascii_digit());
            if alpha && part.len() == 4 && script.is_none() {
                let mut s = part.to_ascii_lowercase();
                if let Some(first) = s.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                script = Some(s);
            } else if (alpha && part.len() == 2) || (digits && part.len() == 3) {
                region = part.to_ascii_uppercase();
                break;
            }
        }

        Self {
            language,
            script,
            region,
        }
    }

    /// ISO 639 language code, lowercase.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Region code, uppercase; empty if the locale has none.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Canonical `language_Script_REGION` tag.
    #[must_use]
    pub fn tag(&self) -> String {
        let mut tag = self.language.clone();
        for part in [self.script.as_deref(), Some(self.region.as_str())]
            .into_iter()
            .flatten()
            .filter(|p| !p.is_empty())
        {
            tag.push('_');
            tag.push_str(part);
        }
        tag
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::parse("en_US")
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}
