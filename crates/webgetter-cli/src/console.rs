//! A host that prints messages to the terminal.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use colored::Colorize;
use webgetter_core::{
    Formatter, FormatterProvider, HostResult, Locale, MatchScope, MessageSender, PlainFormatter,
    TriggerRegistry, TriggerToken,
};

const IRC_BOLD: char = '\x02';
const IRC_UNDERLINE: char = '\x1f';
const IRC_ITALIC: char = '\x1d';

/// Console host: every word can be registered once, messages go to stdout.
#[derive(Debug)]
pub(crate) struct ConsoleHost {
    locale: Locale,
    ansi: bool,
    words: Mutex<HashSet<String>>,
}

impl ConsoleHost {
    pub(crate) fn new(locale: Locale, ansi: bool) -> Self {
        Self {
            locale,
            ansi,
            words: Mutex::new(HashSet::new()),
        }
    }

    /// The line printed for a message to `target`.
    pub(crate) fn line(&self, target: &str, text: &str) -> String {
        let body = to_terminal(text, self.ansi);
        if self.ansi {
            format!("{} {body}", format!("[{target}]").dimmed())
        } else {
            format!("[{target}] {body}")
        }
    }
}

impl TriggerRegistry for ConsoleHost {
    fn register_triggers(&self, trigger: &str, _scope: MatchScope) -> Option<TriggerToken> {
        let word = trigger.to_lowercase();
        let mut words = self.words.lock().unwrap_or_else(PoisonError::into_inner);
        words.insert(word.clone()).then(|| TriggerToken::new(word))
    }

    fn free_triggers(&self, token: &TriggerToken) -> bool {
        self.words
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token.as_str())
    }
}

#[async_trait]
impl MessageSender for ConsoleHost {
    async fn send_message(&self, target: &str, text: &str) -> HostResult<()> {
        println!("{}", self.line(target, text));
        Ok(())
    }
}

impl FormatterProvider for ConsoleHost {
    fn formatter(&self, _channel: Option<&str>) -> Arc<dyn Formatter> {
        Arc::new(PlainFormatter::new(self.locale.clone()))
    }
}

/// Replace IRC formatting toggles with ANSI sequences, or drop them.
pub(crate) fn to_terminal(text: &str, ansi: bool) -> String {
    let (mut bold, mut underline, mut italic) = (false, false, false);
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let (flag, on, off) = match c {
            IRC_BOLD => (&mut bold, "\x1b[1m", "\x1b[22m"),
            IRC_UNDERLINE => (&mut underline, "\x1b[4m", "\x1b[24m"),
            IRC_ITALIC => (&mut italic, "\x1b[3m", "\x1b[23m"),
            _ => {
                out.push(c);
                continue;
            },
        };
        *flag = !*flag;
        if ansi {
            out.push_str(if *flag { on } else { off });
        }
    }
    if ansi && (bold || underline || italic) {
        out.push_str("\x1b[0m");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_dropped_without_ansi() {
        assert_eq!(to_terminal("\x02Usage:\x02 \x1fcity\x1f", false), "Usage: city");
    }

    #[test]
    fn test_codes_toggle_ansi() {
        assert_eq!(
            to_terminal("\x02a\x02b", true),
            "\x1b[1ma\x1b[22mb"
        );
        assert_eq!(to_terminal("\x1fa", true), "\x1b[4ma\x1b[0m");
    }

    #[test]
    fn test_registry_refuses_duplicates() {
        let host = ConsoleHost::new(Locale::default(), false);
        let token = host.register_triggers("Weather", MatchScope::Any).unwrap();
        assert!(host.register_triggers("weather", MatchScope::Any).is_none());
        assert!(host.free_triggers(&token));
        assert!(host.register_triggers("weather", MatchScope::Any).is_some());
    }

    #[test]
    fn test_plain_line() {
        let host = ConsoleHost::new(Locale::default(), false);
        assert_eq!(host.line("#chan", "\x0272F\x02 degrees"), "[#chan] 72F degrees");
    }
}
