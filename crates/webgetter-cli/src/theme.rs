//! CLI theme and styling.

use colored::Colorize;

/// CLI theme configuration.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format an error message.
    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    /// Format a warning message.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    /// Format a list item.
    pub(crate) fn item(text: &str) -> String {
        format!("  {} {}", "•".dimmed(), text)
    }

    /// Format a dimmed message.
    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styles_keep_text() {
        colored::control::set_override(false);
        assert_eq!(Theme::header("Triggers"), "Triggers");
        assert_eq!(Theme::item("weather"), "  • weather");
        assert_eq!(Theme::warning("nope"), "! nope");
        assert_eq!(Theme::error("bad"), "✗ bad");
        assert_eq!(Theme::dimmed("x"), "x");
    }
}
