//! Row expansion and rendering of a trigger's output format.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use webgetter_config::TriggerConfig;
use webgetter_core::placeholder::render_context;
use webgetter_core::{Context, FormatResult, Value};

/// Prefix of the keys holding extracted values.
const VARS_PREFIX: &str = "vars.";

/// Informational lines produced instead of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The format rendered to nothing.
    NothingToSend,
    /// List values of different lengths cannot be zipped into rows.
    VaryingLengths,
}

impl Notice {
    /// The message template handed to the host translator.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::NothingToSend => "Oops, nothing to send!",
            Self::VaryingLengths => "Multiple arrays with varying lengths found",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// One line to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    /// Rendered output, still markup.
    Text(String),
    /// A notice, to be translated.
    Notice(Notice),
}

/// Render the trigger's format against `context`.
///
/// Without list values the format is rendered once. With list values, all
/// of the same length N, it is rendered once per row `0..N` with each list
/// replaced by its item for that row; empty rows are skipped. With `pre`,
/// every extracted scalar is first split into lines.
///
/// # Errors
///
/// Returns a [`FormatError`](webgetter_core::FormatError) if the format
/// cannot be rendered.
pub fn render_rows(trigger: &TriggerConfig, context: &Context) -> FormatResult<Vec<OutputLine>> {
    let context = if trigger.pre {
        Cow::Owned(split_lines(context))
    } else {
        Cow::Borrowed(context)
    };

    let lengths: BTreeSet<usize> = context
        .iter()
        .filter_map(|(_, value)| value.as_list().map(<[String]>::len))
        .collect();

    let mut lines = Vec::new();
    match lengths.len() {
        0 => {
            let line = render_context(&trigger.format, &context)?;
            if !line.is_empty() {
                lines.push(OutputLine::Text(line));
            }
        },
        1 => {
            let rows = lengths.first().copied().unwrap_or_default();
            for row in 0..rows {
                let line = render_context(&trigger.format, &context.row(row))?;
                if !line.is_empty() {
                    lines.push(OutputLine::Text(line));
                }
            }
        },
        _ => return Ok(vec![OutputLine::Notice(Notice::VaryingLengths)]),
    }

    if lines.is_empty() {
        lines.push(OutputLine::Notice(Notice::NothingToSend));
    }
    Ok(lines)
}

/// Split every scalar `vars.*` entry on line breaks. The result is always a
/// list, even for a single line.
fn split_lines(context: &Context) -> Context {
    static LINE_BREAK: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\r\n|\r|\n").expect("invalid regex"));

    let mut split = context.clone();
    for (key, value) in split.iter_mut() {
        if !key.starts_with(VARS_PREFIX) {
            continue;
        }
        if let Value::Text(text) = value {
            let items = LINE_BREAK.split(text.as_str()).map(str::to_owned).collect();
            *value = Value::List(items);
        }
    }
    split
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger(format: &str) -> TriggerConfig {
        TriggerConfig::new(1, "w", "http://x/", format)
    }

    fn list(items: &[&str]) -> Value {
        Value::List(items.iter().map(|s| (*s).to_owned()).collect())
    }

    fn texts(lines: &[OutputLine]) -> Vec<&str> {
        lines
            .iter()
            .map(|line| match line {
                OutputLine::Text(s) => s.as_str(),
                OutputLine::Notice(n) => n.message(),
            })
            .collect()
    }

    #[test]
    fn test_scalars_render_once() {
        let ctx: Context = [("vars.1", "72F")].into_iter().collect();
        let lines = render_rows(&trigger("$(vars.1) degrees"), &ctx).unwrap();
        assert_eq!(lines, vec![OutputLine::Text("72F degrees".into())]);
    }

    #[test]
    fn test_lists_zip_into_rows() {
        let mut ctx = Context::new();
        ctx.insert("vars.1", list(&["Mon", "Tue"]));
        ctx.insert("vars.2", list(&["70", "65"]));
        ctx.insert("1", "paris");
        let lines = render_rows(&trigger("$(1) $(vars.1): $(vars.2)"), &ctx).unwrap();
        assert_eq!(texts(&lines), vec!["paris Mon: 70", "paris Tue: 65"]);
    }

    #[test]
    fn test_varying_lengths() {
        let mut ctx = Context::new();
        ctx.insert("vars.1", list(&["a", "b"]));
        ctx.insert("vars.2", list(&["x", "y", "z"]));
        let lines = render_rows(&trigger("$(vars.1)$(vars.2)"), &ctx).unwrap();
        assert_eq!(lines, vec![OutputLine::Notice(Notice::VaryingLengths)]);
    }

    #[test]
    fn test_empty_output_is_nothing_to_send() {
        let ctx: Context = [("vars.1", "")].into_iter().collect();
        let lines = render_rows(&trigger("$(vars.1)"), &ctx).unwrap();
        assert_eq!(lines, vec![OutputLine::Notice(Notice::NothingToSend)]);
    }

    #[test]
    fn test_empty_rows_are_skipped() {
        let mut ctx = Context::new();
        ctx.insert("vars.1", list(&["a", "", "c"]));
        let lines = render_rows(&trigger("$(vars.1)"), &ctx).unwrap();
        assert_eq!(texts(&lines), vec!["a", "c"]);

        ctx.insert("vars.1", list(&["", ""]));
        let lines = render_rows(&trigger("$(vars.1)"), &ctx).unwrap();
        assert_eq!(lines, vec![OutputLine::Notice(Notice::NothingToSend)]);
    }

    #[test]
    fn test_pre_splits_lines() {
        let mut ctx = Context::new();
        ctx.insert("vars.1", "one\r\ntwo\rthree\nfour");
        ctx.insert("0", "not\nsplit");
        let trigger = trigger("- $(vars.1)").with_pre(true);
        let lines = render_rows(&trigger, &ctx).unwrap();
        assert_eq!(texts(&lines), vec!["- one", "- two", "- three", "- four"]);
    }

    #[test]
    fn test_pre_single_line_is_one_row() {
        let ctx: Context = [("vars.1", "only")].into_iter().collect();
        let trigger = trigger("$(vars.1)").with_pre(true);
        assert_eq!(
            render_rows(&trigger, &ctx).unwrap(),
            vec![OutputLine::Text("only".into())]
        );
    }

    #[test]
    fn test_pre_split_lengths_must_match() {
        let mut ctx = Context::new();
        ctx.insert("vars.1", "a\nb");
        ctx.insert("vars.2", "c");
        let trigger = trigger("$(vars.1)$(vars.2)").with_pre(true);
        assert_eq!(
            render_rows(&trigger, &ctx).unwrap(),
            vec![OutputLine::Notice(Notice::VaryingLengths)]
        );
    }

    #[test]
    fn test_notice_messages() {
        assert_eq!(Notice::NothingToSend.to_string(), "Oops, nothing to send!");
        assert_eq!(
            Notice::VaryingLengths.to_string(),
            "Multiple arrays with varying lengths found"
        );
    }
}
