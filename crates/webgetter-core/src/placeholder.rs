//! Named `$(key)` placeholders on top of a positional formatter.
//!
//! A template such as `"$(vars.1) degrees"` is rendered against a
//! [`Context`] in two steps:
//!
//! 1. [`to_positional`] doubles every literal `%` and rewrites each
//!    `$(key)` whose key is in the context into `%<i>$`, where `<i>` is the
//!    1-based position of the key in the context's enumeration. The
//!    character right after `)` is kept as the conversion when it is `s`,
//!    `d` or `f` (the `%(key)s` form); otherwise `s` is implied.
//! 2. [`format_positional`] evaluates the result against the context's
//!    values in the same order.
//!
//! Keys missing from the context are left verbatim (`$(nope)` stays
//! `$(nope)`); keys never referenced are ignored.

use std::fmt::Write as _;

use crate::context::Context;
use crate::error::{FormatError, FormatResult};

/// Arguments for [`render`].
#[derive(Debug, Clone, Copy)]
pub enum FormatArgs<'a> {
    /// No substitution: the template is returned untouched.
    None,
    /// A single positional argument (`sprintf(template, arg)`).
    Scalar(&'a str),
    /// Named substitution from a context.
    Named(&'a Context),
}

/// Render `template` with `args`.
///
/// # Errors
///
/// Returns a [`FormatError`] if the template contains an unsupported
/// specifier or references a positional argument that does not exist. The
/// named form only produces specifiers it knows how to satisfy, so errors
/// there come from literal text following a `%` in scalar mode only.
pub fn render(template: &str, args: FormatArgs<'_>) -> FormatResult<String> {
    match args {
        FormatArgs::None => Ok(template.to_owned()),
        FormatArgs::Scalar(arg) => format_positional(template, &[arg]),
        FormatArgs::Named(ctx) if ctx.is_empty() => Ok(template.to_owned()),
        FormatArgs::Named(ctx) => {
            let positional = to_positional(template, ctx);
            let values: Vec<String> = ctx.iter().map(|(_, v)| v.to_string()).collect();
            let refs: Vec<&str> = values.iter().map(String::as_str).collect();
            format_positional(&positional, &refs)
        },
    }
}

/// Shorthand for `render(template, FormatArgs::Named(ctx))`.
///
/// # Errors
///
/// See [`render`].
pub fn render_context(template: &str, ctx: &Context) -> FormatResult<String> {
    render(template, FormatArgs::Named(ctx))
}

/// Translate named placeholders into positional specifiers.
#[must_use]
pub fn to_positional(template: &str, ctx: &Context) -> String {
    let mut out = String::with_capacity(template.len().saturating_add(8));
    let mut rest = template;

    while let Some(ch) = rest.chars().next() {
        if ch == '%' {
            out.push_str("%%");
            rest = &rest[1..];
            continue;
        }

        if let Some(after) = rest.strip_prefix("$(") {
            if let Some(end) = after.find(')') {
                let key = &after[..end];
                if let Some(position) = ctx.keys().position(|k| k == key) {
                    let tail = &after[end.saturating_add(1)..];
                    let _ = write!(out, "%{}$", position.saturating_add(1));
                    if !tail.starts_with(['s', 'd', 'f']) {
                        out.push('s');
                    }
                    rest = tail;
                    continue;
                }
            }
            // Unknown key or unterminated: copy the opener and keep scanning
            // so a '%' inside the key still gets escaped.
            out.push_str("$(");
            rest = after;
            continue;
        }

        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    out
}

/// A minimal `vsprintf`: `%%`, `%s`, `%d`, `%f` and `%N$s|d|f`.
///
/// # Errors
///
/// - [`FormatError::MissingArgument`] when a specifier has no argument
/// - [`FormatError::InvalidArgumentIndex`] for `%0$`
/// - [`FormatError::UnsupportedSpecifier`] for flags, widths or unknown
///   conversions
/// - [`FormatError::TrailingPercent`] when the string ends inside a specifier
pub fn format_positional(fmt: &str, args: &[&str]) -> FormatResult<String> {
    let mut out = String::with_capacity(fmt.len());
    let mut chars = fmt.char_indices().peekable();
    let mut next_arg = 0usize;

    while let Some((pos, ch)) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }

        let Some(&(_, spec)) = chars.peek() else {
            return Err(FormatError::TrailingPercent);
        };

        if spec == '%' {
            chars.next();
            out.push('%');
            continue;
        }

        let index = if spec.is_ascii_digit() {
            let mut digits = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                digits.push(d);
                chars.next();
            }
            match chars.next() {
                Some((_, '$')) => {},
                Some((_, other)) => {
                    return Err(FormatError::UnsupportedSpecifier {
                        specifier: other,
                        position: pos,
                    });
                },
                None => return Err(FormatError::TrailingPercent),
            }
            let n: usize = digits
                .parse()
                .map_err(|_| FormatError::MissingArgument { index: usize::MAX })?;
            n.checked_sub(1).ok_or(FormatError::InvalidArgumentIndex)?
        } else {
            let i = next_arg;
            next_arg = next_arg.saturating_add(1);
            i
        };

        let conversion = match chars.next() {
            Some((_, c @ ('s' | 'd' | 'f'))) => c,
            Some((_, other)) => {
                return Err(FormatError::UnsupportedSpecifier {
                    specifier: other,
                    position: pos,
                });
            },
            None => return Err(FormatError::TrailingPercent),
        };

        let arg = args.get(index).ok_or(FormatError::MissingArgument {
            index: index.saturating_add(1),
        })?;

        match conversion {
            'd' => {
                #[allow(clippy::cast_possible_truncation)]
                let n = numeric_prefix(arg).trunc() as i64;
                let _ = write!(out, "{n}");
            },
            'f' => {
                let _ = write!(out, "{:.6}", numeric_prefix(arg));
            },
            _ => out.push_str(arg),
        }
    }

    Ok(out)
}

/// Parse the leading numeric part of a string, `0.0` if there is none.
///
/// Accepts optional leading whitespace, a sign, digits, a fractional part
/// and an exponent, stopping at the first character that does not fit.
fn numeric_prefix(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0usize;
    let mut seen_digit = false;

    let advance = |i: usize| i.saturating_add(1);

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = advance(end);
    }
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end = advance(end);
        seen_digit = true;
    }
    if bytes.get(end) == Some(&b'.') {
        let mut frac = advance(end);
        let mut frac_digit = false;
        while bytes.get(frac).is_some_and(u8::is_ascii_digit) {
            frac = advance(frac);
            frac_digit = true;
        }
        if frac_digit || seen_digit {
            end = frac;
            seen_digit = seen_digit || frac_digit;
        }
    }
    if !seen_digit {
        return 0.0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = advance(end);
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp = advance(exp);
        }
        if bytes.get(exp).is_some_and(u8::is_ascii_digit) {
            while bytes.get(exp).is_some_and(u8::is_ascii_digit) {
                exp = advance(exp);
            }
            end = exp;
        }
    }

    s[..end].parse().unwrap_or(0.0)
}
