//! The XPath 1.0 core function library (without `id()` and `lang()`).

use crate::ast::Expr;
use crate::dom::NodeRef;
use crate::error::{XPathError, XPathResult};
use crate::eval::{EvalContext, Evaluator};
use crate::value::Value;

fn check_arity(
    name: &str,
    args: &[Expr],
    min: usize,
    max: usize,
    expected: &'static str,
) -> XPathResult<()> {
    if (min..=max).contains(&args.len()) {
        Ok(())
    } else {
        Err(XPathError::Arity {
            function: name.to_owned(),
            expected,
            found: args.len(),
        })
    }
}

struct Call<'a, 'd> {
    ev: &'a Evaluator<'d>,
    args: &'a [Expr],
    ctx: EvalContext,
}

impl Call<'_, '_> {
    fn value(&self, i: usize) -> XPathResult<Option<Value>> {
        self.args
            .get(i)
            .map(|arg| self.ev.eval(arg, self.ctx))
            .transpose()
    }

    /// Argument `i` as a string, or the context node's string-value.
    fn string_or_context(&self, i: usize) -> XPathResult<String> {
        Ok(match self.value(i)? {
            Some(v) => v.to_xpath_string(self.ev.doc),
            None => self.ev.doc.string_value(self.ctx.node),
        })
    }

    fn string(&self, i: usize) -> XPathResult<String> {
        Ok(self
            .value(i)?
            .map(|v| v.to_xpath_string(self.ev.doc))
            .unwrap_or_default())
    }

    fn number(&self, i: usize) -> XPathResult<f64> {
        Ok(self
            .value(i)?
            .map_or(f64::NAN, |v| v.to_number(self.ev.doc)))
    }

    fn nodes(&self, i: usize, function: &'static str) -> XPathResult<Vec<NodeRef>> {
        match self.value(i)? {
            Some(Value::NodeSet(nodes)) => Ok(nodes),
            Some(_) => Err(XPathError::NotANodeSet(function)),
            None => Ok(vec![self.ctx.node]),
        }
    }
}

/// Evaluate a call to the function `name`.
#[allow(clippy::too_many_lines, clippy::cast_precision_loss)]
pub(crate) fn call(
    ev: &Evaluator<'_>,
    name: &str,
    args: &[Expr],
    ctx: EvalContext,
) -> XPathResult<Value> {
    let call = Call { ev, args, ctx };
    let doc = ev.doc;

    let value = match name {
        "last" => {
            check_arity(name, args, 0, 0, "0")?;
            Value::Number(ctx.size as f64)
        },
        "position" => {
            check_arity(name, args, 0, 0, "0")?;
            Value::Number(ctx.position as f64)
        },
        "count" => {
            check_arity(name, args, 1, 1, "1")?;
            Value::Number(call.nodes(0, "count()")?.len() as f64)
        },
        "name" | "local-name" => {
            check_arity(name, args, 0, 1, "0 or 1")?;
            let full = call
                .nodes(0, "name()")?
                .first()
                .and_then(|n| doc.name(*n))
                .unwrap_or_default()
                .to_owned();
            if name == "local-name" {
                Value::String(local_part(&full).to_owned())
            } else {
                Value::String(full)
            }
        },
        "namespace-uri" => {
            check_arity(name, args, 0, 1, "0 or 1")?;
            call.nodes(0, "namespace-uri()")?;
            Value::String(String::new())
        },
        "string" => {
            check_arity(name, args, 0, 1, "0 or 1")?;
            Value::String(call.string_or_context(0)?)
        },
        "concat" => {
            check_arity(name, args, 2, usize::MAX, "2 or more")?;
            let mut out = String::new();
            for i in 0..args.len() {
                out.push_str(&call.string(i)?);
            }
            Value::String(out)
        },
        "starts-with" => {
            check_arity(name, args, 2, 2, "2")?;
            Value::Boolean(call.string(0)?.starts_with(&call.string(1)?))
        },
        "contains" => {
            check_arity(name, args, 2, 2, "2")?;
            Value::Boolean(call.string(0)?.contains(&call.string(1)?))
        },
        "substring-before" => {
            check_arity(name, args, 2, 2, "2")?;
            let haystack = call.string(0)?;
            let needle = call.string(1)?;
            Value::String(
                haystack
                    .split_once(&needle)
                    .map(|(before, _)| before.to_owned())
                    .unwrap_or_default(),
            )
        },
        "substring-after" => {
            check_arity(name, args, 2, 2, "2")?;
            let haystack = call.string(0)?;
            let needle = call.string(1)?;
            Value::String(
                haystack
                    .split_once(&needle)
                    .map(|(_, after)| after.to_owned())
                    .unwrap_or_default(),
            )
        },
        "substring" => {
            check_arity(name, args, 2, 3, "2 or 3")?;
            let s = call.string(0)?;
            let start = round(call.number(1)?);
            let end = if args.len() == 3 {
                start + round(call.number(2)?)
            } else {
                f64::INFINITY
            };
            Value::String(substring(&s, start, end))
        },
        "string-length" => {
            check_arity(name, args, 0, 1, "0 or 1")?;
            Value::Number(call.string_or_context(0)?.chars().count() as f64)
        },
        "normalize-space" => {
            check_arity(name, args, 0, 1, "0 or 1")?;
            Value::String(normalize_space(&call.string_or_context(0)?))
        },
        "translate" => {
            check_arity(name, args, 3, 3, "3")?;
            Value::String(translate(
                &call.string(0)?,
                &call.string(1)?,
                &call.string(2)?,
            ))
        },
        "boolean" => {
            check_arity(name, args, 1, 1, "1")?;
            Value::Boolean(call.value(0)?.is_some_and(|v| v.to_boolean()))
        },
        "not" => {
            check_arity(name, args, 1, 1, "1")?;
            Value::Boolean(!call.value(0)?.is_some_and(|v| v.to_boolean()))
        },
        "true" => {
            check_arity(name, args, 0, 0, "0")?;
            Value::Boolean(true)
        },
        "false" => {
            check_arity(name, args, 0, 0, "0")?;
            Value::Boolean(false)
        },
        "number" => {
            check_arity(name, args, 0, 1, "0 or 1")?;
            match call.value(0)? {
                Some(v) => Value::Number(v.to_number(doc)),
                None => Value::Number(crate::value::string_to_number(
                    &doc.string_value(ctx.node),
                )),
            }
        },
        "sum" => {
            check_arity(name, args, 1, 1, "1")?;
            let nodes = match call.value(0)? {
                Some(Value::NodeSet(nodes)) => nodes,
                _ => return Err(XPathError::NotANodeSet("sum()")),
            };
            Value::Number(
                nodes
                    .iter()
                    .map(|n| crate::value::string_to_number(&doc.string_value(*n)))
                    .sum(),
            )
        },
        "floor" => {
            check_arity(name, args, 1, 1, "1")?;
            Value::Number(call.number(0)?.floor())
        },
        "ceiling" => {
            check_arity(name, args, 1, 1, "1")?;
            Value::Number(call.number(0)?.ceil())
        },
        "round" => {
            check_arity(name, args, 1, 1, "1")?;
            Value::Number(round(call.number(0)?))
        },
        other => return Err(XPathError::UnknownFunction(other.to_owned())),
    };
    Ok(value)
}

fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// `round()`: the closest integer, halves towards positive infinity.
fn round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        n
    } else {
        (n + 0.5).floor()
    }
}

/// Characters at 1-based positions `p` with `start <= p < end`.
#[allow(clippy::cast_precision_loss)]
fn substring(s: &str, start: f64, end: f64) -> String {
    s.chars()
        .enumerate()
        .filter(|(i, _)| {
            let position = *i as f64 + 1.0;
            position >= start && position < end
        })
        .map(|(_, c)| c)
        .collect()
}

fn normalize_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn translate(s: &str, from: &str, to: &str) -> String {
    let from: Vec<char> = from.chars().collect();
    let to: Vec<char> = to.chars().collect();
    s.chars()
        .filter_map(|c| match from.iter().position(|&f| f == c) {
            Some(i) => to.get(i).copied(),
            None => Some(c),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_halves_up() {
        assert_eq!(round(2.5), 3.0);
        assert_eq!(round(-2.5), -2.0);
        assert_eq!(round(1.4), 1.0);
        assert!(round(f64::NAN).is_nan());
    }

    #[test]
    fn test_substring_positions() {
        assert_eq!(substring("12345", 2.0, 5.0), "234");
        assert_eq!(substring("12345", 0.0, 3.0), "12");
        assert_eq!(substring("12345", 1.5_f64.floor(), f64::INFINITY), "12345");
        assert_eq!(substring("12345", f64::NAN, f64::INFINITY), "");
    }

    #[test]
    fn test_translate_and_normalize() {
        assert_eq!(translate("bar", "abc", "ABC"), "BAr");
        assert_eq!(translate("--aaa--", "abc-", "ABC"), "AAA");
        assert_eq!(normalize_space("  a \n b\t c "), "a b c");
    }

    #[test]
    fn test_local_part() {
        assert_eq!(local_part("svg:rect"), "rect");
        assert_eq!(local_part("div"), "div");
    }
}
