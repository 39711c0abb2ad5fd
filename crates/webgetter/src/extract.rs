//! Response extraction: XPath variables into the invocation context.

use encoding_rs::Encoding;
use tracing::{debug, trace, warn};
use webgetter_config::TriggerConfig;
use webgetter_core::placeholder::render_context;
use webgetter_core::plain::escape_html;
use webgetter_core::{Context, Value};
use webgetter_xpath::{Document, NodeRef, Value as XPathValue, XPath};

use crate::encoding;
use crate::error::{ExtractError, ExtractResult};
use crate::fetch::FetchedResponse;

/// MIME types the extractor accepts.
pub const SUPPORTED_MIME_TYPES: [&str; 4] = [
    "application/xml",
    "text/xml",
    "text/html",
    "application/xhtml+xml",
];

/// Evaluate every variable of `trigger` against `response` and store the
/// results in `context` as `vars.1`..`vars.N`.
///
/// Each expression is rendered against the context first, so it may use the
/// invocation tokens and the variables extracted before it. An invalid
/// expression yields `""`.
///
/// # Errors
///
/// [`ExtractError::UnsupportedContentType`] if the response is neither HTML
/// nor XML, [`ExtractError::Format`] if an expression template cannot be
/// rendered. The context is left partially filled in the latter case.
pub fn extract(
    response: &FetchedResponse,
    trigger: &TriggerConfig,
    context: &mut Context,
) -> ExtractResult<()> {
    let mime = response.mime_type();
    if !SUPPORTED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(ExtractError::UnsupportedContentType(mime));
    }

    let detected = encoding::detect(&response.body, response.content_type.as_deref());
    let wanted = trigger.encoding.as_deref().and_then(encoding::resolve_override);

    let mut decoded = encoding::decode(&response.body, detected);
    if decoded.had_errors
        && let Some(wanted) = wanted
        && wanted != decoded.encoding
    {
        debug!(
            detected = decoded.encoding.name(),
            configured = wanted.name(),
            "body is not valid in its announced encoding, decoding with the configured one"
        );
        decoded = encoding::decode(&response.body, wanted);
    }
    let source = decoded.encoding;
    let effective = wanted.unwrap_or(source);

    let doc = Document::parse(&decoded.text);
    if !doc.errors().is_empty() {
        trace!(
            trigger = %trigger.trigger,
            errors = ?doc.errors(),
            "lenient parse recovered from errors"
        );
    }

    for (i, template) in trigger.vars.iter().enumerate() {
        let expression = render_context(template, context)?;
        let values = evaluate(&doc, &expression, trigger.pre)
            .into_iter()
            .map(|value| recode_or_keep(value, source, effective))
            .collect();
        context.insert(format!("vars.{}", i.saturating_add(1)), Value::collapse(values));
    }
    Ok(())
}

/// Evaluate one expression. Node-sets give one escaped string per node,
/// other results their XPath string value.
fn evaluate(doc: &Document, expression: &str, pre: bool) -> Vec<String> {
    let result = XPath::compile(expression).and_then(|xpath| xpath.evaluate(doc));
    match result {
        Ok(XPathValue::NodeSet(nodes)) => nodes
            .into_iter()
            .map(|node| node_text(doc, node, pre))
            .filter(|text| !text.is_empty())
            .collect(),
        Ok(scalar) => vec![scalar.to_xpath_string(doc)],
        Err(e) => {
            warn!(expression, error = %e, "invalid XPath expression");
            Vec::new()
        },
    }
}

/// The escaped text content of a node, trimmed unless `pre`.
fn node_text(doc: &Document, node: NodeRef, pre: bool) -> String {
    let escaped = escape_html(&doc.string_value(node));
    if pre {
        escaped
    } else {
        escaped
            .trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B'))
            .to_owned()
    }
}

fn recode_or_keep(value: String, source: &'static Encoding, target: &'static Encoding) -> String {
    match encoding::recode(&value, source, target) {
        Ok(recoded) => recoded,
        Err(e) => {
            debug!(error = %e, "keeping value in its original encoding");
            value
        },
    }
}
