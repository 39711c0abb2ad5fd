#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Lenient HTML documents and XPath 1.0 queries over them.
//!
//! ```rust
//! use webgetter_xpath::{Document, Value, XPath};
//!
//! let doc = Document::parse("<p>Temp: <span class='t'>72F</span></p>");
//! let query = XPath::compile("//span[@class='t']").unwrap();
//! let Value::NodeSet(nodes) = query.evaluate(&doc).unwrap() else {
//!     panic!("expected nodes");
//! };
//! assert_eq!(doc.string_value(nodes[0]), "72F");
//! ```
//!
//! Supported: every axis except `namespace`, all node tests, predicates,
//! unions, arithmetic, comparisons and the core function library except
//! `id()` and `lang()`. Variables are not supported.

mod ast;
mod dom;
mod error;
mod eval;
mod functions;
mod lexer;
mod parser;
mod value;

use std::fmt;

pub use dom::{Document, NodeId, NodeKind, NodeRef};
pub use error::{XPathError, XPathResult};
pub use value::{Value, number_to_string, string_to_number};

use crate::eval::{EvalContext, Evaluator};

/// A compiled XPath expression.
#[derive(Debug, Clone)]
pub struct XPath {
    source: String,
    expr: ast::Expr,
}

impl XPath {
    /// Compile an expression.
    ///
    /// # Errors
    ///
    /// Returns an [`XPathError`] if the expression is not valid XPath 1.0 or
    /// uses an unsupported feature.
    pub fn compile(expression: &str) -> XPathResult<Self> {
        Ok(Self {
            source: expression.to_owned(),
            expr: parser::parse(expression)?,
        })
    }

    /// The source text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluate with the document root as context node.
    ///
    /// # Errors
    ///
    /// Returns an [`XPathError`] on unknown functions, wrong argument counts
    /// or node-set operations applied to other types.
    pub fn evaluate(&self, doc: &Document) -> XPathResult<Value> {
        self.evaluate_from(doc, doc.root())
    }

    /// Evaluate with `node` as context node.
    ///
    /// # Errors
    ///
    /// See [`evaluate`](Self::evaluate).
    pub fn evaluate_from(&self, doc: &Document, node: NodeRef) -> XPathResult<Value> {
        Evaluator::new(doc).eval(&self.expr, EvalContext::new(node))
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Document {
    /// Compile and evaluate `expression` against the root.
    ///
    /// # Errors
    ///
    /// See [`XPath::compile`] and [`XPath::evaluate`].
    pub fn evaluate(&self, expression: &str) -> XPathResult<Value> {
        XPath::compile(expression)?.evaluate(self)
    }
}
