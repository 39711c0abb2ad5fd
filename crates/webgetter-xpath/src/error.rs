use thiserror::Error;

/// Errors raised while compiling or evaluating an XPath expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XPathError {
    /// The expression contains a character sequence that is not a token.
    #[error("unexpected character '{found}' at offset {position}")]
    UnexpectedChar {
        /// The offending character.
        found: char,
        /// Byte offset in the expression.
        position: usize,
    },

    /// A string literal is not closed.
    #[error("unterminated string literal at offset {position}")]
    UnterminatedLiteral {
        /// Byte offset of the opening quote.
        position: usize,
    },

    /// The token stream does not form a valid expression.
    #[error("syntax error: expected {expected}, found {found}")]
    Syntax {
        /// What the parser was looking for.
        expected: String,
        /// What it got instead.
        found: String,
    },

    /// The expression uses a feature this evaluator does not provide.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A function name is not part of the core library.
    #[error("unknown function {0}()")]
    UnknownFunction(String),

    /// A function was called with the wrong number of arguments.
    #[error("{function}() takes {expected} arguments, got {found}")]
    Arity {
        /// Function name.
        function: String,
        /// Accepted argument count, e.g. `"1"` or `"2 or 3"`.
        expected: &'static str,
        /// Supplied argument count.
        found: usize,
    },

    /// Parentheses, predicates or function calls nest too deeply.
    #[error("expression nests deeper than {limit} levels")]
    TooDeep {
        /// Maximum nesting depth.
        limit: usize,
    },

    /// The expression has too many tokens.
    #[error("expression has {tokens} tokens, limit is {limit}")]
    TooLong {
        /// Token count.
        tokens: usize,
        /// Maximum token count.
        limit: usize,
    },

    /// An operand that must be a node-set is not one.
    #[error("expected a node-set in {0}")]
    NotANodeSet(&'static str),
}

/// Convenience alias.
pub type XPathResult<T> = Result<T, XPathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = XPathError::Arity {
            function: "substring".to_string(),
            expected: "2 or 3",
            found: 1,
        };
        assert_eq!(err.to_string(), "substring() takes 2 or 3 arguments, got 1");

        let err = XPathError::UnexpectedChar {
            found: '#',
            position: 3,
        };
        assert_eq!(err.to_string(), "unexpected character '#' at offset 3");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<XPathError>();
    }
}
