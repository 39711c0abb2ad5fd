//! Expression tokenizer.
//!
//! Applies the XPath 1.0 disambiguation rule: after a token that can end an
//! operand, `*` is the multiplication operator and `and`, `or`, `div`, `mod`
//! are operator names. Anywhere else they are name tests.

use std::fmt;

use crate::error::{XPathError, XPathResult};

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Slash,
    DoubleSlash,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    DotDot,
    At,
    Comma,
    ColonColon,
    Pipe,
    Plus,
    Minus,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    /// `*` as a name test.
    Star,
    /// `*` as multiplication.
    Multiply,
    And,
    Or,
    Div,
    Mod,
    Dollar,
    Literal(String),
    Number(f64),
    /// A QName, or `prefix:*`.
    Name(String),
}

impl Token {
    /// Whether the next `*` or operator name must be read as an operator.
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Self::RParen
                | Self::RBracket
                | Self::Dot
                | Self::DotDot
                | Self::Star
                | Self::Literal(_)
                | Self::Number(_)
                | Self::Name(_)
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slash => f.write_str("'/'"),
            Self::DoubleSlash => f.write_str("'//'"),
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
            Self::LBracket => f.write_str("'['"),
            Self::RBracket => f.write_str("']'"),
            Self::Dot => f.write_str("'.'"),
            Self::DotDot => f.write_str("'..'"),
            Self::At => f.write_str("'@'"),
            Self::Comma => f.write_str("','"),
            Self::ColonColon => f.write_str("'::'"),
            Self::Pipe => f.write_str("'|'"),
            Self::Plus => f.write_str("'+'"),
            Self::Minus => f.write_str("'-'"),
            Self::Eq => f.write_str("'='"),
            Self::NotEq => f.write_str("'!='"),
            Self::Lt => f.write_str("'<'"),
            Self::Le => f.write_str("'<='"),
            Self::Gt => f.write_str("'>'"),
            Self::Ge => f.write_str("'>='"),
            Self::Star | Self::Multiply => f.write_str("'*'"),
            Self::And => f.write_str("'and'"),
            Self::Or => f.write_str("'or'"),
            Self::Div => f.write_str("'div'"),
            Self::Mod => f.write_str("'mod'"),
            Self::Dollar => f.write_str("'$'"),
            Self::Literal(s) => write!(f, "literal {s:?}"),
            Self::Number(n) => write!(f, "number {n}"),
            Self::Name(n) => write!(f, "name '{n}'"),
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '\u{b7}')
}

/// Split an expression into tokens.
pub(crate) fn tokenize(input: &str) -> XPathResult<Vec<Token>> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let operator_context = tokens.last().is_some_and(Token::ends_operand);

        let token = match c {
            '/' => {
                chars.next();
                if chars.next_if(|&(_, n)| n == '/').is_some() {
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            },
            '(' => single(&mut chars, Token::LParen),
            ')' => single(&mut chars, Token::RParen),
            '[' => single(&mut chars, Token::LBracket),
            ']' => single(&mut chars, Token::RBracket),
            '@' => single(&mut chars, Token::At),
            ',' => single(&mut chars, Token::Comma),
            '|' => single(&mut chars, Token::Pipe),
            '+' => single(&mut chars, Token::Plus),
            '-' => single(&mut chars, Token::Minus),
            '=' => single(&mut chars, Token::Eq),
            '$' => single(&mut chars, Token::Dollar),
            '*' => single(
                &mut chars,
                if operator_context {
                    Token::Multiply
                } else {
                    Token::Star
                },
            ),
            '!' => {
                chars.next();
                if chars.next_if(|&(_, n)| n == '=').is_none() {
                    return Err(XPathError::UnexpectedChar { found: c, position });
                }
                Token::NotEq
            },
            '<' | '>' => {
                chars.next();
                let or_equal = chars.next_if(|&(_, n)| n == '=').is_some();
                match (c, or_equal) {
                    ('<', false) => Token::Lt,
                    ('<', true) => Token::Le,
                    (_, false) => Token::Gt,
                    (_, true) => Token::Ge,
                }
            },
            ':' => {
                chars.next();
                if chars.next_if(|&(_, n)| n == ':').is_none() {
                    return Err(XPathError::UnexpectedChar { found: c, position });
                }
                Token::ColonColon
            },
            '"' | '\'' => {
                chars.next();
                let mut literal = String::new();
                let mut closed = false;
                for (_, ch) in chars.by_ref() {
                    if ch == c {
                        closed = true;
                        break;
                    }
                    literal.push(ch);
                }
                if !closed {
                    return Err(XPathError::UnterminatedLiteral { position });
                }
                Token::Literal(literal)
            },
            '.' => {
                chars.next();
                match chars.peek() {
                    Some(&(_, '.')) => {
                        chars.next();
                        Token::DotDot
                    },
                    Some(&(_, d)) if d.is_ascii_digit() => {
                        let mut digits = String::from("0.");
                        while let Some((_, d)) = chars.next_if(|&(_, d)| d.is_ascii_digit()) {
                            digits.push(d);
                        }
                        Token::Number(digits.parse().unwrap_or(f64::NAN))
                    },
                    _ => Token::Dot,
                }
            },
            d if d.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some((_, d)) = chars.next_if(|&(_, d)| d.is_ascii_digit() || d == '.') {
                    digits.push(d);
                }
                let number = digits
                    .parse()
                    .map_err(|_| XPathError::UnexpectedChar { found: '.', position })?;
                Token::Number(number)
            },
            n if is_name_start(n) => {
                let mut name = String::new();
                while let Some((_, ch)) = chars.next_if(|&(_, ch)| is_name_char(ch)) {
                    name.push(ch);
                }
                // QName prefix, or `prefix:*`; a lone `::` is left for the axis.
                let mut lookahead = chars.clone();
                if lookahead.next().is_some_and(|(_, ch)| ch == ':')
                    && let Some(&(_, after)) = lookahead.peek()
                    && (is_name_start(after) || after == '*')
                {
                    chars.next();
                    name.push(':');
                    if after == '*' {
                        chars.next();
                        name.push('*');
                    } else {
                        while let Some((_, ch)) = chars.next_if(|&(_, ch)| is_name_char(ch)) {
                            name.push(ch);
                        }
                    }
                }

                match name.as_str() {
                    "and" if operator_context => Token::And,
                    "or" if operator_context => Token::Or,
                    "div" if operator_context => Token::Div,
                    "mod" if operator_context => Token::Mod,
                    _ => Token::Name(name),
                }
            },
            other => {
                return Err(XPathError::UnexpectedChar {
                    found: other,
                    position,
                });
            },
        };
        tokens.push(token);
    }

    Ok(tokens)
}

fn single(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, token: Token) -> Token {
    chars.next();
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_tokens() {
        let tokens = tokenize("//span[@class='t']/text()").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::DoubleSlash,
                Token::Name("span".into()),
                Token::LBracket,
                Token::At,
                Token::Name("class".into()),
                Token::Eq,
                Token::Literal("t".into()),
                Token::RBracket,
                Token::Slash,
                Token::Name("text".into()),
                Token::LParen,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_star_disambiguation() {
        let tokens = tokenize("* * 2").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Star, Token::Multiply, Token::Number(2.0)]
        );
    }

    #[test]
    fn test_operator_names() {
        let tokens = tokenize("div div div").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Name("div".into()),
                Token::Div,
                Token::Name("div".into())
            ]
        );
        let tokens = tokenize("a and b or c mod 2").unwrap();
        assert!(tokens.contains(&Token::And));
        assert!(tokens.contains(&Token::Or));
        assert!(tokens.contains(&Token::Mod));
    }

    #[test]
    fn test_axis_and_qname() {
        let tokens = tokenize("child::svg:rect").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Name("child".into()),
                Token::ColonColon,
                Token::Name("svg:rect".into()),
            ]
        );
    }

    #[test]
    fn test_numbers_and_dots() {
        let tokens = tokenize("1.5 + .5 - ..").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Number(1.5),
                Token::Plus,
                Token::Number(0.5),
                Token::Minus,
                Token::DotDot,
            ]
        );
    }

    #[test]
    fn test_comparison_operators() {
        let tokens = tokenize("1 != 2 <= 3 >= 4 < 5 > 6").unwrap();
        assert!(tokens.contains(&Token::NotEq));
        assert!(tokens.contains(&Token::Le));
        assert!(tokens.contains(&Token::Ge));
        assert!(tokens.contains(&Token::Lt));
        assert!(tokens.contains(&Token::Gt));
    }

    #[test]
    fn test_lexical_errors() {
        assert_eq!(
            tokenize("'open").unwrap_err(),
            XPathError::UnterminatedLiteral { position: 0 }
        );
        assert!(matches!(
            tokenize("a # b"),
            Err(XPathError::UnexpectedChar { found: '#', .. })
        ));
    }
}
