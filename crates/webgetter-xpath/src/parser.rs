//! Recursive-descent parser for XPath 1.0 expressions.

use crate::ast::{Axis, BinaryOp, Expr, NodeTest, Step};
use crate::error::{XPathError, XPathResult};
use crate::lexer::{Token, tokenize};

/// Deepest nesting of parentheses, predicates and function arguments.
pub(crate) const MAX_DEPTH: usize = 64;

/// Longest accepted expression, in tokens. Bounds operator chains, which
/// nest without brackets.
pub(crate) const MAX_TOKENS: usize = 1024;

/// Parse an expression into its tree.
pub(crate) fn parse(input: &str) -> XPathResult<Expr> {
    let tokens = tokenize(input)?;
    if tokens.len() > MAX_TOKENS {
        return Err(XPathError::TooLong {
            tokens: tokens.len(),
            limit: MAX_TOKENS,
        });
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.or_expr()?;
    if let Some(extra) = parser.peek() {
        return Err(XPathError::Syntax {
            expected: "end of expression".to_owned(),
            found: extra.to_string(),
        });
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn nested<T>(&mut self, inner: impl FnOnce(&mut Self) -> XPathResult<T>) -> XPathResult<T> {
        if self.depth >= MAX_DEPTH {
            return Err(XPathError::TooDeep { limit: MAX_DEPTH });
        }
        self.depth = self.depth.saturating_add(1);
        let result = inner(self);
        self.depth = self.depth.saturating_sub(1);
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos.saturating_add(offset))
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos = self.pos.saturating_add(1);
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos = self.pos.saturating_add(1);
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> XPathResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.syntax(&expected.to_string()))
        }
    }

    fn syntax(&self, expected: &str) -> XPathError {
        XPathError::Syntax {
            expected: expected.to_owned(),
            found: self
                .peek()
                .map_or_else(|| "end of expression".to_owned(), ToString::to_string),
        }
    }

    fn binary_level(
        &mut self,
        operators: &[(Token, BinaryOp)],
        operand: fn(&mut Self) -> XPathResult<Expr>,
    ) -> XPathResult<Expr> {
        let mut left = operand(self)?;
        'outer: loop {
            for (token, op) in operators {
                if self.eat(token) {
                    let right = operand(self)?;
                    left = Expr::Binary(*op, Box::new(left), Box::new(right));
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn or_expr(&mut self) -> XPathResult<Expr> {
        self.binary_level(&[(Token::Or, BinaryOp::Or)], Self::and_expr)
    }

    fn and_expr(&mut self) -> XPathResult<Expr> {
        self.binary_level(&[(Token::And, BinaryOp::And)], Self::equality_expr)
    }

    fn equality_expr(&mut self) -> XPathResult<Expr> {
        self.binary_level(
            &[(Token::Eq, BinaryOp::Eq), (Token::NotEq, BinaryOp::NotEq)],
            Self::relational_expr,
        )
    }

    fn relational_expr(&mut self) -> XPathResult<Expr> {
        self.binary_level(
            &[
                (Token::Le, BinaryOp::Le),
                (Token::Ge, BinaryOp::Ge),
                (Token::Lt, BinaryOp::Lt),
                (Token::Gt, BinaryOp::Gt),
            ],
            Self::additive_expr,
        )
    }

    fn additive_expr(&mut self) -> XPathResult<Expr> {
        self.binary_level(
            &[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Sub)],
            Self::multiplicative_expr,
        )
    }

    fn multiplicative_expr(&mut self) -> XPathResult<Expr> {
        self.binary_level(
            &[
                (Token::Multiply, BinaryOp::Mul),
                (Token::Div, BinaryOp::Div),
                (Token::Mod, BinaryOp::Mod),
            ],
            Self::unary_expr,
        )
    }

    fn unary_expr(&mut self) -> XPathResult<Expr> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Negate(Box::new(self.unary_expr()?)));
        }
        self.union_expr()
    }

    fn union_expr(&mut self) -> XPathResult<Expr> {
        let mut left = self.path_expr()?;
        while self.eat(&Token::Pipe) {
            let right = self.path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn starts_filter_expr(&self) -> bool {
        match self.peek() {
            Some(Token::LParen | Token::Literal(_) | Token::Number(_) | Token::Dollar) => true,
            Some(Token::Name(name)) => {
                self.peek_at(1) == Some(&Token::LParen) && !is_node_type(name)
            },
            _ => false,
        }
    }

    fn path_expr(&mut self) -> XPathResult<Expr> {
        if !self.starts_filter_expr() {
            return self.location_path();
        }

        let primary = self.primary_expr()?;
        let mut predicates = Vec::new();
        while self.peek() == Some(&Token::LBracket) {
            predicates.push(self.predicate()?);
        }
        let filter = if predicates.is_empty() {
            primary
        } else {
            Expr::Filter(Box::new(primary), predicates)
        };

        let mut steps = Vec::new();
        loop {
            if self.eat(&Token::Slash) {
                steps.push(self.step()?);
            } else if self.eat(&Token::DoubleSlash) {
                steps.push(Step::descendant_or_self());
                steps.push(self.step()?);
            } else {
                break;
            }
        }
        if steps.is_empty() {
            Ok(filter)
        } else {
            Ok(Expr::PathFrom(Box::new(filter), steps))
        }
    }

    fn primary_expr(&mut self) -> XPathResult<Expr> {
        match self.advance() {
            Some(Token::LParen) => self.nested(|p| {
                let inner = p.or_expr()?;
                p.expect(&Token::RParen)?;
                Ok(inner)
            }),
            Some(Token::Literal(s)) => Ok(Expr::Literal(s)),
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Dollar) => Err(XPathError::Unsupported(
                "variable references".to_owned(),
            )),
            Some(Token::Name(name)) => {
                self.expect(&Token::LParen)?;
                let args = self.nested(|p| {
                    let mut args = Vec::new();
                    if !p.eat(&Token::RParen) {
                        loop {
                            args.push(p.or_expr()?);
                            if p.eat(&Token::Comma) {
                                continue;
                            }
                            p.expect(&Token::RParen)?;
                            break;
                        }
                    }
                    Ok(args)
                })?;
                Ok(Expr::Function(name, args))
            },
            Some(_) => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.syntax("an expression"))
            },
            None => Err(self.syntax("an expression")),
        }
    }

    fn predicate(&mut self) -> XPathResult<Expr> {
        self.expect(&Token::LBracket)?;
        self.nested(|p| {
            let expr = p.or_expr()?;
            p.expect(&Token::RBracket)?;
            Ok(expr)
        })
    }

    fn location_path(&mut self) -> XPathResult<Expr> {
        let mut steps = Vec::new();
        let absolute = match self.peek() {
            Some(Token::Slash) => {
                self.advance();
                if !self.starts_step() {
                    // A lone `/` selects the root.
                    return Ok(Expr::Path {
                        absolute: true,
                        steps,
                    });
                }
                true
            },
            Some(Token::DoubleSlash) => {
                self.advance();
                steps.push(Step::descendant_or_self());
                true
            },
            _ => false,
        };

        steps.push(self.step()?);
        loop {
            if self.eat(&Token::Slash) {
                steps.push(self.step()?);
            } else if self.eat(&Token::DoubleSlash) {
                steps.push(Step::descendant_or_self());
                steps.push(self.step()?);
            } else {
                break;
            }
        }
        Ok(Expr::Path { absolute, steps })
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Dot | Token::DotDot | Token::At | Token::Star | Token::Name(_))
        )
    }

    fn step(&mut self) -> XPathResult<Step> {
        if self.eat(&Token::Dot) {
            return Ok(Step {
                axis: Axis::SelfAxis,
                test: NodeTest::Node,
                predicates: Vec::new(),
            });
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step {
                axis: Axis::Parent,
                test: NodeTest::Node,
                predicates: Vec::new(),
            });
        }

        let axis = if self.eat(&Token::At) {
            Axis::Attribute
        } else if let (Some(Token::Name(name)), Some(Token::ColonColon)) =
            (self.peek(), self.peek_at(1))
        {
            let axis = Axis::from_name(name)
                .ok_or_else(|| XPathError::Unsupported(format!("axis '{name}'")))?;
            self.pos = self.pos.saturating_add(2);
            axis
        } else {
            Axis::Child
        };

        let test = self.node_test()?;
        let mut predicates = Vec::new();
        while self.peek() == Some(&Token::LBracket) {
            predicates.push(self.predicate()?);
        }
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn node_test(&mut self) -> XPathResult<NodeTest> {
        match self.advance() {
            Some(Token::Star) => Ok(NodeTest::Any),
            Some(Token::Name(name)) if self.peek() == Some(&Token::LParen) => {
                self.advance();
                let test = match name.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    "processing-instruction" => {
                        if let Some(Token::Literal(target)) = self.peek().cloned() {
                            self.advance();
                            NodeTest::ProcessingInstruction(Some(target))
                        } else {
                            NodeTest::ProcessingInstruction(None)
                        }
                    },
                    _ => return Err(self.syntax("a node type test")),
                };
                self.expect(&Token::RParen)?;
                Ok(test)
            },
            Some(Token::Name(name)) if name.ends_with(":*") => Ok(NodeTest::Any),
            Some(Token::Name(name)) => Ok(NodeTest::Name(name)),
            Some(_) => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.syntax("a node test"))
            },
            None => Err(self.syntax("a node test")),
        }
    }
}

fn is_node_type(name: &str) -> bool {
    matches!(
        name,
        "node" | "text" | "comment" | "processing-instruction"
    )
}
