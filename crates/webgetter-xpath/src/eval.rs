//! Expression evaluation over a [`Document`].

use crate::ast::{Axis, BinaryOp, Expr, NodeTest, Step};
use crate::dom::{Document, NodeKind, NodeRef};
use crate::error::{XPathError, XPathResult};
use crate::functions;
use crate::value::{Value, string_to_number};

/// The dynamic context of an evaluation step.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EvalContext {
    pub(crate) node: NodeRef,
    /// 1-based context position.
    pub(crate) position: usize,
    pub(crate) size: usize,
}

impl EvalContext {
    pub(crate) fn new(node: NodeRef) -> Self {
        Self {
            node,
            position: 1,
            size: 1,
        }
    }
}

pub(crate) struct Evaluator<'d> {
    pub(crate) doc: &'d Document,
}

impl<'d> Evaluator<'d> {
    pub(crate) fn new(doc: &'d Document) -> Self {
        Self { doc }
    }

    pub(crate) fn eval(&self, expr: &Expr, ctx: EvalContext) -> XPathResult<Value> {
        match expr {
            Expr::Binary(op, left, right) => self.binary(*op, left, right, ctx),
            Expr::Negate(inner) => Ok(Value::Number(-self.eval(inner, ctx)?.to_number(self.doc))),
            Expr::Union(left, right) => {
                let mut nodes = self.node_set(left, ctx, "union")?;
                nodes.extend(self.node_set(right, ctx, "union")?);
                Ok(Value::NodeSet(document_order(nodes)))
            },
            Expr::Literal(s) => Ok(Value::String(s.clone())),
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Function(name, args) => functions::call(self, name, args, ctx),
            Expr::Path { absolute, steps } => {
                let start = if *absolute {
                    self.doc.root()
                } else {
                    ctx.node
                };
                Ok(Value::NodeSet(self.apply_steps(vec![start], steps)?))
            },
            Expr::Filter(primary, predicates) => {
                let nodes = self.node_set(primary, ctx, "filter expression")?;
                Ok(Value::NodeSet(self.apply_predicates(nodes, predicates)?))
            },
            Expr::PathFrom(base, steps) => {
                let nodes = self.node_set(base, ctx, "path expression")?;
                Ok(Value::NodeSet(self.apply_steps(nodes, steps)?))
            },
        }
    }

    pub(crate) fn node_set(
        &self,
        expr: &Expr,
        ctx: EvalContext,
        what: &'static str,
    ) -> XPathResult<Vec<NodeRef>> {
        match self.eval(expr, ctx)? {
            Value::NodeSet(nodes) => Ok(nodes),
            _ => Err(XPathError::NotANodeSet(what)),
        }
    }

    fn binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        ctx: EvalContext,
    ) -> XPathResult<Value> {
        match op {
            BinaryOp::Or => Ok(Value::Boolean(
                self.eval(left, ctx)?.to_boolean() || self.eval(right, ctx)?.to_boolean(),
            )),
            BinaryOp::And => Ok(Value::Boolean(
                self.eval(left, ctx)?.to_boolean() && self.eval(right, ctx)?.to_boolean(),
            )),
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => {
                let l = self.eval(left, ctx)?;
                let r = self.eval(right, ctx)?;
                Ok(Value::Boolean(self.compare(op, &l, &r)))
            },
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let l = self.eval(left, ctx)?.to_number(self.doc);
                let r = self.eval(right, ctx)?.to_number(self.doc);
                Ok(Value::Number(match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                    _ => l % r,
                }))
            },
        }
    }

    fn compare(&self, op: BinaryOp, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::NodeSet(a), Value::NodeSet(b)) => {
                let right_strings: Vec<String> =
                    b.iter().map(|n| self.doc.string_value(*n)).collect();
                a.iter().any(|n| {
                    let l = Value::String(self.doc.string_value(*n));
                    right_strings
                        .iter()
                        .any(|r| self.compare_scalars(op, &l, &Value::String(r.clone())))
                })
            },
            (Value::NodeSet(nodes), other) => self.compare_node_set(op, nodes, other),
            (other, Value::NodeSet(nodes)) => self.compare_node_set(op.flipped(), nodes, other),
            _ => self.compare_scalars(op, left, right),
        }
    }

    fn compare_node_set(&self, op: BinaryOp, nodes: &[NodeRef], other: &Value) -> bool {
        match other {
            Value::Boolean(_) => {
                self.compare_scalars(op, &Value::Boolean(!nodes.is_empty()), other)
            },
            Value::Number(n) => nodes.iter().any(|node| {
                let l = string_to_number(&self.doc.string_value(*node));
                compare_numbers(op, l, *n)
            }),
            _ => nodes.iter().any(|node| {
                self.compare_scalars(op, &Value::String(self.doc.string_value(*node)), other)
            }),
        }
    }

    #[allow(clippy::float_cmp)]
    fn compare_scalars(&self, op: BinaryOp, left: &Value, right: &Value) -> bool {
        let equality = matches!(op, BinaryOp::Eq | BinaryOp::NotEq);
        if !equality {
            return compare_numbers(op, left.to_number(self.doc), right.to_number(self.doc));
        }

        let equal = if matches!(left, Value::Boolean(_)) || matches!(right, Value::Boolean(_)) {
            left.to_boolean() == right.to_boolean()
        } else if matches!(left, Value::Number(_)) || matches!(right, Value::Number(_)) {
            left.to_number(self.doc) == right.to_number(self.doc)
        } else {
            left.to_xpath_string(self.doc) == right.to_xpath_string(self.doc)
        };
        equal == (op == BinaryOp::Eq)
    }

    fn apply_steps(&self, start: Vec<NodeRef>, steps: &[Step]) -> XPathResult<Vec<NodeRef>> {
        let mut current = start;
        for step in steps {
            let mut next = Vec::new();
            for node in &current {
                let candidates: Vec<NodeRef> = self
                    .axis(*node, step.axis)
                    .into_iter()
                    .filter(|n| self.matches(*n, step.axis, &step.test))
                    .collect();
                next.extend(self.apply_predicates(candidates, &step.predicates)?);
            }
            current = document_order(next);
        }
        Ok(current)
    }

    /// Filter `nodes` (already in the order positions count in) through
    /// each predicate in turn.
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    fn apply_predicates(
        &self,
        mut nodes: Vec<NodeRef>,
        predicates: &[Expr],
    ) -> XPathResult<Vec<NodeRef>> {
        for predicate in predicates {
            let size = nodes.len();
            let mut kept = Vec::with_capacity(size);
            for (i, node) in nodes.into_iter().enumerate() {
                let ctx = EvalContext {
                    node,
                    position: i.saturating_add(1),
                    size,
                };
                let keep = match self.eval(predicate, ctx)? {
                    Value::Number(n) => n == ctx.position as f64,
                    other => other.to_boolean(),
                };
                if keep {
                    kept.push(node);
                }
            }
            nodes = kept;
        }
        Ok(nodes)
    }

    /// Nodes along `axis`, nearest first for reverse axes.
    fn axis(&self, node: NodeRef, axis: Axis) -> Vec<NodeRef> {
        let doc = self.doc;
        match axis {
            Axis::Child => doc.children(node),
            Axis::Descendant => doc.descendants(node),
            Axis::DescendantOrSelf => {
                let mut nodes = vec![node];
                nodes.extend(doc.descendants(node));
                nodes
            },
            Axis::Parent => doc.parent(node).into_iter().collect(),
            Axis::Ancestor => doc.ancestors(node),
            Axis::AncestorOrSelf => {
                let mut nodes = vec![node];
                nodes.extend(doc.ancestors(node));
                nodes
            },
            Axis::FollowingSibling => doc.following_siblings(node),
            Axis::PrecedingSibling => doc.preceding_siblings(node),
            Axis::Following => doc.following(node),
            Axis::Preceding => doc.preceding(node),
            Axis::SelfAxis => vec![node],
            Axis::Attribute => doc.attributes(node),
        }
    }

    fn matches(&self, node: NodeRef, axis: Axis, test: &NodeTest) -> bool {
        let principal = |n: NodeRef| {
            if axis == Axis::Attribute {
                n.is_attribute()
            } else {
                self.doc.is_element(n)
            }
        };
        match test {
            NodeTest::Node => true,
            NodeTest::Any => principal(node),
            NodeTest::Name(name) => principal(node) && self.doc.name(node) == Some(name.as_str()),
            NodeTest::Text => matches!(self.doc.kind(node), Some(NodeKind::Text(_))),
            NodeTest::Comment => matches!(self.doc.kind(node), Some(NodeKind::Comment(_))),
            NodeTest::ProcessingInstruction(target) => match self.doc.kind(node) {
                Some(NodeKind::ProcessingInstruction { target: t, .. }) => {
                    target.as_ref().is_none_or(|wanted| wanted == t)
                },
                _ => false,
            },
        }
    }
}

#[allow(clippy::float_cmp)]
fn compare_numbers(op: BinaryOp, l: f64, r: f64) -> bool {
    match op {
        BinaryOp::Eq => l == r,
        BinaryOp::NotEq => l != r,
        BinaryOp::Lt => l < r,
        BinaryOp::Le => l <= r,
        BinaryOp::Gt => l > r,
        BinaryOp::Ge => l >= r,
        _ => false,
    }
}

/// Sort into document order and drop duplicates.
pub(crate) fn document_order(mut nodes: Vec<NodeRef>) -> Vec<NodeRef> {
    nodes.sort_unstable();
    nodes.dedup();
    nodes
}
