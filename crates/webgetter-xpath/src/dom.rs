//! Owned, arena-backed document model.
//!
//! The document is parsed with html5ever (through `scraper`), which recovers
//! from any malformed markup. Parse errors are kept on the [`Document`]
//! itself. Nodes are stored in document order, so a node's index doubles as
//! its document-order key and its descendants occupy a contiguous range.

use std::collections::HashMap;

use tracing::trace;

/// Index of a tree node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position in document order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node as seen by XPath: a tree node, or one attribute of an element.
///
/// The derived ordering is document order: an element sorts before its
/// attributes, which sort before the element's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeRef {
    node: NodeId,
    attribute: Option<usize>,
}

impl NodeRef {
    /// Reference a tree node.
    #[must_use]
    pub fn tree(node: NodeId) -> Self {
        Self {
            node,
            attribute: None,
        }
    }

    /// Reference the `position`-th attribute of `element`.
    #[must_use]
    pub fn attribute(element: NodeId, position: usize) -> Self {
        Self {
            node: element,
            attribute: Some(position),
        }
    }

    /// The tree node, or the owning element for an attribute.
    #[must_use]
    pub fn node(self) -> NodeId {
        self.node
    }

    /// Whether this references an attribute.
    #[must_use]
    pub fn is_attribute(self) -> bool {
        self.attribute.is_some()
    }
}

/// The kind of a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root.
    Root,
    /// An element with its (lowercase, for HTML) local name.
    Element(String),
    /// A text node.
    Text(String),
    /// A comment.
    Comment(String),
    /// A processing instruction.
    ProcessingInstruction {
        /// Target name.
        target: String,
        /// Instruction data.
        data: String,
    },
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<(String, String)>,
    /// One past the last descendant.
    subtree_end: usize,
}

/// A parsed HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    errors: Vec<String>,
}

impl Document {
    /// Parse an HTML document. Never fails: malformed markup is recovered
    /// and the parser's complaints are available from [`errors`](Self::errors).
    #[must_use]
    pub fn parse(html: &str) -> Self {
        let parsed = scraper::Html::parse_document(html);
        let errors: Vec<String> = parsed.errors.iter().map(ToString::to_string).collect();
        if !errors.is_empty() {
            trace!(count = errors.len(), "html parser recovered from errors");
        }

        let mut nodes: Vec<NodeData> = Vec::new();
        let mut ids = HashMap::new();

        for node in parsed.tree.root().descendants() {
            let (kind, attributes) = match node.value() {
                scraper::Node::Document | scraper::Node::Fragment => (NodeKind::Root, Vec::new()),
                scraper::Node::Element(element) => (
                    NodeKind::Element(element.name().to_owned()),
                    element
                        .attrs()
                        .map(|(name, value)| (name.to_owned(), value.to_owned()))
                        .collect(),
                ),
                scraper::Node::Text(text) => (NodeKind::Text((**text).to_owned()), Vec::new()),
                scraper::Node::Comment(comment) => {
                    (NodeKind::Comment((**comment).to_owned()), Vec::new())
                },
                scraper::Node::ProcessingInstruction(pi) => (
                    NodeKind::ProcessingInstruction {
                        target: pi.target.to_string(),
                        data: pi.data.to_string(),
                    },
                    Vec::new(),
                ),
                scraper::Node::Doctype(_) => continue,
            };

            let id = NodeId(nodes.len());
            let parent = node.parent().and_then(|p| ids.get(&p.id()).copied());
            if let Some(NodeId(p)) = parent
                && let Some(data) = nodes.get_mut(p)
            {
                data.children.push(id);
            }
            ids.insert(node.id(), id);
            nodes.push(NodeData {
                kind,
                parent,
                children: Vec::new(),
                attributes,
                subtree_end: id.0.saturating_add(1),
            });
        }

        // Children always follow their parent, so one reverse pass settles
        // every subtree range.
        for i in (0..nodes.len()).rev() {
            let end = nodes[i]
                .children
                .last()
                .map(|last| nodes[last.0].subtree_end);
            if let Some(end) = end {
                nodes[i].subtree_end = end;
            }
        }

        Self { nodes, errors }
    }

    /// Messages emitted by the parser while recovering.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Number of tree nodes (attributes excluded).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document has no nodes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> NodeRef {
        NodeRef::tree(NodeId(0))
    }

    fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0)
    }

    /// Kind of the tree node behind `node`; `None` for attributes.
    #[must_use]
    pub fn kind(&self, node: NodeRef) -> Option<&NodeKind> {
        if node.is_attribute() {
            return None;
        }
        self.data(node.node).map(|d| &d.kind)
    }

    /// Whether `node` is an element.
    #[must_use]
    pub fn is_element(&self, node: NodeRef) -> bool {
        matches!(self.kind(node), Some(NodeKind::Element(_)))
    }

    /// The `(name, value)` of an attribute reference.
    #[must_use]
    pub fn attribute(&self, node: NodeRef) -> Option<(&str, &str)> {
        let position = node.attribute?;
        self.data(node.node)?
            .attributes
            .get(position)
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Expanded name of an element, attribute or processing instruction.
    #[must_use]
    pub fn name(&self, node: NodeRef) -> Option<&str> {
        if node.is_attribute() {
            return self.attribute(node).map(|(name, _)| name);
        }
        match self.kind(node)? {
            NodeKind::Element(name) => Some(name),
            NodeKind::ProcessingInstruction { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Value of the attribute `name` of an element.
    #[must_use]
    pub fn attr(&self, node: NodeRef, name: &str) -> Option<&str> {
        if node.is_attribute() {
            return None;
        }
        self.data(node.node)?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parent of a node. An attribute's parent is its element.
    #[must_use]
    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        if node.is_attribute() {
            return Some(NodeRef::tree(node.node));
        }
        self.data(node.node)?.parent.map(NodeRef::tree)
    }

    /// Children of a tree node, in document order.
    #[must_use]
    pub fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        if node.is_attribute() {
            return Vec::new();
        }
        self.data(node.node)
            .map(|d| d.children.iter().copied().map(NodeRef::tree).collect())
            .unwrap_or_default()
    }

    /// Attributes of an element, in source order.
    #[must_use]
    pub fn attributes(&self, node: NodeRef) -> Vec<NodeRef> {
        if node.is_attribute() {
            return Vec::new();
        }
        self.data(node.node)
            .map(|d| {
                (0..d.attributes.len())
                    .map(|i| NodeRef::attribute(node.node, i))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Descendants of a tree node, in document order.
    #[must_use]
    pub fn descendants(&self, node: NodeRef) -> Vec<NodeRef> {
        if node.is_attribute() {
            return Vec::new();
        }
        let Some(data) = self.data(node.node) else {
            return Vec::new();
        };
        (node.node.0.saturating_add(1)..data.subtree_end)
            .map(|i| NodeRef::tree(NodeId(i)))
            .collect()
    }

    /// Tree nodes after `node` in document order, excluding its descendants.
    /// For an attribute this starts with its element's children.
    #[must_use]
    pub fn following(&self, node: NodeRef) -> Vec<NodeRef> {
        let start = if node.is_attribute() {
            node.node.0.saturating_add(1)
        } else {
            match self.data(node.node) {
                Some(d) => d.subtree_end,
                None => return Vec::new(),
            }
        };
        (start..self.nodes.len())
            .map(|i| NodeRef::tree(NodeId(i)))
            .collect()
    }

    /// Tree nodes before `node` in document order, excluding its ancestors,
    /// nearest first.
    #[must_use]
    pub fn preceding(&self, node: NodeRef) -> Vec<NodeRef> {
        let ancestors = self.ancestors(node);
        (0..node.node.0)
            .rev()
            .map(|i| NodeRef::tree(NodeId(i)))
            .filter(|n| !ancestors.contains(n))
            .collect()
    }

    /// Ancestors of a node, nearest first.
    #[must_use]
    pub fn ancestors(&self, node: NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut current = self.parent(node);
        while let Some(n) = current {
            out.push(n);
            current = self.parent(n);
        }
        out
    }

    /// Siblings after `node`, nearest first.
    #[must_use]
    pub fn following_siblings(&self, node: NodeRef) -> Vec<NodeRef> {
        let (siblings, position) = match self.sibling_position(node) {
            Some(found) => found,
            None => return Vec::new(),
        };
        siblings
            .iter()
            .skip(position.saturating_add(1))
            .copied()
            .map(NodeRef::tree)
            .collect()
    }

    /// Siblings before `node`, nearest first.
    #[must_use]
    pub fn preceding_siblings(&self, node: NodeRef) -> Vec<NodeRef> {
        let (siblings, position) = match self.sibling_position(node) {
            Some(found) => found,
            None => return Vec::new(),
        };
        siblings
            .iter()
            .take(position)
            .rev()
            .copied()
            .map(NodeRef::tree)
            .collect()
    }

    fn sibling_position(&self, node: NodeRef) -> Option<(&[NodeId], usize)> {
        if node.is_attribute() {
            return None;
        }
        let parent = self.data(node.node)?.parent?;
        let siblings = &self.data(parent)?.children;
        let position = siblings.iter().position(|&c| c == node.node)?;
        Some((siblings.as_slice(), position))
    }

    /// XPath string-value: the concatenated descendant text of a root or
    /// element, the value of an attribute, or the content of any other node.
    #[must_use]
    pub fn string_value(&self, node: NodeRef) -> String {
        if let Some((_, value)) = self.attribute(node) {
            return value.to_owned();
        }
        match self.kind(node) {
            Some(NodeKind::Root | NodeKind::Element(_)) => self
                .descendants(node)
                .into_iter()
                .filter_map(|d| match self.kind(d) {
                    Some(NodeKind::Text(text)) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
            Some(NodeKind::Text(text) | NodeKind::Comment(text)) => text.clone(),
            Some(NodeKind::ProcessingInstruction { data, .. }) => data.clone(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<!DOCTYPE html><html><head><title>T</title></head>\
        <body><p id=\"a\" class=\"x\">one <b>two</b></p><!-- note --><p>three</p></body></html>";

    fn element(doc: &Document, name: &str) -> NodeRef {
        doc.descendants(doc.root())
            .into_iter()
            .find(|n| doc.name(*n) == Some(name))
            .unwrap()
    }

    #[test]
    fn test_root_string_value() {
        let doc = Document::parse(PAGE);
        assert_eq!(doc.string_value(doc.root()), "Tone twothree");
    }

    #[test]
    fn test_attributes() {
        let doc = Document::parse(PAGE);
        let p = element(&doc, "p");
        assert_eq!(doc.attr(p, "id"), Some("a"));
        let attrs = doc.attributes(p);
        assert_eq!(attrs.len(), 2);
        assert!(attrs.iter().all(|a| a.is_attribute()));
        assert_eq!(doc.parent(attrs[0]), Some(p));
        assert!(attrs[0] > p);
        assert!(attrs[0] < doc.children(p)[0]);
    }

    #[test]
    fn test_siblings_and_comments() {
        let doc = Document::parse(PAGE);
        let p = element(&doc, "p");
        let next = doc.following_siblings(p);
        assert_eq!(next.len(), 2);
        assert_eq!(doc.kind(next[0]), Some(&NodeKind::Comment(" note ".into())));
        assert_eq!(doc.string_value(next[1]), "three");
        assert_eq!(doc.preceding_siblings(next[1])[0], next[0]);
    }

    #[test]
    fn test_descendants_are_contiguous() {
        let doc = Document::parse(PAGE);
        let p = element(&doc, "p");
        let names: Vec<_> = doc
            .descendants(p)
            .into_iter()
            .map(|n| doc.string_value(n))
            .collect();
        assert_eq!(names, vec!["one ", "two", "two"]);
    }

    #[test]
    fn test_following_and_preceding() {
        let doc = Document::parse(PAGE);
        let b = element(&doc, "b");
        let following = doc.following(b);
        assert!(following.iter().all(|n| *n > b));
        assert!(!doc.preceding(b).contains(&element(&doc, "body")));
        assert!(doc.preceding(b).contains(&element(&doc, "title")));
    }

    #[test]
    fn test_malformed_markup_recovers() {
        let doc = Document::parse("<div><span>unclosed<div>x</p>");
        assert!(!doc.errors().is_empty());
        assert_eq!(doc.string_value(doc.root()), "unclosedx");
    }
}
