//! Lossless concrete syntax trees.
//!
//! Every byte of the input is covered by exactly one token leaf, trivia
//! included, so the source reconstructs from the leaves. Nodes know their
//! kind by id; names resolve through a shared table, which keeps the tree
//! itself small and cheap to clone around.

mod build;
mod dump;

pub(crate) use build::build;

use std::sync::Arc;

use text_size::TextRange;

use crate::table::{AliasId, FieldId, NameTable, RuleId, TerminalId};

/// A parsed file.
pub struct SyntaxTree {
    pub(crate) names: Arc<NameTable>,
    pub(crate) root: Node,
}

#[derive(Clone)]
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) range: TextRange,
    pub(crate) children: Vec<Element>,
    /// Field tags by child index.
    pub(crate) fields: Vec<(FieldId, u32)>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Rule(RuleId),
    Alias(AliasId),
    Error,
}

#[derive(Clone)]
pub(crate) enum Element {
    Node(Node),
    Token(TokenLeaf),
}

#[derive(Clone, Copy)]
pub(crate) struct TokenLeaf {
    /// `None` for input skipped during error recovery.
    pub(crate) terminal: Option<TerminalId>,
    pub(crate) alias: Option<AliasId>,
    pub(crate) range: TextRange,
    pub(crate) trivia: bool,
}

impl Element {
    pub(crate) fn range(&self) -> TextRange {
        match self {
            Element::Node(node) => node.range,
            Element::Token(token) => token.range,
        }
    }

    pub(crate) fn is_significant(&self) -> bool {
        match self {
            Element::Node(_) => true,
            Element::Token(token) => !token.trivia,
        }
    }
}

impl SyntaxTree {
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            node: &self.root,
        }
    }

    /// Number of error nodes anywhere in the tree.
    pub fn error_count(&self) -> usize {
        let root_errors = usize::from(self.root().is_error());
        root_errors
            + self
                .root()
                .descendants()
                .filter(|el| matches!(el, ElementRef::Node(n) if n.is_error()))
                .count()
    }

    /// Concatenation of all leaves; equals the original source.
    pub fn reconstruct(&self, source: &str) -> String {
        let mut out = String::new();
        for element in self.root().descendants() {
            if let ElementRef::Token(token) = element {
                out.push_str(token.text(source));
            }
        }
        out
    }
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("root", &self.root().kind())
            .field("range", &self.root.range)
            .finish()
    }
}

/// Borrowed view of a node.
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t SyntaxTree,
    node: &'t Node,
}

/// Borrowed view of a token leaf.
#[derive(Clone, Copy)]
pub struct TokenRef<'t> {
    tree: &'t SyntaxTree,
    token: &'t TokenLeaf,
}

/// Either child of a node.
#[derive(Clone, Copy)]
pub enum ElementRef<'t> {
    Node(NodeRef<'t>),
    Token(TokenRef<'t>),
}

impl<'t> NodeRef<'t> {
    pub fn kind(&self) -> &'t str {
        match self.node.kind {
            NodeKind::Rule(rule) => &self.tree.names.rules[rule.index()],
            NodeKind::Alias(alias) => &self.tree.names.aliases[alias.index()],
            NodeKind::Error => "ERROR",
        }
    }

    pub fn range(&self) -> TextRange {
        self.node.range
    }

    pub fn is_error(&self) -> bool {
        self.node.kind == NodeKind::Error
    }

    pub fn child_count(&self) -> usize {
        self.node.children.len()
    }

    pub fn children(&self) -> impl Iterator<Item = ElementRef<'t>> + use<'t> {
        let tree = self.tree;
        self.node
            .children
            .iter()
            .map(move |child| ElementRef::wrap(tree, child))
    }

    /// Child nodes only, tokens skipped.
    pub fn child_nodes(&self) -> impl Iterator<Item = NodeRef<'t>> + use<'t> {
        self.children().filter_map(|child| match child {
            ElementRef::Node(node) => Some(node),
            ElementRef::Token(_) => None,
        })
    }

    pub fn child(&self, index: usize) -> Option<ElementRef<'t>> {
        self.node
            .children
            .get(index)
            .map(|child| ElementRef::wrap(self.tree, child))
    }

    /// First child tagged with the named field.
    pub fn child_by_field(&self, name: &str) -> Option<ElementRef<'t>> {
        let field = self.resolve_field(name)?;
        let (_, index) = self.node.fields.iter().find(|(f, _)| *f == field)?;
        self.child(*index as usize)
    }

    /// All children tagged with the named field, in order.
    pub fn children_by_field(&self, name: &str) -> Vec<ElementRef<'t>> {
        let Some(field) = self.resolve_field(name) else {
            return Vec::new();
        };
        self.node
            .fields
            .iter()
            .filter(|(f, _)| *f == field)
            .filter_map(|(_, index)| self.child(*index as usize))
            .collect()
    }

    /// Field name of the child at `index`, if it has one.
    pub fn field_of(&self, index: usize) -> Option<&'t str> {
        self.node
            .fields
            .iter()
            .find(|(_, i)| *i as usize == index)
            .map(|(field, _)| self.tree.names.fields[field.index()].as_str())
    }

    /// All elements beneath this node, pre-order, tokens included.
    pub fn descendants(&self) -> Descendants<'t> {
        Descendants {
            tree: self.tree,
            stack: self.node.children.iter().rev().collect(),
        }
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        slice(source, self.node.range)
    }

    fn resolve_field(&self, name: &str) -> Option<FieldId> {
        self.tree
            .names
            .fields
            .iter()
            .position(|f| f == name)
            .map(|index| FieldId(index as u16))
    }
}

impl<'t> TokenRef<'t> {
    pub fn kind(&self) -> &'t str {
        if let Some(alias) = self.token.alias {
            return &self.tree.names.aliases[alias.index()];
        }
        match self.token.terminal {
            Some(terminal) => &self.tree.names.terminals[terminal.index()],
            None => "ERROR",
        }
    }

    pub fn range(&self) -> TextRange {
        self.token.range
    }

    pub fn is_trivia(&self) -> bool {
        self.token.trivia
    }

    /// Whether the token stands for a named terminal (a token rule or an
    /// external) rather than a literal from the grammar text.
    pub fn is_named(&self) -> bool {
        self.token.alias.is_some() || self.tree.names.named_terminal(self.token.terminal)
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        slice(source, self.token.range)
    }
}

impl<'t> ElementRef<'t> {
    pub(crate) fn wrap(tree: &'t SyntaxTree, element: &'t Element) -> Self {
        match element {
            Element::Node(node) => ElementRef::Node(NodeRef { tree, node }),
            Element::Token(token) => ElementRef::Token(TokenRef { tree, token }),
        }
    }

    pub fn kind(&self) -> &'t str {
        match self {
            ElementRef::Node(node) => node.kind(),
            ElementRef::Token(token) => token.kind(),
        }
    }

    pub fn range(&self) -> TextRange {
        match self {
            ElementRef::Node(node) => node.range(),
            ElementRef::Token(token) => token.range(),
        }
    }

    pub fn as_node(&self) -> Option<NodeRef<'t>> {
        match self {
            ElementRef::Node(node) => Some(*node),
            ElementRef::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<TokenRef<'t>> {
        match self {
            ElementRef::Token(token) => Some(*token),
            ElementRef::Node(_) => None,
        }
    }
}

/// Depth-first walk over a subtree.
pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<&'t Element>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = ElementRef<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        if let Element::Node(node) = element {
            self.stack.extend(node.children.iter().rev());
        }
        Some(ElementRef::wrap(self.tree, element))
    }
}

fn slice(source: &str, range: TextRange) -> &str {
    let start: usize = range.start().into();
    let end: usize = range.end().into();
    &source[start..end]
}
