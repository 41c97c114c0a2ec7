//! Assembles a [`SyntaxTree`] from the engine's event stream.
//!
//! Hidden and inlined rules close by splicing their children into the
//! parent, with field tags remapped. Stray top-level elements (leading
//! trivia emitted before the root opened, trailing error sweep) are folded
//! into the root node so the tree always has a single root covering the
//! whole input.

use text_size::{TextRange, TextSize};

use crate::engine::{Event, OpenKind};
use crate::table::{FieldId, GrammarTable};

use super::{Element, Node, NodeKind, SyntaxTree, TokenLeaf};

pub(crate) fn build(table: &GrammarTable, source: &str, events: Vec<Event>) -> SyntaxTree {
    let mut builder = Builder {
        table,
        cursor: 0,
        stack: Vec::new(),
        top: Vec::new(),
    };
    for event in events {
        builder.apply(event);
    }
    builder.finish(source)
}

struct Frame {
    kind: OpenKind,
    children: Vec<Element>,
    fields: Vec<(FieldId, u32)>,
    field_scope: Vec<FieldId>,
}

struct Builder<'a> {
    table: &'a GrammarTable,
    /// End of the last token seen; empty nodes anchor here.
    cursor: u32,
    stack: Vec<Frame>,
    /// Elements with no enclosing node.
    top: Vec<Element>,
}

impl Builder<'_> {
    fn apply(&mut self, event: Event) {
        match event {
            Event::Open { kind } => self.stack.push(Frame {
                kind,
                children: Vec::new(),
                fields: Vec::new(),
                field_scope: Vec::new(),
            }),
            Event::FieldStart { field } => {
                if let Some(frame) = self.stack.last_mut() {
                    frame.field_scope.push(field);
                }
            }
            Event::FieldEnd => {
                if let Some(frame) = self.stack.last_mut() {
                    frame.field_scope.pop();
                }
            }
            Event::Token {
                terminal,
                alias,
                range,
                trivia,
            } => {
                self.cursor = range.end().into();
                self.attach(Element::Token(TokenLeaf {
                    terminal,
                    alias,
                    range,
                    trivia,
                }));
            }
            Event::Close => {
                let frame = self.stack.pop().expect("unbalanced close");
                self.close_frame(frame);
            }
        }
    }

    fn attach(&mut self, element: Element) {
        match self.stack.last_mut() {
            Some(frame) => {
                if element.is_significant() {
                    if let Some(&field) = frame.field_scope.last() {
                        frame.fields.push((field, frame.children.len() as u32));
                    }
                }
                frame.children.push(element);
            }
            None => self.top.push(element),
        }
    }

    fn close_frame(&mut self, frame: Frame) {
        let range = span_of(&frame.children, self.cursor);
        let mut fields = frame.fields;

        match frame.kind {
            OpenKind::Error => self.attach(Element::Node(Node {
                kind: NodeKind::Error,
                range,
                children: frame.children,
                fields,
            })),
            OpenKind::Rule {
                rule,
                alias,
                lhs_field,
            } => {
                if let Some(field) = lhs_field {
                    let first = frame
                        .children
                        .iter()
                        .position(|child| child.is_significant());
                    if let Some(index) = first {
                        fields.push((field, index as u32));
                    }
                }

                let info = self.table.rule(rule);
                if let Some((alias_id, _)) = alias {
                    self.attach(Element::Node(Node {
                        kind: NodeKind::Alias(alias_id),
                        range,
                        children: frame.children,
                        fields,
                    }));
                } else if (info.hidden || info.inline) && !self.stack.is_empty() {
                    self.splice(frame.children, fields);
                } else {
                    self.attach(Element::Node(Node {
                        kind: NodeKind::Rule(rule),
                        range,
                        children: frame.children,
                        fields,
                    }));
                }
            }
        }
    }

    /// Promotes a hidden node's children into the parent in place.
    fn splice(&mut self, children: Vec<Element>, fields: Vec<(FieldId, u32)>) {
        let frame = self.stack.last_mut().expect("splice requires a parent");
        let base = frame.children.len() as u32;

        if let Some(&active) = frame.field_scope.last() {
            for (offset, child) in children.iter().enumerate() {
                if child.is_significant() {
                    frame.fields.push((active, base + offset as u32));
                }
            }
        }
        frame
            .fields
            .extend(fields.into_iter().map(|(field, index)| (field, base + index)));
        frame.children.extend(children);
    }

    fn finish(mut self, source: &str) -> SyntaxTree {
        // Balanced event streams leave the stack empty; close anything
        // left rather than lose its children.
        while let Some(frame) = self.stack.pop() {
            self.close_frame(frame);
        }

        let root_position = self
            .top
            .iter()
            .position(|element| matches!(element, Element::Node(_)));

        let root = match root_position {
            Some(index) => {
                let mut rest = self.top.split_off(index);
                let Element::Node(mut root) = rest.remove(0) else {
                    unreachable!("position found a node");
                };
                let leading = std::mem::take(&mut self.top);
                if !leading.is_empty() {
                    for (_, index) in &mut root.fields {
                        *index += leading.len() as u32;
                    }
                    let mut children = leading;
                    children.append(&mut root.children);
                    root.children = children;
                }
                root.children.extend(rest);
                // The root alone keeps edge trivia inside its span, so the
                // tree covers the whole input.
                root.range = full_span(&root.children, 0);
                root
            }
            None => Node {
                kind: NodeKind::Rule(self.table.entry),
                range: TextRange::new(
                    TextSize::from(0),
                    TextSize::from(source.len() as u32),
                ),
                children: std::mem::take(&mut self.top),
                fields: Vec::new(),
            },
        };

        SyntaxTree {
            names: self.table.names.clone(),
            root,
        }
    }
}

/// Trivia hanging off a node's edges belongs to the enclosing node, so a
/// node spans its first through last significant child. Nodes holding only
/// trivia keep their full extent; empty nodes anchor at the cursor.
fn span_of(children: &[Element], cursor: u32) -> TextRange {
    let first = children.iter().find(|child| child.is_significant());
    let last = children.iter().rev().find(|child| child.is_significant());
    if let (Some(first), Some(last)) = (first, last) {
        return TextRange::new(first.range().start(), last.range().end());
    }
    full_span(children, cursor)
}

fn full_span(children: &[Element], cursor: u32) -> TextRange {
    match (children.first(), children.last()) {
        (Some(first), Some(last)) => TextRange::new(first.range().start(), last.range().end()),
        _ => {
            let at = TextSize::from(cursor);
            TextRange::new(at, at)
        }
    }
}
