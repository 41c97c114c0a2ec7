//! Tree rendering for snapshots and debugging.

use std::fmt::Write;

use super::{ElementRef, NodeRef, SyntaxTree};

impl SyntaxTree {
    /// Indented rendering with token text, one element per line. Trivia
    /// is omitted.
    ///
    /// ```text
    /// source_file
    ///   declaration
    ///     identifier "x"
    ///     ";"
    /// ```
    pub fn dump(&self, source: &str) -> String {
        let mut out = String::new();
        dump_node(self.root(), source, 0, None, &mut out);
        out
    }

    /// Compact S-expression of named nodes and leaves, with field labels.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        sexp_node(self.root(), &mut out);
        out
    }
}

fn dump_node(
    node: NodeRef<'_>,
    source: &str,
    depth: usize,
    label: Option<&str>,
    out: &mut String,
) {
    let pad = "  ".repeat(depth);
    let label = label.map(|f| format!("{f}: ")).unwrap_or_default();
    let _ = writeln!(out, "{pad}{label}{}", node.kind());
    for (index, child) in node.children().enumerate() {
        let label = node.field_of(index);
        match child {
            ElementRef::Node(child) => dump_node(child, source, depth + 1, label, out),
            ElementRef::Token(token) => {
                if token.is_trivia() {
                    continue;
                }
                let pad = "  ".repeat(depth + 1);
                let label = label.map(|f| format!("{f}: ")).unwrap_or_default();
                let _ = writeln!(out, "{pad}{label}{} {:?}", token.kind(), token.text(source));
            }
        }
    }
}

fn sexp_node(node: NodeRef<'_>, out: &mut String) {
    out.push('(');
    out.push_str(node.kind());
    for (index, child) in node.children().enumerate() {
        let label = node.field_of(index);
        match child {
            ElementRef::Node(child) => {
                out.push(' ');
                if let Some(label) = label {
                    out.push_str(label);
                    out.push_str(": ");
                }
                sexp_node(child, out);
            }
            ElementRef::Token(token) => {
                if token.is_trivia() || !token.is_named() {
                    continue;
                }
                out.push(' ');
                if let Some(label) = label {
                    out.push_str(label);
                    out.push_str(": ");
                }
                out.push('(');
                out.push_str(token.kind());
                out.push(')');
            }
        }
    }
    out.push(')');
}
