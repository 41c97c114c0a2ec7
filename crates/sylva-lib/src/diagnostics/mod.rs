//! Syntax diagnostics collected during a parse.
//!
//! Diagnostics are data, not control flow: the engine records them and keeps
//! going. Each carries the byte range it covers, the set of token names that
//! would have been accepted, and what was actually found, so callers can do
//! their own reporting on top of the built-in renderer.

mod message;
mod printer;

#[cfg(test)]
mod diagnostics_tests;

use text_size::TextRange;

pub use message::{DiagnosticKind, Severity};
pub use printer::DiagnosticsPrinter;

use message::DiagnosticMessage;

/// An ordered collection of diagnostics from one parse.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    messages: Vec<DiagnosticMessage>,
}

/// In-progress diagnostic; call [`DiagnosticBuilder::emit`] to record it.
#[must_use = "diagnostic not emitted, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    message: DiagnosticMessage,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a diagnostic of the given kind covering `range`.
    pub fn report(&mut self, kind: DiagnosticKind, range: TextRange) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            message: DiagnosticMessage::new(kind, range),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.severity() == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.severity() == Severity::Error)
            .count()
    }

    /// Structured view of each diagnostic: `(offset, expected names, found)`.
    pub fn entries(&self) -> impl Iterator<Item = (u32, &[String], Option<&str>)> {
        self.messages
            .iter()
            .map(|m| (m.range.start().into(), m.expected.as_slice(), m.found.as_deref()))
    }

    pub fn render(&self, source: &str) -> String {
        self.printer().source(source).render()
    }

    pub fn printer(&self) -> DiagnosticsPrinter<'_, '_> {
        DiagnosticsPrinter::new(self)
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }

    /// Number of recorded messages; used by the engine to roll back
    /// diagnostics emitted during abandoned speculation.
    pub(crate) fn mark(&self) -> usize {
        self.messages.len()
    }

    pub(crate) fn truncate(&mut self, mark: usize) {
        self.messages.truncate(mark);
    }

    pub(crate) fn messages(&self) -> &[DiagnosticMessage] {
        &self.messages
    }
}

impl<'a> DiagnosticBuilder<'a> {
    /// Overrides the kind's default message.
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message.message = msg.into();
        self
    }

    /// Records a token name that would have been accepted here.
    pub fn expected(mut self, name: impl Into<String>) -> Self {
        self.message.expected.push(name.into());
        self
    }

    /// Records what the lexer actually produced.
    pub fn found(mut self, name: impl Into<String>) -> Self {
        self.message.found = Some(name.into());
        self
    }

    pub fn emit(self) {
        self.diagnostics.messages.push(self.message);
    }
}
