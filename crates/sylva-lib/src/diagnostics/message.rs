use text_size::TextRange;

/// Diagnostic kinds emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    /// No grammar alternative accepts the lookahead token.
    UnexpectedToken,
    /// A required terminal was absent; parsing continued without it.
    MissingToken,
    /// A required production could not start here.
    ExpectedRule,
    /// A non-associative operator used in a chain without parentheses.
    NonAssociativeChain,
    /// Input remained after the top-level rule completed.
    TrailingInput,
}

impl DiagnosticKind {
    pub fn default_severity(&self) -> Severity {
        Severity::Error
    }

    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::UnexpectedToken => "unexpected token",
            Self::MissingToken => "missing token",
            Self::ExpectedRule => "expected a production here",
            Self::NonAssociativeChain => "operator is not associative, parenthesize the chain",
            Self::TrailingInput => "unexpected trailing input",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DiagnosticMessage {
    pub(crate) kind: DiagnosticKind,
    pub(crate) range: TextRange,
    pub(crate) message: String,
    /// Token names acceptable at this position.
    pub(crate) expected: Vec<String>,
    /// Display name of the token actually found, if any.
    pub(crate) found: Option<String>,
}

impl DiagnosticMessage {
    pub(crate) fn new(kind: DiagnosticKind, range: TextRange) -> Self {
        Self {
            kind,
            range,
            message: kind.fallback_message().to_string(),
            expected: Vec::new(),
            found: None,
        }
    }

    pub(crate) fn severity(&self) -> Severity {
        self.kind.default_severity()
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}: {}",
            self.severity(),
            u32::from(self.range.start()),
            u32::from(self.range.end()),
            self.message
        )?;
        if !self.expected.is_empty() {
            write!(f, " (expected {})", self.expected.join(", "))?;
        }
        if let Some(found) = &self.found {
            write!(f, " (found {found})")?;
        }
        Ok(())
    }
}
