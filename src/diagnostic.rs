use std::fmt::Display;

use crate::parse::line_col;
use crate::tree::Span;

/// Why a rewrite target was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The value can't be proven statically, ie `size={variable}` or a spread.
    DynamicValue,

    /// The renamed key already exists on the element.
    ConflictingKey,

    /// A namespace import would have to be split to relocate one member.
    NamespaceImport,
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::DynamicValue => write!(f, "dynamic value"),
            DiagnosticKind::ConflictingKey => write!(f, "conflicting key"),
            DiagnosticKind::NamespaceImport => write!(f, "namespace import"),
        }
    }
}

/// A place that needs a human to look at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Label of the rule that raised it.
    pub rule: String,

    /// The category.
    pub kind: DiagnosticKind,

    /// A description.
    pub message: String,

    /// Where in the source.
    pub span: Span,

    /// One-based line of `span.lo`, filled in by [`Report::locate`].
    pub line: usize,

    /// One-based column of `span.lo`, filled in by [`Report::locate`].
    pub column: usize,
}

impl Diagnostic {
    /// Renders the diagnostic as `line:column: [rule] kind: message`.
    pub fn render(&self) -> String {
        format!(
            "{}:{}: [{}] {}: {}",
            self.line, self.column, self.rule, self.kind, self.message
        )
    }
}

/// Diagnostics collected while running the passes over one file.
#[derive(Debug, Clone, Default)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    /// Records a manual-review diagnostic.
    pub fn flag(&mut self, rule: &str, kind: DiagnosticKind, span: Span, message: String) {
        tracing::debug!(rule, %kind, lo = span.lo, "{}", message);
        self.diagnostics.push(Diagnostic {
            rule: rule.to_string(),
            kind,
            message,
            span,
            line: 0,
            column: 0,
        });
    }

    /// Resolves the line and column of every diagnostic against the text it was raised on.
    pub fn locate(&mut self, text: &str) {
        for diagnostic in &mut self.diagnostics {
            let (line, column) = line_col(text, diagnostic.span.lo);
            diagnostic.line = line;
            diagnostic.column = column;
        }
    }

    /// The diagnostics recorded so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consumes the report.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
