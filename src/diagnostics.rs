//! Diagnostics produced while lexing and parsing
//!
//! Nothing in the front end aborts on malformed input. Lexical, syntax and
//! nesting problems are recorded as [`Diagnostic`]s in a [`Diagnostics`]
//! collector and the pipeline carries on with a best-effort token or a partial
//! AST.

use crate::parser::ast::{Position, Span};
use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn name(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which stage found the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Malformed token.
    Lexical,
    /// Grammar violation.
    Syntax,
    /// Unbalanced `()`, `[]` or `{}`.
    Nesting,
}

impl DiagnosticKind {
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::Lexical => "lexical",
            DiagnosticKind::Syntax => "syntax",
            DiagnosticKind::Nesting => "nesting",
        }
    }
}

/// What the lexer or parser did to keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// An error token stands in for the malformed text.
    ErrorToken,
    /// The lexer resumed at the start of the next line.
    ResumeNextLine,
    /// The parser skipped this many tokens to reach a statement boundary.
    SkippedTokens(usize),
    /// The construct was closed implicitly at end of input.
    ClosedAtEof,
    /// The delimiter was ignored.
    IgnoredDelimiter,
}

impl fmt::Display for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recovery::ErrorToken => write!(f, "replaced with an error token"),
            Recovery::ResumeNextLine => write!(f, "resumed at the next line"),
            Recovery::SkippedTokens(n) => write!(f, "skipped {} token(s)", n),
            Recovery::ClosedAtEof => write!(f, "closed at end of input"),
            Recovery::IgnoredDelimiter => write!(f, "ignored the delimiter"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
    pub recovery: Option<Recovery>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
            span,
            recovery: None,
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
            span,
            recovery: None,
        }
    }

    pub fn with_recovery(mut self, recovery: Recovery) -> Self {
        self.recovery = Some(recovery);
        self
    }

    pub fn position(&self) -> Position {
        self.span.start
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.span.start.line, self.span.start.column, self.severity, self.message
        )
    }
}

/// Ordered collection of diagnostics for one source unit.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(
            kind = diagnostic.kind.name(),
            line = diagnostic.span.start.line,
            column = diagnostic.span.start.column,
            "{}",
            diagnostic.message
        );
        self.items.push(diagnostic);
    }

    pub fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>, span: Span) {
        self.push(Diagnostic::error(kind, message, span));
    }

    pub fn warning(&mut self, kind: DiagnosticKind, message: impl Into<String>, span: Span) {
        self.push(Diagnostic::warning(kind, message, span));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    /// Drop everything recorded after the first `len` diagnostics. Used when a
    /// speculative parse is abandoned.
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        self.items.extend(other);
    }

    /// Consume the collector, returning diagnostics ordered by source position.
    /// The sort is stable, so diagnostics at the same position keep the order
    /// in which they were reported.
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.items.sort_by_key(|d| d.span.start.offset);
        self.items
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_at(line: usize, column: usize, offset: usize) -> Span {
        let pos = Position::new(line, column, offset);
        Span::new(pos, pos)
    }

    #[test]
    fn test_display_format() {
        let diag = Diagnostic::error(DiagnosticKind::Syntax, "expected ';'", span_at(3, 7, 20));
        assert_eq!(diag.to_string(), "3:7: error: expected ';'");
    }

    #[test]
    fn test_sorted_by_position() {
        let mut diags = Diagnostics::new();
        diags.error(DiagnosticKind::Syntax, "second", span_at(2, 1, 10));
        diags.warning(DiagnosticKind::Lexical, "first", span_at(1, 1, 0));
        let sorted = diags.into_sorted();
        assert_eq!(sorted[0].message, "first");
        assert_eq!(sorted[1].message, "second");
    }

    #[test]
    fn test_truncate_and_has_errors() {
        let mut diags = Diagnostics::new();
        diags.warning(DiagnosticKind::Lexical, "w", span_at(1, 1, 0));
        assert!(!diags.has_errors());
        diags.error(DiagnosticKind::Syntax, "e", span_at(1, 2, 1));
        assert!(diags.has_errors());
        diags.truncate(1);
        assert_eq!(diags.len(), 1);
        assert!(!diags.has_errors());
    }
}
