//! The diagnostic message type.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use ipforge_source::Span;
use serde::{Deserialize, Serialize};

/// A single diagnostic: severity, code, message, optional location, and
/// optional explanatory notes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity of the condition.
    pub severity: Severity,
    /// Stable code identifying the condition kind.
    pub code: DiagnosticCode,
    /// Human-readable message.
    pub message: String,
    /// Source location, or [`Span::NONE`] for file/tool-level conditions.
    pub span: Span,
    /// Extra context lines rendered as `= note: …`.
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Warning, code, message, span)
    }

    /// Creates a note diagnostic.
    pub fn note(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Note, code, message, span)
    }

    /// Creates an error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Error, code, message, span)
    }

    fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    /// Appends a note line.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}
