//! Thread-safe diagnostic accumulator.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::Mutex;

/// Accumulates diagnostics across all pipeline stages.
///
/// The sink is shared by reference through the pipeline; stages emit into
/// it and the CLI drains it once at the end to print the run report.
#[derive(Default)]
pub struct DiagnosticSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits a diagnostic.
    pub fn emit(&self, diag: Diagnostic) {
        self.entries.lock().unwrap().push(diag);
    }

    /// Returns the number of diagnostics at or above `min`.
    pub fn count_at_least(&self, min: Severity) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.severity >= min)
            .count()
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.lock().unwrap())
    }

    /// Returns a snapshot without draining.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().unwrap().clone()
    }
}
