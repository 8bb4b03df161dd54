//! Plain-text rendering of diagnostics for the run report.

use crate::diagnostic::Diagnostic;
use ipforge_source::SourceDb;

/// Renders one diagnostic as terminal text.
///
/// ```text
/// warning[W103]: malformed port entry skipped
///   --> design.sv:14:5
///    |     input wire [ data
///    = note: expected a port name after the range
/// ```
pub fn render(diag: &Diagnostic, db: &SourceDb) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}[{}]: {}\n",
        diag.severity, diag.code, diag.message
    ));
    if let Some(resolved) = db.resolve(diag.span) {
        out.push_str(&format!("  --> {resolved}\n"));
        let line = db.file(diag.span.file).line_text(diag.span.start);
        if !line.trim().is_empty() {
            out.push_str(&format!("   |     {}\n", line.trim_end()));
        }
    }
    for note in &diag.notes {
        out.push_str(&format!("   = note: {note}\n"));
    }
    out
}
