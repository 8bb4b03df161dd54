//! Run reporting: the module summary and the diagnostic report.

use crate::pipeline::RunSummary;
use ipforge_diagnostics::{render, Diagnostic, Severity};
use ipforge_source::SourceDb;

/// A human-readable description of the parsed module: parameters, a port
/// table, and the inferred groups. Printed at verbose level.
pub fn module_summary(summary: &RunSummary) -> String {
    let module = &summary.module;
    let mut out = format!("Module: {}\n", module.name);

    if !module.parameters.is_empty() {
        out.push_str("Parameters:\n");
        for param in &module.parameters {
            let kind = if param.is_local { "localparam" } else { "parameter" };
            let default = param.default.as_deref().unwrap_or("<none>");
            out.push_str(&format!("  {kind} {} = {default}\n", param.name));
        }
    }

    out.push_str(&format!("Ports ({}):\n", module.ports.len()));
    for port in &module.ports {
        let range = port
            .range
            .as_ref()
            .map(|r| format!("[{r}]"))
            .unwrap_or_default();
        out.push_str(&format!("  {:<6} {:<14} {}\n", port.direction.to_string(), range, port.name));
    }

    if !summary.grouped.groups.is_empty() {
        out.push_str("Port groups:\n");
        for group in &summary.grouped.groups {
            out.push_str(&format!(
                "  {}: {} signal{}\n",
                group.name,
                group.ports.len(),
                if group.ports.len() == 1 { "" } else { "s" }
            ));
        }
    }

    out
}

/// One line per matched interface, for the default output level.
pub fn interface_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    for bi in &summary.outcome.interfaces {
        out.push_str(&format!(
            "  {} -> {} ({})\n",
            bi.name, bi.bus_ref, bi.role
        ));
    }
    if !summary.outcome.unmatched.is_empty() {
        out.push_str(&format!(
            "  {} port(s) unmatched\n",
            summary.outcome.unmatched.len()
        ));
    }
    out
}

/// Renders accumulated diagnostics. Warnings and errors always print;
/// notes only when `verbose`.
pub fn diagnostic_report(diagnostics: &[Diagnostic], db: &SourceDb, verbose: bool) -> String {
    let mut out = String::new();
    for diag in diagnostics {
        if diag.severity >= Severity::Warning || verbose {
            out.push_str(&render(diag, db));
        }
    }
    out
}
