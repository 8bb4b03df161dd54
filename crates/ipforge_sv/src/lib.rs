//! Tolerant SystemVerilog header parsing for IP-XACT generation.
//!
//! This crate extracts the *interface* of the first top-level module in a
//! source file — name, parameters, ports — without elaborating any
//! semantics. The pipeline is:
//!
//! 1. [`preprocess`]: blank comments and inactive `` `ifdef`` regions in
//!    place, keeping byte offsets stable for diagnostics.
//! 2. [`parse_module`]: locate the module header and build a [`Module`]
//!    from its parameter and port lists (ANSI and non-ANSI).
//!
//! Ports hidden behind undefined macros are dropped rather than guessed
//! at; malformed entries are skipped with warnings and parsing continues.

#![warn(missing_docs)]

mod error;
mod module;
mod parser;
mod preproc;

pub use error::SvError;
pub use module::{Direction, Module, Parameter, Port, PortRange};
pub use parser::parse_module;
pub use preproc::preprocess;

use ipforge_diagnostics::DiagnosticSink;
use ipforge_source::SourceDb;
use std::path::Path;

/// Reads, preprocesses, and parses a SystemVerilog file.
///
/// The file is registered in `db` so diagnostic spans resolve against it.
pub fn parse_file(
    path: &Path,
    db: &mut SourceDb,
    sink: &DiagnosticSink,
) -> Result<Module, SvError> {
    let file = db.load_file(path).map_err(|e| SvError::SourceIo {
        path: path.to_path_buf(),
        source: e,
    })?;
    let content = db.file(file).content.clone();
    let clean = preprocess(&content, file, sink);
    parse_module(&clean, file, path, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Preprocessor and parser together on a source with directives,
    /// comments containing port-like text, and macro-valued widths.
    #[test]
    fn robust_parse_end_to_end() {
        let source = "\
`define DEPTH 16
`include \"defs.svh\"

/* This block comment mentions
   input wire ghost_port
   and must not create it. */
module robust #(
    parameter WIDTH = 8,
    parameter AW = 12
) (
    input  wire clk,
    input  wire rst_n,
    input  wire [WIDTH-1:0] data_in,
`ifdef USE_OUTPUT
    output wire [WIDTH-1:0] data_out,
`endif
    input  wire valid
);
endmodule
";
        let sink = DiagnosticSink::new();
        let clean = preprocess(source, ipforge_source::FileId::NONE, &sink);
        let module = parse_module(
            &clean,
            ipforge_source::FileId::NONE,
            Path::new("robust_test.sv"),
            &sink,
        )
        .unwrap();

        assert_eq!(module.name, "robust");

        let names: Vec<&str> = module.ports.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["clk", "rst_n", "data_in", "valid"]);

        let params: Vec<&str> = module.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(params, ["WIDTH", "AW"]);

        let data_in = &module.ports[2];
        assert_eq!(data_in.range.as_ref().unwrap().to_string(), "WIDTH-1:0");
    }

    #[test]
    fn parse_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("top.sv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "module top (input wire clk, output wire led);").unwrap();
        writeln!(f, "endmodule").unwrap();

        let mut db = SourceDb::new();
        let sink = DiagnosticSink::new();
        let module = parse_file(&path, &mut db, &sink).unwrap();
        assert_eq!(module.name, "top");
        assert_eq!(module.ports.len(), 2);
        assert_eq!(module.source_path, path);
    }

    #[test]
    fn parse_file_missing_is_source_io() {
        let mut db = SourceDb::new();
        let sink = DiagnosticSink::new();
        let err = parse_file(Path::new("/no/such/file.sv"), &mut db, &sink).unwrap_err();
        assert!(matches!(err, SvError::SourceIo { .. }));
    }
}
