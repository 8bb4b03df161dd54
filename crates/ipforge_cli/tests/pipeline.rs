//! End-to-end pipeline tests over a generated fixture library.
//!
//! The library and the SystemVerilog sources are generated from shared
//! signal tables, so the fixtures cannot drift apart.

use ipforge_cli::pipeline::{run, RunOptions};
use ipforge_diagnostics::DiagnosticSink;
use ipforge_ipxact::Revision;
use ipforge_match::Role;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// `(logical name, master drives it, width)`
type Signal = (&'static str, bool, Option<u32>);

const AXI4_SIGNALS: [Signal; 33] = [
    ("AWADDR", true, Some(32)),
    ("AWLEN", true, Some(8)),
    ("AWSIZE", true, Some(3)),
    ("AWBURST", true, Some(2)),
    ("AWLOCK", true, None),
    ("AWCACHE", true, Some(4)),
    ("AWPROT", true, Some(3)),
    ("AWQOS", true, Some(4)),
    ("AWVALID", true, None),
    ("AWREADY", false, None),
    ("WDATA", true, Some(32)),
    ("WSTRB", true, Some(4)),
    ("WLAST", true, None),
    ("WVALID", true, None),
    ("WREADY", false, None),
    ("BRESP", false, Some(2)),
    ("BVALID", false, None),
    ("BREADY", true, None),
    ("ARADDR", true, Some(32)),
    ("ARLEN", true, Some(8)),
    ("ARSIZE", true, Some(3)),
    ("ARBURST", true, Some(2)),
    ("ARLOCK", true, None),
    ("ARCACHE", true, Some(4)),
    ("ARPROT", true, Some(3)),
    ("ARQOS", true, Some(4)),
    ("ARVALID", true, None),
    ("ARREADY", false, None),
    ("RDATA", false, Some(32)),
    ("RRESP", false, Some(2)),
    ("RLAST", false, None),
    ("RVALID", false, None),
    ("RREADY", true, None),
];

const AXI4LITE_SIGNALS: [Signal; 19] = [
    ("AWADDR", true, Some(32)),
    ("AWPROT", true, Some(3)),
    ("AWVALID", true, None),
    ("AWREADY", false, None),
    ("WDATA", true, Some(32)),
    ("WSTRB", true, Some(4)),
    ("WVALID", true, None),
    ("WREADY", false, None),
    ("BRESP", false, Some(2)),
    ("BVALID", false, None),
    ("BREADY", true, None),
    ("ARADDR", true, Some(32)),
    ("ARPROT", true, Some(3)),
    ("ARVALID", true, None),
    ("ARREADY", false, None),
    ("RDATA", false, Some(32)),
    ("RRESP", false, Some(2)),
    ("RVALID", false, None),
    ("RREADY", true, None),
];

const APB_SIGNALS: [Signal; 8] = [
    ("PADDR", true, Some(32)),
    ("PSEL", true, None),
    ("PENABLE", true, None),
    ("PWRITE", true, None),
    ("PWDATA", true, Some(32)),
    ("PREADY", false, None),
    ("PRDATA", false, Some(32)),
    ("PSLVERR", false, None),
];

fn bus_definition_xml(name: &str, addressable: bool) -> String {
    format!(
        r#"<ipxact:busDefinition xmlns:ipxact="http://www.accellera.org/XMLSchema/IPXACT/1685-2014">
  <ipxact:vendor>amba.com</ipxact:vendor>
  <ipxact:library>AMBA4</ipxact:library>
  <ipxact:name>{name}</ipxact:name>
  <ipxact:version>r0p0_0</ipxact:version>
  <ipxact:directConnection>true</ipxact:directConnection>
  <ipxact:isAddressable>{addressable}</ipxact:isAddressable>
  <ipxact:parameters>
    <ipxact:parameter><ipxact:name>DATA_WIDTH</ipxact:name><ipxact:value>32</ipxact:value></ipxact:parameter>
    <ipxact:parameter><ipxact:name>ADDR_WIDTH</ipxact:name><ipxact:value>32</ipxact:value></ipxact:parameter>
  </ipxact:parameters>
</ipxact:busDefinition>
"#
    )
}

fn abstraction_xml(name: &str, signals: &[Signal]) -> String {
    let mut ports = String::new();
    for (logical, master_out, width) in signals {
        let direction = if *master_out { "out" } else { "in" };
        let width_el = width
            .map(|w| format!("<ipxact:width>{w}</ipxact:width>"))
            .unwrap_or_default();
        write!(
            ports,
            r#"    <ipxact:port>
      <ipxact:logicalName>{logical}</ipxact:logicalName>
      <ipxact:wire>
        <ipxact:onMaster><ipxact:presence>required</ipxact:presence>{width_el}<ipxact:direction>{direction}</ipxact:direction></ipxact:onMaster>
      </ipxact:wire>
    </ipxact:port>
"#
        )
        .unwrap();
    }
    format!(
        r#"<ipxact:abstractionDefinition xmlns:ipxact="http://www.accellera.org/XMLSchema/IPXACT/1685-2014">
  <ipxact:vendor>amba.com</ipxact:vendor>
  <ipxact:library>AMBA4</ipxact:library>
  <ipxact:name>{name}_rtl</ipxact:name>
  <ipxact:version>r0p0_0</ipxact:version>
  <ipxact:busType vendor="amba.com" library="AMBA4" name="{name}" version="r0p0_0"/>
  <ipxact:ports>
{ports}  </ipxact:ports>
</ipxact:abstractionDefinition>
"#
    )
}

fn special_bus_xml(name: &str, logical: &str) -> (String, String) {
    let bus = format!(
        r#"<ipxact:busDefinition xmlns:ipxact="http://www.accellera.org/XMLSchema/IPXACT/1685-2014">
  <ipxact:vendor>user</ipxact:vendor>
  <ipxact:library>signals</ipxact:library>
  <ipxact:name>{name}</ipxact:name>
  <ipxact:version>1.0</ipxact:version>
  <ipxact:directConnection>true</ipxact:directConnection>
  <ipxact:isAddressable>false</ipxact:isAddressable>
</ipxact:busDefinition>
"#
    );
    let abs = format!(
        r#"<ipxact:abstractionDefinition xmlns:ipxact="http://www.accellera.org/XMLSchema/IPXACT/1685-2014">
  <ipxact:vendor>user</ipxact:vendor>
  <ipxact:library>signals</ipxact:library>
  <ipxact:name>{name}_rtl</ipxact:name>
  <ipxact:version>1.0</ipxact:version>
  <ipxact:busType vendor="user" library="signals" name="{name}" version="1.0"/>
  <ipxact:ports>
    <ipxact:port>
      <ipxact:logicalName>{logical}</ipxact:logicalName>
      <ipxact:wire>
        <ipxact:onMaster><ipxact:presence>required</ipxact:presence><ipxact:direction>out</ipxact:direction></ipxact:onMaster>
      </ipxact:wire>
    </ipxact:port>
  </ipxact:ports>
</ipxact:abstractionDefinition>
"#
    );
    (bus, abs)
}

fn write_library(root: &Path) {
    let write = |rel: &str, file: &str, content: String| {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), content).unwrap();
    };

    for (name, signals) in [
        ("AXI4", &AXI4_SIGNALS[..]),
        ("AXI4LITE", &AXI4LITE_SIGNALS[..]),
        ("APB4", &APB_SIGNALS[..]),
    ] {
        let rel = format!("amba.com/AMBA4/{name}/r0p0_0");
        write(&rel, &format!("{name}.xml"), bus_definition_xml(name, true));
        write(&rel, &format!("{name}_rtl.xml"), abstraction_xml(name, signals));
    }
    for (name, logical) in [("clock", "CLK"), ("reset", "RSTn")] {
        let (bus, abs) = special_bus_xml(name, logical);
        let rel = format!("user/signals/{name}/1.0");
        write(&rel, &format!("{name}.xml"), bus);
        write(&rel, &format!("{name}_rtl.xml"), abs);
    }
}

/// Renders a module whose `prefix_*` ports follow `signals` from the
/// given perspective (`as_master` inverts nothing; slave inverts all).
fn sv_ports(prefix: &str, signals: &[Signal], as_master: bool) -> String {
    let mut out = String::new();
    for (logical, master_out, width) in signals {
        let is_output = if as_master { *master_out } else { !*master_out };
        let direction = if is_output { "output" } else { "input" };
        let range = width
            .map(|w| format!("[{}:0] ", w - 1))
            .unwrap_or_default();
        writeln!(out, "    {direction} wire {range}{prefix}_{logical},").unwrap();
    }
    out
}

fn write_axi_master_example(path: &Path) {
    let mut src = String::from("module axi_master_example #(\n");
    src.push_str("    parameter DATA_WIDTH = 32,\n    parameter ADDR_WIDTH = 32\n) (\n");
    src.push_str("    input  wire clk,\n    input  wire rst_n,\n");
    src.push_str(&sv_ports("M_AXI", &AXI4_SIGNALS, true));
    src.push_str("    input  wire start,\n    output wire done\n);\nendmodule\n");
    fs::write(path, src).unwrap();
}

fn write_dual_interface(path: &Path) {
    let mut src = String::from("module dual_interface (\n");
    src.push_str("    input  wire clk,\n    input  wire rst_n,\n");
    src.push_str(&sv_ports("S_AXI", &AXI4LITE_SIGNALS, false));
    src.push_str(&sv_ports("M_APB", &APB_SIGNALS, true));
    // trim the trailing comma off the last entry
    let cut = src.rfind(',').unwrap();
    src.replace_range(cut..cut + 1, "");
    src.push_str(");\nendmodule\n");
    fs::write(path, src).unwrap();
}

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        write_library(&root.join("libs"));
        Self { _dir: dir, root }
    }

    fn options(&self, input: &str, revision: Revision) -> RunOptions {
        RunOptions {
            input: self.root.join(input),
            output: None,
            libs: self.root.join("libs"),
            cache: self.root.join(".ipforge_cache.json"),
            rebuild: false,
            threshold: None,
            revision,
            config: Some(self.root.join("ipforge.toml")),
        }
    }
}

#[test]
fn axi_master_example_matches_axi4() {
    let fx = Fixture::new();
    let input = fx.root.join("axi_master_example.sv");
    write_axi_master_example(&input);

    let sink = DiagnosticSink::new();
    let summary = run(&fx.options("axi_master_example.sv", Revision::Std2014), &sink).unwrap();

    assert_eq!(summary.module.ports.len(), 37);

    // One AXI master plus clock and reset interfaces.
    assert_eq!(summary.outcome.interfaces.len(), 3);
    let axi = summary
        .outcome
        .interfaces
        .iter()
        .find(|i| i.name == "M_AXI")
        .expect("M_AXI interface");
    assert_eq!(axi.role, Role::Master);
    assert_eq!(axi.bus_ref.name, "AXI4");
    assert_eq!(axi.port_maps.len(), 33);
    assert!(axi.address_space.is_some());

    let names: Vec<&str> = summary
        .outcome
        .interfaces
        .iter()
        .map(|i| i.name.as_str())
        .collect();
    assert!(names.contains(&"clk"));
    assert!(names.contains(&"rst_n"));

    // start and done stay unmatched.
    let unmatched: Vec<&str> = summary
        .outcome
        .unmatched
        .iter()
        .map(|&i| summary.module.ports[i].name.as_str())
        .collect();
    assert_eq!(unmatched, ["start", "done"]);

    let xml = fs::read_to_string(&summary.output_path).unwrap();
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("<ipxact:component"));
    assert!(xml.contains("AS_M_AXI"));
}

#[test]
fn dual_interface_gets_both_roles() {
    let fx = Fixture::new();
    let input = fx.root.join("dual_interface.sv");
    write_dual_interface(&input);

    let sink = DiagnosticSink::new();
    let summary = run(&fx.options("dual_interface.sv", Revision::Std2014), &sink).unwrap();

    let axi = summary
        .outcome
        .interfaces
        .iter()
        .find(|i| i.name == "S_AXI")
        .expect("S_AXI interface");
    assert_eq!(axi.role, Role::Slave);
    assert_eq!(axi.bus_ref.name, "AXI4LITE");
    assert_eq!(axi.memory_map.as_ref().unwrap().name, "MM_S_AXI");

    let apb = summary
        .outcome
        .interfaces
        .iter()
        .find(|i| i.name == "M_APB")
        .expect("M_APB interface");
    assert_eq!(apb.role, Role::Master);
    assert_eq!(apb.bus_ref.name, "APB4");
    assert_eq!(apb.address_space.as_ref().unwrap().name, "AS_M_APB");

    let xml = fs::read_to_string(&summary.output_path).unwrap();
    assert!(xml.contains("MM_S_AXI"));
    assert!(xml.contains("AS_M_APB"));
    assert!(xml.contains("<ipxact:memoryMaps>"));
    assert!(xml.contains("<ipxact:addressSpaces>"));
}

#[test]
fn postfix_only_names_still_match() {
    let fx = Fixture::new();
    let input = fx.root.join("test_postfix_only.sv");
    let mut src = String::from("module test_postfix_only (\n");
    for (logical, master_out, width) in &AXI4LITE_SIGNALS {
        let direction = if *master_out { "output" } else { "input" };
        let suffix = if *master_out { "o" } else { "i" };
        let range = width.map(|w| format!("[{}:0] ", w - 1)).unwrap_or_default();
        src.push_str(&format!(
            "    {direction} wire {range}M_AXI_{logical}_{suffix},\n"
        ));
    }
    let cut = src.rfind(',').unwrap();
    src.replace_range(cut..cut + 1, "");
    src.push_str(");\nendmodule\n");
    fs::write(&input, src).unwrap();

    let sink = DiagnosticSink::new();
    let summary = run(&fx.options("test_postfix_only.sv", Revision::Std2014), &sink).unwrap();

    assert_eq!(summary.outcome.interfaces.len(), 1);
    let bi = &summary.outcome.interfaces[0];
    assert_eq!(bi.role, Role::Master);
    assert_eq!(bi.port_maps.len(), 19);
    assert!(bi.port_maps.iter().any(|m| m.physical == "M_AXI_AWADDR_o" && m.logical == "AWADDR"));
    assert!(summary.outcome.unmatched.is_empty());
}

#[test]
fn preprocessor_drops_undefined_macro_branch() {
    let fx = Fixture::new();
    let input = fx.root.join("robust_test.sv");
    fs::write(
        &input,
        "\
`define WIDTH 8
module robust_test #(
    parameter WIDTH = 8,
    parameter AW = 12
) (
    input  wire clk,
    input  wire rst_n,
    /* a comment mentioning input wire fake_port */
    input  wire [WIDTH-1:0] data_in,
`ifdef USE_OUTPUT
    output wire [WIDTH-1:0] data_out,
`endif
    input  wire valid
);
endmodule
",
    )
    .unwrap();

    let sink = DiagnosticSink::new();
    let summary = run(&fx.options("robust_test.sv", Revision::Std2014), &sink).unwrap();

    let names: Vec<&str> = summary.module.ports.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["clk", "rst_n", "data_in", "valid"]);
    let params: Vec<&str> = summary
        .module
        .parameters
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(params, ["WIDTH", "AW"]);
    assert_eq!(
        summary.module.ports[2].range.as_ref().unwrap().to_string(),
        "WIDTH-1:0"
    );
}

#[test]
fn output_is_deterministic_and_cache_idempotent() {
    let fx = Fixture::new();
    let input = fx.root.join("axi_master_example.sv");
    write_axi_master_example(&input);

    let sink = DiagnosticSink::new();
    let first = run(&fx.options("axi_master_example.sv", Revision::Std2014), &sink).unwrap();
    let first_bytes = fs::read(&first.output_path).unwrap();
    assert!(fx.root.join(".ipforge_cache.json").exists());

    // Second run loads the catalog from the cache and must produce
    // byte-identical output.
    let sink = DiagnosticSink::new();
    let second = run(&fx.options("axi_master_example.sv", Revision::Std2014), &sink).unwrap();
    let second_bytes = fs::read(&second.output_path).unwrap();
    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn revision_round_trip() {
    let fx = Fixture::new();
    let input = fx.root.join("dual_interface.sv");
    write_dual_interface(&input);

    let mut per_revision = Vec::new();
    for (revision, out_name) in [
        (Revision::Std2009, "out2009.xml"),
        (Revision::Std2014, "out2014.xml"),
        (Revision::Std2022, "out2022.xml"),
    ] {
        let mut options = fx.options("dual_interface.sv", revision);
        options.output = Some(fx.root.join(out_name));
        let sink = DiagnosticSink::new();
        let summary = run(&options, &sink).unwrap();
        per_revision.push(fs::read_to_string(&summary.output_path).unwrap());
    }

    assert!(per_revision[0].contains("<spirit:component"));
    assert!(per_revision[0].contains("SPIRIT/1685-2009"));
    assert!(per_revision[1].contains("<ipxact:component"));
    assert!(per_revision[1].contains("IPXACT/1685-2014"));
    assert!(per_revision[2].contains("IPXACT/1685-2022"));

    // Logical content is identical modulo namespace: same logical names
    // in every revision.
    for logical in ["PADDR", "PENABLE", "AWADDR", "RDATA"] {
        for doc in &per_revision {
            assert!(doc.contains(logical));
        }
    }
}

#[test]
fn missing_input_is_parse_error() {
    let fx = Fixture::new();
    let sink = DiagnosticSink::new();
    let err = run(&fx.options("absent.sv", Revision::Std2014), &sink).unwrap_err();
    assert!(err.to_string().contains("absent.sv"));
}

#[test]
fn config_file_overrides_component_vlnv() {
    let fx = Fixture::new();
    fs::write(
        fx.root.join("ipforge.toml"),
        "[output]\nvendor = \"acme.com\"\nlibrary = \"cores\"\nversion = \"3.0\"\n",
    )
    .unwrap();
    let input = fx.root.join("axi_master_example.sv");
    write_axi_master_example(&input);

    let sink = DiagnosticSink::new();
    let summary = run(&fx.options("axi_master_example.sv", Revision::Std2014), &sink).unwrap();
    let xml = fs::read_to_string(&summary.output_path).unwrap();
    assert!(xml.contains("<ipxact:vendor>acme.com</ipxact:vendor>"));
    assert!(xml.contains("<ipxact:library>cores</ipxact:library>"));
    assert!(xml.contains("<ipxact:version>3.0</ipxact:version>"));
}
