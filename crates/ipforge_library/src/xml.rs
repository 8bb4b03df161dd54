//! roxmltree-based parsing of bus and abstraction definition files.
//!
//! Tag matching is by local name only, so `spirit:` (1685-2009) and
//! `ipxact:` (1685-2014/2022) documents load identically. Files are
//! identified by their root element, never by filename.

use crate::types::{
    AbstractionDefinition, BusDefinition, BusKind, LogicalDirection, LogicalPort, PortRole,
    Presence, Vlnv,
};
use roxmltree::{Document, Node};

/// A successfully parsed library file.
#[derive(Debug)]
pub enum LibraryDoc {
    /// The file's root was a `busDefinition`.
    Bus(BusDefinition),
    /// The file's root was an `abstractionDefinition`.
    Abstraction(AbstractionDefinition),
}

/// Why a library file was rejected.
#[derive(Debug, thiserror::Error)]
pub enum DocError {
    /// Not well-formed XML.
    #[error("invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),
    /// The root element is neither definition kind.
    #[error("unrecognized root element <{0}>")]
    UnrecognizedRoot(String),
    /// A required element is missing.
    #[error("missing <{0}> element")]
    MissingElement(&'static str),
}

/// Parses one library XML document.
pub fn parse_library_doc(text: &str) -> Result<LibraryDoc, DocError> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();
    match root.tag_name().name() {
        "busDefinition" => Ok(LibraryDoc::Bus(parse_bus_definition(root)?)),
        "abstractionDefinition" => Ok(LibraryDoc::Abstraction(parse_abstraction(root)?)),
        other => Err(DocError::UnrecognizedRoot(other.to_string())),
    }
}

fn parse_bus_definition(root: Node) -> Result<BusDefinition, DocError> {
    let vlnv = parse_vlnv_elements(root)?;
    let is_addressable = child_text(root, "isAddressable") == Some("true");
    let direct_connection = child_text(root, "directConnection") == Some("true");

    let mut parameters = Vec::new();
    if let Some(params) = child_el(root, "parameters") {
        for param in elements(params, "parameter") {
            if let Some(name) = child_text(param, "name") {
                parameters.push(name.to_string());
            }
        }
    }

    let kind = classify_bus_name(&vlnv.name);

    Ok(BusDefinition {
        vlnv,
        is_addressable,
        direct_connection,
        parameters,
        kind,
    })
}

/// Bus definitions named `clock` or `reset` (case-insensitive) get special
/// treatment in matching.
fn classify_bus_name(name: &str) -> BusKind {
    if name.eq_ignore_ascii_case("clock") {
        BusKind::Clock
    } else if name.eq_ignore_ascii_case("reset") {
        BusKind::Reset
    } else {
        BusKind::Protocol
    }
}

fn parse_abstraction(root: Node) -> Result<AbstractionDefinition, DocError> {
    let vlnv = parse_vlnv_elements(root)?;
    let bus_type = child_el(root, "busType").ok_or(DocError::MissingElement("busType"))?;
    let bus_ref = parse_vlnv_attributes(bus_type).ok_or(DocError::MissingElement("busType"))?;

    let mut ports = Vec::new();
    if let Some(ports_el) = child_el(root, "ports") {
        for port in elements(ports_el, "port") {
            if let Some(logical) = parse_logical_port(port) {
                ports.push(logical);
            }
        }
    }

    Ok(AbstractionDefinition {
        vlnv,
        bus_ref,
        ports,
    })
}

fn parse_logical_port(port: Node) -> Option<LogicalPort> {
    let name = descendant_text(port, "logicalName")?.to_string();
    let is_clock = descendant_text(port, "isClock") == Some("true");
    let is_reset = descendant_text(port, "isReset") == Some("true");

    // 2022 renamed the side elements; both spellings are accepted.
    let on_master = find_descendant(port, "onMaster")
        .or_else(|| find_descendant(port, "onInitiator"))
        .and_then(parse_port_role);
    let on_slave = find_descendant(port, "onSlave")
        .or_else(|| find_descendant(port, "onTarget"))
        .and_then(parse_port_role);

    Some(LogicalPort {
        name,
        is_clock,
        is_reset,
        on_master,
        on_slave,
    })
}

fn parse_port_role(side: Node) -> Option<PortRole> {
    let direction = match child_text(side, "direction") {
        Some("in") => LogicalDirection::In,
        Some("out") => LogicalDirection::Out,
        // inout and missing directions are not usable for scoring.
        _ => return None,
    };
    let presence = child_text(side, "presence")
        .map(Presence::parse)
        .unwrap_or(Presence::Required);
    let width = child_text(side, "width").map(str::to_string);
    let default_value = child_text(side, "defaultValue").map(str::to_string);

    Some(PortRole {
        presence,
        direction,
        width,
        default_value,
    })
}

/// Reads the four VLNV child elements of a definition root.
fn parse_vlnv_elements(root: Node) -> Result<Vlnv, DocError> {
    Ok(Vlnv::new(
        child_text(root, "vendor").ok_or(DocError::MissingElement("vendor"))?,
        child_text(root, "library").ok_or(DocError::MissingElement("library"))?,
        child_text(root, "name").ok_or(DocError::MissingElement("name"))?,
        child_text(root, "version").ok_or(DocError::MissingElement("version"))?,
    ))
}

/// Reads a VLNV from reference attributes (`busType`), accepting both
/// qualified (`spirit:vendor`) and plain (`vendor`) attribute names.
fn parse_vlnv_attributes(node: Node) -> Option<Vlnv> {
    let get = |name: &str| {
        node.attributes()
            .find(|a| a.name() == name)
            .map(|a| a.value().to_string())
    };
    Some(Vlnv {
        vendor: get("vendor")?,
        library: get("library")?,
        name: get("name")?,
        version: get("version")?,
    })
}

fn child_el<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child_el(node, name)?.text().map(str::trim)
}

fn elements<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |c| c.is_element() && c.tag_name().name() == name)
}

fn find_descendant<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.descendants()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

fn descendant_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    find_descendant(node, name)?.text().map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUS_2014: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ipxact:busDefinition xmlns:ipxact="http://www.accellera.org/XMLSchema/IPXACT/1685-2014">
  <ipxact:vendor>amba.com</ipxact:vendor>
  <ipxact:library>AMBA4</ipxact:library>
  <ipxact:name>AXI4</ipxact:name>
  <ipxact:version>r0p0_0</ipxact:version>
  <ipxact:directConnection>true</ipxact:directConnection>
  <ipxact:isAddressable>true</ipxact:isAddressable>
  <ipxact:parameters>
    <ipxact:parameter>
      <ipxact:name>DATA_WIDTH</ipxact:name>
      <ipxact:value>32</ipxact:value>
    </ipxact:parameter>
    <ipxact:parameter>
      <ipxact:name>ID_WIDTH</ipxact:name>
      <ipxact:value>4</ipxact:value>
    </ipxact:parameter>
  </ipxact:parameters>
</ipxact:busDefinition>"#;

    const ABS_2009: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<spirit:abstractionDefinition xmlns:spirit="http://www.spiritconsortium.org/XMLSchema/SPIRIT/1685-2009">
  <spirit:vendor>amba.com</spirit:vendor>
  <spirit:library>AMBA4</spirit:library>
  <spirit:name>AXI4_rtl</spirit:name>
  <spirit:version>r0p0_0</spirit:version>
  <spirit:busType spirit:vendor="amba.com" spirit:library="AMBA4" spirit:name="AXI4" spirit:version="r0p0_0"/>
  <spirit:ports>
    <spirit:port>
      <spirit:logicalName>AWADDR</spirit:logicalName>
      <spirit:wire>
        <spirit:onMaster>
          <spirit:presence>required</spirit:presence>
          <spirit:width>32</spirit:width>
          <spirit:direction>out</spirit:direction>
        </spirit:onMaster>
      </spirit:wire>
    </spirit:port>
    <spirit:port>
      <spirit:logicalName>AWVALID</spirit:logicalName>
      <spirit:wire>
        <spirit:onMaster>
          <spirit:direction>out</spirit:direction>
        </spirit:onMaster>
        <spirit:onSlave>
          <spirit:presence>required</spirit:presence>
          <spirit:direction>in</spirit:direction>
        </spirit:onSlave>
      </spirit:wire>
    </spirit:port>
  </spirit:ports>
</spirit:abstractionDefinition>"#;

    #[test]
    fn parses_2014_bus_definition() {
        let LibraryDoc::Bus(bus) = parse_library_doc(BUS_2014).unwrap() else {
            panic!("expected bus definition");
        };
        assert_eq!(bus.vlnv.to_string(), "amba.com:AMBA4:AXI4:r0p0_0");
        assert!(bus.is_addressable);
        assert!(bus.direct_connection);
        assert_eq!(bus.parameters, vec!["DATA_WIDTH", "ID_WIDTH"]);
        assert_eq!(bus.kind, BusKind::Protocol);
    }

    #[test]
    fn parses_2009_abstraction() {
        let LibraryDoc::Abstraction(abs) = parse_library_doc(ABS_2009).unwrap() else {
            panic!("expected abstraction definition");
        };
        assert_eq!(abs.vlnv.name, "AXI4_rtl");
        assert_eq!(abs.bus_ref.name, "AXI4");
        assert_eq!(abs.ports.len(), 2);

        let awaddr = &abs.ports[0];
        assert_eq!(awaddr.name, "AWADDR");
        let master = awaddr.on_master.as_ref().unwrap();
        assert_eq!(master.presence, Presence::Required);
        assert_eq!(master.direction, LogicalDirection::Out);
        assert_eq!(master.literal_width(), Some(32));
        assert!(awaddr.on_slave.is_none());

        let awvalid = &abs.ports[1];
        assert!(awvalid.on_slave.is_some());
        // presence defaults to required when the element is absent
        assert_eq!(
            awvalid.on_master.as_ref().unwrap().presence,
            Presence::Required
        );
    }

    #[test]
    fn clock_bus_classified() {
        let text = BUS_2014
            .replace("<ipxact:name>AXI4</ipxact:name>", "<ipxact:name>Clock</ipxact:name>");
        let LibraryDoc::Bus(bus) = parse_library_doc(&text).unwrap() else {
            panic!("expected bus definition");
        };
        assert_eq!(bus.kind, BusKind::Clock);
    }

    #[test]
    fn unrecognized_root_rejected() {
        let err = parse_library_doc("<component/>").unwrap_err();
        assert!(matches!(err, DocError::UnrecognizedRoot(name) if name == "component"));
    }

    #[test]
    fn malformed_xml_rejected() {
        assert!(matches!(
            parse_library_doc("<busDefinition>"),
            Err(DocError::Xml(_))
        ));
    }

    #[test]
    fn missing_vlnv_rejected() {
        let err = parse_library_doc("<busDefinition><vendor>v</vendor></busDefinition>").unwrap_err();
        assert!(matches!(err, DocError::MissingElement("library")));
    }

    #[test]
    fn initiator_target_spelling_accepted() {
        let text = ABS_2009
            .replace("onMaster", "onInitiator")
            .replace("onSlave", "onTarget");
        let LibraryDoc::Abstraction(abs) = parse_library_doc(&text).unwrap() else {
            panic!("expected abstraction definition");
        };
        assert!(abs.ports[0].on_master.is_some());
        assert!(abs.ports[1].on_slave.is_some());
    }
}
