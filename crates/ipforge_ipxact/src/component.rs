//! Component document assembly.
//!
//! Builds the full `component` document from the parsed module and the
//! matcher's interfaces. Ordering is a function of input only: ports in
//! source order, bus interfaces in the (already name-sorted) matcher
//! order, portMaps in logical declaration order. Two runs over identical
//! inputs produce byte-identical output.

use crate::revision::Revision;
use crate::writer::XmlWriter;
use ipforge_library::Vlnv;
use ipforge_match::{BusInterface, PortMap, Role};
use ipforge_sv::{Direction, Module};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Identity of the emitted component (its VLNV minus the name, which is
/// always the module name).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComponentMeta {
    /// Component vendor string.
    pub vendor: String,
    /// Component library string.
    pub library: String,
    /// Component version string.
    pub version: String,
}

impl Default for ComponentMeta {
    fn default() -> Self {
        Self {
            vendor: "user".into(),
            library: "user".into(),
            version: "1.0".into(),
        }
    }
}

/// Serialization failures.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// The destination could not be written.
    #[error("failed to write IP-XACT output: {0}")]
    Io(#[from] std::io::Error),
}

/// The component's child sections, emitted in the order mandated by each
/// schema revision.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Section {
    BusInterfaces,
    AddressSpaces,
    MemoryMaps,
    Model,
    Parameters,
    FileSets,
    Description,
}

/// Per-revision child order. The three revisions currently agree on the
/// sequence; the table keeps the dispatch in one place.
fn child_order(revision: Revision) -> &'static [Section] {
    use Section::*;
    match revision {
        Revision::Std2009 | Revision::Std2014 | Revision::Std2022 => &[
            BusInterfaces,
            AddressSpaces,
            MemoryMaps,
            Model,
            Parameters,
            FileSets,
            Description,
        ],
    }
}

/// Serializes the component document to `dest`.
pub fn write_component(
    dest: impl Write,
    module: &Module,
    interfaces: &[BusInterface],
    revision: Revision,
    meta: &ComponentMeta,
) -> Result<(), EmitError> {
    Emitter {
        w: XmlWriter::new(dest),
        revision,
        prefix: revision.prefix(),
    }
    .emit(module, interfaces, meta)
}

/// Serializes to an in-memory string, mainly for tests and previews.
pub fn component_to_string(
    module: &Module,
    interfaces: &[BusInterface],
    revision: Revision,
    meta: &ComponentMeta,
) -> Result<String, EmitError> {
    let mut buf = Vec::new();
    write_component(&mut buf, module, interfaces, revision, meta)?;
    Ok(String::from_utf8(buf).expect("serializer emits UTF-8"))
}

struct Emitter<'w> {
    w: XmlWriter<'w>,
    revision: Revision,
    prefix: &'static str,
}

impl Emitter<'_> {
    fn el(&self, name: &str) -> String {
        format!("{}:{name}", self.prefix)
    }

    /// Reference attributes are namespace-qualified only in 2009.
    fn ref_attr(&self, name: &'static str) -> String {
        if self.revision.qualified_ref_attributes() {
            format!("{}:{name}", self.prefix)
        } else {
            name.to_string()
        }
    }

    fn emit(
        mut self,
        module: &Module,
        interfaces: &[BusInterface],
        meta: &ComponentMeta,
    ) -> Result<(), EmitError> {
        let ns_attr = format!("xmlns:{}", self.prefix);
        let schema_location = self.revision.schema_location();
        self.w.declaration()?;
        self.w.open(
            &self.el("component"),
            &[
                (&ns_attr, self.revision.namespace()),
                ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
                ("xsi:schemaLocation", &schema_location),
            ],
        )?;

        self.w.leaf(&self.el("vendor"), &meta.vendor)?;
        self.w.leaf(&self.el("library"), &meta.library)?;
        self.w.leaf(&self.el("name"), &module.name)?;
        self.w.leaf(&self.el("version"), &meta.version)?;

        for section in child_order(self.revision) {
            match section {
                Section::BusInterfaces => self.bus_interfaces(interfaces)?,
                Section::AddressSpaces => self.address_spaces(interfaces)?,
                Section::MemoryMaps => self.memory_maps(interfaces)?,
                Section::Model => self.model(module)?,
                Section::Parameters => self.parameters(module)?,
                Section::FileSets => self.file_sets(module)?,
                Section::Description => self.description(module)?,
            }
        }

        self.w.close()?;
        self.w.finish()?;
        Ok(())
    }

    fn vlnv_attrs(&self, vlnv: &Vlnv) -> [(String, String); 4] {
        [
            (self.ref_attr("vendor"), vlnv.vendor.clone()),
            (self.ref_attr("library"), vlnv.library.clone()),
            (self.ref_attr("name"), vlnv.name.clone()),
            (self.ref_attr("version"), vlnv.version.clone()),
        ]
    }

    fn empty_with_owned(&mut self, tag: &str, attrs: &[(String, String)]) -> std::io::Result<()> {
        let borrowed: Vec<(&str, &str)> =
            attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        self.w.empty(tag, &borrowed)
    }

    fn bus_interfaces(&mut self, interfaces: &[BusInterface]) -> Result<(), EmitError> {
        if interfaces.is_empty() {
            return Ok(());
        }
        self.w.open(&self.el("busInterfaces"), &[])?;
        for bi in interfaces {
            self.w.open(&self.el("busInterface"), &[])?;
            self.w.leaf(&self.el("name"), &bi.name)?;

            let bus_attrs = self.vlnv_attrs(&bi.bus_ref);
            self.empty_with_owned(&self.el("busType"), &bus_attrs)?;

            let abs_attrs = self.vlnv_attrs(&bi.abstraction_ref);
            if self.revision.wrapped_abstraction_types() {
                self.w.open(&self.el("abstractionTypes"), &[])?;
                self.w.open(&self.el("abstractionType"), &[])?;
                self.empty_with_owned(&self.el("abstractionRef"), &abs_attrs)?;
                self.w.close()?;
                self.w.close()?;
            } else {
                self.empty_with_owned(&self.el("abstractionType"), &abs_attrs)?;
            }

            self.role_element(bi)?;
            self.port_maps(&bi.port_maps)?;
            self.interface_parameters(&bi.parameters)?;

            self.w.close()?;
        }
        self.w.close()?;
        Ok(())
    }

    fn role_element(&mut self, bi: &BusInterface) -> Result<(), EmitError> {
        let tag = self.el(match bi.role {
            Role::Master => "master",
            Role::Slave => "slave",
            Role::System => "system",
            Role::Monitor => "monitor",
        });

        match (&bi.address_space, &bi.memory_map) {
            (Some(space), _) if bi.role == Role::Master => {
                self.w.open(&tag, &[])?;
                let attr = self.ref_attr("addressSpaceRef");
                self.empty_with_owned(
                    &self.el("addressSpaceRef"),
                    &[(attr, space.name.clone())],
                )?;
                self.w.close()?;
            }
            (_, Some(map)) if bi.role == Role::Slave => {
                self.w.open(&tag, &[])?;
                let attr = self.ref_attr("memoryMapRef");
                self.empty_with_owned(&self.el("memoryMapRef"), &[(attr, map.name.clone())])?;
                self.w.close()?;
            }
            _ => self.w.empty(&tag, &[])?,
        }
        Ok(())
    }

    fn port_maps(&mut self, maps: &[PortMap]) -> Result<(), EmitError> {
        if maps.is_empty() {
            return Ok(());
        }
        self.w.open(&self.el("portMaps"), &[])?;
        for map in maps {
            self.w.open(&self.el("portMap"), &[])?;
            self.w.open(&self.el("logicalPort"), &[])?;
            self.w.leaf(&self.el("name"), &map.logical)?;
            self.w.close()?;
            self.w.open(&self.el("physicalPort"), &[])?;
            self.w.leaf(&self.el("name"), &map.physical)?;
            if let Some((left, right)) = map.slice {
                self.bit_slice(left, right)?;
            }
            self.w.close()?;
            self.w.close()?;
        }
        self.w.close()?;
        Ok(())
    }

    /// A recorded bit-slice on the physical side of a portMap.
    fn bit_slice(&mut self, left: i64, right: i64) -> Result<(), EmitError> {
        if self.revision == Revision::Std2009 {
            self.w.open(&self.el("vector"), &[])?;
        } else {
            self.w.open(&self.el("partSelect"), &[])?;
            self.w.open(&self.el("range"), &[])?;
        }
        self.w.leaf(&self.el("left"), &left.to_string())?;
        self.w.leaf(&self.el("right"), &right.to_string())?;
        if self.revision == Revision::Std2009 {
            self.w.close()?;
        } else {
            self.w.close()?;
            self.w.close()?;
        }
        Ok(())
    }

    fn interface_parameters(&mut self, params: &[(String, String)]) -> Result<(), EmitError> {
        if params.is_empty() {
            return Ok(());
        }
        self.w.open(&self.el("parameters"), &[])?;
        for (name, value) in params {
            self.w.open(&self.el("parameter"), &[])?;
            self.w.leaf(&self.el("name"), name)?;
            self.w.leaf(&self.el("value"), value)?;
            self.w.close()?;
        }
        self.w.close()?;
        Ok(())
    }

    fn address_spaces(&mut self, interfaces: &[BusInterface]) -> Result<(), EmitError> {
        let spaces: Vec<_> = interfaces
            .iter()
            .filter_map(|bi| bi.address_space.as_ref())
            .collect();
        if spaces.is_empty() {
            return Ok(());
        }
        self.w.open(&self.el("addressSpaces"), &[])?;
        for space in spaces {
            self.w.open(&self.el("addressSpace"), &[])?;
            self.w.leaf(&self.el("name"), &space.name)?;
            self.w.leaf(&self.el("range"), &space.range)?;
            self.w.leaf(&self.el("width"), &space.width.to_string())?;
            self.w.close()?;
        }
        self.w.close()?;
        Ok(())
    }

    fn memory_maps(&mut self, interfaces: &[BusInterface]) -> Result<(), EmitError> {
        let maps: Vec<_> = interfaces
            .iter()
            .filter_map(|bi| bi.memory_map.as_ref())
            .collect();
        if maps.is_empty() {
            return Ok(());
        }
        self.w.open(&self.el("memoryMaps"), &[])?;
        for map in maps {
            self.w.open(&self.el("memoryMap"), &[])?;
            self.w.leaf(&self.el("name"), &map.name)?;
            self.w.open(&self.el("addressBlock"), &[])?;
            self.w.leaf(&self.el("name"), &map.address_block)?;
            self.w
                .leaf(&self.el("baseAddress"), &map.base_address.to_string())?;
            self.w.leaf(&self.el("range"), &map.range.to_string())?;
            self.w.leaf(&self.el("width"), &map.width.to_string())?;
            self.w.leaf(&self.el("usage"), "register")?;
            self.w.close()?;
            self.w.close()?;
        }
        self.w.close()?;
        Ok(())
    }

    /// The model section: one RTL view plus every physical port of the
    /// module, mapped or not, exactly once.
    fn model(&mut self, module: &Module) -> Result<(), EmitError> {
        self.w.open(&self.el("model"), &[])?;

        self.w.open(&self.el("views"), &[])?;
        self.w.open(&self.el("view"), &[])?;
        self.w.leaf(&self.el("name"), "rtl")?;
        self.w.leaf(&self.el("envIdentifier"), "verilog")?;
        self.w.leaf(&self.el("language"), "systemVerilog")?;
        self.w.close()?;
        self.w.close()?;

        if !module.ports.is_empty() {
            self.w.open(&self.el("ports"), &[])?;
            for port in &module.ports {
                self.w.open(&self.el("port"), &[])?;
                self.w.leaf(&self.el("name"), &port.name)?;
                self.w.open(&self.el("wire"), &[])?;
                let dir = match port.direction {
                    Direction::Input => "in",
                    Direction::Output => "out",
                    Direction::Inout => "inout",
                };
                self.w.leaf(&self.el("direction"), dir)?;
                if let Some(range) = &port.range {
                    if self.revision.nested_vectors() {
                        self.w.open(&self.el("vectors"), &[])?;
                    }
                    self.w.open(&self.el("vector"), &[])?;
                    self.w.leaf(&self.el("left"), &range.left)?;
                    self.w.leaf(&self.el("right"), &range.right)?;
                    self.w.close()?;
                    if self.revision.nested_vectors() {
                        self.w.close()?;
                    }
                }
                self.w.close()?;
                self.w.close()?;
            }
            self.w.close()?;
        }

        self.w.close()?;
        Ok(())
    }

    /// Externalized module parameters; localparams stay internal.
    fn parameters(&mut self, module: &Module) -> Result<(), EmitError> {
        let externalized: Vec<_> = module.parameters.iter().filter(|p| !p.is_local).collect();
        if externalized.is_empty() {
            return Ok(());
        }
        self.w.open(&self.el("parameters"), &[])?;
        for param in externalized {
            self.w.open(&self.el("parameter"), &[])?;
            self.w.leaf(&self.el("name"), &param.name)?;
            self.w
                .leaf(&self.el("value"), param.default.as_deref().unwrap_or(""))?;
            self.w.close()?;
        }
        self.w.close()?;
        Ok(())
    }

    fn file_sets(&mut self, module: &Module) -> Result<(), EmitError> {
        self.w.open(&self.el("fileSets"), &[])?;
        self.w.open(&self.el("fileSet"), &[])?;
        self.w.leaf(&self.el("name"), "sources")?;
        self.w.open(&self.el("file"), &[])?;
        self.w
            .leaf(&self.el("name"), &module.source_path.display().to_string())?;
        self.w.leaf(&self.el("fileType"), "systemVerilogSource")?;
        self.w.close()?;
        self.w.close()?;
        self.w.close()?;
        Ok(())
    }

    fn description(&mut self, module: &Module) -> Result<(), EmitError> {
        self.w.leaf(
            &self.el("description"),
            &format!("IP-XACT component generated from SystemVerilog module {}", module.name),
        )?;
        Ok(())
    }
}
