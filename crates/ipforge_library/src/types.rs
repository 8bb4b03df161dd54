//! The catalog data model: bus definitions, abstraction definitions, and
//! their logical ports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A `(vendor, library, name, version)` identifier.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Vlnv {
    /// Vendor string, e.g. `amba.com`.
    pub vendor: String,
    /// Library string, e.g. `AMBA4`.
    pub library: String,
    /// Definition name, e.g. `AXI4`.
    pub name: String,
    /// Version string, e.g. `r0p0_0`.
    pub version: String,
}

impl Vlnv {
    /// Creates a VLNV from its four parts.
    pub fn new(
        vendor: impl Into<String>,
        library: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            vendor: vendor.into(),
            library: library.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Vlnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.vendor, self.library, self.name, self.version
        )
    }
}

/// Whether a logical port must, may, or must not appear on a side.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Presence {
    /// The side must map this signal.
    Required,
    /// The side may map this signal.
    Optional,
    /// The side must not map this signal.
    Illegal,
}

impl Presence {
    /// Parses an IP-XACT presence value; unknown text falls back to
    /// `Required`, the schema default.
    pub fn parse(text: &str) -> Self {
        match text {
            "optional" => Presence::Optional,
            "illegal" => Presence::Illegal,
            _ => Presence::Required,
        }
    }
}

/// Direction of a logical signal as seen from one side of the bus.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum LogicalDirection {
    /// Driven into the side.
    In,
    /// Driven by the side.
    Out,
}

impl LogicalDirection {
    /// Returns the opposite direction, used for mirror-slave inference.
    pub fn inverted(self) -> Self {
        match self {
            LogicalDirection::In => LogicalDirection::Out,
            LogicalDirection::Out => LogicalDirection::In,
        }
    }
}

/// The per-side descriptor of one logical port.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PortRole {
    /// Presence requirement on this side.
    pub presence: Presence,
    /// Direction on this side.
    pub direction: LogicalDirection,
    /// Width expression, verbatim; `None` when unconstrained.
    pub width: Option<String>,
    /// Default value text, if declared.
    pub default_value: Option<String>,
}

impl PortRole {
    /// Returns the width as an integer when it is a literal.
    pub fn literal_width(&self) -> Option<u64> {
        self.width.as_deref()?.trim().parse().ok()
    }

    /// Builds the mirrored descriptor for the other side: direction
    /// inverted, presence and width copied.
    pub fn mirrored(&self) -> Self {
        Self {
            presence: self.presence,
            direction: self.direction.inverted(),
            width: self.width.clone(),
            default_value: self.default_value.clone(),
        }
    }
}

/// One logical signal of an abstraction definition.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct LogicalPort {
    /// Logical name, e.g. `AWADDR`.
    pub name: String,
    /// Clock qualifier from the definition.
    pub is_clock: bool,
    /// Reset qualifier from the definition.
    pub is_reset: bool,
    /// Master-side descriptor.
    pub on_master: Option<PortRole>,
    /// Slave-side descriptor. After catalog normalization this is always
    /// present whenever the master side is (mirror-slave inference).
    pub on_slave: Option<PortRole>,
}

impl LogicalPort {
    /// Returns the descriptor for `side`.
    pub fn on(&self, side: Side) -> Option<&PortRole> {
        match side {
            Side::Master => self.on_master.as_ref(),
            Side::Slave => self.on_slave.as_ref(),
        }
    }
}

/// The two sides a port group can be scored as.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Side {
    /// The initiating side.
    Master,
    /// The responding side.
    Slave,
}

impl Side {
    /// Both sides, in scoring order.
    pub const BOTH: [Side; 2] = [Side::Master, Side::Slave];
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Master => write!(f, "master"),
            Side::Slave => write!(f, "slave"),
        }
    }
}

/// How the matcher treats a bus definition.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum BusKind {
    /// An ordinary protocol, scored against port groups.
    Protocol,
    /// A clock bus, matched only against clock groups.
    Clock,
    /// A reset bus, matched only against reset groups.
    Reset,
}

/// A parsed bus definition.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BusDefinition {
    /// Identifier.
    pub vlnv: Vlnv,
    /// Whether the bus carries addresses (drives memoryMap/addressSpace
    /// emission).
    pub is_addressable: bool,
    /// Whether a master may connect directly to a slave.
    pub direct_connection: bool,
    /// Declared parameter names, candidates for propagation.
    pub parameters: Vec<String>,
    /// Classification derived from the definition name.
    pub kind: BusKind,
}

/// A parsed abstraction definition, linked to its bus definition.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct AbstractionDefinition {
    /// Identifier.
    pub vlnv: Vlnv,
    /// The bus definition this abstraction belongs to.
    pub bus_ref: Vlnv,
    /// Logical ports in declaration order.
    pub ports: Vec<LogicalPort>,
}

/// The searchable catalog of all loaded definitions.
///
/// Built once at startup (from the library tree or the cache) and
/// read-only afterwards.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Bus definitions keyed by VLNV.
    pub buses: BTreeMap<Vlnv, BusDefinition>,
    /// Abstraction definitions keyed by VLNV.
    pub abstractions: BTreeMap<Vlnv, AbstractionDefinition>,
}

impl Catalog {
    /// Returns `true` when no abstraction is loaded (every match will
    /// come back empty).
    pub fn is_empty(&self) -> bool {
        self.abstractions.is_empty()
    }

    /// Iterates abstractions paired with their bus definitions, in VLNV
    /// order.
    pub fn protocol_entries(&self) -> impl Iterator<Item = (&AbstractionDefinition, &BusDefinition)> {
        self.abstractions.values().filter_map(|abs| {
            let bus = self.buses.get(&abs.bus_ref)?;
            (bus.kind == BusKind::Protocol).then_some((abs, bus))
        })
    }

    /// Returns the first bus definition of the given special kind, in
    /// VLNV order.
    pub fn special_bus(&self, kind: BusKind) -> Option<&BusDefinition> {
        self.buses.values().find(|b| b.kind == kind)
    }

    /// Returns the abstraction belonging to `bus`, if one is loaded.
    pub fn abstraction_for_bus(&self, bus: &Vlnv) -> Option<&AbstractionDefinition> {
        self.abstractions.values().find(|a| &a.bus_ref == bus)
    }
}
