//! Matcher output types consumed by the serializer.

use ipforge_library::Vlnv;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The role a matched interface plays on the component.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Role {
    /// Initiating side.
    Master,
    /// Responding side.
    Slave,
    /// System-level signal (clocks, resets).
    System,
    /// Passive observer.
    Monitor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Master => write!(f, "master"),
            Role::Slave => write!(f, "slave"),
            Role::System => write!(f, "system"),
            Role::Monitor => write!(f, "monitor"),
        }
    }
}

/// One logical-to-physical signal binding.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PortMap {
    /// Logical name from the abstraction definition.
    pub logical: String,
    /// Physical port name from the module.
    pub physical: String,
    /// Optional `(left, right)` bit-slice of the physical port.
    pub slice: Option<(i64, i64)>,
}

/// Memory map attached to an addressable slave.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MemoryMapSpec {
    /// Map name (`MM_<group>`).
    pub name: String,
    /// Address block name (`BLK_<group>`).
    pub address_block: String,
    /// Base address.
    pub base_address: u64,
    /// Range in bytes.
    pub range: u64,
    /// Data width in bits.
    pub width: u64,
}

/// Address space attached to an addressable master.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct AddressSpaceSpec {
    /// Space name (`AS_<group>`).
    pub name: String,
    /// Range in bytes (`2^addr_width`), kept as a decimal string since it
    /// can exceed common register widths.
    pub range: String,
    /// Data width in bits.
    pub width: u64,
}

/// A matched bus interface, ready for serialization.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BusInterface {
    /// Interface name: the group prefix, sanitized to an XML NCName.
    pub name: String,
    /// The matched bus definition.
    pub bus_ref: Vlnv,
    /// The matched abstraction definition.
    pub abstraction_ref: Vlnv,
    /// Interface role.
    pub role: Role,
    /// Signal bindings, in the abstraction's logical declaration order.
    pub port_maps: Vec<PortMap>,
    /// Propagated `(bus parameter, module parameter)` pairs plus
    /// clock/reset auxiliaries.
    pub parameters: Vec<(String, String)>,
    /// Present for addressable slaves.
    pub memory_map: Option<MemoryMapSpec>,
    /// Present for addressable masters.
    pub address_space: Option<AddressSpaceSpec>,
}

/// The matcher's result: interfaces plus the ports left unmapped.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Matched interfaces, ordered by name.
    pub interfaces: Vec<BusInterface>,
    /// Indices (into the module's port list) of unmapped ports.
    pub unmatched: Vec<usize>,
}

/// Sanitizes a group prefix into a valid XML NCName: invalid characters
/// become `_`, and a leading digit gains a `_` prefix.
pub fn sanitize_interface_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        let valid = c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.';
        if i == 0 && c.is_ascii_digit() {
            out.push('_');
        }
        out.push(if valid { c } else { '_' });
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}
