//! Bus interface recognition: port grouping plus protocol matching.
//!
//! The [`group_ports`] pass clusters a module's ports into candidate bus
//! instances by inferred name prefix; [`match_module`] then scores every
//! group against every catalog abstraction on both sides and produces
//! [`BusInterface`] assignments plus the unmapped residual. Matching
//! never fails a run: groups that clear no threshold simply return their
//! ports to the residual.

#![warn(missing_docs)]

mod group;
mod interface;
mod matcher;

pub use group::{group_ports, tokenize, GroupKind, GroupedPorts, PortGroup};
pub use interface::{
    sanitize_interface_name, AddressSpaceSpec, BusInterface, MatchOutcome, MemoryMapSpec, PortMap,
    Role,
};
pub use matcher::{match_module, MatchConfig};
