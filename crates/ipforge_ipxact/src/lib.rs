//! IP-XACT component serialization.
//!
//! Turns a parsed [`Module`](ipforge_sv::Module) and the matcher's
//! [`BusInterface`](ipforge_match::BusInterface) set into a schema-shaped
//! XML document for one of the three supported revisions. The
//! [`Revision`] table carries every structural difference (namespace,
//! attribute qualification, vector nesting); the emission code is shared.

#![warn(missing_docs)]

mod component;
mod revision;
mod writer;

pub use component::{component_to_string, write_component, ComponentMeta, EmitError};
pub use revision::Revision;
pub use writer::XmlWriter;
