//! IP-XACT bus/abstraction definition catalog.
//!
//! Walks a library tree of bus and abstraction definition XML files into
//! an in-memory [`Catalog`], with an on-disk JSON cache validated by the
//! tree's maximum modification time. Two normalizations happen at load
//! time so consumers never special-case them:
//!
//! - **Mirror-slave inference**: a logical port with only a master-side
//!   descriptor gets a synthesized slave side (direction inverted,
//!   presence and width copied).
//! - **Clock/reset classification**: bus definitions named `clock` or
//!   `reset` are flagged and excluded from ordinary protocol matching.

#![warn(missing_docs)]

mod cache;
mod error;
mod index;
mod types;
mod xml;

pub use cache::CatalogCache;
pub use error::LibraryError;
pub use index::{build, load_or_build, max_tree_mtime};
pub use types::{
    AbstractionDefinition, BusDefinition, BusKind, Catalog, LogicalDirection, LogicalPort,
    PortRole, Presence, Side, Vlnv,
};
pub use xml::{parse_library_doc, DocError, LibraryDoc};
