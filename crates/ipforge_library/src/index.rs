//! Library tree walking, catalog construction, and the load-or-rebuild
//! protocol.

use crate::cache::CatalogCache;
use crate::types::{Catalog, LogicalPort};
use crate::xml::{parse_library_doc, LibraryDoc};
use ipforge_diagnostics::{code, Diagnostic, DiagnosticSink};
use ipforge_source::Span;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Loads the catalog, preferring the cache when it is fresh.
///
/// The cache is stale when its stored mtime is older than the library
/// tree's current maximum mtime, or when `rebuild` is requested. A failed
/// cache write is reported as a note; the in-memory catalog is complete
/// either way.
pub fn load_or_build(
    library_root: &Path,
    cache_path: &Path,
    rebuild: bool,
    sink: &DiagnosticSink,
) -> Catalog {
    let current_mtime = max_tree_mtime(library_root);

    if !rebuild {
        if let Some(cache) = CatalogCache::load(cache_path) {
            if cache.is_fresh(current_mtime) {
                return cache.catalog;
            }
        }
    }

    let catalog = build(library_root, sink);
    if let Err(e) = CatalogCache::new(catalog.clone(), current_mtime).save(cache_path) {
        sink.emit(Diagnostic::note(
            code::LIBRARY_IO,
            format!("could not write catalog cache: {e}"),
            Span::NONE,
        ));
    }
    catalog
}

/// Walks the library tree and builds a catalog from scratch.
///
/// Individual malformed files are skipped with a warning. A missing or
/// empty root is not an error; it produces an empty catalog (and a
/// warning), and every subsequent match comes back unmatched.
pub fn build(library_root: &Path, sink: &DiagnosticSink) -> Catalog {
    let mut files = Vec::new();
    collect_xml_files(library_root, &mut files);
    files.sort();

    if files.is_empty() {
        sink.emit(
            Diagnostic::warning(
                code::LIBRARY_IO,
                format!(
                    "library root {} is missing or contains no XML files",
                    library_root.display()
                ),
                Span::NONE,
            )
            .with_note("no bus interfaces can be matched"),
        );
        return Catalog::default();
    }

    let mut catalog = Catalog::default();
    for path in &files {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                sink.emit(Diagnostic::warning(
                    code::LIBRARY_PARSE,
                    format!("skipping unreadable {}: {e}", path.display()),
                    Span::NONE,
                ));
                continue;
            }
        };
        match parse_library_doc(&text) {
            Ok(LibraryDoc::Bus(bus)) => {
                catalog.buses.insert(bus.vlnv.clone(), bus);
            }
            Ok(LibraryDoc::Abstraction(abs)) => {
                catalog.abstractions.insert(abs.vlnv.clone(), abs);
            }
            Err(e) => {
                sink.emit(Diagnostic::warning(
                    code::LIBRARY_PARSE,
                    format!("skipping {}: {e}", path.display()),
                    Span::NONE,
                ));
            }
        }
    }

    link_and_normalize(&mut catalog, sink);
    catalog
}

/// Drops abstractions whose bus definition never loaded and applies
/// mirror-slave inference, so the matcher can assume every master-side
/// descriptor has a slave counterpart.
fn link_and_normalize(catalog: &mut Catalog, sink: &DiagnosticSink) {
    let bus_keys: Vec<_> = catalog.buses.keys().cloned().collect();
    catalog.abstractions.retain(|vlnv, abs| {
        let linked = bus_keys.contains(&abs.bus_ref);
        if !linked {
            sink.emit(Diagnostic::warning(
                code::DANGLING_BUS_REF,
                format!(
                    "abstraction {vlnv} references missing bus definition {}",
                    abs.bus_ref
                ),
                Span::NONE,
            ));
        }
        linked
    });

    for abs in catalog.abstractions.values_mut() {
        for port in &mut abs.ports {
            mirror_slave(port);
        }
    }
}

/// Synthesizes the slave descriptor from the master one when absent:
/// direction inverted, presence and width copied.
fn mirror_slave(port: &mut LogicalPort) {
    if port.on_slave.is_none() {
        if let Some(master) = &port.on_master {
            port.on_slave = Some(master.mirrored());
        }
    }
}

fn collect_xml_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_xml_files(&path, out);
        } else if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("xml")) {
            out.push(path);
        }
    }
}

/// Returns the maximum mtime (integer seconds) over all XML files in the
/// tree, or 0 when the tree is missing or empty.
pub fn max_tree_mtime(root: &Path) -> u64 {
    let mut files = Vec::new();
    collect_xml_files(root, &mut files);
    files
        .iter()
        .filter_map(|p| std::fs::metadata(p).ok())
        .filter_map(|m| m.modified().ok())
        .filter_map(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .max()
        .unwrap_or(0)
}
