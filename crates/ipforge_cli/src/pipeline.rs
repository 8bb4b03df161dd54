//! Pipeline orchestration: catalog → parse → group → match → emit.

use crate::config::{ConfigError, ToolConfig};
use ipforge_diagnostics::DiagnosticSink;
use ipforge_ipxact::{write_component, ComponentMeta, Revision};
use ipforge_library::Catalog;
use ipforge_match::{group_ports, match_module, GroupedPorts, MatchOutcome};
use ipforge_source::SourceDb;
use ipforge_sv::{Module, SvError};
use std::path::{Path, PathBuf};

/// Everything a run needs, resolved from flags and config.
#[derive(Debug)]
pub struct RunOptions {
    /// Input SystemVerilog file.
    pub input: PathBuf,
    /// Output path; `None` derives `<input>.ipxact`.
    pub output: Option<PathBuf>,
    /// Library root directory.
    pub libs: PathBuf,
    /// Catalog cache path.
    pub cache: PathBuf,
    /// Force a cache rebuild.
    pub rebuild: bool,
    /// CLI threshold override.
    pub threshold: Option<f64>,
    /// Target schema revision.
    pub revision: Revision,
    /// Optional config file path (default `ipforge.toml`).
    pub config: Option<PathBuf>,
}

/// Fatal pipeline failures, all mapping to exit code 1.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Input unreadable, no module, or unbalanced header.
    #[error(transparent)]
    Parse(#[from] SvError),
    /// The configuration file is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The output document could not be written.
    #[error("failed to write {path}: {source}")]
    OutputIo {
        /// Output path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// What a successful run produced, for reporting.
#[derive(Debug)]
pub struct RunSummary {
    /// The parsed module.
    pub module: Module,
    /// The grouping result.
    pub grouped: GroupedPorts,
    /// Matched interfaces and unmapped ports.
    pub outcome: MatchOutcome,
    /// Number of catalog abstractions considered.
    pub catalog_size: usize,
    /// Where the document was written.
    pub output_path: PathBuf,
    /// The source database for rendering diagnostics.
    pub source_db: SourceDb,
}

/// Runs the full conversion. Diagnostics accumulate in `sink`; the
/// caller renders them as the run report.
pub fn run(options: &RunOptions, sink: &DiagnosticSink) -> Result<RunSummary, PipelineError> {
    let config_path = options
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("ipforge.toml"));
    let config = ToolConfig::load_optional(&config_path)?;

    let catalog = ipforge_library::load_or_build(&options.libs, &options.cache, options.rebuild, sink);

    let mut source_db = SourceDb::new();
    let module = ipforge_sv::parse_file(&options.input, &mut source_db, sink)?;

    let grouped = group_ports(&module);
    let match_config = config.match_config(options.threshold);
    let outcome = match_module(&module, &grouped, &catalog, &match_config, sink);

    let output_path = resolve_output_path(&options.input, options.output.as_deref());
    emit(&module, &outcome, options.revision, &config.component_meta(), &output_path)?;

    Ok(RunSummary {
        module,
        grouped,
        catalog_size: catalog_entry_count(&catalog),
        outcome,
        output_path,
        source_db,
    })
}

fn catalog_entry_count(catalog: &Catalog) -> usize {
    catalog.abstractions.len()
}

/// `--output` wins; otherwise the input path with an `.ipxact` extension.
pub fn resolve_output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => input.with_extension("ipxact"),
    }
}

fn emit(
    module: &Module,
    outcome: &MatchOutcome,
    revision: Revision,
    meta: &ComponentMeta,
    path: &Path,
) -> Result<(), PipelineError> {
    let file = std::fs::File::create(path).map_err(|e| PipelineError::OutputIo {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_component(file, module, &outcome.interfaces, revision, meta).map_err(|e| {
        let ipforge_ipxact::EmitError::Io(source) = e;
        PipelineError::OutputIo {
            path: path.to_path_buf(),
            source,
        }
    })
}
