//! ipforge — convert a SystemVerilog top-level module into an IP-XACT
//! component, recognizing standard bus interfaces among its ports.
//!
//! Exit codes: 0 success, 1 parse or I/O failure, 2 validation failure,
//! 3 usage error.

use clap::Parser;
use ipforge_cli::config::ConfigError;
use ipforge_cli::pipeline::{self, PipelineError, RunOptions};
use ipforge_cli::report;
use ipforge_cli::validate::{validator_for, ValidationMode};
use ipforge_diagnostics::DiagnosticSink;
use ipforge_ipxact::Revision;
use std::path::PathBuf;
use std::process;

/// Convert a SystemVerilog module to an IP-XACT component description.
#[derive(Parser, Debug)]
#[command(name = "ipforge", version, about)]
struct Cli {
    /// Input SystemVerilog file.
    #[arg(short, long)]
    input: PathBuf,

    /// Output IP-XACT file (default: input path with `.ipxact` extension).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force a rebuild of the library cache.
    #[arg(long)]
    rebuild: bool,

    /// Path to the bus definition library directory.
    #[arg(long, default_value = "libs")]
    libs: PathBuf,

    /// Path to the catalog cache file.
    #[arg(long, default_value = ".ipforge_cache.json")]
    cache: PathBuf,

    /// Matching threshold (0.0-1.0; overrides ipforge.toml).
    #[arg(long)]
    threshold: Option<f64>,

    /// Emit IEEE 1685-2009 (spirit namespace). Default is 1685-2014.
    #[arg(long = "ipxact-2009", conflicts_with = "ipxact_2022")]
    ipxact_2009: bool,

    /// Emit IEEE 1685-2022.
    #[arg(long = "ipxact-2022")]
    ipxact_2022: bool,

    /// Validate the output against the remote schema.
    #[arg(long, conflicts_with_all = ["validate_local", "no_validate"])]
    validate: bool,

    /// Validate the output against a local schema directory.
    #[arg(long, conflicts_with = "no_validate")]
    validate_local: bool,

    /// Skip validation (the default).
    #[arg(long)]
    no_validate: bool,

    /// Path to an ipforge.toml configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output: module summary, groups, and informational notes.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn revision(&self) -> Revision {
        if self.ipxact_2009 {
            Revision::Std2009
        } else if self.ipxact_2022 {
            Revision::Std2022
        } else {
            Revision::Std2014
        }
    }

    fn validation_mode(&self) -> ValidationMode {
        if self.validate {
            ValidationMode::Remote
        } else if self.validate_local {
            ValidationMode::Local
        } else {
            ValidationMode::None
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // clap's help/version output is a success, anything else is a
            // usage error.
            if e.use_stderr() {
                let _ = e.print();
                process::exit(3);
            }
            let _ = e.print();
            process::exit(0);
        }
    };
    process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    let revision = cli.revision();
    let options = RunOptions {
        input: cli.input.clone(),
        output: cli.output.clone(),
        libs: cli.libs.clone(),
        cache: cli.cache.clone(),
        rebuild: cli.rebuild,
        threshold: cli.threshold,
        revision,
        config: cli.config.clone(),
    };

    let sink = DiagnosticSink::new();
    let summary = match pipeline::run(&options, &sink) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("error: {e}");
            if let PipelineError::Config(ConfigError::InvalidValue(_)) = e {
                return 3;
            }
            return 1;
        }
    };

    if cli.verbose {
        print!("{}", report::module_summary(&summary));
        println!("Catalog: {} abstraction(s)", summary.catalog_size);
    }

    println!(
        "{}: {} bus interface(s), {} unmatched port(s) -> {}",
        summary.module.name,
        summary.outcome.interfaces.len(),
        summary.outcome.unmatched.len(),
        summary.output_path.display()
    );
    print!("{}", report::interface_summary(&summary));

    let diagnostics = sink.take_all();
    let rendered = report::diagnostic_report(&diagnostics, &summary.source_db, cli.verbose);
    if !rendered.is_empty() {
        eprint!("{rendered}");
    }

    let validator = validator_for(&cli.validation_mode(), &cli.libs, revision);
    if let Err(e) = validator.validate(&summary.output_path) {
        eprintln!("error: {e}");
        return 2;
    }

    0
}
