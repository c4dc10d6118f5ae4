//! Composition Check CLI
//!
//! Loads Swagger/OpenAPI documents and reports inheritance problems in their
//! `allOf`/`oneOf` definitions.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use swagger_composition::graph::analysis::check_definition;
use swagger_composition::graph::{load_from_directory, load_from_path};
use swagger_composition::{analyze, AnalysisReport, CompositionConfig, OutputFormat};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "composition-check")]
#[command(about = "Check allOf/oneOf inheritance in Swagger and OpenAPI documents")]
struct Cli {
    /// Config file (defaults to composition.toml lookup)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format override: text, pretty or compact
    #[arg(short, long)]
    format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every composed definition in files or directories
    Check {
        /// Documents or directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Show the base/child pair of one definition
    Pair {
        /// Document to load
        file: PathBuf,
        /// Definition name
        definition: String,
    },

    /// Write the default configuration
    InitConfig {
        #[arg(default_value = "composition.toml")]
        output: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let config_path = cli.config.as_deref().map(|p| p.to_string_lossy().into_owned());
    let mut config = CompositionConfig::load_from(config_path.as_deref())
        .context("failed to load configuration")?;

    if let Some(format) = cli.format.as_deref() {
        config.report.output_format = match format {
            "text" => OutputFormat::Text,
            "pretty" => OutputFormat::Pretty,
            "compact" => OutputFormat::Compact,
            other => anyhow::bail!("unknown output format '{}'", other),
        };
    }

    match cli.command {
        Commands::Check { paths } => {
            let mut all_passed = true;
            for path in &paths {
                for (file, report) in check_path(path, &config) {
                    print_report(&file, &report, config.report.output_format)?;
                    all_passed &= report.passed(config.analysis.fail_on_warnings);
                }
            }
            Ok(all_passed)
        }

        Commands::Pair { file, definition } => {
            let definitions = load_from_path(&file, &config.loader)
                .with_context(|| format!("failed to load {}", file.display()))?;
            let candidates = config.analysis.candidates();
            let outcome = check_definition(&definitions.resolver(), &definition, &candidates)?;

            match config.report.output_format {
                OutputFormat::Text => {
                    println!("{} ({})", outcome.definition, outcome.combinator);
                    println!("  base:          {}", outcome.base);
                    println!("  base required: {}", outcome.base_required.join(", "));
                    if let Some(d) = &outcome.discriminator {
                        println!("  discriminator: {}", d);
                    }
                    println!("  child fields:  {}", outcome.child_properties.join(", "));
                }
                OutputFormat::Pretty => println!("{}", serde_json::to_string_pretty(&outcome)?),
                OutputFormat::Compact => println!("{}", serde_json::to_string(&outcome)?),
            }
            Ok(true)
        }

        Commands::InitConfig { output } => {
            CompositionConfig::default()
                .save(&output.to_string_lossy())
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Wrote {}", output.display());
            Ok(true)
        }
    }
}

/// One report per document; a document that fails to load gets a report
/// holding its load failure
fn check_path(path: &Path, config: &CompositionConfig) -> Vec<(PathBuf, AnalysisReport)> {
    let loaded = if path.is_dir() {
        load_from_directory(path, &config.loader)
    } else {
        vec![(path.to_path_buf(), load_from_path(path, &config.loader))]
    };

    loaded
        .into_iter()
        .map(|(file, definitions)| {
            let report = match definitions {
                Ok(definitions) => analyze(&definitions, &config.analysis),
                Err(e) => AnalysisReport::load_failure(&file.display().to_string(), &e),
            };
            (file, report)
        })
        .collect()
}

fn print_report(file: &Path, report: &AnalysisReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!(
                "{}: {} composed definition(s), {} accepted",
                file.display(),
                report.checked,
                report.outcomes.len()
            );
            for outcome in &report.outcomes {
                println!(
                    "  ok  {} -> {} ({})",
                    outcome.definition, outcome.base, outcome.combinator
                );
            }
            if !report.diagnostics.is_empty() {
                print!("{}", report.diagnostics);
            }
        }
        OutputFormat::Pretty => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Compact => println!("{}", serde_json::to_string(report)?),
    }
    Ok(())
}
