//! CLI definition and handler

use anyhow::{Context, Result};
use archscore::config::{load_config, load_project_config, AnalysisConfig};
use archscore::pipeline::Analyzer;
use archscore::source::{ManifestSource, SourceModel};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// archscore - structural health analysis
///
/// Reads a module manifest produced by a parser, builds the dependency
/// graph, runs the architecture and hygiene rules and prints the analysis
/// result as JSON.
#[derive(Parser, Debug)]
#[command(name = "archscore")]
#[command(
    version,
    about = "Structural health analysis: dependency cycles, layer violations, \
             duplication and a weighted health score",
    after_help = "\
Examples:
  archscore modules.json                      Analyze with archscore.toml from the manifest root
  archscore modules.json --config ci.toml     Use an explicit config file
  archscore modules.json --top 5 --pretty     Human-readable JSON, 5 top risks

Logging goes to stderr and is controlled with RUST_LOG (e.g. RUST_LOG=archscore=debug)."
)]
pub struct Cli {
    /// JSON module manifest ({"root": ..., "modules": [...]})
    pub manifest: PathBuf,

    /// Config file (.toml or .json). Default: archscore.toml or
    /// .archscorerc.json in the project root
    #[arg(long, short = 'c', env = "ARCHSCORE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of top risks to report
    #[arg(long)]
    pub top: Option<usize>,

    /// Analyze and report test files too
    #[arg(long)]
    pub include_tests: bool,

    /// Number of rule workers (1-64, default: auto)
    #[arg(long, value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Evaluate rules one after another
    #[arg(long)]
    pub sequential: bool,

    /// Pretty-print the JSON result
    #[arg(long)]
    pub pretty: bool,
}

impl Cli {
    /// Config file (or project defaults) with command-line overrides applied
    fn resolve_config(&self, source: &dyn SourceModel) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => load_project_config(source.root_path()),
        };

        if let Some(top) = self.top {
            config.top_n = top;
        }
        if self.include_tests {
            config.include_tests = true;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.sequential {
            config.parallel = false;
        }
        Ok(config)
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let source = ManifestSource::load(&cli.manifest)
        .with_context(|| format!("Failed to load manifest {}", cli.manifest.display()))?;
    let config = cli.resolve_config(&source)?;

    let result = Analyzer::new(config).analyze(&source);
    info!(
        "{} modules, score {:.0} ({})",
        result.total_modules, result.score, result.status
    );

    let json = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", json)?;
    Ok(())
}
