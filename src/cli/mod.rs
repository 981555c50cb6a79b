//! CLI module for Factgraph.
//!
//! Commands:
//! - Graph: analyze, stats
//! - Inspect: symbols, unresolved, externals, callers, cycles

pub mod report;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::debug;

use crate::config::{FactgraphConfig, CONFIG_FILE_NAME};
use crate::graph::{Analysis, AnalysisUnit, Analyzer, RunOutcome};

#[derive(Parser)]
#[command(name = "factgraph")]
#[command(about = "Factgraph - symbols, imports and calls resolved into one code graph", long_about = None)]
pub struct Cli {
    /// Directory to analyze (default: the config's [project] root)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file (default: .factgraph.toml in the root)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Worker threads for extraction (0 = available parallelism)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Log more (-v info, -vv debug). RUST_LOG wins when set.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Subcommand)]
pub enum Commands {
    // ─── Graph ────────────────────────────────────────────────────
    /// Print the full graph snapshot
    Analyze {
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Show resolution statistics and per-file errors
    Stats,

    // ─── Inspect ──────────────────────────────────────────────────
    /// Show the symbol tree of one file
    Symbols {
        /// File path relative to the root
        file: PathBuf,
    },

    /// List calls that could not be resolved
    Unresolved {
        /// Max results
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// List external and unexpandable imports
    Externals,

    /// Show every resolved call into symbols with this name
    Callers {
        /// Symbol name
        name: String,
    },

    /// List import cycles
    Cycles,
}

/// Config plus the directory it applies to.
fn load_config(cli: &Cli) -> (FactgraphConfig, PathBuf) {
    let base = cli.root.clone().unwrap_or_else(|| PathBuf::from("."));
    let config_path = cli.config.clone().unwrap_or_else(|| base.join(CONFIG_FILE_NAME));
    let mut config = FactgraphConfig::load(&config_path);
    if let Some(threads) = cli.threads {
        config.analysis.threads = threads;
    }
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => config.resolve_root(&config_path),
    };
    debug!(root = %root.display(), config = %config_path.display(), "loaded configuration");
    (config, root)
}

fn analyze_root(cli: &Cli) -> Result<Analysis> {
    let (config, root) = load_config(cli);
    let unit = AnalysisUnit::scan(&root, &config)
        .with_context(|| format!("failed to scan {}", root.display()))?;
    let outcome = Analyzer::new(config)
        .run(&unit)
        .with_context(|| format!("failed to analyze {}", root.display()))?;
    match outcome {
        RunOutcome::Complete(analysis) => Ok(analysis),
        RunOutcome::Cancelled(_) => bail!("analysis cancelled"),
    }
}

/// Run one CLI invocation.
pub fn run(cli: &Cli) -> Result<()> {
    let analysis = analyze_root(cli)?;
    let graph = &analysis.graph;
    match &cli.command {
        Commands::Analyze { format } => report::snapshot(graph, *format),
        Commands::Stats => {
            report::stats(&analysis);
            Ok(())
        }
        Commands::Symbols { file } => report::symbols(graph, file),
        Commands::Unresolved { limit } => {
            report::unresolved(graph, *limit);
            Ok(())
        }
        Commands::Externals => {
            report::externals(graph);
            Ok(())
        }
        Commands::Callers { name } => {
            report::callers(graph, name);
            Ok(())
        }
        Commands::Cycles => {
            report::cycles(graph);
            Ok(())
        }
    }
}
