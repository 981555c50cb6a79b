//! # Factgraph
//!
//! Multi-language static analysis that turns a set of source files into one
//! resolved code graph: symbols, import edges and call edges.
//!
//! ## Key Features
//!
//! - **Many languages**: Python, Rust, Go, Java, JavaScript/TypeScript, C and C++
//! - **Resolved**: imports link to modules and symbols, calls link to their targets
//! - **Honest**: unresolved and external edges are kept and reported, never dropped
//! - **Deterministic**: the same input always yields the same graph
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use factgraph::{analyze, AnalysisUnit};
//!
//! let mut unit = AnalysisUnit::new(".");
//! unit.add_source("app.py", "def main():\n    print('hi')\n").unwrap();
//!
//! let analysis = analyze(&unit).unwrap();
//! for call in analysis.graph.unresolved_calls() {
//!     println!("{} at line {}", call.callee, call.span.start_line);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod parser;

// Re-exports for convenience
pub use config::FactgraphConfig;
pub use error::{FactgraphError, Result};
pub use graph::{
    analyze, Analysis, AnalysisUnit, Analyzer, CancellationToken, CodeGraph, PartialRun, Resolver,
    RunOutcome,
};
pub use parser::{extract_file, SupportedLanguage};
