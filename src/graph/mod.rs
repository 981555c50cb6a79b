//! Fact graph: data model, resolution, the frozen graph and its queries,
//! and the analysis pipeline that feeds them.

pub mod builder;
pub mod engine;
pub mod paths;
pub mod query;
pub mod resolver;
pub mod types;

pub use builder::{
    analyze, Analysis, AnalysisUnit, Analyzer, CancellationToken, PartialRun, RunOutcome, SourceFile,
};
pub use engine::{CodeGraph, EdgeData, EdgeKind, GraphNode};
pub use query::GraphSnapshot;
pub use resolver::{Phase, Resolver};
pub use types::*;
