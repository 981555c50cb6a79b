//
//  error.rs
//  Factgraph
//

use std::path::PathBuf;
use thiserror::Error;

use crate::graph::resolver::Phase;

/// Errors raised while extracting facts or assembling the graph.
///
/// Only [`FactgraphError::EmptyUnit`], [`FactgraphError::PhaseOrder`] and
/// [`FactgraphError::ThreadPool`] are fatal to a run; every other variant is
/// scoped to a single file and reported next to the graph.
#[derive(Debug, Error)]
pub enum FactgraphError {
    #[error("{path}: syntax error at byte {offset}")]
    Parse { path: PathBuf, offset: usize },

    #[error("unsupported language for {0}")]
    UnsupportedLanguage(PathBuf),

    #[error("unknown language tag '{0}'")]
    UnknownLanguageTag(String),

    #[error("failed to initialize parser for {0}: {1}")]
    ParserInit(PathBuf, String),

    #[error("{0}: parser produced no tree")]
    TreeSitterParseFailed(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("analyzed unit contains no files")]
    EmptyUnit,

    #[error("resolver phase out of order: expected {expected}, found {found}")]
    PhaseOrder { expected: Phase, found: Phase },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl FactgraphError {
    /// Whether this error ends the whole run rather than a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FactgraphError::EmptyUnit
                | FactgraphError::PhaseOrder { .. }
                | FactgraphError::ThreadPool(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FactgraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message_carries_location() {
        let err = FactgraphError::Parse {
            path: PathBuf::from("pkg/broken.py"),
            offset: 42,
        };
        assert_eq!(err.to_string(), "pkg/broken.py: syntax error at byte 42");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_structural_errors_are_fatal() {
        assert!(FactgraphError::EmptyUnit.is_fatal());
        let err = FactgraphError::PhaseOrder {
            expected: Phase::Collected,
            found: Phase::Pending,
        };
        assert!(err.is_fatal());
        assert_eq!(
            err.to_string(),
            "resolver phase out of order: expected collected, found pending"
        );
    }
}
