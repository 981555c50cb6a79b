//
//  config.rs
//  Factgraph
//

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::Result;
use crate::parser::SupportedLanguage;

/// Default config file name, looked up at the analysis root.
pub const CONFIG_FILE_NAME: &str = ".factgraph.toml";

/// Top-level Factgraph configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactgraphConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub resolution: ResolutionConfig,
}

/// Project-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Root directory to scan (relative to the config file).
    #[serde(default = "default_root")]
    pub root: String,
    /// Language tags to analyze.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Extra directory names to skip while scanning.
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// Extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Worker threads for per-file extraction. 0 means available parallelism.
    #[serde(default)]
    pub threads: usize,
    /// Files larger than this are skipped at scan time.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Honor .gitignore and friends while scanning.
    #[serde(default = "default_true")]
    pub follow_gitignore: bool,
}

/// Resolver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Look up inherited methods through named base classes.
    #[serde(default = "default_true")]
    pub walk_bases: bool,
    /// Names treated as builtins in every language.
    #[serde(default)]
    pub extra_builtins: Vec<String>,
}

fn default_root() -> String {
    ".".to_string()
}

fn default_languages() -> Vec<String> {
    SupportedLanguage::ALL
        .iter()
        .map(|lang| lang.name().to_string())
        .collect()
}

fn default_max_file_bytes() -> u64 {
    1024 * 1024
}

fn default_true() -> bool {
    true
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            languages: default_languages(),
            ignore: Vec::new(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            max_file_bytes: default_max_file_bytes(),
            follow_gitignore: true,
        }
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            walk_bases: true,
            extra_builtins: Vec::new(),
        }
    }
}

impl FactgraphConfig {
    /// Parse config from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring malformed config");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Resolve the project root relative to the config file's parent directory.
    pub fn resolve_root(&self, config_path: &Path) -> PathBuf {
        let parent = config_path.parent().unwrap_or(config_path);
        parent.join(&self.project.root)
    }

    /// Languages enabled for scanning. Unknown tags are logged and skipped.
    pub fn enabled_languages(&self) -> Vec<SupportedLanguage> {
        let mut langs = Vec::new();
        for tag in &self.project.languages {
            match SupportedLanguage::from_tag(tag) {
                Ok(lang) => {
                    if !langs.contains(&lang) {
                        langs.push(lang);
                    }
                }
                Err(e) => warn!(error = %e, "skipping language"),
            }
        }
        langs
    }

    /// Worker count after applying the "0 = available parallelism" rule.
    pub fn worker_threads(&self) -> usize {
        if self.analysis.threads > 0 {
            return self.analysis.threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}
