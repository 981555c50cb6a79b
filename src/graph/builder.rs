//
//  builder.rs
//  Factgraph
//

//! Analysis pipeline: gather an analyzed unit, extract every file on a
//! worker pool, then hand the facts to the resolver.

use ignore::WalkBuilder;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::engine::CodeGraph;
use super::resolver::Resolver;
use super::types::{FailureKind, FileExtractions, FileFailure};
use crate::config::{FactgraphConfig, ResolutionConfig};
use crate::error::{FactgraphError, Result};
use crate::parser::{extract_source, SupportedLanguage};

/// Directories that are never analyzed, even without .gitignore.
const BUILTIN_IGNORE: &[&str] = &[
    "node_modules",
    "vendor",
    "dist",
    "build",
    ".git",
    ".svn",
    ".hg",
    "__pycache__",
    ".tox",
    ".venv",
    "venv",
    "target",
    ".next",
    ".nuxt",
    "coverage",
    ".cache",
    ".turbo",
    ".output",
];

const IGNORE_FILE_NAME: &str = ".factgraphignore";

/// Check if a relative path crosses an ignored directory.
fn is_ignored(path: &Path, extra: &[String]) -> bool {
    path.components().any(|c| {
        if let std::path::Component::Normal(name) = c {
            let name = name.to_str().unwrap_or("");
            BUILTIN_IGNORE.contains(&name) || extra.iter().any(|e| e == name)
        } else {
            false
        }
    })
}

impl FileFailure {
    fn from_error(path: &Path, err: &FactgraphError) -> Self {
        let kind = match err {
            FactgraphError::Parse { offset, .. } => FailureKind::Parse { offset: *offset },
            FactgraphError::UnsupportedLanguage(_) => FailureKind::Unsupported,
            FactgraphError::Io(_) => FailureKind::Read,
            _ => FailureKind::Parse { offset: 0 },
        };
        Self {
            path: path.to_path_buf(),
            kind,
            message: err.to_string(),
        }
    }
}

// ─── Analyzed unit ──────────────────────────────────────────

/// One source file of an analyzed unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the unit root.
    pub path: PathBuf,
    pub language: SupportedLanguage,
    pub source: String,
}

/// The set of files analyzed together.
#[derive(Debug, Clone, Default)]
pub struct AnalysisUnit {
    root: PathBuf,
    files: Vec<SourceFile>,
    /// Files found while scanning that could not be read.
    skipped: Vec<FileFailure>,
}

impl AnalysisUnit {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Add an in-memory source; the language comes from the extension.
    pub fn add_source(&mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> Result<()> {
        let path = path.into();
        let language = SupportedLanguage::from_path(&path)
            .ok_or_else(|| FactgraphError::UnsupportedLanguage(path.clone()))?;
        self.add_file(path, language, source);
        Ok(())
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>, language: SupportedLanguage, source: impl Into<String>) {
        let source = source.into();
        let source = match source.strip_prefix('\u{feff}') {
            Some(rest) => rest.to_string(),
            None => source,
        };
        self.files.push(SourceFile {
            path: path.into(),
            language,
            source,
        });
    }

    /// Walk `root` and load every enabled-language file.
    ///
    /// Honors .gitignore (when configured), `.factgraphignore`, the builtin
    /// ignore list and `[project] ignore`. Files above the size cap are
    /// skipped; unreadable files are kept as read failures.
    pub fn scan(root: &Path, config: &FactgraphConfig) -> Result<Self> {
        if !root.is_dir() {
            return Err(FactgraphError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", root.display()),
            )));
        }
        let languages = config.enabled_languages();
        let follow = config.analysis.follow_gitignore;
        let mut unit = Self::new(root);

        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(follow)
            .git_global(follow)
            .git_exclude(follow)
            .add_custom_ignore_filename(IGNORE_FILE_NAME)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path()).to_path_buf();
            if is_ignored(&rel, &config.project.ignore) {
                continue;
            }
            let Some(language) = SupportedLanguage::from_path(&rel) else {
                continue;
            };
            if !languages.contains(&language) {
                continue;
            }
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if size > config.analysis.max_file_bytes {
                debug!(path = %rel.display(), size, "skipping oversized file");
                continue;
            }
            match fs::read_to_string(entry.path()) {
                Ok(source) => unit.add_file(rel, language, source),
                Err(e) => {
                    warn!(path = %rel.display(), error = %e, "failed to read file");
                    unit.skipped.push(FileFailure::from_error(&rel, &FactgraphError::Io(e)));
                }
            }
        }

        info!(
            root = %root.display(),
            file_count = unit.files.len(),
            skipped = unit.skipped.len(),
            "scanned unit"
        );
        Ok(unit)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn skipped(&self) -> &[FileFailure] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

// ─── Runs ───────────────────────────────────────────────────

/// Cooperative cancellation flag shared with a running [`Analyzer`].
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A finished run: the frozen graph plus every per-file failure.
#[derive(Debug)]
pub struct Analysis {
    pub graph: CodeGraph,
    pub errors: Vec<FileFailure>,
}

/// Facts of the files that completed before cancellation. Not resolved.
#[derive(Debug)]
pub struct PartialRun {
    pub files: Vec<FileExtractions>,
    pub errors: Vec<FileFailure>,
}

impl PartialRun {
    /// Resolve whatever was extracted.
    pub fn resolve(self, config: &ResolutionConfig) -> Result<Analysis> {
        let graph = Resolver::with_config(config.clone()).resolve(self.files)?;
        Ok(Analysis {
            graph,
            errors: self.errors,
        })
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Complete(Analysis),
    Cancelled(PartialRun),
}

pub struct Analyzer {
    config: FactgraphConfig,
    cancel: CancellationToken,
}

impl Analyzer {
    pub fn new(config: FactgraphConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Extract every file in parallel, then resolve.
    ///
    /// The token is checked before each file. Once it is set no new file is
    /// started, the resolver is skipped, and the completed files come back
    /// as a [`PartialRun`].
    ///
    /// Only a unit with nothing in it is an error. When every file fails,
    /// the run still completes: an empty graph plus the failures.
    pub fn run(&self, unit: &AnalysisUnit) -> Result<RunOutcome> {
        if unit.is_empty() && unit.skipped.is_empty() {
            return Err(FactgraphError::EmptyUnit);
        }
        let threads = self.config.worker_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| FactgraphError::ThreadPool(e.to_string()))?;
        debug!(file_count = unit.len(), threads, "extracting");

        let results: Vec<Option<std::result::Result<FileExtractions, FileFailure>>> = pool.install(|| {
            unit.files
                .par_iter()
                .map(|file| {
                    if self.cancel.is_cancelled() {
                        return None;
                    }
                    let extracted = extract_source(&file.path, &file.source, file.language)
                        .map_err(|e| FileFailure::from_error(&file.path, &e));
                    Some(extracted)
                })
                .collect()
        });

        let mut files = Vec::new();
        let mut errors = unit.skipped.clone();
        for result in results.into_iter().flatten() {
            match result {
                Ok(facts) => files.push(facts),
                Err(failure) => {
                    warn!(path = %failure.path.display(), error = %failure.message, "skipping file");
                    errors.push(failure);
                }
            }
        }
        errors.sort_by(|a, b| a.path.cmp(&b.path));

        if self.cancel.is_cancelled() {
            info!(completed = files.len(), total = unit.len(), "analysis cancelled");
            return Ok(RunOutcome::Cancelled(PartialRun { files, errors }));
        }

        if files.is_empty() {
            warn!(failed = errors.len(), "no file could be extracted");
            return Ok(RunOutcome::Complete(Analysis {
                graph: CodeGraph::empty(),
                errors,
            }));
        }

        let graph = Resolver::with_config(self.config.resolution.clone()).resolve(files)?;
        Ok(RunOutcome::Complete(Analysis { graph, errors }))
    }
}

/// Analyze a unit with the default configuration.
pub fn analyze(unit: &AnalysisUnit) -> Result<Analysis> {
    let config = FactgraphConfig::default();
    match Analyzer::new(config.clone()).run(unit)? {
        RunOutcome::Complete(analysis) => Ok(analysis),
        RunOutcome::Cancelled(partial) => partial.resolve(&config.resolution),
    }
}
