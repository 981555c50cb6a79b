//! Language detection and tree-sitter grammar loading.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tree_sitter::Language;

use crate::error::{FactgraphError, Result};

/// Supported programming languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedLanguage {
    Python,
    Rust,
    Go,
    Java,
    JavaScript,
    TypeScript,
    Tsx,
    C,
    Cpp,
}

impl SupportedLanguage {
    pub const ALL: [SupportedLanguage; 9] = [
        SupportedLanguage::Python,
        SupportedLanguage::Rust,
        SupportedLanguage::Go,
        SupportedLanguage::Java,
        SupportedLanguage::JavaScript,
        SupportedLanguage::TypeScript,
        SupportedLanguage::Tsx,
        SupportedLanguage::C,
        SupportedLanguage::Cpp,
    ];

    /// Detect language from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext {
            "py" | "pyi" | "pyw" => Some(SupportedLanguage::Python),
            "rs" => Some(SupportedLanguage::Rust),
            "go" => Some(SupportedLanguage::Go),
            "java" => Some(SupportedLanguage::Java),
            "js" | "mjs" | "cjs" | "jsx" => Some(SupportedLanguage::JavaScript),
            "ts" | "mts" | "cts" => Some(SupportedLanguage::TypeScript),
            "tsx" => Some(SupportedLanguage::Tsx),
            "c" | "h" => Some(SupportedLanguage::C),
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Some(SupportedLanguage::Cpp),
            _ => None,
        }
    }

    /// Parse a language tag as given by a caller or config file.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(SupportedLanguage::Python),
            "rust" | "rs" => Ok(SupportedLanguage::Rust),
            "go" | "golang" => Ok(SupportedLanguage::Go),
            "java" => Ok(SupportedLanguage::Java),
            "javascript" | "js" | "jsx" => Ok(SupportedLanguage::JavaScript),
            "typescript" | "ts" => Ok(SupportedLanguage::TypeScript),
            "tsx" => Ok(SupportedLanguage::Tsx),
            "c" => Ok(SupportedLanguage::C),
            "cpp" | "c++" | "cxx" => Ok(SupportedLanguage::Cpp),
            _ => Err(FactgraphError::UnknownLanguageTag(tag.to_string())),
        }
    }

    /// Get the tree-sitter Language for this language.
    pub fn tree_sitter_language(&self) -> Language {
        match self {
            SupportedLanguage::Python => tree_sitter_python::LANGUAGE.into(),
            SupportedLanguage::Rust => tree_sitter_rust::LANGUAGE.into(),
            SupportedLanguage::Go => tree_sitter_go::LANGUAGE.into(),
            SupportedLanguage::Java => tree_sitter_java::LANGUAGE.into(),
            SupportedLanguage::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            SupportedLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SupportedLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            SupportedLanguage::C => tree_sitter_c::LANGUAGE.into(),
            SupportedLanguage::Cpp => tree_sitter_cpp::LANGUAGE.into(),
        }
    }

    /// Canonical tag, as accepted by [`SupportedLanguage::from_tag`].
    pub fn name(&self) -> &'static str {
        match self {
            SupportedLanguage::Python => "python",
            SupportedLanguage::Rust => "rust",
            SupportedLanguage::Go => "go",
            SupportedLanguage::Java => "java",
            SupportedLanguage::JavaScript => "javascript",
            SupportedLanguage::TypeScript => "typescript",
            SupportedLanguage::Tsx => "tsx",
            SupportedLanguage::C => "c",
            SupportedLanguage::Cpp => "cpp",
        }
    }

    /// Check if two languages share a module namespace (can import each other).
    pub fn same_ecosystem(&self, other: &Self) -> bool {
        self.ecosystem() == other.ecosystem()
    }

    fn ecosystem(&self) -> u8 {
        match self {
            SupportedLanguage::Python => 0,
            SupportedLanguage::Rust => 1,
            SupportedLanguage::Go => 2,
            SupportedLanguage::Java => 3,
            // JS, TS and TSX import each other freely
            SupportedLanguage::JavaScript
            | SupportedLanguage::TypeScript
            | SupportedLanguage::Tsx => 4,
            // headers are shared between C and C++
            SupportedLanguage::C | SupportedLanguage::Cpp => 5,
        }
    }
}

impl fmt::Display for SupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(
            SupportedLanguage::from_path(Path::new("pkg/mod.py")),
            Some(SupportedLanguage::Python)
        );
        assert_eq!(
            SupportedLanguage::from_path(Path::new("include/api.h")),
            Some(SupportedLanguage::C)
        );
        assert_eq!(
            SupportedLanguage::from_path(Path::new("include/api.hpp")),
            Some(SupportedLanguage::Cpp)
        );
        assert_eq!(SupportedLanguage::from_path(Path::new("README.md")), None);
        assert_eq!(SupportedLanguage::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_tags_round_trip_through_name() {
        for lang in SupportedLanguage::ALL {
            assert_eq!(SupportedLanguage::from_tag(lang.name()).unwrap(), lang);
        }
        assert_eq!(SupportedLanguage::from_tag("C++").unwrap(), SupportedLanguage::Cpp);
        assert!(SupportedLanguage::from_tag("cobol").is_err());
    }

    #[test]
    fn test_ecosystems() {
        assert!(SupportedLanguage::TypeScript.same_ecosystem(&SupportedLanguage::JavaScript));
        assert!(SupportedLanguage::C.same_ecosystem(&SupportedLanguage::Cpp));
        assert!(!SupportedLanguage::Python.same_ecosystem(&SupportedLanguage::Rust));
    }
}
