//
//  paths.rs
//  Factgraph
//

//! Logical module paths and relative-import arithmetic.

use std::path::Path;

use crate::parser::SupportedLanguage;

const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"];

/// Logical path segments of a file and whether it stands for its directory
/// (a package), e.g. `pkg/__init__.py` → (`pkg`, true).
pub fn logical_path(rel: &Path, lang: SupportedLanguage) -> (Vec<String>, bool) {
    let mut segments: Vec<String> = rel
        .parent()
        .map(|dir| {
            dir.components()
                .filter_map(|c| match c {
                    std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    let file_name = rel
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = rel
        .file_stem()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();

    match lang {
        SupportedLanguage::Python => {
            if stem == "__init__" {
                return (segments, true);
            }
            segments.push(stem);
            (segments, false)
        }
        SupportedLanguage::Rust => {
            // A binary root keeps its own key next to `lib.rs`; its
            // relative paths still start at the directory.
            if stem == "main" {
                segments.push(stem);
                return (segments, false);
            }
            // Every other Rust file can own child modules, so relative paths start at the file itself.
            if !matches!(stem.as_str(), "mod" | "lib") {
                segments.push(stem);
            }
            (segments, true)
        }
        SupportedLanguage::JavaScript | SupportedLanguage::TypeScript | SupportedLanguage::Tsx => {
            let stem = stem.strip_suffix(".d").unwrap_or(&stem).to_string();
            if stem == "index" {
                return (segments, true);
            }
            segments.push(stem);
            (segments, false)
        }
        SupportedLanguage::Go | SupportedLanguage::Java => {
            segments.push(stem);
            (segments, false)
        }
        SupportedLanguage::C | SupportedLanguage::Cpp => {
            segments.push(file_name);
            (segments, false)
        }
    }
}

/// Segments of an import target with any relative prefix removed.
pub fn target_segments(raw: &str, lang: SupportedLanguage) -> Vec<String> {
    let owned = |parts: Vec<&str>| -> Vec<String> {
        parts
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };
    match lang {
        SupportedLanguage::Python => owned(raw.trim_start_matches('.').split('.').collect()),
        SupportedLanguage::Java => owned(raw.split('.').collect()),
        SupportedLanguage::Rust => owned(
            raw.split("::")
                .skip_while(|s| matches!(*s, "self" | "super" | "crate"))
                .collect(),
        ),
        SupportedLanguage::Go => owned(raw.split('/').filter(|s| !matches!(*s, "." | "..")).collect()),
        SupportedLanguage::JavaScript | SupportedLanguage::TypeScript | SupportedLanguage::Tsx => {
            let mut segments = owned(raw.split('/').filter(|s| !matches!(*s, "." | "..")).collect());
            if let Some(last) = segments.last_mut() {
                if let Some((stem, ext)) = last.rsplit_once('.') {
                    if SCRIPT_EXTENSIONS.contains(&ext) {
                        *last = stem.to_string();
                    }
                }
            }
            if segments.last().is_some_and(|s| s == "index") {
                segments.pop();
            }
            segments
        }
        SupportedLanguage::C | SupportedLanguage::Cpp => {
            if raw.contains("::") {
                owned(raw.split("::").collect())
            } else {
                owned(raw.split('/').filter(|s| !matches!(*s, "." | "..")).collect())
            }
        }
    }
}

/// Package position a relative import of `depth` starts from, or `None`
/// when it climbs above the unit root.
pub fn relative_base(logical_path: &[String], is_package: bool, depth: usize) -> Option<Vec<String>> {
    let mut base = logical_path.to_vec();
    if !is_package {
        base.pop()?;
    }
    for _ in 1..depth {
        base.pop()?;
    }
    Some(base)
}

/// Whether `needle` is a trailing run of `haystack`.
pub fn ends_with(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty() && haystack.len() >= needle.len() && haystack[haystack.len() - needle.len()..] == *needle
}
