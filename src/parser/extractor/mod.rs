//
//  mod.rs
//  Factgraph
//

mod calls;
mod helpers;
mod imports;
mod profile;
mod symbols;

pub use profile::content_hash;

use std::path::Path;

use super::language::SupportedLanguage;
use super::SourceTree;
use crate::error::FactgraphError;
use crate::graph::types::*;

/// Extract all symbols, imports, and calls from a source file.
/// The language is chosen by file extension.
pub fn extract_file(path: &Path, source: &str) -> crate::error::Result<FileExtractions> {
    let lang = SupportedLanguage::from_path(path)
        .ok_or_else(|| FactgraphError::UnsupportedLanguage(path.to_path_buf()))?;
    extract_source(path, source, lang)
}

/// Extract facts from `source` parsed as `lang`.
///
/// The tree is parsed once; the three extractors then run over it
/// independently and their results are stitched together here.
pub fn extract_source(
    path: &Path,
    source: &str,
    lang: SupportedLanguage,
) -> crate::error::Result<FileExtractions> {
    let tree = SourceTree::parse(path, source, lang)?;

    let mut facts = symbols::extract_symbols(&tree);
    profile::assign_stable_ids(path, &mut facts.symbols);
    let imports = imports::extract_imports(&tree);
    let sites = calls::extract_calls(&tree);

    let mut calls: Vec<ExtractedCall> = sites
        .into_iter()
        .map(|site| {
            let mut call = site.call;
            call.caller = site
                .scopes
                .iter()
                .rev()
                .find_map(|key| facts.scope_keys.get(key).copied());
            call
        })
        .collect();
    calls.extend(facts.decorator_calls);

    Ok(FileExtractions {
        file_path: path.to_path_buf(),
        language: lang,
        content_hash: content_hash(source),
        symbols: facts.symbols,
        imports,
        calls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_file_detects_language() {
        let src = "def greet(name):\n    print(name)\n";
        let facts = extract_file(Path::new("hello.py"), src).unwrap();
        assert_eq!(facts.language, SupportedLanguage::Python);
        assert_eq!(facts.symbols.len(), 1);
        assert_eq!(facts.calls.len(), 1);
        assert_eq!(facts.calls[0].caller, Some(0), "print is called inside greet");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = extract_file(Path::new("notes.txt"), "hello").err().unwrap();
        assert!(matches!(err, FactgraphError::UnsupportedLanguage(_)));
    }

    #[test]
    fn test_method_calls_attributed_to_method() {
        let src = "class A:\n    def run(self):\n        self.step()\n\nA().run()\n";
        let facts = extract_file(Path::new("a.py"), src).unwrap();
        let step = facts.calls.iter().find(|c| c.name == "step").unwrap();
        assert_eq!(step.caller, Some(1));
        let run = facts.calls.iter().find(|c| c.name == "run").unwrap();
        assert_eq!(run.caller, None);
        assert_eq!(run.kind, CallKind::Chained);
    }

    #[test]
    fn test_decorator_calls_appended_after_body_calls() {
        let src = "class K:\n    @route(\"/x\")\n    def handler(self):\n        work()\n";
        let facts = extract_file(Path::new("k.py"), src).unwrap();
        assert_eq!(facts.calls.len(), 2);
        assert_eq!(facts.calls[0].name, "work");
        let decorator = &facts.calls[1];
        assert_eq!(decorator.kind, CallKind::DecoratorCall);
        assert_eq!(decorator.caller, Some(0), "decorator runs in the class body");
        assert_eq!(decorator.decorates, Some(1));
    }
}
