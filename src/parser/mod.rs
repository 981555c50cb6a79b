//
//  mod.rs
//  Factgraph
//

//! Language adapter: tree-sitter parsing behind a small, language-neutral
//! surface, plus the extractors that run over it.

pub mod extractor;
pub mod grammar;
pub mod language;

pub use extractor::{extract_file, extract_source};
pub use grammar::{grammar_for, Grammar, NodeClass};
pub use language::SupportedLanguage;

use std::path::{Path, PathBuf};

use tree_sitter::{Node, Parser, Tree};

use crate::error::{FactgraphError, Result};
use crate::graph::types::Span;

/// A parsed file: syntax tree, source text and the grammar tables for its language.
pub struct SourceTree<'src> {
    path: PathBuf,
    language: SupportedLanguage,
    grammar: &'static Grammar,
    source: &'src str,
    tree: Tree,
}

impl<'src> SourceTree<'src> {
    /// Parse `source` as `language`.
    ///
    /// Malformed syntax is an error: the first error or missing node in
    /// document order is reported as [`FactgraphError::Parse`] with its byte
    /// offset.
    pub fn parse(path: &Path, source: &'src str, language: SupportedLanguage) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&language.tree_sitter_language())
            .map_err(|e| FactgraphError::ParserInit(path.to_path_buf(), e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| FactgraphError::TreeSitterParseFailed(path.to_path_buf()))?;

        if let Some(offset) = first_error_offset(tree.root_node()) {
            return Err(FactgraphError::Parse {
                path: path.to_path_buf(),
                offset,
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            language,
            grammar: grammar_for(language),
            source,
            tree,
        })
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn language(&self) -> SupportedLanguage {
        self.language
    }

    pub fn grammar(&self) -> &'static Grammar {
        self.grammar
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Literal text covered by a node.
    pub fn text(&self, node: Node<'_>) -> &'src str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Semantic role of a node in this grammar.
    pub fn classify(&self, node: Node<'_>) -> NodeClass {
        self.grammar.classify(node.kind())
    }

    pub fn span(&self, node: Node<'_>) -> Span {
        Span {
            start_line: node.start_position().row + 1,
            end_line: node.end_position().row + 1,
            start_column: node.start_position().column,
            end_column: node.end_position().column,
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
        }
    }
}

/// Byte offset of the first error or missing node, if the tree has any.
fn first_error_offset(root: Node<'_>) -> Option<usize> {
    if !root.has_error() {
        return None;
    }
    let mut node = root;
    loop {
        if node.is_error() || node.is_missing() {
            return Some(node.start_byte());
        }
        let mut cursor = node.walk();
        let next = node.children(&mut cursor).find(|child| child.has_error());
        match next {
            Some(child) => node = child,
            None => return Some(node.start_byte()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_source() {
        let src = "def f(x):\n    return g(x)\n";
        let tree = SourceTree::parse(Path::new("m.py"), src, SupportedLanguage::Python).unwrap();
        assert_eq!(tree.root().kind(), "module");
        let func = tree.root().named_child(0).unwrap();
        assert_eq!(tree.classify(func), NodeClass::Function);
        assert_eq!(tree.span(func).start_line, 1);
        assert_eq!(tree.span(func).end_line, 2);
        assert_eq!(tree.span(func).start_column, 0);
        assert_eq!(tree.span(func).end_column, 15, "ends after `return g(x)`");
    }

    #[test]
    fn test_parse_error_carries_path_and_offset() {
        let src = "x = 1\ndef broken(:\n    pass\n";
        let err = SourceTree::parse(Path::new("bad.py"), src, SupportedLanguage::Python)
            .err()
            .unwrap();
        match err {
            FactgraphError::Parse { path, offset } => {
                assert_eq!(path, PathBuf::from("bad.py"));
                assert!(offset >= 6, "error is on the second line, got {offset}");
                assert!(offset < src.len());
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_token_is_a_parse_error() {
        let src = "fn main() { let x = 1 }\n";
        let result = SourceTree::parse(Path::new("main.rs"), src, SupportedLanguage::Rust);
        assert!(matches!(result, Err(FactgraphError::Parse { .. })));
    }
}
