//
//  imports.rs
//  Factgraph
//

//! Import extraction. Every surface form desugars into one of three shapes:
//! a whole-module import, one edge per imported name, or a wildcard.

use tree_sitter::Node;

use super::helpers::*;
use crate::graph::types::*;
use crate::parser::{NodeClass, SourceTree, SupportedLanguage};

pub(crate) fn extract_imports(tree: &SourceTree<'_>) -> Vec<ExtractedImport> {
    let mut out = Vec::new();
    let mut pending = vec![tree.root()];
    while let Some(node) = pending.pop() {
        visit(tree, node, &mut out);
        pending.extend(named_children(node).into_iter().rev());
    }
    out
}

fn visit(tree: &SourceTree<'_>, node: Node<'_>, out: &mut Vec<ExtractedImport>) {
    if tree.classify(node) == NodeClass::Import {
        let emitter = Emitter {
            tree,
            span: tree.span(node),
        };
        match tree.language() {
            SupportedLanguage::Python => emitter.python(node, out),
            SupportedLanguage::Rust => emitter.rust(node, out),
            SupportedLanguage::Go => emitter.go(node, out),
            SupportedLanguage::Java => emitter.java(node, out),
            SupportedLanguage::JavaScript | SupportedLanguage::TypeScript | SupportedLanguage::Tsx => {
                emitter.javascript(node, out)
            }
            SupportedLanguage::C | SupportedLanguage::Cpp => emitter.c_family(node, out),
        }
    } else if node.kind() == "call_expression"
        && matches!(
            tree.language(),
            SupportedLanguage::JavaScript | SupportedLanguage::TypeScript | SupportedLanguage::Tsx
        )
    {
        if let Some(source) = required_module(tree, node) {
            let emitter = Emitter {
                tree,
                span: tree.span(node),
            };
            emitter.commonjs(node, source, out);
        }
    } else if node.kind() == "mod_item" && node.child_by_field_name("body").is_none() {
        // `mod foo;` pulls in a sibling file.
        if let Some(name) = field_text(tree, node, "name") {
            out.push(ExtractedImport {
                target: name.to_string(),
                name: ImportedName::Module,
                alias: name.to_string(),
                depth: 1,
                span: tree.span(node),
            });
        }
    }
}

/// The module named by a `require('...')` call with one string argument.
fn required_module<'s>(tree: &SourceTree<'s>, node: Node<'_>) -> Option<&'s str> {
    let function = node.child_by_field_name("function")?;
    if function.kind() != "identifier" || tree.text(function) != "require" {
        return None;
    }
    match named_children(node.child_by_field_name("arguments")?).as_slice() {
        [only] if only.kind() == "string" => Some(unquote(tree.text(*only))),
        _ => None,
    }
}

/// Strip one pair of matching quotes or angle brackets.
fn unquote(text: &str) -> &str {
    let text = text.trim();
    for (open, close) in [('"', '"'), ('\'', '\''), ('`', '`'), ('<', '>')] {
        if let Some(inner) = text.strip_prefix(open).and_then(|t| t.strip_suffix(close)) {
            return inner;
        }
    }
    text
}

/// Depth of a path-style specifier: `./x` → 1, `../x` → 2, `../../x` → 3.
fn path_depth(spec: &str) -> usize {
    let rest = spec.strip_prefix("./");
    let explicit = rest.is_some() || spec == ".";
    let mut rest = rest.unwrap_or(spec);
    let mut ups = 0;
    while let Some(next) = rest.strip_prefix("../") {
        ups += 1;
        rest = next;
    }
    if rest == ".." {
        ups += 1;
    }
    if explicit || ups > 0 {
        1 + ups
    } else {
        0
    }
}

struct Emitter<'a, 'src> {
    tree: &'a SourceTree<'src>,
    span: Span,
}

impl Emitter<'_, '_> {
    fn push(
        &self,
        out: &mut Vec<ExtractedImport>,
        target: &str,
        name: ImportedName,
        alias: Option<&str>,
        depth: usize,
    ) {
        let alias = match (alias, &name) {
            (Some(alias), _) => alias.to_string(),
            (None, ImportedName::Name(name)) => name.clone(),
            (None, ImportedName::Wildcard) => "*".to_string(),
            (None, ImportedName::Module) => target.to_string(),
        };
        out.push(ExtractedImport {
            target: target.to_string(),
            name,
            alias,
            depth,
            span: self.span,
        });
    }

    // ─── Python ─────────────────────────────────────────────

    fn python(&self, node: Node<'_>, out: &mut Vec<ExtractedImport>) {
        let tree = self.tree;
        if node.kind() == "import_statement" {
            let mut cursor = node.walk();
            let names: Vec<Node<'_>> = node.children_by_field_name("name", &mut cursor).collect();
            for name in names {
                if name.kind() == "aliased_import" {
                    if let Some(target) = field_text(tree, name, "name") {
                        let alias = field_text(tree, name, "alias");
                        self.push(out, target, ImportedName::Module, alias, 0);
                    }
                } else {
                    self.push(out, tree.text(name), ImportedName::Module, None, 0);
                }
            }
            return;
        }

        let (target, depth) = match node.child_by_field_name("module_name") {
            Some(module) if module.kind() == "relative_import" => {
                let dots = named_children(module)
                    .into_iter()
                    .find(|n| n.kind() == "import_prefix")
                    .map(|prefix| tree.text(prefix).chars().filter(|c| *c == '.').count())
                    .unwrap_or(0);
                (tree.text(module), dots)
            }
            Some(module) => (tree.text(module), 0),
            None => ("__future__", 0),
        };

        if named_children(node).iter().any(|n| n.kind() == "wildcard_import") {
            self.push(out, target, ImportedName::Wildcard, None, depth);
            return;
        }
        let mut cursor = node.walk();
        let names: Vec<Node<'_>> = node.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            let (imported, alias) = if name.kind() == "aliased_import" {
                (field_text(tree, name, "name"), field_text(tree, name, "alias"))
            } else {
                (Some(tree.text(name)), None)
            };
            if let Some(imported) = imported {
                self.push(out, target, ImportedName::Name(imported.to_string()), alias, depth);
            }
        }
    }

    // ─── Rust ───────────────────────────────────────────────

    fn rust(&self, node: Node<'_>, out: &mut Vec<ExtractedImport>) {
        let tree = self.tree;
        if node.kind() == "extern_crate_declaration" {
            if let Some(name) = field_text(tree, node, "name") {
                let alias = field_text(tree, node, "alias");
                self.push(out, name, ImportedName::Module, alias, 0);
            }
            return;
        }
        if let Some(argument) = node.child_by_field_name("argument") {
            self.use_tree(argument, &[], None, out);
        }
    }

    fn use_tree(
        &self,
        node: Node<'_>,
        prefix: &[String],
        alias: Option<&str>,
        out: &mut Vec<ExtractedImport>,
    ) {
        let tree = self.tree;
        let path_of = |node: Option<Node<'_>>| -> Vec<String> {
            let mut segments = prefix.to_vec();
            if let Some(node) = node {
                segments.extend(tree.text(node).split("::").map(|s| s.trim().to_string()));
            }
            segments
        };
        match node.kind() {
            "use_as_clause" => {
                if let Some(path) = node.child_by_field_name("path") {
                    let alias = field_text(tree, node, "alias");
                    self.use_tree(path, prefix, alias, out);
                }
            }
            "use_wildcard" => {
                let path = path_of(named_children(node).into_iter().next());
                self.emit_rust_path(&path, true, None, out);
            }
            "scoped_use_list" => {
                let path = path_of(node.child_by_field_name("path"));
                if let Some(list) = node.child_by_field_name("list") {
                    for item in named_children(list) {
                        self.use_tree(item, &path, None, out);
                    }
                }
            }
            "use_list" => {
                for item in named_children(node) {
                    self.use_tree(item, prefix, None, out);
                }
            }
            _ => {
                let path = path_of(Some(node));
                self.emit_rust_path(&path, false, alias, out);
            }
        }
    }

    fn emit_rust_path(
        &self,
        segments: &[String],
        wildcard: bool,
        alias: Option<&str>,
        out: &mut Vec<ExtractedImport>,
    ) {
        let depth = match segments.first().map(String::as_str) {
            Some("self") => 1,
            Some("super") => 1 + segments.iter().take_while(|s| *s == "super").count(),
            _ => 0,
        };
        if wildcard {
            self.push(out, &segments.join("::"), ImportedName::Wildcard, None, depth);
            return;
        }
        match segments {
            [] => {}
            [only] => self.push(out, only, ImportedName::Module, alias, depth),
            [module @ .., last] if last == "self" => {
                let alias = alias.or_else(|| module.last().map(String::as_str));
                self.push(out, &module.join("::"), ImportedName::Module, alias, depth);
            }
            [module @ .., last] => self.push(
                out,
                &module.join("::"),
                ImportedName::Name(last.clone()),
                alias,
                depth,
            ),
        }
    }

    // ─── Go ─────────────────────────────────────────────────

    fn go(&self, node: Node<'_>, out: &mut Vec<ExtractedImport>) {
        let tree = self.tree;
        let mut specs = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "import_spec" => specs.push(child),
                "import_spec_list" => specs.extend(
                    named_children(child)
                        .into_iter()
                        .filter(|n| n.kind() == "import_spec"),
                ),
                _ => {}
            }
        }
        for spec in specs {
            let Some(path) = field_text(tree, spec, "path").map(unquote) else {
                continue;
            };
            let depth = path_depth(path);
            match spec.child_by_field_name("name") {
                Some(name) if name.kind() == "dot" => {
                    self.push(out, path, ImportedName::Wildcard, None, depth)
                }
                Some(name) => {
                    self.push(out, path, ImportedName::Module, Some(tree.text(name)), depth)
                }
                None => {
                    let alias = path.rsplit('/').next().unwrap_or(path);
                    self.push(out, path, ImportedName::Module, Some(alias), depth);
                }
            }
        }
    }

    // ─── Java ───────────────────────────────────────────────

    fn java(&self, node: Node<'_>, out: &mut Vec<ExtractedImport>) {
        let tree = self.tree;
        let children = named_children(node);
        let Some(path) = children
            .iter()
            .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"))
            .map(|n| tree.text(*n))
        else {
            return;
        };
        if children.iter().any(|n| n.kind() == "asterisk") {
            self.push(out, path, ImportedName::Wildcard, None, 0);
            return;
        }
        match path.rsplit_once('.') {
            Some((module, name)) => {
                self.push(out, module, ImportedName::Name(name.to_string()), None, 0)
            }
            None => self.push(out, path, ImportedName::Module, None, 0),
        }
    }

    // ─── JavaScript / TypeScript ────────────────────────────

    fn javascript(&self, node: Node<'_>, out: &mut Vec<ExtractedImport>) {
        let tree = self.tree;
        let source = node
            .child_by_field_name("source")
            .map(|s| unquote(tree.text(s)));

        if node.kind() == "export_statement" {
            // Only re-exports import anything.
            let Some(source) = source else {
                return;
            };
            let depth = path_depth(source);
            let children = named_children(node);
            if let Some(clause) = children.iter().find(|n| n.kind() == "export_clause") {
                for spec in named_children(*clause) {
                    if let Some(name) = field_text(tree, spec, "name") {
                        let alias = field_text(tree, spec, "alias");
                        self.push(out, source, ImportedName::Name(name.to_string()), alias, depth);
                    }
                }
            } else if let Some(ns) = children.iter().find(|n| n.kind() == "namespace_export") {
                let alias = named_children(*ns).into_iter().next().map(|n| tree.text(n));
                self.push(out, source, ImportedName::Module, alias, depth);
            } else {
                self.push(out, source, ImportedName::Wildcard, None, depth);
            }
            return;
        }

        let children = named_children(node);
        if let Some(require) = children.iter().find(|n| n.kind() == "import_require_clause") {
            let target = require.child_by_field_name("source").map(|s| unquote(tree.text(s)));
            let alias = named_children(*require)
                .into_iter()
                .find(|n| n.kind() == "identifier")
                .map(|n| tree.text(n));
            if let Some(target) = target {
                self.push(out, target, ImportedName::Module, alias, path_depth(target));
            }
            return;
        }
        let Some(source) = source else {
            return;
        };
        let depth = path_depth(source);
        let Some(clause) = children.iter().find(|n| n.kind() == "import_clause") else {
            // Side-effect import.
            self.push(out, source, ImportedName::Module, None, depth);
            return;
        };
        for part in named_children(*clause) {
            match part.kind() {
                "identifier" => self.push(
                    out,
                    source,
                    ImportedName::Name("default".to_string()),
                    Some(tree.text(part)),
                    depth,
                ),
                "namespace_import" => {
                    let alias = named_children(part).into_iter().next().map(|n| tree.text(n));
                    self.push(out, source, ImportedName::Module, alias, depth);
                }
                "named_imports" => {
                    for spec in named_children(part) {
                        if let Some(name) = field_text(tree, spec, "name") {
                            let alias = field_text(tree, spec, "alias");
                            self.push(out, source, ImportedName::Name(unquote(name).to_string()), alias, depth);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// `const x = require('m')` binds the module, `const { a, b: c } = require('m')`
    /// binds names, and a bare `require('m')` only loads it.
    fn commonjs(&self, node: Node<'_>, source: &str, out: &mut Vec<ExtractedImport>) {
        let tree = self.tree;
        let depth = path_depth(source);
        let binding = node
            .parent()
            .filter(|p| p.kind() == "variable_declarator")
            .and_then(|p| p.child_by_field_name("name"));
        match binding {
            Some(name) if name.kind() == "identifier" => {
                self.push(out, source, ImportedName::Module, Some(tree.text(name)), depth)
            }
            Some(pattern) if pattern.kind() == "object_pattern" => {
                for property in named_children(pattern) {
                    match property.kind() {
                        "shorthand_property_identifier_pattern" => {
                            let name = tree.text(property).to_string();
                            self.push(out, source, ImportedName::Name(name), None, depth);
                        }
                        "pair_pattern" => {
                            let key = field_text(tree, property, "key");
                            let value = property
                                .child_by_field_name("value")
                                .filter(|v| v.kind() == "identifier")
                                .map(|v| tree.text(v));
                            if let Some(key) = key {
                                self.push(out, source, ImportedName::Name(unquote(key).to_string()), value, depth);
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => self.push(out, source, ImportedName::Module, None, depth),
        }
    }

    // ─── C / C++ ────────────────────────────────────────────

    fn c_family(&self, node: Node<'_>, out: &mut Vec<ExtractedImport>) {
        let tree = self.tree;
        if node.kind() == "preproc_include" {
            let Some(path) = node.child_by_field_name("path") else {
                return;
            };
            let depth = if path.kind() == "system_lib_string" {
                0
            } else {
                let spec = unquote(tree.text(path));
                let mut rest = spec.strip_prefix("./").unwrap_or(spec);
                let mut ups = 0;
                while let Some(next) = rest.strip_prefix("../") {
                    ups += 1;
                    rest = next;
                }
                1 + ups
            };
            self.push(out, unquote(tree.text(path)), ImportedName::Wildcard, None, depth);
            return;
        }

        // using_declaration
        let is_namespace = children(node).iter().any(|c| c.kind() == "namespace");
        let Some(target) = named_children(node).into_iter().last() else {
            return;
        };
        let text = tree.text(target);
        if is_namespace {
            self.push(out, text, ImportedName::Wildcard, None, 0);
            return;
        }
        match text.rsplit_once("::") {
            Some((scope, name)) => {
                self.push(out, scope, ImportedName::Name(name.to_string()), None, 0)
            }
            None => self.push(out, text, ImportedName::Module, None, 0),
        }
    }
}
