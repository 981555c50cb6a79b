//
//  profile.rs
//  Factgraph
//

//! Content-derived symbol facts: hashes, fingerprints, doc comments and the
//! line-level heuristics (invariants, side effects) read off a symbol's text.

use regex::{Captures, Regex};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use tree_sitter::Node;

use super::helpers::*;
use crate::graph::types::*;
use crate::parser::{SourceTree, SupportedLanguage};

/// SHA-256 of `text` as lowercase hex.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Everything but the stable id, which needs the finished scope tree.
pub(crate) fn describe(tree: &SourceTree<'_>, node: Node<'_>, symbol: &ExtractedSymbol) -> SymbolProfile {
    let doc = doc_comment(tree, node);
    let text = tree.text(node);
    SymbolProfile {
        stable_id: String::new(),
        fingerprint: fingerprint(node, symbol),
        exported: is_exported(tree, node, symbol),
        summary: summary(symbol, doc.as_deref()),
        invariants: invariants(doc.as_deref(), text),
        side_effects: side_effects(text),
        doc,
    }
}

/// Fill `stable_id` once parents are final.
pub(crate) fn assign_stable_ids(path: &Path, symbols: &mut [ExtractedSymbol]) {
    let path = path.to_string_lossy().replace('\\', "/");
    for idx in 0..symbols.len() {
        let qualified = qualified_name(symbols, idx);
        let symbol = &symbols[idx];
        let id = content_hash(&format!(
            "{path}:{}:{qualified}:{}",
            symbol.kind, symbol.profile.fingerprint
        ));
        symbols[idx].profile.stable_id = id;
    }
}

fn qualified_name(symbols: &[ExtractedSymbol], idx: usize) -> String {
    let mut names = Vec::new();
    let mut current = Some(idx);
    while let Some(i) = current {
        names.push(symbols[i].name.as_str());
        current = symbols[i].parent;
    }
    names.reverse();
    names.join(".")
}

// ─── Fingerprint ────────────────────────────────────────────

fn is_scalar_literal(kind: &str) -> bool {
    kind.contains("string")
        || kind.contains("number")
        || kind.contains("integer")
        || kind.contains("float")
        || kind.contains("char_literal")
        || kind.contains("character_literal")
        || kind.contains("rune_literal")
        || kind.contains("boolean")
        || matches!(kind, "true" | "false" | "null" | "none" | "nil" | "undefined" | "null_literal")
}

/// Header facts plus a hash of the node-kind skeleton, so reformatting,
/// comments and literal values leave it unchanged.
fn fingerprint(node: Node<'_>, symbol: &ExtractedSymbol) -> String {
    let mut parts = vec![
        format!("type:{}", node.kind()),
        format!("name:{}", symbol.name),
        format!("params:{}", symbol.parameters.len()),
    ];
    let modifiers: Vec<&str> = children(node)
        .into_iter()
        .flat_map(|child| match child.kind() {
            "modifiers" => children(child).into_iter().map(|m| m.kind()).collect(),
            kind => vec![kind],
        })
        .collect();
    for flag in ["async", "static"] {
        if modifiers.contains(&flag) {
            parts.push(format!("{flag}:true"));
        }
    }
    if let Some(vis) = ["public", "private", "protected"]
        .into_iter()
        .find(|vis| modifiers.contains(vis))
    {
        parts.push(format!("visibility:{vis}"));
    }
    if symbol.return_type.is_some() {
        parts.push("returnType:true".to_string());
    }
    parts.push(format!("subtree:{}", skeleton_hash(node)));
    content_hash(&parts.join("|"))
}

/// Pre-order node kinds, comments and literals pruned. Walks with a cursor,
/// so nesting depth costs no stack.
fn skeleton_hash(node: Node<'_>) -> String {
    let mut kinds: Vec<&str> = Vec::new();
    let mut cursor = node.walk();
    let mut depth = 0usize;
    'walk: loop {
        let current = cursor.node();
        let kind = current.kind();
        let pruned = is_comment(kind) || is_scalar_literal(kind);
        if !pruned {
            if current.is_named() {
                kinds.push(kind);
            }
            if cursor.goto_first_child() {
                depth += 1;
                continue;
            }
        }
        loop {
            if depth == 0 {
                break 'walk;
            }
            if cursor.goto_next_sibling() {
                continue 'walk;
            }
            cursor.goto_parent();
            depth -= 1;
        }
    }
    content_hash(&kinds.join(","))
}

// ─── Export rule ────────────────────────────────────────────

fn is_exported(tree: &SourceTree<'_>, node: Node<'_>, symbol: &ExtractedSymbol) -> bool {
    match tree.language() {
        SupportedLanguage::Python => symbol.parent.is_none() && symbol.visibility.is_public(),
        SupportedLanguage::Go => symbol.name.chars().next().is_some_and(char::is_uppercase),
        SupportedLanguage::Rust => children(node)
            .into_iter()
            .any(|child| child.kind() == "visibility_modifier" && tree.text(child).starts_with("pub")),
        SupportedLanguage::Java => children(node).into_iter().any(|child| {
            child.kind() == "modifiers" && tree.text(child).split_whitespace().any(|w| w == "public")
        }),
        SupportedLanguage::JavaScript | SupportedLanguage::TypeScript | SupportedLanguage::Tsx => {
            let mut current = node;
            while let Some(parent) = current.parent() {
                match parent.kind() {
                    "export_statement" => return true,
                    "lexical_declaration" | "variable_declaration" => current = parent,
                    _ => return false,
                }
            }
            false
        }
        SupportedLanguage::C | SupportedLanguage::Cpp => {
            symbol.parent.is_none()
                && !children(node).into_iter().any(|child| {
                    child.kind() == "storage_class_specifier" && tree.text(child) == "static"
                })
        }
    }
}

// ─── Doc comments ───────────────────────────────────────────

/// Wrappers a declaration sits in; comments precede the wrapper.
const DOC_ANCHORS: &[&str] = &[
    "export_statement",
    "lexical_declaration",
    "variable_declaration",
    "template_declaration",
    "var_declaration",
    "const_declaration",
];

/// Siblings allowed between a doc comment and its declaration.
fn is_doc_gap(kind: &str) -> bool {
    matches!(kind, "attribute_item" | "decorator")
}

fn is_doc_marker(lang: SupportedLanguage, text: &str) -> bool {
    match lang {
        SupportedLanguage::Python => false,
        SupportedLanguage::Rust => (text.starts_with("///") && !text.starts_with("////")) || text.starts_with("/**"),
        SupportedLanguage::JavaScript
        | SupportedLanguage::TypeScript
        | SupportedLanguage::Tsx
        | SupportedLanguage::Java => text.starts_with("/**"),
        SupportedLanguage::Go | SupportedLanguage::C | SupportedLanguage::Cpp => {
            text.starts_with("//") || text.starts_with("/*")
        }
    }
}

/// Docstring (Python) or the doc comment block directly above the declaration.
pub(crate) fn doc_comment(tree: &SourceTree<'_>, node: Node<'_>) -> Option<String> {
    if tree.language() == SupportedLanguage::Python {
        return docstring(tree, node);
    }
    let mut anchor = node;
    while let Some(parent) = anchor.parent() {
        if !DOC_ANCHORS.contains(&parent.kind()) {
            break;
        }
        anchor = parent;
    }

    let mut blocks: Vec<&str> = Vec::new();
    let mut next_row = anchor.start_position().row;
    let mut previous = anchor.prev_sibling();
    while let Some(sibling) = previous {
        let kind = sibling.kind();
        if is_doc_gap(kind) {
            next_row = sibling.start_position().row;
            previous = sibling.prev_sibling();
            continue;
        }
        if !is_comment(kind) || sibling.end_position().row + 1 < next_row {
            break;
        }
        let text = tree.text(sibling);
        if !is_doc_marker(tree.language(), text) {
            break;
        }
        blocks.push(text);
        next_row = sibling.start_position().row;
        previous = sibling.prev_sibling();
    }
    blocks.reverse();
    let lines: Vec<String> = blocks.iter().flat_map(|block| block.lines()).filter_map(clean_comment_line).collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn clean_comment_line(line: &str) -> Option<String> {
    let mut line = line.trim();
    for marker in ["/**", "/*", "///", "//"] {
        if let Some(rest) = line.strip_prefix(marker) {
            line = rest;
            break;
        }
    }
    let line = line.trim_end();
    let line = line.strip_suffix("*/").unwrap_or(line).trim();
    let line = line.strip_prefix('*').unwrap_or(line).trim();
    (!line.is_empty()).then(|| line.to_string())
}

/// First statement of a Python body when it is a bare string.
fn docstring(tree: &SourceTree<'_>, node: Node<'_>) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let statement = first_named(body)?;
    if statement.kind() != "expression_statement" {
        return None;
    }
    let string = first_named(statement).filter(|n| n.kind() == "string")?;
    let text = tree.text(string).trim_start_matches(|c: char| "rRuUbBfF".contains(c));
    let inner = ["\"\"\"", "'''", "\"", "'"]
        .into_iter()
        .find_map(|q| text.strip_prefix(q).and_then(|t| t.strip_suffix(q)))?;
    let lines: Vec<&str> = inner.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn is_tag_line(line: &str) -> bool {
    line.starts_with('@')
        || line.starts_with(":param")
        || line.starts_with(":raises")
        || line.starts_with(":return")
        || matches!(line, "Args:" | "Arguments:" | "Returns:" | "Raises:" | "Parameters" | "Example:" | "Examples:")
}

/// Free-text part of a doc: every line before the first tag or section.
fn doc_description(doc: &str) -> String {
    doc.lines()
        .take_while(|line| !is_tag_line(line))
        .collect::<Vec<_>>()
        .join(" ")
}

// ─── Summary ────────────────────────────────────────────────

/// Words of an identifier: `loadUserConfig`, `load_user_config` → load, user, config.
fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '_' | '-' | '.' | '$') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        let boundary = i > 0
            && c.is_uppercase()
            && (!chars[i - 1].is_uppercase() || chars.get(i + 1).is_some_and(|n| n.is_lowercase()));
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn parameter_context(parameters: &[Parameter]) -> Vec<String> {
    parameters
        .iter()
        .filter(|p| !p.variadic_positional && !p.variadic_keyword)
        .filter(|p| !matches!(p.name.as_str(), "self" | "cls" | "this"))
        .filter_map(|p| {
            let words: Vec<String> = split_words(&p.name).iter().map(|w| w.to_lowercase()).collect();
            let has = |options: &[&str]| words.iter().any(|w| options.contains(&w.as_str()));
            let preposition = if has(&["id"]) {
                "by"
            } else if has(&["config", "options", "opts", "settings"]) {
                "with"
            } else if has(&["data", "input"]) {
                "from"
            } else if has(&["path", "file", "dir"]) {
                "at"
            } else {
                return None;
            };
            Some(format!("{preposition} {}", p.name))
        })
        .collect()
}

/// Leading type of a return annotation: `Dict[str, int]` → `Dict`, `A | B` → `A`.
fn simple_type(annotation: &str) -> &str {
    let annotation = annotation.trim().trim_start_matches("->").trim_start_matches(':').trim();
    let first = annotation.split('|').next().unwrap_or(annotation);
    let first = first.split('&').next().unwrap_or(first);
    strip_generics(first.trim())
}

fn summary(symbol: &ExtractedSymbol, doc: Option<&str>) -> String {
    if let Some(doc) = doc {
        let description = doc_description(doc);
        let sentences: Vec<&str> = description
            .split(['.', '!', '?'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .take(2)
            .collect();
        if !sentences.is_empty() {
            return sentences.join(". ");
        }
    }

    let words = split_words(&symbol.name);
    let mut summary = words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            if i == 0 {
                let mut chars = word.chars();
                chars
                    .next()
                    .map(|c| c.to_uppercase().chain(chars).collect())
                    .unwrap_or_default()
            } else {
                word.to_lowercase()
            }
        })
        .collect::<Vec<String>>()
        .join(" ");
    for context in parameter_context(&symbol.parameters) {
        summary.push(' ');
        summary.push_str(&context);
    }
    if matches!(symbol.kind, SymbolKind::Function | SymbolKind::Method) {
        if let Some(returns) = symbol.return_type.as_deref().map(simple_type) {
            if !returns.is_empty() && !matches!(returns, "void" | "None" | "()" | "unknown") {
                summary.push_str(" and returns ");
                summary.push_str(returns);
            }
        }
    }
    summary
}

// ─── Line heuristics ────────────────────────────────────────

type Pattern = LazyLock<Option<Regex>>;

static DOC_PARAM: Pattern =
    LazyLock::new(|| Regex::new(r"^(?:@param\s+(?:\{[^}]+\}\s*)?|:param\s+)(\w+):?\s+(.+)$").ok());
static DOC_THROWS: Pattern = LazyLock::new(|| Regex::new(r"^(?:@throws|@raises|@exception|:raises)\s*(.+)$").ok());
static ASSERT_CALL: Pattern = LazyLock::new(|| Regex::new(r"\bassert(?:!|_eq!|_ne!)?\s*\(([^)]+)\)").ok());
static ASSERT_STATEMENT: Pattern = LazyLock::new(|| Regex::new(r"^assert\s+([^(,][^,]*)").ok());
static NEGATED_GUARD: Pattern =
    LazyLock::new(|| Regex::new(r"if\s*\(\s*!\s*([^)]+)\)\s*(?:\{|throw|return)").ok());
static PYTHON_GUARD: Pattern = LazyLock::new(|| Regex::new(r"^if\s+not\s+(.+?):").ok());
static NIL_GUARD: Pattern = LazyLock::new(|| Regex::new(r"^if\s+([\w.]+)\s*==\s*nil\s*\{").ok());
static THROWING_GUARD: Pattern = LazyLock::new(|| Regex::new(r"if\s*\(([^)]+)\)").ok());

fn captures<'t>(pattern: &Pattern, line: &'t str) -> Option<Captures<'t>> {
    pattern.as_ref()?.captures(line)
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with("//") || line.starts_with('#') || line.starts_with("/*") || line.starts_with('*')
}

fn dedup(items: &mut Vec<String>) {
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

/// Preconditions from doc tags and from guard clauses in the body.
fn invariants(doc: Option<&str>, text: &str) -> Vec<String> {
    let mut found = Vec::new();
    for line in doc.unwrap_or("").lines().map(str::trim) {
        if let Some(caps) = captures(&DOC_PARAM, line) {
            let description = caps[2].trim();
            let lower = description.to_lowercase();
            if ["must", "required", "should be", "cannot be"].iter().any(|w| lower.contains(w)) {
                found.push(format!("@param {}: {description}", &caps[1]));
            }
        } else if let Some(caps) = captures(&DOC_THROWS, line) {
            found.push(format!("@throws {}", caps[1].trim()));
        }
    }

    for line in text.lines().map(str::trim).filter(|l| !is_comment_line(l)) {
        if let Some(caps) = captures(&ASSERT_CALL, line).or_else(|| captures(&ASSERT_STATEMENT, line)) {
            found.push(format!("Asserts: {}", caps[1].trim()));
        }
        if let Some(caps) = captures(&NEGATED_GUARD, line).or_else(|| captures(&PYTHON_GUARD, line)) {
            found.push(format!("Requires: {}", caps[1].trim()));
        } else if let Some(caps) = captures(&NIL_GUARD, line) {
            found.push(format!("Requires: {} != nil", &caps[1]));
        } else if line.contains("throw new") || line.contains("return false") {
            if let Some(caps) = captures(&THROWING_GUARD, line) {
                let condition = caps[1].trim();
                if ["!", "null", "undefined", "None", "nil"].iter().any(|w| condition.contains(w)) {
                    found.push(format!("Requires: {condition}"));
                }
            }
        }
    }
    dedup(&mut found);
    found
}

const NETWORK_IO: &str = "Network I/O";
const FILESYSTEM_IO: &str = "Filesystem I/O";
const DATABASE_QUERY: &str = "Database query";
const GLOBAL_STATE: &str = "Global state mutation";
const ENVIRONMENT: &str = "Environment access";

static EFFECTS: LazyLock<Vec<(&'static str, Option<Regex>)>> = LazyLock::new(|| {
    vec![
        (
            NETWORK_IO,
            Regex::new(
                r"\bfetch\s*\(|\baxios\.|\bhttp\.(?:request|get|post|Get|Post|NewRequest)\s*\(|XMLHttpRequest|\brequests\.(?:get|post|put|patch|delete)\s*\(|\burllib\.|\breqwest::|TcpStream::connect|\bnet\.Dial",
            )
            .ok(),
        ),
        (
            FILESYSTEM_IO,
            Regex::new(
                r"\bfs\.\w+|\b(?:readFileSync|writeFileSync)\b|\bfs::(?:read|write|create_dir|remove|copy|rename)\w*|\bFile::(?:open|create)|\bopen\s*\(|\bfopen\s*\(|\bos\.(?:Open|Create|ReadFile|WriteFile|Remove|remove|unlink|mkdir|makedirs)\b|\bshutil\.|\bFiles\.(?:read|write|delete|copy)",
            )
            .ok(),
        ),
        (
            DATABASE_QUERY,
            Regex::new(r"\b(?:db|pool|connection|conn|client|cursor|session)\.(?:query|execute|exec)\w*\s*\(").ok(),
        ),
        (
            GLOBAL_STATE,
            Regex::new(r"\b(?:globalThis|window|localStorage|sessionStorage)\.|\bdocument\.\S+\s*=[^=]|^global\s+\w+|\bstatic\s+mut\b").ok(),
        ),
        (
            ENVIRONMENT,
            Regex::new(
                r"process\.env|process\.cwd|import\.meta\.env|\bos\.environ|\bos\.getenv|\bos\.Getenv|\benv::var|\bstd::env::|System\.getenv|\bgetenv\s*\(",
            )
            .ok(),
        ),
    ]
});

/// Effect categories matched anywhere in the symbol's text, first-seen order.
fn side_effects(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !is_comment_line(l)) {
        for (label, regex) in EFFECTS.iter() {
            if regex.as_ref().is_some_and(|r| r.is_match(line)) {
                found.push(label.to_string());
            }
        }
    }
    dedup(&mut found);
    found
}
