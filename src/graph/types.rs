//! Core types for the fact graph.
//!
//! Two layers live here: the per-file facts produced by the extractors
//! (`Extracted*`, [`FileExtractions`]) and the resolved, unit-wide facts the
//! resolver assembles into the graph ([`Module`], [`Symbol`], [`ImportEdge`],
//! [`CallEdge`]).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::parser::SupportedLanguage;

pub type ModuleId = usize;
pub type SymbolId = usize;
pub type ImportId = usize;
pub type CallId = usize;

/// Source location of a fact. Lines are 1-based; columns and bytes are 0-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_line: usize,
    pub end_line: usize,
    pub start_column: usize,
    pub end_column: usize,
    pub start_byte: usize,
    pub end_byte: usize,
}

// ─── Symbols ────────────────────────────────────────────────

/// The kind of a declared symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Class,
    Variable,
    /// A function whose enclosing declaration is a class.
    Method,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Function => write!(f, "function"),
            SymbolKind::Class => write!(f, "class"),
            SymbolKind::Variable => write!(f, "variable"),
            SymbolKind::Method => write!(f, "method"),
        }
    }
}

/// Visibility derived from the leading-underscore naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    Public,
    /// One leading underscore.
    Private,
    /// Two leading underscores, not a `__dunder__` name.
    NameMangled,
}

impl Visibility {
    pub fn from_name(name: &str) -> Self {
        let dunder = name.len() > 4 && name.starts_with("__") && name.ends_with("__");
        if name.starts_with("__") && !dunder {
            Visibility::NameMangled
        } else if name.starts_with('_') && !dunder {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
            Visibility::NameMangled => write!(f, "name-mangled"),
        }
    }
}

/// One entry of a parameter signature. Default values are never evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub has_default: bool,
    pub variadic_positional: bool,
    pub variadic_keyword: bool,
}

impl Parameter {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            has_default: false,
            variadic_positional: false,
            variadic_keyword: false,
        }
    }
}

/// A decorator or annotation applied to a declaration, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decorator {
    /// Expression text without the leading `@`.
    pub expression: String,
    /// Normalized callee (the decorator name for `@name(..)`).
    pub callee: String,
    /// Applied with call syntax, and therefore also a `decorator-call` edge.
    pub has_call: bool,
}

/// Content-derived facts about one declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolProfile {
    /// SHA-256 of `path:kind:qualified_name:fingerprint`, lowercase hex.
    pub stable_id: String,
    /// SHA-256 of the declaration's header facts and its node-kind skeleton.
    /// Comments and literal values do not contribute.
    pub fingerprint: String,
    /// Visible outside its file under the language's export rule.
    pub exported: bool,
    /// Doc comment or docstring, markers stripped.
    pub doc: Option<String>,
    /// One line: the doc's first sentences, else derived from the name.
    pub summary: String,
    /// Preconditions stated in the doc or guarded in the body.
    pub invariants: Vec<String>,
    /// Effect categories the body appears to perform, e.g. `filesystem`.
    pub side_effects: Vec<String>,
}

/// Where a symbol is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum SymbolScope {
    Module,
    Symbol(SymbolId),
}

/// A named declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub module: ModuleId,
    pub scope: SymbolScope,
    pub visibility: Visibility,
    pub decorators: Vec<Decorator>,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    /// Base classes by name, in declaration order.
    pub bases: Vec<String>,
    /// Directly nested declarations, in declaration order.
    pub children: Vec<SymbolId>,
    pub span: Span,
    #[serde(flatten)]
    pub profile: SymbolProfile,
}

impl Symbol {
    pub fn parent(&self) -> Option<SymbolId> {
        match self.scope {
            SymbolScope::Module => None,
            SymbolScope::Symbol(id) => Some(id),
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.scope == SymbolScope::Module
    }
}

// ─── Modules ────────────────────────────────────────────────

/// One analyzed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    /// Path relative to the analyzed unit's root.
    pub path: PathBuf,
    /// Logical module path segments (`pkg/sub/mod.py` → `pkg`, `sub`, `mod`).
    pub logical_path: Vec<String>,
    /// Relative imports inside a package resolve against the module itself.
    pub is_package: bool,
    pub language: SupportedLanguage,
    /// SHA-256 of the file's text, lowercase hex.
    pub content_hash: String,
    /// Top-level symbols in declaration order.
    pub symbols: Vec<SymbolId>,
}

impl Module {
    /// Dotted logical name, `<root>` for an empty path.
    pub fn logical_name(&self) -> String {
        if self.logical_path.is_empty() {
            "<root>".to_string()
        } else {
            self.logical_path.join(".")
        }
    }
}

// ─── Imports ────────────────────────────────────────────────

/// What an import statement binds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "name")]
pub enum ImportedName {
    /// The whole module.
    Module,
    /// One name from the module.
    Name(String),
    /// Every public name (`*`).
    Wildcard,
}

impl fmt::Display for ImportedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportedName::Module => write!(f, "<module>"),
            ImportedName::Name(name) => write!(f, "{name}"),
            ImportedName::Wildcard => write!(f, "*"),
        }
    }
}

/// Resolution state of an import edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "module")]
pub enum ImportStatus {
    Unresolved,
    Resolved(ModuleId),
    /// Target lies outside the analyzed unit. A normal terminal state.
    External,
}

/// What an import alias refers to after linking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum ImportBinding {
    Module(ModuleId),
    Symbol(SymbolId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEdge {
    pub id: ImportId,
    /// Importing module.
    pub module: ModuleId,
    /// Target module path as written (may be relative).
    pub target: String,
    pub name: ImportedName,
    /// Local binding; defaults to the imported name.
    pub alias: String,
    /// 0 = absolute, 1 = `.`, 2 = `..`, ...
    pub depth: usize,
    pub status: ImportStatus,
    pub binding: Option<ImportBinding>,
    /// Set on edges synthesized from a wildcard import.
    pub expanded_from: Option<ImportId>,
    pub span: Span,
}

impl ImportEdge {
    pub fn is_wildcard(&self) -> bool {
        self.name == ImportedName::Wildcard
    }

    pub fn is_external(&self) -> bool {
        self.status == ImportStatus::External
    }

    /// A wildcard whose target lies outside the unit and so could not be expanded.
    pub fn is_unexpandable(&self) -> bool {
        self.is_wildcard() && self.is_external()
    }

    pub fn is_synthetic(&self) -> bool {
        self.expanded_from.is_some()
    }
}

// ─── Calls ──────────────────────────────────────────────────

/// Closed set of call kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallKind {
    /// `name(..)`
    Direct,
    /// `expr.name(..)` where `expr` is not a call.
    Method,
    /// `expr.a().b()`: the receiver is another call's result.
    Chained,
    /// `Class.name(..)` or `module.name(..)`, decided by receiver binding.
    Static,
    /// Instantiation of a known class, or an explicit `new`.
    Constructor,
    /// Call on a literal value (`"x".upper()`).
    LiteralReceiver,
    /// Call syntax in decorator position.
    DecoratorCall,
    /// Callee is a language builtin.
    Builtin,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallKind::Direct => write!(f, "direct"),
            CallKind::Method => write!(f, "method"),
            CallKind::Chained => write!(f, "chained"),
            CallKind::Static => write!(f, "static"),
            CallKind::Constructor => write!(f, "constructor"),
            CallKind::LiteralReceiver => write!(f, "literal-receiver"),
            CallKind::DecoratorCall => write!(f, "decorator-call"),
            CallKind::Builtin => write!(f, "builtin"),
        }
    }
}

/// Shape of the argument list. Unpacked arguments are flagged, never expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArgumentShape {
    pub positional: usize,
    pub star: bool,
    pub double_star: bool,
    pub named: Vec<String>,
}

/// Resolution state of a call edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "target")]
pub enum CallTarget {
    Unresolved,
    Symbol(SymbolId),
    /// Synthetic builtin symbol.
    Builtin(String),
    /// Bound through an import whose target lies outside the unit.
    External(String),
}

impl CallTarget {
    pub fn is_resolved(&self) -> bool {
        matches!(self, CallTarget::Symbol(_) | CallTarget::Builtin(_))
    }

    pub fn symbol(&self) -> Option<SymbolId> {
        match self {
            CallTarget::Symbol(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdge {
    pub id: CallId,
    pub module: ModuleId,
    /// Enclosing named symbol; `None` means module scope.
    pub caller: Option<SymbolId>,
    /// Normalized callee text, e.g. `obj.method1().method2`.
    pub callee: String,
    /// Final segment of the callee.
    pub name: String,
    pub receiver: Option<String>,
    pub kind: CallKind,
    pub arguments: ArgumentShape,
    pub target: CallTarget,
    /// For decorator calls: the decorated symbol.
    pub decorates: Option<SymbolId>,
    pub span: Span,
}

// ─── Diagnostics & stats ────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// Several equally ranked candidates; the first was taken.
    AmbiguousResolution,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub module: ModuleId,
    pub detail: String,
}

/// Counters describing one resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionStats {
    pub modules: usize,
    pub symbols: usize,
    pub imports: usize,
    pub imports_resolved: usize,
    pub imports_external: usize,
    pub wildcards_expanded: usize,
    pub unexpandable_wildcards: usize,
    pub synthetic_imports: usize,
    pub calls: usize,
    pub calls_resolved: usize,
    pub calls_builtin: usize,
    pub calls_external: usize,
    pub calls_unresolved: usize,
    pub calls_by_kind: BTreeMap<CallKind, usize>,
    pub ambiguous: usize,
}

// ─── Per-file extraction facts ──────────────────────────────

/// A symbol as found in one file. Indices refer to the file's own symbol list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub parent: Option<usize>,
    pub visibility: Visibility,
    pub decorators: Vec<Decorator>,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub bases: Vec<String>,
    /// Owner type named outside the declaration (Rust impl, Go receiver, C++ `Owner::`).
    pub owner: Option<String>,
    /// Name bound to the instance inside a Go method (`func (c *T)` → `c`).
    pub receiver_name: Option<String>,
    pub span: Span,
    pub profile: SymbolProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedImport {
    pub target: String,
    pub name: ImportedName,
    pub alias: String,
    pub depth: usize,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedCall {
    pub callee: String,
    pub name: String,
    pub receiver: Option<String>,
    /// Syntactic kind; the resolver may refine it.
    pub kind: CallKind,
    /// Index into the file's symbols; `None` means module scope.
    pub caller: Option<usize>,
    pub arguments: ArgumentShape,
    pub decorates: Option<usize>,
    pub span: Span,
}

/// Everything extracted from one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileExtractions {
    pub file_path: PathBuf,
    pub language: SupportedLanguage,
    pub content_hash: String,
    pub symbols: Vec<ExtractedSymbol>,
    pub imports: Vec<ExtractedImport>,
    pub calls: Vec<ExtractedCall>,
}

impl FileExtractions {
    pub fn calls_of_kind(&self, kind: CallKind) -> usize {
        self.calls.iter().filter(|c| c.kind == kind).count()
    }

    pub fn symbols_of_kind(&self, kind: SymbolKind) -> usize {
        self.symbols.iter().filter(|s| s.kind == kind).count()
    }
}

// ─── Per-file failures ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum FailureKind {
    Parse { offset: usize },
    Read,
    Unsupported,
}

/// A file that was skipped. The run carries on without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_from_name() {
        assert_eq!(Visibility::from_name("calculate_sum"), Visibility::Public);
        assert_eq!(Visibility::from_name("_internal_helper"), Visibility::Private);
        assert_eq!(Visibility::from_name("__very_private"), Visibility::NameMangled);
        assert_eq!(
            Visibility::from_name("__init__"),
            Visibility::Public,
            "dunder names are not mangled"
        );
        assert_eq!(Visibility::from_name("_"), Visibility::Private);
    }

    #[test]
    fn test_call_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&CallKind::LiteralReceiver).unwrap();
        assert_eq!(json, "\"literal-receiver\"");
        assert_eq!(CallKind::DecoratorCall.to_string(), "decorator-call");
    }

    #[test]
    fn test_unexpandable_only_for_external_wildcards() {
        let mut edge = ImportEdge {
            id: 0,
            module: 0,
            target: "math".to_string(),
            name: ImportedName::Wildcard,
            alias: "*".to_string(),
            depth: 0,
            status: ImportStatus::External,
            binding: None,
            expanded_from: None,
            span: Span::default(),
        };
        assert!(edge.is_unexpandable());
        edge.status = ImportStatus::Resolved(3);
        assert!(!edge.is_unexpandable());
    }
}
