//
//  resolver.rs
//  Factgraph
//

//! Resolver / graph assembler.
//!
//! A three-phase state machine over one analyzed unit: collect every file's
//! facts, link import edges to modules, then link call edges to symbols.
//! Each phase runs once, in order; `finish` freezes the result into a
//! [`CodeGraph`]. Unresolved and external edges are normal outcomes.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::engine::CodeGraph;
use super::paths::{ends_with, logical_path, relative_base, target_segments};
use super::types::*;
use crate::config::ResolutionConfig;
use crate::error::{FactgraphError, Result};
use crate::parser::{grammar_for, Grammar, SupportedLanguage};

/// Resolver progress. Each phase names the work already done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Pending,
    Collected,
    ImportsLinked,
    CallsLinked,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Pending => write!(f, "pending"),
            Phase::Collected => write!(f, "collected"),
            Phase::ImportsLinked => write!(f, "imports-linked"),
            Phase::CallsLinked => write!(f, "calls-linked"),
        }
    }
}

/// What a name or dotted path refers to during call linking.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Binding {
    Symbol(SymbolId),
    Module(ModuleId),
    External(String),
    Builtin(String),
    Unknown,
}

pub struct Resolver {
    phase: Phase,
    config: ResolutionConfig,
    modules: Vec<Module>,
    symbols: Vec<Symbol>,
    /// Go receiver names, indexed by symbol id.
    receiver_names: Vec<Option<String>>,
    imports: Vec<ImportEdge>,
    calls: Vec<CallEdge>,
    diagnostics: Vec<Diagnostic>,
    /// Per module: import alias → first edge binding it.
    aliases: Vec<HashMap<String, ImportId>>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self::with_config(ResolutionConfig::default())
    }

    pub fn with_config(config: ResolutionConfig) -> Self {
        Self {
            phase: Phase::Pending,
            config,
            modules: Vec::new(),
            symbols: Vec::new(),
            receiver_names: Vec::new(),
            imports: Vec::new(),
            calls: Vec::new(),
            diagnostics: Vec::new(),
            aliases: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run all three phases and freeze the graph.
    pub fn resolve(mut self, files: Vec<FileExtractions>) -> Result<CodeGraph> {
        self.collect(files)?;
        self.link_imports()?;
        self.link_calls()?;
        self.finish()
    }

    fn require(&self, expected: Phase) -> Result<()> {
        if self.phase != expected {
            return Err(FactgraphError::PhaseOrder {
                expected,
                found: self.phase,
            });
        }
        Ok(())
    }

    // ─── Phase 1: collect ───────────────────────────────────

    /// Gather every file's facts, unresolved, under dense ids.
    /// Files are ordered by path; a repeated path keeps its first facts.
    pub fn collect(&mut self, mut files: Vec<FileExtractions>) -> Result<()> {
        self.require(Phase::Pending)?;
        if files.is_empty() {
            return Err(FactgraphError::EmptyUnit);
        }
        files.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        files.dedup_by(|later, earlier| later.file_path == earlier.file_path);

        for file in files {
            let module_id = self.modules.len();
            let (logical, is_package) = logical_path(&file.file_path, file.language);
            let base = self.symbols.len();

            let mut top_level = Vec::new();
            for (idx, symbol) in file.symbols.into_iter().enumerate() {
                let id = base + idx;
                let scope = match symbol.parent {
                    Some(parent) => SymbolScope::Symbol(base + parent),
                    None => {
                        top_level.push(id);
                        SymbolScope::Module
                    }
                };
                self.receiver_names.push(symbol.receiver_name);
                self.symbols.push(Symbol {
                    id,
                    name: symbol.name,
                    kind: symbol.kind,
                    module: module_id,
                    scope,
                    visibility: symbol.visibility,
                    decorators: symbol.decorators,
                    parameters: symbol.parameters,
                    return_type: symbol.return_type,
                    bases: symbol.bases,
                    children: Vec::new(),
                    span: symbol.span,
                    profile: symbol.profile,
                });
            }
            for id in base..self.symbols.len() {
                if let Some(parent) = self.symbols[id].parent() {
                    self.symbols[parent].children.push(id);
                }
            }

            for import in file.imports {
                self.imports.push(ImportEdge {
                    id: self.imports.len(),
                    module: module_id,
                    target: import.target,
                    name: import.name,
                    alias: import.alias,
                    depth: import.depth,
                    status: ImportStatus::Unresolved,
                    binding: None,
                    expanded_from: None,
                    span: import.span,
                });
            }
            for call in file.calls {
                self.calls.push(CallEdge {
                    id: self.calls.len(),
                    module: module_id,
                    caller: call.caller.map(|c| base + c),
                    callee: call.callee,
                    name: call.name,
                    receiver: call.receiver,
                    kind: call.kind,
                    arguments: call.arguments,
                    target: CallTarget::Unresolved,
                    decorates: call.decorates.map(|d| base + d),
                    span: call.span,
                });
            }

            self.modules.push(Module {
                id: module_id,
                path: file.file_path,
                logical_path: logical,
                is_package,
                language: file.language,
                content_hash: file.content_hash,
                symbols: top_level,
            });
        }

        debug!(
            modules = self.modules.len(),
            symbols = self.symbols.len(),
            imports = self.imports.len(),
            calls = self.calls.len(),
            "collected facts"
        );
        self.phase = Phase::Collected;
        Ok(())
    }

    // ─── Phase 2: link imports ──────────────────────────────

    /// One pass per edge; cycles are representable but never chased.
    pub fn link_imports(&mut self) -> Result<()> {
        self.require(Phase::Collected)?;
        let written = self.imports.len();
        for id in 0..written {
            let (status, binding) = self.link_import(id);
            self.imports[id].status = status;
            self.imports[id].binding = binding;
            if let (ImportStatus::Resolved(target), true) = (status, self.imports[id].is_wildcard()) {
                self.expand_wildcard(id, target);
            }
        }
        debug!(
            imports = written,
            synthetic = self.imports.len() - written,
            "linked imports"
        );
        self.phase = Phase::ImportsLinked;
        Ok(())
    }

    fn link_import(&mut self, id: ImportId) -> (ImportStatus, Option<ImportBinding>) {
        let edge = self.imports[id].clone();
        let lang = self.modules[edge.module].language;
        let segments = target_segments(&edge.target, lang);
        let found = self.locate_module(edge.module, edge.depth, &segments);

        match (&edge.name, found) {
            (ImportedName::Module, Some(m)) => (ImportStatus::Resolved(m), Some(ImportBinding::Module(m))),
            (ImportedName::Wildcard, Some(m)) => (ImportStatus::Resolved(m), None),
            (ImportedName::Name(name), Some(m)) => {
                if let Some(&symbol) = self.top_level_named(m, name).first() {
                    return (ImportStatus::Resolved(m), Some(ImportBinding::Symbol(symbol)));
                }
                match self.submodule(m, name) {
                    Some(sub) => (ImportStatus::Resolved(sub), Some(ImportBinding::Module(sub))),
                    None => (ImportStatus::Resolved(m), None),
                }
            }
            // `from pkg import submodule` where `pkg` itself is not a file.
            (ImportedName::Name(name), None) => {
                let mut extended = segments.clone();
                extended.push(name.clone());
                match self.locate_module(edge.module, edge.depth, &extended) {
                    Some(sub) => (ImportStatus::Resolved(sub), Some(ImportBinding::Module(sub))),
                    None => (ImportStatus::External, None),
                }
            }
            (_, None) => (ImportStatus::External, None),
        }
    }

    /// One synthetic edge per public top-level symbol of the target.
    fn expand_wildcard(&mut self, id: ImportId, target: ModuleId) {
        let edge = self.imports[id].clone();
        for symbol in self.package_top_level(target) {
            let (name, visibility, module) = {
                let s = &self.symbols[symbol];
                (s.name.clone(), s.visibility, s.module)
            };
            if !visibility.is_public() {
                continue;
            }
            self.imports.push(ImportEdge {
                id: self.imports.len(),
                module: edge.module,
                target: edge.target.clone(),
                name: ImportedName::Name(name.clone()),
                alias: name,
                depth: edge.depth,
                status: ImportStatus::Resolved(module),
                binding: Some(ImportBinding::Symbol(symbol)),
                expanded_from: Some(id),
                span: edge.span,
            });
        }
    }

    /// Segments a module answers to: its package directory for Go, else its logical path.
    fn module_key(&self, id: ModuleId) -> &[String] {
        let module = &self.modules[id];
        match module.language {
            SupportedLanguage::Go => {
                let len = module.logical_path.len().saturating_sub(1);
                &module.logical_path[..len]
            }
            _ => &module.logical_path,
        }
    }

    fn locate_module(&mut self, from: ModuleId, depth: usize, segments: &[String]) -> Option<ModuleId> {
        let origin = &self.modules[from];
        let lang = origin.language;
        if depth > 0 {
            let found = relative_base(&origin.logical_path, origin.is_package, depth).and_then(|mut full| {
                full.extend(segments.iter().cloned());
                let exact = self.candidates(lang, |key| key == full.as_slice());
                self.pick_module(from, &segments.join("/"), exact)
            });
            // Quoted includes fall back to the include search path.
            if found.is_some() || !matches!(lang, SupportedLanguage::C | SupportedLanguage::Cpp) {
                return found;
            }
        }
        if segments.is_empty() {
            return None;
        }
        let exact = self.candidates(lang, |key| key == segments);
        if !exact.is_empty() {
            return self.pick_module(from, &segments.join("."), exact);
        }
        let suffix = self.candidates(lang, |key| ends_with(key, segments));
        self.pick_module(from, &segments.join("."), suffix)
    }

    fn candidates(&self, lang: SupportedLanguage, matches: impl Fn(&[String]) -> bool) -> Vec<ModuleId> {
        (0..self.modules.len())
            .filter(|&id| self.modules[id].language.same_ecosystem(&lang))
            .filter(|&id| matches(self.module_key(id)))
            .collect()
    }

    /// First candidate; distinct keys mean the match was ambiguous.
    fn pick_module(&mut self, from: ModuleId, what: &str, found: Vec<ModuleId>) -> Option<ModuleId> {
        let first = *found.first()?;
        let distinct: HashSet<&[String]> = found.iter().map(|&id| self.module_key(id)).collect();
        if distinct.len() > 1 {
            let detail = format!("module '{what}' matches {} modules", distinct.len());
            self.diagnose(from, detail);
        }
        Some(first)
    }

    fn submodule(&self, module: ModuleId, name: &str) -> Option<ModuleId> {
        let lang = self.modules[module].language;
        let mut full = self.modules[module].logical_path.clone();
        full.push(name.to_string());
        self.candidates(lang, |key| key == full.as_slice()).first().copied()
    }

    /// Top-level symbols visible in a module; a Go package shares them across files.
    fn package_top_level(&self, module: ModuleId) -> Vec<SymbolId> {
        if self.modules[module].language != SupportedLanguage::Go {
            return self.modules[module].symbols.clone();
        }
        let key = self.module_key(module);
        self.modules
            .iter()
            .filter(|m| m.language == SupportedLanguage::Go && self.module_key(m.id) == key)
            .flat_map(|m| m.symbols.iter().copied())
            .collect()
    }

    fn top_level_named(&self, module: ModuleId, name: &str) -> Vec<SymbolId> {
        self.package_top_level(module)
            .into_iter()
            .filter(|&id| self.symbols[id].name == name)
            .collect()
    }

    fn diagnose(&mut self, module: ModuleId, detail: String) {
        self.diagnostics.push(Diagnostic {
            kind: DiagnosticKind::AmbiguousResolution,
            module,
            detail,
        });
    }

    // ─── Phase 3: link calls ────────────────────────────────

    pub fn link_calls(&mut self) -> Result<()> {
        self.require(Phase::ImportsLinked)?;
        self.aliases = vec![HashMap::new(); self.modules.len()];
        for edge in &self.imports {
            if !edge.is_wildcard() {
                self.aliases[edge.module]
                    .entry(edge.alias.clone())
                    .or_insert(edge.id);
            }
        }

        for id in 0..self.calls.len() {
            let (kind, target) = self.link_call(id);
            self.calls[id].kind = kind;
            self.calls[id].target = target;
        }
        debug!(calls = self.calls.len(), "linked calls");
        self.phase = Phase::CallsLinked;
        Ok(())
    }

    fn grammar(&self, module: ModuleId) -> &'static Grammar {
        grammar_for(self.modules[module].language)
    }

    fn is_builtin(&self, module: ModuleId, name: &str) -> bool {
        self.grammar(module).is_builtin(name) || self.config.extra_builtins.iter().any(|b| b == name)
    }

    fn is_class(&self, id: SymbolId) -> bool {
        self.symbols[id].kind == SymbolKind::Class
    }

    fn link_call(&mut self, id: CallId) -> (CallKind, CallTarget) {
        let call = self.calls[id].clone();
        match call.kind {
            CallKind::Direct => self.link_direct(&call),
            CallKind::Method => self.link_member(&call),
            CallKind::Constructor => (CallKind::Constructor, self.link_constructor(&call)),
            CallKind::DecoratorCall => {
                let (_, target) = if call.receiver.is_some() {
                    self.link_member(&call)
                } else {
                    self.link_direct(&call)
                };
                (CallKind::DecoratorCall, target)
            }
            CallKind::LiteralReceiver if self.is_builtin(call.module, &call.name) => {
                (CallKind::LiteralReceiver, CallTarget::Builtin(call.name))
            }
            kind => (kind, CallTarget::Unresolved),
        }
    }

    fn link_direct(&mut self, call: &CallEdge) -> (CallKind, CallTarget) {
        match self.lookup_name(call.module, call.caller, &call.callee) {
            Binding::Symbol(id) if self.is_class(id) => {
                let target = self.initializer(id).unwrap_or(id);
                (CallKind::Constructor, CallTarget::Symbol(target))
            }
            Binding::Symbol(id) => (call.kind, CallTarget::Symbol(id)),
            Binding::External(name) => (call.kind, CallTarget::External(name)),
            Binding::Builtin(name) => (CallKind::Builtin, CallTarget::Builtin(name)),
            Binding::Module(_) | Binding::Unknown => (call.kind, CallTarget::Unresolved),
        }
    }

    fn link_member(&mut self, call: &CallEdge) -> (CallKind, CallTarget) {
        let Some(receiver) = call.receiver.as_deref() else {
            return self.link_direct(call);
        };
        let grammar = self.grammar(call.module);
        let as_target = |found: Option<SymbolId>| found.map_or(CallTarget::Unresolved, CallTarget::Symbol);

        if grammar.is_super_receiver(receiver) {
            let found = self
                .enclosing_class(call.caller)
                .and_then(|class| self.inherited_member(class, &call.name));
            return (CallKind::Method, as_target(found));
        }
        if grammar.is_self_receiver(receiver) || self.is_go_receiver(call.caller, receiver) {
            let found = self
                .enclosing_class(call.caller)
                .and_then(|class| self.member(class, &call.name));
            return (CallKind::Method, as_target(found));
        }

        match self.lookup_path(call.module, call.caller, receiver) {
            Binding::Symbol(id) if self.is_class(id) => {
                (CallKind::Static, as_target(self.member(id, &call.name)))
            }
            Binding::Symbol(_) => (CallKind::Method, CallTarget::Unresolved),
            Binding::Module(module) => match self.top_level_named(module, &call.name).first() {
                Some(&id) if self.is_class(id) => {
                    let target = self.initializer(id).unwrap_or(id);
                    (CallKind::Constructor, CallTarget::Symbol(target))
                }
                Some(&id) => (CallKind::Static, CallTarget::Symbol(id)),
                None => (CallKind::Static, CallTarget::Unresolved),
            },
            Binding::External(prefix) => {
                let name = format!("{prefix}{}{}", grammar.separator, call.name);
                (CallKind::Static, CallTarget::External(name))
            }
            Binding::Builtin(_) | Binding::Unknown => {
                if self.is_builtin(call.module, &call.callee) {
                    (CallKind::Builtin, CallTarget::Builtin(call.callee.clone()))
                } else {
                    (CallKind::Method, CallTarget::Unresolved)
                }
            }
        }
    }

    fn link_constructor(&mut self, call: &CallEdge) -> CallTarget {
        let grammar = self.grammar(call.module);
        let class = if grammar.is_self_receiver(&call.callee) {
            self.enclosing_class(call.caller)
        } else if grammar.is_super_receiver(&call.callee) {
            self.enclosing_class(call.caller)
                .and_then(|class| self.base_classes(class).first().copied())
        } else {
            match self.lookup_path(call.module, call.caller, &call.callee) {
                Binding::Symbol(id) if self.is_class(id) => Some(id),
                Binding::External(name) => return CallTarget::External(name),
                _ => None,
            }
        };
        match class {
            Some(class) => CallTarget::Symbol(self.initializer(class).unwrap_or(class)),
            None => CallTarget::Unresolved,
        }
    }

    // ─── Lookup ─────────────────────────────────────────────

    /// Enclosing declarations (innermost first, with inherited members of
    /// enclosing classes), then the module's top level.
    fn lookup_local(&mut self, module: ModuleId, caller: Option<SymbolId>, name: &str) -> Option<SymbolId> {
        let mut scope = caller;
        while let Some(current) = scope {
            let hits: Vec<SymbolId> = self.symbols[current]
                .children
                .iter()
                .copied()
                .filter(|&child| self.symbols[child].name == name)
                .collect();
            if let Some(hit) = self.pick_symbol(module, name, hits) {
                return Some(hit);
            }
            if self.is_class(current) {
                if let Some(hit) = self.inherited_member(current, name) {
                    return Some(hit);
                }
            }
            scope = self.symbols[current].parent();
        }
        let hits = self.top_level_named(module, name);
        self.pick_symbol(module, name, hits)
    }

    fn pick_symbol(&mut self, module: ModuleId, name: &str, hits: Vec<SymbolId>) -> Option<SymbolId> {
        let first = *hits.first()?;
        if hits.len() > 1 {
            self.diagnose(module, format!("'{name}' matches {} declarations in one scope", hits.len()));
        }
        Some(first)
    }

    fn alias_binding(&self, module: ModuleId, alias: &str) -> Option<Binding> {
        let &id = self.aliases[module].get(alias)?;
        let edge = &self.imports[id];
        Some(match (edge.status, edge.binding) {
            (_, Some(ImportBinding::Symbol(symbol))) => Binding::Symbol(symbol),
            (_, Some(ImportBinding::Module(module))) => Binding::Module(module),
            (ImportStatus::External, None) => Binding::External(self.external_name(edge)),
            _ => Binding::Unknown,
        })
    }

    fn external_name(&self, edge: &ImportEdge) -> String {
        match &edge.name {
            ImportedName::Name(name) => {
                format!("{}{}{}", edge.target, self.grammar(edge.module).separator, name)
            }
            ImportedName::Module | ImportedName::Wildcard => edge.target.clone(),
        }
    }

    /// Full precedence search for a bare name.
    fn lookup_name(&mut self, module: ModuleId, caller: Option<SymbolId>, name: &str) -> Binding {
        if let Some(id) = self.lookup_local(module, caller, name) {
            return Binding::Symbol(id);
        }
        if let Some(binding) = self.alias_binding(module, name) {
            return binding;
        }
        if self.is_builtin(module, name) {
            return Binding::Builtin(name.to_string());
        }
        Binding::Unknown
    }

    /// Resolve a dotted / scoped receiver path such as `pkg.mod.Class`.
    fn lookup_path(&mut self, module: ModuleId, caller: Option<SymbolId>, path: &str) -> Binding {
        let segments = split_path(path);
        if segments.is_empty()
            || segments
                .iter()
                .any(|s| s.contains(['(', ')', '<', '[', ' ', '"', '\'']))
        {
            return Binding::Unknown;
        }

        let (mut binding, consumed) = match self.lookup_local(module, caller, segments[0]) {
            Some(id) => (Binding::Symbol(id), 1),
            None => match self.longest_alias(module, &segments) {
                Some(found) => found,
                None if self.is_builtin(module, segments[0]) => {
                    return Binding::Builtin(segments[0].to_string())
                }
                None => return Binding::Unknown,
            },
        };

        let separator = self.grammar(module).separator;
        for segment in &segments[consumed..] {
            binding = match binding {
                Binding::Symbol(id) if self.is_class(id) => match self.member(id, segment) {
                    Some(member) => Binding::Symbol(member),
                    None => return Binding::Unknown,
                },
                Binding::Module(m) => {
                    if let Some(sub) = self.submodule(m, segment) {
                        Binding::Module(sub)
                    } else if let Some(&id) = self.top_level_named(m, segment).first() {
                        Binding::Symbol(id)
                    } else {
                        return Binding::Unknown;
                    }
                }
                Binding::External(prefix) => Binding::External(format!("{prefix}{separator}{segment}")),
                _ => return Binding::Unknown,
            };
        }
        binding
    }

    /// The longest leading run of `segments` bound by an import alias.
    fn longest_alias(&self, module: ModuleId, segments: &[&str]) -> Option<(Binding, usize)> {
        let separator = self.grammar(module).separator;
        (1..=segments.len()).rev().find_map(|len| {
            let key = segments[..len].join(separator);
            self.alias_binding(module, &key).map(|binding| (binding, len))
        })
    }

    fn enclosing_class(&self, caller: Option<SymbolId>) -> Option<SymbolId> {
        let mut scope = caller;
        while let Some(current) = scope {
            if self.is_class(current) {
                return Some(current);
            }
            scope = self.symbols[current].parent();
        }
        None
    }

    /// Whether `receiver` is the receiver bound by an enclosing Go method.
    fn is_go_receiver(&self, caller: Option<SymbolId>, receiver: &str) -> bool {
        let mut scope = caller;
        while let Some(current) = scope {
            if self.receiver_names[current].as_deref() == Some(receiver) {
                return true;
            }
            scope = self.symbols[current].parent();
        }
        false
    }

    // ─── Classes ────────────────────────────────────────────

    /// A member declared on `class` or inherited from its bases.
    fn member(&self, class: SymbolId, name: &str) -> Option<SymbolId> {
        self.child_named(class, name)
            .or_else(|| self.inherited_member(class, name))
    }

    /// Depth-first walk of the named bases, guarded against cycles.
    fn inherited_member(&self, class: SymbolId, name: &str) -> Option<SymbolId> {
        if !self.config.walk_bases {
            return None;
        }
        let mut visited = HashSet::from([class]);
        let mut stack: Vec<SymbolId> = self.base_classes(class).into_iter().rev().collect();
        while let Some(base) = stack.pop() {
            if !visited.insert(base) {
                continue;
            }
            let hit = self.child_named(base, name);
            if hit.is_some() {
                return hit;
            }
            stack.extend(self.base_classes(base).into_iter().rev());
        }
        None
    }

    /// Base classes declared inside the unit. External bases end the walk.
    fn base_classes(&self, class: SymbolId) -> Vec<SymbolId> {
        let symbol = &self.symbols[class];
        let (module, scope, bases) = (symbol.module, symbol.parent(), symbol.bases.clone());
        bases
            .iter()
            .filter_map(|base| self.lookup_base(module, scope, base))
            .filter(|&id| id != class && self.is_class(id))
            .collect()
    }

    /// Resolve a base-class name such as `Base` or `models.Base`. Members are
    /// looked up without inheritance so the walk never recurses.
    fn lookup_base(&self, module: ModuleId, scope: Option<SymbolId>, path: &str) -> Option<SymbolId> {
        let segments = split_path(path);
        let first = *segments.first()?;

        let mut local = None;
        let mut current = scope;
        while let (Some(s), None) = (current, local) {
            local = self.child_named(s, first);
            current = self.symbols[s].parent();
        }
        let local = local.or_else(|| self.top_level_named(module, first).first().copied());

        let (mut binding, consumed) = match local {
            Some(id) => (Binding::Symbol(id), 1),
            None => self.longest_alias(module, &segments)?,
        };
        for segment in &segments[consumed..] {
            binding = match binding {
                Binding::Symbol(id) if self.is_class(id) => Binding::Symbol(self.child_named(id, segment)?),
                Binding::Module(m) => match self.submodule(m, segment) {
                    Some(sub) => Binding::Module(sub),
                    None => Binding::Symbol(*self.top_level_named(m, segment).first()?),
                },
                _ => return None,
            };
        }
        match binding {
            Binding::Symbol(id) => Some(id),
            _ => None,
        }
    }

    fn child_named(&self, parent: SymbolId, name: &str) -> Option<SymbolId> {
        self.symbols[parent]
            .children
            .iter()
            .copied()
            .find(|&child| self.symbols[child].name == name)
    }

    /// The initializer of `class`: a language initializer name, or a method
    /// named after the class where that is the convention.
    fn initializer(&self, class: SymbolId) -> Option<SymbolId> {
        let grammar = self.grammar(self.symbols[class].module);
        let mut names: Vec<String> = grammar.initializers.iter().map(|s| s.to_string()).collect();
        if grammar.class_named_initializer {
            names.push(self.symbols[class].name.clone());
        }
        for name in names {
            if let Some(found) = self.member(class, &name) {
                if matches!(self.symbols[found].kind, SymbolKind::Method | SymbolKind::Function) {
                    return Some(found);
                }
            }
        }
        None
    }

    // ─── Freeze ─────────────────────────────────────────────

    /// Freeze the linked facts into a [`CodeGraph`].
    pub fn finish(self) -> Result<CodeGraph> {
        self.require(Phase::CallsLinked)?;
        let stats = self.stats();
        info!(
            modules = stats.modules,
            symbols = stats.symbols,
            imports_external = stats.imports_external,
            calls_resolved = stats.calls_resolved,
            calls_unresolved = stats.calls_unresolved,
            ambiguous = stats.ambiguous,
            "resolution complete"
        );
        Ok(CodeGraph::assemble(
            self.modules,
            self.symbols,
            self.imports,
            self.calls,
            self.diagnostics,
            stats,
        ))
    }

    fn stats(&self) -> ResolutionStats {
        let mut stats = ResolutionStats {
            modules: self.modules.len(),
            symbols: self.symbols.len(),
            imports: self.imports.len(),
            calls: self.calls.len(),
            ambiguous: self.diagnostics.len(),
            ..ResolutionStats::default()
        };
        for edge in &self.imports {
            match edge.status {
                ImportStatus::Resolved(_) => stats.imports_resolved += 1,
                ImportStatus::External => stats.imports_external += 1,
                ImportStatus::Unresolved => {}
            }
            if edge.is_synthetic() {
                stats.synthetic_imports += 1;
            } else if edge.is_wildcard() && !edge.is_external() {
                stats.wildcards_expanded += 1;
            }
            if edge.is_unexpandable() {
                stats.unexpandable_wildcards += 1;
            }
        }
        for call in &self.calls {
            *stats.calls_by_kind.entry(call.kind).or_insert(0) += 1;
            match call.target {
                CallTarget::Symbol(_) => stats.calls_resolved += 1,
                CallTarget::Builtin(_) => stats.calls_builtin += 1,
                CallTarget::External(_) => stats.calls_external += 1,
                CallTarget::Unresolved => stats.calls_unresolved += 1,
            }
        }
        stats
    }
}

/// Split a receiver path on `.`, `::` and `->`.
fn split_path(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut rest = path;
    loop {
        let next = [".", "::", "->"]
            .iter()
            .filter_map(|sep| rest.find(sep).map(|pos| (pos, sep.len())))
            .min();
        match next {
            Some((pos, len)) => {
                segments.push(&rest[..pos]);
                rest = &rest[pos + len..];
            }
            None => {
                segments.push(rest);
                break;
            }
        }
    }
    segments.retain(|s| !s.is_empty());
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::extract_source;
    use std::path::Path;

    fn facts(files: &[(&str, &str)]) -> Vec<FileExtractions> {
        files
            .iter()
            .map(|(path, src)| {
                let path = Path::new(path);
                let lang = SupportedLanguage::from_path(path).unwrap();
                extract_source(path, src, lang).unwrap()
            })
            .collect()
    }

    fn resolve(files: &[(&str, &str)]) -> CodeGraph {
        Resolver::new().resolve(facts(files)).unwrap()
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("a.b.c"), vec!["a", "b", "c"]);
        assert_eq!(split_path("std::fs"), vec!["std", "fs"]);
        assert_eq!(split_path("node->next"), vec!["node", "next"]);
    }

    #[test]
    fn test_phase_order_enforced() {
        let mut resolver = Resolver::new();
        let err = resolver.link_calls().err().unwrap();
        assert!(matches!(
            err,
            FactgraphError::PhaseOrder {
                expected: Phase::ImportsLinked,
                found: Phase::Pending
            }
        ));
        resolver.collect(facts(&[("a.py", "x = 1\n")])).unwrap();
        assert!(resolver.collect(facts(&[("b.py", "y = 1\n")])).is_err(), "collect runs once");
        assert_eq!(resolver.phase(), Phase::Collected);
        let err = resolver.finish().err().unwrap();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_unit_is_fatal() {
        let err = Resolver::new().resolve(Vec::new()).err().unwrap();
        assert!(matches!(err, FactgraphError::EmptyUnit));
    }

    #[test]
    fn test_relative_import_binds_symbol() {
        let graph = resolve(&[
            ("pkg/__init__.py", ""),
            ("pkg/util.py", "def helper():\n    pass\n"),
            ("pkg/main.py", "from .util import helper\n\ndef run():\n    helper()\n"),
        ]);
        let edge = &graph.imports()[0];
        assert!(matches!(edge.status, ImportStatus::Resolved(_)));
        let helper = graph.find_symbols("helper")[0].id;
        assert_eq!(edge.binding, Some(ImportBinding::Symbol(helper)));
        let call = &graph.calls()[0];
        assert_eq!(call.target, CallTarget::Symbol(helper));
        assert_eq!(call.kind, CallKind::Direct);
    }

    #[test]
    fn test_relative_import_above_root_is_external() {
        let graph = resolve(&[("pkg/mod.py", "from ... import far\n")]);
        assert!(graph.imports()[0].is_external());
    }

    #[test]
    fn test_wildcard_expansion_public_only() {
        let graph = resolve(&[
            ("shapes.py", "class Circle:\n    pass\n\ndef area():\n    pass\n\ndef _hidden():\n    pass\n"),
            ("app.py", "from shapes import *\n\nc = Circle()\n"),
        ]);
        let synthetic: Vec<_> = graph.imports().iter().filter(|e| e.is_synthetic()).collect();
        let names: Vec<String> = synthetic.iter().map(|e| e.alias.clone()).collect();
        assert_eq!(names, vec!["Circle".to_string(), "area".to_string()]);
        let ctor = graph.calls().iter().find(|c| c.name == "Circle").unwrap();
        assert_eq!(ctor.kind, CallKind::Constructor);
        assert_eq!(graph.stats().wildcards_expanded, 1);
        assert_eq!(graph.stats().synthetic_imports, 2);
    }

    #[test]
    fn test_constructor_targets_inherited_initializer() {
        let src = "class Base:\n    def __init__(self):\n        pass\n\nclass Child(Base):\n    def run(self):\n        self.helper()\n\n    def helper(self):\n        pass\n\nobj = Child()\n";
        let graph = resolve(&[("m.py", src)]);
        let init = graph.find_symbols("__init__")[0].id;
        let ctor = graph.calls().iter().find(|c| c.name == "Child").unwrap();
        assert_eq!(ctor.kind, CallKind::Constructor);
        assert_eq!(ctor.target, CallTarget::Symbol(init));
        let helper = graph.find_symbols("helper")[0].id;
        let call = graph.calls().iter().find(|c| c.name == "helper").unwrap();
        assert_eq!(call.target, CallTarget::Symbol(helper));
    }

    #[test]
    fn test_python_super_call_targets_base_method() {
        let src = "class Base:\n    def __init__(self, name):\n        self.name = name\n\nclass Child(Base):\n    def __init__(self, name):\n        super().__init__(name)\n";
        let graph = resolve(&[("m.py", src)]);
        let base = graph.find_symbols("Base")[0].id;
        let call = graph
            .calls()
            .iter()
            .find(|c| c.callee == "super().__init__")
            .unwrap();
        assert_eq!(call.kind, CallKind::Method);
        assert_eq!(call.receiver.as_deref(), Some("super()"));
        let target = call.target.symbol().unwrap();
        assert_eq!(graph.symbols()[target].name, "__init__");
        assert_eq!(graph.symbols()[target].parent(), Some(base));
    }

    #[test]
    fn test_cyclic_bases_terminate() {
        let src = "class A(B):\n    pass\n\nclass B(A):\n    def run(self):\n        self.missing()\n";
        let graph = resolve(&[("cycle.py", src)]);
        let call = graph.calls().iter().find(|c| c.name == "missing").unwrap();
        assert_eq!(call.target, CallTarget::Unresolved);
    }

    #[test]
    fn test_static_and_external_receivers() {
        let src = "import numpy as np\n\nclass Util:\n    def make():\n        pass\n\nUtil.make()\nnp.array([1])\n";
        let graph = resolve(&[("s.py", src)]);
        let make = graph.calls().iter().find(|c| c.name == "make").unwrap();
        assert_eq!(make.kind, CallKind::Static);
        assert!(make.target.is_resolved());
        let array = graph.calls().iter().find(|c| c.name == "array").unwrap();
        assert_eq!(array.kind, CallKind::Static);
        assert_eq!(array.target, CallTarget::External("numpy.array".to_string()));
    }

    #[test]
    fn test_module_alias_receiver() {
        let graph = resolve(&[
            ("lib/tools.py", "def build():\n    pass\n"),
            ("main.py", "import lib.tools\n\nlib.tools.build()\n"),
        ]);
        let call = graph.calls().iter().find(|c| c.name == "build").unwrap();
        assert_eq!(call.kind, CallKind::Static);
        assert_eq!(call.target, CallTarget::Symbol(graph.find_symbols("build")[0].id));
    }

    #[test]
    fn test_go_package_spans_files() {
        let graph = resolve(&[
            ("calc/add.go", "package calc\n\nfunc Add(a, b int) int { return a + b }\n"),
            ("calc/use.go", "package calc\n\nfunc Twice(a int) int { return Add(a, a) }\n"),
        ]);
        let call = graph.calls().iter().find(|c| c.name == "Add").unwrap();
        assert_eq!(call.target, CallTarget::Symbol(graph.find_symbols("Add")[0].id));
    }

    #[test]
    fn test_c_include_binds_header_prototypes() {
        let graph = resolve(&[
            ("util.h", "int twice(int x);\n"),
            ("main.c", "#include \"util.h\"\n#include <stdio.h>\n\nint main(void) { return twice(2); }\n"),
        ]);
        let includes = graph.imports_of(graph.module_by_path(Path::new("main.c")).unwrap().id);
        assert!(matches!(includes[0].status, ImportStatus::Resolved(_)));
        assert!(includes[1].is_unexpandable());
        let call = graph.calls().iter().find(|c| c.name == "twice").unwrap();
        assert!(call.target.is_resolved());
    }

    #[test]
    fn test_ambiguous_suffix_recorded() {
        let graph = resolve(&[
            ("a/util.py", "def f():\n    pass\n"),
            ("b/util.py", "def f():\n    pass\n"),
            ("main.py", "import util\n"),
        ]);
        assert_eq!(graph.diagnostics().len(), 1);
        assert_eq!(graph.stats().ambiguous, 1);
    }

    #[test]
    fn test_rust_lib_and_main_are_not_ambiguous() {
        let graph = resolve(&[
            ("src/lib.rs", "pub mod util;\n"),
            ("src/main.rs", "mod util;\nuse self::util::helper;\n\nfn main() {\n    helper();\n}\n"),
            ("src/util.rs", "pub fn helper() {}\n"),
        ]);
        assert!(graph.diagnostics().is_empty());
        let helper = graph.find_symbols("helper")[0].id;
        let call = graph.calls().iter().find(|c| c.name == "helper").unwrap();
        assert_eq!(call.target, CallTarget::Symbol(helper));
    }
}
