//
//  query.rs
//  Factgraph
//

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::engine::{CodeGraph, EdgeKind, GraphNode};
use super::types::*;
use crate::error::Result;

/// Lossless serializable view of a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub modules: Vec<Module>,
    pub symbols: Vec<Symbol>,
    pub imports: Vec<ImportEdge>,
    pub calls: Vec<CallEdge>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: ResolutionStats,
}

impl CodeGraph {
    // ─── Modules & symbols ──────────────────────────────────

    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id)
    }

    pub fn module_by_path(&self, path: &Path) -> Option<&Module> {
        self.path_index.get(path).map(|&id| &self.modules[id])
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Every symbol with exactly this name, in id order.
    pub fn find_symbols(&self, name: &str) -> Vec<&Symbol> {
        self.name_index
            .get(name)
            .map(|ids| ids.iter().map(|&id| &self.symbols[id]).collect())
            .unwrap_or_default()
    }

    /// All symbols declared in a module, nested ones included.
    pub fn symbols_in_module(&self, module: ModuleId) -> Vec<&Symbol> {
        self.symbols.iter().filter(|s| s.module == module).collect()
    }

    pub fn top_level_symbols(&self, module: ModuleId) -> Vec<&Symbol> {
        self.modules
            .get(module)
            .map(|m| m.symbols.iter().map(|&id| &self.symbols[id]).collect())
            .unwrap_or_default()
    }

    pub fn children_of(&self, symbol: SymbolId) -> Vec<&Symbol> {
        self.symbols
            .get(symbol)
            .map(|s| s.children.iter().map(|&id| &self.symbols[id]).collect())
            .unwrap_or_default()
    }

    // ─── Calls ──────────────────────────────────────────────

    pub fn calls(&self) -> &[CallEdge] {
        &self.calls
    }

    /// Calls without an in-unit or builtin target, external ones included.
    pub fn unresolved_calls(&self) -> Vec<&CallEdge> {
        self.calls.iter().filter(|c| !c.target.is_resolved()).collect()
    }

    /// Calls bound through an import that points outside the unit.
    pub fn external_calls(&self) -> Vec<&CallEdge> {
        self.calls
            .iter()
            .filter(|c| matches!(c.target, CallTarget::External(_)))
            .collect()
    }

    pub fn calls_by_kind(&self, kind: CallKind) -> Vec<&CallEdge> {
        self.calls.iter().filter(|c| c.kind == kind).collect()
    }

    /// Calls made directly inside `symbol`'s body.
    pub fn calls_from(&self, symbol: SymbolId) -> Vec<&CallEdge> {
        self.calls.iter().filter(|c| c.caller == Some(symbol)).collect()
    }

    /// Resolved calls targeting `symbol` (the reverse call graph).
    pub fn calls_to(&self, symbol: SymbolId) -> Vec<&CallEdge> {
        if symbol >= self.symbols.len() {
            return Vec::new();
        }
        let node = self.node_of(GraphNode::Symbol(symbol));
        let mut calls: Vec<&CallEdge> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .filter(|e| e.weight().kind == EdgeKind::Calls)
            .filter_map(|e| e.weight().fact)
            .map(|id| &self.calls[id])
            .collect();
        calls.sort_by_key(|c| c.id);
        calls
    }

    pub fn calls_in_module(&self, module: ModuleId) -> Vec<&CallEdge> {
        self.calls.iter().filter(|c| c.module == module).collect()
    }

    // ─── Imports ────────────────────────────────────────────

    pub fn imports(&self) -> &[ImportEdge] {
        &self.imports
    }

    /// Import edges written in (or synthesized for) `module`, in id order.
    pub fn imports_of(&self, module: ModuleId) -> Vec<&ImportEdge> {
        self.imports.iter().filter(|e| e.module == module).collect()
    }

    /// Import edges that resolved to `module`.
    pub fn importers_of(&self, module: ModuleId) -> Vec<&ImportEdge> {
        if module >= self.modules.len() {
            return Vec::new();
        }
        let node = self.node_of(GraphNode::Module(module));
        let mut edges: Vec<&ImportEdge> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .filter(|e| e.weight().kind == EdgeKind::Imports)
            .filter_map(|e| e.weight().fact)
            .map(|id| &self.imports[id])
            .collect();
        edges.sort_by_key(|e| e.id);
        edges
    }

    pub fn external_imports(&self) -> Vec<&ImportEdge> {
        self.imports.iter().filter(|e| e.is_external()).collect()
    }

    pub fn unexpandable_imports(&self) -> Vec<&ImportEdge> {
        self.imports.iter().filter(|e| e.is_unexpandable()).collect()
    }

    /// Groups of modules that import each other, each sorted by id.
    /// A module importing itself counts as a cycle of one.
    pub fn import_cycles(&self) -> Vec<Vec<ModuleId>> {
        let mut imports: DiGraph<ModuleId, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = self.modules.iter().map(|m| imports.add_node(m.id)).collect();
        let mut self_loops = vec![false; self.modules.len()];
        for edge in self.graph.edge_references() {
            if edge.weight().kind != EdgeKind::Imports {
                continue;
            }
            if let (GraphNode::Module(from), GraphNode::Module(to)) =
                (self.graph[edge.source()], self.graph[edge.target()])
            {
                if from == to {
                    self_loops[from] = true;
                }
                imports.update_edge(nodes[from], nodes[to], ());
            }
        }

        let mut cycles: Vec<Vec<ModuleId>> = tarjan_scc(&imports)
            .into_iter()
            .map(|component| {
                let mut ids: Vec<ModuleId> = component.into_iter().map(|n| imports[n]).collect();
                ids.sort_unstable();
                ids
            })
            .filter(|ids| ids.len() > 1 || self_loops[ids[0]])
            .collect();
        cycles.sort();
        cycles
    }

    // ─── Reporting ──────────────────────────────────────────

    pub fn stats(&self) -> &ResolutionStats {
        &self.stats
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            modules: self.modules.clone(),
            symbols: self.symbols.clone(),
            imports: self.imports.clone(),
            calls: self.calls.clone(),
            diagnostics: self.diagnostics.clone(),
            stats: self.stats.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.snapshot())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::resolver::Resolver;
    use crate::parser::extract_file;

    fn graph_of(files: &[(&str, &str)]) -> CodeGraph {
        let facts = files
            .iter()
            .map(|(path, src)| extract_file(Path::new(path), src).unwrap())
            .collect();
        Resolver::new().resolve(facts).unwrap()
    }

    #[test]
    fn test_calls_to_lists_every_caller() {
        let src = "def target():\n    pass\n\ndef a():\n    target()\n\ndef b():\n    target()\n\ntarget()\n";
        let graph = graph_of(&[("m.py", src)]);
        let target = graph.find_symbols("target")[0].id;
        let callers: Vec<Option<SymbolId>> = graph.calls_to(target).iter().map(|c| c.caller).collect();
        let a = graph.find_symbols("a")[0].id;
        let b = graph.find_symbols("b")[0].id;
        assert_eq!(callers, vec![Some(a), Some(b), None], "module-level call has no caller");
        assert_eq!(graph.calls_from(a).len(), 1);
    }

    #[test]
    fn test_unresolved_calls_include_external_targets() {
        let graph = graph_of(&[("m.py", "import os\n\nos.getcwd()\nunknown()\nlen([])\n")]);
        let unresolved: Vec<&str> = graph.unresolved_calls().iter().map(|c| c.callee.as_str()).collect();
        assert_eq!(unresolved, vec!["os.getcwd", "unknown"]);
        let external = graph.external_calls();
        assert_eq!(external.len(), 1);
        assert_eq!(external[0].target, CallTarget::External("os.getcwd".to_string()));
    }

    #[test]
    fn test_import_cycle_detected() {
        let graph = graph_of(&[
            ("a.py", "import b\n"),
            ("b.py", "import a\n"),
            ("c.py", "import a\n"),
        ]);
        assert_eq!(graph.import_cycles(), vec![vec![0, 1]]);
        let a = graph.module_by_path(Path::new("a.py")).unwrap().id;
        assert_eq!(graph.importers_of(a).len(), 2);
    }

    #[test]
    fn test_symbol_tree_queries() {
        let graph = graph_of(&[("k.py", "class K:\n    def one(self):\n        pass\n\n    def two(self):\n        pass\n")]);
        let k = graph.find_symbols("K")[0].id;
        let names: Vec<&str> = graph.children_of(k).iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two"]);
        assert_eq!(graph.top_level_symbols(0).len(), 1);
        assert_eq!(graph.symbols_in_module(0).len(), 3);
        assert!(graph.children_of(99).is_empty());
    }

    #[test]
    fn test_external_and_unexpandable_imports() {
        let graph = graph_of(&[("m.py", "import os\nfrom math import *\n")]);
        assert_eq!(graph.external_imports().len(), 2);
        assert_eq!(graph.unexpandable_imports().len(), 1);
        assert!(graph.import_cycles().is_empty());
    }

    #[test]
    fn test_snapshot_serializes() {
        let graph = graph_of(&[("m.py", "def f():\n    print(1)\n")]);
        let json = graph.to_json().unwrap();
        let back: GraphSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, graph.snapshot());
        assert!(graph.to_yaml().unwrap().contains("builtin"));
    }
}
