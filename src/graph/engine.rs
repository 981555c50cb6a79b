//
//  engine.rs
//  Factgraph
//

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::path::PathBuf;

use super::types::*;

/// A node of the relationship graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphNode {
    Module(ModuleId),
    Symbol(SymbolId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Module → top-level symbol.
    Defines,
    /// Symbol → nested symbol.
    Contains,
    /// Module → module, for every resolved import statement.
    Imports,
    /// Caller (symbol, or module for top-level code) → resolved target.
    Calls,
}

/// Edge weight. `fact` is the import or call id the edge came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeData {
    pub kind: EdgeKind,
    pub fact: Option<usize>,
}

/// The frozen fact graph of one analyzed unit.
///
/// Built once by the resolver and read-only afterwards: there is no
/// mutating API, so a graph can be shared across threads freely.
#[derive(Debug, Clone)]
pub struct CodeGraph {
    pub(crate) modules: Vec<Module>,
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) imports: Vec<ImportEdge>,
    pub(crate) calls: Vec<CallEdge>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) stats: ResolutionStats,
    /// Relationship graph over modules and symbols.
    pub(crate) graph: DiGraph<GraphNode, EdgeData>,
    pub(crate) module_nodes: Vec<NodeIndex>,
    pub(crate) symbol_nodes: Vec<NodeIndex>,
    /// Index: module path -> module id.
    pub(crate) path_index: HashMap<PathBuf, ModuleId>,
    /// Index: symbol name -> symbol ids, in id order.
    pub(crate) name_index: HashMap<String, Vec<SymbolId>>,
}

impl CodeGraph {
    /// Index linked facts and lay out the relationship graph.
    pub(crate) fn assemble(
        modules: Vec<Module>,
        symbols: Vec<Symbol>,
        imports: Vec<ImportEdge>,
        calls: Vec<CallEdge>,
        diagnostics: Vec<Diagnostic>,
        stats: ResolutionStats,
    ) -> Self {
        let mut graph = DiGraph::with_capacity(modules.len() + symbols.len(), symbols.len() + calls.len());
        let module_nodes: Vec<NodeIndex> = modules
            .iter()
            .map(|m| graph.add_node(GraphNode::Module(m.id)))
            .collect();
        let symbol_nodes: Vec<NodeIndex> = symbols
            .iter()
            .map(|s| graph.add_node(GraphNode::Symbol(s.id)))
            .collect();

        for symbol in &symbols {
            let (from, kind) = match symbol.parent() {
                Some(parent) => (symbol_nodes[parent], EdgeKind::Contains),
                None => (module_nodes[symbol.module], EdgeKind::Defines),
            };
            graph.add_edge(from, symbol_nodes[symbol.id], EdgeData { kind, fact: None });
        }

        // Synthetic wildcard bindings share the edge of the import they expand.
        for edge in imports.iter().filter(|e| !e.is_synthetic()) {
            if let ImportStatus::Resolved(target) = edge.status {
                graph.add_edge(
                    module_nodes[edge.module],
                    module_nodes[target],
                    EdgeData {
                        kind: EdgeKind::Imports,
                        fact: Some(edge.id),
                    },
                );
            }
        }

        for call in &calls {
            let Some(target) = call.target.symbol() else {
                continue;
            };
            let from = match call.caller {
                Some(caller) => symbol_nodes[caller],
                None => module_nodes[call.module],
            };
            graph.add_edge(
                from,
                symbol_nodes[target],
                EdgeData {
                    kind: EdgeKind::Calls,
                    fact: Some(call.id),
                },
            );
        }

        let path_index = modules.iter().map(|m| (m.path.clone(), m.id)).collect();
        let mut name_index: HashMap<String, Vec<SymbolId>> = HashMap::new();
        for symbol in &symbols {
            name_index.entry(symbol.name.clone()).or_default().push(symbol.id);
        }

        Self {
            modules,
            symbols,
            imports,
            calls,
            diagnostics,
            stats,
            graph,
            module_nodes,
            symbol_nodes,
            path_index,
            name_index,
        }
    }

    /// A graph with no facts, for a run in which no file could be extracted.
    pub(crate) fn empty() -> Self {
        Self::assemble(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            ResolutionStats::default(),
        )
    }

    pub(crate) fn node_of(&self, node: GraphNode) -> NodeIndex {
        match node {
            GraphNode::Module(id) => self.module_nodes[id],
            GraphNode::Symbol(id) => self.symbol_nodes[id],
        }
    }
}
