//! Plain-text reports over a finished analysis.
//!
//! Compact, one fact per line: `name kind path:line`.

use anyhow::{anyhow, Result};
use std::path::Path;

use super::OutputFormat;
use crate::graph::{Analysis, CallTarget, CodeGraph, FailureKind, Symbol};

fn location(graph: &CodeGraph, module: usize, line: usize) -> String {
    let path = graph
        .module(module)
        .map(|m| m.path.display().to_string())
        .unwrap_or_else(|| "?".to_string());
    format!("{path}:{line}")
}

pub fn snapshot(graph: &CodeGraph, format: OutputFormat) -> Result<()> {
    let text = match format {
        OutputFormat::Json => graph.to_json()?,
        OutputFormat::Yaml => graph.to_yaml()?,
    };
    println!("{text}");
    Ok(())
}

pub fn stats(analysis: &Analysis) {
    let s = analysis.graph.stats();
    println!("modules      {}", s.modules);
    println!("symbols      {}", s.symbols);
    println!(
        "imports      {} ({} resolved, {} external, {} synthetic, {} unexpandable)",
        s.imports, s.imports_resolved, s.imports_external, s.synthetic_imports, s.unexpandable_wildcards
    );
    println!(
        "calls        {} ({} resolved, {} builtin, {} external, {} unresolved)",
        s.calls, s.calls_resolved, s.calls_builtin, s.calls_external, s.calls_unresolved
    );
    for (kind, count) in &s.calls_by_kind {
        println!("  {:<16} {count}", kind.to_string());
    }
    println!("ambiguous    {}", s.ambiguous);

    if !analysis.errors.is_empty() {
        println!();
        println!("errors ({}):", analysis.errors.len());
        for failure in &analysis.errors {
            let kind = match failure.kind {
                FailureKind::Parse { .. } => "parse",
                FailureKind::Read => "read",
                FailureKind::Unsupported => "unsupported",
            };
            println!("  {} [{kind}] {}", failure.path.display(), failure.message);
        }
    }
}

fn print_tree(graph: &CodeGraph, symbol: &Symbol, depth: usize) {
    let indent = "  ".repeat(depth);
    let bases = if symbol.bases.is_empty() {
        String::new()
    } else {
        format!(" ({})", symbol.bases.join(", "))
    };
    println!(
        "{indent}{}{bases} {} {} :{}",
        symbol.name, symbol.kind, symbol.visibility, symbol.span.start_line
    );
    for child in graph.children_of(symbol.id) {
        print_tree(graph, child, depth + 1);
    }
}

pub fn symbols(graph: &CodeGraph, file: &Path) -> Result<()> {
    let module = graph
        .module_by_path(file)
        .ok_or_else(|| anyhow!("no analyzed module at {}", file.display()))?;
    println!("{} ({})", module.path.display(), module.logical_name());
    for symbol in graph.top_level_symbols(module.id) {
        print_tree(graph, symbol, 1);
    }
    Ok(())
}

pub fn unresolved(graph: &CodeGraph, limit: usize) {
    let calls = graph.unresolved_calls();
    if calls.is_empty() {
        println!("All calls resolved");
        return;
    }
    for call in calls.iter().take(limit) {
        let marker = match &call.target {
            CallTarget::External(name) => format!(" (external {name})"),
            _ => String::new(),
        };
        println!(
            "{} {}{marker} {}",
            call.callee,
            call.kind,
            location(graph, call.module, call.span.start_line)
        );
    }
    if calls.len() > limit {
        println!("... {} more", calls.len() - limit);
    }
}

pub fn externals(graph: &CodeGraph) {
    for edge in graph.external_imports() {
        let marker = if edge.is_unexpandable() { " (unexpandable)" } else { "" };
        println!(
            "{} {}{marker} {}",
            edge.target,
            edge.name,
            location(graph, edge.module, edge.span.start_line)
        );
    }
}

pub fn callers(graph: &CodeGraph, name: &str) {
    let targets = graph.find_symbols(name);
    if targets.is_empty() {
        println!("No symbol named '{name}'");
        return;
    }
    for target in targets {
        println!(
            "{} {} {}",
            target.name,
            target.kind,
            location(graph, target.module, target.span.start_line)
        );
        for call in graph.calls_to(target.id) {
            let caller = call
                .caller
                .and_then(|id| graph.symbol(id))
                .map(|s| s.name.as_str())
                .unwrap_or("<module>");
            println!(
                "  <- {caller} {} {}",
                call.kind,
                location(graph, call.module, call.span.start_line)
            );
        }
    }
    let external = graph
        .calls()
        .iter()
        .filter(|c| matches!(&c.target, CallTarget::External(t) if t.ends_with(name)))
        .count();
    if external > 0 {
        println!("({external} external calls end in '{name}')");
    }
}

pub fn cycles(graph: &CodeGraph) {
    let cycles = graph.import_cycles();
    if cycles.is_empty() {
        println!("No import cycles");
        return;
    }
    for cycle in cycles {
        let names: Vec<String> = cycle
            .iter()
            .filter_map(|&id| graph.module(id))
            .map(|m| m.path.display().to_string())
            .collect();
        println!("{}", names.join(" -> "));
    }
}
