//! Golden fact counts over the fixture corpus, plus end-to-end resolution
//! scenarios through the public API.

use std::fs;
use std::path::{Path, PathBuf};

use factgraph::graph::{
    AnalysisUnit, Analyzer, CallKind, CallTarget, CodeGraph, FileExtractions, ImportStatus,
    ImportedName, Phase, RunOutcome, SymbolKind, Visibility,
};
use factgraph::{analyze, extract_file, FactgraphConfig, FactgraphError, Resolver};

fn fixture_path(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(rel)
}

fn extract(rel: &str) -> FileExtractions {
    let source = fs::read_to_string(fixture_path(rel)).unwrap();
    extract_file(Path::new(rel), &source).unwrap()
}

fn resolve_one(rel: &str) -> CodeGraph {
    Resolver::new().resolve(vec![extract(rel)]).unwrap()
}

fn unit_of(files: &[(&str, &str)]) -> AnalysisUnit {
    let mut unit = AnalysisUnit::new(".");
    for (path, source) in files {
        unit.add_source(*path, *source).unwrap();
    }
    unit
}

// ─── Python fixtures ────────────────────────────────────────

#[test]
fn test_python_symbols_golden() {
    let facts = extract("python/symbols.py");
    assert_eq!(facts.symbols.len(), 19);
    assert_eq!(facts.symbols_of_kind(SymbolKind::Function), 7);
    assert_eq!(facts.symbols_of_kind(SymbolKind::Class), 4);
    assert_eq!(facts.symbols_of_kind(SymbolKind::Method), 5);
    assert_eq!(facts.symbols_of_kind(SymbolKind::Variable), 3);

    let private = facts.symbols.iter().filter(|s| s.visibility == Visibility::Private).count();
    let mangled = facts.symbols.iter().filter(|s| s.visibility == Visibility::NameMangled).count();
    assert_eq!(private, 3);
    assert_eq!(mangled, 1);

    assert_eq!(facts.calls.len(), 2);
    assert_eq!(facts.calls_of_kind(CallKind::Method), 1);
    assert_eq!(facts.calls_of_kind(CallKind::DecoratorCall), 1);
    assert!(facts.imports.is_empty());

    let decorated = facts.symbols.iter().find(|s| s.name == "decorated_function").unwrap();
    let has_call: Vec<bool> = decorated.decorators.iter().map(|d| d.has_call).collect();
    assert_eq!(has_call, vec![false, true]);
}

#[test]
fn test_python_inheritance_resolves_across_bases() {
    let graph = resolve_one("python/symbols.py");
    let dog = graph.find_symbols("Dog")[0];
    assert_eq!(dog.bases, vec!["Animal".to_string()]);
    let methods: Vec<&str> = graph.children_of(dog.id).iter().map(|s| s.name.as_str()).collect();
    assert_eq!(methods, vec!["speak", "fetch"]);
}

#[test]
fn test_python_imports_golden() {
    let facts = extract("python/imports.py");
    assert_eq!(facts.imports.len(), 33);

    let count = |f: &dyn Fn(&ImportedName) -> bool| facts.imports.iter().filter(|i| f(&i.name)).count();
    assert_eq!(count(&|n| *n == ImportedName::Module), 7);
    assert_eq!(count(&|n| *n == ImportedName::Wildcard), 2);
    assert_eq!(count(&|n| matches!(n, ImportedName::Name(_))), 24);

    let at_depth = |d: usize| facts.imports.iter().filter(|i| i.depth == d).count();
    assert_eq!(at_depth(1), 4);
    assert_eq!(at_depth(2), 3);
    assert_eq!(at_depth(3), 1);

    let aliased = facts
        .imports
        .iter()
        .filter(|i| match &i.name {
            ImportedName::Name(name) => i.alias != *name,
            ImportedName::Module => i.alias != i.target,
            ImportedName::Wildcard => false,
        })
        .count();
    assert_eq!(aliased, 6);
}

#[test]
fn test_python_imports_external_in_isolation() {
    let graph = resolve_one("python/imports.py");
    assert_eq!(graph.external_imports().len(), 33, "nothing else is in the unit");
    assert_eq!(graph.unexpandable_imports().len(), 2);
    let deep = graph.imports().iter().find(|i| i.depth == 3).unwrap();
    assert_eq!(deep.status, ImportStatus::External, "climbs above the unit root");
    assert_eq!(graph.stats().synthetic_imports, 0);
}

#[test]
fn test_python_calls_golden() {
    let facts = extract("python/calls.py");
    assert_eq!(facts.calls.len(), 46);
    assert_eq!(facts.calls_of_kind(CallKind::Chained), 4);
    assert_eq!(facts.calls_of_kind(CallKind::LiteralReceiver), 4);
    assert_eq!(facts.calls_of_kind(CallKind::DecoratorCall), 1);

    let graph = Resolver::new().resolve(vec![facts]).unwrap();
    let stats = graph.stats();
    let by_kind = |k: CallKind| stats.calls_by_kind.get(&k).copied().unwrap_or(0);
    assert_eq!(by_kind(CallKind::Direct), 27);
    assert_eq!(by_kind(CallKind::Method), 6);
    assert_eq!(by_kind(CallKind::Chained), 4);
    assert_eq!(by_kind(CallKind::Builtin), 4);
    assert_eq!(by_kind(CallKind::LiteralReceiver), 4);
    assert_eq!(by_kind(CallKind::DecoratorCall), 1);

    assert_eq!(stats.calls_resolved, 1, "only the `processor` variable is declared here");
    assert_eq!(stats.calls_builtin, 4);
    assert_eq!(graph.unresolved_calls().len(), 41);
    assert_eq!(graph.symbols().len(), 16);
}

#[test]
fn test_python_call_shapes() {
    let facts = extract("python/calls.py");
    let chain: Vec<&str> = facts
        .calls
        .iter()
        .filter(|c| c.callee.starts_with("obj.method1"))
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(chain, vec!["method1", "method2", "method3"]);

    let star = facts.calls.iter().filter(|c| c.arguments.star).count();
    let double_star = facts.calls.iter().filter(|c| c.arguments.double_star).count();
    assert_eq!((star, double_star), (1, 1));

    let nested = facts
        .calls
        .iter()
        .filter(|c| c.callee == "calculate_sum" && c.span.start_line == 25)
        .count();
    assert_eq!(nested, 3, "outer call and both argument calls");

    let literal_receivers: Vec<&str> = facts
        .calls
        .iter()
        .filter(|c| c.kind == CallKind::LiteralReceiver)
        .filter_map(|c| c.receiver.as_deref())
        .collect();
    assert_eq!(literal_receivers, vec!["<str>", "<str>", "<list>", "<dict>"]);
}

// ─── Other languages ────────────────────────────────────────

#[test]
fn test_rust_imports_golden() {
    let facts = extract("rust/imports.rs");
    assert_eq!(facts.imports.len(), 20);
    let wildcards = facts.imports.iter().filter(|i| i.name == ImportedName::Wildcard).count();
    assert_eq!(wildcards, 1);
    assert_eq!(facts.imports.iter().filter(|i| i.depth == 1).count(), 4);
    assert_eq!(facts.imports.iter().filter(|i| i.depth == 2).count(), 1);
}

#[test]
fn test_go_calls_resolve_locally_and_externally() {
    let graph = resolve_one("go/calls.go");
    let stats = graph.stats();
    assert_eq!(stats.calls, 10);
    assert_eq!(stats.calls_resolved, 4, "Add three times and ProcessData");
    assert_eq!(stats.calls_external, 4, "fmt and time calls");
    assert_eq!(stats.calls_unresolved, 2, "methods on a local value");

    let sleep = graph.calls().iter().find(|c| c.name == "Sleep").unwrap();
    assert_eq!(sleep.kind, CallKind::Static);
    assert_eq!(sleep.target, CallTarget::External("time.Sleep".to_string()));

    let my_type = graph.find_symbols("MyType")[0];
    assert_eq!(graph.children_of(my_type.id).len(), 2, "receiver methods attach to the type");
}

#[test]
fn test_c_calls_resolve_to_file_functions() {
    let graph = resolve_one("c/calls.c");
    assert_eq!(graph.stats().calls, 10);
    assert_eq!(graph.stats().calls_resolved, 6);
    let print_point = graph.find_symbols("print_point")[0].id;
    assert_eq!(graph.calls_to(print_point).len(), 2);
    assert_eq!(graph.unexpandable_imports().len(), 2, "system headers");
}

#[test]
fn test_java_super_calls_reach_base_class() {
    let graph = resolve_one("java/calls.java");
    let parent = graph.find_symbols("Parent")[0].id;
    let parent_method = graph
        .find_symbols("parentMethod")
        .into_iter()
        .find(|s| s.scope == factgraph::graph::SymbolScope::Symbol(parent))
        .unwrap()
        .id;
    let super_calls: Vec<_> = graph
        .calls()
        .iter()
        .filter(|c| c.receiver.as_deref() == Some("super") && c.name == "parentMethod")
        .collect();
    assert_eq!(super_calls.len(), 2);
    assert!(super_calls.iter().all(|c| c.target == CallTarget::Symbol(parent_method)));

    let nested = graph.calls().iter().find(|c| c.name == "nestedMethod").unwrap();
    assert!(nested.target.is_resolved(), "sibling method found through the class scope");
}

#[test]
fn test_fixture_fact_totals_golden() {
    // (fixture, symbols, imports, calls)
    let expected = [
        ("c/symbols.c", 10, 3, 8),
        ("c/symbols.h", 14, 0, 0),
        ("cpp/calls.cpp", 11, 3, 11),
        ("cpp/symbols.cpp", 24, 3, 6),
        ("cpp/symbols.hpp", 32, 2, 0),
        ("go/symbols.go", 21, 2, 3),
        ("java/symbols.java", 11, 2, 4),
        ("java/calls.java", 14, 2, 19),
        ("rust/calls.rs", 58, 0, 75),
        ("rust/symbols.rs", 39, 2, 16),
    ];
    for (rel, symbols, imports, calls) in expected {
        let facts = extract(rel);
        assert_eq!(facts.symbols.len(), symbols, "{rel} symbols");
        assert_eq!(facts.imports.len(), imports, "{rel} imports");
        assert_eq!(facts.calls.len(), calls, "{rel} calls");
    }
}

#[test]
fn test_c_symbols_golden() {
    let facts = extract("c/symbols.c");
    assert_eq!(facts.symbols_of_kind(SymbolKind::Function), 9);
    assert_eq!(facts.symbols_of_kind(SymbolKind::Variable), 1);
    assert_eq!(facts.calls_of_kind(CallKind::Direct), 8);
    assert!(facts.imports.iter().all(|i| i.name == ImportedName::Wildcard));
}

// ─── Cross-file resolution ──────────────────────────────────

#[test]
fn test_relative_imports_and_wildcards_across_files() {
    let unit = unit_of(&[
        ("app/__init__.py", ""),
        ("app/models.py", "class Base:\n    def save(self):\n        pass\n\nclass User(Base):\n    pass\n\n_cache = {}\n"),
        ("app/views.py", "from .models import *\nfrom . import models\n\ndef show():\n    u = User()\n    u.save()\n    models.Base()\n"),
    ]);
    let analysis = analyze(&unit).unwrap();
    let graph = &analysis.graph;
    let views = graph.module_by_path(Path::new("app/views.py")).unwrap().id;
    let models = graph.module_by_path(Path::new("app/models.py")).unwrap().id;

    let synthetic: Vec<&str> = graph
        .imports_of(views)
        .into_iter()
        .filter(|e| e.is_synthetic())
        .map(|e| e.alias.as_str())
        .collect();
    assert_eq!(synthetic, vec!["Base", "User"], "private names are not expanded");

    let user_ctor = graph.calls().iter().find(|c| c.name == "User").unwrap();
    assert_eq!(user_ctor.kind, CallKind::Constructor);
    assert_eq!(user_ctor.target, CallTarget::Symbol(graph.find_symbols("User")[0].id));

    let base_ctor = graph.calls().iter().find(|c| c.name == "Base").unwrap();
    assert_eq!(base_ctor.kind, CallKind::Constructor, "class reached through a module alias");

    assert_eq!(graph.importers_of(models).len(), 2);
    assert!(graph.import_cycles().is_empty());
}

#[test]
fn test_reverse_call_graph_and_cycles() {
    let unit = unit_of(&[
        ("a.py", "import b\n\ndef ping():\n    b.pong()\n"),
        ("b.py", "import a\n\ndef pong():\n    a.ping()\n\ndef start():\n    pong()\n"),
    ]);
    let graph = analyze(&unit).unwrap().graph;
    let pong = graph.find_symbols("pong")[0].id;
    let callers: Vec<&str> = graph
        .calls_to(pong)
        .iter()
        .filter_map(|c| c.caller)
        .filter_map(|id| graph.symbol(id))
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(callers, vec!["ping", "start"]);
    assert_eq!(graph.import_cycles(), vec![vec![0, 1]]);
}

#[test]
fn test_resolution_is_idempotent() {
    let mut unit = AnalysisUnit::new(".");
    for rel in ["python/calls.py", "python/imports.py", "python/symbols.py"] {
        unit.add_source(rel, fs::read_to_string(fixture_path(rel)).unwrap()).unwrap();
    }
    let first = analyze(&unit).unwrap().graph.to_json().unwrap();
    let second = analyze(&unit).unwrap().graph.to_json().unwrap();
    assert_eq!(first, second, "same input, byte-identical graph");
}

#[test]
fn test_input_order_does_not_matter() {
    let a = ("a.py", "from b import f\n\nf()\n");
    let b = ("b.py", "def f():\n    pass\n");
    let forward = analyze(&unit_of(&[a, b])).unwrap().graph.to_json().unwrap();
    let reverse = analyze(&unit_of(&[b, a])).unwrap().graph.to_json().unwrap();
    assert_eq!(forward, reverse);
}

// ─── Failure modes ──────────────────────────────────────────

#[test]
fn test_parse_error_isolated_to_its_file() {
    let unit = unit_of(&[
        ("ok.py", "def fine():\n    pass\n"),
        ("broken.py", "class (:\n"),
    ]);
    let analysis = analyze(&unit).unwrap();
    assert_eq!(analysis.errors.len(), 1);
    assert_eq!(analysis.graph.modules().len(), 1);
    assert_eq!(analysis.graph.find_symbols("fine").len(), 1);
}

#[test]
fn test_empty_unit_and_phase_order() {
    let err = analyze(&AnalysisUnit::new(".")).err().unwrap();
    assert!(matches!(err, FactgraphError::EmptyUnit));

    let mut resolver = Resolver::new();
    let err = resolver.link_imports().err().unwrap();
    assert_eq!(err.to_string(), "resolver phase out of order: expected collected, found pending");
    assert_eq!(resolver.phase(), Phase::Pending);
}

#[test]
fn test_cancellation_returns_partial_facts() {
    let unit = unit_of(&[("a.py", "x = 1\n"), ("b.py", "y = 2\n")]);
    let analyzer = Analyzer::new(FactgraphConfig::default());
    analyzer.cancellation_token().cancel();
    match analyzer.run(&unit).unwrap() {
        RunOutcome::Cancelled(partial) => {
            let analysis = partial.resolve(&FactgraphConfig::default().resolution);
            assert!(matches!(analysis, Err(FactgraphError::EmptyUnit)), "nothing was extracted");
        }
        RunOutcome::Complete(_) => panic!("expected a cancelled run"),
    }
}
