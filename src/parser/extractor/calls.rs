//
//  calls.rs
//  Factgraph
//

//! Call extraction.
//!
//! Calls are emitted post-order: arguments and receivers come before the
//! call that consumes them, so `a.b().c()` lists `b` before `c`. Lambdas and
//! comprehensions are not scopes; their calls belong to the nearest named
//! declaration.

use tree_sitter::Node;

use super::helpers::*;
use super::symbols::declares_scope;
use crate::graph::types::*;
use crate::parser::{NodeClass, SourceTree};

/// A call plus the declarations enclosing it, innermost last.
pub(crate) struct CallSite {
    pub call: ExtractedCall,
    pub scopes: Vec<DeclKey>,
}

pub(crate) fn extract_calls(tree: &SourceTree<'_>) -> Vec<CallSite> {
    let mut walker = CallWalker {
        tree,
        scopes: Vec::new(),
        sites: Vec::new(),
    };
    walker.walk(tree.root());
    walker.sites
}

struct CallWalker<'a, 'src> {
    tree: &'a SourceTree<'src>,
    scopes: Vec<DeclKey>,
    sites: Vec<CallSite>,
}

/// Pending work of the tree walk. Children are pushed in reverse so they
/// pop in document order; `Emit*` steps sit below a node's children.
enum Step<'t> {
    Visit(Node<'t>),
    EnterScope(DeclKey),
    LeaveScope,
    EmitCall(Node<'t>),
    EmitConstructor(Node<'t>),
    EmitMacro(Node<'t>),
}

/// Children evaluated in the enclosing scope rather than the declaration's own.
fn is_declaration_prelude(kind: &str) -> bool {
    matches!(kind, "decorator" | "modifiers")
}

fn schedule<'t>(stack: &mut Vec<Step<'t>>, nodes: Vec<Node<'t>>) {
    stack.extend(nodes.into_iter().rev().map(Step::Visit));
}

impl CallWalker<'_, '_> {
    fn walk(&mut self, root: Node<'_>) {
        let mut stack = vec![Step::Visit(root)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Visit(node) => self.visit(node, &mut stack),
                Step::EnterScope(key) => self.scopes.push(key),
                Step::LeaveScope => {
                    self.scopes.pop();
                }
                Step::EmitCall(node) => self.emit_call(node),
                Step::EmitConstructor(node) => self.emit_constructor(node),
                Step::EmitMacro(node) => self.emit_macro(node),
            }
        }
    }

    fn visit<'t>(&mut self, node: Node<'t>, stack: &mut Vec<Step<'t>>) {
        if declares_scope(self.tree, node) {
            let (prelude, body): (Vec<_>, Vec<_>) = named_children(node)
                .into_iter()
                .partition(|child| is_declaration_prelude(child.kind()));
            stack.push(Step::LeaveScope);
            schedule(stack, body);
            stack.push(Step::EnterScope(decl_key(node)));
            schedule(stack, prelude);
            return;
        }

        match self.tree.classify(node) {
            NodeClass::Decorator => self.visit_decorator(node, stack),
            NodeClass::Call => {
                stack.push(Step::EmitCall(node));
                schedule(stack, named_children(node));
            }
            NodeClass::ConstructorCall => {
                stack.push(Step::EmitConstructor(node));
                schedule(stack, named_children(node));
            }
            NodeClass::MacroCall => {
                stack.push(Step::EmitMacro(node));
                schedule(stack, named_children(node));
            }
            _ => schedule(stack, named_children(node)),
        }
    }

    /// A decorator applied with call syntax is recorded by the symbol pass;
    /// only the calls nested inside it are ours.
    fn visit_decorator<'t>(&mut self, node: Node<'t>, stack: &mut Vec<Step<'t>>) {
        match first_named(node) {
            Some(call) if node.kind() == "decorator" && self.tree.classify(call) == NodeClass::Call => {
                schedule(stack, named_children(call))
            }
            _ => schedule(stack, named_children(node)),
        }
    }

    fn push(&mut self, callee: Callee, kind: CallKind, arguments: ArgumentShape, node: Node<'_>) {
        self.sites.push(CallSite {
            call: ExtractedCall {
                callee: callee.callee,
                name: callee.name,
                receiver: callee.receiver,
                kind,
                caller: None,
                arguments,
                decorates: None,
                span: self.tree.span(node),
            },
            scopes: self.scopes.clone(),
        });
    }

    fn emit_call(&mut self, node: Node<'_>) {
        let tree = self.tree;
        let (callee, arguments) = call_parts(tree, node);
        let super_call = node
            .child_by_field_name("function")
            .is_some_and(|f| f.kind() == "super");
        let kind = if super_call {
            CallKind::Constructor
        } else {
            match callee.receiver_kind {
                ReceiverKind::None => CallKind::Direct,
                ReceiverKind::Call => CallKind::Chained,
                ReceiverKind::Literal => CallKind::LiteralReceiver,
                ReceiverKind::Named => CallKind::Method,
            }
        };
        self.push(callee, kind, argument_shape(tree, arguments), node);
    }

    fn emit_constructor(&mut self, node: Node<'_>) {
        let (callee, arguments) = constructor_parts(self.tree, node);
        let arguments = argument_shape(self.tree, arguments);
        self.push(callee, CallKind::Constructor, arguments, node);
    }

    fn emit_macro(&mut self, node: Node<'_>) {
        let name = macro_name(self.tree, node);
        let arguments = named_children(node)
            .into_iter()
            .find(|child| child.kind() == "token_tree");
        let callee = Callee {
            callee: name.clone(),
            name: last_segment(&name).to_string(),
            ..Callee::default()
        };
        let arguments = argument_shape(self.tree, arguments);
        self.push(callee, CallKind::Direct, arguments, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SupportedLanguage;
    use std::path::Path;

    fn calls_of(lang: SupportedLanguage, src: &str) -> Vec<ExtractedCall> {
        let tree = SourceTree::parse(Path::new("test"), src, lang).unwrap();
        extract_calls(&tree).into_iter().map(|site| site.call).collect()
    }

    #[test]
    fn test_chain_emits_one_edge_per_link() {
        let calls = calls_of(SupportedLanguage::Python, "obj.method1().method2().method3()\n");
        let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["method1", "method2", "method3"]);
        let kinds: Vec<CallKind> = calls.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![CallKind::Method, CallKind::Chained, CallKind::Chained]);
        assert_eq!(calls[2].callee, "obj.method1().method2().method3");
        assert_eq!(calls[2].receiver.as_deref(), Some("obj.method1().method2()"));
    }

    #[test]
    fn test_long_chain_walks_without_recursion() {
        let mut src = String::from("def build():\n    x = a");
        for _ in 0..1500 {
            src.push_str(".b()");
        }
        src.push('\n');
        let tree = SourceTree::parse(Path::new("chain.py"), &src, SupportedLanguage::Python).unwrap();
        let sites = extract_calls(&tree);
        assert_eq!(sites.len(), 1500);
        assert_eq!(sites[0].call.kind, CallKind::Method);
        assert!(sites[1..].iter().all(|s| s.call.kind == CallKind::Chained));
        assert!(sites.iter().all(|s| s.scopes.len() == 1));
    }

    #[test]
    fn test_nested_calls_are_separate_edges() {
        let calls = calls_of(
            SupportedLanguage::Python,
            "calculate_sum(calculate_sum(1, 2), calculate_sum(3, 4))\n",
        );
        assert_eq!(calls.len(), 3, "f(g(x)) yields one edge per call");
        assert_eq!(calls[2].arguments.positional, 2);
        assert!(calls.iter().all(|c| c.kind == CallKind::Direct));
    }

    #[test]
    fn test_unpacking_flags() {
        let calls = calls_of(
            SupportedLanguage::Python,
            "f(*values)\nf(**kwargs)\nf(1, *a, key=2, **b)\n",
        );
        assert!(calls[0].arguments.star && !calls[0].arguments.double_star);
        assert!(calls[1].arguments.double_star && !calls[1].arguments.star);
        assert_eq!(calls[2].arguments.positional, 1);
        assert_eq!(calls[2].arguments.named, vec!["key".to_string()]);
    }

    #[test]
    fn test_literal_receivers() {
        let calls = calls_of(
            SupportedLanguage::Python,
            "\"hello\".upper()\n[1, 2].append(3)\n{\"a\": 1}.keys()\n",
        );
        assert!(calls.iter().all(|c| c.kind == CallKind::LiteralReceiver));
        assert_eq!(calls[0].callee, "<str>.upper");
        assert_eq!(calls[2].receiver.as_deref(), Some("<dict>"));
    }

    #[test]
    fn test_decorator_call_left_to_symbol_pass() {
        let src = "@decorator(param=make())\ndef f():\n    pass\n";
        let calls = calls_of(SupportedLanguage::Python, src);
        let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["make"], "only the nested argument call is emitted here");
    }

    #[test]
    fn test_scopes_skip_lambdas_and_comprehensions() {
        let src = "def outer():\n    g = lambda x: inner(x)\n    return [h(y) for y in ys]\n";
        let tree = SourceTree::parse(Path::new("t.py"), src, SupportedLanguage::Python).unwrap();
        let sites = extract_calls(&tree);
        assert_eq!(sites.len(), 2);
        assert!(sites.iter().all(|s| s.scopes.len() == 1));
    }

    #[test]
    fn test_constructor_and_macro_forms() {
        let js = calls_of(SupportedLanguage::JavaScript, "const w = new pkg.Widget(1, ...rest);\n");
        assert_eq!(js[0].kind, CallKind::Constructor);
        assert_eq!(js[0].name, "Widget");
        assert_eq!(js[0].receiver.as_deref(), Some("pkg"));
        assert!(js[0].arguments.star);

        let rust = calls_of(
            SupportedLanguage::Rust,
            "fn main() { println!(\"{} {}\", a, b); let v = Vec::new(); }\n",
        );
        assert_eq!(rust[0].callee, "println!");
        assert_eq!(rust[0].arguments.positional, 3);
        assert_eq!(rust[1].callee, "Vec::new");
        assert_eq!(rust[1].receiver.as_deref(), Some("Vec"));
    }

    #[test]
    fn test_go_variadic_spread() {
        let src = "package main\n\nfunc main() {\n\tfmt.Println(xs...)\n}\n";
        let calls = calls_of(SupportedLanguage::Go, src);
        assert_eq!(calls[0].callee, "fmt.Println");
        assert!(calls[0].arguments.star);
        assert_eq!(calls[0].arguments.positional, 0);
    }
}
