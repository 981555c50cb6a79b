//
//  helpers.rs
//  Factgraph
//

use tree_sitter::Node;

use crate::graph::types::ArgumentShape;
use crate::parser::{NodeClass, SourceTree};

/// Declaration identity inside one file: the node's byte range.
pub(crate) type DeclKey = (usize, usize);

pub(crate) fn decl_key(node: Node<'_>) -> DeclKey {
    (node.start_byte(), node.end_byte())
}

pub(crate) fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Named children, comments excluded.
pub(crate) fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| !is_comment(child.kind()))
        .collect()
}

pub(crate) fn is_comment(kind: &str) -> bool {
    matches!(kind, "comment" | "line_comment" | "block_comment")
}

/// Text of a field child.
pub(crate) fn field_text<'src>(
    tree: &SourceTree<'src>,
    node: Node<'_>,
    field: &str,
) -> Option<&'src str> {
    node.child_by_field_name(field).map(|child| tree.text(child))
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop generic arguments: `List<String>` → `List`, `Generic[T]` → `Generic`.
pub(crate) fn strip_generics(text: &str) -> &str {
    let end = text.find(['<', '[']).unwrap_or(text.len());
    text[..end].trim()
}

/// Last segment of a dotted / scoped / arrow path.
pub(crate) fn last_segment(text: &str) -> &str {
    let mut start = 0;
    for sep in [".", "::", "->"] {
        if let Some(pos) = text.rfind(sep) {
            start = start.max(pos + sep.len());
        }
    }
    &text[start..]
}

/// Look through wrappers such as parentheses, `await` or generic instantiation.
pub(crate) fn unwrap_expr<'t>(tree: &SourceTree<'_>, node: Node<'t>) -> Node<'t> {
    let mut node = node;
    while let Some(field) = tree.grammar().wrapper_field(node.kind()) {
        let inner = if field.is_empty() {
            named_children(node).into_iter().next()
        } else {
            node.child_by_field_name(field)
        };
        match inner {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

fn member_separator<'src>(tree: &SourceTree<'src>, node: Node<'_>, default: &'static str) -> &'src str {
    field_text(tree, node, "operator").unwrap_or(default)
}

/// Normalized text of an expression: nested calls as `f()`, literals as `<str>`.
///
/// Walks receiver chains in a loop, so `a.b().c()...` of any length stays
/// off the call stack.
pub(crate) fn normalize_expr(tree: &SourceTree<'_>, node: Node<'_>) -> String {
    let grammar = tree.grammar();
    // Trailing pieces, outermost first.
    let mut suffixes: Vec<String> = Vec::new();
    let mut node = unwrap_expr(tree, node);
    let head = loop {
        if let Some(label) = grammar.literal_label(node.kind()) {
            break format!("<{label}>");
        }
        if let Some(shape) = grammar.member_shape(node.kind()) {
            let name = node
                .child_by_field_name(shape.name_field)
                .map(|n| tree.text(unwrap_expr(tree, n)))
                .unwrap_or("");
            match node.child_by_field_name(shape.object_field) {
                Some(object) => {
                    suffixes.push(format!("{}{name}", member_separator(tree, node, shape.separator)));
                    node = unwrap_expr(tree, object);
                    continue;
                }
                None => break name.to_string(),
            }
        }
        match grammar.classify(node.kind()) {
            NodeClass::Call if node.kind() == "method_invocation" => {
                let name = field_text(tree, node, "name").unwrap_or("");
                match node.child_by_field_name("object") {
                    Some(object) => {
                        suffixes.push(format!(".{name}()"));
                        node = unwrap_expr(tree, object);
                    }
                    None => break format!("{name}()"),
                }
            }
            NodeClass::Call => {
                suffixes.push("()".to_string());
                match node.child_by_field_name("function") {
                    Some(function) => node = unwrap_expr(tree, function),
                    None => break String::new(),
                }
            }
            NodeClass::ConstructorCall => break format!("new {}()", constructor_parts(tree, node).0.callee),
            NodeClass::MacroCall => break format!("{}()", macro_name(tree, node)),
            _ => break collapse_whitespace(tree.text(node)),
        }
    };
    let mut text = head;
    for suffix in suffixes.iter().rev() {
        text.push_str(suffix);
    }
    text
}

/// First named child, comments excluded.
pub(crate) fn first_named(node: Node<'_>) -> Option<Node<'_>> {
    named_children(node).into_iter().next()
}

/// What sits to the left of the final `.name` of a callee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum ReceiverKind {
    #[default]
    None,
    /// Another call's result.
    Call,
    Literal,
    /// Any other expression, usually a name or path.
    Named,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Callee {
    pub callee: String,
    pub name: String,
    pub receiver: Option<String>,
    pub receiver_kind: ReceiverKind,
}

fn receiver_kind(tree: &SourceTree<'_>, object: Node<'_>) -> ReceiverKind {
    let object = unwrap_expr(tree, object);
    if tree.grammar().literal_label(object.kind()).is_some() {
        return ReceiverKind::Literal;
    }
    match tree.classify(object) {
        NodeClass::Call | NodeClass::ConstructorCall | NodeClass::MacroCall => ReceiverKind::Call,
        _ => ReceiverKind::Named,
    }
}

/// A `super()` receiver names the base classes, not a returned value.
fn with_receiver(tree: &SourceTree<'_>, object: Node<'_>, separator: &str, name: String) -> Callee {
    let receiver = normalize_expr(tree, object);
    let receiver_kind = if tree.grammar().is_super_receiver(&receiver) {
        ReceiverKind::Named
    } else {
        receiver_kind(tree, object)
    };
    Callee {
        callee: format!("{receiver}{separator}{name}"),
        name,
        receiver: Some(receiver),
        receiver_kind,
    }
}

/// Break a callee expression into receiver and name.
pub(crate) fn callee_of(tree: &SourceTree<'_>, node: Node<'_>) -> Callee {
    let node = unwrap_expr(tree, node);
    if let Some(shape) = tree.grammar().member_shape(node.kind()) {
        let name = node
            .child_by_field_name(shape.name_field)
            .map(|n| tree.text(unwrap_expr(tree, n)).to_string())
            .unwrap_or_default();
        return match node.child_by_field_name(shape.object_field) {
            Some(object) => {
                let separator = member_separator(tree, node, shape.separator);
                with_receiver(tree, object, separator, name)
            }
            None => Callee {
                callee: name.clone(),
                name,
                ..Callee::default()
            },
        };
    }
    let callee = normalize_expr(tree, node);
    Callee {
        name: last_segment(&callee).to_string(),
        callee,
        ..Callee::default()
    }
}

/// Callee and argument list of a plain call node.
pub(crate) fn call_parts<'t>(tree: &SourceTree<'_>, call: Node<'t>) -> (Callee, Option<Node<'t>>) {
    let arguments = call.child_by_field_name("arguments");
    if call.kind() == "method_invocation" {
        let name = field_text(tree, call, "name").unwrap_or("").to_string();
        let callee = match call.child_by_field_name("object") {
            Some(object) => with_receiver(tree, object, ".", name),
            None => Callee {
                callee: name.clone(),
                name,
                ..Callee::default()
            },
        };
        return (callee, arguments);
    }
    let callee = call
        .child_by_field_name("function")
        .map(|function| callee_of(tree, function))
        .unwrap_or_default();
    (callee, arguments)
}

/// Instantiated type and argument list of a `new`-like node.
pub(crate) fn constructor_parts<'t>(
    tree: &SourceTree<'_>,
    node: Node<'t>,
) -> (Callee, Option<Node<'t>>) {
    let arguments = node.child_by_field_name("arguments");
    let type_node = ["type", "constructor"]
        .iter()
        .find_map(|field| node.child_by_field_name(field));
    let text = type_node
        .map(|t| collapse_whitespace(strip_generics(tree.text(t))))
        .unwrap_or_default();
    let name = last_segment(&text).to_string();
    let receiver = text
        .strip_suffix(name.as_str())
        .map(|prefix| prefix.trim_end_matches(['.', ':']).to_string())
        .filter(|prefix| !prefix.is_empty());
    let receiver_kind = if receiver.is_some() {
        ReceiverKind::Named
    } else {
        ReceiverKind::None
    };
    let callee = Callee {
        callee: text,
        name,
        receiver,
        receiver_kind,
    };
    (callee, arguments)
}

/// `name!` for a macro invocation.
pub(crate) fn macro_name(tree: &SourceTree<'_>, node: Node<'_>) -> String {
    format!("{}!", field_text(tree, node, "macro").unwrap_or(""))
}

/// Argument shape of an argument list. A missing list is an empty shape.
pub(crate) fn argument_shape(tree: &SourceTree<'_>, arguments: Option<Node<'_>>) -> ArgumentShape {
    let mut shape = ArgumentShape::default();
    let Some(arguments) = arguments else {
        return shape;
    };
    // `f(x for x in xs)` and tagged templates carry a single argument.
    if matches!(arguments.kind(), "generator_expression" | "template_string") {
        shape.positional = 1;
        return shape;
    }
    if arguments.kind() == "token_tree" {
        shape.positional = macro_argument_count(arguments);
        return shape;
    }
    for child in children(arguments) {
        if !child.is_named() {
            // Go's trailing `xs...`
            if child.kind() == "..." {
                shape.star = true;
                shape.positional = shape.positional.saturating_sub(1);
            }
            continue;
        }
        match child.kind() {
            kind if is_comment(kind) => {}
            "attribute_item" => {}
            "list_splat" | "spread_element" | "variadic_argument" => shape.star = true,
            "dictionary_splat" => shape.double_star = true,
            "keyword_argument" => {
                if let Some(name) = field_text(tree, child, "name") {
                    shape.named.push(name.to_string());
                }
            }
            "element_value_pair" => {
                if let Some(key) = field_text(tree, child, "key") {
                    shape.named.push(key.to_string());
                }
            }
            _ => shape.positional += 1,
        }
    }
    shape
}

/// Top-level comma separated groups inside a macro token tree.
fn macro_argument_count(token_tree: Node<'_>) -> usize {
    let tokens = children(token_tree);
    let inner = match tokens.len() {
        0..=2 => return 0,
        n => &tokens[1..n - 1],
    };
    let commas = inner.iter().filter(|t| t.kind() == ",").count();
    let trailing = inner.last().is_some_and(|t| t.kind() == ",");
    commas + 1 - usize::from(trailing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SupportedLanguage;
    use std::path::Path;

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("obj.method1().method2"), "method2");
        assert_eq!(last_segment("std::fs::read"), "read");
        assert_eq!(last_segment("node->next"), "next");
        assert_eq!(last_segment("plain"), "plain");
    }

    #[test]
    fn test_strip_generics() {
        assert_eq!(strip_generics("List<String>"), "List");
        assert_eq!(strip_generics("Generic[T]"), "Generic");
        assert_eq!(strip_generics("Animal"), "Animal");
    }

    #[test]
    fn test_normalize_long_chain() {
        let mut src = String::from("x = a");
        for _ in 0..3000 {
            src.push_str(".b()");
        }
        src.push('\n');
        let tree = SourceTree::parse(Path::new("chain.py"), &src, SupportedLanguage::Python).unwrap();
        let assignment = tree.root().named_child(0).and_then(|s| s.named_child(0)).unwrap();
        let right = assignment.child_by_field_name("right").unwrap();
        let text = normalize_expr(&tree, right);
        assert!(text.starts_with("a.b().b()"));
        assert_eq!(text.len(), 1 + 3000 * 4);
    }

    #[test]
    fn test_normalize_nested_shapes() {
        let src = "r = obj.m1(1).m2(\"s\").attr\n";
        let tree = SourceTree::parse(Path::new("n.py"), src, SupportedLanguage::Python).unwrap();
        let assignment = tree.root().named_child(0).and_then(|s| s.named_child(0)).unwrap();
        let right = assignment.child_by_field_name("right").unwrap();
        assert_eq!(normalize_expr(&tree, right), "obj.m1().m2().attr");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a  @\n   b"), "a @ b");
    }
}
