//
//  symbols.rs
//  Factgraph
//

//! Symbol extraction: declarations, their scope tree, signatures and decorators.

use std::collections::{HashMap, HashSet};

use tree_sitter::Node;

use super::helpers::*;
use super::profile;
use crate::graph::types::*;
use crate::parser::{NodeClass, SourceTree, SupportedLanguage};

pub(crate) struct SymbolFacts {
    pub symbols: Vec<ExtractedSymbol>,
    /// Declaration node → symbol index, for call attribution.
    pub scope_keys: HashMap<DeclKey, usize>,
    /// One call per decorator applied with call syntax.
    pub decorator_calls: Vec<ExtractedCall>,
}

pub(crate) fn extract_symbols(tree: &SourceTree<'_>) -> SymbolFacts {
    let mut walker = SymbolWalker::new(tree);
    walker.walk(tree.root());
    walker.finish()
}

/// Whether a node opens a named scope for call attribution.
pub(crate) fn declares_scope(tree: &SourceTree<'_>, node: Node<'_>) -> bool {
    match tree.classify(node) {
        NodeClass::Function | NodeClass::Class => true,
        NodeClass::Variable => function_value(tree, node).is_some(),
        _ => false,
    }
}

/// The function expression a JS/TS declarator is initialized with.
fn function_value<'t>(tree: &SourceTree<'_>, node: Node<'t>) -> Option<Node<'t>> {
    if node.kind() != "variable_declarator" {
        return None;
    }
    let value = unwrap_expr(tree, node.child_by_field_name("value")?);
    (tree.classify(value) == NodeClass::Lambda).then_some(value)
}

fn is_c_family(lang: SupportedLanguage) -> bool {
    matches!(lang, SupportedLanguage::C | SupportedLanguage::Cpp)
}

fn is_js_family(lang: SupportedLanguage) -> bool {
    matches!(
        lang,
        SupportedLanguage::JavaScript | SupportedLanguage::TypeScript | SupportedLanguage::Tsx
    )
}

/// Name (and owner, for `Owner::name`) a declarator ultimately declares.
fn declarator_target(tree: &SourceTree<'_>, node: Node<'_>) -> Option<(String, Option<String>)> {
    match node.kind() {
        "identifier" | "field_identifier" | "type_identifier" | "destructor_name"
        | "operator_name" => Some((tree.text(node).to_string(), None)),
        "template_function" => declarator_target(tree, node.child_by_field_name("name")?),
        "qualified_identifier" => {
            let (name, inner_owner) = declarator_target(tree, node.child_by_field_name("name")?)?;
            let owner = inner_owner.or_else(|| {
                field_text(tree, node, "scope").map(|s| last_segment(strip_generics(s)).to_string())
            });
            Some((name, owner))
        }
        _ => None,
    }
}

/// Walk a C declarator chain down to its function declarator, if any.
fn find_function_declarator(node: Node<'_>) -> Option<Node<'_>> {
    let mut node = node;
    loop {
        if node.kind() == "function_declarator" {
            return Some(node);
        }
        node = match node.kind() {
            "pointer_declarator" | "reference_declarator" | "attributed_declarator" => node
                .child_by_field_name("declarator")
                .or_else(|| named_children(node).into_iter().last())?,
            _ => return None,
        };
    }
}

/// Identifier declared by a (non-function) C declarator.
fn declarator_identifier<'src>(tree: &SourceTree<'src>, node: Node<'_>) -> Option<&'src str> {
    let mut node = node;
    loop {
        match node.kind() {
            "identifier" | "field_identifier" => return Some(tree.text(node)),
            "init_declarator" | "pointer_declarator" | "array_declarator"
            | "reference_declarator" | "parenthesized_declarator" | "attributed_declarator"
            | "function_declarator" => {
                node = node
                    .child_by_field_name("declarator")
                    .or_else(|| named_children(node).into_iter().next())?;
            }
            _ => return None,
        }
    }
}

/// Pending work of the tree walk; state restores sit below the children
/// they bracket.
enum Step<'t> {
    Visit(Node<'t>),
    LeaveScope,
    RestoreImpl(Option<String>),
    LeaveAnonymous,
}

fn schedule<'t>(stack: &mut Vec<Step<'t>>, node: Node<'t>) {
    stack.extend(children(node).into_iter().rev().map(Step::Visit));
}

/// What a declaration node declares.
struct Declaration {
    name: String,
    is_class: bool,
    owner: Option<String>,
    receiver_name: Option<String>,
}

struct SymbolWalker<'a, 'src> {
    tree: &'a SourceTree<'src>,
    lang: SupportedLanguage,
    symbols: Vec<ExtractedSymbol>,
    prototypes: Vec<bool>,
    scope_keys: HashMap<DeclKey, usize>,
    decorator_calls: Vec<ExtractedCall>,
    scope: Vec<usize>,
    /// Owner type of the Rust `impl` block being walked.
    current_impl: Option<String>,
    impl_traits: Vec<(String, String)>,
    anonymous_depth: usize,
    variable_names: HashSet<String>,
}

impl<'a, 'src> SymbolWalker<'a, 'src> {
    fn new(tree: &'a SourceTree<'src>) -> Self {
        Self {
            tree,
            lang: tree.language(),
            symbols: Vec::new(),
            prototypes: Vec::new(),
            scope_keys: HashMap::new(),
            decorator_calls: Vec::new(),
            scope: Vec::new(),
            current_impl: None,
            impl_traits: Vec::new(),
            anonymous_depth: 0,
            variable_names: HashSet::new(),
        }
    }

    fn module_level(&self) -> bool {
        self.scope.is_empty() && self.current_impl.is_none() && self.anonymous_depth == 0
    }

    fn enclosing_is_class(&self) -> bool {
        self.scope
            .last()
            .is_some_and(|&idx| self.symbols[idx].kind == SymbolKind::Class)
    }

    fn walk<'t>(&mut self, root: Node<'t>) {
        let mut stack = vec![Step::Visit(root)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Visit(node) => self.visit(node, &mut stack),
                Step::LeaveScope => {
                    self.scope.pop();
                }
                Step::RestoreImpl(owner) => self.current_impl = owner,
                Step::LeaveAnonymous => self.anonymous_depth -= 1,
            }
        }
    }

    fn visit<'t>(&mut self, node: Node<'t>, stack: &mut Vec<Step<'t>>) {
        if node.kind() == "type_definition" && self.visit_type_definition(node, stack) {
            return;
        }
        match self.tree.classify(node) {
            NodeClass::Decorated => {
                let decorators: Vec<Node<'_>> = named_children(node)
                    .into_iter()
                    .filter(|child| self.tree.classify(*child) == NodeClass::Decorator)
                    .collect();
                match node.child_by_field_name("definition") {
                    Some(definition) => self.declare(definition, &decorators, stack),
                    None => schedule(stack, node),
                }
            }
            NodeClass::Function | NodeClass::Class => {
                let decorators = self.attached_decorators(node);
                self.declare(node, &decorators, stack);
            }
            NodeClass::ImplBlock => self.visit_impl(node, stack),
            NodeClass::Variable => {
                if !self.visit_variable(node, stack) {
                    schedule(stack, node);
                }
            }
            NodeClass::Lambda | NodeClass::Comprehension => {
                self.anonymous_depth += 1;
                stack.push(Step::LeaveAnonymous);
                schedule(stack, node);
            }
            _ => schedule(stack, node),
        }
    }

    // ─── Declarations ───────────────────────────────────────

    fn describe(&self, node: Node<'_>) -> Option<Declaration> {
        let tree = self.tree;
        let is_class = tree.classify(node) == NodeClass::Class;
        if is_c_family(self.lang) {
            if is_class {
                node.child_by_field_name("body")?;
                let name = field_text(tree, node, "name")?;
                return Some(Declaration {
                    name: last_segment(strip_generics(name)).to_string(),
                    is_class,
                    owner: None,
                    receiver_name: None,
                });
            }
            let function = find_function_declarator(node.child_by_field_name("declarator")?)?;
            let (name, owner) = declarator_target(tree, function.child_by_field_name("declarator")?)?;
            return Some(Declaration {
                name,
                is_class,
                owner,
                receiver_name: None,
            });
        }

        let name = field_text(tree, node, "name")?.to_string();
        let (owner, receiver_name) = if node.kind() == "method_declaration" && self.lang == SupportedLanguage::Go {
            self.go_receiver(node)
        } else {
            (None, None)
        };
        Some(Declaration {
            name,
            is_class,
            owner,
            receiver_name,
        })
    }

    /// Owner type and bound name of a Go method receiver.
    fn go_receiver(&self, node: Node<'_>) -> (Option<String>, Option<String>) {
        let Some(param) = node
            .child_by_field_name("receiver")
            .and_then(|list| named_children(list).into_iter().next())
        else {
            return (None, None);
        };
        let owner = field_text(self.tree, param, "type")
            .map(|t| strip_generics(t.trim_start_matches('*')).to_string());
        let name = field_text(self.tree, param, "name").map(str::to_string);
        (owner, name)
    }

    fn declare<'t>(&mut self, node: Node<'t>, decorators: &[Node<'_>], stack: &mut Vec<Step<'t>>) {
        let Some(decl) = self.describe(node) else {
            schedule(stack, node);
            return;
        };
        let parent = self.scope.last().copied();
        let owner = decl.owner.or_else(|| self.current_impl.clone());
        let kind = if decl.is_class {
            SymbolKind::Class
        } else if owner.is_some() || self.enclosing_is_class() {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        };

        let mut records = Vec::with_capacity(decorators.len());
        let mut pending_calls = Vec::new();
        for decorator in decorators {
            let (record, call) = self.decorator_record(*decorator);
            records.push(record);
            if let Some(call) = call {
                pending_calls.push(call);
            }
        }

        let idx = self.push_symbol(
            ExtractedSymbol {
                visibility: Visibility::from_name(&decl.name),
                name: decl.name,
                kind,
                parent,
                decorators: records,
                parameters: self.parameters(node),
                return_type: self.return_type(node),
                bases: if decl.is_class { self.bases(node) } else { Vec::new() },
                owner,
                receiver_name: decl.receiver_name,
                span: self.tree.span(node),
                profile: SymbolProfile::default(),
            },
            node,
        );
        self.scope_keys.insert(decl_key(node), idx);

        for mut call in pending_calls {
            call.caller = parent;
            call.decorates = Some(idx);
            self.decorator_calls.push(call);
        }

        let saved_impl = self.current_impl.take();
        self.scope.push(idx);
        stack.push(Step::RestoreImpl(saved_impl));
        stack.push(Step::LeaveScope);
        schedule(stack, node);
    }

    fn push_symbol(&mut self, mut symbol: ExtractedSymbol, node: Node<'_>) -> usize {
        symbol.profile = profile::describe(self.tree, node, &symbol);
        self.symbols.push(symbol);
        self.prototypes.push(false);
        self.symbols.len() - 1
    }

    /// Rust `impl [Trait for] Type { .. }`: members become methods of `Type`.
    fn visit_impl<'t>(&mut self, node: Node<'t>, stack: &mut Vec<Step<'t>>) {
        let owner = field_text(self.tree, node, "type")
            .map(|t| last_segment(strip_generics(t)).to_string());
        if let (Some(owner), Some(trait_name)) = (&owner, field_text(self.tree, node, "trait")) {
            self.impl_traits
                .push((owner.clone(), last_segment(strip_generics(trait_name)).to_string()));
        }
        let saved = std::mem::replace(&mut self.current_impl, owner);
        stack.push(Step::RestoreImpl(saved));
        schedule(stack, node.child_by_field_name("body").unwrap_or(node));
    }

    /// `typedef struct { .. } Name;` declares `Name`. Returns false for plain aliases.
    fn visit_type_definition<'t>(&mut self, node: Node<'t>, stack: &mut Vec<Step<'t>>) -> bool {
        let Some(aggregate) = node.child_by_field_name("type") else {
            return false;
        };
        if self.tree.classify(aggregate) != NodeClass::Class
            || aggregate.child_by_field_name("name").is_some()
        {
            return false;
        }
        let Some(body) = aggregate.child_by_field_name("body") else {
            return false;
        };
        let Some(name) = node
            .child_by_field_name("declarator")
            .and_then(|d| declarator_identifier(self.tree, d))
        else {
            return false;
        };
        let idx = self.push_symbol(
            ExtractedSymbol {
                name: name.to_string(),
                kind: SymbolKind::Class,
                parent: self.scope.last().copied(),
                visibility: Visibility::from_name(name),
                decorators: Vec::new(),
                parameters: Vec::new(),
                return_type: None,
                bases: Vec::new(),
                owner: None,
                receiver_name: None,
                span: self.tree.span(aggregate),
                profile: SymbolProfile::default(),
            },
            node,
        );
        self.scope_keys.insert(decl_key(aggregate), idx);
        self.scope.push(idx);
        stack.push(Step::LeaveScope);
        schedule(stack, body);
        true
    }

    // ─── Variables ──────────────────────────────────────────

    /// Record variable declarations. Returns true when the node was fully handled.
    fn visit_variable<'t>(&mut self, node: Node<'t>, stack: &mut Vec<Step<'t>>) -> bool {
        let tree = self.tree;
        match node.kind() {
            "assignment" => {
                if let Some(left) = node.child_by_field_name("left") {
                    for name in self.pattern_names(left) {
                        self.add_variable(name, node);
                    }
                }
                false
            }
            "variable_declarator" => {
                if let Some(value) = function_value(tree, node) {
                    self.declare_function_value(node, value, stack);
                    return true;
                }
                if let Some(name) = node.child_by_field_name("name") {
                    if name.kind() == "identifier" {
                        self.add_variable(tree.text(name), node);
                    }
                }
                false
            }
            "const_item" | "static_item" => {
                if let Some(name) = field_text(tree, node, "name") {
                    self.add_variable(name, node);
                }
                false
            }
            "var_spec" | "const_spec" => {
                let mut cursor = node.walk();
                let names: Vec<&str> = node
                    .children_by_field_name("name", &mut cursor)
                    .map(|n| tree.text(n))
                    .collect();
                for name in names {
                    self.add_variable(name, node);
                }
                false
            }
            "declaration" | "field_declaration" => {
                self.visit_c_declaration(node);
                false
            }
            _ => false,
        }
    }

    fn pattern_names(&self, pattern: Node<'_>) -> Vec<&'src str> {
        match pattern.kind() {
            "identifier" => vec![self.tree.text(pattern)],
            "pattern_list" | "tuple_pattern" | "list_pattern" => named_children(pattern)
                .into_iter()
                .filter(|n| n.kind() == "identifier")
                .map(|n| self.tree.text(n))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn add_variable(&mut self, name: &str, node: Node<'_>) {
        if !self.module_level() || !self.variable_names.insert(name.to_string()) {
            return;
        }
        self.push_symbol(
            ExtractedSymbol {
                name: name.to_string(),
                kind: SymbolKind::Variable,
                parent: None,
                visibility: Visibility::from_name(name),
                decorators: Vec::new(),
                parameters: Vec::new(),
                return_type: None,
                bases: Vec::new(),
                owner: None,
                receiver_name: None,
                span: self.tree.span(node),
                profile: SymbolProfile::default(),
            },
            node,
        );
    }

    /// `const f = (..) => ..` declares a function named `f`.
    fn declare_function_value<'t>(&mut self, declarator: Node<'t>, value: Node<'t>, stack: &mut Vec<Step<'t>>) {
        let Some(name) = field_text(self.tree, declarator, "name") else {
            return;
        };
        let parent = self.scope.last().copied();
        let idx = self.push_symbol(
            ExtractedSymbol {
                name: name.to_string(),
                kind: SymbolKind::Function,
                parent,
                visibility: Visibility::from_name(name),
                decorators: Vec::new(),
                parameters: self.parameters(value),
                return_type: self.return_type(value),
                bases: Vec::new(),
                owner: None,
                receiver_name: None,
                span: self.tree.span(declarator),
                profile: SymbolProfile::default(),
            },
            declarator,
        );
        self.scope_keys.insert(decl_key(declarator), idx);
        self.scope.push(idx);
        stack.push(Step::LeaveScope);
        schedule(stack, value);
    }

    /// C/C++ declarations: prototypes become functions (or methods inside a
    /// class body), module-level declarators become variables.
    fn visit_c_declaration(&mut self, node: Node<'_>) {
        let in_class = self.enclosing_is_class();
        if !in_class && !self.module_level() {
            return;
        }
        let declarators: Vec<Node<'_>> = {
            let mut cursor = node.walk();
            node.children_by_field_name("declarator", &mut cursor).collect()
        };
        for declarator in declarators {
            let prototype = find_function_declarator(declarator).and_then(|function| {
                let target = declarator_target(self.tree, function.child_by_field_name("declarator")?)?;
                Some((function, target))
            });
            match prototype {
                Some((function, (name, owner))) => {
                    let kind = if in_class || owner.is_some() {
                        SymbolKind::Method
                    } else {
                        SymbolKind::Function
                    };
                    let idx = self.push_symbol(
                        ExtractedSymbol {
                            visibility: Visibility::from_name(&name),
                            name,
                            kind,
                            parent: self.scope.last().copied(),
                            decorators: Vec::new(),
                            parameters: self.parameter_list(function.child_by_field_name("parameters")),
                            return_type: field_text(self.tree, node, "type").map(collapse_whitespace),
                            bases: Vec::new(),
                            owner,
                            receiver_name: None,
                            span: self.tree.span(node),
                            profile: SymbolProfile::default(),
                        },
                        node,
                    );
                    self.prototypes[idx] = true;
                }
                None if !in_class && node.kind() == "declaration" => {
                    if let Some(name) = declarator_identifier(self.tree, declarator) {
                        self.add_variable(name, node);
                    }
                }
                None => {}
            }
        }
    }

    // ─── Signatures ─────────────────────────────────────────

    fn parameters(&self, node: Node<'_>) -> Vec<Parameter> {
        if is_c_family(self.lang) {
            let list = node
                .child_by_field_name("declarator")
                .and_then(find_function_declarator)
                .and_then(|f| f.child_by_field_name("parameters"));
            return self.parameter_list(list);
        }
        if let Some(single) = node.child_by_field_name("parameter") {
            return vec![Parameter::plain(self.tree.text(single))];
        }
        self.parameter_list(node.child_by_field_name("parameters"))
    }

    fn parameter_list(&self, list: Option<Node<'_>>) -> Vec<Parameter> {
        let Some(list) = list else {
            return Vec::new();
        };
        let mut params = Vec::new();
        for param in named_children(list) {
            self.push_parameter(param, &mut params);
        }
        params
    }

    fn push_parameter(&self, param: Node<'_>, out: &mut Vec<Parameter>) {
        let tree = self.tree;
        let text = |node: Node<'_>| tree.text(node).to_string();
        match param.kind() {
            "identifier" | "tuple_pattern" | "object_pattern" | "array_pattern" => {
                out.push(Parameter::plain(collapse_whitespace(tree.text(param))))
            }
            "default_parameter" | "typed_default_parameter" | "optional_parameter_declaration" => {
                let name = match param.kind() {
                    "optional_parameter_declaration" => param
                        .child_by_field_name("declarator")
                        .and_then(|d| declarator_identifier(tree, d))
                        .map(str::to_string),
                    _ => field_text(tree, param, "name").map(str::to_string),
                };
                if let Some(name) = name {
                    out.push(Parameter {
                        has_default: true,
                        ..Parameter::plain(name)
                    });
                }
            }
            "typed_parameter" => {
                if let Some(inner) = first_named(param) {
                    self.push_parameter(inner, out);
                }
            }
            "list_splat_pattern" | "rest_pattern" | "variadic_parameter" => {
                let name = first_named(param).map(text).unwrap_or_else(|| "...".to_string());
                out.push(Parameter {
                    variadic_positional: true,
                    ..Parameter::plain(name)
                });
            }
            "dictionary_splat_pattern" => {
                let name = first_named(param).map(text).unwrap_or_default();
                out.push(Parameter {
                    variadic_keyword: true,
                    ..Parameter::plain(name)
                });
            }
            "parameter" => {
                if let Some(pattern) = field_text(tree, param, "pattern") {
                    out.push(Parameter::plain(pattern));
                }
            }
            "self_parameter" => out.push(Parameter::plain("self")),
            "parameter_declaration" if self.lang == SupportedLanguage::Go => {
                let mut cursor = param.walk();
                for name in param.children_by_field_name("name", &mut cursor) {
                    out.push(Parameter::plain(text(name)));
                }
            }
            "parameter_declaration" => {
                if let Some(name) = param
                    .child_by_field_name("declarator")
                    .and_then(|d| declarator_identifier(tree, d))
                {
                    out.push(Parameter::plain(name));
                }
            }
            "variadic_parameter_declaration" => {
                let name = field_text(tree, param, "name").unwrap_or("...");
                out.push(Parameter {
                    variadic_positional: true,
                    ..Parameter::plain(name)
                });
            }
            "formal_parameter" => {
                if let Some(name) = field_text(tree, param, "name") {
                    out.push(Parameter::plain(name));
                }
            }
            "spread_parameter" => {
                let name = named_children(param)
                    .into_iter()
                    .find(|n| n.kind() == "variable_declarator")
                    .and_then(|d| field_text(tree, d, "name"))
                    .unwrap_or("...");
                out.push(Parameter {
                    variadic_positional: true,
                    ..Parameter::plain(name)
                });
            }
            "required_parameter" | "optional_parameter" => {
                let Some(pattern) = param.child_by_field_name("pattern") else {
                    return;
                };
                if pattern.kind() == "rest_pattern" {
                    self.push_parameter(pattern, out);
                    return;
                }
                out.push(Parameter {
                    has_default: param.kind() == "optional_parameter"
                        || param.child_by_field_name("value").is_some(),
                    ..Parameter::plain(collapse_whitespace(tree.text(pattern)))
                });
            }
            "assignment_pattern" => {
                if let Some(left) = field_text(tree, param, "left") {
                    out.push(Parameter {
                        has_default: true,
                        ..Parameter::plain(left)
                    });
                }
            }
            _ => {}
        }
    }

    fn return_type(&self, node: Node<'_>) -> Option<String> {
        let field = match self.lang {
            SupportedLanguage::Go => "result",
            SupportedLanguage::Java | SupportedLanguage::C | SupportedLanguage::Cpp => "type",
            _ => "return_type",
        };
        if self.tree.classify(node) == NodeClass::Class {
            return None;
        }
        let text = field_text(self.tree, node, field)?;
        let text = text.trim_start_matches(':').trim();
        (!text.is_empty()).then(|| collapse_whitespace(text))
    }

    fn bases(&self, node: Node<'_>) -> Vec<String> {
        let tree = self.tree;
        let mut bases = Vec::new();
        let mut push = |node: Node<'_>| {
            let name = strip_generics(tree.text(node));
            if !name.is_empty() {
                bases.push(collapse_whitespace(name));
            }
        };
        match self.lang {
            SupportedLanguage::Python => {
                if let Some(list) = node.child_by_field_name("superclasses") {
                    named_children(list)
                        .into_iter()
                        .filter(|n| {
                            !matches!(
                                n.kind(),
                                "keyword_argument" | "list_splat" | "dictionary_splat"
                            )
                        })
                        .for_each(&mut push);
                }
            }
            SupportedLanguage::Java => {
                for child in named_children(node) {
                    match child.kind() {
                        "superclass" => named_children(child).into_iter().for_each(&mut push),
                        "super_interfaces" | "extends_interfaces" => named_children(child)
                            .into_iter()
                            .flat_map(named_children)
                            .for_each(&mut push),
                        _ => {}
                    }
                }
            }
            SupportedLanguage::Cpp | SupportedLanguage::C => {
                for child in named_children(node) {
                    if child.kind() == "base_class_clause" {
                        named_children(child)
                            .into_iter()
                            .filter(|n| n.kind() != "access_specifier")
                            .for_each(&mut push);
                    }
                }
            }
            lang if is_js_family(lang) => {
                for child in named_children(node) {
                    match child.kind() {
                        "class_heritage" => {
                            for clause in named_children(child) {
                                match clause.kind() {
                                    "extends_clause" | "implements_clause" => {
                                        named_children(clause)
                                            .into_iter()
                                            .filter(|n| n.kind() != "type_arguments")
                                            .for_each(&mut push)
                                    }
                                    _ => push(clause),
                                }
                            }
                        }
                        "extends_type_clause" => {
                            named_children(child).into_iter().for_each(&mut push)
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        bases
    }

    // ─── Decorators ─────────────────────────────────────────

    /// Annotations and decorators written as part of (or just before) a declaration.
    fn attached_decorators<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        let tree = self.tree;
        let mut found = Vec::new();
        let mut previous = node.prev_named_sibling();
        while let Some(sibling) = previous {
            if sibling.kind() != "decorator" {
                break;
            }
            found.push(sibling);
            previous = sibling.prev_named_sibling();
        }
        found.reverse();
        for child in named_children(node) {
            if child.kind() == "modifiers" {
                found.extend(
                    named_children(child)
                        .into_iter()
                        .filter(|n| tree.classify(*n) == NodeClass::Decorator),
                );
            } else if child.kind() == "decorator" {
                found.push(child);
            }
        }
        found
    }

    /// Record for one decorator, plus its call when applied with call syntax.
    fn decorator_record(&self, node: Node<'_>) -> (Decorator, Option<ExtractedCall>) {
        let tree = self.tree;
        if matches!(node.kind(), "annotation" | "marker_annotation") {
            let name = field_text(tree, node, "name").unwrap_or("").to_string();
            let record = Decorator {
                expression: collapse_whitespace(tree.text(node).trim_start_matches('@')),
                callee: name.clone(),
                has_call: node.kind() == "annotation",
            };
            let call = record.has_call.then(|| ExtractedCall {
                name: last_segment(&name).to_string(),
                receiver: None,
                callee: name,
                kind: CallKind::DecoratorCall,
                caller: None,
                arguments: argument_shape(tree, node.child_by_field_name("arguments")),
                decorates: None,
                span: tree.span(node),
            });
            return (record, call);
        }

        let Some(expression) = named_children(node).into_iter().next() else {
            let record = Decorator {
                expression: String::new(),
                callee: String::new(),
                has_call: false,
            };
            return (record, None);
        };
        let text = collapse_whitespace(tree.text(expression));
        if tree.classify(expression) != NodeClass::Call {
            let record = Decorator {
                expression: text,
                callee: normalize_expr(tree, expression),
                has_call: false,
            };
            return (record, None);
        }
        let (callee, arguments) = call_parts(tree, expression);
        let record = Decorator {
            expression: text,
            callee: callee.callee.clone(),
            has_call: true,
        };
        let call = ExtractedCall {
            callee: callee.callee,
            name: callee.name,
            receiver: callee.receiver,
            kind: CallKind::DecoratorCall,
            caller: None,
            arguments: argument_shape(tree, arguments),
            decorates: None,
            span: tree.span(expression),
        };
        (record, Some(call))
    }

    // ─── Finalization ───────────────────────────────────────

    /// Attach out-of-body methods to their owners and fold duplicate
    /// C/C++ declarations into one symbol.
    fn finish(mut self) -> SymbolFacts {
        let mut classes: HashMap<String, usize> = HashMap::new();
        for (idx, symbol) in self.symbols.iter().enumerate() {
            if symbol.kind == SymbolKind::Class && symbol.parent.is_none() {
                classes.entry(symbol.name.clone()).or_insert(idx);
            }
        }
        for idx in 0..self.symbols.len() {
            let symbol = &self.symbols[idx];
            if symbol.parent.is_some() || symbol.kind == SymbolKind::Class {
                continue;
            }
            if let Some(&class) = symbol.owner.as_ref().and_then(|o| classes.get(o)) {
                self.symbols[idx].parent = Some(class);
            }
        }
        for (owner, trait_name) in std::mem::take(&mut self.impl_traits) {
            if let Some(&class) = classes.get(&owner) {
                let bases = &mut self.symbols[class].bases;
                if !bases.contains(&trait_name) {
                    bases.push(trait_name);
                }
            }
        }

        let replaced = self.duplicate_declarations();
        if replaced.iter().all(Option::is_none) {
            return SymbolFacts {
                symbols: self.symbols,
                scope_keys: self.scope_keys,
                decorator_calls: self.decorator_calls,
            };
        }

        // Compact, redirecting every reference to a dropped symbol to its survivor.
        let mut new_index = vec![0usize; self.symbols.len()];
        let mut kept = Vec::new();
        for (idx, symbol) in self.symbols.iter().enumerate() {
            if replaced[idx].is_none() {
                new_index[idx] = kept.len();
                kept.push(symbol.clone());
            }
        }
        for idx in 0..replaced.len() {
            if let Some(survivor) = replaced[idx] {
                new_index[idx] = new_index[survivor];
            }
        }
        for symbol in &mut kept {
            symbol.parent = symbol.parent.map(|p| new_index[p]);
        }
        let scope_keys = self
            .scope_keys
            .into_iter()
            .map(|(key, idx)| (key, new_index[idx]))
            .collect();
        let decorator_calls = self
            .decorator_calls
            .into_iter()
            .map(|mut call| {
                call.caller = call.caller.map(|c| new_index[c]);
                call.decorates = call.decorates.map(|d| new_index[d]);
                call
            })
            .collect();
        SymbolFacts {
            symbols: kept,
            scope_keys,
            decorator_calls,
        }
    }

    /// For each symbol, the symbol it duplicates (if it should be dropped).
    fn duplicate_declarations(&self) -> Vec<Option<usize>> {
        let mut replaced = vec![None; self.symbols.len()];
        if !is_c_family(self.lang) {
            return replaced;
        }
        // Top-level: a definition wins over prototypes, else the first prototype.
        let mut first_top_level: HashMap<&str, usize> = HashMap::new();
        for (idx, symbol) in self.symbols.iter().enumerate() {
            if symbol.parent.is_none() && symbol.kind == SymbolKind::Function && !self.prototypes[idx] {
                first_top_level.entry(symbol.name.as_str()).or_insert(idx);
            }
        }
        for (idx, symbol) in self.symbols.iter().enumerate() {
            if symbol.parent.is_none() && symbol.kind == SymbolKind::Function && self.prototypes[idx] {
                match first_top_level.get(symbol.name.as_str()) {
                    Some(&survivor) if survivor != idx => replaced[idx] = Some(survivor),
                    Some(_) => {}
                    None => {
                        first_top_level.insert(symbol.name.as_str(), idx);
                    }
                }
            }
        }
        // Members: an out-of-line definition folds into the in-class declaration.
        let mut declared: HashMap<(usize, &str), usize> = HashMap::new();
        for (idx, symbol) in self.symbols.iter().enumerate() {
            if let Some(parent) = symbol.parent {
                if self.prototypes[idx] {
                    declared.entry((parent, symbol.name.as_str())).or_insert(idx);
                }
            }
        }
        for (idx, symbol) in self.symbols.iter().enumerate() {
            if self.prototypes[idx] || symbol.owner.is_none() {
                continue;
            }
            if let Some(&survivor) = symbol
                .parent
                .and_then(|p| declared.get(&(p, symbol.name.as_str())))
            {
                replaced[idx] = Some(survivor);
            }
        }
        replaced
    }
}
