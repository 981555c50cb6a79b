//
//  grammar.rs
//  Factgraph
//

//! Per-language node-kind tables.
//!
//! Every extractor walks raw tree-sitter nodes; this module is the one place
//! that knows which concrete node kinds play which semantic role in each
//! grammar. Upper layers only see [`NodeClass`] plus a handful of lookups.

use super::language::SupportedLanguage;

/// Semantic role of a syntax node, shared by all grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    /// Named function or method declaration.
    Function,
    /// Class-like declaration (class, struct, enum, trait, interface, record).
    Class,
    /// Rust `impl` block: methods for a type declared elsewhere.
    ImplBlock,
    /// Wrapper holding decorators plus the declaration they apply to.
    Decorated,
    /// Variable or constant declaration (only recorded at module level).
    Variable,
    /// Anonymous function. A scope boundary, never a symbol.
    Lambda,
    /// Comprehension or generator body. A scope boundary, never a symbol.
    Comprehension,
    /// Plain call expression.
    Call,
    /// `new T(..)`, `this(..)`, `super(..)` and friends.
    ConstructorCall,
    /// Macro invocation (`name!(..)`).
    MacroCall,
    /// Decorator or annotation.
    Decorator,
    /// Import-like statement.
    Import,
    Other,
}

/// A receiver-and-name shaped node, e.g. `obj.attr` or `Type::name`.
#[derive(Debug, Clone, Copy)]
pub struct MemberShape {
    pub kind: &'static str,
    pub object_field: &'static str,
    pub name_field: &'static str,
    pub separator: &'static str,
}

/// Node-kind tables for one grammar.
#[derive(Debug)]
pub struct Grammar {
    pub functions: &'static [&'static str],
    pub classes: &'static [&'static str],
    pub impl_blocks: &'static [&'static str],
    pub decorated: &'static [&'static str],
    pub variables: &'static [&'static str],
    pub lambdas: &'static [&'static str],
    pub comprehensions: &'static [&'static str],
    pub calls: &'static [&'static str],
    pub constructor_calls: &'static [&'static str],
    pub macro_calls: &'static [&'static str],
    pub decorators: &'static [&'static str],
    pub imports: &'static [&'static str],
    /// Member access shapes used for callee receivers.
    pub members: &'static [MemberShape],
    /// Wrappers looked through when classifying a callee: (kind, inner field).
    /// An empty field means "first named child".
    pub wrappers: &'static [(&'static str, &'static str)],
    /// Literal node kinds with their placeholder label.
    pub literals: &'static [(&'static str, &'static str)],
    /// Receivers that denote the enclosing instance or class.
    pub self_receivers: &'static [&'static str],
    /// Receivers that denote the base classes of the enclosing class.
    pub super_receivers: &'static [&'static str],
    /// Initializer method names searched for constructor targets.
    pub initializers: &'static [&'static str],
    /// Whether a method named after its class is an initializer (Java, C++).
    pub class_named_initializer: bool,
    pub builtins: &'static [&'static str],
    /// Separator used when writing qualified names for this language.
    pub separator: &'static str,
}

impl Grammar {
    /// Classify a node kind.
    pub fn classify(&self, kind: &str) -> NodeClass {
        if self.calls.contains(&kind) {
            NodeClass::Call
        } else if self.functions.contains(&kind) {
            NodeClass::Function
        } else if self.classes.contains(&kind) {
            NodeClass::Class
        } else if self.impl_blocks.contains(&kind) {
            NodeClass::ImplBlock
        } else if self.decorated.contains(&kind) {
            NodeClass::Decorated
        } else if self.variables.contains(&kind) {
            NodeClass::Variable
        } else if self.lambdas.contains(&kind) {
            NodeClass::Lambda
        } else if self.comprehensions.contains(&kind) {
            NodeClass::Comprehension
        } else if self.constructor_calls.contains(&kind) {
            NodeClass::ConstructorCall
        } else if self.macro_calls.contains(&kind) {
            NodeClass::MacroCall
        } else if self.decorators.contains(&kind) {
            NodeClass::Decorator
        } else if self.imports.contains(&kind) {
            NodeClass::Import
        } else {
            NodeClass::Other
        }
    }

    /// Placeholder label for a literal node kind (`"hello"` → `str`).
    pub fn literal_label(&self, kind: &str) -> Option<&'static str> {
        self.literals
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, label)| *label)
    }

    pub fn member_shape(&self, kind: &str) -> Option<&MemberShape> {
        self.members.iter().find(|shape| shape.kind == kind)
    }

    pub fn wrapper_field(&self, kind: &str) -> Option<&'static str> {
        self.wrappers
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, field)| *field)
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains(&name)
    }

    pub fn is_self_receiver(&self, receiver: &str) -> bool {
        self.self_receivers.contains(&receiver)
    }

    pub fn is_super_receiver(&self, receiver: &str) -> bool {
        self.super_receivers.contains(&receiver)
    }
}

/// Look up the tables for a language.
pub fn grammar_for(lang: SupportedLanguage) -> &'static Grammar {
    match lang {
        SupportedLanguage::Python => &PYTHON,
        SupportedLanguage::Rust => &RUST,
        SupportedLanguage::Go => &GO,
        SupportedLanguage::Java => &JAVA,
        SupportedLanguage::JavaScript | SupportedLanguage::TypeScript | SupportedLanguage::Tsx => {
            &JAVASCRIPT
        }
        SupportedLanguage::C => &C,
        SupportedLanguage::Cpp => &CPP,
    }
}

// ─── Python ─────────────────────────────────────────────────

static PYTHON: Grammar = Grammar {
    functions: &["function_definition"],
    classes: &["class_definition"],
    impl_blocks: &[],
    decorated: &["decorated_definition"],
    variables: &["assignment"],
    lambdas: &["lambda"],
    comprehensions: &[
        "list_comprehension",
        "set_comprehension",
        "dictionary_comprehension",
        "generator_expression",
    ],
    calls: &["call"],
    constructor_calls: &[],
    macro_calls: &[],
    decorators: &["decorator"],
    imports: &[
        "import_statement",
        "import_from_statement",
        "future_import_statement",
    ],
    members: &[MemberShape {
        kind: "attribute",
        object_field: "object",
        name_field: "attribute",
        separator: ".",
    }],
    wrappers: &[("parenthesized_expression", ""), ("await", "")],
    literals: &[
        ("string", "str"),
        ("concatenated_string", "str"),
        ("integer", "number"),
        ("float", "number"),
        ("list", "list"),
        ("dictionary", "dict"),
        ("set", "set"),
        ("tuple", "tuple"),
        ("true", "bool"),
        ("false", "bool"),
        ("none", "none"),
    ],
    self_receivers: &["self", "cls"],
    super_receivers: &["super()"],
    initializers: &["__init__"],
    class_named_initializer: false,
    builtins: &[
        "abs", "all", "any", "ascii", "bin", "bool", "breakpoint", "bytearray", "bytes",
        "callable", "chr", "classmethod", "compile", "complex", "delattr", "dict", "dir",
        "divmod", "enumerate", "eval", "exec", "filter", "float", "format", "frozenset",
        "getattr", "globals", "hasattr", "hash", "help", "hex", "id", "input", "int",
        "isinstance", "issubclass", "iter", "len", "list", "locals", "map", "max",
        "memoryview", "min", "next", "object", "oct", "open", "ord", "pow", "print",
        "property", "range", "repr", "reversed", "round", "set", "setattr", "slice",
        "sorted", "staticmethod", "str", "sum", "super", "tuple", "type", "vars", "zip",
        "__import__",
    ],
    separator: ".",
};

// ─── Rust ───────────────────────────────────────────────────

static RUST: Grammar = Grammar {
    functions: &["function_item", "function_signature_item"],
    classes: &["struct_item", "enum_item", "union_item", "trait_item"],
    impl_blocks: &["impl_item"],
    decorated: &[],
    variables: &["const_item", "static_item"],
    lambdas: &["closure_expression"],
    comprehensions: &[],
    calls: &["call_expression"],
    constructor_calls: &[],
    macro_calls: &["macro_invocation"],
    decorators: &[],
    imports: &["use_declaration", "extern_crate_declaration"],
    members: &[
        MemberShape {
            kind: "field_expression",
            object_field: "value",
            name_field: "field",
            separator: ".",
        },
        MemberShape {
            kind: "scoped_identifier",
            object_field: "path",
            name_field: "name",
            separator: "::",
        },
    ],
    wrappers: &[
        ("generic_function", "function"),
        ("parenthesized_expression", ""),
        ("try_expression", ""),
        ("await_expression", ""),
        ("reference_expression", "value"),
    ],
    literals: &[
        ("string_literal", "str"),
        ("raw_string_literal", "str"),
        ("char_literal", "str"),
        ("integer_literal", "number"),
        ("float_literal", "number"),
        ("boolean_literal", "bool"),
        ("array_expression", "list"),
        ("tuple_expression", "tuple"),
    ],
    self_receivers: &["self", "Self"],
    super_receivers: &[],
    initializers: &["new"],
    class_named_initializer: false,
    builtins: &[
        "println!", "print!", "eprintln!", "eprint!", "format!", "format_args!", "write!",
        "writeln!", "vec!", "panic!", "assert!", "assert_eq!", "assert_ne!",
        "debug_assert!", "debug_assert_eq!", "debug_assert_ne!", "unreachable!", "todo!",
        "unimplemented!", "matches!", "dbg!", "env!", "option_env!", "concat!",
        "stringify!", "include!", "include_str!", "include_bytes!", "cfg!", "line!",
        "column!", "file!", "module_path!", "drop", "Some", "Ok", "Err", "Box::new",
    ],
    separator: "::",
};

// ─── Go ─────────────────────────────────────────────────────

static GO: Grammar = Grammar {
    functions: &["function_declaration", "method_declaration"],
    classes: &["type_spec"],
    impl_blocks: &[],
    decorated: &[],
    variables: &["var_spec", "const_spec"],
    lambdas: &["func_literal"],
    comprehensions: &[],
    calls: &["call_expression"],
    constructor_calls: &[],
    macro_calls: &[],
    decorators: &[],
    imports: &["import_declaration"],
    members: &[MemberShape {
        kind: "selector_expression",
        object_field: "operand",
        name_field: "field",
        separator: ".",
    }],
    wrappers: &[("parenthesized_expression", "")],
    literals: &[
        ("interpreted_string_literal", "str"),
        ("raw_string_literal", "str"),
        ("rune_literal", "str"),
        ("int_literal", "number"),
        ("float_literal", "number"),
        ("imaginary_literal", "number"),
        ("composite_literal", "composite"),
        ("true", "bool"),
        ("false", "bool"),
    ],
    self_receivers: &[],
    super_receivers: &[],
    initializers: &[],
    class_named_initializer: false,
    builtins: &[
        "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len",
        "make", "max", "min", "new", "panic", "print", "println", "real", "recover",
        "string", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16",
        "uint32", "uint64", "uintptr", "float32", "float64", "byte", "rune", "bool",
    ],
    separator: ".",
};

// ─── Java ───────────────────────────────────────────────────

static JAVA: Grammar = Grammar {
    functions: &[
        "method_declaration",
        "constructor_declaration",
        "compact_constructor_declaration",
    ],
    classes: &[
        "class_declaration",
        "interface_declaration",
        "enum_declaration",
        "record_declaration",
        "annotation_type_declaration",
    ],
    impl_blocks: &[],
    decorated: &[],
    variables: &[],
    lambdas: &["lambda_expression"],
    comprehensions: &[],
    calls: &["method_invocation"],
    constructor_calls: &["object_creation_expression", "explicit_constructor_invocation"],
    macro_calls: &[],
    decorators: &["annotation", "marker_annotation"],
    imports: &["import_declaration"],
    members: &[MemberShape {
        kind: "field_access",
        object_field: "object",
        name_field: "field",
        separator: ".",
    }],
    wrappers: &[("parenthesized_expression", ""), ("cast_expression", "value")],
    literals: &[
        ("string_literal", "str"),
        ("text_block", "str"),
        ("character_literal", "str"),
        ("decimal_integer_literal", "number"),
        ("hex_integer_literal", "number"),
        ("octal_integer_literal", "number"),
        ("binary_integer_literal", "number"),
        ("decimal_floating_point_literal", "number"),
        ("hex_floating_point_literal", "number"),
        ("true", "bool"),
        ("false", "bool"),
        ("null_literal", "null"),
        ("array_initializer", "list"),
    ],
    self_receivers: &["this"],
    super_receivers: &["super"],
    initializers: &[],
    class_named_initializer: true,
    builtins: &[],
    separator: ".",
};

// ─── JavaScript / TypeScript ────────────────────────────────

static JAVASCRIPT: Grammar = Grammar {
    functions: &[
        "function_declaration",
        "generator_function_declaration",
        "function_signature",
        "method_definition",
        "method_signature",
        "abstract_method_signature",
    ],
    classes: &[
        "class_declaration",
        "abstract_class_declaration",
        "interface_declaration",
        "enum_declaration",
    ],
    impl_blocks: &[],
    decorated: &[],
    variables: &["variable_declarator"],
    lambdas: &[
        "arrow_function",
        "function_expression",
        "generator_function",
    ],
    comprehensions: &[],
    calls: &["call_expression"],
    constructor_calls: &["new_expression"],
    macro_calls: &[],
    decorators: &["decorator"],
    imports: &["import_statement", "export_statement"],
    members: &[MemberShape {
        kind: "member_expression",
        object_field: "object",
        name_field: "property",
        separator: ".",
    }],
    wrappers: &[
        ("parenthesized_expression", ""),
        ("await_expression", ""),
        ("non_null_expression", ""),
        ("as_expression", ""),
    ],
    literals: &[
        ("string", "str"),
        ("template_string", "str"),
        ("number", "number"),
        ("array", "list"),
        ("object", "dict"),
        ("regex", "regex"),
        ("true", "bool"),
        ("false", "bool"),
        ("null", "null"),
    ],
    self_receivers: &["this"],
    super_receivers: &["super"],
    initializers: &["constructor"],
    class_named_initializer: false,
    builtins: &[
        "parseInt", "parseFloat", "isNaN", "isFinite", "String", "Number", "Boolean",
        "Array", "Object", "Symbol", "BigInt", "require", "setTimeout", "setInterval",
        "clearTimeout", "clearInterval", "encodeURIComponent", "decodeURIComponent",
        "encodeURI", "decodeURI", "structuredClone", "queueMicrotask",
    ],
    separator: ".",
};

// ─── C / C++ ────────────────────────────────────────────────

static C: Grammar = Grammar {
    functions: &["function_definition"],
    classes: &["struct_specifier", "union_specifier", "enum_specifier"],
    impl_blocks: &[],
    decorated: &[],
    variables: &["declaration"],
    lambdas: &[],
    comprehensions: &[],
    calls: &["call_expression"],
    constructor_calls: &[],
    macro_calls: &[],
    decorators: &[],
    imports: &["preproc_include"],
    members: &[MemberShape {
        kind: "field_expression",
        object_field: "argument",
        name_field: "field",
        separator: ".",
    }],
    wrappers: &[("parenthesized_expression", ""), ("pointer_expression", "argument")],
    literals: &[
        ("string_literal", "str"),
        ("concatenated_string", "str"),
        ("char_literal", "str"),
        ("number_literal", "number"),
        ("true", "bool"),
        ("false", "bool"),
        ("null", "null"),
    ],
    self_receivers: &[],
    super_receivers: &[],
    initializers: &[],
    class_named_initializer: false,
    builtins: &[],
    separator: "::",
};

static CPP: Grammar = Grammar {
    functions: &["function_definition"],
    classes: &[
        "class_specifier",
        "struct_specifier",
        "union_specifier",
        "enum_specifier",
    ],
    impl_blocks: &[],
    decorated: &[],
    variables: &["declaration", "field_declaration"],
    lambdas: &["lambda_expression"],
    comprehensions: &[],
    calls: &["call_expression"],
    constructor_calls: &["new_expression"],
    macro_calls: &[],
    decorators: &[],
    imports: &["preproc_include", "using_declaration"],
    members: &[
        MemberShape {
            kind: "field_expression",
            object_field: "argument",
            name_field: "field",
            separator: ".",
        },
        MemberShape {
            kind: "qualified_identifier",
            object_field: "scope",
            name_field: "name",
            separator: "::",
        },
    ],
    wrappers: &[
        ("parenthesized_expression", ""),
        ("pointer_expression", "argument"),
        ("template_function", "name"),
    ],
    literals: &[
        ("string_literal", "str"),
        ("raw_string_literal", "str"),
        ("concatenated_string", "str"),
        ("char_literal", "str"),
        ("number_literal", "number"),
        ("true", "bool"),
        ("false", "bool"),
        ("nullptr", "null"),
    ],
    self_receivers: &["this"],
    super_receivers: &[],
    initializers: &[],
    class_named_initializer: true,
    builtins: &[],
    separator: "::",
};
