//! Function body traversal: emits call edges in walk order and keeps the
//! symbol table in step with declarations and assignments.
//!
//! Ordering contract: post-order on the callee, pre-order on the arguments.
//! A call is emitted after every call inside its callee expression (the
//! receiver chain, or the body of an immediately-invoked literal) and before
//! every call inside its arguments, so `a.B().C(d.E())` yields `B`, `C`, `E`
//! and `func() { f() }()` yields `f`, `func`.

use super::context::FileContext;
use super::symbols::SymbolTable;
use super::syntax::{expressions, field_children, has_token, named_children, position};
use cf_core::{CallKind, CodeCall, CodeField, CodeImport, FieldScope, Position, TypeRef};
use std::collections::HashMap;
use tree_sitter::Node;

/// Syntax nested deeper than this is not descended into, neither by the
/// walk nor by type inference. Each level costs native stack.
const MAX_NESTING: usize = 512;

/// Output accumulator threaded through the walk of one function.
#[derive(Debug, Default)]
pub(crate) struct BodyFacts {
    pub calls: Vec<CodeCall>,
    pub fields: Vec<CodeField>,
    latest: HashMap<String, usize>,
}

impl BodyFacts {
    fn push_call(&mut self, target: Target, arguments: Vec<Option<TypeRef>>, position: Position) {
        let index = self.calls.len();
        self.calls.push(CodeCall {
            package: target.package,
            type_name: target.type_name,
            function_name: target.name,
            arguments,
            index,
            kind: target.kind,
            position,
        });
    }

    /// One field per declaration. A binding reported twice at the same spot
    /// with the same type (a type-switch alias in two cases of one type) is
    /// kept once.
    pub fn record_field(&mut self, field: CodeField) {
        if field.name.is_empty() || field.name == "_" {
            return;
        }
        let duplicate = self.fields.iter().any(|f| {
            f.name == field.name && f.position == field.position && f.type_ref == field.type_ref
        });
        if duplicate {
            return;
        }
        self.latest.insert(field.name.clone(), self.fields.len());
        self.fields.push(field);
    }

    /// `a, err := ...` re-uses `err`: only a missing type is filled in.
    fn redeclare(&mut self, name: &str, type_ref: Option<TypeRef>) {
        if let Some(&i) = self.latest.get(name) {
            if self.fields[i].type_ref.is_none() {
                self.fields[i].type_ref = type_ref;
            }
        }
    }
}

/// What the expression in front of `.method` turned out to be.
enum Receiver<'i> {
    Package(&'i CodeImport),
    Typed(TypeRef),
    Unknown,
}

struct Target {
    package: Option<String>,
    type_name: Option<String>,
    name: String,
    kind: CallKind,
}

impl Target {
    fn bare(name: impl Into<String>, kind: CallKind) -> Self {
        Self {
            package: None,
            type_name: None,
            name: name.into(),
            kind,
        }
    }
}

pub(crate) struct BodyWalker<'c, 'a> {
    ctx: &'c FileContext<'a>,
    symbols: &'c mut SymbolTable,
    depth: usize,
    truncated: bool,
}

impl<'c, 'a> BodyWalker<'c, 'a> {
    pub fn new(ctx: &'c FileContext<'a>, symbols: &'c mut SymbolTable) -> Self {
        Self {
            ctx,
            symbols,
            depth: 0,
            truncated: false,
        }
    }

    /// Walk the statements of a function body. They share the function
    /// scope with the parameters, as in Go.
    pub fn walk_body(&mut self, body: &Node, out: &mut BodyFacts) {
        self.walk_children(body, out);
    }

    pub fn walk(&mut self, node: &Node, out: &mut BodyFacts) {
        if self.depth >= MAX_NESTING {
            if !self.truncated {
                self.truncated = true;
                tracing::warn!(
                    line = position(node).line,
                    "syntax nested too deeply, skipping the innermost part"
                );
            }
            return;
        }

        self.depth += 1;
        match node.kind() {
            "call_expression" => self.visit_call(node, out),
            "short_var_declaration" => self.visit_short_var(node, out),
            "assignment_statement" => self.visit_assignment(node, out),
            "var_declaration" | "const_declaration" => self.visit_declaration(node, out),
            "func_literal" => self.visit_func_literal(node, out),
            "range_clause" => self.visit_range(node, out),
            "receive_statement" => self.visit_receive(node, out),
            "type_switch_statement" => self.visit_type_switch(node, out),
            "block" | "if_statement" | "for_statement" | "expression_switch_statement"
            | "select_statement" | "expression_case" | "default_case" | "communication_case" => {
                self.symbols.push_scope();
                self.walk_children(node, out);
                self.symbols.pop_scope();
            }
            _ => self.walk_children(node, out),
        }
        self.depth -= 1;
    }

    fn walk_children(&mut self, node: &Node, out: &mut BodyFacts) {
        for child in named_children(node) {
            self.walk(&child, out);
        }
    }

    // ── Calls ──

    fn visit_call(&mut self, node: &Node, out: &mut BodyFacts) {
        let Some(function) = node.child_by_field_name("function") else {
            self.walk_children(node, out);
            return;
        };
        let arguments = node.child_by_field_name("arguments");

        // `new(T)` and `make(T, n)` construct values; they are not call edges.
        if self.is_allocation(&function) {
            if let Some(arguments) = &arguments {
                self.walk(arguments, out);
            }
            return;
        }

        // Receiver chain first.
        let name_position = match function.kind() {
            "identifier" => position(&function),
            "selector_expression" => {
                if let Some(operand) = function.child_by_field_name("operand") {
                    self.walk(&operand, out);
                }
                function
                    .child_by_field_name("field")
                    .map(|f| position(&f))
                    .unwrap_or_else(|| position(node))
            }
            _ => {
                self.walk(&function, out);
                position(node)
            }
        };

        let target = self.resolve_target(&function);
        let argument_types = arguments
            .map(|args| {
                named_children(&args)
                    .iter()
                    .filter(|arg| arg.kind() != "comment")
                    .map(|arg| self.infer(arg))
                    .collect()
            })
            .unwrap_or_default();
        out.push_call(target, argument_types, name_position);

        if let Some(arguments) = &arguments {
            self.walk(arguments, out);
        }
    }

    fn is_allocation(&self, function: &Node) -> bool {
        if function.kind() != "identifier" {
            return false;
        }
        let name = self.ctx.text(function);
        self.ctx.config.is_allocator(name)
            && !self.symbols.is_local(name)
            && !self.ctx.index.has_function(name)
    }

    fn resolve_target(&self, function: &Node) -> Target {
        match function.kind() {
            "identifier" => {
                let name = self.ctx.text(function);
                let kind = if self.symbols.is_local(name) {
                    // A local func value shadows any file-level function.
                    CallKind::Unresolved
                } else if self.ctx.index.has_function(name) {
                    CallKind::Local
                } else if self.ctx.config.is_builtin_function(name) {
                    CallKind::Builtin
                } else {
                    CallKind::Unresolved
                };
                Target::bare(name, kind)
            }
            "selector_expression" => {
                let name = function
                    .child_by_field_name("field")
                    .map(|f| self.ctx.text(&f))
                    .unwrap_or_default();
                let receiver = match function.child_by_field_name("operand") {
                    Some(operand) => self.receiver(&operand, 0),
                    None => Receiver::Unknown,
                };
                match receiver {
                    Receiver::Package(import) => Target {
                        package: Some(import.source.clone()),
                        type_name: Some(import.package_name().to_string()),
                        name: name.to_string(),
                        kind: CallKind::PackageFunction,
                    },
                    Receiver::Typed(ty) => Target {
                        package: ty.package,
                        type_name: Some(ty.name),
                        name: name.to_string(),
                        kind: CallKind::Method,
                    },
                    Receiver::Unknown => {
                        tracing::trace!(method = name, "receiver type unresolved");
                        Target::bare(name, CallKind::Unresolved)
                    }
                }
            }
            "parenthesized_expression" => match function.named_child(0) {
                Some(inner) if matches!(inner.kind(), "identifier" | "selector_expression") => {
                    self.resolve_target(&inner)
                }
                _ => Target::bare(self.compact_text(function), CallKind::Unresolved),
            },
            "func_literal" => Target::bare("func", CallKind::Unresolved),
            _ => Target::bare(self.compact_text(function), CallKind::Unresolved),
        }
    }

    /// Locals shadow import aliases, import aliases shadow file globals.
    fn receiver(&self, operand: &Node, depth: usize) -> Receiver<'c> {
        if operand.kind() != "identifier" {
            return self
                .infer_at(operand, depth)
                .map_or(Receiver::Unknown, Receiver::Typed);
        }

        let ctx: &'c FileContext<'a> = self.ctx;
        let name = ctx.text(operand);
        if self.symbols.is_local(name) {
            return self
                .symbols
                .lookup(name)
                .cloned()
                .map_or(Receiver::Unknown, Receiver::Typed);
        }
        if let Some(import) = ctx.imports.resolve(name) {
            return Receiver::Package(import);
        }
        if let Some(ty) = self.symbols.lookup(name) {
            return Receiver::Typed(ty.clone());
        }
        if ctx.index.has_type(name) {
            // Method expression: `Type.Method(value, ...)`.
            return Receiver::Typed(ctx.named_type(name));
        }
        Receiver::Unknown
    }

    fn compact_text(&self, node: &Node) -> String {
        self.ctx.text(node).split_whitespace().collect::<Vec<_>>().join(" ")
    }

    // ── Type inference ──

    /// Best-effort static type of an expression. Never fails; `None` is
    /// the unresolved outcome.
    pub fn infer(&self, expr: &Node) -> Option<TypeRef> {
        self.infer_at(expr, 0)
    }

    fn infer_at(&self, expr: &Node, depth: usize) -> Option<TypeRef> {
        if depth >= MAX_NESTING {
            return None;
        }
        let next = depth + 1;

        match expr.kind() {
            "identifier" => match self.receiver(expr, next) {
                Receiver::Typed(ty) => Some(ty),
                _ => None,
            },
            "call_expression" => self.infer_call(expr, next).into_iter().next(),
            "composite_literal" => expr
                .child_by_field_name("type")
                .map(|ty| self.ctx.type_ref(&ty)),
            "unary_expression" => {
                let operator = expr.child_by_field_name("operator").map(|op| self.ctx.text(&op));
                match operator {
                    Some("!") => Some(self.ctx.named_type("bool")),
                    Some("<-") => None,
                    _ => expr
                        .child_by_field_name("operand")
                        .and_then(|operand| self.infer_at(&operand, next)),
                }
            }
            "parenthesized_expression" => expr
                .named_child(0)
                .and_then(|inner| self.infer_at(&inner, next)),
            "type_assertion_expression" => expr
                .child_by_field_name("type")
                .map(|ty| self.ctx.type_ref(&ty)),
            "selector_expression" => {
                let operand = expr.child_by_field_name("operand")?;
                let field = expr.child_by_field_name("field")?;
                match self.receiver(&operand, next) {
                    Receiver::Typed(ty) => {
                        let owner = self.ctx.local_type_name(&ty)?;
                        self.ctx.index.field_type(owner, self.ctx.text(&field)).cloned()
                    }
                    _ => None,
                }
            }
            "binary_expression" => {
                let operator = expr.child_by_field_name("operator").map(|op| self.ctx.text(&op));
                match operator {
                    Some("==" | "!=" | "<" | "<=" | ">" | ">=" | "&&" | "||") => {
                        Some(self.ctx.named_type("bool"))
                    }
                    _ => expr
                        .child_by_field_name("left")
                        .and_then(|left| self.infer_at(&left, next)),
                }
            }
            "interpreted_string_literal" | "raw_string_literal" => {
                Some(self.ctx.named_type("string"))
            }
            "int_literal" => Some(self.ctx.named_type("int")),
            "float_literal" => Some(self.ctx.named_type("float64")),
            "imaginary_literal" => Some(self.ctx.named_type("complex128")),
            "rune_literal" => Some(self.ctx.named_type("rune")),
            "true" | "false" => Some(self.ctx.named_type("bool")),
            _ => None,
        }
    }

    /// Result types of a call expression, positionally.
    fn infer_call(&self, call: &Node, depth: usize) -> Vec<TypeRef> {
        let Some(function) = call.child_by_field_name("function") else {
            return Vec::new();
        };

        match function.kind() {
            "identifier" => {
                let name = self.ctx.text(&function);
                if self.is_allocation(&function) {
                    return call
                        .child_by_field_name("arguments")
                        .and_then(|args| args.named_child(0))
                        .map(|ty| vec![self.ctx.type_ref(&ty)])
                        .unwrap_or_default();
                }
                if self.symbols.is_local(name) {
                    return Vec::new();
                }
                if let Some(results) = self.ctx.index.function_results(name) {
                    return results.to_vec();
                }
                // Conversion such as `string(b)` or `Celsius(f)`.
                if self.ctx.config.is_builtin_type(name) || self.ctx.index.has_type(name) {
                    return vec![self.ctx.named_type(name)];
                }
                Vec::new()
            }
            "selector_expression" => {
                let (Some(operand), Some(field)) = (
                    function.child_by_field_name("operand"),
                    function.child_by_field_name("field"),
                ) else {
                    return Vec::new();
                };
                let method = self.ctx.text(&field);
                match self.receiver(&operand, depth) {
                    Receiver::Package(import) => self
                        .ctx
                        .config
                        .constructed_type(method)
                        .map(|ty| {
                            vec![TypeRef::new(
                                import.source.clone(),
                                format!("{}.{ty}", import.package_name()),
                            )]
                        })
                        .unwrap_or_default(),
                    Receiver::Typed(ty) => self
                        .ctx
                        .local_type_name(&ty)
                        .and_then(|owner| self.ctx.index.method_results(owner, method))
                        .map(<[TypeRef]>::to_vec)
                        .unwrap_or_default(),
                    Receiver::Unknown => Vec::new(),
                }
            }
            "func_literal" => self.ctx.results(&function),
            _ => Vec::new(),
        }
    }

    /// Types for `count` names bound from `values`, handling the
    /// single-value multi-assign forms `a, b := f()`, `v, ok := x.(T)`,
    /// `v, ok := m[k]` and `v, ok := <-ch`.
    fn infer_values(&self, values: &[Node], count: usize) -> Vec<Option<TypeRef>> {
        if values.len() == 1 && count > 1 {
            let value = &values[0];
            let bool_type = Some(self.ctx.named_type("bool"));
            let mut types: Vec<Option<TypeRef>> = match value.kind() {
                "call_expression" => self.infer_call(value, 0).into_iter().map(Some).collect(),
                "type_assertion_expression" => vec![self.infer(value), bool_type],
                "index_expression" | "unary_expression" => vec![None, bool_type],
                _ => vec![self.infer(value)],
            };
            types.resize(count, None);
            return types;
        }

        (0..count)
            .map(|i| values.get(i).and_then(|v| self.infer(v)))
            .collect()
    }

    // ── Declarations and assignments ──

    fn visit_short_var(&mut self, node: &Node, out: &mut BodyFacts) {
        let values = match node.child_by_field_name("right") {
            Some(right) => {
                self.walk(&right, out);
                expressions(&right)
            }
            None => Vec::new(),
        };
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };

        let names: Vec<Node> = expressions(&left)
            .into_iter()
            .filter(|n| n.kind() == "identifier")
            .collect();
        let types = self.infer_values(&values, names.len());

        for (name_node, type_ref) in names.iter().zip(types) {
            let name = self.ctx.text(name_node);
            match self.symbols.innermost(name).cloned() {
                // `a, err := ...` re-uses an `err` already declared in this scope.
                Some(previous) => {
                    let type_ref = previous.or(type_ref);
                    self.symbols.declare(name, type_ref.clone(), FieldScope::Local);
                    out.redeclare(name, type_ref);
                }
                None => {
                    self.symbols.declare(name, type_ref.clone(), FieldScope::Local);
                    out.record_field(CodeField {
                        name: name.to_string(),
                        type_ref,
                        scope: FieldScope::Local,
                        position: position(name_node),
                    });
                }
            }
        }
    }

    fn visit_assignment(&mut self, node: &Node, out: &mut BodyFacts) {
        let left = node.child_by_field_name("left");
        let right = node.child_by_field_name("right");
        if let Some(left) = &left {
            self.walk(left, out);
        }
        if let Some(right) = &right {
            self.walk(right, out);
        }

        let plain = node
            .child_by_field_name("operator")
            .is_some_and(|op| self.ctx.text(&op) == "=");
        let (Some(left), Some(right), true) = (left, right, plain) else {
            return;
        };

        let targets = expressions(&left);
        let values = expressions(&right);
        let types = self.infer_values(&values, targets.len());
        for (target, type_ref) in targets.iter().zip(types) {
            if target.kind() == "identifier" {
                self.symbols.assign(self.ctx.text(target), type_ref);
            }
        }
    }

    fn visit_declaration(&mut self, node: &Node, out: &mut BodyFacts) {
        for spec in declaration_specs(node) {
            if let Some(value) = spec.child_by_field_name("value") {
                self.walk(&value, out);
            }
            for field in self.bind_spec(&spec, FieldScope::Local) {
                out.record_field(field);
            }
        }
    }

    /// Declare the names of one `var_spec`/`const_spec` and describe them
    /// as fields. Values are inspected for their type only.
    pub fn bind_spec(&mut self, spec: &Node, scope: FieldScope) -> Vec<CodeField> {
        let names = field_children(spec, "name");
        let explicit = spec
            .child_by_field_name("type")
            .map(|ty| self.ctx.type_ref(&ty));
        let inferred = match (&explicit, spec.child_by_field_name("value")) {
            (None, Some(value)) => self.infer_values(&expressions(&value), names.len()),
            _ => Vec::new(),
        };

        let mut fields = Vec::with_capacity(names.len());
        for (i, name_node) in names.iter().enumerate() {
            let name = self.ctx.text(name_node);
            let type_ref = explicit
                .clone()
                .or_else(|| inferred.get(i).cloned().flatten());
            self.symbols.declare(name, type_ref.clone(), scope);
            fields.push(CodeField {
                name: name.to_string(),
                type_ref,
                scope,
                position: position(name_node),
            });
        }
        fields
    }

    fn visit_range(&mut self, node: &Node, out: &mut BodyFacts) {
        if let Some(right) = node.child_by_field_name("right") {
            self.walk(&right, out);
        }
        self.bind_untyped(node, out);
    }

    /// `case v := <-ch:` inside a `select`.
    fn visit_receive(&mut self, node: &Node, out: &mut BodyFacts) {
        if let Some(right) = node.child_by_field_name("right") {
            self.walk(&right, out);
        }
        self.bind_untyped(node, out);
    }

    /// Names on the left of a `:=` whose value type is not known statically.
    /// They still shadow outer bindings of the same name.
    fn bind_untyped(&mut self, node: &Node, out: &mut BodyFacts) {
        if !has_token(node, ":=") {
            return;
        }
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        for name_node in expressions(&left) {
            if name_node.kind() != "identifier" {
                continue;
            }
            let name = self.ctx.text(&name_node);
            self.symbols.declare(name, None, FieldScope::Local);
            out.record_field(CodeField {
                name: name.to_string(),
                type_ref: None,
                scope: FieldScope::Local,
                position: position(&name_node),
            });
        }
    }

    /// `switch v := x.(type)`: inside a single-type case `v` has that type.
    /// Each distinct case type yields one field for `v`; multi-type and
    /// default cases yield an untyped one.
    fn visit_type_switch(&mut self, node: &Node, out: &mut BodyFacts) {
        self.symbols.push_scope();
        if let Some(init) = node.child_by_field_name("initializer") {
            self.walk(&init, out);
        }
        if let Some(value) = node.child_by_field_name("value") {
            self.walk(&value, out);
        }
        let alias = node
            .child_by_field_name("alias")
            .and_then(|list| expressions(&list).into_iter().next())
            .map(|n| (self.ctx.text(&n), position(&n)));

        for case in named_children(node) {
            if !matches!(case.kind(), "type_case" | "default_case") {
                continue;
            }
            self.symbols.push_scope();
            if let Some((name, pos)) = alias {
                let case_types = field_children(&case, "type");
                let type_ref = match case_types.as_slice() {
                    [single] if single.kind() != "nil" => Some(self.ctx.type_ref(single)),
                    _ => None,
                };
                self.symbols.declare(name, type_ref.clone(), FieldScope::Local);
                out.record_field(CodeField {
                    name: name.to_string(),
                    type_ref,
                    scope: FieldScope::Local,
                    position: pos,
                });
            }
            self.walk_children(&case, out);
            self.symbols.pop_scope();
        }
        self.symbols.pop_scope();
    }

    /// Function literals are flattened into the enclosing function: their
    /// calls and locals join its lists, their parameters live in a scope
    /// that ends with the literal.
    fn visit_func_literal(&mut self, node: &Node, out: &mut BodyFacts) {
        self.symbols.push_scope();
        if let Some(params) = node.child_by_field_name("parameters") {
            for param in self.ctx.parameters(&params) {
                self.symbols
                    .declare(&param.name, param.type_ref.clone(), FieldScope::Parameter);
                out.record_field(CodeField {
                    name: param.name,
                    type_ref: param.type_ref,
                    scope: FieldScope::Local,
                    position: position(&params),
                });
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.walk_body(&body, out);
        }
        self.symbols.pop_scope();
    }
}

/// `var_spec`/`const_spec` nodes of a declaration, grouped or not.
pub(crate) fn declaration_specs<'t>(decl: &Node<'t>) -> Vec<Node<'t>> {
    let mut specs = Vec::new();
    for child in named_children(decl) {
        match child.kind() {
            "var_spec" | "const_spec" => specs.push(child),
            "var_spec_list" | "const_spec_list" => specs.extend(declaration_specs(&child)),
            _ => {}
        }
    }
    specs
}
