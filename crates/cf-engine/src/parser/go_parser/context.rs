//! Read-only facts about the file being analyzed: its package, import
//! table, type conversion helpers, and an index of what the file declares.

use super::syntax::{field_children, named_children, node_text, position};
use cf_core::{AnalyzerConfig, CodeField, CodeImport, CodeParameter, FieldScope, TypeRef};
use std::collections::HashMap;
use tree_sitter::Node;

/// Qualifier → import lookup. The file's own imports win over imports
/// supplied by the caller from related files.
#[derive(Debug, Default)]
pub(crate) struct ImportTable {
    own: Vec<CodeImport>,
    related: Vec<CodeImport>,
}

impl ImportTable {
    pub fn new(own: &[CodeImport], related: &[CodeImport]) -> Self {
        Self {
            own: own.to_vec(),
            related: related.to_vec(),
        }
    }

    pub fn resolve(&self, qualifier: &str) -> Option<&CodeImport> {
        let matches = |i: &&CodeImport| i.is_qualifying() && i.usage_name() == qualifier;
        self.own
            .iter()
            .find(matches)
            .or_else(|| self.related.iter().find(matches))
    }
}

/// Signatures and struct layouts declared in this file, collected before
/// any function body is walked so that forward references resolve.
#[derive(Debug, Default)]
pub(crate) struct DeclarationIndex {
    functions: HashMap<String, Vec<TypeRef>>,
    methods: HashMap<String, HashMap<String, Vec<TypeRef>>>,
    types: HashMap<String, HashMap<String, TypeRef>>,
}

impl DeclarationIndex {
    pub fn collect(root: &Node, ctx: &FileContext) -> Self {
        let mut index = Self::default();

        for decl in named_children(root) {
            match decl.kind() {
                "function_declaration" => {
                    if let Some(name) = decl.child_by_field_name("name") {
                        let results = ctx.results(&decl);
                        index.functions.insert(ctx.text(&name).to_string(), results);
                    }
                }
                "method_declaration" => {
                    let receiver = ctx.receiver(&decl).and_then(|(_, ty)| ty);
                    let name = decl.child_by_field_name("name");
                    if let (Some(receiver), Some(name)) = (receiver, name) {
                        index
                            .methods
                            .entry(receiver.name)
                            .or_default()
                            .insert(ctx.text(&name).to_string(), ctx.results(&decl));
                    }
                }
                "type_declaration" => {
                    for spec in named_children(&decl) {
                        if !matches!(spec.kind(), "type_spec" | "type_alias") {
                            continue;
                        }
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let mut layout = HashMap::new();
                        if let Some(body) = spec.child_by_field_name("type") {
                            if body.kind() == "struct_type" {
                                let (fields, embedded) = ctx.struct_fields(&body);
                                for field in fields {
                                    if let Some(ty) = field.type_ref {
                                        layout.insert(field.name, ty);
                                    }
                                }
                                for ty in embedded {
                                    layout.insert(ty.base_name().to_string(), ty);
                                }
                            }
                        }
                        index.types.insert(ctx.text(&name).to_string(), layout);
                    }
                }
                _ => {}
            }
        }

        index
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn function_results(&self, name: &str) -> Option<&[TypeRef]> {
        self.functions.get(name).map(Vec::as_slice)
    }

    pub fn method_results(&self, type_name: &str, method: &str) -> Option<&[TypeRef]> {
        self.methods
            .get(type_name)
            .and_then(|m| m.get(method))
            .map(Vec::as_slice)
    }

    pub fn field_type(&self, type_name: &str, field: &str) -> Option<&TypeRef> {
        self.types.get(type_name).and_then(|fields| fields.get(field))
    }
}

/// Everything a walker needs to know about the file besides the symbol table.
pub(crate) struct FileContext<'a> {
    pub source: &'a [u8],
    pub package_name: String,
    pub config: &'a AnalyzerConfig,
    pub imports: ImportTable,
    pub index: DeclarationIndex,
}

impl<'a> FileContext<'a> {
    pub fn text(&self, node: &Node) -> &'a str {
        node_text(node, self.source)
    }

    /// The bare name of `ty` when it is a named type of this package (it may
    /// be declared in a sibling file, so the index is not consulted).
    pub fn local_type_name<'t>(&self, ty: &'t TypeRef) -> Option<&'t str> {
        let local_package = (!self.package_name.is_empty()).then_some(self.package_name.as_str());
        let is_named = !ty.name.contains(|c: char| matches!(c, '.' | '[' | '*' | ' ' | '('));
        (ty.package.as_deref() == local_package && is_named).then_some(ty.name.as_str())
    }

    /// A type named without qualifier.
    pub fn named_type(&self, name: &str) -> TypeRef {
        if self.config.is_builtin_type(name) || self.package_name.is_empty() {
            TypeRef::unqualified(name)
        } else {
            TypeRef::new(self.package_name.clone(), name)
        }
    }

    /// `qualifier.Name`, with the qualifier mapped through the import table.
    pub fn qualified_type(&self, qualifier: &str, name: &str) -> TypeRef {
        match self.imports.resolve(qualifier) {
            Some(import) => TypeRef::new(
                import.source.clone(),
                format!("{}.{name}", import.package_name()),
            ),
            None => TypeRef::new(qualifier, format!("{qualifier}.{name}")),
        }
    }

    /// Convert a type node (or an expression used as a type, such as the
    /// argument of `new`) into a type reference.
    pub fn type_ref(&self, node: &Node) -> TypeRef {
        match node.kind() {
            "type_identifier" | "identifier" => self.named_type(self.text(node)),
            "qualified_type" => {
                match (node.child_by_field_name("package"), node.child_by_field_name("name")) {
                    (Some(pkg), Some(name)) => {
                        self.qualified_type(self.text(&pkg), self.text(&name))
                    }
                    _ => self.raw_type(node),
                }
            }
            "selector_expression" => {
                match (node.child_by_field_name("operand"), node.child_by_field_name("field")) {
                    (Some(pkg), Some(name)) if pkg.kind() == "identifier" => {
                        self.qualified_type(self.text(&pkg), self.text(&name))
                    }
                    _ => self.raw_type(node),
                }
            }
            "pointer_type" | "parenthesized_type" | "parenthesized_expression" => node
                .named_child(0)
                .map(|inner| self.type_ref(&inner))
                .unwrap_or_else(|| self.raw_type(node)),
            "unary_expression" if self.is_dereference(node) => node
                .child_by_field_name("operand")
                .map(|inner| self.type_ref(&inner))
                .unwrap_or_else(|| self.raw_type(node)),
            "generic_type" => node
                .child_by_field_name("type")
                .map(|inner| self.type_ref(&inner))
                .unwrap_or_else(|| self.raw_type(node)),
            _ => self.raw_type(node),
        }
    }

    /// `*T` written in expression position, e.g. the argument of `new`.
    fn is_dereference(&self, node: &Node) -> bool {
        node.child_by_field_name("operator")
            .is_some_and(|op| self.text(&op) == "*")
    }

    /// Composite types keep their source text, whitespace collapsed.
    fn raw_type(&self, node: &Node) -> TypeRef {
        let text = self.text(node).split_whitespace().collect::<Vec<_>>().join(" ");
        TypeRef::unqualified(text)
    }

    /// Parameters of a `parameter_list`, one entry per declared name.
    pub fn parameters(&self, list: &Node) -> Vec<CodeParameter> {
        let mut params = Vec::new();
        for decl in named_children(list) {
            let variadic = match decl.kind() {
                "parameter_declaration" => false,
                "variadic_parameter_declaration" => true,
                _ => continue,
            };
            let Some(type_node) = decl.child_by_field_name("type") else {
                continue;
            };
            let type_text = if variadic {
                format!("...{}", self.text(&type_node))
            } else {
                self.text(&type_node).to_string()
            };
            let type_ref = if variadic {
                TypeRef::unqualified(format!("[]{}", self.text(&type_node)))
            } else {
                self.type_ref(&type_node)
            };

            let names = field_children(&decl, "name");
            if names.is_empty() {
                params.push(CodeParameter {
                    name: String::new(),
                    type_text,
                    type_ref: Some(type_ref),
                });
                continue;
            }
            for name in names {
                params.push(CodeParameter {
                    name: self.text(&name).to_string(),
                    type_text: type_text.clone(),
                    type_ref: Some(type_ref.clone()),
                });
            }
        }
        params
    }

    /// Result types of a function, method, method spec or function type.
    pub fn results(&self, decl: &Node) -> Vec<TypeRef> {
        match decl.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => self
                .parameters(&result)
                .into_iter()
                .filter_map(|p| p.type_ref)
                .collect(),
            Some(result) => vec![self.type_ref(&result)],
            None => Vec::new(),
        }
    }

    /// Receiver name and type of a method declaration.
    pub fn receiver(&self, decl: &Node) -> Option<(String, Option<TypeRef>)> {
        let list = decl.child_by_field_name("receiver")?;
        let param = self.parameters(&list).into_iter().next()?;
        Some((param.name, param.type_ref))
    }

    /// Named fields and embedded types of a `struct_type`.
    pub fn struct_fields(&self, struct_type: &Node) -> (Vec<CodeField>, Vec<TypeRef>) {
        let mut fields = Vec::new();
        let mut embedded = Vec::new();

        let lists = named_children(struct_type)
            .into_iter()
            .filter(|c| c.kind() == "field_declaration_list");
        for list in lists {
            for decl in named_children(&list) {
                if decl.kind() != "field_declaration" {
                    continue;
                }
                let Some(type_node) = decl.child_by_field_name("type") else {
                    continue;
                };
                let type_ref = self.type_ref(&type_node);
                let names = field_children(&decl, "name");
                if names.is_empty() {
                    embedded.push(type_ref);
                    continue;
                }
                for name in names {
                    fields.push(CodeField {
                        name: self.text(&name).to_string(),
                        type_ref: Some(type_ref.clone()),
                        scope: FieldScope::Member,
                        position: position(&name),
                    });
                }
            }
        }

        (fields, embedded)
    }
}
