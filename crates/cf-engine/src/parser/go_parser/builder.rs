//! Structural builder: type declarations become data structures, function
//! and method declarations become function nodes grouped under their owner.

use super::calls::{BodyFacts, BodyWalker};
use super::context::FileContext;
use super::symbols::SymbolTable;
use super::syntax::{named_children, position};
use cf_core::{
    CodeDataStruct, CodeField, CodeFunctionNode, CodeMember, CodeMethodSpec, DataStructKind,
    FieldScope, Position, TypeRef, GLOBAL_STRUCT_NAME,
};
use std::collections::HashMap;
use tree_sitter::Node;

/// Collects data structures in order of first appearance. A method seen
/// before its type declaration creates the structure early; the later
/// declaration fills in kind, fields and position.
#[derive(Debug)]
pub(crate) struct StructureBuilder {
    package_name: String,
    structs: Vec<CodeDataStruct>,
    by_name: HashMap<String, usize>,
}

impl StructureBuilder {
    pub fn new(package_name: &str) -> Self {
        Self {
            package_name: package_name.to_string(),
            structs: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    fn entry(
        &mut self,
        name: &str,
        kind: DataStructKind,
        position: Position,
    ) -> &mut CodeDataStruct {
        let index = match self.by_name.get(name) {
            Some(&i) => i,
            None => {
                self.structs.push(CodeDataStruct::new(name, kind, position));
                self.by_name.insert(name.to_string(), self.structs.len() - 1);
                self.structs.len() - 1
            }
        };
        &mut self.structs[index]
    }

    /// Handle every spec of a `type_declaration`.
    pub fn add_type_declaration(&mut self, decl: &Node, ctx: &FileContext) {
        for spec in named_children(decl) {
            if !matches!(spec.kind(), "type_spec" | "type_alias") {
                continue;
            }
            let Some(name_node) = spec.child_by_field_name("name") else {
                tracing::warn!(line = position(&spec).line, "type declaration without a name");
                continue;
            };
            let name = ctx.text(&name_node);
            let pos = position(&name_node);
            let body = spec.child_by_field_name("type");

            let kind = match body.map(|b| b.kind()) {
                Some("struct_type") => DataStructKind::Struct,
                Some("interface_type") => DataStructKind::Interface,
                _ => DataStructKind::Alias,
            };

            let ds = self.entry(name, kind, pos);
            ds.kind = kind;
            ds.position = pos;

            match (kind, body) {
                (DataStructKind::Struct, Some(body)) => {
                    let (fields, embedded) = ctx.struct_fields(&body);
                    ds.fields = fields;
                    ds.embedded = embedded;
                }
                (DataStructKind::Interface, Some(body)) => {
                    let (specs, embedded) = interface_elements(&body, ctx);
                    ds.method_specs = specs;
                    ds.embedded = embedded;
                }
                _ => {}
            }
        }
    }

    /// Attach a function node to its receiver's structure, or to the
    /// implicit global structure for free functions.
    pub fn add_function(&mut self, node: CodeFunctionNode) {
        let owner = node
            .receiver
            .as_ref()
            .map(|r| r.base_name().to_string());

        let (owner_name, id) = match &owner {
            Some(owner) => (owner.as_str(), format!("{}:{owner}.{}", self.package_name, node.name)),
            None => (GLOBAL_STRUCT_NAME, format!("{}:{}", self.package_name, node.name)),
        };
        let kind = if owner.is_some() {
            DataStructKind::Struct
        } else {
            DataStructKind::Global
        };
        let ds_position = if owner.is_some() {
            node.position
        } else {
            Position::default()
        };

        let ds = self.entry(owner_name, kind, ds_position);
        match ds.members.iter_mut().find(|m| m.name == node.name) {
            Some(member) => member.function_nodes.push(node),
            None => ds.members.push(CodeMember {
                id,
                name: node.name.clone(),
                function_nodes: vec![node],
            }),
        }
    }

    pub fn finish(self) -> Vec<CodeDataStruct> {
        self.structs
    }
}

/// Method specs and embedded types of an `interface_type`.
fn interface_elements(body: &Node, ctx: &FileContext) -> (Vec<CodeMethodSpec>, Vec<TypeRef>) {
    let mut specs = Vec::new();
    let mut embedded = Vec::new();

    for element in named_children(body) {
        match element.kind() {
            "method_elem" | "method_spec" => {
                let Some(name) = element.child_by_field_name("name") else {
                    continue;
                };
                let parameters = element
                    .child_by_field_name("parameters")
                    .map(|p| ctx.parameters(&p))
                    .unwrap_or_default();
                specs.push(CodeMethodSpec {
                    name: ctx.text(&name).to_string(),
                    parameters,
                    return_types: ctx.results(&element),
                    position: position(&name),
                });
            }
            "type_elem" | "constraint_elem" => {
                embedded.extend(named_children(&element).iter().map(|t| ctx.type_ref(t)));
            }
            "type_identifier" | "qualified_type" | "generic_type" => {
                embedded.push(ctx.type_ref(&element));
            }
            _ => {}
        }
    }

    (specs, embedded)
}

/// Build the node for one `function_declaration` or `method_declaration`,
/// walking its body with a fresh function scope.
pub(crate) fn build_function(
    decl: &Node,
    ctx: &FileContext,
    symbols: &mut SymbolTable,
) -> Option<CodeFunctionNode> {
    let Some(name_node) = decl.child_by_field_name("name") else {
        tracing::warn!(line = position(decl).line, "function declaration without a name");
        return None;
    };
    let name = ctx.text(&name_node).to_string();

    let receiver = if decl.kind() == "method_declaration" {
        ctx.receiver(decl)
    } else {
        None
    };
    let params_node = decl.child_by_field_name("parameters");
    let params_position = params_node.map_or_else(|| position(decl), |p| position(&p));
    let parameters = params_node.map(|p| ctx.parameters(&p)).unwrap_or_default();
    let return_types = ctx.results(decl);

    let mut out = BodyFacts::default();
    let mut bindings = Vec::new();
    if let Some((recv_name, recv_type)) = &receiver {
        bindings.push((recv_name.clone(), recv_type.clone()));
    }
    for param in &parameters {
        bindings.push((param.name.clone(), param.type_ref.clone()));
        out.record_field(CodeField {
            name: param.name.clone(),
            type_ref: param.type_ref.clone(),
            scope: FieldScope::Parameter,
            position: params_position,
        });
    }

    symbols.enter_function(bindings);
    if let Some(body) = decl.child_by_field_name("body") {
        BodyWalker::new(ctx, symbols).walk_body(&body, &mut out);
    }
    symbols.exit_function();

    tracing::trace!(function = %name, calls = out.calls.len(), "walked function body");

    Some(CodeFunctionNode {
        name,
        receiver: receiver.and_then(|(_, ty)| ty),
        parameters,
        return_types,
        calls: out.calls,
        fields: out.fields,
        position: position(decl),
    })
}
