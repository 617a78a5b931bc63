//! Package clause, imports, and package-level variables/constants.

use super::calls::{declaration_specs, BodyWalker};
use super::context::FileContext;
use super::symbols::SymbolTable;
use super::syntax::{named_children, node_text, unquote};
use cf_core::{CodeField, CodeImport, FieldScope};
use tree_sitter::Node;

/// Name declared by the `package` clause, if any.
pub(crate) fn package_name(root: &Node, source: &[u8]) -> Option<String> {
    named_children(root)
        .into_iter()
        .find(|n| n.kind() == "package_clause")
        .and_then(|clause| named_children(&clause).into_iter().next())
        .map(|ident| node_text(&ident, source).to_string())
}

/// Every import spec of the file, grouped or not, in source order.
pub(crate) fn imports(root: &Node, source: &[u8]) -> Vec<CodeImport> {
    let mut imports = Vec::new();
    for decl in named_children(root) {
        if decl.kind() == "import_declaration" {
            collect_import_specs(&decl, source, &mut imports);
        }
    }
    imports
}

fn collect_import_specs(node: &Node, source: &[u8], imports: &mut Vec<CodeImport>) {
    for child in named_children(node) {
        match child.kind() {
            "import_spec" => {
                let Some(path) = child.child_by_field_name("path") else {
                    continue;
                };
                let path = unquote(node_text(&path, source));
                if path.is_empty() {
                    continue;
                }
                let import = match child.child_by_field_name("name") {
                    Some(alias) => CodeImport::with_alias(path, node_text(&alias, source)),
                    None => CodeImport::new(path),
                };
                imports.push(import);
            }
            "import_spec_list" => collect_import_specs(&child, source, imports),
            _ => {}
        }
    }
}

/// Record package-level `var`/`const` declarations as fields and seed the
/// file scope of `symbols` with their types.
pub(crate) fn global_fields(
    root: &Node,
    ctx: &FileContext,
    symbols: &mut SymbolTable,
) -> Vec<CodeField> {
    let mut walker = BodyWalker::new(ctx, symbols);
    let mut fields = Vec::new();
    for decl in named_children(root) {
        if !matches!(decl.kind(), "var_declaration" | "const_declaration") {
            continue;
        }
        for spec in declaration_specs(&decl) {
            fields.extend(walker.bind_spec(&spec, FieldScope::Global));
        }
    }
    fields
}
