//! Thin adapter over tree-sitter-go: parser construction, node text and
//! positions, and syntax error detection.

use cf_core::{Position, Result};
use tree_sitter::{Node, Parser, Tree};

/// Create a configured tree-sitter parser for Go.
fn create_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| cf_core::Error::ParseError(format!("Failed to load Go grammar: {e}")))?;
    Ok(parser)
}

/// Parse source text into a tree, rejecting trees that contain syntax errors.
pub(crate) fn parse_tree(source: &str, file_name: &str) -> Result<Tree> {
    let mut parser = create_parser()?;
    let tree = parser.parse(source, None).ok_or_else(|| {
        cf_core::Error::ParseError(format!("{file_name}: tree-sitter parse returned None"))
    })?;

    if let Some(bad) = first_error(tree.root_node()) {
        let pos = position(&bad);
        let what = if bad.is_missing() {
            format!("missing `{}`", bad.kind())
        } else {
            let text = node_text(&bad, source.as_bytes());
            let snippet: String = text.chars().take(20).collect();
            format!("unexpected `{}`", snippet.trim())
        };
        return Err(cf_core::Error::ParseError(format!(
            "{file_name}:{}:{}: {what}",
            pos.line, pos.column
        )));
    }

    Ok(tree)
}

/// First ERROR or MISSING node in document order. Descends iteratively
/// through the first child that carries an error, so deep trees cost no
/// native stack.
fn first_error<'t>(root: Node<'t>) -> Option<Node<'t>> {
    if !root.has_error() {
        return None;
    }
    let mut node = root;
    loop {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        let mut cursor = node.walk();
        let next = node.children(&mut cursor).find(|c| c.has_error());
        match next {
            Some(child) => node = child,
            None => return Some(node),
        }
    }
}

/// Get the text of a node as a UTF-8 string.
pub(crate) fn node_text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    let text = &source[node.start_byte()..node.end_byte()];
    std::str::from_utf8(text).unwrap_or("")
}

/// 1-based position of the node's first byte.
pub(crate) fn position(node: &Node) -> Position {
    let point = node.start_position();
    Position::new(point.row as u32 + 1, point.column as u32 + 1)
}

pub(crate) fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// All children stored under a (possibly repeated) field name.
pub(crate) fn field_children<'t>(node: &Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// Whether any anonymous child token has exactly this kind, e.g. `:=`.
pub(crate) fn has_token(node: &Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| !c.is_named() && c.kind() == token);
    found
}

/// Strip the quotes from an interpreted or raw string literal.
pub(crate) fn unquote(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .or_else(|| text.strip_prefix('`').and_then(|t| t.strip_suffix('`')))
        .unwrap_or(text)
}

/// Expressions of an `expression_list`, or the node itself otherwise.
pub(crate) fn expressions<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    if node.kind() == "expression_list" {
        named_children(node)
            .into_iter()
            .filter(|c| c.kind() != "comment")
            .collect()
    } else {
        vec![*node]
    }
}
