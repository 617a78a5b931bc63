//! Scoped identifier → type bindings for one file's traversal.

use cf_core::{FieldScope, TypeRef};
use std::collections::HashMap;

/// A binding with no known type still shadows outer bindings of the same
/// name, so scopes store `Option<TypeRef>`.
type Bindings = HashMap<String, Option<TypeRef>>;

/// Symbol table for a single file.
///
/// File-level bindings live for the whole traversal. Function bindings live
/// on a stack of scopes: the function scope at the bottom (seeded with the
/// parameters), nested blocks and function literals above it.
#[derive(Debug, Default)]
pub struct SymbolTable {
    globals: Bindings,
    scopes: Vec<Bindings>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a binding, replacing any binding of `name` in the same scope.
    ///
    /// `Global` and `Member` go to the file scope; `Parameter` and `Local`
    /// go to the innermost open scope (or the file scope when no function
    /// is being walked).
    pub fn declare(&mut self, name: &str, type_ref: Option<TypeRef>, scope: FieldScope) {
        if name.is_empty() || name == "_" {
            return;
        }
        let target = match scope {
            FieldScope::Global | FieldScope::Member => &mut self.globals,
            FieldScope::Parameter | FieldScope::Local => match self.scopes.last_mut() {
                Some(innermost) => innermost,
                None => &mut self.globals,
            },
        };
        target.insert(name.to_string(), type_ref);
    }

    /// Plain assignment (`name = value`).
    ///
    /// Updates the innermost local binding of `name`. A name bound only at
    /// file level gets a function-scope override, so a function body never
    /// rewrites the file-level binding. An unknown type never erases a
    /// known one.
    pub fn assign(&mut self, name: &str, type_ref: Option<TypeRef>) {
        if name.is_empty() || name == "_" {
            return;
        }
        if let Some(scope) = self.scopes.iter_mut().rev().find(|s| s.contains_key(name)) {
            if type_ref.is_some() {
                scope.insert(name.to_string(), type_ref);
            }
            return;
        }

        let type_ref = type_ref.or_else(|| self.globals.get(name).cloned().flatten());
        match self.scopes.first_mut() {
            Some(function_scope) => {
                function_scope.insert(name.to_string(), type_ref);
            }
            None => {
                self.globals.insert(name.to_string(), type_ref);
            }
        }
    }

    /// Innermost binding of `name`, then the file-level one.
    ///
    /// `None` means either "never declared" or "declared without a known
    /// type"; both are the unresolved outcome.
    pub fn lookup(&self, name: &str) -> Option<&TypeRef> {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.get(name))
            .or_else(|| self.globals.get(name))
            .and_then(|binding| binding.as_ref())
    }

    /// Whether `name` is bound in any function-level scope.
    pub fn is_local(&self, name: &str) -> bool {
        self.scopes.iter().any(|s| s.contains_key(name))
    }

    pub fn is_global(&self, name: &str) -> bool {
        self.globals.contains_key(name)
    }

    /// Bound in the innermost scope only (used by `:=` redeclaration).
    pub fn innermost(&self, name: &str) -> Option<&Option<TypeRef>> {
        self.scopes.last().and_then(|s| s.get(name))
    }

    /// Start a function: drop whatever the previous function left behind and
    /// open a fresh scope holding its receiver and parameters.
    pub fn enter_function<I>(&mut self, parameters: I)
    where
        I: IntoIterator<Item = (String, Option<TypeRef>)>,
    {
        self.scopes.clear();
        let scope: Bindings = parameters
            .into_iter()
            .filter(|(name, _)| !name.is_empty() && name != "_")
            .collect();
        self.scopes.push(scope);
    }

    pub fn exit_function(&mut self) {
        self.scopes.clear();
    }

    /// Open a nested scope (block, `if`/`for` header, function literal).
    pub fn push_scope(&mut self) {
        self.scopes.push(Bindings::new());
    }

    pub fn pop_scope(&mut self) {
        // The function scope is only removed by exit_function.
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}
