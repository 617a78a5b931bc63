use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Immutable settings shared by every per-file analysis.
///
/// Loaded once by the orchestrator and handed to the frontend, which keeps
/// it behind an `Arc` so concurrent file analyses can read it freely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Bare functions whose first argument is the allocated type.
    pub allocators: Vec<String>,
    /// `pkg.NewThing()` infers `pkg.Thing` for every prefix listed here.
    pub constructor_prefixes: Vec<String>,
    pub builtin_functions: Vec<String>,
    pub builtin_types: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            allocators: to_strings(&["new", "make"]),
            constructor_prefixes: to_strings(&["New"]),
            builtin_functions: to_strings(&[
                "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len",
                "make", "max", "min", "new", "panic", "print", "println", "real", "recover",
            ]),
            builtin_types: to_strings(&[
                "any", "bool", "byte", "comparable", "complex64", "complex128", "error",
                "float32", "float64", "int", "int8", "int16", "int32", "int64", "rune",
                "string", "uint", "uint8", "uint16", "uint32", "uint64", "uintptr",
            ]),
        }
    }
}

impl AnalyzerConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded analyzer config");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn is_allocator(&self, name: &str) -> bool {
        self.allocators.iter().any(|a| a == name)
    }

    pub fn is_builtin_function(&self, name: &str) -> bool {
        self.builtin_functions.iter().any(|b| b == name)
    }

    pub fn is_builtin_type(&self, name: &str) -> bool {
        self.builtin_types.iter().any(|b| b == name)
    }

    /// `NewParser` → `Parser` when `New` is a configured prefix.
    pub fn constructed_type<'a>(&self, function_name: &'a str) -> Option<&'a str> {
        self.constructor_prefixes.iter().find_map(|prefix| {
            function_name
                .strip_prefix(prefix.as_str())
                .filter(|rest| rest.chars().next().is_some_and(|c| c.is_uppercase()))
        })
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
