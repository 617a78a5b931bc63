pub mod go_parser;
pub mod registry;

pub use go_parser::GoFrontend;
pub use registry::FrontendRegistry;

use cf_core::{CodeFile, CodeImport, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-call inputs that accompany the source text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeOptions {
    /// Package name used when the file itself does not declare one.
    pub package_hint: Option<String>,
    /// Imports already resolved by analyzing related files. Consulted when a
    /// qualifier is not one of the file's own imports.
    pub related_imports: Vec<CodeImport>,
}

impl AnalyzeOptions {
    pub fn with_package_hint(mut self, package: impl Into<String>) -> Self {
        self.package_hint = Some(package.into());
        self
    }

    pub fn with_related_imports(mut self, imports: Vec<CodeImport>) -> Self {
        self.related_imports = imports;
        self
    }
}

/// Trait implemented by each language frontend.
///
/// A frontend turns one source file into one [`CodeFile`]. Implementations
/// hold only immutable configuration, so a single instance can serve many
/// files concurrently.
pub trait LanguageFrontend: Send + Sync {
    /// File extensions this frontend handles (without leading dot).
    fn extensions(&self) -> &[&str];

    /// Analyze in-memory source. `file_path` is the logical file name
    /// recorded in the IR and used in error messages.
    fn analyze(
        &self,
        source: &str,
        file_path: &Path,
        options: &AnalyzeOptions,
    ) -> Result<CodeFile>;

    /// Read a file from disk, then analyze it.
    ///
    /// Unreadable or non-UTF-8 input fails before any parsing happens.
    fn analyze_path(&self, path: &Path, options: &AnalyzeOptions) -> Result<CodeFile> {
        let bytes = std::fs::read(path).map_err(|source| cf_core::Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let source = String::from_utf8(bytes)
            .map_err(|_| cf_core::Error::Encoding(path.display().to_string()))?;
        self.analyze(&source, path, options)
    }
}
