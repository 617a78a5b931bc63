use super::{AnalyzeOptions, LanguageFrontend};
use cf_core::{AnalyzerConfig, CodeFile, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Central registry that maps file extensions to their language frontends.
///
/// Each frontend is wrapped in an `Arc` so multiple extensions can share
/// the same instance, and so the registry itself can be shared across
/// worker threads.
pub struct FrontendRegistry {
    frontends: HashMap<String, Arc<dyn LanguageFrontend>>,
}

impl FrontendRegistry {
    /// Create a registry with all built-in frontends and default config.
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    /// Create a registry whose frontends share `config`.
    pub fn with_config(config: AnalyzerConfig) -> Self {
        let mut registry = Self {
            frontends: HashMap::new(),
        };

        // Go
        let go = Arc::new(super::go_parser::GoFrontend::with_config(config))
            as Arc<dyn LanguageFrontend>;
        registry.register(go);

        registry
    }

    /// Register a frontend for every extension it reports. Later
    /// registrations replace earlier ones for the same extension.
    pub fn register(&mut self, frontend: Arc<dyn LanguageFrontend>) {
        for ext in frontend.extensions() {
            self.frontends.insert(ext.to_string(), Arc::clone(&frontend));
        }
    }

    /// Return `true` if the file extension is handled by a registered frontend.
    pub fn supports_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.frontends.contains_key(ext))
            .unwrap_or(false)
    }

    /// Read and analyze a file, selecting the frontend by extension.
    pub fn analyze_file(&self, path: &Path, options: &AnalyzeOptions) -> Result<CodeFile> {
        self.frontend_for(path)?.analyze_path(path, options)
    }

    /// Analyze in-memory source, selecting the frontend by the extension of
    /// the logical file name.
    ///
    /// Returns `Error::UnsupportedLanguage` when no frontend is registered for
    /// the extension (or the path has no extension).
    pub fn analyze_source(
        &self,
        source: &str,
        path: &Path,
        options: &AnalyzeOptions,
    ) -> Result<CodeFile> {
        self.frontend_for(path)?.analyze(source, path, options)
    }

    fn frontend_for(&self, path: &Path) -> Result<&Arc<dyn LanguageFrontend>> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| cf_core::Error::UnsupportedLanguage("no extension".into()))?;

        self.frontends
            .get(ext)
            .ok_or_else(|| cf_core::Error::UnsupportedLanguage(ext.into()))
    }
}

impl Default for FrontendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
