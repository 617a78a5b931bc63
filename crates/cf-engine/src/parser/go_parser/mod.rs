//! Go frontend backed by tree-sitter.
//!
//! One call analyzes one file: the syntax tree is built, imports and
//! package-level variables seed the symbol table, then every declaration is
//! visited in source order and each function body is walked by the call
//! resolver. All traversal state is created per call and dropped with it.

mod builder;
mod calls;
mod context;
mod extractor;
mod symbols;
mod syntax;

pub use symbols::SymbolTable;

use super::{AnalyzeOptions, LanguageFrontend};
use builder::StructureBuilder;
use cf_core::{AnalyzerConfig, CodeFile, Result};
use context::{DeclarationIndex, FileContext, ImportTable};
use std::path::Path;
use std::sync::Arc;

/// Go language frontend.
///
/// Holds only immutable configuration, so one instance can be shared by
/// many threads analyzing different files.
#[derive(Debug, Clone, Default)]
pub struct GoFrontend {
    config: Arc<AnalyzerConfig>,
}

impl GoFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze in-memory source under a logical file name.
    pub fn analyze_source(
        &self,
        source: &str,
        file_name: &str,
        options: &AnalyzeOptions,
    ) -> Result<CodeFile> {
        let tree = syntax::parse_tree(source, file_name)?;
        let root = tree.root_node();
        let bytes = source.as_bytes();

        let package_name = extractor::package_name(&root, bytes)
            .or_else(|| options.package_hint.clone())
            .unwrap_or_default();
        let imports = extractor::imports(&root, bytes);

        let mut ctx = FileContext {
            source: bytes,
            package_name,
            config: &self.config,
            imports: ImportTable::new(&imports, &options.related_imports),
            index: DeclarationIndex::default(),
        };
        ctx.index = DeclarationIndex::collect(&root, &ctx);

        let mut symbols = SymbolTable::new();
        let fields = extractor::global_fields(&root, &ctx, &mut symbols);

        let mut builder = StructureBuilder::new(&ctx.package_name);
        for decl in syntax::named_children(&root) {
            match decl.kind() {
                "type_declaration" => builder.add_type_declaration(&decl, &ctx),
                "function_declaration" | "method_declaration" => {
                    if let Some(function) = builder::build_function(&decl, &ctx, &mut symbols) {
                        builder.add_function(function);
                    }
                }
                _ => {}
            }
        }
        let data_structures = builder.finish();

        tracing::debug!(
            file = file_name,
            package = %ctx.package_name,
            structures = data_structures.len(),
            fields = fields.len(),
            "analyzed go file"
        );

        Ok(CodeFile {
            file_name: file_name.to_string(),
            package_name: ctx.package_name,
            imports,
            data_structures,
            fields,
        })
    }

    /// Read a file from disk, then analyze it.
    pub fn analyze_file(&self, path: &Path, options: &AnalyzeOptions) -> Result<CodeFile> {
        self.analyze_path(path, options)
    }
}

impl LanguageFrontend for GoFrontend {
    fn extensions(&self) -> &[&str] {
        &["go"]
    }

    fn analyze(
        &self,
        source: &str,
        file_path: &Path,
        options: &AnalyzeOptions,
    ) -> Result<CodeFile> {
        self.analyze_source(source, &file_path.to_string_lossy(), options)
    }
}
