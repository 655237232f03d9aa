use crate::ast_analyzer::AstAnalyzer;
use crate::error::{ExtractError, Result};
use crate::language::Language;
use crate::types::Declaration;
use std::path::Path;

/// Main extractor interface
///
/// Holds one parser for the lifetime of the extractor so that a rescan over thousands of files
/// does not rebuild it per file.
pub struct Extractor {
    analyzer: AstAnalyzer,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            analyzer: AstAnalyzer::new(Language::Python)?,
        })
    }

    /// Extract declarations from a file on disk
    pub fn extract_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<Declaration>> {
        let path = path.as_ref();
        let language = Language::from_path(path);
        if !language.supports_ast() {
            return Err(ExtractError::unsupported_language(format!(
                "{} ({})",
                language.as_str(),
                path.display()
            )));
        }

        let bytes = std::fs::read(path)?;
        let source = String::from_utf8(bytes).map_err(|_| {
            ExtractError::parse(format!("{}: source is not valid UTF-8", path.display()))
        })?;

        self.extract_str(&source, path)
    }

    /// Extract declarations from in-memory source attributed to `path`
    pub fn extract_str(&mut self, source: &str, path: impl AsRef<Path>) -> Result<Vec<Declaration>> {
        let path = path.as_ref();
        let declarations = self.analyzer.analyze(source, path)?;
        log::debug!(
            "Extracted {} classes from {}",
            declarations.len(),
            path.display()
        );
        Ok(declarations)
    }
}
