//! Symbol extraction from Go sources.
//!
//! Two independent strategies share the [`SymbolExtractor`] interface and
//! produce the same [`Symbol`](crate::domain::model::Symbol) shape:
//!
//! * [`LexicalExtractor`] scans line by line with a regular expression. It
//!   never fails on malformed code and reports every `func`, exported or not.
//! * [`SyntacticExtractor`] parses the file with tree-sitter. It is
//!   authoritative, reports exported functions, structs and interfaces only,
//!   and turns files with syntax errors into [`Extraction::Failed`].

mod lexical;
mod syntactic;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::model::{Extraction, SourceEntry};

pub use lexical::LexicalExtractor;
pub use syntactic::SyntacticExtractor;

/// Which extraction strategy produced a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum ExtractMode {
    Lexical,
    Syntactic,
}

impl ExtractMode {
    pub fn extractor(self) -> Box<dyn SymbolExtractor> {
        match self {
            ExtractMode::Lexical => Box::new(LexicalExtractor::new()),
            ExtractMode::Syntactic => Box::new(SyntacticExtractor::new()),
        }
    }
}

pub trait SymbolExtractor {
    fn mode(&self) -> ExtractMode;

    /// Extract symbols from already loaded source text.
    fn extract_source(&self, path: &Path, source: &str) -> Extraction;

    /// Read and extract a single file.
    fn extract(&self, path: &Path) -> EngineResult<Extraction> {
        let source = read_source(path)?;
        Ok(self.extract_source(path, &source))
    }
}

/// Extraction outcomes keyed by file path.
pub type SymbolIndex = HashMap<PathBuf, Extraction>;

/// Whether a path names a Go source file.
pub fn is_go_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "go")
}

/// Extract every Go file under `root`, in walk order.
pub fn extract_tree(
    extractor: &dyn SymbolExtractor,
    root: &SourceEntry,
) -> EngineResult<Vec<Extraction>> {
    let mut out = Vec::new();
    for entry in root.descendants() {
        if entry.is_dir || !is_go_source(&entry.path) {
            continue;
        }
        let extraction = extractor.extract(&entry.path)?;
        if let Extraction::Failed { path, message } = &extraction {
            tracing::warn!(path = %path.display(), %message, "skipping unparsable file");
        }
        out.push(extraction);
    }
    tracing::debug!(mode = ?extractor.mode(), files = out.len(), "extracted symbols");
    Ok(out)
}

/// Index extractions by path for the renderer.
pub fn index(extractions: Vec<Extraction>) -> SymbolIndex {
    extractions
        .into_iter()
        .map(|extraction| (extraction.path().to_path_buf(), extraction))
        .collect()
}

fn read_source(path: &Path) -> EngineResult<String> {
    let bytes = fs::read(path).map_err(|err| EngineError::filesystem(path, err))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Split on commas that are not nested inside brackets.
pub(crate) fn split_top_level(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for ch in input.chars() {
        match ch {
            '(' | '[' | '{' => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_owned());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_owned());
    }
    parts.retain(|part| !part.is_empty());
    parts
}
