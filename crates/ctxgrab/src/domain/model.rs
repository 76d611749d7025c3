//! Domain models for walked trees, extracted symbols, and grab payloads.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One filesystem node visited during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
    pub children: Vec<SourceEntry>,
}

impl SourceEntry {
    pub fn file(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            is_dir: false,
            children: Vec::new(),
        }
    }

    pub fn dir(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            is_dir: true,
            children: Vec::new(),
        }
    }

    /// Depth-first iterator over this entry and every descendant.
    pub fn descendants(&self) -> impl Iterator<Item = &SourceEntry> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }
}

/// Kind of exported declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    Struct,
    Interface,
}

impl SymbolKind {
    pub fn label(&self) -> &'static str {
        match self {
            SymbolKind::Function => "Function",
            SymbolKind::Struct => "Struct",
            SymbolKind::Interface => "Interface",
        }
    }
}

/// A single parameter; anonymous parameters carry only a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: Option<String>,
    pub ty: String,
}

impl Parameter {
    pub fn named(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ty: ty.into(),
        }
    }

    pub fn anonymous(ty: impl Into<String>) -> Self {
        Self {
            name: None,
            ty: ty.into(),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) if self.ty.is_empty() => write!(f, "{name}"),
            Some(name) => write!(f, "{name} {}", self.ty),
            None => write!(f, "{}", self.ty),
        }
    }
}

/// One declaration found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    /// Receiver clause of a bound function, without the parentheses.
    pub receiver: Option<String>,
    pub parameters: Vec<Parameter>,
    pub return_types: Vec<String>,
    pub doc: Option<String>,
}

impl Symbol {
    pub fn function(name: impl Into<String>) -> Self {
        Self {
            kind: SymbolKind::Function,
            name: name.into(),
            receiver: None,
            parameters: Vec::new(),
            return_types: Vec::new(),
            doc: None,
        }
    }

    pub fn type_decl(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            ..Self::function(name)
        }
    }

    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }

    /// `name(p1, p2) -> r1, r2`, or `type Name struct` for type declarations.
    pub fn signature(&self) -> String {
        match self.kind {
            SymbolKind::Function => {
                let mut out = format!("{}({})", self.name, self.parameter_list());
                if !self.return_types.is_empty() {
                    out.push_str(" -> ");
                    out.push_str(&self.return_types.join(", "));
                }
                out
            }
            SymbolKind::Struct => format!("type {} struct", self.name),
            SymbolKind::Interface => format!("type {} interface", self.name),
        }
    }

    pub fn parameter_list(&self) -> String {
        self.parameters
            .iter()
            .map(Parameter::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Exported-name rule: the first character is an ASCII uppercase letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// A file's package name and its symbols in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileSummary {
    pub path: PathBuf,
    pub package: Option<String>,
    pub symbols: Vec<Symbol>,
}

impl FileSummary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Outcome of extracting one file. Parse failures are kept, not raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Parsed(FileSummary),
    Failed { path: PathBuf, message: String },
}

impl Extraction {
    pub fn path(&self) -> &Path {
        match self {
            Extraction::Parsed(summary) => &summary.path,
            Extraction::Failed { path, .. } => path,
        }
    }

    pub fn summary(&self) -> Option<&FileSummary> {
        match self {
            Extraction::Parsed(summary) => Some(summary),
            Extraction::Failed { .. } => None,
        }
    }
}

/// Request payload for the reasoning service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextRequest {
    /// Reply shape the prompt asks for.
    pub kind: ResponseKind,
    pub task_description: String,
    pub rendered_summary: String,
    /// Fully rendered prompt text.
    pub prompt: String,
}

/// Reply variant requested from the reasoning service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseKind {
    FileSelection,
    CodeBundle,
}

/// `{"files": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FileSelection {
    /// Paths of the files needed for the task.
    pub files: Vec<String>,
}

/// `{"filename": "...", "scripts": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CodeBundle {
    /// Name of the output file.
    pub filename: String,
    /// List of code scripts.
    pub scripts: Vec<String>,
}

/// Parsed reply of the reasoning service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextResponse {
    FileSelection(FileSelection),
    CodeBundle(CodeBundle),
}

/// A file read for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrabEntry {
    pub path: PathBuf,
    pub content: String,
}

impl GrabEntry {
    /// Header line with the path followed by the raw content.
    pub fn formatted(&self) -> String {
        format!(">>> {}\n{}\n", self.path.display(), self.content)
    }
}

/// Ordered collection of files joined with a separator when rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrabPayload {
    pub entries: Vec<GrabEntry>,
    pub separator: &'static str,
}

impl GrabPayload {
    pub const FILE_SEPARATOR: &'static str = "\n---\n";
    pub const FOLDER_SEPARATOR: &'static str = "\n===\n";

    pub fn new(entries: Vec<GrabEntry>) -> Self {
        Self {
            entries,
            separator: Self::FILE_SEPARATOR,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(GrabEntry::formatted)
            .collect::<Vec<_>>()
            .join(self.separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exported_names_require_ascii_uppercase_first_char() {
        assert!(is_exported("Foo"));
        assert!(!is_exported("foo"));
        assert!(!is_exported("_Foo"));
        assert!(!is_exported("Éclair"));
        assert!(!is_exported(""));
    }

    #[test]
    fn signature_omits_arrow_without_returns() {
        let mut symbol = Symbol::function("Foo");
        symbol.parameters.push(Parameter::named("x", "int"));
        symbol.parameters.push(Parameter::anonymous("context.Context"));
        assert_eq!(symbol.signature(), "Foo(x int, context.Context)");

        symbol.return_types = vec!["string".into(), "error".into()];
        assert_eq!(
            symbol.signature(),
            "Foo(x int, context.Context) -> string, error"
        );
    }

    #[test]
    fn payload_joins_entries_with_separator() {
        let payload = GrabPayload::new(vec![
            GrabEntry {
                path: "a.go".into(),
                content: "package a".into(),
            },
            GrabEntry {
                path: "b.go".into(),
                content: "package b".into(),
            },
        ]);
        assert_eq!(
            payload.render(),
            ">>> a.go\npackage a\n\n---\n>>> b.go\npackage b\n"
        );
    }

    #[test]
    fn descendants_walk_depth_first() {
        let mut root = SourceEntry::dir("r", "r");
        let mut pkg = SourceEntry::dir("r/pkg", "pkg");
        pkg.children.push(SourceEntry::file("r/pkg/a.go", "a.go"));
        root.children.push(pkg);
        root.children.push(SourceEntry::file("r/z.go", "z.go"));

        let names: Vec<_> = root.descendants().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["r", "pkg", "a.go", "z.go"]);
    }
}
