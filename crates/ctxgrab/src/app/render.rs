//! Tree and summary rendering.

use std::collections::BTreeMap;

use clap::ValueEnum;
use crossterm::style::Stylize;

use crate::app::extract::SymbolIndex;
use crate::domain::model::{Extraction, SourceEntry, Symbol, SymbolKind};

const BRANCH: &str = "├──";
const LAST_BRANCH: &str = "└──";
const PIPE_INDENT: &str = "│   ";
const BLANK_INDENT: &str = "    ";

/// Output style. `Plain` is byte-stable for a given filesystem state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum RenderStyle {
    #[default]
    Plain,
    Decorated,
}

/// Visual classes used by the decorated style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Connector,
    Directory,
    File,
    ExportedFunction,
    Function,
    TypeDecl,
    Parameter,
    ReturnType,
    Annotation,
}

impl RenderStyle {
    fn paint(self, class: Class, text: &str) -> String {
        if self == RenderStyle::Plain {
            return text.to_owned();
        }
        let styled = match class {
            Class::Connector => text.white(),
            Class::Directory => text.cyan().bold(),
            Class::File => text.yellow(),
            Class::ExportedFunction => text.green().bold(),
            Class::Function => text.dark_green().bold(),
            Class::TypeDecl => text.dark_cyan().bold(),
            Class::Parameter => text.magenta(),
            Class::ReturnType => text.blue(),
            Class::Annotation => text.red(),
        };
        styled.to_string()
    }
}

/// Render the children of `root` as a connector tree, with symbol sub-lines
/// under every file that has an entry in `index`.
pub fn render(root: &SourceEntry, index: &SymbolIndex, style: RenderStyle) -> String {
    let mut out = String::new();
    render_entries(&mut out, &root.children, index, "", style);
    out
}

fn render_entries(
    out: &mut String,
    entries: &[SourceEntry],
    index: &SymbolIndex,
    prefix: &str,
    style: RenderStyle,
) {
    for (i, entry) in entries.iter().enumerate() {
        let last = i + 1 == entries.len();
        let connector = if last { LAST_BRANCH } else { BRANCH };
        let child_prefix = format!("{prefix}{}", if last { BLANK_INDENT } else { PIPE_INDENT });

        out.push_str(&style.paint(Class::Connector, &format!("{prefix}{connector} ")));
        let class = if entry.is_dir {
            Class::Directory
        } else {
            Class::File
        };
        out.push_str(&style.paint(class, &entry.name));
        out.push('\n');

        if entry.is_dir {
            render_entries(out, &entry.children, index, &child_prefix, style);
        } else if let Some(extraction) = index.get(&entry.path) {
            let lines = symbol_lines(extraction, style);
            for (j, line) in lines.iter().enumerate() {
                let connector = if j + 1 == lines.len() {
                    LAST_BRANCH
                } else {
                    BRANCH
                };
                out.push_str(&style.paint(Class::Connector, &format!("{child_prefix}{connector} ")));
                out.push_str(line);
                out.push('\n');
            }
        }
    }
}

fn symbol_lines(extraction: &Extraction, style: RenderStyle) -> Vec<String> {
    match extraction {
        Extraction::Parsed(summary) => summary
            .symbols
            .iter()
            .map(|symbol| paint_symbol(symbol, style))
            .collect(),
        Extraction::Failed { message, .. } => {
            vec![style.paint(Class::Annotation, &format!("! parse error: {message}"))]
        }
    }
}

fn paint_symbol(symbol: &Symbol, style: RenderStyle) -> String {
    if symbol.kind != SymbolKind::Function {
        return style.paint(Class::TypeDecl, &symbol.signature());
    }
    if style == RenderStyle::Plain {
        return symbol.signature();
    }

    let name_class = if symbol.is_exported() {
        Class::ExportedFunction
    } else {
        Class::Function
    };
    let params = symbol
        .parameters
        .iter()
        .map(|param| style.paint(Class::Parameter, &param.to_string()))
        .collect::<Vec<_>>()
        .join(", ");
    let mut line = format!("{}({params})", style.paint(name_class, &symbol.name));
    if !symbol.return_types.is_empty() {
        line.push_str(&style.paint(
            Class::ReturnType,
            &format!(" -> {}", symbol.return_types.join(", ")),
        ));
    }
    line
}

/// Flat per-file listing used by the `summary` command.
pub fn render_listing(extractions: &[Extraction]) -> String {
    let mut out = String::new();
    for extraction in extractions {
        out.push_str(&format!("File: {}\n", extraction.path().display()));
        match extraction {
            Extraction::Parsed(summary) => {
                if let Some(package) = &summary.package {
                    out.push_str(&format!("Package: {package}\n"));
                }
                for symbol in &summary.symbols {
                    out.push_str(&listing_line(symbol));
                }
            }
            Extraction::Failed { message, .. } => {
                out.push_str(&format!("  Error: {message}\n"));
            }
        }
        out.push('\n');
    }
    out
}

fn listing_line(symbol: &Symbol) -> String {
    match (symbol.kind, &symbol.receiver) {
        (SymbolKind::Function, Some(receiver)) => {
            format!("  Method: ({receiver}) {}\n", symbol.signature())
        }
        (SymbolKind::Function, None) => format!("  Function: {}\n", symbol.signature()),
        (kind, _) => format!("  {}: {}\n", kind.label(), symbol.name),
    }
}

/// `- Name: description` for every exported function, sorted by name.
/// A later definition of the same name replaces an earlier one.
pub fn render_public_catalog(extractions: &[Extraction]) -> String {
    let catalog: BTreeMap<&str, &str> = extractions
        .iter()
        .filter_map(Extraction::summary)
        .flat_map(|summary| summary.symbols.iter())
        .filter(|symbol| symbol.kind == SymbolKind::Function && symbol.is_exported())
        .map(|symbol| (symbol.name.as_str(), symbol.doc.as_deref().unwrap_or("")))
        .collect();

    catalog
        .into_iter()
        .map(|(name, doc)| format!("- {name}: {doc}\n"))
        .collect()
}
