use std::path::Path;

use tree_sitter::{Node, Parser};

use super::{ExtractMode, SymbolExtractor};
use crate::domain::model::{Extraction, FileSummary, Parameter, Symbol, SymbolKind, is_exported};

/// Tree-sitter backed extractor for exported declarations.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntacticExtractor;

impl SyntacticExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl SymbolExtractor for SyntacticExtractor {
    fn mode(&self) -> ExtractMode {
        ExtractMode::Syntactic
    }

    fn extract_source(&self, path: &Path, source: &str) -> Extraction {
        match parse_declarations(path, source) {
            Ok(summary) => Extraction::Parsed(summary),
            Err(message) => Extraction::Failed {
                path: path.to_path_buf(),
                message,
            },
        }
    }
}

fn parse_declarations(path: &Path, source: &str) -> Result<FileSummary, String> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|err| format!("failed to load Go grammar: {err}"))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| "parser produced no syntax tree".to_owned())?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(describe_error(root));
    }

    let src = source.as_bytes();
    let mut summary = FileSummary::new(path);
    let mut cursor = root.walk();
    for node in root.named_children(&mut cursor) {
        match node.kind() {
            "package_clause" => {
                summary.package = node
                    .named_child(0)
                    .map(|name| text(name, src).to_owned());
            }
            "function_declaration" | "method_declaration" => {
                if let Some(symbol) = function_symbol(node, src) {
                    summary.symbols.push(symbol);
                }
            }
            "type_declaration" => {
                let mut specs = node.walk();
                for spec in node.named_children(&mut specs) {
                    if let Some(symbol) = type_symbol(spec, node, src) {
                        summary.symbols.push(symbol);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(summary)
}

fn function_symbol(node: Node, src: &[u8]) -> Option<Symbol> {
    let name = text(node.child_by_field_name("name")?, src);
    if !is_exported(name) {
        return None;
    }

    let mut symbol = Symbol::function(name);
    symbol.receiver = node
        .child_by_field_name("receiver")
        .and_then(|receiver| parameters(receiver, src).into_iter().next())
        .map(|param| param.to_string());
    if let Some(params) = node.child_by_field_name("parameters") {
        symbol.parameters = parameters(params, src);
    }
    if let Some(result) = node.child_by_field_name("result") {
        symbol.return_types = if result.kind() == "parameter_list" {
            result_types(result, src)
        } else {
            vec![text(result, src).to_owned()]
        };
    }
    symbol.doc = doc_comment(node, src);
    Some(symbol)
}

fn type_symbol(spec: Node, decl: Node, src: &[u8]) -> Option<Symbol> {
    if spec.kind() != "type_spec" {
        return None;
    }
    let name = text(spec.child_by_field_name("name")?, src);
    let kind = match spec.child_by_field_name("type")?.kind() {
        "struct_type" => SymbolKind::Struct,
        "interface_type" => SymbolKind::Interface,
        _ => return None,
    };
    if !is_exported(name) {
        return None;
    }
    let mut symbol = Symbol::type_decl(kind, name);
    symbol.doc = doc_comment(spec, src).or_else(|| doc_comment(decl, src));
    Some(symbol)
}

/// One entry per declared name; unnamed declarations become anonymous parameters.
fn parameters(list: Node, src: &[u8]) -> Vec<Parameter> {
    let mut out = Vec::new();
    let mut cursor = list.walk();
    for decl in list.named_children(&mut cursor) {
        let Some(ty) = declared_type(decl, src) else {
            continue;
        };
        let mut names = decl.walk();
        let declared: Vec<_> = decl
            .children_by_field_name("name", &mut names)
            .map(|name| text(name, src).to_owned())
            .collect();
        if declared.is_empty() {
            out.push(Parameter::anonymous(ty));
        } else {
            out.extend(declared.into_iter().map(|name| Parameter::named(name, ty.clone())));
        }
    }
    out
}

/// Result lists contribute one type per declaration, however many names it has.
fn result_types(list: Node, src: &[u8]) -> Vec<String> {
    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .filter_map(|decl| declared_type(decl, src))
        .collect()
}

fn declared_type(decl: Node, src: &[u8]) -> Option<String> {
    let ty = text(decl.child_by_field_name("type")?, src);
    Some(if decl.kind() == "variadic_parameter_declaration" {
        format!("...{ty}")
    } else {
        ty.to_owned()
    })
}

/// The `//` comment ending on the line right above `node`, if any.
fn doc_comment(node: Node, src: &[u8]) -> Option<String> {
    let prev = node.prev_named_sibling()?;
    if prev.kind() != "comment" || prev.end_position().row + 1 != node.start_position().row {
        return None;
    }
    text(prev, src)
        .strip_prefix("//")
        .map(|comment| comment.trim().to_owned())
}

fn describe_error(root: Node) -> String {
    let mut cursor = root.walk();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            let what = if node.is_missing() {
                format!("missing {}", node.kind())
            } else {
                "syntax error".to_owned()
            };
            return format!("{what} at line {}, column {}", pos.row + 1, pos.column + 1);
        }
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    "syntax error".to_owned()
}

fn text<'a>(node: Node, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> Extraction {
        SyntacticExtractor::new().extract_source(Path::new("x.go"), source)
    }

    fn symbols(source: &str) -> Vec<Symbol> {
        extract(source)
            .summary()
            .expect("source parses")
            .symbols
            .clone()
    }

    const SAMPLE: &str = r#"package store

import "context"

// Store persists things.
type Store struct {
	items map[string]int
}

type cache struct{}

// Reader reads.
type Reader interface {
	Read(ctx context.Context) ([]byte, error)
}

type ID string

// Open creates a store.
func Open(path string, opts ...Option) (*Store, error) {
	return nil, nil
}

func (s *Store) Get(context.Context, string) int {
	return 0
}

func helper(a, b int) {}

func Split(a, b int) (head, tail string) {
	return "", ""
}
"#;

    #[test]
    fn emits_exported_functions_structs_and_interfaces() {
        let found = symbols(SAMPLE);
        let listed: Vec<_> = found
            .iter()
            .map(|s| (s.kind, s.name.as_str()))
            .collect();
        assert_eq!(
            listed,
            vec![
                (SymbolKind::Struct, "Store"),
                (SymbolKind::Interface, "Reader"),
                (SymbolKind::Function, "Open"),
                (SymbolKind::Function, "Get"),
                (SymbolKind::Function, "Split"),
            ]
        );
        assert!(found.iter().all(Symbol::is_exported));
    }

    #[test]
    fn records_signatures_docs_and_receivers() {
        let found = symbols(SAMPLE);
        let open = found.iter().find(|s| s.name == "Open").expect("Open");
        assert_eq!(open.signature(), "Open(path string, opts ...Option) -> *Store, error");
        assert_eq!(open.doc.as_deref(), Some("Open creates a store."));

        let get = found.iter().find(|s| s.name == "Get").expect("Get");
        assert_eq!(get.receiver.as_deref(), Some("s *Store"));
        assert_eq!(
            get.parameters,
            vec![
                Parameter::anonymous("context.Context"),
                Parameter::anonymous("string")
            ]
        );
        assert_eq!(get.doc, None);

        let split = found.iter().find(|s| s.name == "Split").expect("Split");
        assert_eq!(split.signature(), "Split(a int, b int) -> string");

        let store = found.iter().find(|s| s.name == "Store").expect("Store");
        assert_eq!(store.doc.as_deref(), Some("Store persists things."));
        assert_eq!(store.signature(), "type Store struct");
    }

    #[test]
    fn reports_package_name() {
        let summary = extract(SAMPLE);
        assert_eq!(
            summary.summary().and_then(|s| s.package.as_deref()),
            Some("store")
        );
    }

    #[test]
    fn syntax_errors_become_failed_extractions() {
        match extract("package x\n\nfunc Broken( {\n") {
            Extraction::Failed { message, .. } => assert!(message.contains("line")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
