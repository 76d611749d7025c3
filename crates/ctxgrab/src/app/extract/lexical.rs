use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ExtractMode, SymbolExtractor, split_top_level};
use crate::domain::model::{Extraction, FileSummary, Parameter, Symbol};

static FUNC_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*func\s+(?:\(([^)]*)\)\s*)?(\w+)\s*\(")
        .expect("function pattern compiles")
});

static PACKAGE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*package\s+(\w+)").expect("package pattern compiles"));

/// Line-oriented extractor. Tolerates files that would not parse.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalExtractor;

impl LexicalExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl SymbolExtractor for LexicalExtractor {
    fn mode(&self) -> ExtractMode {
        ExtractMode::Lexical
    }

    fn extract_source(&self, path: &Path, source: &str) -> Extraction {
        let mut summary = FileSummary::new(path);
        let mut pending_doc: Option<String> = None;

        for line in source.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(comment) = trimmed.strip_prefix("//") {
                pending_doc = Some(comment.trim().to_owned());
                continue;
            }
            if summary.package.is_none()
                && let Some(caps) = PACKAGE_LINE.captures(line)
            {
                summary.package = Some(caps[1].to_owned());
                pending_doc = None;
                continue;
            }

            let Some(caps) = FUNC_LINE.captures(line) else {
                pending_doc = None;
                continue;
            };
            let opened = caps.get(0).map_or(line.len(), |m| m.end());
            let Some((params, rest)) = close_group(&line[opened..]) else {
                pending_doc = None;
                continue;
            };

            let mut symbol = Symbol::function(&caps[2]);
            symbol.receiver = caps
                .get(1)
                .map(|m| m.as_str().trim().to_owned())
                .filter(|receiver| !receiver.is_empty());
            symbol.parameters = declarations(params)
                .into_iter()
                .flat_map(Declaration::into_parameters)
                .collect();
            symbol.return_types = parse_returns(rest.split('{').next().unwrap_or(""));
            symbol.doc = pending_doc.take();
            summary.symbols.push(symbol);
        }

        Extraction::Parsed(summary)
    }
}

/// Split `text`, which follows an opening parenthesis, at its matching
/// close. `None` when the group does not close on this line.
fn close_group(text: &str) -> Option<(&str, &str)> {
    let mut depth = 1usize;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&text[..i], &text[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Names sharing one type; empty for unnamed entries.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Declaration {
    names: Vec<String>,
    ty: String,
}

impl Declaration {
    fn into_parameters(self) -> Vec<Parameter> {
        if self.names.is_empty() {
            return vec![Parameter::anonymous(self.ty)];
        }
        let ty = self.ty;
        self.names
            .into_iter()
            .map(|name| Parameter::named(name, ty.clone()))
            .collect()
    }
}

/// Group a parameter or result list the way Go reads it: either every entry
/// is a bare type, or bare names borrow the type of the next typed entry.
fn declarations(list: &str) -> Vec<Declaration> {
    let parts = split_top_level(list);
    if !parts.iter().any(|part| named_entry(part).is_some()) {
        return parts
            .into_iter()
            .map(|ty| Declaration {
                names: Vec::new(),
                ty,
            })
            .collect();
    }

    let mut out = Vec::new();
    let mut pending = Vec::new();
    for part in parts {
        match named_entry(&part) {
            Some((name, ty)) => {
                pending.push(name.to_owned());
                out.push(Declaration {
                    names: std::mem::take(&mut pending),
                    ty: ty.to_owned(),
                });
            }
            None => pending.push(part),
        }
    }
    // Names left without a type on a malformed line stay as written.
    out.extend(pending.into_iter().map(|ty| Declaration {
        names: Vec::new(),
        ty,
    }));
    out
}

const TYPE_KEYWORDS: [&str; 4] = ["chan", "func", "interface", "struct"];

fn named_entry(part: &str) -> Option<(&str, &str)> {
    let (name, ty) = part.split_once(char::is_whitespace)?;
    let ty = ty.trim();
    (is_identifier(name) && !TYPE_KEYWORDS.contains(&name) && !ty.is_empty())
        .then_some((name, ty))
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// One type per result declaration, so `(head, tail string)` yields `string`.
fn parse_returns(clause: &str) -> Vec<String> {
    let clause = clause.trim();
    if clause.is_empty() {
        return Vec::new();
    }
    match clause.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
        Some(inner) => declarations(inner).into_iter().map(|decl| decl.ty).collect(),
        None => vec![clause.to_owned()],
    }
}
