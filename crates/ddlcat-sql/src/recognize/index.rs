//! CREATE [UNIQUE] INDEX

use crate::fragment::{Fragment, IndexDef};
use crate::lexer::{paren_body, qualify, split_top_level, unquote_ident, WordList};
use ddlcat_core::Index;
use regex::Regex;
use std::sync::OnceLock;

fn create_index_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?is)^CREATE\s+(UNIQUE\s+)?INDEX\s+(?:CONCURRENTLY\s+)?(?:(?:IF\s+NOT\s+EXISTS\s+)?(",
            ident!(),
            r")\s+)?ON\s+(?:ONLY\s+)?(",
            qname!(),
            r")\s*(?:USING\s+(",
            ident!(),
            r")\s*)?\(",
        ))
        .expect("valid CREATE INDEX regex")
    })
}

pub(super) fn recognize(statement: &str, default_schema: &str) -> Option<Fragment> {
    let caps = create_index_re().captures(statement)?;
    let table = qualify(caps.get(3)?.as_str(), default_schema);
    let body = paren_body(statement, caps.get(0)?.end() - 1)?;

    let elements: Vec<Element> = split_top_level(body, b',').into_iter().filter_map(parse_element).collect();
    if elements.is_empty() {
        return None;
    }

    let name = match caps.get(2) {
        Some(name) => unquote_ident(name.as_str()),
        None => default_name(&table.name, &elements),
    };

    let index = Index {
        name,
        table: table.name.clone(),
        columns: elements.into_iter().map(Element::into_text).collect(),
        is_unique: caps.get(1).is_some(),
        method: caps.get(4).map(|m| unquote_ident(m.as_str())),
    };

    Some(Fragment::Index(IndexDef { table, index }))
}

/// One entry of the index key list
enum Element {
    Column(String),
    Expression(String),
}

impl Element {
    fn into_text(self) -> String {
        match self {
            Self::Column(text) | Self::Expression(text) => text,
        }
    }
}

/// Drop ordering, opclass and collation decorations from a key entry
fn parse_element(element: &str) -> Option<Element> {
    let words = WordList::new(element);
    let first = words.get(0)?;

    // `lower (email)` written with a space before the call parens
    if words.get(1).is_some_and(|w| w.starts_with('(')) && is_identifier(first) {
        return Some(Element::Expression(words.slice(0, 2).to_string()));
    }

    if is_identifier(first) {
        Some(Element::Column(unquote_ident(first)))
    } else {
        Some(Element::Expression(first.to_string()))
    }
}

fn is_identifier(word: &str) -> bool {
    if word.len() >= 2 && word.starts_with('"') && word.ends_with('"') {
        return true;
    }
    let mut chars = word.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// `<table>_<col1>[_<colN>]_idx`
fn default_name(table: &str, elements: &[Element]) -> String {
    let parts: Vec<&str> = elements
        .iter()
        .map(|e| match e {
            Element::Column(name) => name.as_str(),
            Element::Expression(_) => "expr",
        })
        .collect();
    format!("{}_{}_idx", table, parts.join("_"))
}
