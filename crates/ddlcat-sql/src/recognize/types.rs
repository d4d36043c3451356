//! CREATE TYPE ... AS ENUM and CREATE TYPE ... AS (composite)

use crate::fragment::Fragment;
use crate::lexer::{is_keyword, paren_body, parse_string_literal, qualify, split_top_level, unquote_ident, WordList};
use ddlcat_core::{Attribute, CompositeType, EnumType};
use regex::Regex;
use std::sync::OnceLock;

fn enum_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(r"(?is)^CREATE\s+TYPE\s+(", qname!(), r")\s+AS\s+ENUM\s*\("))
            .expect("valid CREATE TYPE AS ENUM regex")
    })
}

fn composite_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(r"(?is)^CREATE\s+TYPE\s+(", qname!(), r")\s+AS\s*\("))
            .expect("valid CREATE TYPE AS regex")
    })
}

pub(super) fn recognize_enum(statement: &str, default_schema: &str) -> Option<Fragment> {
    let caps = enum_re().captures(statement)?;
    let name = qualify(caps.get(1)?.as_str(), default_schema);
    let body = paren_body(statement, caps.get(0)?.end() - 1)?;

    let values = split_top_level(body, b',')
        .into_iter()
        .filter_map(parse_string_literal)
        .collect();

    Some(Fragment::Enum(EnumType {
        schema: name.schema,
        name: name.name,
        values,
    }))
}

pub(super) fn recognize_composite(statement: &str, default_schema: &str) -> Option<Fragment> {
    let caps = composite_re().captures(statement)?;
    let name = qualify(caps.get(1)?.as_str(), default_schema);
    let body = paren_body(statement, caps.get(0)?.end() - 1)?;

    let attributes = split_top_level(body, b',')
        .into_iter()
        .filter_map(|element| {
            let words = WordList::new(element);
            let name = words.get(0)?;
            let type_end = words.position(1, |w| is_keyword(w, "COLLATE")).unwrap_or(words.len());
            let data_type = words.slice(1, type_end);
            (!data_type.is_empty()).then(|| Attribute::new(unquote_ident(name), data_type))
        })
        .collect();

    Some(Fragment::Composite(CompositeType {
        schema: name.schema,
        name: name.name,
        attributes,
    }))
}
