//! COMMENT ON TABLE / COLUMN / [MATERIALIZED] VIEW

use crate::fragment::{ColumnCommentDef, CommentDef, Fragment};
use crate::lexer::{is_keyword, name_parts, parse_string_literal, qualify};
use ddlcat_core::QualifiedName;
use regex::Regex;
use std::sync::OnceLock;

fn table_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(r"(?is)^COMMENT\s+ON\s+TABLE\s+(", qname!(), r")\s+IS\s+(.+?)\s*$"))
            .expect("valid COMMENT ON TABLE regex")
    })
}

fn column_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?is)^COMMENT\s+ON\s+COLUMN\s+(",
            ident!(),
            r"(?:\s*\.\s*",
            ident!(),
            r"){1,3})\s+IS\s+(.+?)\s*$",
        ))
        .expect("valid COMMENT ON COLUMN regex")
    })
}

fn view_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?is)^COMMENT\s+ON\s+(?:MATERIALIZED\s+)?VIEW\s+(",
            qname!(),
            r")\s+IS\s+(.+?)\s*$",
        ))
        .expect("valid COMMENT ON VIEW regex")
    })
}

/// `Some(None)` for `IS NULL`, `None` when the text is not a literal
fn comment_text(text: &str) -> Option<Option<String>> {
    if is_keyword(text.trim(), "NULL") {
        return Some(None);
    }
    parse_string_literal(text).map(Some)
}

pub(super) fn recognize_table(statement: &str, default_schema: &str) -> Option<Fragment> {
    let caps = table_comment_re().captures(statement)?;
    Some(Fragment::TableComment(CommentDef {
        target: qualify(caps.get(1)?.as_str(), default_schema),
        text: comment_text(caps.get(2)?.as_str())?,
    }))
}

pub(super) fn recognize_column(statement: &str, default_schema: &str) -> Option<Fragment> {
    let caps = column_comment_re().captures(statement)?;
    let mut parts = name_parts(caps.get(1)?.as_str());
    let column = parts.pop()?;
    let name = parts.pop()?;
    let schema = parts.pop().unwrap_or_else(|| default_schema.to_string());

    Some(Fragment::ColumnComment(ColumnCommentDef {
        table: QualifiedName::new(schema, name),
        column,
        text: comment_text(caps.get(2)?.as_str())?,
    }))
}

pub(super) fn recognize_view(statement: &str, default_schema: &str) -> Option<Fragment> {
    let caps = view_comment_re().captures(statement)?;
    Some(Fragment::ViewComment(CommentDef {
        target: qualify(caps.get(1)?.as_str(), default_schema),
        text: comment_text(caps.get(2)?.as_str())?,
    }))
}
