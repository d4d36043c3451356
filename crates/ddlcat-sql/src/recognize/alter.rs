//! ALTER TABLE ... ADD [CONSTRAINT name] FOREIGN KEY / UNIQUE

use crate::fragment::{ForeignKeyDef, Fragment, UniqueDef};
use crate::lexer::{ident_list, qualify, unquote_ident};
use regex::Regex;
use std::sync::OnceLock;

fn foreign_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?is)^ALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?(?:ONLY\s+)?(",
            qname!(),
            r")\s+ADD\s+(?:CONSTRAINT\s+(",
            ident!(),
            r")\s+)?FOREIGN\s+KEY\s*\(([^)]*)\)\s*REFERENCES\s+(",
            qname!(),
            r")\s*(?:\(([^)]*)\))?",
        ))
        .expect("valid ALTER TABLE FOREIGN KEY regex")
    })
}

fn unique_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?is)^ALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?(?:ONLY\s+)?(",
            qname!(),
            r")\s+ADD\s+(?:CONSTRAINT\s+(",
            ident!(),
            r")\s+)?UNIQUE\s*(?:NULLS\s+(?:NOT\s+)?DISTINCT\s*)?\(([^)]*)\)",
        ))
        .expect("valid ALTER TABLE UNIQUE regex")
    })
}

pub(super) fn recognize_foreign_key(statement: &str, default_schema: &str) -> Option<Fragment> {
    let caps = foreign_key_re().captures(statement)?;
    let table = qualify(caps.get(1)?.as_str(), default_schema);
    let columns = ident_list(caps.get(3)?.as_str());
    if columns.is_empty() {
        return None;
    }

    let name = match caps.get(2) {
        Some(name) => unquote_ident(name.as_str()),
        None => format!("{}_{}_fkey", table.name, columns.join("_")),
    };

    Some(Fragment::ForeignKey(ForeignKeyDef {
        table,
        name,
        columns,
        referenced_table: qualify(caps.get(4)?.as_str(), default_schema),
        referenced_columns: caps.get(5).map(|m| ident_list(m.as_str())).unwrap_or_default(),
    }))
}

pub(super) fn recognize_unique(statement: &str, default_schema: &str) -> Option<Fragment> {
    let caps = unique_re().captures(statement)?;
    let table = qualify(caps.get(1)?.as_str(), default_schema);
    let columns = ident_list(caps.get(3)?.as_str());
    if columns.is_empty() {
        return None;
    }

    let name = match caps.get(2) {
        Some(name) => unquote_ident(name.as_str()),
        None => format!("{}_{}_key", table.name, columns.join("_")),
    };

    Some(Fragment::Unique(UniqueDef { table, name, columns }))
}
