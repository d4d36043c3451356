//! CREATE TABLE

use crate::fragment::Fragment;
use crate::lexer::{first_group, ident_list, is_keyword, paren_body, qualify, split_top_level, unquote_ident, WordList};
use ddlcat_core::{Column, Table};
use regex::Regex;
use std::sync::OnceLock;

fn create_table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?is)^CREATE\s+(?:(?:GLOBAL|LOCAL)\s+)?(?:(?:TEMPORARY|TEMP|UNLOGGED)\s+)?TABLE\s+",
            r"(?:IF\s+NOT\s+EXISTS\s+)?(",
            qname!(),
            r")\s*\(",
        ))
        .expect("valid CREATE TABLE regex")
    })
}

/// Words that end a column's type or DEFAULT expression
const COLUMN_KEYWORDS: &[&str] = &[
    "NOT", "NULL", "DEFAULT", "PRIMARY", "UNIQUE", "REFERENCES", "CHECK", "CONSTRAINT", "COLLATE",
    "GENERATED",
];

fn is_column_keyword(word: &str) -> bool {
    COLUMN_KEYWORDS.iter().any(|k| is_keyword(word, k))
}

/// A table-level entry of the column list
enum TableConstraint {
    PrimaryKey(Vec<String>),
    Unique(Vec<String>),
    Other,
}

pub(super) fn recognize(statement: &str, default_schema: &str) -> Option<Fragment> {
    let caps = create_table_re().captures(statement)?;
    let name = qualify(caps.get(1)?.as_str(), default_schema);
    let body = paren_body(statement, caps.get(0)?.end() - 1)?;

    let mut columns = Vec::new();
    let mut constraints = Vec::new();
    for element in split_top_level(body, b',') {
        match table_constraint(element) {
            Some(constraint) => constraints.push(constraint),
            None => columns.extend(parse_column(element)),
        }
    }

    let mut table = Table::new(name.schema, name.name, columns);
    for constraint in constraints {
        match constraint {
            TableConstraint::PrimaryKey(names) => {
                for name in names {
                    if let Some(column) = table.find_column_mut(&name) {
                        column.is_primary_key = true;
                    }
                }
            }
            TableConstraint::Unique(names) => {
                for name in names {
                    if let Some(column) = table.find_column_mut(&name) {
                        column.is_unique = true;
                    }
                }
            }
            TableConstraint::Other => {}
        }
    }

    Some(Fragment::Table(table))
}

/// Classify a column-list entry; `None` means it is a column definition
fn table_constraint(element: &str) -> Option<TableConstraint> {
    let words = WordList::new(element);
    let start = if words.is(0, "CONSTRAINT") { 2 } else { 0 };
    let head = words.get(start)?;

    // `KEY(a)` and `UNIQUE(a)` may be glued to their column list
    let keyword = head.split('(').next().unwrap_or(head);
    let rest = words.rest(start);

    if is_keyword(keyword, "PRIMARY") {
        Some(TableConstraint::PrimaryKey(first_group(rest).map(ident_list).unwrap_or_default()))
    } else if is_keyword(keyword, "UNIQUE") {
        Some(TableConstraint::Unique(first_group(rest).map(ident_list).unwrap_or_default()))
    } else if ["FOREIGN", "CHECK", "LIKE"].iter().any(|k| is_keyword(keyword, k))
        || (is_keyword(keyword, "EXCLUDE")
            && (words.is(start + 1, "USING")
                || head.contains('(')
                || words.get(start + 1).is_some_and(|w| w.starts_with('('))))
        || start > 0
    {
        Some(TableConstraint::Other)
    } else {
        None
    }
}

/// Parse `name type [constraints...]`
fn parse_column(element: &str) -> Option<Column> {
    let words = WordList::new(element);
    let name = unquote_ident(words.get(0)?);

    let type_end = words.position(1, is_column_keyword).unwrap_or(words.len());
    if type_end <= 1 {
        return None;
    }
    let (data_type, is_array) = split_array_suffix(words.slice(1, type_end));
    let mut column = Column::new(name, data_type).with_array(is_array);

    let mut i = type_end;
    while let Some(word) = words.get(i) {
        if is_keyword(word, "NOT") && words.is(i + 1, "NULL") {
            column.nullable = false;
            i += 2;
        } else if is_keyword(word, "NULL") {
            column.nullable = true;
            i += 1;
        } else if is_keyword(word, "DEFAULT") {
            // the first word always belongs to the expression (`DEFAULT NULL`)
            let end = words.position(i + 2, is_column_keyword).unwrap_or(words.len());
            let expr = words.slice(i + 1, end);
            if !expr.is_empty() {
                column.default = Some(expr.to_string());
            }
            i = end;
        } else if is_keyword(word, "PRIMARY") && words.is(i + 1, "KEY") {
            column.is_primary_key = true;
            i += 2;
        } else if is_keyword(word, "UNIQUE") {
            column.is_unique = true;
            i += 1;
        } else {
            i += 1;
        }
    }

    Some(column)
}

/// Strip `[]`, `[n]` and `ARRAY` suffixes, reporting whether any was present
fn split_array_suffix(data_type: &str) -> (String, bool) {
    let mut text = data_type.trim();
    let mut is_array = false;

    loop {
        if text.ends_with(']') {
            if let Some(open) = text.rfind('[') {
                text = text[..open].trim_end();
                is_array = true;
                continue;
            }
        }
        if let Some(head) = strip_keyword_suffix(text, "ARRAY") {
            text = head;
            is_array = true;
            continue;
        }
        break;
    }

    (text.to_string(), is_array)
}

/// `text` without a trailing whitespace-separated `keyword`
fn strip_keyword_suffix<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let split = text.len().checked_sub(keyword.len())?;
    if !text.is_char_boundary(split) || !is_keyword(&text[split..], keyword) {
        return None;
    }
    let head = &text[..split];
    if !head.ends_with(|c: char| c.is_whitespace()) {
        return None;
    }
    let head = head.trim_end();
    (!head.is_empty()).then_some(head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(sql: &str) -> Table {
        match recognize(sql, "public") {
            Some(Fragment::Table(table)) => table,
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn simple_table() {
        let t = table("CREATE TABLE users(id UUID)");
        assert_eq!(t.schema, "public");
        assert_eq!(t.name, "users");
        assert_eq!(t.columns, vec![Column::new("id", "UUID")]);
        assert!(t.relationships.is_empty());
        assert!(t.indexes.is_empty());
    }

    #[test]
    fn column_attributes() {
        let t = table(
            "CREATE TABLE IF NOT EXISTS app.accounts (\n\
               id bigint NOT NULL PRIMARY KEY,\n\
               email character varying(255) NOT NULL UNIQUE,\n\
               balance numeric(12, 2) DEFAULT 0 NOT NULL,\n\
               tags text[] DEFAULT '{}'::text[],\n\
               scores integer ARRAY[3],\n\
               created_at timestamp with time zone DEFAULT now(),\n\
               nickname text NULL\n\
             )",
        );
        assert_eq!(t.schema, "app");
        assert_eq!(t.name, "accounts");
        assert_eq!(
            t.columns,
            vec![
                Column::new("id", "bigint").with_nullable(false).with_primary_key(true),
                Column::new("email", "character varying(255)").with_nullable(false).with_unique(true),
                Column::new("balance", "numeric(12, 2)").with_nullable(false).with_default("0"),
                Column::new("tags", "text").with_array(true).with_default("'{}'::text[]"),
                Column::new("scores", "integer").with_array(true),
                Column::new("created_at", "timestamp with time zone").with_default("now()"),
                Column::new("nickname", "text"),
            ]
        );
    }

    #[test]
    fn primary_key_alone_keeps_nullable() {
        let t = table("CREATE TABLE t (id uuid PRIMARY KEY)");
        assert!(t.columns[0].is_primary_key);
        assert!(t.columns[0].nullable);
    }

    #[test]
    fn default_expressions() {
        let t = table(
            "CREATE TABLE t (a int DEFAULT nextval('t_a_seq'::regclass) NOT NULL, \
             b text DEFAULT 'x, y', c int DEFAULT NULL, d int DEFAULT 1 + 2 CHECK (d > 0))",
        );
        assert_eq!(t.columns[0].default.as_deref(), Some("nextval('t_a_seq'::regclass)"));
        assert!(!t.columns[0].nullable);
        assert_eq!(t.columns[1].default.as_deref(), Some("'x, y'"));
        assert_eq!(t.columns[2].default.as_deref(), Some("NULL"));
        assert!(t.columns[2].nullable);
        assert_eq!(t.columns[3].default.as_deref(), Some("1 + 2"));
    }

    #[test]
    fn table_constraints_are_not_columns() {
        let t = table(
            "CREATE TABLE memberships (\
               user_id uuid NOT NULL, \
               org_id uuid NOT NULL, \
               slug text, \
               CONSTRAINT memberships_pkey PRIMARY KEY (user_id, org_id), \
               UNIQUE(slug), \
               FOREIGN KEY (org_id) REFERENCES orgs(id), \
               CHECK (slug <> '')\
             )",
        );
        assert_eq!(t.column_names(), vec!["user_id", "org_id", "slug"]);
        assert!(t.columns[0].is_primary_key);
        assert!(t.columns[1].is_primary_key);
        assert!(t.columns[2].is_unique);
        assert!(t.relationships.is_empty());
    }

    #[test]
    fn quoted_identifiers() {
        let t = table("CREATE TABLE \"Sales\".\"Order Items\" (\"Item Id\" int, \"desc\" text COLLATE \"C\")");
        assert_eq!(t.schema, "Sales");
        assert_eq!(t.name, "Order Items");
        assert_eq!(t.column_names(), vec!["Item Id", "desc"]);
        assert_eq!(t.columns[1].data_type, "text");
    }

    #[test]
    fn modifiers_and_trailing_clauses() {
        let t = table("CREATE UNLOGGED TABLE cache (k text) WITH (fillfactor = 70)");
        assert_eq!(t.name, "cache");
        assert_eq!(t.column_names(), vec!["k"]);

        let t = table("CREATE TEMP TABLE scratch (v int) ON COMMIT DROP");
        assert_eq!(t.name, "scratch");
    }

    #[test]
    fn not_a_table() {
        assert!(recognize("CREATE TABLE t AS SELECT 1", "public").is_none());
        assert!(recognize("CREATE TABLE t (", "public").is_none());
        assert!(recognize("CREATE INDEX i ON t (a)", "public").is_none());
        assert!(recognize("DROP TABLE t", "public").is_none());
    }

    #[test]
    fn array_suffixes() {
        assert_eq!(split_array_suffix("int[]"), ("int".to_string(), true));
        assert_eq!(split_array_suffix("int[][]"), ("int".to_string(), true));
        assert_eq!(split_array_suffix("varchar(10)[4]"), ("varchar(10)".to_string(), true));
        assert_eq!(split_array_suffix("text array"), ("text".to_string(), true));
        assert_eq!(split_array_suffix("myarray"), ("myarray".to_string(), false));
        assert_eq!(split_array_suffix("uuid"), ("uuid".to_string(), false));
    }
}
