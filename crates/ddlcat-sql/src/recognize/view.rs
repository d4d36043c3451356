//! CREATE [MATERIALIZED] VIEW
//!
//! Output columns come from the explicit alias list when one is given,
//! otherwise from the SELECT projection as parsed by sqlparser.

use crate::fragment::Fragment;
use crate::lexer::{ident_list, is_keyword, qualify, unquote_ident, WordList};
use ddlcat_core::{View, ViewColumn};
use regex::Regex;
use sqlparser::ast::{Expr, SelectItem, SetExpr, Statement};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use std::sync::OnceLock;

fn create_view_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?is)^CREATE\s+(?:OR\s+REPLACE\s+)?(?:(?:TEMP|TEMPORARY)\s+)?(?:RECURSIVE\s+)?",
            r"(MATERIALIZED\s+)?VIEW\s+(?:IF\s+NOT\s+EXISTS\s+)?(",
            qname!(),
            r")",
        ))
        .expect("valid CREATE VIEW regex")
    })
}

fn trailing_with_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)\s+WITH\s+(?:NO\s+DATA|DATA|(?:CASCADED\s+|LOCAL\s+)?CHECK\s+OPTION)\s*$")
            .expect("valid trailing WITH regex")
    })
}

/// Name PostgreSQL gives an unnamed projection expression
const UNNAMED_COLUMN: &str = "?column?";

pub(super) fn recognize(statement: &str, default_schema: &str) -> Option<Fragment> {
    let caps = create_view_re().captures(statement)?;
    let is_materialized = caps.get(1).is_some();
    let name = qualify(caps.get(2)?.as_str(), default_schema);

    let words = WordList::new(&statement[caps.get(0)?.end()..]);
    let mut i = 0;

    let aliases = match words.get(i) {
        Some(group) if group.starts_with('(') => {
            i += 1;
            let inner = group.strip_prefix('(')?.strip_suffix(')')?;
            Some(ident_list(inner))
        }
        _ => None,
    };

    // WITH (security_barrier, ...)
    if words.is(i, "WITH") && words.get(i + 1).is_some_and(|w| w.starts_with('(')) {
        i += 2;
    } else if words
        .get(i)
        .is_some_and(|w| w.get(..4).is_some_and(|head| is_keyword(head, "WITH")) && w[4..].starts_with('('))
    {
        i += 1;
    }

    if !words.is(i, "AS") {
        return None;
    }
    let body = words.rest(i + 1);
    let definition = match trailing_with_re().find(body) {
        Some(m) => &body[..m.start()],
        None => body,
    };
    if definition.is_empty() {
        return None;
    }

    let projection = projection_columns(definition);
    let columns = match aliases {
        Some(aliases) => aliases
            .into_iter()
            .enumerate()
            .map(|(idx, alias)| {
                let data_type = projection.get(idx).and_then(|c| c.data_type.clone());
                ViewColumn { name: alias, data_type }
            })
            .collect(),
        None => projection,
    };

    Some(Fragment::View(View {
        schema: name.schema,
        name: name.name,
        definition: definition.to_string(),
        columns,
        is_materialized,
        comment: None,
    }))
}

/// Output columns of a SELECT body; empty when sqlparser cannot read it
fn projection_columns(body: &str) -> Vec<ViewColumn> {
    let statements = match Parser::parse_sql(&PostgreSqlDialect {}, body) {
        Ok(statements) => statements,
        Err(e) => {
            tracing::trace!("view body not parsed: {}", e);
            return Vec::new();
        }
    };

    match statements.first() {
        Some(Statement::Query(query)) => set_expr_columns(&query.body),
        _ => Vec::new(),
    }
}

fn set_expr_columns(set_expr: &SetExpr) -> Vec<ViewColumn> {
    match set_expr {
        SetExpr::Select(select) => select.projection.iter().filter_map(select_item_column).collect(),
        SetExpr::Query(query) => set_expr_columns(&query.body),
        // UNION, INTERSECT and EXCEPT take their names from the left side
        SetExpr::SetOperation { left, .. } => set_expr_columns(left),
        _ => Vec::new(),
    }
}

fn select_item_column(item: &SelectItem) -> Option<ViewColumn> {
    match item {
        SelectItem::ExprWithAlias { expr, alias } => Some(ViewColumn {
            name: alias.value.clone(),
            data_type: cast_type(expr),
        }),
        SelectItem::UnnamedExpr(expr) => Some(ViewColumn {
            name: expr_name(expr),
            data_type: cast_type(expr),
        }),
        SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => None,
    }
}

fn expr_name(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(ident) => ident.value.clone(),
        Expr::CompoundIdentifier(idents) => idents
            .last()
            .map(|i| i.value.clone())
            .unwrap_or_else(|| UNNAMED_COLUMN.to_string()),
        Expr::Cast { expr, .. } | Expr::Nested(expr) => expr_name(expr),
        Expr::Function(function) => {
            let name = function.name.to_string();
            let last = name.rsplit('.').next().unwrap_or(&name);
            unquote_ident(last)
        }
        _ => UNNAMED_COLUMN.to_string(),
    }
}

fn cast_type(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Cast { data_type, .. } => Some(data_type.to_string()),
        Expr::Nested(inner) => cast_type(inner),
        _ => None,
    }
}
