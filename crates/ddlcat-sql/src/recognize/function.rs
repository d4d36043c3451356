//! CREATE [OR REPLACE] FUNCTION

use crate::fragment::Fragment;
use crate::lexer::{is_keyword, matching_paren, qualify, split_top_level, unquote_ident, WordList};
use ddlcat_core::{Argument, ArgumentMode, Function};
use regex::Regex;
use std::sync::OnceLock;

fn create_function_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?is)^CREATE\s+(?:OR\s+REPLACE\s+)?FUNCTION\s+(",
            qname!(),
            r")\s*\(",
        ))
        .expect("valid CREATE FUNCTION regex")
    })
}

/// Routine attributes that may follow the RETURNS clause
const ATTRIBUTE_KEYWORDS: &[&str] = &[
    "LANGUAGE", "AS", "IMMUTABLE", "STABLE", "VOLATILE", "STRICT", "SECURITY", "EXTERNAL", "COST",
    "ROWS", "PARALLEL", "SET", "WINDOW", "LEAKPROOF", "NOT", "CALLED", "RETURNS", "BEGIN", "SUPPORT",
    "TRANSFORM",
];

/// First words of built-in types spelled with more than one word
const MULTI_WORD_TYPE_HEADS: &[&str] = &["double", "character", "char", "bit", "timestamp", "time", "national"];

/// Second words that continue one of [`MULTI_WORD_TYPE_HEADS`]
const MULTI_WORD_TYPE_TAILS: &[&str] = &["precision", "varying", "with", "without", "character", "char"];

pub(super) fn recognize(statement: &str, default_schema: &str) -> Option<Fragment> {
    let caps = create_function_re().captures(statement)?;
    let name = qualify(caps.get(1)?.as_str(), default_schema);
    let open = caps.get(0)?.end() - 1;
    let close = matching_paren(statement, open)?;

    let arguments = split_top_level(&statement[open + 1..close], b',')
        .into_iter()
        .enumerate()
        .filter_map(|(i, element)| parse_argument(element, i + 1))
        .collect();

    Some(Fragment::Function(Function {
        schema: name.schema,
        name: name.name,
        arguments,
        returns: parse_returns(&statement[close + 1..]),
    }))
}

fn parse_argument(element: &str, position: usize) -> Option<Argument> {
    let words = WordList::new(element);

    let (mode, start) = match words.get(0) {
        Some(w) if is_keyword(w, "IN") => (ArgumentMode::In, 1),
        Some(w) if is_keyword(w, "OUT") => (ArgumentMode::Out, 1),
        Some(w) if is_keyword(w, "INOUT") => (ArgumentMode::InOut, 1),
        Some(w) if is_keyword(w, "VARIADIC") => (ArgumentMode::Variadic, 1),
        _ => (ArgumentMode::In, 0),
    };

    let end = words
        .position(start, |w| is_keyword(w, "DEFAULT") || w == "=")
        .unwrap_or(words.len());
    let first = words.get(start).filter(|_| start < end)?;

    let named = end - start > 1 && !starts_multi_word_type(first, words.get(start + 1));
    let argument = if named {
        Argument::new(unquote_ident(first), words.slice(start + 1, end))
    } else {
        Argument::new(format!("${}", position), words.slice(start, end))
    };

    Some(argument.with_mode(mode))
}

fn starts_multi_word_type(first: &str, second: Option<&str>) -> bool {
    let Some(second) = second else {
        return false;
    };
    MULTI_WORD_TYPE_HEADS.iter().any(|h| is_keyword(first, h))
        && MULTI_WORD_TYPE_TAILS.iter().any(|t| is_keyword(second, t))
}

/// Text of the RETURNS clause, `void` when absent
fn parse_returns(tail: &str) -> String {
    let words = WordList::new(tail);
    let returns = words
        .position(0, |w| is_keyword(w, "RETURNS"))
        .map(|start| {
            let end = words
                .position(start + 1, |w| ATTRIBUTE_KEYWORDS.iter().any(|k| is_keyword(w, k)))
                .unwrap_or(words.len());
            words.slice(start + 1, end)
        })
        .unwrap_or_default();

    if returns.is_empty() {
        "void".to_string()
    } else {
        returns.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn function(sql: &str) -> Function {
        match recognize(sql, "public") {
            Some(Fragment::Function(function)) => function,
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn named_arguments_and_returns() {
        let f = function(
            "CREATE OR REPLACE FUNCTION billing.add_credit(account_id uuid, amount numeric(10, 2) DEFAULT 0)\n\
             RETURNS numeric LANGUAGE sql STABLE AS $$ SELECT amount; $$",
        );
        assert_eq!(f.schema, "billing");
        assert_eq!(f.name, "add_credit");
        assert_eq!(
            f.arguments,
            vec![Argument::new("account_id", "uuid"), Argument::new("amount", "numeric(10, 2)")]
        );
        assert_eq!(f.returns, "numeric");
    }

    #[test]
    fn unnamed_and_multi_word_arguments() {
        let f = function(
            "CREATE FUNCTION f(integer, double precision, ts timestamp with time zone) RETURNS void AS 'x' LANGUAGE sql",
        );
        assert_eq!(
            f.arguments,
            vec![
                Argument::new("$1", "integer"),
                Argument::new("$2", "double precision"),
                Argument::new("ts", "timestamp with time zone"),
            ]
        );
    }

    #[test]
    fn argument_modes() {
        let f = function(
            "CREATE FUNCTION split(IN input text, OUT head text, VARIADIC rest text[]) AS $$ $$ LANGUAGE sql",
        );
        assert_eq!(
            f.arguments,
            vec![
                Argument::new("input", "text"),
                Argument::new("head", "text").with_mode(ArgumentMode::Out),
                Argument::new("rest", "text[]").with_mode(ArgumentMode::Variadic),
            ]
        );
        assert_eq!(f.returns, "void");
    }

    #[test]
    fn table_and_setof_returns() {
        let f = function(
            "CREATE FUNCTION active_users() RETURNS TABLE(id uuid, email text) LANGUAGE sql AS $$ SELECT 1 $$",
        );
        assert!(f.arguments.is_empty());
        assert_eq!(f.returns, "TABLE(id uuid, email text)");

        let f = function("CREATE FUNCTION all_ids() RETURNS SETOF uuid AS $$ SELECT 1 $$ LANGUAGE sql");
        assert_eq!(f.returns, "SETOF uuid");

        let f = function("CREATE FUNCTION trg() RETURNS trigger LANGUAGE plpgsql AS $f$ BEGIN RETURN NEW; END $f$");
        assert_eq!(f.returns, "trigger");
    }

    #[test]
    fn returns_inside_body_is_ignored() {
        let f = function("CREATE FUNCTION f() LANGUAGE sql AS $$ RETURNS int $$");
        assert_eq!(f.returns, "void");
    }

    #[test]
    fn not_a_function() {
        assert!(recognize("CREATE PROCEDURE p() AS $$ $$", "public").is_none());
        assert!(recognize("CREATE FUNCTION broken(", "public").is_none());
    }
}
