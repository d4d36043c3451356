//! Statement recognizers
//!
//! Each recognizer matches one DDL grammar against a single statement and
//! returns a [`Fragment`], or `None` when the statement is not its concern.
//! Recognizers never fail: anything they cannot read is left to the next one,
//! and a statement no recognizer claims is ignored.
//!
//! Order matters. Some grammars are prefixes of others (`CREATE TYPE ... AS
//! ENUM` vs `CREATE TYPE ... AS (`), so the chain is tried most specific first.

/// Regex for a possibly quoted identifier
macro_rules! ident {
    () => {
        r#"(?:"(?:[^"]|"")+"|[A-Za-z_][A-Za-z0-9_$]*)"#
    };
}

/// Regex for an identifier with up to two qualifying prefixes
macro_rules! qname {
    () => {
        concat!(ident!(), r"(?:\s*\.\s*", ident!(), r"){0,2}")
    };
}

mod alter;
mod comment;
mod function;
mod index;
mod table;
mod types;
mod view;

use crate::fragment::{Fragment, FragmentKind};

/// A recognizer entry in the priority chain
#[derive(Clone, Copy)]
pub struct Recognizer {
    pub kind: FragmentKind,

    /// `(statement, default_schema)` to fragment
    pub recognize: fn(&str, &str) -> Option<Fragment>,
}

/// All recognizers in priority order
pub const RECOGNIZERS: &[Recognizer] = &[
    Recognizer { kind: FragmentKind::Table, recognize: table::recognize },
    Recognizer { kind: FragmentKind::Enum, recognize: types::recognize_enum },
    Recognizer { kind: FragmentKind::Function, recognize: function::recognize },
    Recognizer { kind: FragmentKind::Composite, recognize: types::recognize_composite },
    Recognizer { kind: FragmentKind::View, recognize: view::recognize },
    Recognizer { kind: FragmentKind::Index, recognize: index::recognize },
    Recognizer { kind: FragmentKind::ForeignKey, recognize: alter::recognize_foreign_key },
    Recognizer { kind: FragmentKind::Unique, recognize: alter::recognize_unique },
    Recognizer { kind: FragmentKind::TableComment, recognize: comment::recognize_table },
    Recognizer { kind: FragmentKind::ColumnComment, recognize: comment::recognize_column },
    Recognizer { kind: FragmentKind::ViewComment, recognize: comment::recognize_view },
];

/// Offer `statement` to each recognizer in turn; the first match wins.
///
/// Comment recognizers are skipped entirely unless `comments` is set.
pub fn recognize(statement: &str, default_schema: &str, comments: bool) -> Option<Fragment> {
    RECOGNIZERS
        .iter()
        .filter(|r| comments || !r.kind.is_comment())
        .find_map(|r| (r.recognize)(statement, default_schema))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_is_in_priority_order() {
        let kinds: Vec<FragmentKind> = RECOGNIZERS.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FragmentKind::Table,
                FragmentKind::Enum,
                FragmentKind::Function,
                FragmentKind::Composite,
                FragmentKind::View,
                FragmentKind::Index,
                FragmentKind::ForeignKey,
                FragmentKind::Unique,
                FragmentKind::TableComment,
                FragmentKind::ColumnComment,
                FragmentKind::ViewComment,
            ]
        );
    }

    #[test]
    fn enum_wins_over_composite() {
        let fragment = recognize("CREATE TYPE mood AS ENUM ('sad', 'ok')", "public", false);
        assert_eq!(fragment.map(|f| f.kind()), Some(FragmentKind::Enum));

        let fragment = recognize("CREATE TYPE pair AS (a int, b int)", "public", false);
        assert_eq!(fragment.map(|f| f.kind()), Some(FragmentKind::Composite));
    }

    #[test]
    fn comments_need_opt_in() {
        let sql = "COMMENT ON TABLE users IS 'people'";
        assert!(recognize(sql, "public", false).is_none());
        assert_eq!(
            recognize(sql, "public", true).map(|f| f.kind()),
            Some(FragmentKind::TableComment)
        );
    }

    #[test]
    fn unknown_statements_are_ignored() {
        assert!(recognize("SET statement_timeout = 0", "public", true).is_none());
        assert!(recognize("INSERT INTO users VALUES (1)", "public", true).is_none());
        assert!(recognize("CREATE TABLE broken (", "public", true).is_none());
        assert!(recognize("", "public", true).is_none());
    }
}
