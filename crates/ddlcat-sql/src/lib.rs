//! DDL parsing and resolution
//!
//! This crate handles:
//! - Splitting SQL source into statements
//! - Recognizing table, type, function, view, index, constraint and comment DDL
//! - Resolving recognized statements against a per-source symbol table
//! - Inferring relationship cardinality from uniqueness seen so far

pub mod lexer;
pub mod splitter;
pub mod fragment;
pub mod recognize;
pub mod resolver;

pub use splitter::{split_statements, StatementSplitter};
pub use fragment::{ColumnCommentDef, CommentDef, ForeignKeyDef, Fragment, FragmentKind, IndexDef, UniqueDef};
pub use recognize::{recognize, Recognizer, RECOGNIZERS};
pub use resolver::{resolve, ResolveOptions, ResolveStats, Resolver};
