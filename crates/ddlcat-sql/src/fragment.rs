//! Parsed statement fragments
//!
//! A fragment is the result of recognizing one statement. Definitions carry
//! finished catalog records; the remaining kinds reference an earlier
//! definition by name and only make sense once applied by the resolver.

use ddlcat_core::{CompositeType, EnumType, Function, Index, QualifiedName, Table, View};
use std::fmt;

/// CREATE INDEX, before it is attached to its table
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDef {
    /// Owning table
    pub table: QualifiedName,
    pub index: Index,
}

/// ALTER TABLE ... ADD CONSTRAINT ... FOREIGN KEY
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyDef {
    /// Referencing table
    pub table: QualifiedName,

    /// Constraint name
    pub name: String,

    pub columns: Vec<String>,
    pub referenced_table: QualifiedName,

    /// Empty when the statement omits the list (primary key implied)
    pub referenced_columns: Vec<String>,
}

/// ALTER TABLE ... ADD CONSTRAINT ... UNIQUE
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueDef {
    pub table: QualifiedName,
    pub name: String,
    pub columns: Vec<String>,
}

/// COMMENT ON TABLE / VIEW
#[derive(Debug, Clone, PartialEq)]
pub struct CommentDef {
    pub target: QualifiedName,

    /// `None` for `IS NULL`
    pub text: Option<String>,
}

/// COMMENT ON COLUMN
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnCommentDef {
    pub table: QualifiedName,
    pub column: String,
    pub text: Option<String>,
}

/// One recognized statement
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Table(Table),
    Enum(EnumType),
    Function(Function),
    Composite(CompositeType),
    View(View),
    Index(IndexDef),
    ForeignKey(ForeignKeyDef),
    Unique(UniqueDef),
    TableComment(CommentDef),
    ColumnComment(ColumnCommentDef),
    ViewComment(CommentDef),
}

/// Discriminant of [`Fragment`], used for logging and recognizer tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    Table,
    Enum,
    Function,
    Composite,
    View,
    Index,
    ForeignKey,
    Unique,
    TableComment,
    ColumnComment,
    ViewComment,
}

impl Fragment {
    pub fn kind(&self) -> FragmentKind {
        match self {
            Self::Table(_) => FragmentKind::Table,
            Self::Enum(_) => FragmentKind::Enum,
            Self::Function(_) => FragmentKind::Function,
            Self::Composite(_) => FragmentKind::Composite,
            Self::View(_) => FragmentKind::View,
            Self::Index(_) => FragmentKind::Index,
            Self::ForeignKey(_) => FragmentKind::ForeignKey,
            Self::Unique(_) => FragmentKind::Unique,
            Self::TableComment(_) => FragmentKind::TableComment,
            Self::ColumnComment(_) => FragmentKind::ColumnComment,
            Self::ViewComment(_) => FragmentKind::ViewComment,
        }
    }
}

impl FragmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Enum => "enum",
            Self::Function => "function",
            Self::Composite => "composite type",
            Self::View => "view",
            Self::Index => "index",
            Self::ForeignKey => "foreign key",
            Self::Unique => "unique constraint",
            Self::TableComment => "table comment",
            Self::ColumnComment => "column comment",
            Self::ViewComment => "view comment",
        }
    }

    /// Comment kinds are only recognized when comment extraction is on
    pub fn is_comment(&self) -> bool {
        matches!(self, Self::TableComment | Self::ColumnComment | Self::ViewComment)
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
