//! Catalog types produced by DDL resolution
//!
//! Every record keeps the declared text of types and defaults as written;
//! normalisation is left to consumers of the catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A schema-qualified object name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Schema the object lives in
    pub schema: String,

    /// Object name within the schema
    pub name: String,
}

impl QualifiedName {
    /// Create a new qualified name
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A column of a table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Declared type text (element type for arrays)
    pub data_type: String,

    /// Whether the column accepts NULL
    pub nullable: bool,

    /// DEFAULT expression text
    pub default: Option<String>,

    /// Declared with an array suffix
    pub is_array: bool,

    /// Part of the primary key
    pub is_primary_key: bool,

    /// Covered by a UNIQUE constraint
    pub is_unique: bool,

    /// COMMENT ON COLUMN text
    pub comment: Option<String>,
}

impl Column {
    /// Create a nullable column with no constraints
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default: None,
            is_array: false,
            is_primary_key: false,
            is_unique: false,
            comment: None,
        }
    }

    /// Set nullability
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set the default expression
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Mark as an array column
    pub fn with_array(mut self, is_array: bool) -> Self {
        self.is_array = is_array;
        self
    }

    /// Mark as a primary key column
    pub fn with_primary_key(mut self, is_primary_key: bool) -> Self {
        self.is_primary_key = is_primary_key;
        self
    }

    /// Mark as unique
    pub fn with_unique(mut self, is_unique: bool) -> Self {
        self.is_unique = is_unique;
        self
    }
}

/// An index attached to a table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Index {
    /// Index name
    pub name: String,

    /// Name of the owning table
    pub table: String,

    /// Indexed columns (or expression text) in key order
    pub columns: Vec<String>,

    /// CREATE UNIQUE INDEX
    pub is_unique: bool,

    /// Access method from USING, e.g. `btree` or `gin`
    pub method: Option<String>,
}

impl Index {
    /// Whether this is a unique index over exactly the given column
    pub fn is_unique_on(&self, column: &str) -> bool {
        self.is_unique && matches!(self.columns.as_slice(), [only] if only == column)
    }
}

/// A foreign key from one table to another
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    /// Foreign key constraint name
    pub name: String,

    /// Referencing columns on the owning table
    pub columns: Vec<String>,

    /// Referenced relation
    pub referenced_table: QualifiedName,

    /// Referenced columns, positionally matched with `columns`
    pub referenced_columns: Vec<String>,

    /// At most one owning row per referenced row
    pub is_one_to_one: bool,
}

/// A table with its columns, relationships and indexes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Schema name
    pub schema: String,

    /// Table name
    pub name: String,

    /// Columns in declaration order
    pub columns: Vec<Column>,

    /// Foreign keys declared on this table
    pub relationships: Vec<Relationship>,

    /// Indexes declared on this table
    pub indexes: Vec<Index>,

    /// COMMENT ON TABLE text
    pub comment: Option<String>,
}

impl Table {
    /// Create a table from its columns
    pub fn new(schema: impl Into<String>, name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns,
            relationships: Vec::new(),
            indexes: Vec::new(),
            comment: None,
        }
    }

    /// Schema-qualified name
    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(&self.schema, &self.name)
    }

    /// Find a column by exact name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Find a column by exact name for mutation
    pub fn find_column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Names of the primary key columns in declaration order
    pub fn primary_key(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.clone())
            .collect()
    }
}

/// An enumerated type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumType {
    pub schema: String,
    pub name: String,

    /// Labels in declaration order
    pub values: Vec<String>,
}

impl EnumType {
    /// Schema-qualified name
    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(&self.schema, &self.name)
    }
}

/// How a function argument is passed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentMode {
    #[default]
    In,
    Out,
    InOut,
    Variadic,
}

/// A function argument
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Argument {
    /// Argument name, `$n` when declared without one
    pub name: String,

    /// Declared type text
    pub data_type: String,

    #[serde(default)]
    pub mode: ArgumentMode,
}

impl Argument {
    /// Create an IN argument
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            mode: ArgumentMode::In,
        }
    }

    /// Set the argument mode
    pub fn with_mode(mut self, mode: ArgumentMode) -> Self {
        self.mode = mode;
        self
    }
}

/// A function declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Function {
    pub schema: String,
    pub name: String,
    pub arguments: Vec<Argument>,

    /// RETURNS clause text
    pub returns: String,
}

impl Function {
    /// Schema-qualified name
    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(&self.schema, &self.name)
    }
}

/// An attribute of a composite type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub data_type: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A composite (row) type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositeType {
    pub schema: String,
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl CompositeType {
    /// Schema-qualified name
    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(&self.schema, &self.name)
    }
}

/// An output column of a view
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewColumn {
    pub name: String,

    /// Known only when the projection casts explicitly
    pub data_type: Option<String>,
}

impl ViewColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
        }
    }

    pub fn with_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }
}

/// A view or materialized view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub schema: String,
    pub name: String,

    /// The SELECT body following AS
    pub definition: String,

    /// Output columns in projection order
    pub columns: Vec<ViewColumn>,

    pub is_materialized: bool,

    /// COMMENT ON VIEW text
    pub comment: Option<String>,
}

impl View {
    /// Schema-qualified name
    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(&self.schema, &self.name)
    }
}

/// The resolved schema catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub tables: Vec<Table>,
    pub enums: Vec<EnumType>,
    pub functions: Vec<Function>,
    pub composite_types: Vec<CompositeType>,
    pub views: Vec<View>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every record of `other`, keeping order and duplicates
    pub fn extend(&mut self, other: Catalog) {
        self.tables.extend(other.tables);
        self.enums.extend(other.enums);
        self.functions.extend(other.functions);
        self.composite_types.extend(other.composite_types);
        self.views.extend(other.views);
    }

    /// True when no records were collected
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
            && self.enums.is_empty()
            && self.functions.is_empty()
            && self.composite_types.is_empty()
            && self.views.is_empty()
    }

    /// First table with the given schema and name
    pub fn find_table(&self, schema: &str, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.schema == schema && t.name == name)
    }

    /// Total indexes over all tables
    pub fn index_count(&self) -> usize {
        self.tables.iter().map(|t| t.indexes.len()).sum()
    }

    /// Total relationships over all tables
    pub fn relationship_count(&self) -> usize {
        self.tables.iter().map(|t| t.relationships.len()).sum()
    }
}
