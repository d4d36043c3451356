//! Resolution of recognized statements into a catalog
//!
//! The resolver owns the symbol table for one source text. Fragments are
//! applied strictly in statement order: an index, constraint or comment only
//! attaches to a table or view that has already been defined, and anything
//! that refers forward is dropped.

use crate::fragment::{ColumnCommentDef, CommentDef, ForeignKeyDef, Fragment, IndexDef, UniqueDef};
use crate::recognize::recognize;
use crate::splitter::StatementSplitter;
use ddlcat_core::config::DEFAULT_SCHEMA;
use ddlcat_core::{Catalog, CompositeType, Config, EnumType, Function, QualifiedName, Relationship, Table, View};
use std::collections::HashMap;
use std::hash::Hash;

/// Options that affect how statements are resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Schema for unqualified names
    pub default_schema: String,

    /// Whether COMMENT ON statements are applied
    pub extract_comments: bool,
}

impl ResolveOptions {
    pub fn new(default_schema: impl Into<String>, extract_comments: bool) -> Self {
        Self {
            default_schema: default_schema.into(),
            extract_comments,
        }
    }

    /// Take the resolution settings from a loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.default_schema, config.extract_comments)
    }
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA, false)
    }
}

/// Counters for one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Statements produced by the splitter
    pub statements: usize,

    /// Statements some recognizer claimed
    pub recognized: usize,

    /// Statements no recognizer claimed
    pub unrecognized: usize,

    /// Recognized fragments whose target was missing
    pub dropped: usize,
}

/// Insertion-ordered map; re-inserting a key replaces the value in place
#[derive(Debug)]
struct Registry<K, V> {
    entries: Vec<V>,
    positions: HashMap<K, usize>,
}

impl<K: Eq + Hash, V> Registry<K, V> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Returns true when an existing entry was replaced
    fn insert(&mut self, key: K, value: V) -> bool {
        match self.positions.get(&key) {
            Some(&pos) => {
                self.entries[pos] = value;
                true
            }
            None => {
                self.positions.insert(key, self.entries.len());
                self.entries.push(value);
                false
            }
        }
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.positions.get(key).map(|&pos| &self.entries[pos])
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.positions.get(key).map(|&pos| &mut self.entries[pos])
    }

    fn into_values(self) -> Vec<V> {
        self.entries
    }
}

/// Stateful resolver for a single source text
#[derive(Debug)]
pub struct Resolver {
    options: ResolveOptions,
    tables: Registry<QualifiedName, Table>,
    views: Registry<QualifiedName, View>,
    enums: Registry<QualifiedName, EnumType>,
    functions: Registry<QualifiedName, Function>,
    composite_types: Registry<QualifiedName, CompositeType>,
    stats: ResolveStats,
}

impl Resolver {
    pub fn new(options: ResolveOptions) -> Self {
        Self {
            options,
            tables: Registry::new(),
            views: Registry::new(),
            enums: Registry::new(),
            functions: Registry::new(),
            composite_types: Registry::new(),
            stats: ResolveStats::default(),
        }
    }

    /// Split `text` into statements and resolve each in order
    pub fn resolve_source(&mut self, text: &str) {
        for statement in StatementSplitter::new(text) {
            self.resolve_statement(&statement);
        }
    }

    /// Recognize and apply one statement
    pub fn resolve_statement(&mut self, statement: &str) {
        self.stats.statements += 1;

        match recognize(statement, &self.options.default_schema, self.options.extract_comments) {
            Some(fragment) => {
                self.stats.recognized += 1;
                if !self.apply(fragment) {
                    self.stats.dropped += 1;
                }
            }
            None => {
                self.stats.unrecognized += 1;
                tracing::trace!("skipping unrecognized statement: {}", summarize(statement));
            }
        }
    }

    /// Apply a fragment to the symbol table.
    ///
    /// Returns false when the fragment was dropped because its target is
    /// unknown, or because it is a comment and comments are disabled.
    pub fn apply(&mut self, fragment: Fragment) -> bool {
        let kind = fragment.kind();
        if kind.is_comment() && !self.options.extract_comments {
            tracing::debug!("dropping {}: comment extraction disabled", kind);
            return false;
        }

        match fragment {
            Fragment::Table(table) => {
                if self.tables.insert(table.qualified_name(), table) {
                    tracing::debug!("table redefined, keeping the later definition");
                }
                true
            }
            Fragment::View(view) => {
                self.views.insert(view.qualified_name(), view);
                true
            }
            Fragment::Enum(enum_type) => {
                self.enums.insert(enum_type.qualified_name(), enum_type);
                true
            }
            Fragment::Function(function) => {
                self.functions.insert(function.qualified_name(), function);
                true
            }
            Fragment::Composite(composite) => {
                self.composite_types.insert(composite.qualified_name(), composite);
                true
            }
            Fragment::Index(def) => self.attach_index(def),
            Fragment::ForeignKey(def) => self.attach_foreign_key(def),
            Fragment::Unique(def) => self.attach_unique(def),
            Fragment::TableComment(def) => self.comment_table(def),
            Fragment::ColumnComment(def) => self.comment_column(def),
            Fragment::ViewComment(def) => self.comment_view(def),
        }
    }

    fn attach_index(&mut self, def: IndexDef) -> bool {
        let Some(table) = self.tables.get_mut(&def.table) else {
            tracing::debug!("dropping index {}: table {} not defined", def.index.name, def.table);
            return false;
        };
        table.indexes.push(def.index);
        true
    }

    fn attach_unique(&mut self, def: UniqueDef) -> bool {
        let Some(table) = self.tables.get_mut(&def.table) else {
            tracing::debug!("dropping unique constraint {}: table {} not defined", def.name, def.table);
            return false;
        };
        for name in &def.columns {
            if let Some(column) = table.find_column_mut(name) {
                column.is_unique = true;
            }
        }
        true
    }

    fn attach_foreign_key(&mut self, def: ForeignKeyDef) -> bool {
        let referenced_columns = if def.referenced_columns.is_empty() {
            self.tables
                .get(&def.referenced_table)
                .map(Table::primary_key)
                .unwrap_or_default()
        } else {
            def.referenced_columns
        };

        let Some(table) = self.tables.get_mut(&def.table) else {
            tracing::debug!("dropping foreign key {}: table {} not defined", def.name, def.table);
            return false;
        };

        let is_one_to_one = is_one_to_one(table, &def.columns);
        table.relationships.push(Relationship {
            name: def.name,
            columns: def.columns,
            referenced_table: def.referenced_table,
            referenced_columns,
            is_one_to_one,
        });
        true
    }

    fn comment_table(&mut self, def: CommentDef) -> bool {
        match self.tables.get_mut(&def.target) {
            Some(table) => {
                table.comment = def.text;
                true
            }
            None => {
                tracing::debug!("dropping comment: table {} not defined", def.target);
                false
            }
        }
    }

    fn comment_column(&mut self, def: ColumnCommentDef) -> bool {
        let column = self
            .tables
            .get_mut(&def.table)
            .and_then(|table| table.find_column_mut(&def.column));
        match column {
            Some(column) => {
                column.comment = def.text;
                true
            }
            None => {
                tracing::debug!("dropping comment: column {}.{} not defined", def.table, def.column);
                false
            }
        }
    }

    fn comment_view(&mut self, def: CommentDef) -> bool {
        match self.views.get_mut(&def.target) {
            Some(view) => {
                view.comment = def.text;
                true
            }
            None => {
                tracing::debug!("dropping comment: view {} not defined", def.target);
                false
            }
        }
    }

    /// Table resolved so far under `name`
    pub fn table(&self, name: &QualifiedName) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn stats(&self) -> ResolveStats {
        self.stats
    }

    /// Consume the resolver, producing the catalog in definition order
    pub fn finish(self) -> Catalog {
        tracing::debug!(
            statements = self.stats.statements,
            recognized = self.stats.recognized,
            unrecognized = self.stats.unrecognized,
            dropped = self.stats.dropped,
            "resolution finished"
        );

        Catalog {
            tables: self.tables.into_values(),
            enums: self.enums.into_values(),
            functions: self.functions.into_values(),
            composite_types: self.composite_types.into_values(),
            views: self.views.into_values(),
        }
    }
}

/// A single-column key is one-to-one when the column is unique, either by
/// its own flag or through a unique index attached before the key.
fn is_one_to_one(table: &Table, columns: &[String]) -> bool {
    let [column] = columns else {
        return false;
    };
    table.find_column(column).is_some_and(|c| c.is_unique)
        || table.indexes.iter().any(|index| index.is_unique_on(column))
}

/// First line of a statement, shortened for log output
fn summarize(statement: &str) -> &str {
    let line = statement.lines().next().unwrap_or_default();
    match line.char_indices().nth(60) {
        Some((end, _)) => &line[..end],
        None => line,
    }
}

/// Resolve a whole source text in one call
pub fn resolve(text: &str, options: &ResolveOptions) -> (Catalog, ResolveStats) {
    let mut resolver = Resolver::new(options.clone());
    resolver.resolve_source(text);
    let stats = resolver.stats();
    (resolver.finish(), stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddlcat_core::ArgumentMode;
    use pretty_assertions::assert_eq;

    fn catalog(sql: &str) -> Catalog {
        resolve(sql, &ResolveOptions::default()).0
    }

    fn with_comments(sql: &str) -> Catalog {
        resolve(sql, &ResolveOptions::new("public", true)).0
    }

    #[test]
    fn index_attaches_to_earlier_table() {
        let catalog = catalog("CREATE TABLE users(id UUID); CREATE INDEX idx ON users(id);");
        let users = catalog.find_table("public", "users").unwrap();
        assert_eq!(users.indexes.len(), 1);
        assert_eq!(users.indexes[0].name, "idx");
    }

    #[test]
    fn forward_references_are_dropped() {
        let (catalog, stats) = resolve(
            "CREATE INDEX idx ON users(id);\n\
             ALTER TABLE users ADD CONSTRAINT fk FOREIGN KEY (org_id) REFERENCES orgs(id);\n\
             CREATE TABLE users(id UUID, org_id UUID);",
            &ResolveOptions::default(),
        );
        let users = catalog.find_table("public", "users").unwrap();
        assert!(users.indexes.is_empty());
        assert!(users.relationships.is_empty());
        assert_eq!(
            stats,
            ResolveStats {
                statements: 3,
                recognized: 3,
                unrecognized: 0,
                dropped: 2,
            }
        );
    }

    #[test]
    fn unique_column_makes_one_to_one() {
        let catalog = catalog(
            "CREATE TABLE posts(user_id UUID UNIQUE);\n\
             ALTER TABLE posts ADD CONSTRAINT fk FOREIGN KEY (user_id) REFERENCES users(id);",
        );
        let fk = &catalog.tables[0].relationships[0];
        assert_eq!(fk.name, "fk");
        assert_eq!(fk.referenced_table, QualifiedName::new("public", "users"));
        assert_eq!(fk.referenced_columns, vec!["id"]);
        assert!(fk.is_one_to_one);
    }

    #[test]
    fn unique_index_before_key_makes_one_to_one() {
        let before = catalog(
            "CREATE TABLE posts(user_id UUID);\n\
             CREATE UNIQUE INDEX idx ON posts(user_id);\n\
             ALTER TABLE posts ADD CONSTRAINT fk FOREIGN KEY (user_id) REFERENCES users(id);",
        );
        assert!(before.tables[0].relationships[0].is_one_to_one);

        let after = catalog(
            "CREATE TABLE posts(user_id UUID);\n\
             ALTER TABLE posts ADD CONSTRAINT fk FOREIGN KEY (user_id) REFERENCES users(id);\n\
             CREATE UNIQUE INDEX idx ON posts(user_id);",
        );
        assert!(!after.tables[0].relationships[0].is_one_to_one);

        let absent = catalog(
            "CREATE TABLE posts(user_id UUID);\n\
             ALTER TABLE posts ADD CONSTRAINT fk FOREIGN KEY (user_id) REFERENCES users(id);",
        );
        assert!(!absent.tables[0].relationships[0].is_one_to_one);
    }

    #[test]
    fn multi_column_keys_are_never_one_to_one() {
        let catalog = catalog(
            "CREATE TABLE posts(user_id UUID UNIQUE, email TEXT UNIQUE);\n\
             ALTER TABLE posts ADD CONSTRAINT fk FOREIGN KEY (user_id, email) REFERENCES users(id, email);",
        );
        assert!(!catalog.tables[0].relationships[0].is_one_to_one);
    }

    #[test]
    fn alter_unique_marks_present_columns() {
        let catalog = catalog(
            "CREATE TABLE users(id UUID, email TEXT);\n\
             ALTER TABLE users ADD CONSTRAINT users_email_key UNIQUE (email, missing);",
        );
        let users = &catalog.tables[0];
        assert!(users.find_column("email").unwrap().is_unique);
        assert!(!users.find_column("id").unwrap().is_unique);
        assert_eq!(users.columns.len(), 2);
    }

    #[test]
    fn implied_primary_key_reference() {
        let catalog = catalog(
            "CREATE TABLE users(id UUID PRIMARY KEY);\n\
             CREATE TABLE posts(user_id UUID);\n\
             ALTER TABLE posts ADD FOREIGN KEY (user_id) REFERENCES users;\n\
             ALTER TABLE posts ADD FOREIGN KEY (user_id) REFERENCES unknown;",
        );
        let posts = catalog.find_table("public", "posts").unwrap();
        assert_eq!(posts.relationships[0].name, "posts_user_id_fkey");
        assert_eq!(posts.relationships[0].referenced_columns, vec!["id"]);
        assert!(posts.relationships[1].referenced_columns.is_empty());
    }

    #[test]
    fn redefinition_replaces_in_place() {
        let catalog = catalog(
            "CREATE TABLE a(x int);\n\
             CREATE TABLE b(y int);\n\
             CREATE TABLE a(z text);",
        );
        let names: Vec<&str> = catalog.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(catalog.tables[0].column_names(), vec!["z"]);
    }

    #[test]
    fn duplicate_function_names_keep_the_last_definition() {
        let catalog = catalog(
            "CREATE FUNCTION area(r double precision) RETURNS double precision AS $$ SELECT 1 $$ LANGUAGE sql;\n\
             CREATE FUNCTION describe(a int) RETURNS int AS $$ SELECT a $$ LANGUAGE sql;\n\
             CREATE FUNCTION area(w int, h int) RETURNS int AS $$ SELECT w * h $$ LANGUAGE sql;\n\
             CREATE OR REPLACE FUNCTION area(w int, h int) RETURNS bigint AS $$ SELECT 1 $$ LANGUAGE sql;\n\
             CREATE FUNCTION app.area(x text) RETURNS text AS $$ SELECT x $$ LANGUAGE sql;",
        );
        let names: Vec<String> = catalog.functions.iter().map(|f| f.qualified_name().to_string()).collect();
        assert_eq!(names, vec!["public.area", "public.describe", "app.area"]);

        let area = &catalog.functions[0];
        assert_eq!(area.returns, "bigint");
        assert_eq!(area.arguments.len(), 2);
        assert_eq!(area.arguments[0].name, "w");
        assert_eq!(area.arguments[0].mode, ArgumentMode::In);
    }

    #[test]
    fn comments_apply_only_when_enabled() {
        let sql = "CREATE TABLE users(id UUID, email TEXT);\n\
                   CREATE VIEW emails AS SELECT email FROM users;\n\
                   COMMENT ON TABLE users IS 'People';\n\
                   COMMENT ON COLUMN users.email IS 'Login';\n\
                   COMMENT ON VIEW emails IS 'Addresses';";

        let disabled = catalog(sql);
        assert_eq!(disabled.tables[0].comment, None);
        assert_eq!(disabled.tables[0].columns[1].comment, None);
        assert_eq!(disabled.views[0].comment, None);

        let enabled = with_comments(sql);
        assert_eq!(enabled.tables[0].comment.as_deref(), Some("People"));
        assert_eq!(enabled.tables[0].columns[1].comment.as_deref(), Some("Login"));
        assert_eq!(enabled.views[0].comment.as_deref(), Some("Addresses"));
    }

    #[test]
    fn comment_on_unknown_target_is_dropped() {
        let (catalog, stats) = resolve(
            "CREATE TABLE users(id UUID);\n\
             COMMENT ON COLUMN users.missing IS 'x';\n\
             COMMENT ON TABLE ghosts IS 'y';\n\
             COMMENT ON TABLE users IS 'kept';\n\
             COMMENT ON TABLE users IS NULL;",
            &ResolveOptions::new("public", true),
        );
        assert_eq!(catalog.tables[0].comment, None);
        assert_eq!(stats.dropped, 2);
    }

    #[test]
    fn disabled_comment_fragment_is_rejected() {
        let mut resolver = Resolver::new(ResolveOptions::default());
        resolver.resolve_statement("CREATE TABLE users(id UUID)");
        let applied = resolver.apply(Fragment::TableComment(CommentDef {
            target: QualifiedName::new("public", "users"),
            text: Some("x".to_string()),
        }));
        assert!(!applied);
        assert_eq!(resolver.table(&QualifiedName::new("public", "users")).unwrap().comment, None);
    }

    #[test]
    fn default_schema_qualifies_names() {
        let (catalog, _) = resolve(
            "CREATE TABLE users(id int); CREATE INDEX i ON users(id); CREATE INDEX j ON other.users(id);",
            &ResolveOptions::new("app", false),
        );
        assert_eq!(catalog.tables[0].schema, "app");
        assert_eq!(catalog.tables[0].indexes.len(), 1);
    }

    #[test]
    fn unrecognized_statements_are_counted() {
        let (catalog, stats) = resolve(
            "SET search_path = public; -- setup\nSELECT 1; CREATE TYPE mood AS ENUM ('ok');",
            &ResolveOptions::default(),
        );
        assert_eq!(catalog.enums.len(), 1);
        assert_eq!(stats.statements, 3);
        assert_eq!(stats.unrecognized, 2);
    }

    #[test]
    fn options_from_config() {
        let config = Config {
            default_schema: "app".to_string(),
            extract_comments: true,
            ..Config::default()
        };
        assert_eq!(ResolveOptions::from_config(&config), ResolveOptions::new("app", true));
        assert_eq!(ResolveOptions::default(), ResolveOptions::new("public", false));
    }
}
