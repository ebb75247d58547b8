//! Declarative relational schema model.
//!
//! Migrations are expressed as data: a [`SchemaDefinition`] value describes
//! tables, columns and constraints, and [`SchemaChange`] values transform one
//! definition into the next. Nothing in this module touches a database; the
//! persistence adapters render changes to SQL via [`render_change_sql`].

mod change;
mod diff;
mod sql;

use std::collections::BTreeMap;

use serde::Serialize;

pub use change::SchemaChange;
pub use diff::diff_schemas;
pub use sql::{render_change_sql, render_schema_sql};

/// Errors raised when a change cannot be applied to a schema definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The table already exists.
    #[error("table `{table}` already exists")]
    TableExists { table: String },
    /// The table does not exist.
    #[error("table `{table}` does not exist")]
    TableMissing { table: String },
    /// The table is still referenced by a foreign key.
    #[error("table `{table}` is referenced by `{referenced_by}`")]
    TableReferenced { table: String, referenced_by: String },
    /// The column already exists on the table.
    #[error("column `{table}.{column}` already exists")]
    ColumnExists { table: String, column: String },
    /// The column does not exist on the table.
    #[error("column `{table}.{column}` does not exist")]
    ColumnMissing { table: String, column: String },
    /// The column is still used by a constraint or foreign key.
    #[error("column `{table}.{column}` is still used by `{used_by}`")]
    ColumnInUse {
        table: String,
        column: String,
        used_by: String,
    },
    /// A constraint with this name already exists on the table.
    #[error("constraint `{name}` already exists on `{table}`")]
    ConstraintExists { table: String, name: String },
    /// No constraint with this name exists on the table.
    #[error("constraint `{name}` does not exist on `{table}`")]
    ConstraintMissing { table: String, name: String },
    /// A foreign key points at a table or column that does not exist.
    #[error("foreign key `{table}.{column}` references unknown `{target}`")]
    DanglingReference {
        table: String,
        column: String,
        target: String,
    },
}

/// Column storage types used by the pantry schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnType {
    Uuid,
    Varchar { length: u16 },
    Text,
    Boolean,
    Integer,
    Numeric { precision: u8, scale: u8 },
    Date,
    TimestampTz,
    Jsonb,
}

impl ColumnType {
    /// Shorthand for a bounded `VARCHAR`.
    pub const fn varchar(length: u16) -> Self {
        Self::Varchar { length }
    }

    /// Shorthand for a fixed-point `NUMERIC`.
    pub const fn numeric(precision: u8, scale: u8) -> Self {
        Self::Numeric { precision, scale }
    }

    /// PostgreSQL spelling of the type.
    pub fn sql(self) -> String {
        match self {
            Self::Uuid => "UUID".to_owned(),
            Self::Varchar { length } => format!("VARCHAR({length})"),
            Self::Text => "TEXT".to_owned(),
            Self::Boolean => "BOOLEAN".to_owned(),
            Self::Integer => "INTEGER".to_owned(),
            Self::Numeric { precision, scale } => format!("NUMERIC({precision}, {scale})"),
            Self::Date => "DATE".to_owned(),
            Self::TimestampTz => "TIMESTAMP WITH TIME ZONE".to_owned(),
            Self::Jsonb => "JSONB".to_owned(),
        }
    }
}

/// Default value attached to a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ColumnDefault {
    Bool(bool),
    Int(i64),
    Text(String),
    /// Decimal literal kept as text to avoid float rounding.
    Decimal(String),
    Json(serde_json::Value),
    /// Server-side `now()`.
    Now,
}

/// Foreign-key target of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

/// A typed table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub indexed: bool,
    pub default: Option<ColumnDefault>,
    pub references: Option<ForeignKey>,
}

impl ColumnDefinition {
    /// Create a nullable column with no default.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            primary_key: false,
            unique: false,
            indexed: false,
            default: None,
            references: None,
        }
    }

    /// Mark the column as the primary key (implies `NOT NULL`).
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.references = Some(ForeignKey {
            table: table.into(),
            column: column.into(),
        });
        self
    }

    /// Name of the implicit unique constraint PostgreSQL creates for
    /// column-level `UNIQUE`.
    pub fn implicit_unique_name(&self, table: &str) -> String {
        format!("{table}_{}_key", self.name)
    }
}

/// Row-level rule enforced by a `CHECK` constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckRule {
    /// The two columns must hold different values.
    ColumnsDiffer { left: String, right: String },
}

impl CheckRule {
    pub fn columns_differ(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::ColumnsDiffer {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Columns the rule reads.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Self::ColumnsDiffer { left, right } => vec![left.as_str(), right.as_str()],
        }
    }

    /// SQL boolean expression for the rule.
    pub fn sql(&self) -> String {
        match self {
            Self::ColumnsDiffer { left, right } => format!("{left} != {right}"),
        }
    }
}

/// Named table constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    Unique { name: String, columns: Vec<String> },
    Check { name: String, rule: CheckRule },
}

impl Constraint {
    pub fn unique<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Unique {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn check(name: impl Into<String>, rule: CheckRule) -> Self {
        Self::Check {
            name: name.into(),
            rule,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Unique { name, .. } | Self::Check { name, .. } => name,
        }
    }

    /// Columns the constraint covers.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Self::Unique { columns, .. } => columns.iter().map(String::as_str).collect(),
            Self::Check { rule, .. } => rule.columns(),
        }
    }
}

/// A unique key enforced on a table, whatever its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    pub name: String,
    pub columns: Vec<String>,
}

/// A table with ordered columns and named constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub constraints: Vec<Constraint>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.find_column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn find_constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints
            .iter()
            .find(|constraint| constraint.name() == name)
    }

    /// Primary-key column names in declaration order.
    pub fn primary_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|column| column.primary_key)
            .map(|column| column.name.as_str())
            .collect()
    }

    /// Every unique key on the table: primary key, column-level `UNIQUE`
    /// and named unique constraints.
    pub fn unique_keys(&self) -> Vec<UniqueKey> {
        let mut keys = Vec::new();
        let primary = self.primary_key();
        if !primary.is_empty() {
            keys.push(UniqueKey {
                name: format!("{}_pkey", self.name),
                columns: primary.into_iter().map(str::to_owned).collect(),
            });
        }
        for column in self.columns.iter().filter(|column| column.unique) {
            keys.push(UniqueKey {
                name: column.implicit_unique_name(&self.name),
                columns: vec![column.name.clone()],
            });
        }
        for constraint in &self.constraints {
            if let Constraint::Unique { name, columns } = constraint {
                keys.push(UniqueKey {
                    name: name.clone(),
                    columns: columns.clone(),
                });
            }
        }
        keys
    }

    /// Tables this table points at through foreign keys.
    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter_map(|column| column.references.as_ref())
            .map(|reference| reference.table.as_str())
    }

    fn references_column(&self, table: &str, column: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|candidate| {
            candidate
                .references
                .as_ref()
                .is_some_and(|reference| reference.table == table && reference.column == column)
        })
    }
}

/// A complete schema: tables keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaDefinition {
    tables: BTreeMap<String, TableDefinition>,
}

impl SchemaDefinition {
    /// The empty schema every migration chain starts from.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableDefinition> {
        self.tables.values()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Apply one change, returning the resulting schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the change does not fit the current
    /// schema (missing tables, duplicate columns, dangling foreign keys, ...).
    pub fn apply(mut self, change: &SchemaChange) -> Result<Self, SchemaError> {
        change::apply_change(&mut self.tables, change)?;
        Ok(self)
    }

    /// Apply a sequence of changes in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] raised by a change.
    pub fn apply_all<'a, I>(self, changes: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = &'a SchemaChange>,
    {
        changes
            .into_iter()
            .try_fold(self, |schema, change| schema.apply(change))
    }

    /// Tables ordered so every table follows the tables it references.
    ///
    /// Ties are broken by table name; self-references are ignored.
    pub fn dependency_order(&self) -> Vec<&TableDefinition> {
        let mut ordered: Vec<&TableDefinition> = Vec::with_capacity(self.tables.len());
        let mut placed: Vec<&str> = Vec::with_capacity(self.tables.len());

        while ordered.len() < self.tables.len() {
            let next = self.tables.values().find(|table| {
                !placed.contains(&table.name.as_str())
                    && table.referenced_tables().all(|target| {
                        target == table.name
                            || placed.contains(&target)
                            || !self.tables.contains_key(target)
                    })
            });
            match next {
                Some(table) => {
                    placed.push(table.name.as_str());
                    ordered.push(table);
                }
                None => {
                    // Reference cycle: append the rest in name order.
                    for table in self.tables.values() {
                        if !placed.contains(&table.name.as_str()) {
                            placed.push(table.name.as_str());
                            ordered.push(table);
                        }
                    }
                }
            }
        }

        ordered
    }
}
