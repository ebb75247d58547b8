//! In-memory evaluation of a table's integrity rules.
//!
//! [`TableRows`] holds the rows accepted so far for one [`TableDefinition`]
//! and rejects inserts that PostgreSQL would reject: unknown columns, missing
//! required values, duplicate unique keys and failed checks. `NULL` follows
//! SQL semantics: it never collides in a unique key and never fails a check.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::schema::{CheckRule, ColumnDefault, Constraint, TableDefinition};

/// A candidate row keyed by column name.
pub type Row = BTreeMap<String, Value>;

/// Why a row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintViolation {
    #[error("column `{column}` does not exist on `{table}`")]
    UnknownColumn { table: String, column: String },
    #[error("null value in column `{column}` of `{table}` violates not-null constraint")]
    NotNull { table: String, column: String },
    #[error("duplicate key value violates unique constraint `{constraint}` on `{table}`")]
    Unique { table: String, constraint: String },
    #[error("row violates check constraint `{constraint}` on `{table}`")]
    Check { table: String, constraint: String },
}

/// Rows accepted for one table.
#[derive(Debug, Clone)]
pub struct TableRows {
    definition: TableDefinition,
    rows: Vec<Row>,
}

impl TableRows {
    pub fn new(definition: TableDefinition) -> Self {
        Self {
            definition,
            rows: Vec::new(),
        }
    }

    pub fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Insert `row` after filling literal column defaults.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConstraintViolation`] the row triggers; the table
    /// is left unchanged.
    pub fn insert(&mut self, row: Row) -> Result<(), ConstraintViolation> {
        let table = &self.definition.name;
        if let Some(column) = row.keys().find(|name| !self.definition.has_column(name)) {
            return Err(ConstraintViolation::UnknownColumn {
                table: table.clone(),
                column: column.clone(),
            });
        }

        let row = self.with_defaults(row);

        if let Some(column) = self
            .definition
            .columns
            .iter()
            .find(|column| !column.nullable && is_null(row.get(&column.name)))
        {
            return Err(ConstraintViolation::NotNull {
                table: table.clone(),
                column: column.name.clone(),
            });
        }

        for constraint in &self.definition.constraints {
            if let Constraint::Check { name, rule } = constraint {
                if !check_passes(rule, &row) {
                    return Err(ConstraintViolation::Check {
                        table: table.clone(),
                        constraint: name.clone(),
                    });
                }
            }
        }

        for key in self.definition.unique_keys() {
            let Some(candidate) = key_values(&key.columns, &row) else {
                continue;
            };
            let duplicate = self
                .rows
                .iter()
                .any(|existing| key_values(&key.columns, existing).as_ref() == Some(&candidate));
            if duplicate {
                return Err(ConstraintViolation::Unique {
                    table: table.clone(),
                    constraint: key.name,
                });
            }
        }

        self.rows.push(row);
        Ok(())
    }

    fn with_defaults(&self, mut row: Row) -> Row {
        for column in &self.definition.columns {
            if row.contains_key(&column.name) {
                continue;
            }
            if let Some(value) = column.default.as_ref().and_then(literal_default) {
                row.insert(column.name.clone(), value);
            }
        }
        row
    }
}

fn literal_default(default: &ColumnDefault) -> Option<Value> {
    match default {
        ColumnDefault::Bool(value) => Some(Value::Bool(*value)),
        ColumnDefault::Int(value) => Some(Value::from(*value)),
        ColumnDefault::Text(value) | ColumnDefault::Decimal(value) => {
            Some(Value::String(value.clone()))
        }
        ColumnDefault::Json(value) => Some(value.clone()),
        ColumnDefault::Now => None,
    }
}

fn is_null(value: Option<&Value>) -> bool {
    value.is_none_or(Value::is_null)
}

/// Key values, or `None` when any of them is `NULL`.
fn key_values<'a>(columns: &[String], row: &'a Row) -> Option<Vec<&'a Value>> {
    columns
        .iter()
        .map(|column| row.get(column).filter(|value| !value.is_null()))
        .collect()
}

fn check_passes(rule: &CheckRule, row: &Row) -> bool {
    match rule {
        CheckRule::ColumnsDiffer { left, right } => {
            match (row.get(left), row.get(right)) {
                (Some(left), Some(right)) if !left.is_null() && !right.is_null() => left != right,
                _ => true,
            }
        }
    }
}
