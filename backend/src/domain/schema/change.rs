//! Schema changes and their pure application.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{ColumnDefinition, Constraint, SchemaError, TableDefinition};

/// One structural change to a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SchemaChange {
    CreateTable(TableDefinition),
    DropTable { table: String },
    AddColumn { table: String, column: ColumnDefinition },
    DropColumn { table: String, column: String },
    AddConstraint { table: String, constraint: Constraint },
    DropConstraint { table: String, name: String },
}

impl SchemaChange {
    pub fn drop_table(table: impl Into<String>) -> Self {
        Self::DropTable {
            table: table.into(),
        }
    }

    pub fn add_column(table: impl Into<String>, column: ColumnDefinition) -> Self {
        Self::AddColumn {
            table: table.into(),
            column,
        }
    }

    pub fn drop_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::DropColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn add_constraint(table: impl Into<String>, constraint: Constraint) -> Self {
        Self::AddConstraint {
            table: table.into(),
            constraint,
        }
    }

    pub fn drop_constraint(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DropConstraint {
            table: table.into(),
            name: name.into(),
        }
    }

    /// Table the change targets.
    pub fn table(&self) -> &str {
        match self {
            Self::CreateTable(definition) => &definition.name,
            Self::DropTable { table }
            | Self::AddColumn { table, .. }
            | Self::DropColumn { table, .. }
            | Self::AddConstraint { table, .. }
            | Self::DropConstraint { table, .. } => table,
        }
    }

    /// Whether applying the change discards stored data.
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::DropTable { .. } | Self::DropColumn { .. })
    }
}

pub(super) fn apply_change(
    tables: &mut BTreeMap<String, TableDefinition>,
    change: &SchemaChange,
) -> Result<(), SchemaError> {
    match change {
        SchemaChange::CreateTable(definition) => create_table(tables, definition),
        SchemaChange::DropTable { table } => drop_table(tables, table),
        SchemaChange::AddColumn { table, column } => add_column(tables, table, column),
        SchemaChange::DropColumn { table, column } => drop_column(tables, table, column),
        SchemaChange::AddConstraint { table, constraint } => {
            add_constraint(tables, table, constraint)
        }
        SchemaChange::DropConstraint { table, name } => drop_constraint(tables, table, name),
    }
}

fn create_table(
    tables: &mut BTreeMap<String, TableDefinition>,
    definition: &TableDefinition,
) -> Result<(), SchemaError> {
    if tables.contains_key(&definition.name) {
        return Err(SchemaError::TableExists {
            table: definition.name.clone(),
        });
    }

    let mut seen: Vec<&str> = Vec::with_capacity(definition.columns.len());
    for column in &definition.columns {
        if seen.contains(&column.name.as_str()) {
            return Err(SchemaError::ColumnExists {
                table: definition.name.clone(),
                column: column.name.clone(),
            });
        }
        seen.push(column.name.as_str());
        check_reference(tables, definition, column)?;
    }

    let mut names: Vec<&str> = Vec::with_capacity(definition.constraints.len());
    for constraint in &definition.constraints {
        if names.contains(&constraint.name()) {
            return Err(SchemaError::ConstraintExists {
                table: definition.name.clone(),
                name: constraint.name().to_owned(),
            });
        }
        names.push(constraint.name());
        check_constraint_columns(definition, constraint)?;
    }

    tables.insert(definition.name.clone(), definition.clone());
    Ok(())
}

fn drop_table(
    tables: &mut BTreeMap<String, TableDefinition>,
    table: &str,
) -> Result<(), SchemaError> {
    if !tables.contains_key(table) {
        return Err(SchemaError::TableMissing {
            table: table.to_owned(),
        });
    }
    let referenced_by = tables
        .values()
        .find(|candidate| {
            candidate.name != table && candidate.referenced_tables().any(|target| target == table)
        })
        .map(|referencing| referencing.name.clone());
    if let Some(referenced_by) = referenced_by {
        return Err(SchemaError::TableReferenced {
            table: table.to_owned(),
            referenced_by,
        });
    }
    tables.remove(table);
    Ok(())
}

fn add_column(
    tables: &mut BTreeMap<String, TableDefinition>,
    table: &str,
    column: &ColumnDefinition,
) -> Result<(), SchemaError> {
    let definition = existing_table(tables, table)?;
    if definition.has_column(&column.name) {
        return Err(SchemaError::ColumnExists {
            table: table.to_owned(),
            column: column.name.clone(),
        });
    }
    check_reference(tables, definition, column)?;
    table_mut(tables, table)?.columns.push(column.clone());
    Ok(())
}

fn drop_column(
    tables: &mut BTreeMap<String, TableDefinition>,
    table: &str,
    column: &str,
) -> Result<(), SchemaError> {
    let definition = existing_table(tables, table)?;
    if !definition.has_column(column) {
        return Err(SchemaError::ColumnMissing {
            table: table.to_owned(),
            column: column.to_owned(),
        });
    }
    if let Some(constraint) = definition
        .constraints
        .iter()
        .find(|constraint| constraint.columns().contains(&column))
    {
        return Err(SchemaError::ColumnInUse {
            table: table.to_owned(),
            column: column.to_owned(),
            used_by: constraint.name().to_owned(),
        });
    }
    let referencing = tables.values().find_map(|candidate| {
        candidate
            .references_column(table, column)
            .map(|referencing| format!("{}.{}", candidate.name, referencing.name))
    });
    if let Some(used_by) = referencing {
        return Err(SchemaError::ColumnInUse {
            table: table.to_owned(),
            column: column.to_owned(),
            used_by,
        });
    }
    table_mut(tables, table)?
        .columns
        .retain(|candidate| candidate.name != column);
    Ok(())
}

fn add_constraint(
    tables: &mut BTreeMap<String, TableDefinition>,
    table: &str,
    constraint: &Constraint,
) -> Result<(), SchemaError> {
    let definition = existing_table(tables, table)?;
    if definition.find_constraint(constraint.name()).is_some() {
        return Err(SchemaError::ConstraintExists {
            table: table.to_owned(),
            name: constraint.name().to_owned(),
        });
    }
    check_constraint_columns(definition, constraint)?;
    table_mut(tables, table)?.constraints.push(constraint.clone());
    Ok(())
}

fn drop_constraint(
    tables: &mut BTreeMap<String, TableDefinition>,
    table: &str,
    name: &str,
) -> Result<(), SchemaError> {
    let definition = existing_table(tables, table)?;
    if definition.find_constraint(name).is_none() {
        return Err(SchemaError::ConstraintMissing {
            table: table.to_owned(),
            name: name.to_owned(),
        });
    }
    table_mut(tables, table)?
        .constraints
        .retain(|constraint| constraint.name() != name);
    Ok(())
}

fn existing_table<'a>(
    tables: &'a BTreeMap<String, TableDefinition>,
    table: &str,
) -> Result<&'a TableDefinition, SchemaError> {
    tables.get(table).ok_or_else(|| SchemaError::TableMissing {
        table: table.to_owned(),
    })
}

fn table_mut<'a>(
    tables: &'a mut BTreeMap<String, TableDefinition>,
    table: &str,
) -> Result<&'a mut TableDefinition, SchemaError> {
    tables.get_mut(table).ok_or_else(|| SchemaError::TableMissing {
        table: table.to_owned(),
    })
}

fn check_reference(
    tables: &BTreeMap<String, TableDefinition>,
    owner: &TableDefinition,
    column: &ColumnDefinition,
) -> Result<(), SchemaError> {
    let Some(reference) = column.references.as_ref() else {
        return Ok(());
    };
    let target = if reference.table == owner.name {
        Some(owner)
    } else {
        tables.get(&reference.table)
    };
    match target {
        Some(target) if target.has_column(&reference.column) => Ok(()),
        _ => Err(SchemaError::DanglingReference {
            table: owner.name.clone(),
            column: column.name.clone(),
            target: format!("{}.{}", reference.table, reference.column),
        }),
    }
}

fn check_constraint_columns(
    definition: &TableDefinition,
    constraint: &Constraint,
) -> Result<(), SchemaError> {
    match constraint
        .columns()
        .into_iter()
        .find(|column| !definition.has_column(column))
    {
        Some(column) => Err(SchemaError::ColumnMissing {
            table: definition.name.clone(),
            column: column.to_owned(),
        }),
        None => Ok(()),
    }
}
