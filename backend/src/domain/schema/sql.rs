//! PostgreSQL DDL rendering for schema changes.

use super::{ColumnDefault, ColumnDefinition, Constraint, SchemaChange, SchemaDefinition, TableDefinition};

/// Render one change as the DDL statements that perform it.
pub fn render_change_sql(change: &SchemaChange) -> Vec<String> {
    match change {
        SchemaChange::CreateTable(definition) => create_table_sql(definition),
        SchemaChange::DropTable { table } => vec![format!("DROP TABLE {table}")],
        SchemaChange::AddColumn { table, column } => {
            let mut statements = vec![format!(
                "ALTER TABLE {table} ADD COLUMN {}",
                column_sql(column)
            )];
            if column.primary_key {
                statements.push(format!(
                    "ALTER TABLE {table} ADD CONSTRAINT {table}_pkey PRIMARY KEY ({})",
                    column.name
                ));
            }
            if column.unique {
                statements.push(format!(
                    "ALTER TABLE {table} ADD CONSTRAINT {} UNIQUE ({})",
                    column.implicit_unique_name(table),
                    column.name
                ));
            }
            statements.extend(index_sql(table, column));
            statements
        }
        SchemaChange::DropColumn { table, column } => {
            vec![format!("ALTER TABLE {table} DROP COLUMN {column}")]
        }
        SchemaChange::AddConstraint { table, constraint } => vec![format!(
            "ALTER TABLE {table} ADD {}",
            constraint_sql(constraint)
        )],
        SchemaChange::DropConstraint { table, name } => {
            vec![format!("ALTER TABLE {table} DROP CONSTRAINT {name}")]
        }
    }
}

/// Render a whole schema as `CREATE` statements in dependency order.
pub fn render_schema_sql(schema: &SchemaDefinition) -> Vec<String> {
    schema
        .dependency_order()
        .into_iter()
        .flat_map(create_table_sql)
        .collect()
}

fn create_table_sql(definition: &TableDefinition) -> Vec<String> {
    let mut lines: Vec<String> = definition
        .columns
        .iter()
        .map(|column| format!("    {}", column_sql(column)))
        .collect();

    let primary = definition.primary_key();
    if !primary.is_empty() {
        lines.push(format!("    PRIMARY KEY ({})", primary.join(", ")));
    }
    for column in definition.columns.iter().filter(|column| column.unique) {
        lines.push(format!(
            "    CONSTRAINT {} UNIQUE ({})",
            column.implicit_unique_name(&definition.name),
            column.name
        ));
    }
    for constraint in &definition.constraints {
        lines.push(format!("    {}", constraint_sql(constraint)));
    }

    let mut statements = vec![format!(
        "CREATE TABLE {} (\n{}\n)",
        definition.name,
        lines.join(",\n")
    )];
    for column in &definition.columns {
        statements.extend(index_sql(&definition.name, column));
    }
    statements
}

fn column_sql(column: &ColumnDefinition) -> String {
    let mut sql = format!("{} {}", column.name, column.column_type.sql());
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default_sql(default));
    }
    if let Some(reference) = &column.references {
        sql.push_str(&format!(
            " REFERENCES {} ({})",
            reference.table, reference.column
        ));
    }
    sql
}

fn default_sql(default: &ColumnDefault) -> String {
    match default {
        ColumnDefault::Bool(value) => value.to_string(),
        ColumnDefault::Int(value) => value.to_string(),
        ColumnDefault::Text(value) => quote_literal(value),
        ColumnDefault::Decimal(value) => value.clone(),
        ColumnDefault::Json(value) => format!("{}::jsonb", quote_literal(&value.to_string())),
        ColumnDefault::Now => "now()".to_owned(),
    }
}

fn constraint_sql(constraint: &Constraint) -> String {
    match constraint {
        Constraint::Unique { name, columns } => {
            format!("CONSTRAINT {name} UNIQUE ({})", columns.join(", "))
        }
        Constraint::Check { name, rule } => format!("CONSTRAINT {name} CHECK ({})", rule.sql()),
    }
}

fn index_sql(table: &str, column: &ColumnDefinition) -> Option<String> {
    column.indexed.then(|| {
        format!(
            "CREATE INDEX ix_{table}_{name} ON {table} ({name})",
            name = column.name
        )
    })
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
