//! Compute the changes that turn one schema into another.
//!
//! A column whose definition changed is dropped and re-added together with
//! every constraint covering it and every foreign-key column pointing at it.
//! Re-added columns land at the end of their table, as in PostgreSQL.
//!
//! Removals come first, then additions. Within each group a change is only
//! emitted once it applies to the schema produced by the changes before it,
//! so the output always replays against `from`.

use std::collections::BTreeSet;

use super::{SchemaChange, SchemaDefinition, TableDefinition};

type ColumnKey = (String, String);

/// Changes that transform `from` into `to`.
pub fn diff_schemas(from: &SchemaDefinition, to: &SchemaDefinition) -> Vec<SchemaChange> {
    let rebuilt = rebuilt_columns(from, to);

    let mut drop_constraints = Vec::new();
    let mut drop_columns = Vec::new();
    let mut add_columns = Vec::new();
    let mut add_constraints = Vec::new();

    for (current, target) in retained_tables(from, to) {
        let table = target.name.as_str();

        for constraint in &current.constraints {
            if touches(&rebuilt, table, constraint.columns())
                || target.find_constraint(constraint.name()) != Some(constraint)
            {
                drop_constraints.push(SchemaChange::drop_constraint(table, constraint.name()));
            }
        }

        for column in &current.columns {
            if rebuilt.contains(&(table.to_owned(), column.name.clone())) {
                drop_columns.push(SchemaChange::drop_column(table, &column.name));
            }
        }

        for column in &target.columns {
            let kept = current.find_column(&column.name) == Some(column)
                && !rebuilt.contains(&(table.to_owned(), column.name.clone()));
            if !kept {
                add_columns.push(SchemaChange::add_column(table, column.clone()));
            }
        }

        for constraint in &target.constraints {
            if touches(&rebuilt, table, constraint.columns())
                || current.find_constraint(constraint.name()) != Some(constraint)
            {
                add_constraints.push(SchemaChange::add_constraint(table, constraint.clone()));
            }
        }
    }

    let drop_tables = from
        .dependency_order()
        .into_iter()
        .rev()
        .filter(|table| !to.has_table(&table.name))
        .map(|table| SchemaChange::drop_table(&table.name));

    let create_tables = to
        .dependency_order()
        .into_iter()
        .filter(|table| !from.has_table(&table.name))
        .map(|table| SchemaChange::CreateTable(table.clone()));

    let mut removals = drop_constraints;
    removals.extend(drop_columns);
    removals.extend(drop_tables);

    let mut additions: Vec<SchemaChange> = create_tables.collect();
    additions.extend(add_columns);
    additions.extend(add_constraints);

    let (schema, mut changes) = in_applicable_order(from.clone(), removals);
    let (_, additions) = in_applicable_order(schema, additions);
    changes.extend(additions);
    changes
}

fn touches(rebuilt: &BTreeSet<ColumnKey>, table: &str, columns: Vec<&str>) -> bool {
    columns
        .into_iter()
        .any(|column| rebuilt.contains(&(table.to_owned(), column.to_owned())))
}

/// Tables present in both schemas, as `(current, target)` pairs.
fn retained_tables<'a>(
    from: &'a SchemaDefinition,
    to: &'a SchemaDefinition,
) -> impl Iterator<Item = (&'a TableDefinition, &'a TableDefinition)> {
    to.tables()
        .filter_map(move |target| from.table(&target.name).map(|current| (current, target)))
}

/// Columns of retained tables that must be dropped and re-added: those that
/// changed, plus any foreign-key column that points at one of them.
fn rebuilt_columns(from: &SchemaDefinition, to: &SchemaDefinition) -> BTreeSet<ColumnKey> {
    let mut rebuilt: BTreeSet<ColumnKey> = retained_tables(from, to)
        .flat_map(|(current, target)| {
            current
                .columns
                .iter()
                .filter(move |column| target.find_column(&column.name) != Some(*column))
                .map(move |column| (current.name.clone(), column.name.clone()))
        })
        .collect();

    loop {
        let known = &rebuilt;
        let cascaded: Vec<ColumnKey> = retained_tables(from, to)
            .flat_map(|(current, _)| {
                current.columns.iter().filter_map(move |column| {
                    let reference = column.references.as_ref()?;
                    let key = (current.name.clone(), column.name.clone());
                    let points_at_rebuilt =
                        known.contains(&(reference.table.clone(), reference.column.clone()));
                    (points_at_rebuilt && !known.contains(&key)).then_some(key)
                })
            })
            .collect();
        if cascaded.is_empty() {
            return rebuilt;
        }
        rebuilt.extend(cascaded);
    }
}

/// Reorder `pending` so each change applies to the schema left by the ones
/// before it. Earlier entries win ties. When nothing applies, the remainder is
/// kept in its original order.
fn in_applicable_order(
    mut schema: SchemaDefinition,
    mut pending: Vec<SchemaChange>,
) -> (SchemaDefinition, Vec<SchemaChange>) {
    let mut ordered = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let next = pending
            .iter()
            .enumerate()
            .find_map(|(index, change)| schema.clone().apply(change).ok().map(|next| (index, next)));
        match next {
            Some((index, next)) => {
                schema = next;
                ordered.push(pending.remove(index));
            }
            None => ordered.append(&mut pending),
        }
    }
    (schema, ordered)
}
