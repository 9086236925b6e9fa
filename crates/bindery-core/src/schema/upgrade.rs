//! Reconciles a stored table with the columns the current code declares.
//! Columns may be added or dropped from the declaration; changing a stored
//! column's type or nullability is rejected before the backend is touched.

use crate::{
    backend::StorageBackend,
    error::Error,
    schema::{ColumnDef, TableDef, TypeDef},
};
use tracing::{debug, instrument, warn};

///
/// TableUpgradePlan
///
/// Classification of the declared user columns against the stored ones.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TableUpgradePlan {
    pub retained: Vec<String>,
    pub removed: Vec<String>,
    pub added: Vec<ColumnDef>,
}

impl TableUpgradePlan {
    /// Compare `new` against `old`, skipping the reserved leading columns.
    /// Inherited columns are owned by the base table and never added here.
    pub fn classify(old: &TableDef, new: &TableDef) -> Result<Self, Error> {
        let mut plan = Self::default();

        for (_, column) in new.user_columns() {
            let stored = old
                .user_columns()
                .find(|(_, stored)| stored.name_matches(&column.name));

            match stored {
                Some((_, stored)) if stored.same_shape(column) => {
                    plan.retained.push(stored.name.clone());
                }
                Some((_, stored)) => {
                    return Err(Error::incompatible_change(
                        &old.name,
                        &stored.name,
                        format!(
                            "stored as {} ({}) but declared as {} ({})",
                            stored.storage_type,
                            nullability(stored),
                            column.storage_type,
                            nullability(column)
                        ),
                    ));
                }
                None if column.is_inherited => {
                    debug!(table = %old.name, column = %column.name, "inherited column left to its base");
                }
                None => plan.added.push(ColumnDef {
                    is_inherited: false,
                    ..column.clone()
                }),
            }
        }

        plan.removed = old
            .user_columns()
            .filter(|(_, stored)| new.column(&stored.name).is_none())
            .map(|(_, stored)| stored.name.clone())
            .collect();

        Ok(plan)
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.added.is_empty()
    }
}

const fn nullability(column: &ColumnDef) -> &'static str {
    if column.is_nullable {
        "nullable"
    } else {
        "non-nullable"
    }
}

/// Bring the stored table `old` up to the declared table `new`.
///
/// Returns `old` unchanged when nothing has to be added. Otherwise the
/// missing columns are appended through the backend and the table is
/// re-read from its new layout.
#[instrument(
    name = "schema::upgrade_table",
    level = "debug",
    skip_all,
    fields(table = %old.name)
)]
pub fn upgrade_table(
    backend: &dyn StorageBackend,
    old: &TableDef,
    new: &TableDef,
) -> Result<TableDef, Error> {
    let plan = TableUpgradePlan::classify(old, new)?;

    for column in &plan.removed {
        warn!(table = %old.name, column = %column, "column no longer declared; stored data kept");
    }

    if plan.is_noop() {
        return Ok(old.clone());
    }

    let handle = backend.alter_table_add_columns(&old.name, &plan.added)?;
    let info = backend.layout_info(handle)?;
    debug!(added = plan.added.len(), %handle, "table upgraded");

    Ok(TableDef::from_layout(info))
}

/// Make sure the table of `declared` exists and bind the declaration to it.
///
/// A missing table is created (extending `base` when given). An existing
/// one is upgraded when `allow_upgrade` is set and used as stored otherwise.
pub fn sync_table(
    backend: &dyn StorageBackend,
    declared: &TypeDef,
    base: Option<&TableDef>,
    allow_upgrade: bool,
) -> Result<TypeDef, Error> {
    let wanted = declared.table_def();

    let table = match backend.lookup_table(&wanted.name)? {
        None => backend.create_table(wanted, base)?,
        Some(stored) if allow_upgrade => upgrade_table(backend, &stored, wanted)?,
        Some(stored) => stored,
    };

    declared.rebind(table)
}

///
/// TESTS
///
