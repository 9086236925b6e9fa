use crate::{
    backend::{BackendError, IndexInfo, LayoutHandle, LayoutInfo, StorageBackend},
    obs::BackendStats,
    schema::{ColumnDef, TableDef, TableId},
    system,
    types::{Binary, ColumnValue, DateTime, Decimal, LargeBinary, ObjectRef},
};
use bindery_primitives::StorageType;
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::debug;

const ADDRESS_BASE: u64 = 0x1000;
const ROW_STRIDE: u64 = 0x40;

///
/// MemoryBackend
///
/// Reference `StorageBackend` keeping every table and row in memory behind
/// one mutex. Creates the `System.RawView` table on construction and keeps
/// one raw view row per created table.
///

pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    stats: BackendStats,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        let mut state = MemoryState::default();
        state.bootstrap();

        Self {
            state: Mutex::new(state),
            stats: BackendStats::default(),
        }
    }

    #[must_use]
    pub const fn stats(&self) -> &BackendStats {
        &self.stats
    }

    /// Declare an index over existing columns of a table.
    pub fn create_index(
        &self,
        table_name: &str,
        index_name: &str,
        column_names: &[&str],
        is_unique: bool,
    ) -> Result<IndexInfo, BackendError> {
        let mut state = self.state();
        let table = state.table_by_name(table_name)?;
        let table_id = table.table_id;

        for column in column_names {
            if !table.columns.iter().any(|c| c.name_matches(column)) {
                return Err(BackendError::new(
                    BackendError::INVALID_DEFINITION,
                    format!("index '{index_name}' names unknown column '{column}'"),
                ));
            }
        }

        let info = IndexInfo {
            name: index_name.to_string(),
            table_name: table.name.clone(),
            column_names: column_names.iter().map(ToString::to_string).collect(),
            is_unique,
        };

        let indexes = state.indexes.entry(table_id).or_default();
        if indexes.iter().any(|i| i.name.eq_ignore_ascii_case(index_name)) {
            return Err(BackendError::new(
                BackendError::INDEX_EXISTS,
                format!("index '{index_name}' already exists"),
            ));
        }
        indexes.push(info.clone());

        Ok(info)
    }

    /// Object refs of every row stored in `table_id`, in insertion order.
    #[must_use]
    pub fn rows_of(&self, table_id: TableId) -> Vec<ObjectRef> {
        self.state()
            .rows
            .iter()
            .filter(|(_, row)| row.table_id == table_id)
            .map(|(&object_id, _)| object_ref(object_id))
            .collect()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();

        f.debug_struct("MemoryBackend")
            .field("tables", &state.tables.len())
            .field("rows", &state.rows.len())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

impl StorageBackend for MemoryBackend {
    fn create_table(
        &self,
        table: &TableDef,
        inherited: Option<&TableDef>,
    ) -> Result<TableDef, BackendError> {
        let mut state = self.state();

        if let Some(base) = inherited {
            let stored = state.table_by_name(&base.name)?;
            if table.base_name.as_deref() != Some(stored.name.as_str()) {
                return Err(BackendError::new(
                    BackendError::INVALID_DEFINITION,
                    format!("table '{}' does not name base '{}'", table.name, stored.name),
                ));
            }

            let missing = stored
                .columns
                .iter()
                .filter(|c| !c.is_reserved())
                .find(|c| !table.column_defs.iter().any(|t| t.name_matches(&c.name)));
            if let Some(column) = missing {
                return Err(BackendError::new(
                    BackendError::INVALID_DEFINITION,
                    format!(
                        "table '{}' does not repeat base column '{}'",
                        table.name, column.name
                    ),
                ));
            }
        }

        let created = state.add_table(table)?;
        self.stats.record_create();
        debug!(table = %created.name, table_id = ?created.table_id, "table created");

        Ok(created)
    }

    fn lookup_table(&self, name: &str) -> Result<Option<TableDef>, BackendError> {
        let state = self.state();

        let Some(table) = state
            .names
            .get(&name.to_lowercase())
            .and_then(|id| state.tables.get(id))
        else {
            return Ok(None);
        };

        state
            .layout(table.layout)
            .map(|info| Some(TableDef::from_layout(info)))
    }

    fn alter_table_add_columns(
        &self,
        table_name: &str,
        columns: &[ColumnDef],
    ) -> Result<LayoutHandle, BackendError> {
        let mut state = self.state();
        let table_id = state.table_by_name(table_name)?.table_id;

        let handle = state.alter_table(table_id, columns)?;
        self.stats.record_alteration();
        debug!(table = table_name, added = columns.len(), %handle, "table altered");

        Ok(handle)
    }

    fn layout_info(&self, handle: LayoutHandle) -> Result<LayoutInfo, BackendError> {
        self.state().layout(handle)
    }

    fn index_infos(&self, handle: LayoutHandle) -> Result<Vec<IndexInfo>, BackendError> {
        let state = self.state();
        let table_id = state.layout(handle)?.table_id;

        Ok(state.indexes.get(&table_id).cloned().unwrap_or_default())
    }

    fn insert_row(&self, table_id: TableId) -> Result<ObjectRef, BackendError> {
        let object = self.state().insert_row(table_id)?;
        self.stats.record_insert();

        Ok(object)
    }

    fn row_table_id(&self, object: ObjectRef) -> Result<TableId, BackendError> {
        self.state().row(object).map(|row| row.table_id)
    }

    fn read_column(&self, object: ObjectRef, column: usize) -> Result<ColumnValue, BackendError> {
        let state = self.state();
        let row = state.row(object)?;

        row.values.get(column).cloned().ok_or_else(|| {
            BackendError::new(
                BackendError::COLUMN_OUT_OF_RANGE,
                format!("row {object} has no column {column}"),
            )
        })
    }

    fn write_column(
        &self,
        object: ObjectRef,
        column: usize,
        value: ColumnValue,
    ) -> Result<(), BackendError> {
        self.state().write(object, column, value)?;
        self.stats.record_write();

        Ok(())
    }

    fn find_raw_view(&self, full_name: &str) -> Result<Option<ObjectRef>, BackendError> {
        Ok(self.state().raw_views.get(&full_name.to_lowercase()).copied())
    }
}

///
/// MemoryState
///

struct MemoryTable {
    table_id: TableId,
    name: String,
    base_name: Option<String>,
    layout: LayoutHandle,
    columns: Vec<ColumnDef>,
}

struct MemoryRow {
    table_id: TableId,
    values: Vec<ColumnValue>,
}

#[derive(Default)]
struct MemoryState {
    tables: BTreeMap<TableId, MemoryTable>,
    names: HashMap<String, TableId>,
    layouts: HashMap<LayoutHandle, LayoutInfo>,
    indexes: HashMap<TableId, Vec<IndexInfo>>,
    rows: BTreeMap<u64, MemoryRow>,
    raw_views: HashMap<String, ObjectRef>,
    last_table_id: TableId,
    last_layout: u64,
    last_object_id: u64,
}

impl MemoryState {
    /// Install the raw view table and its own raw view row.
    fn bootstrap(&mut self) {
        let table = system::raw_view_table_def();
        let table_id: TableId = 1;

        self.last_table_id = table_id;
        self.tables.insert(
            table_id,
            MemoryTable {
                table_id,
                name: table.name.clone(),
                base_name: None,
                layout: LayoutHandle(0),
                columns: table.column_defs.clone(),
            },
        );
        self.names.insert(table.name.to_lowercase(), table_id);
        self.publish_layout(table_id);

        self.last_object_id += 1;
        let object_id = self.last_object_id;
        let mut values: Vec<ColumnValue> = table.column_defs.iter().map(default_cell).collect();
        values[0] = ColumnValue::UInt(object_id);
        values[system::RAW_VIEW_FULL_NAME_COLUMN] = ColumnValue::String(table.name.clone());
        self.rows.insert(object_id, MemoryRow { table_id, values });
        self.raw_views
            .insert(table.name.to_lowercase(), object_ref(object_id));
    }

    fn table_by_name(&self, name: &str) -> Result<&MemoryTable, BackendError> {
        self.names
            .get(&name.to_lowercase())
            .and_then(|id| self.tables.get(id))
            .ok_or_else(|| {
                BackendError::new(
                    BackendError::TABLE_NOT_FOUND,
                    format!("table '{name}' not found"),
                )
            })
    }

    fn layout(&self, handle: LayoutHandle) -> Result<LayoutInfo, BackendError> {
        self.layouts.get(&handle).cloned().ok_or_else(|| {
            BackendError::new(
                BackendError::LAYOUT_NOT_FOUND,
                format!("{handle} not found"),
            )
        })
    }

    fn row(&self, object: ObjectRef) -> Result<&MemoryRow, BackendError> {
        self.rows.get(&object.object_id).ok_or_else(|| row_not_found(object))
    }

    fn add_table(&mut self, table: &TableDef) -> Result<TableDef, BackendError> {
        if self.names.contains_key(&table.name.to_lowercase()) {
            return Err(BackendError::new(
                BackendError::TABLE_EXISTS,
                format!("table '{}' already exists", table.name),
            ));
        }
        if !table.is_identity_led() {
            return Err(BackendError::new(
                BackendError::INVALID_DEFINITION,
                format!("table '{}' must start with the identity column", table.name),
            ));
        }
        check_unique_columns(&table.name, &table.column_defs, &[])?;

        let table_id = self.last_table_id.checked_add(1).ok_or_else(|| {
            BackendError::new(BackendError::INVALID_DEFINITION, "table id space exhausted")
        })?;
        self.last_table_id = table_id;

        let stored = MemoryTable {
            table_id,
            name: table.name.clone(),
            base_name: table.base_name.clone(),
            layout: LayoutHandle(0),
            columns: table.column_defs.clone(),
        };
        self.tables.insert(table_id, stored);
        self.names.insert(table.name.to_lowercase(), table_id);
        let handle = self.publish_layout(table_id);

        self.add_raw_view(&table.name)?;

        self.layout(handle).map(TableDef::from_layout)
    }

    fn alter_table(
        &mut self,
        table_id: TableId,
        columns: &[ColumnDef],
    ) -> Result<LayoutHandle, BackendError> {
        let table = self
            .tables
            .get_mut(&table_id)
            .ok_or_else(|| BackendError::new(BackendError::TABLE_NOT_FOUND, "table vanished"))?;

        if let Some(reserved) = columns.iter().find(|c| c.is_reserved()) {
            return Err(BackendError::new(
                BackendError::INVALID_DEFINITION,
                format!("column name '{}' is reserved", reserved.name),
            ));
        }
        check_unique_columns(&table.name, columns, &table.columns)?;

        self.extend_table(table_id, columns);
        let handle = self.publish_layout(table_id);

        let inherited: Vec<ColumnDef> = columns.iter().map(ColumnDef::to_inherited).collect();
        for derived in self.inheriting_tables(table_id) {
            let missing: Vec<ColumnDef> = self.tables.get(&derived).map_or_else(Vec::new, |t| {
                inherited
                    .iter()
                    .filter(|c| !t.columns.iter().any(|own| own.name_matches(&c.name)))
                    .cloned()
                    .collect()
            });
            if missing.is_empty() {
                continue;
            }

            self.extend_table(derived, &missing);
            let derived_handle = self.publish_layout(derived);
            debug!(
                table_id = derived,
                added = missing.len(),
                %derived_handle,
                "inheriting table altered"
            );
        }

        Ok(handle)
    }

    /// Append `columns` to one table and pad its rows with default cells.
    fn extend_table(&mut self, table_id: TableId, columns: &[ColumnDef]) {
        if let Some(table) = self.tables.get_mut(&table_id) {
            table.columns.extend(columns.iter().cloned());
        }
        for row in self.rows.values_mut().filter(|row| row.table_id == table_id) {
            row.values.extend(columns.iter().map(default_cell));
        }
    }

    /// Every table extending `table_id`, nearest first.
    fn inheriting_tables(&self, table_id: TableId) -> Vec<TableId> {
        let mut found = Vec::new();
        let mut pending = vec![table_id];

        while let Some(current) = pending.pop() {
            let Some(name) = self.tables.get(&current).map(|t| t.name.clone()) else {
                continue;
            };

            for table in self.tables.values() {
                let extends = table
                    .base_name
                    .as_deref()
                    .is_some_and(|base| base.eq_ignore_ascii_case(&name));

                if extends && !found.contains(&table.table_id) {
                    found.push(table.table_id);
                    pending.push(table.table_id);
                }
            }
        }

        found
    }

    fn publish_layout(&mut self, table_id: TableId) -> LayoutHandle {
        self.last_layout += 1;
        let handle = LayoutHandle(self.last_layout);

        if let Some(table) = self.tables.get_mut(&table_id) {
            table.layout = handle;
            self.layouts.insert(
                handle,
                LayoutInfo {
                    table_id,
                    name: table.name.clone(),
                    base_name: table.base_name.clone(),
                    layout_handle: handle,
                    column_defs: table.columns.clone(),
                },
            );
        }

        handle
    }

    fn insert_row(&mut self, table_id: TableId) -> Result<ObjectRef, BackendError> {
        let table = self.tables.get(&table_id).ok_or_else(|| {
            BackendError::new(
                BackendError::TABLE_NOT_FOUND,
                format!("table #{table_id} not found"),
            )
        })?;

        self.last_object_id += 1;
        let object_id = self.last_object_id;

        let mut values: Vec<ColumnValue> = table.columns.iter().map(default_cell).collect();
        values[0] = ColumnValue::UInt(object_id);
        self.rows.insert(object_id, MemoryRow { table_id, values });

        Ok(object_ref(object_id))
    }

    fn write(
        &mut self,
        object: ObjectRef,
        column: usize,
        value: ColumnValue,
    ) -> Result<(), BackendError> {
        let row = self
            .rows
            .get_mut(&object.object_id)
            .ok_or_else(|| row_not_found(object))?;
        let definition = self
            .tables
            .get(&row.table_id)
            .and_then(|table| table.columns.get(column))
            .ok_or_else(|| {
                BackendError::new(
                    BackendError::COLUMN_OUT_OF_RANGE,
                    format!("row {object} has no column {column}"),
                )
            })?;

        if definition.is_reserved() {
            return Err(BackendError::new(
                BackendError::VALUE_MISMATCH,
                format!("column '{}' is read-only", definition.name),
            ));
        }
        if value.is_null() && !definition.is_nullable {
            return Err(BackendError::new(
                BackendError::NULL_VIOLATION,
                format!("column '{}' is not nullable", definition.name),
            ));
        }
        if !value.fits(definition.storage_type) {
            return Err(BackendError::new(
                BackendError::VALUE_MISMATCH,
                format!(
                    "{value:?} cannot be stored in {} column '{}'",
                    definition.storage_type, definition.name
                ),
            ));
        }

        row.values[column] = value;

        Ok(())
    }

    fn add_raw_view(&mut self, full_name: &str) -> Result<(), BackendError> {
        let raw_view_table = *self
            .names
            .get(&system::RAW_VIEW.to_lowercase())
            .ok_or_else(|| {
                BackendError::new(BackendError::TABLE_NOT_FOUND, "raw view table missing")
            })?;

        let object = self.insert_row(raw_view_table)?;
        self.write(
            object,
            system::RAW_VIEW_FULL_NAME_COLUMN,
            ColumnValue::String(full_name.to_string()),
        )?;
        self.raw_views.insert(full_name.to_lowercase(), object);

        Ok(())
    }
}

fn check_unique_columns(
    table_name: &str,
    columns: &[ColumnDef],
    existing: &[ColumnDef],
) -> Result<(), BackendError> {
    for (i, column) in columns.iter().enumerate() {
        let clash = existing
            .iter()
            .chain(&columns[..i])
            .any(|other| other.name_matches(&column.name));

        if clash {
            return Err(BackendError::new(
                BackendError::DUPLICATE_COLUMN,
                format!("table '{table_name}' already has column '{}'", column.name),
            ));
        }
    }

    Ok(())
}

const fn object_ref(object_id: u64) -> ObjectRef {
    ObjectRef::new(object_id, ADDRESS_BASE + object_id * ROW_STRIDE)
}

fn row_not_found(object: ObjectRef) -> BackendError {
    BackendError::new(BackendError::ROW_NOT_FOUND, format!("row {object} not found"))
}

fn default_cell(column: &ColumnDef) -> ColumnValue {
    if column.is_nullable {
        return ColumnValue::Null;
    }

    match column.storage_type {
        StorageType::Key | StorageType::ULong => ColumnValue::UInt(0),
        StorageType::Boolean => ColumnValue::Boolean(false),
        StorageType::Long => ColumnValue::Int(0),
        StorageType::Decimal => ColumnValue::Decimal(Decimal::ZERO),
        StorageType::Single => ColumnValue::Single(0.0),
        StorageType::Double => ColumnValue::Double(0.0),
        StorageType::String => ColumnValue::String(String::new()),
        StorageType::Binary => ColumnValue::Binary(Binary::default()),
        StorageType::LargeBinary => ColumnValue::LargeBinary(LargeBinary::default()),
        StorageType::Object => ColumnValue::Object(ObjectRef::default()),
        StorageType::DateTime => ColumnValue::DateTime(DateTime::default()),
    }
}

///
/// TESTS
///
