//! Storage backend seam. The binding layer never touches rows directly;
//! everything it needs from storage goes through `StorageBackend`.

mod memory;

pub use memory::MemoryBackend;

use crate::{
    schema::{ColumnDef, TableDef, TableId},
    types::{ColumnValue, ObjectRef},
};
use derive_more::Display;
use thiserror::Error as ThisError;

///
/// BackendError
///
/// Error reported by the storage backend, carried through the binding layer
/// unchanged.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("backend error {code}: {message}")]
pub struct BackendError {
    pub code: u32,
    pub message: String,
}

impl BackendError {
    pub const TABLE_NOT_FOUND: u32 = 1001;
    pub const TABLE_EXISTS: u32 = 1002;
    pub const LAYOUT_NOT_FOUND: u32 = 1003;
    pub const ROW_NOT_FOUND: u32 = 1004;
    pub const COLUMN_OUT_OF_RANGE: u32 = 1005;
    pub const VALUE_MISMATCH: u32 = 1006;
    pub const NULL_VIOLATION: u32 = 1007;
    pub const DUPLICATE_COLUMN: u32 = 1008;
    pub const INDEX_EXISTS: u32 = 1009;
    pub const INVALID_DEFINITION: u32 = 1010;

    #[must_use]
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

///
/// LayoutHandle
///
/// Opaque handle of one table layout version. Altering a table yields a
/// new handle; old handles stay readable.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("layout#{_0}")]
pub struct LayoutHandle(pub u64);

///
/// LayoutInfo
///
/// Stored shape of one table at one layout version.
///

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutInfo {
    pub table_id: TableId,
    pub name: String,
    pub base_name: Option<String>,
    pub layout_handle: LayoutHandle,
    pub column_defs: Vec<ColumnDef>,
}

///
/// IndexInfo
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexInfo {
    pub name: String,
    pub table_name: String,
    pub column_names: Vec<String>,
    pub is_unique: bool,
}

///
/// StorageBackend
///
/// Table, layout and row primitives the binding layer calls into. Every
/// call runs inside the caller's ambient transaction.
///

pub trait StorageBackend: Send + Sync {
    /// Create `table`, extending `inherited` when given. Returns the
    /// definition with its assigned id and layout.
    fn create_table(
        &self,
        table: &TableDef,
        inherited: Option<&TableDef>,
    ) -> Result<TableDef, BackendError>;

    fn lookup_table(&self, name: &str) -> Result<Option<TableDef>, BackendError>;

    /// Append `columns` to the named table, returning its new layout.
    /// Tables inheriting from it, directly or through a chain, gain the
    /// same columns flagged inherited.
    fn alter_table_add_columns(
        &self,
        table_name: &str,
        columns: &[ColumnDef],
    ) -> Result<LayoutHandle, BackendError>;

    fn layout_info(&self, handle: LayoutHandle) -> Result<LayoutInfo, BackendError>;

    fn index_infos(&self, handle: LayoutHandle) -> Result<Vec<IndexInfo>, BackendError>;

    fn index_info_by_name(
        &self,
        handle: LayoutHandle,
        name: &str,
    ) -> Result<Option<IndexInfo>, BackendError> {
        Ok(self
            .index_infos(handle)?
            .into_iter()
            .find(|index| index.name.eq_ignore_ascii_case(name)))
    }

    /// Insert an empty row: nullable columns are null, others zeroed.
    fn insert_row(&self, table_id: TableId) -> Result<ObjectRef, BackendError>;

    fn row_table_id(&self, object: ObjectRef) -> Result<TableId, BackendError>;

    fn read_column(&self, object: ObjectRef, column: usize) -> Result<ColumnValue, BackendError>;

    fn write_column(
        &self,
        object: ObjectRef,
        column: usize,
        value: ColumnValue,
    ) -> Result<(), BackendError>;

    /// Raw view row of a stored type, found by full type name.
    fn find_raw_view(&self, full_name: &str) -> Result<Option<ObjectRef>, BackendError>;
}
