use crate::{
    backend::{IndexInfo, LayoutHandle, LayoutInfo, StorageBackend},
    error::Error,
    schema::ColumnDef,
};

/// Backend-assigned table identifier.
pub type TableId = u16;

///
/// TableDef
///
/// Stored shape of one table. Column 0 is always the identity column.
/// A fresh definition has no id or layout until the backend creates it.
///

#[derive(Clone, Debug, PartialEq)]
pub struct TableDef {
    pub name: String,
    pub base_name: Option<String>,
    pub column_defs: Vec<ColumnDef>,
    pub table_id: Option<TableId>,
    pub layout_handle: Option<LayoutHandle>,
}

impl TableDef {
    /// Fresh definition: the identity column followed by `columns`.
    #[must_use]
    pub fn new(name: impl Into<String>, base_name: Option<String>, columns: Vec<ColumnDef>) -> Self {
        let mut column_defs = Vec::with_capacity(columns.len() + 1);
        column_defs.push(ColumnDef::identity());
        column_defs.extend(columns);

        Self {
            name: name.into(),
            base_name,
            column_defs,
            table_id: None,
            layout_handle: None,
        }
    }

    /// Definition mirroring a layout the backend reported.
    #[must_use]
    pub fn from_layout(info: LayoutInfo) -> Self {
        Self {
            name: info.name,
            base_name: info.base_name,
            column_defs: info.column_defs,
            table_id: Some(info.table_id),
            layout_handle: Some(info.layout_handle),
        }
    }

    /// Fresh definition of a table named `name` that extends this one.
    /// Every non-reserved column is repeated and flagged inherited.
    #[must_use]
    pub fn inherited_table_def(&self, name: impl Into<String>) -> Self {
        let columns = self
            .user_columns()
            .map(|(_, column)| column.to_inherited())
            .collect();

        Self::new(name, Some(self.name.clone()), columns)
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_defs.iter().position(|c| c.name_matches(name))
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.column_defs.iter().find(|c| c.name_matches(name))
    }

    /// Columns after the reserved leading block, with their indexes.
    pub fn user_columns(&self) -> impl Iterator<Item = (usize, &ColumnDef)> {
        self.column_defs
            .iter()
            .enumerate()
            .skip_while(|(_, column)| column.is_reserved())
    }

    /// Whether both definitions describe the same column sequence.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.column_defs == other.column_defs
    }

    #[must_use]
    pub fn is_identity_led(&self) -> bool {
        self.column_defs
            .first()
            .is_some_and(|c| *c == ColumnDef::identity())
    }

    pub fn index_infos(&self, backend: &dyn StorageBackend) -> Result<Vec<IndexInfo>, Error> {
        let handle = self.require_layout()?;

        Ok(backend.index_infos(handle)?)
    }

    pub fn index_info_by_name(
        &self,
        backend: &dyn StorageBackend,
        name: &str,
    ) -> Result<Option<IndexInfo>, Error> {
        let handle = self.require_layout()?;

        Ok(backend.index_info_by_name(handle, name)?)
    }

    fn require_layout(&self) -> Result<LayoutHandle, Error> {
        self.layout_handle.ok_or_else(|| {
            Error::invariant(format!("table '{}' has not been created", self.name))
        })
    }
}

///
/// TESTS
///
