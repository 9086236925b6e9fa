use crate::schema::{IDENTITY_COLUMN, is_reserved_name};
use bindery_primitives::StorageType;

///
/// ColumnDef
///
/// One stored column. Names compare case-insensitively.
///

#[derive(Clone, Debug, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub storage_type: StorageType,
    pub is_nullable: bool,
    pub is_inherited: bool,
}

impl ColumnDef {
    #[must_use]
    pub fn new(name: impl Into<String>, storage_type: StorageType, is_nullable: bool) -> Self {
        Self {
            name: name.into(),
            storage_type,
            is_nullable,
            is_inherited: false,
        }
    }

    /// The reserved identity column that leads every table.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(IDENTITY_COLUMN, StorageType::Key, false)
    }

    /// Copy of this column as seen by a table extending its owner.
    #[must_use]
    pub fn to_inherited(&self) -> Self {
        Self {
            is_inherited: true,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn is_reserved(&self) -> bool {
        is_reserved_name(&self.name)
    }

    #[must_use]
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Storage type and nullability agree; name and inheritance are ignored.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.storage_type == other.storage_type && self.is_nullable == other.is_nullable
    }
}

impl PartialEq for ColumnDef {
    fn eq(&self, other: &Self) -> bool {
        self.name_matches(&other.name)
            && self.same_shape(other)
            && self.is_inherited == other.is_inherited
    }
}

///
/// TESTS
///
