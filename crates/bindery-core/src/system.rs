//! Built-in backend types. Every stored type has one `System.RawView` row;
//! types with no user-declared runtime type are materialized as
//! `System.AutoCreatedType` rows.

use crate::{
    backend::StorageBackend,
    binding::TypeCatalog,
    error::Error,
    schema::{ColumnDef, TableDef, TypeDef, upgrade},
    types::ObjectRef,
};
use bindery_derive::Entity;
use bindery_primitives::StorageType;
use std::sync::Arc;

pub const RAW_VIEW: &str = "System.RawView";
pub const AUTO_CREATED_TYPE: &str = "System.AutoCreatedType";

/// Column index of `FullName` in the raw view table.
pub const RAW_VIEW_FULL_NAME_COLUMN: usize = 1;

pub const FULL_NAME: &str = "FullName";
pub const AUTO_TYPE_INSTANCE: &str = "AutoTypeInstance";
pub const NAME: &str = "Name";
pub const IS_TYPE: &str = "IsType";
pub const INHERITS: &str = "Inherits";

///
/// RawView
///
/// Backend catalog row of one stored type.
///

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "System.RawView")]
pub struct RawView {
    pub full_name: String,

    #[entity(references = "System.AutoCreatedType")]
    pub auto_type_instance: Option<ObjectRef>,
}

///
/// AutoCreatedType
///
/// Runtime type instance created for types that declare none themselves.
///

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "System.AutoCreatedType")]
pub struct AutoCreatedType {
    #[entity(type_name)]
    pub name: String,

    pub is_type: bool,

    #[entity(references = "System.AutoCreatedType", base_type_reference)]
    pub inherits: Option<ObjectRef>,
}

/// Table the backend installs for raw views before anything else exists.
#[must_use]
pub fn raw_view_table_def() -> TableDef {
    TableDef::new(
        RAW_VIEW,
        None,
        vec![
            ColumnDef::new(FULL_NAME, StorageType::String, true),
            ColumnDef::new(AUTO_TYPE_INSTANCE, StorageType::Object, true),
        ],
    )
}

/// Declare both system types, create or upgrade their tables and return
/// the definitions bound to the stored tables.
pub fn install(
    backend: &dyn StorageBackend,
    catalog: &TypeCatalog,
    allow_upgrade: bool,
) -> Result<Vec<Arc<TypeDef>>, Error> {
    [RAW_VIEW, AUTO_CREATED_TYPE]
        .into_iter()
        .map(|type_name| {
            let descriptor = catalog.resolve(type_name).ok_or_else(|| {
                Error::schema_mismatch(type_name, "system type missing from the catalog")
            })?;
            let declared = TypeDef::declare(descriptor.as_ref(), None)?;

            upgrade::sync_table(backend, &declared, None, allow_upgrade).map(Arc::new)
        })
        .collect()
}

///
/// TESTS
///
