use crate::{
    error::Error,
    schema::{PropertyDef, SYSTEM_PREFIX, TableDef, TableId},
    types::ObjectRef,
};
use bindery_primitives::DbTypeCode;
use std::sync::OnceLock;

///
/// TypeLoader
///
/// Names the compiled entity type backing a `TypeDef`. Resolved through the
/// type catalog when the binding is built.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TypeLoader {
    pub type_name: String,
}

impl TypeLoader {
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }
}

///
/// TypeDef
///
/// Schema of one type, bound one-to-one to its table. Immutable once built
/// except for the runtime default type reference, which is set at most once.
///

#[derive(Clone, Debug)]
pub struct TypeDef {
    name: String,
    base_name: Option<String>,
    property_defs: Vec<PropertyDef>,
    table_def: TableDef,
    column_type_codes: Vec<DbTypeCode>,
    type_loader: TypeLoader,
    runtime_default_type_ref: OnceLock<ObjectRef>,
    lower_name: OnceLock<String>,
    short_name: OnceLock<String>,
}

impl TypeDef {
    /// Build a type definition and map every property onto its column.
    ///
    /// The first property mapping a column fixes that column's runtime type;
    /// unmapped columns fall back to their storage type's default code.
    pub fn new(
        name: impl Into<String>,
        base_name: Option<String>,
        mut property_defs: Vec<PropertyDef>,
        table_def: TableDef,
        type_loader: TypeLoader,
    ) -> Result<Self, Error> {
        let name = name.into();

        if !table_def.is_identity_led() {
            return Err(Error::invariant(format!(
                "table '{}' does not start with the identity column",
                table_def.name
            )));
        }

        let mut column_type_codes: Vec<DbTypeCode> = table_def
            .column_defs
            .iter()
            .map(|c| c.storage_type.default_type_code())
            .collect();
        let mut mapped = vec![false; column_type_codes.len()];

        for property in &mut property_defs {
            let Some(column_name) = property.column_name.clone() else {
                property.unbind();
                continue;
            };

            let Some(index) = table_def.column_index(&column_name) else {
                return Err(Error::schema_mismatch(
                    &name,
                    format!(
                        "property '{}' maps to missing column '{column_name}'",
                        property.name
                    ),
                ));
            };

            let column = &table_def.column_defs[index];
            if column.storage_type != property.type_code.storage_type() {
                return Err(Error::schema_mismatch(
                    &name,
                    format!(
                        "property '{}' of type {} cannot be stored in {} column '{}'",
                        property.name, property.type_code, column.storage_type, column.name
                    ),
                ));
            }

            property.bind_column(index, column);
            if !mapped[index] {
                mapped[index] = true;
                column_type_codes[index] = property.type_code;
            }
        }

        Ok(Self {
            name,
            base_name,
            property_defs,
            table_def,
            column_type_codes,
            type_loader,
            runtime_default_type_ref: OnceLock::new(),
            lower_name: OnceLock::new(),
            short_name: OnceLock::new(),
        })
    }

    /// Same declaration re-mapped onto another stored table.
    pub fn rebind(&self, table_def: TableDef) -> Result<Self, Error> {
        Self::new(
            self.name.clone(),
            self.base_name.clone(),
            self.property_defs.clone(),
            table_def,
            self.type_loader.clone(),
        )
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn lower_name(&self) -> &str {
        self.lower_name.get_or_init(|| self.name.to_lowercase())
    }

    /// Unqualified name: everything after the last `.`.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.short_name.get_or_init(|| {
            self.name
                .rsplit_once('.')
                .map_or_else(|| self.name.clone(), |(_, short)| short.to_string())
        })
    }

    #[must_use]
    pub fn base_name(&self) -> Option<&str> {
        self.base_name.as_deref()
    }

    #[must_use]
    pub fn is_system(&self) -> bool {
        self.name.starts_with(SYSTEM_PREFIX)
    }

    #[must_use]
    pub fn property_defs(&self) -> &[PropertyDef] {
        &self.property_defs
    }

    #[must_use]
    pub fn property_def(&self, name: &str) -> Option<&PropertyDef> {
        self.property_defs
            .iter()
            .find(|p| p.name == name)
            .or_else(|| {
                self.property_defs
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(name))
            })
    }

    #[must_use]
    pub const fn table_def(&self) -> &TableDef {
        &self.table_def
    }

    #[must_use]
    pub const fn table_id(&self) -> Option<TableId> {
        self.table_def.table_id
    }

    #[must_use]
    pub fn column_type_codes(&self) -> &[DbTypeCode] {
        &self.column_type_codes
    }

    #[must_use]
    pub const fn type_loader(&self) -> &TypeLoader {
        &self.type_loader
    }

    #[must_use]
    pub fn runtime_default_type_ref(&self) -> Option<ObjectRef> {
        self.runtime_default_type_ref.get().copied()
    }

    /// Record the materialized runtime type instance. Setting the same
    /// reference again is a no-op; a different one is rejected.
    pub fn set_runtime_default_type_ref(&self, type_ref: ObjectRef) -> Result<(), Error> {
        let stored = *self.runtime_default_type_ref.get_or_init(|| type_ref);

        if stored == type_ref {
            Ok(())
        } else {
            Err(Error::invariant(format!(
                "runtime type of '{}' already set to {stored}, refusing {type_ref}",
                self.name
            )))
        }
    }
}

///
/// TESTS
///
