use crate::{
    binding::EntityDescriptor,
    error::Error,
    schema::{ColumnDef, PropertyDef, PropertyFlags, TableDef, TypeDef, TypeLoader},
    traits::FieldMeta,
};
use bindery_primitives::DbTypeCode;

impl TypeDef {
    /// Declared definition of a compiled entity, not yet bound to a stored
    /// table.
    ///
    /// Columns are the identity column, then the base's user columns
    /// (flagged inherited), then the entity's own fields the base does not
    /// already store. A field redeclaring a base property replaces it in
    /// place.
    pub fn declare(
        descriptor: &dyn EntityDescriptor,
        base: Option<&Self>,
    ) -> Result<Self, Error> {
        let type_name = descriptor.type_name();

        if descriptor.base_name() != base.map(Self::name) {
            return Err(Error::schema_mismatch(
                type_name,
                format!(
                    "declares base {:?} but was declared against {:?}",
                    descriptor.base_name(),
                    base.map(Self::name)
                ),
            ));
        }

        let mut table = base.map_or_else(
            || TableDef::new(type_name, None, Vec::new()),
            |base| base.table_def().inherited_table_def(type_name),
        );
        let mut properties: Vec<PropertyDef> = base
            .map(|base| base.property_defs().to_vec())
            .unwrap_or_default();

        for field in descriptor.fields() {
            check_flags(type_name, &field)?;

            if table.column(field.column).is_none() {
                let type_code = field.shape.type_code;
                table.column_defs.push(ColumnDef::new(
                    field.column,
                    type_code.storage_type(),
                    field.shape.nullable || type_code.is_reference(),
                ));
            }

            let property = declared_property(&field);
            match properties.iter_mut().find(|p| p.name == property.name) {
                Some(existing) => *existing = property,
                None => properties.push(property),
            }
        }

        Self::new(
            type_name,
            base.map(|base| base.name().to_string()),
            properties,
            table,
            TypeLoader::new(type_name),
        )
    }
}

fn declared_property(field: &FieldMeta) -> PropertyDef {
    let mut property = PropertyDef::new(field.name, field.shape.type_code)
        .nullable(field.shape.nullable)
        .with_column(field.column)
        .with_flags(field.flags);

    if let Some(target) = field.target_type {
        property = property.with_target(target);
    }

    property
}

// Type references must be object properties; the type name must be text.
fn check_flags(type_name: &str, field: &FieldMeta) -> Result<(), Error> {
    let code = field.shape.type_code;
    let flags = field.flags;

    let references = flags.contains(PropertyFlags::TYPE_REFERENCE)
        || flags.contains(PropertyFlags::BASE_TYPE_REFERENCE);
    let misplaced = (references && code != DbTypeCode::Object)
        || (flags.contains(PropertyFlags::TYPE_NAME) && code != DbTypeCode::String);

    if misplaced {
        return Err(Error::schema_mismatch(
            type_name,
            format!(
                "property '{}' of type {code} cannot carry flags {flags:?}",
                field.name
            ),
        ));
    }

    if flags.contains(PropertyFlags::TYPE_REFERENCE | PropertyFlags::BASE_TYPE_REFERENCE) {
        return Err(Error::schema_mismatch(
            type_name,
            format!(
                "property '{}' cannot reference both its own and its base type",
                field.name
            ),
        ));
    }

    Ok(())
}

///
/// TESTS
///
