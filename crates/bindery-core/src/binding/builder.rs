use crate::{
    binding::{PropertyAccessor, PropertyBinding, TypeBinding, TypeCatalog},
    error::Error,
    schema::{PropertyDef, TableId, TypeDef},
    traits::FieldShape,
};
use bindery_primitives::DbTypeCode;
use std::sync::Arc;

///
/// BindingBuilder
///
/// Turns a registered `TypeDef` into a `TypeBinding` by verifying every
/// property against the compiled entity and wiring in its accessors.
/// Stateless; every call builds a new binding.
///

#[derive(Clone, Copy, Debug)]
pub struct BindingBuilder<'a> {
    catalog: &'a TypeCatalog,
}

impl<'a> BindingBuilder<'a> {
    #[must_use]
    pub const fn new(catalog: &'a TypeCatalog) -> Self {
        Self { catalog }
    }

    pub fn build(
        &self,
        type_def: Arc<TypeDef>,
        table_ids: Vec<TableId>,
    ) -> Result<TypeBinding, Error> {
        let type_name = type_def.name();
        let loader = type_def.type_loader();

        let descriptor = self.catalog.resolve(&loader.type_name).ok_or_else(|| {
            Error::schema_mismatch(
                type_name,
                format!("no compiled type named '{}'", loader.type_name),
            )
        })?;

        let table_id = type_def.table_id().ok_or_else(|| {
            Error::invariant(format!("type '{type_name}' is not bound to a created table"))
        })?;

        let mut properties = Vec::with_capacity(type_def.property_defs().len());
        for (ordinal, def) in type_def.property_defs().iter().enumerate() {
            let field = descriptor.field(&def.name).ok_or_else(|| {
                Error::schema_mismatch(
                    type_name,
                    format!("property '{}' has no readable field", def.name),
                )
            })?;
            verify_shape(type_name, def, field.shape)?;

            let accessor = select_accessor(def.type_code, || descriptor.accessor(&def.name))
                .ok_or_else(|| {
                    Error::schema_mismatch(
                        type_name,
                        format!("property '{}' has no {} accessor", def.name, def.type_code),
                    )
                })?;

            properties.push(PropertyBinding::new(
                def.column_index,
                ordinal,
                def.name.clone(),
                def.type_code,
                def.is_nullable,
                def.target_type_name.clone(),
                accessor,
            ));
        }

        Ok(TypeBinding::new(
            type_def.clone(),
            table_id,
            table_ids,
            properties,
            descriptor,
        ))
    }
}

/// Check the compiled field against the declared property.
///
/// The type codes must match exactly (an enum matches through its
/// representation). Nullability must match unless the type is a reference
/// type, which is stored nullable either way.
fn verify_shape(type_name: &str, def: &PropertyDef, shape: FieldShape) -> Result<(), Error> {
    if shape.type_code != def.type_code {
        let kind = if shape.is_enum {
            "an enum represented as"
        } else {
            "of type"
        };

        return Err(Error::schema_mismatch(
            type_name,
            format!(
                "property '{}' is declared {} but its field is {kind} {}",
                def.name, def.type_code, shape.type_code
            ),
        ));
    }

    if shape.nullable != def.is_nullable && !def.type_code.is_reference() {
        let (declared, field) = if def.is_nullable {
            ("nullable", "non-nullable")
        } else {
            ("non-nullable", "nullable")
        };

        return Err(Error::schema_mismatch(
            type_name,
            format!(
                "property '{}' is {declared} but its field is {field}",
                def.name
            ),
        ));
    }

    Ok(())
}

/// Fetch the accessor and reject one wired to another family.
fn select_accessor(
    code: DbTypeCode,
    accessor: impl FnOnce() -> Option<Box<dyn PropertyAccessor>>,
) -> Option<Box<dyn PropertyAccessor>> {
    accessor().filter(|accessor| accessor.type_code() == code)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        schema::{ColumnDef, TableDef, TypeLoader},
        test_support::{Sample, Shape, declared_with_id, sample},
        traits::Entity,
    };
    use bindery_primitives::StorageType;

    fn catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        catalog.register::<Sample>().register::<Shape>();

        catalog
    }

    fn single_property_type(def: PropertyDef, column: ColumnDef) -> Arc<TypeDef> {
        let mut table = TableDef::new(Sample::TYPE_NAME, None, vec![column]);
        table.table_id = Some(4);

        Arc::new(
            TypeDef::new(
                Sample::TYPE_NAME,
                None,
                vec![def],
                table,
                TypeLoader::new(Sample::TYPE_NAME),
            )
            .expect("single-property type should build"),
        )
    }

    #[test]
    fn builds_a_binding_for_every_declared_property() {
        let catalog = catalog();
        let type_def = declared_with_id::<Sample>(3);

        let binding = BindingBuilder::new(&catalog)
            .build(type_def.clone(), vec![3])
            .expect("declared schema should bind");

        assert_eq!(binding.name(), Sample::TYPE_NAME);
        assert_eq!(binding.table_id(), 3);
        assert_eq!(binding.property_count(), type_def.property_defs().len());

        let small = binding
            .property_binding_by_name("small")
            .expect("case-insensitive lookup should find Small");
        assert_eq!(small.ordinal(), 0);
        assert_eq!(small.data_index(), Some(1));
        assert_eq!(
            small.get_int32(&sample()).expect("Int16 should widen"),
            Some(-12)
        );
    }

    #[test]
    fn missing_compiled_type_is_a_mismatch() {
        let catalog = TypeCatalog::new();
        let err = BindingBuilder::new(&catalog)
            .build(declared_with_id::<Sample>(3), vec![3])
            .expect_err("unregistered entity should fail");

        assert!(matches!(err, Error::SchemaCodeMismatch { .. }));
    }

    #[test]
    fn type_code_disagreement_is_a_mismatch() {
        let type_def = single_property_type(
            PropertyDef::new("Small", DbTypeCode::Int32),
            ColumnDef::new("Small", StorageType::Long, false),
        );

        let err = BindingBuilder::new(&catalog())
            .build(type_def, vec![4])
            .expect_err("Int32 property over an Int16 field should fail");

        assert!(err.to_string().contains("declared Int32"));
    }

    #[test]
    fn nullability_disagreement_is_a_mismatch_for_value_types() {
        let type_def = single_property_type(
            PropertyDef::new("Small", DbTypeCode::Int16),
            ColumnDef::new("Small", StorageType::Long, true),
        );

        let err = BindingBuilder::new(&catalog())
            .build(type_def, vec![4])
            .expect_err("nullable column over a non-nullable field should fail");

        assert!(err.to_string().contains("nullable"));
    }

    #[test]
    fn reference_types_accept_either_nullability() {
        let type_def = single_property_type(
            PropertyDef::new("Blob", DbTypeCode::Binary),
            ColumnDef::new("Blob", StorageType::Binary, true),
        );

        BindingBuilder::new(&catalog())
            .build(type_def, vec![4])
            .expect("non-optional Binary field should bind to a nullable column");
    }

    #[test]
    fn property_without_a_field_is_a_mismatch() {
        let type_def = single_property_type(
            PropertyDef::new("Ghost", DbTypeCode::Int64),
            ColumnDef::new("Ghost", StorageType::Long, false),
        );

        let err = BindingBuilder::new(&catalog())
            .build(type_def, vec![4])
            .expect_err("property with no field should fail");

        assert!(err.to_string().contains("no readable field"));
    }

    #[test]
    fn abstract_binding_yields_no_instances() {
        let binding = BindingBuilder::new(&catalog())
            .build(declared_with_id::<Shape>(6), vec![6])
            .expect("abstract entity should still bind");

        assert!(binding.new_uninitialized_instance().is_none());
        assert!(binding.is_type_or_subtype(6));
        assert!(!binding.is_type_or_subtype(7));
    }
}
