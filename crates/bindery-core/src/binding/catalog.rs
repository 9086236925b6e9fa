use crate::{
    binding::accessor::{PropertyAccessor, specialize},
    error::Error,
    system::{AutoCreatedType, RawView},
    traits::{Entity, FieldAccessor, FieldMeta},
};
use std::{any::Any, collections::HashMap, fmt, marker::PhantomData, sync::Arc};
use tracing::warn;

///
/// EntityDescriptor
///
/// Type-erased view of one compiled entity: its declared shape, its field
/// accessors and its constructor.
///

pub trait EntityDescriptor: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn base_name(&self) -> Option<&'static str>;

    fn is_abstract(&self) -> bool;

    fn has_on_delete(&self) -> bool;

    /// Field metadata in declaration order.
    fn fields(&self) -> Vec<FieldMeta>;

    /// Field metadata by property name (exact, then case-insensitive).
    fn field(&self, name: &str) -> Option<FieldMeta>;

    /// Specialized accessor for the named field.
    fn accessor(&self, name: &str) -> Option<Box<dyn PropertyAccessor>>;

    fn new_uninitialized(&self) -> Option<Box<dyn Any + Send + Sync>>;

    fn invoke_on_delete(&self, instance: &dyn Any) -> Result<(), Error>;
}

///
/// EntityLoader
///

pub(crate) struct EntityLoader<E>(PhantomData<fn() -> E>);

impl<E: Entity> EntityLoader<E> {
    pub(crate) const fn new() -> Self {
        Self(PhantomData)
    }

    fn find(name: &str) -> Option<FieldAccessor<E>> {
        let mut fields = E::fields();

        let index = fields
            .iter()
            .position(|f| f.meta.name == name)
            .or_else(|| {
                fields
                    .iter()
                    .position(|f| f.meta.name.eq_ignore_ascii_case(name))
            })?;

        Some(fields.swap_remove(index))
    }
}

impl<E: Entity> EntityDescriptor for EntityLoader<E> {
    fn type_name(&self) -> &'static str {
        E::TYPE_NAME
    }

    fn base_name(&self) -> Option<&'static str> {
        E::BASE_NAME
    }

    fn is_abstract(&self) -> bool {
        E::IS_ABSTRACT
    }

    fn has_on_delete(&self) -> bool {
        E::HAS_ON_DELETE
    }

    fn fields(&self) -> Vec<FieldMeta> {
        E::fields().into_iter().map(|f| f.meta).collect()
    }

    fn field(&self, name: &str) -> Option<FieldMeta> {
        Self::find(name).map(|f| f.meta)
    }

    fn accessor(&self, name: &str) -> Option<Box<dyn PropertyAccessor>> {
        Self::find(name).map(|f| specialize(f.getter))
    }

    fn new_uninitialized(&self) -> Option<Box<dyn Any + Send + Sync>> {
        if E::IS_ABSTRACT {
            return None;
        }

        E::new_uninitialized().map(|instance| Box::new(instance) as Box<dyn Any + Send + Sync>)
    }

    fn invoke_on_delete(&self, instance: &dyn Any) -> Result<(), Error> {
        let entity = instance
            .downcast_ref::<E>()
            .ok_or(Error::InstanceTypeMismatch {
                expected: E::TYPE_NAME,
            })?;

        if E::HAS_ON_DELETE {
            entity.invoke_on_delete();
        }

        Ok(())
    }
}

///
/// TypeCatalog
///
/// Maps type names to the compiled entities that back them. Populated by
/// the application before the database is opened.
///

#[derive(Clone, Default)]
pub struct TypeCatalog {
    entries: HashMap<&'static str, Arc<dyn EntityDescriptor>>,
}

impl TypeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-populated with the built-in system types.
    #[must_use]
    pub fn with_system_types() -> Self {
        let mut catalog = Self::new();
        catalog.ensure_system_types();

        catalog
    }

    /// Register whichever system types are not registered yet.
    pub fn ensure_system_types(&mut self) -> &mut Self {
        if !self.contains(RawView::TYPE_NAME) {
            self.register::<RawView>();
        }
        if !self.contains(AutoCreatedType::TYPE_NAME) {
            self.register::<AutoCreatedType>();
        }

        self
    }

    /// Register entity `E` under its type name. A later registration of the
    /// same name replaces the earlier one.
    pub fn register<E: Entity>(&mut self) -> &mut Self {
        let previous = self
            .entries
            .insert(E::TYPE_NAME, Arc::new(EntityLoader::<E>::new()));

        if previous.is_some() {
            warn!(type_name = E::TYPE_NAME, "entity registered twice; keeping the latest");
        }

        self
    }

    #[must_use]
    pub fn resolve(&self, type_name: &str) -> Option<Arc<dyn EntityDescriptor>> {
        self.entries.get(type_name).cloned()
    }

    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Registered type names, sorted.
    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();

        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeCatalog")
            .field("types", &self.type_names())
            .finish()
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        system,
        test_support::{Sample, Shape},
    };

    #[test]
    fn system_catalog_knows_both_system_types() {
        let catalog = TypeCatalog::with_system_types();

        assert_eq!(
            catalog.type_names(),
            vec![system::AUTO_CREATED_TYPE, system::RAW_VIEW]
        );
    }

    #[test]
    fn ensuring_system_types_keeps_user_entries() {
        let mut catalog = TypeCatalog::new();
        catalog.register::<Sample>().ensure_system_types().ensure_system_types();

        assert_eq!(catalog.len(), 3);
        assert!(catalog.contains(system::RAW_VIEW));
    }

    #[test]
    fn descriptor_exposes_declared_fields() {
        let mut catalog = TypeCatalog::new();
        catalog.register::<Sample>();

        let descriptor = catalog
            .resolve(Sample::TYPE_NAME)
            .expect("registered entity should resolve");
        let names: Vec<_> = descriptor.fields().iter().map(|f| f.name).collect();

        assert_eq!(names[..3], ["Small", "Tiny", "Ratio"]);
        assert!(descriptor.field("label").is_some());
        assert!(descriptor.field("Missing").is_none());
        assert!(catalog.resolve("Unknown").is_none());
    }

    #[test]
    fn abstract_entities_have_no_instances() {
        let mut catalog = TypeCatalog::new();
        catalog.register::<Shape>().register::<Sample>();

        let shape = catalog.resolve(Shape::TYPE_NAME).expect("shape should resolve");
        let sample = catalog
            .resolve(Sample::TYPE_NAME)
            .expect("sample should resolve");

        assert!(shape.new_uninitialized().is_none());
        let instance = sample
            .new_uninitialized()
            .expect("concrete entity should construct");
        assert!(instance.downcast_ref::<Sample>().is_some());
    }

    #[test]
    fn on_delete_rejects_foreign_instances() {
        let descriptor = EntityLoader::<Sample>::new();

        let err = descriptor
            .invoke_on_delete(&5_u32)
            .expect_err("foreign instance should be rejected");
        assert!(matches!(err, Error::InstanceTypeMismatch { .. }));
    }
}
