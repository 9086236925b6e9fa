use crate::{
    binding::{EntityDescriptor, PropertyBinding},
    error::Error,
    schema::{TableId, TypeDef},
};
use std::{any::Any, collections::HashMap, fmt, sync::Arc};

///
/// TypeBinding
///
/// Immutable, fully specialized binding of one type to its table. Built
/// once per type by the registry and shared by every reader.
///

pub struct TypeBinding {
    name: String,
    lower_name: String,
    table_id: TableId,
    type_def: Arc<TypeDef>,
    table_ids: Vec<TableId>,
    has_on_delete: bool,
    properties: Vec<PropertyBinding>,
    by_name: HashMap<String, usize>,
    by_lower_name: HashMap<String, usize>,
    descriptor: Arc<dyn EntityDescriptor>,
}

impl TypeBinding {
    pub(crate) fn new(
        type_def: Arc<TypeDef>,
        table_id: TableId,
        mut table_ids: Vec<TableId>,
        properties: Vec<PropertyBinding>,
        descriptor: Arc<dyn EntityDescriptor>,
    ) -> Self {
        table_ids.sort_unstable();
        table_ids.dedup();

        let by_name = properties
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name().to_string(), i))
            .collect();

        let mut by_lower_name = HashMap::with_capacity(properties.len());
        for (i, p) in properties.iter().enumerate() {
            by_lower_name.entry(p.lower_name().to_string()).or_insert(i);
        }

        Self {
            name: type_def.name().to_string(),
            lower_name: type_def.lower_name().to_string(),
            table_id,
            has_on_delete: descriptor.has_on_delete(),
            type_def,
            table_ids,
            properties,
            by_name,
            by_lower_name,
            descriptor,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn lower_name(&self) -> &str {
        &self.lower_name
    }

    #[must_use]
    pub const fn table_id(&self) -> TableId {
        self.table_id
    }

    #[must_use]
    pub fn type_def(&self) -> &Arc<TypeDef> {
        &self.type_def
    }

    /// Sorted ids of this type's table and every base table.
    #[must_use]
    pub fn table_ids(&self) -> &[TableId] {
        &self.table_ids
    }

    #[must_use]
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    #[must_use]
    pub fn property_bindings(&self) -> &[PropertyBinding] {
        &self.properties
    }

    #[must_use]
    pub fn property_binding(&self, index: usize) -> Option<&PropertyBinding> {
        self.properties.get(index)
    }

    /// Property by name: exact match first, then case-insensitive.
    #[must_use]
    pub fn property_binding_by_name(&self, name: &str) -> Option<&PropertyBinding> {
        self.by_name
            .get(name)
            .or_else(|| self.by_lower_name.get(&name.to_lowercase()))
            .map(|&i| &self.properties[i])
    }

    /// Whether rows of this type are rows of `table_id`'s type, either
    /// directly or through inheritance.
    #[must_use]
    pub fn is_type_or_subtype(&self, table_id: TableId) -> bool {
        self.table_ids.binary_search(&table_id).is_ok()
    }

    /// Fresh instance to be filled from a row; `None` for abstract types.
    #[must_use]
    pub fn new_uninitialized_instance(&self) -> Option<Box<dyn Any + Send + Sync>> {
        self.descriptor.new_uninitialized()
    }

    #[must_use]
    pub const fn has_on_delete(&self) -> bool {
        self.has_on_delete
    }

    pub fn invoke_on_delete(&self, instance: &dyn Any) -> Result<(), Error> {
        self.descriptor.invoke_on_delete(instance)
    }
}

impl fmt::Debug for TypeBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeBinding")
            .field("name", &self.name)
            .field("table_id", &self.table_id)
            .field("table_ids", &self.table_ids)
            .field("has_on_delete", &self.has_on_delete)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}
