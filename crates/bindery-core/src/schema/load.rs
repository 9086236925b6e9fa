use crate::{
    backend::StorageBackend,
    binding::TypeCatalog,
    error::Error,
    schema::{TypeDef, upgrade},
};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, instrument};

/// Declare the named catalog types, create or upgrade their tables and
/// return the stored definitions, every base ahead of its derived types.
///
/// Bases are loaded even when only a derived type is named. Each type
/// appears once in the result.
#[instrument(name = "schema::load_types", level = "debug", skip_all, fields(count = type_names.len()))]
pub fn load_types(
    backend: &dyn StorageBackend,
    catalog: &TypeCatalog,
    type_names: &[&str],
    allow_upgrade: bool,
) -> Result<Vec<Arc<TypeDef>>, Error> {
    let mut loader = Loader {
        backend,
        catalog,
        allow_upgrade,
        loaded: HashMap::new(),
        order: Vec::new(),
        visiting: Vec::new(),
    };

    for name in type_names {
        loader.load(name)?;
    }

    Ok(loader.order)
}

struct Loader<'a> {
    backend: &'a dyn StorageBackend,
    catalog: &'a TypeCatalog,
    allow_upgrade: bool,
    loaded: HashMap<String, Arc<TypeDef>>,
    order: Vec<Arc<TypeDef>>,
    visiting: Vec<String>,
}

impl Loader<'_> {
    fn load(&mut self, type_name: &str) -> Result<Arc<TypeDef>, Error> {
        if let Some(done) = self.loaded.get(type_name) {
            return Ok(Arc::clone(done));
        }
        if self.visiting.iter().any(|name| name == type_name) {
            return Err(Error::invariant(format!(
                "base chain of '{type_name}' loops back to itself"
            )));
        }

        let descriptor = self.catalog.resolve(type_name).ok_or_else(|| {
            Error::schema_mismatch(type_name, "no compiled type with this name")
        })?;

        self.visiting.push(type_name.to_string());
        let base = descriptor
            .base_name()
            .map(|base_name| self.load(base_name))
            .transpose();
        self.visiting.pop();
        let base = base?;

        let declared = TypeDef::declare(descriptor.as_ref(), base.as_deref())?;
        let stored = upgrade::sync_table(
            self.backend,
            &declared,
            base.as_ref().map(|base| base.table_def()),
            self.allow_upgrade,
        )?;
        debug!(type_name, table_id = ?stored.table_id(), "type loaded");

        let stored = Arc::new(stored);
        self.loaded.insert(type_name.to_string(), Arc::clone(&stored));
        self.order.push(Arc::clone(&stored));

        Ok(stored)
    }
}

///
/// TESTS
///
