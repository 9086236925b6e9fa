use crate::{
    binding::{BindingBuilder, TypeBinding, TypeCatalog, snapshot::Published},
    config::RegistryConfig,
    error::Error,
    obs::RegistryMetrics,
    schema::{TableId, TypeDef},
};
use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};
use tracing::{debug, instrument};

///
/// NameEntry
///
/// A name-map slot: either the one type owning the name, or a marker that
/// several types claim it.
///

#[derive(Clone, Debug)]
pub enum NameEntry<T> {
    Unique(Arc<T>),
    Ambiguous,
}

impl<T> NameEntry<T> {
    #[must_use]
    pub fn unique(&self) -> Option<&Arc<T>> {
        match self {
            Self::Unique(value) => Some(value),
            Self::Ambiguous => None,
        }
    }

    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous)
    }
}

///
/// TypeDefSnapshot
///

#[derive(Clone, Default)]
struct TypeDefSnapshot {
    by_id: Vec<Option<Arc<TypeDef>>>,
    by_name: HashMap<String, NameEntry<TypeDef>>,
}

impl TypeDefSnapshot {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            by_id: Vec::with_capacity(capacity),
            by_name: HashMap::new(),
        }
    }

    fn insert(&mut self, table_id: TableId, type_def: &Arc<TypeDef>) {
        let slot = usize::from(table_id);
        if self.by_id.len() <= slot {
            self.by_id.resize(slot + 1, None);
        }
        self.by_id[slot] = Some(Arc::clone(type_def));

        let exact = type_def.name();
        self.by_name
            .insert(exact.to_string(), NameEntry::Unique(Arc::clone(type_def)));

        for alias in [type_def.short_name(), type_def.lower_name()] {
            if alias != exact {
                self.insert_alias(alias, type_def);
            }
        }
    }

    /// Short and lower-case names are only unique while one type claims
    /// them. An exact-name owner always keeps its entry.
    fn insert_alias(&mut self, alias: &str, type_def: &Arc<TypeDef>) {
        let next = match self.by_name.get(alias) {
            None => NameEntry::Unique(Arc::clone(type_def)),
            Some(NameEntry::Unique(existing)) if existing.name() == type_def.name() => {
                NameEntry::Unique(Arc::clone(type_def))
            }
            Some(NameEntry::Unique(existing)) if existing.name() == alias => return,
            Some(_) => NameEntry::Ambiguous,
        };

        self.by_name.insert(alias.to_string(), next);
    }

    fn by_id(&self, table_id: TableId) -> Option<&Arc<TypeDef>> {
        self.by_id.get(usize::from(table_id))?.as_ref()
    }

    fn by_name(&self, name: &str) -> Option<&Arc<TypeDef>> {
        self.by_name.get(name)?.unique()
    }
}

///
/// BindingSnapshot
///

#[derive(Clone, Default)]
struct BindingSnapshot {
    by_id: Vec<Option<Arc<TypeBinding>>>,
    by_name: HashMap<String, Arc<TypeBinding>>,
}

impl BindingSnapshot {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            by_id: Vec::with_capacity(capacity),
            by_name: HashMap::new(),
        }
    }

    fn insert(&mut self, binding: &Arc<TypeBinding>) {
        let slot = usize::from(binding.table_id());
        if self.by_id.len() <= slot {
            self.by_id.resize(slot + 1, None);
        }
        self.by_id[slot] = Some(Arc::clone(binding));
        self.by_name
            .insert(binding.name().to_string(), Arc::clone(binding));
    }

    fn remove(&mut self, table_id: TableId, name: &str) {
        if let Some(slot) = self.by_id.get_mut(usize::from(table_id)) {
            *slot = None;
        }
        self.by_name.remove(name);
    }

    fn by_id(&self, table_id: TableId) -> Option<&Arc<TypeBinding>> {
        self.by_id.get(usize::from(table_id))?.as_ref()
    }
}

///
/// BindingRegistry
///
/// Owner of every registered `TypeDef` and every built `TypeBinding`.
///
/// Reads never block on a build: they clone the current snapshot and look
/// up in it. A miss takes the build lock, re-checks, builds through the
/// `BindingBuilder` and publishes a new snapshot, so racing callers all
/// observe the same `Arc<TypeBinding>`. Registration is single-writer.
///

pub struct BindingRegistry {
    catalog: Arc<TypeCatalog>,
    type_defs: Published<TypeDefSnapshot>,
    bindings: Published<BindingSnapshot>,
    build_lock: Mutex<()>,
    generation: AtomicU64,
    metrics: RegistryMetrics,
}

impl BindingRegistry {
    #[must_use]
    pub fn new(catalog: Arc<TypeCatalog>, config: &RegistryConfig) -> Self {
        let capacity = config.initial_id_capacity;

        Self {
            catalog,
            type_defs: Published::new(TypeDefSnapshot::with_capacity(capacity)),
            bindings: Published::new(BindingSnapshot::with_capacity(capacity)),
            build_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
            metrics: RegistryMetrics::default(),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn metrics(&self) -> &RegistryMetrics {
        &self.metrics
    }

    /// Bumped whenever a registration replaces an already registered table.
    /// Caches of resolved bindings are valid only within one generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Publish `type_defs` by id, exact name, short name and lower-case
    /// name. Bindings built from earlier definitions of the same tables
    /// are dropped and rebuilt on next use.
    #[instrument(
        name = "registry::register_type_defs",
        level = "debug",
        skip_all,
        fields(count = type_defs.len())
    )]
    pub fn register_type_defs(&self, type_defs: &[Arc<TypeDef>]) -> Result<(), Error> {
        let mut next = (*self.type_defs.load()).clone();
        let mut replaced = Vec::new();

        for type_def in type_defs {
            let table_id = type_def.table_id().ok_or_else(|| {
                Error::invariant(format!(
                    "type '{}' registered before its table was created",
                    type_def.name()
                ))
            })?;

            if let Some(previous) = next.by_id(table_id) {
                replaced.push((table_id, previous.name().to_string()));
            }
            next.insert(table_id, type_def);
            debug!(type_name = type_def.name(), table_id, "type registered");
        }

        self.type_defs.publish(next);

        if !replaced.is_empty() {
            let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
            let mut bindings = (*self.bindings.load()).clone();
            for (table_id, name) in &replaced {
                bindings.remove(*table_id, name);
            }
            self.bindings.publish(bindings);
            self.generation.fetch_add(1, Ordering::AcqRel);
        }

        self.metrics.record_registration(type_defs.len());

        Ok(())
    }

    // ------------------------------------------------------------------
    // TypeDef lookups
    // ------------------------------------------------------------------

    #[must_use]
    pub fn type_def(&self, table_id: TableId) -> Option<Arc<TypeDef>> {
        self.type_defs.load().by_id(table_id).cloned()
    }

    /// Exact, short or lower-case name; ambiguous names resolve to `None`.
    #[must_use]
    pub fn type_def_by_name(&self, name: &str) -> Option<Arc<TypeDef>> {
        self.type_defs.load().by_name(name).cloned()
    }

    #[must_use]
    pub fn type_def_by_name_insensitive(&self, name: &str) -> Option<Arc<TypeDef>> {
        let snapshot = self.type_defs.load();

        snapshot
            .by_name(name)
            .or_else(|| snapshot.by_name(&name.to_lowercase()))
            .cloned()
    }

    /// Every registered definition, ordered by table id.
    #[must_use]
    pub fn type_defs(&self) -> Vec<Arc<TypeDef>> {
        self.type_defs.load().by_id.iter().flatten().cloned().collect()
    }

    // ------------------------------------------------------------------
    // TypeBinding lookups
    // ------------------------------------------------------------------

    /// Binding of a registered table. An unknown id means the schema was
    /// used before it was registered.
    pub fn type_binding(&self, table_id: TableId) -> Result<Arc<TypeBinding>, Error> {
        if let Some(binding) = self.bindings.load().by_id(table_id) {
            return Ok(Arc::clone(binding));
        }

        let type_def = self.type_def(table_id).ok_or_else(|| {
            Error::schema_mismatch(
                format!("#{table_id}"),
                "no type is registered for this table id",
            )
        })?;

        self.build(type_def)
    }

    pub fn type_binding_by_name(&self, name: &str) -> Result<Option<Arc<TypeBinding>>, Error> {
        if let Some(binding) = self.bindings.load().by_name.get(name) {
            return Ok(Some(Arc::clone(binding)));
        }

        self.type_def_by_name(name)
            .map(|type_def| self.binding_for(type_def))
            .transpose()
    }

    pub fn type_binding_by_name_insensitive(
        &self,
        name: &str,
    ) -> Result<Option<Arc<TypeBinding>>, Error> {
        if let Some(binding) = self.bindings.load().by_name.get(name) {
            return Ok(Some(Arc::clone(binding)));
        }

        self.type_def_by_name_insensitive(name)
            .map(|type_def| self.binding_for(type_def))
            .transpose()
    }

    fn binding_for(&self, type_def: Arc<TypeDef>) -> Result<Arc<TypeBinding>, Error> {
        let cached = type_def
            .table_id()
            .and_then(|table_id| self.bindings.load().by_id(table_id).cloned());

        match cached {
            Some(binding) => Ok(binding),
            None => self.build(type_def),
        }
    }

    #[instrument(
        name = "registry::build",
        level = "debug",
        skip_all,
        fields(type_name = type_def.name())
    )]
    fn build(&self, type_def: Arc<TypeDef>) -> Result<Arc<TypeBinding>, Error> {
        let table_id = type_def.table_id().ok_or_else(|| {
            Error::invariant(format!(
                "type '{}' is not bound to a created table",
                type_def.name()
            ))
        })?;

        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(binding) = self.bindings.load().by_id(table_id) {
            self.metrics.record_lock_wait_resolved();
            return Ok(Arc::clone(binding));
        }

        let table_ids = self.table_ids(&type_def, table_id)?;
        let binding = Arc::new(BindingBuilder::new(&self.catalog).build(type_def, table_ids)?);

        let mut next = (*self.bindings.load()).clone();
        next.insert(&binding);
        self.bindings.publish(next);

        self.metrics.record_build();
        debug!(
            table_id,
            properties = binding.property_count(),
            "type binding built"
        );

        Ok(binding)
    }

    /// Own table id plus every base's, walking the base-name chain.
    fn table_ids(&self, type_def: &TypeDef, table_id: TableId) -> Result<Vec<TableId>, Error> {
        let snapshot = self.type_defs.load();
        let mut ids = vec![table_id];
        let mut base_name = type_def.base_name().map(str::to_string);

        while let Some(name) = base_name {
            let base = snapshot
                .by_name(&name)
                .filter(|base| base.name() == name)
                .ok_or_else(|| {
                    Error::schema_mismatch(
                        type_def.name(),
                        format!("base type '{name}' is not registered"),
                    )
                })?;

            let base_id = base.table_id().ok_or_else(|| {
                Error::invariant(format!("base type '{name}' has no table"))
            })?;
            if ids.contains(&base_id) {
                return Err(Error::invariant(format!(
                    "base chain of '{}' loops through '{name}'",
                    type_def.name()
                )));
            }

            ids.push(base_id);
            base_name = base.base_name().map(str::to_string);
        }

        ids.sort_unstable();

        Ok(ids)
    }
}

impl fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_defs = self.type_defs.load();
        let bindings = self.bindings.load();

        f.debug_struct("BindingRegistry")
            .field("type_defs", &type_defs.by_id.iter().flatten().count())
            .field("bindings", &bindings.by_id.iter().flatten().count())
            .field("metrics", &self.metrics.snapshot())
            .finish_non_exhaustive()
    }
}

///
/// TESTS
///
