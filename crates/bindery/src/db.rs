use bindery_core::{
    Error,
    backend::StorageBackend,
    binding::{BindingRegistry, TypeCatalog},
    config::Config,
    dynamic::{self, DiscoveryReport},
    schema::{self, TypeDef},
    system,
};
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::{debug, info, instrument};

///
/// SchemaLoad
///
/// Outcome of one `Database::load_schema` call.
///

#[derive(Clone, Debug)]
pub struct SchemaLoad {
    /// Loaded definitions, bases first.
    pub type_defs: Vec<Arc<TypeDef>>,

    /// `None` when dynamic types are disabled.
    pub discovery: Option<DiscoveryReport>,
}

///
/// Database
///
/// Owns the binding registry for one storage backend. Opening installs the
/// system types; loading a schema declares, stores, registers and links
/// compiled types. Dropping or closing the database drops every binding.
/// Schema loads run one at a time; lookups never wait on them.
///

pub struct Database {
    backend: Arc<dyn StorageBackend>,
    registry: BindingRegistry,
    config: Config,
    load_lock: Mutex<()>,
}

impl Database {
    #[instrument(name = "database::open", level = "debug", skip_all)]
    pub fn open(
        backend: Arc<dyn StorageBackend>,
        mut catalog: TypeCatalog,
        config: Config,
    ) -> Result<Self, Error> {
        catalog.ensure_system_types();
        let catalog = Arc::new(catalog);

        let registry = BindingRegistry::new(Arc::clone(&catalog), &config.registry);
        let system_types = system::install(backend.as_ref(), &catalog, config.upgrade.enabled)?;
        registry.register_type_defs(&system_types)?;

        info!(types = catalog.len(), "database opened");

        Ok(Self {
            backend,
            registry,
            config,
            load_lock: Mutex::new(()),
        })
    }

    /// Open with configuration read from TOML.
    pub fn open_with_toml(
        backend: Arc<dyn StorageBackend>,
        catalog: TypeCatalog,
        config: &str,
    ) -> Result<Self, Error> {
        let config = Config::from_toml_str(config)?;

        Self::open(backend, catalog, config)
    }

    /// Load the named catalog types (and their bases), register them and
    /// link their runtime types.
    #[instrument(name = "database::load_schema", level = "debug", skip_all)]
    pub fn load_schema(&self, type_names: &[&str]) -> Result<SchemaLoad, Error> {
        // registration is single-writer
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let type_defs = schema::load_types(
            self.backend.as_ref(),
            self.registry.catalog(),
            type_names,
            self.config.upgrade.enabled,
        )?;
        self.registry.register_type_defs(&type_defs)?;

        let discovery = if self.config.dynamic_types.enabled {
            Some(dynamic::discover_new_types(
                &self.registry,
                self.backend.as_ref(),
                &type_defs,
            )?)
        } else {
            None
        };
        debug!(loaded = type_defs.len(), "schema loaded");

        Ok(SchemaLoad {
            type_defs,
            discovery,
        })
    }

    /// Load every non-system type in the catalog.
    pub fn load_catalog(&self) -> Result<SchemaLoad, Error> {
        let names: Vec<&str> = self
            .registry
            .catalog()
            .type_names()
            .into_iter()
            .filter(|name| !name.starts_with(schema::SYSTEM_PREFIX))
            .collect();

        self.load_schema(&names)
    }

    #[must_use]
    pub const fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    #[must_use]
    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Drop the registry and every binding it holds.
    pub fn close(self) {
        info!(metrics = ?self.registry.metrics().snapshot(), "database closed");
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

///
/// TESTS
///
