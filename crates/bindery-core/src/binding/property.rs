use crate::{
    binding::{BindingRegistry, PropertyAccessor, TypeBinding},
    error::Error,
};
use bindery_primitives::DbTypeCode;
use std::{
    fmt,
    ops::Deref,
    sync::{Arc, PoisonError, RwLock, Weak},
};

///
/// PropertyBinding
///
/// Bound property of one type: its position, its storage column and its
/// specialized accessor. Derefs to the accessor, so reads look like
/// `binding.get_int32(&instance)`.
///

pub struct PropertyBinding {
    data_index: Option<usize>,
    ordinal: usize,
    name: String,
    lower_name: String,
    type_code: DbTypeCode,
    is_nullable: bool,
    target_type_name: Option<String>,
    accessor: Box<dyn PropertyAccessor>,
    target_binding: RwLock<Option<(u64, Weak<TypeBinding>)>>,
}

impl PropertyBinding {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        data_index: Option<usize>,
        ordinal: usize,
        name: String,
        type_code: DbTypeCode,
        is_nullable: bool,
        target_type_name: Option<String>,
        accessor: Box<dyn PropertyAccessor>,
    ) -> Self {
        Self {
            data_index,
            ordinal,
            lower_name: name.to_lowercase(),
            name,
            type_code,
            is_nullable,
            target_type_name,
            accessor,
            target_binding: RwLock::new(None),
        }
    }

    /// Column index of the stored value, or `None` for column-less properties.
    #[must_use]
    pub const fn data_index(&self) -> Option<usize> {
        self.data_index
    }

    #[must_use]
    pub const fn ordinal(&self) -> usize {
        self.ordinal
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
    pub const fn type_code(&self) -> DbTypeCode {
        self.type_code
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.is_nullable
    }

    #[must_use]
    pub fn target_type_name(&self) -> Option<&str> {
        self.target_type_name.as_deref()
    }

    /// Binding of the type an `Object` property points at.
    ///
    /// Cached weakly, so the cache never keeps a binding alive past its
    /// registry, and only for the registry generation it was resolved in.
    pub fn target_type_binding(
        &self,
        registry: &BindingRegistry,
    ) -> Result<Option<Arc<TypeBinding>>, Error> {
        let Some(target) = self.target_type_name.as_deref() else {
            return Ok(None);
        };

        let generation = registry.generation();
        let cached = self
            .target_binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|(seen, _)| *seen == generation)
            .and_then(|(_, weak)| weak.upgrade());
        if let Some(binding) = cached {
            return Ok(Some(binding));
        }

        let binding = registry.type_binding_by_name(target)?.ok_or_else(|| {
            Error::schema_mismatch(
                target,
                format!("target of property '{}' is not registered", self.name),
            )
        })?;
        let mut slot = self
            .target_binding
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some((generation, Arc::downgrade(&binding)));
        drop(slot);

        Ok(Some(binding))
    }
}

impl Deref for PropertyBinding {
    type Target = dyn PropertyAccessor;

    fn deref(&self) -> &Self::Target {
        self.accessor.as_ref()
    }
}

impl fmt::Debug for PropertyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyBinding")
            .field("name", &self.name)
            .field("ordinal", &self.ordinal)
            .field("data_index", &self.data_index)
            .field("type_code", &self.type_code)
            .field("is_nullable", &self.is_nullable)
            .field("target_type_name", &self.target_type_name)
            .finish_non_exhaustive()
    }
}
