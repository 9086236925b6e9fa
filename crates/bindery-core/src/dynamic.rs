//! Dynamic type discovery: links every stored type to the row that
//! represents it at runtime, creating that row on first sight.

use crate::{
    backend::StorageBackend,
    binding::{BindingRegistry, TypeBinding},
    error::Error,
    schema::{PropertyFlags, TypeDef},
    system,
    types::{ColumnValue, ObjectRef},
};
use bindery_primitives::DbTypeCode;
use std::sync::Arc;
use tracing::{debug, instrument};

///
/// DiscoveryReport
///
/// Types linked by one discovery run, by outcome. Types that were already
/// linked before the run are not listed.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DiscoveryReport {
    pub created: Vec<String>,
    pub reused: Vec<String>,
}

impl DiscoveryReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.reused.is_empty()
    }
}

/// Link every non-system type in `type_defs` (and its bases, first) to its
/// runtime type instance.
///
/// An instance already recorded on the type's raw view row is reused;
/// otherwise one is inserted, either of the type's own declared runtime
/// type or of `System.AutoCreatedType`. Running discovery again is a no-op.
#[instrument(
    name = "dynamic::discover_new_types",
    level = "debug",
    skip_all,
    fields(count = type_defs.len())
)]
pub fn discover_new_types(
    registry: &BindingRegistry,
    backend: &dyn StorageBackend,
    type_defs: &[Arc<TypeDef>],
) -> Result<DiscoveryReport, Error> {
    let raw_view = registry
        .type_def_by_name(system::RAW_VIEW)
        .ok_or_else(|| Error::schema_mismatch(system::RAW_VIEW, "system type is not registered"))?;
    let auto_type_column = column_of(&raw_view, system::AUTO_TYPE_INSTANCE)?;

    let mut discovery = Discovery {
        registry,
        backend,
        auto_type_column,
        report: DiscoveryReport::default(),
        visiting: Vec::new(),
    };

    for type_def in type_defs.iter().filter(|def| !def.is_system()) {
        discovery.link(type_def)?;
    }

    Ok(discovery.report)
}

struct Discovery<'a> {
    registry: &'a BindingRegistry,
    backend: &'a dyn StorageBackend,
    auto_type_column: usize,
    report: DiscoveryReport,
    visiting: Vec<String>,
}

impl Discovery<'_> {
    fn link(&mut self, type_def: &TypeDef) -> Result<Option<ObjectRef>, Error> {
        if type_def.is_system() {
            return Ok(None);
        }
        if let Some(linked) = type_def.runtime_default_type_ref() {
            return Ok(Some(linked));
        }
        if self.visiting.iter().any(|name| name == type_def.name()) {
            return Err(Error::invariant(format!(
                "base chain of '{}' loops back to itself",
                type_def.name()
            )));
        }

        self.visiting.push(type_def.name().to_string());
        let base_ref = match self.base_of(type_def)? {
            Some(base) => self.link(&base),
            None => Ok(None),
        };
        self.visiting.pop();
        let base_ref = base_ref?;

        let declared_type = self.declared_runtime_type(type_def)?;

        let raw_view = self.backend.find_raw_view(type_def.name())?.ok_or_else(|| {
            Error::invariant(format!("type '{}' has no raw view row", type_def.name()))
        })?;

        let type_ref = match self.recorded_instance(raw_view)? {
            Some(existing) => {
                if let Some(target) = &declared_type {
                    self.check_not_refactored(type_def, existing, target)?;
                }
                debug!(type_name = type_def.name(), %existing, "runtime type reused");
                self.report.reused.push(type_def.name().to_string());

                existing
            }
            None => {
                let created = self.materialize(type_def, declared_type, base_ref)?;
                self.backend.write_column(
                    raw_view,
                    self.auto_type_column,
                    ColumnValue::Object(created),
                )?;
                debug!(type_name = type_def.name(), %created, "runtime type created");
                self.report.created.push(type_def.name().to_string());

                created
            }
        };

        type_def.set_runtime_default_type_ref(type_ref)?;

        Ok(Some(type_ref))
    }

    fn base_of(&self, type_def: &TypeDef) -> Result<Option<Arc<TypeDef>>, Error> {
        let Some(base_name) = type_def.base_name() else {
            return Ok(None);
        };

        self.registry
            .type_def_by_name(base_name)
            .filter(|base| base.name() == base_name)
            .map(Some)
            .ok_or_else(|| {
                Error::schema_mismatch(
                    type_def.name(),
                    format!("base type '{base_name}' is not registered"),
                )
            })
    }

    /// Binding of the runtime type the user declared for `type_def`, if any.
    fn declared_runtime_type(&self, type_def: &TypeDef) -> Result<Option<Arc<TypeBinding>>, Error> {
        let Some(index) = type_def
            .property_defs()
            .iter()
            .position(|p| p.has_flag(PropertyFlags::TYPE_REFERENCE))
        else {
            return Ok(None);
        };

        if !self.is_user_declared(type_def, index)? {
            return Ok(None);
        }

        let property = &type_def.property_defs()[index];
        let target = property.target_type_name.as_deref().ok_or_else(|| {
            Error::schema_mismatch(
                type_def.name(),
                format!("type reference '{}' names no target type", property.name),
            )
        })?;

        self.registry
            .type_binding_by_name(target)?
            .map(Some)
            .ok_or_else(|| {
                Error::schema_mismatch(
                    type_def.name(),
                    format!("type reference target '{target}' is not registered"),
                )
            })
    }

    /// A type reference is user-declared unless it comes from a system type.
    /// One inherited unchanged at the same position belongs to the base.
    fn is_user_declared(&self, type_def: &TypeDef, index: usize) -> Result<bool, Error> {
        if type_def.is_system() {
            return Ok(false);
        }
        let Some(base) = self.base_of(type_def)? else {
            return Ok(true);
        };

        let property = &type_def.property_defs()[index];
        match base.property_defs().get(index) {
            Some(inherited) if inherited.same_declaration(property) => {
                self.is_user_declared(&base, index)
            }
            _ => Ok(true),
        }
    }

    fn recorded_instance(&self, raw_view: ObjectRef) -> Result<Option<ObjectRef>, Error> {
        match self.backend.read_column(raw_view, self.auto_type_column)? {
            ColumnValue::Null => Ok(None),
            ColumnValue::Object(existing) => Ok(Some(existing)),
            other => Err(Error::invariant(format!(
                "raw view {raw_view} holds {other:?} as its runtime type"
            ))),
        }
    }

    fn check_not_refactored(
        &self,
        type_def: &TypeDef,
        existing: ObjectRef,
        target: &TypeBinding,
    ) -> Result<(), Error> {
        let row_table = self.backend.row_table_id(existing)?;

        // a row whose table is not registered in this session cannot be the target type
        let compatible = row_table == target.table_id()
            || (self.registry.type_def(row_table).is_some()
                && self
                    .registry
                    .type_binding(row_table)?
                    .is_type_or_subtype(target.table_id()));

        if compatible {
            Ok(())
        } else {
            Err(Error::UnsupportedTypeRefactoring {
                type_name: type_def.name().to_string(),
            })
        }
    }

    /// Insert and stamp a fresh runtime type row.
    fn materialize(
        &self,
        type_def: &TypeDef,
        declared_type: Option<Arc<TypeBinding>>,
        base_ref: Option<ObjectRef>,
    ) -> Result<ObjectRef, Error> {
        let binding = match declared_type {
            Some(binding) => binding,
            None => self
                .registry
                .type_binding_by_name(system::AUTO_CREATED_TYPE)?
                .ok_or_else(|| {
                    Error::schema_mismatch(system::AUTO_CREATED_TYPE, "system type is not registered")
                })?,
        };

        if binding.new_uninitialized_instance().is_none() {
            return Err(Error::schema_mismatch(
                type_def.name(),
                format!("runtime type '{}' is abstract", binding.name()),
            ));
        }

        let row_type = binding.type_def();
        let object = self.backend.insert_row(binding.table_id())?;

        if let Some(column) =
            role_column(row_type, PropertyFlags::TYPE_NAME, system::NAME, DbTypeCode::String)
        {
            self.backend.write_column(
                object,
                column,
                ColumnValue::String(type_def.name().to_string()),
            )?;
        }
        if let Some(column) =
            role_column(row_type, PropertyFlags::NONE, system::IS_TYPE, DbTypeCode::Boolean)
        {
            self.backend
                .write_column(object, column, ColumnValue::Boolean(true))?;
        }
        if let Some(base_ref) = base_ref
            && let Some(column) = role_column(
                row_type,
                PropertyFlags::BASE_TYPE_REFERENCE,
                system::INHERITS,
                DbTypeCode::Object,
            )
        {
            self.backend
                .write_column(object, column, ColumnValue::Object(base_ref))?;
        }

        Ok(object)
    }
}

fn column_of(type_def: &TypeDef, property: &str) -> Result<usize, Error> {
    type_def
        .property_def(property)
        .and_then(|p| p.column_index)
        .ok_or_else(|| {
            Error::schema_mismatch(type_def.name(), format!("property '{property}' is not stored"))
        })
}

/// Column of the property playing `flag`, falling back to a property named
/// `fallback` of type `code`.
fn role_column(
    type_def: &TypeDef,
    flag: PropertyFlags,
    fallback: &str,
    code: DbTypeCode,
) -> Option<usize> {
    let flagged = (!flag.is_empty())
        .then(|| type_def.property_defs().iter().find(|p| p.has_flag(flag)))
        .flatten();

    flagged
        .or_else(|| type_def.property_def(fallback))
        .filter(|p| p.type_code == code)
        .and_then(|p| p.column_index)
}

///
/// TESTS
///
