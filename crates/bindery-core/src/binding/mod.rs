//! Runtime bindings: accessor families, the builder that specializes them
//! per type, and the registry that caches the results.

mod accessor;
mod builder;
mod catalog;
mod property;
mod registry;
mod snapshot;
mod type_binding;

pub use accessor::PropertyAccessor;
pub use builder::BindingBuilder;
pub use catalog::{EntityDescriptor, TypeCatalog};
pub use property::PropertyBinding;
pub use registry::{BindingRegistry, NameEntry};
pub use type_binding::TypeBinding;

#[cfg(test)]
pub(crate) use accessor::specialize;
#[cfg(test)]
pub(crate) use catalog::EntityLoader;
