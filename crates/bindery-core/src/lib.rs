//! Core of the binding layer: schema model, accessor facade, binding
//! builder and registry, table upgrade, dynamic type discovery, and the
//! storage backend seam they all call into.

extern crate self as bindery;

// public exports are one module level down
pub mod backend;
pub mod binding;
pub mod config;
pub mod dynamic;
pub mod error;
pub mod obs;
pub mod schema;
pub mod system;
pub mod traits;
pub mod types;

// test
#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, ErrorClass};

///
/// Prelude
///
/// Vocabulary needed to declare entities and read bound properties.
///

pub mod prelude {
    pub use crate::{
        binding::{PropertyAccessor as _, TypeBinding, TypeCatalog},
        traits::{DbEnum, Entity, OnDelete},
        types::{Binary, DateTime, Decimal, LargeBinary, ObjectRef},
    };
    pub use bindery_derive::Entity;
}
