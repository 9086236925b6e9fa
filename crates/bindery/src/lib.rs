//! Bindery maps compiled Rust types onto the tables of an in-memory,
//! column-oriented object database.
//!
//! ## Crate layout
//! - `primitives`: logical type codes and storage types.
//! - `schema`: column, property, table and type definitions; table upgrade.
//! - `binding`: accessor families, binding builder and registry.
//! - `dynamic`: runtime type discovery.
//! - `backend`: the storage seam and the in-memory reference backend.
//!
//! `Database` ties them together; `#[derive(Entity)]` generates the typed
//! field getters the bindings are specialized with.

pub use bindery_core as core;
pub use bindery_core::{
    Error, ErrorClass, backend, binding, config, dynamic, error, obs, schema, system, traits,
    types,
};
pub use bindery_derive::Entity;
pub use bindery_primitives as primitives;
pub use bindery_primitives::{DbTypeCode, StorageType};

mod db;

pub use db::{Database, SchemaLoad};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{Database, core::prelude::*};
}
