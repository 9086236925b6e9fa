//! Declared and stored schema: column, property, table and type definitions,
//! plus loading and the table upgrade step that reconciles them.

mod column;
mod declare;
mod load;
mod property;
mod table;
mod type_def;
pub mod upgrade;

pub use column::ColumnDef;
pub use load::load_types;
pub use property::{PropertyDef, PropertyFlags};
pub use table::{TableDef, TableId};
pub use type_def::{TypeDef, TypeLoader};

/// Name of the identity column every table carries at index 0.
pub const IDENTITY_COLUMN: &str = "__id";

/// Prefix shared by all backend-reserved column names.
pub const RESERVED_PREFIX: &str = "__";

/// Prefix of built-in system type names.
pub const SYSTEM_PREFIX: &str = "System.";

#[must_use]
pub fn is_reserved_name(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}
