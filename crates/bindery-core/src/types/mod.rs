mod binary;
mod column_value;
mod object_ref;

pub use binary::{Binary, LargeBinary};
pub use column_value::ColumnValue;
pub use object_ref::ObjectRef;

/// Fixed-point decimal stored in `Decimal` columns.
pub type Decimal = rust_decimal::Decimal;

/// Calendar date and time stored in `DateTime` columns (no time zone).
pub type DateTime = chrono::NaiveDateTime;

/// Canonical text rendering used by string reads of `DateTime` properties.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
