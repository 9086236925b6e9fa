use crate::types::{Binary, DateTime, Decimal, LargeBinary, ObjectRef};
use bindery_primitives::StorageType;
use derive_more::From;

///
/// ColumnValue
///
/// Dynamically typed column cell exchanged with the storage backend.
/// Integer widths are already collapsed onto `Int` / `UInt`.
///

#[derive(Clone, Debug, Default, From, PartialEq)]
pub enum ColumnValue {
    #[default]
    #[from(ignore)]
    Null,
    Boolean(bool),
    Int(i64),
    UInt(u64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    DateTime(DateTime),
    String(String),
    Binary(Binary),
    LargeBinary(LargeBinary),
    Object(ObjectRef),
}

impl ColumnValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Return whether this cell can be stored in a column of `storage`.
    /// `Null` fits every column; nullability is checked by the backend.
    #[must_use]
    pub const fn fits(&self, storage: StorageType) -> bool {
        matches!(
            (self, storage),
            (Self::Null, _)
                | (Self::Boolean(_), StorageType::Boolean)
                | (Self::Int(_), StorageType::Long)
                | (Self::UInt(_), StorageType::ULong | StorageType::Key)
                | (Self::Single(_), StorageType::Single)
                | (Self::Double(_), StorageType::Double)
                | (Self::Decimal(_), StorageType::Decimal)
                | (Self::DateTime(_), StorageType::DateTime)
                | (Self::String(_), StorageType::String)
                | (Self::Binary(_), StorageType::Binary)
                | (Self::LargeBinary(_), StorageType::LargeBinary)
                | (Self::Object(_), StorageType::Object)
        )
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<ObjectRef> {
        match self {
            Self::Object(object) => Some(*object),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl<T: Into<Self>> From<Option<T>> for ColumnValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

///
/// TESTS
///
