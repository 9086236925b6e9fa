#[macro_use]
mod macros;

use std::fmt::{self, Display};

///
/// DbTypeCode
///
/// Logical type tag of one property. Every tag maps onto exactly one native
/// column storage type through the registry.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum DbTypeCode {
    Binary,
    Boolean,
    Byte,
    DateTime,
    Decimal,
    Double,
    Int16,
    Int32,
    Int64,
    LargeBinary,
    Object,
    SByte,
    Single,
    String,
    UInt16,
    UInt32,
    UInt64,
}

impl DbTypeCode {
    /// Return the full metadata descriptor for one type code.
    #[must_use]
    pub const fn metadata(self) -> DbTypeMetadata {
        db_type_registry!(metadata_from_registry, self)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        self.metadata().label
    }

    /// Return the native column storage type backing this type code.
    #[must_use]
    pub const fn storage_type(self) -> StorageType {
        self.metadata().storage
    }

    #[must_use]
    pub const fn numeric_family(self) -> NumericFamily {
        self.metadata().family
    }

    /// Reference types are always stored in nullable columns.
    #[must_use]
    pub const fn is_reference(self) -> bool {
        self.metadata().is_reference
    }

    /// Return whether a value of this type can be read losslessly as `target`.
    ///
    /// Widening stays inside one numeric family and never narrows; the
    /// identity conversion is always allowed.
    #[must_use]
    pub const fn widens_to(self, target: Self) -> bool {
        if self as u8 == target as u8 {
            return true;
        }

        let from = self.metadata();
        let to = target.metadata();

        match (from.family, to.family) {
            (NumericFamily::Signed, NumericFamily::Signed)
            | (NumericFamily::Unsigned, NumericFamily::Unsigned)
            | (NumericFamily::Float, NumericFamily::Float) => to.width >= from.width,
            _ => false,
        }
    }
}

impl Display for DbTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

///
/// DbTypeMetadata
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DbTypeMetadata {
    pub label: &'static str,
    pub storage: StorageType,
    pub family: NumericFamily,
    pub width: u8,
    pub is_reference: bool,
}

///
/// NumericFamily
///
/// Widening only ever happens between members of the same family.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NumericFamily {
    Signed,
    Unsigned,
    Float,
    Decimal,
    NonNumeric,
}

///
/// StorageType
///
/// Native column storage tag. Integer widths collapse onto `Long` and
/// `ULong`; `Key` is reserved for the identity column.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StorageType {
    Key,
    Boolean,
    Long,
    ULong,
    Decimal,
    Single,
    Double,
    String,
    Binary,
    LargeBinary,
    Object,
    DateTime,
}

impl StorageType {
    /// Runtime type code assumed for a column no property maps.
    #[must_use]
    pub const fn default_type_code(self) -> DbTypeCode {
        match self {
            Self::Key | Self::ULong => DbTypeCode::UInt64,
            Self::Boolean => DbTypeCode::Boolean,
            Self::Long => DbTypeCode::Int64,
            Self::Decimal => DbTypeCode::Decimal,
            Self::Single => DbTypeCode::Single,
            Self::Double => DbTypeCode::Double,
            Self::String => DbTypeCode::String,
            Self::Binary => DbTypeCode::Binary,
            Self::LargeBinary => DbTypeCode::LargeBinary,
            Self::Object => DbTypeCode::Object,
            Self::DateTime => DbTypeCode::DateTime,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Key => "Key",
            Self::Boolean => "Boolean",
            Self::Long => "Long",
            Self::ULong => "ULong",
            Self::Decimal => "Decimal",
            Self::Single => "Single",
            Self::Double => "Double",
            Self::String => "String",
            Self::Binary => "Binary",
            Self::LargeBinary => "LargeBinary",
            Self::Object => "Object",
            Self::DateTime => "DateTime",
        }
    }
}

impl Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered list of all type codes in registry order.
pub const ALL_DB_TYPE_CODES: [DbTypeCode; 17] = db_type_registry!(all_codes_from_registry);

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn integer_codes_collapse_onto_long_and_ulong() {
        for code in [
            DbTypeCode::SByte,
            DbTypeCode::Int16,
            DbTypeCode::Int32,
            DbTypeCode::Int64,
        ] {
            assert_eq!(code.storage_type(), StorageType::Long, "{code}");
        }
        for code in [
            DbTypeCode::Byte,
            DbTypeCode::UInt16,
            DbTypeCode::UInt32,
            DbTypeCode::UInt64,
        ] {
            assert_eq!(code.storage_type(), StorageType::ULong, "{code}");
        }
    }

    #[test]
    fn reference_types_are_exactly_the_nullable_storage_kinds() {
        let references: Vec<_> = ALL_DB_TYPE_CODES
            .into_iter()
            .filter(|code| code.is_reference())
            .collect();

        assert_eq!(
            references,
            vec![
                DbTypeCode::Binary,
                DbTypeCode::LargeBinary,
                DbTypeCode::Object,
                DbTypeCode::String,
            ]
        );
    }

    #[test]
    fn widening_table_matches_accessor_families() {
        assert!(DbTypeCode::Int16.widens_to(DbTypeCode::Int32));
        assert!(DbTypeCode::Int16.widens_to(DbTypeCode::Int64));
        assert!(DbTypeCode::Byte.widens_to(DbTypeCode::UInt64));
        assert!(DbTypeCode::Single.widens_to(DbTypeCode::Double));

        assert!(!DbTypeCode::Int64.widens_to(DbTypeCode::Int32));
        assert!(!DbTypeCode::Byte.widens_to(DbTypeCode::Int16));
        assert!(!DbTypeCode::Double.widens_to(DbTypeCode::Single));
        assert!(!DbTypeCode::Int32.widens_to(DbTypeCode::Double));
        assert!(!DbTypeCode::Decimal.widens_to(DbTypeCode::Double));
        assert!(!DbTypeCode::Boolean.widens_to(DbTypeCode::Byte));
    }

    #[test]
    fn labels_follow_variant_names() {
        for code in ALL_DB_TYPE_CODES {
            assert_eq!(code.label(), format!("{code:?}"));
        }
    }

    #[test]
    fn default_code_round_trips_through_storage() {
        for code in ALL_DB_TYPE_CODES {
            let storage = code.storage_type();
            assert_eq!(storage.default_type_code().storage_type(), storage);
        }
    }

    fn any_code() -> impl Strategy<Value = DbTypeCode> {
        prop::sample::select(ALL_DB_TYPE_CODES.to_vec())
    }

    proptest! {
        #[test]
        fn widening_never_narrows(from in any_code(), to in any_code()) {
            if from != to && from.widens_to(to) {
                prop_assert_eq!(from.numeric_family(), to.numeric_family());
                prop_assert!(to.metadata().width > from.metadata().width);
                prop_assert!(!to.widens_to(from));
            }
        }

        #[test]
        fn widening_is_transitive(a in any_code(), b in any_code(), c in any_code()) {
            if a.widens_to(b) && b.widens_to(c) {
                prop_assert!(a.widens_to(c));
            }
        }
    }
}
