use crate::schema::ColumnDef;
use bindery_primitives::DbTypeCode;
use std::ops::BitOr;

///
/// PropertyFlags
///
/// Special roles a property can play for dynamic type discovery.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct PropertyFlags(u8);

impl PropertyFlags {
    pub const NONE: Self = Self(0);

    /// The property holds the row's runtime type instance.
    pub const TYPE_REFERENCE: Self = Self(1);

    /// The property holds the base type's runtime type instance.
    pub const BASE_TYPE_REFERENCE: Self = Self(1 << 1);

    /// The property holds the type's full name.
    pub const TYPE_NAME: Self = Self(1 << 2);

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for PropertyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

///
/// PropertyDef
///
/// Declared property of a type. `column_name`, `column_index` and
/// `is_nullable` are back-filled from the table when the owning `TypeDef`
/// is built; a property without a column keeps `column_index == None`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertyDef {
    pub name: String,
    pub type_code: DbTypeCode,
    pub is_nullable: bool,
    pub target_type_name: Option<String>,
    pub column_name: Option<String>,
    pub column_index: Option<usize>,
    pub special_flags: PropertyFlags,
}

impl PropertyDef {
    /// Property stored in the same-named column.
    #[must_use]
    pub fn new(name: impl Into<String>, type_code: DbTypeCode) -> Self {
        let name = name.into();

        Self {
            column_name: Some(name.clone()),
            name,
            type_code,
            is_nullable: type_code.is_reference(),
            target_type_name: None,
            column_index: None,
            special_flags: PropertyFlags::NONE,
        }
    }

    #[must_use]
    pub const fn nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable || self.type_code.is_reference();
        self
    }

    #[must_use]
    pub fn with_target(mut self, target_type_name: impl Into<String>) -> Self {
        self.target_type_name = Some(target_type_name.into());
        self
    }

    #[must_use]
    pub fn with_column(mut self, column_name: impl Into<String>) -> Self {
        self.column_name = Some(column_name.into());
        self
    }

    #[must_use]
    pub fn without_column(mut self) -> Self {
        self.column_name = None;
        self
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: PropertyFlags) -> Self {
        self.special_flags = self.special_flags.union(flags);
        self
    }

    #[must_use]
    pub const fn has_flag(&self, flag: PropertyFlags) -> bool {
        self.special_flags.contains(flag)
    }

    /// Declaration-level equality: the mapping back-fill is ignored.
    #[must_use]
    pub fn same_declaration(&self, other: &Self) -> bool {
        self.name == other.name
            && self.type_code == other.type_code
            && self.target_type_name == other.target_type_name
            && self.special_flags == other.special_flags
    }

    pub(crate) fn bind_column(&mut self, index: usize, column: &ColumnDef) {
        self.column_name = Some(column.name.clone());
        self.column_index = Some(index);
        self.is_nullable = column.is_nullable;
    }

    pub(crate) fn unbind(&mut self) {
        self.column_index = None;
    }
}

///
/// TESTS
///
