#[macro_use]
mod macros;

pub use crate::schema::PropertyFlags;

use crate::types::{Binary, DateTime, Decimal, LargeBinary, ObjectRef};
use bindery_primitives::DbTypeCode;
use std::{any::Any, fmt};

// ============================================================================
// ENTITIES
// ============================================================================

///
/// Entity
///
/// A compiled type that can be bound to a table. Implemented by
/// `#[derive(Entity)]`, which generates one typed getter per field so the
/// binding layer never reflects over instances at runtime.
///

pub trait Entity: Any + Send + Sync + Sized {
    /// Full type name, as stored in the schema.
    const TYPE_NAME: &'static str;

    /// Full name of the base type, if any.
    const BASE_NAME: Option<&'static str> = None;

    /// Abstract types have a table but no constructible instances.
    const IS_ABSTRACT: bool = false;

    const HAS_ON_DELETE: bool = false;

    /// Field accessors in declaration order.
    fn fields() -> Vec<FieldAccessor<Self>>;

    /// Instance whose fields will be filled from a row, or `None` for
    /// abstract types.
    fn new_uninitialized() -> Option<Self>;

    /// Delete hook; only called when `HAS_ON_DELETE` is set.
    fn invoke_on_delete(&self) {}
}

///
/// OnDelete
///
/// User hook run before a row of the implementing entity is deleted.
/// Enabled per entity with `#[entity(on_delete)]`.
///

pub trait OnDelete {
    fn on_delete(&self);
}

///
/// DbEnum
///
/// A field-less enum stored through its primitive representation.
/// Fields of such types are marked `#[entity(enum_repr)]`.
///

pub trait DbEnum: Copy + 'static {
    type Repr: NativeValue;

    fn to_repr(self) -> Self::Repr;
}

// ============================================================================
// FIELDS
// ============================================================================

///
/// FieldShape
///
/// Declared type and nullability of one entity field, as seen by the
/// binding builder's verification step.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FieldShape {
    pub type_code: DbTypeCode,
    pub nullable: bool,
    pub is_enum: bool,
}

impl FieldShape {
    #[must_use]
    pub const fn scalar(type_code: DbTypeCode, nullable: bool) -> Self {
        Self {
            type_code,
            nullable,
            is_enum: false,
        }
    }

    #[must_use]
    pub const fn enumeration(type_code: DbTypeCode, nullable: bool) -> Self {
        Self {
            type_code,
            nullable,
            is_enum: true,
        }
    }
}

///
/// FieldMeta
///
/// Type-erased description of one entity field.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldMeta {
    pub name: &'static str,
    pub column: &'static str,
    pub shape: FieldShape,
    pub target_type: Option<&'static str>,
    pub flags: PropertyFlags,
}

///
/// FieldAccessor
///
/// Field metadata plus the compiled getter for entity `E`.
///

pub struct FieldAccessor<E> {
    pub meta: FieldMeta,
    pub getter: Getter<E>,
}

impl<E> FieldAccessor<E> {
    /// Accessor for a field stored in the same-named column.
    #[must_use]
    pub const fn new(name: &'static str, shape: FieldShape, getter: Getter<E>) -> Self {
        Self {
            meta: FieldMeta {
                name,
                column: name,
                shape,
                target_type: None,
                flags: PropertyFlags::NONE,
            },
            getter,
        }
    }

    #[must_use]
    pub const fn with_column(mut self, column: &'static str) -> Self {
        self.meta.column = column;
        self
    }

    #[must_use]
    pub const fn with_target(mut self, target_type: &'static str) -> Self {
        self.meta.target_type = Some(target_type);
        self
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: PropertyFlags) -> Self {
        self.meta.flags = self.meta.flags.union(flags);
        self
    }
}

impl<E> fmt::Debug for FieldAccessor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("meta", &self.meta)
            .field("getter", &self.getter)
            .finish()
    }
}

///
/// FieldType
///
/// Maps a field's Rust type onto its native value type and nullability.
/// Implemented for every native value type and for `Option` of each.
///

pub trait FieldType {
    type Native: NativeValue;

    const NULLABLE: bool;
    const SHAPE: FieldShape =
        FieldShape::scalar(<Self::Native as NativeValue>::TYPE_CODE, Self::NULLABLE);

    fn read(&self) -> Option<Self::Native>;
}

impl<T: NativeValue + Clone> FieldType for Option<T> {
    type Native = T;

    const NULLABLE: bool = true;

    fn read(&self) -> Option<T> {
        self.clone()
    }
}

impl_field_type!(copy: bool, u8, i8, i16, i32, i64, u16, u32, u64, f32, f64, Decimal, DateTime, ObjectRef);
impl_field_type!(clone: String, Binary, LargeBinary);

///
/// NativeValue
///
/// A value type with a dedicated accessor family.
///

pub trait NativeValue: Sized + 'static {
    const TYPE_CODE: DbTypeCode;

    /// Wrap a compiled field getter into the matching `Getter` variant.
    fn getter<E>(read: fn(&E) -> Option<Self>) -> Getter<E>;
}

native_values! {
    Binary => Binary,
    Boolean => bool,
    Byte => u8,
    DateTime => DateTime,
    Decimal => Decimal,
    Double => f64,
    Int16 => i16,
    Int32 => i32,
    Int64 => i64,
    LargeBinary => LargeBinary,
    Object => ObjectRef,
    SByte => i8,
    Single => f32,
    String => String,
    UInt16 => u16,
    UInt32 => u32,
    UInt64 => u64,
}

impl<E> Clone for Getter<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Getter<E> {}

impl<E> fmt::Debug for Getter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Getter").field(&self.type_code()).finish()
    }
}

///
/// TESTS
///
