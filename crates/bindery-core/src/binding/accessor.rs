use crate::{
    error::Error,
    traits::{Entity, Getter},
    types::{Binary, DATE_TIME_FORMAT, DateTime, Decimal, LargeBinary, ObjectRef},
};
use bindery_primitives::DbTypeCode;
use std::any::Any;

macro_rules! unsupported_getters {
    ( $( $method:ident => $code:ident : $native:ty ),* $(,)? ) => {
        $(
            fn $method(&self, _instance: &dyn Any) -> Result<Option<$native>, Error> {
                Err(Error::UnsupportedConversion {
                    from: self.type_code(),
                    to: DbTypeCode::$code,
                })
            }
        )*
    };
}

///
/// PropertyAccessor
///
/// Typed, conversion-checked reads of one property. Every getter rejects
/// the read unless the property's family overrides it; `None` is a null
/// value.
///

pub trait PropertyAccessor: Send + Sync {
    fn type_code(&self) -> DbTypeCode;

    /// Render the value as text. Every family answers this one.
    fn get_string(&self, instance: &dyn Any) -> Result<Option<String>, Error>;

    unsupported_getters! {
        get_binary => Binary: Binary,
        get_boolean => Boolean: bool,
        get_byte => Byte: u8,
        get_date_time => DateTime: DateTime,
        get_decimal => Decimal: Decimal,
        get_double => Double: f64,
        get_int16 => Int16: i16,
        get_int32 => Int32: i32,
        get_int64 => Int64: i64,
        get_large_binary => LargeBinary: LargeBinary,
        get_object => Object: ObjectRef,
        get_sbyte => SByte: i8,
        get_single => Single: f32,
        get_uint16 => UInt16: u16,
        get_uint32 => UInt32: u32,
        get_uint64 => UInt64: u64,
    }
}

fn downcast<E: Entity>(instance: &dyn Any) -> Result<&E, Error> {
    instance
        .downcast_ref::<E>()
        .ok_or(Error::InstanceTypeMismatch {
            expected: E::TYPE_NAME,
        })
}

macro_rules! accessor_family {
    (
        $family:ident : $code:ident => $native:ty,
        own = $own:ident,
        widen = [ $( $wide:ident => $wide_ty:ty ),* $(,)? ],
        render = $render:expr $(,)?
    ) => {
        pub(crate) struct $family<E> {
            read: fn(&E) -> Option<$native>,
        }

        impl<E: Entity> $family<E> {
            pub(crate) const fn new(read: fn(&E) -> Option<$native>) -> Self {
                Self { read }
            }

            fn value(&self, instance: &dyn Any) -> Result<Option<$native>, Error> {
                Ok((self.read)(downcast::<E>(instance)?))
            }
        }

        impl<E: Entity> PropertyAccessor for $family<E> {
            fn type_code(&self) -> DbTypeCode {
                DbTypeCode::$code
            }

            fn $own(&self, instance: &dyn Any) -> Result<Option<$native>, Error> {
                self.value(instance)
            }

            $(
                fn $wide(&self, instance: &dyn Any) -> Result<Option<$wide_ty>, Error> {
                    Ok(self.value(instance)?.map(<$wide_ty>::from))
                }
            )*

            fn get_string(&self, instance: &dyn Any) -> Result<Option<String>, Error> {
                Ok(self.value(instance)?.map($render))
            }
        }
    };
}

accessor_family!(
    BinaryAccessor: Binary => Binary,
    own = get_binary,
    widen = [],
    render = |v: Binary| v.to_string(),
);
accessor_family!(
    BooleanAccessor: Boolean => bool,
    own = get_boolean,
    widen = [],
    render = |v: bool| v.to_string(),
);
accessor_family!(
    ByteAccessor: Byte => u8,
    own = get_byte,
    widen = [get_uint16 => u16, get_uint32 => u32, get_uint64 => u64],
    render = |v: u8| v.to_string(),
);
accessor_family!(
    DateTimeAccessor: DateTime => DateTime,
    own = get_date_time,
    widen = [],
    render = |v: DateTime| v.format(DATE_TIME_FORMAT).to_string(),
);
accessor_family!(
    DecimalAccessor: Decimal => Decimal,
    own = get_decimal,
    widen = [],
    render = |v: Decimal| v.to_string(),
);
accessor_family!(
    DoubleAccessor: Double => f64,
    own = get_double,
    widen = [],
    render = |v: f64| v.to_string(),
);
accessor_family!(
    Int16Accessor: Int16 => i16,
    own = get_int16,
    widen = [get_int32 => i32, get_int64 => i64],
    render = |v: i16| v.to_string(),
);
accessor_family!(
    Int32Accessor: Int32 => i32,
    own = get_int32,
    widen = [get_int64 => i64],
    render = |v: i32| v.to_string(),
);
accessor_family!(
    Int64Accessor: Int64 => i64,
    own = get_int64,
    widen = [],
    render = |v: i64| v.to_string(),
);
accessor_family!(
    LargeBinaryAccessor: LargeBinary => LargeBinary,
    own = get_large_binary,
    widen = [],
    render = |v: LargeBinary| v.to_string(),
);
accessor_family!(
    ObjectAccessor: Object => ObjectRef,
    own = get_object,
    widen = [],
    render = |v: ObjectRef| v.object_id.to_string(),
);
accessor_family!(
    SByteAccessor: SByte => i8,
    own = get_sbyte,
    widen = [get_int16 => i16, get_int32 => i32, get_int64 => i64],
    render = |v: i8| v.to_string(),
);
accessor_family!(
    SingleAccessor: Single => f32,
    own = get_single,
    widen = [get_double => f64],
    render = |v: f32| v.to_string(),
);
accessor_family!(
    UInt16Accessor: UInt16 => u16,
    own = get_uint16,
    widen = [get_uint32 => u32, get_uint64 => u64],
    render = |v: u16| v.to_string(),
);
accessor_family!(
    UInt32Accessor: UInt32 => u32,
    own = get_uint32,
    widen = [get_uint64 => u64],
    render = |v: u32| v.to_string(),
);
accessor_family!(
    UInt64Accessor: UInt64 => u64,
    own = get_uint64,
    widen = [],
    render = |v: u64| v.to_string(),
);

// String is its own rendering, so it is the one family written out by hand.
pub(crate) struct StringAccessor<E> {
    read: fn(&E) -> Option<String>,
}

impl<E: Entity> StringAccessor<E> {
    pub(crate) const fn new(read: fn(&E) -> Option<String>) -> Self {
        Self { read }
    }
}

impl<E: Entity> PropertyAccessor for StringAccessor<E> {
    fn type_code(&self) -> DbTypeCode {
        DbTypeCode::String
    }

    fn get_string(&self, instance: &dyn Any) -> Result<Option<String>, Error> {
        Ok((self.read)(downcast::<E>(instance)?))
    }
}

/// Wire a compiled getter into the accessor family of its type code.
pub(crate) fn specialize<E: Entity>(getter: Getter<E>) -> Box<dyn PropertyAccessor> {
    match getter {
        Getter::Binary(read) => Box::new(BinaryAccessor::new(read)),
        Getter::Boolean(read) => Box::new(BooleanAccessor::new(read)),
        Getter::Byte(read) => Box::new(ByteAccessor::new(read)),
        Getter::DateTime(read) => Box::new(DateTimeAccessor::new(read)),
        Getter::Decimal(read) => Box::new(DecimalAccessor::new(read)),
        Getter::Double(read) => Box::new(DoubleAccessor::new(read)),
        Getter::Int16(read) => Box::new(Int16Accessor::new(read)),
        Getter::Int32(read) => Box::new(Int32Accessor::new(read)),
        Getter::Int64(read) => Box::new(Int64Accessor::new(read)),
        Getter::LargeBinary(read) => Box::new(LargeBinaryAccessor::new(read)),
        Getter::Object(read) => Box::new(ObjectAccessor::new(read)),
        Getter::SByte(read) => Box::new(SByteAccessor::new(read)),
        Getter::Single(read) => Box::new(SingleAccessor::new(read)),
        Getter::String(read) => Box::new(StringAccessor::new(read)),
        Getter::UInt16(read) => Box::new(UInt16Accessor::new(read)),
        Getter::UInt32(read) => Box::new(UInt32Accessor::new(read)),
        Getter::UInt64(read) => Box::new(UInt64Accessor::new(read)),
    }
}

///
/// TESTS
///
