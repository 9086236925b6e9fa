#[macro_export]
macro_rules! db_type_registry_entries {
    ($macro:ident $(, @args $($args:tt)+ )?) => {
        $macro! {
            $(
                @args $($args)+;
            )?
            @entries
            (Binary, label = "Binary", storage = Binary, family = NonNumeric, width = 0, is_reference = true),
            (Boolean, label = "Boolean", storage = Boolean, family = NonNumeric, width = 1, is_reference = false),
            (Byte, label = "Byte", storage = ULong, family = Unsigned, width = 8, is_reference = false),
            (DateTime, label = "DateTime", storage = DateTime, family = NonNumeric, width = 64, is_reference = false),
            (Decimal, label = "Decimal", storage = Decimal, family = Decimal, width = 128, is_reference = false),
            (Double, label = "Double", storage = Double, family = Float, width = 64, is_reference = false),
            (Int16, label = "Int16", storage = Long, family = Signed, width = 16, is_reference = false),
            (Int32, label = "Int32", storage = Long, family = Signed, width = 32, is_reference = false),
            (Int64, label = "Int64", storage = Long, family = Signed, width = 64, is_reference = false),
            (LargeBinary, label = "LargeBinary", storage = LargeBinary, family = NonNumeric, width = 0, is_reference = true),
            (Object, label = "Object", storage = Object, family = NonNumeric, width = 0, is_reference = true),
            (SByte, label = "SByte", storage = Long, family = Signed, width = 8, is_reference = false),
            (Single, label = "Single", storage = Single, family = Float, width = 32, is_reference = false),
            (String, label = "String", storage = String, family = NonNumeric, width = 0, is_reference = true),
            (UInt16, label = "UInt16", storage = ULong, family = Unsigned, width = 16, is_reference = false),
            (UInt32, label = "UInt32", storage = ULong, family = Unsigned, width = 32, is_reference = false),
            (UInt64, label = "UInt64", storage = ULong, family = Unsigned, width = 64, is_reference = false),
        }
    };
}

#[macro_export]
macro_rules! db_type_registry {
    ($macro:ident) => {
        $crate::db_type_registry_entries!($macro)
    };
    ($macro:ident, $($args:tt)+) => {
        $crate::db_type_registry_entries!($macro, @args $($args)+)
    };
}

macro_rules! metadata_from_registry {
    ( @args $code:expr; @entries $( ($variant:ident, label = $label:expr, storage = $storage:ident, family = $family:ident, width = $width:expr, is_reference = $is_reference:expr) ),* $(,)? ) => {
        match $code {
            $(
                $crate::DbTypeCode::$variant => $crate::DbTypeMetadata {
                    label: $label,
                    storage: $crate::StorageType::$storage,
                    family: $crate::NumericFamily::$family,
                    width: $width,
                    is_reference: $is_reference,
                },
            )*
        }
    };
}

macro_rules! all_codes_from_registry {
    ( @entries $( ($variant:ident, label = $label:expr, storage = $storage:ident, family = $family:ident, width = $width:expr, is_reference = $is_reference:expr) ),* $(,)? ) => {
        [ $( $crate::DbTypeCode::$variant ),* ]
    };
}
