macro_rules! impl_field_type {
    (copy: $( $type:ty ),* $(,)?) => {
        $(
            impl FieldType for $type {
                type Native = Self;

                const NULLABLE: bool = false;

                fn read(&self) -> Option<Self> {
                    Some(*self)
                }
            }
        )*
    };
    (clone: $( $type:ty ),* $(,)?) => {
        $(
            impl FieldType for $type {
                type Native = Self;

                const NULLABLE: bool = false;

                fn read(&self) -> Option<Self> {
                    Some(self.clone())
                }
            }
        )*
    };
}

macro_rules! native_values {
    ( $( $variant:ident => $native:ty ),* $(,)? ) => {
        ///
        /// Getter
        ///
        /// Compiled field getter, tagged by native value type. `None` is a
        /// null value.
        ///

        pub enum Getter<E> {
            $( $variant(fn(&E) -> Option<$native>), )*
        }

        impl<E> Getter<E> {
            #[must_use]
            pub const fn type_code(&self) -> DbTypeCode {
                match self {
                    $( Self::$variant(_) => DbTypeCode::$variant, )*
                }
            }
        }

        $(
            impl NativeValue for $native {
                const TYPE_CODE: DbTypeCode = DbTypeCode::$variant;

                fn getter<E>(read: fn(&E) -> Option<Self>) -> Getter<E> {
                    Getter::$variant(read)
                }
            }
        )*
    };
}
