/// Implements [`Shape`](crate::shape::Shape) for a struct from a field list.
///
/// Each field is written `name: Type = Access` where `Access` is a
/// [`FieldAccess`](crate::shape::FieldAccess) variant. Add `: Default` after the
/// type name to allow parameterless construction through `Default`.
///
/// ```
/// use rustcrud::impl_shape;
///
/// #[derive(Clone, Default)]
/// pub struct BookDto {
///     pub book_id: i64,
///     pub title: String,
/// }
///
/// impl_shape!(BookDto: Default {
///     book_id: i64 = PrivateSet,
///     title: String = Public,
/// });
/// ```
#[macro_export]
macro_rules! impl_shape {
    (@blank Default) => {
        fn blank() -> Option<Self> {
            Some(<Self as ::std::default::Default>::default())
        }
    };
    (@blank) => {};
    ($name:ident $(: $blank:ident)? {
        $($field:ident : $ty:ty = $access:ident),* $(,)?
    }) => {
        impl $crate::shape::Shape for $name {
            const TYPE_NAME: &'static str = stringify!($name);

            fn fields() -> &'static [$crate::shape::FieldInfo] {
                const FIELDS: &[$crate::shape::FieldInfo] = &[
                    $(
                        $crate::shape::FieldInfo::new(
                            stringify!($field),
                            <$ty as $crate::core::FieldType>::KIND,
                            <$ty as $crate::core::FieldType>::NULLABLE,
                            $crate::shape::FieldAccess::$access,
                        ),
                    )*
                ];
                FIELDS
            }

            #[allow(unused_variables)]
            fn get(&self, field: &str) -> Option<$crate::core::Value> {
                match field {
                    $(
                        stringify!($field) => Some($crate::core::FieldType::into_value(
                            ::std::clone::Clone::clone(&self.$field),
                        )),
                    )*
                    _ => None,
                }
            }

            #[allow(unused_variables)]
            fn set(
                &mut self,
                field: &str,
                value: $crate::core::Value,
            ) -> ::std::result::Result<(), $crate::core::FieldError> {
                match field {
                    $(
                        stringify!($field) => {
                            self.$field = <$ty as $crate::core::FieldType>::from_value(value)
                                .map_err(|e| e.for_field(field))?;
                            Ok(())
                        }
                    )*
                    _ => Err($crate::core::FieldError::Missing(field.to_string())),
                }
            }

            $crate::impl_shape!(@blank $($blank)?);
        }
    };
}
