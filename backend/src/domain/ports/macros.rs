//! `define_port_error!`: generates a `thiserror` enum for a driven port plus
//! one snake_case constructor per variant.
//!
//! Struct-variant fields are accepted as `impl Into<T>` so call sites can
//! pass `&str` where the variant stores a `String`.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        ::paste::paste! {
            impl $name {
                $(
                    #[doc = concat!("Build [`", stringify!($name), "::", stringify!($variant), "`].")]
                    pub fn [<$variant:snake>]( $( $( $field: impl Into<$ty> ),* )? ) -> Self {
                        Self::$variant $( { $( $field: $field.into() ),* } )?
                    }
                )*
            }
        }
    };
}

pub(crate) use define_port_error;
