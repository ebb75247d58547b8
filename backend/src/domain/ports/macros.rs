//! `define_port_error!`: port error enums with `impl Into` constructors.
//!
//! Each variant gets a snake-case constructor, so adapters can write
//! `MigrationStoreError::step(revision, err.to_string())`, and the enum gets
//! `kind()`, the same snake-case name, for use as a log field.

macro_rules! define_port_error {
    (@constructor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@constructor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@fields $variant [] [] $( $field : $ty, )*);
    };

    // Accumulates `field: impl Into<T>` parameters and `field: field.into()`
    // initialisers one field at a time.
    (@fields $variant:ident [$($params:tt)*] [$($inits:tt)*]) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@fields $variant:ident [$($params:tt)*] [$($inits:tt)*] $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @fields $variant
            [$($params)* $field: impl Into<$ty>,]
            [$($inits)* $field: $field.into(),]
            $($rest)*
        );
    };

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

        impl $name {
            $(
                define_port_error!(@constructor $variant $( { $($field : $ty),* } )?);
            )*

            /// Snake-case name of the variant.
            pub fn kind(&self) -> &'static str {
                match self {
                    $(
                        Self::$variant { .. } => ::paste::paste! { stringify!([<$variant:snake>]) },
                    )*
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::domain::ports::{DatabaseProbeError, MigrationStoreError, RealtimeBackendError};

    define_port_error! {
        pub enum ProbePortError {
            Timeout => "probe timed out",
            Refused { attempts: u32 } => "refused after {attempts} attempts",
        }
    }

    #[rstest]
    fn constructors_accept_str_for_string_fields() {
        let err = DatabaseProbeError::unavailable("connection refused");
        assert_eq!(err.to_string(), "database unavailable: connection refused");
    }

    #[rstest]
    fn constructors_support_several_fields() {
        let err = MigrationStoreError::step("00000001", "relation exists");
        assert_eq!(err.to_string(), "revision 00000001 failed: relation exists");
        assert_eq!(
            err,
            MigrationStoreError::Step {
                revision: "00000001".into(),
                message: "relation exists".into()
            }
        );
    }

    #[rstest]
    fn constructors_preserve_non_string_types() {
        assert_eq!(
            ProbePortError::refused(3_u32).to_string(),
            "refused after 3 attempts"
        );
        assert_eq!(ProbePortError::timeout(), ProbePortError::Timeout);
    }

    #[rstest]
    fn messages_name_the_backend() {
        assert!(
            RealtimeBackendError::connection("no route")
                .to_string()
                .starts_with("realtime backend")
        );
    }

    #[rstest]
    #[case(DatabaseProbeError::query("syntax").kind(), "query")]
    #[case(MigrationStoreError::step("00000002", "boom").kind(), "step")]
    #[case(ProbePortError::timeout().kind(), "timeout")]
    fn kind_names_the_variant(#[case] kind: &str, #[case] expected: &str) {
        assert_eq!(kind, expected);
    }
}
