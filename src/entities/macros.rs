//! Macros for reducing boilerplate when defining entities
//!
//! These macros generate the repetitive parts of each entity kind: the
//! string-backed wire enums and the [`Entity`](crate::core::entity::Entity)
//! impl.

/// Declare an enum carried as an upper-case string on the wire.
///
/// The first variant is the `Default`. Strings the client does not know
/// deserialize into `Other(String)` and serialize back unchanged, so one
/// unexpected value never fails a whole collection.
///
/// # Example
/// ```rust,ignore
/// wire_enum! {
///     /// Lifecycle of a parcel
///     ParcelStatus {
///         Pending => "PENDING",
///         Delivered => "DELIVERED",
///     }
/// }
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $first:ident => $first_wire:literal
            $(, $variant:ident => $wire:literal)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $first,
            $($variant,)*
            /// A value this client does not know
            Other(String),
        }

        impl $name {
            /// Every known variant, in declaration order
            pub const KNOWN: &'static [$name] = &[$name::$first $(, $name::$variant)*];

            /// Wire representation
            pub fn as_str(&self) -> &str {
                match self {
                    $name::$first => $first_wire,
                    $($name::$variant => $wire,)*
                    $name::Other(raw) => raw.as_str(),
                }
            }

            /// Wire values of the known variants, for `in_list` validators
            pub fn wire_values() -> Vec<String> {
                Self::KNOWN.iter().map(|v| v.as_str().to_string()).collect()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$first
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                match raw {
                    $first_wire => $name::$first,
                    $($wire => $name::$variant,)*
                    other => $name::Other(other.to_string()),
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::std::convert::Infallible;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Ok($name::from(raw))
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <Option<String> as ::serde::Deserialize>::deserialize(deserializer)?;
                Ok(raw.map_or_else(Self::default, |raw| $name::from(raw.as_str())))
            }
        }
    };
}

/// Implement [`Entity`](crate::core::entity::Entity) for a record with
/// `id: Option<EntityId>`, `created_date: Option<String>` and a wire-enum
/// `status`, resolving dynamic fields through an inherent lookup method.
///
/// # Example
/// ```rust,ignore
/// impl_entity!(Driver, "drivers", "driver", DRIVER_SCHEMA, Driver::lookup);
/// ```
#[macro_export]
macro_rules! impl_entity {
    ($type:ident, $plural:literal, $singular:literal, $schema:path, $lookup:path) => {
        impl $crate::core::entity::Entity for $type {
            fn resource_name() -> &'static str {
                $plural
            }

            fn resource_name_singular() -> &'static str {
                $singular
            }

            fn schema() -> &'static $crate::core::entity::EntitySchema {
                &$schema
            }

            fn id(&self) -> Option<$crate::core::entity::EntityId> {
                self.id
            }

            fn created_date(&self) -> Option<&str> {
                self.created_date.as_deref()
            }

            fn status(&self) -> &str {
                self.status.as_str()
            }

            fn field_value(&self, field: &str) -> Option<$crate::core::field::FieldValue> {
                $lookup(self, field)
            }
        }
    };
}
