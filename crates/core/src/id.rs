//! Strongly-typed identifiers used across the domain.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a UUID-backed identifier newtype.
///
/// Generates the struct plus `new`/`from_uuid`/`as_uuid`, `Display`, `FromStr`
/// and the `Uuid` conversions. Domain crates use it for their own entity ids.
#[macro_export]
macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $t(::uuid::Uuid);

        $crate::impl_uuid_newtype!($t, $name);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(::uuid::Uuid::now_v7())
            }

            pub fn from_uuid(uuid: ::uuid::Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &::uuid::Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<::uuid::Uuid> for $t {
            fn from(value: ::uuid::Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for ::uuid::Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl core::str::FromStr for $t {
            type Err = $crate::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = ::uuid::Uuid::parse_str(s)
                    .map_err(|e| $crate::DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

/// Identifier of a user (actor identity, recorded for audit).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

/// Generic entity identifier, used where the concrete entity type is not known
/// (event envelopes, logs).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl_uuid_newtype!(UserId, "UserId");
impl_uuid_newtype!(EntityId, "EntityId");
