//! Identifier types for campus entities.
//!
//! UUID-based ids are used for entities created interactively (tenants,
//! users, content nodes). Subscription and highlight ids use ULIDs so that
//! rows sort chronologically inside store key ranges.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Define a UUID-backed identifier newtype with the standard trait set.
///
/// Generates `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, string-based
/// serde, `FromStr`, `Display`, `Debug`, `TryFrom<String>`,
/// `Into<String>`, and `AsRef<[u8]>` (for store key encoding).
macro_rules! uuid_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Create an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a new random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Return the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }

            /// Return the 16 raw bytes of the UUID.
            #[must_use]
            pub fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidUuid)?;
                Ok(Self(uuid))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                self.0.as_bytes()
            }
        }
    };
}

/// Define a ULID-backed identifier newtype.
///
/// ULIDs are time-ordered, so keys built from these ids iterate in
/// creation order without a separate timestamp index.
macro_rules! ulid_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Ulid);

        impl $name {
            /// Create an identifier from an existing ULID.
            #[must_use]
            pub const fn from_ulid(ulid: Ulid) -> Self {
                Self(ulid)
            }

            /// Generate a new identifier with the current timestamp.
            #[must_use]
            pub fn generate() -> Self {
                Self(Ulid::new())
            }

            /// Return the 16 raw bytes of the ULID.
            #[must_use]
            pub fn to_bytes(&self) -> [u8; 16] {
                self.0.to_bytes()
            }

            /// Reconstruct an identifier from its raw bytes.
            ///
            /// # Errors
            ///
            /// Returns an error if the bytes are not a valid ULID.
            pub fn from_bytes(bytes: [u8; 16]) -> Result<Self, IdError> {
                Ok(Self(Ulid::from_bytes(bytes)))
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let ulid = Ulid::from_string(s).map_err(|_| IdError::InvalidUlid)?;
                Ok(Self(ulid))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }
    };
}

uuid_id_type!(TenantId, "A tenant (organization) identifier.");
uuid_id_type!(UserId, "A user identifier, extracted from JWT `sub` claims.");
uuid_id_type!(TierId, "A billing tier identifier.");
uuid_id_type!(CurriculumId, "A curriculum identifier.");
uuid_id_type!(ChapterId, "A chapter identifier.");
uuid_id_type!(LessonId, "A lesson identifier.");
uuid_id_type!(LessonModuleId, "A lesson module identifier.");

ulid_id_type!(
    SubscriptionId,
    "A tenant subscription identifier (ULID, time-ordered).\n\nThe most recent trial/active row per tenant is the \"current\" subscription; time-ordering makes that the last entry in the tenant's key range."
);
ulid_id_type!(
    HighlightId,
    "A highlight identifier (ULID, time-ordered within a lesson)."
);

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,

    /// The input is not a valid ULID.
    #[error("invalid ULID format")]
    InvalidUlid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_id_roundtrip() {
        let id = TenantId::generate();
        let parsed = TenantId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn tenant_id_serde_json() {
        let id = TenantId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: TenantId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn subscription_id_roundtrip() {
        let id = SubscriptionId::generate();
        let parsed = SubscriptionId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn subscription_id_bytes_roundtrip() {
        let id = SubscriptionId::generate();
        let parsed = SubscriptionId::from_bytes(id.to_bytes()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn subscription_ids_sort_by_creation() {
        let a = SubscriptionId::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = SubscriptionId::generate();
        assert!(a.to_bytes() < b.to_bytes());
    }

    #[test]
    fn invalid_uuid_rejected() {
        assert_eq!(TenantId::from_str("not-a-uuid"), Err(IdError::InvalidUuid));
    }
}
