//! Newtype IDs for type-safe identifiers.
//!
//! Using newtypes prevents accidentally mixing up different ID types,
//! e.g., passing a ProductId where an OrderId is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate newtype ID structs.
macro_rules! define_id {
    ($name:ident) => {
        /// A unique identifier.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a new unique ID.
            pub fn generate() -> Self {
                Self(format!("{:016x}", rand::random::<u64>()))
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(CartId);
define_id!(OrderId);
define_id!(UserId);

/// The identity a cart is stored under.
///
/// A cart belongs either to an authenticated user or to an anonymous
/// guest session. The variant is resolved once at the boundary (from a
/// session cookie or bearer token) and passed explicitly into the core,
/// so no ambient session state leaks into cart or order logic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum OwnerKey {
    /// Anonymous session, keyed by a guest token.
    Guest(String),
    /// Authenticated user.
    User(UserId),
}

impl OwnerKey {
    /// Create a guest owner key from a session token.
    pub fn guest(token: impl Into<String>) -> Self {
        OwnerKey::Guest(token.into())
    }

    /// Create an owner key for an authenticated user.
    pub fn user(id: impl Into<UserId>) -> Self {
        OwnerKey::User(id.into())
    }

    /// The user id, if this key belongs to an authenticated user.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            OwnerKey::Guest(_) => None,
            OwnerKey::User(id) => Some(id),
        }
    }

    /// Whether this key belongs to an anonymous guest.
    pub fn is_guest(&self) -> bool {
        matches!(self, OwnerKey::Guest(_))
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerKey::Guest(token) => write!(f, "guest:{token}"),
            OwnerKey::User(id) => write!(f, "user:{id}"),
        }
    }
}
