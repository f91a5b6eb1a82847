//! Strongly-typed identifiers for domain entities.
//!
//! Unlike locally-generated IDs, every identifier here is assigned by an
//! external system: user IDs by the credential store, subscription IDs by
//! the subscription record store, and payment IDs by the payment processor.
//! They are therefore opaque string newtypes rather than ULIDs or UUIDs
//! parsed into a structured form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate an opaque, store-assigned string identifier.
macro_rules! define_opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an identifier received from the external store.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
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

define_opaque_id!(
    /// Unique identifier for an authenticated principal.
    ///
    /// Assigned by the credential store when an identity is created.
    UserId
);

define_opaque_id!(
    /// Unique identifier for a subscription record.
    ///
    /// Assigned by the subscription record store on insert.
    SubscriptionId
);

define_opaque_id!(
    /// Unique external reference for a payment.
    ///
    /// Assigned by the payment processor when a checkout is initiated, and
    /// used to find the subscription record a new account links against.
    PaymentId
);
