//! Gate error taxonomy.
//!
//! Every gate operation fails with one of these kinds. All of them are
//! surfaced to the presentation layer; analytics write failures are the one
//! deliberate exception and never appear here (they are logged and
//! discarded inside the gate).

use inner_circle_core::{PaymentId, UserId};
use std::fmt;

/// Failures surfaced by gate operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Sign-up referenced a payment that does not resolve to a completed,
    /// unclaimed subscription record.
    PaymentNotFound { payment_id: PaymentId },
    /// The credential store refused to create the account.
    IdentityCreationFailed { reason: String },
    /// The identity was created but the subscription record could not be
    /// updated with its id. The identity is now orphaned; there is no
    /// automatic rollback, and the case needs manual reconciliation.
    LinkageFailed {
        payment_id: PaymentId,
        user_id: UserId,
    },
    /// The credential store rejected the email/password pair.
    InvalidCredentials,
    /// The credential store could not clear the session.
    SignOutFailed { reason: String },
    /// A store-level failure, distinct from "no row found".
    LookupFailed { reason: String },
    /// An external call did not complete within the configured bound.
    Timeout,
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PaymentNotFound { payment_id } => {
                write!(f, "payment '{payment_id}' not found or not confirmed")
            }
            Self::IdentityCreationFailed { reason } => {
                write!(f, "account creation failed: {reason}")
            }
            Self::LinkageFailed {
                payment_id,
                user_id,
            } => {
                write!(
                    f,
                    "could not link payment '{payment_id}' to new user '{user_id}'"
                )
            }
            Self::InvalidCredentials => write!(f, "invalid email or password"),
            Self::SignOutFailed { reason } => write!(f, "sign-out failed: {reason}"),
            Self::LookupFailed { reason } => write!(f, "subscription store failure: {reason}"),
            Self::Timeout => write!(f, "backend call timed out"),
        }
    }
}

impl std::error::Error for GateError {}
