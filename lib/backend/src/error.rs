//! Error types for the backend client crate.
//!
//! Two layers:
//! - `StoreError`: transport and service failures talking to the hosted
//!   platform, shared by every capability.
//! - `IdentityError`: credential-store outcomes the caller must tell apart
//!   (rejected creation, bad credentials) on top of transport failures.

use std::fmt;

/// Transport and service failures from the hosted platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Could not reach the backend service.
    ConnectionFailed { reason: String },
    /// The backend returned a non-success status.
    Rejected { status: u16, message: String },
    /// The response body could not be interpreted.
    InvalidResponse { reason: String },
    /// The call did not complete within the configured bound.
    Timeout,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed { reason } => {
                write!(f, "connection to backend failed: {reason}")
            }
            Self::Rejected { status, message } => {
                write!(f, "backend rejected request (status {status}): {message}")
            }
            Self::InvalidResponse { reason } => {
                write!(f, "invalid backend response: {reason}")
            }
            Self::Timeout => write!(f, "backend call timed out"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from credential store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The credential store refused to create the identity
    /// (duplicate email, weak password, ...).
    CreationRejected { reason: String },
    /// The email/password pair was rejected.
    InvalidCredentials,
    /// Transport or service failure.
    Store(StoreError),
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreationRejected { reason } => {
                write!(f, "identity creation rejected: {reason}")
            }
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::Store(err) => write!(f, "credential store failure: {err}"),
        }
    }
}

impl std::error::Error for IdentityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
