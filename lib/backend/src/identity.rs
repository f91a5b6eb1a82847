//! Identity and session types, and the credential store capability.
//!
//! The credential store owns password hashing, token issuance, and session
//! persistence. This module only models what the platform needs to see of
//! it: an identity handle, a bearer session, and the four operations the
//! authorization gate delegates to.

use crate::error::IdentityError;
use async_trait::async_trait;
use inner_circle_core::UserId;
use serde::{Deserialize, Serialize};

/// An authenticated principal, as reported by the credential store.
///
/// The store owns the record; this is only a handle received back from
/// sign-up or session validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Store-assigned unique identifier.
    pub id: UserId,
    /// Email address the identity was registered with.
    pub email: String,
}

/// An active session issued by the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for subsequent authenticated calls.
    pub access_token: String,
    /// Token type, normally `bearer`.
    pub token_type: String,
    /// Seconds until the access token expires, when reported.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Refresh token, when the store issues one.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// The identity this session belongs to.
    pub user: Identity,
}

impl Session {
    /// Builds a session around an already-validated bearer token.
    ///
    /// Used when the store confirms a token but does not re-issue the full
    /// token set.
    #[must_use]
    pub fn from_validated_token(access_token: impl Into<String>, user: Identity) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "bearer".to_string(),
            expires_in: None,
            refresh_token: None,
            user,
        }
    }
}

/// Capability trait for the external credential store.
///
/// Implementations own all security-sensitive behavior (hashing, token
/// issuance, revocation); callers treat the store as opaque.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates a new identity.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::CreationRejected`] when the store refuses
    /// the registration (for example a duplicate email).
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    /// Verifies a password and issues a session.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidCredentials`] when the pair is
    /// rejected.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError>;

    /// Revokes the session behind the given access token.
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;

    /// Validates an access token and returns its session, or `None` when
    /// the token is missing, expired, or revoked.
    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, IdentityError>;
}
