//! Protected-page access flow.
//!
//! The contract every protected route follows, in order: resolve the
//! session, reject if there is none, check for an active subscription,
//! reject (distinctly) if there is none, then grant and record the visit.

use crate::error::GateError;
use crate::gate::{ACTION_DASHBOARD_ACCESS, Gate};
use inner_circle_backend::{IdentityError, Session, StoreError, SubscriptionRecord};
use inner_circle_core::UserId;

/// Outcome of a protected-page access check.
///
/// The two rejection cases are distinct so the caller can redirect a
/// signed-out visitor to sign-in, and a signed-in member without an active
/// subscription to sign-in with a `no_subscription` indicator.
#[derive(Debug)]
pub enum AccessDecision {
    /// Render the page.
    Granted {
        /// The validated session.
        session: Session,
        /// The member's active subscription.
        subscription: Box<SubscriptionRecord>,
    },
    /// No session; send the visitor to the sign-in entry point.
    SignedOut,
    /// Valid session but no active subscription.
    NoActiveSubscription {
        /// Who was refused.
        user_id: UserId,
    },
}

impl Gate {
    /// Runs the protected-page access check for the given bearer token.
    ///
    /// On a grant, a `dashboard_access` event for `page` is recorded
    /// best-effort.
    ///
    /// # Errors
    ///
    /// Store-level failures (not "no session"/"no subscription", which are
    /// decisions) surface as [`GateError::LookupFailed`] or
    /// [`GateError::Timeout`].
    pub async fn authorize_page(
        &self,
        access_token: Option<&str>,
        page: &str,
    ) -> Result<AccessDecision, GateError> {
        let Some(token) = access_token else {
            return Ok(AccessDecision::SignedOut);
        };

        let session = match self.identity_provider().get_session(token).await {
            Ok(Some(session)) => session,
            Ok(None) => return Ok(AccessDecision::SignedOut),
            Err(IdentityError::Store(StoreError::Timeout)) => return Err(GateError::Timeout),
            Err(err) => {
                return Err(GateError::LookupFailed {
                    reason: err.to_string(),
                });
            }
        };

        let user_id = session.user.id.clone();
        match self.check_user_subscription(&user_id).await? {
            Some(subscription) => {
                self.log_user_action(&user_id, ACTION_DASHBOARD_ACCESS, Some(page), None)
                    .await;
                Ok(AccessDecision::Granted {
                    session,
                    subscription: Box::new(subscription),
                })
            }
            None => Ok(AccessDecision::NoActiveSubscription { user_id }),
        }
    }
}
