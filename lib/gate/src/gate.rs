//! The authorization gate.
//!
//! All identity and subscription operations go through [`Gate`]. The
//! presentation layer never talks to the stores directly, which keeps the
//! linkage and access rules in exactly one place.

use crate::error::GateError;
use chrono::{Duration, Utc};
use inner_circle_backend::{
    AnalyticsEvent, AnalyticsSink, BackendClient, Identity, IdentityError, IdentityProvider,
    NewSubscriptionRecord, PaymentStatus, Plan, Session, StoreError, SubscriptionRecord,
    SubscriptionStore,
};
use inner_circle_core::{PaymentId, UserId};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Analytics action recorded when a new account is created.
pub const ACTION_USER_REGISTERED: &str = "user_registered";
/// Analytics action recorded on successful sign-in.
pub const ACTION_USER_LOGIN: &str = "user_login";
/// Analytics action recorded before sign-out.
pub const ACTION_USER_LOGOUT: &str = "user_logout";
/// Analytics action recorded when a member enters the dashboard.
pub const ACTION_DASHBOARD_ACCESS: &str = "dashboard_access";

const PAGE_SIGNUP: &str = "/auth/signup";
const PAGE_SIGNIN: &str = "/auth/signin";
const PAGE_DASHBOARD: &str = "/dashboard";

/// Minimum password length accepted at registration. Matches the limit the
/// sign-up form enforces, so the credential store is never called with a
/// password it would reject anyway.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Pending payment records lapse after this many days if never confirmed.
const PENDING_EXPIRY_DAYS: i64 = 30;

/// Result of a successful payment-backed sign-up.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    /// The newly created identity.
    pub identity: Identity,
    /// The subscription record now linked to it.
    pub subscription: SubscriptionRecord,
}

/// The authorization gate.
///
/// Holds one handle to each external capability and nothing else; every
/// operation re-derives state from the stores.
#[derive(Clone)]
pub struct Gate {
    identity: Arc<dyn IdentityProvider>,
    subscriptions: Arc<dyn SubscriptionStore>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl Gate {
    /// Creates a gate over explicit capability handles.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        subscriptions: Arc<dyn SubscriptionStore>,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        Self {
            identity,
            subscriptions,
            analytics,
        }
    }

    /// Creates a gate backed by one shared backend client.
    #[must_use]
    pub fn from_client(client: BackendClient) -> Self {
        let client = Arc::new(client);
        Self {
            identity: client.clone(),
            subscriptions: client.clone(),
            analytics: client,
        }
    }

    /// Registers a new account against a confirmed payment.
    ///
    /// The three external calls are strictly sequential: the payment check
    /// happens before identity creation, which happens before linkage.
    /// A linkage failure leaves the freshly created identity orphaned;
    /// this surfaces as [`GateError::LinkageFailed`] and is not rolled
    /// back.
    ///
    /// # Errors
    ///
    /// - [`GateError::PaymentNotFound`] when no completed, unclaimed record
    ///   matches `payment_id`.
    /// - [`GateError::IdentityCreationFailed`] when the credential store
    ///   refuses the account.
    /// - [`GateError::LinkageFailed`] when the record update after identity
    ///   creation fails.
    pub async fn sign_up_with_payment(
        &self,
        email: &str,
        password: &str,
        payment_id: &PaymentId,
    ) -> Result<SignUpOutcome, GateError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(GateError::IdentityCreationFailed {
                reason: format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
            });
        }

        let record = self
            .subscriptions
            .find_completed_payment(payment_id)
            .await
            .map_err(Self::store_failure)?
            .ok_or_else(|| GateError::PaymentNotFound {
                payment_id: payment_id.clone(),
            })?;

        // A record claimed by an earlier sign-up is gone for good; treat it
        // the same as an unknown payment.
        if !record.is_linkable() {
            return Err(GateError::PaymentNotFound {
                payment_id: payment_id.clone(),
            });
        }

        let identity = self
            .identity
            .sign_up(email, password)
            .await
            .map_err(|err| match err {
                IdentityError::CreationRejected { reason } => {
                    GateError::IdentityCreationFailed { reason }
                }
                IdentityError::InvalidCredentials => GateError::IdentityCreationFailed {
                    reason: "credentials rejected".to_string(),
                },
                IdentityError::Store(StoreError::Timeout) => GateError::Timeout,
                IdentityError::Store(store) => GateError::IdentityCreationFailed {
                    reason: store.to_string(),
                },
            })?;

        let linked = match self.subscriptions.link_user(payment_id, &identity.id).await {
            Ok(Some(row)) => row,
            Ok(None) => return Err(self.linkage_failed(payment_id, &identity.id, "no row matched")),
            Err(err) => {
                return Err(self.linkage_failed(payment_id, &identity.id, &err.to_string()));
            }
        };

        info!(user_id = %identity.id, payment_id = %payment_id, "account linked to subscription");
        self.log_user_action(&identity.id, ACTION_USER_REGISTERED, Some(PAGE_SIGNUP), None)
            .await;

        Ok(SignUpOutcome {
            identity,
            subscription: linked,
        })
    }

    /// Verifies credentials and issues a session.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::InvalidCredentials`] when the credential store
    /// rejects the pair.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, GateError> {
        let session = self
            .identity
            .sign_in_with_password(email, password)
            .await
            .map_err(|err| match err {
                IdentityError::InvalidCredentials | IdentityError::CreationRejected { .. } => {
                    GateError::InvalidCredentials
                }
                IdentityError::Store(StoreError::Timeout) => GateError::Timeout,
                IdentityError::Store(store) => GateError::LookupFailed {
                    reason: store.to_string(),
                },
            })?;

        self.log_user_action(&session.user.id, ACTION_USER_LOGIN, Some(PAGE_SIGNIN), None)
            .await;

        Ok(session)
    }

    /// Revokes the session behind the given access token.
    ///
    /// A `user_logout` analytics event is written best-effort before the
    /// revocation, while the session can still say who is leaving.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::SignOutFailed`] when the credential store could
    /// not clear the session.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), GateError> {
        if let Ok(Some(session)) = self.identity.get_session(access_token).await {
            self.log_user_action(
                &session.user.id,
                ACTION_USER_LOGOUT,
                Some(PAGE_DASHBOARD),
                None,
            )
            .await;
        }

        self.identity
            .sign_out(access_token)
            .await
            .map_err(|err| match err {
                IdentityError::Store(StoreError::Timeout) => GateError::Timeout,
                other => GateError::SignOutFailed {
                    reason: other.to_string(),
                },
            })
    }

    /// Returns the user's active subscription, or `None` when they have no
    /// currently active one.
    ///
    /// This is the single authorization predicate for protected pages: a
    /// `None` means the caller must refuse access.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::LookupFailed`] on store-level failures, which
    /// are kept distinct from the "no row" outcome.
    pub async fn check_user_subscription(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, GateError> {
        self.subscriptions
            .find_active_for_user(user_id)
            .await
            .map_err(Self::store_failure)
    }

    /// Appends an analytics event, best-effort.
    ///
    /// Analytics is not on the authorization path, so a failed write is
    /// logged and discarded; this never returns an error.
    pub async fn log_user_action(
        &self,
        user_id: &UserId,
        action: &str,
        page: Option<&str>,
        metadata: Option<JsonValue>,
    ) {
        let event = AnalyticsEvent::new(user_id.clone(), action)
            .with_page(page.map(str::to_string))
            .with_metadata(metadata);

        if let Err(err) = self.analytics.record(event).await {
            warn!(%user_id, action, error = %err, "analytics write failed");
        }
    }

    /// Creates the pending subscription record a checkout starts with.
    ///
    /// The record carries the payer's email and the processor's payment id
    /// so that [`Gate::sign_up_with_payment`] can find and claim it once
    /// the payment confirms. It expires 30 days out if never confirmed.
    pub async fn create_pending_payment(
        &self,
        email: &str,
        plan: Plan,
        payment_id: PaymentId,
        amount: f64,
    ) -> Result<SubscriptionRecord, GateError> {
        let record = NewSubscriptionRecord {
            email: email.to_string(),
            subscription_plan: plan,
            payment_id,
            payment_status: PaymentStatus::Pending,
            payment_amount: amount,
            expires_at: Some(Utc::now() + Duration::days(PENDING_EXPIRY_DAYS)),
        };

        self.subscriptions
            .insert(record)
            .await
            .map_err(Self::store_failure)
    }

    /// Marks a payment as completed (payment-processor callback path).
    ///
    /// # Errors
    ///
    /// Returns [`GateError::PaymentNotFound`] when no record carries the
    /// payment id; the store reports that case as zero updated rows.
    pub async fn confirm_payment(
        &self,
        payment_id: &PaymentId,
    ) -> Result<SubscriptionRecord, GateError> {
        match self.subscriptions.mark_payment_completed(payment_id).await {
            Ok(Some(row)) => {
                info!(payment_id = %payment_id, "payment confirmed");
                Ok(row)
            }
            Ok(None) => Err(GateError::PaymentNotFound {
                payment_id: payment_id.clone(),
            }),
            Err(err) => Err(Self::store_failure(err)),
        }
    }

    pub(crate) fn identity_provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    fn linkage_failed(&self, payment_id: &PaymentId, user_id: &UserId, reason: &str) -> GateError {
        // The identity exists but nothing points at it. Needs manual
        // reconciliation; flag loudly.
        error!(
            payment_id = %payment_id,
            user_id = %user_id,
            reason,
            "subscription linkage failed after identity creation; identity is orphaned"
        );
        GateError::LinkageFailed {
            payment_id: payment_id.clone(),
            user_id: user_id.clone(),
        }
    }

    fn store_failure(err: StoreError) -> GateError {
        match err {
            StoreError::Timeout => GateError::Timeout,
            other => GateError::LookupFailed {
                reason: other.to_string(),
            },
        }
    }
}
