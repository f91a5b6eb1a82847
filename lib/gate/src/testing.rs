//! In-memory fakes for the capability traits.
//!
//! The gate is tested entirely against these; no network is involved.

use crate::gate::Gate;
use async_trait::async_trait;
use chrono::Utc;
use inner_circle_backend::{
    AnalyticsEvent, AnalyticsSink, Identity, IdentityError, IdentityProvider,
    NewSubscriptionRecord, PaymentStatus, Plan, Session, StoreError, SubscriptionRecord,
    SubscriptionStatus, SubscriptionStore,
};
use inner_circle_core::{PaymentId, SubscriptionId, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Builds a gate over a prepared subscription fake and default identity and
/// analytics fakes, returning handles to all of them.
pub(crate) fn gate_with(
    subscriptions: FakeSubscriptions,
) -> (
    Gate,
    Arc<FakeIdentity>,
    Arc<FakeSubscriptions>,
    Arc<FakeAnalytics>,
) {
    let identity = Arc::new(FakeIdentity::default());
    let subscriptions = Arc::new(subscriptions);
    let analytics = Arc::new(FakeAnalytics::default());
    let gate = Gate::new(
        identity.clone(),
        subscriptions.clone(),
        analytics.clone(),
    );
    (gate, identity, subscriptions, analytics)
}

/// In-memory credential store.
#[derive(Default)]
pub(crate) struct FakeIdentity {
    users: Mutex<Vec<(String, String, UserId)>>,
    sessions: Mutex<HashMap<String, Identity>>,
    next_id: AtomicUsize,
    sign_up_calls: AtomicUsize,
}

impl FakeIdentity {
    /// Registers a pre-existing account without counting it as a sign-up.
    pub fn register(&self, email: &str, password: &str) -> UserId {
        let id = self.mint_id();
        self.users
            .lock()
            .expect("users lock")
            .push((email.to_string(), password.to_string(), id.clone()));
        id
    }

    pub fn sign_up_calls(&self) -> usize {
        self.sign_up_calls.load(Ordering::SeqCst)
    }

    pub fn has_user(&self, email: &str) -> bool {
        self.users
            .lock()
            .expect("users lock")
            .iter()
            .any(|(e, _, _)| e == email)
    }

    fn mint_id(&self) -> UserId {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        UserId::new(format!("user_{n}"))
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        self.sign_up_calls.fetch_add(1, Ordering::SeqCst);

        if self.has_user(email) {
            return Err(IdentityError::CreationRejected {
                reason: "email already registered".to_string(),
            });
        }

        let id = self.mint_id();
        self.users
            .lock()
            .expect("users lock")
            .push((email.to_string(), password.to_string(), id.clone()));

        Ok(Identity {
            id,
            email: email.to_string(),
        })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let identity = self
            .users
            .lock()
            .expect("users lock")
            .iter()
            .find(|(e, p, _)| e == email && p == password)
            .map(|(e, _, id)| Identity {
                id: id.clone(),
                email: e.clone(),
            })
            .ok_or(IdentityError::InvalidCredentials)?;

        let token = format!("tok_{}", identity.id);
        self.sessions
            .lock()
            .expect("sessions lock")
            .insert(token.clone(), identity.clone());

        Ok(Session::from_validated_token(token, identity))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        self.sessions
            .lock()
            .expect("sessions lock")
            .remove(access_token);
        Ok(())
    }

    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, IdentityError> {
        let identity = self
            .sessions
            .lock()
            .expect("sessions lock")
            .get(access_token)
            .cloned();

        Ok(identity.map(|user| Session::from_validated_token(access_token, user)))
    }
}

/// In-memory subscription record store.
#[derive(Default)]
pub(crate) struct FakeSubscriptions {
    rows: Mutex<Vec<SubscriptionRecord>>,
    next_id: AtomicUsize,
    fail_link: Mutex<bool>,
    fail_lookup: Mutex<Option<StoreError>>,
}

impl FakeSubscriptions {
    pub fn seed_pending(&self, email: &str, plan: Plan, payment_id: &str) -> SubscriptionRecord {
        self.seed(email, plan, payment_id, PaymentStatus::Pending, None, SubscriptionStatus::Active)
    }

    pub fn seed_completed(&self, email: &str, plan: Plan, payment_id: &str) -> SubscriptionRecord {
        self.seed(
            email,
            plan,
            payment_id,
            PaymentStatus::Completed,
            None,
            SubscriptionStatus::Active,
        )
    }

    pub fn seed_linked(
        &self,
        email: &str,
        plan: Plan,
        payment_id: &str,
        user_id: &UserId,
        status: SubscriptionStatus,
    ) -> SubscriptionRecord {
        self.seed(
            email,
            plan,
            payment_id,
            PaymentStatus::Completed,
            Some(user_id.clone()),
            status,
        )
    }

    pub fn fail_next_link(&self) {
        *self.fail_link.lock().expect("flag lock") = true;
    }

    pub fn fail_next_lookup_with(&self, err: StoreError) {
        *self.fail_lookup.lock().expect("flag lock") = Some(err);
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().expect("rows lock").len()
    }

    pub fn row(&self, index: usize) -> SubscriptionRecord {
        self.rows.lock().expect("rows lock")[index].clone()
    }

    fn seed(
        &self,
        email: &str,
        plan: Plan,
        payment_id: &str,
        payment_status: PaymentStatus,
        user_id: Option<UserId>,
        subscription_status: SubscriptionStatus,
    ) -> SubscriptionRecord {
        let record = SubscriptionRecord {
            id: self.mint_id(),
            user_id,
            email: email.to_string(),
            subscription_plan: plan,
            payment_id: PaymentId::new(payment_id),
            payment_status,
            payment_amount: plan.monthly_price(),
            payment_date: None,
            subscription_status,
            expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.rows
            .lock()
            .expect("rows lock")
            .push(record.clone());
        record
    }

    fn mint_id(&self) -> SubscriptionId {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        SubscriptionId::new(format!("sub_{n}"))
    }

    fn take_lookup_failure(&self) -> Option<StoreError> {
        self.fail_lookup.lock().expect("flag lock").take()
    }
}

#[async_trait]
impl SubscriptionStore for FakeSubscriptions {
    async fn find_completed_payment(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        if let Some(err) = self.take_lookup_failure() {
            return Err(err);
        }

        Ok(self
            .rows
            .lock()
            .expect("rows lock")
            .iter()
            .find(|r| {
                &r.payment_id == payment_id && r.payment_status == PaymentStatus::Completed
            })
            .cloned())
    }

    async fn find_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        if let Some(err) = self.take_lookup_failure() {
            return Err(err);
        }

        Ok(self
            .rows
            .lock()
            .expect("rows lock")
            .iter()
            .find(|r| {
                r.user_id.as_ref() == Some(user_id)
                    && r.subscription_status == SubscriptionStatus::Active
            })
            .cloned())
    }

    async fn insert(
        &self,
        record: NewSubscriptionRecord,
    ) -> Result<SubscriptionRecord, StoreError> {
        let row = SubscriptionRecord {
            id: self.mint_id(),
            user_id: None,
            email: record.email,
            subscription_plan: record.subscription_plan,
            payment_id: record.payment_id,
            payment_status: record.payment_status,
            payment_amount: record.payment_amount,
            payment_date: None,
            // The store schema defaults new subscriptions to active.
            subscription_status: SubscriptionStatus::Active,
            expires_at: record.expires_at,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.rows.lock().expect("rows lock").push(row.clone());
        Ok(row)
    }

    async fn link_user(
        &self,
        payment_id: &PaymentId,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let mut fail = self.fail_link.lock().expect("flag lock");
        if *fail {
            *fail = false;
            return Err(StoreError::Rejected {
                status: 500,
                message: "update failed".to_string(),
            });
        }
        drop(fail);

        let mut rows = self.rows.lock().expect("rows lock");
        let row = rows.iter_mut().find(|r| &r.payment_id == payment_id);
        Ok(row.map(|r| {
            r.user_id = Some(user_id.clone());
            r.updated_at = Utc::now();
            r.clone()
        }))
    }

    async fn mark_payment_completed(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let mut rows = self.rows.lock().expect("rows lock");
        let row = rows.iter_mut().find(|r| &r.payment_id == payment_id);
        Ok(row.map(|r| {
            r.payment_status = PaymentStatus::Completed;
            r.payment_date = Some(Utc::now());
            r.updated_at = Utc::now();
            r.clone()
        }))
    }
}

/// In-memory analytics table; optionally fails every write.
#[derive(Default)]
pub(crate) struct FakeAnalytics {
    events: Mutex<Vec<AnalyticsEvent>>,
    fail: bool,
}

impl FakeAnalytics {
    /// A sink whose every write fails.
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn actions(&self) -> Vec<String> {
        self.events
            .lock()
            .expect("events lock")
            .iter()
            .map(|e| e.action.clone())
            .collect()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().expect("events lock").clone()
    }
}

#[async_trait]
impl AnalyticsSink for FakeAnalytics {
    async fn record(&self, event: AnalyticsEvent) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::Rejected {
                status: 500,
                message: "analytics table unavailable".to_string(),
            });
        }
        self.events.lock().expect("events lock").push(event);
        Ok(())
    }
}
