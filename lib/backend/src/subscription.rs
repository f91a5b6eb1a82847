//! Subscription records and the subscription record store capability.
//!
//! A subscription row is created when a checkout starts, confirmed by the
//! payment processor's callback, and linked to a user exactly once at
//! sign-up. The store owns uniqueness of `payment_id` and of the
//! user-to-active-subscription mapping.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inner_circle_core::{PaymentId, SubscriptionId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription plan tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Basic,
    Premium,
    Diamond,
}

impl Plan {
    /// Returns the wire/database representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Premium => "premium",
            Self::Diamond => "diamond",
        }
    }

    /// Monthly price in BRL.
    #[must_use]
    pub fn monthly_price(&self) -> f64 {
        match self {
            Self::Basic => 19.90,
            Self::Premium => 29.90,
            Self::Diamond => 99.90,
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Plan {
    type Err = UnknownPlan;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "premium" => Ok(Self::Premium),
            "diamond" => Ok(Self::Diamond),
            other => Err(UnknownPlan {
                value: other.to_string(),
            }),
        }
    }
}

/// Error returned when parsing an unknown plan name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPlan {
    /// The rejected value.
    pub value: String,
}

impl fmt::Display for UnknownPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown plan: '{}'", self.value)
    }
}

impl std::error::Error for UnknownPlan {}

/// State of the payment backing a subscription row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

/// State of the subscription itself, independent of payment history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
}

/// One row of the subscription record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Store-assigned unique identifier.
    pub id: SubscriptionId,
    /// The linked user, set exactly once at sign-up. `None` until linkage.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Email of the payer, used to identify the row before linkage.
    pub email: String,
    /// Purchased plan tier.
    pub subscription_plan: Plan,
    /// External reference from the payment processor. Unique per row.
    pub payment_id: PaymentId,
    /// Payment lifecycle state.
    pub payment_status: PaymentStatus,
    /// Amount charged.
    pub payment_amount: f64,
    /// When the payment was made, once known.
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    /// Subscription lifecycle state. Only `active` grants member access.
    pub subscription_status: SubscriptionStatus,
    /// When the subscription lapses, when bounded.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Row update time.
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRecord {
    /// A record may be linked to a new account only while its payment is
    /// completed and no user has claimed it yet.
    #[must_use]
    pub fn is_linkable(&self) -> bool {
        self.payment_status == PaymentStatus::Completed && self.user_id.is_none()
    }

    /// Whether this subscription currently grants member access.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.subscription_status == SubscriptionStatus::Active
    }
}

/// Fields for inserting a new subscription row.
///
/// The store assigns `id`, `subscription_status`, and the row timestamps.
#[derive(Debug, Clone, Serialize)]
pub struct NewSubscriptionRecord {
    pub email: String,
    pub subscription_plan: Plan,
    pub payment_id: PaymentId,
    pub payment_status: PaymentStatus,
    pub payment_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Capability trait for the external subscription record store.
///
/// Each lookup returns zero or one row; "no row" is a domain outcome and is
/// kept distinct from store failures.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Finds the record for a payment id whose payment is completed.
    async fn find_completed_payment(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<SubscriptionRecord>, StoreError>;

    /// Finds the unique active subscription for a user.
    async fn find_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, StoreError>;

    /// Inserts a new row and returns it as stored.
    async fn insert(
        &self,
        record: NewSubscriptionRecord,
    ) -> Result<SubscriptionRecord, StoreError>;

    /// Writes a user id into the row with the given payment id.
    ///
    /// Returns the updated row, or `None` when no row matched.
    async fn link_user(
        &self,
        payment_id: &PaymentId,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, StoreError>;

    /// Marks the payment behind the given payment id as completed.
    ///
    /// Returns the updated row, or `None` when no row matched.
    async fn mark_payment_completed(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<SubscriptionRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(payment_status: PaymentStatus, user_id: Option<&str>) -> SubscriptionRecord {
        SubscriptionRecord {
            id: SubscriptionId::new("sub_1"),
            user_id: user_id.map(UserId::new),
            email: "a@x.com".to_string(),
            subscription_plan: Plan::Premium,
            payment_id: PaymentId::new("pay_1"),
            payment_status,
            payment_amount: 29.90,
            payment_date: None,
            subscription_status: SubscriptionStatus::Active,
            expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn plan_round_trip() {
        for plan in [Plan::Basic, Plan::Premium, Plan::Diamond] {
            let parsed: Plan = plan.as_str().parse().expect("parse");
            assert_eq!(parsed, plan);
        }
    }

    #[test]
    fn unknown_plan_is_rejected() {
        let err = "platinum".parse::<Plan>().unwrap_err();
        assert!(err.to_string().contains("platinum"));
    }

    #[test]
    fn plan_prices() {
        assert_eq!(Plan::Basic.monthly_price(), 19.90);
        assert_eq!(Plan::Premium.monthly_price(), 29.90);
        assert_eq!(Plan::Diamond.monthly_price(), 99.90);
    }

    #[test]
    fn completed_unlinked_record_is_linkable() {
        assert!(record(PaymentStatus::Completed, None).is_linkable());
    }

    #[test]
    fn pending_record_is_not_linkable() {
        assert!(!record(PaymentStatus::Pending, None).is_linkable());
    }

    #[test]
    fn linked_record_is_not_linkable_again() {
        assert!(!record(PaymentStatus::Completed, Some("u1")).is_linkable());
    }

    #[test]
    fn record_deserializes_store_row() {
        let json = r#"{
            "id": "sub_9",
            "user_id": null,
            "email": "a@x.com",
            "subscription_plan": "diamond",
            "payment_id": "pay_9",
            "payment_status": "pending",
            "payment_amount": 99.9,
            "payment_date": null,
            "subscription_status": "active",
            "expires_at": "2026-09-22T00:00:00Z",
            "created_at": "2026-08-23T00:00:00Z",
            "updated_at": "2026-08-23T00:00:00Z"
        }"#;

        let row: SubscriptionRecord = serde_json::from_str(json).expect("deserialize");
        assert_eq!(row.subscription_plan, Plan::Diamond);
        assert_eq!(row.payment_status, PaymentStatus::Pending);
        assert!(row.user_id.is_none());
        assert!(row.expires_at.is_some());
    }

    #[test]
    fn new_record_serializes_enum_values_lowercase() {
        let new = NewSubscriptionRecord {
            email: "a@x.com".to_string(),
            subscription_plan: Plan::Basic,
            payment_id: PaymentId::new("pay_1"),
            payment_status: PaymentStatus::Pending,
            payment_amount: 19.90,
            expires_at: None,
        };

        let json = serde_json::to_value(&new).expect("serialize");
        assert_eq!(json["subscription_plan"], "basic");
        assert_eq!(json["payment_status"], "pending");
        assert!(json.get("expires_at").is_none());
    }
}
