//! Thin client for the hosted backend-as-a-service platform.
//!
//! Every piece of durable state in inner-circle lives in an external
//! service: the credential store owns identities and sessions, and the
//! subscription record store owns subscription rows. This crate exposes
//! those services as capability traits ([`IdentityProvider`],
//! [`SubscriptionStore`], [`AnalyticsSink`]) so the authorization gate can
//! be tested against in-memory fakes, plus the single production
//! implementation: [`BackendClient`], an HTTP client for the hosted
//! platform's auth and row REST APIs.

mod analytics;
mod client;
mod config;
mod error;
mod identity;
mod subscription;

pub use analytics::{AnalyticsEvent, AnalyticsSink};
pub use client::BackendClient;
pub use config::BackendConfig;
pub use error::{IdentityError, StoreError};
pub use identity::{Identity, IdentityProvider, Session};
pub use subscription::{
    NewSubscriptionRecord, PaymentStatus, Plan, SubscriptionRecord, SubscriptionStatus,
    SubscriptionStore, UnknownPlan,
};
