//! Core identifier types for the inner-circle platform.
//!
//! This crate provides the strongly-typed identifiers shared by every other
//! crate in the workspace. All of them wrap identifiers assigned by the
//! external stores; the platform never mints one locally.

pub mod id;

pub use id::{PaymentId, SubscriptionId, UserId};
