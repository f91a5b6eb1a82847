//! Subscription-gated authorization for the inner-circle platform.
//!
//! This crate is the single enforcement point between the presentation
//! layer and the external stores. It encodes the two business rules the
//! platform lives by:
//!
//! - an account may only be created against a completed, unclaimed payment;
//! - a member may only enter protected content while their linked
//!   subscription is active.
//!
//! The [`Gate`] holds no state of its own. Every decision re-reads the
//! credential store and the subscription record store, trading a little
//! latency for freedom from cache invalidation.

mod access;
mod error;
mod gate;

#[cfg(test)]
mod testing;

pub use access::AccessDecision;
pub use error::GateError;
pub use gate::{
    ACTION_DASHBOARD_ACCESS, ACTION_USER_LOGIN, ACTION_USER_LOGOUT, ACTION_USER_REGISTERED, Gate,
    SignUpOutcome,
};
