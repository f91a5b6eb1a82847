//! Append-only analytics events.
//!
//! Events are write-only from the platform's perspective; nothing in the
//! core ever reads them back, and a failed write must never fail the
//! operation that produced the event.

use crate::error::StoreError;
use async_trait::async_trait;
use inner_circle_core::UserId;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// One append-only analytics record.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsEvent {
    /// The user the action is attributed to.
    pub user_id: UserId,
    /// Action name, e.g. `user_login` or `dashboard_access`.
    pub action: String,
    /// Page the action happened on, when meaningful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    /// Free-form extra context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,
}

impl AnalyticsEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(user_id: UserId, action: impl Into<String>) -> Self {
        Self {
            user_id,
            action: action.into(),
            page: None,
            metadata: None,
        }
    }

    /// Sets the page.
    #[must_use]
    pub fn with_page(mut self, page: Option<String>) -> Self {
        self.page = page;
        self
    }

    /// Sets the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Option<JsonValue>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Capability trait for the analytics table.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Appends one event.
    ///
    /// # Errors
    ///
    /// Returns an error if the append fails; callers on the authorization
    /// path log and discard it.
    async fn record(&self, event: AnalyticsEvent) -> Result<(), StoreError>;
}
