//! HTTP client for the hosted backend platform.
//!
//! One long-lived client serves all three capabilities. Identity
//! operations go through the platform's auth API (`/auth/v1/...`); rows go
//! through its REST interface (`/rest/v1/<table>`), which filters by
//! equality predicates in the query string and returns JSON arrays.

use crate::analytics::{AnalyticsEvent, AnalyticsSink};
use crate::config::BackendConfig;
use crate::error::{IdentityError, StoreError};
use crate::identity::{Identity, IdentityProvider, Session};
use crate::subscription::{NewSubscriptionRecord, SubscriptionRecord, SubscriptionStore};
use async_trait::async_trait;
use inner_circle_core::{PaymentId, UserId};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

const SUBSCRIPTIONS_TABLE: &str = "user_subscriptions";
const ANALYTICS_TABLE: &str = "user_analytics";

/// Client for the hosted backend service.
///
/// Cheap to clone; holds a connection pool internally. One instance is
/// created at startup and handed to the gate (and anything else that needs
/// the backend) explicitly.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl BackendClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| StoreError::ConnectionFailed {
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.publishable_key.clone(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    /// Classifies a transport-level failure.
    fn transport(err: reqwest::Error) -> StoreError {
        if err.is_timeout() {
            StoreError::Timeout
        } else if err.is_connect() {
            StoreError::ConnectionFailed {
                reason: err.to_string(),
            }
        } else {
            StoreError::InvalidResponse {
                reason: err.to_string(),
            }
        }
    }

    /// Reads the error message the auth API puts in its response bodies.
    async fn error_message(response: Response) -> (StatusCode, String) {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        #[derive(Deserialize)]
        struct ErrorBody {
            #[serde(default)]
            msg: Option<String>,
            #[serde(default)]
            message: Option<String>,
            #[serde(default)]
            error_description: Option<String>,
            #[serde(default)]
            error: Option<String>,
        }

        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|b| b.msg.or(b.message).or(b.error_description).or(b.error))
            .unwrap_or(text);

        (status, message)
    }

    /// Reads a row-set response from the REST interface.
    async fn read_rows(response: Response) -> Result<Vec<SubscriptionRecord>, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let (status, message) = Self::error_message(response).await;
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Vec<SubscriptionRecord>>()
            .await
            .map_err(|e| StoreError::InvalidResponse {
                reason: e.to_string(),
            })
    }

    async fn update_rows(
        &self,
        payment_id: &PaymentId,
        body: serde_json::Value,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let response = self
            .http
            .patch(self.table_url(SUBSCRIPTIONS_TABLE))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .query(&[("payment_id", format!("eq.{payment_id}"))])
            .json(&body)
            .send()
            .await
            .map_err(Self::transport)?;

        let rows = Self::read_rows(response).await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl IdentityProvider for BackendClient {
    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let response = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(Self::transport)?;

        let status = response.status();
        if !status.is_success() {
            let (status, message) = Self::error_message(response).await;
            // Client-side rejections mean the store refused the account;
            // anything else is a service failure.
            if status.is_client_error() {
                return Err(IdentityError::CreationRejected { reason: message });
            }
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        // The auth API returns either a full session (confirmation
        // disabled) or a bare user object (confirmation pending).
        #[derive(Deserialize)]
        struct SignUpResponse {
            #[serde(default)]
            user: Option<Identity>,
            #[serde(default)]
            id: Option<UserId>,
            #[serde(default)]
            email: Option<String>,
        }

        let body: SignUpResponse =
            response
                .json()
                .await
                .map_err(|e| StoreError::InvalidResponse {
                    reason: e.to_string(),
                })?;

        let identity = match (body.user, body.id, body.email) {
            (Some(user), _, _) => user,
            (None, Some(id), Some(email)) => Identity { id, email },
            _ => {
                return Err(StoreError::InvalidResponse {
                    reason: "sign-up response carried no user".to_string(),
                }
                .into());
            }
        };

        debug!(user_id = %identity.id, "identity created");
        Ok(identity)
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let response = self
            .http
            .post(self.auth_url("token"))
            .header("apikey", &self.api_key)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(Self::transport)?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
                return Err(IdentityError::InvalidCredentials);
            }
            let (status, message) = Self::error_message(response).await;
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let session: Session =
            response
                .json()
                .await
                .map_err(|e| StoreError::InvalidResponse {
                    reason: e.to_string(),
                })?;

        debug!(user_id = %session.user.id, "session issued");
        Ok(session)
    }

    #[instrument(skip(self, access_token))]
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let response = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(Self::transport)?;

        let status = response.status();
        if !status.is_success() {
            let (status, message) = Self::error_message(response).await;
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        Ok(())
    }

    #[instrument(skip(self, access_token))]
    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, IdentityError> {
        let response = self
            .http
            .get(self.auth_url("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(Self::transport)?;

        let status = response.status();
        // An unusable token is "no session", not a failure.
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            let (status, message) = Self::error_message(response).await;
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let user: Identity = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse {
                reason: e.to_string(),
            })?;

        Ok(Some(Session::from_validated_token(access_token, user)))
    }
}

#[async_trait]
impl SubscriptionStore for BackendClient {
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    async fn find_completed_payment(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let response = self
            .http
            .get(self.table_url(SUBSCRIPTIONS_TABLE))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&[
                ("select", "*".to_string()),
                ("payment_id", format!("eq.{payment_id}")),
                ("payment_status", "eq.completed".to_string()),
                ("limit", "1".to_string()),
            ])
            .send()
            .await
            .map_err(Self::transport)?;

        let rows = Self::read_rows(response).await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn find_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let response = self
            .http
            .get(self.table_url(SUBSCRIPTIONS_TABLE))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("subscription_status", "eq.active".to_string()),
                ("limit", "1".to_string()),
            ])
            .send()
            .await
            .map_err(Self::transport)?;

        let rows = Self::read_rows(response).await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self, record), fields(payment_id = %record.payment_id))]
    async fn insert(
        &self,
        record: NewSubscriptionRecord,
    ) -> Result<SubscriptionRecord, StoreError> {
        let response = self
            .http
            .post(self.table_url(SUBSCRIPTIONS_TABLE))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await
            .map_err(Self::transport)?;

        let rows = Self::read_rows(response).await?;
        rows.into_iter().next().ok_or(StoreError::InvalidResponse {
            reason: "insert returned no row".to_string(),
        })
    }

    #[instrument(skip(self), fields(payment_id = %payment_id, user_id = %user_id))]
    async fn link_user(
        &self,
        payment_id: &PaymentId,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        self.update_rows(payment_id, json!({ "user_id": user_id }))
            .await
    }

    #[instrument(skip(self), fields(payment_id = %payment_id))]
    async fn mark_payment_completed(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        self.update_rows(payment_id, json!({ "payment_status": "completed" }))
            .await
    }
}

#[async_trait]
impl AnalyticsSink for BackendClient {
    #[instrument(skip(self, event), fields(action = %event.action))]
    async fn record(&self, event: AnalyticsEvent) -> Result<(), StoreError> {
        let response = self
            .http
            .post(self.table_url(ANALYTICS_TABLE))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&event)
            .send()
            .await
            .map_err(Self::transport)?;

        let status = response.status();
        if !status.is_success() {
            let (status, message) = Self::error_message(response).await;
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
