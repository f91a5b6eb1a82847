//! HTTP routes exposing the gate operations.
//!
//! This is the whole produced contract to the presentation layer: six gate
//! operations plus the protected dashboard check. No business rule lives
//! here; handlers unpack the request, call the gate, and render the result.

use crate::error::ApiError;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use inner_circle_backend::{Identity, Plan, Session, SubscriptionRecord};
use inner_circle_core::PaymentId;
use inner_circle_gate::{AccessDecision, Gate};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Builds the API router over a gate.
pub fn router(gate: Gate) -> Router {
    Router::new()
        .route("/api/auth/signup", post(sign_up))
        .route("/api/auth/signin", post(sign_in))
        .route("/api/auth/signout", post(sign_out))
        .route("/api/checkout", post(create_checkout))
        .route("/api/webhooks/payment", post(confirm_payment))
        .route("/api/dashboard", get(dashboard))
        .with_state(gate)
}

/// Pulls the bearer token out of the Authorization header, if any.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[derive(Debug, Deserialize)]
struct SignUpRequest {
    email: String,
    password: String,
    payment_id: PaymentId,
}

#[derive(Debug, Serialize)]
struct SignUpResponse {
    user: Identity,
    subscription: SubscriptionRecord,
}

async fn sign_up(
    State(gate): State<Gate>,
    Json(request): Json<SignUpRequest>,
) -> Result<Json<SignUpResponse>, ApiError> {
    let outcome = gate
        .sign_up_with_payment(&request.email, &request.password, &request.payment_id)
        .await?;

    Ok(Json(SignUpResponse {
        user: outcome.identity,
        subscription: outcome.subscription,
    }))
}

#[derive(Debug, Deserialize)]
struct SignInRequest {
    email: String,
    password: String,
}

async fn sign_in(
    State(gate): State<Gate>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<Session>, ApiError> {
    let session = gate.sign_in(&request.email, &request.password).await?;
    Ok(Json(session))
}

async fn sign_out(State(gate): State<Gate>, headers: HeaderMap) -> Result<StatusCode, ApiError> {
    let Some(token) = bearer_token(&headers) else {
        return Ok(StatusCode::NO_CONTENT);
    };
    gate.sign_out(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct CheckoutRequest {
    email: String,
    plan: Plan,
    payment_id: PaymentId,
    /// Amount charged; defaults to the plan's monthly price.
    #[serde(default)]
    amount: Option<f64>,
}

async fn create_checkout(
    State(gate): State<Gate>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<SubscriptionRecord>, ApiError> {
    let amount = request.amount.unwrap_or(request.plan.monthly_price());
    let record = gate
        .create_pending_payment(&request.email, request.plan, request.payment_id, amount)
        .await?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
struct PaymentWebhook {
    payment_id: PaymentId,
}

async fn confirm_payment(
    State(gate): State<Gate>,
    Json(webhook): Json<PaymentWebhook>,
) -> Result<Json<SubscriptionRecord>, ApiError> {
    let record = gate.confirm_payment(&webhook.payment_id).await?;
    Ok(Json(record))
}

const DASHBOARD_PAGE: &str = "/dashboard";
const SIGNIN_REDIRECT: &str = "/auth";
const NO_SUBSCRIPTION_REDIRECT: &str = "/auth?error=no_subscription";

async fn dashboard(State(gate): State<Gate>, headers: HeaderMap) -> Result<Response, ApiError> {
    let decision = gate
        .authorize_page(bearer_token(&headers), DASHBOARD_PAGE)
        .await?;

    let response = match decision {
        AccessDecision::Granted { subscription, .. } => {
            Json(json!({ "subscription": *subscription })).into_response()
        }
        AccessDecision::SignedOut => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "redirect": SIGNIN_REDIRECT })),
        )
            .into_response(),
        AccessDecision::NoActiveSubscription { .. } => (
            StatusCode::FORBIDDEN,
            Json(json!({ "redirect": NO_SUBSCRIPTION_REDIRECT })),
        )
            .into_response(),
    };

    Ok(response)
}
