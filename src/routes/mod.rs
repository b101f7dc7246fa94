//! HTTP surface of the bridge.
//!
//! | Route                          | Effect                          |
//! |--------------------------------|---------------------------------|
//! | `GET /health`                  | liveness probe                  |
//! | `GET /power/{vm}`              | report the power state          |
//! | `POST /power/on/{vm}`          | power on                        |
//! | `POST /power/off/{vm}`         | power off                       |
//! | `POST /power/reset/{vm}`       | reset                           |
//! | `POST /power/suspend/{vm}`     | suspend                         |
//! | `POST /power/cycle/{vm}`       | power off, then on              |
//!
//! An inbound `Authorization` header is forwarded to the vSphere login in
//! place of the configured credentials.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::chain::ErrorChain;
use crate::logging;
use crate::power::{PowerAction, PowerExecutor};
use crate::vsphere::ApiError;

/// Builds the router serving every bridge endpoint.
#[must_use]
pub fn router(executor: PowerExecutor) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/power/:vm", get(power_state))
        .route("/power/on/:vm", post(power_on))
        .route("/power/off/:vm", post(power_off))
        .route("/power/reset/:vm", post(reset))
        .route("/power/suspend/:vm", post(suspend))
        .route("/power/cycle/:vm", post(cycle))
        .with_state(executor)
}

/// Failure rendered as `{"error": "..."}` with a status derived from the
/// chain's root cause.
#[derive(Debug)]
pub struct RouteError(ErrorChain);

impl RouteError {
    /// Status code reported for this failure.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self.0.find::<ApiError>() {
            Some(ApiError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Some(ApiError::MissingCredentials) => StatusCode::UNAUTHORIZED,
            Some(
                ApiError::UpstreamRejected { .. }
                | ApiError::Transport { .. }
                | ApiError::EmptyToken
                | ApiError::Decode(_),
            ) => StatusCode::BAD_GATEWAY,
            Some(ApiError::InvalidRequest { .. }) | None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ErrorChain> for RouteError {
    fn from(value: ErrorChain) -> Self {
        Self(value)
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        logging::error(&self.0);
        let status = self.status();
        (status, Json(json!({ "error": self.0.short_message() }))).into_response()
    }
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn power_state(
    State(executor): State<PowerExecutor>,
    Path(vm): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, RouteError> {
    let state = executor.get(&vm, authorization(&headers)).await?;
    Ok(Json(json!({ "result": "ok", "state": state })))
}

async fn apply(
    executor: &PowerExecutor,
    vm: &str,
    headers: &HeaderMap,
    action: PowerAction,
) -> Result<Json<Value>, RouteError> {
    executor
        .set_power(vm, action, authorization(headers))
        .await?;
    Ok(Json(json!({ "result": "ok" })))
}

async fn power_on(
    State(executor): State<PowerExecutor>,
    Path(vm): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, RouteError> {
    apply(&executor, &vm, &headers, PowerAction::Start).await
}

async fn power_off(
    State(executor): State<PowerExecutor>,
    Path(vm): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, RouteError> {
    apply(&executor, &vm, &headers, PowerAction::Stop).await
}

async fn reset(
    State(executor): State<PowerExecutor>,
    Path(vm): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, RouteError> {
    apply(&executor, &vm, &headers, PowerAction::Reset).await
}

async fn suspend(
    State(executor): State<PowerExecutor>,
    Path(vm): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, RouteError> {
    apply(&executor, &vm, &headers, PowerAction::Suspend).await
}

async fn cycle(
    State(executor): State<PowerExecutor>,
    Path(vm): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, RouteError> {
    executor.cycle(&vm, authorization(&headers)).await?;
    Ok(Json(json!({ "result": "ok" })))
}

#[cfg(test)]
mod tests;
