// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the challenge engine API.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::lifecycle::LifecycleError;
use crate::platform::{DepositOutcome, FundingPath};
use crate::state::EngineState;
use crate::store::Challenge;

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub challenge_count: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct DisapproveRequest {
    #[serde(default)]
    pub observation: Option<String>,
}

/// Summary of a provisioned next-phase account. Passwords are delivered via
/// the notification channel only, never echoed through this API.
#[derive(Debug, Serialize)]
pub struct ProvisioningSummary {
    pub challenge_id: String,
    pub login: String,
    pub server: String,
    pub balance: i64,
    pub funded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funded_via: Option<FundingPath>,
}

#[derive(Debug, Serialize)]
pub struct ApproveResponse {
    pub challenge: Challenge,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioned: Option<ProvisioningSummary>,
}

#[derive(Debug, Serialize)]
pub struct DisapproveResponse {
    pub challenge: Challenge,
}

fn lifecycle_error_response(e: &LifecycleError) -> (ApiError, String) {
    let code = match e {
        LifecycleError::ChallengeNotFound(_) => ApiError::ChallengeNotFound,
        LifecycleError::AlreadySettled { .. } => ApiError::AlreadySettled,
        LifecycleError::Provisioning(_) => ApiError::PlatformError,
        LifecycleError::RelationNotFound(_)
        | LifecycleError::UserNotFound(_)
        | LifecycleError::BalanceUnresolved(_)
        | LifecycleError::Dispatch(_) => ApiError::Internal,
    };
    (code, e.to_string())
}

// -- Handlers -----------------------------------------------------------------

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<EngineState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "running".to_owned(),
        challenge_count: s.store.challenge_count().await,
    })
}

/// `GET /api/v1/challenges/{id}`
pub async fn get_challenge(
    State(s): State<Arc<EngineState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match s.store.challenge(&id).await {
        Some(challenge) => Json(challenge).into_response(),
        None => ApiError::ChallengeNotFound
            .to_http_response(format!("challenge not found: {id}"))
            .into_response(),
    }
}

/// `POST /api/v1/challenges/{id}/approve`
pub async fn approve_challenge(
    State(s): State<Arc<EngineState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match s.lifecycle.approve(&id).await {
        Ok(outcome) => {
            let provisioned = match (outcome.next_challenge, outcome.account, outcome.funding) {
                (Some(next), Some(account), funding) => Some(ProvisioningSummary {
                    challenge_id: next.id,
                    login: account.login,
                    server: account.server,
                    balance: account.initial_balance,
                    funded: funding.as_ref().is_some_and(DepositOutcome::is_funded),
                    funded_via: funding.as_ref().and_then(DepositOutcome::path),
                }),
                _ => None,
            };
            Json(ApproveResponse { challenge: outcome.challenge, provisioned }).into_response()
        }
        Err(e) => {
            tracing::warn!(challenge_id = %id, err = %e, "approval failed");
            let (code, message) = lifecycle_error_response(&e);
            code.to_http_response(message).into_response()
        }
    }
}

/// `POST /api/v1/challenges/{id}/disapprove`
pub async fn disapprove_challenge(
    State(s): State<Arc<EngineState>>,
    Path(id): Path<String>,
    body: Option<Json<DisapproveRequest>>,
) -> impl IntoResponse {
    let observation = body.and_then(|Json(req)| req.observation);
    match s.lifecycle.disapprove(&id, observation).await {
        Ok(outcome) => Json(DisapproveResponse { challenge: outcome.challenge }).into_response(),
        Err(e) => {
            tracing::warn!(challenge_id = %id, err = %e, "disapproval failed");
            let (code, message) = lifecycle_error_response(&e);
            code.to_http_response(message).into_response()
        }
    }
}
