// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Harness for end-to-end spec tests: an in-process mock of every external
//! API the engine talks to, plus an engine instance served on a real port.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, post};
use axum::{Json, Router};

use challenge_engine::config::EngineConfig;
use challenge_engine::state::EngineState;
use challenge_engine::store::{
    BalanceTier, BrokerAccount, Challenge, ChallengeRelation, ChallengeStatus, Stage,
    StoreFixture, User,
};
use challenge_engine::transport::build_router;

pub const FALLBACK_KEY: &str = "bridge-key";
pub const PRIOR_LOGIN: &str = "9000";

/// Recorded traffic and programmable failures for the mock remote.
#[derive(Default)]
pub struct RemoteState {
    pub tokens_issued: AtomicU32,
    pub fail_primary: AtomicU32,
    pub fail_fallback: AtomicU32,
    pub created: Mutex<Vec<serde_json::Value>>,
    pub primary_deposits: Mutex<Vec<serde_json::Value>>,
    pub fallback_deposits: Mutex<Vec<serde_json::Value>>,
    pub notifications: Mutex<Vec<serde_json::Value>>,
    pub certificates: Mutex<Vec<serde_json::Value>>,
    pub evicted: Mutex<Vec<String>>,
    next_login: AtomicU32,
}

/// One mock server standing in for the platform, the funding bridge, and all
/// collaborator services at once.
pub struct MockRemote {
    pub base_url: String,
    pub state: Arc<RemoteState>,
}

impl MockRemote {
    pub async fn spawn() -> anyhow::Result<Self> {
        let state = Arc::new(RemoteState::default());
        let app = Router::new()
            .route("/api/token", post(token))
            .route("/api/accounts", post(create_account))
            .route("/api/deposits", post(primary_deposit))
            .route("/api/transactions", post(fallback_deposit))
            .route("/api/v1/notifications", post(notification))
            .route("/api/v1/certificates", post(certificate))
            .route("/api/v1/accounts/{login}", delete(evict))
            .with_state(Arc::clone(&state));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(Self { base_url: format!("http://{addr}"), state })
    }
}

async fn token(State(s): State<Arc<RemoteState>>) -> Json<serde_json::Value> {
    let n = s.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;
    Json(serde_json::json!({ "token": format!("token-{n}") }))
}

async fn create_account(
    State(s): State<Arc<RemoteState>>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let login = 100_000 + s.next_login.fetch_add(1, Ordering::SeqCst) as u64 + 1;
    let balance = body.get("balance").cloned().unwrap_or_default();
    s.created.lock().unwrap().push(body);
    Json(serde_json::json!({ "accountID": login, "balance": balance }))
}

async fn primary_deposit(
    State(s): State<Arc<RemoteState>>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    if s.fail_primary.load(Ordering::SeqCst) > 0 {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({"error": "ledger"})));
    }
    s.primary_deposits.lock().unwrap().push(body);
    (StatusCode::OK, Json(serde_json::json!({"ack": true})))
}

async fn fallback_deposit(
    State(s): State<Arc<RemoteState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some(FALLBACK_KEY) {
        return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({"error": "bad key"})));
    }
    if s.fail_fallback.load(Ordering::SeqCst) > 0 {
        return (StatusCode::BAD_GATEWAY, Json(serde_json::json!({"error": "bridge"})));
    }
    s.fallback_deposits.lock().unwrap().push(body);
    (StatusCode::OK, Json(serde_json::json!({"ack": true})))
}

async fn notification(
    State(s): State<Arc<RemoteState>>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    s.notifications.lock().unwrap().push(body);
    StatusCode::OK
}

async fn certificate(
    State(s): State<Arc<RemoteState>>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    s.certificates.lock().unwrap().push(body);
    StatusCode::OK
}

async fn evict(State(s): State<Arc<RemoteState>>, Path(login): Path<String>) -> StatusCode {
    s.evicted.lock().unwrap().push(login);
    StatusCode::OK
}

/// An engine instance bound to a real TCP port.
pub struct Engine {
    pub base_url: String,
    pub state: Arc<EngineState>,
    pub client: reqwest::Client,
}

impl Engine {
    /// Spawn an engine wired entirely against `remote`, seeded with `fixture`.
    pub async fn spawn(remote: &MockRemote, fixture: StoreFixture) -> anyhow::Result<Self> {
        let config = EngineConfig {
            host: "127.0.0.1".into(),
            port: 0,
            auth_token: None,
            platform_url: remote.base_url.clone(),
            platform_username: "svc".into(),
            platform_password: "pw".into(),
            funding_url: remote.base_url.clone(),
            funding_api_key: FALLBACK_KEY.into(),
            notifier_url: remote.base_url.clone(),
            certificates_url: remote.base_url.clone(),
            buffer_url: remote.base_url.clone(),
            server_name: "Live-01".into(),
            platform_tag: "mt5".into(),
            leverage: 100,
            http_timeout_ms: 5000,
            token_ttl_secs: 900,
            store_fixture: None,
        };
        let state = Arc::new(EngineState::from_config(config)?);
        state.store.load_fixture(fixture).await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let router = build_router(Arc::clone(&state));
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self { base_url: format!("http://{addr}"), state, client: reqwest::Client::new() })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Standard three-phase fixture: one user, one relation with tiers
/// 10k/50k/100k, one open challenge at `num_phase` with a prior account.
pub fn fixture(num_phase: u32) -> StoreFixture {
    StoreFixture {
        users: vec![User {
            id: "u1".into(),
            email: "trader@example.com".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            is_verified: true,
            address: Some("1 Analytical Row".into()),
            phone: Some("+1 555 0100".into()),
            country: Some("GB".into()),
            city: Some("London".into()),
        }],
        relations: vec![ChallengeRelation {
            id: "r1".into(),
            group_name: "demo\\eval".into(),
            stages: (1..=3)
                .map(|p| Stage { num_phase: p, parameters: serde_json::Value::Null })
                .collect(),
            balances: [10_000, 50_000, 100_000]
                .iter()
                .map(|&amount| BalanceTier { amount, price: None, discount: None })
                .collect(),
        }],
        challenges: vec![Challenge {
            id: "ch-1".into(),
            user_id: "u1".into(),
            relation_id: "r1".into(),
            num_phase,
            status: ChallengeStatus::Approvable,
            is_active: true,
            dynamic_balance: Some(50_000),
            start_date: 1,
            end_date: None,
            parent_id: None,
            broker_account_id: Some("a0".into()),
        }],
        broker_accounts: vec![BrokerAccount {
            id: "a0".into(),
            login: PRIOR_LOGIN.into(),
            master_password: "m".into(),
            investor_password: "i".into(),
            platform: "mt5".into(),
            server: "Live-01".into(),
            initial_balance: 25_000,
            used: true,
        }],
    }
}
