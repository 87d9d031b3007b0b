// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Challenge engine: lifecycle orchestration for staged evaluation accounts.

pub mod collab;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod platform;
pub mod state;
pub mod store;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::state::EngineState;
use crate::store::StoreFixture;
use crate::transport::build_router;

/// Run the engine until shutdown.
pub async fn run(config: EngineConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let state = EngineState::from_config(config)?;

    if let Some(ref path) = state.config.store_fixture {
        let contents = std::fs::read_to_string(path)?;
        let fixture: StoreFixture = serde_json::from_str(&contents)?;
        state.store.load_fixture(fixture).await;
        tracing::info!(
            path = %path.display(),
            challenges = state.store.challenge_count().await,
            "store fixture loaded"
        );
    }

    tracing::info!("challenge engine listening on {addr}");
    let router = build_router(Arc::new(state));
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
