// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer-token broker for the account-creation API.
//!
//! The platform issues short-lived session tokens (15 minutes) from a
//! username/password exchange. One broker instance serves the whole process;
//! the cached token lives behind a mutex that is held across the exchange,
//! so concurrent callers that observe a stale token share a single in-flight
//! refresh instead of each performing their own.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::platform::{PlatformError, TokenResponse};

#[derive(Clone)]
struct CachedToken {
    value: String,
    fetched_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Process-wide cache for the creation API's session token.
pub struct TokenBroker {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    ttl: Duration,
    slot: Mutex<Option<CachedToken>>,
}

impl TokenBroker {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        username: String,
        password: String,
        ttl: Duration,
    ) -> Self {
        Self { http, base_url, username, password, ttl, slot: Mutex::new(None) }
    }

    /// Return a token younger than the TTL, exchanging credentials if the
    /// cached one is missing or stale. Exchange failure propagates unchanged.
    pub async fn ensure_valid(&self) -> Result<String, PlatformError> {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.is_fresh(self.ttl) {
                return Ok(cached.value.clone());
            }
        }
        let value = self.exchange().await?;
        *slot = Some(CachedToken { value: value.clone(), fetched_at: Instant::now() });
        Ok(value)
    }

    /// Replace a token the remote just rejected.
    ///
    /// If the cache already holds a different token, another caller refreshed
    /// while we were in flight; return that one without a second exchange.
    pub async fn refresh_after_reject(&self, stale: &str) -> Result<String, PlatformError> {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.value != stale && cached.is_fresh(self.ttl) {
                return Ok(cached.value.clone());
            }
        }
        let value = self.exchange().await?;
        *slot = Some(CachedToken { value: value.clone(), fetched_at: Instant::now() });
        Ok(value)
    }

    async fn exchange(&self) -> Result<String, PlatformError> {
        let resp = self
            .http
            .post(format!("{}/api/token", self.base_url))
            .json(&serde_json::json!({
                "username": self.username,
                "password": self.password,
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PlatformError::Remote { status: status.as_u16(), body });
        }

        let token: TokenResponse = resp.json().await?;
        tracing::debug!("platform session token exchanged");
        Ok(token.token)
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
