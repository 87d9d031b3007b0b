// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use crate::collab::{HttpBufferCache, HttpCertificateIssuer, HttpNotifier};
use crate::config::EngineConfig;
use crate::lifecycle::Lifecycle;
use crate::platform::client::PlatformClient;
use crate::platform::funding::FundingFallbackClient;
use crate::platform::token::TokenBroker;
use crate::store::memory::MemoryStore;

/// Production lifecycle wiring: real platform clients, real collaborators.
pub type EngineLifecycle =
    Lifecycle<PlatformClient, HttpNotifier, HttpCertificateIssuer, HttpBufferCache>;

/// Shared engine state.
pub struct EngineState {
    pub config: EngineConfig,
    pub store: Arc<MemoryStore>,
    pub lifecycle: EngineLifecycle,
}

impl EngineState {
    /// Wire up the store, platform clients, and collaborators from config.
    pub fn from_config(config: EngineConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(config.http_timeout()).build()?;
        let store = Arc::new(MemoryStore::new());

        let tokens = TokenBroker::new(
            http.clone(),
            config.platform_url.clone(),
            config.platform_username.clone(),
            config.platform_password.clone(),
            config.token_ttl(),
        );
        let fallback = FundingFallbackClient::new(
            http.clone(),
            config.funding_url.clone(),
            config.funding_api_key.clone(),
        );
        let platform = PlatformClient::new(
            http.clone(),
            config.platform_url.clone(),
            config.leverage,
            tokens,
            fallback,
        );

        let lifecycle = Lifecycle::new(
            Arc::clone(&store),
            platform,
            HttpNotifier::new(http.clone(), config.notifier_url.clone()),
            HttpCertificateIssuer::new(http.clone(), config.certificates_url.clone()),
            HttpBufferCache::new(http, config.buffer_url.clone()),
            config.server_name.clone(),
            config.platform_tag.clone(),
        );

        Ok(Self { config, store, lifecycle })
    }
}
