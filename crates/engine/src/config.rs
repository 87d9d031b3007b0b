// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Configuration for the challenge engine.
#[derive(Debug, Clone, clap::Args)]
pub struct EngineConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "CHALLENGE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 9700, env = "CHALLENGE_PORT")]
    pub port: u16,

    /// Bearer token for API auth. If unset, auth is disabled.
    #[arg(long, env = "CHALLENGE_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Base URL of the account-creation API.
    #[arg(long, env = "CHALLENGE_PLATFORM_URL")]
    pub platform_url: String,

    /// Username for the creation API token exchange.
    #[arg(long, env = "CHALLENGE_PLATFORM_USERNAME")]
    pub platform_username: String,

    /// Password for the creation API token exchange.
    #[arg(long, env = "CHALLENGE_PLATFORM_PASSWORD")]
    pub platform_password: String,

    /// Base URL of the fallback funding API.
    #[arg(long, env = "CHALLENGE_FUNDING_URL")]
    pub funding_url: String,

    /// Static API key for the fallback funding API.
    #[arg(long, env = "CHALLENGE_FUNDING_API_KEY")]
    pub funding_api_key: String,

    /// Base URL of the notification dispatcher.
    #[arg(long, env = "CHALLENGE_NOTIFIER_URL")]
    pub notifier_url: String,

    /// Base URL of the certificate issuer.
    #[arg(long, env = "CHALLENGE_CERTIFICATES_URL")]
    pub certificates_url: String,

    /// Base URL of the hot-account buffer cache.
    #[arg(long, env = "CHALLENGE_BUFFER_URL")]
    pub buffer_url: String,

    /// Trading-server identity stamped on provisioned accounts.
    #[arg(long, default_value = "Live-01", env = "CHALLENGE_SERVER_NAME")]
    pub server_name: String,

    /// Platform tag stamped on provisioned accounts.
    #[arg(long, default_value = "mt5", env = "CHALLENGE_PLATFORM_TAG")]
    pub platform_tag: String,

    /// Leverage requested for provisioned accounts.
    #[arg(long, default_value_t = 100, env = "CHALLENGE_LEVERAGE")]
    pub leverage: u32,

    /// Timeout for outbound HTTP requests, in milliseconds.
    #[arg(long, default_value_t = 10000, env = "CHALLENGE_HTTP_TIMEOUT_MS")]
    pub http_timeout_ms: u64,

    /// Platform session token lifetime, in seconds.
    #[arg(long, default_value_t = 900, env = "CHALLENGE_TOKEN_TTL_SECS")]
    pub token_ttl_secs: u64,

    /// Path to a JSON fixture that seeds the in-memory store at startup.
    #[arg(long, env = "CHALLENGE_STORE_FIXTURE")]
    pub store_fixture: Option<std::path::PathBuf>,
}

impl EngineConfig {
    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.http_timeout_ms)
    }

    pub fn token_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.token_ttl_secs)
    }
}
