// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the account-creation API and the primary deposit route.

use rand::distr::Alphanumeric;
use rand::Rng;
use serde::Serialize;

use crate::platform::funding::FundingFallbackClient;
use crate::platform::token::TokenBroker;
use crate::platform::{
    CreateAccountRequest, CreateAccountResponse, DepositApi, DepositOutcome, FundingPath,
    PlatformError, PrimaryDepositRequest, ProvisionedAccount, ProvisioningApi, TraderProfile,
};

const PASSWORD_LEN: usize = 12;
const NAME_SUFFIX_LEN: usize = 4;
const PAYMENT_METHOD: &str = "bank_transfer";

/// Client for the external creation API. Owns the token broker and the
/// funding fallback so the whole provisioning call chain hangs off one value.
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
    leverage: u32,
    tokens: TokenBroker,
    fallback: FundingFallbackClient,
}

impl PlatformClient {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        leverage: u32,
        tokens: TokenBroker,
        fallback: FundingFallbackClient,
    ) -> Self {
        Self { http, base_url, leverage, tokens, fallback }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST with bearer auth and the single-retry 401 discipline: one token
    /// refresh + replay, then surface `Unauthorized`. Status of the returned
    /// response is otherwise unchecked.
    async fn post_authed<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, PlatformError> {
        let token = self.tokens.ensure_valid().await?;
        let resp =
            self.http.post(self.url(path)).bearer_auth(&token).json(body).send().await?;
        if resp.status() != reqwest::StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        let rejected_body = resp.text().await.unwrap_or_default();
        tracing::debug!(path, "platform rejected token, refreshing once");
        let fresh = self.tokens.refresh_after_reject(&token).await?;
        let retry =
            self.http.post(self.url(path)).bearer_auth(&fresh).json(body).send().await?;
        if retry.status() == reqwest::StatusCode::UNAUTHORIZED {
            let body = retry.text().await.unwrap_or(rejected_body);
            return Err(PlatformError::Unauthorized { body });
        }
        Ok(retry)
    }

    async fn post_create(
        &self,
        request: &CreateAccountRequest,
    ) -> Result<CreateAccountResponse, PlatformError> {
        let resp = self.post_authed("/api/accounts", request).await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PlatformError::Remote { status: status.as_u16(), body });
        }
        Ok(resp.json().await?)
    }

    async fn primary_deposit(
        &self,
        login: &str,
        amount: i64,
        comment: &str,
    ) -> Result<(), PlatformError> {
        let request = PrimaryDepositRequest {
            login,
            amount,
            comment,
            payment_method: PAYMENT_METHOD,
        };
        let resp = self.post_authed("/api/deposits", &request).await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PlatformError::Remote { status: status.as_u16(), body });
        }
        Ok(())
    }
}

impl ProvisioningApi for PlatformClient {
    /// Create a platform account.
    ///
    /// Both passwords are generated here, before the remote call, so the
    /// caller always holds full credentials on success. A duplicate display
    /// name (remote 409) is retried once with a random suffix appended.
    async fn create_account(
        &self,
        profile: &TraderProfile,
        group_name: &str,
        balance: i64,
    ) -> Result<ProvisionedAccount, PlatformError> {
        let master_password = generate_password(PASSWORD_LEN);
        let investor_password = generate_password(PASSWORD_LEN);

        let mut attempt = 0;
        loop {
            let request = CreateAccountRequest {
                name: display_name(profile, attempt),
                group_name: group_name.to_owned(),
                email: profile.email.clone(),
                phone: profile.phone.clone(),
                country: profile.country.clone(),
                city: profile.city.clone(),
                address: profile.address.clone(),
                balance,
                master_password: master_password.clone(),
                investor_password: investor_password.clone(),
                leverage: self.leverage,
            };

            match self.post_create(&request).await {
                Ok(created) => {
                    tracing::info!(
                        login = created.account_id,
                        group = group_name,
                        balance,
                        "platform account created"
                    );
                    return Ok(ProvisionedAccount {
                        login: created.account_id.to_string(),
                        master_password,
                        investor_password,
                        balance,
                    });
                }
                Err(PlatformError::Remote { status: 409, body }) if attempt == 0 => {
                    tracing::debug!(body = %body, "display name taken, retrying with suffix");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Try the primary deposit, then the fallback API. Both failing is a
    /// soft outcome: the account stays created with a zero ledger balance.
    async fn make_initial_deposit(&self, login: &str, amount: i64) -> DepositOutcome {
        let primary_err = match self.deposit(login, amount, "initial balance").await {
            Ok(()) => return DepositOutcome::Funded { via: FundingPath::Primary },
            Err(e) => e,
        };
        tracing::warn!(login, err = %primary_err, "primary deposit failed, trying fallback");

        let fallback_err = match self.fallback.deposit(login, amount, "initial balance").await {
            Ok(()) => return DepositOutcome::Funded { via: FundingPath::Fallback },
            Err(e) => e,
        };
        tracing::warn!(
            login,
            primary = %primary_err,
            fallback = %fallback_err,
            "initial deposit failed on both routes, account left unfunded"
        );
        DepositOutcome::Unfunded { primary: primary_err, fallback: fallback_err }
    }
}

impl DepositApi for PlatformClient {
    async fn deposit(&self, login: &str, amount: i64, comment: &str) -> Result<(), PlatformError> {
        self.primary_deposit(login, amount, comment).await
    }
}

/// Random alphanumeric password, generated locally.
fn generate_password(len: usize) -> String {
    rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

/// Display name for the remote account: base `first last`, with a random
/// suffix on retry to dodge duplicate-name conflicts.
fn display_name(profile: &TraderProfile, attempt: u32) -> String {
    let base = format!("{} {}", profile.first_name, profile.last_name);
    if attempt == 0 {
        return base;
    }
    let suffix: String =
        rand::rng().sample_iter(Alphanumeric).take(NAME_SUFFIX_LEN).map(char::from).collect();
    format!("{base} {suffix}")
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
