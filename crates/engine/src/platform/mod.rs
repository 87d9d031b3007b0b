// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trading-platform integration: token broker, account creation, funding.
//!
//! Two external APIs are involved. The creation API owns account existence
//! and the primary deposit route (bearer auth via [`token::TokenBroker`]);
//! the bridge API is an independently-authenticated fallback used only when
//! the primary deposit fails. Account creation is must-succeed; the initial
//! deposit is best-effort and reported through [`DepositOutcome`] rather
//! than an error.

pub mod client;
pub mod funding;
pub mod token;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

use crate::store::User;

/// Errors surfaced by the platform HTTP clients.
///
/// `Unauthorized` means the single refresh-and-replay allowance was already
/// spent; callers must not retry further.
#[derive(Debug)]
pub enum PlatformError {
    /// Authorization rejected after one token refresh + replay.
    Unauthorized { body: String },
    /// Remote returned a non-success status.
    Remote { status: u16, body: String },
    /// Request never produced a usable response (connect, timeout, decode).
    Transport(reqwest::Error),
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized { body } => {
                write!(f, "platform authorization rejected after refresh: {body}")
            }
            Self::Remote { status, body } => write!(f, "platform returned {status}: {body}"),
            Self::Transport(e) => write!(f, "platform request failed: {e}"),
        }
    }
}

impl std::error::Error for PlatformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PlatformError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e)
    }
}

/// Trader identity fields sent with an account-creation request.
#[derive(Debug, Clone)]
pub struct TraderProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub city: String,
    pub address: String,
}

impl TraderProfile {
    pub fn from_user(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            country: user.country.clone().unwrap_or_default(),
            city: user.city.clone().unwrap_or_default(),
            address: user.address.clone().unwrap_or_default(),
        }
    }
}

/// Full credentials for a freshly created platform account.
///
/// Passwords are generated locally before the remote call, so they are always
/// present regardless of what the remote echoes back.
#[derive(Debug, Clone)]
pub struct ProvisionedAccount {
    pub login: String,
    pub master_password: String,
    pub investor_password: String,
    pub balance: i64,
}

/// Which deposit route ended up funding the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FundingPath {
    Primary,
    Fallback,
}

/// Outcome of the best-effort initial deposit.
///
/// `Unfunded` is a soft failure: the account exists with a zero ledger
/// balance and is reconciled out-of-band. It never aborts provisioning.
#[derive(Debug)]
pub enum DepositOutcome {
    Funded { via: FundingPath },
    Unfunded { primary: PlatformError, fallback: PlatformError },
}

impl DepositOutcome {
    pub fn is_funded(&self) -> bool {
        matches!(self, Self::Funded { .. })
    }

    pub fn path(&self) -> Option<FundingPath> {
        match self {
            Self::Funded { via } => Some(*via),
            Self::Unfunded { .. } => None,
        }
    }
}

/// Account provisioning as consumed by the lifecycle engine.
///
/// The production implementation is [`client::PlatformClient`]; tests inject
/// doubles to exercise rollback and degradation paths.
pub trait ProvisioningApi: Send + Sync {
    /// Create a platform account sized `balance` in the given group.
    fn create_account(
        &self,
        profile: &TraderProfile,
        group_name: &str,
        balance: i64,
    ) -> impl Future<Output = Result<ProvisionedAccount, PlatformError>> + Send;

    /// Fund a freshly created account. Best-effort; never an `Err`.
    fn make_initial_deposit(
        &self,
        login: &str,
        amount: i64,
    ) -> impl Future<Output = DepositOutcome> + Send;
}

/// One deposit operation, implemented by both funding targets with their
/// divergent payload shapes.
pub trait DepositApi: Send + Sync {
    fn deposit(
        &self,
        login: &str,
        amount: i64,
        comment: &str,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;
}

/// Credential-exchange response from the creation API.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub token: String,
}

/// Creation API request body (camelCase wire shape).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateAccountRequest {
    pub name: String,
    pub group_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub city: String,
    pub address: String,
    pub balance: i64,
    pub master_password: String,
    pub investor_password: String,
    pub leverage: u32,
}

/// Creation API response body.
#[derive(Debug, Deserialize)]
pub(crate) struct CreateAccountResponse {
    #[serde(rename = "accountID")]
    pub account_id: u64,
    #[allow(dead_code)]
    #[serde(default)]
    pub balance: i64,
}

/// Primary deposit request (snake_case wire shape).
#[derive(Debug, Serialize)]
pub(crate) struct PrimaryDepositRequest<'a> {
    pub login: &'a str,
    pub amount: i64,
    pub comment: &'a str,
    pub payment_method: &'a str,
}

/// Fallback deposit request (camelCase plus numeric transaction code).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FallbackDepositRequest<'a> {
    pub login: &'a str,
    pub amount: i64,
    pub description: &'a str,
    pub txn_type: u8,
}
