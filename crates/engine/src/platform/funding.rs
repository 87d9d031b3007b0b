// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fallback funding client for the generic trading API.
//!
//! Independently authenticated (static API key, no token broker) and only
//! reached when the primary deposit route fails. The payload shape diverges
//! from the primary: a numeric `txnType` code instead of a payment method.

use crate::platform::{DepositApi, FallbackDepositRequest, PlatformError};

/// Transaction code for a balance deposit on the bridge API.
const TXN_DEPOSIT: u8 = 2;

pub struct FundingFallbackClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FundingFallbackClient {
    pub fn new(http: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self { http, base_url, api_key }
    }
}

impl DepositApi for FundingFallbackClient {
    async fn deposit(&self, login: &str, amount: i64, comment: &str) -> Result<(), PlatformError> {
        let request =
            FallbackDepositRequest { login, amount, description: comment, txn_type: TXN_DEPOSIT };
        let resp = self
            .http
            .post(format!("{}/api/transactions", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PlatformError::Remote { status: status.as_u16(), body });
        }
        tracing::debug!(login, amount, "fallback deposit acknowledged");
        Ok(())
    }
}
