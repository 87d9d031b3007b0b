// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted entities and the in-memory store.

pub mod memory;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a challenge.
///
/// `approved`, `disapproved`, `withdrawn`, and `cancelled` are terminal for
/// the phase: no transition out of them is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Initial,
    Progress,
    Approvable,
    Approved,
    Disapprovable,
    Disapproved,
    Withdrawable,
    Withdrawn,
    Cancelled,
}

impl ChallengeStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Disapproved | Self::Withdrawn | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Progress => "progress",
            Self::Approvable => "approvable",
            Self::Approved => "approved",
            Self::Disapprovable => "disapprovable",
            Self::Disapproved => "disapproved",
            Self::Withdrawable => "withdrawable",
            Self::Withdrawn => "withdrawn",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One evaluation attempt at one phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub user_id: String,
    pub relation_id: String,
    /// 1-based phase number within the relation's stage chain.
    pub num_phase: u32,
    pub status: ChallengeStatus,
    pub is_active: bool,
    /// Account size actually granted; may diverge from the nominal tier.
    #[serde(default)]
    pub dynamic_balance: Option<i64>,
    pub start_date: u64,
    #[serde(default)]
    pub end_date: Option<u64>,
    /// Previous-phase challenge this one was spawned from.
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub broker_account_id: Option<String>,
}

/// Local record mirroring a provisioned trading-platform account.
///
/// Created exactly once per successful provisioning call and never mutated
/// by the lifecycle engine afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerAccount {
    pub id: String,
    pub login: String,
    pub master_password: String,
    pub investor_password: String,
    pub platform: String,
    pub server: String,
    pub initial_balance: i64,
    pub used: bool,
}

/// One stage of a relation's ordered phase chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub num_phase: u32,
    /// Per-stage rule parameters (profit target, max drawdown, ...). The
    /// lifecycle engine treats these as opaque configuration.
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// Nominal account size offered by a relation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceTier {
    pub amount: i64,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub discount: Option<i64>,
}

/// Template binding a plan to its ordered stages and balance tiers.
///
/// Read-only configuration as far as the lifecycle engine is concerned;
/// `stages.len()` is the total phase count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeRelation {
    pub id: String,
    /// Platform group accounts for this relation are created under.
    pub group_name: String,
    pub stages: Vec<Stage>,
    pub balances: Vec<BalanceTier>,
}

/// Owner of a challenge, as read from the user service boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_verified: bool,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// Seed document for the in-memory store, loaded from `--store-fixture`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreFixture {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub relations: Vec<ChallengeRelation>,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
    #[serde(default)]
    pub broker_accounts: Vec<BrokerAccount>,
}

/// Return current epoch millis.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
