// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Balance resolution for provisioning and notifications.

use crate::store::{BalanceTier, BrokerAccount};

/// Size of the next account to provision.
///
/// A positive dynamic balance that matches one of the relation's tiers wins;
/// anything else falls back to the prior broker account's initial balance.
/// `None` means neither source can supply an amount and the approval must
/// abort before touching the platform.
pub fn resolve_next_balance(
    dynamic_balance: Option<i64>,
    tiers: &[BalanceTier],
    prior: Option<&BrokerAccount>,
) -> Option<i64> {
    if let Some(amount) = dynamic_balance.filter(|a| *a > 0) {
        if tiers.iter().any(|t| t.amount == amount) {
            return Some(amount);
        }
    }
    prior.map(|a| a.initial_balance)
}

/// Representative amount for a disapproval notification.
///
/// Same tier matching as [`resolve_next_balance`], then the first available
/// tier, then the prior account. Purely informational, so it degrades to 0
/// instead of failing.
pub fn resolve_notice_balance(
    dynamic_balance: Option<i64>,
    tiers: &[BalanceTier],
    prior: Option<&BrokerAccount>,
) -> i64 {
    if let Some(amount) = dynamic_balance.filter(|a| *a > 0) {
        if tiers.iter().any(|t| t.amount == amount) {
            return amount;
        }
    }
    if let Some(tier) = tiers.first() {
        return tier.amount;
    }
    prior.map(|a| a.initial_balance).unwrap_or(0)
}

#[cfg(test)]
#[path = "balance_tests.rs"]
mod tests;
