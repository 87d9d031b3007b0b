// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store with staged, all-or-nothing commits.
//!
//! The lifecycle engine reads current state directly, stages every write it
//! intends to make in a [`Txn`], and commits once at the end of the flow.
//! Dropping an uncommitted `Txn` discards all staged writes, so any error
//! raised before the commit leaves the store exactly as it was.

use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::store::{BrokerAccount, Challenge, ChallengeRelation, StoreFixture, User};

#[derive(Default)]
struct Tables {
    challenges: IndexMap<String, Challenge>,
    broker_accounts: IndexMap<String, BrokerAccount>,
    relations: IndexMap<String, ChallengeRelation>,
    users: IndexMap<String, User>,
}

/// Shared in-memory persistence for challenges and their satellites.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from a fixture document.
    ///
    /// Relation stage chains are normalized to ascending phase order here so
    /// readers never have to re-sort.
    pub async fn load_fixture(&self, fixture: StoreFixture) {
        let mut tables = self.inner.write().await;
        for user in fixture.users {
            tables.users.insert(user.id.clone(), user);
        }
        for mut relation in fixture.relations {
            relation.stages.sort_by_key(|s| s.num_phase);
            tables.relations.insert(relation.id.clone(), relation);
        }
        for account in fixture.broker_accounts {
            tables.broker_accounts.insert(account.id.clone(), account);
        }
        for challenge in fixture.challenges {
            tables.challenges.insert(challenge.id.clone(), challenge);
        }
    }

    pub async fn challenge(&self, id: &str) -> Option<Challenge> {
        self.inner.read().await.challenges.get(id).cloned()
    }

    pub async fn relation(&self, id: &str) -> Option<ChallengeRelation> {
        self.inner.read().await.relations.get(id).cloned()
    }

    pub async fn broker_account(&self, id: &str) -> Option<BrokerAccount> {
        self.inner.read().await.broker_accounts.get(id).cloned()
    }

    pub async fn user(&self, id: &str) -> Option<User> {
        self.inner.read().await.users.get(id).cloned()
    }

    pub async fn challenge_count(&self) -> usize {
        self.inner.read().await.challenges.len()
    }

    pub async fn broker_account_count(&self) -> usize {
        self.inner.read().await.broker_accounts.len()
    }

    /// Open a staged transaction. Writes are buffered in the returned [`Txn`]
    /// and take effect only on [`MemoryStore::commit`].
    pub fn begin(&self) -> Txn {
        Txn::default()
    }

    /// Apply every staged write under a single write lock.
    pub async fn commit(&self, txn: Txn) {
        let mut tables = self.inner.write().await;
        for account in txn.broker_accounts {
            tables.broker_accounts.insert(account.id.clone(), account);
        }
        for challenge in txn.challenges {
            tables.challenges.insert(challenge.id.clone(), challenge);
        }
    }
}

/// Buffered writes for one lifecycle flow.
#[derive(Default)]
pub struct Txn {
    challenges: Vec<Challenge>,
    broker_accounts: Vec<BrokerAccount>,
}

impl Txn {
    /// Stage a challenge insert or update.
    pub fn put_challenge(&mut self, challenge: Challenge) {
        self.challenges.push(challenge);
    }

    /// Stage a broker account insert.
    pub fn put_broker_account(&mut self, account: BrokerAccount) {
        self.broker_accounts.push(account);
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
