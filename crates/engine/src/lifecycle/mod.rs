// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Challenge lifecycle state machine.
//!
//! Approve and disapprove are one-way, terminal-for-the-phase transitions.
//! Every local write in a flow is staged in one store transaction and
//! committed last, after the external side effects that are allowed to fail
//! the flow (account creation, certificate, notification) have succeeded.
//! Buffer eviction and the initial deposit are deliberately best-effort and
//! can never fail an approval.

pub mod balance;

use std::fmt;
use std::sync::Arc;

use crate::collab::{
    BufferCache, CertificateIssuer, CertificateKind, CertificateRequest, Notification, Notifier,
    Template,
};
use crate::lifecycle::balance::{resolve_next_balance, resolve_notice_balance};
use crate::platform::{DepositOutcome, PlatformError, ProvisioningApi, TraderProfile};
use crate::store::memory::MemoryStore;
use crate::store::{
    epoch_ms, BrokerAccount, Challenge, ChallengeRelation, ChallengeStatus, User,
};

/// Default observation text for a disapproval without an explicit reason.
pub const DEFAULT_OBSERVATION: &str = "The evaluation objectives for this phase were not met.";

/// Errors that abort a lifecycle flow. By the time one of these surfaces,
/// every staged local write has been discarded.
#[derive(Debug)]
pub enum LifecycleError {
    ChallengeNotFound(String),
    RelationNotFound(String),
    UserNotFound(String),
    /// The challenge is already in a terminal status.
    AlreadySettled { id: String, status: ChallengeStatus },
    /// Neither the dynamic balance nor a prior account can size the next phase.
    BalanceUnresolved(String),
    /// Account creation failed; fatal per the provisioning contract.
    Provisioning(PlatformError),
    /// Certificate issuance or notification dispatch failed.
    Dispatch(anyhow::Error),
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChallengeNotFound(id) => write!(f, "challenge not found: {id}"),
            Self::RelationNotFound(id) => write!(f, "challenge relation not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::AlreadySettled { id, status } => {
                write!(f, "challenge {id} is already settled as {status}")
            }
            Self::BalanceUnresolved(id) => {
                write!(f, "cannot resolve next-phase balance for challenge {id}")
            }
            Self::Provisioning(e) => write!(f, "account provisioning failed: {e}"),
            Self::Dispatch(e) => write!(f, "dispatch failed: {e}"),
        }
    }
}

impl std::error::Error for LifecycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Provisioning(e) => Some(e),
            Self::Dispatch(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Result of a successful approval.
#[derive(Debug)]
pub struct ApprovalOutcome {
    /// The settled (now `approved`) challenge.
    pub challenge: Challenge,
    /// Next-phase challenge, when one was provisioned.
    pub next_challenge: Option<Challenge>,
    /// Broker account backing the next phase.
    pub account: Option<BrokerAccount>,
    /// Funding result for the new account, when one was created.
    pub funding: Option<DepositOutcome>,
}

/// Result of a disapproval.
#[derive(Debug)]
pub struct DisapprovalOutcome {
    pub challenge: Challenge,
}

/// The lifecycle engine. Generic over its external side effects so tests can
/// substitute doubles for the platform and the collaborators.
pub struct Lifecycle<P, N, C, B> {
    store: Arc<MemoryStore>,
    platform: P,
    notifier: N,
    certificates: C,
    buffer: B,
    /// Trading-server identity stamped on new broker accounts.
    server_name: String,
    /// Platform tag stamped on new broker accounts.
    platform_tag: String,
}

impl<P, N, C, B> Lifecycle<P, N, C, B>
where
    P: ProvisioningApi,
    N: Notifier,
    C: CertificateIssuer,
    B: BufferCache,
{
    pub fn new(
        store: Arc<MemoryStore>,
        platform: P,
        notifier: N,
        certificates: C,
        buffer: B,
        server_name: String,
        platform_tag: String,
    ) -> Self {
        Self { store, platform, notifier, certificates, buffer, server_name, platform_tag }
    }

    /// Approve a challenge phase.
    ///
    /// Final phase: settle only. Otherwise: evict the prior account from the
    /// hot buffer (best-effort), provision the next-phase account, stage the
    /// new records, issue the phase certificate, notify, and commit. Any
    /// fatal error before the commit leaves the store untouched.
    pub async fn approve(&self, challenge_id: &str) -> Result<ApprovalOutcome, LifecycleError> {
        let (challenge, relation, user, prior) = self.load_flow(challenge_id).await?;

        let total_phases = relation.stages.len() as u32;
        let is_final = challenge.num_phase >= total_phases;
        let is_before_final = challenge.num_phase + 1 == total_phases;

        let mut settled = challenge.clone();
        settled.status = ChallengeStatus::Approved;
        settled.end_date = Some(epoch_ms());
        settled.is_active = false;

        let mut txn = self.store.begin();
        txn.put_challenge(settled.clone());

        if is_final {
            self.store.commit(txn).await;
            tracing::info!(
                challenge_id = %settled.id,
                phase = settled.num_phase,
                "final phase approved, evaluation complete"
            );
            return Ok(ApprovalOutcome {
                challenge: settled,
                next_challenge: None,
                account: None,
                funding: None,
            });
        }

        let next_balance =
            resolve_next_balance(challenge.dynamic_balance, &relation.balances, prior.as_ref())
                .ok_or_else(|| LifecycleError::BalanceUnresolved(challenge.id.clone()))?;

        if let Some(prior) = &prior {
            self.evict_from_buffer(&prior.login).await;
        }

        // KYC pendency must not block account issuance: an unverified user
        // one phase before funded still gets the next account, only the
        // notification template changes.
        let template = if is_before_final && !user.is_verified {
            Template::VerificationRequired
        } else {
            Template::Approved
        };

        let profile = TraderProfile::from_user(&user);
        let provisioned = self
            .platform
            .create_account(&profile, &relation.group_name, next_balance)
            .await
            .map_err(LifecycleError::Provisioning)?;
        let funding = self.platform.make_initial_deposit(&provisioned.login, next_balance).await;

        let account = BrokerAccount {
            id: uuid::Uuid::new_v4().to_string(),
            login: provisioned.login.clone(),
            master_password: provisioned.master_password.clone(),
            investor_password: provisioned.investor_password.clone(),
            platform: self.platform_tag.clone(),
            server: self.server_name.clone(),
            initial_balance: next_balance,
            used: true,
        };
        let next_challenge = Challenge {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: challenge.user_id.clone(),
            relation_id: challenge.relation_id.clone(),
            num_phase: challenge.num_phase + 1,
            status: ChallengeStatus::Progress,
            is_active: true,
            dynamic_balance: Some(next_balance),
            start_date: epoch_ms(),
            end_date: None,
            parent_id: Some(challenge.id.clone()),
            broker_account_id: Some(account.id.clone()),
        };
        txn.put_broker_account(account.clone());
        txn.put_challenge(next_challenge.clone());

        self.certificates
            .create(&CertificateRequest {
                user_id: user.id.clone(),
                challenge_id: challenge.id.clone(),
                kind: CertificateKind::PhaseCompletion,
            })
            .await
            .map_err(LifecycleError::Dispatch)?;

        self.notifier
            .send(&Notification {
                to: user.email.clone(),
                subject: format!("Phase {} passed", challenge.num_phase),
                template,
                context: serde_json::json!({
                    "firstName": user.first_name,
                    "phase": next_challenge.num_phase,
                    "login": account.login,
                    "masterPassword": account.master_password,
                    "investorPassword": account.investor_password,
                    "server": account.server,
                    "balance": next_balance,
                }),
            })
            .await
            .map_err(LifecycleError::Dispatch)?;

        self.store.commit(txn).await;
        tracing::info!(
            challenge_id = %settled.id,
            next_challenge_id = %next_challenge.id,
            login = %account.login,
            funded = funding.is_funded(),
            "phase approved and next phase provisioned"
        );

        Ok(ApprovalOutcome {
            challenge: settled,
            next_challenge: Some(next_challenge),
            account: Some(account),
            funding: Some(funding),
        })
    }

    /// Disapprove a challenge phase with an optional free-text reason.
    pub async fn disapprove(
        &self,
        challenge_id: &str,
        observation: Option<String>,
    ) -> Result<DisapprovalOutcome, LifecycleError> {
        let (challenge, relation, user, prior) = self.load_flow(challenge_id).await?;

        let mut settled = challenge.clone();
        settled.status = ChallengeStatus::Disapproved;
        settled.end_date = Some(epoch_ms());
        settled.is_active = false;

        if let Some(prior) = &prior {
            self.evict_from_buffer(&prior.login).await;
        }

        let notice_balance =
            resolve_notice_balance(challenge.dynamic_balance, &relation.balances, prior.as_ref());
        let observation = observation.unwrap_or_else(|| DEFAULT_OBSERVATION.to_owned());

        let mut txn = self.store.begin();
        txn.put_challenge(settled.clone());

        self.notifier
            .send(&Notification {
                to: user.email.clone(),
                subject: format!("Phase {} not passed", challenge.num_phase),
                template: Template::Disapproved,
                context: serde_json::json!({
                    "firstName": user.first_name,
                    "phase": challenge.num_phase,
                    "balance": notice_balance,
                    "observation": observation,
                }),
            })
            .await
            .map_err(LifecycleError::Dispatch)?;

        self.store.commit(txn).await;
        tracing::info!(challenge_id = %settled.id, phase = settled.num_phase, "phase disapproved");

        Ok(DisapprovalOutcome { challenge: settled })
    }

    /// Load the challenge plus everything the flow reads: relation chain,
    /// owning user, and prior broker account. Rejects already-settled
    /// challenges up front.
    async fn load_flow(
        &self,
        challenge_id: &str,
    ) -> Result<(Challenge, ChallengeRelation, User, Option<BrokerAccount>), LifecycleError> {
        let challenge = self
            .store
            .challenge(challenge_id)
            .await
            .ok_or_else(|| LifecycleError::ChallengeNotFound(challenge_id.to_owned()))?;
        if challenge.status.is_terminal() {
            return Err(LifecycleError::AlreadySettled {
                id: challenge.id.clone(),
                status: challenge.status,
            });
        }
        let relation = self
            .store
            .relation(&challenge.relation_id)
            .await
            .ok_or_else(|| LifecycleError::RelationNotFound(challenge.relation_id.clone()))?;
        let user = self
            .store
            .user(&challenge.user_id)
            .await
            .ok_or_else(|| LifecycleError::UserNotFound(challenge.user_id.clone()))?;
        let prior = match &challenge.broker_account_id {
            Some(id) => self.store.broker_account(id).await,
            None => None,
        };
        Ok((challenge, relation, user, prior))
    }

    /// Best-effort hot-buffer eviction. Failure is logged and swallowed.
    async fn evict_from_buffer(&self, login: &str) {
        if let Err(e) = self.buffer.delete_account(login).await {
            tracing::warn!(login, err = %e, "hot-buffer eviction failed, continuing");
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
