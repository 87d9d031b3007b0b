// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collaborator boundary: notifications, certificates, hot-account buffer.
//!
//! The lifecycle engine consumes these through traits; the production
//! implementations here are thin HTTP wrappers over the respective services.
//! Notifier and certificate failures are fatal to the surrounding flow;
//! buffer eviction is best-effort and the caller swallows its errors.

use serde::Serialize;
use std::fmt;
use std::future::Future;

/// Notification template selected by the lifecycle branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Template {
    Approved,
    VerificationRequired,
    Disapproved,
}

impl Template {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::VerificationRequired => "verification-required",
            Self::Disapproved => "disapproved",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound notification.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub template: Template,
    pub context: serde_json::Value,
}

/// Certificate kinds issued by this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CertificateKind {
    PhaseCompletion,
}

#[derive(Debug, Clone, Serialize)]
pub struct CertificateRequest {
    pub user_id: String,
    pub challenge_id: String,
    pub kind: CertificateKind,
}

pub trait Notifier: Send + Sync {
    fn send(&self, note: &Notification) -> impl Future<Output = anyhow::Result<()>> + Send;
}

pub trait CertificateIssuer: Send + Sync {
    fn create(&self, request: &CertificateRequest) -> impl Future<Output = anyhow::Result<()>> + Send;
}

pub trait BufferCache: Send + Sync {
    fn delete_account(&self, login: &str) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Notification dispatcher over HTTP.
pub struct HttpNotifier {
    http: reqwest::Client,
    base_url: String,
}

impl HttpNotifier {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

impl Notifier for HttpNotifier {
    async fn send(&self, note: &Notification) -> anyhow::Result<()> {
        self.http
            .post(format!("{}/api/v1/notifications", self.base_url))
            .json(note)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Certificate issuer over HTTP.
pub struct HttpCertificateIssuer {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCertificateIssuer {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

impl CertificateIssuer for HttpCertificateIssuer {
    async fn create(&self, request: &CertificateRequest) -> anyhow::Result<()> {
        self.http
            .post(format!("{}/api/v1/certificates", self.base_url))
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Hot-account buffer eviction over HTTP.
pub struct HttpBufferCache {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBufferCache {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

impl BufferCache for HttpBufferCache {
    async fn delete_account(&self, login: &str) -> anyhow::Result<()> {
        self.http
            .delete(format!("{}/api/v1/accounts/{login}", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
