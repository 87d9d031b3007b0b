// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end spec tests: real HTTP in, real HTTP out, mock remote side.

use std::sync::atomic::Ordering;

use challenge_specs::{fixture, Engine, MockRemote, PRIOR_LOGIN};

#[tokio::test]
async fn approve_provisions_next_phase_end_to_end() -> anyhow::Result<()> {
    let remote = MockRemote::spawn().await?;
    let engine = Engine::spawn(&remote, fixture(1)).await?;

    let resp =
        engine.client.post(engine.url("/api/v1/challenges/ch-1/approve")).send().await?;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await?;

    assert_eq!(body["challenge"]["status"], "approved");
    let provisioned = &body["provisioned"];
    assert_eq!(provisioned["login"], "100001");
    assert_eq!(provisioned["balance"], 50_000);
    assert_eq!(provisioned["funded"], true);
    assert_eq!(provisioned["funded_via"], "primary");

    // The next-phase challenge is live and persisted.
    let next_id = provisioned["challenge_id"].as_str().unwrap_or_default().to_owned();
    let next: serde_json::Value = engine
        .client
        .get(engine.url(&format!("/api/v1/challenges/{next_id}")))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(next["status"], "progress");
    assert_eq!(next["num_phase"], 2);
    assert_eq!(next["parent_id"], "ch-1");

    // Remote side effects: create, deposit, certificate, notification, evict.
    assert_eq!(remote.state.created.lock().unwrap().len(), 1);
    assert_eq!(remote.state.primary_deposits.lock().unwrap().len(), 1);
    assert_eq!(remote.state.certificates.lock().unwrap().len(), 1);
    {
        let notes = remote.state.notifications.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0]["template"], "approved");
        assert_eq!(notes[0]["context"]["login"], "100001");
        assert_eq!(notes[0]["context"]["server"], "Live-01");
    }
    assert_eq!(&*remote.state.evicted.lock().unwrap(), &[PRIOR_LOGIN.to_owned()]);
    Ok(())
}

#[tokio::test]
async fn approve_survives_total_deposit_outage() -> anyhow::Result<()> {
    let remote = MockRemote::spawn().await?;
    remote.state.fail_primary.store(1, Ordering::SeqCst);
    remote.state.fail_fallback.store(1, Ordering::SeqCst);
    let engine = Engine::spawn(&remote, fixture(1)).await?;

    let resp =
        engine.client.post(engine.url("/api/v1/challenges/ch-1/approve")).send().await?;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await?;

    // Account exists, ledger does not. Decoupled failure domains.
    assert_eq!(body["provisioned"]["funded"], false);
    assert!(body["provisioned"].get("funded_via").is_none());
    assert_eq!(engine.state.store.broker_account_count().await, 2);
    assert_eq!(remote.state.notifications.lock().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn deposit_falls_back_to_bridge_api() -> anyhow::Result<()> {
    let remote = MockRemote::spawn().await?;
    remote.state.fail_primary.store(1, Ordering::SeqCst);
    let engine = Engine::spawn(&remote, fixture(1)).await?;

    let resp =
        engine.client.post(engine.url("/api/v1/challenges/ch-1/approve")).send().await?;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["provisioned"]["funded"], true);
    assert_eq!(body["provisioned"]["funded_via"], "fallback");

    let deposits = remote.state.fallback_deposits.lock().unwrap();
    assert_eq!(deposits.len(), 1);
    assert_eq!(deposits[0]["txnType"], 2);
    Ok(())
}

#[tokio::test]
async fn final_phase_approval_is_terminal() -> anyhow::Result<()> {
    let remote = MockRemote::spawn().await?;
    let engine = Engine::spawn(&remote, fixture(3)).await?;

    let resp =
        engine.client.post(engine.url("/api/v1/challenges/ch-1/approve")).send().await?;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await?;

    assert_eq!(body["challenge"]["status"], "approved");
    assert!(body.get("provisioned").is_none());
    assert!(remote.state.created.lock().unwrap().is_empty());
    assert_eq!(engine.state.store.challenge_count().await, 1);

    // A second approval attempt is rejected.
    let resp =
        engine.client.post(engine.url("/api/v1/challenges/ch-1/approve")).send().await?;
    assert_eq!(resp.status(), 409);
    Ok(())
}

#[tokio::test]
async fn disapprove_observation_reaches_notifier() -> anyhow::Result<()> {
    let remote = MockRemote::spawn().await?;
    let engine = Engine::spawn(&remote, fixture(2)).await?;

    let resp = engine
        .client
        .post(engine.url("/api/v1/challenges/ch-1/disapprove"))
        .json(&serde_json::json!({"observation": "rule violated"}))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["challenge"]["status"], "disapproved");

    let notes = remote.state.notifications.lock().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["template"], "disapproved");
    assert_eq!(notes[0]["context"]["observation"], "rule violated");
    // No provisioning on a disapproval.
    assert!(remote.state.created.lock().unwrap().is_empty());
    Ok(())
}
