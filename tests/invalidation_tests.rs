//! End-to-end invalidation: mutation → dispatcher → store → registry refetch.

mod support;

use std::sync::Arc;

use serde_json::json;
use support::gateway::ScriptedGateway;
use support::{decision, diagnostics, settle};
use wheeldesk::application::cache::EntryStatus;
use wheeldesk::application::Dashboard;
use wheeldesk::domain::{AccountId, ConsumerId, Mode, Mutation, PartitionKey, Symbol};
use wheeldesk::error::{Error, FetchError};

fn dashboard(gateway: &Arc<ScriptedGateway>) -> Dashboard {
    Dashboard::new(gateway.clone(), 64)
}

async fn subscribe_all(dashboard: &Dashboard, keys: &[PartitionKey]) {
    for (i, key) in keys.iter().enumerate() {
        dashboard.subscribe(key, &ConsumerId::new(format!("panel-{i}")));
    }
    settle().await;
    for key in keys {
        assert_eq!(dashboard.store().status(key), EntryStatus::Fresh, "{key}");
    }
}

#[tokio::test]
async fn recompute_diagnostics_refetches_exactly_the_affected_keys() {
    let gateway = ScriptedGateway::new();
    let dashboard = dashboard(&gateway);
    let keys = [
        diagnostics("SPY"),
        PartitionKey::Universe,
        decision("balanced"),
        diagnostics("NVDA"),
    ];
    subscribe_all(&dashboard, &keys).await;
    gateway.reset_calls();

    let outcome = dashboard
        .mutate(&Mutation::RecomputeSymbolDiagnostics {
            symbol: Symbol::new("spy"),
        })
        .await
        .unwrap();
    settle().await;

    assert_eq!(outcome.refetches, 3);
    assert_eq!(gateway.total_calls(), 3);
    assert_eq!(gateway.calls("/api/symbols/SPY/diagnostics"), 1);
    assert_eq!(gateway.calls("/api/universe"), 1);
    assert_eq!(gateway.calls("/api/decision/latest?mode=balanced"), 1);
    assert_eq!(gateway.calls("/api/symbols/NVDA/diagnostics"), 0);
    for key in &keys {
        assert_eq!(dashboard.store().status(key), EntryStatus::Fresh, "{key}");
    }
    assert_eq!(
        gateway.posts(),
        vec![(
            "/api/symbols/SPY/diagnostics/recompute".to_string(),
            json!({})
        )]
    );
}

#[tokio::test]
async fn failed_mutation_touches_no_cache_entry() {
    let gateway = ScriptedGateway::new();
    let dashboard = dashboard(&gateway);
    let keys = [diagnostics("SPY"), PartitionKey::Universe, decision("balanced")];
    subscribe_all(&dashboard, &keys).await;
    gateway.reset_calls();
    gateway.fail_posts(FetchError::Http {
        status: 422,
        body: "unknown symbol".into(),
    });

    let result = dashboard
        .mutate(&Mutation::RecomputeSymbolDiagnostics {
            symbol: Symbol::new("SPY"),
        })
        .await;
    settle().await;

    assert!(matches!(
        result,
        Err(Error::Fetch(FetchError::Http { status: 422, .. }))
    ));
    assert_eq!(gateway.total_calls(), 0);
    for key in &keys {
        assert_eq!(dashboard.store().status(key), EntryStatus::Fresh, "{key}");
    }
}

#[tokio::test]
async fn partition_wildcard_reaches_every_mode() {
    let gateway = ScriptedGateway::new();
    let dashboard = dashboard(&gateway);
    let keys = [decision("balanced"), decision("income"), PartitionKey::Alerts];
    subscribe_all(&dashboard, &keys).await;
    gateway.reset_calls();

    let outcome = dashboard
        .mutate(&Mutation::RunEvaluation {
            mode: Mode::new("income"),
        })
        .await
        .unwrap();
    settle().await;

    assert_eq!(
        outcome.invalidated,
        vec![
            decision("balanced"),
            decision("income"),
            PartitionKey::Alerts
        ]
    );
    assert_eq!(gateway.calls("/api/decision/latest?mode=balanced"), 1);
    assert_eq!(gateway.calls("/api/decision/latest?mode=income"), 1);
}

#[tokio::test]
async fn account_scoped_mutation_spares_other_accounts() {
    let gateway = ScriptedGateway::new();
    let dashboard = dashboard(&gateway);
    let ira = PartitionKey::PortfolioMetrics {
        account_id: AccountId::new("ira"),
    };
    let taxable = PartitionKey::PortfolioMetrics {
        account_id: AccountId::new("taxable"),
    };
    subscribe_all(&dashboard, &[ira.clone(), taxable.clone()]).await;

    let outcome = dashboard
        .mutate(&Mutation::SyncPortfolio {
            account_id: AccountId::new("ira"),
        })
        .await
        .unwrap();

    assert_eq!(outcome.invalidated, vec![ira]);
    assert_eq!(dashboard.store().status(&taxable), EntryStatus::Fresh);
}

#[tokio::test]
async fn stale_key_without_subscribers_waits_for_the_next_one() {
    let gateway = ScriptedGateway::new();
    let dashboard = dashboard(&gateway);
    let grid = ConsumerId::new("grid");
    dashboard.subscribe(&PartitionKey::Universe, &grid);
    settle().await;
    assert!(dashboard.unsubscribe(&PartitionKey::Universe, &grid));
    gateway.reset_calls();

    let outcome = dashboard.mutate(&Mutation::RefreshUniverse).await.unwrap();
    settle().await;

    assert_eq!(outcome.refetches, 0);
    assert_eq!(gateway.total_calls(), 0);
    let entry = dashboard.store().get(&PartitionKey::Universe);
    assert_eq!(entry.status, EntryStatus::Stale);
    assert!(entry.has_payload());

    let entry = dashboard.subscribe(&PartitionKey::Universe, &grid);
    assert_eq!(entry.status, EntryStatus::Loading);
    assert!(entry.has_payload());
    settle().await;
    assert_eq!(gateway.calls("/api/universe"), 1);
    assert_eq!(
        dashboard.store().status(&PartitionKey::Universe),
        EntryStatus::Fresh
    );
}

#[tokio::test]
async fn invalidation_during_fetch_triggers_one_more_fetch() {
    let gateway = ScriptedGateway::new();
    let dashboard = dashboard(&gateway);
    gateway.hold_gets();
    dashboard.subscribe(&PartitionKey::Universe, &ConsumerId::new("grid"));
    settle().await;
    assert_eq!(gateway.calls("/api/universe"), 1);

    let outcome = dashboard.mutate(&Mutation::RefreshUniverse).await.unwrap();
    assert_eq!(outcome.invalidated, vec![PartitionKey::Universe]);
    assert_eq!(outcome.refetches, 1);

    gateway.release_gets();
    settle().await;

    assert_eq!(gateway.calls("/api/universe"), 2);
    assert_eq!(
        dashboard.store().status(&PartitionKey::Universe),
        EntryStatus::Fresh
    );
}

#[tokio::test]
async fn failed_refetch_keeps_previous_payload() {
    let gateway = ScriptedGateway::new();
    gateway.respond("/api/alerts", json!([{ "id": "a1" }]));
    let dashboard = dashboard(&gateway);
    subscribe_all(&dashboard, &[PartitionKey::Alerts]).await;

    gateway.fail("/api/alerts", FetchError::Network("connection reset".into()));
    dashboard
        .mutate(&Mutation::AcknowledgeAlert {
            alert_id: "a1".into(),
        })
        .await
        .unwrap();
    settle().await;

    let entry = dashboard.store().get(&PartitionKey::Alerts);
    assert_eq!(entry.status, EntryStatus::Error);
    assert_eq!(entry.payload.as_deref(), Some(&json!([{ "id": "a1" }])));
    assert!(matches!(entry.error, Some(FetchError::Network(_))));
}
