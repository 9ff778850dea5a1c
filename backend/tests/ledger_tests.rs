//! Inventory ledger tests
//!
//! Query ordering and filters, display enrichment, limits, replay audit and
//! CSV export.

mod common;

use chrono::{Duration, Utc};
use common::{dec, Fixture};
use shared::models::{CustomerInfo, InventoryAction};
use shared::DateRange;

use pos_server::config::LedgerConfig;
use pos_server::error::AppError;
use pos_server::services::{InventoryLedger, LedgerQuery};

fn ledger(fx: &Fixture) -> InventoryLedger {
    InventoryLedger::new(fx.store_handle(), LedgerConfig::default())
}

#[tokio::test]
async fn test_query_is_newest_first_and_enriched() {
    let fx = Fixture::new().await;
    let variant = fx.variant("CAF-Q1", 10, "5").await;
    fx.coordinator
        .record_sale(variant.id, 2, dec("9"), &fx.principal, CustomerInfo::default())
        .await
        .unwrap();
    fx.coordinator
        .adjust_stock(variant.id, 4, &fx.principal, None)
        .await
        .unwrap();

    let rows = ledger(&fx).query(LedgerQuery::default()).await.unwrap();
    let actions: Vec<_> = rows.iter().map(|r| r.entry.action).collect();
    assert_eq!(
        actions,
        vec![
            InventoryAction::Added,
            InventoryAction::Sold,
            InventoryAction::Added
        ]
    );
    assert!(rows[0].entry.sequence > rows[1].entry.sequence);
    assert_eq!(rows[0].entry.new_quantity, 12);

    let newest = &rows[0];
    assert_eq!(newest.variant_sku.as_deref(), Some("CAF-Q1"));
    assert_eq!(newest.product_name.as_deref(), Some("Café de Altura"));
    assert_eq!(newest.performed_by_name.as_deref(), Some("Rosa Quispe"));
}

#[tokio::test]
async fn test_filters_by_variant_and_action() {
    let fx = Fixture::new().await;
    let a = fx.variant("CAF-FA", 5, "5").await;
    let b = fx.variant("CAF-FB", 5, "5").await;
    fx.coordinator
        .record_sale(a.id, 1, dec("9"), &fx.principal, CustomerInfo::default())
        .await
        .unwrap();
    fx.coordinator
        .adjust_stock(b.id, -2, &fx.principal, None)
        .await
        .unwrap();

    let ledger = ledger(&fx);

    let only_a = ledger
        .query(LedgerQuery {
            variant_id: Some(a.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(only_a.len(), 2);
    assert!(only_a.iter().all(|r| r.entry.variant_id == Some(a.id)));

    let removals = ledger
        .query(LedgerQuery {
            action: Some(InventoryAction::Removed),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(removals.len(), 1);
    assert_eq!(removals[0].entry.variant_id, Some(b.id));
}

#[tokio::test]
async fn test_date_range_and_limit() {
    let fx = Fixture::new().await;
    let variant = fx.variant("CAF-DR", 1, "5").await;
    for _ in 0..4 {
        fx.coordinator
            .adjust_stock(variant.id, 1, &fx.principal, None)
            .await
            .unwrap();
    }

    let ledger = ledger(&fx);

    let limited = ledger
        .query(LedgerQuery {
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].entry.new_quantity, 5);

    let future = ledger
        .query(LedgerQuery {
            period: DateRange {
                start: Some(Utc::now() + Duration::hours(1)),
                end: None,
            },
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(future.is_empty());

    let past = ledger
        .query(LedgerQuery {
            period: DateRange {
                start: Some(Utc::now() - Duration::hours(1)),
                end: Some(Utc::now() + Duration::hours(1)),
            },
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(past.len(), 5);
}

#[tokio::test]
async fn test_audit_replays_to_current_quantity() {
    let fx = Fixture::new().await;
    let variant = fx.variant("CAF-AU", 8, "5").await;
    fx.coordinator
        .record_sale(variant.id, 3, dec("9"), &fx.principal, CustomerInfo::default())
        .await
        .unwrap();
    fx.coordinator
        .adjust_stock(variant.id, -5, &fx.principal, None)
        .await
        .unwrap();

    let audit = ledger(&fx).audit(variant.id).await.unwrap();
    assert!(audit.consistent);
    assert_eq!(audit.ledger_quantity, Some(0));
    assert_eq!(audit.current_quantity, 0);
    assert_eq!(audit.entries.len(), 3);
    assert!(audit.problem.is_none());
}

#[tokio::test]
async fn test_audit_of_unknown_variant() {
    let fx = Fixture::new().await;
    let err = ledger(&fx).audit(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::VariantNotFound(_)));
}

#[tokio::test]
async fn test_csv_export_of_query() {
    let fx = Fixture::new().await;
    let variant = fx.variant("CAF-CSV", 3, "5").await;
    fx.coordinator
        .adjust_stock(variant.id, -1, &fx.principal, Some("Broken bag".to_string()))
        .await
        .unwrap();

    let rows = ledger(&fx).query(LedgerQuery::default()).await.unwrap();
    let csv = InventoryLedger::export_to_csv(&rows).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[1].contains("removed"));
    assert!(lines[1].contains("CAF-CSV"));
    assert!(lines[1].contains("Broken bag"));
    assert!(lines[2].contains("Initial stock added"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_audit_stays_consistent_while_selling() {
    const UNITS: i32 = 40;

    let fx = Fixture::new().await;
    let variant = fx.variant("CAF-LIVE", UNITS, "5").await;
    let variant_id = variant.id;
    let ledger = ledger(&fx);

    let seller = {
        let coordinator = fx.coordinator.clone();
        let principal = fx.principal;
        tokio::spawn(async move {
            for _ in 0..UNITS {
                coordinator
                    .record_sale(variant_id, 1, dec("9"), &principal, CustomerInfo::default())
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    while !seller.is_finished() {
        let audit = ledger.audit(variant_id).await.unwrap();
        assert!(
            audit.consistent,
            "ledger {:?} vs stored {}",
            audit.ledger_quantity, audit.current_quantity
        );
    }
    seller.await.unwrap();

    let audit = ledger.audit(variant_id).await.unwrap();
    assert!(audit.consistent);
    assert_eq!(audit.current_quantity, 0);
    assert_eq!(audit.entries.len(), UNITS as usize + 1);
}
