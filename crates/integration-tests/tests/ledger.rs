//! Inventory ledger and idempotency tests.
//!
//! Requires `KSURPLUS_TEST_DATABASE_URL`. Run with `--ignored`.

#![allow(clippy::unwrap_used)]

use ksurplus_core::{MovementId, ProductId};
use ksurplus_integration_tests::{TestContext, price, unique};
use ksurplus_server::inventory::InventoryError;
use ksurplus_server::models::{MovementFilter, RecordMovementInput};

fn movement(
    product_id: ProductId,
    change_qty: i32,
    transaction_id: Option<&str>,
) -> RecordMovementInput {
    RecordMovementInput {
        product_id,
        change_qty,
        reason: "adjustment".to_string(),
        reference_type: None,
        reference_id: None,
        created_by: None,
        transaction_id: transaction_id.map(String::from),
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (KSURPLUS_TEST_DATABASE_URL)"]
async fn test_initial_stock_is_recorded_as_movement() {
    let ctx = TestContext::new().await;
    let product = ctx.create_product(7, price(100)).await;

    assert_eq!(ctx.stock(product).await, 7);
    assert_eq!(ctx.movement_count(product).await, 1);
    ctx.assert_ledger_matches(product).await;

    let movements = ctx
        .inventory()
        .list_movements(&MovementFilter {
            product_id: Some(product),
            ..MovementFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].reason.as_str(), "initial");
    assert_eq!(movements[0].change_qty, 7);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (KSURPLUS_TEST_DATABASE_URL)"]
async fn test_movements_adjust_stock() {
    let ctx = TestContext::new().await;
    let product = ctx.create_product(5, price(100)).await;

    let added = ctx
        .inventory()
        .record_movement(movement(product, 4, None))
        .await
        .unwrap();
    assert!(!added.duplicate);
    assert_eq!(added.new_stock, Some(9));

    let removed = ctx
        .inventory()
        .record_movement(movement(product, -6, None))
        .await
        .unwrap();
    assert_eq!(removed.new_stock, Some(3));

    assert_eq!(ctx.stock(product).await, 3);
    ctx.assert_ledger_matches(product).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (KSURPLUS_TEST_DATABASE_URL)"]
async fn test_movement_cannot_drive_stock_negative() {
    let ctx = TestContext::new().await;
    let product = ctx.create_product(2, price(100)).await;

    let err = ctx
        .inventory()
        .record_movement(movement(product, -3, None))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        InventoryError::InsufficientStock {
            available: 2,
            requested: 3,
            ..
        }
    ));

    assert_eq!(ctx.stock(product).await, 2);
    assert_eq!(ctx.movement_count(product).await, 1);
    ctx.assert_ledger_matches(product).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (KSURPLUS_TEST_DATABASE_URL)"]
async fn test_duplicate_transaction_id_is_applied_once() {
    let ctx = TestContext::new().await;
    let product = ctx.create_product(10, price(100)).await;
    let txid = unique("restock");

    let first = ctx
        .inventory()
        .record_movement(movement(product, 5, Some(&txid)))
        .await
        .unwrap();
    assert!(!first.duplicate);

    let mut rx = ctx.events.subscribe();
    let replay = ctx
        .inventory()
        .record_movement(movement(product, 5, Some(&txid)))
        .await
        .unwrap();

    assert!(replay.duplicate);
    assert_eq!(replay.id, first.id);
    assert_eq!(replay.new_stock, None);
    assert!(rx.try_recv().is_err(), "a replay must not broadcast");

    assert_eq!(ctx.stock(product).await, 15);
    assert_eq!(ctx.movement_count(product).await, 2);
    ctx.assert_ledger_matches(product).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (KSURPLUS_TEST_DATABASE_URL)"]
async fn test_concurrent_duplicates_apply_once() {
    let ctx = TestContext::new().await;
    let product = ctx.create_product(0, price(100)).await;
    let txid = unique("scan");

    let attempts = (0..8).map(|_| {
        let inventory = ctx.inventory();
        let input = movement(product, 1, Some(&txid));
        async move { inventory.record_movement(input).await }
    });
    let results = futures::future::join_all(attempts).await;

    let recorded: Vec<_> = results.into_iter().map(Result::unwrap).collect();
    let applied = recorded.iter().filter(|r| !r.duplicate).count();
    assert_eq!(applied, 1);

    let ids: Vec<MovementId> = recorded.iter().map(|r| r.id).collect();
    assert!(ids.iter().all(|id| *id == ids[0]));

    assert_eq!(ctx.stock(product).await, 1);
    ctx.assert_ledger_matches(product).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (KSURPLUS_TEST_DATABASE_URL)"]
async fn test_unknown_product_is_not_found() {
    let ctx = TestContext::new().await;
    let missing = ProductId::new(i32::MAX);

    let err = ctx
        .inventory()
        .record_movement(movement(missing, 1, None))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::ProductNotFound(id) if id == missing));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (KSURPLUS_TEST_DATABASE_URL)"]
async fn test_rolled_back_changes_leave_no_trace() {
    use ksurplus_core::MovementReason;
    use ksurplus_server::inventory::{decrease_stock, increase_stock};
    use ksurplus_server::models::MovementDetails;

    let ctx = TestContext::new().await;
    let product = ctx.create_product(3, price(100)).await;
    let txid = unique("rolled-back");

    let mut tx = ctx.pool.begin().await.unwrap();
    let details = MovementDetails::new(MovementReason::Restock);
    let up = increase_stock(&mut *tx, product, 4, &details).await.unwrap();
    assert_eq!((up.previous_stock, up.new_stock), (3, 7));
    let mut tagged = MovementDetails::new(MovementReason::Adjustment);
    tagged.transaction_id = Some(txid.clone());
    let down = decrease_stock(&mut *tx, product, 7, &tagged).await.unwrap();
    assert_eq!(down.new_stock, 0);
    tx.rollback().await.unwrap();

    assert_eq!(ctx.stock(product).await, 3);
    assert_eq!(ctx.movement_count(product).await, 1);

    // The transaction id was never committed, so it is still fresh
    let recorded = ctx
        .inventory()
        .record_movement(movement(product, -1, Some(&txid)))
        .await
        .unwrap();
    assert!(!recorded.duplicate);
    assert_eq!(recorded.new_stock, Some(2));
    ctx.assert_ledger_matches(product).await;
}
