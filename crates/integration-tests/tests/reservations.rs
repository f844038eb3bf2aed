//! Reservation creation, status changes and the daily limit.
//!
//! Requires `KSURPLUS_TEST_DATABASE_URL`. Run with `--ignored`.

#![allow(clippy::unwrap_used)]

use ksurplus_core::{ProductId, ReservationStatus};
use ksurplus_integration_tests::{TestContext, existing_customer, price};
use ksurplus_server::inventory::InventoryError;
use ksurplus_server::models::{CreateReservationInput, CustomerDetails};

fn reserve(product_id: ProductId, customer: Option<CustomerDetails>) -> CreateReservationInput {
    CreateReservationInput {
        product_id,
        customer,
        ..CreateReservationInput::default()
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (KSURPLUS_TEST_DATABASE_URL)"]
async fn test_reservation_takes_one_unit() {
    let ctx = TestContext::new().await;
    let product = ctx.create_product(3, price(250)).await;
    let customer = ctx.create_customer().await;

    let created = ctx
        .reservations(5)
        .create(reserve(product, Some(existing_customer(customer.id))))
        .await
        .unwrap();

    assert_eq!(created.new_stock, 2);
    assert_eq!(created.customer_id, Some(customer.id));
    assert!(created.reservation_code.starts_with("RES-"));

    let reservation = ctx.reservations(5).get(created.id).await.unwrap();
    assert_eq!(reservation.status, ReservationStatus::Pending);
    assert_eq!(reservation.reserved_price, price(250));

    assert_eq!(ctx.stock(product).await, 2);
    ctx.assert_ledger_matches(product).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (KSURPLUS_TEST_DATABASE_URL)"]
async fn test_out_of_stock_writes_and_broadcasts_nothing() {
    let ctx = TestContext::new().await;
    let product = ctx.create_product(0, price(250)).await;
    let mut rx = ctx.events.subscribe();

    let err = ctx
        .reservations(5)
        .create(reserve(product, None))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        InventoryError::InsufficientStock {
            available: 0,
            requested: 1,
            ..
        }
    ));
    assert_eq!(ctx.reservation_count(product).await, 0);
    assert_eq!(ctx.movement_count(product).await, 0);
    assert_eq!(ctx.stock(product).await, 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (KSURPLUS_TEST_DATABASE_URL)"]
async fn test_concurrent_reservations_for_last_unit() {
    let ctx = TestContext::new().await;
    let product = ctx.create_product(1, price(250)).await;

    let service = ctx.reservations(5);
    let (a, b) = tokio::join!(
        service.create(reserve(product, None)),
        service.create(reserve(product, None)),
    );

    let outcomes = [a, b];
    let succeeded = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    assert!(outcomes.iter().any(|r| matches!(
        r,
        Err(InventoryError::InsufficientStock { available: 0, .. })
    )));

    assert_eq!(ctx.stock(product).await, 0);
    assert_eq!(ctx.reservation_count(product).await, 1);
    ctx.assert_ledger_matches(product).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (KSURPLUS_TEST_DATABASE_URL)"]
async fn test_archived_product_cannot_be_reserved() {
    let ctx = TestContext::new().await;
    let product = ctx.create_product(4, price(250)).await;
    ctx.products().archive(product).await.unwrap();

    let err = ctx
        .reservations(5)
        .create(reserve(product, None))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::ProductNotFound(_)));
    assert_eq!(ctx.stock(product).await, 4);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (KSURPLUS_TEST_DATABASE_URL)"]
async fn test_cancelling_does_not_restock() {
    let ctx = TestContext::new().await;
    let product = ctx.create_product(2, price(250)).await;
    let service = ctx.reservations(5);

    let created = service.create(reserve(product, None)).await.unwrap();
    service
        .update_status(created.id, ReservationStatus::Confirmed)
        .await
        .unwrap();
    let cancelled = service
        .update_status(created.id, ReservationStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert_eq!(ctx.stock(product).await, 1);
    assert_eq!(ctx.movement_count(product).await, 2);
    ctx.assert_ledger_matches(product).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (KSURPLUS_TEST_DATABASE_URL)"]
async fn test_status_transitions() {
    let ctx = TestContext::new().await;
    let product = ctx.create_product(2, price(250)).await;
    let service = ctx.reservations(5);
    let created = service.create(reserve(product, None)).await.unwrap();

    service
        .update_status(created.id, ReservationStatus::Declined)
        .await
        .unwrap();

    let mut rx = ctx.events.subscribe();
    let same = service
        .update_status(created.id, ReservationStatus::Declined)
        .await
        .unwrap();
    assert_eq!(same.status, ReservationStatus::Declined);
    assert!(rx.try_recv().is_err(), "re-applying a status is silent");

    let err = service
        .update_status(created.id, ReservationStatus::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        InventoryError::InvalidTransition {
            from: ReservationStatus::Declined,
            to: ReservationStatus::Confirmed,
        }
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (KSURPLUS_TEST_DATABASE_URL)"]
async fn test_daily_limit_per_customer() {
    let ctx = TestContext::new().await;
    let product = ctx.create_product(10, price(250)).await;
    let customer = ctx.create_customer().await;
    let service = ctx.reservations(2);

    for _ in 0..2 {
        service
            .create(reserve(product, Some(existing_customer(customer.id))))
            .await
            .unwrap();
    }

    let err = service
        .create(reserve(product, Some(existing_customer(customer.id))))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        InventoryError::DailyLimitExceeded(ref e) if e.limit == 2 && e.used == 2
    ));
    assert_eq!(ctx.stock(product).await, 8);

    let quota = service.daily_quota(customer.id, None).await.unwrap();
    assert_eq!(quota.used, 2);
    assert_eq!(quota.remaining, 0);
    assert!(quota.enforced);

    // Walk-ins have no customer row to count against
    service.create(reserve(product, None)).await.unwrap();
    assert_eq!(ctx.stock(product).await, 7);
    ctx.assert_ledger_matches(product).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (KSURPLUS_TEST_DATABASE_URL)"]
async fn test_concurrent_reservations_respect_daily_limit() {
    let ctx = TestContext::new().await;
    let product = ctx.create_product(10, price(250)).await;
    let customer = ctx.create_customer().await;
    let service = ctx.reservations(3);

    let attempts = (0..6).map(|_| {
        service.create(reserve(product, Some(existing_customer(customer.id))))
    });
    let results = futures::future::join_all(attempts).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, InventoryError::DailyLimitExceeded(_)))
    );
    assert_eq!(ctx.stock(product).await, 7);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (KSURPLUS_TEST_DATABASE_URL)"]
async fn test_inline_customer_is_upserted_by_email() {
    let ctx = TestContext::new().await;
    let product = ctx.create_product(2, price(250)).await;
    let customer = ctx.create_customer().await;
    let email = customer.email.as_ref().unwrap().as_str().to_uppercase();

    let created = ctx
        .reservations(5)
        .create(reserve(
            product,
            Some(CustomerDetails {
                name: Some("Someone Else".to_string()),
                email: Some(email),
                ..CustomerDetails::default()
            }),
        ))
        .await
        .unwrap();

    assert_eq!(created.customer_id, Some(customer.id));
}
