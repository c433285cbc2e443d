// Integration tests for checkout initiation
//
// Checkout must refuse unavailable, own and already-owned items, and must
// never leave a pending payment behind when the gateway call fails.

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::*;
use rust_decimal_macros::dec;
use std::sync::atomic::Ordering;

use lawbook_payments::core::{AppError, Currency};
use lawbook_payments::modules::catalog::CatalogItem;
use lawbook_payments::modules::payments::PaymentStatus;
use lawbook_payments::modules::purchases::Purchase;
use lawbook_payments::modules::sellers::SellerType;

const BUYER: &str = "buyer-1";

fn seed_item(harness: &TestHarness, seller_type: SellerType) -> CatalogItem {
    let seller = TestDataFactory::seller("seller-1", seller_type);
    let item = TestDataFactory::approved_item("item-1", &seller, dec!(1000));
    harness.store.add_seller(seller);
    harness.store.add_item(item.clone());
    item
}

fn assert_validation(result: Result<impl std::fmt::Debug, AppError>, expected: &str) {
    match result {
        Err(AppError::Validation(message)) => assert_eq!(message, expected),
        other => panic!("expected validation error '{}', got {:?}", expected, other),
    }
}

#[tokio::test]
async fn test_checkout_records_pending_payment() {
    let harness = TestHarness::new();
    seed_item(&harness, SellerType::Individual);
    harness.gateway.queue_tracker("T1");

    let response = harness.checkout.initiate(BUYER, "item-1").await.unwrap();

    assert_eq!(response.tracker, "T1");
    assert_eq!(response.amount, dec!(1000));
    assert_eq!(response.currency, Currency::PKR);
    assert_eq!(response.commission_breakdown.platform_amount, dec!(200));
    assert_eq!(response.commission_breakdown.seller_amount, dec!(800));
    assert_eq!(response.commission_breakdown.commission_percentage, dec!(20));
    assert!(response.payment_url.contains("T1"));
    assert!(response.transaction_ref.starts_with("LB"));

    let payment = harness.store.payment_by_tracker("T1").unwrap();
    assert_eq!(payment.id, response.payment_id);
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.buyer_id, BUYER);
    assert_eq!(payment.seller_id, "seller-1");
    assert_eq!(payment.amount, dec!(1000));
    assert!(harness.store.purchases().is_empty());
}

#[tokio::test]
async fn test_checkout_charges_discounted_price() {
    let harness = TestHarness::new();
    let mut item = seed_item(&harness, SellerType::Publisher);
    item.discounted_price = Some(dec!(750));
    harness.store.add_item(item);

    let response = harness.checkout.initiate(BUYER, "item-1").await.unwrap();

    assert_eq!(response.amount, dec!(750));
    assert_eq!(response.commission_breakdown.commission_percentage, dec!(15));
    assert_eq!(
        response.commission_breakdown.seller_amount + response.commission_breakdown.platform_amount,
        dec!(750)
    );
}

#[tokio::test]
async fn test_checkout_ignores_discount_above_price() {
    let harness = TestHarness::new();
    let mut item = seed_item(&harness, SellerType::Individual);
    item.discounted_price = Some(dec!(1500));
    harness.store.add_item(item);

    let response = harness.checkout.initiate(BUYER, "item-1").await.unwrap();

    assert_eq!(response.amount, dec!(1000));
}

#[tokio::test]
async fn test_checkout_unknown_item() {
    let harness = TestHarness::new();

    let result = harness.checkout.initiate(BUYER, "missing").await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(harness.gateway.checkout_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_checkout_requires_item_id() {
    let harness = TestHarness::new();

    let result = harness.checkout.initiate(BUYER, "  ").await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_checkout_unapproved_item() {
    let harness = TestHarness::new();
    let mut item = seed_item(&harness, SellerType::Individual);
    item.status = "pending_review".to_string();
    harness.store.add_item(item);

    let result = harness.checkout.initiate(BUYER, "item-1").await;

    assert_validation(result, "Item is not available for purchase");
    assert!(harness.store.payments().is_empty());
}

#[tokio::test]
async fn test_checkout_own_item() {
    let harness = TestHarness::new();
    seed_item(&harness, SellerType::Individual);

    let result = harness.checkout.initiate("seller-1", "item-1").await;

    assert_validation(result, "You cannot purchase your own item");
    assert_eq!(harness.gateway.checkout_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_checkout_already_purchased() {
    let harness = TestHarness::new();
    let item = seed_item(&harness, SellerType::Individual);

    let mut paid = TestDataFactory::pending_payment("T0", BUYER, &item, &harness.schedule);
    paid.status = PaymentStatus::Success;
    harness.store.add_purchase(Purchase::from_payment(&paid, "safepay"));
    harness.store.add_payment(paid);

    let result = harness.checkout.initiate(BUYER, "item-1").await;

    assert_validation(result, "You have already purchased this item");
    assert_eq!(harness.store.payments().len(), 1);
}

#[tokio::test]
async fn test_checkout_gateway_failure_leaves_no_payment() {
    let harness = TestHarness::new();
    seed_item(&harness, SellerType::Individual);
    harness.gateway.fail_checkout.store(true, Ordering::SeqCst);

    let result = harness.checkout.initiate(BUYER, "item-1").await;

    assert!(matches!(result, Err(AppError::GatewayUnavailable(_))));
    assert!(harness.store.payments().is_empty());
}

#[tokio::test]
async fn test_pending_checkout_does_not_block_retry() {
    let harness = TestHarness::new();
    seed_item(&harness, SellerType::Individual);

    let first = harness.checkout.initiate(BUYER, "item-1").await.unwrap();
    let second = harness.checkout.initiate(BUYER, "item-1").await.unwrap();

    assert_ne!(first.tracker, second.tracker);
    assert_eq!(harness.store.payments().len(), 2);
}

#[tokio::test]
async fn test_checkout_then_webhook_grants_access() {
    let harness = TestHarness::new();
    seed_item(&harness, SellerType::Individual);
    harness.gateway.queue_tracker("T1");

    harness.checkout.initiate(BUYER, "item-1").await.unwrap();

    let body = br#"{"tracker":"T1","event":"payment.completed"}"#;
    let ack = harness
        .reconciliation
        .handle_webhook(body, Some(&sign(body)))
        .await
        .unwrap();
    assert!(ack.processed);

    let purchases = harness.store.purchases();
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].buyer_id, BUYER);
    assert_eq!(purchases[0].amount, dec!(1000));

    let commissions = harness.store.commissions();
    assert_eq!(commissions.len(), 1);
    assert_eq!(commissions[0].seller_amount, dec!(800));
    assert_eq!(commissions[0].platform_amount, dec!(200));

    // Owning the item now blocks a second checkout
    let again = harness.checkout.initiate(BUYER, "item-1").await;
    assert_validation(again, "You have already purchased this item");
}
