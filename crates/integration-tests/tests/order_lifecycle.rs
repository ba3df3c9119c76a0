//! Order engine behavior through the public API.

use std::sync::Arc;

use pocket_store::models::CartLineItem;
use pocket_store::services::orders::{OrderEngine, OrderError};
use pocket_store::storage::MemoryStore;
use pocket_store_core::{Money, OrderId, OrderStatus, ProductId, UserId};

fn line(id: i32, cents: i64, quantity: u32) -> CartLineItem {
    CartLineItem {
        product_id: ProductId::new(id),
        title: format!("Product {id}"),
        price: Money::from_cents(cents),
        quantity,
        image: String::new(),
    }
}

#[tokio::test]
async fn test_order_from_two_unit_line() {
    let mut engine = OrderEngine::new(Arc::new(MemoryStore::new()));
    let user = UserId::new("u1");

    let order = engine
        .create_order(&user, &[line(1, 500, 2)], Money::from_cents(1000), 2)
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::New);
    assert_eq!(order.total_amount, Money::from_cents(1000));
    assert_eq!(order.total_quantity, 2);
    assert_eq!(engine.orders().first().map(|o| &o.id), Some(&order.id));
}

#[tokio::test]
async fn test_every_illegal_transition_is_rejected() {
    let mut engine = OrderEngine::new(Arc::new(MemoryStore::new()));
    let user = UserId::new("u1");
    let id = engine
        .create_order(&user, &[line(1, 100, 1)], Money::from_cents(100), 1)
        .await
        .unwrap()
        .id;

    for (from, to) in [
        (OrderStatus::New, OrderStatus::New),
        (OrderStatus::New, OrderStatus::Delivered),
    ] {
        let err = engine.update_status(&id, to).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { from: f, .. } if f == from));
    }

    engine.update_status(&id, OrderStatus::Paid).await.unwrap();
    for to in [OrderStatus::New, OrderStatus::Paid] {
        assert!(engine.update_status(&id, to).await.is_err());
    }

    engine
        .update_status(&id, OrderStatus::Delivered)
        .await
        .unwrap();
    for to in OrderStatus::ALL {
        assert!(engine.update_status(&id, to).await.is_err());
    }
    assert_eq!(engine.get(&id).unwrap().status, OrderStatus::Delivered);
}

#[tokio::test]
async fn test_missing_order_leaves_list_untouched() {
    let mut engine = OrderEngine::new(Arc::new(MemoryStore::new()));
    let user = UserId::new("u1");
    engine
        .create_order(&user, &[line(1, 100, 1)], Money::from_cents(100), 1)
        .await
        .unwrap();
    let before = engine.orders().to_vec();

    let err = engine
        .update_status(&OrderId::new("order_1_nope"), OrderStatus::Paid)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::NotFound(_)));
    assert_eq!(engine.orders(), before.as_slice());
}

#[tokio::test]
async fn test_ids_are_unique_across_rapid_orders() {
    let mut engine = OrderEngine::new(Arc::new(MemoryStore::new()));
    let user = UserId::new("u1");
    for _ in 0..50 {
        engine
            .create_order(&user, &[line(1, 100, 1)], Money::from_cents(100), 1)
            .await
            .unwrap();
    }

    let mut ids: Vec<&str> = engine.orders().iter().map(|o| o.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 50);
}
