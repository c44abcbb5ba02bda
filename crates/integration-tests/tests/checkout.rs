//! Checkout from a populated cart through allergy screening and payment.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use dewdrop_client::types::NewOrder;
use dewdrop_client::{CartController, CheckoutFlow, CheckoutOutcome, MemorySessionStore};
use dewdrop_core::{OrderId, PaymentMethod, ProductId};
use dewdrop_integration_tests::{client, product, session};
use serde_json::json;
use wiremock::matchers::{body_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_backend(server: &MockServer, flagged: i64) {
    Mock::given(method("GET"))
        .and(path("/api/cart/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": 1, "quantity": 1, "product": product(4, "Cica Balm", "12.50")},
                {"id": 2, "quantity": 2, "product": product(9, "Rose Mist", "18.00")}
            ]
        })))
        .mount(server)
        .await;

    for id in [4, 9] {
        let has_allergens = id == flagged;
        Mock::given(method("POST"))
            .and(path("/api/products/allergy-check/"))
            .and(body_json(json!({"product_id": id})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "product_name": if id == 4 { "Cica Balm" } else { "Rose Mist" },
                "has_allergens": has_allergens,
                "matched_allergens": if has_allergens { json!(["fragrance"]) } else { json!([]) }
            })))
            .mount(server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path("/api/orders/create/"))
        .and(header_exists("idempotency-key"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 40,
            "status": "pending",
            "payment_method": "online",
            "total": "52.38",
            "items": []
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/payments/initiate/"))
        .and(body_json(json!({"order_id": 40, "payment_method": "online"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "order_id": 40,
            "reference": "PAY-40",
            "payment_url": "https://pay.example.com/PAY-40"
        })))
        .mount(server)
        .await;
}

fn online_order() -> NewOrder {
    NewOrder {
        shipping_address: "1 Dew Lane".to_string(),
        phone: None,
        payment_method: PaymentMethod::Online,
        notes: None,
    }
}

#[tokio::test]
async fn test_allergy_warning_then_acknowledged_order() {
    let server = MockServer::start().await;
    mount_backend(&server, 9).await;

    let store = Arc::new(MemorySessionStore::with_session(session("a1", Some("r1"))));
    let client = client(&server, store);
    let cart = CartController::new(client.clone());
    let flow = CheckoutFlow::new(&client, &cart);

    let CheckoutOutcome::AllergyWarning(reports) = flow.place_order(&online_order()).await.unwrap()
    else {
        panic!("expected an allergy warning");
    };
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].product_id, Some(ProductId::new(9)));
    assert_eq!(reports[0].matched_allergens, vec!["fragrance".to_string()]);

    let requests = server.received_requests().await.unwrap();
    assert!(!requests.iter().any(|r| r.url.path() == "/api/orders/create/"));

    let CheckoutOutcome::Placed { order, payment } = flow
        .place_order_acknowledging_allergens(&online_order())
        .await
        .unwrap()
    else {
        panic!("expected a placed order");
    };
    assert_eq!(order.id, OrderId::new(40));
    let payment = payment.unwrap();
    assert_eq!(payment.reference, "PAY-40");
    assert_eq!(
        payment.payment_url.as_deref(),
        Some("https://pay.example.com/PAY-40")
    );
}

#[tokio::test]
async fn test_clean_cart_places_order_directly() {
    let server = MockServer::start().await;
    mount_backend(&server, 0).await;

    let store = Arc::new(MemorySessionStore::with_session(session("a1", Some("r1"))));
    let client = client(&server, store);
    let cart = CartController::new(client.clone());

    let outcome = CheckoutFlow::new(&client, &cart)
        .place_order(&online_order())
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        CheckoutOutcome::Placed { ref order, payment: Some(_) } if order.id == OrderId::new(40)
    ));
}
