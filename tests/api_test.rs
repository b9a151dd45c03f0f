//! HTTP-level tests against the in-memory repository. No database needed.

use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};
use uuid::Uuid;

use shipping_service::application::label_issuer::IssuerSettings;
use shipping_service::application::shipping_service::ShippingService;
use shipping_service::domain::courier::CourierRegistry;
use shipping_service::domain::ports::ShippingRepository;
use shipping_service::infrastructure::memory_repo::InMemoryShippingRepository;
use shipping_service::infrastructure::system::{SystemClock, ThreadRandom};
use shipping_service::routes;

fn service(repo: Arc<InMemoryShippingRepository>) -> web::Data<ShippingService> {
    let repo: Arc<dyn ShippingRepository> = repo;
    web::Data::new(ShippingService::new(
        repo,
        Arc::new(CourierRegistry::builtin()),
        Arc::new(ThreadRandom),
        Arc::new(SystemClock),
        IssuerSettings::default(),
    ))
}

fn address(city: &str, pincode: &str) -> Value {
    json!({
        "name": "Meera Nair",
        "phone": "9812345678",
        "addressLine1": "4 Residency Road",
        "city": city,
        "state": "KA",
        "pincode": pincode
    })
}

macro_rules! app {
    ($repo:expr) => {
        test::init_service(App::new().app_data(service($repo)).configure(routes)).await
    };
}

#[actix_web::test]
async fn lists_and_fetches_couriers() {
    let app = app!(Arc::new(InMemoryShippingRepository::new()));

    let req = test::TestRequest::get().uri("/couriers").to_request();
    let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.len(), 6);

    let req = test::TestRequest::get().uri("/couriers/bluedart").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["name"], "Blue Dart");
    assert_eq!(body["weightLimitKg"], 10.0);

    let req = test::TestRequest::get().uri("/couriers/pigeon").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().is_some());
}

#[actix_web::test]
async fn rates_are_sorted_and_flag_availability() {
    let app = app!(Arc::new(InMemoryShippingRepository::new()));

    let req = test::TestRequest::post()
        .uri("/shipping/rates")
        .set_json(json!({ "fromPincode": "110001", "toPincode": "560001", "weightKg": 2.0 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["available"], true);
    let costs: Vec<i64> = body["rates"]
        .as_array()
        .expect("rates array")
        .iter()
        .map(|r| r["cost"].as_i64().expect("cost"))
        .collect();
    assert!(!costs.is_empty());
    assert!(costs.windows(2).all(|w| w[0] <= w[1]));

    // Heavier than every courier's weight limit.
    let req = test::TestRequest::post()
        .uri("/shipping/rates")
        .set_json(json!({ "fromPincode": "110001", "toPincode": "560001", "weightKg": 50.0 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["available"], false);
    assert_eq!(body["rates"], json!([]));
}

#[actix_web::test]
async fn rates_reject_malformed_input() {
    let app = app!(Arc::new(InMemoryShippingRepository::new()));

    for payload in [
        json!({ "fromPincode": "011001", "toPincode": "560001", "weightKg": 1.0 }),
        json!({ "fromPincode": "110001", "toPincode": "56000", "weightKg": 1.0 }),
        json!({ "fromPincode": "110001", "toPincode": "560001", "weightKg": 0.0 }),
        json!({ "fromPincode": "110001", "toPincode": "560001", "weightKg": 1.0, "codAmount": -5.0 }),
        json!({ "fromPincode": "110001", "toPincode": "560001", "weightKg": 1.0, "codAmount": 1.0e9 }),
    ] {
        let req = test::TestRequest::post()
            .uri("/shipping/rates")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{payload}");
    }
}

#[actix_web::test]
async fn label_lifecycle_over_http() {
    let repo = Arc::new(InMemoryShippingRepository::new());
    let seller_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();
    repo.add_order(order_id, seller_id);
    let app = app!(repo.clone());

    let req = test::TestRequest::post()
        .uri("/shipping/rates")
        .set_json(json!({ "fromPincode": "110001", "toPincode": "560001", "weightKg": 1.5 }))
        .to_request();
    let quote: Value = test::call_and_read_body_json(&app, req).await;
    let rate = quote["rates"][0].clone();

    let create = json!({
        "orderId": order_id,
        "rate": rate,
        "fromAddress": address("New Delhi", "110001"),
        "toAddress": address("Bengaluru", "560001"),
        "weightKg": 1.5
    });

    let req = test::TestRequest::post()
        .uri("/shipping/labels")
        .set_json(&create)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let label: Value = test::read_body_json(resp).await;
    let tracking = label["trackingNumber"].as_str().expect("tracking number").to_string();
    assert_eq!(label["status"], "created");
    assert_eq!(label["shippingCost"], rate["cost"]);
    assert!(label["labelUrl"].as_str().expect("url").ends_with(&format!("{tracking}.pdf")));

    // Second label for the same order.
    let req = test::TestRequest::post()
        .uri("/shipping/labels")
        .set_json(&create)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(repo.label_count(), 1);

    let req = test::TestRequest::get()
        .uri(&format!("/orders/{order_id}/shipment"))
        .to_request();
    let shipment: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(shipment["trackingNumber"], tracking.as_str());
    assert_eq!(shipment["shippingStatus"], "label_created");

    let req = test::TestRequest::get()
        .uri(&format!("/shipping/labels/{tracking}/tracking"))
        .to_request();
    let info: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(info["currentStatus"], "created");
    assert_eq!(info["events"][0]["status"], "label_created");

    let req = test::TestRequest::put()
        .uri(&format!("/shipping/labels/{tracking}/status"))
        .set_json(json!({ "status": "delivered" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::put()
        .uri(&format!("/shipping/labels/{tracking}/status"))
        .set_json(json!({ "status": "in_transit" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    let req = test::TestRequest::put()
        .uri(&format!("/shipping/labels/{tracking}/status"))
        .set_json(json!({ "status": "lost" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri(&format!("/orders/{order_id}/shipment"))
        .to_request();
    let shipment: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(shipment["shippingStatus"], "delivered");

    let req = test::TestRequest::get()
        .uri(&format!("/orders/{order_id}/label"))
        .to_request();
    let by_order: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(by_order["status"], "delivered");

    let req = test::TestRequest::get()
        .uri(&format!("/sellers/{seller_id}/labels"))
        .to_request();
    let labels: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0]["trackingNumber"], tracking.as_str());

    let req = test::TestRequest::get()
        .uri(&format!("/sellers/{}/labels", Uuid::new_v4()))
        .to_request();
    let labels: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(labels.is_empty());
}

#[actix_web::test]
async fn unknown_resources_are_404() {
    let app = app!(Arc::new(InMemoryShippingRepository::new()));

    for uri in [
        "/shipping/labels/BLUNOPE0000/tracking".to_string(),
        format!("/orders/{}/label", Uuid::new_v4()),
        format!("/orders/{}/shipment", Uuid::new_v4()),
    ] {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    let req = test::TestRequest::put()
        .uri("/shipping/labels/BLUNOPE0000/status")
        .set_json(json!({ "status": "picked_up" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn label_for_unknown_order_or_bad_rate_is_rejected() {
    let app = app!(Arc::new(InMemoryShippingRepository::new()));
    let rate = json!({
        "courierId": "delhivery",
        "courierName": "Delhivery",
        "serviceType": "surface",
        "estimatedDeliveryDays": 6,
        "cost": 96,
        "codAvailable": false,
        "trackingAvailable": true
    });

    let req = test::TestRequest::post()
        .uri("/shipping/labels")
        .set_json(json!({
            "orderId": Uuid::new_v4(),
            "rate": rate,
            "fromAddress": address("New Delhi", "110001"),
            "toAddress": address("Bengaluru", "560001"),
            "weightKg": 1.0
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let mut bad_rate = rate.clone();
    bad_rate["serviceType"] = json!("teleport");
    let req = test::TestRequest::post()
        .uri("/shipping/labels")
        .set_json(json!({
            "orderId": Uuid::new_v4(),
            "rate": bad_rate,
            "fromAddress": address("New Delhi", "110001"),
            "toAddress": address("Bengaluru", "560001"),
            "weightKg": 1.0
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}
