//! Settlement preview endpoint tests.

mod common;

use common::TestApp;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;

fn dec_field(body: &Value, field: &str) -> Decimal {
    Decimal::from_str(body[field].as_str().expect("missing decimal field"))
        .expect("invalid decimal in response")
}

fn sample_line() -> Value {
    json!({
        "product_id": "prod-1",
        "product_name": "Organic Dates 500g",
        "initial_quantity": 10,
        "sold_quantity": 5,
        "remaining_quantity": 5,
        "unit_price": 100
    })
}

#[tokio::test]
async fn preview_with_explicit_rates_matches_worked_example() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/settlements/preview", app.http_address))
        .json(&json!({
            "items": [sample_line()],
            "rates": { "platform_rate": 8, "store_rate": 10 }
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse JSON");
    let totals = &body["totals"];
    assert_eq!(dec_field(totals, "total_sales"), Decimal::from(500));
    assert_eq!(dec_field(totals, "platform_commission_amount"), Decimal::from(40));
    assert_eq!(dec_field(totals, "store_commission_amount"), Decimal::from(50));
    assert_eq!(dec_field(totals, "store_payout_amount"), Decimal::from(50));
    assert_eq!(dec_field(totals, "brand_total_amount"), Decimal::from(410));
    assert_eq!(dec_field(totals, "return_inventory_value"), Decimal::from(500));
    assert_eq!(body["warnings"].as_array().unwrap().len(), 0);

    app.cleanup().await;
}

#[tokio::test]
async fn preview_without_rates_uses_current_settings() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    // First-run defaults are 8% platform / 10% store.
    let response = client
        .post(format!("{}/settlements/preview", app.http_address))
        .json(&json!({ "items": [sample_line()] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse JSON");
    let totals = &body["totals"];
    assert_eq!(dec_field(totals, "platform_commission_rate"), Decimal::from(8));
    assert_eq!(dec_field(totals, "store_commission_rate"), Decimal::from(10));
    assert_eq!(dec_field(totals, "platform_commission_amount"), Decimal::from(40));

    app.cleanup().await;
}

#[tokio::test]
async fn preview_flags_unreconciled_quantities() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/settlements/preview", app.http_address))
        .json(&json!({
            "items": [{
                "product_id": "prod-7",
                "product_name": "Sesame Crackers",
                "initial_quantity": 10,
                "sold_quantity": 5,
                "remaining_quantity": 3,
                "unit_price": 20
            }],
            "rates": { "platform_rate": 8, "store_rate": 10 }
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse JSON");
    let warnings = body["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["product_id"], "prod-7");
    // The line still settles on the quantities as given.
    assert_eq!(dec_field(&body["totals"], "total_sales"), Decimal::from(100));

    app.cleanup().await;
}

#[tokio::test]
async fn preview_with_no_items_is_well_formed_and_zero() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/settlements/preview", app.http_address))
        .json(&json!({ "items": [] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(dec_field(&body["totals"], "total_sales"), Decimal::ZERO);
    assert_eq!(dec_field(&body["totals"], "store_payout_amount"), Decimal::ZERO);

    app.cleanup().await;
}

#[tokio::test]
async fn preview_rejects_negative_quantity() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/settlements/preview", app.http_address))
        .json(&json!({
            "items": [{
                "product_id": "prod-1",
                "product_name": "Organic Dates 500g",
                "initial_quantity": 10,
                "sold_quantity": -5,
                "remaining_quantity": 15,
                "unit_price": 100
            }],
            "rates": { "platform_rate": 8, "store_rate": 10 }
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    app.cleanup().await;
}
