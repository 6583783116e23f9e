//! Quote endpoint tests: VAT totals for both pricing regimes.

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

#[tokio::test]
async fn order_quote_computes_exclusive_totals() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/quotes/order", app.http_address))
        .json(&json!({ "items": [{ "price": 10, "quantity": 3 }] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(dec_field(&body, "subtotal"), Decimal::from(30));
    assert_eq!(dec_field(&body, "tax"), Decimal::from_str("4.5").unwrap());
    assert_eq!(dec_field(&body, "total"), Decimal::from_str("34.5").unwrap());

    app.cleanup().await;
}

#[tokio::test]
async fn order_quote_with_no_items_is_zero() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/quotes/order", app.http_address))
        .json(&json!({ "items": [] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(dec_field(&body, "subtotal"), Decimal::ZERO);
    assert_eq!(dec_field(&body, "total"), Decimal::ZERO);

    app.cleanup().await;
}

#[tokio::test]
async fn cart_quote_backs_tax_out_of_inclusive_prices() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/quotes/cart", app.http_address))
        .json(&json!({ "items": [{ "price": 115, "quantity": 1 }] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(dec_field(&body, "subtotal"), Decimal::from(100));
    assert_eq!(dec_field(&body, "tax"), Decimal::from(15));
    assert_eq!(dec_field(&body, "total"), Decimal::from(115));

    app.cleanup().await;
}

#[tokio::test]
async fn order_quote_rejects_negative_price() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/quotes/order", app.http_address))
        .json(&json!({ "items": [{ "price": -1, "quantity": 1 }] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    app.cleanup().await;
}
