mod common;

use axum::http::{Method, StatusCode};
use common::{decimal, OrderFixture, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

async fn sales_order(app: &TestApp, id: i64) -> Value {
    app.call(
        Method::GET,
        &format!("/api/v1/sales-orders/{id}"),
        None,
        StatusCode::OK,
    )
    .await
}

#[tokio::test]
async fn updating_items_replaces_the_whole_list() {
    let app = TestApp::new().await;
    let fixture = app.order_fixture().await;
    let washer = app.part_number(fixture.customer_id, "WSH-8", "0.25").await;

    let updated = app
        .call(
            Method::PUT,
            &format!("/api/v1/sales-orders/{}", fixture.sales_order_id),
            Some(json!({
                "notes": "Customer revised quantities",
                "items": [
                    { "part_number_id": fixture.part_number_id, "quantity": 4 },
                    { "part_number_id": washer, "quantity": 7, "unit_price": "5.00" }
                ]
            })),
            StatusCode::OK,
        )
        .await;
    assert_eq!(updated["data"]["notes"], "Customer revised quantities");
    assert_eq!(updated["data"]["po_number"], "PO-2025-001");

    let order = sales_order(&app, fixture.sales_order_id).await;
    let items = order["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items
        .iter()
        .all(|item| item["id"].as_i64() != Some(fixture.sales_order_item_id)));

    let bracket = items
        .iter()
        .find(|item| item["part_number_id"].as_i64() == Some(fixture.part_number_id))
        .unwrap();
    assert_eq!(bracket["quantity"], 4);
    assert_eq!(decimal(&bracket["unit_price"]), dec!(12.50));
    assert_eq!(decimal(&bracket["total_price"]), dec!(50));

    let washers = items
        .iter()
        .find(|item| item["part_number_id"].as_i64() == Some(washer))
        .unwrap();
    assert_eq!(washers["part_number"]["part_number"], "WSH-8");
    assert_eq!(decimal(&washers["total_price"]), dec!(35));
    assert_eq!(washers["quantity_shipped"], 0);
}

#[tokio::test]
async fn header_only_update_keeps_items() {
    let app = TestApp::new().await;
    let fixture = app.order_fixture().await;

    app.call(
        Method::PUT,
        &format!("/api/v1/sales-orders/{}", fixture.sales_order_id),
        Some(json!({ "due_date": "2025-04-15" })),
        StatusCode::OK,
    )
    .await;

    let order = sales_order(&app, fixture.sales_order_id).await;
    assert_eq!(order["data"]["due_date"], "2025-04-15");
    assert_eq!(
        order["data"]["items"][0]["id"].as_i64(),
        Some(fixture.sales_order_item_id)
    );

    let bad_item = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/sales-orders/{}", fixture.sales_order_id),
            Some(json!({ "items": [{ "part_number_id": 9999, "quantity": 1 }] })),
        )
        .await;
    assert_eq!(bad_item.status(), StatusCode::BAD_REQUEST);

    let order = sales_order(&app, fixture.sales_order_id).await;
    assert_eq!(
        order["data"]["items"][0]["id"].as_i64(),
        Some(fixture.sales_order_item_id)
    );
}

/// Production order for the whole line with all ten units released by quality.
async fn released_order(app: &TestApp, fixture: &OrderFixture) -> i64 {
    let po_id = app.production_order(fixture, 10).await;
    app.call(
        Method::POST,
        "/api/v1/quality-inspections",
        Some(json!({
            "production_order_id": po_id,
            "status": "Released",
            "quantity_inspected": 10,
            "quantity_approved": 10
        })),
        StatusCode::CREATED,
    )
    .await;
    po_id
}

fn shipment_body(fixture: &OrderFixture, po_id: i64, quantity: i32) -> Value {
    json!({
        "customer_id": fixture.customer_id,
        "sales_order_id": fixture.sales_order_id,
        "shipment_date": "2025-03-22",
        "items": [{
            "sales_order_item_id": fixture.sales_order_item_id,
            "part_number_id": fixture.part_number_id,
            "production_order_id": po_id,
            "quantity": quantity
        }]
    })
}

async fn fulfilment(app: &TestApp, fixture: &OrderFixture) -> (i64, String) {
    let order = sales_order(app, fixture.sales_order_id).await;
    (
        order["data"]["items"][0]["quantity_shipped"].as_i64().unwrap(),
        order["data"]["status"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn shipment_edits_and_deletes_rebalance_the_sales_order() {
    let app = TestApp::new().await;
    let fixture = app.order_fixture().await;
    let po_id = released_order(&app, &fixture).await;
    assert_eq!(fulfilment(&app, &fixture).await, (0, "Open".to_string()));

    let created = app
        .call(
            Method::POST,
            "/api/v1/shipments",
            Some(shipment_body(&fixture, po_id, 4)),
            StatusCode::CREATED,
        )
        .await;
    let shipment_id = created["data"]["id"].as_i64().unwrap();
    assert_eq!(fulfilment(&app, &fixture).await, (4, "Partial".to_string()));

    let full = app
        .call(
            Method::PUT,
            &format!("/api/v1/shipments/{shipment_id}"),
            Some(shipment_body(&fixture, po_id, 10)),
            StatusCode::OK,
        )
        .await;
    assert_eq!(full["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(full["data"]["items"][0]["quantity"], 10);
    assert_eq!(fulfilment(&app, &fixture).await, (10, "Completed".to_string()));

    let over = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/shipments/{shipment_id}"),
            Some(shipment_body(&fixture, po_id, 11)),
        )
        .await;
    assert_eq!(over.status(), StatusCode::BAD_REQUEST);
    assert_eq!(fulfilment(&app, &fixture).await, (10, "Completed".to_string()));

    app.call(
        Method::PUT,
        &format!("/api/v1/shipments/{shipment_id}"),
        Some(shipment_body(&fixture, po_id, 6)),
        StatusCode::OK,
    )
    .await;
    assert_eq!(fulfilment(&app, &fixture).await, (6, "Partial".to_string()));

    let deleted = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/shipments/{shipment_id}"), None)
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    assert_eq!(fulfilment(&app, &fixture).await, (0, "Open".to_string()));

    let missing = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/shipments/{shipment_id}"), None)
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
