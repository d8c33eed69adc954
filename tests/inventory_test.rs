mod common;

use axum::http::{Method, StatusCode};
use common::{decimal, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

struct Stock {
    material_id: i64,
    batch_id: i64,
}

/// Material with a minimum of 20 and one received batch of 50.
async fn received_stock(app: &TestApp) -> Stock {
    let material = app
        .call(
            Method::POST,
            "/api/v1/materials",
            Some(json!({ "name": "Steel sheet", "type": "Sheet", "unit": "kg", "minimum_stock": "20" })),
            StatusCode::CREATED,
        )
        .await;
    let material_id = material["data"]["id"].as_i64().unwrap();
    assert_eq!(decimal(&material["data"]["current_stock"]), dec!(0));

    let batch = app
        .call(
            Method::POST,
            "/api/v1/materials/batches",
            Some(json!({ "batch_number": "B-1", "material_id": material_id, "quantity": "50" })),
            StatusCode::CREATED,
        )
        .await;
    Stock {
        material_id,
        batch_id: batch["data"]["id"].as_i64().unwrap(),
    }
}

async fn levels(app: &TestApp, stock: &Stock) -> (rust_decimal::Decimal, rust_decimal::Decimal) {
    let material = app
        .call(
            Method::GET,
            &format!("/api/v1/materials/{}", stock.material_id),
            None,
            StatusCode::OK,
        )
        .await;
    let batch = app
        .call(
            Method::GET,
            &format!("/api/v1/materials/batches/{}", stock.batch_id),
            None,
            StatusCode::OK,
        )
        .await;
    (
        decimal(&material["data"]["current_stock"]),
        decimal(&batch["data"]["remaining_quantity"]),
    )
}

async fn movement(app: &TestApp, body: Value) -> axum::response::Response {
    app.request_authenticated(Method::POST, "/api/v1/materials/movements", Some(body))
        .await
}

#[tokio::test]
async fn receipts_issues_and_returns_track_stock_and_batch() {
    let app = TestApp::new().await;
    let stock = received_stock(&app).await;
    assert_eq!(levels(&app, &stock).await, (dec!(50), dec!(50)));

    let issued = movement(
        &app,
        json!({ "movement_type": "Issue", "material_id": stock.material_id, "batch_id": stock.batch_id, "quantity": "15" }),
    )
    .await;
    assert_eq!(issued.status(), StatusCode::CREATED);
    assert_eq!(levels(&app, &stock).await, (dec!(35), dec!(35)));

    let returned = movement(
        &app,
        json!({ "movement_type": "Return", "material_id": stock.material_id, "batch_id": stock.batch_id, "quantity": "5" }),
    )
    .await;
    assert_eq!(returned.status(), StatusCode::CREATED);
    assert_eq!(levels(&app, &stock).await, (dec!(40), dec!(40)));

    let too_much = movement(
        &app,
        json!({ "movement_type": "Issue", "material_id": stock.material_id, "batch_id": stock.batch_id, "quantity": "100" }),
    )
    .await;
    assert_eq!(too_much.status(), StatusCode::BAD_REQUEST);
    let body = response_json(too_much).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Insufficient quantity in batch"));
    assert_eq!(levels(&app, &stock).await, (dec!(40), dec!(40)));

    let unknown = movement(
        &app,
        json!({ "movement_type": "Transfer", "material_id": stock.material_id, "quantity": "1" }),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

    let listed = app
        .call(
            Method::GET,
            &format!("/api/v1/materials/movements?material_id={}", stock.material_id),
            None,
            StatusCode::OK,
        )
        .await;
    // Batch receipt, issue, return.
    assert_eq!(listed["data"]["total"], 4);
    assert_eq!(listed["data"]["items"][0]["movement_type"], "Return");

    let issues = app
        .call(
            Method::GET,
            &format!(
                "/api/v1/materials/movements?material_id={}&movement_type=Issue",
                stock.material_id
            ),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(issues["data"]["total"], 1);
}

#[tokio::test]
async fn issue_to_production_links_the_order() {
    let app = TestApp::new().await;
    let fixture = app.order_fixture().await;
    let po_id = app.production_order(&fixture, 10).await;
    let stock = received_stock(&app).await;

    let issued = app
        .call(
            Method::POST,
            "/api/v1/materials/movements/issue-to-production",
            Some(json!({
                "production_order_id": po_id,
                "material_id": stock.material_id,
                "batch_id": stock.batch_id,
                "quantity": "12"
            })),
            StatusCode::CREATED,
        )
        .await;
    let po = app
        .call(
            Method::GET,
            &format!("/api/v1/production-orders/{po_id}"),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(issued["data"]["movement_type"], "Issue");
    assert_eq!(issued["data"]["reference_type"], "ProductionOrder");
    assert_eq!(issued["data"]["reference_id"].as_i64(), Some(po_id));
    assert_eq!(
        issued["data"]["notes"].as_str().unwrap(),
        format!("Material issued to PO {}", po["data"]["po_number"].as_str().unwrap())
    );
    assert_eq!(levels(&app, &stock).await, (dec!(38), dec!(38)));

    let short = app
        .request_authenticated(
            Method::POST,
            "/api/v1/materials/movements/issue-to-production",
            Some(json!({
                "production_order_id": po_id,
                "material_id": stock.material_id,
                "batch_id": stock.batch_id,
                "quantity": "39"
            })),
        )
        .await;
    assert_eq!(short.status(), StatusCode::BAD_REQUEST);

    let missing_order = app
        .request_authenticated(
            Method::POST,
            "/api/v1/materials/movements/issue-to-production",
            Some(json!({
                "production_order_id": 9999,
                "material_id": stock.material_id,
                "batch_id": stock.batch_id,
                "quantity": "1"
            })),
        )
        .await;
    assert_eq!(missing_order.status(), StatusCode::BAD_REQUEST);
    assert_eq!(levels(&app, &stock).await, (dec!(38), dec!(38)));
}

#[tokio::test]
async fn adjustments_move_stock_both_ways_but_never_below_zero() {
    let app = TestApp::new().await;
    let stock = received_stock(&app).await;

    let down = movement(
        &app,
        json!({ "movement_type": "Adjustment", "material_id": stock.material_id, "batch_id": stock.batch_id, "quantity": "-35" }),
    )
    .await;
    assert_eq!(down.status(), StatusCode::CREATED);
    assert_eq!(levels(&app, &stock).await, (dec!(15), dec!(15)));

    let low = app
        .call(Method::GET, "/api/v1/materials/low-stock", None, StatusCode::OK)
        .await;
    assert_eq!(low["data"][0]["id"].as_i64(), Some(stock.material_id));

    let up = movement(
        &app,
        json!({ "movement_type": "Adjustment", "material_id": stock.material_id, "batch_id": stock.batch_id, "quantity": "3" }),
    )
    .await;
    assert_eq!(up.status(), StatusCode::CREATED);
    assert_eq!(levels(&app, &stock).await, (dec!(18), dec!(18)));

    let below_batch = movement(
        &app,
        json!({ "movement_type": "Adjustment", "material_id": stock.material_id, "batch_id": stock.batch_id, "quantity": "-19" }),
    )
    .await;
    assert_eq!(below_batch.status(), StatusCode::BAD_REQUEST);

    let below_stock = movement(
        &app,
        json!({ "movement_type": "Adjustment", "material_id": stock.material_id, "quantity": "-50" }),
    )
    .await;
    assert_eq!(below_stock.status(), StatusCode::BAD_REQUEST);
    let body = response_json(below_stock).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Insufficient material stock"));

    let zero = movement(
        &app,
        json!({ "movement_type": "Adjustment", "material_id": stock.material_id, "quantity": "0" }),
    )
    .await;
    assert_eq!(zero.status(), StatusCode::BAD_REQUEST);

    let negative_issue = movement(
        &app,
        json!({ "movement_type": "Issue", "material_id": stock.material_id, "quantity": "-1" }),
    )
    .await;
    assert_eq!(negative_issue.status(), StatusCode::BAD_REQUEST);
    assert_eq!(levels(&app, &stock).await, (dec!(18), dec!(18)));
}

#[tokio::test]
async fn duplicate_batch_number_is_rejected() {
    let app = TestApp::new().await;
    let stock = received_stock(&app).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/materials/batches",
            Some(json!({ "batch_number": "B-1", "material_id": stock.material_id, "quantity": "5" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(levels(&app, &stock).await, (dec!(50), dec!(50)));
}

#[tokio::test]
async fn bill_of_materials_and_sub_assemblies() {
    let app = TestApp::new().await;
    let fixture = app.order_fixture().await;
    let stock = received_stock(&app).await;
    let parent = fixture.part_number_id;
    let child = app.part_number(fixture.customer_id, "PIN-7", "0.40").await;

    let line = app
        .call(
            Method::POST,
            &format!("/api/v1/part-numbers/{parent}/materials"),
            Some(json!({ "material_id": stock.material_id, "quantity": "2", "scrap_percentage": "10" })),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(decimal(&line["data"]["gross_quantity"]), dec!(2.2));
    assert_eq!(line["data"]["unit"], "kg");
    let line_id = line["data"]["id"].as_i64().unwrap();

    let bad_scrap = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/part-numbers/{parent}/materials"),
            Some(json!({ "material_id": stock.material_id, "quantity": "1", "scrap_percentage": "120" })),
        )
        .await;
    assert_eq!(bad_scrap.status(), StatusCode::BAD_REQUEST);

    let lines = app
        .call(
            Method::GET,
            &format!("/api/v1/part-numbers/{parent}/materials"),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(lines["data"].as_array().unwrap().len(), 1);
    assert_eq!(lines["data"][0]["material"]["name"], "Steel sheet");

    let link = app
        .call(
            Method::POST,
            &format!("/api/v1/part-numbers/{parent}/sub-assemblies"),
            Some(json!({ "child_part_id": child, "quantity": "4" })),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(link["data"]["child_part"]["part_number"], "PIN-7");
    let link_id = link["data"]["id"].as_i64().unwrap();

    let itself = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/part-numbers/{parent}/sub-assemblies"),
            Some(json!({ "child_part_id": parent, "quantity": "1" })),
        )
        .await;
    assert_eq!(itself.status(), StatusCode::BAD_REQUEST);
    let body = response_json(itself).await;
    assert!(body["message"].as_str().unwrap().contains("itself"));

    let unknown_child = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/part-numbers/{parent}/sub-assemblies"),
            Some(json!({ "child_part_id": 9999, "quantity": "1" })),
        )
        .await;
    assert_eq!(unknown_child.status(), StatusCode::BAD_REQUEST);

    app.call(
        Method::DELETE,
        &format!("/api/v1/part-numbers/{parent}/materials/{line_id}"),
        None,
        StatusCode::OK,
    )
    .await;
    app.call(
        Method::DELETE,
        &format!("/api/v1/part-numbers/{parent}/sub-assemblies/{link_id}"),
        None,
        StatusCode::OK,
    )
    .await;
    let links = app
        .call(
            Method::GET,
            &format!("/api/v1/part-numbers/{parent}/sub-assemblies"),
            None,
            StatusCode::OK,
        )
        .await;
    assert!(links["data"].as_array().unwrap().is_empty());

    let gone = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/part-numbers/{parent}/materials/{line_id}"),
            None,
        )
        .await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}
