mod common;

use axum::http::{header, Method, StatusCode};
use common::{response_json, TestApp};
use serde_json::{json, Value};

async fn scan(app: &TestApp, qr_code: &str, badge: &str) -> Value {
    app.call(
        Method::POST,
        "/api/v1/qr-scanner/scan",
        Some(json!({ "qr_code": qr_code, "badge_id": badge })),
        StatusCode::OK,
    )
    .await
}

/// Starts and completes every operation of a freshly generated travel sheet.
async fn run_travel_sheet(app: &TestApp, production_order_id: i64, good: i32, scrap: i32) -> Value {
    let sheet = app
        .call(
            Method::POST,
            &format!("/api/v1/production-orders/{production_order_id}/generate-travel-sheet"),
            None,
            StatusCode::CREATED,
        )
        .await;
    let operations = sheet["data"]["operations"].as_array().unwrap().clone();

    for operation in &operations {
        let qr = operation["qr_code"].as_str().unwrap();
        let started = scan(app, qr, "ADMIN001").await;
        assert_eq!(started["success"], true);
        assert!(started["message"].as_str().unwrap().starts_with("Operation started"));

        let again = scan(app, qr, "ADMIN001").await;
        assert_eq!(again["status"], "awaiting_completion");

        let completed = app
            .call(
                Method::PUT,
                &format!("/api/v1/qr-scanner/operations/{}/complete", operation["id"]),
                Some(json!({ "quantity_good": good, "quantity_scrap": scrap })),
                StatusCode::OK,
            )
            .await;
        assert_eq!(completed["success"], true);
        assert_eq!(completed["operation"]["status"], "Completed");
    }
    sheet
}

#[tokio::test]
async fn travel_sheet_follows_part_routing() {
    let app = TestApp::new().await;
    let fixture = app.order_fixture().await;
    let po_id = app.production_order(&fixture, 10).await;

    let sheet = app
        .call(
            Method::POST,
            &format!("/api/v1/production-orders/{po_id}/generate-travel-sheet"),
            None,
            StatusCode::CREATED,
        )
        .await;

    let operations = sheet["data"]["operations"].as_array().unwrap();
    let sequence: Vec<i64> = operations
        .iter()
        .map(|op| op["sequence_number"].as_i64().unwrap())
        .collect();
    assert_eq!(sequence, vec![10, 20]);
    assert_eq!(operations[0]["process"]["code"], "LASER_CUT");
    assert!(operations.iter().all(|op| op["status"] == "Pending"));
    assert_eq!(sheet["data"]["status"], "Active");

    let listed = app
        .call(
            Method::GET,
            &format!("/api/v1/production-orders/{po_id}/travel-sheets"),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn scanning_rejects_unknown_badges_and_bad_payloads() {
    let app = TestApp::new().await;

    let bad_badge = scan(&app, r#"{"type":"operation","id":1}"#, "NOBODY").await;
    assert_eq!(bad_badge["success"], false);
    assert_eq!(bad_badge["message"], "Invalid operator badge");

    let not_json = scan(&app, "hello", "ADMIN001").await;
    assert_eq!(not_json["success"], false);
    assert_eq!(not_json["message"], "Invalid QR code format");

    let unknown = scan(&app, r#"{"type":"pallet"}"#, "ADMIN001").await;
    assert_eq!(unknown["message"], "Unsupported QR code type");
}

#[tokio::test]
async fn completing_a_pending_operation_is_rejected() {
    let app = TestApp::new().await;
    let fixture = app.order_fixture().await;
    let po_id = app.production_order(&fixture, 5).await;
    let sheet = app
        .call(
            Method::POST,
            &format!("/api/v1/production-orders/{po_id}/generate-travel-sheet"),
            None,
            StatusCode::CREATED,
        )
        .await;
    let op_id = sheet["data"]["operations"][0]["id"].as_i64().unwrap();

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/qr-scanner/operations/{op_id}/complete"),
            Some(json!({ "quantity_good": 5 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_flow_from_scan_to_shipment_respects_quality_gate() {
    let app = TestApp::new().await;
    let fixture = app.order_fixture().await;
    let po_id = app.production_order(&fixture, 10).await;

    let sheet = run_travel_sheet(&app, po_id, 10, 0).await;
    let sheet_id = sheet["data"]["id"].as_i64().unwrap();

    let sheets = app
        .call(
            Method::GET,
            &format!("/api/v1/production-orders/{po_id}/travel-sheets"),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(sheets["data"][0]["status"], "Completed");

    // nothing shipped before inspection
    let uninspected = app
        .request_authenticated(
            Method::POST,
            "/api/v1/shipments",
            Some(json!({
                "customer_id": fixture.customer_id,
                "sales_order_id": fixture.sales_order_id,
                "shipment_date": "2025-03-20",
                "items": [{
                    "part_number_id": fixture.part_number_id,
                    "production_order_id": po_id,
                    "quantity": 1
                }]
            })),
        )
        .await;
    assert_eq!(uninspected.status(), StatusCode::BAD_REQUEST);
    let body = response_json(uninspected).await;
    assert!(body["message"].as_str().unwrap().contains("has not been quality inspected"));

    let pending = app
        .call(
            Method::GET,
            &format!("/api/v1/quality-inspections/production-order/{po_id}/pending"),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(pending["data"][0]["travel_sheet_id"].as_i64(), Some(sheet_id));

    app.call(
        Method::POST,
        "/api/v1/quality-inspections",
        Some(json!({
            "production_order_id": po_id,
            "travel_sheet_id": sheet_id,
            "status": "Released",
            "quantity_inspected": 10,
            "quantity_approved": 8,
            "quantity_rejected": 2
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
    assert_eq!(po["data"]["quantity_completed"], 8);
    assert_eq!(po["data"]["quantity_scrapped"], 2);
    assert_eq!(po["data"]["status"], "In Progress");

    let pending = app
        .call(
            Method::GET,
            &format!("/api/v1/quality-inspections/production-order/{po_id}/pending"),
            None,
            StatusCode::OK,
        )
        .await;
    assert!(pending["data"].as_array().unwrap().is_empty());

    let shipment = |quantity: i32| {
        json!({
            "customer_id": fixture.customer_id,
            "sales_order_id": fixture.sales_order_id,
            "shipment_date": "2025-03-21",
            "items": [{
                "sales_order_item_id": fixture.sales_order_item_id,
                "part_number_id": fixture.part_number_id,
                "production_order_id": po_id,
                "quantity": quantity
            }]
        })
    };

    let first = app
        .call(Method::POST, "/api/v1/shipments", Some(shipment(5)), StatusCode::CREATED)
        .await;
    let shipment_id = first["data"]["id"].as_i64().unwrap();
    assert!(first["data"]["shipment_number"].as_str().is_some());

    let too_many = app
        .request_authenticated(Method::POST, "/api/v1/shipments", Some(shipment(4)))
        .await;
    assert_eq!(too_many.status(), StatusCode::BAD_REQUEST);
    let body = response_json(too_many).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Only 3 approved units available"));

    let quantities = app
        .call(
            Method::GET,
            &format!("/api/v1/shipments/sales-order/{}/approved-quantities", fixture.sales_order_id),
            None,
            StatusCode::OK,
        )
        .await;
    let line = &quantities["data"][0];
    assert_eq!(line["ordered_quantity"], 10);
    assert_eq!(line["approved_quantity"], 8);
    assert_eq!(line["already_shipped"], 5);
    assert_eq!(line["available_to_ship"], 3);

    let shipped = app
        .call(
            Method::PATCH,
            &format!("/api/v1/shipments/{shipment_id}/status?status=Shipped&tracking_number=TRK-1"),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(shipped["data"]["status"], "Shipped");
    assert_eq!(shipped["data"]["tracking_number"], "TRK-1");

    let deleted = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/shipments/{shipment_id}"), None)
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let quantities = app
        .call(
            Method::GET,
            &format!("/api/v1/shipments/sales-order/{}/approved-quantities", fixture.sales_order_id),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(quantities["data"][0]["already_shipped"], 0);
    assert_eq!(quantities["data"][0]["available_to_ship"], 8);
}

#[tokio::test]
async fn rejected_inspection_blocks_shipping() {
    let app = TestApp::new().await;
    let fixture = app.order_fixture().await;
    let po_id = app.production_order(&fixture, 4).await;
    run_travel_sheet(&app, po_id, 4, 0).await;

    app.call(
        Method::POST,
        "/api/v1/quality-inspections",
        Some(json!({
            "production_order_id": po_id,
            "status": "Rejected",
            "quantity_inspected": 4,
            "quantity_rejected": 4,
            "rejection_reason": "Burrs on edges"
        })),
        StatusCode::CREATED,
    )
    .await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/shipments",
            Some(json!({
                "customer_id": fixture.customer_id,
                "shipment_date": "2025-03-22",
                "items": [{
                    "part_number_id": fixture.part_number_id,
                    "production_order_id": po_id,
                    "quantity": 1
                }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("rejected by quality control"));
}

#[tokio::test]
async fn dashboard_and_exports_reflect_orders() {
    let app = TestApp::new().await;
    let fixture = app.order_fixture().await;
    app.production_order(&fixture, 10).await;

    let stats = app
        .call(Method::GET, "/api/v1/dashboard/stats", None, StatusCode::OK)
        .await;
    assert_eq!(stats["data"]["total_open_orders"], 1);

    let production = app
        .call(Method::GET, "/api/v1/dashboard/production", None, StatusCode::OK)
        .await;
    assert_eq!(production["data"].as_array().unwrap().len(), 1);

    let bad_risk = app
        .request_authenticated(Method::GET, "/api/v1/dashboard/production?risk_status=Purple", None)
        .await;
    assert_eq!(bad_risk.status(), StatusCode::BAD_REQUEST);

    let csv = app
        .request_authenticated(Method::GET, "/api/v1/exports/sales-orders", None)
        .await;
    assert_eq!(csv.status(), StatusCode::OK);
    assert!(csv.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    let body = axum::body::to_bytes(csv.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("PO-2025-001"));
    assert!(text.contains("BRK-100"));
}
