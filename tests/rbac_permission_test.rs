mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rstest::rstest;
use serde_json::json;

#[tokio::test]
async fn operators_do_not_see_prices() {
    let app = TestApp::new().await;
    let fixture = app.order_fixture().await;
    let (_, operator) = app.user_with_role("op1", "Operator", "OP001").await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/sales-orders/{}", fixture.sales_order_id),
            None,
            Some(&operator),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let item = &body["data"]["items"][0];
    assert!(item["unit_price"].is_null());
    assert!(item["total_price"].is_null());
    assert_eq!(item["quantity"], 10);

    let admin_view = app
        .call(
            Method::GET,
            &format!("/api/v1/sales-orders/{}", fixture.sales_order_id),
            None,
            StatusCode::OK,
        )
        .await;
    assert!(!admin_view["data"]["items"][0]["unit_price"].is_null());
}

#[tokio::test]
async fn warehouse_role_sees_prices() {
    let app = TestApp::new().await;
    let fixture = app.order_fixture().await;
    let (_, warehouse) = app.user_with_role("wh1", "Warehouse", "WH001").await;

    let response = app
        .request(Method::GET, "/api/v1/sales-orders", None, Some(&warehouse))
        .await;
    let body = response_json(response).await;
    let order = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["id"].as_i64() == Some(fixture.sales_order_id))
        .cloned()
        .unwrap();
    assert!(!order["items"][0]["unit_price"].is_null());
}

#[rstest]
#[case("Operator", StatusCode::FORBIDDEN)]
#[case("Quality", StatusCode::FORBIDDEN)]
#[case("Management", StatusCode::OK)]
#[tokio::test]
async fn only_admin_or_management_delete_inspections(#[case] role: &str, #[case] expected: StatusCode) {
    let app = TestApp::new().await;
    let fixture = app.order_fixture().await;
    let po_id = app.production_order(&fixture, 3).await;
    let inspection = app
        .call(
            Method::POST,
            "/api/v1/quality-inspections",
            Some(json!({ "production_order_id": po_id, "status": "Pending" })),
            StatusCode::CREATED,
        )
        .await;
    let id = inspection["data"]["id"].as_i64().unwrap();
    let (_, token) = app.user_with_role("someone", role, "B-1").await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/quality-inspections/{id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), expected);
}

#[rstest]
#[case(Method::GET, "/api/v1/users")]
#[case(Method::GET, "/api/v1/audit-log")]
#[case(Method::DELETE, "/api/v1/users/1")]
#[tokio::test]
async fn operators_cannot_administer(#[case] method: Method, #[case] uri: &str) {
    let app = TestApp::new().await;
    let (_, operator) = app.user_with_role("op1", "Operator", "OP001").await;

    let response = app.request(method, uri, None, Some(&operator)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn operator_can_edit_own_profile_but_not_others() {
    let app = TestApp::new().await;
    let (operator, token) = app.user_with_role("op1", "Operator", "OP001").await;

    let response = app
        .request(
            Method::PUT,
            "/api/v1/users/me",
            Some(json!({ "full_name": "Olga Perez" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["id"].as_i64(), Some(i64::from(operator.id)));
    assert_eq!(body["data"]["full_name"], "Olga Perez");

    let response = app
        .request(
            Method::PUT,
            "/api/v1/users/1",
            Some(json!({ "full_name": "Hijacked" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn management_lists_users_and_admin_reads_audit_log() {
    let app = TestApp::new().await;
    let (_, manager) = app.user_with_role("boss", "Management", "MGT01").await;

    let users = app
        .request(Method::GET, "/api/v1/users", None, Some(&manager))
        .await;
    assert_eq!(users.status(), StatusCode::OK);
    let body = response_json(users).await;
    assert_eq!(body["data"]["total"], 2);

    let audit = app
        .request(Method::GET, "/api/v1/audit-log", None, Some(&manager))
        .await;
    assert_eq!(audit.status(), StatusCode::FORBIDDEN);

    app.order_fixture().await;
    let audit = app
        .call(Method::GET, "/api/v1/audit-log", None, StatusCode::OK)
        .await;
    assert!(audit["data"]["total"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn admin_cannot_delete_self() {
    let app = TestApp::new().await;
    let me = app
        .call(Method::GET, "/api/v1/auth/me", None, StatusCode::OK)
        .await;
    let id = me["data"]["id"].as_i64().unwrap();

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/users/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
