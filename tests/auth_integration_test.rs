mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use serde_json::json;
use shopfloor_erp::middleware_helpers::REQUEST_ID_HEADER;

#[tokio::test]
async fn login_accepts_form_body() {
    let app = TestApp::new().await;

    let response = app
        .request_form("/api/v1/auth/login", "username=admin&password=admin123")
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["token_type"], "bearer");
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["expires_in"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn login_accepts_json_body_and_token_works() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "username": "admin", "password": "admin123" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let token = response_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let me = app
        .request(Method::GET, "/api/v1/auth/me", None, Some(&token))
        .await;
    assert_eq!(me.status(), StatusCode::OK);
    let me = response_json(me).await;
    assert_eq!(me["data"]["username"], "admin");
    assert_eq!(me["data"]["role"]["name"], "Admin");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .request_form("/api/v1/auth/login", "username=admin&password=nope")
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "AUTH_INVALID_CREDENTIALS");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::new().await;

    for uri in ["/api/v1/customers", "/api/v1/auth/me", "/api/v1/dashboard/stats"] {
        let response = app.request(Method::GET, uri, None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }

    let garbage = app
        .request(Method::GET, "/api/v1/customers", None, Some("not-a-jwt"))
        .await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deactivated_user_is_rejected_immediately() {
    let app = TestApp::new().await;
    let (operator, token) = app.user_with_role("op1", "Operator", "OP001").await;

    app.call(
        Method::PUT,
        &format!("/api/v1/users/{}", operator.id),
        Some(json!({ "is_active": false })),
        StatusCode::OK,
    )
    .await;

    let response = app
        .request(Method::GET, "/api/v1/customers", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_user_update_changes_nothing() {
    let app = TestApp::new().await;
    let (operator, _) = app.user_with_role("op1", "Operator", "OP001").await;
    let uri = format!("/api/v1/users/{}", operator.id);

    let oversized = app
        .request_authenticated(
            Method::PUT,
            &uri,
            Some(json!({ "badge_id": "B".repeat(51), "full_name": "Renamed" })),
        )
        .await;
    assert_eq!(oversized.status(), StatusCode::BAD_REQUEST);

    let unknown_role = app
        .request_authenticated(
            Method::PUT,
            &uri,
            Some(json!({ "full_name": "Renamed", "role_id": 9999 })),
        )
        .await;
    assert_eq!(unknown_role.status(), StatusCode::BAD_REQUEST);
    let body = response_json(unknown_role).await;
    assert_eq!(body["message"], "Role not found");

    let user = app.call(Method::GET, &uri, None, StatusCode::OK).await;
    assert_eq!(user["data"]["badge_id"], "OP001");
    assert_ne!(user["data"]["full_name"], "Renamed");
}

#[tokio::test]
async fn register_then_login_as_new_user() {
    let app = TestApp::new().await;
    let roles = app
        .call(Method::GET, "/api/v1/users/roles", None, StatusCode::OK)
        .await;
    let quality_role = roles["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "Quality")
        .and_then(|r| r["id"].as_i64())
        .unwrap();

    app.call(
        Method::POST,
        "/api/v1/auth/register",
        Some(json!({
            "username": "inspector",
            "password": "inspect123",
            "full_name": "Ines Pector",
            "badge_id": "QC042",
            "role_id": quality_role
        })),
        StatusCode::CREATED,
    )
    .await;

    let duplicate = app
        .request_authenticated(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({ "username": "inspector", "password": "inspect123" })),
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

    let login = app
        .request_form("/api/v1/auth/login", "username=inspector&password=inspect123")
        .await;
    assert_eq!(login.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_and_status_are_public() {
    let app = TestApp::new().await;

    let health = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(health.status(), StatusCode::OK);
    let body = response_json(health).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    let status = app.request(Method::GET, "/api/v1/status", None, None).await;
    assert_eq!(status.status(), StatusCode::OK);
    let body = response_json(status).await;
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/health", None, None).await;
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}
