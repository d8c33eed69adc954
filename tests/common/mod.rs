#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::{json, Value};
use shopfloor_erp::{
    auth::hash_password,
    build_router,
    config::AppConfig,
    db,
    entities::{role, user},
    seed::{self, ADMIN_USERNAME},
    AppState,
};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_shopfloor_integration_32chars";

/// Router plus a freshly migrated and seeded SQLite database in a temp dir.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    admin_token: String,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let db_path = dir.path().join("shopfloor_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        seed::seed_defaults(&pool)
            .await
            .expect("failed to seed default data");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = build_router(state.clone()).expect("router");

        let admin_token = token_for(&state, ADMIN_USERNAME).await;
        Self {
            router,
            state,
            admin_token,
            _dir: dir,
        }
    }

    pub fn token(&self) -> &str {
        &self.admin_token
    }

    /// Inserts an active user holding `role_name` and returns a token for them.
    pub async fn user_with_role(&self, username: &str, role_name: &str, badge: &str) -> (user::Model, String) {
        let db = self.state.db.as_ref();
        let role = role::Entity::find()
            .filter(role::Column::Name.eq(role_name))
            .one(db)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("role {role_name} seeded"));
        let account = user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(hash_password("password123").unwrap()),
            role_id: Set(Some(role.id)),
            badge_id: Set(Some(badge.to_string())),
            full_name: Set(Some(format!("{username} ({role_name})"))),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        let token = token_for(&self.state, username).await;
        (account, token)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn request_form(&self, uri: &str, form: &str) -> axum::response::Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Authenticated request as the seeded admin.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    /// Admin JSON call that must return `expected`; yields the parsed body.
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>, expected: StatusCode) -> Value {
        let response = self.request_authenticated(method.clone(), uri, body).await;
        let status = response.status();
        let json = response_json(response).await;
        assert_eq!(status, expected, "{method} {uri} returned {json}");
        json
    }

    /// Customer, two-step routed part number and a sales order for 10 units.
    pub async fn order_fixture(&self) -> OrderFixture {
        let customer = self
            .call(
                Method::POST,
                "/api/v1/customers",
                Some(json!({ "code": "ACME", "name": "Acme Metals" })),
                StatusCode::CREATED,
            )
            .await;
        let customer_id = customer["data"]["id"].as_i64().unwrap();

        let processes = self
            .call(Method::GET, "/api/v1/processes", None, StatusCode::OK)
            .await;
        let process_id = |code: &str| {
            processes["data"]
                .as_array()
                .unwrap()
                .iter()
                .find(|p| p["code"] == code)
                .and_then(|p| p["id"].as_i64())
                .unwrap()
        };

        let part = self
            .call(
                Method::POST,
                "/api/v1/part-numbers",
                Some(json!({
                    "part_number": "BRK-100",
                    "customer_id": customer_id,
                    "description": "Mounting bracket",
                    "unit_price": "12.50",
                    "routings": [
                        { "process_id": process_id("LASER_CUT"), "sequence_number": 10 },
                        { "process_id": process_id("BENDING"), "sequence_number": 20 }
                    ]
                })),
                StatusCode::CREATED,
            )
            .await;
        let part_number_id = part["data"]["id"].as_i64().unwrap();

        let order = self
            .call(
                Method::POST,
                "/api/v1/sales-orders",
                Some(json!({
                    "po_number": "PO-2025-001",
                    "customer_id": customer_id,
                    "order_date": "2025-03-01",
                    "due_date": "2025-03-31",
                    "items": [
                        { "part_number_id": part_number_id, "quantity": 10, "unit_price": "12.50" }
                    ]
                })),
                StatusCode::CREATED,
            )
            .await;

        OrderFixture {
            customer_id,
            part_number_id,
            sales_order_id: order["data"]["id"].as_i64().unwrap(),
            sales_order_item_id: order["data"]["items"][0]["id"].as_i64().unwrap(),
        }
    }

    /// Extra part number for `customer_id` with no routing.
    pub async fn part_number(&self, customer_id: i64, number: &str, unit_price: &str) -> i64 {
        let part = self
            .call(
                Method::POST,
                "/api/v1/part-numbers",
                Some(json!({
                    "part_number": number,
                    "customer_id": customer_id,
                    "unit_price": unit_price
                })),
                StatusCode::CREATED,
            )
            .await;
        part["data"]["id"].as_i64().unwrap()
    }

    /// Production order for the fixture's line.
    pub async fn production_order(&self, fixture: &OrderFixture, quantity: i32) -> i64 {
        let po = self
            .call(
                Method::POST,
                "/api/v1/production-orders",
                Some(json!({
                    "sales_order_id": fixture.sales_order_id,
                    "sales_order_item_id": fixture.sales_order_item_id,
                    "part_number_id": fixture.part_number_id,
                    "quantity": quantity
                })),
                StatusCode::CREATED,
            )
            .await;
        po["data"]["id"].as_i64().unwrap()
    }
}

pub struct OrderFixture {
    pub customer_id: i64,
    pub part_number_id: i64,
    pub sales_order_id: i64,
    pub sales_order_item_id: i64,
}

async fn token_for(state: &AppState, username: &str) -> String {
    let (account, account_role) = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .find_also_related(role::Entity)
        .one(state.db.as_ref())
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("user {username} exists"));
    state
        .auth
        .generate_token(&account, account_role.as_ref())
        .expect("token")
        .access_token
}

/// Decimals arrive as JSON strings; numbers are accepted too.
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(raw) => raw.parse().unwrap_or_else(|_| panic!("not a decimal: {raw}")),
        Value::Number(n) => n.to_string().parse().unwrap(),
        other => panic!("expected a decimal, got {other}"),
    }
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&body).unwrap_or_else(|_| json!({ "raw": String::from_utf8_lossy(&body) }))
}
