//! Shop-floor ERP API Library
//!
//! Customers, part numbers and routings, sales and production orders, travel
//! sheets tracked by QR scan, inventory, quality inspections and shipments.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod admin;
pub mod auth;
pub mod catalog_import;
pub mod common;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod seed;
pub mod services;
pub mod tracing;

use axum::{
    extract::State,
    http::HeaderValue,
    response::Json,
    routing::{delete, get, patch, post, put},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use utoipa::ToSchema;

use crate::auth::consts as perm;
use crate::auth::{AuthConfig, AuthRouterExt, AuthService};
use crate::common::PageWindow;
use crate::db::DbPool;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: config::AppConfig) -> Self {
        let auth = Arc::new(AuthService::new(
            AuthConfig::from_app_config(&config),
            db.clone(),
        ));
        Self {
            services: handlers::AppServices::new(db.clone()),
            db,
            config,
            auth,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, window: PageWindow) -> Self {
        Self {
            items,
            total,
            page: window.page,
            limit: window.limit,
            total_pages: total.div_ceil(window.limit.max(1)),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    /// Success without a payload, e.g. after a delete.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn message_response_has_no_data() {
        let response = crate::tracing::scope_request_id(
            crate::tracing::RequestId::new("meta-msg"),
            async { ApiResponse::<()>::message("Customer deleted successfully") },
        )
        .await;

        assert!(response.success);
        assert!(response.data.is_none());
        assert_eq!(
            response.message.as_deref(),
            Some("Customer deleted successfully")
        );
        assert_eq!(
            response.meta.and_then(|m| m.request_id).as_deref(),
            Some("meta-msg")
        );
    }

    #[tokio::test]
    async fn validation_errors_response_includes_metadata() {
        let response = crate::tracing::scope_request_id(
            crate::tracing::RequestId::new("meta-validation"),
            async { ApiResponse::<()>::validation_errors(vec!["missing".into()]) },
        )
        .await;

        assert!(!response.success);
        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-validation"));
    }

    #[test]
    fn pagination_rounds_total_pages_up() {
        let window = PageWindow {
            page: 2,
            limit: 20,
            offset: 20,
        };
        let page = PaginatedResponse::new(vec![1, 2, 3], 41, window);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 2);
        assert_eq!(page.limit, 20);

        let empty = PaginatedResponse::<i32>::new(vec![], 0, window);
        assert_eq!(empty.total_pages, 0);
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Every `/api/v1` route. Login is the only unauthenticated endpoint; user
/// administration and the audit trail carry explicit permissions.
pub fn api_v1_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/status", get(handlers::health::api_status));

    // User administration with permission gating
    let users_create = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .with_permission(perm::USERS_CREATE);

    let users_read = Router::new()
        .route("/users", get(handlers::users::list_users))
        .with_permission(perm::USERS_READ);

    let users_update = Router::new()
        .route("/users/:id", put(handlers::users::update_user))
        .with_permission(perm::USERS_UPDATE);

    let users_delete = Router::new()
        .route("/users/:id", delete(handlers::users::delete_user))
        .with_permission(perm::USERS_DELETE);

    let users_self = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route("/users/me", put(handlers::users::update_me))
        .route("/users/roles", get(handlers::users::list_roles))
        .route("/users/:id", get(handlers::users::get_user))
        .with_auth();

    let audit = Router::new()
        .route("/audit-log", get(handlers::audit::list_audit_log))
        .with_permission(perm::AUDIT_READ);

    Router::new()
        .merge(public)
        .merge(users_create)
        .merge(users_read)
        .merge(users_update)
        .merge(users_delete)
        .merge(users_self)
        .merge(audit)
        .merge(business_routes().with_auth())
}

/// Master data, order flow, shop floor, quality, shipping and reporting.
/// Any authenticated user may call these; price visibility is applied per response.
fn business_routes() -> Router<AppState> {
    use handlers::{
        customers, dashboard, exports, materials, part_numbers, production_orders, qr_scanner,
        quality, sales_orders, shipments, work_centers,
    };

    Router::new()
        // Customers
        .route(
            "/customers",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route(
            "/customers/:id",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        // Materials, suppliers, batches and movements
        .route(
            "/materials",
            get(materials::list_materials).post(materials::create_material),
        )
        .route("/materials/low-stock", get(materials::low_stock))
        .route(
            "/materials/:id",
            get(materials::get_material)
                .put(materials::update_material)
                .delete(materials::delete_material),
        )
        .route(
            "/materials/suppliers",
            get(materials::list_suppliers).post(materials::create_supplier),
        )
        .route(
            "/materials/suppliers/:id",
            get(materials::get_supplier)
                .put(materials::update_supplier)
                .delete(materials::delete_supplier),
        )
        .route(
            "/materials/batches",
            get(materials::list_batches).post(materials::create_batch),
        )
        .route("/materials/batches/:id", get(materials::get_batch))
        .route(
            "/materials/movements",
            get(materials::list_movements).post(materials::create_movement),
        )
        .route(
            "/materials/movements/issue-to-production",
            post(materials::issue_to_production),
        )
        // Plant
        .route(
            "/work-centers",
            get(work_centers::list_work_centers).post(work_centers::create_work_center),
        )
        .route(
            "/work-centers/:id",
            get(work_centers::get_work_center).put(work_centers::update_work_center),
        )
        .route(
            "/machines",
            get(work_centers::list_machines).post(work_centers::create_machine),
        )
        .route("/machines/:id", put(work_centers::update_machine))
        .route(
            "/processes",
            get(work_centers::list_processes).post(work_centers::create_process),
        )
        // Part numbers
        .route(
            "/part-numbers",
            get(part_numbers::list_part_numbers).post(part_numbers::create_part_number),
        )
        .route(
            "/part-numbers/:id",
            get(part_numbers::get_part_number)
                .put(part_numbers::update_part_number)
                .delete(part_numbers::delete_part_number),
        )
        .route(
            "/part-numbers/:id/materials",
            get(part_numbers::list_materials).post(part_numbers::add_material),
        )
        .route(
            "/part-numbers/:id/materials/:line_id",
            delete(part_numbers::remove_material),
        )
        .route(
            "/part-numbers/:id/sub-assemblies",
            get(part_numbers::list_sub_assemblies).post(part_numbers::add_sub_assembly),
        )
        .route(
            "/part-numbers/:id/sub-assemblies/:link_id",
            delete(part_numbers::remove_sub_assembly),
        )
        // Sales orders
        .route(
            "/sales-orders",
            get(sales_orders::list_sales_orders).post(sales_orders::create_sales_order),
        )
        .route(
            "/sales-orders/:id",
            get(sales_orders::get_sales_order)
                .put(sales_orders::update_sales_order)
                .delete(sales_orders::delete_sales_order),
        )
        // Production orders and travel sheets
        .route(
            "/production-orders",
            get(production_orders::list_production_orders)
                .post(production_orders::create_production_order),
        )
        .route(
            "/production-orders/:id",
            get(production_orders::get_production_order)
                .put(production_orders::update_production_order)
                .delete(production_orders::delete_production_order),
        )
        .route(
            "/production-orders/:id/generate-travel-sheet",
            post(production_orders::generate_travel_sheet),
        )
        .route(
            "/production-orders/:id/travel-sheets",
            get(production_orders::list_travel_sheets),
        )
        // Shop floor
        .route("/qr-scanner/scan", post(qr_scanner::scan))
        .route(
            "/qr-scanner/operations/:id",
            get(qr_scanner::get_operation),
        )
        .route(
            "/qr-scanner/operations/:id/complete",
            put(qr_scanner::complete_operation),
        )
        // Quality
        .route(
            "/quality-inspections",
            get(quality::list_inspections).post(quality::create_inspection),
        )
        .route(
            "/quality-inspections/:id",
            get(quality::get_inspection)
                .put(quality::update_inspection)
                .delete(quality::delete_inspection),
        )
        .route(
            "/quality-inspections/production-order/:id/pending",
            get(quality::pending_inspections),
        )
        // Shipments
        .route(
            "/shipments",
            get(shipments::list_shipments).post(shipments::create_shipment),
        )
        .route(
            "/shipments/:id",
            get(shipments::get_shipment)
                .put(shipments::update_shipment)
                .delete(shipments::delete_shipment),
        )
        .route(
            "/shipments/:id/status",
            patch(shipments::update_shipment_status),
        )
        .route(
            "/shipments/sales-order/:id/approved-quantities",
            get(shipments::approved_quantities),
        )
        // Dashboard
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/production", get(dashboard::production))
        .route(
            "/dashboard/work-center-load",
            get(dashboard::work_center_load),
        )
        .route(
            "/dashboard/daily-production",
            get(dashboard::daily_production),
        )
        // Exports
        .route("/exports/sales-orders", get(exports::sales_orders))
        .route("/exports/shipments", get(exports::shipments))
        .route(
            "/exports/production-orders",
            get(exports::production_orders),
        )
        .route("/exports/customers", get(exports::customers))
        .route("/exports/part-numbers", get(exports::part_numbers))
        .route(
            "/exports/quality-inspections",
            get(exports::quality_inspections),
        )
}

/// CORS from configuration: explicit origins win, then the any-origin opt-in
/// (always on in development). Anything else is a startup error.
pub fn cors_layer(cfg: &config::AppConfig) -> Result<CorsLayer, errors::ServiceError> {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any));
    }
    if cfg.should_allow_permissive_cors() || cfg.is_development() {
        ::tracing::info!(
            development = cfg.is_development(),
            "using permissive CORS because explicit origins were not configured"
        );
        return Ok(CorsLayer::permissive());
    }
    Err(errors::ServiceError::InternalError(
        "Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true"
            .to_string(),
    ))
}

/// Full application: health checks, `/api/v1`, Swagger UI and the global layers.
pub fn build_router(state: AppState) -> Result<Router, errors::ServiceError> {
    let cors = cors_layer(&state.config)?;
    let auth_service = state.auth.clone();

    let app = Router::<AppState>::new()
        .merge(handlers::health::health_routes())
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        // Apply compression and timeouts
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(cors)
        // Inject AuthService into request extensions for auth middleware
        .layer(axum::middleware::from_fn_with_state(
            auth_service,
            |State(auth): State<Arc<AuthService>>,
             mut req: axum::extract::Request,
             next: axum::middleware::Next| async move {
                req.extensions_mut().insert(auth);
                next.run(req).await
            },
        ))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state);

    Ok(app)
}

pub mod prelude {
    pub use crate::common::*;
    pub use crate::db::*;
    pub use crate::errors::*;
    pub use crate::openapi::*;
    pub use crate::tracing::*;
    pub use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};
}
