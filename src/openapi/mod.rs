use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

/// Registers the `Bearer` scheme referenced by every protected path.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shop-floor ERP API",
        version = "1.0.0",
        description = r#"
# Shop-floor manufacturing ERP

Customers, part numbers and routings, sales orders, production orders with
QR-tracked travel sheets, inventory, quality inspections and shipments.

## Authentication

Obtain a token from `POST /api/v1/auth/login` (form or JSON body) and send it as

```
Authorization: Bearer <token>
```

Roles without price visibility receive `null` unit and total prices.

## Pagination

List endpoints accept `page` (default 1), `limit` (default 100, max 500) and the
raw `skip` offset.
        "#
    ),
    servers((url = "http://localhost:8080", description = "Local development")),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Login and account registration"),
        (name = "users", description = "User accounts and roles"),
        (name = "customers", description = "Customer master data"),
        (name = "materials", description = "Materials, suppliers, batches and stock movements"),
        (name = "plant", description = "Work centers, machines and processes"),
        (name = "part-numbers", description = "Part numbers, routings, bills of material"),
        (name = "sales-orders", description = "Customer purchase orders"),
        (name = "production-orders", description = "Shop orders and travel sheets"),
        (name = "shop-floor", description = "QR scanning and operation completion"),
        (name = "quality", description = "Quality inspections"),
        (name = "shipments", description = "Shipments and the quality gate"),
        (name = "dashboard", description = "Progress and load dashboards"),
        (name = "exports", description = "CSV downloads"),
        (name = "audit", description = "Audit trail"),
    ),
    paths(
        crate::handlers::auth::login,
        crate::handlers::auth::me,
        crate::handlers::auth::register,

        crate::handlers::users::list_users,
        crate::handlers::users::list_roles,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::update_me,
        crate::handlers::users::delete_user,

        crate::handlers::customers::list_customers,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::update_customer,
        crate::handlers::customers::delete_customer,

        crate::handlers::materials::list_materials,
        crate::handlers::materials::low_stock,
        crate::handlers::materials::get_material,
        crate::handlers::materials::create_material,
        crate::handlers::materials::update_material,
        crate::handlers::materials::delete_material,
        crate::handlers::materials::list_suppliers,
        crate::handlers::materials::get_supplier,
        crate::handlers::materials::create_supplier,
        crate::handlers::materials::update_supplier,
        crate::handlers::materials::delete_supplier,
        crate::handlers::materials::list_batches,
        crate::handlers::materials::get_batch,
        crate::handlers::materials::create_batch,
        crate::handlers::materials::list_movements,
        crate::handlers::materials::create_movement,
        crate::handlers::materials::issue_to_production,

        crate::handlers::work_centers::list_work_centers,
        crate::handlers::work_centers::get_work_center,
        crate::handlers::work_centers::create_work_center,
        crate::handlers::work_centers::update_work_center,
        crate::handlers::work_centers::list_machines,
        crate::handlers::work_centers::create_machine,
        crate::handlers::work_centers::update_machine,
        crate::handlers::work_centers::list_processes,
        crate::handlers::work_centers::create_process,

        crate::handlers::part_numbers::list_part_numbers,
        crate::handlers::part_numbers::get_part_number,
        crate::handlers::part_numbers::create_part_number,
        crate::handlers::part_numbers::update_part_number,
        crate::handlers::part_numbers::delete_part_number,
        crate::handlers::part_numbers::list_materials,
        crate::handlers::part_numbers::add_material,
        crate::handlers::part_numbers::remove_material,
        crate::handlers::part_numbers::list_sub_assemblies,
        crate::handlers::part_numbers::add_sub_assembly,
        crate::handlers::part_numbers::remove_sub_assembly,

        crate::handlers::sales_orders::list_sales_orders,
        crate::handlers::sales_orders::get_sales_order,
        crate::handlers::sales_orders::create_sales_order,
        crate::handlers::sales_orders::update_sales_order,
        crate::handlers::sales_orders::delete_sales_order,

        crate::handlers::production_orders::list_production_orders,
        crate::handlers::production_orders::get_production_order,
        crate::handlers::production_orders::create_production_order,
        crate::handlers::production_orders::update_production_order,
        crate::handlers::production_orders::delete_production_order,
        crate::handlers::production_orders::generate_travel_sheet,
        crate::handlers::production_orders::list_travel_sheets,

        crate::handlers::qr_scanner::scan,
        crate::handlers::qr_scanner::complete_operation,
        crate::handlers::qr_scanner::get_operation,

        crate::handlers::quality::list_inspections,
        crate::handlers::quality::get_inspection,
        crate::handlers::quality::create_inspection,
        crate::handlers::quality::update_inspection,
        crate::handlers::quality::delete_inspection,
        crate::handlers::quality::pending_inspections,

        crate::handlers::shipments::list_shipments,
        crate::handlers::shipments::get_shipment,
        crate::handlers::shipments::create_shipment,
        crate::handlers::shipments::update_shipment,
        crate::handlers::shipments::delete_shipment,
        crate::handlers::shipments::update_shipment_status,
        crate::handlers::shipments::approved_quantities,

        crate::handlers::dashboard::stats,
        crate::handlers::dashboard::production,
        crate::handlers::dashboard::work_center_load,
        crate::handlers::dashboard::daily_production,

        crate::handlers::exports::sales_orders,
        crate::handlers::exports::shipments,
        crate::handlers::exports::production_orders,
        crate::handlers::exports::customers,
        crate::handlers::exports::part_numbers,
        crate::handlers::exports::quality_inspections,

        crate::handlers::audit::list_audit_log,
    ),
    components(
        schemas(
            crate::common::ListParams,
            crate::errors::ErrorResponse,
            crate::auth::TokenResponse,
            crate::handlers::auth::LoginRequest,
            crate::entities::enums::SalesOrderStatus,
            crate::entities::enums::ProductionOrderStatus,
            crate::entities::enums::OperationStatus,
            crate::entities::enums::InspectionStatus,
            crate::entities::enums::ShipmentStatus,
            crate::entities::enums::MovementType,
            crate::entities::enums::RiskStatus,
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDocV1::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_core_paths_and_bearer_scheme() {
        let json = serde_json::to_string(&ApiDocV1::openapi()).unwrap();
        assert!(json.contains("Shop-floor ERP API"));
        assert!(json.contains("/api/v1/auth/login"));
        assert!(json.contains("/api/v1/shipments/{id}/status"));
        assert!(json.contains("/api/v1/quality-inspections/production-order/{id}/pending"));
        assert!(json.contains("\"Bearer\""));
    }
}
