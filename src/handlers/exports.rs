use crate::{auth::AuthUser, errors::ServiceError, services::exports::CsvExport, AppState};
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportFilter {
    pub status: Option<String>,
    pub customer_id: Option<i32>,
}

fn csv_response(export: CsvExport) -> Response {
    let disposition = export.content_disposition();
    (
        [
            (header::CONTENT_TYPE, CsvExport::CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/v1/exports/sales-orders",
    summary = "Export sales orders",
    description = "One row per order line; prices are blank for roles without price visibility",
    params(ExportFilter),
    responses((status = 200, description = "CSV file", content_type = "text/csv", body = String)),
    security(("Bearer" = [])),
    tag = "exports"
)]
pub async fn sales_orders(
    State(state): State<AppState>,
    Query(filter): Query<ExportFilter>,
    auth_user: AuthUser,
) -> Result<Response, ServiceError> {
    let export = state
        .services
        .exports
        .sales_orders(filter.status, filter.customer_id, auth_user.can_view_prices)
        .await?;
    Ok(csv_response(export))
}

#[utoipa::path(
    get,
    path = "/api/v1/exports/shipments",
    summary = "Export shipments",
    params(ExportFilter),
    responses((status = 200, description = "CSV file", content_type = "text/csv", body = String)),
    security(("Bearer" = [])),
    tag = "exports"
)]
pub async fn shipments(
    State(state): State<AppState>,
    Query(filter): Query<ExportFilter>,
    auth_user: AuthUser,
) -> Result<Response, ServiceError> {
    let export = state
        .services
        .exports
        .shipments(filter.status, filter.customer_id, auth_user.can_view_prices)
        .await?;
    Ok(csv_response(export))
}

#[utoipa::path(
    get,
    path = "/api/v1/exports/production-orders",
    summary = "Export production orders",
    params(ExportFilter),
    responses((status = 200, description = "CSV file", content_type = "text/csv", body = String)),
    security(("Bearer" = [])),
    tag = "exports"
)]
pub async fn production_orders(
    State(state): State<AppState>,
    Query(filter): Query<ExportFilter>,
) -> Result<Response, ServiceError> {
    let export = state
        .services
        .exports
        .production_orders(filter.status)
        .await?;
    Ok(csv_response(export))
}

#[utoipa::path(
    get,
    path = "/api/v1/exports/customers",
    summary = "Export customers",
    responses((status = 200, description = "CSV file", content_type = "text/csv", body = String)),
    security(("Bearer" = [])),
    tag = "exports"
)]
pub async fn customers(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let export = state.services.exports.customers().await?;
    Ok(csv_response(export))
}

#[utoipa::path(
    get,
    path = "/api/v1/exports/part-numbers",
    summary = "Export part numbers",
    params(ExportFilter),
    responses((status = 200, description = "CSV file", content_type = "text/csv", body = String)),
    security(("Bearer" = [])),
    tag = "exports"
)]
pub async fn part_numbers(
    State(state): State<AppState>,
    Query(filter): Query<ExportFilter>,
    auth_user: AuthUser,
) -> Result<Response, ServiceError> {
    let export = state
        .services
        .exports
        .part_numbers(filter.customer_id, auth_user.can_view_prices)
        .await?;
    Ok(csv_response(export))
}

#[utoipa::path(
    get,
    path = "/api/v1/exports/quality-inspections",
    summary = "Export quality inspections",
    params(ExportFilter),
    responses((status = 200, description = "CSV file", content_type = "text/csv", body = String)),
    security(("Bearer" = [])),
    tag = "exports"
)]
pub async fn quality_inspections(
    State(state): State<AppState>,
    Query(filter): Query<ExportFilter>,
) -> Result<Response, ServiceError> {
    let export = state
        .services
        .exports
        .quality_inspections(filter.status)
        .await?;
    Ok(csv_response(export))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn csv_response_sets_download_headers() {
        let response = csv_response(CsvExport {
            filename: "customers_20250309_103000.csv".into(),
            body: "Code,Name\r\nC001,Acme\r\n".into(),
        });
        let headers = response.headers();
        assert_eq!(
            headers[header::CONTENT_TYPE].to_str().unwrap(),
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            headers[header::CONTENT_DISPOSITION].to_str().unwrap(),
            "attachment; filename=\"customers_20250309_103000.csv\""
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.starts_with(b"Code,Name"));
    }
}
