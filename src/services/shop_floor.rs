//! QR-driven start and completion of travel-sheet operations.

use crate::{
    db::DbPool,
    entities::{
        enums::{OperationStatus, TravelSheetStatus},
        process, travel_sheet, travel_sheet_operation,
    },
    errors::ServiceError,
    services::users::badge_owner,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct QrScanRequest {
    #[validate(length(min = 1))]
    pub qr_code: String,
    #[validate(length(min = 1))]
    pub badge_id: String,
}

/// Outcome of a scan. Rejections are reported in-band with `success: false`.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct QrScanResponse {
    pub success: bool,
    pub message: String,
    pub operation_id: Option<i32>,
    pub travel_sheet_id: Option<i32>,
    pub process_name: Option<String>,
    pub status: Option<String>,
}

impl QrScanResponse {
    fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CompleteOperationRequest {
    #[validate(range(min = 0))]
    pub quantity_good: Option<i32>,
    #[validate(range(min = 0))]
    pub quantity_scrap: Option<i32>,
    #[validate(range(min = 0))]
    pub quantity_pending: Option<i32>,
    pub operator_id: Option<i32>,
    pub machine_id: Option<i32>,
    pub operator_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompleteOperationResponse {
    pub success: bool,
    pub message: String,
    pub operation: travel_sheet_operation::Model,
}

/// What a scanned code refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum QrTarget {
    Operation,
    TravelSheet { number: Option<String> },
    Unsupported,
}

/// Classifies a raw QR payload; `None` when it is not JSON.
pub fn classify_qr(raw: &str) -> Option<QrTarget> {
    let payload: Value = serde_json::from_str(raw).ok()?;
    Some(match payload.get("type").and_then(Value::as_str) {
        Some("operation") => QrTarget::Operation,
        Some("travel_sheet") => QrTarget::TravelSheet {
            number: payload
                .get("number")
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        _ => QrTarget::Unsupported,
    })
}

#[derive(Clone)]
pub struct ShopFloorService {
    db_pool: Arc<DbPool>,
}

impl ShopFloorService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(badge = %request.badge_id))]
    pub async fn scan(&self, request: QrScanRequest) -> Result<QrScanResponse, ServiceError> {
        let db = &*self.db_pool;
        let Some(operator) = badge_owner(db, request.badge_id.trim()).await? else {
            return Ok(QrScanResponse::rejected("Invalid operator badge"));
        };
        let Some(target) = classify_qr(&request.qr_code) else {
            return Ok(QrScanResponse::rejected("Invalid QR code format"));
        };

        match target {
            QrTarget::Operation => self.scan_operation(&request.qr_code, operator.id).await,
            QrTarget::TravelSheet { number } => {
                let mut query = travel_sheet::Entity::find();
                query = match number {
                    Some(number) => {
                        query.filter(travel_sheet::Column::TravelSheetNumber.eq(number))
                    }
                    None => query.filter(travel_sheet::Column::QrCode.eq(request.qr_code.as_str())),
                };
                Ok(match query.one(db).await? {
                    Some(sheet) => QrScanResponse {
                        success: true,
                        message: format!("Travel sheet {}", sheet.travel_sheet_number),
                        travel_sheet_id: Some(sheet.id),
                        status: Some(sheet.status.to_string()),
                        ..Default::default()
                    },
                    None => QrScanResponse::rejected("Travel sheet not found"),
                })
            }
            QrTarget::Unsupported => Ok(QrScanResponse::rejected("Unsupported QR code type")),
        }
    }

    async fn scan_operation(
        &self,
        qr_code: &str,
        operator_id: i32,
    ) -> Result<QrScanResponse, ServiceError> {
        let db = &*self.db_pool;
        let Some(operation) = travel_sheet_operation::Entity::find()
            .filter(travel_sheet_operation::Column::QrCode.eq(qr_code))
            .one(db)
            .await?
        else {
            return Ok(QrScanResponse::rejected("Operation not found"));
        };
        let process_name = process_name(db, operation.process_id).await?;

        match operation.status {
            OperationStatus::Pending => {
                let mut active: travel_sheet_operation::ActiveModel = operation.into();
                active.status = Set(OperationStatus::InProgress);
                active.operator_id = Set(Some(operator_id));
                active.start_time = Set(Some(Utc::now()));
                let started = active.update(db).await?;
                info!(operation_id = started.id, operator_id, "operation started");
                Ok(QrScanResponse {
                    success: true,
                    message: format!("Operation started: {}", process_name),
                    operation_id: Some(started.id),
                    travel_sheet_id: Some(started.travel_sheet_id),
                    process_name: Some(process_name),
                    status: Some(started.status.to_string()),
                })
            }
            OperationStatus::InProgress => Ok(QrScanResponse {
                success: true,
                message: "Ready to complete operation".to_string(),
                operation_id: Some(operation.id),
                travel_sheet_id: Some(operation.travel_sheet_id),
                process_name: Some(process_name),
                status: Some("awaiting_completion".to_string()),
            }),
            OperationStatus::Completed => Ok(QrScanResponse::rejected(format!(
                "Operation already {}",
                operation.status
            ))),
        }
    }

    /// Finishes an in-progress operation; the sheet completes with its last operation.
    #[instrument(skip(self, request))]
    pub async fn complete_operation(
        &self,
        id: i32,
        request: CompleteOperationRequest,
    ) -> Result<CompleteOperationResponse, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await?;
        let operation = find_operation(&txn, id).await?;
        if operation.status != OperationStatus::InProgress {
            return Err(ServiceError::BadRequest(
                "Operation is not in progress".to_string(),
            ));
        }

        let end = Utc::now();
        let duration = operation
            .start_time
            .map(|start| travel_sheet_operation::elapsed_minutes(start, end));
        let sheet_id = operation.travel_sheet_id;
        let mut active: travel_sheet_operation::ActiveModel = operation.into();
        active.status = Set(OperationStatus::Completed);
        active.end_time = Set(Some(end));
        if duration.is_some() {
            active.duration_minutes = Set(duration);
        }
        if let Some(good) = request.quantity_good {
            active.quantity_good = Set(good);
        }
        if let Some(scrap) = request.quantity_scrap {
            active.quantity_scrap = Set(scrap);
        }
        if let Some(pending) = request.quantity_pending {
            active.quantity_pending = Set(Some(pending));
        }
        if let Some(operator_id) = request.operator_id {
            active.operator_id = Set(Some(operator_id));
        }
        if let Some(machine_id) = request.machine_id {
            active.machine_id = Set(Some(machine_id));
        }
        if let Some(notes) = request.operator_notes {
            active.operator_notes = Set(Some(notes));
        }
        let completed = active.update(&txn).await?;

        let open_operations = travel_sheet_operation::Entity::find()
            .filter(travel_sheet_operation::Column::TravelSheetId.eq(sheet_id))
            .filter(travel_sheet_operation::Column::Status.ne(OperationStatus::Completed))
            .count(&txn)
            .await?;
        if open_operations == 0 {
            if let Some(sheet) = travel_sheet::Entity::find_by_id(sheet_id).one(&txn).await? {
                let mut sheet: travel_sheet::ActiveModel = sheet.into();
                sheet.status = Set(TravelSheetStatus::Completed);
                sheet.update(&txn).await?;
                info!(travel_sheet_id = sheet_id, "travel sheet completed");
            }
        }
        txn.commit().await?;

        info!(
            operation_id = completed.id,
            good = completed.quantity_good,
            scrap = completed.quantity_scrap,
            "operation completed"
        );
        Ok(CompleteOperationResponse {
            success: true,
            message: "Operation completed successfully".to_string(),
            operation: completed,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_operation(&self, id: i32) -> Result<travel_sheet_operation::Model, ServiceError> {
        find_operation(&*self.db_pool, id).await
    }
}

async fn find_operation<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<travel_sheet_operation::Model, ServiceError> {
    travel_sheet_operation::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Operation not found".to_string()))
}

async fn process_name<C: ConnectionTrait>(db: &C, process_id: i32) -> Result<String, ServiceError> {
    Ok(process::Entity::find_by_id(process_id)
        .one(db)
        .await?
        .map(|p| p.name)
        .unwrap_or_else(|| "Unknown".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn operator() -> user::Model {
        let now = Utc::now();
        user::Model {
            id: 3,
            username: "op1".into(),
            email: Some("op1@plant.test".into()),
            password_hash: "x".into(),
            role_id: None,
            badge_id: Some("B-0042".into()),
            full_name: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    #[case(r#"{"type":"operation","travel_sheet_id":1}"#, Some(QrTarget::Operation))]
    #[case(
        r#"{"type":"travel_sheet","number":"TS-1"}"#,
        Some(QrTarget::TravelSheet { number: Some("TS-1".into()) })
    )]
    #[case(r#"{"type":"pallet"}"#, Some(QrTarget::Unsupported))]
    #[case(r#"[1,2,3]"#, Some(QrTarget::Unsupported))]
    #[case("not json", None)]
    fn qr_classification(#[case] raw: &str, #[case] expected: Option<QrTarget>) {
        assert_eq!(classify_qr(raw), expected);
    }

    #[tokio::test]
    async fn unknown_badge_is_rejected_in_band() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let service = ShopFloorService::new(Arc::new(db));
        let response = service
            .scan(QrScanRequest {
                qr_code: "{}".into(),
                badge_id: "NOPE".into(),
            })
            .await
            .unwrap();
        assert!(!response.success);
        assert_eq!(response.message, "Invalid operator badge");
    }

    #[tokio::test]
    async fn garbage_qr_is_rejected_in_band() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![operator()]])
            .into_connection();
        let service = ShopFloorService::new(Arc::new(db));
        let response = service
            .scan(QrScanRequest {
                qr_code: "%%%".into(),
                badge_id: "B-0042".into(),
            })
            .await
            .unwrap();
        assert!(!response.success);
        assert_eq!(response.message, "Invalid QR code format");
    }

    #[tokio::test]
    async fn completing_unknown_operation_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<travel_sheet_operation::Model>::new()])
            .into_connection();
        let service = ShopFloorService::new(Arc::new(db));
        assert_matches!(
            service
                .complete_operation(12, CompleteOperationRequest::default())
                .await,
            Err(ServiceError::NotFound(_))
        );
    }
}
