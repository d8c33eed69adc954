use crate::{
    common::PageWindow,
    db::DbPool,
    entities::{
        enums::{parse_status, OperationStatus, ProductionOrderStatus, TravelSheetStatus},
        part_number, part_routing, process, production_order, quality_inspection, travel_sheet,
        travel_sheet_operation,
    },
    errors::ServiceError,
    services::{
        audit::{self, AuditEntry},
        numbering,
    },
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

pub const PRODUCTION_ORDER_STATUSES: &str =
    "Created, Released, In Progress, Completed, Cancelled, On Hold";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductionOrderRequest {
    pub sales_order_id: Option<i32>,
    pub sales_order_item_id: Option<i32>,
    pub part_number_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 20))]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductionOrderRequest {
    pub status: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub priority: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OperationDetail {
    #[serde(flatten)]
    pub operation: travel_sheet_operation::Model,
    pub process: Option<process::Model>,
}

/// Travel sheet with its operations in routing order
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TravelSheetDetail {
    #[serde(flatten)]
    pub sheet: travel_sheet::Model,
    pub operations: Vec<OperationDetail>,
}

/// Payload printed on a travel sheet's QR code.
pub fn travel_sheet_qr(number: &str, po_number: &str, part_number: Option<&str>) -> String {
    json!({
        "type": "travel_sheet",
        "number": number,
        "po": po_number,
        "part_number": part_number,
    })
    .to_string()
}

/// Payload printed on an operation's QR code; unique per sheet and step.
pub fn operation_qr(travel_sheet_id: i32, sequence: i32, process_id: i32) -> String {
    json!({
        "type": "operation",
        "travel_sheet_id": travel_sheet_id,
        "sequence": sequence,
        "process_id": process_id,
    })
    .to_string()
}

/// Service for production orders and the travel sheets generated from them
#[derive(Clone)]
pub struct ProductionOrderService {
    db_pool: Arc<DbPool>,
}

impl ProductionOrderService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_production_orders(
        &self,
        status: Option<String>,
        part_number_id: Option<i32>,
        window: PageWindow,
    ) -> Result<(Vec<production_order::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = production_order::Entity::find();
        if let Some(raw) = status.filter(|s| !s.is_empty()) {
            let status: ProductionOrderStatus = parse_status(&raw, PRODUCTION_ORDER_STATUSES)?;
            query = query.filter(production_order::Column::Status.eq(status));
        }
        if let Some(part_number_id) = part_number_id {
            query = query.filter(production_order::Column::PartNumberId.eq(part_number_id));
        }
        let total = query.clone().count(db).await?;
        let orders = query
            .order_by_asc(production_order::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?;
        Ok((orders, total))
    }

    /// Every production order with its part, for exports.
    #[instrument(skip(self))]
    pub async fn all_with_parts(
        &self,
        status: Option<ProductionOrderStatus>,
    ) -> Result<Vec<(production_order::Model, Option<part_number::Model>)>, ServiceError> {
        let mut query = production_order::Entity::find();
        if let Some(status) = status {
            query = query.filter(production_order::Column::Status.eq(status));
        }
        Ok(query
            .find_also_related(part_number::Entity)
            .order_by_desc(production_order::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_production_order(
        &self,
        id: i32,
    ) -> Result<production_order::Model, ServiceError> {
        find_order(&*self.db_pool, id).await
    }

    #[instrument(skip(self, request), fields(part_number_id = request.part_number_id))]
    pub async fn create_production_order(
        &self,
        request: CreateProductionOrderRequest,
        user_id: i32,
    ) -> Result<production_order::Model, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await?;
        part_number::Entity::find_by_id(request.part_number_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::BadRequest("Part number not found".to_string()))?;

        let created = production_order::ActiveModel {
            po_number: Set(numbering::production_order_number(Utc::now())),
            sales_order_id: Set(request.sales_order_id),
            sales_order_item_id: Set(request.sales_order_item_id),
            part_number_id: Set(request.part_number_id),
            quantity: Set(request.quantity),
            status: Set(ProductionOrderStatus::Created),
            start_date: Set(request.start_date),
            due_date: Set(request.due_date),
            priority: Set(request.priority.unwrap_or_else(|| "Normal".to_string())),
            created_by: Set(Some(user_id)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        audit::record(
            &txn,
            AuditEntry::new(user_id, "CREATE", "production_orders", created.id).with_details(
                json!({ "po_number": created.po_number, "quantity": created.quantity }),
            ),
        )
        .await?;
        txn.commit().await?;
        info!(production_order_id = created.id, po = %created.po_number, "production order created");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_production_order(
        &self,
        id: i32,
        request: UpdateProductionOrderRequest,
        user_id: i32,
    ) -> Result<production_order::Model, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await?;
        let existing = find_order(&txn, id).await?;
        let mut active: production_order::ActiveModel = existing.into();
        let mut changed = Vec::new();
        if let Some(raw) = request.status.as_deref() {
            active.status = Set(parse_status(raw, PRODUCTION_ORDER_STATUSES)?);
            changed.push("status");
        }
        if let Some(priority) = request.priority {
            active.priority = Set(priority);
            changed.push("priority");
        }
        if let Some(start_date) = request.start_date {
            active.start_date = Set(Some(start_date));
            changed.push("start_date");
        }
        if let Some(due_date) = request.due_date {
            active.due_date = Set(Some(due_date));
            changed.push("due_date");
        }
        let updated = active.update(&txn).await?;
        audit::record(
            &txn,
            AuditEntry::new(user_id, "UPDATE", "production_orders", id)
                .with_details(json!({ "fields": changed })),
        )
        .await?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Deletes the order together with its travel sheets, operations and inspections.
    #[instrument(skip(self))]
    pub async fn delete_production_order(&self, id: i32, user_id: i32) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        let existing = find_order(&txn, id).await?;
        let sheet_ids: Vec<i32> = travel_sheet::Entity::find()
            .filter(travel_sheet::Column::ProductionOrderId.eq(id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        if !sheet_ids.is_empty() {
            travel_sheet_operation::Entity::delete_many()
                .filter(travel_sheet_operation::Column::TravelSheetId.is_in(sheet_ids))
                .exec(&txn)
                .await?;
        }
        quality_inspection::Entity::delete_many()
            .filter(quality_inspection::Column::ProductionOrderId.eq(id))
            .exec(&txn)
            .await?;
        travel_sheet::Entity::delete_many()
            .filter(travel_sheet::Column::ProductionOrderId.eq(id))
            .exec(&txn)
            .await?;
        production_order::Entity::delete_by_id(id).exec(&txn).await?;
        audit::record(
            &txn,
            AuditEntry::new(user_id, "DELETE", "production_orders", id)
                .with_details(json!({ "po_number": existing.po_number })),
        )
        .await?;
        txn.commit().await?;
        info!(production_order_id = id, "production order deleted");
        Ok(())
    }

    /// Creates a travel sheet with one pending operation per routing step.
    #[instrument(skip(self))]
    pub async fn generate_travel_sheet(&self, id: i32) -> Result<TravelSheetDetail, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let order = find_order(&txn, id).await?;
        let routings = part_routing::Entity::find()
            .filter(part_routing::Column::PartNumberId.eq(order.part_number_id))
            .find_also_related(process::Entity)
            .order_by_asc(part_routing::Column::SequenceNumber)
            .all(&txn)
            .await?;
        if routings.is_empty() {
            warn!(production_order_id = id, "travel sheet requested without routing");
            return Err(ServiceError::BadRequest(
                "No routing defined for this part number".to_string(),
            ));
        }
        let part = part_number::Entity::find_by_id(order.part_number_id)
            .one(&txn)
            .await?;

        let number = numbering::travel_sheet_number(Utc::now());
        let sheet = travel_sheet::ActiveModel {
            qr_code: Set(travel_sheet_qr(
                &number,
                &order.po_number,
                part.as_ref().map(|p| p.part_number.as_str()),
            )),
            travel_sheet_number: Set(number),
            production_order_id: Set(order.id),
            status: Set(TravelSheetStatus::Active),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut operations = Vec::with_capacity(routings.len());
        for (routing, process) in routings {
            let operation = travel_sheet_operation::ActiveModel {
                travel_sheet_id: Set(sheet.id),
                process_id: Set(routing.process_id),
                sequence_number: Set(routing.sequence_number),
                qr_code: Set(operation_qr(
                    sheet.id,
                    routing.sequence_number,
                    routing.process_id,
                )),
                work_center_id: Set(process.as_ref().and_then(|p| p.work_center_id)),
                status: Set(OperationStatus::Pending),
                quantity_pending: Set(Some(order.quantity)),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            operations.push(OperationDetail { operation, process });
        }
        txn.commit().await?;
        info!(
            production_order_id = id,
            travel_sheet = %sheet.travel_sheet_number,
            operations = operations.len(),
            "travel sheet generated"
        );
        Ok(TravelSheetDetail { sheet, operations })
    }

    #[instrument(skip(self))]
    pub async fn list_travel_sheets(&self, id: i32) -> Result<Vec<TravelSheetDetail>, ServiceError> {
        let db = &*self.db_pool;
        find_order(db, id).await?;
        let sheets = travel_sheet::Entity::find()
            .filter(travel_sheet::Column::ProductionOrderId.eq(id))
            .order_by_asc(travel_sheet::Column::Id)
            .all(db)
            .await?;
        if sheets.is_empty() {
            return Ok(Vec::new());
        }
        let sheet_ids: Vec<i32> = sheets.iter().map(|s| s.id).collect();
        let mut by_sheet: HashMap<i32, Vec<OperationDetail>> = HashMap::new();
        let rows = travel_sheet_operation::Entity::find()
            .filter(travel_sheet_operation::Column::TravelSheetId.is_in(sheet_ids))
            .find_also_related(process::Entity)
            .order_by_asc(travel_sheet_operation::Column::SequenceNumber)
            .all(db)
            .await?;
        for (operation, process) in rows {
            by_sheet
                .entry(operation.travel_sheet_id)
                .or_default()
                .push(OperationDetail { operation, process });
        }
        Ok(sheets
            .into_iter()
            .map(|sheet| TravelSheetDetail {
                operations: by_sheet.remove(&sheet.id).unwrap_or_default(),
                sheet,
            })
            .collect())
    }
}

pub(crate) async fn find_order<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<production_order::Model, ServiceError> {
    production_order::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Production order not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::Value;

    fn order() -> production_order::Model {
        let now = Utc::now();
        production_order::Model {
            id: 5,
            po_number: "PO-20240101120000-ABCDEF12".into(),
            sales_order_id: None,
            sales_order_item_id: None,
            part_number_id: 9,
            quantity: 40,
            quantity_completed: 0,
            quantity_scrapped: 0,
            status: ProductionOrderStatus::Created,
            start_date: None,
            due_date: None,
            priority: "Normal".into(),
            created_by: Some(1),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn qr_payloads_carry_their_type() {
        let sheet: Value =
            serde_json::from_str(&travel_sheet_qr("TS-1", "PO-1", Some("BRK-100"))).unwrap();
        assert_eq!(sheet["type"], "travel_sheet");
        assert_eq!(sheet["part_number"], "BRK-100");

        let op: Value = serde_json::from_str(&operation_qr(7, 20, 3)).unwrap();
        assert_eq!(op["type"], "operation");
        assert_eq!(op["travel_sheet_id"], 7);
        assert_eq!(op["sequence"], 20);
    }

    #[test]
    fn operation_qr_differs_per_step() {
        assert_ne!(operation_qr(1, 10, 2), operation_qr(1, 20, 2));
    }

    #[tokio::test]
    async fn travel_sheet_requires_routing() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![order()]])
            .append_query_results([Vec::<part_routing::Model>::new()])
            .into_connection();
        let service = ProductionOrderService::new(Arc::new(db));
        let err = service.generate_travel_sheet(5).await.unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(msg) if msg == "No routing defined for this part number");
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<production_order::Model>::new()])
            .into_connection();
        let service = ProductionOrderService::new(Arc::new(db));
        assert_matches!(
            service.get_production_order(77).await,
            Err(ServiceError::NotFound(msg)) if msg == "Production order not found"
        );
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let service = ProductionOrderService::new(Arc::new(db));
        let err = service
            .create_production_order(
                CreateProductionOrderRequest {
                    sales_order_id: None,
                    sales_order_item_id: None,
                    part_number_id: 1,
                    quantity: 0,
                    start_date: None,
                    due_date: None,
                    priority: None,
                },
                1,
            )
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }
}
