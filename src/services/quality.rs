use crate::{
    common::PageWindow,
    db::DbPool,
    entities::{
        enums::{parse_status, InspectionStatus, ProductionOrderStatus, TravelSheetStatus},
        part_number, production_order, quality_inspection, travel_sheet, user,
    },
    errors::ServiceError,
    services::{
        audit::{self, AuditEntry},
        production_orders::find_order,
    },
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

pub const INSPECTION_STATUSES: &str = "Pending, Released, Rejected, On Hold";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateInspectionRequest {
    pub production_order_id: i32,
    pub travel_sheet_id: Option<i32>,
    pub status: String,
    #[validate(range(min = 0))]
    pub quantity_inspected: Option<i32>,
    #[validate(range(min = 0))]
    pub quantity_approved: Option<i32>,
    #[validate(range(min = 0))]
    pub quantity_rejected: Option<i32>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateInspectionRequest {
    pub travel_sheet_id: Option<i32>,
    pub status: Option<String>,
    #[validate(range(min = 0))]
    pub quantity_inspected: Option<i32>,
    #[validate(range(min = 0))]
    pub quantity_approved: Option<i32>,
    #[validate(range(min = 0))]
    pub quantity_rejected: Option<i32>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
}

/// Inspection with the production order, part and people it refers to
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InspectionDetail {
    #[serde(flatten)]
    pub inspection: quality_inspection::Model,
    pub production_order: Option<production_order::Model>,
    pub part_number: Option<part_number::Model>,
    pub travel_sheet_number: Option<String>,
    pub inspector_name: Option<String>,
}

/// A completed travel sheet that nobody has inspected yet.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PendingInspection {
    pub travel_sheet_id: i32,
    pub travel_sheet_number: String,
    pub production_order_id: i32,
    pub po_number: String,
}

/// Quantities an inspection contributes to its production order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InspectionEffect {
    pub completed: i32,
    pub scrapped: i32,
}

impl InspectionEffect {
    pub fn of(status: InspectionStatus, approved: i32, rejected: i32) -> Self {
        match status {
            InspectionStatus::Released => Self {
                completed: approved,
                scrapped: rejected,
            },
            InspectionStatus::Rejected => Self {
                completed: 0,
                scrapped: rejected,
            },
            InspectionStatus::Pending | InspectionStatus::OnHold => Self::default(),
        }
    }

    pub fn of_model(model: &quality_inspection::Model) -> Self {
        Self::of(model.status, model.approved(), model.rejected())
    }

    fn apply(self, order: &mut production_order::Model) {
        order.quantity_completed += self.completed;
        order.quantity_scrapped += self.scrapped;
    }

    fn reverse(self, order: &mut production_order::Model) {
        order.quantity_completed = (order.quantity_completed - self.completed).max(0);
        order.quantity_scrapped = (order.quantity_scrapped - self.scrapped).max(0);
    }
}

/// Status implied by completed quantity; `fallback` applies when nothing is completed.
pub fn status_from_completion(
    completed: i32,
    quantity: i32,
    fallback: ProductionOrderStatus,
) -> ProductionOrderStatus {
    if completed >= quantity {
        ProductionOrderStatus::Completed
    } else if completed > 0 {
        ProductionOrderStatus::InProgress
    } else {
        fallback
    }
}

fn check_quantities(
    inspected: Option<i32>,
    approved: Option<i32>,
    rejected: Option<i32>,
) -> Result<(), ServiceError> {
    if let Some(inspected) = inspected {
        if approved.unwrap_or(0) + rejected.unwrap_or(0) > inspected {
            return Err(ServiceError::BadRequest(
                "Sum of approved and rejected quantities cannot exceed inspected quantity"
                    .to_string(),
            ));
        }
    }
    Ok(())
}

/// Service for quality inspections and their effect on production orders
#[derive(Clone)]
pub struct QualityService {
    db_pool: Arc<DbPool>,
}

impl QualityService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_inspections(
        &self,
        status: Option<String>,
        production_order_id: Option<i32>,
        window: PageWindow,
    ) -> Result<(Vec<InspectionDetail>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = quality_inspection::Entity::find();
        if let Some(raw) = status.filter(|s| !s.is_empty()) {
            let status: InspectionStatus = parse_status(&raw, INSPECTION_STATUSES)?;
            query = query.filter(quality_inspection::Column::Status.eq(status));
        }
        if let Some(production_order_id) = production_order_id {
            query = query
                .filter(quality_inspection::Column::ProductionOrderId.eq(production_order_id));
        }
        let total = query.clone().count(db).await?;
        let inspections = query
            .order_by_desc(quality_inspection::Column::InspectionDate)
            .order_by_desc(quality_inspection::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?;
        Ok((load_details(db, inspections).await?, total))
    }

    /// Every inspection with the given status, for exports.
    #[instrument(skip(self))]
    pub async fn all_inspections(
        &self,
        status: Option<InspectionStatus>,
    ) -> Result<Vec<InspectionDetail>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = quality_inspection::Entity::find();
        if let Some(status) = status {
            query = query.filter(quality_inspection::Column::Status.eq(status));
        }
        let inspections = query
            .order_by_desc(quality_inspection::Column::InspectionDate)
            .all(db)
            .await?;
        load_details(db, inspections).await
    }

    #[instrument(skip(self))]
    pub async fn get_inspection(&self, id: i32) -> Result<InspectionDetail, ServiceError> {
        let db = &*self.db_pool;
        let inspection = find_inspection(db, id).await?;
        load_details(db, vec![inspection])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::NotFound("Quality inspection not found".to_string()))
    }

    #[instrument(skip(self, request), fields(production_order_id = request.production_order_id))]
    pub async fn create_inspection(
        &self,
        request: CreateInspectionRequest,
        inspector_id: i32,
    ) -> Result<InspectionDetail, ServiceError> {
        request.validate()?;
        let status: InspectionStatus = parse_status(&request.status, INSPECTION_STATUSES)?;
        check_quantities(
            request.quantity_inspected,
            request.quantity_approved,
            request.quantity_rejected,
        )?;

        let txn = self.db_pool.begin().await?;
        let mut order = production_order::Entity::find_by_id(request.production_order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::BadRequest("Production order not found".to_string()))?;
        if let Some(sheet_id) = request.travel_sheet_id {
            ensure_sheet_belongs(&txn, sheet_id, order.id).await?;
        }

        let created = quality_inspection::ActiveModel {
            travel_sheet_id: Set(request.travel_sheet_id),
            production_order_id: Set(order.id),
            inspector_id: Set(Some(inspector_id)),
            inspection_date: Set(Utc::now()),
            status: Set(status),
            quantity_inspected: Set(request.quantity_inspected),
            quantity_approved: Set(request.quantity_approved),
            quantity_rejected: Set(request.quantity_rejected),
            rejection_reason: Set(request.rejection_reason),
            notes: Set(request.notes),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let effect = InspectionEffect::of_model(&created);
        if effect != InspectionEffect::default() {
            effect.apply(&mut order);
            if status == InspectionStatus::Released {
                order.status =
                    status_from_completion(order.quantity_completed, order.quantity, order.status);
            }
            save_order_progress(&txn, &order).await?;
        }

        audit::record(
            &txn,
            AuditEntry::new(inspector_id, "CREATE", "quality_inspections", created.id)
                .with_details(json!({
                    "production_order_id": order.id,
                    "status": status.to_string(),
                    "approved": created.approved(),
                    "rejected": created.rejected(),
                })),
        )
        .await?;
        txn.commit().await?;
        info!(inspection_id = created.id, %status, "quality inspection recorded");
        self.get_inspection(created.id).await
    }

    /// Reverses the old effect on the production order, applies the new fields, then the new effect.
    #[instrument(skip(self, request))]
    pub async fn update_inspection(
        &self,
        id: i32,
        request: UpdateInspectionRequest,
        user_id: i32,
    ) -> Result<InspectionDetail, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await?;
        let existing = find_inspection(&txn, id).await?;
        let mut order = find_order(&txn, existing.production_order_id).await?;
        InspectionEffect::of_model(&existing).reverse(&mut order);

        let status = match request.status.as_deref() {
            Some(raw) => parse_status(raw, INSPECTION_STATUSES)?,
            None => existing.status,
        };
        let inspected = request.quantity_inspected.or(existing.quantity_inspected);
        let approved = request.quantity_approved.or(existing.quantity_approved);
        let rejected = request.quantity_rejected.or(existing.quantity_rejected);
        check_quantities(inspected, approved, rejected)?;
        if let Some(sheet_id) = request.travel_sheet_id {
            ensure_sheet_belongs(&txn, sheet_id, order.id).await?;
        }

        let mut active: quality_inspection::ActiveModel = existing.into();
        active.status = Set(status);
        active.quantity_inspected = Set(inspected);
        active.quantity_approved = Set(approved);
        active.quantity_rejected = Set(rejected);
        if let Some(sheet_id) = request.travel_sheet_id {
            active.travel_sheet_id = Set(Some(sheet_id));
        }
        if let Some(reason) = request.rejection_reason {
            active.rejection_reason = Set(Some(reason));
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        let updated = active.update(&txn).await?;

        InspectionEffect::of_model(&updated).apply(&mut order);
        if status == InspectionStatus::Released {
            order.status = status_from_completion(
                order.quantity_completed,
                order.quantity,
                ProductionOrderStatus::Released,
            );
        }
        save_order_progress(&txn, &order).await?;

        audit::record(
            &txn,
            AuditEntry::new(user_id, "UPDATE", "quality_inspections", id).with_details(json!({
                "status": status.to_string(),
                "approved": updated.approved(),
                "rejected": updated.rejected(),
            })),
        )
        .await?;
        txn.commit().await?;
        self.get_inspection(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_inspection(&self, id: i32, user_id: i32) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        let existing = find_inspection(&txn, id).await?;
        if let Some(mut order) = production_order::Entity::find_by_id(existing.production_order_id)
            .one(&txn)
            .await?
        {
            InspectionEffect::of_model(&existing).reverse(&mut order);
            order.status = status_from_completion(
                order.quantity_completed,
                order.quantity,
                ProductionOrderStatus::Released,
            );
            save_order_progress(&txn, &order).await?;
        }
        quality_inspection::Entity::delete_by_id(id).exec(&txn).await?;
        audit::record(
            &txn,
            AuditEntry::new(user_id, "DELETE", "quality_inspections", id).with_details(json!({
                "production_order_id": existing.production_order_id,
                "status": existing.status.to_string(),
            })),
        )
        .await?;
        txn.commit().await?;
        info!(inspection_id = id, "quality inspection deleted");
        Ok(())
    }

    /// Completed travel sheets of an order that have no inspection yet.
    #[instrument(skip(self))]
    pub async fn pending_inspections(
        &self,
        production_order_id: i32,
    ) -> Result<Vec<PendingInspection>, ServiceError> {
        let db = &*self.db_pool;
        let order = find_order(db, production_order_id).await?;
        let sheets = travel_sheet::Entity::find()
            .filter(travel_sheet::Column::ProductionOrderId.eq(order.id))
            .filter(travel_sheet::Column::Status.eq(TravelSheetStatus::Completed))
            .order_by_asc(travel_sheet::Column::Id)
            .all(db)
            .await?;
        if sheets.is_empty() {
            return Ok(Vec::new());
        }
        let inspected: HashSet<i32> = quality_inspection::Entity::find()
            .filter(
                quality_inspection::Column::TravelSheetId
                    .is_in(sheets.iter().map(|s| s.id).collect::<Vec<_>>()),
            )
            .all(db)
            .await?
            .into_iter()
            .filter_map(|i| i.travel_sheet_id)
            .collect();
        Ok(sheets
            .into_iter()
            .filter(|sheet| !inspected.contains(&sheet.id))
            .map(|sheet| PendingInspection {
                travel_sheet_id: sheet.id,
                travel_sheet_number: sheet.travel_sheet_number,
                production_order_id: order.id,
                po_number: order.po_number.clone(),
            })
            .collect())
    }
}

async fn find_inspection<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<quality_inspection::Model, ServiceError> {
    quality_inspection::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Quality inspection not found".to_string()))
}

async fn ensure_sheet_belongs<C: ConnectionTrait>(
    db: &C,
    sheet_id: i32,
    production_order_id: i32,
) -> Result<(), ServiceError> {
    let sheet = travel_sheet::Entity::find_by_id(sheet_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::BadRequest("Travel sheet not found".to_string()))?;
    if sheet.production_order_id != production_order_id {
        return Err(ServiceError::BadRequest(
            "Travel sheet does not belong to the specified production order".to_string(),
        ));
    }
    Ok(())
}

async fn save_order_progress<C: ConnectionTrait>(
    db: &C,
    order: &production_order::Model,
) -> Result<(), ServiceError> {
    let mut active: production_order::ActiveModel = order.clone().into();
    active.quantity_completed = Set(order.quantity_completed);
    active.quantity_scrapped = Set(order.quantity_scrapped);
    active.status = Set(order.status);
    active.update(db).await?;
    Ok(())
}

async fn load_details<C: ConnectionTrait>(
    db: &C,
    inspections: Vec<quality_inspection::Model>,
) -> Result<Vec<InspectionDetail>, ServiceError> {
    if inspections.is_empty() {
        return Ok(Vec::new());
    }
    let order_ids: Vec<i32> = inspections.iter().map(|i| i.production_order_id).collect();
    let sheet_ids: Vec<i32> = inspections.iter().filter_map(|i| i.travel_sheet_id).collect();
    let inspector_ids: Vec<i32> = inspections.iter().filter_map(|i| i.inspector_id).collect();

    let orders: HashMap<i32, (production_order::Model, Option<part_number::Model>)> =
        production_order::Entity::find()
            .filter(production_order::Column::Id.is_in(order_ids))
            .find_also_related(part_number::Entity)
            .all(db)
            .await?
            .into_iter()
            .map(|(order, part)| (order.id, (order, part)))
            .collect();
    let sheets: HashMap<i32, String> = if sheet_ids.is_empty() {
        HashMap::new()
    } else {
        travel_sheet::Entity::find()
            .filter(travel_sheet::Column::Id.is_in(sheet_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|s| (s.id, s.travel_sheet_number))
            .collect()
    };
    let inspectors: HashMap<i32, String> = if inspector_ids.is_empty() {
        HashMap::new()
    } else {
        user::Entity::find()
            .filter(user::Column::Id.is_in(inspector_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.full_name.unwrap_or(u.username)))
            .collect()
    };

    Ok(inspections
        .into_iter()
        .map(|inspection| {
            let (production_order, part_number) = orders
                .get(&inspection.production_order_id)
                .cloned()
                .map_or((None, None), |(o, p)| (Some(o), p));
            InspectionDetail {
                travel_sheet_number: inspection
                    .travel_sheet_id
                    .and_then(|id| sheets.get(&id).cloned()),
                inspector_name: inspection
                    .inspector_id
                    .and_then(|id| inspectors.get(&id).cloned()),
                production_order,
                part_number,
                inspection,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(InspectionStatus::Released, 8, 2, InspectionEffect { completed: 8, scrapped: 2 })]
    #[case(InspectionStatus::Rejected, 8, 2, InspectionEffect { completed: 0, scrapped: 2 })]
    #[case(InspectionStatus::Pending, 8, 2, InspectionEffect::default())]
    #[case(InspectionStatus::OnHold, 8, 2, InspectionEffect::default())]
    fn effect_by_status(
        #[case] status: InspectionStatus,
        #[case] approved: i32,
        #[case] rejected: i32,
        #[case] expected: InspectionEffect,
    ) {
        assert_eq!(InspectionEffect::of(status, approved, rejected), expected);
    }

    #[rstest]
    #[case(100, 100, ProductionOrderStatus::Completed)]
    #[case(120, 100, ProductionOrderStatus::Completed)]
    #[case(40, 100, ProductionOrderStatus::InProgress)]
    #[case(0, 100, ProductionOrderStatus::Released)]
    fn completion_drives_status(
        #[case] completed: i32,
        #[case] quantity: i32,
        #[case] expected: ProductionOrderStatus,
    ) {
        assert_eq!(
            status_from_completion(completed, quantity, ProductionOrderStatus::Released),
            expected
        );
    }

    #[test]
    fn approved_plus_rejected_cannot_exceed_inspected() {
        assert_matches!(
            check_quantities(Some(10), Some(8), Some(3)),
            Err(ServiceError::BadRequest(_))
        );
        assert!(check_quantities(Some(10), Some(8), Some(2)).is_ok());
        assert!(check_quantities(None, Some(8), Some(30)).is_ok());
    }

    fn order(completed: i32, scrapped: i32) -> production_order::Model {
        let now = Utc::now();
        production_order::Model {
            id: 1,
            po_number: "PO-1".into(),
            sales_order_id: None,
            sales_order_item_id: None,
            part_number_id: 1,
            quantity: 50,
            quantity_completed: completed,
            quantity_scrapped: scrapped,
            status: ProductionOrderStatus::InProgress,
            start_date: None,
            due_date: None,
            priority: "Normal".into(),
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    proptest! {
        #[test]
        fn apply_then_reverse_restores_counts(
            completed in 0i32..1_000,
            scrapped in 0i32..1_000,
            approved in 0i32..500,
            rejected in 0i32..500,
        ) {
            let mut po = order(completed, scrapped);
            let effect = InspectionEffect::of(InspectionStatus::Released, approved, rejected);
            effect.apply(&mut po);
            effect.reverse(&mut po);
            prop_assert_eq!(po.quantity_completed, completed);
            prop_assert_eq!(po.quantity_scrapped, scrapped);
        }

        #[test]
        fn reverse_never_goes_negative(approved in 0i32..500, rejected in 0i32..500) {
            let mut po = order(0, 0);
            InspectionEffect::of(InspectionStatus::Released, approved, rejected).reverse(&mut po);
            prop_assert!(po.quantity_completed >= 0 && po.quantity_scrapped >= 0);
        }
    }
}
