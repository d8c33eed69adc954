use crate::{
    common::PageWindow,
    db::DbPool,
    entities::{
        customer,
        enums::{parse_status, InspectionStatus, SalesOrderStatus, ShipmentStatus},
        part_number, production_order, quality_inspection, sales_order, sales_order_item,
        shipment, shipment_item,
    },
    errors::ServiceError,
    services::{
        audit::{self, AuditEntry},
        numbering,
        sales_orders::refresh_fulfilment_status,
    },
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

pub const SHIPMENT_STATUSES: &str = "Prepared, Shipped, Delivered";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ShipmentItemInput {
    pub sales_order_item_id: Option<i32>,
    pub part_number_id: i32,
    pub production_order_id: Option<i32>,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
}

/// Body for both creating and replacing a shipment.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ShipmentRequest {
    pub customer_id: i32,
    pub sales_order_id: Option<i32>,
    pub shipment_date: NaiveDate,
    pub status: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    #[validate]
    pub items: Vec<ShipmentItemInput>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShipmentItemDetail {
    #[serde(flatten)]
    pub item: shipment_item::Model,
    pub part_number: Option<part_number::Model>,
    pub production_order: Option<production_order::Model>,
}

/// Shipment with customer, sales order and packed items
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShipmentDetail {
    #[serde(flatten)]
    pub shipment: shipment::Model,
    pub customer: Option<customer::Model>,
    pub sales_order: Option<sales_order::Model>,
    pub items: Vec<ShipmentItemDetail>,
}

impl ShipmentDetail {
    pub fn mask_prices(mut self, can_view_prices: bool) -> Self {
        if !can_view_prices {
            for line in &mut self.items {
                line.item.unit_price = None;
            }
        }
        self
    }
}

/// Shipping position of one sales-order line.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ApprovedQuantity {
    pub sales_order_item_id: i32,
    pub part_number_id: i32,
    pub part_number: Option<String>,
    pub ordered_quantity: i32,
    pub already_shipped: i32,
    pub approved_quantity: i64,
    pub available_to_ship: i64,
    pub remaining_to_fulfill: i32,
}

/// Approved units of a production order that may still ship.
///
/// Every inspection counts toward the "inspected" check, only `Released` ones
/// contribute approved units, and any `Rejected` inspection blocks the order.
pub fn check_quality_gate(
    po_number: &str,
    inspections: &[quality_inspection::Model],
    already_shipped: i64,
    requested: i32,
) -> Result<i64, ServiceError> {
    if inspections.is_empty() {
        return Err(ServiceError::BadRequest(format!(
            "Production order {} has not been quality inspected yet. Cannot ship uninspected items.",
            po_number
        )));
    }
    if inspections
        .iter()
        .any(|i| i.status == InspectionStatus::Rejected)
    {
        return Err(ServiceError::BadRequest(format!(
            "Production order {} has been rejected by quality control. Cannot ship rejected items.",
            po_number
        )));
    }
    let approved = released_total(inspections);
    let available = approved - already_shipped;
    if i64::from(requested) > available {
        return Err(ServiceError::BadRequest(format!(
            "Cannot ship {} units. Only {} approved units available (Total approved: {}, Already shipped: {}).",
            requested, available, approved, already_shipped
        )));
    }
    Ok(available)
}

fn released_total(inspections: &[quality_inspection::Model]) -> i64 {
    inspections
        .iter()
        .filter(|i| i.status == InspectionStatus::Released)
        .map(|i| i64::from(i.approved()))
        .sum()
}

/// Service for customer shipments, guarded by the quality gate
#[derive(Clone)]
pub struct ShipmentService {
    db_pool: Arc<DbPool>,
}

impl ShipmentService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_shipments(
        &self,
        status: Option<String>,
        customer_id: Option<i32>,
        window: PageWindow,
    ) -> Result<(Vec<ShipmentDetail>, u64), ServiceError> {
        let db = &*self.db_pool;
        let status = match status.filter(|s| !s.is_empty()) {
            Some(raw) => Some(parse_status::<ShipmentStatus>(&raw, SHIPMENT_STATUSES)?),
            None => None,
        };
        let query = filtered(status, customer_id);
        let total = query.clone().count(db).await?;
        let shipments = query
            .order_by_desc(shipment::Column::CreatedAt)
            .order_by_desc(shipment::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?;
        Ok((load_details(db, shipments).await?, total))
    }

    /// Every shipment matching the filters, for exports.
    #[instrument(skip(self))]
    pub async fn all_shipments(
        &self,
        status: Option<ShipmentStatus>,
        customer_id: Option<i32>,
    ) -> Result<Vec<ShipmentDetail>, ServiceError> {
        let db = &*self.db_pool;
        let shipments = filtered(status, customer_id)
            .order_by_desc(shipment::Column::ShipmentDate)
            .order_by_desc(shipment::Column::Id)
            .all(db)
            .await?;
        load_details(db, shipments).await
    }

    #[instrument(skip(self))]
    pub async fn get_shipment(&self, id: i32) -> Result<ShipmentDetail, ServiceError> {
        let db = &*self.db_pool;
        let shipment = find_shipment(db, id).await?;
        load_details(db, vec![shipment])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::NotFound("Shipment not found".to_string()))
    }

    #[instrument(skip(self, request), fields(customer_id = request.customer_id))]
    pub async fn create_shipment(
        &self,
        request: ShipmentRequest,
        user_id: i32,
    ) -> Result<ShipmentDetail, ServiceError> {
        request.validate()?;
        let status = match request.status.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => parse_status(raw, SHIPMENT_STATUSES)?,
            None => ShipmentStatus::Prepared,
        };
        let txn = self.db_pool.begin().await?;
        ensure_header_refs(&txn, request.customer_id, request.sales_order_id).await?;

        let created = shipment::ActiveModel {
            shipment_number: Set(numbering::generate_shipment_number(&txn, Utc::now()).await?),
            customer_id: Set(request.customer_id),
            sales_order_id: Set(request.sales_order_id),
            shipment_date: Set(request.shipment_date),
            status: Set(status),
            tracking_number: Set(request.tracking_number.clone()),
            notes: Set(request.notes.clone()),
            created_by: Set(Some(user_id)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let items = insert_items(&txn, created.id, &request).await?;
        adjust_shipped(&txn, &items, 1).await?;

        audit::record(
            &txn,
            AuditEntry::new(user_id, "CREATE", "shipments", created.id).with_details(json!({
                "shipment_number": created.shipment_number,
                "items": items.len(),
                "units": items.iter().map(|i| i64::from(i.quantity)).sum::<i64>(),
            })),
        )
        .await?;
        txn.commit().await?;
        info!(shipment_id = created.id, number = %created.shipment_number, "shipment created");
        self.get_shipment(created.id).await
    }

    /// Replaces header and items; shipped quantities are reversed then re-applied.
    #[instrument(skip(self, request))]
    pub async fn update_shipment(
        &self,
        id: i32,
        request: ShipmentRequest,
        user_id: i32,
    ) -> Result<ShipmentDetail, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await?;
        let existing = find_shipment(&txn, id).await?;
        ensure_header_refs(&txn, request.customer_id, request.sales_order_id).await?;

        let status = match request.status.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => parse_status(raw, SHIPMENT_STATUSES)?,
            None => existing.status,
        };
        let mut active: shipment::ActiveModel = existing.into();
        active.customer_id = Set(request.customer_id);
        active.sales_order_id = Set(request.sales_order_id);
        active.shipment_date = Set(request.shipment_date);
        active.status = Set(status);
        active.tracking_number = Set(request.tracking_number.clone());
        active.notes = Set(request.notes.clone());
        active.update(&txn).await?;

        let old_items = shipment_item::Entity::find()
            .filter(shipment_item::Column::ShipmentId.eq(id))
            .all(&txn)
            .await?;
        adjust_shipped(&txn, &old_items, -1).await?;
        shipment_item::Entity::delete_many()
            .filter(shipment_item::Column::ShipmentId.eq(id))
            .exec(&txn)
            .await?;

        let items = insert_items(&txn, id, &request).await?;
        adjust_shipped(&txn, &items, 1).await?;

        audit::record(
            &txn,
            AuditEntry::new(user_id, "UPDATE", "shipments", id).with_details(json!({
                "previous_items": old_items.len(),
                "items": items.len(),
            })),
        )
        .await?;
        txn.commit().await?;
        self.get_shipment(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_shipment(&self, id: i32, user_id: i32) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        let existing = find_shipment(&txn, id).await?;
        let items = shipment_item::Entity::find()
            .filter(shipment_item::Column::ShipmentId.eq(id))
            .all(&txn)
            .await?;
        adjust_shipped(&txn, &items, -1).await?;
        shipment_item::Entity::delete_many()
            .filter(shipment_item::Column::ShipmentId.eq(id))
            .exec(&txn)
            .await?;
        shipment::Entity::delete_by_id(id).exec(&txn).await?;
        audit::record(
            &txn,
            AuditEntry::new(user_id, "DELETE", "shipments", id)
                .with_details(json!({ "shipment_number": existing.shipment_number })),
        )
        .await?;
        txn.commit().await?;
        info!(shipment_id = id, "shipment deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: i32,
        status: &str,
        tracking_number: Option<String>,
    ) -> Result<ShipmentDetail, ServiceError> {
        let status: ShipmentStatus = parse_status(status, SHIPMENT_STATUSES)?;
        let db = &*self.db_pool;
        let existing = find_shipment(db, id).await?;
        let mut active: shipment::ActiveModel = existing.into();
        active.status = Set(status);
        if let Some(tracking) = tracking_number.filter(|t| !t.is_empty()) {
            active.tracking_number = Set(Some(tracking));
        }
        active.update(db).await?;
        info!(shipment_id = id, %status, "shipment status changed");
        self.get_shipment(id).await
    }

    /// Approved and shippable quantities for each line of a sales order.
    #[instrument(skip(self))]
    pub async fn approved_quantities(
        &self,
        sales_order_id: i32,
    ) -> Result<Vec<ApprovedQuantity>, ServiceError> {
        let db = &*self.db_pool;
        sales_order::Entity::find_by_id(sales_order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Sales order not found".to_string()))?;

        let lines = sales_order_item::Entity::find()
            .filter(sales_order_item::Column::SalesOrderId.eq(sales_order_id))
            .find_also_related(part_number::Entity)
            .order_by_asc(sales_order_item::Column::Id)
            .all(db)
            .await?;
        let orders = production_order::Entity::find()
            .filter(production_order::Column::SalesOrderId.eq(sales_order_id))
            .all(db)
            .await?;
        let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
        let (inspections, shipped) = if order_ids.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            (
                quality_inspection::Entity::find()
                    .filter(quality_inspection::Column::ProductionOrderId.is_in(order_ids.clone()))
                    .filter(quality_inspection::Column::Status.eq(InspectionStatus::Released))
                    .all(db)
                    .await?,
                shipment_item::Entity::find()
                    .filter(shipment_item::Column::ProductionOrderId.is_in(order_ids))
                    .all(db)
                    .await?,
            )
        };

        Ok(lines
            .into_iter()
            .map(|(item, part)| {
                let linked: Vec<i32> = orders
                    .iter()
                    .filter(|o| o.part_number_id == item.part_number_id)
                    .map(|o| o.id)
                    .collect();
                let approved: i64 = inspections
                    .iter()
                    .filter(|i| linked.contains(&i.production_order_id))
                    .map(|i| i64::from(i.approved()))
                    .sum();
                let shipped_from_orders: i64 = shipped
                    .iter()
                    .filter(|s| s.production_order_id.is_some_and(|id| linked.contains(&id)))
                    .map(|s| i64::from(s.quantity))
                    .sum();
                ApprovedQuantity {
                    sales_order_item_id: item.id,
                    part_number_id: item.part_number_id,
                    part_number: part.map(|p| p.part_number),
                    ordered_quantity: item.quantity,
                    already_shipped: item.quantity_shipped,
                    approved_quantity: approved,
                    available_to_ship: (approved - shipped_from_orders).max(0),
                    remaining_to_fulfill: item.remaining_to_ship(),
                }
            })
            .collect())
    }
}

fn filtered(status: Option<ShipmentStatus>, customer_id: Option<i32>) -> sea_orm::Select<shipment::Entity> {
    let mut query = shipment::Entity::find();
    if let Some(status) = status {
        query = query.filter(shipment::Column::Status.eq(status));
    }
    if let Some(customer_id) = customer_id {
        query = query.filter(shipment::Column::CustomerId.eq(customer_id));
    }
    query
}

async fn find_shipment<C: ConnectionTrait>(db: &C, id: i32) -> Result<shipment::Model, ServiceError> {
    shipment::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Shipment not found".to_string()))
}

async fn ensure_header_refs<C: ConnectionTrait>(
    db: &C,
    customer_id: i32,
    sales_order_id: Option<i32>,
) -> Result<(), ServiceError> {
    customer::Entity::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))?;
    if let Some(sales_order_id) = sales_order_id {
        sales_order::Entity::find_by_id(sales_order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Sales order not found".to_string()))?;
    }
    Ok(())
}

async fn insert_items<C: ConnectionTrait>(
    db: &C,
    shipment_id: i32,
    request: &ShipmentRequest,
) -> Result<Vec<shipment_item::Model>, ServiceError> {
    let mut inserted = Vec::with_capacity(request.items.len());
    for input in &request.items {
        part_number::Entity::find_by_id(input.part_number_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Part number with ID {} not found",
                    input.part_number_id
                ))
            })?;
        if let Some(production_order_id) = input.production_order_id {
            enforce_quality_gate(db, production_order_id, input.quantity).await?;
        }
        let sales_order_item_id = match input.sales_order_item_id {
            Some(id) => Some(id),
            None => {
                match_sales_order_item(
                    db,
                    request.customer_id,
                    request.sales_order_id,
                    input.part_number_id,
                )
                .await?
            }
        };
        let item = shipment_item::ActiveModel {
            shipment_id: Set(shipment_id),
            sales_order_item_id: Set(sales_order_item_id),
            part_number_id: Set(input.part_number_id),
            production_order_id: Set(input.production_order_id),
            quantity: Set(input.quantity),
            unit_price: Set(input.unit_price),
            ..Default::default()
        }
        .insert(db)
        .await?;
        inserted.push(item);
    }
    Ok(inserted)
}

async fn enforce_quality_gate<C: ConnectionTrait>(
    db: &C,
    production_order_id: i32,
    quantity: i32,
) -> Result<(), ServiceError> {
    let order = production_order::Entity::find_by_id(production_order_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Production order with ID {} not found",
                production_order_id
            ))
        })?;
    let inspections = quality_inspection::Entity::find()
        .filter(quality_inspection::Column::ProductionOrderId.eq(production_order_id))
        .all(db)
        .await?;
    let already_shipped: i64 = shipment_item::Entity::find()
        .filter(shipment_item::Column::ProductionOrderId.eq(production_order_id))
        .all(db)
        .await?
        .iter()
        .map(|i| i64::from(i.quantity))
        .sum();
    if let Err(err) = check_quality_gate(&order.po_number, &inspections, already_shipped, quantity)
    {
        warn!(production_order_id, quantity, "shipment blocked by quality gate");
        return Err(err);
    }
    Ok(())
}

/// Finds the sales-order line a shipped part belongs to.
async fn match_sales_order_item<C: ConnectionTrait>(
    db: &C,
    customer_id: i32,
    sales_order_id: Option<i32>,
    part_number_id: i32,
) -> Result<Option<i32>, ServiceError> {
    let line = match sales_order_id {
        Some(sales_order_id) => {
            sales_order_item::Entity::find()
                .filter(sales_order_item::Column::SalesOrderId.eq(sales_order_id))
                .filter(sales_order_item::Column::PartNumberId.eq(part_number_id))
                .order_by_asc(sales_order_item::Column::Id)
                .one(db)
                .await?
        }
        None => {
            sales_order_item::Entity::find()
                .join(
                    JoinType::InnerJoin,
                    sales_order_item::Relation::SalesOrder.def(),
                )
                .filter(sales_order::Column::CustomerId.eq(customer_id))
                .filter(
                    sales_order::Column::Status
                        .is_in([SalesOrderStatus::Open, SalesOrderStatus::Partial]),
                )
                .filter(sales_order_item::Column::PartNumberId.eq(part_number_id))
                .filter(
                    Expr::col((sales_order_item::Entity, sales_order_item::Column::Quantity))
                        .gt(Expr::col((
                            sales_order_item::Entity,
                            sales_order_item::Column::QuantityShipped,
                        ))),
                )
                .order_by_asc(sales_order::Column::DueDate)
                .order_by_asc(sales_order_item::Column::Id)
                .one(db)
                .await?
        }
    };
    Ok(line.map(|l| l.id))
}

/// Adds (`sign = 1`) or removes (`sign = -1`) shipped units on the linked sales-order lines.
async fn adjust_shipped<C: ConnectionTrait>(
    db: &C,
    items: &[shipment_item::Model],
    sign: i32,
) -> Result<(), ServiceError> {
    let mut touched_orders = BTreeSet::new();
    for item in items {
        let Some(line_id) = item.sales_order_item_id else {
            continue;
        };
        let Some(line) = sales_order_item::Entity::find_by_id(line_id).one(db).await? else {
            continue;
        };
        touched_orders.insert(line.sales_order_id);
        let shipped = (line.quantity_shipped + sign * item.quantity).max(0);
        let mut active: sales_order_item::ActiveModel = line.into();
        active.quantity_shipped = Set(shipped);
        active.update(db).await?;
    }
    for sales_order_id in touched_orders {
        refresh_fulfilment_status(db, sales_order_id).await?;
    }
    Ok(())
}

async fn load_details<C: ConnectionTrait>(
    db: &C,
    shipments: Vec<shipment::Model>,
) -> Result<Vec<ShipmentDetail>, ServiceError> {
    if shipments.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = shipments.iter().map(|s| s.id).collect();
    let customer_ids: Vec<i32> = shipments.iter().map(|s| s.customer_id).collect();
    let order_ids: Vec<i32> = shipments.iter().filter_map(|s| s.sales_order_id).collect();

    let customers: HashMap<i32, customer::Model> = customer::Entity::find()
        .filter(customer::Column::Id.is_in(customer_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let orders: HashMap<i32, sales_order::Model> = if order_ids.is_empty() {
        HashMap::new()
    } else {
        sales_order::Entity::find()
            .filter(sales_order::Column::Id.is_in(order_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|o| (o.id, o))
            .collect()
    };

    let items = shipment_item::Entity::find()
        .filter(shipment_item::Column::ShipmentId.is_in(ids))
        .find_also_related(part_number::Entity)
        .order_by_asc(shipment_item::Column::Id)
        .all(db)
        .await?;
    let production_ids: Vec<i32> = items
        .iter()
        .filter_map(|(i, _)| i.production_order_id)
        .collect();
    let productions: HashMap<i32, production_order::Model> = if production_ids.is_empty() {
        HashMap::new()
    } else {
        production_order::Entity::find()
            .filter(production_order::Column::Id.is_in(production_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
    };
    let mut by_shipment: HashMap<i32, Vec<ShipmentItemDetail>> = HashMap::new();
    for (item, part_number) in items {
        let production_order = item
            .production_order_id
            .and_then(|id| productions.get(&id).cloned());
        by_shipment
            .entry(item.shipment_id)
            .or_default()
            .push(ShipmentItemDetail {
                item,
                part_number,
                production_order,
            });
    }

    Ok(shipments
        .into_iter()
        .map(|shipment| ShipmentDetail {
            customer: customers.get(&shipment.customer_id).cloned(),
            sales_order: shipment
                .sales_order_id
                .and_then(|id| orders.get(&id).cloned()),
            items: by_shipment.remove(&shipment.id).unwrap_or_default(),
            shipment,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    fn inspection(status: InspectionStatus, approved: i32) -> quality_inspection::Model {
        let now = Utc::now();
        quality_inspection::Model {
            id: 1,
            travel_sheet_id: None,
            production_order_id: 1,
            inspector_id: None,
            inspection_date: now,
            status,
            quantity_inspected: Some(approved),
            quantity_approved: Some(approved),
            quantity_rejected: Some(0),
            rejection_reason: None,
            notes: None,
            created_at: now,
        }
    }

    #[test]
    fn uninspected_orders_cannot_ship() {
        let err = check_quality_gate("PO-9", &[], 0, 1).unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(msg)
            if msg == "Production order PO-9 has not been quality inspected yet. Cannot ship uninspected items.");
    }

    #[test]
    fn any_rejected_inspection_blocks() {
        let inspections = [
            inspection(InspectionStatus::Released, 50),
            inspection(InspectionStatus::Rejected, 0),
        ];
        let err = check_quality_gate("PO-9", &inspections, 0, 1).unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(msg) if msg.contains("rejected by quality control"));
    }

    #[test]
    fn only_released_units_count() {
        let inspections = [
            inspection(InspectionStatus::Released, 30),
            inspection(InspectionStatus::Pending, 100),
        ];
        assert_eq!(check_quality_gate("PO-9", &inspections, 10, 20).unwrap(), 20);
        let err = check_quality_gate("PO-9", &inspections, 10, 21).unwrap_err();
        assert_eq!(
            err.response_message(),
            "Cannot ship 21 units. Only 20 approved units available (Total approved: 30, Already shipped: 10)."
        );
    }

    #[test]
    fn masking_blanks_unit_prices() {
        let now = Utc::now();
        let detail = ShipmentDetail {
            shipment: shipment::Model {
                id: 1,
                shipment_number: "SHIP-2024-0001".into(),
                customer_id: 1,
                sales_order_id: None,
                shipment_date: now.date_naive(),
                status: ShipmentStatus::Prepared,
                tracking_number: None,
                notes: None,
                created_by: None,
                created_at: now,
            },
            customer: None,
            sales_order: None,
            items: vec![ShipmentItemDetail {
                item: shipment_item::Model {
                    id: 1,
                    shipment_id: 1,
                    sales_order_item_id: None,
                    part_number_id: 1,
                    production_order_id: None,
                    quantity: 5,
                    unit_price: Some(Decimal::new(1999, 2)),
                    created_at: now,
                },
                part_number: None,
                production_order: None,
            }],
        };
        assert_eq!(detail.mask_prices(false).items[0].item.unit_price, None);
    }

    proptest! {
        #[test]
        fn gate_never_allows_more_than_available(
            approved in 0i32..1_000,
            shipped in 0i64..1_000,
            requested in 1i32..1_500,
        ) {
            let inspections = [inspection(InspectionStatus::Released, approved)];
            if let Ok(available) = check_quality_gate("PO-1", &inspections, shipped, requested) {
                prop_assert!(i64::from(requested) <= available);
                prop_assert_eq!(available, i64::from(approved) - shipped);
            }
        }
    }
}
