use crate::{
    common::PageWindow,
    db::DbPool,
    entities::{
        customer,
        enums::{parse_status, SalesOrderItemStatus, SalesOrderStatus},
        part_number, sales_order, sales_order_item,
    },
    errors::ServiceError,
    services::audit::{self, AuditEntry},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

pub const SALES_ORDER_STATUSES: &str = "Open, Partial, Completed, Cancelled";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SalesOrderItemInput {
    pub part_number_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
    /// Defaults to the part's list price
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSalesOrderRequest {
    #[validate(length(min = 1, max = 100))]
    pub po_number: String,
    pub customer_id: i32,
    pub order_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: Option<String>,
    pub notes: Option<String>,
    #[validate]
    pub items: Vec<SalesOrderItemInput>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSalesOrderRequest {
    #[validate(length(min = 1, max = 100))]
    pub po_number: Option<String>,
    pub customer_id: Option<i32>,
    pub order_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub notes: Option<String>,
    /// Replaces every line when present
    #[validate]
    pub items: Option<Vec<SalesOrderItemInput>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SalesOrderItemDetail {
    #[serde(flatten)]
    pub item: sales_order_item::Model,
    pub part_number: Option<part_number::Model>,
}

/// Sales order with customer and lines
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SalesOrderDetail {
    #[serde(flatten)]
    pub order: sales_order::Model,
    pub customer: Option<customer::Model>,
    pub items: Vec<SalesOrderItemDetail>,
}

impl SalesOrderDetail {
    /// Blanks unit and total prices for roles without price visibility.
    pub fn mask_prices(mut self, can_view_prices: bool) -> Self {
        if !can_view_prices {
            for line in &mut self.items {
                line.item.unit_price = None;
                line.item.total_price = None;
            }
        }
        self
    }
}

/// Fulfilment status from ordered and shipped totals.
pub fn fulfilment_status(total_ordered: i64, total_shipped: i64) -> SalesOrderStatus {
    if total_shipped <= 0 {
        SalesOrderStatus::Open
    } else if total_shipped >= total_ordered {
        SalesOrderStatus::Completed
    } else {
        SalesOrderStatus::Partial
    }
}

/// Line total, absent when no price is known.
pub fn line_total(unit_price: Option<Decimal>, quantity: i32) -> Option<Decimal> {
    unit_price.map(|price| price * Decimal::from(quantity))
}

/// Recomputes an order's status from its lines' shipped quantities.
pub async fn refresh_fulfilment_status<C: ConnectionTrait>(
    db: &C,
    sales_order_id: i32,
) -> Result<(), ServiceError> {
    let Some(order) = sales_order::Entity::find_by_id(sales_order_id).one(db).await? else {
        return Ok(());
    };
    let items = sales_order_item::Entity::find()
        .filter(sales_order_item::Column::SalesOrderId.eq(sales_order_id))
        .all(db)
        .await?;
    if items.is_empty() {
        return Ok(());
    }
    let ordered: i64 = items.iter().map(|i| i64::from(i.quantity)).sum();
    let shipped: i64 = items.iter().map(|i| i64::from(i.quantity_shipped)).sum();
    let status = fulfilment_status(ordered, shipped);
    if order.status != status {
        debug!(sales_order_id, %status, "sales order status recomputed");
        let mut active: sales_order::ActiveModel = order.into();
        active.status = Set(status);
        active.update(db).await?;
    }
    Ok(())
}

/// Service for customer sales orders
#[derive(Clone)]
pub struct SalesOrderService {
    db_pool: Arc<DbPool>,
}

impl SalesOrderService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_sales_orders(
        &self,
        customer_id: Option<i32>,
        status: Option<String>,
        window: PageWindow,
    ) -> Result<(Vec<SalesOrderDetail>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = sales_order::Entity::find();
        if let Some(customer_id) = customer_id {
            query = query.filter(sales_order::Column::CustomerId.eq(customer_id));
        }
        if let Some(raw) = status.filter(|s| !s.is_empty()) {
            let status: SalesOrderStatus = parse_status(&raw, SALES_ORDER_STATUSES)?;
            query = query.filter(sales_order::Column::Status.eq(status));
        }
        let total = query.clone().count(db).await?;
        let orders = query
            .order_by_asc(sales_order::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?;
        Ok((load_details(db, orders).await?, total))
    }

    /// Every order matching the filters, for exports.
    #[instrument(skip(self))]
    pub async fn all_sales_orders(
        &self,
        customer_id: Option<i32>,
        status: Option<SalesOrderStatus>,
    ) -> Result<Vec<SalesOrderDetail>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = sales_order::Entity::find();
        if let Some(customer_id) = customer_id {
            query = query.filter(sales_order::Column::CustomerId.eq(customer_id));
        }
        if let Some(status) = status {
            query = query.filter(sales_order::Column::Status.eq(status));
        }
        let orders = query
            .order_by_desc(sales_order::Column::OrderDate)
            .order_by_desc(sales_order::Column::Id)
            .all(db)
            .await?;
        load_details(db, orders).await
    }

    #[instrument(skip(self))]
    pub async fn get_sales_order(&self, id: i32) -> Result<SalesOrderDetail, ServiceError> {
        let db = &*self.db_pool;
        let order = sales_order::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Sales order not found".to_string()))?;
        load_details(db, vec![order])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::NotFound("Sales order not found".to_string()))
    }

    #[instrument(skip(self, request), fields(po = %request.po_number))]
    pub async fn create_sales_order(
        &self,
        request: CreateSalesOrderRequest,
        user_id: i32,
    ) -> Result<SalesOrderDetail, ServiceError> {
        request.validate()?;
        let status = match request.status.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => parse_status(raw, SALES_ORDER_STATUSES)?,
            None => SalesOrderStatus::Open,
        };
        let txn = self.db_pool.begin().await?;

        let duplicate = sales_order::Entity::find()
            .filter(sales_order::Column::PoNumber.eq(request.po_number.as_str()))
            .one(&txn)
            .await?
            .is_some();
        if duplicate {
            return Err(ServiceError::BadRequest("PO number already exists".to_string()));
        }
        ensure_customer(&txn, request.customer_id).await?;

        let order = sales_order::ActiveModel {
            po_number: Set(request.po_number),
            customer_id: Set(request.customer_id),
            order_date: Set(request.order_date),
            due_date: Set(request.due_date),
            status: Set(status),
            notes: Set(request.notes),
            created_by: Set(Some(user_id)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        insert_items(&txn, order.id, &request.items).await?;

        audit::record(
            &txn,
            AuditEntry::new(user_id, "CREATE", "sales_orders", order.id).with_details(json!({
                "po_number": order.po_number,
                "items": request.items.len(),
            })),
        )
        .await?;
        txn.commit().await?;
        info!(sales_order_id = order.id, "sales order created");
        self.get_sales_order(order.id).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_sales_order(
        &self,
        id: i32,
        request: UpdateSalesOrderRequest,
        user_id: i32,
    ) -> Result<SalesOrderDetail, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await?;
        let existing = sales_order::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Sales order not found".to_string()))?;

        let mut active: sales_order::ActiveModel = existing.into();
        if let Some(po_number) = request.po_number {
            let taken = sales_order::Entity::find()
                .filter(sales_order::Column::PoNumber.eq(po_number.as_str()))
                .filter(sales_order::Column::Id.ne(id))
                .one(&txn)
                .await?
                .is_some();
            if taken {
                return Err(ServiceError::BadRequest("PO number already exists".to_string()));
            }
            active.po_number = Set(po_number);
        }
        if let Some(customer_id) = request.customer_id {
            ensure_customer(&txn, customer_id).await?;
            active.customer_id = Set(customer_id);
        }
        if let Some(order_date) = request.order_date {
            active.order_date = Set(order_date);
        }
        if let Some(due_date) = request.due_date {
            active.due_date = Set(due_date);
        }
        if let Some(raw) = request.status.as_deref() {
            active.status = Set(parse_status(raw, SALES_ORDER_STATUSES)?);
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        active.update(&txn).await?;

        if let Some(items) = &request.items {
            sales_order_item::Entity::delete_many()
                .filter(sales_order_item::Column::SalesOrderId.eq(id))
                .exec(&txn)
                .await?;
            insert_items(&txn, id, items).await?;
        }

        audit::record(
            &txn,
            AuditEntry::new(user_id, "UPDATE", "sales_orders", id)
                .with_details(json!({ "items_replaced": request.items.is_some() })),
        )
        .await?;
        txn.commit().await?;
        self.get_sales_order(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_sales_order(&self, id: i32, user_id: i32) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        let existing = sales_order::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Sales order not found".to_string()))?;
        sales_order_item::Entity::delete_many()
            .filter(sales_order_item::Column::SalesOrderId.eq(id))
            .exec(&txn)
            .await?;
        sales_order::Entity::delete_by_id(id).exec(&txn).await?;
        audit::record(
            &txn,
            AuditEntry::new(user_id, "DELETE", "sales_orders", id)
                .with_details(json!({ "po_number": existing.po_number })),
        )
        .await?;
        txn.commit().await?;
        info!(sales_order_id = id, "sales order deleted");
        Ok(())
    }
}

async fn ensure_customer<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), ServiceError> {
    customer::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| ServiceError::BadRequest("Customer not found".to_string()))
}

async fn insert_items<C: ConnectionTrait>(
    db: &C,
    sales_order_id: i32,
    items: &[SalesOrderItemInput],
) -> Result<(), ServiceError> {
    for item in items {
        let part = part_number::Entity::find_by_id(item.part_number_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::BadRequest(format!("Part number {} not found", item.part_number_id))
            })?;
        let unit_price = item.unit_price.or(part.unit_price);
        sales_order_item::ActiveModel {
            sales_order_id: Set(sales_order_id),
            part_number_id: Set(item.part_number_id),
            quantity: Set(item.quantity),
            unit_price: Set(unit_price),
            total_price: Set(line_total(unit_price, item.quantity)),
            quantity_produced: Set(0),
            quantity_shipped: Set(0),
            status: Set(SalesOrderItemStatus::Pending),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// Attaches customers and lines (with their parts) to a set of orders.
async fn load_details<C: ConnectionTrait>(
    db: &C,
    orders: Vec<sales_order::Model>,
) -> Result<Vec<SalesOrderDetail>, ServiceError> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }
    let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
    let customer_ids: Vec<i32> = orders.iter().map(|o| o.customer_id).collect();

    let customers: HashMap<i32, customer::Model> = customer::Entity::find()
        .filter(customer::Column::Id.is_in(customer_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let mut lines: HashMap<i32, Vec<SalesOrderItemDetail>> = HashMap::new();
    let rows = sales_order_item::Entity::find()
        .filter(sales_order_item::Column::SalesOrderId.is_in(order_ids))
        .find_also_related(part_number::Entity)
        .order_by_asc(sales_order_item::Column::Id)
        .all(db)
        .await?;
    for (item, part_number) in rows {
        lines
            .entry(item.sales_order_id)
            .or_default()
            .push(SalesOrderItemDetail { item, part_number });
    }

    Ok(orders
        .into_iter()
        .map(|order| SalesOrderDetail {
            customer: customers.get(&order.customer_id).cloned(),
            items: lines.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn detail_with_price() -> SalesOrderDetail {
        let now = Utc::now();
        SalesOrderDetail {
            order: sales_order::Model {
                id: 1,
                po_number: "CUST-PO-77".into(),
                customer_id: 1,
                order_date: now.date_naive(),
                due_date: now.date_naive(),
                status: SalesOrderStatus::Open,
                notes: None,
                created_by: None,
                created_at: now,
                updated_at: now,
            },
            customer: None,
            items: vec![SalesOrderItemDetail {
                item: sales_order_item::Model {
                    id: 1,
                    sales_order_id: 1,
                    part_number_id: 3,
                    quantity: 10,
                    unit_price: Some(dec!(12.50)),
                    total_price: Some(dec!(125.00)),
                    quantity_produced: 0,
                    quantity_shipped: 0,
                    status: SalesOrderItemStatus::Pending,
                    created_at: now,
                },
                part_number: None,
            }],
        }
    }

    #[test]
    fn prices_hidden_without_visibility() {
        let masked = detail_with_price().mask_prices(false);
        assert_eq!(masked.items[0].item.unit_price, None);
        assert_eq!(masked.items[0].item.total_price, None);

        let visible = detail_with_price().mask_prices(true);
        assert_eq!(visible.items[0].item.total_price, Some(dec!(125.00)));
    }

    #[test]
    fn masked_prices_serialize_as_null() {
        let json = serde_json::to_value(detail_with_price().mask_prices(false)).unwrap();
        assert!(json["items"][0]["unit_price"].is_null());
        assert_eq!(json["po_number"], "CUST-PO-77");
    }

    #[test]
    fn line_total_needs_a_price() {
        assert_eq!(line_total(Some(dec!(2.25)), 4), Some(dec!(9.00)));
        assert_eq!(line_total(None, 4), None);
    }

    #[test]
    fn fulfilment_edges() {
        assert_eq!(fulfilment_status(10, 0), SalesOrderStatus::Open);
        assert_eq!(fulfilment_status(10, 4), SalesOrderStatus::Partial);
        assert_eq!(fulfilment_status(10, 10), SalesOrderStatus::Completed);
        assert_eq!(fulfilment_status(10, 12), SalesOrderStatus::Completed);
    }

    proptest! {
        #[test]
        fn fulfilment_status_is_consistent(ordered in 1i64..10_000, shipped in 0i64..20_000) {
            let status = fulfilment_status(ordered, shipped);
            match status {
                SalesOrderStatus::Open => prop_assert_eq!(shipped, 0),
                SalesOrderStatus::Completed => prop_assert!(shipped >= ordered),
                SalesOrderStatus::Partial => prop_assert!(shipped > 0 && shipped < ordered),
                SalesOrderStatus::Cancelled => prop_assert!(false, "never derived"),
            }
        }
    }
}
