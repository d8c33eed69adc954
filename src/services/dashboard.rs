//! Read-only shop-floor metrics: order counts, schedule risk and work-center load.

use crate::{
    common::PageWindow,
    db::DbPool,
    entities::{
        customer,
        enums::{
            parse_status, OperationStatus, ProductionOrderStatus, RiskStatus, SalesOrderStatus,
        },
        part_number, production_order, sales_order, shipment, shipment_item,
        travel_sheet_operation, work_center,
    },
    errors::ServiceError,
    services::production_orders::PRODUCTION_ORDER_STATUSES,
};
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};
use tracing::instrument;
use utoipa::ToSchema;

/// Days ahead of the due date at which an order turns yellow.
pub const AT_RISK_WINDOW_DAYS: i64 = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_open_orders: u64,
    pub total_completed_orders: u64,
    pub total_shipped_orders: u64,
    pub total_in_production: u64,
    pub total_delayed: u64,
    pub total_at_risk: u64,
    pub total_on_time: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductionDashboardItem {
    pub id: i32,
    pub po_number: String,
    pub sales_order_number: Option<String>,
    pub customer_name: Option<String>,
    pub part_number: String,
    pub part_description: Option<String>,
    pub quantity: i32,
    pub quantity_completed: i32,
    pub quantity_shipped: i64,
    pub quantity_scrapped: i32,
    pub status: ProductionOrderStatus,
    pub due_date: Option<NaiveDate>,
    pub risk_status: RiskStatus,
    pub completion_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WorkCenterLoad {
    pub work_center_id: i32,
    pub work_center_name: String,
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyProduction {
    pub date: NaiveDate,
    pub good: i64,
    pub scrap: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ProductionDashboardFilter {
    pub status: Option<String>,
    pub risk_status: Option<RiskStatus>,
    pub customer_id: Option<i32>,
}

/// Schedule health of an order relative to `today`.
pub fn risk_status(
    due_date: Option<NaiveDate>,
    status: ProductionOrderStatus,
    today: NaiveDate,
) -> RiskStatus {
    if status == ProductionOrderStatus::Completed {
        return RiskStatus::Green;
    }
    match due_date {
        None => RiskStatus::Yellow,
        Some(due) if due < today => RiskStatus::Red,
        Some(due) if due <= today + Duration::days(AT_RISK_WINDOW_DAYS) => RiskStatus::Yellow,
        Some(_) => RiskStatus::Green,
    }
}

/// `completed / quantity` as a percentage rounded to two decimals; 0 for an empty order.
pub fn completion_percentage(completed: i32, quantity: i32) -> f64 {
    if quantity <= 0 {
        return 0.0;
    }
    let pct = f64::from(completed) / f64::from(quantity) * 100.0;
    (pct * 100.0).round() / 100.0
}

#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<DashboardStats, ServiceError> {
        let db = &*self.db_pool;
        let today = Utc::now().date_naive();

        let total_open_orders = sales_order::Entity::find()
            .filter(
                sales_order::Column::Status
                    .is_in([SalesOrderStatus::Open, SalesOrderStatus::Partial]),
            )
            .count(db)
            .await?;
        let total_completed_orders = sales_order::Entity::find()
            .filter(sales_order::Column::Status.eq(SalesOrderStatus::Completed))
            .count(db)
            .await?;
        let shipped_orders: HashSet<i32> = shipment::Entity::find()
            .filter(shipment::Column::SalesOrderId.is_not_null())
            .all(db)
            .await?
            .into_iter()
            .filter_map(|s| s.sales_order_id)
            .collect();
        let total_in_production = production_order::Entity::find()
            .filter(production_order::Column::Status.eq(ProductionOrderStatus::InProgress))
            .count(db)
            .await?;

        let mut stats = DashboardStats {
            total_open_orders,
            total_completed_orders,
            total_shipped_orders: shipped_orders.len() as u64,
            total_in_production,
            ..Default::default()
        };
        let active_orders = production_order::Entity::find()
            .filter(production_order::Column::Status.is_not_in([
                ProductionOrderStatus::Completed,
                ProductionOrderStatus::Cancelled,
            ]))
            .all(db)
            .await?;
        for order in active_orders {
            match risk_status(order.due_date, order.status, today) {
                RiskStatus::Red => stats.total_delayed += 1,
                RiskStatus::Yellow => stats.total_at_risk += 1,
                RiskStatus::Green => stats.total_on_time += 1,
            }
        }
        Ok(stats)
    }

    /// Per-order progress rows. Risk and customer filters apply before the page window.
    #[instrument(skip(self))]
    pub async fn production(
        &self,
        filter: ProductionDashboardFilter,
        window: PageWindow,
    ) -> Result<Vec<ProductionDashboardItem>, ServiceError> {
        let db = &*self.db_pool;
        let today = Utc::now().date_naive();
        let mut query = production_order::Entity::find();
        if let Some(raw) = filter.status.filter(|s| !s.is_empty()) {
            let status: ProductionOrderStatus = parse_status(&raw, PRODUCTION_ORDER_STATUSES)?;
            query = query.filter(production_order::Column::Status.eq(status));
        }
        let orders = query
            .find_also_related(part_number::Entity)
            .order_by_asc(production_order::Column::Id)
            .all(db)
            .await?;

        let sales_orders = sales_orders_with_customers(db, &orders).await?;
        let shipped = shipped_by_production_order(db).await?;

        Ok(orders
            .into_iter()
            .filter_map(|(order, part)| {
                let (sales_order, customer) = order
                    .sales_order_id
                    .and_then(|id| sales_orders.get(&id))
                    .map_or((None, None), |(so, c)| (Some(so), c.as_ref()));
                if let Some(customer_id) = filter.customer_id {
                    if sales_order.map(|so| so.customer_id) != Some(customer_id) {
                        return None;
                    }
                }
                let risk = risk_status(order.due_date, order.status, today);
                if filter.risk_status.is_some_and(|wanted| wanted != risk) {
                    return None;
                }
                Some(ProductionDashboardItem {
                    id: order.id,
                    sales_order_number: sales_order.map(|so| so.po_number.clone()),
                    customer_name: customer.map(|c| c.name.clone()),
                    part_number: part
                        .as_ref()
                        .map(|p| p.part_number.clone())
                        .unwrap_or_default(),
                    part_description: part.and_then(|p| p.description),
                    quantity: order.quantity,
                    quantity_completed: order.quantity_completed,
                    quantity_shipped: shipped.get(&order.id).copied().unwrap_or(0),
                    quantity_scrapped: order.quantity_scrapped,
                    status: order.status,
                    due_date: order.due_date,
                    risk_status: risk,
                    completion_percentage: completion_percentage(
                        order.quantity_completed,
                        order.quantity,
                    ),
                    po_number: order.po_number,
                })
            })
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn work_center_load(&self) -> Result<Vec<WorkCenterLoad>, ServiceError> {
        let db = &*self.db_pool;
        let centers = work_center::Entity::find()
            .order_by_asc(work_center::Column::Id)
            .all(db)
            .await?;
        let mut counts: HashMap<(i32, OperationStatus), u64> = HashMap::new();
        for operation in travel_sheet_operation::Entity::find()
            .filter(travel_sheet_operation::Column::WorkCenterId.is_not_null())
            .all(db)
            .await?
        {
            if let Some(center) = operation.work_center_id {
                *counts.entry((center, operation.status)).or_default() += 1;
            }
        }
        Ok(centers
            .into_iter()
            .map(|center| {
                let count = |status| counts.get(&(center.id, status)).copied().unwrap_or(0);
                let pending = count(OperationStatus::Pending);
                let in_progress = count(OperationStatus::InProgress);
                let completed = count(OperationStatus::Completed);
                WorkCenterLoad {
                    work_center_id: center.id,
                    work_center_name: center.name,
                    pending,
                    in_progress,
                    completed,
                    total: pending + in_progress + completed,
                }
            })
            .collect())
    }

    /// Good and scrap units of operations finished within the last `days` days, by day.
    #[instrument(skip(self))]
    pub async fn daily_production(&self, days: u32) -> Result<Vec<DailyProduction>, ServiceError> {
        let since = Utc::now() - Duration::days(i64::from(days));
        let operations = travel_sheet_operation::Entity::find()
            .filter(travel_sheet_operation::Column::Status.eq(OperationStatus::Completed))
            .filter(travel_sheet_operation::Column::EndTime.gte(since))
            .all(&*self.db_pool)
            .await?;
        let mut by_day: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
        for operation in operations {
            if let Some(end) = operation.end_time {
                let entry = by_day.entry(end.date_naive()).or_default();
                entry.0 += i64::from(operation.quantity_good);
                entry.1 += i64::from(operation.quantity_scrap);
            }
        }
        Ok(by_day
            .into_iter()
            .map(|(date, (good, scrap))| DailyProduction { date, good, scrap })
            .collect())
    }
}

async fn sales_orders_with_customers<C: ConnectionTrait>(
    db: &C,
    orders: &[(production_order::Model, Option<part_number::Model>)],
) -> Result<HashMap<i32, (sales_order::Model, Option<customer::Model>)>, ServiceError> {
    let ids: Vec<i32> = orders.iter().filter_map(|(o, _)| o.sales_order_id).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(sales_order::Entity::find()
        .filter(sales_order::Column::Id.is_in(ids))
        .find_also_related(customer::Entity)
        .all(db)
        .await?
        .into_iter()
        .map(|(so, c)| (so.id, (so, c)))
        .collect())
}

async fn shipped_by_production_order<C: ConnectionTrait>(
    db: &C,
) -> Result<HashMap<i32, i64>, ServiceError> {
    let mut shipped = HashMap::new();
    for item in shipment_item::Entity::find()
        .filter(shipment_item::Column::ProductionOrderId.is_not_null())
        .all(db)
        .await?
    {
        if let Some(order_id) = item.production_order_id {
            *shipped.entry(order_id).or_insert(0) += i64::from(item.quantity);
        }
    }
    Ok(shipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[rstest]
    #[case(None, ProductionOrderStatus::InProgress, RiskStatus::Yellow)]
    #[case(Some(day(9)), ProductionOrderStatus::InProgress, RiskStatus::Red)]
    #[case(Some(day(10)), ProductionOrderStatus::Released, RiskStatus::Yellow)]
    #[case(Some(day(13)), ProductionOrderStatus::Created, RiskStatus::Yellow)]
    #[case(Some(day(14)), ProductionOrderStatus::Created, RiskStatus::Green)]
    #[case(Some(day(1)), ProductionOrderStatus::Completed, RiskStatus::Green)]
    fn risk_by_due_date(
        #[case] due: Option<NaiveDate>,
        #[case] status: ProductionOrderStatus,
        #[case] expected: RiskStatus,
    ) {
        assert_eq!(risk_status(due, status, day(10)), expected);
    }

    #[rstest]
    #[case(0, 0, 0.0)]
    #[case(1, 3, 33.33)]
    #[case(2, 3, 66.67)]
    #[case(50, 50, 100.0)]
    fn completion_rounding(#[case] done: i32, #[case] qty: i32, #[case] expected: f64) {
        assert_eq!(completion_percentage(done, qty), expected);
    }

    proptest! {
        #[test]
        fn completion_is_bounded_for_partial_orders(qty in 1i32..100_000, pct in 0u32..=100) {
            let done = (i64::from(qty) * i64::from(pct) / 100) as i32;
            let value = completion_percentage(done, qty);
            prop_assert!((0.0..=100.0).contains(&value));
        }

        #[test]
        fn completed_orders_are_always_green(offset in -400i64..400) {
            let today = day(10);
            let due = today + Duration::days(offset);
            prop_assert_eq!(
                risk_status(Some(due), ProductionOrderStatus::Completed, today),
                RiskStatus::Green
            );
        }
    }
}
