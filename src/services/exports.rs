//! CSV downloads of the main registers.

use crate::{
    db::DbPool,
    entities::{
        customer,
        enums::{
            parse_status, InspectionStatus, ProductionOrderStatus, SalesOrderStatus,
            ShipmentStatus,
        },
        part_number,
    },
    errors::ServiceError,
    services::{
        dashboard::completion_percentage,
        production_orders::{ProductionOrderService, PRODUCTION_ORDER_STATUSES},
        quality::{QualityService, INSPECTION_STATUSES},
        sales_orders::{SalesOrderService, SALES_ORDER_STATUSES},
        shipments::{ShipmentService, SHIPMENT_STATUSES},
    },
};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument};

/// A rendered CSV document and the file name to offer it under.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

impl CsvExport {
    pub const CONTENT_TYPE: &'static str = "text/csv; charset=utf-8";

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// `name_YYYYMMDD_HHMMSS.csv`
pub fn export_filename(name: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}.csv", name, now.format("%Y%m%d_%H%M%S"))
}

/// Renders a header row and value rows as comma-separated text.
pub fn render_csv(headers: &[&str], rows: &[Vec<Value>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|h| escape_field(h))
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in rows {
        lines.push(
            row.iter()
                .map(|cell| escape_field(&value_to_string(cell)))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    let mut body = lines.join("\r\n");
    body.push_str("\r\n");
    body
}

fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => if *b { "Yes" } else { "No" }.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(";"),
        Value::Object(_) => value.to_string(),
    }
}

fn parse_filter<T: std::str::FromStr>(
    raw: Option<String>,
    choices: &str,
) -> Result<Option<T>, ServiceError> {
    raw.filter(|s| !s.is_empty())
        .map(|s| parse_status(&s, choices))
        .transpose()
}

#[derive(Clone)]
pub struct ExportService {
    db_pool: Arc<DbPool>,
    sales_orders: SalesOrderService,
    shipments: ShipmentService,
    production_orders: ProductionOrderService,
    quality: QualityService,
}

impl ExportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            sales_orders: SalesOrderService::new(db_pool.clone()),
            shipments: ShipmentService::new(db_pool.clone()),
            production_orders: ProductionOrderService::new(db_pool.clone()),
            quality: QualityService::new(db_pool.clone()),
            db_pool,
        }
    }

    /// One row per order line, with the order header repeated.
    #[instrument(skip(self))]
    pub async fn sales_orders(
        &self,
        status: Option<String>,
        customer_id: Option<i32>,
        can_view_prices: bool,
    ) -> Result<CsvExport, ServiceError> {
        let status: Option<SalesOrderStatus> = parse_filter(status, SALES_ORDER_STATUSES)?;
        let orders = self.sales_orders.all_sales_orders(customer_id, status).await?;
        let mut rows = Vec::new();
        for detail in orders {
            let detail = detail.mask_prices(can_view_prices);
            let order = &detail.order;
            let header = [
                json!(order.po_number),
                json!(detail.customer.as_ref().map(|c| c.code.clone())),
                json!(detail.customer.as_ref().map(|c| c.name.clone())),
                json!(order.order_date.to_string()),
                json!(order.due_date.to_string()),
                json!(order.status.to_string()),
            ];
            if detail.items.is_empty() {
                let mut row = header.to_vec();
                row.extend(std::iter::repeat(Value::Null).take(8));
                row.push(json!(order.notes));
                rows.push(row);
            }
            for line in &detail.items {
                let mut row = header.to_vec();
                row.extend([
                    json!(line.part_number.as_ref().map(|p| p.part_number.clone())),
                    json!(line.part_number.as_ref().and_then(|p| p.description.clone())),
                    json!(line.item.quantity),
                    json!(line.item.quantity_produced),
                    json!(line.item.quantity_shipped),
                    json!(line.item.unit_price.map(|p| p.to_string())),
                    json!(line.item.total_price.map(|p| p.to_string())),
                    json!(line.item.status.to_string()),
                    json!(order.notes),
                ]);
                rows.push(row);
            }
        }
        self.finish(
            "sales_orders",
            &[
                "PO Number",
                "Customer Code",
                "Customer Name",
                "Order Date",
                "Due Date",
                "Order Status",
                "Part Number",
                "Description",
                "Quantity Ordered",
                "Quantity Produced",
                "Quantity Shipped",
                "Unit Price",
                "Total Price",
                "Item Status",
                "Notes",
            ],
            rows,
        )
    }

    #[instrument(skip(self))]
    pub async fn shipments(
        &self,
        status: Option<String>,
        customer_id: Option<i32>,
        can_view_prices: bool,
    ) -> Result<CsvExport, ServiceError> {
        let status: Option<ShipmentStatus> = parse_filter(status, SHIPMENT_STATUSES)?;
        let shipments = self.shipments.all_shipments(status, customer_id).await?;
        let mut rows = Vec::new();
        for detail in shipments {
            let detail = detail.mask_prices(can_view_prices);
            let shipment = &detail.shipment;
            let header = [
                json!(shipment.shipment_number),
                json!(detail.customer.as_ref().map(|c| c.code.clone())),
                json!(detail.customer.as_ref().map(|c| c.name.clone())),
                json!(detail.sales_order.as_ref().map(|s| s.po_number.clone())),
                json!(shipment.shipment_date.to_string()),
                json!(shipment.status.to_string()),
                json!(shipment.tracking_number),
            ];
            if detail.items.is_empty() {
                let mut row = header.to_vec();
                row.extend(std::iter::repeat(Value::Null).take(5));
                rows.push(row);
            }
            for line in &detail.items {
                let mut row = header.to_vec();
                row.extend([
                    json!(line.part_number.as_ref().map(|p| p.part_number.clone())),
                    json!(line.part_number.as_ref().and_then(|p| p.description.clone())),
                    json!(line.item.quantity),
                    json!(line.item.unit_price.map(|p| p.to_string())),
                    json!(line.production_order.as_ref().map(|p| p.po_number.clone())),
                ]);
                rows.push(row);
            }
        }
        self.finish(
            "shipments",
            &[
                "Shipment Number",
                "Customer Code",
                "Customer Name",
                "Sales Order",
                "Shipment Date",
                "Status",
                "Tracking Number",
                "Part Number",
                "Description",
                "Quantity",
                "Unit Price",
                "Production Order",
            ],
            rows,
        )
    }

    #[instrument(skip(self))]
    pub async fn production_orders(&self, status: Option<String>) -> Result<CsvExport, ServiceError> {
        let status: Option<ProductionOrderStatus> =
            parse_filter(status, PRODUCTION_ORDER_STATUSES)?;
        let rows = self
            .production_orders
            .all_with_parts(status)
            .await?
            .into_iter()
            .map(|(order, part)| {
                vec![
                    json!(order.po_number),
                    json!(part.as_ref().map(|p| p.part_number.clone())),
                    json!(part.and_then(|p| p.description)),
                    json!(order.quantity),
                    json!(order.quantity_completed),
                    json!(order.quantity_scrapped),
                    json!(completion_percentage(order.quantity_completed, order.quantity)),
                    json!(order.status.to_string()),
                    json!(order.priority),
                    json!(order.start_date.map(|d| d.to_string())),
                    json!(order.due_date.map(|d| d.to_string())),
                ]
            })
            .collect();
        self.finish(
            "production_orders",
            &[
                "PO Number",
                "Part Number",
                "Description",
                "Quantity",
                "Completed",
                "Scrapped",
                "Completion %",
                "Status",
                "Priority",
                "Start Date",
                "Due Date",
            ],
            rows,
        )
    }

    #[instrument(skip(self))]
    pub async fn customers(&self) -> Result<CsvExport, ServiceError> {
        let rows = customer::Entity::find()
            .order_by_asc(customer::Column::Code)
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|c| {
                vec![
                    json!(c.code),
                    json!(c.name),
                    json!(c.contact_person),
                    json!(c.phone),
                    json!(c.email),
                    json!(c.address),
                    json!(c.delivery_frequency),
                    json!(c.is_active),
                ]
            })
            .collect();
        self.finish(
            "customers",
            &[
                "Code",
                "Name",
                "Contact Person",
                "Phone",
                "Email",
                "Address",
                "Delivery Frequency",
                "Active",
            ],
            rows,
        )
    }

    #[instrument(skip(self))]
    pub async fn part_numbers(
        &self,
        customer_id: Option<i32>,
        can_view_prices: bool,
    ) -> Result<CsvExport, ServiceError> {
        let db = &*self.db_pool;
        let mut query = part_number::Entity::find();
        if let Some(customer_id) = customer_id {
            query = query.filter(part_number::Column::CustomerId.eq(customer_id));
        }
        let parts = query
            .order_by_asc(part_number::Column::PartNumber)
            .all(db)
            .await?;
        let customers: HashMap<i32, String> = customer::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        let rows = parts
            .into_iter()
            .map(|p| {
                let price = if can_view_prices { p.unit_price } else { None };
                vec![
                    json!(p.part_number),
                    json!(p.customer_id.and_then(|id| customers.get(&id).cloned())),
                    json!(p.description),
                    json!(p.material_type),
                    json!(price.map(|d| d.to_string())),
                    json!(p.is_active),
                ]
            })
            .collect();
        self.finish(
            "part_numbers",
            &[
                "Part Number",
                "Customer",
                "Description",
                "Material Type",
                "Unit Price",
                "Active",
            ],
            rows,
        )
    }

    #[instrument(skip(self))]
    pub async fn quality_inspections(&self, status: Option<String>) -> Result<CsvExport, ServiceError> {
        let status: Option<InspectionStatus> = parse_filter(status, INSPECTION_STATUSES)?;
        let rows = self
            .quality
            .all_inspections(status)
            .await?
            .into_iter()
            .map(|d| {
                vec![
                    json!(d.inspection.inspection_date.format("%Y-%m-%d %H:%M").to_string()),
                    json!(d.production_order.as_ref().map(|o| o.po_number.clone())),
                    json!(d.part_number.as_ref().map(|p| p.part_number.clone())),
                    json!(d.travel_sheet_number),
                    json!(d.inspector_name),
                    json!(d.inspection.status.to_string()),
                    json!(d.inspection.quantity_inspected),
                    json!(d.inspection.quantity_approved),
                    json!(d.inspection.quantity_rejected),
                    json!(d.inspection.rejection_reason),
                    json!(d.inspection.notes),
                ]
            })
            .collect();
        self.finish(
            "quality_inspections",
            &[
                "Inspection Date",
                "Production Order",
                "Part Number",
                "Travel Sheet",
                "Inspector",
                "Status",
                "Inspected",
                "Approved",
                "Rejected",
                "Rejection Reason",
                "Notes",
            ],
            rows,
        )
    }

    fn finish(
        &self,
        name: &str,
        headers: &[&str],
        rows: Vec<Vec<Value>>,
    ) -> Result<CsvExport, ServiceError> {
        info!(export = name, rows = rows.len(), "csv export rendered");
        Ok(CsvExport {
            filename: export_filename(name, Utc::now()),
            body: render_csv(headers, &rows),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("plain", "plain")]
    #[case("a,b", "\"a,b\"")]
    #[case("say \"hi\"", "\"say \"\"hi\"\"\"")]
    #[case("two\nlines", "\"two\nlines\"")]
    fn fields_are_quoted_when_needed(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(escape_field(raw), expected);
    }

    #[test]
    fn renders_header_and_rows() {
        let body = render_csv(
            &["Code", "Active", "Qty"],
            &[vec![json!("ACME, Inc"), json!(true), json!(12)], vec![Value::Null, json!(false), json!(0)]],
        );
        assert_eq!(body, "Code,Active,Qty\r\n\"ACME, Inc\",Yes,12\r\n,No,0\r\n");
    }

    #[test]
    fn filename_is_timestamped() {
        let now = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(
            export_filename("shipments", now),
            "shipments_20240506_070809.csv"
        );
    }

    #[test]
    fn unknown_status_filter_is_rejected() {
        let err = parse_filter::<ShipmentStatus>(Some("Lost".into()), SHIPMENT_STATUSES).unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
        assert_eq!(
            parse_filter::<ShipmentStatus>(Some(String::new()), SHIPMENT_STATUSES).unwrap(),
            None
        );
    }
}
