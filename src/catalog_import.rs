//! Bulk load of customers, part numbers and routings from a CSV catalog.
//!
//! Expected header: `Part Number` (required), `Customer`, `Description`, `Material`,
//! then one column per process holding its standard time in minutes. A process
//! column that is blank or zero adds no routing step.

use crate::{
    entities::{customer, part_number, part_routing, process, work_center},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use std::{collections::HashMap, io::Read, str::FromStr};
use tracing::{info, warn};

/// Catalog column, process code and process name, in routing order.
const PROCESS_COLUMNS: [(&str, &str, &str); 7] = [
    ("Laser Cut", "LASER_CUT", "Laser Cut"),
    ("Machining", "MACHINING", "Machining"),
    ("Cleaning", "CLEANING", "Cleaning"),
    ("Bending", "BENDING", "Bending"),
    ("Assembly", "ASSEMBLY", "Assembly"),
    ("Painting", "PAINTING", "Painting"),
    ("Galvanizing", "GALVANIZING", "Galvanizing"),
];

const CUSTOMER_CODE_MAX: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct RoutingStep {
    pub process_code: &'static str,
    pub process_name: &'static str,
    pub minutes: Decimal,
}

/// One parsed catalog line. `line` is the 1-based line in the file, header included.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    pub line: usize,
    pub part_number: Option<String>,
    pub customer: Option<String>,
    pub description: Option<String>,
    pub material: Option<String>,
    pub steps: Vec<RoutingStep>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub rows: usize,
    pub customers_created: usize,
    pub parts_created: usize,
    pub parts_updated: usize,
    pub routings_created: usize,
    pub rows_skipped: usize,
}

fn invalid_file(err: csv::Error) -> ServiceError {
    ServiceError::BadRequest(format!("Invalid import file: {}", err))
}

/// Parses the catalog. Malformed process times are logged and left out of the routing.
pub fn read_catalog<R: Read>(reader: R) -> Result<Vec<CatalogRow>, ServiceError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers().map_err(invalid_file)?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let part_col = column("Part Number").ok_or_else(|| {
        ServiceError::BadRequest("Import file has no 'Part Number' column".to_string())
    })?;
    let customer_col = column("Customer");
    let description_col = column("Description");
    let material_col = column("Material");
    let process_cols: Vec<(usize, &'static str, &'static str)> = PROCESS_COLUMNS
        .iter()
        .filter_map(|(header, code, name)| column(header).map(|idx| (idx, *code, *name)))
        .collect();

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record.map_err(invalid_file)?;
        let line = index + 2;
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("nan"))
                .map(str::to_string)
        };

        let mut steps = Vec::new();
        for &(idx, process_code, process_name) in &process_cols {
            let Some(raw) = cell(Some(idx)) else {
                continue;
            };
            match Decimal::from_str(&raw) {
                Ok(minutes) if minutes > Decimal::ZERO => steps.push(RoutingStep {
                    process_code,
                    process_name,
                    minutes,
                }),
                Ok(_) => {}
                Err(_) => warn!(line, process = process_name, value = %raw, "ignoring invalid process time"),
            }
        }

        rows.push(CatalogRow {
            line,
            part_number: cell(Some(part_col)),
            customer: cell(customer_col),
            description: cell(description_col),
            material: cell(material_col),
            steps,
        });
    }
    Ok(rows)
}

/// `ACME Metals` becomes `ACME_METALS`, capped at the code column width.
pub fn customer_code(name: &str) -> String {
    name.replace(' ', "_")
        .to_uppercase()
        .chars()
        .take(CUSTOMER_CODE_MAX)
        .collect()
}

/// Upserts every row in one transaction. Existing part numbers get their
/// description, material and routing replaced; rows without a part number are skipped.
pub async fn import_catalog(
    db: &DatabaseConnection,
    rows: Vec<CatalogRow>,
) -> Result<ImportReport, ServiceError> {
    let txn = db.begin().await?;
    let mut report = ImportReport {
        rows: rows.len(),
        ..Default::default()
    };
    let mut process_ids: HashMap<&'static str, i32> = HashMap::new();

    for row in rows {
        let Some(number) = row.part_number else {
            warn!(line = row.line, "skipping row without a part number");
            report.rows_skipped += 1;
            continue;
        };

        let customer_id = match row.customer.as_deref() {
            Some(name) => Some(customer_for(&txn, name, &mut report).await?),
            None => None,
        };

        let existing = part_number::Entity::find()
            .filter(part_number::Column::PartNumber.eq(number.as_str()))
            .one(&txn)
            .await?;
        let part = match existing {
            Some(part) => {
                let mut active: part_number::ActiveModel = part.into();
                active.description = Set(row.description);
                active.material_type = Set(row.material);
                if customer_id.is_some() {
                    active.customer_id = Set(customer_id);
                }
                let part = active.update(&txn).await?;
                part_routing::Entity::delete_many()
                    .filter(part_routing::Column::PartNumberId.eq(part.id))
                    .exec(&txn)
                    .await?;
                report.parts_updated += 1;
                part
            }
            None => {
                let part = part_number::ActiveModel {
                    part_number: Set(number),
                    customer_id: Set(customer_id),
                    description: Set(row.description),
                    material_type: Set(row.material),
                    is_active: Set(true),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
                report.parts_created += 1;
                part
            }
        };

        for (sequence, step) in (1..).zip(&row.steps) {
            let process_id = match process_ids.get(step.process_code) {
                Some(id) => *id,
                None => {
                    let id = process_for(&txn, step).await?;
                    process_ids.insert(step.process_code, id);
                    id
                }
            };
            part_routing::ActiveModel {
                part_number_id: Set(part.id),
                process_id: Set(process_id),
                sequence_number: Set(sequence),
                standard_time_minutes: Set(Some(step.minutes)),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            report.routings_created += 1;
        }
        info!(
            line = row.line,
            part_number = %part.part_number,
            steps = row.steps.len(),
            "part number imported"
        );
    }

    txn.commit().await?;
    info!(
        rows = report.rows,
        customers_created = report.customers_created,
        parts_created = report.parts_created,
        parts_updated = report.parts_updated,
        routings_created = report.routings_created,
        rows_skipped = report.rows_skipped,
        "catalog import finished"
    );
    Ok(report)
}

/// Finds a customer by derived code, then by exact name, creating it when neither matches.
async fn customer_for<C: ConnectionTrait>(
    db: &C,
    name: &str,
    report: &mut ImportReport,
) -> Result<i32, ServiceError> {
    let code = customer_code(name);
    if let Some(found) = customer::Entity::find()
        .filter(customer::Column::Code.eq(code.as_str()))
        .one(db)
        .await?
    {
        return Ok(found.id);
    }
    if let Some(found) = customer::Entity::find()
        .filter(customer::Column::Name.eq(name))
        .one(db)
        .await?
    {
        return Ok(found.id);
    }

    let created = customer::ActiveModel {
        code: Set(code),
        name: Set(name.to_string()),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await?;
    report.customers_created += 1;
    info!(customer_id = created.id, code = %created.code, "customer created by import");
    Ok(created.id)
}

/// Existing process by code, or a new one on the first work center.
async fn process_for<C: ConnectionTrait>(db: &C, step: &RoutingStep) -> Result<i32, ServiceError> {
    if let Some(found) = process::Entity::find()
        .filter(process::Column::Code.eq(step.process_code))
        .one(db)
        .await?
    {
        return Ok(found.id);
    }
    let center = work_center::Entity::find()
        .order_by_asc(work_center::Column::Id)
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::BadRequest(
                "No work centers found; seed default data before importing".to_string(),
            )
        })?;
    let created = process::ActiveModel {
        code: Set(step.process_code.to_string()),
        name: Set(step.process_name.to_string()),
        work_center_id: Set(Some(center.id)),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(created.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, seed::seed_defaults};
    use rust_decimal_macros::dec;
    use sea_orm::PaginatorTrait;
    use std::{fs::File, io::Write};

    const CATALOG: &str = "\
Part Number,Customer,Description,Material,Laser Cut,Machining,Cleaning,Bending,Assembly,Painting,Galvanizing
BRK-100,Acme Metals,Mounting bracket,A36 steel,12.5,,,8,,,
PLT-200,Acme Metals,\"Base plate, 6mm\",,4,0,,,,,3
,Ghost Co,No part number,,1,,,,,,
";

    async fn seeded() -> db::DbPool {
        let pool = db::establish_connection_with_config(&db::DbConfig {
            url: "sqlite::memory:".into(),
            max_connections: 1,
            ..Default::default()
        })
        .await
        .unwrap();
        db::run_migrations(&pool).await.unwrap();
        seed_defaults(&pool).await.unwrap();
        pool
    }

    fn catalog_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_rows_and_skips_blank_times() {
        let rows = read_catalog(CATALOG.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);

        let bracket = &rows[0];
        assert_eq!(bracket.line, 2);
        assert_eq!(bracket.part_number.as_deref(), Some("BRK-100"));
        assert_eq!(bracket.material.as_deref(), Some("A36 steel"));
        let codes: Vec<&str> = bracket.steps.iter().map(|s| s.process_code).collect();
        assert_eq!(codes, vec!["LASER_CUT", "BENDING"]);
        assert_eq!(bracket.steps[0].minutes, dec!(12.5));

        assert_eq!(rows[1].description.as_deref(), Some("Base plate, 6mm"));
        assert_eq!(rows[1].steps.len(), 2);
        assert!(rows[2].part_number.is_none());
    }

    #[test]
    fn invalid_time_is_dropped_from_routing() {
        let rows = read_catalog("Part Number,Laser Cut,Bending\nX-1,fast,5\n".as_bytes()).unwrap();
        assert_eq!(rows[0].steps.len(), 1);
        assert_eq!(rows[0].steps[0].process_code, "BENDING");
    }

    #[test]
    fn missing_part_number_column_is_rejected() {
        let err = read_catalog("Customer,Description\nAcme,Thing\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[test]
    fn customer_codes_are_upper_snake_case() {
        assert_eq!(customer_code("Acme Metals"), "ACME_METALS");
        assert_eq!(customer_code(&"x".repeat(80)).len(), CUSTOMER_CODE_MAX);
    }

    #[tokio::test]
    async fn imports_catalog_file_and_reimport_updates() {
        let pool = seeded().await;
        let file = catalog_file(CATALOG);

        let rows = read_catalog(File::open(file.path()).unwrap()).unwrap();
        let report = import_catalog(&pool, rows).await.unwrap();
        assert_eq!(
            report,
            ImportReport {
                rows: 3,
                customers_created: 1,
                parts_created: 2,
                parts_updated: 0,
                routings_created: 4,
                rows_skipped: 1,
            }
        );

        let bracket = part_number::Entity::find()
            .filter(part_number::Column::PartNumber.eq("BRK-100"))
            .one(&pool)
            .await
            .unwrap()
            .unwrap();
        let acme = customer::Entity::find()
            .filter(customer::Column::Code.eq("ACME_METALS"))
            .one(&pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bracket.customer_id, Some(acme.id));
        let routing = part_routing::Entity::find()
            .filter(part_routing::Column::PartNumberId.eq(bracket.id))
            .order_by_asc(part_routing::Column::SequenceNumber)
            .all(&pool)
            .await
            .unwrap();
        assert_eq!(
            routing.iter().map(|r| r.sequence_number).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(routing[1].standard_time_minutes, Some(dec!(8)));

        // second run replaces the routing instead of duplicating it
        let update = catalog_file(
            "Part Number,Customer,Description,Painting\nBRK-100,Acme Metals,Painted bracket,20\n",
        );
        let rows = read_catalog(File::open(update.path()).unwrap()).unwrap();
        let report = import_catalog(&pool, rows).await.unwrap();
        assert_eq!(report.parts_updated, 1);
        assert_eq!(report.customers_created, 0);

        let routings = part_routing::Entity::find()
            .filter(part_routing::Column::PartNumberId.eq(bracket.id))
            .count(&pool)
            .await
            .unwrap();
        assert_eq!(routings, 1);
        assert_eq!(customer::Entity::find().count(&pool).await.unwrap(), 1);
    }
}
