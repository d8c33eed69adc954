//! Document numbers for production orders, travel sheets and shipments.

use chrono::{DateTime, Datelike, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::{entities::shipment, errors::ServiceError};

/// `PREFIX-YYYYMMDDHHMMSS-XXXXXXXX`, the suffix being 8 upper-case hex digits of a v4 uuid.
pub fn unique_number(prefix: &str, now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_uppercase();
    format!("{}-{}-{}", prefix, crate::common::compact_timestamp(now), suffix)
}

pub fn production_order_number(now: DateTime<Utc>) -> String {
    unique_number("PO", now)
}

pub fn travel_sheet_number(now: DateTime<Utc>) -> String {
    unique_number("TS", now)
}

/// Successor of the highest numeric sequence among `existing`, formatted `SHIP-YYYY-NNNN`.
/// Sequences compare as numbers so `SHIP-YYYY-10000` follows `SHIP-YYYY-9999`.
pub fn next_shipment_number<'a, I>(year: i32, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let next = existing
        .into_iter()
        .filter_map(|number| number.rsplit('-').next())
        .filter_map(|seq| seq.parse::<u32>().ok())
        .max()
        .map_or(1, |seq| seq + 1);
    format!("SHIP-{}-{:04}", year, next)
}

/// Scans the current year's shipment numbers and returns the successor.
pub async fn generate_shipment_number<C: ConnectionTrait>(
    db: &C,
    now: DateTime<Utc>,
) -> Result<String, ServiceError> {
    let year = now.year();
    let numbers: Vec<String> = shipment::Entity::find()
        .select_only()
        .column(shipment::Column::ShipmentNumber)
        .filter(shipment::Column::ShipmentNumber.starts_with(format!("SHIP-{}-", year)))
        .into_tuple::<String>()
        .all(db)
        .await?;
    Ok(next_shipment_number(year, numbers.iter().map(String::as_str)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn production_order_number_layout() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        let number = production_order_number(now);
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "PO");
        assert_eq!(parts[1], "20250309140507");
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn travel_sheet_numbers_differ() {
        let now = Utc::now();
        assert_ne!(travel_sheet_number(now), travel_sheet_number(now));
        assert!(travel_sheet_number(now).starts_with("TS-"));
    }

    #[test]
    fn shipment_numbers_are_sequential_per_year() {
        assert_eq!(next_shipment_number(2025, []), "SHIP-2025-0001");
        assert_eq!(
            next_shipment_number(2025, ["SHIP-2025-0040", "SHIP-2025-0041"]),
            "SHIP-2025-0042"
        );
        assert_eq!(
            next_shipment_number(2026, ["SHIP-2026-9999"]),
            "SHIP-2026-10000"
        );
    }

    #[test]
    fn five_digit_sequences_outrank_four_digit_ones() {
        assert_eq!(
            next_shipment_number(2026, ["SHIP-2026-9999", "SHIP-2026-10000", "SHIP-2026-0005"]),
            "SHIP-2026-10001"
        );
    }
}
