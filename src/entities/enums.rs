//! Status vocabularies stored as strings in the database.
//!
//! The stored values are the human-readable labels the shop floor uses
//! (`"In Progress"`, `"On Hold"`), so serde and `Display` both use them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum SalesOrderStatus {
    #[sea_orm(string_value = "Open")]
    Open,
    #[sea_orm(string_value = "Partial")]
    Partial,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum SalesOrderItemStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "In Production")]
    #[serde(rename = "In Production")]
    #[strum(serialize = "In Production")]
    InProduction,
    #[sea_orm(string_value = "Completed")]
    Completed,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ProductionOrderStatus {
    #[sea_orm(string_value = "Created")]
    Created,
    #[sea_orm(string_value = "Released")]
    Released,
    #[sea_orm(string_value = "In Progress")]
    #[serde(rename = "In Progress")]
    #[strum(serialize = "In Progress")]
    InProgress,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
    #[sea_orm(string_value = "On Hold")]
    #[serde(rename = "On Hold")]
    #[strum(serialize = "On Hold")]
    OnHold,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum TravelSheetStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum OperationStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "In Progress")]
    #[serde(rename = "In Progress")]
    #[strum(serialize = "In Progress")]
    InProgress,
    #[sea_orm(string_value = "Completed")]
    Completed,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum InspectionStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Released")]
    Released,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
    #[sea_orm(string_value = "On Hold")]
    #[serde(rename = "On Hold")]
    #[strum(serialize = "On Hold")]
    OnHold,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ShipmentStatus {
    #[sea_orm(string_value = "Prepared")]
    Prepared,
    #[sea_orm(string_value = "Shipped")]
    Shipped,
    #[sea_orm(string_value = "Delivered")]
    Delivered,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum MovementType {
    #[sea_orm(string_value = "Receipt")]
    Receipt,
    #[sea_orm(string_value = "Issue")]
    Issue,
    #[sea_orm(string_value = "Return")]
    Return,
    #[sea_orm(string_value = "Adjustment")]
    Adjustment,
}

impl MovementType {
    /// Issues draw stock down; every other movement adds to it.
    pub fn is_outbound(self) -> bool {
        matches!(self, MovementType::Issue)
    }
}

/// Schedule health of a production order, derived rather than stored.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
pub enum RiskStatus {
    Green,
    Yellow,
    Red,
}

/// Parses a status query/body value, mapping failures to the listed choices.
pub fn parse_status<T>(raw: &str, choices: &str) -> Result<T, crate::errors::ServiceError>
where
    T: FromStr,
{
    T::from_str(raw.trim()).map_err(|_| {
        crate::errors::ServiceError::BadRequest(format!(
            "Invalid status. Must be one of: {}",
            choices
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_word_statuses_round_trip_through_display_and_parse() {
        assert_eq!(ProductionOrderStatus::InProgress.to_string(), "In Progress");
        assert_eq!(
            "On Hold".parse::<ProductionOrderStatus>().unwrap(),
            ProductionOrderStatus::OnHold
        );
        assert_eq!(
            serde_json::to_string(&OperationStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        assert_eq!(SalesOrderItemStatus::InProduction.to_string(), "In Production");
    }

    #[test]
    fn parse_status_lists_choices() {
        let err = parse_status::<ShipmentStatus>("Lost", "Prepared, Shipped, Delivered")
            .unwrap_err();
        assert_eq!(
            err.response_message(),
            "Invalid status. Must be one of: Prepared, Shipped, Delivered"
        );
        assert_eq!(
            parse_status::<ShipmentStatus>(" Shipped ", "").unwrap(),
            ShipmentStatus::Shipped
        );
    }

    #[test]
    fn only_issue_is_outbound() {
        assert!(MovementType::Issue.is_outbound());
        assert!(!MovementType::Adjustment.is_outbound());
    }
}
