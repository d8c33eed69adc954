//! Maintenance operations behind the `shopfloor-admin` binary.

use crate::{
    auth::hash_password,
    entities::{
        audit_log, customer, inventory_batch, inventory_movement, material, part_material,
        part_number, part_routing, part_sub_assembly, production_order, quality_inspection,
        sales_order, sales_order_item, shipment, shipment_item, travel_sheet,
        travel_sheet_operation, user,
    },
    errors::ServiceError,
    seed::{admin_role, ADMIN_BADGE, ADMIN_FULL_NAME, ADMIN_USERNAME},
};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityName, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};

/// Sets the `admin` password, recreating or re-activating the account as needed.
pub async fn reset_admin_password<C: ConnectionTrait>(
    db: &C,
    new_password: &str,
) -> Result<user::Model, ServiceError> {
    if new_password.len() < 6 {
        return Err(ServiceError::ValidationError(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    let password_hash = hash_password(new_password)?;

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(ADMIN_USERNAME))
        .one(db)
        .await?;

    let admin = match existing {
        Some(account) => {
            let mut active: user::ActiveModel = account.into();
            active.password_hash = Set(password_hash);
            active.is_active = Set(true);
            active.update(db).await?
        }
        None => {
            warn!("admin account missing; recreating it");
            let role = admin_role(db).await?;
            user::ActiveModel {
                username: Set(ADMIN_USERNAME.to_string()),
                password_hash: Set(password_hash),
                role_id: Set(Some(role.id)),
                badge_id: Set(Some(ADMIN_BADGE.to_string())),
                full_name: Set(Some(ADMIN_FULL_NAME.to_string())),
                is_active: Set(true),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };
    info!(user_id = admin.id, "admin password reset");
    Ok(admin)
}

/// Rows removed from one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub table: String,
    pub deleted: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClearDataReport {
    pub tables: Vec<TableCount>,
    /// Materials whose running stock was zeroed.
    pub materials_reset: u64,
}

impl ClearDataReport {
    pub fn total_deleted(&self) -> u64 {
        self.tables.iter().map(|t| t.deleted).sum()
    }
}

async fn wipe<E, C>(db: &C, entity: E, report: &mut ClearDataReport) -> Result<(), ServiceError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let result = E::delete_many().exec(db).await?;
    report.tables.push(TableCount {
        table: entity.table_name().to_string(),
        deleted: result.rows_affected,
    });
    Ok(())
}

/// Deletes transactional data (orders, shop-floor records, shipments, part
/// numbers, customers and every user except `admin`), keeping roles, plant
/// definitions, materials and suppliers. Runs in a single transaction.
pub async fn clear_data(
    db: &DatabaseConnection,
    include_audit_log: bool,
) -> Result<ClearDataReport, ServiceError> {
    let txn = db.begin().await?;
    let mut report = ClearDataReport::default();

    wipe(&txn, shipment_item::Entity, &mut report).await?;
    wipe(&txn, shipment::Entity, &mut report).await?;
    wipe(&txn, quality_inspection::Entity, &mut report).await?;
    wipe(&txn, travel_sheet_operation::Entity, &mut report).await?;
    wipe(&txn, travel_sheet::Entity, &mut report).await?;
    wipe(&txn, inventory_movement::Entity, &mut report).await?;
    wipe(&txn, inventory_batch::Entity, &mut report).await?;
    wipe(&txn, production_order::Entity, &mut report).await?;
    wipe(&txn, sales_order_item::Entity, &mut report).await?;
    wipe(&txn, sales_order::Entity, &mut report).await?;
    wipe(&txn, part_routing::Entity, &mut report).await?;
    wipe(&txn, part_material::Entity, &mut report).await?;
    wipe(&txn, part_sub_assembly::Entity, &mut report).await?;
    wipe(&txn, part_number::Entity, &mut report).await?;
    wipe(&txn, customer::Entity, &mut report).await?;
    if include_audit_log {
        wipe(&txn, audit_log::Entity, &mut report).await?;
    }

    let users = user::Entity::delete_many()
        .filter(user::Column::Username.ne(ADMIN_USERNAME))
        .exec(&txn)
        .await?;
    report.tables.push(TableCount {
        table: user::Entity.table_name().to_string(),
        deleted: users.rows_affected,
    });

    // batches are gone, so no stock remains on hand
    report.materials_reset = material::Entity::update_many()
        .col_expr(material::Column::CurrentStock, Expr::value(Decimal::ZERO))
        .exec(&txn)
        .await?
        .rows_affected;

    txn.commit().await?;
    info!(
        deleted = report.total_deleted(),
        materials_reset = report.materials_reset,
        include_audit_log,
        "transactional data cleared"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::verify_password, db, seed::seed_defaults};
    use rust_decimal_macros::dec;
    use sea_orm::PaginatorTrait;

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

    async fn admin(pool: &db::DbPool) -> Option<user::Model> {
        user::Entity::find()
            .filter(user::Column::Username.eq(ADMIN_USERNAME))
            .one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn reset_changes_password_and_reactivates() {
        let pool = seeded().await;
        let mut active: user::ActiveModel = admin(&pool).await.unwrap().into();
        active.is_active = Set(false);
        active.update(&pool).await.unwrap();

        reset_admin_password(&pool, "n3w-secret").await.unwrap();

        let account = admin(&pool).await.unwrap();
        assert!(account.is_active);
        assert!(verify_password("n3w-secret", &account.password_hash));
        assert!(!verify_password("admin123", &account.password_hash));
    }

    #[tokio::test]
    async fn reset_recreates_missing_admin() {
        let pool = seeded().await;
        user::Entity::delete_many().exec(&pool).await.unwrap();

        let created = reset_admin_password(&pool, "recreated").await.unwrap();
        assert_eq!(created.username, ADMIN_USERNAME);
        assert!(admin(&pool).await.is_some());
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let pool = seeded().await;
        let err = reset_admin_password(&pool, "abc").await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn clear_data_keeps_admin_and_master_data() {
        let pool = seeded().await;
        customer::ActiveModel {
            code: Set("ACME".into()),
            name: Set("Acme Metals".into()),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&pool)
        .await
        .unwrap();
        user::ActiveModel {
            username: Set("op1".into()),
            password_hash: Set("x".into()),
            ..Default::default()
        }
        .insert(&pool)
        .await
        .unwrap();
        material::ActiveModel {
            name: Set("Steel sheet 3mm".into()),
            current_stock: Set(dec!(42)),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&pool)
        .await
        .unwrap();

        let report = clear_data(&pool, false).await.unwrap();

        assert_eq!(customer::Entity::find().count(&pool).await.unwrap(), 0);
        assert_eq!(user::Entity::find().count(&pool).await.unwrap(), 1);
        assert!(admin(&pool).await.is_some());
        assert_eq!(report.materials_reset, 1);
        let steel = material::Entity::find().one(&pool).await.unwrap().unwrap();
        assert_eq!(steel.current_stock, Decimal::ZERO);
        assert!(!report.tables.iter().any(|t| t.table == "audit_log"));
        assert_eq!(report.total_deleted(), 2);
    }
}
