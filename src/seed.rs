//! Default reference data: roles, the bootstrap administrator, work centers and processes.
//!
//! Every step looks rows up by their natural key first, so seeding an
//! already-populated database is a no-op.

use crate::{
    auth::{hash_password, rbac::DEFAULT_ROLES, ADMIN_ROLE},
    entities::{process, role, user, work_center},
    errors::ServiceError,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::Serialize;
use tracing::info;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_DEFAULT_PASSWORD: &str = "admin123";
pub const ADMIN_BADGE: &str = "ADMIN001";
pub const ADMIN_FULL_NAME: &str = "System Administrator";

/// (code, name, description)
const WORK_CENTERS: &[(&str, &str, &str)] = &[
    ("LASER", "Laser Cutting", "Laser cutting station"),
    ("BEND", "Bending", "Press brake bending station"),
    ("MACH", "Machining", "CNC machining station"),
    ("WELD", "Welding", "Welding station"),
    ("PAINT", "Painting", "Paint booth"),
    ("GALV", "Galvanizing", "Galvanizing line"),
    ("CLEAN", "Cleaning", "Cleaning and deburring station"),
    ("QC", "Quality Control", "Quality inspection"),
];

/// (code, name, work center code)
const PROCESSES: &[(&str, &str, &str)] = &[
    ("LASER_CUT", "Laser Cut", "LASER"),
    ("DOBLEZ", "Doblez", "BEND"),
    ("MACHINING", "Machining", "MACH"),
    ("CLEANING", "Cleaning", "CLEAN"),
    ("BENDING", "Bending", "BEND"),
    ("ASSEMBLY", "Assembly", "MACH"),
    ("PAINTING", "Painting", "PAINT"),
    ("GALVANIZING", "Galvanizing", "GALV"),
    ("QC_FINAL", "Final Quality Control", "QC"),
];

/// Rows inserted by one seeding pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub roles: usize,
    pub admin_created: bool,
    pub work_centers: usize,
    pub processes: usize,
}

/// Inserts any missing default rows.
pub async fn seed_defaults<C: ConnectionTrait>(db: &C) -> Result<SeedSummary, ServiceError> {
    let summary = SeedSummary {
        roles: seed_roles(db).await?,
        admin_created: seed_admin(db).await?,
        work_centers: seed_work_centers(db).await?,
        processes: seed_processes(db).await?,
    };
    info!(
        roles = summary.roles,
        admin_created = summary.admin_created,
        work_centers = summary.work_centers,
        processes = summary.processes,
        "default data seeded"
    );
    Ok(summary)
}

async fn seed_roles<C: ConnectionTrait>(db: &C) -> Result<usize, ServiceError> {
    let mut inserted = 0;
    for definition in DEFAULT_ROLES.iter() {
        let existing = role::Entity::find()
            .filter(role::Column::Name.eq(definition.name))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }
        role::ActiveModel {
            name: Set(definition.name.to_string()),
            can_view_prices: Set(definition.can_view_prices),
            description: Set(Some(definition.description.to_string())),
            ..Default::default()
        }
        .insert(db)
        .await?;
        inserted += 1;
    }
    Ok(inserted)
}

pub(crate) async fn admin_role<C: ConnectionTrait>(db: &C) -> Result<role::Model, ServiceError> {
    role::Entity::find()
        .filter(role::Column::Name.eq(ADMIN_ROLE))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Role {} not found", ADMIN_ROLE)))
}

async fn seed_admin<C: ConnectionTrait>(db: &C) -> Result<bool, ServiceError> {
    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(ADMIN_USERNAME))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    let role = admin_role(db).await?;
    user::ActiveModel {
        username: Set(ADMIN_USERNAME.to_string()),
        password_hash: Set(hash_password(ADMIN_DEFAULT_PASSWORD)?),
        role_id: Set(Some(role.id)),
        badge_id: Set(Some(ADMIN_BADGE.to_string())),
        full_name: Set(Some(ADMIN_FULL_NAME.to_string())),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(username = ADMIN_USERNAME, "created bootstrap administrator");
    Ok(true)
}

async fn seed_work_centers<C: ConnectionTrait>(db: &C) -> Result<usize, ServiceError> {
    let mut inserted = 0;
    for (code, name, description) in WORK_CENTERS {
        let existing = work_center::Entity::find()
            .filter(work_center::Column::Code.eq(*code))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }
        work_center::ActiveModel {
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;
        inserted += 1;
    }
    Ok(inserted)
}

async fn seed_processes<C: ConnectionTrait>(db: &C) -> Result<usize, ServiceError> {
    let mut inserted = 0;
    for (code, name, center_code) in PROCESSES {
        let existing = process::Entity::find()
            .filter(process::Column::Code.eq(*code))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }
        let center = work_center::Entity::find()
            .filter(work_center::Column::Code.eq(*center_code))
            .one(db)
            .await?;
        process::ActiveModel {
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            work_center_id: Set(center.map(|c| c.id)),
            ..Default::default()
        }
        .insert(db)
        .await?;
        inserted += 1;
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::verify_password, db};
    use sea_orm::PaginatorTrait;

    async fn migrated() -> db::DbPool {
        let pool = db::establish_connection_with_config(&db::DbConfig {
            url: "sqlite::memory:".into(),
            max_connections: 1,
            ..Default::default()
        })
        .await
        .unwrap();
        db::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn seeds_everything_once() {
        let pool = migrated().await;

        let first = seed_defaults(&pool).await.unwrap();
        assert_eq!(first.roles, DEFAULT_ROLES.len());
        assert!(first.admin_created);
        assert_eq!(first.work_centers, WORK_CENTERS.len());
        assert_eq!(first.processes, PROCESSES.len());

        let second = seed_defaults(&pool).await.unwrap();
        assert_eq!(second, SeedSummary::default());
        assert_eq!(
            role::Entity::find().count(&pool).await.unwrap() as usize,
            DEFAULT_ROLES.len()
        );
    }

    #[tokio::test]
    async fn admin_can_log_in_with_default_password() {
        let pool = migrated().await;
        seed_defaults(&pool).await.unwrap();

        let admin = user::Entity::find()
            .filter(user::Column::Username.eq(ADMIN_USERNAME))
            .one(&pool)
            .await
            .unwrap()
            .unwrap();
        assert!(verify_password(ADMIN_DEFAULT_PASSWORD, &admin.password_hash));
        assert_eq!(admin.badge_id.as_deref(), Some(ADMIN_BADGE));
        assert_eq!(admin.role_id, Some(admin_role(&pool).await.unwrap().id));
    }

    #[tokio::test]
    async fn processes_point_at_their_work_centers() {
        let pool = migrated().await;
        seed_defaults(&pool).await.unwrap();

        let qc = work_center::Entity::find()
            .filter(work_center::Column::Code.eq("QC"))
            .one(&pool)
            .await
            .unwrap()
            .unwrap();
        let final_qc = process::Entity::find()
            .filter(process::Column::Code.eq("QC_FINAL"))
            .one(&pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(final_qc.work_center_id, Some(qc.id));
    }
}
