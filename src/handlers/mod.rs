pub mod audit;
pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod exports;
pub mod health;
pub mod materials;
pub mod part_numbers;
pub mod production_orders;
pub mod qr_scanner;
pub mod quality;
pub mod sales_orders;
pub mod shipments;
pub mod users;
pub mod work_centers;

use crate::db::DbPool;
use crate::services::{
    audit::AuditService, customers::CustomerService, dashboard::DashboardService,
    exports::ExportService, inventory::InventoryService, part_numbers::PartNumberService,
    production_orders::ProductionOrderService, quality::QualityService,
    sales_orders::SalesOrderService, shipments::ShipmentService, shop_floor::ShopFloorService,
    users::UserService, work_centers::WorkCenterService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<UserService>,
    pub customers: Arc<CustomerService>,
    pub inventory: Arc<InventoryService>,
    pub work_centers: Arc<WorkCenterService>,
    pub part_numbers: Arc<PartNumberService>,
    pub sales_orders: Arc<SalesOrderService>,
    pub production_orders: Arc<ProductionOrderService>,
    pub shop_floor: Arc<ShopFloorService>,
    pub quality: Arc<QualityService>,
    pub shipments: Arc<ShipmentService>,
    pub dashboard: Arc<DashboardService>,
    pub exports: Arc<ExportService>,
    pub audit: Arc<AuditService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            users: Arc::new(UserService::new(db_pool.clone())),
            customers: Arc::new(CustomerService::new(db_pool.clone())),
            inventory: Arc::new(InventoryService::new(db_pool.clone())),
            work_centers: Arc::new(WorkCenterService::new(db_pool.clone())),
            part_numbers: Arc::new(PartNumberService::new(db_pool.clone())),
            sales_orders: Arc::new(SalesOrderService::new(db_pool.clone())),
            production_orders: Arc::new(ProductionOrderService::new(db_pool.clone())),
            shop_floor: Arc::new(ShopFloorService::new(db_pool.clone())),
            quality: Arc::new(QualityService::new(db_pool.clone())),
            shipments: Arc::new(ShipmentService::new(db_pool.clone())),
            dashboard: Arc::new(DashboardService::new(db_pool.clone())),
            exports: Arc::new(ExportService::new(db_pool.clone())),
            audit: Arc::new(AuditService::new(db_pool)),
        }
    }
}
