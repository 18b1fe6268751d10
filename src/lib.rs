//! Maintenance dashboard backend library
//!
//! Sector identity resolution for the hospital maintenance dashboard: maps the
//! free-text sector names found in equipment, work orders, investments and
//! legacy spreadsheets onto one stable sector id space.

pub mod models;
pub mod scrapers;
pub mod sectors;
pub mod storage;
pub mod sync;

pub use models::{Config, ListFilter, SectorId, SectorRecord};
pub use sectors::{
    reconcile_all, resolve, resolve_from_item, sector_id_to_name, sector_ids_to_names,
    ManualOverrides, ReconciliationReport, SectorCatalog, SectorReconciler,
};
