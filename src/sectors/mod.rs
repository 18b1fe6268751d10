//! Sector identity resolution.
//!
//! Maps free-text sector names from the maintenance API, the local database
//! and hand-maintained spreadsheets onto one integer id space. Canonical ids
//! (1-12) come from [`directory`]; any other name gets a synthetic id in
//! 1-999 from [`hash`]. Synthetic ids are stable per name but may collide
//! between distinct names, which silently merges those sectors in reports.

pub mod catalog;
pub mod directory;
pub mod hash;
pub mod normalize;
pub mod overrides;
pub mod reconcile;
pub mod report;
pub mod resolver;

pub use catalog::{build_catalog, harvest, CachedCatalog, CatalogEntry, Harvest, SectorCatalog};
pub use directory::{sector_id_to_name, sector_ids_to_names};
pub use overrides::ManualOverrides;
pub use reconcile::{
    MatchSource, ReconcileOptions, ReconciliationResult, Resolution, SectorReconciler,
};
pub use report::{reconcile_all, reconcile_records, MappedSector, ReconciliationReport};
pub use resolver::{resolve, resolve_from_item};
