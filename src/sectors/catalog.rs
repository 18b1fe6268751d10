//! External Sector Catalog
//!
//! Name -> id table harvested from whatever the maintenance system returns
//! right now. Equipment is folded before work orders and the first record for
//! a name wins, so the equipment inventory is authoritative when the two
//! disagree. The fold order is fixed regardless of which listing arrives first.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{normalize, resolver};
use crate::models::{ListFilter, SectorId, SectorRecord};
use crate::scrapers::MaintenanceSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Upper-cased, trimmed sector name.
    pub name: String,
    pub id: SectorId,
}

/// Insertion-ordered catalog keyed by comparison key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectorCatalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl SectorCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record in. Returns `true` if it created a new entry; records
    /// with a blank name or a name already present are ignored.
    pub fn fold_record(&mut self, record: &SectorRecord) -> bool {
        let Some(key) = record.sector_name.as_deref().and_then(normalize::comparison_key) else {
            return false;
        };
        if let Some(&pos) = self.index.get(&key) {
            if let Some(explicit) = record.sector_id {
                let kept = self.entries[pos].id;
                if explicit != kept {
                    debug!(
                        name = %key,
                        kept = %kept,
                        ignored = %explicit,
                        "conflicting sector id for already catalogued name"
                    );
                }
            }
            return false;
        }
        let Some(id) = resolver::resolve_from_item(record) else {
            return false;
        };
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(CatalogEntry { name: key, id });
        true
    }

    pub fn fold_records<'a, I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = &'a SectorRecord>,
    {
        records
            .into_iter()
            .filter(|r| self.fold_record(r))
            .count()
    }

    /// Exact lookup on a comparison key.
    pub fn get(&self, key: &str) -> Option<SectorId> {
        self.index.get(key).map(|&pos| self.entries[pos].id)
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Raw listings pulled from a source, failures already replaced by empty sets.
#[derive(Debug, Clone, Default)]
pub struct Harvest {
    pub equipment: Vec<SectorRecord>,
    pub work_orders: Vec<SectorRecord>,
    pub equipment_failed: bool,
    pub work_orders_failed: bool,
}

impl Harvest {
    /// Equipment first, then work orders.
    pub fn records(&self) -> impl Iterator<Item = &SectorRecord> {
        self.equipment.iter().chain(self.work_orders.iter())
    }

    pub fn to_catalog(&self) -> SectorCatalog {
        let mut catalog = SectorCatalog::new();
        catalog.fold_records(self.records());
        catalog
    }
}

/// Query both listings concurrently. A failing listing is logged and
/// contributes nothing; the other half is still used.
pub async fn harvest(source: &dyn MaintenanceSource, filter: &ListFilter) -> Harvest {
    let (equipment, work_orders) = tokio::join!(
        source.list_equipment(filter),
        source.list_work_orders_summary(filter)
    );

    let mut harvest = Harvest::default();
    match equipment {
        Ok(records) => harvest.equipment = records,
        Err(e) => {
            warn!(
                source = source.name(),
                error = %format!("{e:#}"),
                "⚠️ equipment listing failed, catalog built without it"
            );
            harvest.equipment_failed = true;
        }
    }
    match work_orders {
        Ok(records) => harvest.work_orders = records,
        Err(e) => {
            warn!(
                source = source.name(),
                error = %format!("{e:#}"),
                "⚠️ work-order listing failed, catalog built without it"
            );
            harvest.work_orders_failed = true;
        }
    }
    harvest
}

pub async fn build_catalog(source: &dyn MaintenanceSource, filter: &ListFilter) -> SectorCatalog {
    let harvest = harvest(source, filter).await;
    let catalog = harvest.to_catalog();
    info!(
        source = source.name(),
        equipment = harvest.equipment.len(),
        work_orders = harvest.work_orders.len(),
        sectors = catalog.len(),
        "📚 sector catalog built"
    );
    catalog
}

/// Keeps the last built catalog for `ttl`. A zero TTL rebuilds on every call.
pub struct CachedCatalog {
    source: Arc<dyn MaintenanceSource>,
    filter: ListFilter,
    ttl: Duration,
    slot: RwLock<Option<(Instant, Arc<SectorCatalog>)>>,
}

impl CachedCatalog {
    pub fn new(source: Arc<dyn MaintenanceSource>, filter: ListFilter, ttl: Duration) -> Self {
        Self {
            source,
            filter,
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Arc<SectorCatalog> {
        if let Some((built_at, catalog)) = self.slot.read().as_ref() {
            if built_at.elapsed() < self.ttl {
                return Arc::clone(catalog);
            }
        }

        let catalog = Arc::new(build_catalog(self.source.as_ref(), &self.filter).await);
        if !self.ttl.is_zero() {
            *self.slot.write() = Some((Instant::now(), Arc::clone(&catalog)));
        }
        catalog
    }

    pub fn invalidate(&self) {
        *self.slot.write() = None;
    }
}
