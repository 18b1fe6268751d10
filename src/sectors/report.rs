//! Bulk Reconciliation Reporter
//!
//! Runs the reconciler over a batch of records, one verdict per distinct
//! sector name. A name is reported once, under the spelling of its first
//! occurrence; output order follows first occurrence in the input.

use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

use super::catalog::{build_catalog, CatalogEntry, SectorCatalog};
use super::normalize;
use super::reconcile::{MatchSource, ReconciliationResult, SectorReconciler};
use crate::models::{ListFilter, SectorId, SectorRecord};
use crate::scrapers::MaintenanceSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedSector {
    pub name: String,
    pub id: SectorId,
    pub source: MatchSource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub mapped: Vec<MappedSector>,
    pub unmapped: Vec<String>,
    pub all_catalog_entries: Vec<CatalogEntry>,
}

impl ReconciliationReport {
    /// Ids by name, ignoring how they were found.
    pub fn mapped_pairs(&self) -> Vec<(&str, SectorId)> {
        self.mapped.iter().map(|m| (m.name.as_str(), m.id)).collect()
    }

    pub fn synthetic_count(&self) -> usize {
        self.mapped
            .iter()
            .filter(|m| m.source == MatchSource::Resolver)
            .count()
    }
}

/// Reconcile `records` against an already built catalog.
pub fn reconcile_records<'a, I>(
    reconciler: &SectorReconciler,
    catalog: &SectorCatalog,
    records: I,
) -> ReconciliationReport
where
    I: IntoIterator<Item = &'a SectorRecord>,
{
    let mut seen = HashSet::new();
    let mut report = ReconciliationReport {
        all_catalog_entries: catalog.entries().to_vec(),
        ..Default::default()
    };

    for record in records {
        let Some(name) = record.trimmed_name() else {
            continue;
        };
        if !seen.insert(normalize::normalize(name)) {
            continue;
        }
        match reconciler.classify(name, catalog) {
            ReconciliationResult::Mapped(resolution) => report.mapped.push(MappedSector {
                name: name.to_string(),
                id: resolution.id,
                source: resolution.source,
            }),
            ReconciliationResult::Unmapped => report.unmapped.push(name.to_string()),
        }
    }

    report
}

/// Build the catalog once from `source`, then reconcile every record.
pub async fn reconcile_all(
    reconciler: &SectorReconciler,
    source: &dyn MaintenanceSource,
    filter: &ListFilter,
    records: &[SectorRecord],
) -> ReconciliationReport {
    let catalog = build_catalog(source, filter).await;
    let report = reconcile_records(reconciler, &catalog, records);
    info!(
        records = records.len(),
        mapped = report.mapped.len(),
        synthetic = report.synthetic_count(),
        unmapped = report.unmapped.len(),
        catalog = report.all_catalog_entries.len(),
        "✅ sector reconciliation finished"
    );
    report
}
