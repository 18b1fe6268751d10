//! Investment sector sync
//!
//! Every write path that stores a sector id on an investment goes through the
//! shared reconciler, so the inventory and the investment records cannot
//! drift apart on which id a sector name gets.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::sectors::{SectorCatalog, SectorReconciler};
use crate::storage::{Investment, InvestmentStore, NewInvestment};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillSummary {
    pub scanned: usize,
    pub updated: usize,
    /// Rows with no usable sector name, or unmapped in strict mode.
    pub unresolved: usize,
}

pub struct SectorSync<'a> {
    store: &'a InvestmentStore,
    reconciler: &'a SectorReconciler,
}

impl<'a> SectorSync<'a> {
    pub fn new(store: &'a InvestmentStore, reconciler: &'a SectorReconciler) -> Self {
        Self { store, reconciler }
    }

    /// Persist a new investment with its sector id resolved inline.
    pub fn create_investment(
        &self,
        new: NewInvestment,
        catalog: &SectorCatalog,
    ) -> Result<Investment> {
        let sector_id = new
            .sector_name
            .as_deref()
            .and_then(|name| self.reconciler.reconcile(name, catalog));
        let investment = self.store.create(new, sector_id)?;
        debug!(
            id = %investment.id,
            sector = ?investment.sector_name,
            sector_id = ?investment.sector_id.map(|s| s.get()),
            "investment created"
        );
        Ok(investment)
    }

    /// Fill `sector_id` on every stored investment that lacks one.
    pub fn backfill(&self, catalog: &SectorCatalog) -> Result<BackfillSummary> {
        let pending = self.store.list_missing_sector()?;
        let mut summary = BackfillSummary {
            scanned: pending.len(),
            ..Default::default()
        };

        for mut investment in pending {
            let resolved = investment
                .sector_name
                .as_deref()
                .and_then(|name| self.reconciler.reconcile(name, catalog));
            let Some(sector_id) = resolved else {
                summary.unresolved += 1;
                continue;
            };

            investment.sector_id = Some(sector_id);
            if self.store.update(&mut investment)? {
                summary.updated += 1;
            } else {
                warn!(id = %investment.id, "investment vanished during backfill");
            }
        }

        info!(
            scanned = summary.scanned,
            updated = summary.updated,
            unresolved = summary.unresolved,
            "🔁 investment sector backfill finished"
        );
        Ok(summary)
    }
}
