//! Fuzzy Reconciliation Engine
//!
//! Assigns a sector id to a free-text name. First hit wins, in this order:
//!
//! 1. exact match in the manual overrides
//! 2. containment (either direction) against the overrides, in table order
//! 3. exact match in the external catalog
//! 4. containment against the catalog, in insertion order
//! 5. [`resolve`](super::resolver::resolve) on the raw name
//!
//! Manual corrections outrank harvested data and exact matches outrank
//! containment. Step 5 always succeeds unless strict mode turns off its
//! hash half.

use serde::Serialize;
use tracing::debug;

use super::catalog::SectorCatalog;
use super::normalize::{self, contains_either_way};
use super::overrides::ManualOverrides;
use super::{directory, resolver};
use crate::models::SectorId;

/// Which step produced the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    OverrideExact,
    OverrideContains,
    CatalogExact,
    CatalogContains,
    Resolver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub id: SectorId,
    pub source: MatchSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationResult {
    Mapped(Resolution),
    Unmapped,
}

impl ReconciliationResult {
    pub fn id(&self) -> Option<SectorId> {
        match self {
            Self::Mapped(r) => Some(r.id),
            Self::Unmapped => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Allow the hash assigner as the last step. Off = strict mode: the
    /// directory is still consulted, names that would only get a synthetic
    /// id come back unmapped.
    pub allow_synthetic: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            allow_synthetic: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SectorReconciler {
    overrides: ManualOverrides,
    options: ReconcileOptions,
}

impl Default for SectorReconciler {
    fn default() -> Self {
        Self::new(ManualOverrides::builtin())
    }
}

impl SectorReconciler {
    pub fn new(overrides: ManualOverrides) -> Self {
        Self {
            overrides,
            options: ReconcileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn overrides(&self) -> &ManualOverrides {
        &self.overrides
    }

    pub fn options(&self) -> ReconcileOptions {
        self.options
    }

    pub fn reconcile(&self, raw_name: &str, catalog: &SectorCatalog) -> Option<SectorId> {
        self.reconcile_detailed(raw_name, catalog).map(|r| r.id)
    }

    pub fn classify(&self, raw_name: &str, catalog: &SectorCatalog) -> ReconciliationResult {
        self.reconcile_detailed(raw_name, catalog)
            .map_or(ReconciliationResult::Unmapped, ReconciliationResult::Mapped)
    }

    pub fn reconcile_detailed(
        &self,
        raw_name: &str,
        catalog: &SectorCatalog,
    ) -> Option<Resolution> {
        let key = normalize::comparison_key(raw_name)?;

        let hit = |id: SectorId, source: MatchSource| {
            debug!(name = %key, id = %id, ?source, "sector reconciled");
            Some(Resolution { id, source })
        };

        if let Some(id) = self.overrides.exact(&key) {
            return hit(id, MatchSource::OverrideExact);
        }

        let override_keys = self
            .overrides
            .entries()
            .iter()
            .map(|e| (e.key.as_str(), e.id));
        if let Some(id) = first_containing(&key, override_keys, "override") {
            return hit(id, MatchSource::OverrideContains);
        }

        if let Some(id) = catalog.get(&key) {
            return hit(id, MatchSource::CatalogExact);
        }

        let catalog_keys = catalog.entries().iter().map(|e| (e.name.as_str(), e.id));
        if let Some(id) = first_containing(&key, catalog_keys, "catalog") {
            return hit(id, MatchSource::CatalogContains);
        }

        let fallback = if self.options.allow_synthetic {
            resolver::resolve(raw_name)
        } else {
            normalize::trimmed(raw_name).and_then(directory::lookup)
        };
        match fallback {
            Some(id) => hit(id, MatchSource::Resolver),
            None => {
                debug!(name = %key, "no canonical, override or catalog match, left unmapped");
                None
            }
        }
    }
}

/// First candidate whose key contains, or is contained by, `key`. When more
/// than one candidate matches the ambiguity is logged; the first one still wins.
fn first_containing<'a, I>(key: &str, candidates: I, table: &'static str) -> Option<SectorId>
where
    I: Iterator<Item = (&'a str, SectorId)>,
{
    let mut matches = candidates.filter(|(candidate, _)| contains_either_way(key, candidate));
    let (first_key, first_id) = matches.next()?;

    let others: Vec<String> = matches
        .map(|(candidate, id)| format!("{candidate}={id}"))
        .collect();
    if !others.is_empty() {
        debug!(
            name = %key,
            table,
            chosen = %format!("{first_key}={first_id}"),
            also_matched = %others.join(", "),
            "ambiguous containment match, keeping first"
        );
    }
    Some(first_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SectorRecord;
    use crate::sectors::hash::hash_id;

    fn id(raw: i64) -> SectorId {
        SectorId::new(raw).unwrap()
    }

    fn catalog(records: &[SectorRecord]) -> SectorCatalog {
        let mut c = SectorCatalog::new();
        c.fold_records(records);
        c
    }

    #[test]
    fn test_blank_input_is_absent() {
        let reconciler = SectorReconciler::default();
        let empty = SectorCatalog::new();
        assert_eq!(reconciler.reconcile("", &empty), None);
        assert_eq!(reconciler.reconcile("  \t ", &empty), None);
        assert_eq!(
            reconciler.classify("   ", &empty),
            ReconciliationResult::Unmapped
        );
    }

    #[test]
    fn test_override_beats_catalog_on_exact_match() {
        let reconciler = SectorReconciler::default();
        let c = catalog(&[SectorRecord::named("CDC").with_id(id(55))]);
        let r = reconciler.reconcile_detailed("cdc", &c).unwrap();
        assert_eq!(r.id, id(7));
        assert_eq!(r.source, MatchSource::OverrideExact);
    }

    #[test]
    fn test_override_containment_input_contains_key() {
        let reconciler = SectorReconciler::default();
        let r = reconciler
            .reconcile_detailed("CDC - Centro de Diagnóstico", &SectorCatalog::new())
            .unwrap();
        assert_eq!(r.id, id(7));
        assert_eq!(r.source, MatchSource::OverrideContains);
    }

    #[test]
    fn test_override_containment_key_contains_input() {
        let reconciler = SectorReconciler::new(ManualOverrides::from_pairs([(
            "UNIDADE DE TERAPIA INTENSIVA ADULTO",
            id(2),
        )]));
        assert_eq!(
            reconciler.reconcile("terapia intensiva", &SectorCatalog::new()),
            Some(id(2))
        );
    }

    #[test]
    fn test_override_table_order_breaks_ties() {
        let first = SectorReconciler::new(ManualOverrides::from_pairs([
            ("UTI", id(2)),
            ("PEDIATRIA", id(8)),
        ]));
        let swapped = SectorReconciler::new(ManualOverrides::from_pairs([
            ("PEDIATRIA", id(8)),
            ("UTI", id(2)),
        ]));
        let empty = SectorCatalog::new();
        assert_eq!(first.reconcile("UTI Pediatria", &empty), Some(id(2)));
        assert_eq!(swapped.reconcile("UTI Pediatria", &empty), Some(id(8)));
    }

    #[test]
    fn test_override_containment_beats_catalog_exact() {
        let reconciler = SectorReconciler::new(ManualOverrides::from_pairs([("CME", id(21))]));
        let c = catalog(&[SectorRecord::named("CME CENTRAL").with_id(id(60))]);
        assert_eq!(reconciler.reconcile("CME Central", &c), Some(id(21)));
    }

    #[test]
    fn test_catalog_exact_then_containment() {
        let reconciler = SectorReconciler::new(ManualOverrides::empty());
        let c = catalog(&[
            SectorRecord::named("Portaria Principal").with_id(id(31)),
            SectorRecord::named("Portaria").with_id(id(32)),
        ]);

        let exact = reconciler.reconcile_detailed("portaria", &c).unwrap();
        assert_eq!((exact.id, exact.source), (id(32), MatchSource::CatalogExact));

        let contained = reconciler
            .reconcile_detailed("Portaria Principal - Bloco B", &c)
            .unwrap();
        assert_eq!(
            (contained.id, contained.source),
            (id(31), MatchSource::CatalogContains)
        );
    }

    #[test]
    fn test_catalog_containment_follows_insertion_order() {
        let reconciler = SectorReconciler::new(ManualOverrides::empty());
        let c = catalog(&[
            SectorRecord::named("Bloco A").with_id(id(41)),
            SectorRecord::named("Ala Norte").with_id(id(42)),
        ]);
        assert_eq!(reconciler.reconcile("Ala Norte / Bloco A", &c), Some(id(41)));
    }

    #[test]
    fn test_falls_back_to_hash() {
        let reconciler = SectorReconciler::default();
        let empty = SectorCatalog::new();
        let r = reconciler
            .reconcile_detailed("Setor Experimental X", &empty)
            .unwrap();
        assert_eq!(r.source, MatchSource::Resolver);
        assert_eq!(r.id, hash_id("SETOR EXPERIMENTAL X"));
        assert_eq!(r.id.get(), 654);
        assert_eq!(reconciler.reconcile("Setor Experimental X", &empty), Some(r.id));
    }

    #[test]
    fn test_fallback_uses_directory_on_raw_name() {
        let reconciler = SectorReconciler::new(ManualOverrides::empty());
        let empty = SectorCatalog::new();
        assert_eq!(reconciler.reconcile(" Maternidade ", &empty), Some(id(9)));
        assert_eq!(
            reconciler.reconcile("MATERNIDADE", &empty),
            Some(hash_id("MATERNIDADE"))
        );
    }

    #[test]
    fn test_strict_mode_leaves_unmatched_names_unmapped() {
        let reconciler = SectorReconciler::default().with_options(ReconcileOptions {
            allow_synthetic: false,
        });
        let empty = SectorCatalog::new();
        assert_eq!(
            reconciler.classify("Setor Experimental X", &empty),
            ReconciliationResult::Unmapped
        );
        assert_eq!(reconciler.reconcile("CDC", &empty), Some(id(7)));
        assert_eq!(reconciler.reconcile("Emergência", &empty), Some(id(4)));
        assert_eq!(reconciler.reconcile("EMERGÊNCIA", &empty), None);
    }
}
