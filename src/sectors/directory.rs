//! Static Sector Directory
//!
//! Canonical hospital sectors and their fixed ids (1-12). Lookups are exact
//! on the trimmed name, case included: `"Emergência"` is canonical,
//! `"EMERGÊNCIA"` is not and falls through to the hash assigner.

use crate::models::SectorId;

const CANONICAL_SECTORS: [(&str, u32); 12] = [
    ("Centro Cirúrgico", 1),
    ("UTI", 2),
    ("Radiologia", 3),
    ("Emergência", 4),
    ("Laboratório", 5),
    ("Enfermaria", 6),
    ("Centro de Diagnóstico", 7),
    ("Pediatria", 8),
    ("Maternidade", 9),
    ("Hemodiálise", 10),
    ("Ambulatório", 11),
    ("Farmácia", 12),
];

/// Exact-match lookup on an already trimmed name.
pub fn lookup(trimmed_name: &str) -> Option<SectorId> {
    CANONICAL_SECTORS
        .iter()
        .find(|(name, _)| *name == trimmed_name)
        .map(|&(_, id)| SectorId::from_nonzero(id))
}

/// Canonical display name for an id, if it has one.
pub fn sector_id_to_name(id: SectorId) -> Option<&'static str> {
    CANONICAL_SECTORS
        .iter()
        .find(|&&(_, raw)| raw == id.get())
        .map(|&(name, _)| name)
}

/// Names for the given ids; ids without a canonical name are dropped.
pub fn sector_ids_to_names(ids: &[SectorId]) -> Vec<&'static str> {
    ids.iter().filter_map(|&id| sector_id_to_name(id)).collect()
}

pub fn canonical_sectors() -> impl Iterator<Item = (&'static str, SectorId)> {
    CANONICAL_SECTORS
        .iter()
        .map(|&(name, id)| (name, SectorId::from_nonzero(id)))
}
