//! Sector Identity Resolver
//!
//! Single source of truth for "what id does this name have": canonical
//! directory first, synthetic hash second. Every other component in the crate
//! falls back to [`resolve`]; none of them reimplements the chain.

use super::{directory, hash, normalize};
use crate::models::{SectorId, SectorRecord};

/// Resolve a raw sector name. `None` only for empty or whitespace-only input.
pub fn resolve(raw_name: &str) -> Option<SectorId> {
    let trimmed = normalize::trimmed(raw_name)?;
    if let Some(id) = directory::lookup(trimmed) {
        return Some(id);
    }
    Some(hash::hash_id(&trimmed.to_uppercase()))
}

/// An explicit id on the record is trusted verbatim; otherwise the name is
/// resolved. `None` when the record carries neither.
pub fn resolve_from_item(item: &SectorRecord) -> Option<SectorId> {
    item.sector_id
        .or_else(|| item.sector_name.as_deref().and_then(resolve))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_precedence() {
        for (name, id) in directory::canonical_sectors() {
            assert_eq!(resolve(name), Some(id));
            assert_eq!(resolve(&format!("  {name} ")), Some(id));
        }
    }

    #[test]
    fn test_case_variant_of_canonical_name_takes_hash_path() {
        assert_eq!(resolve("Emergência").map(SectorId::get), Some(4));
        let lowered = resolve(" emergência ").unwrap();
        assert_eq!(lowered, hash::hash_id("EMERGÊNCIA"));
        assert_ne!(lowered.get(), 4);
    }

    #[test]
    fn test_normalized_equal_names_resolve_equal() {
        let variants = ["UTI 1", "uti 1", " UTI 1 ", "\tUti 1"];
        let ids: Vec<_> = variants.iter().map(|v| resolve(v)).collect();
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(ids[0].map(SectorId::get), Some(78));
    }

    #[test]
    fn test_blank_names_have_no_id() {
        assert_eq!(resolve(""), None);
        assert_eq!(resolve("   "), None);
    }

    #[test]
    fn test_resolve_is_total_for_odd_input() {
        let long = "setor ".repeat(20_000);
        for s in ["?", "😀", "Ω≈ç√", "a\0b", long.as_str()] {
            let id = resolve(s).unwrap().get();
            assert!((1..=hash::SYNTHETIC_ID_MAX).contains(&id));
        }
    }

    #[test]
    fn test_explicit_id_wins_over_name() {
        let record = SectorRecord::named("Radiologia").with_id(SectorId::new(42).unwrap());
        assert_eq!(resolve_from_item(&record).map(SectorId::get), Some(42));
    }

    #[test]
    fn test_item_without_id_uses_name() {
        let record = SectorRecord::named("Radiologia");
        assert_eq!(resolve_from_item(&record).map(SectorId::get), Some(3));
    }

    #[test]
    fn test_item_without_anything_has_no_id() {
        assert_eq!(resolve_from_item(&SectorRecord::default()), None);
        assert_eq!(resolve_from_item(&SectorRecord::named("  ")), None);
    }
}
