//! Synthetic sector ids for names that have no canonical entry.
//!
//! Multiplier-31 rolling hash over UTF-16 code units with 32-bit signed
//! wraparound, then `abs(acc) % 999 + 1`. The exact arithmetic is kept so ids
//! already persisted by earlier deployments stay valid. Distinct names may
//! collide; collisions are neither detected nor reported.

use crate::models::SectorId;

/// Upper bound (inclusive) of the synthetic id range.
pub const SYNTHETIC_ID_MAX: u32 = 999;

/// Hash an upper-cased, trimmed name into `1..=SYNTHETIC_ID_MAX`.
pub fn hash_id(upper_trimmed: &str) -> SectorId {
    let acc = upper_trimmed.encode_utf16().fold(0i32, |acc, unit| {
        acc.wrapping_shl(5)
            .wrapping_sub(acc)
            .wrapping_add(i32::from(unit))
    });
    let id = i64::from(acc).abs() % i64::from(SYNTHETIC_ID_MAX) + 1;
    SectorId::from_nonzero(id as u32)
}
