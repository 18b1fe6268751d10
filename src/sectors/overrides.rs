//! Manual sector overrides
//!
//! Hand-authored corrections for names the external catalog or the canonical
//! directory get wrong or do not know. Several keys may share one id.
//!
//! Entry order is significant: containment matching walks the table top to
//! bottom and the first hit wins, so reordering entries changes the result
//! for names that match more than one key. Files loaded with
//! [`ManualOverrides::load`] keep their on-disk order.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use super::normalize;
use crate::models::SectorId;

/// Built-in table, used when no overrides file is configured.
const BUILTIN_OVERRIDES: &[(&str, u32)] = &[
    ("CDC", 7),
    ("CENTRO DE DIAGNOSTICO", 7),
    ("UTI ADULTO", 2),
    ("UTI 1", 2),
    ("UTI 2", 2),
    ("PRONTO SOCORRO", 4),
    ("PRONTO ATENDIMENTO", 4),
    ("BLOCO CIRURGICO", 1),
    ("RAIO X", 3),
    ("IMAGEM", 3),
    ("LABORATORIO", 5),
    ("HEMODIALISE", 10),
    ("FARMACIA", 12),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideEntry {
    /// Upper-cased, trimmed key.
    pub key: String,
    pub id: SectorId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualOverrides {
    entries: Vec<OverrideEntry>,
}

/// On-disk layout:
///
/// ```toml
/// [[override]]
/// sector = "Centro de Diagnóstico"   # informational
/// id = 7
/// aliases = ["CDC", "Centro de Diagnostico"]
/// ```
#[derive(Debug, Deserialize)]
struct OverridesFile {
    #[serde(default, rename = "override")]
    groups: Vec<OverrideGroup>,
}

#[derive(Debug, Deserialize)]
struct OverrideGroup {
    #[serde(default)]
    sector: Option<String>,
    id: i64,
    #[serde(default)]
    aliases: Vec<String>,
}

impl ManualOverrides {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        Self::from_pairs(
            BUILTIN_OVERRIDES
                .iter()
                .map(|&(key, id)| (key, SectorId::from_nonzero(id))),
        )
    }

    /// Build from `(name, id)` pairs in priority order. Blank names are
    /// skipped; a repeated key keeps its first id.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, SectorId)>,
        K: AsRef<str>,
    {
        let mut table = Self::default();
        for (name, id) in pairs {
            table.push(name.as_ref(), id);
        }
        table
    }

    fn push(&mut self, name: &str, id: SectorId) -> bool {
        let Some(key) = normalize::comparison_key(name) else {
            return false;
        };
        if let Some(existing) = self.entries.iter().find(|e| e.key == key) {
            if existing.id != id {
                warn!(
                    key = %key,
                    kept = %existing.id,
                    ignored = %id,
                    "duplicate override key, keeping the first id"
                );
            }
            return false;
        }
        self.entries.push(OverrideEntry { key, id });
        true
    }

    /// Load from TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read overrides file {}", path.display()))?;
        let table = Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid overrides file {}", path.display()))?;
        debug!(
            path = %path.display(),
            entries = table.len(),
            "loaded manual sector overrides"
        );
        Ok(table)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: OverridesFile = toml::from_str(contents).context("Failed to parse TOML")?;

        let mut table = Self::default();
        for group in file.groups {
            let label = group.sector.as_deref().unwrap_or("<unnamed>");
            let Some(id) = SectorId::new(group.id) else {
                bail!("override group {} has invalid id {}", label, group.id);
            };
            if group.aliases.is_empty() {
                warn!(sector = label, id = %id, "override group has no aliases");
            }
            for alias in &group.aliases {
                if !table.push(alias, id) && alias.trim().is_empty() {
                    warn!(sector = label, "blank override alias skipped");
                }
            }
        }
        Ok(table)
    }

    /// Exact match on a comparison key.
    pub fn exact(&self, key: &str) -> Option<SectorId> {
        self.entries.iter().find(|e| e.key == key).map(|e| e.id)
    }

    /// Entries in match order.
    pub fn entries(&self) -> &[OverrideEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
