//! Hand-maintained exports as a source
//!
//! Spreadsheet dumps and mock files saved as JSON arrays (or `{"data": [...]}`)
//! of equipment / work-order rows. A listing without a configured file is
//! simply empty; a configured file that cannot be read is an error.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{apply_filter, ListPayload, MaintenanceSource};
use crate::models::{ListFilter, SectorRecord};

#[derive(Debug, Clone, Default)]
pub struct JsonFileSource {
    equipment_path: Option<PathBuf>,
    work_order_path: Option<PathBuf>,
}

impl JsonFileSource {
    pub fn new(equipment_path: Option<PathBuf>, work_order_path: Option<PathBuf>) -> Self {
        Self {
            equipment_path,
            work_order_path,
        }
    }
}

/// Read a JSON export of sector-bearing rows.
pub async fn read_records(path: &Path) -> Result<Vec<SectorRecord>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let payload: ListPayload = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let records = payload.into_records(&path.display().to_string());
    debug!(path = %path.display(), records = records.len(), "read JSON export");
    Ok(records)
}

async fn read_optional(path: Option<&Path>, filter: &ListFilter) -> Result<Vec<SectorRecord>> {
    match path {
        Some(path) => Ok(apply_filter(read_records(path).await?, filter)),
        None => Ok(Vec::new()),
    }
}

#[async_trait]
impl MaintenanceSource for JsonFileSource {
    fn name(&self) -> &str {
        "json-export"
    }

    async fn list_equipment(&self, filter: &ListFilter) -> Result<Vec<SectorRecord>> {
        read_optional(self.equipment_path.as_deref(), filter).await
    }

    async fn list_work_orders_summary(&self, filter: &ListFilter) -> Result<Vec<SectorRecord>> {
        read_optional(self.work_order_path.as_deref(), filter).await
    }
}
