//! External maintenance data sources.
//!
//! The resolver only ever reads two listings from the outside world: the
//! equipment inventory and the work-order summary. Both yield
//! [`SectorRecord`]s; everything else in the payloads is ignored.

pub mod json_file;
pub mod maintenance_api;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::{json_kind, Config, ListFilter, SectorRecord};
use crate::sectors::normalize;

pub use json_file::JsonFileSource;
pub use maintenance_api::MaintenanceApiClient;

#[async_trait]
pub trait MaintenanceSource: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    async fn list_equipment(&self, filter: &ListFilter) -> Result<Vec<SectorRecord>>;

    async fn list_work_orders_summary(&self, filter: &ListFilter) -> Result<Vec<SectorRecord>>;
}

/// Listing payloads come either as a bare array or wrapped in `data`.
///
/// Rows stay raw JSON until [`ListPayload::into_records`] so one odd row
/// cannot sink the whole listing.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListPayload {
    Bare(Vec<Value>),
    Wrapped {
        #[serde(alias = "items", alias = "results")]
        data: Vec<Value>,
    },
}

impl ListPayload {
    /// Parse each row on its own, skipping rows that are not objects.
    pub(crate) fn into_records(self, origin: &str) -> Vec<SectorRecord> {
        let rows = match self {
            Self::Bare(rows) | Self::Wrapped { data: rows } => rows,
        };

        let total = rows.len();
        let records: Vec<SectorRecord> = rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| {
                let record = SectorRecord::from_json(row);
                if record.is_none() {
                    debug!(origin, index, found = json_kind(row), "skipping listing row");
                }
                record
            })
            .collect();

        let skipped = total - records.len();
        if skipped > 0 {
            warn!(origin, skipped, total, "skipped malformed listing rows");
        }
        records
    }
}

/// Client-side filtering for sources that cannot filter themselves.
pub(crate) fn apply_filter(records: Vec<SectorRecord>, filter: &ListFilter) -> Vec<SectorRecord> {
    let needle = filter
        .sector_name
        .as_deref()
        .and_then(normalize::comparison_key);
    let limit = filter.limit.unwrap_or(usize::MAX);

    records
        .into_iter()
        .filter(|r| match &needle {
            Some(needle) => r
                .sector_name
                .as_deref()
                .map(normalize::normalize)
                .is_some_and(|name| name.contains(needle.as_str())),
            None => true,
        })
        .take(limit)
        .collect()
}

/// Pick the configured source: the REST API when a URL is set, otherwise the
/// JSON exports.
pub fn source_from_config(config: &Config) -> Result<Arc<dyn MaintenanceSource>> {
    if let Some(url) = &config.maintenance_api_url {
        let client = MaintenanceApiClient::new(
            url,
            config.maintenance_api_token.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )?
        .with_paging(config.page_size, config.max_pages);
        info!(url = %url, "using maintenance API source");
        return Ok(Arc::new(client));
    }

    if config.equipment_file.is_some() || config.work_order_file.is_some() {
        let source =
            JsonFileSource::new(config.equipment_file.clone(), config.work_order_file.clone());
        info!(
            equipment = ?config.equipment_file,
            work_orders = ?config.work_order_file,
            "using JSON export source"
        );
        return Ok(Arc::new(source));
    }

    bail!(
        "no maintenance source configured: set MAINTENANCE_API_URL or \
         MAINTENANCE_EQUIPMENT_FILE / MAINTENANCE_WORK_ORDER_FILE"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SectorId;

    fn records(names: &[&str]) -> Vec<SectorRecord> {
        names.iter().map(|n| SectorRecord::named(*n)).collect()
    }

    #[test]
    fn test_payload_shapes() {
        let bare: ListPayload = serde_json::from_str(r#"[{"setor": "UTI"}]"#).unwrap();
        assert_eq!(bare.into_records("test").len(), 1);

        let wrapped: ListPayload =
            serde_json::from_str(r#"{"data": [{"setor": "UTI"}, {"setor": "CDC"}], "total": 2}"#)
                .unwrap();
        assert_eq!(wrapped.into_records("test").len(), 2);

        let items: ListPayload = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(items.into_records("test").is_empty());
    }

    #[test]
    fn test_odd_rows_do_not_sink_the_listing() {
        let payload: ListPayload = serde_json::from_str(
            r#"{"data": [
                {"setor": "CME", "setor_id": 21},
                {"setor": "UTI 1", "sectorName": "UTI 1"},
                "not a row",
                {"sector": {"id": 3, "name": "Radiologia"}},
                null,
                {"setor": 404},
                {"setor": "Portaria", "setor_id": 31}
            ]}"#,
        )
        .unwrap();

        let records = payload.into_records("equipment");
        assert_eq!(records.len(), 5);
        assert_eq!(records[0], SectorRecord::named("CME").with_id(SectorId::new(21).unwrap()));
        assert_eq!(records[1].sector_name.as_deref(), Some("UTI 1"));
        assert_eq!(records[2].sector_id, SectorId::new(3));
        assert_eq!(records[3].sector_name, None);
        assert_eq!(records[4].sector_name.as_deref(), Some("Portaria"));
    }

    #[test]
    fn test_filter_by_name_and_limit() {
        let all = records(&["UTI 1", "Radiologia", "uti 2", "UTI Neo"]);
        let filter = ListFilter {
            sector_name: Some(" uti ".into()),
            limit: Some(2),
        };
        let kept = apply_filter(all, &filter);
        let names: Vec<_> = kept.iter().filter_map(|r| r.sector_name.as_deref()).collect();
        assert_eq!(names, vec!["UTI 1", "uti 2"]);
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        let all = records(&["A", "B", "C"]);
        assert_eq!(apply_filter(all, &ListFilter::default()).len(), 3);
    }

    #[test]
    fn test_unconfigured_source_is_an_error() {
        let config = Config {
            database_path: ":memory:".into(),
            maintenance_api_url: None,
            maintenance_api_token: None,
            equipment_file: None,
            work_order_file: None,
            http_timeout_secs: 30,
            page_size: 500,
            max_pages: 50,
            overrides_path: None,
            catalog_ttl_secs: 0,
        };
        assert!(source_from_config(&config).is_err());
    }
}
