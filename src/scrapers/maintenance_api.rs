//! Maintenance-management REST API client
//!
//! Read-only: pages through the equipment inventory and the work-order
//! summary and keeps only the sector fields.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{ListPayload, MaintenanceSource};
use crate::models::{ListFilter, SectorRecord};

const EQUIPMENT_PATH: &str = "/equipments";
const WORK_ORDER_SUMMARY_PATH: &str = "/work-orders/summary";
const DEFAULT_PAGE_SIZE: u32 = 500;
const DEFAULT_MAX_PAGES: u32 = 50;

#[derive(Clone)]
pub struct MaintenanceApiClient {
    client: Client,
    base_url: String,
    page_size: u32,
    max_pages: u32,
}

impl MaintenanceApiClient {
    pub fn new(base_url: &str, api_token: Option<String>, timeout: Duration) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = api_token {
            headers.insert(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", token)
                    .parse()
                    .context("Invalid maintenance API token")?,
            );
        }

        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .user_agent("maintdash/0.1 (sector sync)")
            .default_headers(headers)
            .build()
            .context("Failed to build MaintenanceApiClient")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        })
    }

    pub fn with_paging(mut self, page_size: u32, max_pages: u32) -> Self {
        self.page_size = page_size.max(1);
        self.max_pages = max_pages.max(1);
        self
    }

    #[inline]
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn query(&self, filter: &ListFilter, offset: u32) -> Vec<(&'static str, String)> {
        let mut qp = Vec::with_capacity(3);
        qp.push(("limit", self.page_size.to_string()));
        qp.push(("offset", offset.to_string()));
        if let Some(sector) = filter.sector_name.as_deref().map(str::trim) {
            if !sector.is_empty() {
                qp.push(("sector", sector.to_string()));
            }
        }
        qp
    }

    async fn get_page(
        &self,
        path: &str,
        filter: &ListFilter,
        offset: u32,
    ) -> Result<Vec<SectorRecord>> {
        let resp = self
            .client
            .get(self.url(path))
            .query(&self.query(filter, offset))
            .send()
            .await
            .with_context(|| format!("GET {} failed", path))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("GET {} {}: {}", path, status, text));
        }

        let payload = resp
            .json::<ListPayload>()
            .await
            .with_context(|| format!("Failed to parse {} response", path))?;
        Ok(payload.into_records(path))
    }

    /// Fetch every page of a listing, stopping at a short page, the caller's
    /// limit, or `max_pages`.
    async fn get_all(&self, path: &str, filter: &ListFilter) -> Result<Vec<SectorRecord>> {
        let cap = filter.limit.unwrap_or(usize::MAX);
        let mut all = Vec::new();

        for page in 0..self.max_pages {
            let offset = page.saturating_mul(self.page_size);
            let batch = self.get_page(path, filter, offset).await?;
            let count = batch.len();
            all.extend(batch);

            debug!(path, page, count, total = all.len(), "fetched listing page");
            if count < self.page_size as usize || all.len() >= cap {
                break;
            }
        }

        all.truncate(cap);
        Ok(all)
    }
}

#[async_trait]
impl MaintenanceSource for MaintenanceApiClient {
    fn name(&self) -> &str {
        "maintenance-api"
    }

    async fn list_equipment(&self, filter: &ListFilter) -> Result<Vec<SectorRecord>> {
        self.get_all(EQUIPMENT_PATH, filter).await
    }

    async fn list_work_orders_summary(&self, filter: &ListFilter) -> Result<Vec<SectorRecord>> {
        self.get_all(WORK_ORDER_SUMMARY_PATH, filter).await
    }
}
