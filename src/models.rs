use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// Positive sector identifier. Zero is never produced and never accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct SectorId(u32);

impl SectorId {
    /// Returns `None` for zero, negative or out-of-range values.
    pub fn new(raw: i64) -> Option<Self> {
        u32::try_from(raw).ok().filter(|&v| v > 0).map(Self)
    }

    /// Caller guarantees `raw > 0`.
    pub(crate) const fn from_nonzero(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for SectorId {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| format!("invalid sector id {}", raw))
    }
}

impl From<SectorId> for u32 {
    fn from(id: SectorId) -> Self {
        id.0
    }
}

impl fmt::Display for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The part of an equipment / work-order / legacy row this crate cares about.
///
/// External payloads name these fields inconsistently; the keys below cover
/// the variants seen across the maintenance API and the spreadsheet exports.
/// Ids that are missing, zero, negative or unparsable are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectorRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector_id: Option<SectorId>,
}

/// Name keys in precedence order.
const NAME_KEYS: [&str; 5] = ["sector_name", "sectorName", "sector", "setor", "setor_nome"];
/// Id keys in precedence order.
const ID_KEYS: [&str; 4] = ["sector_id", "sectorId", "setor_id", "setorId"];

impl SectorRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            sector_name: Some(name.into()),
            sector_id: None,
        }
    }

    pub fn with_id(mut self, id: SectorId) -> Self {
        self.sector_id = Some(id);
        self
    }

    /// Trimmed sector name, `None` when missing or blank.
    pub fn trimmed_name(&self) -> Option<&str> {
        self.sector_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Pull the sector fields out of one JSON row. `None` when the row is not
    /// an object; unusable field values only make that field absent.
    pub fn from_json(row: &Value) -> Option<Self> {
        let fields = row.as_object()?;

        let sector_name = NAME_KEYS
            .iter()
            .filter_map(|key| fields.get(*key))
            .find_map(lenient_sector_name);

        // `{"sector": {"id": 3, "name": "Radiologia"}}` carries its own id.
        let nested_id = NAME_KEYS
            .iter()
            .filter_map(|key| fields.get(*key)?.as_object()?.get("id"))
            .find_map(lenient_sector_id);

        let sector_id = ID_KEYS
            .iter()
            .filter_map(|key| fields.get(*key))
            .find_map(lenient_sector_id)
            .or(nested_id);

        Some(Self {
            sector_name,
            sector_id,
        })
    }
}

impl<'de> Deserialize<'de> for SectorRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let row = Value::deserialize(deserializer)?;
        Self::from_json(&row).ok_or_else(|| {
            de::Error::custom(format!("expected a sector row object, found {}", json_kind(&row)))
        })
    }
}

/// A string, or an object's `name` / `nome`. Blank strings count as absent.
fn lenient_sector_name(value: &Value) -> Option<String> {
    let name = match value {
        Value::String(s) => s.as_str(),
        Value::Object(fields) => fields
            .get("name")
            .or_else(|| fields.get("nome"))
            .and_then(Value::as_str)?,
        _ => return None,
    };
    (!name.trim().is_empty()).then(|| name.to_string())
}

fn lenient_sector_id(value: &Value) -> Option<SectorId> {
    let raw = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    raw.and_then(SectorId::new)
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Filter passed through to the external listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListFilter {
    /// Only records whose sector name contains this (case-insensitive).
    pub sector_name: Option<String>,
    /// Upper bound on records returned per listing.
    pub limit: Option<usize>,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub maintenance_api_url: Option<String>,
    pub maintenance_api_token: Option<String>,
    pub equipment_file: Option<PathBuf>,
    pub work_order_file: Option<PathBuf>,
    pub http_timeout_secs: u64,
    pub page_size: u32,
    pub max_pages: u32,
    pub overrides_path: Option<PathBuf>,
    pub catalog_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./maintdash.db".to_string());

        let http_timeout_secs = std::env::var("MAINTENANCE_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        let page_size = std::env::var("MAINTENANCE_PAGE_SIZE")
            .unwrap_or_else(|_| "500".to_string())
            .parse()
            .unwrap_or(500);

        let max_pages = std::env::var("MAINTENANCE_MAX_PAGES")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .unwrap_or(50);

        let catalog_ttl_secs = std::env::var("SECTOR_CATALOG_TTL_SECS")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .unwrap_or(0);

        Ok(Self {
            database_path,
            maintenance_api_url: non_empty_var("MAINTENANCE_API_URL"),
            maintenance_api_token: non_empty_var("MAINTENANCE_API_TOKEN"),
            equipment_file: non_empty_var("MAINTENANCE_EQUIPMENT_FILE").map(PathBuf::from),
            work_order_file: non_empty_var("MAINTENANCE_WORK_ORDER_FILE").map(PathBuf::from),
            http_timeout_secs,
            page_size,
            max_pages,
            overrides_path: non_empty_var("SECTOR_OVERRIDES_PATH").map(PathBuf::from),
            catalog_ttl_secs,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
