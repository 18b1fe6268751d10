//! Investment record storage
//! Key-value style access by UUID over SQLite. The sector id column is
//! written by the sector sync; nothing here decides what it should be.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::SectorId;

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;

CREATE TABLE IF NOT EXISTS investments (
    id TEXT PRIMARY KEY,
    description TEXT NOT NULL,
    sector_name TEXT,
    sector_id INTEGER,
    amount_cents INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
) WITHOUT ROWID;

CREATE INDEX IF NOT EXISTS idx_investments_sector
    ON investments(sector_id);
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, description, sector_name, sector_id, amount_cents, created_at, updated_at FROM investments";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investment {
    pub id: Uuid,
    pub description: String,
    pub sector_name: Option<String>,
    pub sector_id: Option<SectorId>,
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInvestment {
    pub description: String,
    pub sector_name: Option<String>,
    pub amount_cents: i64,
}

pub struct InvestmentStore {
    conn: Arc<Mutex<Connection>>,
}

impl InvestmentStore {
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database at {}", db_path))?;
        let store = Self::init(conn)?;
        info!("📊 investment store ready at {} ({} rows)", db_path, store.count()?);
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory().context("Failed to open in-memory database")?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize database schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn find(&self, id: Uuid) -> Result<Option<Investment>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("{SELECT_COLUMNS} WHERE id = ?1"),
            params![id.to_string()],
            row_to_investment,
        )
        .optional()
        .context("Failed to query investment")
    }

    pub fn create(&self, new: NewInvestment, sector_id: Option<SectorId>) -> Result<Investment> {
        let now = Utc::now();
        let investment = Investment {
            id: Uuid::new_v4(),
            description: new.description,
            sector_name: new.sector_name,
            sector_id,
            amount_cents: new.amount_cents,
            created_at: now,
            updated_at: now,
        };

        self.conn
            .lock()
            .execute(
                "INSERT INTO investments (id, description, sector_name, sector_id, amount_cents, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    investment.id.to_string(),
                    investment.description,
                    investment.sector_name,
                    investment.sector_id.map(SectorId::get),
                    investment.amount_cents,
                    investment.created_at.to_rfc3339(),
                    investment.updated_at.to_rfc3339(),
                ],
            )
            .context("Failed to insert investment")?;

        Ok(investment)
    }

    /// Overwrite the stored row. Returns `false` if the id does not exist.
    pub fn update(&self, investment: &mut Investment) -> Result<bool> {
        investment.updated_at = Utc::now();
        let changed = self
            .conn
            .lock()
            .execute(
                "UPDATE investments
                 SET description = ?2, sector_name = ?3, sector_id = ?4, amount_cents = ?5, updated_at = ?6
                 WHERE id = ?1",
                params![
                    investment.id.to_string(),
                    investment.description,
                    investment.sector_name,
                    investment.sector_id.map(SectorId::get),
                    investment.amount_cents,
                    investment.updated_at.to_rfc3339(),
                ],
            )
            .context("Failed to update investment")?;
        Ok(changed > 0)
    }

    pub fn delete(&self, id: Uuid) -> Result<bool> {
        let changed = self
            .conn
            .lock()
            .execute(
                "DELETE FROM investments WHERE id = ?1",
                params![id.to_string()],
            )
            .context("Failed to delete investment")?;
        Ok(changed > 0)
    }

    /// Rows without a sector id, oldest first.
    pub fn list_missing_sector(&self) -> Result<Vec<Investment>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE sector_id IS NULL ORDER BY created_at ASC, id ASC"
        ))?;
        let rows = stmt
            .query_map([], row_to_investment)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to list investments without sector")?;
        Ok(rows)
    }

    pub fn count(&self) -> Result<i64> {
        self.conn
            .lock()
            .query_row("SELECT COUNT(*) FROM investments", [], |row| row.get(0))
            .context("Failed to count investments")
    }
}

fn row_to_investment(row: &Row<'_>) -> rusqlite::Result<Investment> {
    let id: String = row.get(0)?;
    let sector_id: Option<i64> = row.get(3)?;
    Ok(Investment {
        id: Uuid::parse_str(&id)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?,
        description: row.get(1)?,
        sector_name: row.get(2)?,
        sector_id: sector_id.and_then(SectorId::new),
        amount_cents: row.get(4)?,
        created_at: parse_timestamp(row, 5)?,
        updated_at: parse_timestamp(row, 6)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_investment(description: &str, sector: Option<&str>) -> NewInvestment {
        NewInvestment {
            description: description.to_string(),
            sector_name: sector.map(str::to_string),
            amount_cents: 12_500_000,
        }
    }

    #[test]
    fn test_create_find_roundtrip() {
        let store = InvestmentStore::open_in_memory().unwrap();
        let created = store
            .create(new_investment("Ventilador pulmonar", Some("UTI 1")), SectorId::new(2))
            .unwrap();

        let found = store.find(created.id).unwrap().unwrap();
        assert_eq!(found.description, "Ventilador pulmonar");
        assert_eq!(found.sector_id, SectorId::new(2));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_find_unknown_id_is_none() {
        let store = InvestmentStore::open_in_memory().unwrap();
        assert!(store.find(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_update_and_delete() {
        let store = InvestmentStore::open_in_memory().unwrap();
        let mut inv = store
            .create(new_investment("Autoclave", Some("CME")), None)
            .unwrap();

        inv.sector_id = SectorId::new(21);
        assert!(store.update(&mut inv).unwrap());
        assert_eq!(store.find(inv.id).unwrap().unwrap().sector_id, SectorId::new(21));

        assert!(store.delete(inv.id).unwrap());
        assert!(!store.delete(inv.id).unwrap());
        assert!(!store.update(&mut inv).unwrap());
    }

    #[test]
    fn test_list_missing_sector() {
        let store = InvestmentStore::open_in_memory().unwrap();
        store
            .create(new_investment("Monitor", Some("UTI 1")), SectorId::new(2))
            .unwrap();
        let missing = store
            .create(new_investment("Bisturi elétrico", Some("Centro Cirúrgico")), None)
            .unwrap();

        let rows = store.list_missing_sector().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, missing.id);
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maintdash.db");
        let path = path.to_str().unwrap();

        let id = {
            let store = InvestmentStore::open(path).unwrap();
            store.create(new_investment("Raio-X móvel", None), None).unwrap().id
        };
        let reopened = InvestmentStore::open(path).unwrap();
        assert!(reopened.find(id).unwrap().is_some());
    }
}
