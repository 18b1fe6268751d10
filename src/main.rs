//! maintdash - sector identity tooling for the maintenance dashboard
//!
//! Usage:
//!   maintdash resolve "UTI 1" "Emergência"
//!   maintdash names 2 4 600
//!   maintdash catalog
//!   maintdash reconcile --input legacy_setores.json --strict
//!   maintdash backfill --db ./maintdash.db

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use maintdash_backend::{
    models::{Config, ListFilter, SectorId},
    scrapers::{json_file::read_records, source_from_config, MaintenanceSource},
    sectors::{
        self, harvest, CachedCatalog, ManualOverrides, ReconcileOptions, SectorReconciler,
    },
    storage::InvestmentStore,
    sync::SectorSync,
};

/// Sector identity resolution for equipment, work orders and investments
#[derive(Parser, Debug)]
#[command(name = "maintdash")]
#[command(about = "Resolve and reconcile hospital sector names to stable sector ids")]
struct Cli {
    /// TOML file with manual sector overrides (replaces the built-in table)
    #[arg(long, env = "SECTOR_OVERRIDES_PATH", global = true)]
    overrides: Option<PathBuf>,

    /// Report names that only get a synthetic id as unmapped
    #[arg(long, global = true)]
    strict: bool,

    /// Only harvest external records whose sector contains this text
    #[arg(long, global = true)]
    sector_filter: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve names through the directory / hash chain (no external data)
    Resolve {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Canonical names for sector ids
    Names {
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Build and print the external sector catalog
    Catalog,

    /// Reconcile records and print the JSON report
    Reconcile {
        /// JSON export of records to reconcile (defaults to the harvested records)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Fill missing sector ids on stored investments
    Backfill {
        /// SQLite database path
        #[arg(long, env = "DATABASE_PATH")]
        db: Option<String>,
    },
}

#[derive(Serialize)]
struct ResolvedName<'a> {
    name: &'a str,
    id: Option<SectorId>,
    canonical: Option<&'static str>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing();

    let cli = Cli::parse();
    let overrides = load_overrides(cli.overrides.as_ref().or(config.overrides_path.as_ref()))?;
    let reconciler = SectorReconciler::new(overrides).with_options(ReconcileOptions {
        allow_synthetic: !cli.strict,
    });
    let filter = ListFilter {
        sector_name: cli.sector_filter.clone(),
        limit: None,
    };

    match cli.command {
        Commands::Resolve { names } => {
            let resolved: Vec<_> = names
                .iter()
                .map(|name| {
                    let id = sectors::resolve(name);
                    ResolvedName {
                        name,
                        id,
                        canonical: id.and_then(sectors::sector_id_to_name),
                    }
                })
                .collect();
            print_json(&resolved)?;
        }
        Commands::Names { ids } => {
            let valid: Vec<SectorId> = ids.iter().filter_map(|&raw| SectorId::new(raw)).collect();
            if valid.len() < ids.len() {
                warn!(
                    ignored = ids.len() - valid.len(),
                    "ignoring non-positive sector ids"
                );
            }
            print_json(&sectors::sector_ids_to_names(&valid))?;
        }
        Commands::Catalog => {
            let source = source_from_config(&config)?;
            let catalog = cached_catalog(source, filter, &config).get().await;
            print_json(catalog.entries())?;
        }
        Commands::Reconcile { input } => {
            let source = source_from_config(&config)?;
            let report = match input {
                Some(path) => {
                    let records = read_records(&path).await?;
                    info!(path = %path.display(), records = records.len(), "reconciling export");
                    sectors::reconcile_all(&reconciler, source.as_ref(), &filter, &records).await
                }
                None => {
                    let harvest = harvest(source.as_ref(), &filter).await;
                    let catalog = harvest.to_catalog();
                    let records: Vec<_> = harvest.records().cloned().collect();
                    sectors::reconcile_records(&reconciler, &catalog, &records)
                }
            };
            print_json(&report)?;
        }
        Commands::Backfill { db } => {
            let db_path = db.unwrap_or_else(|| config.database_path.clone());
            let store = InvestmentStore::open(&db_path)?;
            let source = source_from_config(&config)?;
            let catalog = cached_catalog(source, filter, &config).get().await;
            let summary = SectorSync::new(&store, &reconciler).backfill(&catalog)?;
            print_json(&summary)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maintdash_backend=info,maintdash=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_overrides(path: Option<&PathBuf>) -> Result<ManualOverrides> {
    match path {
        Some(path) => ManualOverrides::load(path),
        None => Ok(ManualOverrides::builtin()),
    }
}

fn cached_catalog(
    source: Arc<dyn MaintenanceSource>,
    filter: ListFilter,
    config: &Config,
) -> CachedCatalog {
    CachedCatalog::new(source, filter, Duration::from_secs(config.catalog_ttl_secs))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}
