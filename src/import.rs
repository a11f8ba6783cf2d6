//! Product catalog CSV import
//!
//! Loads a catalog export (`gtin,name,brand,brand_owner`) into the local
//! `products` and `brands` tables so resolved barcodes can be enriched
//! without a network call. Unparseable rows are skipped with a warning,
//! not fatal.

use crate::error::ImportError;
use rusqlite::{params, Connection, Transaction};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// One row of the catalog export
#[derive(Debug, Deserialize)]
struct CatalogRow {
    gtin: String,
    name: String,
    #[serde(default)]
    brand: String,
    #[serde(default)]
    brand_owner: Option<String>,
}

/// Counters from one import run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub products: usize,
    pub brands: usize,
    pub skipped: usize,
}

/// Import a catalog CSV file.
///
/// All writes happen in one transaction; on error nothing is committed.
pub fn import_catalog(conn: &mut Connection, path: &Path) -> Result<ImportStats, ImportError> {
    log::info!("Importing catalog from {}", path.display());

    let file = std::fs::File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let tx = conn.transaction()?;
    let stats = import_rows_tx(&tx, &mut reader)?;
    tx.commit()?;

    log::info!(
        "Catalog import done: {} products, {} brands, {} rows skipped",
        stats.products,
        stats.brands,
        stats.skipped
    );
    Ok(stats)
}

fn import_rows_tx(
    tx: &Transaction<'_>,
    reader: &mut csv::Reader<std::fs::File>,
) -> Result<ImportStats, ImportError> {
    let today = today_date();
    let mut stats = ImportStats::default();
    // Each brand is counted once per run
    let mut seen_brands: HashSet<String> = HashSet::new();

    let mut product_stmt = tx.prepare_cached(
        "INSERT INTO products (gtin, name, brand, imported_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(gtin) DO UPDATE SET
             name        = excluded.name,
             brand       = excluded.brand,
             imported_at = excluded.imported_at",
    )?;
    let mut brand_stmt = tx.prepare_cached(
        "INSERT INTO brands (brand, owner, imported_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(brand) DO UPDATE SET
             owner       = COALESCE(excluded.owner, brands.owner),
             imported_at = excluded.imported_at",
    )?;

    for record in reader.deserialize::<CatalogRow>() {
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                log::warn!("Skipping unparseable catalog row: {}", e);
                stats.skipped += 1;
                continue;
            }
        };

        if row.gtin.is_empty() || row.name.is_empty() {
            log::warn!("Skipping catalog row without gtin or name");
            stats.skipped += 1;
            continue;
        }

        product_stmt.execute(params![row.gtin, row.name, row.brand, today])?;
        stats.products += 1;

        // Every occurrence is written: the upsert keeps the stored owner
        // unless this row carries one, so a later row can fill in an owner
        // an earlier row left blank
        if !row.brand.is_empty() {
            brand_stmt.execute(params![row.brand, row.brand_owner, today])?;
            if seen_brands.insert(row.brand.clone()) {
                stats.brands += 1;
            }
        }
    }

    Ok(stats)
}

/// Current local date as `YYYY-MM-DD`, used to stamp imported rows.
fn today_date() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
