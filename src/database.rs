//! SQLite-backed product store
//!
//! Uses parameterized queries exclusively (no SQL string concatenation).
//! The connection is shared behind `Arc<Mutex<_>>` so the resolver and the
//! reporting layer can hold clones of one handle; opening and closing the
//! connection stays with the caller.

use crate::error::StoreError;
use crate::store::{BrandRecord, ExternalMapping, ProductRecord, ProductStore, StoreResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

/// Initialize the database schema
///
/// Creates tables if they don't exist:
/// - `products` / `brands`: the local product catalog (filled by import)
/// - `catalog_mappings`: cached remote catalog results, one row per barcode
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        -- Local product catalog
        CREATE TABLE IF NOT EXISTS products (
            gtin        TEXT NOT NULL PRIMARY KEY,
            name        TEXT NOT NULL,
            brand       TEXT NOT NULL,
            imported_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_products_brand ON products(brand);

        CREATE TABLE IF NOT EXISTS brands (
            brand       TEXT NOT NULL PRIMARY KEY,
            owner       TEXT,
            imported_at TEXT NOT NULL
        );

        -- Remote catalog cache
        -- Primary key on gtin: at most one mapping per barcode
        CREATE TABLE IF NOT EXISTS catalog_mappings (
            gtin        TEXT NOT NULL PRIMARY KEY,
            external_id TEXT NOT NULL,
            payload     TEXT NOT NULL,
            fetched_at  TEXT NOT NULL
        );
        ",
    )?;

    log::info!("Database schema initialized");
    Ok(())
}

/// Current local time as `YYYY-MM-DD HH:MM:SS`, used to stamp mappings.
fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Product store over a shared SQLite connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Locks the shared connection. A poisoned mutex is reported as the
    /// store being unavailable rather than taking the scan loop down.
    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("shared connection poisoned".to_string()))
    }
}

impl ProductStore for SqliteStore {
    fn lookup_mapping(&self, barcode: &str) -> StoreResult<Option<ExternalMapping>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT external_id, payload, fetched_at
             FROM catalog_mappings
             WHERE gtin = ?1",
        )?;

        let mut rows = stmt.query(params![barcode])?;
        match rows.next()? {
            Some(row) => Ok(Some(ExternalMapping {
                external_id: row.get(0)?,
                payload: row.get(1)?,
                fetched_at: row.get(2)?,
            })),
            None => Ok(None),
        }
    }

    fn insert_mapping(&self, barcode: &str, external_id: &str, payload: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "INSERT INTO catalog_mappings (gtin, external_id, payload, fetched_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(gtin) DO UPDATE SET
                 external_id = excluded.external_id,
                 payload     = excluded.payload,
                 fetched_at  = excluded.fetched_at",
        )?;

        stmt.execute(params![barcode, external_id, payload, now_timestamp()])?;
        log::debug!("Cached catalog mapping for {}", barcode);
        Ok(())
    }

    fn lookup_by_gtin(&self, barcode: &str) -> StoreResult<Option<ProductRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT gtin, name, brand
             FROM products
             WHERE gtin = ?1",
        )?;

        let mut rows = stmt.query(params![barcode])?;
        match rows.next()? {
            Some(row) => Ok(Some(ProductRecord {
                gtin: row.get(0)?,
                name: row.get(1)?,
                brand: row.get(2)?,
            })),
            None => Ok(None),
        }
    }

    fn lookup_by_brand(&self, brand: &str) -> StoreResult<Option<BrandRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT brand, owner
             FROM brands
             WHERE brand = ?1",
        )?;

        let mut rows = stmt.query(params![brand])?;
        match rows.next()? {
            Some(row) => Ok(Some(BrandRecord {
                brand: row.get(0)?,
                owner: row.get(1)?,
            })),
            None => Ok(None),
        }
    }
}
