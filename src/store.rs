//! Product store contract and data records
//!
//! The resolver talks to the local product database exclusively through
//! [`ProductStore`], so the cache-hit/miss logic can be exercised against an
//! in-memory fake just as well as against SQLite.

use crate::error::StoreError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Cached association between a barcode and a remote catalog entry.
///
/// Created on the first successful remote lookup of a barcode and read on
/// every later scan of the same code. At most one mapping exists per
/// barcode; a re-fetch overwrites the payload, never adds a second row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalMapping {
    /// Identifier of the entry in the remote catalog
    pub external_id: String,
    /// Raw catalog response body, kept opaque
    pub payload: String,
    /// When the mapping was fetched (local time, `YYYY-MM-DD HH:MM:SS`)
    pub fetched_at: String,
}

/// Product row from the local catalog tables.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub gtin: String,
    pub name: String,
    pub brand: String,
}

/// Brand row from the local catalog tables.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandRecord {
    pub brand: String,
    pub owner: Option<String>,
}

/// The four operations the client needs from a product database.
///
/// `lookup_mapping`/`insert_mapping` carry the resolver's cache;
/// `lookup_by_gtin`/`lookup_by_brand` are auxiliary catalog lookups used by
/// the reporting layer. Lookups return `Ok(None)` for "no row"; an `Err`
/// always means the store itself failed. Implementations guard their own
/// interior state; callers may hold clones of a shared handle.
pub trait ProductStore {
    /// Cached catalog mapping for a barcode, if one exists.
    fn lookup_mapping(&self, barcode: &str) -> StoreResult<Option<ExternalMapping>>;

    /// Persists (or overwrites) the catalog mapping for a barcode.
    fn insert_mapping(&self, barcode: &str, external_id: &str, payload: &str) -> StoreResult<()>;

    /// Local product record for a barcode.
    fn lookup_by_gtin(&self, barcode: &str) -> StoreResult<Option<ProductRecord>>;

    /// Local brand record for a brand key.
    fn lookup_by_brand(&self, brand: &str) -> StoreResult<Option<BrandRecord>>;
}
