//! Cache-first barcode resolution
//!
//! One resolution call per scanned code: consult the local mapping cache,
//! fall back to the remote catalog on a miss, persist what the catalog
//! returned. Failed lookups persist nothing, so rescanning the same code
//! tries the catalog again.

use crate::catalog::CatalogClient;
use crate::error::ResolveError;
use crate::store::ProductStore;

/// A successfully resolved barcode.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub external_id: String,
    pub payload: String,
    pub source: ResolutionSource,
}

/// Where a resolution's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// Served from the local mapping cache, no network involved
    Cache,
    /// Fetched from the remote catalog and persisted
    Remote,
}

/// Resolves barcodes against the store, falling back to the catalog.
pub struct Resolver<S> {
    store: S,
    catalog: CatalogClient,
}

impl<S: ProductStore> Resolver<S> {
    pub fn new(store: S, catalog: CatalogClient) -> Self {
        Self { store, catalog }
    }

    /// Resolve one barcode.
    ///
    /// A store failure during the initial lookup is surfaced as-is and the
    /// catalog is not consulted, so infrastructure trouble never gets
    /// misreported as a missing product. A fetched mapping that cannot be
    /// persisted is also an error; the caller sees either a fully cached
    /// result or a failure.
    pub async fn resolve(&self, barcode: &str) -> Result<Resolution, ResolveError> {
        if let Some(mapping) = self.store.lookup_mapping(barcode)? {
            log::debug!("Cache hit for {}", barcode);
            return Ok(Resolution {
                external_id: mapping.external_id,
                payload: mapping.payload,
                source: ResolutionSource::Cache,
            });
        }

        log::debug!("Cache miss for {}, querying catalog", barcode);
        let hit = self.catalog.fetch_product(barcode).await?;

        self.store
            .insert_mapping(barcode, &hit.external_id, &hit.payload)?;

        Ok(Resolution {
            external_id: hit.external_id,
            payload: hit.payload,
            source: ResolutionSource::Remote,
        })
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
