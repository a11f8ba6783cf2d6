//! Scan Lookup - Barcode Scanner Client
//!
//! Reads barcode scans from a device, resolves each one against the local
//! product database first and the remote catalog on a miss, and caches
//! fetched mappings so a code only ever hits the network once.

pub mod catalog;
pub mod database;
pub mod device;
pub mod error;
pub mod import;
pub mod resolver;
pub mod scan_loop;
pub mod store;

pub use catalog::{CatalogClient, CatalogHit, DEFAULT_CATALOG_URL};
pub use database::{init_schema, SqliteStore};
pub use device::{BarcodeSource, LineDevice, DEFAULT_DEVICE};
pub use error::{DeviceError, ImportError, RemoteError, ResolveError, StoreError};
pub use import::{import_catalog, ImportStats};
pub use resolver::{Resolution, ResolutionSource, Resolver};
pub use scan_loop::LoopStats;
pub use store::{BrandRecord, ExternalMapping, ProductRecord, ProductStore};
