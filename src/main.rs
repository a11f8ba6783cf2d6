//! Scan Lookup - Barcode Scanner Client
//!
//! Reads scans from a barcode scanner device, resolves each code against
//! the local product database with a remote catalog fallback, and prints
//! the result. Runs until the device is exhausted or Ctrl-C.

use clap::Parser;
use rusqlite::Connection;
use scan_lookup::{
    import_catalog, init_schema, CatalogClient, LineDevice, ProductStore, Resolution,
    ResolutionSource, ResolveError, Resolver, SqliteStore, DEFAULT_CATALOG_URL, DEFAULT_DEVICE,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Barcode scanner client - local product lookup with remote catalog fallback
#[derive(Parser, Debug)]
#[command(name = "scan_lookup")]
#[command(version, about, long_about = None)]
struct Args {
    /// Scanner device to read scans from (use `-` for stdin)
    #[arg(long, default_value = DEFAULT_DEVICE)]
    device: String,

    /// Path to the SQLite database file
    #[arg(short, long, default_value_t = default_db_path())]
    database: String,

    /// Base URL of the remote product catalog
    #[arg(long, default_value = DEFAULT_CATALOG_URL)]
    catalog_url: String,

    /// Timeout for remote catalog requests, in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Import a product catalog CSV into the local database and exit
    #[arg(long, value_name = "CSV")]
    import_catalog: Option<PathBuf>,

    /// Resolve a single barcode and exit instead of reading the device
    #[arg(long, value_name = "BARCODE")]
    lookup: Option<String>,
}

/// Returns the default database path: ~/.local/share/scan_lookup/products.db
fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scan_lookup")
        .join("products.db")
        .to_string_lossy()
        .to_string()
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let db_path = PathBuf::from(&args.database);

    log::info!("Starting scan_lookup...");
    log::info!("Database path: {}", db_path.display());

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("Failed to create database directory: {}", e);
                std::process::exit(1);
            }
            log::info!("Created directory: {}", parent.display());
        }
    }

    // Open database connection
    let mut conn = match Connection::open(&db_path) {
        Ok(conn) => {
            log::info!("Opened database: {}", db_path.display());
            conn
        }
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize database schema
    if let Err(e) = init_schema(&conn) {
        log::error!("Failed to initialize database schema: {}", e);
        std::process::exit(1);
    }

    // Import mode: load a catalog CSV and exit
    if let Some(csv_path) = &args.import_catalog {
        match import_catalog(&mut conn, csv_path) {
            Ok(stats) => {
                println!(
                    "Imported {} products and {} brands ({} rows skipped)",
                    stats.products, stats.brands, stats.skipped
                );
            }
            Err(e) => {
                log::error!("Catalog import failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Wrap connection in Arc<Mutex> so the resolver and the reporting
    // side share one handle
    let store = SqliteStore::new(Arc::new(Mutex::new(conn)));
    let catalog = CatalogClient::with_base_url(
        args.catalog_url.clone(),
        Duration::from_secs(args.timeout_secs),
    );
    let resolver = Resolver::new(store.clone(), catalog);

    // One-shot mode: resolve a single barcode and exit
    if let Some(barcode) = &args.lookup {
        match resolver.resolve(barcode).await {
            Ok(resolution) => report_resolved(&store, barcode, &resolution),
            Err(err) => {
                report_error(barcode, &err);
                std::process::exit(1);
            }
        }
        return;
    }

    let mut device = match LineDevice::open(&args.device).await {
        Ok(device) => device,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    // Ctrl-C requests a stop; the loop finishes the scan in flight first
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(scan_lookup::scan_loop::shutdown_on_signal(
        tokio::signal::ctrl_c(),
        shutdown_tx,
    ));

    let report_store = store.clone();
    let result = scan_lookup::scan_loop::run(
        &mut device,
        &resolver,
        |barcode: &str, resolution: &Resolution| {
            report_resolved(&report_store, barcode, resolution)
        },
        report_error,
        shutdown_rx,
    )
    .await;

    match result {
        Ok(stats) => {
            log::info!(
                "Session ended: {} resolved, {} failed",
                stats.resolved,
                stats.failed
            );
        }
        Err(e) => {
            log::error!("Scanner device failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print one resolved scan, enriched with local catalog data when present.
fn report_resolved(store: &SqliteStore, barcode: &str, resolution: &Resolution) {
    let source = match resolution.source {
        ResolutionSource::Cache => "cache",
        ResolutionSource::Remote => "catalog",
    };
    println!("barcode: {}", barcode);
    println!("  external id: {} (from {})", resolution.external_id, source);

    match store.lookup_by_gtin(barcode) {
        Ok(Some(product)) => {
            println!("  product: {} [{}]", product.name, product.brand);
            match store.lookup_by_brand(&product.brand) {
                Ok(Some(brand)) => {
                    if let Some(owner) = brand.owner {
                        println!("  brand owner: {}", owner);
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("Brand lookup failed for {}: {}", product.brand, e),
            }
        }
        Ok(None) => {
            // No local catalog entry; show the raw catalog payload instead
            println!("  payload: {}", resolution.payload);
        }
        Err(e) => {
            log::warn!("Product lookup failed for {}: {}", barcode, e);
            println!("  payload: {}", resolution.payload);
        }
    }
}

/// Print one failed scan. The session keeps running afterwards.
fn report_error(barcode: &str, err: &ResolveError) {
    if err.retryable() {
        eprintln!("barcode: {} failed: {} (scan again to retry)", barcode, err);
    } else {
        eprintln!("barcode: {} failed: {}", barcode, err);
    }
}
