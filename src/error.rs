//! Error types for scan_lookup
//!
//! Per-barcode failures are recoverable (the scan loop reports them and
//! keeps reading); only a scanner device failure terminates a session.

use thiserror::Error;

/// Fatal scanner device failure. Ends the scan loop.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The device node could not be opened
    #[error("failed to open scanner device {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    /// Reading from the device failed mid-session
    #[error("scanner device read failed: {0}")]
    Read(#[from] std::io::Error),
}

/// Infrastructure failure of the product store.
///
/// "No row found" is never an error; store lookups return `Ok(None)` for
/// that, so every `StoreError` means the store itself is in trouble.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database operation failed
    #[error("product store error: {0}")]
    Database(#[from] rusqlite::Error),
    /// The store handle is unusable (e.g. shared connection poisoned)
    #[error("product store unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a remote catalog lookup.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The catalog has no entry for this code
    #[error("no catalog entry for this code")]
    NotFound,
    /// The catalog is throttling us (HTTP 429)
    #[error("catalog rate limit exceeded")]
    RateLimited,
    /// Transport-level failure (connection error, timeout, etc.)
    #[error("catalog request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Unexpected HTTP status code
    #[error("catalog returned HTTP {0}")]
    HttpStatus(reqwest::StatusCode),
    /// Response body could not be reduced to an external id + payload
    #[error("malformed catalog response: {0}")]
    Malformed(String),
}

/// Why a single barcode failed to resolve.
///
/// This is the categorized error handed to the scan loop's error handler;
/// the loop continues after every one of these.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The store failed during lookup or persist; the remote catalog was
    /// not consulted on a lookup failure, so infrastructure trouble is
    /// never misreported as a missing product
    #[error("store failure: {0}")]
    StoreUnavailable(#[from] StoreError),
    /// The catalog definitively has no data for this barcode
    #[error("no product data exists for this barcode")]
    RemoteNotFound,
    /// Timeout, rate limit, connection or server trouble; worth retrying
    #[error("transient catalog failure: {0}")]
    RemoteTransient(RemoteError),
    /// The catalog answered with something unusable; nothing was persisted
    #[error("malformed catalog response: {0}")]
    MalformedResponse(String),
}

impl ResolveError {
    /// Whether scanning the same code again could plausibly succeed.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            ResolveError::StoreUnavailable(_) | ResolveError::RemoteTransient(_)
        )
    }
}

impl From<RemoteError> for ResolveError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NotFound => ResolveError::RemoteNotFound,
            RemoteError::Malformed(msg) => ResolveError::MalformedResponse(msg),
            other => ResolveError::RemoteTransient(other),
        }
    }
}

/// Failure while importing a catalog CSV.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The catalog file could not be read
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    /// The catalog file is not valid CSV
    #[error("invalid catalog data: {0}")]
    Csv(#[from] csv::Error),
    /// Writing the imported rows failed
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}
