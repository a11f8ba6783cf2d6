//! Remote catalog client
//!
//! Uses async reqwest for non-blocking HTTP requests. The base URL is
//! injectable so tests can point the client at a local mock server.

use crate::error::RemoteError;
use serde::Deserialize;
use std::time::Duration;

/// Public catalog endpoint used when no override is configured
pub const DEFAULT_CATALOG_URL: &str = "https://api.scanlookup.net";

const USER_AGENT: &str = "scan_lookup/1.0";

/// One successful catalog answer: the product's external id plus the
/// verbatim response body.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogHit {
    pub external_id: String,
    pub payload: String,
}

/// Catalog product response. Only `externalId` is interpreted; the rest
/// of the body is carried through opaquely as the payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEnvelope {
    #[serde(default)]
    external_id: Option<String>,
}

impl CatalogHit {
    fn from_body(body: String) -> Result<Self, RemoteError> {
        let envelope: CatalogEnvelope = serde_json::from_str(&body)
            .map_err(|e| RemoteError::Malformed(format!("invalid JSON body: {e}")))?;

        match envelope.external_id {
            Some(external_id) if !external_id.is_empty() => Ok(Self {
                external_id,
                payload: body,
            }),
            _ => Err(RemoteError::Malformed(
                "response body has no externalId".to_string(),
            )),
        }
    }
}

/// HTTP client for the remote product catalog.
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl CatalogClient {
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Fetch the catalog entry for a barcode.
    ///
    /// HTTP 404 means the catalog has no entry; 429 means we are being
    /// throttled. Both are distinct from transport errors so callers can
    /// classify them separately.
    pub async fn fetch_product(&self, barcode: &str) -> Result<CatalogHit, RemoteError> {
        let url = format!(
            "{}/v1/products/{}",
            self.base_url,
            urlencoding::encode(barcode)
        );

        log::debug!("Fetching catalog entry: {}", url);

        let response = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RemoteError::RateLimited);
        }
        if !status.is_success() {
            return Err(RemoteError::HttpStatus(status));
        }

        let body = response.text().await?;
        CatalogHit::from_body(body)
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
