//! Unit tests for cache-first resolution
//!
//! The store is an in-memory fake with call counters; the catalog side
//! runs against wiremock so remote-call counts can be asserted exactly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{Resolution, ResolutionSource, Resolver};
use crate::catalog::CatalogClient;
use crate::error::{ResolveError, StoreError};
use crate::store::{BrandRecord, ExternalMapping, ProductRecord, ProductStore, StoreResult};

#[derive(Clone, Default)]
struct FakeStore {
    inner: Arc<FakeStoreInner>,
}

#[derive(Default)]
struct FakeStoreInner {
    mappings: Mutex<HashMap<String, ExternalMapping>>,
    insert_calls: AtomicUsize,
    fail_lookups: AtomicBool,
    fail_inserts: AtomicBool,
}

impl FakeStore {
    fn with_mapping(barcode: &str, external_id: &str, payload: &str) -> Self {
        let store = Self::default();
        store.inner.mappings.lock().unwrap().insert(
            barcode.to_string(),
            ExternalMapping {
                external_id: external_id.to_string(),
                payload: payload.to_string(),
                fetched_at: "2026-01-01 00:00:00".to_string(),
            },
        );
        store
    }

    fn insert_calls(&self) -> usize {
        self.inner.insert_calls.load(Ordering::SeqCst)
    }

    fn mapping_count(&self) -> usize {
        self.inner.mappings.lock().unwrap().len()
    }

    fn fail_lookups(&self) {
        self.inner.fail_lookups.store(true, Ordering::SeqCst);
    }

    fn fail_inserts(&self) {
        self.inner.fail_inserts.store(true, Ordering::SeqCst);
    }
}

impl ProductStore for FakeStore {
    fn lookup_mapping(&self, barcode: &str) -> StoreResult<Option<ExternalMapping>> {
        if self.inner.fail_lookups.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("induced lookup failure".to_string()));
        }
        Ok(self.inner.mappings.lock().unwrap().get(barcode).cloned())
    }

    fn insert_mapping(&self, barcode: &str, external_id: &str, payload: &str) -> StoreResult<()> {
        self.inner.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("induced insert failure".to_string()));
        }
        self.inner.mappings.lock().unwrap().insert(
            barcode.to_string(),
            ExternalMapping {
                external_id: external_id.to_string(),
                payload: payload.to_string(),
                fetched_at: "2026-01-01 00:00:00".to_string(),
            },
        );
        Ok(())
    }

    fn lookup_by_gtin(&self, _barcode: &str) -> StoreResult<Option<ProductRecord>> {
        Ok(None)
    }

    fn lookup_by_brand(&self, _brand: &str) -> StoreResult<Option<BrandRecord>> {
        Ok(None)
    }
}

fn resolver_with(server: &MockServer, store: FakeStore) -> Resolver<FakeStore> {
    let catalog = CatalogClient::with_base_url(server.uri(), Duration::from_secs(5));
    Resolver::new(store, catalog)
}

fn catalog_body(external_id: &str) -> serde_json::Value {
    serde_json::json!({ "externalId": external_id, "title": "Tomato Ketchup 500ml" })
}

#[tokio::test]
async fn cached_mapping_skips_the_catalog() {
    let server = MockServer::start().await;

    // Any catalog request at all fails this test on server drop
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body("X")))
        .expect(0)
        .mount(&server)
        .await;

    let store = FakeStore::with_mapping("012345", "X1", "P1");
    let resolver = resolver_with(&server, store.clone());

    let resolution = resolver.resolve("012345").await.unwrap();

    assert_eq!(
        resolution,
        Resolution {
            external_id: "X1".to_string(),
            payload: "P1".to_string(),
            source: ResolutionSource::Cache,
        }
    );
    assert_eq!(store.insert_calls(), 0);
}

#[tokio::test]
async fn cache_miss_fetches_and_persists() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products/099999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body("X2")))
        .expect(1)
        .mount(&server)
        .await;

    let store = FakeStore::default();
    let resolver = resolver_with(&server, store.clone());

    let resolution = resolver.resolve("099999").await.unwrap();

    assert_eq!(resolution.external_id, "X2");
    assert_eq!(resolution.source, ResolutionSource::Remote);
    assert_eq!(store.insert_calls(), 1);

    // The persisted payload is the catalog body verbatim
    let cached = store.lookup_mapping("099999").unwrap().unwrap();
    assert_eq!(cached.payload, resolution.payload);
}

#[tokio::test]
async fn second_resolve_is_served_from_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products/099999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body("X2")))
        .expect(1)
        .mount(&server)
        .await;

    let store = FakeStore::default();
    let resolver = resolver_with(&server, store.clone());

    let first = resolver.resolve("099999").await.unwrap();
    let second = resolver.resolve("099999").await.unwrap();

    assert_eq!(first.source, ResolutionSource::Remote);
    assert_eq!(second.source, ResolutionSource::Cache);
    assert_eq!(second.payload, first.payload);
    assert_eq!(store.insert_calls(), 1);
}

#[tokio::test]
async fn catalog_miss_is_not_cached_negatively() {
    let server = MockServer::start().await;

    // Both resolve calls must reach the catalog again
    Mock::given(method("GET"))
        .and(path("/v1/products/000000"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let store = FakeStore::default();
    let resolver = resolver_with(&server, store.clone());

    let first = resolver.resolve("000000").await.unwrap_err();
    let second = resolver.resolve("000000").await.unwrap_err();

    assert!(matches!(first, ResolveError::RemoteNotFound));
    assert!(matches!(second, ResolveError::RemoteNotFound));
    assert_eq!(store.insert_calls(), 0);
    assert_eq!(store.mapping_count(), 0);
}

#[tokio::test]
async fn store_lookup_failure_skips_the_catalog() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body("X")))
        .expect(0)
        .mount(&server)
        .await;

    let store = FakeStore::default();
    store.fail_lookups();
    let resolver = resolver_with(&server, store.clone());

    let err = resolver.resolve("012345").await.unwrap_err();

    assert!(matches!(err, ResolveError::StoreUnavailable(_)));
    assert!(err.retryable());
}

#[tokio::test]
async fn persist_failure_after_fetch_is_a_store_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products/099999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body("X2")))
        .expect(1)
        .mount(&server)
        .await;

    let store = FakeStore::default();
    store.fail_inserts();
    let resolver = resolver_with(&server, store.clone());

    let err = resolver.resolve("099999").await.unwrap_err();

    assert!(matches!(err, ResolveError::StoreUnavailable(_)));
    assert_eq!(store.mapping_count(), 0);
}

#[tokio::test]
async fn catalog_timeout_is_transient_and_persists_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products/111111"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(catalog_body("X"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let catalog = CatalogClient::with_base_url(server.uri(), Duration::from_millis(50));
    let store = FakeStore::default();
    let resolver = Resolver::new(store.clone(), catalog);

    let err = resolver.resolve("111111").await.unwrap_err();

    assert!(matches!(err, ResolveError::RemoteTransient(_)));
    assert!(err.retryable());
    assert_eq!(store.insert_calls(), 0);
}

#[tokio::test]
async fn malformed_catalog_answer_persists_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products/099999"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "title": "no id here" })),
        )
        .mount(&server)
        .await;

    let store = FakeStore::default();
    let resolver = resolver_with(&server, store.clone());

    let err = resolver.resolve("099999").await.unwrap_err();

    assert!(matches!(err, ResolveError::MalformedResponse(_)));
    assert!(!err.retryable());
    assert_eq!(store.insert_calls(), 0);
}
