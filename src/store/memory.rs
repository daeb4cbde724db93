use crate::error::StoreError;
use crate::store::traits::{Document, DocumentStore, EqualityFilter};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info};

type Collection = BTreeMap<String, Map<String, Value>>;

/// In-process document store
///
/// Loaded from a JSON fixture shaped `{ "<collection>": { "<id>": { ...fields } } }`.
/// Latency and per-document or per-collection failures can be injected to exercise the
/// aggregation paths that only show up against a real network service.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    latency: RwLock<HashMap<(String, String), Duration>>,
    failing: RwLock<HashSet<(String, String)>>,
    failing_collections: RwLock<HashSet<String>>,
    get_calls: AtomicUsize,
    query_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a parsed JSON fixture
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(root) = value else {
            anyhow::bail!("store fixture must be a JSON object of collections");
        };

        let store = Self::new();
        for (collection, docs) in root {
            let Value::Object(docs) = docs else {
                anyhow::bail!("collection `{}` must be an object keyed by id", collection);
            };
            for (id, fields) in docs {
                let Value::Object(fields) = fields else {
                    anyhow::bail!("document `{}/{}` must be an object", collection, id);
                };
                store.insert(&collection, &id, fields);
            }
        }
        Ok(store)
    }

    /// Load a JSON fixture from disk
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read store fixture {}", path.display()))?;
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse store fixture {}", path.display()))?;
        let store = Self::from_json(value)?;
        info!("Loaded store fixture {} ({} documents)", path.display(), store.len());
        Ok(store)
    }

    pub fn insert(&self, collection: &str, id: &str, fields: Map<String, Value>) {
        self.collections
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    /// Delay every `get` of this document by `delay`
    pub fn set_latency(&self, collection: &str, id: &str, delay: Duration) {
        self.latency
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert((collection.to_string(), id.to_string()), delay);
    }

    /// Make every `get` of this document fail with a transient error
    pub fn fail_document(&self, collection: &str, id: &str) {
        self.failing
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert((collection.to_string(), id.to_string()));
    }

    /// Make every `query` on this collection fail with a transient error
    pub fn fail_collection(&self, collection: &str) {
        self.failing_collections
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(collection.to_string());
    }

    pub fn len(&self) -> usize {
        self.collections
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of point lookups served so far
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::Relaxed)
    }

    /// Number of collection queries served so far
    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::Relaxed)
    }

    fn key(collection: &str, id: &str) -> (String, String) {
        (collection.to_string(), id.to_string())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(
        &self,
        collection: &str,
        filters: &[EqualityFilter],
    ) -> Result<Vec<Document>, StoreError> {
        self.query_calls.fetch_add(1, Ordering::Relaxed);
        if self
            .failing_collections
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(collection)
        {
            return Err(StoreError::Transient(format!(
                "injected failure for query on {}",
                collection
            )));
        }

        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        let docs: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| {
                        filters
                            .iter()
                            .all(|f| fields.get(&f.field) == Some(&f.value))
                    })
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        debug!("query {} with {} filters -> {} docs", collection, filters.len(), docs.len());
        Ok(docs)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        let key = Self::key(collection, id);

        let delay = self
            .latency
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self
            .failing
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&key)
        {
            return Err(StoreError::Transient(format!(
                "injected failure for {}/{}",
                collection, id
            )));
        }

        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> MemoryStore {
        MemoryStore::from_json(json!({
            "RentOutPosts": {
                "l1": {"name": "Drill", "category": "Tools", "userId": "u1"},
                "l2": {"name": "Tent", "category": "Camping Gear", "userId": "u1"}
            },
            "users": {"u1": {"firstName": "Ada"}}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn query_applies_equality_filters() {
        let store = fixture();
        let all = store.query("RentOutPosts", &[]).await.unwrap();
        assert_eq!(all.len(), 2);

        let tools = store
            .query("RentOutPosts", &[EqualityFilter::new("category", "Tools")])
            .await
            .unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].id, "l1");
    }

    #[tokio::test]
    async fn unknown_collection_is_empty() {
        let store = fixture();
        assert!(store.query("nothing", &[]).await.unwrap().is_empty());
        assert!(store.get("nothing", "x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn injected_failure_is_transient() {
        let store = fixture();
        store.fail_document("users", "u1");
        let err = store.get("users", "u1").await.unwrap_err();
        assert!(matches!(err, StoreError::Transient(_)));
        assert_eq!(store.get_calls(), 1);
    }

    #[tokio::test]
    async fn failing_collection_rejects_queries_only() {
        let store = fixture();
        store.fail_collection("RentOutPosts");
        let err = store.query("RentOutPosts", &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::Transient(_)));
        assert_eq!(store.query_calls(), 1);
        assert!(store.get("RentOutPosts", "l1").await.unwrap().is_some());
        assert_eq!(store.query("users", &[]).await.unwrap().len(), 1);
    }

    #[test]
    fn rejects_non_object_fixture() {
        assert!(MemoryStore::from_json(json!([1, 2, 3])).is_err());
        assert!(MemoryStore::from_json(json!({"users": {"u1": 5}})).is_err());
    }

    #[tokio::test]
    async fn load_reads_fixture_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{"users": {"u1": {"firstName": "Ada"}}}"#).unwrap();

        let store = MemoryStore::load(&path).await.unwrap();
        assert_eq!(store.len(), 1);
    }
}
