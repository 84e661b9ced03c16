//! # store::memory
//!
//! In-process document store.  Default backend for local development and the
//! backend every test runs against.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{DocumentStore, StoreError, Versioned};

type Key = (String, String);

#[derive(Default)]
pub struct MemoryDocuments {
    docs: RwLock<HashMap<Key, Versioned<Value>>>,
}

impl MemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(collection: &str, id: &str) -> Key {
    (collection.to_string(), id.to_string())
}

#[async_trait]
impl DocumentStore for MemoryDocuments {
    async fn load(&self, collection: &str, id: &str) -> Result<Option<Versioned<Value>>, StoreError> {
        let docs = self.docs.read().await;
        Ok(docs.get(&key(collection, id)).cloned())
    }

    async fn create(&self, collection: &str, id: &str, doc: Value) -> Result<bool, StoreError> {
        let mut docs = self.docs.write().await;
        let key = key(collection, id);
        if docs.contains_key(&key) {
            return Ok(false);
        }
        docs.insert(key, Versioned { value: doc, version: 1 });
        Ok(true)
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
        expected_version: i64,
    ) -> Result<bool, StoreError> {
        let mut docs = self.docs.write().await;
        match docs.get_mut(&key(collection, id)) {
            Some(current) if current.version == expected_version => {
                current.value = doc;
                current.version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn create_is_refused_when_present() {
        let store = MemoryDocuments::new();
        assert!(store.create("c", "1", json!({ "a": 1 })).await.unwrap());
        assert!(!store.create("c", "1", json!({ "a": 2 })).await.unwrap());

        let doc = store.load("c", "1").await.unwrap().unwrap();
        assert_eq!(doc.value, json!({ "a": 1 }));
        assert_eq!(doc.version, 1);
    }

    #[tokio::test]
    async fn replace_requires_current_version() {
        let store = MemoryDocuments::new();
        store.create("c", "1", json!(1)).await.unwrap();

        assert!(store.replace("c", "1", json!(2), 1).await.unwrap());
        assert!(!store.replace("c", "1", json!(3), 1).await.unwrap());

        let doc = store.load("c", "1").await.unwrap().unwrap();
        assert_eq!(doc.value, json!(2));
        assert_eq!(doc.version, 2);
    }

    #[tokio::test]
    async fn replace_of_missing_document_is_refused() {
        let store = MemoryDocuments::new();
        assert!(!store.replace("c", "nope", json!(1), 1).await.unwrap());
        assert!(store.load("c", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn collections_are_separate() {
        let store = MemoryDocuments::new();
        store.create("a", "1", json!("a")).await.unwrap();
        assert!(store.load("b", "1").await.unwrap().is_none());
    }
}
