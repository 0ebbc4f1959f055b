use super::{Document, DocumentStore, FieldValue, Fields, Query, SetMode, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// collection -> document id -> fields
pub(crate) type Collections = HashMap<String, BTreeMap<String, Fields>>;

/// In-process document store. Nothing survives the process.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<Collections>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_collections(collections: Collections) -> Self {
        Self {
            collections: RwLock::new(collections),
        }
    }

    pub(crate) async fn snapshot(&self) -> Collections {
        self.collections.read().await.clone()
    }

    /// Put a document back to an earlier state; `None` removes it.
    pub(crate) async fn restore(&self, collection: &str, id: &str, previous: Option<Fields>) {
        let mut collections = self.collections.write().await;
        match previous {
            Some(fields) => {
                collections
                    .entry(collection.to_string())
                    .or_default()
                    .insert(id.to_string(), fields);
            }
            None => {
                if let Some(docs) = collections.get_mut(collection) {
                    docs.remove(id);
                }
            }
        }
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

fn apply_delta(current: Option<&FieldValue>, delta: i64) -> FieldValue {
    match current {
        Some(FieldValue::Integer(n)) => FieldValue::Integer(n.saturating_add(delta)),
        Some(FieldValue::Double(n)) => FieldValue::Double(n + delta as f64),
        _ => FieldValue::Integer(delta),
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields, mode: SetMode) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        match mode {
            SetMode::Overwrite => {
                docs.insert(id.to_string(), fields);
            }
            SetMode::Merge => {
                docs.entry(id.to_string()).or_default().extend(fields);
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn increment(&self, collection: &str, id: &str, deltas: &[(&str, i64)]) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_default();
        for (field, delta) in deltas {
            let next = apply_delta(doc.get(*field), *delta);
            doc.insert((*field).to_string(), next);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let matching = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| query.matches(fields))
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(query.arrange(matching))
    }
}
