//! In-memory document store
//!
//! Holds every document behind a single `RwLock`. Preconditions are checked
//! and updates applied while the write lock is held, which makes each
//! conditional write atomic with respect to other writers.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use core_kernel::{
    AdapterHealth, DocType, Document, DocumentQuery, DocumentStore, DomainPort, FieldMap,
    HealthCheckResult, HealthCheckable, PortError, Precondition,
};

type Key = (DocType, String);

/// In-memory implementation of `DocumentStore`
#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<HashMap<Key, Document>>>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates the store with documents
    pub async fn with_documents(documents: Vec<Document>) -> Self {
        let store = Self::new();
        {
            let mut map = store.documents.write().await;
            for doc in documents {
                map.insert((doc.doctype, doc.name.clone()), doc);
            }
        }
        store
    }

    /// Number of stored documents of a type
    pub async fn count(&self, doctype: DocType) -> usize {
        self.documents
            .read()
            .await
            .keys()
            .filter(|(dt, _)| *dt == doctype)
            .count()
    }
}

impl DomainPort for InMemoryDocumentStore {}

#[async_trait]
impl HealthCheckable for InMemoryDocumentStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "in-memory-document-store".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: None,
            checked_at: Utc::now(),
        }
    }
}

fn describe_failed(preconditions: &[Precondition], doc: &Document) -> String {
    let failed: Vec<String> = preconditions
        .iter()
        .filter(|p| !p.holds(doc))
        .map(ToString::to_string)
        .collect();
    format!(
        "{} {} was modified concurrently (expected {})",
        doc.doctype,
        doc.name,
        failed.join(", ")
    )
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, doctype: DocType, name: &str) -> Result<Document, PortError> {
        self.documents
            .read()
            .await
            .get(&(doctype, name.to_string()))
            .cloned()
            .ok_or_else(|| PortError::not_found(doctype.as_str(), name))
    }

    async fn insert(
        &self,
        doctype: DocType,
        name: &str,
        fields: FieldMap,
    ) -> Result<Document, PortError> {
        let mut documents = self.documents.write().await;
        let key = (doctype, name.to_string());
        if documents.contains_key(&key) {
            return Err(PortError::conflict(format!("{} {} already exists", doctype, name)));
        }
        let doc = Document::new(doctype, name, fields);
        documents.insert(key, doc.clone());
        debug!(doctype = %doctype, name, "Inserted document");
        Ok(doc)
    }

    async fn set_fields_if(
        &self,
        doctype: DocType,
        name: &str,
        preconditions: &[Precondition],
        updates: FieldMap,
    ) -> Result<Document, PortError> {
        let mut documents = self.documents.write().await;
        let doc = documents
            .get_mut(&(doctype, name.to_string()))
            .ok_or_else(|| PortError::not_found(doctype.as_str(), name))?;

        if !doc.satisfies(preconditions) {
            return Err(PortError::conflict(describe_failed(preconditions, doc)));
        }

        doc.apply(updates);
        debug!(doctype = %doctype, name, version = doc.version, "Updated document");
        Ok(doc.clone())
    }

    async fn list(&self, query: &DocumentQuery) -> Result<Vec<Document>, PortError> {
        let documents = self.documents.read().await;
        let mut results: Vec<Document> = documents
            .values()
            .filter(|doc| query.matches(doc))
            .cloned()
            .collect();
        results.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
        if let Some(limit) = query.limit {
            results.truncate(limit as usize);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> FieldMap {
        match value {
            serde_json::Value::Object(map) => map,
            _ => FieldMap::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryDocumentStore::new();
        store
            .insert(DocType::Claim, "CLM-1", fields(json!({"status": "Reported"})))
            .await
            .unwrap();

        let doc = store.get(DocType::Claim, "CLM-1").await.unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.get_str("status"), Some("Reported"));
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let store = InMemoryDocumentStore::new();
        store.insert(DocType::Claim, "CLM-1", FieldMap::new()).await.unwrap();
        let err = store.insert(DocType::Claim, "CLM-1", FieldMap::new()).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .set_fields_if(DocType::Policy, "POL-404", &[], FieldMap::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_health_check() {
        let store = InMemoryDocumentStore::new();
        assert_eq!(store.health_check().await.status, AdapterHealth::Healthy);
    }
}
