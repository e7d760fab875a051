//! In-memory document store.
//!
//! Backs tests and ephemeral sessions. Supports fault injection per
//! operation and path prefix, and counts every request it receives so
//! callers can assert that no remote call was attempted.

use crate::store::path::is_within;
use crate::store::{
    generate_doc_id, merge_fields, CollectionPath, DocPath, Document, DocumentStore, Fields,
    StoreError, StoreResult,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Store operation kind, used to target injected faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Add,
    GetAll,
    Update,
    Delete,
}

#[derive(Debug, Clone)]
struct FaultRule {
    op: StoreOp,
    path_prefix: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: BTreeMap<CollectionPath, BTreeMap<String, Fields>>,
    faults: Vec<FaultRule>,
}

/// `DocumentStore` over process memory. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    state: Arc<Mutex<MemoryState>>,
    calls: Arc<AtomicUsize>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `op` at or below `path_prefix` fail with
    /// `StoreError::Unavailable` until `clear_faults` is called.
    pub fn inject_fault(&self, op: StoreOp, path_prefix: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.faults.push(FaultRule {
                op,
                path_prefix: path_prefix.into(),
            });
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.faults.clear();
        }
    }

    /// Number of requests received, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Total number of stored documents across all collections.
    pub fn document_count(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.collections.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    /// Reads one document body without counting it as a request.
    pub fn peek(&self, doc: &DocPath) -> Option<Fields> {
        let state = self.state.lock().ok()?;
        state.collections.get(&doc.collection)?.get(&doc.id).cloned()
    }

    fn begin(&self, op: StoreOp, target: &str) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        let faulted = state
            .faults
            .iter()
            .any(|rule| rule.op == op && is_within(target, &rule.path_prefix));
        if faulted {
            return Err(StoreError::Unavailable(format!(
                "injected {op:?} fault at {target}"
            )));
        }
        Ok(state)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn add(&self, collection: &CollectionPath, fields: Fields) -> StoreResult<String> {
        let mut state = self.begin(StoreOp::Add, collection.as_str())?;
        let docs = state.collections.entry(collection.clone()).or_default();
        let mut id = generate_doc_id();
        while docs.contains_key(&id) {
            id = generate_doc_id();
        }
        docs.insert(id.clone(), fields);
        Ok(id)
    }

    async fn get_all(&self, collection: &CollectionPath) -> StoreResult<Vec<Document>> {
        let state = self.begin(StoreOp::GetAll, collection.as_str())?;
        Ok(state
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update(&self, doc: &DocPath, fields: Fields) -> StoreResult<()> {
        let mut state = self.begin(StoreOp::Update, &doc.to_string())?;
        let existing = state
            .collections
            .get_mut(&doc.collection)
            .and_then(|docs| docs.get_mut(&doc.id))
            .ok_or_else(|| StoreError::NotFound(doc.clone()))?;
        merge_fields(existing, fields);
        Ok(())
    }

    async fn delete(&self, doc: &DocPath) -> StoreResult<()> {
        let mut state = self.begin(StoreOp::Delete, &doc.to_string())?;
        let removed = state
            .collections
            .get_mut(&doc.collection)
            .and_then(|docs| docs.remove(&doc.id));
        if removed.is_none() {
            return Err(StoreError::NotFound(doc.clone()));
        }
        if state
            .collections
            .get(&doc.collection)
            .is_some_and(BTreeMap::is_empty)
        {
            state.collections.remove(&doc.collection);
        }
        Ok(())
    }
}
