use std::collections::HashMap;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use spin_sdk::key_value::Store;

use crate::config::{document_key, USERS_COLLECTION};
use crate::core::errors::{AppError, Result};
use crate::models::models::UserDocument;

pub type Document = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    Set(Value),
    /// Append each value not already present, keeping order.
    ArrayUnion(Vec<Value>),
    /// Remove every occurrence of each value.
    ArrayRemove(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub field: String,
    pub op: FieldOp,
}

impl FieldUpdate {
    pub fn set(field: &str, value: impl Into<Value>) -> Self {
        Self { field: field.to_string(), op: FieldOp::Set(value.into()) }
    }

    pub fn array_union<I, V>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            field: field.to_string(),
            op: FieldOp::ArrayUnion(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn array_remove<I, V>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            field: field.to_string(),
            op: FieldOp::ArrayRemove(values.into_iter().map(Into::into).collect()),
        }
    }
}

/// Applies field updates in order. A non-array field targeted by an array
/// operation is replaced, as a hosted document store would do.
pub fn apply_updates(doc: &mut Document, updates: &[FieldUpdate]) {
    for update in updates {
        match &update.op {
            FieldOp::Set(value) => {
                doc.insert(update.field.clone(), value.clone());
            }
            FieldOp::ArrayUnion(values) => {
                let entry = doc
                    .entry(update.field.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if !entry.is_array() {
                    *entry = Value::Array(Vec::new());
                }
                if let Value::Array(items) = entry {
                    for value in values {
                        if !items.contains(value) {
                            items.push(value.clone());
                        }
                    }
                }
            }
            FieldOp::ArrayRemove(values) => match doc.get_mut(&update.field) {
                Some(Value::Array(items)) => items.retain(|item| !values.contains(item)),
                _ => {
                    doc.insert(update.field.clone(), Value::Array(Vec::new()));
                }
            },
        }
    }
}

/// Per-collection document storage with point reads and field updates.
pub trait DocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    fn set(&self, collection: &str, id: &str, doc: Document) -> Result<()>;

    /// Fails with `NotFound` when the document does not exist.
    fn update(&self, collection: &str, id: &str, updates: &[FieldUpdate]) -> Result<()>;

    fn delete(&self, collection: &str, id: &str) -> Result<()>;
}

pub fn get_typed<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
) -> Result<Option<T>> {
    match store.get(collection, id)? {
        Some(doc) => Ok(Some(serde_json::from_value(Value::Object(doc))?)),
        None => Ok(None),
    }
}

pub fn set_typed<T: Serialize>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
    value: &T,
) -> Result<()> {
    match serde_json::to_value(value)? {
        Value::Object(doc) => store.set(collection, id, doc),
        _ => Err(AppError::Validation(format!(
            "{}/{} must serialize to an object",
            collection, id
        ))),
    }
}

pub fn read_user_doc(store: &dyn DocumentStore, uid: &str) -> Result<Option<UserDocument>> {
    get_typed(store, USERS_COLLECTION, uid)
}

pub fn write_user_doc(store: &dyn DocumentStore, uid: &str, doc: &UserDocument) -> Result<()> {
    set_typed(store, USERS_COLLECTION, uid, doc)
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: Mutex<HashMap<String, Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Document>>> {
        self.docs
            .lock()
            .map_err(|_| AppError::Storage("document map lock poisoned".to_string()))
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self.lock()?.get(&document_key(collection, id)).cloned())
    }

    fn set(&self, collection: &str, id: &str, doc: Document) -> Result<()> {
        self.lock()?.insert(document_key(collection, id), doc);
        Ok(())
    }

    fn update(&self, collection: &str, id: &str, updates: &[FieldUpdate]) -> Result<()> {
        let mut docs = self.lock()?;
        let doc = docs
            .get_mut(&document_key(collection, id))
            .ok_or_else(|| AppError::NotFound(collection.to_string(), id.to_string()))?;
        apply_updates(doc, updates);
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.lock()?.remove(&document_key(collection, id));
        Ok(())
    }
}

/// Documents persisted as JSON values in a Spin key-value store.
pub struct KvDocumentStore {
    store: Store,
}

impl KvDocumentStore {
    pub fn open(label: &str) -> Result<Self> {
        let store = Store::open(label)
            .map_err(|e| AppError::Storage(format!("cannot open kv store `{}`: {:?}", label, e)))?;
        Ok(Self { store })
    }
}

impl DocumentStore for KvDocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.store
            .get_json::<Document>(&document_key(collection, id))
            .map_err(|e| AppError::Storage(e.to_string()))
    }

    fn set(&self, collection: &str, id: &str, doc: Document) -> Result<()> {
        self.store
            .set_json(&document_key(collection, id), &doc)
            .map_err(|e| AppError::Storage(e.to_string()))
    }

    // Read-modify-write; the kv store has no field-level update.
    fn update(&self, collection: &str, id: &str, updates: &[FieldUpdate]) -> Result<()> {
        let mut doc = self
            .get(collection, id)?
            .ok_or_else(|| AppError::NotFound(collection.to_string(), id.to_string()))?;
        apply_updates(&mut doc, updates);
        self.set(collection, id, doc)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.store
            .delete(&document_key(collection, id))
            .map_err(|e| AppError::Storage(format!("{:?}", e)))
    }
}
