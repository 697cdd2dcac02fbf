// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Typed access to a document collection

use crate::document::{to_document, Document};
use crate::error::Result;
use crate::query::Query;
use crate::store::DocumentStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// A collection whose documents decode into `T`
pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("name", &self.store.name()).finish()
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        self.store.name()
    }

    /// The untyped store underneath
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Create a record from any serializable input
    pub async fn create<I: Serialize + ?Sized>(&self, input: &I) -> Result<T> {
        self.create_document(to_document(input)?).await
    }

    pub async fn create_document(&self, doc: Document) -> Result<T> {
        decode(self.store.create(doc).await?)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        self.store.find_by_id(id).await?.map(decode).transpose()
    }

    pub async fn find(&self, query: &Query) -> Result<Vec<T>> {
        self.store.find(query).await?.into_iter().map(decode).collect()
    }

    pub async fn find_all(&self) -> Result<Vec<T>> {
        self.store.find_all().await?.into_iter().map(decode).collect()
    }

    pub async fn find_one(&self, filter: &Document) -> Result<Option<T>> {
        self.store.find_one(filter).await?.map(decode).transpose()
    }

    /// First record in insertion order, for single-record collections
    pub async fn first(&self) -> Result<Option<T>> {
        self.store.find_all().await?.into_iter().next().map(decode).transpose()
    }

    /// Shallow-merge a serializable patch into the record with `id`
    pub async fn update<I: Serialize + ?Sized>(&self, id: &str, patch: &I) -> Result<Option<T>> {
        self.update_document(id, to_document(patch)?).await
    }

    pub async fn update_document(&self, id: &str, patch: Document) -> Result<Option<T>> {
        self.store.update(id, patch).await?.map(decode).transpose()
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.store.delete(id).await
    }

    pub async fn delete_many(&self, filter: &Document) -> Result<usize> {
        self.store.delete_many(filter).await
    }

    pub async fn count(&self, filter: Option<&Document>) -> Result<usize> {
        self.store.count(filter).await
    }
}

fn decode<T: DeserializeOwned>(doc: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}
