// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The collection interface shared by every storage backend

use crate::document::Document;
use crate::error::Result;
use crate::query::Query;
use async_trait::async_trait;

/// Per-collection behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOptions {
    /// Fields whose values must be unique across the collection
    pub unique_fields: Vec<String>,
    /// Timestamped backups kept next to a JSON data file
    pub max_backups: usize,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            unique_fields: vec!["slug".to_string(), "email".to_string()],
            max_backups: 5,
        }
    }
}

/// A named collection of JSON documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Collection name
    fn name(&self) -> &str;

    /// Insert a new document, stamping id and timestamps
    async fn create(&self, doc: Document) -> Result<Document>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>>;

    async fn find(&self, query: &Query) -> Result<Vec<Document>>;

    /// Every document in insertion order
    async fn find_all(&self) -> Result<Vec<Document>>;

    async fn find_one(&self, filter: &Document) -> Result<Option<Document>> {
        let query = Query::matching(filter.clone()).limit(1);
        Ok(self.find(&query).await?.into_iter().next())
    }

    /// Shallow-merge `patch` into the document with `id`
    ///
    /// Returns `None` when no such document exists.
    async fn update(&self, id: &str, patch: Document) -> Result<Option<Document>>;

    /// Remove one document; `true` if it existed
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Remove every matching document and return how many went away
    async fn delete_many(&self, filter: &Document) -> Result<usize>;

    async fn count(&self, filter: Option<&Document>) -> Result<usize> {
        match filter {
            Some(filter) => Ok(self.find(&Query::matching(filter.clone())).await?.len()),
            None => Ok(self.find_all().await?.len()),
        }
    }

    /// Drop any in-memory copy so the next read goes to storage
    async fn clear_cache(&self) {}
}
