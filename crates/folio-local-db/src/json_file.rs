// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Collections persisted as one pretty-printed JSON array per file

use crate::backup;
use crate::document::{
    document_id, find_duplicate, merge_update, stamp_new, Document, UniqueCheck,
};
use crate::error::{Error, Result};
use crate::query::{matches, Query};
use crate::store::{CollectionOptions, DocumentStore};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct Cache {
    documents: Option<Vec<Document>>,
    modified: Option<SystemTime>,
}

/// A collection stored at `<dir>/<name>.json`
///
/// The parsed array is cached until the file's modification time moves past
/// the cached one. The lock is held across every read-modify-write.
#[derive(Debug)]
pub struct JsonFileCollection {
    name: String,
    dir: PathBuf,
    path: PathBuf,
    options: CollectionOptions,
    cache: Mutex<Cache>,
}

impl JsonFileCollection {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>, options: CollectionOptions) -> Self {
        let dir = dir.into();
        let name = name.into();
        let path = dir.join(format!("{}.json", name));
        Self {
            name,
            dir,
            path,
            options,
            cache: Mutex::new(Cache::default()),
        }
    }

    /// Location of the data file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self, cache: &mut Cache) -> Result<Vec<Document>> {
        let modified = match fs::metadata(&self.path).await {
            Ok(metadata) => metadata.modified().ok(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                cache.documents = Some(Vec::new());
                cache.modified = None;
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if let (Some(documents), Some(cached), Some(current)) =
            (&cache.documents, cache.modified, modified)
        {
            if current <= cached {
                return Ok(documents.clone());
            }
        }

        let documents = self.read_file().await?;
        debug!(collection = %self.name, count = documents.len(), "Loaded collection from disk");
        cache.documents = Some(documents.clone());
        cache.modified = modified;
        Ok(documents)
    }

    async fn read_file(&self) -> Result<Vec<Document>> {
        let content = fs::read_to_string(&self.path).await?;
        let value: Value = serde_json::from_str(&content).map_err(|e| Error::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let Value::Array(items) = value else {
            warn!(
                collection = %self.name,
                file = %self.path.display(),
                "Data file does not contain an array, treating collection as empty"
            );
            return Ok(Vec::new());
        };

        let total = items.len();
        let documents: Vec<Document> = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        if documents.len() != total {
            warn!(
                collection = %self.name,
                skipped = total - documents.len(),
                "Skipped non-object entries in data file"
            );
        }
        Ok(documents)
    }

    async fn save(&self, cache: &mut Cache, documents: Vec<Document>) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        if let Err(e) = backup::create_backup(&self.path, self.options.max_backups).await {
            warn!(collection = %self.name, error = %e, "Failed to back up data file");
        }

        let content = serde_json::to_string_pretty(&documents)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await?;
        fs::rename(&tmp_path, &self.path).await?;

        cache.modified = fs::metadata(&self.path)
            .await
            .ok()
            .and_then(|m| m.modified().ok());
        cache.documents = Some(documents);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create(&self, doc: Document) -> Result<Document> {
        let mut cache = self.cache.lock().await;
        let mut documents = self.load(&mut cache).await?;

        let doc = stamp_new(doc);
        let id_fields = [crate::document::ID_FIELD.to_string()];
        let unique_fields = &self.options.unique_fields;
        if let Some(err) = find_duplicate(&documents, &doc, &id_fields, UniqueCheck::Create)
            .or_else(|| find_duplicate(&documents, &doc, unique_fields, UniqueCheck::Create))
        {
            return Err(err);
        }

        documents.push(doc.clone());
        self.save(&mut cache, documents).await?;
        Ok(doc)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>> {
        let mut cache = self.cache.lock().await;
        let documents = self.load(&mut cache).await?;
        Ok(documents.into_iter().find(|doc| document_id(doc) == Some(id)))
    }

    async fn find(&self, query: &Query) -> Result<Vec<Document>> {
        let mut cache = self.cache.lock().await;
        let documents = self.load(&mut cache).await?;
        Ok(query.apply(&documents))
    }

    async fn find_all(&self) -> Result<Vec<Document>> {
        let mut cache = self.cache.lock().await;
        self.load(&mut cache).await
    }

    async fn update(&self, id: &str, patch: Document) -> Result<Option<Document>> {
        let mut cache = self.cache.lock().await;
        let mut documents = self.load(&mut cache).await?;

        let Some(index) = documents.iter().position(|doc| document_id(doc) == Some(id)) else {
            return Ok(None);
        };
        let check = UniqueCheck::Update(id);
        if let Some(err) = find_duplicate(&documents, &patch, &self.options.unique_fields, check) {
            return Err(err);
        }

        let updated = merge_update(&documents[index], patch);
        documents[index] = updated.clone();
        self.save(&mut cache, documents).await?;
        Ok(Some(updated))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut cache = self.cache.lock().await;
        let mut documents = self.load(&mut cache).await?;

        let before = documents.len();
        documents.retain(|doc| document_id(doc) != Some(id));
        if documents.len() == before {
            return Ok(false);
        }
        self.save(&mut cache, documents).await?;
        Ok(true)
    }

    async fn delete_many(&self, filter: &Document) -> Result<usize> {
        let mut cache = self.cache.lock().await;
        let mut documents = self.load(&mut cache).await?;

        let before = documents.len();
        documents.retain(|doc| !matches(doc, filter));
        let removed = before - documents.len();
        if removed > 0 {
            self.save(&mut cache, documents).await?;
        }
        Ok(removed)
    }

    async fn clear_cache(&self) {
        let mut cache = self.cache.lock().await;
        *cache = Cache::default();
    }
}
