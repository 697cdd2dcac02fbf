// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The database handle that hands out shared collections

use crate::collection::Collection;
use crate::error::Result;
use crate::json_file::JsonFileCollection;
use crate::sqlite::{SqliteCollection, SqliteDatabase};
use crate::store::{CollectionOptions, DocumentStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::info;

#[derive(Debug)]
enum Backend {
    JsonDir(PathBuf),
    Sqlite(Arc<SqliteDatabase>),
}

/// Entry point to every collection of one data source
///
/// Asking twice for the same name yields the same store, so its cache and
/// write lock are shared.
pub struct Database {
    backend: Backend,
    options: CollectionOptions,
    overrides: HashMap<String, CollectionOptions>,
    collections: Mutex<HashMap<String, Arc<dyn DocumentStore>>>,
    write_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("backend", &self.backend)
            .field("options", &self.options)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// JSON files under `dir`, one per collection
    pub fn open_json_dir(dir: impl Into<PathBuf>, options: CollectionOptions) -> Self {
        let dir = dir.into();
        info!(dir = %dir.display(), "Using JSON file storage");
        Self::with_backend(Backend::JsonDir(dir), options)
    }

    /// A SQLite database file
    pub fn open_sqlite(path: impl AsRef<Path>, options: CollectionOptions) -> Result<Self> {
        let path = path.as_ref();
        let db = SqliteDatabase::open(path)?;
        info!(path = %path.display(), "Using SQLite document storage");
        Ok(Self::with_backend(Backend::Sqlite(Arc::new(db)), options))
    }

    /// A throwaway SQLite database in memory
    pub fn open_in_memory(options: CollectionOptions) -> Result<Self> {
        let db = SqliteDatabase::open_in_memory()?;
        Ok(Self::with_backend(Backend::Sqlite(Arc::new(db)), options))
    }

    fn with_backend(backend: Backend, options: CollectionOptions) -> Self {
        Self {
            backend,
            options,
            overrides: HashMap::new(),
            collections: Mutex::new(HashMap::new()),
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Open the collection `name` with `options` instead of the shared ones
    pub fn with_collection_options(mut self, name: &str, options: CollectionOptions) -> Self {
        self.overrides.insert(name.to_string(), options);
        self
    }

    /// Options the collection `name` is opened with
    pub fn options_for(&self, name: &str) -> &CollectionOptions {
        self.overrides.get(name).unwrap_or(&self.options)
    }

    /// The shared store for `name`
    pub fn collection(&self, name: &str) -> Arc<dyn DocumentStore> {
        let mut collections = self.collections.lock().unwrap_or_else(|p| p.into_inner());
        collections
            .entry(name.to_string())
            .or_insert_with(|| self.make_store(name))
            .clone()
    }

    /// The shared store for `name`, decoding into `T`
    pub fn typed<T: Serialize + DeserializeOwned>(&self, name: &str) -> Collection<T> {
        Collection::new(self.collection(name))
    }

    /// Lock for callers that read a document, change it and write it back
    ///
    /// Store calls are atomic one at a time; holding this guard keeps another
    /// read-modify-write of the same collection from interleaving.
    pub fn write_lock(&self, name: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.write_locks.lock().unwrap_or_else(|p| p.into_inner());
        locks.entry(name.to_string()).or_default().clone()
    }

    fn make_store(&self, name: &str) -> Arc<dyn DocumentStore> {
        let options = self.options_for(name).clone();
        match &self.backend {
            Backend::JsonDir(dir) => Arc::new(JsonFileCollection::new(dir.clone(), name, options)),
            Backend::Sqlite(db) => Arc::new(SqliteCollection::new(db.clone(), name, options)),
        }
    }

    /// Confirm the underlying storage is usable
    pub async fn ping(&self) -> Result<()> {
        match &self.backend {
            Backend::JsonDir(dir) => {
                tokio::fs::create_dir_all(dir).await?;
                tokio::fs::metadata(dir).await?;
                Ok(())
            }
            Backend::Sqlite(db) => db.ping(),
        }
    }

    /// Short description for logs and the readiness probe
    pub fn describe(&self) -> String {
        match &self.backend {
            Backend::JsonDir(dir) => format!("json:{}", dir.display()),
            Backend::Sqlite(_) => "sqlite".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ping_creates_the_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("nested").join("data");
        let db = Database::open_json_dir(&data, CollectionOptions::default());

        assert!(!data.exists());
        db.ping().await.unwrap();
        assert!(data.is_dir());
        assert!(db.describe().starts_with("json:"));
    }

    #[tokio::test]
    async fn in_memory_database_is_sqlite() {
        let db = Database::open_in_memory(CollectionOptions::default()).unwrap();
        db.ping().await.unwrap();
        assert_eq!(db.describe(), "sqlite");
    }

    #[tokio::test]
    async fn collections_can_override_options() {
        let db = Database::open_in_memory(CollectionOptions::default())
            .unwrap()
            .with_collection_options(
                "messages",
                CollectionOptions {
                    unique_fields: Vec::new(),
                    ..Default::default()
                },
            );
        assert!(db.options_for("messages").unique_fields.is_empty());
        assert_eq!(db.options_for("users").unique_fields, vec!["slug", "email"]);

        let messages = db.collection("messages");
        for _ in 0..2 {
            messages
                .create(serde_json::json!({"email": "a@example.com"}).as_object().cloned().unwrap())
                .await
                .unwrap();
        }
        assert_eq!(messages.count(None).await.unwrap(), 2);

        let users = db.collection("users");
        users
            .create(serde_json::json!({"email": "a@example.com"}).as_object().cloned().unwrap())
            .await
            .unwrap();
        assert!(users
            .create(serde_json::json!({"email": "a@example.com"}).as_object().cloned().unwrap())
            .await
            .unwrap_err()
            .is_duplicate());
    }

    #[test]
    fn write_locks_are_shared_per_collection() {
        let db = Database::open_in_memory(CollectionOptions::default()).unwrap();
        assert!(Arc::ptr_eq(&db.write_lock("skills"), &db.write_lock("skills")));
        assert!(!Arc::ptr_eq(&db.write_lock("skills"), &db.write_lock("blogs")));
    }
}
