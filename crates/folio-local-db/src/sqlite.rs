// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Document collections stored in a single SQLite database
//!
//! Each document is one row of JSON text. Filtering and sorting run over the
//! decoded documents so both backends answer queries identically.

use crate::document::{
    document_id, find_duplicate, merge_update, stamp_new, Document, UniqueCheck, ID_FIELD,
};
use crate::error::{Error, Result};
use crate::query::{matches, Query};
use crate::store::{CollectionOptions, DocumentStore};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// A shared SQLite connection holding every collection
#[derive(Debug)]
pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    const SCHEMA: &'static str = r"
        CREATE TABLE IF NOT EXISTS documents (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            body TEXT NOT NULL,
            UNIQUE (collection, id)
        );

        CREATE INDEX IF NOT EXISTS idx_documents_collection
        ON documents(collection, seq);
    ";

    /// Open or create the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::initialize(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute_batch(Self::SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::Poisoned)
    }

    /// Check that the connection still answers queries
    pub fn ping(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

fn load_all(conn: &Connection, collection: &str) -> Result<Vec<Document>> {
    let mut stmt =
        conn.prepare_cached("SELECT body FROM documents WHERE collection = ?1 ORDER BY seq")?;
    let rows = stmt.query_map(params![collection], |row| row.get::<_, String>(0))?;

    let mut documents = Vec::new();
    for body in rows {
        documents.push(decode(&body?)?);
    }
    Ok(documents)
}

fn decode(body: &str) -> Result<Document> {
    match serde_json::from_str(body)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(Error::NotAnObject),
    }
}

/// One named collection inside a [`SqliteDatabase`]
///
/// Every call runs on tokio's blocking pool so rusqlite I/O never stalls the
/// async workers.
#[derive(Debug, Clone)]
pub struct SqliteCollection {
    db: Arc<SqliteDatabase>,
    name: String,
    options: CollectionOptions,
}

impl SqliteCollection {
    pub fn new(db: Arc<SqliteDatabase>, name: impl Into<String>, options: CollectionOptions) -> Self {
        Self {
            db,
            name: name.into(),
            options,
        }
    }

    /// Run `f` against the locked connection off the async runtime
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &str) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let name = self.name.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = db.lock()?;
            f(&mut *conn, name.as_str())
        })
        .await
        .map_err(|e| Error::Task(e.to_string()))?
    }
}

#[async_trait]
impl DocumentStore for SqliteCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create(&self, doc: Document) -> Result<Document> {
        let unique_fields = self.options.unique_fields.clone();
        self.blocking(move |conn, name| {
            let documents = load_all(conn, name)?;

            let doc = stamp_new(doc);
            let id_fields = [ID_FIELD.to_string()];
            if let Some(err) = find_duplicate(&documents, &doc, &id_fields, UniqueCheck::Create)
                .or_else(|| find_duplicate(&documents, &doc, &unique_fields, UniqueCheck::Create))
            {
                return Err(err);
            }

            let id = document_id(&doc).unwrap_or_default();
            conn.execute(
                "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
                params![name, id, serde_json::to_string(&doc)?],
            )?;
            debug!(collection = %name, id, "Inserted document");
            Ok(doc)
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>> {
        let id = id.to_string();
        self.blocking(move |conn, name| {
            let body: Option<String> = conn
                .query_row(
                    "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                    params![name, id],
                    |row| row.get(0),
                )
                .optional()?;
            body.as_deref().map(decode).transpose()
        })
        .await
    }

    async fn find(&self, query: &Query) -> Result<Vec<Document>> {
        let query = query.clone();
        self.blocking(move |conn, name| Ok(query.apply(&load_all(conn, name)?)))
            .await
    }

    async fn find_all(&self) -> Result<Vec<Document>> {
        self.blocking(|conn, name| load_all(conn, name)).await
    }

    async fn update(&self, id: &str, patch: Document) -> Result<Option<Document>> {
        let id = id.to_string();
        let unique_fields = self.options.unique_fields.clone();
        self.blocking(move |conn, name| {
            let documents = load_all(conn, name)?;

            let Some(existing) = documents.iter().find(|doc| document_id(doc) == Some(id.as_str()))
            else {
                return Ok(None);
            };
            let check = UniqueCheck::Update(id.as_str());
            if let Some(err) = find_duplicate(&documents, &patch, &unique_fields, check) {
                return Err(err);
            }

            let updated = merge_update(existing, patch);
            conn.execute(
                "UPDATE documents SET body = ?3 WHERE collection = ?1 AND id = ?2",
                params![name, id, serde_json::to_string(&updated)?],
            )?;
            Ok(Some(updated))
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.blocking(move |conn, name| {
            let removed = conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![name, id],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    async fn delete_many(&self, filter: &Document) -> Result<usize> {
        let filter = filter.clone();
        self.blocking(move |conn, name| {
            let doomed: Vec<String> = load_all(conn, name)?
                .iter()
                .filter(|doc| matches(doc, &filter))
                .filter_map(|doc| document_id(doc).map(str::to_string))
                .collect();
            if doomed.is_empty() {
                return Ok(0);
            }

            let tx = conn.transaction()?;
            {
                let mut stmt =
                    tx.prepare_cached("DELETE FROM documents WHERE collection = ?1 AND id = ?2")?;
                for id in &doomed {
                    stmt.execute(params![name, id])?;
                }
            }
            tx.commit()?;
            Ok(doomed.len())
        })
        .await
    }

    async fn count(&self, filter: Option<&Document>) -> Result<usize> {
        let filter = filter.cloned();
        self.blocking(move |conn, name| match filter {
            Some(filter) => Ok(load_all(conn, name)?
                .iter()
                .filter(|doc| matches(doc, &filter))
                .count()),
            None => {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(usize::try_from(count).unwrap_or_default())
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn collections_are_isolated_by_name() {
        let db = Arc::new(SqliteDatabase::open_in_memory().unwrap());
        let blogs = SqliteCollection::new(db.clone(), "blogs", CollectionOptions::default());
        let projects = SqliteCollection::new(db.clone(), "projects", CollectionOptions::default());

        let doc = json!({"slug": "shared"}).as_object().cloned().unwrap();
        blogs.create(doc.clone()).await.unwrap();
        projects.create(doc).await.unwrap();

        assert_eq!(blogs.count(None).await.unwrap(), 1);
        assert_eq!(projects.count(None).await.unwrap(), 1);
        db.ping().unwrap();
    }

    #[test]
    fn opens_file_database_in_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("folio.db");
        SqliteDatabase::open(&path).unwrap().ping().unwrap();
        assert!(path.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn file_database_serves_concurrent_writers() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(SqliteDatabase::open(dir.path().join("folio.db")).unwrap());
        let notes = SqliteCollection::new(db, "notes", CollectionOptions::default());

        let mut tasks = Vec::new();
        for i in 0..16 {
            let notes = notes.clone();
            tasks.push(tokio::spawn(async move {
                notes
                    .create(json!({"slug": format!("note-{i}")}).as_object().cloned().unwrap())
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(notes.count(None).await.unwrap(), 16);

        let filter = json!({"slug": "note-3"}).as_object().cloned().unwrap();
        assert_eq!(notes.delete_many(&filter).await.unwrap(), 1);
        assert_eq!(notes.count(None).await.unwrap(), 15);
    }
}
