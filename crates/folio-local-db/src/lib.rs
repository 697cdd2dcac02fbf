// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Folio's document store
//!
//! Collections of JSON documents with generated ids, timestamps, uniqueness on
//! configured fields, and simple queries. Two backends share one interface:
//!
//! - [`JsonFileCollection`]: one JSON array file per collection, cached by
//!   modification time, written atomically with rolling backups
//! - [`SqliteCollection`]: rows of JSON text in a SQLite database
//!
//! ```no_run
//! # async fn demo() -> folio_local_db::Result<()> {
//! use folio_local_db::{CollectionOptions, Database, Query, SortOrder};
//! use serde_json::json;
//!
//! let db = Database::open_json_dir("./data", CollectionOptions::default());
//! let blogs = db.collection("blogs");
//! blogs
//!     .create(json!({"title": "Hello", "slug": "hello"}).as_object().cloned().unwrap_or_default())
//!     .await?;
//! let newest = blogs
//!     .find(&Query::new().sort_by("createdAt", SortOrder::Desc).limit(3))
//!     .await?;
//! # let _ = newest;
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod collection;
pub mod database;
pub mod document;
pub mod error;
pub mod json_file;
pub mod query;
pub mod sqlite;
pub mod store;

pub use collection::Collection;
pub use database::Database;
pub use document::{generate_id, timestamp, to_document, Document};
pub use error::{Error, Result};
pub use json_file::JsonFileCollection;
pub use query::{Query, SortOrder};
pub use sqlite::{SqliteCollection, SqliteDatabase};
pub use store::{CollectionOptions, DocumentStore};
