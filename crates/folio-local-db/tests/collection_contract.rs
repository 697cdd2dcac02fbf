// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Behaviour every backend must share, run against JSON files and SQLite

use folio_local_db::{CollectionOptions, Database, Document, Error, Query, SortOrder};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

fn doc(value: Value) -> Document {
    value.as_object().cloned().expect("object literal")
}

struct Fixture {
    db: Arc<Database>,
    _dir: Option<TempDir>,
}

fn json_backend() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_json_dir(dir.path().join("data"), CollectionOptions::default());
    Fixture {
        db: Arc::new(db),
        _dir: Some(dir),
    }
}

fn sqlite_backend() -> Fixture {
    let db = Database::open_in_memory(CollectionOptions::default()).unwrap();
    Fixture {
        db: Arc::new(db),
        _dir: None,
    }
}

async fn create_stamps_and_finds(fx: Fixture) {
    let blogs = fx.db.collection("blogs");
    let created = blogs
        .create(doc(json!({"title": "Hello", "slug": "hello", "tags": ["rust"]})))
        .await
        .unwrap();

    let id = created["id"].as_str().unwrap().to_string();
    assert!(created.contains_key("createdAt"));
    assert_eq!(created["createdAt"], created["updatedAt"]);

    let found = blogs.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(found, created);
    assert!(blogs.find_by_id("missing").await.unwrap().is_none());

    let by_tag = blogs.find_one(&doc(json!({"tags": "rust"}))).await.unwrap();
    assert_eq!(by_tag.unwrap()["id"], created["id"]);
}

async fn unique_fields_are_enforced(fx: Fixture) {
    let users = fx.db.collection("users");
    let first = users
        .create(doc(json!({"email": "a@example.com"})))
        .await
        .unwrap();
    let second = users
        .create(doc(json!({"email": "b@example.com"})))
        .await
        .unwrap();

    let err = users
        .create(doc(json!({"email": "a@example.com"})))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Record with email 'a@example.com' already exists");

    // Re-saving your own value is fine; taking someone else's is not
    let first_id = first["id"].as_str().unwrap();
    users
        .update(first_id, doc(json!({"email": "a@example.com", "fullName": "A"})))
        .await
        .unwrap()
        .unwrap();
    let err = users
        .update(second["id"].as_str().unwrap(), doc(json!({"email": "a@example.com"})))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Duplicate { ref field, .. } if field == "email"));

    // A repeated empty value collides on create but never on update
    users.create(doc(json!({"email": ""}))).await.unwrap();
    let err = users.create(doc(json!({"email": ""}))).await.unwrap_err();
    assert!(err.is_duplicate());
    users
        .update(first_id, doc(json!({"email": ""})))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(users.count(None).await.unwrap(), 3);
}

async fn update_merges_shallowly(fx: Fixture) {
    let projects = fx.db.collection("projects");
    let created = projects
        .create(doc(json!({"title": "Old", "featured": true, "technologies": ["Go"]})))
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    let updated = projects
        .update(
            id,
            doc(json!({"title": "New", "id": "hijack", "createdAt": "1970-01-01T00:00:00Z"})),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_eq!(updated["title"], "New");
    assert_eq!(updated["featured"], true);
    assert_eq!(updated["technologies"], json!(["Go"]));

    assert!(projects
        .update("missing", doc(json!({"title": "x"})))
        .await
        .unwrap()
        .is_none());
}

async fn queries_filter_sort_and_page(fx: Fixture) {
    let posts = fx.db.collection("blogs");
    for (title, views, published) in [("a", 5, true), ("b", 9, false), ("c", 1, true), ("d", 7, true)] {
        posts
            .create(doc(json!({"title": title, "views": views, "published": published})))
            .await
            .unwrap();
    }

    let titles = |docs: Vec<Document>| -> Vec<String> {
        docs.iter()
            .map(|d| d["title"].as_str().unwrap().to_string())
            .collect()
    };

    let published = posts
        .find(&Query::new().filter("published", true).sort_by("views", SortOrder::Desc))
        .await
        .unwrap();
    assert_eq!(titles(published), vec!["d", "a", "c"]);

    let page = posts
        .find(&Query::new().sort_by("title", SortOrder::Asc).offset(1).limit(2))
        .await
        .unwrap();
    assert_eq!(titles(page), vec!["b", "c"]);

    assert_eq!(titles(posts.find_all().await.unwrap()), vec!["a", "b", "c", "d"]);
    assert_eq!(
        posts.count(Some(&doc(json!({"published": false})))).await.unwrap(),
        1
    );
}

async fn deletes_single_and_many(fx: Fixture) {
    let social = fx.db.collection("social");
    let keep = social.create(doc(json!({"kind": "keep"}))).await.unwrap();
    social.create(doc(json!({"kind": "drop"}))).await.unwrap();
    social.create(doc(json!({"kind": "drop"}))).await.unwrap();

    assert_eq!(social.delete_many(&doc(json!({"kind": "none"}))).await.unwrap(), 0);
    assert_eq!(social.delete_many(&doc(json!({"kind": "drop"}))).await.unwrap(), 2);

    let id = keep["id"].as_str().unwrap();
    assert!(social.delete(id).await.unwrap());
    assert!(!social.delete(id).await.unwrap());
    assert_eq!(social.count(None).await.unwrap(), 0);
}

async fn handles_share_one_store(fx: Fixture) {
    let a = fx.db.collection("settings");
    let b = fx.db.collection("settings");
    assert!(Arc::ptr_eq(&a, &b));

    a.create(doc(json!({"title": "Site"}))).await.unwrap();
    assert_eq!(b.count(None).await.unwrap(), 1);
    fx.db.ping().await.unwrap();
}

async fn concurrent_creates_are_serialised(fx: Fixture) {
    let store = fx.db.collection("blogs");
    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .create(doc(json!({"slug": format!("post-{i}")})))
                    .await
                    .unwrap();
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(store.count(None).await.unwrap(), 20);
}

macro_rules! backend_tests {
    ($($name:ident),* $(,)?) => {
        mod json_files {
            use super::*;
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(json_backend()).await;
                }
            )*
        }

        mod sqlite {
            use super::*;
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(sqlite_backend()).await;
                }
            )*
        }
    };
}

backend_tests!(
    create_stamps_and_finds,
    unique_fields_are_enforced,
    update_merges_shallowly,
    queries_filter_sort_and_page,
    deletes_single_and_many,
    handles_share_one_store,
    concurrent_creates_are_serialised,
);
