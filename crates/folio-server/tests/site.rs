// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

mod common;

use common::{spawn_server, TestServer};
use reqwest::Method;
use serde_json::{json, Value};

async fn publish_post(server: &TestServer, token: &str, title: &str, tags: &[&str], published: bool) {
    let response = server
        .admin_send(
            Method::POST,
            "/blogs",
            token,
            Some(&json!({
                "title": title,
                "content": format!("Notes about {}", title),
                "tags": tags,
                "published": published,
            })),
        )
        .await;
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn blog_index_hides_drafts() {
    let server = spawn_server().await;
    let token = server.admin_token().await;

    publish_post(&server, &token, "Async Rust", &["rust"], true).await;
    publish_post(&server, &token, "Web Forms", &["web"], true).await;
    publish_post(&server, &token, "Unfinished", &["secret"], false).await;

    let index: Value = server.get("/site/blog").await.json().await.unwrap();
    assert_eq!(index["posts"].as_array().unwrap().len(), 2);
    assert_eq!(index["tags"], json!(["rust", "web"]));

    let rust: Value = server.get("/site/blog?tag=rust").await.json().await.unwrap();
    let posts = rust["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["slug"], "async-rust");
    assert_eq!(posts[0]["readingTimeMinutes"], 1);

    let article = server.get("/site/blog/async-rust").await;
    assert_eq!(article.status(), 200);
    let article: Value = article.json().await.unwrap();
    assert_eq!(article["title"], "Async Rust");

    let draft = server.get("/site/blog/unfinished").await;
    assert_eq!(draft.status(), 404);
    let problem: Value = draft.json().await.unwrap();
    assert_eq!(problem["detail"], "Blog post not found");
}

#[tokio::test]
async fn home_and_about_collect_singletons() {
    let server = spawn_server().await;
    let token = server.admin_token().await;

    server
        .admin_send(
            Method::POST,
            "/personal",
            &token,
            Some(&json!({ "name": "Sam", "bio": "Builds things" })),
        )
        .await;
    server
        .admin_send(
            Method::POST,
            "/projects",
            &token,
            Some(&json!({
                "title": "Shown",
                "description": "Featured",
                "featured": true,
                "published": true,
            })),
        )
        .await;
    server
        .admin_send(
            Method::POST,
            "/projects",
            &token,
            Some(&json!({
                "title": "Hidden",
                "description": "Draft",
                "featured": true,
                "published": false,
            })),
        )
        .await;

    let home: Value = server.get("/site/home").await.json().await.unwrap();
    assert_eq!(home["personal"]["name"], "Sam");
    let featured = home["featuredProjects"].as_array().unwrap();
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0]["slug"], "shown");
    assert!(home["settings"].is_null());

    let about: Value = server.get("/site/about").await.json().await.unwrap();
    assert_eq!(about["personal"]["bio"], "Builds things");
    assert!(about["skills"].is_null());

    let projects: Value = server
        .get("/site/projects?featured=true")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(projects["projects"].as_array().unwrap().len(), 1);
}
