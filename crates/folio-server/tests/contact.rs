// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

mod common;

use common::{spawn_server, spawn_server_with, test_config, RecordingMailer, ADMIN_EMAIL};
use serde_json::{json, Value};

fn message() -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "subject": "Engines",
        "message": "Hello <b>there</b>",
    })
}

#[tokio::test]
async fn contact_message_is_mailed_to_the_owner() {
    let server = spawn_server().await;

    let response = server.post_json("/site/contact", &message()).await;
    assert_eq!(response.status(), 200);
    let receipt: Value = response.json().await.unwrap();
    assert_eq!(receipt["message"], "Message sent successfully");
    assert_eq!(receipt["delivered"], true);

    let sent = server.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec![ADMIN_EMAIL.to_string()]);
    assert_eq!(sent[0].subject, "New Contact: Engines");
    assert_eq!(sent[0].reply_to.as_deref(), Some("ada@example.com"));
    assert!(sent[0].html.contains("&lt;b&gt;there&lt;/b&gt;"));
}

#[tokio::test]
async fn missing_fields_are_listed() {
    let server = spawn_server().await;

    let response = server
        .post_json(
            "/site/contact",
            &json!({ "firstName": "Ada", "email": "ada@example.com", "message": "Hi" }),
        )
        .await;
    assert_eq!(response.status(), 400);
    let problem: Value = response.json().await.unwrap();
    assert_eq!(
        problem["detail"],
        "Please fill in all required fields: Last Name, Subject"
    );
    assert!(server.mailer.sent().is_empty());
}

#[tokio::test]
async fn invalid_sender_address_is_rejected() {
    let server = spawn_server().await;
    let mut body = message();
    body["email"] = json!("not-an-address");

    let response = server.post_json("/site/contact", &body).await;
    assert_eq!(response.status(), 400);
    let problem: Value = response.json().await.unwrap();
    assert_eq!(problem["detail"], "Please enter a valid email address");
}

#[tokio::test]
async fn delivery_failure_still_accepts_the_message() {
    let server = spawn_server_with(test_config(), RecordingMailer::failing()).await;

    let response = server.post_json("/site/contact", &message()).await;
    assert_eq!(response.status(), 200);
    let receipt: Value = response.json().await.unwrap();
    assert_eq!(receipt["delivered"], false);
    assert_eq!(receipt["message"], "Message received");
    assert_eq!(server.mailer.sent().len(), 1);
}

#[tokio::test]
async fn repeat_sender_is_accepted() {
    let server = spawn_server().await;

    let first = server.post_json("/site/contact", &message()).await;
    assert_eq!(first.status(), 200);

    let mut follow_up = message();
    follow_up["subject"] = json!("Engines, again");
    let second = server.post_json("/site/contact", &follow_up).await;
    assert_eq!(second.status(), 200);
    let receipt: Value = second.json().await.unwrap();
    assert_eq!(receipt["delivered"], true);

    let subjects: Vec<String> = server.mailer.sent().into_iter().map(|m| m.subject).collect();
    assert_eq!(subjects, vec!["New Contact: Engines", "New Contact: Engines, again"]);
}
