// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

#![allow(dead_code)]

use async_trait::async_trait;
use folio_server::{
    config::{AuthConfig, RateLimitConfig, StorageConfig},
    dependencies::DefaultServerDependencies,
    mailer::{MailError, Mailer, OutgoingEmail},
    Server, ServerConfig,
};
use reqwest::Client;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const ADMIN_EMAIL: &str = "admin@madebywael.com";
pub const ADMIN_PASSWORD: &str = "Admin123!";

/// Mailer that keeps every message it is asked to send
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email.clone());
        if self.fail {
            return Err(MailError::NotConfigured("recording mailer set to fail".into()));
        }
        Ok(())
    }
}

pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    pub mailer: Arc<RecordingMailer>,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        storage: StorageConfig::in_memory(),
        auth: AuthConfig {
            session_secret: Some("integration-test-secret".into()),
            ..Default::default()
        },
        rate_limit: RateLimitConfig {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub async fn spawn_server() -> TestServer {
    spawn_server_with(test_config(), RecordingMailer::default()).await
}

pub async fn spawn_server_with(mut config: ServerConfig, mailer: RecordingMailer) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind to ephemeral port");
    let addr = listener.local_addr().expect("port");
    drop(listener);
    config.bind_addr = addr;

    let mailer = Arc::new(mailer);
    let deps = DefaultServerDependencies::with_mailer(config.clone(), mailer.clone())
        .await
        .expect("server deps");
    let server = Server::with_state(config, deps.into_state()).await.expect("server");

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });

    let base_url = format!("http://{}/api/v1", addr);
    wait_for_health(&base_url).await;

    TestServer {
        base_url,
        client: Client::new(),
        mailer,
        handle,
    }
}

async fn wait_for_health(base_url: &str) {
    let client = Client::new();
    let healthz = format!("{}/healthz", base_url);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        if let Ok(response) = client.get(&healthz).send().await {
            if response.status().is_success() {
                return;
            }
        }
        if tokio::time::Instant::now() > deadline {
            panic!("server did not become healthy at {}", healthz);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in as the configured administrator and return the bearer token
    pub async fn admin_token(&self) -> String {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .send()
            .await
            .expect("login request");
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.expect("login body");
        body["token"].as_str().expect("token").to_string()
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.expect("GET")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client.post(self.url(path)).json(body).send().await.expect("POST")
    }

    pub async fn admin_send(
        &self,
        method: reqwest::Method,
        path: &str,
        token: &str,
        body: Option<&Value>,
    ) -> reqwest::Response {
        let mut request = self.client.request(method, self.url(path)).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.expect("admin request")
    }
}
