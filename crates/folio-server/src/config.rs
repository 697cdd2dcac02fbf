// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server configuration
//!
//! Built from defaults, then an optional TOML file, then command-line flags
//! and environment variables (see [`ConfigOverrides`]).

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Session secret used only when development defaults are explicitly allowed
pub const DEV_SESSION_SECRET: &str = "folio-development-session-secret";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,

    /// Allow any origin (development)
    pub enable_cors: bool,

    /// Origins allowed when `enable_cors` is off
    pub cors_origins: Vec<String>,

    pub storage: StorageConfig,

    pub auth: AuthConfig,

    /// The built-in administrator account
    pub admin: AdminAccount,

    pub rate_limit: RateLimitConfig,

    pub mail: MailConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            enable_cors: false,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
            admin: AdminAccount::default(),
            rate_limit: RateLimitConfig::default(),
            mail: MailConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

/// Where content is stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per collection under `data_dir`
    #[default]
    Json,
    /// A SQLite document database at `database_path`
    Sqlite,
    /// A throwaway in-memory database
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    /// Backups kept per JSON data file
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Json,
            data_dir: PathBuf::from("./data"),
            database_path: PathBuf::from("./data/folio.db"),
            max_backups: 5,
        }
    }
}

impl StorageConfig {
    pub fn in_memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AuthConfig {
    /// HMAC secret for session tokens
    pub session_secret: Option<String>,

    /// Session lifetime in seconds
    pub session_ttl_secs: u64,

    /// Fall back to [`DEV_SESSION_SECRET`] when no secret is configured
    pub allow_dev_secret: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: None,
            session_ttl_secs: 24 * 60 * 60,
            allow_dev_secret: false,
        }
    }
}

/// Credentials of the built-in administrator
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminAccount {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Default for AdminAccount {
    fn default() -> Self {
        Self {
            email: "admin@madebywael.com".to_string(),
            password: "Admin123!".to_string(),
            name: "Admin User".to_string(),
        }
    }
}

impl std::fmt::Debug for AdminAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAccount")
            .field("email", &self.email)
            .field("password", &folio_logging::redact(&self.password))
            .field("name", &self.name)
            .finish()
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RateLimitConfig {
    pub enabled: bool,

    /// Requests per minute per client
    pub requests_per_minute: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: 120,
        }
    }
}

/// How contact form messages are forwarded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    /// Only log the message
    #[default]
    Log,
    /// Send through the Resend HTTP API
    Resend,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MailConfig {
    pub provider: MailProvider,
    pub resend_api_key: Option<String>,
    pub resend_api_url: String,
    /// Sender address used for outgoing mail
    pub from: String,
    /// Inbox that receives contact form messages
    pub to: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            provider: MailProvider::Log,
            resend_api_key: None,
            resend_api_url: "https://api.resend.com/emails".to_string(),
            from: "onboarding@resend.dev".to_string(),
            to: None,
        }
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("provider", &self.provider)
            .field(
                "resend_api_key",
                &self.resend_api_key.as_ref().map(folio_logging::redact),
            )
            .field("resend_api_url", &self.resend_api_url)
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

/// Command-line and environment overrides applied on top of the file config
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigOverrides {
    /// Bind address for the server
    #[arg(long, global = true, env = "FOLIO_BIND")]
    pub bind: Option<SocketAddr>,

    /// Allow any CORS origin (development)
    #[arg(long, global = true)]
    pub cors: bool,

    /// Storage backend
    #[arg(long, global = true, value_enum, env = "FOLIO_STORAGE")]
    pub storage: Option<StorageBackend>,

    /// Directory holding the JSON data files
    #[arg(long, global = true, env = "FOLIO_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, global = true, env = "FOLIO_DATABASE")]
    pub database: Option<PathBuf>,

    /// Secret used to sign session tokens
    #[arg(long, global = true, env = "FOLIO_SESSION_SECRET", hide_env_values = true)]
    pub session_secret: Option<String>,

    /// Use a built-in session secret when none is configured (development only)
    #[arg(long, global = true)]
    pub allow_dev_secret: bool,

    #[arg(long, global = true, env = "ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    #[arg(long, global = true, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    #[arg(long, global = true, env = "ADMIN_NAME")]
    pub admin_name: Option<String>,

    /// Requests per minute per client
    #[arg(long, global = true, env = "FOLIO_RATE_LIMIT")]
    pub rate_limit: Option<u64>,

    /// Mail provider for contact form messages
    #[arg(long, global = true, value_enum, env = "FOLIO_MAIL_PROVIDER")]
    pub mail_provider: Option<MailProvider>,

    #[arg(long, global = true, env = "RESEND_API_KEY", hide_env_values = true)]
    pub resend_api_key: Option<String>,

    /// Inbox receiving contact form messages
    #[arg(long, global = true, env = "MY_EMAIL")]
    pub mail_to: Option<String>,
}

impl ConfigOverrides {
    /// Apply every override that was given
    pub fn apply(self, config: &mut ServerConfig) {
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if self.cors {
            config.enable_cors = true;
        }
        if let Some(backend) = self.storage {
            config.storage.backend = backend;
        }
        if let Some(dir) = self.data_dir {
            config.storage.data_dir = dir;
        }
        if let Some(path) = self.database {
            config.storage.database_path = path;
        }
        if self.session_secret.is_some() {
            config.auth.session_secret = self.session_secret;
        }
        if self.allow_dev_secret {
            config.auth.allow_dev_secret = true;
        }
        if let Some(email) = self.admin_email {
            config.admin.email = email;
        }
        if let Some(password) = self.admin_password {
            config.admin.password = password;
        }
        if let Some(name) = self.admin_name {
            config.admin.name = name;
        }
        if let Some(limit) = self.rate_limit {
            config.rate_limit.requests_per_minute = limit;
        }
        if let Some(provider) = self.mail_provider {
            config.mail.provider = provider;
        }
        if self.resend_api_key.is_some() {
            config.mail.resend_api_key = self.resend_api_key;
        }
        if self.mail_to.is_some() {
            config.mail.to = self.mail_to;
        }
    }
}
