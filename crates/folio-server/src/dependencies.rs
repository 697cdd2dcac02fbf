// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Dependency wiring for the REST server

use crate::{
    auth::{resolve_session_secret, AuthService},
    config::{ServerConfig, StorageBackend, StorageConfig},
    mailer::{build_mailer, Mailer},
    state::AppState,
};
use anyhow::{Context, Result};
use folio_api_contract::collections;
use folio_local_db::{CollectionOptions, Database};
use std::sync::Arc;
use tracing::info;

/// Open the content store selected by `storage`
pub fn open_database(storage: &StorageConfig) -> Result<Database> {
    let options = CollectionOptions {
        max_backups: storage.max_backups,
        ..CollectionOptions::default()
    };

    let db = match storage.backend {
        StorageBackend::Json => Database::open_json_dir(&storage.data_dir, options),
        StorageBackend::Sqlite => Database::open_sqlite(&storage.database_path, options)
            .with_context(|| {
                format!("Failed to open database {}", storage.database_path.display())
            })?,
        StorageBackend::Memory => Database::open_in_memory(options)?,
    };
    // Visitors may write more than once from the same address
    let messages = CollectionOptions {
        unique_fields: Vec::new(),
        max_backups: storage.max_backups,
    };
    let db = db.with_collection_options(collections::MESSAGES, messages);

    info!(storage = %db.describe(), "Content store opened");
    Ok(db)
}

/// Default dependency builder: configured store, auth, and mailer
pub struct DefaultServerDependencies {
    state: AppState,
}

impl DefaultServerDependencies {
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let mailer = build_mailer(&config.mail).context("Failed to configure mail delivery")?;
        Self::with_mailer(config, mailer).await
    }

    /// Build dependencies around a caller-supplied mailer
    pub async fn with_mailer(config: ServerConfig, mailer: Arc<dyn Mailer>) -> Result<Self> {
        let secret = resolve_session_secret(&config.auth)?;
        let db = Arc::new(open_database(&config.storage)?);
        let auth = Arc::new(AuthService::new(
            &secret,
            &config.auth,
            config.admin.clone(),
            &db,
        ));
        info!(mailer = mailer.name(), "Mail delivery configured");

        let state = AppState {
            db,
            config: Arc::new(config),
            auth,
            mailer,
        };
        Ok(Self { state })
    }

    /// Consume the dependency builder and return the resulting app state
    pub fn into_state(self) -> AppState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;

    #[tokio::test]
    async fn startup_requires_session_secret() {
        let config = ServerConfig {
            storage: StorageConfig::in_memory(),
            ..Default::default()
        };
        assert!(DefaultServerDependencies::new(config).await.is_err());
    }

    #[tokio::test]
    async fn json_backend_uses_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            storage: StorageConfig {
                backend: StorageBackend::Json,
                data_dir: dir.path().join("data"),
                ..Default::default()
            },
            auth: AuthConfig {
                session_secret: Some("test".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let state = DefaultServerDependencies::new(config).await.unwrap().into_state();
        assert!(state.db().describe().contains("data"));
        assert_eq!(state.mailer.name(), "log");
    }
}
