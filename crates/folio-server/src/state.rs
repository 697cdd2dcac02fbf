// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server state management

use crate::auth::AuthService;
use crate::config::ServerConfig;
use crate::mailer::Mailer;
use folio_local_db::Database;
use std::sync::Arc;

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    /// Content store
    pub db: Arc<Database>,

    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Session issuing and verification
    pub auth: Arc<AuthService>,

    /// Delivery of contact form messages
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Get database reference
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Get configuration reference
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
