// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Folio REST API server
//!
//! Serves the portfolio content (blog posts, projects, profile, skills,
//! settings), the read models behind the public pages, the contact form,
//! and the admin-only account and content management endpoints.

pub mod auth;
pub mod config;
pub mod dependencies;
pub mod error;
pub mod handlers;
pub mod mailer;
pub mod middleware;
pub mod seed;
pub mod server;
pub mod services;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::Server;
pub use state::AppState;
