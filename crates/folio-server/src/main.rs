// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Folio REST API server binary

use anyhow::Context;
use clap::{Parser, Subcommand};
use folio_logging::CliLoggingArgs;
use folio_server::{
    config::ConfigOverrides, dependencies::open_database, seed, Server, ServerConfig,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Configuration file to load (TOML)
    #[arg(short, long, global = true, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(flatten)]
    logging: CliLoggingArgs,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Fill empty content collections with default records
    InitDb,
    /// Create the configured administrator account in the users collection
    SetupAdmin,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    args.logging.init("folio-server")?;

    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    args.overrides.apply(&mut config);
    tracing::debug!(?config, "Effective configuration");

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            tracing::info!("Starting Folio REST API server");
            let server = Server::new(config).await?;
            server.run().await?;
        }
        Command::InitDb => {
            let db = open_database(&config.storage)?;
            let report = seed::init_database(&db).await.context("Database initialization failed")?;
            tracing::info!(
                seeded = ?report.seeded,
                skipped = ?report.skipped,
                "Database initialization completed"
            );
        }
        Command::SetupAdmin => {
            let db = open_database(&config.storage)?;
            match seed::setup_admin(&db, &config.admin).await? {
                Some(user) => tracing::info!(email = %user.email, "Admin user created"),
                None => tracing::info!(email = %config.admin.email, "Admin user already exists"),
            }
        }
    }

    Ok(())
}
