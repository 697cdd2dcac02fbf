// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! OpenAPI specification endpoint

use axum::Json;

/// Serve the OpenAPI schema of the contract types
pub async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    let mut spec = folio_api_contract::openapi_schema();
    spec.info.version = env!("CARGO_PKG_VERSION").to_string();
    Json(spec)
}
