// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Login and session endpoints

use crate::auth::Claims;
use crate::error::{ApiJson, ServerResult};
use crate::state::AppState;
use axum::{extract::State, Extension, Json};
use folio_api_contract::{LoginRequest, LoginResponse, SessionInfo};
use validator::Validate;

/// Exchange credentials for a session token
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ServerResult<Json<LoginResponse>> {
    request.validate()?;
    Ok(Json(state.auth.login(&request).await?))
}

/// The session carried by the bearer token
pub async fn session(Extension(claims): Extension<Claims>) -> Json<SessionInfo> {
    Json(SessionInfo {
        user: claims.user(),
        issued_at: claims.issued_at(),
        expires_at: claims.expires_at(),
    })
}
