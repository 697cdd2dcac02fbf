// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Single-skill endpoints

use crate::error::{ApiJson, ServerResult};
use crate::services::SkillsService;
use crate::state::AppState;
use axum::{extract::State, Json};
use folio_api_contract::{SkillChange, Skills};

/// Add a skill to a category
pub async fn add_skill(
    State(state): State<AppState>,
    ApiJson(change): ApiJson<SkillChange>,
) -> ServerResult<Json<Skills>> {
    Ok(Json(SkillsService::new(state.db()).add(&change).await?))
}

/// Remove a skill from a category
pub async fn remove_skill(
    State(state): State<AppState>,
    ApiJson(change): ApiJson<SkillChange>,
) -> ServerResult<Json<Skills>> {
    Ok(Json(SkillsService::new(state.db()).remove(&change).await?))
}
