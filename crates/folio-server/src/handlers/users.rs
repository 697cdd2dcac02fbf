// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Account management endpoints

use crate::error::{ApiJson, ServerResult};
use crate::services::UserService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use folio_api_contract::{CreateUserRequest, MessageResponse, PublicUser, UpdateUserRequest};

pub async fn list_users(State(state): State<AppState>) -> ServerResult<Json<Vec<PublicUser>>> {
    Ok(Json(UserService::new(state.db()).list().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<PublicUser>> {
    Ok(Json(UserService::new(state.db()).get(&id).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> ServerResult<(StatusCode, Json<PublicUser>)> {
    let user = UserService::new(state.db()).create(&request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> ServerResult<Json<PublicUser>> {
    Ok(Json(UserService::new(state.db()).update(&id, &request).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<MessageResponse>> {
    let message = UserService::new(state.db()).delete(&id).await?;
    Ok(Json(MessageResponse::new(message)))
}
