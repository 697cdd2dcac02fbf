// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! CRUD endpoints shared by every content collection
//!
//! Each handler is generic over a [`Resource`] and is mounted once per
//! collection, e.g. `get(content::list::<Blogs>)`.

use crate::error::{ApiJson, ServerResult};
use crate::services::{ContentService, Resource};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use folio_api_contract::MessageResponse;

pub async fn list<R: Resource>(State(state): State<AppState>) -> ServerResult<Json<Vec<R::Entity>>> {
    Ok(Json(ContentService::<R>::new(state.db()).list().await?))
}

pub async fn get<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<R::Entity>> {
    Ok(Json(ContentService::<R>::new(state.db()).get(&id).await?))
}

pub async fn create<R: Resource>(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<R::Input>,
) -> ServerResult<(StatusCode, Json<R::Entity>)> {
    let created = ContentService::<R>::new(state.db()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<R::Input>,
) -> ServerResult<Json<R::Entity>> {
    Ok(Json(ContentService::<R>::new(state.db()).update(&id, &input).await?))
}

pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<MessageResponse>> {
    let message = ContentService::<R>::new(state.db()).delete(&id).await?;
    Ok(Json(MessageResponse::new(message)))
}
