// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Public site endpoints

use crate::error::{ApiJson, ServerResult};
use crate::services::{ContactService, SiteService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use folio_api_contract::{
    AboutPage, BlogArticle, BlogIndex, BlogIndexQuery, ContactMessage, ContactReceipt, HomePage,
    ProjectIndex, ProjectIndexQuery,
};

pub async fn home(State(state): State<AppState>) -> ServerResult<Json<HomePage>> {
    Ok(Json(SiteService::new(state.db()).home().await?))
}

pub async fn about(State(state): State<AppState>) -> ServerResult<Json<AboutPage>> {
    Ok(Json(SiteService::new(state.db()).about().await?))
}

pub async fn blog_index(
    State(state): State<AppState>,
    Query(query): Query<BlogIndexQuery>,
) -> ServerResult<Json<BlogIndex>> {
    Ok(Json(SiteService::new(state.db()).blog_index(&query).await?))
}

pub async fn blog_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ServerResult<Json<BlogArticle>> {
    Ok(Json(SiteService::new(state.db()).blog_post(&slug).await?))
}

pub async fn project_index(
    State(state): State<AppState>,
    Query(query): Query<ProjectIndexQuery>,
) -> ServerResult<Json<ProjectIndex>> {
    Ok(Json(SiteService::new(state.db()).project_index(&query).await?))
}

/// Accept a contact form message
pub async fn submit_contact(
    State(state): State<AppState>,
    ApiJson(message): ApiJson<ContactMessage>,
) -> ServerResult<Json<ContactReceipt>> {
    let service = ContactService::new(state.db(), state.mailer.clone(), state.config());
    Ok(Json(service.submit(&message).await?))
}
