// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server error types and handling

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use folio_api_contract::{
    validation::{field_messages, first_message},
    ApiContractError, ProblemDetails,
};

/// Server result type
pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(folio_local_db::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Rate limited")]
    RateLimited,
}

impl ServerError {
    pub fn not_found(label: &str) -> Self {
        ServerError::NotFound(format!("{} not found", label))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Database(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::Auth(_) => StatusCode::UNAUTHORIZED,
            ServerError::Validation(_) | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Convert error to Problem+JSON response
    pub fn to_problem(&self) -> ProblemDetails {
        let status = self.status().as_u16();
        match self {
            ServerError::Database(err) => ProblemDetails::new(
                "https://docs.example.com/errors/database",
                "Database Error",
                status,
                format!("Database operation failed: {}", err),
            ),
            ServerError::NotFound(msg) => ProblemDetails::new(
                "https://docs.example.com/errors/not-found",
                "Not Found",
                status,
                msg.clone(),
            ),
            ServerError::Conflict(msg) => ProblemDetails::new(
                "https://docs.example.com/errors/conflict",
                "Conflict",
                status,
                msg.clone(),
            ),
            ServerError::Auth(msg) => ProblemDetails::new(
                "https://docs.example.com/errors/auth",
                "Authentication Failed",
                status,
                msg.clone(),
            ),
            ServerError::Validation(errors) => ProblemDetails::new(
                "https://docs.example.com/errors/validation",
                "Validation Error",
                status,
                first_message(errors),
            )
            .with_errors(field_messages(errors)),
            ServerError::BadRequest(msg) => ProblemDetails::new(
                "https://docs.example.com/errors/bad-request",
                "Bad Request",
                status,
                msg.clone(),
            ),
            ServerError::Internal(msg) => ProblemDetails::new(
                "https://docs.example.com/errors/internal",
                "Internal Server Error",
                status,
                msg.clone(),
            ),
            ServerError::RateLimited => ProblemDetails::new(
                "https://docs.example.com/errors/rate-limited",
                "Rate Limited",
                status,
                "Too many requests",
            ),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let status = self.status();
        (status, Json(self.to_problem())).into_response()
    }
}

/// Duplicates surface as conflicts carrying the store's message
impl From<folio_local_db::Error> for ServerError {
    fn from(err: folio_local_db::Error) -> Self {
        if err.is_duplicate() {
            ServerError::Conflict(err.to_string())
        } else {
            ServerError::Database(err)
        }
    }
}

impl From<ApiContractError> for ServerError {
    fn from(err: ApiContractError) -> Self {
        match err {
            ApiContractError::InvalidSkillCategory(_) => {
                ServerError::BadRequest("Invalid category".to_string())
            }
        }
    }
}

/// Convert any error to ServerError
impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

/// Convert IO errors
impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {}", err))
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

/// JSON body extractor whose rejections are Problem+JSON responses
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct ApiJson<T>(pub T);
