// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Main server implementation

use crate::auth::require_admin;
use crate::config::ServerConfig;
use crate::dependencies::DefaultServerDependencies;
use crate::error::{ServerError, ServerResult};
use crate::handlers::{self, content};
use crate::middleware::{rate_limit_middleware, RateLimitState};
use crate::services::content::{Blogs, Contact, Personal, Projects, Settings, SkillSets, Social};
use crate::services::Resource;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Public reads of a content collection
fn public_content<R: Resource>(path: &str) -> Router<AppState> {
    Router::new()
        .route(path, get(content::list::<R>))
        .route(&format!("{}/:id", path), get(content::get::<R>))
}

/// Admin writes of a content collection
fn admin_content<R: Resource>(path: &str) -> Router<AppState> {
    Router::new()
        .route(path, post(content::create::<R>))
        .route(
            &format!("{}/:id", path),
            put(content::update::<R>).delete(content::delete::<R>),
        )
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.enable_cors {
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
}

/// REST API server
pub struct Server {
    config: ServerConfig,
    app: Router,
}

impl Server {
    /// Create a new server instance
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let state = DefaultServerDependencies::new(config.clone()).await?.into_state();
        Self::with_state(config, state).await
    }

    /// Construct a server from an already-built app state (used for custom dependencies)
    pub async fn with_state(config: ServerConfig, state: AppState) -> ServerResult<Self> {
        let app = Self::build_app(state, &config);
        Ok(Self { config, app })
    }

    /// Build the Axum application with routes and middleware
    pub fn build_app(state: AppState, config: &ServerConfig) -> Router {
        let rate_limit_state = Arc::new(RateLimitState::new(config.rate_limit.clone()));
        let middleware_stack = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(from_fn(move |req, next| {
                let state = Arc::clone(&rate_limit_state);
                rate_limit_middleware(state, req, next)
            }))
            .layer(cors_layer(config));

        let public_routes = Router::new()
            // Health and status endpoints
            .route("/healthz", get(handlers::health::health_check))
            .route("/readyz", get(handlers::health::readiness_check))
            .route("/version", get(handlers::health::version))
            .route("/auth/login", post(handlers::auth::login))
            // Content reads
            .merge(public_content::<Blogs>("/blogs"))
            .merge(public_content::<Projects>("/projects"))
            .merge(public_content::<Contact>("/contact"))
            .merge(public_content::<Personal>("/personal"))
            .merge(public_content::<Social>("/social"))
            .merge(public_content::<Settings>("/settings"))
            .merge(public_content::<SkillSets>("/skills"))
            // Public site read models
            .route("/site/home", get(handlers::site::home))
            .route("/site/about", get(handlers::site::about))
            .route("/site/blog", get(handlers::site::blog_index))
            .route("/site/blog/:slug", get(handlers::site::blog_post))
            .route("/site/projects", get(handlers::site::project_index))
            .route("/site/contact", post(handlers::site::submit_contact))
            .route("/openapi.json", get(handlers::openapi::openapi_spec));

        let admin_routes = Router::new()
            .route("/auth/session", get(handlers::auth::session))
            // Content writes
            .merge(admin_content::<Blogs>("/blogs"))
            .merge(admin_content::<Projects>("/projects"))
            .merge(admin_content::<Contact>("/contact"))
            .merge(admin_content::<Personal>("/personal"))
            .merge(admin_content::<Social>("/social"))
            .merge(admin_content::<Settings>("/settings"))
            .route(
                "/skills",
                post(handlers::skills::add_skill).delete(handlers::skills::remove_skill),
            )
            .route(
                "/skills/:id",
                put(content::update::<SkillSets>)
                    .delete(content::delete::<SkillSets>),
            )
            // Accounts
            .route(
                "/users",
                get(handlers::users::list_users).post(handlers::users::create_user),
            )
            .route(
                "/users/:id",
                get(handlers::users::get_user)
                    .put(handlers::users::update_user)
                    .delete(handlers::users::delete_user),
            )
            .route_layer(from_fn_with_state(state.clone(), require_admin));

        Router::new()
            .nest("/api/v1", public_routes.merge(admin_routes))
            .with_state(state)
            .layer(middleware_stack)
    }

    /// Run the server
    pub async fn run(self) -> ServerResult<()> {
        let addr = self.config.bind_addr;
        info!("Starting server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.app)
            .await
            .map_err(|err| ServerError::Internal(format!("REST server error: {err}")))?;

        Ok(())
    }

    /// Get the bind address
    pub fn addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
