pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod validate;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderValue, Method, Uri, header};
use serde_json::json;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::rate_limit::LoginRateLimiter;
use crate::state::{AppState, SharedState};

pub fn build_app(pool: PgPool, config: Config) -> Router {
    let cors = cors_layer(&config);
    let body_limit = RequestBodyLimitLayer::new(config.max_body_size);

    let state: SharedState = Arc::new(AppState {
        pool,
        config,
        login_limiter: LoginRateLimiter::new(),
    });

    spawn_limiter_sweep(state.clone());

    Router::new()
        .merge(routes::api_routes())
        .route("/", axum::routing::get(routes::index))
        .route("/health", axum::routing::get(health))
        .fallback(not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            error::expose_error_detail,
        ))
        .layer(cors)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Sweep stale login-failure counters so the map stays bounded even for
/// addresses that fail and never successfully log in.
fn spawn_limiter_sweep(state: SharedState) {
    const SWEEP_EVERY: Duration = Duration::from_secs(15 * 60);
    const MAX_AGE: Duration = Duration::from_secs(30 * 60);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_EVERY);
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            state.login_limiter.cleanup(MAX_AGE);
        }
    });
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_origin == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origin = config
            .cors_origin
            .parse::<HeaderValue>()
            .expect("Invalid MYCONTACTS_CORS_ORIGIN");
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn not_found(uri: Uri) -> (axum::http::StatusCode, axum::Json<serde_json::Value>) {
    (
        axum::http::StatusCode::NOT_FOUND,
        axum::Json(json!({
            "success": false,
            "message": "Route not found",
            "path": uri.path(),
        })),
    )
}
