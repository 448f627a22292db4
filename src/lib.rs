//! Catalog API Library
//!
//! Categories, category attributes with their values, and products tagged
//! with those values, served over HTTP and stored through SeaORM.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod queries;
pub mod services;
pub mod tracing;

use axum::{extract::DefaultBodyLimit, middleware, Router};
use http::HeaderValue;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};

use crate::config::{AppConfig, AppConfigError};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config);
        Self {
            db,
            config,
            services,
        }
    }
}

/// Catalog routes, mounted under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(handlers::categories::category_routes())
        .merge(handlers::attributes::attribute_routes())
        .merge(handlers::products::product_routes())
        .merge(handlers::database::database_routes())
}

/// Builds the CORS layer from configuration.
///
/// Explicit origins win; otherwise development (or the explicit opt in) gets
/// a permissive layer and anything else is refused.
pub fn cors_layer(cfg: &AppConfig) -> Result<CorsLayer, AppConfigError> {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any))
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        Ok(CorsLayer::permissive())
    } else {
        Err(AppConfigError::Cors(
            "set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true".to_string(),
        ))
    }
}

/// Full application router: health, catalog API, Swagger UI and the
/// request-scoped layers.
pub fn build_router(state: AppState) -> Result<Router, AppConfigError> {
    let cors = cors_layer(&state.config)?;
    let body_limit = state.config.max_body_size;

    Ok(Router::new()
        .merge(health::health_routes())
        .nest("/api", api_routes())
        .merge(openapi::swagger_ui())
        .layer(DefaultBodyLimit::max(body_limit))
        // HTTP tracing layer for consistent request/response telemetry
        .layer(tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        // Ensure every request carries a request id for traceability
        .layer(middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state))
}

pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::db::*;
    pub use crate::dto::*;
    pub use crate::errors::*;
    pub use crate::services::*;
    pub use crate::{build_router, AppState};
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(environment: &str) -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            8080,
            environment.into(),
        )
    }

    #[test]
    fn production_without_origins_is_refused() {
        assert!(matches!(
            cors_layer(&config("production")),
            Err(AppConfigError::Cors(_))
        ));
    }

    #[test]
    fn explicit_origins_are_accepted_anywhere() {
        let mut cfg = config("production");
        cfg.cors_allowed_origins = Some("https://shop.example.com, ".into());
        assert!(cors_layer(&cfg).is_ok());
        assert!(cors_layer(&config("development")).is_ok());
    }
}
