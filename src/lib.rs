//! Travel agency back office: tour pricing and quoting, supplier rates,
//! B2B partners, invoicing and WhatsApp delivery tracking.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod invoices;
pub mod messaging;
pub mod models;
pub mod partners;
pub mod pricing;
pub mod routes;
pub mod tours;

use axum::{routing::get, Router};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::cache::AppCache;
use crate::config::Config;

/// Shared handler state, built once in `main`
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: AppCache,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            cache: AppCache::new(config.rate_cache_ttl),
            config: Arc::new(config),
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/pricing", pricing::router())
        .nest("/tours", tours::router())
        .nest("/partners", partners::router())
        .nest("/invoices", invoices::router())
        .nest("/webhooks", messaging::router())
        .merge(catalog::router());

    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api", api)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
