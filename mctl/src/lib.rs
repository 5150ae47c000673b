//! # mctl: Mission Control backend
//!
//! `mctl` is the HTTP backend of a dashboard that tracks AI agents working on projects. It serves
//! projects, a kanban board of tasks, an agent roster and a per-task chat thread, and reports on
//! the tokens and money the agents spend.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer.
//! Everything lives behind the [`db::handlers::Store`] trait: in production that is PostgreSQL
//! (via sqlx), and with `database.type: memory` it is a process-local store that forgets
//! everything on shutdown.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes JSON endpoints under `/api`. Resource endpoints are thin
//! pass-throughs to the store that also append to the activity log. Analytics endpoints read a
//! fresh snapshot of usage records for every request.
//!
//! The **aggregation core** ([`analytics`]) is a set of pure functions reducing usage records to
//! overviews, breakdowns, rankings and reports. Nothing is cached, so every response reflects the
//! store at the moment it was read.
//!
//! The **database layer** ([`db`]) holds the store trait, its two implementations and the row
//! types.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use mctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = mctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     mctl::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod analytics;
pub mod api;
mod chat;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod seed;
pub mod telemetry;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    http::{self, HeaderValue},
    routing::get,
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use config::{CorsOrigin, DatabaseConfig, PoolSettings};
use db::handlers::{InMemoryStore, PgStore, Store};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::openapi::ApiDoc;

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .store(Arc::new(InMemoryStore::new()))
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
}

/// Get the mctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Zero means "no limit" for the idle and lifetime settings
fn optional_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(optional_secs(settings.idle_timeout_secs))
        .max_lifetime(optional_secs(settings.max_lifetime_secs))
}

/// Connect the configured store. For an external database this runs migrations and also returns
/// the pool so it can be closed on shutdown.
#[instrument(skip_all)]
pub async fn setup_store(config: &Config) -> anyhow::Result<(Arc<dyn Store>, Option<PgPool>)> {
    match &config.database {
        DatabaseConfig::External { url, pool } => {
            info!("Using external database");
            let pool = pool_options(pool).connect(url).await?;
            migrator().run(&pool).await?;
            Ok((Arc::new(PgStore::new(pool.clone())), Some(pool)))
        }
        DatabaseConfig::Memory => {
            info!("Using in-memory store: data will be lost on shutdown");
            Ok((Arc::new(InMemoryStore::new()), None))
        }
    }
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allow_origin = if config.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PATCH, http::Method::DELETE])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(config.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

fn api_routes() -> Router<AppState> {
    use api::handlers::{agents, analytics, messages, projects, tasks};

    Router::new()
        // Analytics
        .route("/analytics/overview", get(analytics::get_overview))
        .route("/analytics/by-day", get(analytics::get_by_day))
        .route("/analytics/by-agent", get(analytics::get_by_agent))
        .route("/analytics/agents/{agent_id}", get(analytics::get_agent_usage))
        .route("/analytics/by-model", get(analytics::get_by_model))
        .route("/analytics/top-projects", get(analytics::get_top_projects))
        .route("/analytics/top-tasks", get(analytics::get_top_tasks))
        // Projects
        .route("/projects", get(projects::list_projects).post(projects::create_project))
        .route("/projects/{id}", get(projects::get_project))
        .route("/projects/{id}/tokens", get(projects::get_project_tokens))
        // Tasks
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/{id}",
            get(tasks::get_task).patch(tasks::update_task).delete(tasks::delete_task),
        )
        .route("/tasks/{id}/tokens", get(tasks::get_task_tokens))
        .route("/tasks/{id}/messages", get(messages::list_messages).post(messages::create_message))
        // Agents
        .route("/agents", get(agents::list_agents))
        .route("/agents/{id}", get(agents::get_agent))
}

/// Build the application router with all endpoints and middleware.
///
/// - `/api/*` resource and analytics endpoints
/// - `/healthz` liveness probe
/// - `/api-docs/openapi.json` and Scalar docs at `/api/docs`
/// - `/internal/metrics` when metrics are enabled
/// - CORS and request tracing on everything
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api", api_routes())
        .with_state(state.clone())
        .merge(Scalar::with_url("/api/docs", ApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;
    let mut router = router.layer(cors_layer);

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::DEBUG))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Create a new application instance with the configured store connected
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting mission control with configuration: {:#?}", config);

        let (store, pool) = setup_store(&config).await?;
        let app_state = AppState::builder().store(store).config(config.clone()).build();
        let router = build_router(&app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Mission control listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
