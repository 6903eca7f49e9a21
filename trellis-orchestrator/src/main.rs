use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::provider::GitLabProvider;
use crate::provider::{CiProvider, VcsProvider};
use crate::service::orchestrator::PipelineOrchestrator;
use crate::store::{ConfigStore, InstanceStore, PgConfigStore, PgInstanceStore};

pub mod api;
pub mod config;
pub mod db;
pub mod provider;
pub mod service;
pub mod store;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trellis_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Trellis Orchestrator...");

    let config = Config::from_env().expect("Failed to load configuration");

    tracing::info!("Connecting to database...");

    // Create database connection pool
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!("Database connection pool created");

    // Run migrations
    db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // Wire stores, providers and the orchestrator facade
    let provider = Arc::new(
        GitLabProvider::new(config.provider_url.clone(), config.provider_timeout)
            .expect("Failed to build provider client"),
    );
    let orchestrator = Arc::new(PipelineOrchestrator::new(
        Arc::new(PgConfigStore::new(pool.clone())) as Arc<dyn ConfigStore>,
        Arc::new(PgInstanceStore::new(pool)) as Arc<dyn InstanceStore>,
        Arc::clone(&provider) as Arc<dyn CiProvider>,
        provider as Arc<dyn VcsProvider>,
    ));

    // Build router with all API endpoints
    let app = api::create_router(orchestrator);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
