mod auth;
mod config;
mod contracts;
mod db;
mod errors;
mod jobs;
mod llm_client;
mod matching;
mod resumes;
mod routes;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, S3Config};
use crate::contracts::{
    ContractLifecycle, ContractRepository, InMemoryContractRepository, PgContractRepository,
};
use crate::db::{create_pool, ensure_schema};
use crate::jobs::{InMemoryJobStore, JobStore, PgJobStore};
use crate::llm_client::LlmClient;
use crate::matching::LlmMatchingDelegate;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{InMemorySnapshotStore, S3SnapshotStore, SnapshotStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting WorkPro API v{}", env!("CARGO_PKG_VERSION"));

    // Persistence: PostgreSQL when configured, otherwise process memory
    let (contract_repo, jobs): (Arc<dyn ContractRepository>, Arc<dyn JobStore>) =
        match &config.database_url {
            Some(url) => {
                let pool = create_pool(url).await?;
                ensure_schema(&pool).await?;
                (
                    Arc::new(PgContractRepository::new(pool.clone())),
                    Arc::new(PgJobStore::new(pool)),
                )
            }
            None => {
                info!("DATABASE_URL not set; using in-memory stores");
                (
                    Arc::new(InMemoryContractRepository::new()),
                    Arc::new(InMemoryJobStore::new()),
                )
            }
        };

    // Snapshot storage: S3 / MinIO when configured, otherwise process memory
    let snapshots: Arc<dyn SnapshotStore> = match &config.s3 {
        Some(s3_config) => {
            let client = build_s3_client(s3_config).await;
            info!("S3 snapshot store initialized (bucket: {})", s3_config.bucket);
            Arc::new(S3SnapshotStore::new(
                client,
                s3_config.bucket.clone(),
                Duration::from_secs(config.storage_timeout_secs),
            ))
        }
        None => {
            info!("S3 not configured; using in-memory snapshot store");
            Arc::new(InMemorySnapshotStore::new())
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new(config.google_ai_api_key.clone(), config.llm_model.clone())?;
    info!("LLM client initialized (model: {})", llm.model());

    let contracts = Arc::new(ContractLifecycle::new(contract_repo, snapshots.clone()));
    let matcher = Arc::new(LlmMatchingDelegate(llm.clone()));

    // Build app state
    let state = AppState {
        contracts,
        snapshots,
        jobs,
        matcher,
        llm,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict origins once the web frontend has a fixed domain
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &S3Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.access_key_id,
        &config.secret_access_key,
        None,
        None,
        "workpro-static",
    );

    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&config.endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not by virtual host.
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
