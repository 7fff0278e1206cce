// crates/allot-server/src/cli/serve.rs
// Engine construction and the admin web server

use allot::allocation::AllocationEngine;
use allot::config::AllotConfig;
use allot::db::DatabasePool;
use allot::http::create_client_with_timeout;
use allot::llm::ProviderFactory;
use allot::web;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Open the store and wire the provider factory into an engine
pub async fn build_engine(config: &AllotConfig) -> Result<Arc<AllocationEngine>> {
    let db_path = config.database_path();
    let pool = Arc::new(DatabasePool::open(&db_path).await?);
    info!(path = %db_path.display(), "Database opened");

    let client = create_client_with_timeout(config.allocation.timeout());
    let factory = ProviderFactory::new(config.llm.clone(), client, config.logging.clone());

    Ok(Arc::new(AllocationEngine::new(
        pool,
        Arc::new(factory),
        config.allocation.clone(),
    )))
}

pub async fn run_web_server(config: &AllotConfig, port: u16) -> Result<()> {
    let engine = build_engine(config).await?;
    let state = web::state::AppState::new(engine);
    let app = web::create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Allot admin API running on http://localhost:{}", port);
    println!("Allot admin API running on http://localhost:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}
