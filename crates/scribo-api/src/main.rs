mod api_doc;
mod auth;
mod error;
mod handlers;
mod routes;
mod server;
mod state;
mod telemetry;

use std::sync::Arc;

use scribo_core::AppConfig;
use scribo_engines::OpenAiEngine;
use scribo_pipeline::FileLifecycle;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = AppConfig::from_env()?;
    telemetry::init_tracing(&config);

    let pool = scribo_db::setup_database(&config).await?;
    let storage = scribo_storage::create_storage(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize storage: {}", e))?;

    let engine = Arc::new(OpenAiEngine::from_config(&config)?);

    let lifecycle = FileLifecycle::new(
        Arc::new(scribo_db::FileRepository::new(pool.clone())),
        Arc::new(scribo_db::ProcessingLogRepository::new(pool.clone())),
        Arc::new(scribo_db::QuotaRepository::new(pool)),
        storage,
        engine.clone(),
        engine.clone(),
        engine,
        config.source_language.clone(),
    );

    let state = Arc::new(state::AppState {
        config: config.clone(),
        lifecycle,
    });

    let router = routes::build_router(state);
    server::start_server(&config, router).await?;

    Ok(())
}
