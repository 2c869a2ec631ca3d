use finance_buddy::{
    api::{start_server, ApiState},
    config::AppConfig,
    conversation::ConversationService,
    openai::ModelBackend,
    storage::{open_store, ProfileStore},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    info!("🚀 Finance Buddy - API Server");
    info!("📍 Port: {}", config.port);

    if config.llm.api_key.is_none() {
        eprintln!("⚠️  OPENAI_API_KEY not set in .env");
        eprintln!("📌 Chat replies will report the service as unavailable");
    }

    // Create components
    let slots = open_store(config.database_url.as_deref()).await;
    let model = ModelBackend::from_config(&config.llm)?;
    let service = Arc::new(ConversationService::new(
        model,
        ProfileStore::new(slots.clone()),
    ));
    let state = ApiState::open(service, slots).await;

    info!("✅ Services initialized");
    info!("📡 Starting API server...");

    // Start API server
    start_server(state, config.port).await?;

    Ok(())
}
