use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use peizhen::analyzer::SymptomAnalyzer;
use peizhen::api::{api_router, ApiContext};
use peizhen::config::{self, Settings};
use peizhen::db;
use peizhen::llm::ChatClient;
use peizhen::medication::MedicationGuide;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = Settings::from_env();

    if let Some(parent) = settings.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = db::open_database(&settings.database_path)?;
    tracing::info!(path = %settings.database_path.display(), "database ready");

    let analyzer = SymptomAnalyzer::new(ChatClient::new(
        &settings.llm_base_url,
        &settings.llm_api_key,
        &settings.llm_model,
        settings.llm_timeout_secs,
    ));
    let medication_guide = MedicationGuide::new(ChatClient::new(
        &settings.llm_base_url,
        &settings.llm_api_key,
        &settings.llm_model,
        settings.llm_timeout_secs,
    ));

    let app = api_router(ApiContext::new(conn, analyzer, medication_guide));

    let addr = SocketAddr::new(settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
