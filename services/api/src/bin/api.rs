//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DbAdapter, InMemoryIdentityStore, OpenAiEnhanceAdapter, OpenAiFeedbackAdapter,
        OpenAiLearningPathAdapter, OpenAiNotesAdapter, OpenAiQuizAdapter, PromptRunner,
    },
    config::Config,
    error::ApiError,
    web::{
        self,
        rest::ApiDoc,
        state::{AppState, SessionHub},
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use edusync_core::ports::IdentityService;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Identity Store ---
    let identity: Arc<dyn IdentityService> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        None => {
            warn!("DATABASE_URL is not set; accounts are kept in memory and lost on restart.");
            Arc::new(InMemoryIdentityStore::new())
        }
    };

    // --- 3. Initialize Flow Adapters ---
    let mut openai_config = OpenAIConfig::new().with_api_key(config.require_openai_key()?);
    if let Some(base_url) = &config.openai_base_url {
        openai_config = openai_config.with_api_base(base_url);
    }
    let runner = PromptRunner::new(Client::with_config(openai_config), config.flow_model.clone());
    info!(model = %config.flow_model, "Prompt flows configured.");

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        identity,
        config: config.clone(),
        notes_adapter: Arc::new(OpenAiNotesAdapter::new(runner.clone())),
        quiz_adapter: Arc::new(OpenAiQuizAdapter::new(runner.clone())),
        feedback_adapter: Arc::new(OpenAiFeedbackAdapter::new(runner.clone())),
        enhance_adapter: Arc::new(OpenAiEnhanceAdapter::new(runner.clone())),
        learning_path_adapter: Arc::new(OpenAiLearningPathAdapter::new(runner)),
        sessions: Arc::new(SessionHub::new()),
    });

    // --- 5. Create the Web Router ---
    let cors_origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(web::router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
