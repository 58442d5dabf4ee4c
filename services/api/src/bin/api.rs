//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        ConsentBroker, DbAdapter, FsBlobStore, MemoryDocumentStore, MemoryIdentityProvider,
        PgIdentityProvider,
    },
    config::Config,
    error::ApiError,
    web::{build_router, rest::ApiDoc, state::AppState},
};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use go_tany_core::analysis::MockPredictor;
use go_tany_core::ports::{BlobStore, DiseasePredictor, DocumentStore, IdentityProvider};
use go_tany_core::seed::seed_remote_catalog;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
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
    info!("Configuration loaded. Starting client shell...");

    let consent = Arc::new(ConsentBroker::new(config.consent_timeout));

    // --- 2. Identity Provider & Document Store ---
    let (identity, store): (Arc<dyn IdentityProvider>, Arc<dyn DocumentStore>) =
        match &config.database_url {
            Some(url) => {
                info!("Connecting to database...");
                let db_pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(url)
                    .await?;
                let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
                info!("Running database migrations...");
                db_adapter.run_migrations().await?;
                info!("Database migrations complete.");

                let provider = Arc::new(PgIdentityProvider::new(
                    db_pool,
                    config.client_id.clone(),
                    config.session_ttl_days,
                    consent.clone(),
                ));
                let restoring = provider.clone();
                tokio::spawn(async move { restoring.restore().await });
                (
                    provider as Arc<dyn IdentityProvider>,
                    db_adapter as Arc<dyn DocumentStore>,
                )
            }
            None => {
                warn!("DATABASE_URL is not set; accounts and documents live in memory.");
                (
                    Arc::new(MemoryIdentityProvider::new(consent.clone())) as Arc<dyn IdentityProvider>,
                    Arc::new(MemoryDocumentStore::new()) as Arc<dyn DocumentStore>,
                )
            }
        };

    if config.seed_remote_catalog {
        let inserted = seed_remote_catalog(store.as_ref()).await?;
        info!(inserted, "Remote disease collection seeded.");
    }

    // --- 3. Blob Storage & Predictor ---
    let blobs: Arc<dyn BlobStore> = Arc::new(
        FsBlobStore::new(config.blob_root.clone(), config.blob_public_url.clone()).await?,
    );
    let predictor: Arc<dyn DiseasePredictor> = Arc::new(MockPredictor::new(config.analysis_delay));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(
        config.clone(),
        identity,
        store,
        blobs,
        predictor,
        consent,
    ));
    let subscription = app_state.session.subscribe();

    // --- 5. Create the Web Router ---
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    let app = Router::new()
        .merge(build_router(app_state))
        .nest_service(&config.blob_public_url, ServeDir::new(&config.blob_root))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received.");
        })
        .await?;

    subscription.unsubscribe().await;
    info!("Session subscription released. Bye.");
    Ok(())
}
