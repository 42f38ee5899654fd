use sap_training_site::config::{AppConfig, StorageBackend};
use sap_training_site::services::notify::Notifier;
use sap_training_site::state::{AppState, SharedState};
use sap_training_site::storage::{FileStore, JsonStore, PgStore, Store};
use sap_training_site::web;

use axum::{routing::get_service, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn Store> = match config.backend {
        StorageBackend::Json => {
            tracing::info!("Storage backend: JSON files in {}", config.data_dir.display());
            Arc::new(JsonStore::open(&config.data_dir).await?)
        }
        StorageBackend::Postgres => {
            tracing::info!("Storage backend: Postgres");
            let url = config
                .database_url
                .as_deref()
                .expect("DATABASE_URL checked at config load");
            Arc::new(PgStore::connect(url).await?)
        }
    };

    let files = FileStore::open(&config.upload_dir).await?;

    let notifier = Notifier::from_config(
        config.notify_webhook_url.as_deref(),
        config.notify_email_to.as_deref(),
    )
    .map(Arc::new);
    if notifier.is_none() {
        tracing::info!("Contact notifications disabled (NOTIFY_WEBHOOK_URL not set)");
    }

    let shared: SharedState = Arc::new(AppState {
        store,
        files,
        notifier,
        admin_username: config.admin_username.clone(),
        admin_password: config.admin_password.clone(),
    });

    let app = Router::new()
        .nest("/api", web::routes(shared.clone()))
        .fallback_service(get_service(ServeDir::new(&config.static_dir)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
