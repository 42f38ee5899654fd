use anyhow::{bail, Context};
use std::path::PathBuf;

/// Which persistence backend this process runs against. Picked once at
/// startup; the two are never live in the same instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Json,
    Postgres,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub database_url: Option<String>,
    pub static_dir: PathBuf,
    pub admin_username: String,
    pub admin_password: String,
    pub notify_webhook_url: Option<String>,
    pub notify_email_to: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| {
            let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
            format!("0.0.0.0:{}", port)
        });

        let backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "json".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => StorageBackend::Json,
            "postgres" => StorageBackend::Postgres,
            other => bail!("unknown STORAGE_BACKEND '{other}' (expected 'json' or 'postgres')"),
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if backend == StorageBackend::Postgres {
            database_url
                .as_ref()
                .context("DATABASE_URL is required when STORAGE_BACKEND=postgres")?;
        }

        Ok(Self {
            bind_addr,
            backend,
            data_dir: env_path("DATA_DIR", "data"),
            upload_dir: env_path("UPLOAD_DIR", "uploads"),
            database_url,
            static_dir: env_path("STATIC_DIR", "static"),
            admin_username: std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: std::env::var("ADMIN_PASSWORD")
                .unwrap_or_else(|_| "admin123".to_string()),
            notify_webhook_url: std::env::var("NOTIFY_WEBHOOK_URL").ok(),
            notify_email_to: std::env::var("NOTIFY_EMAIL_TO").ok(),
        })
    }
}

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .into()
}
