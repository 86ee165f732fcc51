//! Dictionary cache process.
//!
//! Mirrors the CRM reference data into memory and keeps it fresh until
//! Ctrl-C.

mod services;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crm_db::{connect, log_pool_metrics, PgDictionaryReader, PoolConfig};
use crm_dictionary::{install_panic_hook, Coordinator, Dictionary, DictionaryConfig};

use services::{BucketPhotoUrls, RedisUpdateChannel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "crm_server=info,crm_dictionary=info,crm_db=info")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "crm_server=info,crm_dictionary=info,crm_db=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("crm-server.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false)); // no ANSI in files by default
            registry.with(layer).init();
        }
        Some(guard)
    } else if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
        None
    } else {
        let mut layer = tracing_subscriber::fmt::layer();
        if let Some(ansi) = log_ansi {
            layer = layer.with_ansi(ansi);
        }
        registry.with(layer).init();
        None
    };

    info!(
        subsystem = "server",
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );
    install_panic_hook();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = connect(&database_url, &PoolConfig::from_env())
        .await
        .context("failed to connect to PostgreSQL")?;
    log_pool_metrics(&pool);

    let channel = Arc::new(RedisUpdateChannel::from_env().context("invalid REDIS_URL")?);

    let dictionary = Dictionary::new(
        Arc::new(PgDictionaryReader::new(pool.clone())),
        Arc::new(BucketPhotoUrls::from_env()),
        DictionaryConfig::from_env(),
    );

    let coordinator = Coordinator::new(dictionary, channel).start();
    info!(subsystem = "server", "Dictionary cache running, Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!(subsystem = "server", "Shutdown signal received");

    coordinator.shutdown().await;
    pool.close().await;
    info!(subsystem = "server", "Shutdown complete");
    Ok(())
}
