use anyhow::Result;
use axum::Router;
use std::{io::ErrorKind, path::Path, sync::Arc, time::Duration};
use tokio::{fs, net::TcpListener};
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod store;
mod tree;

use services::file_service::FileService;
use store::{ObjectStore, fs::FsStore};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting filemanager with config: {:?}", cfg);

    // --- Ensure storage directory exists ---
    if !Path::new(&cfg.storage_dir).exists() {
        fs::create_dir_all(&cfg.storage_dir).await?;
        tracing::info!("Created storage directory at {}", cfg.storage_dir);
    }

    // --- Initialize the object store ---
    let object_store = Arc::new(FsStore::new(&cfg.storage_dir, &cfg.bucket));
    if !object_store.bucket_exists().await? {
        tracing::info!("Creating bucket `{}`", cfg.bucket);
        object_store.create_bucket().await?;
    }

    // --- Initialize core service ---
    let service = FileService::new(
        object_store,
        cfg.root_prefix.clone(),
        Duration::from_secs(cfg.op_timeout_secs),
        tree::TreeOptions::default(),
    );

    // --- Build router ---
    let app: Router = routes::routes::routes(&cfg.cors_origin).with_state(service);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
