use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
///
/// The root-folder prefix is deliberately configuration, not a constant:
/// every user-supplied path is stored under `<root_prefix>/` and the prefix
/// is stripped again from listings, so it has to be threaded into the
/// service at construction time.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub bucket: String,
    pub root_prefix: String,
    pub cors_origin: String,
    pub op_timeout_secs: u64,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "File manager over a flat object store")]
pub struct Args {
    /// Host to bind to (overrides FILEMANAGER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides FILEMANAGER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where the object store keeps its data (overrides FILEMANAGER_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Bucket name (overrides FILEMANAGER_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Root folder prefix for all stored keys (overrides FILEMANAGER_ROOT_PREFIX)
    #[arg(long)]
    pub root_prefix: Option<String>,

    /// Allowed CORS origin (overrides FILEMANAGER_CORS_ORIGIN)
    #[arg(long)]
    pub cors_origin: Option<String>,

    /// Timeout in seconds for uploads and bulk listings (overrides FILEMANAGER_OP_TIMEOUT_SECS)
    #[arg(long)]
    pub op_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("FILEMANAGER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("FILEMANAGER_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing FILEMANAGER_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 8080,
            Err(err) => return Err(err).context("reading FILEMANAGER_PORT"),
        };
        let env_storage =
            env::var("FILEMANAGER_STORAGE_DIR").unwrap_or_else(|_| "./data/objects".into());
        let env_bucket = env::var("FILEMANAGER_BUCKET").unwrap_or_else(|_| "static".into());
        let env_root = env::var("FILEMANAGER_ROOT_PREFIX").unwrap_or_else(|_| "backend".into());
        let env_cors =
            env::var("FILEMANAGER_CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".into());
        let env_timeout = match env::var("FILEMANAGER_OP_TIMEOUT_SECS") {
            Ok(value) => value.parse::<u64>().with_context(|| {
                format!("parsing FILEMANAGER_OP_TIMEOUT_SECS value `{}`", value)
            })?,
            Err(env::VarError::NotPresent) => 10,
            Err(err) => return Err(err).context("reading FILEMANAGER_OP_TIMEOUT_SECS"),
        };

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            bucket: args.bucket.unwrap_or(env_bucket),
            root_prefix: args.root_prefix.unwrap_or(env_root),
            cors_origin: args.cors_origin.unwrap_or(env_cors),
            op_timeout_secs: args.op_timeout_secs.unwrap_or(env_timeout),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
