use std::path::PathBuf;

use anyhow::{Context, Result};
use extract::ModelConfig;

pub const DEFAULT_DATABASE_PATH: &str = "data/documents.db";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads/";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Process configuration, read once at startup and handed to each component.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
    pub bind_addr: String,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Builds the configuration from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            optional(key).with_context(|| format!("Missing required environment variable {key}"))
        };

        let mut model = ModelConfig::new(
            &required("AZURE_OPENAI_ENDPOINT")?,
            required("AZURE_OPENAI_KEY")?,
            required("AZURE_OPENAI_DEPLOYMENT_NAME")?,
        );
        if let Some(version) = optional("AZURE_OPENAI_API_VERSION") {
            model.api_version = version;
        }

        let max_upload_bytes = optional("MAX_UPLOAD_BYTES")
            .map(|v| {
                v.trim()
                    .parse::<usize>()
                    .with_context(|| format!("MAX_UPLOAD_BYTES is not a byte count: {v}"))
            })
            .transpose()?
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        Ok(Self {
            model,
            database_path: optional("DATABASE_URI")
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string())
                .into(),
            upload_dir: optional("UPLOAD_FOLDER")
                .unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string())
                .into(),
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            max_upload_bytes,
        })
    }
}
