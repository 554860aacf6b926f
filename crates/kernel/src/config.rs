//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::content::DEFAULT_MAX_PAGE_SIZE;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// YAML file with user content types, registered at startup.
    pub content_types_path: Option<PathBuf>,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// Enforce numeric, select and media constraints (default: false).
    pub strict_constraints: bool,

    /// Largest page a listing may return (default: 100).
    pub max_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            content_types_path: None,
            cors_allowed_origins: vec!["*".to_string()],
            strict_constraints: false,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup function.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = var("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let content_types_path = var("TESSERA_CONTENT_TYPES")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["*".to_string()]);

        let strict_constraints = match var("TESSERA_STRICT_CONSTRAINTS") {
            Some(v) => parse_bool(&v).context("TESSERA_STRICT_CONSTRAINTS must be a boolean")?,
            None => false,
        };

        let max_page_size: u32 = var("TESSERA_MAX_PAGE_SIZE")
            .unwrap_or_else(|| DEFAULT_MAX_PAGE_SIZE.to_string())
            .parse()
            .context("TESSERA_MAX_PAGE_SIZE must be a valid u32")?;
        if max_page_size == 0 {
            bail!("TESSERA_MAX_PAGE_SIZE must be at least 1");
        }

        Ok(Self {
            port,
            content_types_path,
            cors_allowed_origins,
            strict_constraints,
            max_page_size,
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("unrecognized boolean '{other}'"),
    }
}
