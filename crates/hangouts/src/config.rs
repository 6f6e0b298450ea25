// hangouts/crates/hangouts/src/config.rs

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub pool_size: u32,
    pub busy_timeout_ms: u64,
    pub inbound_queue_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            warn!("Failed to load .env file: {}. Using system environment variables.", e);
        } else {
            info!("Loaded environment variables from .env file");
        }

        let db_path = env::var("HANGOUTS_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/hangouts.db"));

        let config = Self {
            db_path,
            pool_size: env::var("HANGOUTS_POOL_SIZE")
                .unwrap_or_else(|_| "4".into())
                .parse()
                .context("HANGOUTS_POOL_SIZE must be a positive integer")?,
            busy_timeout_ms: env::var("HANGOUTS_BUSY_TIMEOUT_MS")
                .unwrap_or_else(|_| "5000".into())
                .parse()
                .context("HANGOUTS_BUSY_TIMEOUT_MS must be an integer")?,
            inbound_queue_size: env::var("HANGOUTS_INBOUND_QUEUE")
                .unwrap_or_else(|_| "64".into())
                .parse()
                .context("HANGOUTS_INBOUND_QUEUE must be an integer")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Configuration rooted at an explicit database path, everything else default.
    pub fn with_db_path(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            pool_size: 4,
            busy_timeout_ms: 5000,
            inbound_queue_size: 64,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            anyhow::bail!("HANGOUTS_POOL_SIZE must be at least 1");
        }
        if self.inbound_queue_size == 0 {
            anyhow::bail!("HANGOUTS_INBOUND_QUEUE must be at least 1");
        }
        Ok(())
    }

    pub fn print_config(&self) {
        info!("Configuration:");
        info!("- Database: {}", self.db_path.display());
        info!("- Pool Size: {}", self.pool_size);
        info!("- Busy Timeout: {}ms", self.busy_timeout_ms);
        info!("- Inbound Queue: {}", self.inbound_queue_size);
    }
}
