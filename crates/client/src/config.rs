use std::sync::Arc;
use std::time::Duration;

use crate::coordinator::{ProjectCoordinator, DEFAULT_STALE_TIME};
use crate::error::StoreError;
use crate::sink::ObservabilitySink;
use crate::store::{ResourceStoreClient, RestStore, TableStore};

/// Which store binding a deployment talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Rest,
    Table,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(StoreBackend::Rest),
            "table" => Ok(StoreBackend::Table),
            other => Err(ConfigError::Invalid {
                var: "STORE_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("{0} must be set for the table backend")]
    Missing(&'static str),

    #[error("Failed to build store client: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),
}

/// Client-side configuration loaded from environment variables.
///
/// | Env Var               | Default                 |
/// |-----------------------|-------------------------|
/// | `STORE_BACKEND`       | `rest`                  |
/// | `API_URL`             | `http://localhost:3000` |
/// | `API_TOKEN`           | unset                   |
/// | `DATABASE_URL`        | unset (table only)      |
/// | `PROJECTS_STALE_SECS` | `300`                   |
/// | `STORE_TIMEOUT_SECS`  | unset (no timeout)      |
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend: StoreBackend,
    pub api_url: String,
    pub api_token: Option<String>,
    pub database_url: Option<String>,
    pub stale_time: Duration,
    pub store_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Rest,
            api_url: "http://localhost:3000".into(),
            api_token: None,
            database_url: None,
            stale_time: DEFAULT_STALE_TIME,
            store_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let backend = match get("STORE_BACKEND") {
            Some(v) => v.parse()?,
            None => defaults.backend,
        };

        let stale_time = match get("PROJECTS_STALE_SECS") {
            Some(v) => Duration::from_secs(parse_secs("PROJECTS_STALE_SECS", &v)?),
            None => defaults.stale_time,
        };

        let store_timeout = get("STORE_TIMEOUT_SECS")
            .map(|v| parse_secs("STORE_TIMEOUT_SECS", &v).map(Duration::from_secs))
            .transpose()?;

        Ok(Self {
            backend,
            api_url: get("API_URL").unwrap_or(defaults.api_url),
            api_token: get("API_TOKEN"),
            database_url: get("DATABASE_URL"),
            stale_time,
            store_timeout,
        })
    }

    /// Construct the configured store binding.
    pub async fn connect_store(&self) -> Result<Arc<dyn ResourceStoreClient>, ConfigError> {
        match self.backend {
            StoreBackend::Rest => {
                let mut store = match self.store_timeout {
                    Some(timeout) => RestStore::with_timeout(&self.api_url, timeout)?,
                    None => RestStore::new(&self.api_url),
                };
                if let Some(token) = &self.api_token {
                    store = store.with_token(token);
                }
                tracing::info!(api_url = %self.api_url, "Using REST project store");
                Ok(Arc::new(store))
            }
            StoreBackend::Table => {
                let url = self
                    .database_url
                    .as_deref()
                    .ok_or(ConfigError::Missing("DATABASE_URL"))?;
                let pool = outreach_db::create_pool(url).await?;
                tracing::info!("Using table project store");
                Ok(Arc::new(TableStore::new(pool)))
            }
        }
    }
}

fn parse_secs(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
    })
}

impl ProjectCoordinator {
    /// Connect the configured store and wrap it in a coordinator.
    pub async fn from_config(
        config: &ClientConfig,
        sink: Arc<dyn ObservabilitySink>,
    ) -> Result<Self, ConfigError> {
        let store = config.connect_store().await?;
        Ok(Self::with_stale_time(store, sink, config.stale_time))
    }
}
