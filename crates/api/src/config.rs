use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Bearer token verification settings.
    pub jwt: JwtConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `JWT_SECRET`           | required                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = parse_var("PORT", "3000")?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", "30")?;
        let jwt = JwtConfig::from_env()?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt,
        })
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = std::env::var(var).unwrap_or_else(|_| default.to_string());
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value })
}
