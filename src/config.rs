use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub ai: AiConfig,
    pub mode: RuntimeMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Upper bound on waiting for a pooled connection.
    pub acquire_timeout: Duration,
    /// How often the background monitor pings the pool.
    pub monitor_interval: Duration,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

// Keep the secret out of logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Deserialize)]
pub struct AiConfig {
    pub provider: String,
    pub api_key: String,
    pub base_url: String,
    pub default_model: String,
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Deployment mode, read from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    Development,
    Test,
    Staging,
    Production,
}

impl RuntimeMode {
    /// Unexpected error messages are replaced with a generic one.
    pub const fn masks_internal_errors(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }

    /// A lost database connection terminates the process.
    pub const fn exits_on_pool_error(&self) -> bool {
        !matches!(self, Self::Development)
    }

    /// JSON log lines for log shippers.
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

impl FromStr for RuntimeMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(anyhow::anyhow!("Invalid APP_ENV: {}", other)),
        }
    }
}

impl std::fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeMode::Development => write!(f, "development"),
            RuntimeMode::Test => write!(f, "test"),
            RuntimeMode::Staging => write!(f, "staging"),
            RuntimeMode::Production => write!(f, "production"),
        }
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{} must be set", name))
}

fn parsed<T>(name: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {} ({})", name, raw, e))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: parsed("PORT", "3000")?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parsed("DB_MAX_CONNECTIONS", "10")?,
                acquire_timeout: Duration::from_secs(parsed("DB_ACQUIRE_TIMEOUT_SECS", "10")?),
                monitor_interval: Duration::from_secs(parsed("DB_MONITOR_INTERVAL_SECS", "30")?),
            },
            auth: AuthConfig {
                jwt_secret: required("JWT_SECRET")?,
            },
            ai: AiConfig {
                provider: env::var("AI_PROVIDER").unwrap_or_else(|_| "gemini".to_string()),
                api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
                base_url: env::var("AI_BASE_URL").unwrap_or_else(|_| {
                    crate::llm::gemini::GEMINI_API_BASE.to_string()
                }),
                default_model: env::var("AI_DEFAULT_MODEL")
                    .unwrap_or_else(|_| crate::llm::gemini::models::DEFAULT.to_string()),
            },
            mode: parsed("APP_ENV", "development")?,
        })
    }
}
