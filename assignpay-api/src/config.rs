/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `API_PRODUCTION`: Enables HSTS (default: false)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `DATABASE_URL`: PostgreSQL connection string (optional; in-memory stores when unset)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for JWT signing (required, at least 32 characters)
/// - `SUBMISSION_DEFAULT_AMOUNT`: Fee pre-filled on new drafts (default: 20)
/// - `SUBMISSION_PARTIAL_FAILURE_POLICY`: `retain` or `compensate` (default: retain)
/// - `LOG_FORMAT`: `json` for JSON logs, anything else for text
/// - `RUST_LOG`: Log filter (default: assignpay_api=debug,assignpay_shared=info,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use assignpay_api::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}:{}", config.api.host, config.api.port);
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use assignpay_shared::models::payment::{is_storable_amount, max_amount};
use assignpay_shared::submission::draft::default_amount;
use assignpay_shared::submission::PartialFailurePolicy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration (None selects the in-memory stores)
    pub database: Option<DatabaseConfig>,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Submission workflow settings
    pub submission: SubmissionConfig,

    /// Log output settings
    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Production mode (turns on HSTS)
    pub production: bool,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Submission workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Fee amount pre-filled on new drafts
    pub default_amount: Decimal,

    /// What happens to the assignment when the payment insert fails
    pub partial_failure_policy: PartialFailurePolicy,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            default_amount: default_amount(),
            partial_failure_policy: PartialFailurePolicy::default(),
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `JWT_SECRET` is missing or shorter than 32 characters
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let api_port = var("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;
        let production = var("API_PRODUCTION").map(|v| parse_bool(&v)).unwrap_or(false);
        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let database = match var("DATABASE_URL").filter(|url| !url.is_empty()) {
            Some(url) => {
                let max_connections = var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|| "10".to_string())
                    .parse::<u32>()
                    .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;
                Some(DatabaseConfig {
                    url,
                    max_connections,
                })
            }
            None => None,
        };

        let jwt_secret = var("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let default_amount = match var("SUBMISSION_DEFAULT_AMOUNT") {
            Some(raw) => raw
                .parse::<Decimal>()
                .context("SUBMISSION_DEFAULT_AMOUNT must be a decimal number")?,
            None => default_amount(),
        };
        if !is_storable_amount(default_amount) {
            anyhow::bail!(
                "SUBMISSION_DEFAULT_AMOUNT must be positive, in whole cents, and at most {}",
                max_amount()
            );
        }

        let partial_failure_policy = match var("SUBMISSION_PARTIAL_FAILURE_POLICY") {
            Some(raw) => raw.parse::<PartialFailurePolicy>().map_err(anyhow::Error::msg)?,
            None => PartialFailurePolicy::default(),
        };

        let json_logs = var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                production,
                cors_origins,
            },
            database,
            jwt: JwtConfig { secret: jwt_secret },
            submission: SubmissionConfig {
                default_amount,
                partial_failure_policy,
            },
            logging: LoggingConfig { json: json_logs },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("JWT_SECRET", SECRET)]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(!config.api.production);
        assert_eq!(config.api.cors_origins, vec!["*".to_string()]);
        assert!(config.database.is_none());
        assert_eq!(config.submission.default_amount, Decimal::new(20, 0));
        assert_eq!(
            config.submission.partial_failure_policy,
            PartialFailurePolicy::Retain
        );
        assert!(!config.logging.json);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "3000"),
            ("API_PRODUCTION", "true"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("DATABASE_URL", "postgresql://localhost/assignpay"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("SUBMISSION_DEFAULT_AMOUNT", "35.50"),
            ("SUBMISSION_PARTIAL_FAILURE_POLICY", "compensate"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert!(config.api.production);
        assert_eq!(config.api.cors_origins.len(), 2);
        assert_eq!(config.database.as_ref().map(|d| d.max_connections), Some(4));
        assert_eq!(config.submission.default_amount, Decimal::new(3550, 2));
        assert_eq!(
            config.submission.partial_failure_policy,
            PartialFailurePolicy::Compensate
        );
        assert!(config.logging.json);
    }

    #[test]
    fn test_jwt_secret_required_and_long_enough() {
        assert!(load(&[]).is_err());
        assert!(load(&[("JWT_SECRET", "short")]).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(load(&[("JWT_SECRET", SECRET), ("API_PORT", "http")]).is_err());
        assert!(load(&[("JWT_SECRET", SECRET), ("SUBMISSION_DEFAULT_AMOUNT", "0")]).is_err());
        assert!(load(&[("JWT_SECRET", SECRET), ("SUBMISSION_DEFAULT_AMOUNT", "0.005")]).is_err());
        assert!(load(&[
            ("JWT_SECRET", SECRET),
            ("SUBMISSION_DEFAULT_AMOUNT", "100000000")
        ])
        .is_err());
        assert!(load(&[
            ("JWT_SECRET", SECRET),
            ("SUBMISSION_PARTIAL_FAILURE_POLICY", "rollback")
        ])
        .is_err());
    }
}
