/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `HOST`: Host to bind to (default: 0.0.0.0)
/// - `PORT`: Port to bind to (default: 3000)
/// - `ALLOWED_ORIGINS`: Comma-separated CORS origins (default: http://localhost:3000)
/// - `TRUSTED_IPS`: Comma-separated client addresses exempt from rate limiting
/// - `RATE_LIMIT_WINDOW_SECS`: Rate limit window length (default: 900)
/// - `RATE_LIMIT_MAX`: Requests per client per window (default: 100)
/// - `BODY_LIMIT_BYTES`: Maximum request body size (default: 10240)
/// - `HSTS_ENABLED`: Emit Strict-Transport-Security (default: true)
/// - `LOG_FORMAT`: `json` for JSON logs, anything else for plain text
/// - `LOG_DIR`: Directory for daily `access` and `error` log files
///   (default: logs). Set it empty to log to the console only.
///
/// `APP_ENV` and `TRUST_PROXY` are not part of this struct. The trust-proxy
/// policy reads them per request, see [`bulwark_shared::proxy`].
///
/// # Example
///
/// ```no_run
/// use bulwark_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use bulwark_shared::env::{EnvSource, ProcessEnv};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// CORS configuration
    pub cors: CorsConfig,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,

    /// Response hardening configuration
    pub security: SecurityConfig,

    /// Log output configuration
    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Maximum accepted request body, in bytes
    pub body_limit_bytes: usize,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to make cross-origin requests. `*` allows any origin
    /// without credentials.
    pub allowed_origins: Vec<String>,
}

/// Fixed-window rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in seconds
    pub window_secs: u64,

    /// Requests allowed per client per window
    pub max_requests: u32,

    /// Client addresses that bypass the limiter
    pub trusted_ips: Vec<String>,

    /// Message returned with 429 responses
    pub message: String,
}

/// Response hardening configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Whether to send Strict-Transport-Security
    pub hsts: bool,
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,

    /// Where the rotating log files go, `None` for console only
    pub dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                body_limit_bytes: 10 * 1024,
            },
            cors: CorsConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            },
            rate_limit: RateLimitConfig::default(),
            security: SecurityConfig { hsts: true },
            logging: LoggingConfig {
                json: false,
                dir: Some(PathBuf::from("logs")),
            },
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 15 * 60,
            max_requests: 100,
            trusted_ips: Vec::new(),
            message: "Too many requests from this IP, please try again later".to_string(),
        }
    }
}

impl RateLimitConfig {
    /// Get the window duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// Reads a `.env` file first when one is present.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that cannot be parsed.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_source(&ProcessEnv)
    }

    /// Loads configuration from an arbitrary variable source
    pub fn from_source(env: &dyn EnvSource) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let host = env.var("HOST").unwrap_or(defaults.api.host);
        let port = parse_var(env, "PORT", defaults.api.port)?;
        let body_limit_bytes = parse_var(env, "BODY_LIMIT_BYTES", defaults.api.body_limit_bytes)?;

        let allowed_origins = env
            .var("ALLOWED_ORIGINS")
            .map(|v| parse_list(&v))
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.cors.allowed_origins);

        let trusted_ips = env
            .var("TRUSTED_IPS")
            .map(|v| parse_list(&v))
            .unwrap_or_default();

        let window_secs = parse_var(env, "RATE_LIMIT_WINDOW_SECS", defaults.rate_limit.window_secs)?;
        if window_secs == 0 {
            anyhow::bail!("RATE_LIMIT_WINDOW_SECS must be greater than zero");
        }

        let max_requests = parse_var(env, "RATE_LIMIT_MAX", defaults.rate_limit.max_requests)?;
        let hsts = parse_var(env, "HSTS_ENABLED", defaults.security.hsts)?;

        let json = env
            .var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(defaults.logging.json);

        let log_dir = match env.var("LOG_DIR") {
            Some(dir) if dir.trim().is_empty() => None,
            Some(dir) => Some(PathBuf::from(dir.trim())),
            None => defaults.logging.dir,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                body_limit_bytes,
            },
            cors: CorsConfig { allowed_origins },
            rate_limit: RateLimitConfig {
                window_secs,
                max_requests,
                trusted_ips,
                ..defaults.rate_limit
            },
            security: SecurityConfig { hsts },
            logging: LoggingConfig { json, dir: log_dir },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_var<T>(env: &dyn EnvSource, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env.var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has invalid value {raw:?}")),
        None => Ok(default),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
