//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DUKA_DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `DUKA_HOST` - Bind address (default: 127.0.0.1)
//! - `DUKA_PORT` - Listen port (default: 3000)
//! - `DUKA_STOCK_SWEEP_SECS` - Stock maintenance interval (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//!
//! ## M-Pesa gateway (all-or-nothing; payments dispatch is disabled without them)
//! - `MPESA_CONSUMER_KEY` / `MPESA_CONSUMER_SECRET` - Daraja API credentials
//! - `MPESA_SHORT_CODE` - Business short code
//! - `MPESA_PASSKEY` - Lipa na M-Pesa online passkey
//! - `MPESA_CALLBACK_URL` - Public URL for STK push result callbacks
//! - `MPESA_ENVIRONMENT` - `sandbox` (default) or `production`
//! - `MPESA_TIMEOUT_SECS` - Gateway request timeout (default: 30)
//!
//! ## SMTP (all-or-nothing; notifications are disabled without them)
//! - `SMTP_HOST` / `SMTP_PORT` / `SMTP_USERNAME` / `SMTP_PASSWORD`
//! - `SMTP_FROM` - From address for transactional mail

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Incomplete {0} configuration: {1} is set but {2} is missing")]
    Incomplete(&'static str, &'static str, &'static str),
}

/// Duka server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Interval between stock maintenance sweeps
    pub stock_sweep_interval: Duration,
    /// M-Pesa gateway configuration, if payments dispatch is enabled
    pub mpesa: Option<MpesaConfig>,
    /// SMTP configuration, if email notifications are enabled
    pub email: Option<EmailConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// M-Pesa Daraja API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct MpesaConfig {
    /// Daraja consumer key
    pub consumer_key: String,
    /// Daraja consumer secret
    pub consumer_secret: SecretString,
    /// Business short code (PartyB)
    pub short_code: String,
    /// Lipa na M-Pesa online passkey
    pub passkey: SecretString,
    /// Public callback URL for STK push results
    pub callback_url: Url,
    /// Whether to use the sandbox or production API hosts
    pub environment: MpesaEnvironment,
    /// Request timeout for gateway calls
    pub timeout: Duration,
}

impl std::fmt::Debug for MpesaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpesaConfig")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .field("short_code", &self.short_code)
            .field("passkey", &"[REDACTED]")
            .field("callback_url", &self.callback_url.as_str())
            .field("environment", &self.environment)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Daraja API environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MpesaEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl MpesaEnvironment {
    /// Base URL for this environment's API host.
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Sandbox => "https://sandbox.safaricom.co.ke",
            Self::Production => "https://api.safaricom.co.ke",
        }
    }
}

impl std::str::FromStr for MpesaEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            _ => Err(format!("invalid mpesa environment: {s}")),
        }
    }
}

/// SMTP configuration for transactional mail.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP relay host
    pub host: String,
    /// SMTP port
    pub port: u16,
    /// SMTP username
    pub username: String,
    /// SMTP password
    pub password: SecretString,
    /// From address for outgoing mail
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if the M-Pesa / SMTP variable groups are only partially set.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = SecretString::from(require_var("DUKA_DATABASE_URL")?);

        let host = parse_var("DUKA_HOST", "127.0.0.1")?;
        let port = parse_var("DUKA_PORT", "3000")?;
        let stock_sweep_interval =
            Duration::from_secs(parse_var("DUKA_STOCK_SWEEP_SECS", "300")?);

        Ok(Self {
            database_url,
            host,
            port,
            stock_sweep_interval,
            mpesa: MpesaConfig::from_env()?,
            email: EmailConfig::from_env()?,
            sentry_dsn: optional_var("SENTRY_DSN"),
            sentry_environment: optional_var("SENTRY_ENVIRONMENT"),
        })
    }

    /// The socket address to bind the server to.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl MpesaConfig {
    /// Load the M-Pesa variable group.
    ///
    /// Returns `Ok(None)` when `MPESA_CONSUMER_KEY` is unset; all remaining
    /// variables are then required so a half-configured gateway fails fast.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(consumer_key) = optional_var("MPESA_CONSUMER_KEY") else {
            return Ok(None);
        };

        let group_var = |name: &'static str| {
            optional_var(name)
                .ok_or(ConfigError::Incomplete("M-Pesa", "MPESA_CONSUMER_KEY", name))
        };

        let callback_raw = group_var("MPESA_CALLBACK_URL")?;
        let callback_url = Url::parse(&callback_raw).map_err(|e| {
            ConfigError::InvalidEnvVar("MPESA_CALLBACK_URL".to_owned(), e.to_string())
        })?;

        let environment = optional_var("MPESA_ENVIRONMENT")
            .unwrap_or_else(|| "sandbox".to_owned())
            .parse()
            .map_err(|e| ConfigError::InvalidEnvVar("MPESA_ENVIRONMENT".to_owned(), e))?;

        Ok(Some(Self {
            consumer_key,
            consumer_secret: SecretString::from(group_var("MPESA_CONSUMER_SECRET")?),
            short_code: group_var("MPESA_SHORT_CODE")?,
            passkey: SecretString::from(group_var("MPESA_PASSKEY")?),
            callback_url,
            environment,
            timeout: Duration::from_secs(parse_var("MPESA_TIMEOUT_SECS", "30")?),
        }))
    }
}

impl EmailConfig {
    /// Load the SMTP variable group.
    ///
    /// Returns `Ok(None)` when `SMTP_HOST` is unset.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(host) = optional_var("SMTP_HOST") else {
            return Ok(None);
        };

        let group_var = |name: &'static str| {
            optional_var(name).ok_or(ConfigError::Incomplete("SMTP", "SMTP_HOST", name))
        };

        Ok(Some(Self {
            host,
            port: parse_var("SMTP_PORT", "587")?,
            username: group_var("SMTP_USERNAME")?,
            password: SecretString::from(group_var("SMTP_PASSWORD")?),
            from_address: group_var("SMTP_FROM")?,
        }))
    }
}

/// Read a required environment variable.
fn require_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

/// Read an optional environment variable, treating empty strings as unset.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Read an environment variable with a default, parsing it into `T`.
fn parse_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_owned());
    raw.parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(name.to_owned(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mpesa_environment_parses() {
        assert_eq!(
            "sandbox".parse::<MpesaEnvironment>().unwrap(),
            MpesaEnvironment::Sandbox
        );
        assert_eq!(
            "production".parse::<MpesaEnvironment>().unwrap(),
            MpesaEnvironment::Production
        );
        assert!("staging".parse::<MpesaEnvironment>().is_err());
    }

    #[test]
    fn mpesa_environment_hosts() {
        assert!(MpesaEnvironment::Sandbox.base_url().contains("sandbox"));
        assert!(!MpesaEnvironment::Production.base_url().contains("sandbox"));
    }

    #[test]
    fn mpesa_config_debug_redacts_secrets() {
        let config = MpesaConfig {
            consumer_key: "key".to_owned(),
            consumer_secret: SecretString::from("s3cret"),
            short_code: "174379".to_owned(),
            passkey: SecretString::from("p4sskey"),
            callback_url: Url::parse("https://example.com/api/payments/callback").unwrap(),
            environment: MpesaEnvironment::Sandbox,
            timeout: Duration::from_secs(30),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("p4sskey"));
        assert!(debug.contains("[REDACTED]"));
    }
}
