//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOP_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `SHOP_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOP_PORT` - Listen port (default: 8080)
//! - `SHOP_UPLOAD_DIR` - Directory for payment proof files (default: `uploaded_proofs`)
//! - `PAYMENT_CHAIN_ID` - Settlement chain ID (default: 56, BNB Smart Chain)
//! - `PAYMENT_SLH_ADDRESS` - Destination for SLH payments
//! - `PAYMENT_BNB_ADDRESS` - Destination for BNB payments (default: the SLH address)
//! - `ORDER_TTL_MINUTES` - Age after which unpaid pending orders expire (default: 1440)
//! - `ORDER_SWEEP_INTERVAL_SECS` - Expiry sweep period (default: 300)
//! - `SHOP_OPERATOR_TOKEN` - When set, approving an order requires this bearer token
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

use slh_shop_core::{PaymentInstructions, PaymentMethod};

/// Destination of all SLH payments unless overridden.
pub const DEFAULT_SLH_ADDRESS: &str = "0xACb0A09414CEA1C879c67bB7A877E4e19480f022";

/// BNB Smart Chain mainnet.
pub const DEFAULT_CHAIN_ID: u64 = 56;

const MIN_OPERATOR_TOKEN_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Where uploaded payment proofs are written
    pub upload_dir: PathBuf,
    /// Static payment destinations
    pub payment: PaymentConfig,
    /// Order expiry policy
    pub orders: OrderPolicy,
    /// Bearer token gating the approve action, if configured
    pub operator_token: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Static settlement configuration shared by every shop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfig {
    pub chain_id: u64,
    pub slh_address: String,
    pub bnb_address: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            slh_address: DEFAULT_SLH_ADDRESS.to_string(),
            bnb_address: DEFAULT_SLH_ADDRESS.to_string(),
        }
    }
}

impl PaymentConfig {
    /// Destination address for the given currency.
    #[must_use]
    pub fn address_for(&self, method: PaymentMethod) -> &str {
        match method {
            PaymentMethod::Slh => &self.slh_address,
            PaymentMethod::Bnb => &self.bnb_address,
        }
    }

    /// Build the instructions for paying `amount` in `method`.
    #[must_use]
    pub fn instructions(&self, method: PaymentMethod, amount: Decimal) -> PaymentInstructions {
        PaymentInstructions {
            to_address: self.address_for(method).to_string(),
            amount,
            symbol: method.symbol().to_string(),
            chain_id: self.chain_id,
        }
    }
}

/// Longest accepted order TTL, in minutes (ten years).
pub const MAX_ORDER_TTL_MINUTES: u64 = 10 * 365 * 24 * 60;

/// When unpaid orders are closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderPolicy {
    /// Pending orders older than this are expired.
    pub ttl: Duration,
    /// How often the background sweep runs.
    pub sweep_interval: Duration,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the operator token fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("SHOP_DATABASE_URL")?;
        let host = parse_env("SHOP_HOST", "127.0.0.1")?;
        let port = parse_env("SHOP_PORT", "8080")?;
        let upload_dir = PathBuf::from(get_env_or_default("SHOP_UPLOAD_DIR", "uploaded_proofs"));

        let payment = PaymentConfig::from_env()?;
        let orders = OrderPolicy::from_env()?;

        let operator_token = match get_optional_env("SHOP_OPERATOR_TOKEN") {
            Some(token) => {
                validate_operator_token(&token, "SHOP_OPERATOR_TOKEN")?;
                Some(SecretString::from(token))
            }
            None => None,
        };

        Ok(Self {
            database_url,
            host,
            port,
            upload_dir,
            payment,
            orders,
            operator_token,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let chain_id = parse_env("PAYMENT_CHAIN_ID", &DEFAULT_CHAIN_ID.to_string())?;
        let slh_address = get_env_or_default("PAYMENT_SLH_ADDRESS", DEFAULT_SLH_ADDRESS);
        validate_evm_address(&slh_address, "PAYMENT_SLH_ADDRESS")?;
        let bnb_address = match get_optional_env("PAYMENT_BNB_ADDRESS") {
            Some(address) => {
                validate_evm_address(&address, "PAYMENT_BNB_ADDRESS")?;
                address
            }
            None => slh_address.clone(),
        };

        Ok(Self {
            chain_id,
            slh_address,
            bnb_address,
        })
    }
}

impl OrderPolicy {
    /// TTL for `minutes`, or `None` when zero or above
    /// [`MAX_ORDER_TTL_MINUTES`].
    #[must_use]
    pub fn ttl_from_minutes(minutes: u64) -> Option<Duration> {
        if minutes > MAX_ORDER_TTL_MINUTES {
            return None;
        }
        minutes
            .checked_mul(60)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    fn from_env() -> Result<Self, ConfigError> {
        let ttl_minutes: u64 = parse_env("ORDER_TTL_MINUTES", "1440")?;
        let sweep_secs: u64 = parse_env("ORDER_SWEEP_INTERVAL_SECS", "300")?;
        let ttl = Self::ttl_from_minutes(ttl_minutes).ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "ORDER_TTL_MINUTES".to_string(),
                format!("must be between 1 and {MAX_ORDER_TTL_MINUTES}"),
            )
        })?;
        if sweep_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ORDER_SWEEP_INTERVAL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            ttl,
            sweep_interval: Duration::from_secs(sweep_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Check for a `0x`-prefixed, 20-byte hex address.
fn validate_evm_address(address: &str, var_name: &str) -> Result<(), ConfigError> {
    let valid = address
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "expected a 0x-prefixed 40 character hex address".to_string(),
        ))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that the operator token is long, not a placeholder, and random-looking.
fn validate_operator_token(token: &str, var_name: &str) -> Result<(), ConfigError> {
    if token.len() < MIN_OPERATOR_TOKEN_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {MIN_OPERATOR_TOKEN_LENGTH} characters (got {})",
                token.len()
            ),
        ));
    }

    let lower = token.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(token);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated token."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_payment_config_uses_slh_address_for_both() {
        let payment = PaymentConfig::default();
        assert_eq!(payment.address_for(PaymentMethod::Slh), DEFAULT_SLH_ADDRESS);
        assert_eq!(payment.address_for(PaymentMethod::Bnb), DEFAULT_SLH_ADDRESS);
        assert_eq!(payment.chain_id, 56);
    }

    #[test]
    fn test_instructions_are_not_shop_specific() {
        let payment = PaymentConfig {
            chain_id: 97,
            slh_address: DEFAULT_SLH_ADDRESS.to_string(),
            bnb_address: "0x00000000000000000000000000000000000000b1".to_string(),
        };
        let slh = payment.instructions(PaymentMethod::Slh, "39.0".parse().unwrap());
        assert_eq!(slh.to_address, DEFAULT_SLH_ADDRESS);
        assert_eq!(slh.symbol, "SLH");
        assert_eq!(slh.amount.to_string(), "39.0");
        assert_eq!(slh.chain_id, 97);

        let bnb = payment.instructions(PaymentMethod::Bnb, "0.1".parse().unwrap());
        assert_eq!(bnb.to_address, "0x00000000000000000000000000000000000000b1");
        assert_eq!(bnb.symbol, "BNB");
    }

    #[test]
    fn test_validate_evm_address() {
        assert!(validate_evm_address(DEFAULT_SLH_ADDRESS, "X").is_ok());
        assert!(validate_evm_address("0xYourBNBMerchantAddress", "X").is_err());
        assert!(validate_evm_address("ACb0A09414CEA1C879c67bB7A877E4e19480f022", "X").is_err());
        assert!(validate_evm_address("0x1234", "X").is_err());
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_operator_token_validation() {
        assert!(matches!(
            validate_operator_token("short", "T"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(validate_operator_token(&"a".repeat(40), "T").is_err());
        assert!(validate_operator_token("changeme-changeme-changeme-changeme", "T").is_err());
        assert!(validate_operator_token("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "T").is_err());
        assert!(validate_operator_token("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%", "T").is_ok());
    }

    #[test]
    fn test_default_order_policy() {
        let policy = OrderPolicy::default();
        assert_eq!(policy.ttl, Duration::from_secs(86_400));
        assert_eq!(policy.sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_ttl_from_minutes_is_bounded() {
        assert_eq!(
            OrderPolicy::ttl_from_minutes(1440),
            Some(Duration::from_secs(86_400))
        );
        assert_eq!(
            OrderPolicy::ttl_from_minutes(MAX_ORDER_TTL_MINUTES),
            Some(Duration::from_secs(MAX_ORDER_TTL_MINUTES * 60))
        );
        assert_eq!(OrderPolicy::ttl_from_minutes(0), None);
        assert_eq!(OrderPolicy::ttl_from_minutes(MAX_ORDER_TTL_MINUTES + 1), None);
        // Would wrap to a tiny TTL if multiplied unchecked
        assert_eq!(OrderPolicy::ttl_from_minutes(u64::MAX / 60 + 1), None);
        assert_eq!(OrderPolicy::ttl_from_minutes(u64::MAX), None);
    }

    #[test]
    fn test_socket_addr() {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8080,
            upload_dir: PathBuf::from("uploaded_proofs"),
            payment: PaymentConfig::default(),
            orders: OrderPolicy::default(),
            operator_token: None,
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
    }
}
