use std::{env, str::FromStr, time::Duration};

use bean_common::{helpers::parse_boolean_flag, Secret, DEFAULT_CURRENCY_CODE};
use log::*;

use crate::processor::DEFAULT_PROCESSOR_BASE_URL;

const DEFAULT_BM_HOST: &str = "127.0.0.1";
const DEFAULT_BM_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/bean_market.db";
const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;
const DEFAULT_DB_TX_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_db_connections: u32,
    /// Apply outstanding database migrations at start-up.
    pub run_migrations: bool,
    pub auth: AuthConfig,
    pub webhook: WebhookConfig,
    /// Fulfilment transactions that take longer than this are abandoned and rolled back.
    pub db_tx_timeout: Duration,
    pub processor: ProcessorConfig,
    /// Passed through to the front end deployment. The server itself does not use it.
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BM_HOST.to_string(),
            port: DEFAULT_BM_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_db_connections: DEFAULT_MAX_DB_CONNECTIONS,
            run_migrations: true,
            auth: AuthConfig::default(),
            webhook: WebhookConfig::default(),
            db_tx_timeout: Duration::from_millis(DEFAULT_DB_TX_TIMEOUT_MS),
            processor: ProcessorConfig::default(),
            cors_origin: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("BM_HOST").ok().unwrap_or_else(|| DEFAULT_BM_HOST.into());
        let port = parse_env("BM_PORT", DEFAULT_BM_PORT);
        let database_url = env::var("BM_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ BM_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_db_connections = parse_env("BM_MAX_DB_CONNECTIONS", DEFAULT_MAX_DB_CONNECTIONS);
        let run_migrations = parse_boolean_flag(env::var("BM_RUN_MIGRATIONS").ok(), true);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|| {
            error!("🪛️ BM_JWT_SECRET is not set. No access token can be validated until it is.");
            AuthConfig::default()
        });
        let webhook = WebhookConfig::from_env();
        let db_tx_timeout = Duration::from_millis(parse_env("BM_DB_TX_TIMEOUT_MS", DEFAULT_DB_TX_TIMEOUT_MS));
        let processor = ProcessorConfig::from_env();
        let cors_origin = env::var("BM_CORS_ORIGIN").ok().filter(|s| !s.trim().is_empty());
        Self {
            host,
            port,
            database_url,
            max_db_connections,
            run_migrations,
            auth,
            webhook,
            db_tx_timeout,
            processor,
            cors_origin,
        }
    }
}

/// Reads and parses an environment variable. Missing or invalid values fall back to `default`.
fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// The HMAC-SHA256 key that access tokens are signed with. It is shared with the identity provider.
    /// While it is unset, every request that needs a user is refused.
    pub jwt_secret: Secret<String>,
}

impl AuthConfig {
    pub fn new<S: Into<String>>(jwt_secret: S) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.into()) }
    }

    pub fn try_from_env() -> Option<Self> {
        env::var("BM_JWT_SECRET").ok().filter(|s| !s.trim().is_empty()).map(Self::new)
    }
}

//-------------------------------------------------  WebhookConfig  ----------------------------------------------------
#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// The processor's webhook signing secret.
    pub secret: Secret<String>,
    /// The maximum age of a signature, in seconds. `None` disables the freshness check.
    pub tolerance_secs: Option<i64>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self { secret: Secret::default(), tolerance_secs: Some(DEFAULT_WEBHOOK_TOLERANCE_SECS) }
    }
}

impl WebhookConfig {
    pub fn new<S: Into<String>>(secret: S, tolerance_secs: Option<i64>) -> Self {
        Self { secret: Secret::new(secret.into()), tolerance_secs }
    }

    pub fn from_env() -> Self {
        let secret = Secret::new(env::var("BM_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ BM_WEBHOOK_SECRET is not set. Every payment notification will be rejected until it is set to the \
                 signing secret of your webhook endpoint."
            );
            String::default()
        }));
        let tolerance = parse_env("BM_WEBHOOK_TOLERANCE_SECS", DEFAULT_WEBHOOK_TOLERANCE_SECS);
        let tolerance_secs = match tolerance {
            t if t <= 0 => {
                warn!("🪛️ Webhook timestamp checks are disabled. Replayed notifications will be accepted.");
                None
            },
            t => Some(t),
        };
        Self { secret, tolerance_secs }
    }
}

//-------------------------------------------------  ProcessorConfig  --------------------------------------------------
#[derive(Clone, Debug)]
pub struct ProcessorConfig {
    pub api_key: Secret<String>,
    pub base_url: String,
    /// The currency that payment intents are created in.
    pub currency: String,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            api_key: Secret::default(),
            base_url: DEFAULT_PROCESSOR_BASE_URL.to_string(),
            currency: DEFAULT_CURRENCY_CODE.to_string(),
        }
    }
}

impl ProcessorConfig {
    pub fn from_env() -> Self {
        let api_key = Secret::new(env::var("BM_PROCESSOR_API_KEY").ok().unwrap_or_else(|| {
            error!("🪛️ BM_PROCESSOR_API_KEY is not set. Checkout will not work until it is.");
            String::default()
        }));
        let base_url = env::var("BM_PROCESSOR_BASE_URL")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_PROCESSOR_BASE_URL.to_string());
        let currency = env::var("BM_CURRENCY")
            .ok()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string());
        Self { api_key, base_url, currency }
    }
}
