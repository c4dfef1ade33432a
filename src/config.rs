use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use unicorn_sport_access::Tier;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub stripe: StripeConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for a subscription lookup inside an access check
    #[serde(default = "default_gate_timeout_ms")]
    pub gate_timeout_ms: u64,
    /// Web client base URL, used in links sent by email
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

fn default_gate_timeout_ms() -> u64 {
    3000
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    /// CDN host serving the bucket, e.g. `https://media.example.com`
    #[serde(default)]
    pub cdn_url: String,
    /// Custom S3-compatible endpoint (MinIO, localstack)
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            bucket: default_bucket(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            cdn_url: String::new(),
            endpoint: None,
        }
    }
}

impl StorageConfig {
    pub fn is_configured(&self) -> bool {
        !self.access_key_id.is_empty() && !self.secret_access_key.is_empty()
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bucket() -> String {
    "unicorn-sport-media".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StripeConfig {
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub webhook_secret: String,
    #[serde(default)]
    pub price_scout: String,
    #[serde(default)]
    pub price_pro: String,
    #[serde(default)]
    pub price_club: String,
    #[serde(default = "default_success_url")]
    pub success_url: String,
    #[serde(default = "default_cancel_url")]
    pub cancel_url: String,
    #[serde(default = "default_portal_return_url")]
    pub portal_return_url: String,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            webhook_secret: String::new(),
            price_scout: String::new(),
            price_pro: String::new(),
            price_club: String::new(),
            success_url: default_success_url(),
            cancel_url: default_cancel_url(),
            portal_return_url: default_portal_return_url(),
        }
    }
}

impl StripeConfig {
    pub fn price_for(&self, tier: Tier) -> Option<&str> {
        let price = match tier {
            Tier::Free => return None,
            Tier::Scout => &self.price_scout,
            Tier::Pro => &self.price_pro,
            Tier::Club => &self.price_club,
        };

        (!price.is_empty()).then_some(price.as_str())
    }

    /// Reverse of `price_for`, used when the provider reports a plan change.
    pub fn tier_for_price(&self, price_id: &str) -> Option<Tier> {
        [Tier::Scout, Tier::Pro, Tier::Club]
            .into_iter()
            .find(|tier| self.price_for(*tier) == Some(price_id))
    }
}

fn default_success_url() -> String {
    "http://localhost:3000/subscription/success".to_string()
}

fn default_cancel_url() -> String {
    "http://localhost:3000/subscription/cancel".to_string()
}

fn default_portal_return_url() -> String {
    "http://localhost:3000/account/subscription".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Falls back to json when `ENVIRONMENT=production`.
    #[serde(default)]
    pub log_format: Option<LogFormat>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl ObservabilityConfig {
    pub fn format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(|| {
            match std::env::var("ENVIRONMENT").as_deref() {
                Ok("production") => LogFormat::Json,
                _ => LogFormat::Pretty,
            }
        })
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Unprefixed variables kept for existing deployments.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("DATABASE_URL", "database.url"),
    ("JWT_SECRET", "jwt.secret"),
    ("PORT", "server.port"),
    ("AWS_REGION", "storage.region"),
    ("AWS_S3_BUCKET", "storage.bucket"),
    ("AWS_ACCESS_KEY_ID", "storage.access_key_id"),
    ("AWS_SECRET_ACCESS_KEY", "storage.secret_access_key"),
    ("AWS_CLOUDFRONT_URL", "storage.cdn_url"),
    ("STRIPE_SECRET_KEY", "stripe.secret_key"),
    ("STRIPE_WEBHOOK_SECRET", "stripe.webhook_secret"),
    ("STRIPE_PRICE_SCOUT", "stripe.price_scout"),
    ("STRIPE_PRICE_PRO", "stripe.price_pro"),
    ("STRIPE_PRICE_CLUB", "stripe.price_club"),
    ("STRIPE_SUCCESS_URL", "stripe.success_url"),
    ("STRIPE_CANCEL_URL", "stripe.cancel_url"),
];

impl Config {
    /// Load configuration from file and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Legacy unprefixed variables (DATABASE_URL, STRIPE_SECRET_KEY, ...)
    /// 2. Environment variables (UNICORN__DATABASE__URL, etc.)
    /// 3. Config file specified by path
    /// 4. Hardcoded defaults
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        builder = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite:unicorn.db")?
            .set_default("database.max_connections", 5)?
            .set_default("jwt.secret", "")?
            .set_default("jwt.access_ttl_minutes", 15)?
            .set_default("jwt.refresh_ttl_days", 7)?;

        let config_file_path = config_path
            .or_else(|| env::var("CONFIG_PATH").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        if std::path::Path::new(&config_file_path).exists() {
            builder = builder.add_source(File::with_name(&config_file_path));
        }

        builder = builder.add_source(
            Environment::with_prefix("UNICORN")
                .separator("__")
                .try_parsing(true),
        );

        for (var, key) in LEGACY_ENV {
            if let Ok(value) = env::var(var) {
                builder = builder.set_override(*key, value)?;
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt.secret.len() < 32 {
            return Err("JWT secret must be at least 32 characters long".to_string());
        }
        if self.jwt.access_ttl_minutes < 1 || self.jwt.refresh_ttl_days < 1 {
            return Err("JWT lifetimes must be positive".to_string());
        }
        if self.database.max_connections < 1 {
            return Err("Database max_connections must be at least 1".to_string());
        }
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                gate_timeout_ms: default_gate_timeout_ms(),
                frontend_url: default_frontend_url(),
            },
            database: DatabaseConfig {
                url: "sqlite:test.db".to_string(),
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: "test_secret_key_minimum_32_characters_long".to_string(),
                access_ttl_minutes: 15,
                refresh_ttl_days: 7,
            },
            storage: StorageConfig::default(),
            stripe: StripeConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_validation_short_secret() {
        let mut config = config();
        config.jwt.secret = "short".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_port() {
        let mut config = config();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_connections() {
        let mut config = config();
        config.database.max_connections = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_price_lookup_skips_free_and_blank() {
        let mut stripe = StripeConfig::default();
        stripe.price_pro = "price_pro_monthly".to_string();

        assert_eq!(stripe.price_for(Tier::Pro), Some("price_pro_monthly"));
        assert_eq!(stripe.price_for(Tier::Scout), None);
        assert_eq!(stripe.price_for(Tier::Free), None);
    }

    #[test]
    fn test_tier_from_price() {
        let mut stripe = StripeConfig::default();
        stripe.price_scout = "price_scout".to_string();
        stripe.price_club = "price_club".to_string();

        assert_eq!(stripe.tier_for_price("price_club"), Some(Tier::Club));
        assert_eq!(stripe.tier_for_price("price_unknown"), None);
        // blank price ids never match
        assert_eq!(stripe.tier_for_price(""), None);
    }
}
