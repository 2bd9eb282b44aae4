use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    pub auth: AuthConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    pub max_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { max_attempts: busline_core::ledger::DEFAULT_MAX_ATTEMPTS }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub requests: i64,
    pub window_seconds: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { requests: 100, window_seconds: 60 }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Environment specific overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // BUSLINE__DATABASE__URL=... overrides database.url
            .add_source(config::Environment::with_prefix("BUSLINE").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_toml(contents: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 8080

            [database]
            url = "postgres://localhost/busline"

            [auth]
            jwt_secret = "dev-secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.max_connections, 5);
        assert!(config.redis.is_none());
        assert_eq!(config.ledger.max_attempts, busline_core::ledger::DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.rate_limit.requests, 100);
    }

    #[test]
    fn test_redis_and_overrides() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 3000

            [database]
            url = "postgres://db/busline"
            max_connections = 20

            [redis]
            url = "redis://cache:6379"

            [auth]
            jwt_secret = "s"

            [ledger]
            max_attempts = 3

            [rate_limit]
            requests = 10
            window_seconds = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.redis.unwrap().url, "redis://cache:6379");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.ledger.max_attempts, 3);
        assert_eq!(config.rate_limit.window_seconds, 1);
    }

    #[test]
    fn test_missing_secret_is_error() {
        let result = Config::from_toml(
            r#"
            [server]
            port = 3000
            [database]
            url = "postgres://db/busline"
            "#,
        );
        assert!(result.is_err());
    }
}
