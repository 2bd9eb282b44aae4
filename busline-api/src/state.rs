use std::sync::Arc;
use busline_core::SeatLedger;
use busline_store::app_config::RateLimitConfig;
use busline_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub ledger: SeatLedger,
    /// Rate limiting is skipped when no Redis is configured.
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
}
