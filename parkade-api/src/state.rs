use std::sync::Arc;
use parkade_allocation::AllocationEngine;
use parkade_core::AdminRepository;
use parkade_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct RateLimit {
    pub redis: Arc<RedisClient>,
    pub requests: i64,
    pub window_seconds: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: AllocationEngine,
    pub admins: Arc<dyn AdminRepository>,
    /// `None` disables rate limiting
    pub rate_limit: Option<RateLimit>,
    pub auth: AuthConfig,
}
