//! Application Configuration
//!
//! Configuration for the market application layer.

use std::time::Duration;

use crate::domain::value_objects::{GeneratorSettings, RarityThresholds};

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Market application configuration
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Balance granted on account creation
    pub initial_balance: i64,
    /// Mints allowed per user per calendar day
    pub daily_mint_quota: u32,
    /// Login code time-to-live
    pub login_code_ttl: Duration,
    /// Inclusive range for generated login codes
    pub login_code_range: (u32, u32),
    /// Token generator settings
    pub generator: GeneratorSettings,
    /// Rarity tier thresholds
    pub rarity: RarityThresholds,
    /// Cookie name carrying the user identity
    pub identity_cookie_name: String,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            initial_balance: 1000,
            daily_mint_quota: 3,
            login_code_ttl: Duration::from_secs(300),
            login_code_range: (100_000, 999_999),
            generator: GeneratorSettings::default(),
            rarity: RarityThresholds::default(),
            identity_cookie_name: "user_id".to_string(),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
        }
    }
}

impl MarketConfig {
    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Default::default()
        }
    }

    pub fn login_code_ttl_secs(&self) -> i64 {
        self.login_code_ttl.as_secs() as i64
    }
}
