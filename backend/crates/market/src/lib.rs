//! Collectible Number Market Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository trait
//! - `application/` - Use cases
//! - `infra/` - Repository implementations (PostgreSQL, JSON document)
//! - `presentation/` - HTTP handlers
//!
//! ## Consistency Model
//! - Compound repository operations are atomic per backend: database
//!   transactions with ordered row locks, or a store-wide mutex with
//!   persist-before-commit for the JSON document
//! - Currency is conserved by every transfer: a purchase debits and
//!   credits in the same atomic step, exchanges move tokens only
//! - Login codes are single-use and expire server-side

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::MarketConfig;
pub use error::{MarketError, MarketResult};
pub use infra::json::JsonMarketRepository;
pub use infra::postgres::PgMarketRepository;
pub use presentation::router::{market_router, market_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult, OptionExt, ResultExt},
    kind::ErrorKind,
};

#[cfg(test)]
mod tests;
