//! Market Router

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use sqlx::PgPool;

use crate::application::config::MarketConfig;
use crate::application::notify::{LogNotifier, Notifier};
use crate::domain::repository::MarketRepository;
use crate::infra::postgres::PgMarketRepository;
use crate::presentation::handlers::{self, MarketAppState};

/// Create the market router with PostgreSQL repository
pub fn market_router(pool: PgPool, config: MarketConfig) -> Router {
    market_router_generic(PgMarketRepository::new(pool), LogNotifier, config)
}

/// Create a generic market router for any repository and notifier
pub fn market_router_generic<R, N>(repo: R, notifier: N, config: MarketConfig) -> Router
where
    R: MarketRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let state = MarketAppState {
        repo: Arc::new(repo),
        notifier: Arc::new(notifier),
        config: Arc::new(config),
    };

    Router::new()
        .route("/users", post(handlers::ensure_user::<R, N>))
        .route("/login", post(handlers::begin_login::<R, N>))
        .route("/verify", post(handlers::verify_login::<R, N>))
        .route("/logout", post(handlers::logout::<R, N>))
        .route("/mint", post(handlers::mint::<R, N>))
        .route("/collection", get(handlers::collection::<R, N>))
        .route("/balance", get(handlers::balance::<R, N>))
        .route("/sell", post(handlers::sell::<R, N>))
        .route("/market", get(handlers::market::<R, N>))
        .route("/buy", post(handlers::buy::<R, N>))
        .route("/cancel", post(handlers::cancel::<R, N>))
        .route("/exchange", post(handlers::exchange::<R, N>))
        .route("/participants", get(handlers::participants::<R, N>))
        .with_state(state)
}
