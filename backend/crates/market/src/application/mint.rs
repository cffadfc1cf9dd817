//! Mint Token Use Case
//!
//! Consumes one unit of the daily quota, then generates and grants a
//! token. Quota consumption is the atomic step; generation happens
//! outside any lock since it touches no shared state.

use std::sync::Arc;

use crate::application::config::MarketConfig;
use crate::domain::entities::Token;
use crate::domain::repository::MarketRepository;
use crate::domain::services::{generate_digits, pick_styling};
use crate::domain::value_objects::{Rarity, UserId};
use crate::error::MarketResult;

/// Output DTO for mint
#[derive(Debug, Clone)]
pub struct MintOutput {
    pub token: Token,
    pub rarity: Rarity,
    /// Mints left today after this one
    pub remaining_today: u32,
}

/// Mint Token Use Case
pub struct MintUseCase<R: MarketRepository> {
    repo: Arc<R>,
    config: Arc<MarketConfig>,
}

impl<R: MarketRepository> MintUseCase<R> {
    pub fn new(repo: Arc<R>, config: Arc<MarketConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, user_id: UserId) -> MarketResult<MintOutput> {
        let today = chrono::Utc::now().date_naive();
        let used = self
            .repo
            .consume_mint_quota(&user_id, today, self.config.daily_mint_quota)
            .await?;

        // The thread-local rng must not live across an await point
        let token = {
            let mut rng = rand::rng();
            let (digits, score) = generate_digits(&mut rng, &self.config.generator)?;
            let styling = pick_styling(&mut rng, &self.config.generator);
            Token::mint(digits, score, styling)
        };

        self.repo.grant_token(&user_id, &token).await?;

        let rarity = Rarity::from_score(token.score, &self.config.rarity);

        tracing::info!(
            user_id = %user_id,
            digits = %token.digits,
            score = token.score,
            rarity = rarity.label(),
            "Token minted"
        );

        Ok(MintOutput {
            token,
            rarity,
            remaining_today: self.config.daily_mint_quota.saturating_sub(used),
        })
    }
}
