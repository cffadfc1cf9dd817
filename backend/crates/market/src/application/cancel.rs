//! Cancel Listing Use Case
//!
//! Withdraws an open listing and returns its token to the seller's
//! collection. Only the listing's own seller may cancel it.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::entities::Token;
use crate::domain::repository::MarketRepository;
use crate::domain::value_objects::UserId;
use crate::error::MarketResult;

/// Cancel Listing Use Case
pub struct CancelUseCase<R: MarketRepository> {
    repo: Arc<R>,
}

impl<R: MarketRepository> CancelUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, seller_id: UserId, listing_id: Uuid) -> MarketResult<Token> {
        let token = self.repo.cancel_listing(listing_id, &seller_id).await?;

        tracing::info!(
            listing_id = %listing_id,
            seller_id = %seller_id,
            digits = %token.digits,
            "Listing cancelled"
        );

        Ok(token)
    }
}
