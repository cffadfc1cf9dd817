//! Sell Token Use Case
//!
//! Publishes a collection token as a fixed-price listing. The token is
//! referenced by its position in the owner's ordered collection, which
//! is how the presentation surface addresses it.

use std::sync::Arc;

use crate::domain::entities::Listing;
use crate::domain::repository::MarketRepository;
use crate::domain::value_objects::UserId;
use crate::error::{MarketError, MarketResult};

/// Sell Token Use Case
pub struct SellUseCase<R: MarketRepository> {
    repo: Arc<R>,
}

impl<R: MarketRepository> SellUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        seller_id: UserId,
        token_index: usize,
        price: i64,
    ) -> MarketResult<Listing> {
        if price <= 0 {
            return Err(MarketError::InvalidAmount);
        }

        self.repo
            .find_user(&seller_id)
            .await?
            .ok_or(MarketError::UserNotFound)?;

        let tokens = self.repo.tokens_for_user(&seller_id).await?;
        let token = tokens
            .into_iter()
            .nth(token_index)
            .ok_or(MarketError::InvalidIndex)?;

        let listing = Listing::new(seller_id, token, price);
        self.repo.publish_listing(&listing).await?;

        tracing::info!(
            listing_id = %listing.listing_id,
            seller_id = %listing.seller_id,
            digits = %listing.token.digits,
            price = listing.price,
            "Listing published"
        );

        Ok(listing)
    }
}
