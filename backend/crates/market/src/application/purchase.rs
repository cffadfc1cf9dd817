//! Purchase Use Case
//!
//! Settles a listing for the identified buyer. All balance and ownership
//! checks run inside the repository's transaction boundary; the seller
//! is notified only after the settlement has committed.

use std::sync::Arc;

use uuid::Uuid;

use crate::application::notify::{Notification, Notifier, OutboundMessage, notify_best_effort};
use crate::domain::repository::{MarketRepository, Settlement};
use crate::domain::value_objects::UserId;
use crate::error::MarketResult;

/// Purchase Use Case
pub struct PurchaseUseCase<R: MarketRepository, N: Notifier> {
    repo: Arc<R>,
    notifier: Arc<N>,
}

impl<R: MarketRepository, N: Notifier> PurchaseUseCase<R, N> {
    pub fn new(repo: Arc<R>, notifier: Arc<N>) -> Self {
        Self { repo, notifier }
    }

    pub async fn execute(&self, buyer_id: UserId, listing_id: Uuid) -> MarketResult<Settlement> {
        let settlement = self.repo.settle_purchase(listing_id, &buyer_id).await?;

        tracing::info!(
            listing_id = %listing_id,
            buyer_id = %buyer_id,
            seller_id = %settlement.listing.seller_id,
            digits = %settlement.listing.token.digits,
            price = settlement.listing.price,
            "Purchase settled"
        );

        notify_best_effort(
            self.notifier.as_ref(),
            Notification {
                recipient: settlement.listing.seller_id.clone(),
                message: OutboundMessage::TokenSold {
                    digits: settlement.listing.token.digits.clone(),
                    price: settlement.listing.price,
                },
            },
        )
        .await;

        Ok(settlement)
    }
}
