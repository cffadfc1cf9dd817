//! Exchange Use Case
//!
//! Swaps one token from each of two collections. Indexes are resolved to
//! concrete token IDs first; the repository re-verifies both ownerships
//! under its transaction lock, so a concurrent sale makes the swap fail
//! rather than move a token that already left the collection.

use std::sync::Arc;

use crate::application::notify::{Notification, Notifier, OutboundMessage, notify_best_effort};
use crate::domain::entities::Token;
use crate::domain::repository::{MarketRepository, TokenSwap};
use crate::domain::value_objects::UserId;
use crate::error::{MarketError, MarketResult};

/// Output DTO for exchange
#[derive(Debug, Clone)]
pub struct ExchangeOutput {
    /// Token that left the initiator's collection
    pub gave: Token,
    /// Token that entered it
    pub received: Token,
}

/// Exchange Use Case
pub struct ExchangeUseCase<R: MarketRepository, N: Notifier> {
    repo: Arc<R>,
    notifier: Arc<N>,
}

impl<R: MarketRepository, N: Notifier> ExchangeUseCase<R, N> {
    pub fn new(repo: Arc<R>, notifier: Arc<N>) -> Self {
        Self { repo, notifier }
    }

    pub async fn execute(
        &self,
        initiator: UserId,
        initiator_index: usize,
        counterparty: UserId,
        counterparty_index: usize,
    ) -> MarketResult<ExchangeOutput> {
        if initiator == counterparty {
            return Err(MarketError::SelfExchange);
        }

        self.repo
            .find_user(&counterparty)
            .await?
            .ok_or(MarketError::UserNotFound)?;

        let gave = self
            .repo
            .tokens_for_user(&initiator)
            .await?
            .into_iter()
            .nth(initiator_index)
            .ok_or(MarketError::InvalidIndex)?;
        let received = self
            .repo
            .tokens_for_user(&counterparty)
            .await?
            .into_iter()
            .nth(counterparty_index)
            .ok_or(MarketError::InvalidIndex)?;

        let swap = TokenSwap {
            left: initiator.clone(),
            left_token: gave.token_id,
            right: counterparty.clone(),
            right_token: received.token_id,
        };
        self.repo.swap_tokens(&swap).await?;

        tracing::info!(
            initiator = %initiator,
            counterparty = %counterparty,
            gave = %gave.digits,
            received = %received.digits,
            "Tokens exchanged"
        );

        notify_best_effort(
            self.notifier.as_ref(),
            Notification {
                recipient: counterparty,
                message: OutboundMessage::TokensExchanged {
                    gave: received.digits.clone(),
                    received: gave.digits.clone(),
                },
            },
        )
        .await;

        Ok(ExchangeOutput { gave, received })
    }
}
