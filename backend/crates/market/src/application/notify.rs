//! Outbound Notifications
//!
//! Port for pushing event messages to users over an external chat
//! transport. Delivery is best effort and happens after the owning
//! transaction commits: a failed notification never rolls back state.

use crate::domain::value_objects::UserId;
use crate::error::MarketResult;

/// A message addressed to one user
#[derive(Debug, Clone)]
pub struct Notification {
    pub recipient: UserId,
    pub message: OutboundMessage,
}

/// Event messages the market pushes out
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    /// One-time login code for the web surface
    LoginCode { code: String, ttl_secs: i64 },
    /// A listing of yours was bought
    TokenSold { digits: String, price: i64 },
    /// An exchange you were part of completed
    TokensExchanged { gave: String, received: String },
}

/// Notifier trait
#[trait_variant::make(Notifier: Send)]
pub trait LocalNotifier {
    /// Deliver a single notification
    async fn send(&self, notification: Notification) -> MarketResult<()>;
}

/// Notifier that writes to the log instead of a chat transport
///
/// Stands in wherever no bot connection is configured; also what the
/// tests run against.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) -> MarketResult<()> {
        match &notification.message {
            OutboundMessage::LoginCode { code, ttl_secs } => {
                tracing::info!(
                    recipient = %notification.recipient,
                    code = %code,
                    ttl_secs,
                    "Login code issued"
                );
            }
            OutboundMessage::TokenSold { digits, price } => {
                tracing::info!(
                    recipient = %notification.recipient,
                    digits = %digits,
                    price,
                    "Token sold"
                );
            }
            OutboundMessage::TokensExchanged { gave, received } => {
                tracing::info!(
                    recipient = %notification.recipient,
                    gave = %gave,
                    received = %received,
                    "Tokens exchanged"
                );
            }
        }
        Ok(())
    }
}

/// Send without letting a transport failure surface to the caller
pub async fn notify_best_effort<N: Notifier>(notifier: &N, notification: Notification) {
    let recipient = notification.recipient.clone();
    if let Err(e) = notifier.send(notification).await {
        tracing::warn!(recipient = %recipient, error = %e, "Notification delivery failed");
    }
}
