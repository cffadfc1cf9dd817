//! Begin Login Use Case
//!
//! Issues a one-time numeric login code and pushes it to the user over
//! the chat transport. Re-requesting replaces any previous pending code.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::MarketConfig;
use crate::application::notify::{Notification, Notifier, OutboundMessage, notify_best_effort};
use crate::domain::repository::MarketRepository;
use crate::domain::value_objects::UserId;
use crate::error::{MarketError, MarketResult};

/// Output DTO for begin login
#[derive(Debug, Clone)]
pub struct BeginLoginOutput {
    pub ttl_secs: i64,
}

/// Begin Login Use Case
pub struct BeginLoginUseCase<R: MarketRepository, N: Notifier> {
    repo: Arc<R>,
    notifier: Arc<N>,
    config: Arc<MarketConfig>,
}

impl<R: MarketRepository, N: Notifier> BeginLoginUseCase<R, N> {
    pub fn new(repo: Arc<R>, notifier: Arc<N>, config: Arc<MarketConfig>) -> Self {
        Self {
            repo,
            notifier,
            config,
        }
    }

    pub async fn execute(&self, user_id: UserId) -> MarketResult<BeginLoginOutput> {
        let mut user = self
            .repo
            .find_user(&user_id)
            .await?
            .ok_or(MarketError::UserNotFound)?;

        if user.logged_in {
            return Err(MarketError::AlreadyLoggedIn);
        }

        let (low, high) = self.config.login_code_range;
        let code = platform::codes::numeric_code(low, high);
        let expires_at = Utc::now() + self.config.login_code_ttl;
        user.set_login_code(code.clone(), expires_at);
        self.repo.update_user(&user).await?;

        // The notifier logs the issuance along with the code
        notify_best_effort(
            self.notifier.as_ref(),
            Notification {
                recipient: user.user_id,
                message: OutboundMessage::LoginCode {
                    code,
                    ttl_secs: self.config.login_code_ttl_secs(),
                },
            },
        )
        .await;

        Ok(BeginLoginOutput {
            ttl_secs: self.config.login_code_ttl_secs(),
        })
    }
}
