//! Ensure User Use Case
//!
//! Get-or-create on first contact. Re-running with a changed display
//! name or avatar refreshes the profile fields without touching balance
//! or session state.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::MarketConfig;
use crate::domain::entities::User;
use crate::domain::repository::MarketRepository;
use crate::domain::value_objects::UserId;
use crate::error::MarketResult;

/// Ensure User Use Case
pub struct EnsureUserUseCase<R: MarketRepository> {
    repo: Arc<R>,
    config: Arc<MarketConfig>,
}

impl<R: MarketRepository> EnsureUserUseCase<R> {
    pub fn new(repo: Arc<R>, config: Arc<MarketConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(
        &self,
        user_id: UserId,
        display_name: String,
        avatar_url: Option<String>,
    ) -> MarketResult<User> {
        if let Some(mut existing) = self.repo.find_user(&user_id).await? {
            if existing.display_name != display_name || existing.avatar_url != avatar_url {
                existing.display_name = display_name;
                existing.avatar_url = avatar_url;
                self.repo.update_user(&existing).await?;
            }
            return Ok(existing);
        }

        let user = User::new(
            user_id,
            display_name,
            avatar_url,
            self.config.initial_balance,
            Utc::now().date_naive(),
        );
        let stored = self.repo.create_user(&user).await?;

        tracing::info!(user_id = %stored.user_id, "User created");

        Ok(stored)
    }
}
