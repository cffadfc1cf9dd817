//! Logout Use Case
//!
//! Ends the session unconditionally; logging out while not logged in is
//! a no-op success.

use std::sync::Arc;

use crate::domain::repository::MarketRepository;
use crate::domain::value_objects::UserId;
use crate::error::MarketResult;

/// Logout Use Case
pub struct LogoutUseCase<R: MarketRepository> {
    repo: Arc<R>,
}

impl<R: MarketRepository> LogoutUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: UserId) -> MarketResult<()> {
        // Logging out an unknown user is a no-op, not an error
        let Some(mut user) = self.repo.find_user(&user_id).await? else {
            return Ok(());
        };

        user.clear_session();
        self.repo.update_user(&user).await?;

        tracing::info!(user_id = %user.user_id, "User logged out");

        Ok(())
    }
}
