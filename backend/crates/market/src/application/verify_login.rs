//! Verify Login Use Case
//!
//! Checks a submitted code against the pending one and opens a session.
//! A successful verification consumes the code; expiry takes precedence
//! over mismatch when both apply.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::entities::User;
use crate::domain::repository::MarketRepository;
use crate::domain::services::check_login_code;
use crate::domain::value_objects::UserId;
use crate::error::{MarketError, MarketResult};

/// Verify Login Use Case
pub struct VerifyLoginUseCase<R: MarketRepository> {
    repo: Arc<R>,
}

impl<R: MarketRepository> VerifyLoginUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: UserId, submitted: &str) -> MarketResult<User> {
        let mut user = self
            .repo
            .find_user(&user_id)
            .await?
            .ok_or(MarketError::UserNotFound)?;

        check_login_code(
            user.login_code.as_deref(),
            user.code_expiry,
            submitted,
            Utc::now(),
        )?;

        user.record_login();
        self.repo.update_user(&user).await?;

        tracing::info!(user_id = %user.user_id, "User logged in");

        Ok(user)
    }
}
