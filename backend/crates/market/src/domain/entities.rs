//! Domain Entities
//!
//! Core business entities for the collectible-number market.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::value_objects::{Styling, UserId};

/// User entity
///
/// Created on first contact (get-or-create), never deleted. The mint
/// quota fields are only meaningful relative to `last_activation_date`:
/// on a different calendar day the effective count is zero regardless of
/// the stored value.
#[derive(Debug, Clone)]
pub struct User {
    /// Externally assigned, opaque identifier
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    /// Non-negative currency balance
    pub balance: i64,
    /// Calendar date the quota counter refers to
    pub last_activation_date: NaiveDate,
    /// Mints performed on `last_activation_date`
    pub activation_count: u32,
    /// Session flag
    pub logged_in: bool,
    /// Pending one-time login code, if any
    pub login_code: Option<String>,
    /// Expiry of the pending code
    pub code_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with the initial balance grant
    pub fn new(
        user_id: UserId,
        display_name: String,
        avatar_url: Option<String>,
        initial_balance: i64,
        today: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            display_name,
            avatar_url,
            balance: initial_balance,
            last_activation_date: today,
            activation_count: 0,
            logged_in: false,
            login_code: None,
            code_expiry: None,
            created_at: Utc::now(),
        }
    }

    /// Store a pending login code, replacing any previous one
    pub fn set_login_code(&mut self, code: String, expires_at: DateTime<Utc>) {
        self.login_code = Some(code);
        self.code_expiry = Some(expires_at);
    }

    /// Mark the user logged in and consume the pending code
    pub fn record_login(&mut self) {
        self.logged_in = true;
        self.login_code = None;
        self.code_expiry = None;
    }

    /// End the session (unconditional)
    pub fn clear_session(&mut self) {
        self.logged_in = false;
    }

    /// Mint count that actually applies on `today`
    pub fn effective_activation_count(&self, today: NaiveDate) -> u32 {
        if self.last_activation_date == today {
            self.activation_count
        } else {
            0
        }
    }
}

/// Token entity - a minted collectible digit string
///
/// Owned by exactly one user, or held by a market listing while listed.
/// `minted_at` is the original creation time and survives resale;
/// `acquired_at` changes on every ownership change and drives collection
/// ordering (most recently acquired last).
#[derive(Debug, Clone)]
pub struct Token {
    pub token_id: Uuid,
    /// 3-6 decimal digits
    pub digits: String,
    /// Beauty score, fixed at creation time
    pub score: u32,
    pub styling: Styling,
    pub minted_at: DateTime<Utc>,
    pub acquired_at: DateTime<Utc>,
}

impl Token {
    /// Create a freshly minted token
    pub fn mint(digits: String, score: u32, styling: Styling) -> Self {
        let now = Utc::now();
        Self {
            token_id: Uuid::new_v4(),
            digits,
            score,
            styling,
            minted_at: now,
            acquired_at: now,
        }
    }

    /// Copy for a new owner: identical face value, score and styling,
    /// fresh identity and acquisition time. Used when a purchase
    /// materializes the listing snapshot into the buyer's collection.
    pub fn rematerialized(&self) -> Self {
        Self {
            token_id: Uuid::new_v4(),
            digits: self.digits.clone(),
            score: self.score,
            styling: self.styling.clone(),
            minted_at: self.minted_at,
            acquired_at: Utc::now(),
        }
    }
}

/// Market listing - a token offered at a fixed price
///
/// The token snapshot is embedded, not shared: listing a token removes
/// it from the seller's collection in the same atomic step.
#[derive(Debug, Clone)]
pub struct Listing {
    pub listing_id: Uuid,
    /// Weak reference to the seller, lookup only
    pub seller_id: UserId,
    pub token: Token,
    /// Positive price in market currency
    pub price: i64,
    pub listed_at: DateTime<Utc>,
}

impl Listing {
    pub fn new(seller_id: UserId, token: Token, price: i64) -> Self {
        Self {
            listing_id: Uuid::new_v4(),
            seller_id,
            token,
            price,
            listed_at: Utc::now(),
        }
    }
}

/// Per-user overview row for the participants listing
#[derive(Debug, Clone)]
pub struct UserSummary {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub balance: i64,
    pub token_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Styling;

    fn styling() -> Styling {
        Styling {
            bg_color: "#e74c3c".to_string(),
            text_color: "#1abc9c".to_string(),
        }
    }

    #[test]
    fn test_new_user_defaults() {
        let today = Utc::now().date_naive();
        let user = User::new(UserId::new("1"), "Alice".to_string(), None, 1000, today);
        assert_eq!(user.balance, 1000);
        assert_eq!(user.activation_count, 0);
        assert!(!user.logged_in);
        assert!(user.login_code.is_none());
        assert!(user.code_expiry.is_none());
    }

    #[test]
    fn test_effective_activation_count_rolls_on_new_day() {
        let today = Utc::now().date_naive();
        let mut user = User::new(UserId::new("1"), "Alice".to_string(), None, 1000, today);
        user.activation_count = 3;
        assert_eq!(user.effective_activation_count(today), 3);
        let tomorrow = today.succ_opt().expect("date overflow");
        assert_eq!(user.effective_activation_count(tomorrow), 0);
    }

    #[test]
    fn test_record_login_consumes_code() {
        let today = Utc::now().date_naive();
        let mut user = User::new(UserId::new("1"), "Alice".to_string(), None, 1000, today);
        user.set_login_code("123456".to_string(), Utc::now());
        user.record_login();
        assert!(user.logged_in);
        assert!(user.login_code.is_none());
        assert!(user.code_expiry.is_none());
    }

    #[test]
    fn test_rematerialized_token_keeps_face_value() {
        let token = Token::mint("10000".to_string(), 9, styling());
        let copy = token.rematerialized();
        assert_eq!(copy.digits, token.digits);
        assert_eq!(copy.score, token.score);
        assert_eq!(copy.styling, token.styling);
        assert_eq!(copy.minted_at, token.minted_at);
        assert_ne!(copy.token_id, token.token_id);
    }
}
