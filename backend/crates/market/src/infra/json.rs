//! File-Backed JSON Repository Implementation
//!
//! Single-process store for development and tests. One mutex guards the
//! whole document, which gives every compound operation the same
//! all-or-nothing behavior as a database transaction: mutations are
//! applied to a cloned draft, the draft is persisted (write to a temp
//! file, then rename), and only then swapped into memory. A failed
//! persist leaves both disk and memory untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entities::{Listing, Token, User, UserSummary};
use crate::domain::repository::{MarketRepository, Settlement, TokenSwap};
use crate::domain::services::{check_purchase, roll_quota};
use crate::domain::value_objects::{Styling, UserId};
use crate::error::{MarketError, MarketResult};

/// JSON-document-backed repository
#[derive(Debug, Clone)]
pub struct JsonMarketRepository {
    path: PathBuf,
    inner: Arc<Mutex<StoreData>>,
}

impl JsonMarketRepository {
    /// Open the store at `path`, loading existing data if present
    ///
    /// A file that exists but does not parse is an error, not an empty
    /// store: silently resetting would discard user balances.
    pub fn open(path: impl AsRef<Path>) -> MarketResult<Self> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            StoreData::default()
        };
        Ok(Self {
            path,
            inner: Arc::new(Mutex::new(data)),
        })
    }

    /// Persist a draft to disk via temp file and rename
    fn persist(&self, draft: &StoreData) -> MarketResult<()> {
        let raw = serde_json::to_string_pretty(draft)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl MarketRepository for JsonMarketRepository {
    async fn create_user(&self, user: &User) -> MarketResult<User> {
        let mut guard = self.inner.lock().await;
        if let Some(record) = guard.users.get(user.user_id.as_str()) {
            return Ok(record.to_user(&user.user_id));
        }

        let mut draft = guard.clone();
        draft
            .users
            .insert(user.user_id.to_string(), UserRecord::from_user(user));
        self.persist(&draft)?;
        *guard = draft;
        Ok(user.clone())
    }

    async fn find_user(&self, user_id: &UserId) -> MarketResult<Option<User>> {
        let guard = self.inner.lock().await;
        Ok(guard
            .users
            .get(user_id.as_str())
            .map(|record| record.to_user(user_id)))
    }

    async fn update_user(&self, user: &User) -> MarketResult<()> {
        let mut guard = self.inner.lock().await;
        let mut draft = guard.clone();
        let record = draft
            .users
            .get_mut(user.user_id.as_str())
            .ok_or(MarketError::UserNotFound)?;
        record.apply_user(user);
        self.persist(&draft)?;
        *guard = draft;
        Ok(())
    }

    async fn list_users(&self) -> MarketResult<Vec<UserSummary>> {
        let guard = self.inner.lock().await;
        Ok(guard
            .users
            .iter()
            .map(|(id, record)| UserSummary {
                user_id: UserId::new(id.clone()),
                display_name: record.display_name.clone(),
                avatar_url: record.avatar_url.clone(),
                balance: record.balance,
                token_count: record.tokens.len() as u64,
            })
            .collect())
    }

    async fn consume_mint_quota(
        &self,
        user_id: &UserId,
        today: NaiveDate,
        quota: u32,
    ) -> MarketResult<u32> {
        let mut guard = self.inner.lock().await;
        let mut draft = guard.clone();
        let record = draft
            .users
            .get_mut(user_id.as_str())
            .ok_or(MarketError::UserNotFound)?;

        let new_count = roll_quota(record.last_activation_date, record.activation_count, today, quota)?;
        record.last_activation_date = today;
        record.activation_count = new_count;

        self.persist(&draft)?;
        *guard = draft;
        Ok(new_count)
    }

    async fn grant_token(&self, user_id: &UserId, token: &Token) -> MarketResult<()> {
        let mut guard = self.inner.lock().await;
        let mut draft = guard.clone();
        let record = draft
            .users
            .get_mut(user_id.as_str())
            .ok_or(MarketError::UserNotFound)?;
        record.tokens.push(TokenRecord::from_token(token));

        self.persist(&draft)?;
        *guard = draft;
        Ok(())
    }

    async fn tokens_for_user(&self, user_id: &UserId) -> MarketResult<Vec<Token>> {
        let guard = self.inner.lock().await;
        let record = guard
            .users
            .get(user_id.as_str())
            .ok_or(MarketError::UserNotFound)?;
        // Stored in acquisition order already
        Ok(record.tokens.iter().map(TokenRecord::to_token).collect())
    }

    async fn publish_listing(&self, listing: &Listing) -> MarketResult<()> {
        let mut guard = self.inner.lock().await;
        let mut draft = guard.clone();
        let record = draft
            .users
            .get_mut(listing.seller_id.as_str())
            .ok_or(MarketError::UserNotFound)?;

        let pos = record
            .tokens
            .iter()
            .position(|t| t.token_id == listing.token.token_id)
            .ok_or(MarketError::TokenNotFound)?;
        record.tokens.remove(pos);
        draft.market.push(ListingRecord::from_listing(listing));

        self.persist(&draft)?;
        *guard = draft;
        Ok(())
    }

    async fn find_listing(&self, listing_id: Uuid) -> MarketResult<Option<Listing>> {
        let guard = self.inner.lock().await;
        Ok(guard
            .market
            .iter()
            .find(|l| l.listing_id == listing_id)
            .map(ListingRecord::to_listing))
    }

    async fn list_listings(&self) -> MarketResult<Vec<Listing>> {
        let guard = self.inner.lock().await;
        Ok(guard.market.iter().map(ListingRecord::to_listing).collect())
    }

    async fn cancel_listing(&self, listing_id: Uuid, seller_id: &UserId) -> MarketResult<Token> {
        let mut guard = self.inner.lock().await;
        let mut draft = guard.clone();

        let pos = draft
            .market
            .iter()
            .position(|l| l.listing_id == listing_id)
            .ok_or(MarketError::ListingNotFound)?;
        if draft.market[pos].seller_id != *seller_id.as_str() {
            return Err(MarketError::ListingNotFound);
        }
        let removed = draft.market.remove(pos);

        let mut token = removed.token;
        token.acquired_at = Utc::now();
        let returned = token.to_token();

        let record = draft
            .users
            .get_mut(seller_id.as_str())
            .ok_or(MarketError::UserNotFound)?;
        record.tokens.push(token);

        self.persist(&draft)?;
        *guard = draft;
        Ok(returned)
    }

    async fn settle_purchase(
        &self,
        listing_id: Uuid,
        buyer_id: &UserId,
    ) -> MarketResult<Settlement> {
        let mut guard = self.inner.lock().await;
        let mut draft = guard.clone();

        let pos = draft
            .market
            .iter()
            .position(|l| l.listing_id == listing_id)
            .ok_or(MarketError::ListingNotFound)?;
        let listing = draft.market[pos].to_listing();

        let buyer_balance = draft
            .users
            .get(buyer_id.as_str())
            .ok_or(MarketError::UserNotFound)?
            .balance;
        if !draft.users.contains_key(listing.seller_id.as_str()) {
            return Err(MarketError::UserNotFound);
        }

        check_purchase(buyer_id, buyer_balance, &listing)?;

        draft.market.remove(pos);
        let granted = listing.token.rematerialized();

        // Both lookups verified above
        if let Some(buyer) = draft.users.get_mut(buyer_id.as_str()) {
            buyer.balance -= listing.price;
            buyer.tokens.push(TokenRecord::from_token(&granted));
        }
        if let Some(seller) = draft.users.get_mut(listing.seller_id.as_str()) {
            seller.balance += listing.price;
        }

        self.persist(&draft)?;
        *guard = draft;
        Ok(Settlement {
            buyer_balance_after: buyer_balance - listing.price,
            listing,
            granted,
        })
    }

    async fn swap_tokens(&self, swap: &TokenSwap) -> MarketResult<()> {
        let mut guard = self.inner.lock().await;
        let mut draft = guard.clone();

        let left_token = take_token(&mut draft, &swap.left, swap.left_token)?;
        let right_token = take_token(&mut draft, &swap.right, swap.right_token)?;

        let now = Utc::now();
        let mut to_right = left_token;
        to_right.acquired_at = now;
        let mut to_left = right_token;
        to_left.acquired_at = now;

        // Presence verified by take_token
        if let Some(record) = draft.users.get_mut(swap.right.as_str()) {
            record.tokens.push(to_right);
        }
        if let Some(record) = draft.users.get_mut(swap.left.as_str()) {
            record.tokens.push(to_left);
        }

        self.persist(&draft)?;
        *guard = draft;
        Ok(())
    }
}

/// Remove a token from a user's collection, erroring if either the user
/// or the token is missing
fn take_token(draft: &mut StoreData, owner: &UserId, token_id: Uuid) -> MarketResult<TokenRecord> {
    let record = draft
        .users
        .get_mut(owner.as_str())
        .ok_or(MarketError::UserNotFound)?;
    let pos = record
        .tokens
        .iter()
        .position(|t| t.token_id == token_id)
        .ok_or(MarketError::TokenNotFound)?;
    Ok(record.tokens.remove(pos))
}

// Document schema

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    users: BTreeMap<String, UserRecord>,
    market: Vec<ListingRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    display_name: String,
    avatar_url: Option<String>,
    balance: i64,
    last_activation_date: NaiveDate,
    activation_count: u32,
    logged_in: bool,
    login_code: Option<String>,
    code_expiry: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    tokens: Vec<TokenRecord>,
}

impl UserRecord {
    fn from_user(user: &User) -> Self {
        Self {
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
            balance: user.balance,
            last_activation_date: user.last_activation_date,
            activation_count: user.activation_count,
            logged_in: user.logged_in,
            login_code: user.login_code.clone(),
            code_expiry: user.code_expiry,
            created_at: user.created_at,
            tokens: Vec::new(),
        }
    }

    /// Overwrite the account fields, leaving the collection alone
    fn apply_user(&mut self, user: &User) {
        self.display_name = user.display_name.clone();
        self.avatar_url = user.avatar_url.clone();
        self.balance = user.balance;
        self.last_activation_date = user.last_activation_date;
        self.activation_count = user.activation_count;
        self.logged_in = user.logged_in;
        self.login_code = user.login_code.clone();
        self.code_expiry = user.code_expiry;
    }

    fn to_user(&self, user_id: &UserId) -> User {
        User {
            user_id: user_id.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
            balance: self.balance,
            last_activation_date: self.last_activation_date,
            activation_count: self.activation_count,
            logged_in: self.logged_in,
            login_code: self.login_code.clone(),
            code_expiry: self.code_expiry,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenRecord {
    token_id: Uuid,
    digits: String,
    score: u32,
    bg_color: String,
    text_color: String,
    minted_at: DateTime<Utc>,
    acquired_at: DateTime<Utc>,
}

impl TokenRecord {
    fn from_token(token: &Token) -> Self {
        Self {
            token_id: token.token_id,
            digits: token.digits.clone(),
            score: token.score,
            bg_color: token.styling.bg_color.clone(),
            text_color: token.styling.text_color.clone(),
            minted_at: token.minted_at,
            acquired_at: token.acquired_at,
        }
    }

    fn to_token(&self) -> Token {
        Token {
            token_id: self.token_id,
            digits: self.digits.clone(),
            score: self.score,
            styling: Styling {
                bg_color: self.bg_color.clone(),
                text_color: self.text_color.clone(),
            },
            minted_at: self.minted_at,
            acquired_at: self.acquired_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ListingRecord {
    listing_id: Uuid,
    seller_id: String,
    token: TokenRecord,
    price: i64,
    listed_at: DateTime<Utc>,
}

impl ListingRecord {
    fn from_listing(listing: &Listing) -> Self {
        Self {
            listing_id: listing.listing_id,
            seller_id: listing.seller_id.to_string(),
            token: TokenRecord::from_token(&listing.token),
            price: listing.price,
            listed_at: listing.listed_at,
        }
    }

    fn to_listing(&self) -> Listing {
        Listing {
            listing_id: self.listing_id,
            seller_id: UserId::new(self.seller_id.clone()),
            token: self.token.to_token(),
            price: self.price,
            listed_at: self.listed_at,
        }
    }
}
