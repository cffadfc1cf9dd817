//! Repository Trait
//!
//! Interface for data persistence. Implementations are in the
//! infrastructure layer. Compound operations (`consume_mint_quota`,
//! `publish_listing`, `settle_purchase`, `cancel_listing`,
//! `swap_tokens`) are atomic: they either apply every listed effect or
//! none, regardless of backend.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::entities::{Listing, Token, User, UserSummary};
use crate::domain::value_objects::UserId;
use crate::error::MarketResult;

/// Outcome of a settled purchase
///
/// `granted` is the buyer-side copy of the listing's token; the listing
/// itself is gone by the time this is returned.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub listing: Listing,
    pub granted: Token,
    pub buyer_balance_after: i64,
}

/// A validated exchange: both tokens resolved to concrete IDs
///
/// Produced by the exchange use case after index resolution; consumed by
/// `swap_tokens`, which re-verifies ownership under its own lock.
#[derive(Debug, Clone)]
pub struct TokenSwap {
    pub left: UserId,
    pub left_token: Uuid,
    pub right: UserId,
    pub right_token: Uuid,
}

/// Market repository trait
#[trait_variant::make(MarketRepository: Send)]
pub trait LocalMarketRepository {
    /// Insert a user if absent. Returns the stored record either way.
    async fn create_user(&self, user: &User) -> MarketResult<User>;

    /// Get a user by ID
    async fn find_user(&self, user_id: &UserId) -> MarketResult<Option<User>>;

    /// Overwrite a user record. Errors if the user does not exist.
    async fn update_user(&self, user: &User) -> MarketResult<()>;

    /// Overview of every account, ordered by user ID
    async fn list_users(&self) -> MarketResult<Vec<UserSummary>>;

    /// Atomically apply the daily quota rule and bump the counter.
    /// Returns the mint count after this consumption.
    async fn consume_mint_quota(
        &self,
        user_id: &UserId,
        today: NaiveDate,
        quota: u32,
    ) -> MarketResult<u32>;

    /// Add a token to a user's collection
    async fn grant_token(&self, user_id: &UserId, token: &Token) -> MarketResult<()>;

    /// A user's collection, ordered by acquisition time then token ID.
    /// Errors with `UserNotFound` for an unknown user; an existing user
    /// with no tokens yields an empty vec.
    async fn tokens_for_user(&self, user_id: &UserId) -> MarketResult<Vec<Token>>;

    /// Atomically remove the token from the seller's collection and
    /// create the listing holding it
    async fn publish_listing(&self, listing: &Listing) -> MarketResult<()>;

    /// Get a listing by ID
    async fn find_listing(&self, listing_id: Uuid) -> MarketResult<Option<Listing>>;

    /// All open listings, oldest first
    async fn list_listings(&self) -> MarketResult<Vec<Listing>>;

    /// Atomically delete a listing and return its token to the seller.
    /// Errors unless `seller_id` matches the listing's seller.
    async fn cancel_listing(&self, listing_id: Uuid, seller_id: &UserId) -> MarketResult<Token>;

    /// Atomically settle a purchase: debit the buyer, credit the seller,
    /// delete the listing, and grant the buyer a copy of the token.
    /// Re-runs the purchase checks under the transaction lock.
    async fn settle_purchase(&self, listing_id: Uuid, buyer_id: &UserId) -> MarketResult<Settlement>;

    /// Atomically move each token to the other party's collection,
    /// re-verifying both ownerships under the transaction lock
    async fn swap_tokens(&self, swap: &TokenSwap) -> MarketResult<()>;
}
