//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{Listing, Token, User, UserSummary};
use crate::domain::value_objects::{Rarity, RarityThresholds};

/// Request for POST /api/market/users
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsureUserRequest {
    pub user_id: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// User profile in responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub balance: i64,
    pub logged_in: bool,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.user_id.to_string(),
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
            balance: user.balance,
            logged_in: user.logged_in,
        }
    }
}

/// Request for POST /api/market/login
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_id: String,
}

/// Response for POST /api/market/login
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub code_ttl_secs: i64,
}

/// Request for POST /api/market/verify
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub user_id: String,
    pub code: String,
}

/// A token as rendered to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token_id: Uuid,
    pub digits: String,
    pub score: u32,
    pub rarity: String,
    pub bg_color: String,
    pub text_color: String,
    pub minted_at: DateTime<Utc>,
}

impl TokenResponse {
    pub fn from_token(token: &Token, thresholds: &RarityThresholds) -> Self {
        Self {
            token_id: token.token_id,
            digits: token.digits.clone(),
            score: token.score,
            rarity: Rarity::from_score(token.score, thresholds).label().to_string(),
            bg_color: token.styling.bg_color.clone(),
            text_color: token.styling.text_color.clone(),
            minted_at: token.minted_at,
        }
    }
}

/// Response for POST /api/market/mint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintResponse {
    pub token: TokenResponse,
    pub remaining_today: u32,
}

/// Response for GET /api/market/collection
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionResponse {
    pub tokens: Vec<TokenResponse>,
}

/// Response for GET /api/market/balance
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub balance: i64,
}

/// Request for POST /api/market/sell
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellRequest {
    pub token_index: usize,
    pub price: i64,
}

/// A listing as rendered to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub listing_id: Uuid,
    pub seller_id: String,
    pub token: TokenResponse,
    pub price: i64,
    pub listed_at: DateTime<Utc>,
}

impl ListingResponse {
    pub fn from_listing(listing: &Listing, thresholds: &RarityThresholds) -> Self {
        Self {
            listing_id: listing.listing_id,
            seller_id: listing.seller_id.to_string(),
            token: TokenResponse::from_token(&listing.token, thresholds),
            price: listing.price,
            listed_at: listing.listed_at,
        }
    }
}

/// Response for GET /api/market/market
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketResponse {
    pub listings: Vec<ListingResponse>,
}

/// Request for POST /api/market/buy
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyRequest {
    pub listing_id: Uuid,
}

/// Response for POST /api/market/buy
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub token: TokenResponse,
    pub balance: i64,
}

/// Request for POST /api/market/cancel
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub listing_id: Uuid,
}

/// Request for POST /api/market/exchange
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRequest {
    pub token_index: usize,
    pub counterparty_id: String,
    pub counterparty_index: usize,
}

/// Response for POST /api/market/exchange
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResponse {
    pub gave: TokenResponse,
    pub received: TokenResponse,
}

/// One row of GET /api/market/participants
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResponse {
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub balance: i64,
    pub token_count: u64,
}

impl ParticipantResponse {
    pub fn from_summary(summary: &UserSummary) -> Self {
        Self {
            user_id: summary.user_id.to_string(),
            display_name: summary.display_name.clone(),
            avatar_url: summary.avatar_url.clone(),
            balance: summary.balance,
            token_count: summary.token_count,
        }
    }
}
