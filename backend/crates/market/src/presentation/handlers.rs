//! HTTP Handlers
//!
//! Identity comes from a plain cookie holding the user ID; mutating
//! handlers require it, the public market views do not.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use platform::cookie::{CookieConfig, extract_cookie};

use crate::application::begin_login::BeginLoginUseCase;
use crate::application::cancel::CancelUseCase;
use crate::application::config::MarketConfig;
use crate::application::ensure_user::EnsureUserUseCase;
use crate::application::exchange::ExchangeUseCase;
use crate::application::logout::LogoutUseCase;
use crate::application::mint::MintUseCase;
use crate::application::notify::Notifier;
use crate::application::purchase::PurchaseUseCase;
use crate::application::sell::SellUseCase;
use crate::application::verify_login::VerifyLoginUseCase;
use crate::domain::repository::MarketRepository;
use crate::domain::value_objects::UserId;
use crate::error::{MarketError, MarketResult};
use crate::presentation::dto::{
    BalanceResponse, BuyRequest, CancelRequest, CollectionResponse, EnsureUserRequest,
    ExchangeRequest, ExchangeResponse, ListingResponse, LoginRequest, LoginResponse,
    MarketResponse, MintResponse, ParticipantResponse, PurchaseResponse, SellRequest,
    TokenResponse, UserResponse, VerifyRequest,
};

/// Shared state for market handlers
#[derive(Clone)]
pub struct MarketAppState<R, N>
where
    R: MarketRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub notifier: Arc<N>,
    pub config: Arc<MarketConfig>,
}

impl<R, N> MarketAppState<R, N>
where
    R: MarketRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    fn identity_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.config.identity_cookie_name.clone(),
            secure: self.config.cookie_secure,
            http_only: true,
            same_site: self.config.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: None,
        }
    }

    fn require_identity(&self, headers: &HeaderMap) -> MarketResult<UserId> {
        extract_cookie(headers, &self.config.identity_cookie_name)
            .map(UserId::new)
            .ok_or(MarketError::Unidentified)
    }
}

/// POST /api/market/users
pub async fn ensure_user<R, N>(
    State(state): State<MarketAppState<R, N>>,
    Json(req): Json<EnsureUserRequest>,
) -> MarketResult<impl IntoResponse>
where
    R: MarketRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let use_case = EnsureUserUseCase::new(state.repo.clone(), state.config.clone());
    let user = use_case
        .execute(UserId::new(req.user_id), req.display_name, req.avatar_url)
        .await?;

    let cookie = state.identity_cookie().build_set_cookie(user.user_id.as_str());

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(UserResponse::from_user(&user)),
    ))
}

/// POST /api/market/login
pub async fn begin_login<R, N>(
    State(state): State<MarketAppState<R, N>>,
    Json(req): Json<LoginRequest>,
) -> MarketResult<Json<LoginResponse>>
where
    R: MarketRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let use_case = BeginLoginUseCase::new(
        state.repo.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );
    let output = use_case.execute(UserId::new(req.user_id)).await?;

    Ok(Json(LoginResponse {
        code_ttl_secs: output.ttl_secs,
    }))
}

/// POST /api/market/verify
pub async fn verify_login<R, N>(
    State(state): State<MarketAppState<R, N>>,
    Json(req): Json<VerifyRequest>,
) -> MarketResult<impl IntoResponse>
where
    R: MarketRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let use_case = VerifyLoginUseCase::new(state.repo.clone());
    let user = use_case.execute(UserId::new(req.user_id), &req.code).await?;

    let cookie = state.identity_cookie().build_set_cookie(user.user_id.as_str());

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(UserResponse::from_user(&user)),
    ))
}

/// POST /api/market/logout
pub async fn logout<R, N>(
    State(state): State<MarketAppState<R, N>>,
    headers: HeaderMap,
) -> MarketResult<impl IntoResponse>
where
    R: MarketRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let user_id = state.require_identity(&headers)?;

    let use_case = LogoutUseCase::new(state.repo.clone());
    use_case.execute(user_id).await?;

    let cookie = state.identity_cookie().build_delete_cookie();

    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]))
}

/// POST /api/market/mint
pub async fn mint<R, N>(
    State(state): State<MarketAppState<R, N>>,
    headers: HeaderMap,
) -> MarketResult<Json<MintResponse>>
where
    R: MarketRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let user_id = state.require_identity(&headers)?;

    let use_case = MintUseCase::new(state.repo.clone(), state.config.clone());
    let output = use_case.execute(user_id).await?;

    Ok(Json(MintResponse {
        token: TokenResponse::from_token(&output.token, &state.config.rarity),
        remaining_today: output.remaining_today,
    }))
}

/// GET /api/market/collection
pub async fn collection<R, N>(
    State(state): State<MarketAppState<R, N>>,
    headers: HeaderMap,
) -> MarketResult<Json<CollectionResponse>>
where
    R: MarketRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let user_id = state.require_identity(&headers)?;

    let tokens = state.repo.tokens_for_user(&user_id).await?;

    Ok(Json(CollectionResponse {
        tokens: tokens
            .iter()
            .map(|t| TokenResponse::from_token(t, &state.config.rarity))
            .collect(),
    }))
}

/// GET /api/market/balance
pub async fn balance<R, N>(
    State(state): State<MarketAppState<R, N>>,
    headers: HeaderMap,
) -> MarketResult<Json<BalanceResponse>>
where
    R: MarketRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let user_id = state.require_identity(&headers)?;

    let user = state
        .repo
        .find_user(&user_id)
        .await?
        .ok_or(MarketError::UserNotFound)?;

    Ok(Json(BalanceResponse {
        balance: user.balance,
    }))
}

/// POST /api/market/sell
pub async fn sell<R, N>(
    State(state): State<MarketAppState<R, N>>,
    headers: HeaderMap,
    Json(req): Json<SellRequest>,
) -> MarketResult<Json<ListingResponse>>
where
    R: MarketRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let user_id = state.require_identity(&headers)?;

    let use_case = SellUseCase::new(state.repo.clone());
    let listing = use_case.execute(user_id, req.token_index, req.price).await?;

    Ok(Json(ListingResponse::from_listing(
        &listing,
        &state.config.rarity,
    )))
}

/// GET /api/market/market
pub async fn market<R, N>(
    State(state): State<MarketAppState<R, N>>,
) -> MarketResult<Json<MarketResponse>>
where
    R: MarketRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let listings = state.repo.list_listings().await?;

    Ok(Json(MarketResponse {
        listings: listings
            .iter()
            .map(|l| ListingResponse::from_listing(l, &state.config.rarity))
            .collect(),
    }))
}

/// POST /api/market/buy
pub async fn buy<R, N>(
    State(state): State<MarketAppState<R, N>>,
    headers: HeaderMap,
    Json(req): Json<BuyRequest>,
) -> MarketResult<Json<PurchaseResponse>>
where
    R: MarketRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let user_id = state.require_identity(&headers)?;

    let use_case = PurchaseUseCase::new(state.repo.clone(), state.notifier.clone());
    let settlement = use_case.execute(user_id, req.listing_id).await?;

    Ok(Json(PurchaseResponse {
        token: TokenResponse::from_token(&settlement.granted, &state.config.rarity),
        balance: settlement.buyer_balance_after,
    }))
}

/// POST /api/market/cancel
pub async fn cancel<R, N>(
    State(state): State<MarketAppState<R, N>>,
    headers: HeaderMap,
    Json(req): Json<CancelRequest>,
) -> MarketResult<Json<TokenResponse>>
where
    R: MarketRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let user_id = state.require_identity(&headers)?;

    let use_case = CancelUseCase::new(state.repo.clone());
    let token = use_case.execute(user_id, req.listing_id).await?;

    Ok(Json(TokenResponse::from_token(&token, &state.config.rarity)))
}

/// POST /api/market/exchange
pub async fn exchange<R, N>(
    State(state): State<MarketAppState<R, N>>,
    headers: HeaderMap,
    Json(req): Json<ExchangeRequest>,
) -> MarketResult<Json<ExchangeResponse>>
where
    R: MarketRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let user_id = state.require_identity(&headers)?;

    let use_case = ExchangeUseCase::new(state.repo.clone(), state.notifier.clone());
    let output = use_case
        .execute(
            user_id,
            req.token_index,
            UserId::new(req.counterparty_id),
            req.counterparty_index,
        )
        .await?;

    Ok(Json(ExchangeResponse {
        gave: TokenResponse::from_token(&output.gave, &state.config.rarity),
        received: TokenResponse::from_token(&output.received, &state.config.rarity),
    }))
}

/// GET /api/market/participants
pub async fn participants<R, N>(
    State(state): State<MarketAppState<R, N>>,
) -> MarketResult<Json<Vec<ParticipantResponse>>>
where
    R: MarketRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let summaries = state.repo.list_users().await?;

    Ok(Json(
        summaries
            .iter()
            .map(ParticipantResponse::from_summary)
            .collect(),
    ))
}
