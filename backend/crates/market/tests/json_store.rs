//! End-to-end use-case tests over the JSON document store

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use market::application::begin_login::BeginLoginUseCase;
use market::application::cancel::CancelUseCase;
use market::application::ensure_user::EnsureUserUseCase;
use market::application::exchange::ExchangeUseCase;
use market::application::logout::LogoutUseCase;
use market::application::mint::MintUseCase;
use market::application::notify::LogNotifier;
use market::application::purchase::PurchaseUseCase;
use market::application::sell::SellUseCase;
use market::application::verify_login::VerifyLoginUseCase;
use market::domain::entities::{Token, User};
use market::domain::repository::MarketRepository;
use market::domain::value_objects::{Styling, UserId};
use market::{JsonMarketRepository, MarketConfig, MarketError};

fn store_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("market-test-{tag}-{}.json", uuid::Uuid::new_v4()))
}

fn open_store(tag: &str) -> (Arc<JsonMarketRepository>, PathBuf) {
    let path = store_path(tag);
    let repo = JsonMarketRepository::open(&path).expect("open store");
    (Arc::new(repo), path)
}

fn config() -> Arc<MarketConfig> {
    Arc::new(MarketConfig::development())
}

async fn make_user(repo: &Arc<JsonMarketRepository>, id: &str, name: &str) -> User {
    EnsureUserUseCase::new(repo.clone(), config())
        .execute(UserId::new(id), name.to_string(), None)
        .await
        .expect("ensure user")
}

async fn grant(repo: &Arc<JsonMarketRepository>, id: &str, digits: &str) -> Token {
    let token = Token::mint(
        digits.to_string(),
        1,
        Styling {
            bg_color: "#27ae60".to_string(),
            text_color: "#34495e".to_string(),
        },
    );
    repo.grant_token(&UserId::new(id), &token)
        .await
        .expect("grant token");
    token
}

#[tokio::test]
async fn ensure_user_is_idempotent() {
    let (repo, path) = open_store("ensure");

    let first = make_user(&repo, "100", "Alice").await;
    assert_eq!(first.balance, 1000);

    // Second call keeps the account, refreshes the profile
    let second = EnsureUserUseCase::new(repo.clone(), config())
        .execute(UserId::new("100"), "Alice Smith".to_string(), None)
        .await
        .unwrap();
    assert_eq!(second.balance, 1000);
    assert_eq!(second.display_name, "Alice Smith");

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn mint_respects_daily_quota() {
    let (repo, path) = open_store("quota");
    make_user(&repo, "100", "Alice").await;

    let use_case = MintUseCase::new(repo.clone(), config());
    for expected_remaining in [2, 1, 0] {
        let output = use_case.execute(UserId::new("100")).await.unwrap();
        assert_eq!(output.remaining_today, expected_remaining);
        assert!((3..=6).contains(&output.token.digits.len()));
    }

    let err = use_case.execute(UserId::new("100")).await.unwrap_err();
    assert!(matches!(err, MarketError::QuotaExceeded));

    let tokens = repo.tokens_for_user(&UserId::new("100")).await.unwrap();
    assert_eq!(tokens.len(), 3);

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn mint_runs_on_a_spawned_task() {
    let (repo, path) = open_store("spawned");
    make_user(&repo, "100", "Alice").await;

    // spawn requires the mint future to be Send, as axum's multithreaded
    // runtime does
    let use_case = MintUseCase::new(repo.clone(), config());
    let output = tokio::spawn(async move { use_case.execute(UserId::new("100")).await })
        .await
        .expect("task completed")
        .unwrap();
    assert!((3..=6).contains(&output.token.digits.len()));

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn collection_for_unknown_user_is_not_found() {
    let (repo, path) = open_store("unknown");

    let err = repo.tokens_for_user(&UserId::new("ghost")).await.unwrap_err();
    assert!(matches!(err, MarketError::UserNotFound));

    // An existing user with nothing minted is an empty collection
    make_user(&repo, "100", "Alice").await;
    let tokens = repo.tokens_for_user(&UserId::new("100")).await.unwrap();
    assert!(tokens.is_empty());

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn sell_and_buy_conserves_currency() {
    let (repo, path) = open_store("trade");
    make_user(&repo, "1", "Seller").await;
    make_user(&repo, "2", "Buyer").await;
    grant(&repo, "1", "54321").await;

    let listing = SellUseCase::new(repo.clone())
        .execute(UserId::new("1"), 0, 250)
        .await
        .unwrap();

    // Token left the seller's collection while listed
    assert!(repo.tokens_for_user(&UserId::new("1")).await.unwrap().is_empty());

    let settlement = PurchaseUseCase::new(repo.clone(), Arc::new(LogNotifier))
        .execute(UserId::new("2"), listing.listing_id)
        .await
        .unwrap();

    assert_eq!(settlement.buyer_balance_after, 750);
    assert_eq!(settlement.granted.digits, "54321");

    let seller = repo.find_user(&UserId::new("1")).await.unwrap().unwrap();
    let buyer = repo.find_user(&UserId::new("2")).await.unwrap().unwrap();
    assert_eq!(seller.balance, 1250);
    assert_eq!(buyer.balance, 750);
    // Total supply unchanged
    assert_eq!(seller.balance + buyer.balance, 2000);

    let buyer_tokens = repo.tokens_for_user(&UserId::new("2")).await.unwrap();
    assert_eq!(buyer_tokens.len(), 1);
    assert_eq!(buyer_tokens[0].digits, "54321");

    // Listing is gone
    assert!(repo.find_listing(listing.listing_id).await.unwrap().is_none());

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn self_purchase_is_rejected() {
    let (repo, path) = open_store("selfbuy");
    make_user(&repo, "1", "Seller").await;
    grant(&repo, "1", "777").await;

    let listing = SellUseCase::new(repo.clone())
        .execute(UserId::new("1"), 0, 100)
        .await
        .unwrap();

    let err = PurchaseUseCase::new(repo.clone(), Arc::new(LogNotifier))
        .execute(UserId::new("1"), listing.listing_id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::SelfPurchase));

    // Listing untouched
    assert!(repo.find_listing(listing.listing_id).await.unwrap().is_some());

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn purchase_fails_without_funds_and_changes_nothing() {
    let (repo, path) = open_store("poor");
    make_user(&repo, "1", "Seller").await;
    make_user(&repo, "2", "Buyer").await;
    grant(&repo, "1", "99999").await;

    let listing = SellUseCase::new(repo.clone())
        .execute(UserId::new("1"), 0, 5000)
        .await
        .unwrap();

    let err = PurchaseUseCase::new(repo.clone(), Arc::new(LogNotifier))
        .execute(UserId::new("2"), listing.listing_id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::InsufficientBalance));

    let buyer = repo.find_user(&UserId::new("2")).await.unwrap().unwrap();
    assert_eq!(buyer.balance, 1000);
    assert!(repo.tokens_for_user(&UserId::new("2")).await.unwrap().is_empty());
    assert!(repo.find_listing(listing.listing_id).await.unwrap().is_some());

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn sell_validates_price_and_index() {
    let (repo, path) = open_store("sellbad");
    make_user(&repo, "1", "Seller").await;
    grant(&repo, "1", "123").await;

    let err = SellUseCase::new(repo.clone())
        .execute(UserId::new("1"), 0, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::InvalidAmount));

    let err = SellUseCase::new(repo.clone())
        .execute(UserId::new("1"), 5, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::InvalidIndex));

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn cancel_returns_token_to_seller() {
    let (repo, path) = open_store("cancel");
    make_user(&repo, "1", "Seller").await;
    make_user(&repo, "2", "Other").await;
    grant(&repo, "1", "404").await;

    let listing = SellUseCase::new(repo.clone())
        .execute(UserId::new("1"), 0, 100)
        .await
        .unwrap();

    // Only the seller may cancel
    let err = CancelUseCase::new(repo.clone())
        .execute(UserId::new("2"), listing.listing_id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::ListingNotFound));

    let token = CancelUseCase::new(repo.clone())
        .execute(UserId::new("1"), listing.listing_id)
        .await
        .unwrap();
    assert_eq!(token.digits, "404");

    let tokens = repo.tokens_for_user(&UserId::new("1")).await.unwrap();
    assert_eq!(tokens.len(), 1);
    assert!(repo.find_listing(listing.listing_id).await.unwrap().is_none());

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn exchange_swaps_collections() {
    let (repo, path) = open_store("swap");
    make_user(&repo, "1", "Alice").await;
    make_user(&repo, "2", "Bob").await;
    grant(&repo, "1", "111").await;
    grant(&repo, "2", "222").await;

    let output = ExchangeUseCase::new(repo.clone(), Arc::new(LogNotifier))
        .execute(UserId::new("1"), 0, UserId::new("2"), 0)
        .await
        .unwrap();
    assert_eq!(output.gave.digits, "111");
    assert_eq!(output.received.digits, "222");

    let alice = repo.tokens_for_user(&UserId::new("1")).await.unwrap();
    let bob = repo.tokens_for_user(&UserId::new("2")).await.unwrap();
    assert_eq!(alice.len(), 1);
    assert_eq!(bob.len(), 1);
    assert_eq!(alice[0].digits, "222");
    assert_eq!(bob[0].digits, "111");

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn exchange_with_self_is_rejected() {
    let (repo, path) = open_store("selfswap");
    make_user(&repo, "1", "Alice").await;
    grant(&repo, "1", "111").await;
    grant(&repo, "1", "222").await;

    let err = ExchangeUseCase::new(repo.clone(), Arc::new(LogNotifier))
        .execute(UserId::new("1"), 0, UserId::new("1"), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::SelfExchange));

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn login_flow_round_trip() {
    let (repo, path) = open_store("login");
    make_user(&repo, "100", "Alice").await;

    BeginLoginUseCase::new(repo.clone(), Arc::new(LogNotifier), config())
        .execute(UserId::new("100"))
        .await
        .unwrap();

    // Fetch the issued code the way the chat transport would deliver it
    let stored = repo.find_user(&UserId::new("100")).await.unwrap().unwrap();
    let code = stored.login_code.clone().expect("pending code");
    assert_eq!(code.len(), 6);

    let err = VerifyLoginUseCase::new(repo.clone())
        .execute(UserId::new("100"), "000000")
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::CodeMismatch));

    let user = VerifyLoginUseCase::new(repo.clone())
        .execute(UserId::new("100"), &code)
        .await
        .unwrap();
    assert!(user.logged_in);
    assert!(user.login_code.is_none());

    // A logged-in user cannot request another code
    let err = BeginLoginUseCase::new(repo.clone(), Arc::new(LogNotifier), config())
        .execute(UserId::new("100"))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::AlreadyLoggedIn));

    LogoutUseCase::new(repo.clone())
        .execute(UserId::new("100"))
        .await
        .unwrap();
    let user = repo.find_user(&UserId::new("100")).await.unwrap().unwrap();
    assert!(!user.logged_in);

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn expired_code_is_gone() {
    let (repo, path) = open_store("expired");
    make_user(&repo, "100", "Alice").await;

    let zero_ttl = Arc::new(MarketConfig {
        login_code_ttl: Duration::ZERO,
        ..MarketConfig::development()
    });
    BeginLoginUseCase::new(repo.clone(), Arc::new(LogNotifier), zero_ttl)
        .execute(UserId::new("100"))
        .await
        .unwrap();

    let stored = repo.find_user(&UserId::new("100")).await.unwrap().unwrap();
    let code = stored.login_code.clone().unwrap();

    let err = VerifyLoginUseCase::new(repo.clone())
        .execute(UserId::new("100"), &code)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::CodeExpired));

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn store_survives_reopen() {
    let path = store_path("reopen");
    {
        let repo = Arc::new(JsonMarketRepository::open(&path).unwrap());
        make_user(&repo, "100", "Alice").await;
        grant(&repo, "100", "31337").await;
    }

    let repo = JsonMarketRepository::open(&path).unwrap();
    let user = repo.find_user(&UserId::new("100")).await.unwrap().unwrap();
    assert_eq!(user.balance, 1000);
    let tokens = repo.tokens_for_user(&UserId::new("100")).await.unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].digits, "31337");

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn corrupt_store_file_is_an_error() {
    let path = store_path("corrupt");
    std::fs::write(&path, "{not json").unwrap();

    let err = JsonMarketRepository::open(&path).unwrap_err();
    assert!(matches!(err, MarketError::StorageUnavailable(_)));

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn participants_reflect_holdings() {
    let (repo, path) = open_store("participants");
    make_user(&repo, "1", "Alice").await;
    make_user(&repo, "2", "Bob").await;
    grant(&repo, "1", "111").await;
    grant(&repo, "1", "222").await;

    let summaries = repo.list_users().await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].user_id, UserId::new("1"));
    assert_eq!(summaries[0].token_count, 2);
    assert_eq!(summaries[1].token_count, 0);

    let _ = std::fs::remove_file(path);
}
