//! PostgreSQL Repository Implementation
//!
//! Compound operations run in a single transaction. Row locks are taken
//! in a deterministic order (listings, then user rows sorted by ID, then
//! token rows sorted by ID) so two concurrent settlements cannot
//! deadlock each other.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{Listing, Token, User, UserSummary};
use crate::domain::repository::{MarketRepository, Settlement, TokenSwap};
use crate::domain::services::{check_purchase, roll_quota};
use crate::domain::value_objects::{Styling, UserId};
use crate::error::{MarketError, MarketResult};

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgMarketRepository {
    pool: PgPool,
}

impl PgMarketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl MarketRepository for PgMarketRepository {
    async fn create_user(&self, user: &User) -> MarketResult<User> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                display_name,
                avatar_url,
                balance,
                last_activation_date,
                activation_count,
                logged_in,
                login_code,
                code_expiry,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user.user_id.as_str())
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(user.balance)
        .bind(user.last_activation_date)
        .bind(user.activation_count as i32)
        .bind(user.logged_in)
        .bind(&user.login_code)
        .bind(user.code_expiry)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        // Read back: a concurrent insert may have won the conflict
        self.find_user(&user.user_id)
            .await?
            .ok_or(MarketError::UserNotFound)
    }

    async fn find_user(&self, user_id: &UserId) -> MarketResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                display_name,
                avatar_url,
                balance,
                last_activation_date,
                activation_count,
                logged_in,
                login_code,
                code_expiry,
                created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn update_user(&self, user: &User) -> MarketResult<()> {
        let affected = sqlx::query(
            r#"
            UPDATE users SET
                display_name = $2,
                avatar_url = $3,
                balance = $4,
                last_activation_date = $5,
                activation_count = $6,
                logged_in = $7,
                login_code = $8,
                code_expiry = $9
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_str())
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(user.balance)
        .bind(user.last_activation_date)
        .bind(user.activation_count as i32)
        .bind(user.logged_in)
        .bind(&user.login_code)
        .bind(user.code_expiry)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(MarketError::UserNotFound);
        }
        Ok(())
    }

    async fn list_users(&self) -> MarketResult<Vec<UserSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                u.user_id,
                u.display_name,
                u.avatar_url,
                u.balance,
                COUNT(t.token_id) AS token_count
            FROM users u
            LEFT JOIN tokens t ON t.owner_id = u.user_id
            GROUP BY u.user_id, u.display_name, u.avatar_url, u.balance
            ORDER BY u.user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SummaryRow::into_summary).collect())
    }

    async fn consume_mint_quota(
        &self,
        user_id: &UserId,
        today: NaiveDate,
        quota: u32,
    ) -> MarketResult<u32> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, (NaiveDate, i32)>(
            r#"
            SELECT last_activation_date, activation_count
            FROM users
            WHERE user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(MarketError::UserNotFound)?;

        let new_count = roll_quota(row.0, row.1 as u32, today, quota)?;

        sqlx::query(
            r#"
            UPDATE users SET last_activation_date = $2, activation_count = $3
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .bind(today)
        .bind(new_count as i32)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(new_count)
    }

    async fn grant_token(&self, user_id: &UserId, token: &Token) -> MarketResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tokens (
                token_id, owner_id, digits, score,
                bg_color, text_color, minted_at, acquired_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(token.token_id)
        .bind(user_id.as_str())
        .bind(&token.digits)
        .bind(token.score as i32)
        .bind(&token.styling.bg_color)
        .bind(&token.styling.text_color)
        .bind(token.minted_at)
        .bind(token.acquired_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn tokens_for_user(&self, user_id: &UserId) -> MarketResult<Vec<Token>> {
        // Distinguish "no such user" from "empty collection"
        sqlx::query_scalar::<_, String>("SELECT user_id FROM users WHERE user_id = $1")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(MarketError::UserNotFound)?;

        let rows = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT token_id, digits, score, bg_color, text_color, minted_at, acquired_at
            FROM tokens
            WHERE owner_id = $1
            ORDER BY acquired_at, token_id
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TokenRow::into_token).collect())
    }

    async fn publish_listing(&self, listing: &Listing) -> MarketResult<()> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM tokens WHERE token_id = $1 AND owner_id = $2",
        )
        .bind(listing.token.token_id)
        .bind(listing.seller_id.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed == 0 {
            return Err(MarketError::TokenNotFound);
        }

        sqlx::query(
            r#"
            INSERT INTO market_listings (
                listing_id, seller_id, token_id, digits, score,
                bg_color, text_color, minted_at, price, listed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(listing.listing_id)
        .bind(listing.seller_id.as_str())
        .bind(listing.token.token_id)
        .bind(&listing.token.digits)
        .bind(listing.token.score as i32)
        .bind(&listing.token.styling.bg_color)
        .bind(&listing.token.styling.text_color)
        .bind(listing.token.minted_at)
        .bind(listing.price)
        .bind(listing.listed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_listing(&self, listing_id: Uuid) -> MarketResult<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT listing_id, seller_id, token_id, digits, score,
                   bg_color, text_color, minted_at, price, listed_at
            FROM market_listings
            WHERE listing_id = $1
            "#,
        )
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ListingRow::into_listing))
    }

    async fn list_listings(&self) -> MarketResult<Vec<Listing>> {
        let rows = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT listing_id, seller_id, token_id, digits, score,
                   bg_color, text_color, minted_at, price, listed_at
            FROM market_listings
            ORDER BY listed_at, listing_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ListingRow::into_listing).collect())
    }

    async fn cancel_listing(&self, listing_id: Uuid, seller_id: &UserId) -> MarketResult<Token> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT listing_id, seller_id, token_id, digits, score,
                   bg_color, text_color, minted_at, price, listed_at
            FROM market_listings
            WHERE listing_id = $1
            FOR UPDATE
            "#,
        )
        .bind(listing_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(MarketError::ListingNotFound)?;

        let listing = row.into_listing();
        if listing.seller_id != *seller_id {
            // Do not reveal whose listing it is
            return Err(MarketError::ListingNotFound);
        }

        sqlx::query("DELETE FROM market_listings WHERE listing_id = $1")
            .bind(listing_id)
            .execute(&mut *tx)
            .await?;

        // Back of the collection, as if freshly acquired
        let token = Token {
            acquired_at: Utc::now(),
            ..listing.token
        };
        insert_token(&mut tx, seller_id, &token).await?;

        tx.commit().await?;
        Ok(token)
    }

    async fn settle_purchase(
        &self,
        listing_id: Uuid,
        buyer_id: &UserId,
    ) -> MarketResult<Settlement> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT listing_id, seller_id, token_id, digits, score,
                   bg_color, text_color, minted_at, price, listed_at
            FROM market_listings
            WHERE listing_id = $1
            FOR UPDATE
            "#,
        )
        .bind(listing_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(MarketError::ListingNotFound)?;

        let listing = row.into_listing();
        if listing.seller_id == *buyer_id {
            return Err(MarketError::SelfPurchase);
        }

        // Lock both user rows in ID order
        let mut parties = [buyer_id.as_str(), listing.seller_id.as_str()];
        parties.sort_unstable();
        let mut buyer_balance = None;
        let mut seller_found = false;
        for party in parties {
            let balance = sqlx::query_scalar::<_, i64>(
                "SELECT balance FROM users WHERE user_id = $1 FOR UPDATE",
            )
            .bind(party)
            .fetch_optional(&mut *tx)
            .await?;

            match balance {
                Some(b) if party == buyer_id.as_str() => buyer_balance = Some(b),
                Some(_) => seller_found = true,
                None => return Err(MarketError::UserNotFound),
            }
        }
        let buyer_balance = buyer_balance.ok_or(MarketError::UserNotFound)?;
        if !seller_found {
            return Err(MarketError::UserNotFound);
        }

        check_purchase(buyer_id, buyer_balance, &listing)?;

        sqlx::query("UPDATE users SET balance = balance - $2 WHERE user_id = $1")
            .bind(buyer_id.as_str())
            .bind(listing.price)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET balance = balance + $2 WHERE user_id = $1")
            .bind(listing.seller_id.as_str())
            .bind(listing.price)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM market_listings WHERE listing_id = $1")
            .bind(listing_id)
            .execute(&mut *tx)
            .await?;

        let granted = listing.token.rematerialized();
        insert_token(&mut tx, buyer_id, &granted).await?;

        tx.commit().await?;

        Ok(Settlement {
            buyer_balance_after: buyer_balance - listing.price,
            listing,
            granted,
        })
    }

    async fn swap_tokens(&self, swap: &TokenSwap) -> MarketResult<()> {
        let mut tx = self.pool.begin().await?;

        // Lock token rows in token-ID order
        let mut sides = [
            (&swap.left, swap.left_token),
            (&swap.right, swap.right_token),
        ];
        sides.sort_unstable_by_key(|(_, token_id)| *token_id);
        for (owner, token_id) in sides {
            sqlx::query_scalar::<_, Uuid>(
                "SELECT token_id FROM tokens WHERE token_id = $1 AND owner_id = $2 FOR UPDATE",
            )
            .bind(token_id)
            .bind(owner.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(MarketError::TokenNotFound)?;
        }

        let now = Utc::now();
        sqlx::query("UPDATE tokens SET owner_id = $2, acquired_at = $3 WHERE token_id = $1")
            .bind(swap.left_token)
            .bind(swap.right.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE tokens SET owner_id = $2, acquired_at = $3 WHERE token_id = $1")
            .bind(swap.right_token)
            .bind(swap.left.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

async fn insert_token(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    owner: &UserId,
    token: &Token,
) -> MarketResult<()> {
    sqlx::query(
        r#"
        INSERT INTO tokens (
            token_id, owner_id, digits, score,
            bg_color, text_color, minted_at, acquired_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(token.token_id)
    .bind(owner.as_str())
    .bind(&token.digits)
    .bind(token.score as i32)
    .bind(&token.styling.bg_color)
    .bind(&token.styling.text_color)
    .bind(token.minted_at)
    .bind(token.acquired_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// Internal row types for sqlx mapping
#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: String,
    display_name: String,
    avatar_url: Option<String>,
    balance: i64,
    last_activation_date: NaiveDate,
    activation_count: i32,
    logged_in: bool,
    login_code: Option<String>,
    code_expiry: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            user_id: UserId::new(self.user_id),
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            balance: self.balance,
            last_activation_date: self.last_activation_date,
            activation_count: self.activation_count as u32,
            logged_in: self.logged_in,
            login_code: self.login_code,
            code_expiry: self.code_expiry,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    token_id: Uuid,
    digits: String,
    score: i32,
    bg_color: String,
    text_color: String,
    minted_at: DateTime<Utc>,
    acquired_at: DateTime<Utc>,
}

impl TokenRow {
    fn into_token(self) -> Token {
        Token {
            token_id: self.token_id,
            digits: self.digits,
            score: self.score as u32,
            styling: Styling {
                bg_color: self.bg_color,
                text_color: self.text_color,
            },
            minted_at: self.minted_at,
            acquired_at: self.acquired_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ListingRow {
    listing_id: Uuid,
    seller_id: String,
    token_id: Uuid,
    digits: String,
    score: i32,
    bg_color: String,
    text_color: String,
    minted_at: DateTime<Utc>,
    price: i64,
    listed_at: DateTime<Utc>,
}

impl ListingRow {
    fn into_listing(self) -> Listing {
        Listing {
            listing_id: self.listing_id,
            seller_id: UserId::new(self.seller_id),
            token: Token {
                token_id: self.token_id,
                digits: self.digits,
                score: self.score as u32,
                styling: Styling {
                    bg_color: self.bg_color,
                    text_color: self.text_color,
                },
                minted_at: self.minted_at,
                // Held by the listing; acquisition time resumes on return
                acquired_at: self.listed_at,
            },
            price: self.price,
            listed_at: self.listed_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    user_id: String,
    display_name: String,
    avatar_url: Option<String>,
    balance: i64,
    token_count: i64,
}

impl SummaryRow {
    fn into_summary(self) -> UserSummary {
        UserSummary {
            user_id: UserId::new(self.user_id),
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            balance: self.balance,
            token_count: self.token_count as u64,
        }
    }
}
