//! Unit tests for market crate

#[cfg(test)]
mod error_tests {
    use crate::error::MarketError;
    use axum::http::StatusCode;
    use kernel::error::kind::ErrorKind;

    #[test]
    fn test_status_codes() {
        assert_eq!(MarketError::UserNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(MarketError::TokenNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(MarketError::ListingNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(MarketError::InvalidIndex.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(MarketError::InvalidAmount.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            MarketError::InsufficientBalance.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(MarketError::SelfPurchase.status_code(), StatusCode::CONFLICT);
        assert_eq!(MarketError::SelfExchange.status_code(), StatusCode::CONFLICT);
        assert_eq!(MarketError::AlreadyLoggedIn.status_code(), StatusCode::CONFLICT);
        assert_eq!(MarketError::CodeExpired.status_code(), StatusCode::GONE);
        assert_eq!(MarketError::CodeMismatch.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(MarketError::Unidentified.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            MarketError::QuotaExceeded.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            MarketError::StorageUnavailable("disk".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_kind_matches_status() {
        let errors = [
            MarketError::UserNotFound,
            MarketError::InvalidIndex,
            MarketError::InsufficientBalance,
            MarketError::SelfPurchase,
            MarketError::CodeExpired,
            MarketError::CodeMismatch,
            MarketError::QuotaExceeded,
            MarketError::Internal("x".to_string()),
        ];
        for err in errors {
            assert_eq!(err.kind().status_code(), err.status_code().as_u16());
        }
    }

    #[test]
    fn test_app_error_conversion() {
        let app_err = MarketError::QuotaExceeded.to_app_error();
        assert_eq!(app_err.kind(), ErrorKind::TooManyRequests);
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: MarketError = io.into();
        assert!(matches!(err, MarketError::StorageUnavailable(_)));
    }
}

#[cfg(test)]
mod config_tests {
    use crate::application::config::MarketConfig;

    #[test]
    fn test_defaults() {
        let config = MarketConfig::default();
        assert_eq!(config.initial_balance, 1000);
        assert_eq!(config.daily_mint_quota, 3);
        assert_eq!(config.login_code_ttl_secs(), 300);
        assert_eq!(config.login_code_range, (100_000, 999_999));
        assert_eq!(config.identity_cookie_name, "user_id");
        assert!(config.cookie_secure);
    }

    #[test]
    fn test_development_relaxes_cookie() {
        let config = MarketConfig::development();
        assert!(!config.cookie_secure);
        assert_eq!(config.initial_balance, 1000);
    }
}

#[cfg(test)]
mod dto_tests {
    use crate::domain::entities::Token;
    use crate::domain::value_objects::{RarityThresholds, Styling};
    use crate::presentation::dto::{EnsureUserRequest, TokenResponse};

    fn token(digits: &str, score: u32) -> Token {
        Token::mint(
            digits.to_string(),
            score,
            Styling {
                bg_color: "#16a085".to_string(),
                text_color: "#3498db".to_string(),
            },
        )
    }

    #[test]
    fn test_token_response_rarity_label() {
        let thresholds = RarityThresholds::default();
        let response = TokenResponse::from_token(&token("100000", 10), &thresholds);
        assert_eq!(response.rarity, "1%");
        assert_eq!(response.digits, "100000");

        let response = TokenResponse::from_token(&token("123456", 1), &thresholds);
        assert_eq!(response.rarity, "2%");
    }

    #[test]
    fn test_token_response_serializes_camel_case() {
        let thresholds = RarityThresholds::default();
        let response = TokenResponse::from_token(&token("777", 7), &thresholds);
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("bgColor").is_some());
        assert!(json.get("textColor").is_some());
        assert!(json.get("tokenId").is_some());
        assert!(json.get("bg_color").is_none());
    }

    #[test]
    fn test_ensure_user_request_optional_avatar() {
        let req: EnsureUserRequest =
            serde_json::from_str(r#"{"userId":"42","displayName":"Alice"}"#).unwrap();
        assert_eq!(req.user_id, "42");
        assert!(req.avatar_url.is_none());
    }
}
