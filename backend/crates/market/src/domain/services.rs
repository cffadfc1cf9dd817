//! Domain Services
//!
//! Pure domain logic: the beauty-score engine, the rejection-sampling
//! token generator, and the transaction rules shared by every repository
//! implementation. Both stores call these functions inside their own
//! atomicity boundary so the rules exist exactly once.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::IndexedRandom;

use crate::domain::entities::Listing;
use crate::domain::value_objects::{GeneratorSettings, Styling, UserId};
use crate::error::{MarketError, MarketResult};

/// Compute the beauty score of a digit string
///
/// `score = zeros + longest_run + (6 - len)`. The caller guarantees a
/// non-empty string of decimal digits of length 3-6; the function is
/// total over any non-empty string regardless.
pub fn beauty_score(digits: &str) -> u32 {
    let zeros = digits.chars().filter(|&c| c == '0').count();
    let bonus = 6usize.saturating_sub(digits.chars().count());
    (zeros + longest_run(digits) + bonus) as u32
}

/// Length of the longest run of identical consecutive characters
fn longest_run(digits: &str) -> usize {
    let mut longest = 0;
    let mut run = 0;
    let mut prev = None;
    for c in digits.chars() {
        if prev == Some(c) {
            run += 1;
        } else {
            run = 1;
            prev = Some(c);
        }
        longest = longest.max(run);
    }
    longest
}

/// Draw a candidate digit string until one passes the acceptance roll
///
/// A candidate of score `s` is accepted with probability `1/(s+1)`, so
/// the accepted distribution is biased toward low-scoring (common)
/// numbers. High-score candidates being rejected more often is the
/// observed production behavior and is preserved as-is. The loop
/// terminates with probability 1: acceptance probability is bounded
/// below by `1/(max_score+1)`.
pub fn generate_digits<R: Rng + ?Sized>(
    rng: &mut R,
    settings: &GeneratorSettings,
) -> MarketResult<(String, u32)> {
    let length_dist = WeightedIndex::new(&settings.weights)
        .map_err(|e| MarketError::Internal(format!("invalid generator weights: {e}")))?;

    loop {
        let length = settings.lengths[length_dist.sample(rng)];
        let candidate: String = (0..length)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect();
        let score = beauty_score(&candidate);
        if rng.random::<f64>() < 1.0 / f64::from(score + 1) {
            return Ok((candidate, score));
        }
    }
}

/// Pick display styling, each color uniform over its palette
///
/// The draws are independent, so text and background may coincide.
pub fn pick_styling<R: Rng + ?Sized>(rng: &mut R, settings: &GeneratorSettings) -> Styling {
    let bg_color = settings
        .bg_palette
        .choose(rng)
        .cloned()
        .unwrap_or_default();
    let text_color = settings
        .text_palette
        .choose(rng)
        .cloned()
        .unwrap_or_default();
    Styling {
        bg_color,
        text_color,
    }
}

/// Apply the daily quota rule and return the count after this mint
///
/// The stored counter only applies when the stored date is today; any
/// other date means the effective count is zero. Errors with
/// `QuotaExceeded` when the effective count has reached the quota.
pub fn roll_quota(
    stored_date: NaiveDate,
    stored_count: u32,
    today: NaiveDate,
    quota: u32,
) -> MarketResult<u32> {
    let effective = if stored_date == today { stored_count } else { 0 };
    if effective >= quota {
        return Err(MarketError::QuotaExceeded);
    }
    Ok(effective + 1)
}

/// Validate a submitted login code against the stored pending one
///
/// A missing code or expiry behaves as expired (matching the original
/// flow where a consumed code leaves both fields null). Expiry wins over
/// mismatch: an expired code is `CodeExpired` even if the digits differ.
pub fn check_login_code(
    stored_code: Option<&str>,
    code_expiry: Option<DateTime<Utc>>,
    submitted: &str,
    now: DateTime<Utc>,
) -> MarketResult<()> {
    match code_expiry {
        Some(expiry) if now < expiry => {}
        _ => return Err(MarketError::CodeExpired),
    }
    match stored_code {
        Some(code) if code == submitted => Ok(()),
        _ => Err(MarketError::CodeMismatch),
    }
}

/// Validate a purchase before settlement
///
/// Called inside the store's transaction boundary with the freshly read
/// buyer balance, so the check cannot go stale before the debit.
pub fn check_purchase(
    buyer_id: &UserId,
    buyer_balance: i64,
    listing: &Listing,
) -> MarketResult<()> {
    if *buyer_id == listing.seller_id {
        return Err(MarketError::SelfPurchase);
    }
    if buyer_balance < listing.price {
        return Err(MarketError::InsufficientBalance);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_beauty_score_scenarios() {
        // 3 zeros + run of 3 + bonus (6-3)
        assert_eq!(beauty_score("000"), 9);
        // no zeros, run of 1, no bonus
        assert_eq!(beauty_score("123456"), 1);
        // 5 zeros + run of 5 + no bonus
        assert_eq!(beauty_score("100000"), 10);
    }

    #[test]
    fn test_beauty_score_is_deterministic() {
        for digits in ["31337", "0000", "987654", "550"] {
            assert_eq!(beauty_score(digits), beauty_score(digits));
        }
    }

    #[test]
    fn test_longest_run() {
        assert_eq!(longest_run("121212"), 1);
        assert_eq!(longest_run("112233"), 2);
        assert_eq!(longest_run("122221"), 4);
        assert_eq!(longest_run("777"), 3);
    }

    #[test]
    fn test_generated_digits_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let settings = GeneratorSettings::default();
        for _ in 0..200 {
            let (digits, score) = generate_digits(&mut rng, &settings).unwrap();
            assert!((3..=6).contains(&digits.len()), "bad length: {digits}");
            assert!(digits.chars().all(|c| c.is_ascii_digit()));
            assert_eq!(score, beauty_score(&digits));
        }
    }

    #[test]
    fn test_styling_from_palettes() {
        let mut rng = StdRng::seed_from_u64(7);
        let settings = GeneratorSettings::default();
        for _ in 0..50 {
            let styling = pick_styling(&mut rng, &settings);
            assert!(settings.bg_palette.contains(&styling.bg_color));
            assert!(settings.text_palette.contains(&styling.text_color));
        }
    }

    #[test]
    fn test_roll_quota_same_day() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(roll_quota(today, 0, today, 3).unwrap(), 1);
        assert_eq!(roll_quota(today, 2, today, 3).unwrap(), 3);
        assert!(matches!(
            roll_quota(today, 3, today, 3),
            Err(MarketError::QuotaExceeded)
        ));
    }

    #[test]
    fn test_roll_quota_resets_on_date_change() {
        let yesterday = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        // exhausted yesterday, fresh today
        assert_eq!(roll_quota(yesterday, 3, today, 3).unwrap(), 1);
        // stored date in the future also resets (clock moved back)
        assert_eq!(roll_quota(today, 3, yesterday, 3).unwrap(), 1);
    }

    #[test]
    fn test_check_login_code() {
        let now = Utc::now();
        let later = now + chrono::TimeDelta::minutes(5);

        assert!(check_login_code(Some("123456"), Some(later), "123456", now).is_ok());
        assert!(matches!(
            check_login_code(Some("123456"), Some(later), "654321", now),
            Err(MarketError::CodeMismatch)
        ));
        // expiry boundary is inclusive: now >= expiry fails
        assert!(matches!(
            check_login_code(Some("123456"), Some(now), "123456", now),
            Err(MarketError::CodeExpired)
        ));
        // no pending code behaves as expired
        assert!(matches!(
            check_login_code(None, None, "123456", now),
            Err(MarketError::CodeExpired)
        ));
    }

    #[test]
    fn test_check_purchase() {
        use crate::domain::entities::{Listing, Token};
        use crate::domain::value_objects::Styling;

        let token = Token::mint(
            "500".to_string(),
            beauty_score("500"),
            Styling {
                bg_color: "#e74c3c".to_string(),
                text_color: "#1abc9c".to_string(),
            },
        );
        let listing = Listing::new(UserId::new("seller"), token, 250);

        let buyer = UserId::new("buyer");
        assert!(check_purchase(&buyer, 1000, &listing).is_ok());
        assert!(matches!(
            check_purchase(&buyer, 249, &listing),
            Err(MarketError::InsufficientBalance)
        ));
        assert!(matches!(
            check_purchase(&UserId::new("seller"), 1000, &listing),
            Err(MarketError::SelfPurchase)
        ));
    }
}
