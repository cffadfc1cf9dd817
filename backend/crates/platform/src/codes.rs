//! One-Time Code Generation
//!
//! Short numeric codes for out-of-band confirmation flows. These are
//! convenience codes with a short TTL, not a hardened credential.

use rand::Rng;

/// Generate a numeric code uniformly drawn from `[low, high]`
///
/// The code is returned as its decimal string representation, so a range
/// of `[100_000, 999_999]` always yields exactly six digits.
pub fn numeric_code(low: u32, high: u32) -> String {
    let mut rng = rand::thread_rng();
    rng.gen_range(low..=high).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_six_digit_code_shape() {
        for _ in 0..100 {
            let code = numeric_code(100_000, 999_999);
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_code_within_range() {
        for _ in 0..100 {
            let code: u32 = numeric_code(100_000, 999_999).parse().unwrap();
            assert!((100_000..=999_999).contains(&code));
        }
    }

    #[test]
    fn test_degenerate_range() {
        assert_eq!(numeric_code(7, 7), "7");
    }
}
