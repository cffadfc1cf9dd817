//! Domain Value Objects
//!
//! Immutable value types for the collectible-number market.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default background palette for token display
pub const BG_PALETTE: [&str; 5] = ["#e74c3c", "#e67e22", "#f1c40f", "#16a085", "#27ae60"];

/// Default text palette for token display
pub const TEXT_PALETTE: [&str; 5] = ["#1abc9c", "#2ecc71", "#3498db", "#9b59b6", "#34495e"];

/// Opaque user identifier
///
/// Assigned by the external messaging platform, stable for the lifetime
/// of the account. Treated as an uninterpreted string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Token display styling
///
/// Decorative only. Background and text colors are drawn independently,
/// so they can coincide; that is accepted behavior, not a bug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Styling {
    pub bg_color: String,
    pub text_color: String,
}

/// Perceived-rarity tier derived from a beauty score
///
/// The labels are marketing copy ("how many tokens look like this");
/// the generator's acceptance weighting actually trends the opposite
/// way, which is preserved deliberately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rarity {
    /// score > premium threshold
    Premium,
    /// rare threshold < score <= premium threshold
    Rare,
    /// score <= rare threshold
    Common,
}

impl Rarity {
    /// Classify a score. Boundaries: a score equal to a threshold falls
    /// into the tier below it (8 is Common, 12 is Rare).
    pub fn from_score(score: u32, thresholds: &RarityThresholds) -> Self {
        if score > thresholds.premium {
            Rarity::Premium
        } else if score > thresholds.rare {
            Rarity::Rare
        } else {
            Rarity::Common
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rarity::Premium => "0.5%",
            Rarity::Rare => "1%",
            Rarity::Common => "2%",
        }
    }
}

/// Score thresholds for the three-way rarity partition
#[derive(Debug, Clone)]
pub struct RarityThresholds {
    pub rare: u32,
    pub premium: u32,
}

impl Default for RarityThresholds {
    fn default() -> Self {
        Self {
            rare: 8,
            premium: 12,
        }
    }
}

/// Settings for the token generator
///
/// `lengths` and `weights` are parallel slices; length 6 is the heaviest
/// draw (~40%) under the defaults.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub lengths: Vec<usize>,
    pub weights: Vec<u32>,
    pub bg_palette: Vec<String>,
    pub text_palette: Vec<String>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            lengths: vec![3, 4, 5, 6],
            weights: vec![1, 2, 3, 4],
            bg_palette: BG_PALETTE.iter().map(|c| c.to_string()).collect(),
            text_palette: TEXT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}
