//! Rarity tiers and filename parsing
//!
//! A layer element's rarity is encoded in its filename as a suffix on the
//! stem: `crown_ssr.png`, `crown_sr.png`, `crown_r.png` or plain `crown.png`.
//! The suffix is parsed exactly once, at catalog load time, into a
//! [`RarityTier`]. Nothing downstream looks at filenames again.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Weight applied to a tier that is absent from a configured weight table.
pub const FALLBACK_WEIGHT: u32 = 1;

/// Rarity tier of a layer element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RarityTier {
    /// No suffix
    Original,
    /// `_r`
    Rare,
    /// `_sr`
    SuperRare,
    /// `_ssr`
    SuperSuperRare,
}

impl RarityTier {
    pub const ALL: [RarityTier; 4] = [
        RarityTier::Original,
        RarityTier::Rare,
        RarityTier::SuperRare,
        RarityTier::SuperSuperRare,
    ];

    /// Filename suffix carried by this tier (before the extension).
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Original => "",
            Self::Rare => "_r",
            Self::SuperRare => "_sr",
            Self::SuperSuperRare => "_ssr",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Rare => "rare",
            Self::SuperRare => "super_rare",
            Self::SuperSuperRare => "super_super_rare",
        }
    }

    pub fn default_weight(&self) -> u32 {
        match self {
            Self::Original => 65,
            Self::Rare => 25,
            Self::SuperRare => 7,
            Self::SuperSuperRare => 3,
        }
    }

    /// Classify a file stem by its anchored rarity suffix.
    ///
    /// Longest suffixes are tried first so `_ssr` is never read as `_sr`
    /// or `_r`. Returns the tier and the stem with the suffix removed.
    pub fn classify(stem: &str) -> (RarityTier, &str) {
        const LONGEST_FIRST: [RarityTier; 3] = [
            RarityTier::SuperSuperRare,
            RarityTier::SuperRare,
            RarityTier::Rare,
        ];

        for tier in LONGEST_FIRST {
            if let Some(base) = stem.strip_suffix(tier.suffix()) {
                return (tier, base);
            }
        }
        (RarityTier::Original, stem)
    }
}

impl fmt::Display for RarityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Display name and tier parsed from an element filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub display_name: String,
    pub tier: RarityTier,
}

/// Parse `<basename><suffix>.<ext>` into a display name and tier.
///
/// Returns `None` when nothing is left of the name once the extension and
/// suffix are removed (e.g. `_r.png`).
pub fn parse_file_name(file_name: &str) -> Option<ParsedName> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    let (tier, base) = RarityTier::classify(stem);
    if base.is_empty() {
        return None;
    }
    Some(ParsedName {
        display_name: base.to_string(),
        tier,
    })
}

/// Relative weight per rarity tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RarityWeights {
    weights: BTreeMap<RarityTier, u32>,
}

impl RarityWeights {
    pub fn new(weights: BTreeMap<RarityTier, u32>) -> Self {
        Self { weights }
    }

    pub fn with_weight(mut self, tier: RarityTier, weight: u32) -> Self {
        self.weights.insert(tier, weight);
        self
    }

    /// Weight for `tier`, or [`FALLBACK_WEIGHT`] if the table omits it.
    pub fn weight(&self, tier: RarityTier) -> u32 {
        self.weights.get(&tier).copied().unwrap_or(FALLBACK_WEIGHT)
    }

    /// Tiers configured with a zero weight.
    pub fn zero_weight_tiers(&self) -> Vec<RarityTier> {
        self.weights
            .iter()
            .filter(|(_, w)| **w == 0)
            .map(|(t, _)| *t)
            .collect()
    }
}

impl Default for RarityWeights {
    fn default() -> Self {
        Self {
            weights: RarityTier::ALL
                .iter()
                .map(|t| (*t, t.default_weight()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("hat.png", "hat", RarityTier::Original ; "no suffix")]
    #[test_case("hat_r.png", "hat", RarityTier::Rare ; "rare")]
    #[test_case("hat_sr.png", "hat", RarityTier::SuperRare ; "super rare")]
    #[test_case("hat_ssr.png", "hat", RarityTier::SuperSuperRare ; "super super rare")]
    #[test_case("star_rock.png", "star_rock", RarityTier::Original ; "inner r is not a suffix")]
    #[test_case("cross_r_ssr.png", "cross_r", RarityTier::SuperSuperRare ; "only the last suffix is stripped")]
    #[test_case("gold chain_sr.png", "gold chain", RarityTier::SuperRare ; "spaces kept")]
    #[test_case("wizard.hat_r.png", "wizard.hat", RarityTier::Rare ; "inner dot kept")]
    #[test_case("bg_r", "bg", RarityTier::Rare ; "no extension")]
    fn test_parse_file_name(file_name: &str, name: &str, tier: RarityTier) {
        let parsed = parse_file_name(file_name).unwrap();
        assert_eq!(parsed.display_name, name);
        assert_eq!(parsed.tier, tier);
    }

    #[test]
    fn test_ssr_never_masked_by_shorter_suffix() {
        for stem in ["a", "bg", "hat_r", "x_sr", "cool_hat"] {
            let parsed = parse_file_name(&format!("{stem}_ssr.png")).unwrap();
            assert_eq!(parsed.tier, RarityTier::SuperSuperRare, "{stem}");
            assert_eq!(parsed.display_name, stem);
        }
    }

    #[test]
    fn test_suffix_only_names_rejected() {
        assert_eq!(parse_file_name("_r.png"), None);
        assert_eq!(parse_file_name("_ssr.png"), None);
    }

    #[test]
    fn test_default_weights() {
        let weights = RarityWeights::default();
        assert_eq!(weights.weight(RarityTier::Original), 65);
        assert_eq!(weights.weight(RarityTier::Rare), 25);
        assert_eq!(weights.weight(RarityTier::SuperRare), 7);
        assert_eq!(weights.weight(RarityTier::SuperSuperRare), 3);
    }

    #[test]
    fn test_missing_tier_falls_back() {
        let weights = RarityWeights::new(BTreeMap::new()).with_weight(RarityTier::Rare, 10);
        assert_eq!(weights.weight(RarityTier::Rare), 10);
        assert_eq!(weights.weight(RarityTier::Original), FALLBACK_WEIGHT);
    }

    #[test]
    fn test_weights_serde_snake_case() {
        let json = r#"{"original": 65, "super_super_rare": 3}"#;
        let weights: RarityWeights = serde_json::from_str(json).unwrap();
        assert_eq!(weights.weight(RarityTier::SuperSuperRare), 3);
        assert_eq!(weights.weight(RarityTier::SuperRare), FALLBACK_WEIGHT);
    }
}
