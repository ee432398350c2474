//! Risk classifier — the one canonical count → tier mapping.
//!
//! RULE: Every aggregation classifies through a RiskScale.
//! No module re-declares thresholds, scores or colors inline.
//!
//! The scale is a bijective lookup table: tier ↔ score ↔ color.
//! Thresholds are inclusive upper bounds, so a count of exactly 200
//! is still Low and 201 is Medium Low.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of decimal places every mean risk score is rounded to.
pub const SCORE_DECIMALS: u32 = 2;

/// Six ordinal risk tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Medium Low")]
    MediumLow,
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "Medium High")]
    MediumHigh,
    #[serde(rename = "High")]
    High,
    #[serde(rename = "Critical")]
    Critical,
}

impl RiskTier {
    pub const ALL: [RiskTier; 6] = [
        RiskTier::Low,
        RiskTier::MediumLow,
        RiskTier::Medium,
        RiskTier::MediumHigh,
        RiskTier::High,
        RiskTier::Critical,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::MediumLow => "Medium Low",
            Self::Medium => "Medium",
            Self::MediumHigh => "Medium High",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the lookup table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierBand {
    pub tier: RiskTier,
    /// Inclusive upper bound. `None` only on the last band.
    pub upper_bound: Option<f64>,
    pub score: u8,
    pub color: String,
}

/// A tier together with its score and display color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRating {
    pub tier: RiskTier,
    pub score: u8,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScale {
    bands: Vec<TierBand>,
}

impl Default for RiskScale {
    fn default() -> Self {
        let band = |tier, upper_bound: Option<f64>, score, color: &str| TierBand {
            tier,
            upper_bound,
            score,
            color: color.to_string(),
        };
        Self {
            bands: vec![
                band(RiskTier::Low, Some(200.0), 1, "#2E4A1E"),
                band(RiskTier::MediumLow, Some(400.0), 2, "#9ACD32"),
                band(RiskTier::Medium, Some(600.0), 3, "#FFFF00"),
                band(RiskTier::MediumHigh, Some(800.0), 4, "#FFA500"),
                band(RiskTier::High, Some(1000.0), 5, "#FF0000"),
                band(RiskTier::Critical, None, 6, "#800080"),
            ],
        }
    }
}

impl RiskScale {
    pub fn from_bands(bands: Vec<TierBand>) -> Result<Self, String> {
        let scale = Self { bands };
        scale.validate()?;
        Ok(scale)
    }

    pub fn bands(&self) -> &[TierBand] {
        &self.bands
    }

    /// Check the table is a monotonic bijection over all six tiers.
    pub fn validate(&self) -> Result<(), String> {
        if self.bands.len() != RiskTier::ALL.len() {
            return Err(format!(
                "risk scale needs {} bands, found {}",
                RiskTier::ALL.len(),
                self.bands.len()
            ));
        }
        for (band, expected) in self.bands.iter().zip(RiskTier::ALL) {
            if band.tier != expected {
                return Err(format!("band for {} is out of order (expected {expected})", band.tier));
            }
        }
        for pair in self.bands.windows(2) {
            if pair[1].score <= pair[0].score {
                return Err(format!("scores must increase: {} then {}", pair[0].tier, pair[1].tier));
            }
            if pair[0].color.eq_ignore_ascii_case(&pair[1].color) {
                return Err(format!("color {} is reused", pair[0].color));
            }
        }
        let mut colors: Vec<String> =
            self.bands.iter().map(|b| b.color.to_ascii_uppercase()).collect();
        colors.sort();
        colors.dedup();
        if colors.len() != self.bands.len() {
            return Err("tier colors must be distinct".into());
        }

        let (last, bounded) = self.bands.split_last().ok_or("risk scale is empty")?;
        if last.upper_bound.is_some() {
            return Err(format!("last band {} must be unbounded", last.tier));
        }
        let mut previous = f64::NEG_INFINITY;
        for band in bounded {
            let bound = band
                .upper_bound
                .ok_or_else(|| format!("band {} needs an upper bound", band.tier))?;
            if !bound.is_finite() || bound <= previous {
                return Err(format!("thresholds must strictly increase at {}", band.tier));
            }
            previous = bound;
        }
        Ok(())
    }

    /// Classify a count (or any non-negative value) into its tier.
    /// NaN is treated as zero.
    pub fn classify(&self, value: f64) -> RiskTier {
        let value = if value.is_nan() { 0.0 } else { value };
        self.bands
            .iter()
            .find(|b| b.upper_bound.map_or(true, |ub| value <= ub))
            .map(|b| b.tier)
            .unwrap_or(RiskTier::Critical)
    }

    pub fn classify_count(&self, count: u64) -> RiskTier {
        self.classify(count as f64)
    }

    pub fn rate_count(&self, count: u64) -> RiskRating {
        self.rating(self.classify_count(count))
    }

    pub fn rating(&self, tier: RiskTier) -> RiskRating {
        let band = self.band(tier);
        RiskRating {
            tier,
            score: band.score,
            color: band.color.clone(),
        }
    }

    pub fn score_of(&self, tier: RiskTier) -> u8 {
        self.band(tier).score
    }

    pub fn color_of(&self, tier: RiskTier) -> &str {
        &self.band(tier).color
    }

    /// Reverse lookup by exact score.
    pub fn tier_of_score(&self, score: u8) -> Option<RiskTier> {
        self.bands.iter().find(|b| b.score == score).map(|b| b.tier)
    }

    /// Reverse lookup by color (case-insensitive).
    pub fn tier_of_color(&self, color: &str) -> Option<RiskTier> {
        self.bands
            .iter()
            .find(|b| b.color.eq_ignore_ascii_case(color))
            .map(|b| b.tier)
    }

    /// Nearest tier to a continuous mean score by absolute difference.
    /// A score exactly halfway between two tiers resolves to the
    /// higher tier, so 1.5 is Medium Low and 5.5 is Critical.
    pub fn tier_for_score(&self, score: f64) -> RiskTier {
        if score.is_nan() {
            return self.bands[0].tier;
        }
        let mut best = &self.bands[0];
        let mut best_diff = (score - f64::from(best.score)).abs();
        for band in &self.bands[1..] {
            let diff = (score - f64::from(band.score)).abs();
            // Bands ascend by score, so `<=` hands ties to the higher tier.
            if diff <= best_diff {
                best = band;
                best_diff = diff;
            }
        }
        best.tier
    }

    pub fn color_for_score(&self, score: f64) -> &str {
        self.color_of(self.tier_for_score(score))
    }

    fn band(&self, tier: RiskTier) -> &TierBand {
        // validate() guarantees one band per tier in ALL order.
        &self.bands[tier as usize]
    }
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
