//! Report data — the executive data story and tier distribution.
//!
//! Everything here is derived from country metrics. Rendering to HTML or
//! PDF belongs to the report collaborator; `render_text` is only the
//! plain summary the runner prints.

use crate::{
    config::EngineConfig,
    country_metrics::{country_totals, CountryMetricsRecord},
    risk::{round_to, RiskTier, SCORE_DECIMALS},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryExposure {
    pub country: String,
    pub total_entities: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierCount {
    pub tier: RiskTier,
    pub countries: u64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataStory {
    pub generated_at: DateTime<Utc>,
    pub top_countries: Vec<CountryExposure>,
    pub total_entities: u64,
    pub individual_pct: f64,
    pub non_individual_pct: f64,
    /// Most common total rating and its share of countries (percent).
    pub dominant_tier: Option<RiskTier>,
    pub dominant_share: f64,
    /// Mean total-rating score across countries.
    pub avg_risk_score: Option<f64>,
}

impl DataStory {
    pub fn is_empty(&self) -> bool {
        self.top_countries.is_empty()
    }

    pub fn render_text(&self) -> Vec<String> {
        if self.is_empty() {
            return vec!["No data available to generate a data story.".into()];
        }
        let top = self
            .top_countries
            .iter()
            .map(|c| format!("{} ({})", c.country, c.total_entities))
            .collect::<Vec<_>>()
            .join(", ");
        let mut lines = vec![
            format!("Top countries by SDN exposure: {top}"),
            format!("Total distinct entities in view: {}", self.total_entities),
            format!(
                "Entity mix: Individuals {:.1}% | Non-Individuals {:.1}%",
                self.individual_pct, self.non_individual_pct
            ),
        ];
        if let Some(tier) = self.dominant_tier {
            lines.push(format!(
                "Dominant risk tier: {tier} (~{:.1}% of countries)",
                self.dominant_share
            ));
        }
        if let Some(avg) = self.avg_risk_score {
            lines.push(format!("Average risk score: {avg:.2}"));
        }
        lines
    }
}

pub fn build_data_story(metrics: &[CountryMetricsRecord], config: &EngineConfig) -> DataStory {
    let generated_at = Utc::now();
    if metrics.is_empty() {
        return DataStory {
            generated_at,
            top_countries: Vec::new(),
            total_entities: 0,
            individual_pct: 0.0,
            non_individual_pct: 0.0,
            dominant_tier: None,
            dominant_share: 0.0,
            avg_risk_score: None,
        };
    }

    let top_countries = country_totals(metrics)
        .into_iter()
        .take(config.story_top_countries)
        .map(|m| CountryExposure {
            country: m.country,
            total_entities: m.total_entities,
        })
        .collect();

    let total: u64 = metrics.iter().map(|m| m.total_entities).sum();
    let individuals: u64 = metrics.iter().map(|m| m.individual_entities).sum();
    let non_individuals: u64 = metrics.iter().map(|m| m.non_individual_entities).sum();
    let pct = |part: u64| {
        if total > 0 {
            round_to(part as f64 / total as f64 * 100.0, 1)
        } else {
            0.0
        }
    };

    let distribution = tier_distribution(metrics, config);
    // Highest count wins; on a tie the lower tier is reported.
    let dominant = distribution
        .iter()
        .filter(|t| t.countries > 0)
        .fold(None::<&TierCount>, |best, t| match best {
            Some(b) if b.countries >= t.countries => Some(b),
            _ => Some(t),
        });

    let score_sum: f64 = metrics.iter().map(|m| f64::from(m.total_score)).sum();

    DataStory {
        generated_at,
        top_countries,
        total_entities: total,
        individual_pct: pct(individuals),
        non_individual_pct: pct(non_individuals),
        dominant_tier: dominant.map(|t| t.tier),
        dominant_share: dominant
            .map(|t| round_to(t.countries as f64 / metrics.len() as f64 * 100.0, 1))
            .unwrap_or(0.0),
        avg_risk_score: Some(round_to(score_sum / metrics.len() as f64, SCORE_DECIMALS)),
    }
}

/// Countries per total-rating tier, all six tiers present, lowest first.
pub fn tier_distribution(
    metrics: &[CountryMetricsRecord],
    config: &EngineConfig,
) -> Vec<TierCount> {
    RiskTier::ALL
        .iter()
        .map(|&tier| TierCount {
            tier,
            countries: metrics.iter().filter(|m| m.total_rating == tier).count() as u64,
            color: config.risk_scale.color_of(tier).to_string(),
        })
        .collect()
}
