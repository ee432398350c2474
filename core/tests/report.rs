//! Data story and tier distribution.

use sanctions_risk_core::{
    config::EngineConfig,
    country_metrics::CountryMetricsRecord,
    report::{build_data_story, tier_distribution},
    risk::{RiskScale, RiskTier},
};

fn record(country: &str, individuals: u64, non_individuals: u64) -> CountryMetricsRecord {
    let scale = RiskScale::default();
    CountryMetricsRecord::from_counts(country.into(), individuals, non_individuals, &scale)
}

fn sample() -> Vec<CountryMetricsRecord> {
    vec![record("Cuba", 10, 5), record("Russia", 600, 900), record("Yemen", 5, 10)]
}

/// Top countries, mix, dominant tier and average score.
#[test]
fn story_summarizes_visible_metrics() {
    let config = EngineConfig::default();
    let story = build_data_story(&sample(), &config);

    let top: Vec<&str> = story.top_countries.iter().map(|c| c.country.as_str()).collect();
    assert_eq!(top, vec!["Russia", "Cuba", "Yemen"]);
    assert_eq!(story.total_entities, 1_530);
    assert_eq!(story.individual_pct, 40.2);
    assert_eq!(story.non_individual_pct, 59.8);
    assert_eq!(story.dominant_tier, Some(RiskTier::Low));
    assert_eq!(story.dominant_share, 66.7);
    assert_eq!(story.avg_risk_score, Some(2.67));

    let text = story.render_text();
    assert!(text[0].starts_with("Top countries by SDN exposure: Russia (1530)"));
}

/// The story lists at most the configured number of countries.
#[test]
fn story_respects_top_country_limit() {
    let config = EngineConfig {
        story_top_countries: 1,
        ..EngineConfig::default()
    };
    let story = build_data_story(&sample(), &config);
    assert_eq!(story.top_countries.len(), 1);
    assert_eq!(story.top_countries[0].country, "Russia");
}

/// A tie for the most common tier reports the lower tier.
#[test]
fn dominant_tier_tie_goes_low() {
    let metrics = [record("Russia", 600, 900), record("Cuba", 1, 1)];
    let story = build_data_story(&metrics, &EngineConfig::default());
    assert_eq!(story.dominant_tier, Some(RiskTier::Low));
    assert_eq!(story.dominant_share, 50.0);
}

/// No metrics, no story.
#[test]
fn empty_story() {
    let story = build_data_story(&[], &EngineConfig::default());
    assert!(story.is_empty());
    assert_eq!(story.avg_risk_score, None);
    assert_eq!(
        story.render_text(),
        vec!["No data available to generate a data story.".to_string()]
    );
}

/// All six tiers appear, lowest first, with their colors.
#[test]
fn distribution_covers_every_tier() {
    let distribution = tier_distribution(&sample(), &EngineConfig::default());
    let tiers: Vec<RiskTier> = distribution.iter().map(|t| t.tier).collect();
    assert_eq!(tiers, RiskTier::ALL.to_vec());
    assert_eq!(distribution[0].countries, 2);
    assert_eq!(distribution[5].countries, 1);
    assert_eq!(distribution[5].color, "#800080");
    assert_eq!(distribution.iter().map(|t| t.countries).sum::<u64>(), 3);
}
