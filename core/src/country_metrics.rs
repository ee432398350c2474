//! Country metrics — distinct entity counts per jurisdiction, rated.
//!
//! One row per country observed in the master table. Counts are distinct
//! entity ids, never row counts. Within a country each entity is typed by
//! its first row in master order, so individuals + non-individuals always
//! equals the total.
//!
//! Rows without a country are left out; the placeholder country has
//! already been rewritten to the unknown jurisdiction by the Joiner.
//! Rows are ordered by country name with the unknown jurisdiction last.

use crate::{
    config::EngineConfig,
    error::EngineResult,
    risk::{RiskScale, RiskTier},
    table::MasterTable,
    types::Country,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryMetricsRecord {
    #[serde(rename = "Country")]
    pub country: Country,
    #[serde(rename = "Total Distinct Entities")]
    pub total_entities: u64,
    #[serde(rename = "Distinct Individuals")]
    pub individual_entities: u64,
    #[serde(rename = "Distinct Non-Individuals")]
    pub non_individual_entities: u64,

    #[serde(rename = "Rating - Personal & Non-Personal")]
    pub total_rating: RiskTier,
    #[serde(rename = "Rating - Personal & Non-Personal Score")]
    pub total_score: u8,
    #[serde(rename = "Rating - Personal & Non-Personal Color")]
    pub total_color: String,

    #[serde(rename = "Rating - Personal")]
    pub individual_rating: RiskTier,
    #[serde(rename = "Rating - Personal Score")]
    pub individual_score: u8,
    #[serde(rename = "Rating - Personal Color")]
    pub individual_color: String,

    #[serde(rename = "Rating - Non-Personal")]
    pub non_individual_rating: RiskTier,
    #[serde(rename = "Rating - Non-Personal Score")]
    pub non_individual_score: u8,
    #[serde(rename = "Rating - Non-Personal Color")]
    pub non_individual_color: String,
}

impl CountryMetricsRecord {
    /// Build a record from its three counts; every rating is derived here
    /// and nowhere else.
    pub fn from_counts(
        country: Country,
        individuals: u64,
        non_individuals: u64,
        scale: &RiskScale,
    ) -> Self {
        let total = individuals + non_individuals;
        let t = scale.rate_count(total);
        let i = scale.rate_count(individuals);
        let n = scale.rate_count(non_individuals);
        Self {
            country,
            total_entities: total,
            individual_entities: individuals,
            non_individual_entities: non_individuals,
            total_rating: t.tier,
            total_score: t.score,
            total_color: t.color,
            individual_rating: i.tier,
            individual_score: i.score,
            individual_color: i.color,
            non_individual_rating: n.tier,
            non_individual_score: n.score,
            non_individual_color: n.color,
        }
    }
}

/// Group the master table by country and count distinct entities.
pub fn compute_country_metrics(
    master: &MasterTable,
    config: &EngineConfig,
) -> EngineResult<Vec<CountryMetricsRecord>> {
    let cols = &config.columns;
    let table = master.table();
    let id_col = table.require_column(&cols.entity_id)?;
    let type_col = table.require_column(&cols.entity_type)?;
    let country_col = table.require_column(&cols.country)?;

    // country -> entity id -> is_individual (first row wins)
    let mut groups: BTreeMap<&str, HashMap<&str, bool>> = BTreeMap::new();
    let mut skipped = 0usize;
    let mut without_country = 0usize;
    for row in table.rows() {
        let Some(id) = row[id_col].as_deref() else {
            skipped += 1;
            continue;
        };
        let Some(country) = row[country_col].as_deref() else {
            without_country += 1;
            continue;
        };
        let is_individual = row[type_col]
            .as_deref()
            .map(|t| t.trim().eq_ignore_ascii_case(&cols.individual_type))
            .unwrap_or(false);
        groups.entry(country).or_default().entry(id).or_insert(is_individual);
    }
    if skipped > 0 {
        log::warn!("country_metrics: {skipped} rows without '{}' ignored", cols.entity_id);
    }
    if without_country > 0 {
        log::warn!("country_metrics: {without_country} rows without '{}' ignored", cols.country);
    }

    let mut metrics: Vec<CountryMetricsRecord> = groups
        .into_iter()
        .map(|(country, entities)| {
            let individuals = entities.values().filter(|&&ind| ind).count() as u64;
            let non_individuals = entities.len() as u64 - individuals;
            CountryMetricsRecord::from_counts(
                country.to_string(),
                individuals,
                non_individuals,
                &config.risk_scale,
            )
        })
        .collect();

    // BTreeMap order is alphabetical; move the unknown jurisdiction last.
    if let Some(pos) = metrics.iter().position(|m| m.country == config.unknown_country) {
        let unknown = metrics.remove(pos);
        metrics.push(unknown);
    }

    log::info!("country_metrics: {} countries", metrics.len());
    Ok(metrics)
}

/// Country metrics sorted by total distinct entities, descending.
/// Ties keep their existing order.
pub fn country_totals(metrics: &[CountryMetricsRecord]) -> Vec<CountryMetricsRecord> {
    let mut sorted = metrics.to_vec();
    sorted.sort_by(|a, b| b.total_entities.cmp(&a.total_entities));
    sorted
}
