//! KPI / KRI summary — pure reductions over the country metrics.
//!
//! An empty metrics table yields zero-valued indicators, never an error.

use crate::{
    country_metrics::CountryMetricsRecord,
    risk::{round_to, RiskTier},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Kpi,
    Kri,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    Count(u64),
    /// Percentage in [0, 100], one decimal.
    Percent(f64),
}

impl fmt::Display for IndicatorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Percent(p) => write!(f, "{p:.1}%"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub kind: IndicatorKind,
    pub value: IndicatorValue,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    /// Sum of per-country totals.
    pub total_entities: u64,
    /// Largest single-country total.
    pub top_concentration: u64,
    /// Countries whose total is rated Critical.
    pub critical_jurisdictions: u64,
    /// Non-individual share of `total_entities`, percent, one decimal.
    pub non_individual_ratio: f64,
}

pub const TOTAL_ENTITIES: &str = "Total Distinct Entities";
pub const TOP_CONCENTRATION: &str = "Top SDN Concentration";
pub const CRITICAL_JURISDICTIONS: &str = "Critical Risk Jurisdictions";
pub const NON_INDIVIDUAL_RATIO: &str = "Non-Individual Entity Ratio";

impl KpiSummary {
    pub fn compute(metrics: &[CountryMetricsRecord]) -> Self {
        let total_entities: u64 = metrics.iter().map(|m| m.total_entities).sum();
        let non_individuals: u64 = metrics.iter().map(|m| m.non_individual_entities).sum();
        let top_concentration = metrics.iter().map(|m| m.total_entities).max().unwrap_or(0);
        let critical_jurisdictions = metrics
            .iter()
            .filter(|m| m.total_rating == RiskTier::Critical)
            .count() as u64;
        let non_individual_ratio = if total_entities > 0 {
            round_to(non_individuals as f64 / total_entities as f64 * 100.0, 1)
        } else {
            0.0
        };
        Self {
            total_entities,
            top_concentration,
            critical_jurisdictions,
            non_individual_ratio,
        }
    }

    /// Named indicators with their descriptions, keyed by display name.
    pub fn indicators(&self) -> BTreeMap<String, Indicator> {
        let entry = |kind, value, description: &str| Indicator {
            kind,
            value,
            description: description.to_string(),
        };
        BTreeMap::from([
            (
                TOTAL_ENTITIES.to_string(),
                entry(
                    IndicatorKind::Kpi,
                    IndicatorValue::Count(self.total_entities),
                    "Unique sanctioned entities across all jurisdictions.",
                ),
            ),
            (
                TOP_CONCENTRATION.to_string(),
                entry(
                    IndicatorKind::Kpi,
                    IndicatorValue::Count(self.top_concentration),
                    "Highest country SDN count.",
                ),
            ),
            (
                CRITICAL_JURISDICTIONS.to_string(),
                entry(
                    IndicatorKind::Kri,
                    IndicatorValue::Count(self.critical_jurisdictions),
                    "Countries flagged as Critical.",
                ),
            ),
            (
                NON_INDIVIDUAL_RATIO.to_string(),
                entry(
                    IndicatorKind::Kri,
                    IndicatorValue::Percent(self.non_individual_ratio),
                    "Proportion of non-individual SDNs.",
                ),
            ),
        ])
    }
}
