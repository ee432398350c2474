//! Top-N / filter layer — deterministic subsetting of output tables.
//!
//! RULES:
//!   - An empty selection means "no filter", never "exclude everything".
//!   - Ranking is a stable descending sort, so ties keep input order.
//!   - When a user selection and a top-N list disagree completely, the
//!     user's explicit choice wins.

use crate::{
    config::EngineConfig,
    country_metrics::CountryMetricsRecord,
    program_pivot::{ProgramPivotRecord, ProgramTotal},
    table::MasterTable,
    types::Cell,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Country,
    Program,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    TotalEntities,
    IndividualEntities,
    NonIndividualEntities,
    AvgRiskScore,
}

/// A row that can be filtered on a dimension and ranked on a metric.
pub trait Rankable {
    /// Value of `dimension`, or `None` if the row has no such dimension.
    fn dimension(&self, dimension: Dimension) -> Option<&str>;

    /// Value of `metric`; rows without the metric rank as zero.
    fn metric(&self, metric: RankMetric) -> f64;
}

impl Rankable for CountryMetricsRecord {
    fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Country => Some(&self.country),
            Dimension::Program => None,
        }
    }

    fn metric(&self, metric: RankMetric) -> f64 {
        match metric {
            RankMetric::TotalEntities => self.total_entities as f64,
            RankMetric::IndividualEntities => self.individual_entities as f64,
            RankMetric::NonIndividualEntities => self.non_individual_entities as f64,
            RankMetric::AvgRiskScore => f64::from(self.total_score),
        }
    }
}

impl Rankable for ProgramPivotRecord {
    fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Country => Some(&self.country),
            Dimension::Program => Some(&self.program),
        }
    }

    fn metric(&self, metric: RankMetric) -> f64 {
        match metric {
            RankMetric::AvgRiskScore => self.avg_risk_score,
            _ => self.entity_count as f64,
        }
    }
}

impl Rankable for ProgramTotal {
    fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Program => Some(&self.program),
            Dimension::Country => None,
        }
    }

    fn metric(&self, _metric: RankMetric) -> f64 {
        self.total_entities as f64
    }
}

/// Filter on `dimension` by `selected` (empty = pass-through), rank by
/// `metric` descending, and keep the first `top_n` rows (`None` = all).
///
/// Rows lacking the dimension are dropped only when a filter is active.
pub fn filter_and_rank<T>(
    rows: &[T],
    dimension: Dimension,
    selected: &[String],
    metric: RankMetric,
    top_n: Option<usize>,
) -> Vec<T>
where
    T: Rankable + Clone,
{
    let wanted: HashSet<&str> = selected.iter().map(String::as_str).collect();
    let mut out: Vec<T> = rows
        .iter()
        .filter(|r| wanted.is_empty() || r.dimension(dimension).is_some_and(|v| wanted.contains(v)))
        .cloned()
        .collect();
    out.sort_by(|a, b| b.metric(metric).total_cmp(&a.metric(metric)));
    if let Some(n) = top_n {
        out.truncate(n);
    }
    out
}

/// Dimension values of the first `n` rows after ranking, first-seen order,
/// without duplicates.
pub fn top_values<T>(rows: &[T], dimension: Dimension, metric: RankMetric, n: usize) -> Vec<String>
where
    T: Rankable + Clone,
{
    let mut seen = HashSet::new();
    filter_and_rank(rows, dimension, &[], metric, Some(n))
        .iter()
        .filter_map(|r| r.dimension(dimension).map(str::to_string))
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Combine a user selection with a top-N list for the same dimension.
///
///   - no user selection        → the top-N list
///   - intersection non-empty   → the intersection, in user order
///   - intersection empty       → the user selection
pub fn compose_selection(user: &[String], top: &[String]) -> Vec<String> {
    if user.is_empty() {
        return top.to_vec();
    }
    let top: HashSet<&str> = top.iter().map(String::as_str).collect();
    let intersection: Vec<String> = user
        .iter()
        .filter(|u| top.contains(u.as_str()))
        .cloned()
        .collect();
    if intersection.is_empty() {
        user.to_vec()
    } else {
        intersection
    }
}

/// Restrict the master table to the given countries and programs. An empty
/// list leaves that dimension unfiltered; a missing column is not filtered.
pub fn narrow_master(
    master: &MasterTable,
    countries: &[String],
    programs: &[String],
    config: &EngineConfig,
) -> MasterTable {
    let table = master.table();
    let country_col = table.column_index(&config.columns.country);
    let program_col = table.column_index(&config.columns.program);
    let countries: HashSet<&str> = countries.iter().map(String::as_str).collect();
    let programs: HashSet<&str> = programs.iter().map(String::as_str).collect();

    master.with_rows(|row| {
        keeps(country_col, &countries, row) && keeps(program_col, &programs, row)
    })
}

fn keeps(column: Option<usize>, selected: &HashSet<&str>, row: &[Cell]) -> bool {
    match column {
        Some(c) if !selected.is_empty() => row[c].as_deref().is_some_and(|v| selected.contains(v)),
        _ => true,
    }
}
