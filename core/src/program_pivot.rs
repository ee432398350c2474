//! Program pivot — country × program cells with a mean risk score.
//!
//! Cells come from grouping existing rows, never from a cross-product, so
//! an empty (country, program) pair cannot appear.
//!
//! The score path is chosen by the master table's ScoreSource:
//!   - Precomputed:  mean of the per-row scores in the cell
//!   - CountDerived: the tier score of the cell's own distinct count
//! Either way the cell gets a numeric avg_risk_score rounded to
//! SCORE_DECIMALS, plus the nearest tier and its color.

use crate::{
    config::EngineConfig,
    error::EngineResult,
    risk::{round_to, RiskTier, SCORE_DECIMALS},
    rng::SampleStream,
    table::{MasterTable, ScoreSource},
    types::{Country, ProgramCode},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramPivotRecord {
    #[serde(rename = "Country")]
    pub country: Country,
    #[serde(rename = "Sanctions Program")]
    pub program: ProgramCode,
    #[serde(rename = "SDN_Count")]
    pub entity_count: u64,
    #[serde(rename = "Avg_Risk_Score")]
    pub avg_risk_score: f64,
    #[serde(rename = "Risk_Level")]
    pub risk_level: RiskTier,
    #[serde(rename = "Risk_Color")]
    pub risk_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramTotal {
    #[serde(rename = "Sanctions Program")]
    pub program: ProgramCode,
    #[serde(rename = "Total Distinct Entities")]
    pub total_entities: u64,
}

#[derive(Default)]
struct PivotCell<'a> {
    ids: HashSet<&'a str>,
    score_sum: f64,
    score_rows: usize,
}

pub fn compute_program_pivot(
    master: &MasterTable,
    config: &EngineConfig,
) -> EngineResult<Vec<ProgramPivotRecord>> {
    let cols = &config.columns;
    let scale = &config.risk_scale;
    let table = master.table();
    let id_col = table.require_column(&cols.entity_id)?;
    let country_col = table.require_column(&cols.country)?;
    let program_col = table.require_column(&cols.program)?;
    let score_col = match master.score_source() {
        ScoreSource::Precomputed { column } => Some(table.require_column(column)?),
        ScoreSource::CountDerived => None,
    };

    let mut cells: BTreeMap<(&str, &str), PivotCell> = BTreeMap::new();
    let mut without_program = 0usize;
    let mut without_country = 0usize;
    for row in table.rows() {
        let Some(program) = row[program_col].as_deref() else {
            without_program += 1;
            continue;
        };
        let Some(id) = row[id_col].as_deref() else {
            continue;
        };
        let Some(country) = row[country_col].as_deref() else {
            without_country += 1;
            continue;
        };
        let cell = cells.entry((country, program)).or_default();
        cell.ids.insert(id);
        if let Some(sc) = score_col {
            if let Some(score) = row[sc].as_deref().and_then(|v| v.trim().parse::<f64>().ok()) {
                if score.is_finite() {
                    cell.score_sum += score;
                    cell.score_rows += 1;
                }
            }
        }
    }
    if without_program > 0 {
        log::debug!("program_pivot: {without_program} rows without '{}' left out", cols.program);
    }
    if without_country > 0 {
        log::debug!("program_pivot: {without_country} rows without '{}' left out", cols.country);
    }

    let mut pivot: Vec<ProgramPivotRecord> = cells
        .into_iter()
        .map(|((country, program), cell)| {
            let entity_count = cell.ids.len() as u64;
            let raw_score = if cell.score_rows > 0 {
                cell.score_sum / cell.score_rows as f64
            } else {
                // Count-derived path, also the fallback for cells whose
                // precomputed scores are all absent.
                f64::from(scale.score_of(scale.classify_count(entity_count)))
            };
            let avg_risk_score = round_to(raw_score, SCORE_DECIMALS);
            let risk_level = scale.tier_for_score(avg_risk_score);
            ProgramPivotRecord {
                country: country.to_string(),
                program: program.to_string(),
                entity_count,
                avg_risk_score,
                risk_level,
                risk_color: scale.color_of(risk_level).to_string(),
            }
        })
        .collect();

    if let Some(cap) = config.pivot_row_cap {
        if pivot.len() > cap {
            let keep = SampleStream::ProgramPivot
                .rng(config.sample_seed)
                .sample_indices(pivot.len(), cap);
            log::info!("program_pivot: {} cells down-sampled to {cap}", pivot.len());
            let sampled: Vec<ProgramPivotRecord> =
                keep.into_iter().map(|i| pivot[i].clone()).collect();
            pivot = sampled;
        }
    }

    log::info!("program_pivot: {} cells", pivot.len());
    Ok(pivot)
}

/// Distinct entities per program, largest first. Ties are ordered by
/// program code.
pub fn program_totals(
    master: &MasterTable,
    config: &EngineConfig,
) -> EngineResult<Vec<ProgramTotal>> {
    let table = master.table();
    let id_col = table.require_column(&config.columns.entity_id)?;
    let program_col = table.require_column(&config.columns.program)?;

    let mut by_program: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    for row in table.rows() {
        if let (Some(program), Some(id)) = (row[program_col].as_deref(), row[id_col].as_deref()) {
            by_program.entry(program).or_default().insert(id);
        }
    }

    let mut totals: Vec<ProgramTotal> = by_program
        .into_iter()
        .map(|(program, ids)| ProgramTotal {
            program: program.to_string(),
            total_entities: ids.len() as u64,
        })
        .collect();
    totals.sort_by(|a, b| b.total_entities.cmp(&a.total_entities));
    Ok(totals)
}
