//! Joiner — builds the master record set.
//!
//! Steps, in order:
//!   1. Left join addresses onto entities by entity id (when both have it).
//!   2. Left join the program map onto the result by program code, after
//!      aliasing the map's code column to the entity program column.
//!   3. Rewrite the placeholder country to the configured unknown-country
//!      value. Absent countries stay absent.
//!
//! Unmatched left rows keep absent cells for the joined columns and are
//! counted in the JoinReport. Duplicate right-side keys fan out, one
//! output row per match.

use crate::{
    config::EngineConfig,
    error::SourceKind,
    table::{MasterTable, Table},
    types::Cell,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Public types ─────────────────────────────────────────────────────────────

/// Left rows that found no partner on the right side. Non-fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedJoinKey {
    pub source: SourceKind,
    pub key_column: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinReport {
    pub unresolved: Vec<UnresolvedJoinKey>,
    /// Sources that were present but skipped because a key column was missing.
    pub skipped: Vec<SourceKind>,
    pub countries_normalized: usize,
}

// ── Join ─────────────────────────────────────────────────────────────────────

pub fn join(
    entities: &Table,
    addresses: Option<&Table>,
    programs: Option<&Table>,
    config: &EngineConfig,
) -> (MasterTable, JoinReport) {
    let cols = &config.columns;
    let mut report = JoinReport::default();
    let mut joined = entities.clone();

    if let Some(addresses) = addresses {
        if joined.has_column(&cols.entity_id) && addresses.has_column(&cols.entity_id) {
            let (table, unmatched) =
                left_join(&joined, addresses, &cols.entity_id, &cols.entity_id, "address");
            joined = table;
            if unmatched > 0 {
                log::warn!("joiner: {unmatched} entity rows have no address");
                report.unresolved.push(UnresolvedJoinKey {
                    source: SourceKind::Addresses,
                    key_column: cols.entity_id.clone(),
                    rows: unmatched,
                });
            }
        } else {
            log::warn!("joiner: address join skipped, '{}' missing", cols.entity_id);
            report.skipped.push(SourceKind::Addresses);
        }
    }

    if let Some(programs) = programs {
        if joined.has_column(&cols.program) && programs.has_column(&cols.map_code) {
            let (table, unmatched) =
                left_join(&joined, programs, &cols.program, &cols.map_code, "program");
            joined = table;
            if unmatched > 0 {
                log::warn!("joiner: {unmatched} rows have no program description");
                report.unresolved.push(UnresolvedJoinKey {
                    source: SourceKind::Programs,
                    key_column: cols.program.clone(),
                    rows: unmatched,
                });
            }
        } else {
            log::warn!(
                "joiner: program join skipped, '{}' or '{}' missing",
                cols.program,
                cols.map_code
            );
            report.skipped.push(SourceKind::Programs);
        }
    }

    let (normalized, replaced) = normalize_countries(&joined, config);
    report.countries_normalized = replaced;

    let master = MasterTable::new(normalized, &cols.risk_score);
    log::info!(
        "joiner: master has {} rows, {} columns, score source {:?}",
        master.len(),
        master.table().headers().len(),
        master.score_source()
    );
    (master, report)
}

/// Relational left outer join. The right key column is dropped (it is
/// aliased to the left key); other right columns are appended, renamed
/// `<name>_<suffix>` on collision. Returns the joined table and the number
/// of left rows that found no match.
fn left_join(
    left: &Table,
    right: &Table,
    left_key: &str,
    right_key: &str,
    suffix: &str,
) -> (Table, usize) {
    let (Some(lk), Some(rk)) = (left.column_index(left_key), right.column_index(right_key)) else {
        return (left.clone(), 0);
    };

    let carried: Vec<usize> = (0..right.headers().len()).filter(|&i| i != rk).collect();
    let mut headers = left.headers().to_vec();
    for &i in &carried {
        let name = &right.headers()[i];
        if headers.contains(name) {
            headers.push(format!("{name}_{suffix}"));
        } else {
            headers.push(name.clone());
        }
    }

    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (r, row) in right.rows().iter().enumerate() {
        if let Some(key) = row[rk].as_deref() {
            index.entry(key).or_default().push(r);
        }
    }

    let mut out = Table::new(&left.name, headers);
    let mut unmatched = 0;
    for row in left.rows() {
        let matches = row[lk].as_deref().and_then(|k| index.get(k));
        match matches {
            Some(rows) => {
                for &r in rows {
                    let mut joined: Vec<Cell> = row.clone();
                    joined.extend(carried.iter().map(|&i| right.rows()[r][i].clone()));
                    out.push_row(joined);
                }
            }
            None => {
                unmatched += 1;
                out.push_row(row.clone());
            }
        }
    }
    (out, unmatched)
}

/// Rewrite the placeholder country to the unknown value. Absent cells are
/// left absent. Tables without a country column pass through untouched.
pub fn normalize_countries(table: &Table, config: &EngineConfig) -> (Table, usize) {
    let Some(ci) = table.column_index(&config.columns.country) else {
        return (table.clone(), 0);
    };
    let mut replaced = 0;
    let normalized = table.map_column(ci, |cell| match cell.as_deref().map(str::trim) {
        Some(v) if v == config.country_placeholder => {
            replaced += 1;
            Some(config.unknown_country.clone())
        }
        _ => cell.clone(),
    });
    if replaced > 0 {
        log::debug!(
            "joiner: replaced {replaced} '{}' countries with '{}'",
            config.country_placeholder,
            config.unknown_country
        );
    }
    (normalized, replaced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_duplicates_fan_out_and_misses_keep_left_row() {
        let left = Table::from_rows("l", &["k", "a"], &[vec!["1", "x"], vec!["2", "y"]]);
        let right = Table::from_rows("r", &["k", "b"], &[vec!["1", "p"], vec!["1", "q"]]);
        let (out, unmatched) = left_join(&left, &right, "k", "k", "r");
        assert_eq!(out.len(), 3);
        assert_eq!(unmatched, 1);
        assert_eq!(out.headers(), ["k", "a", "b"]);
        assert_eq!(out.value(2, 2), None);
    }

    #[test]
    fn colliding_columns_get_suffixed() {
        let left = Table::from_rows("l", &["k", "Remarks"], &[vec!["1", "l"]]);
        let right = Table::from_rows("r", &["k", "Remarks"], &[vec!["1", "r"]]);
        let (out, _) = left_join(&left, &right, "k", "k", "address");
        assert_eq!(out.headers(), ["k", "Remarks", "Remarks_address"]);
        assert_eq!(out.value(0, 2), Some("r"));
    }
}
