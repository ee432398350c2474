//! In-memory tables — the loaded sources and the joined master set.
//!
//! RULE: Tables are values. Every transformation returns a new table;
//! consumers never mutate a table they were handed.

use crate::{
    error::{EngineError, EngineResult},
    types::Cell,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A header row plus string cells. Rows always have exactly
/// `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: &str, headers: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a table from string literals. Empty strings become absent
    /// cells, as they do when loading from a file.
    pub fn from_rows(name: &str, headers: &[&str], rows: &[Vec<&str>]) -> Self {
        let mut table = Self::new(name, headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            table.push_row(row.iter().map(|v| non_empty(v)).collect());
        }
        table
    }

    /// Append a row, padding or truncating to the header width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.headers.len(), None);
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Column index, or a SchemaViolation naming the missing column.
    pub fn require_column(&self, column: &str) -> EngineResult<usize> {
        self.column_index(column)
            .ok_or_else(|| EngineError::schema(&self.name, column))
    }

    /// Cell value at (row, column) as a string slice.
    pub fn value(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|c| c.as_deref())
    }

    /// Keep only rows for which `keep` returns true.
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[Cell]) -> bool,
    {
        Table {
            name: self.name.clone(),
            headers: self.headers.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Apply `f` to every cell of one column.
    pub fn map_column<F>(&self, column: usize, mut f: F) -> Table
    where
        F: FnMut(&Cell) -> Cell,
    {
        let mut out = self.clone();
        for row in &mut out.rows {
            row[column] = f(&row[column]);
        }
        out
    }

    /// SHA-256 over headers and cells. Equal content gives equal digests,
    /// regardless of the table name.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for header in &self.headers {
            hasher.update(header.as_bytes());
            hasher.update([0x1f]);
        }
        hasher.update([0x1e]);
        for row in &self.rows {
            for cell in row {
                match cell {
                    Some(v) => {
                        hasher.update([0x01]);
                        hasher.update(v.as_bytes());
                    }
                    None => hasher.update([0x00]),
                }
                hasher.update([0x1f]);
            }
            hasher.update([0x1e]);
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Trimmed value, or `None` for an empty / whitespace-only cell.
pub fn non_empty(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// How the program pivot obtains its per-group risk score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreSource {
    /// Rows carry a precomputed risk score in this column; groups average it.
    Precomputed { column: String },
    /// No per-row score; each group is scored from its own entity count.
    CountDerived,
}

/// The joined, normalized record set every aggregation reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterTable {
    table: Table,
    score_source: ScoreSource,
}

impl MasterTable {
    /// Wrap an already-joined table. The score source is detected once,
    /// here, from the configured risk-score column.
    pub fn new(mut table: Table, risk_score_column: &str) -> Self {
        table.name = "master".into();
        let score_source = if table.has_column(risk_score_column) {
            ScoreSource::Precomputed {
                column: risk_score_column.to_string(),
            }
        } else {
            ScoreSource::CountDerived
        };
        Self { table, score_source }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn score_source(&self) -> &ScoreSource {
        &self.score_source
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// A narrowed view with the same schema and score source.
    pub fn with_rows<F>(&self, keep: F) -> MasterTable
    where
        F: FnMut(&[Cell]) -> bool,
    {
        MasterTable {
            table: self.table.filter_rows(keep),
            score_source: self.score_source.clone(),
        }
    }

    pub fn content_hash(&self) -> String {
        self.table.content_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cells_become_absent() {
        let t = Table::from_rows("t", &["a", "b"], &[vec!["x", "  "]]);
        assert_eq!(t.value(0, 0), Some("x"));
        assert_eq!(t.value(0, 1), None);
    }

    #[test]
    fn short_rows_are_padded() {
        let mut t = Table::new("t", vec!["a".into(), "b".into(), "c".into()]);
        t.push_row(vec![Some("1".into())]);
        assert_eq!(t.rows()[0].len(), 3);
    }

    #[test]
    fn hash_ignores_name_but_not_content() {
        let a = Table::from_rows("a", &["k"], &[vec!["1"]]);
        let b = Table::from_rows("b", &["k"], &[vec!["1"]]);
        let c = Table::from_rows("a", &["k"], &[vec!["2"]]);
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn score_source_detected_from_column() {
        let with = MasterTable::new(Table::from_rows("m", &["Risk_Score"], &[]), "Risk_Score");
        let without = MasterTable::new(Table::from_rows("m", &["x"], &[]), "Risk_Score");
        assert!(matches!(with.score_source(), ScoreSource::Precomputed { .. }));
        assert_eq!(without.score_source(), &ScoreSource::CountDerived);
    }
}
