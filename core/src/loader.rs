//! Dataset loader — reads the three CSV sources into tables.
//!
//! The upstream sanctions list is not guaranteed to be UTF-8 clean.
//! Bytes that fail UTF-8 validation are decoded as Windows-1252, which
//! never fails, so odd bytes degrade to odd characters rather than errors.
//!
//! Only the entity source is required. A missing or unreadable address or
//! program map is logged and skipped; the Joiner then passes the entity
//! rows through without that join.

use crate::{
    config::EngineConfig,
    error::{EngineError, EngineResult, SourceKind},
    table::{non_empty, Table},
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::Path;

// ── Public types ─────────────────────────────────────────────────────────────

/// A shape problem found while loading. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoadDiagnostic {
    /// An expected column is not in the header row.
    MissingColumn { column: String },
    /// A record's field count differs from the header. Short rows are
    /// padded with absent cells; extra fields are dropped.
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub kind: SourceKind,
    pub table: Table,
    pub diagnostics: Vec<LoadDiagnostic>,
    /// True when the bytes were not valid UTF-8 and were decoded as
    /// Windows-1252.
    pub decoded_legacy: bool,
}

/// File locations for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePaths {
    pub entities: Option<String>,
    pub addresses: Option<String>,
    pub programs: Option<String>,
}

// ── Loading ──────────────────────────────────────────────────────────────────

/// Columns each source is expected to carry.
pub fn expected_columns(kind: SourceKind, config: &EngineConfig) -> Vec<&str> {
    let c = &config.columns;
    match kind {
        SourceKind::Entities => vec![
            c.entity_id.as_str(),
            c.entity_type.as_str(),
            c.program.as_str(),
        ],
        // The SDN export carries jurisdictions on the address file.
        SourceKind::Addresses => vec![c.entity_id.as_str(), c.country.as_str()],
        SourceKind::Programs => vec![c.map_code.as_str(), c.map_description.as_str()],
    }
}

/// Read and parse one source file. Any read or parse failure is a
/// MissingRequiredSource; callers decide whether that is fatal.
pub fn load_source(
    path: &str,
    kind: SourceKind,
    config: &EngineConfig,
) -> EngineResult<LoadedSource> {
    let missing = |reason: String| EngineError::MissingRequiredSource {
        kind,
        path: path.to_string(),
        reason,
    };
    if !Path::new(path).is_file() {
        return Err(missing("file not found".into()));
    }
    let bytes = std::fs::read(path).map_err(|e| missing(e.to_string()))?;
    let loaded = parse_source(&bytes, kind, config).map_err(|e| match e {
        EngineError::MissingRequiredSource { reason, .. } => missing(reason),
        other => missing(other.to_string()),
    })?;
    log::info!(
        "loader: {kind} '{path}' -> {} rows, {} columns{}",
        loaded.table.len(),
        loaded.table.headers().len(),
        if loaded.decoded_legacy { " (windows-1252)" } else { "" }
    );
    Ok(loaded)
}

/// Load a non-primary source. Absence or failure yields `None`.
pub fn load_optional(
    path: Option<&str>,
    kind: SourceKind,
    config: &EngineConfig,
) -> Option<LoadedSource> {
    let path = path?;
    match load_source(path, kind, config) {
        Ok(loaded) => Some(loaded),
        Err(e) => {
            log::warn!("loader: skipping {kind} source: {e}");
            None
        }
    }
}

/// Parse CSV bytes already in memory.
pub fn parse_source(
    bytes: &[u8],
    kind: SourceKind,
    config: &EngineConfig,
) -> EngineResult<LoadedSource> {
    let (text, decoded_legacy) = decode_text(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(EngineError::MissingRequiredSource {
            kind,
            path: String::new(),
            reason: "no header row".into(),
        });
    }

    let mut table = Table::new(kind.name(), headers);
    let mut diagnostics: Vec<LoadDiagnostic> = expected_columns(kind, config)
        .into_iter()
        .filter(|col| !table.has_column(col))
        .map(|col| LoadDiagnostic::MissingColumn {
            column: col.to_string(),
        })
        .collect();

    let width = table.headers().len();
    for record in reader.records() {
        let record = record?;
        if record.len() != width {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            diagnostics.push(LoadDiagnostic::RaggedRow {
                line,
                expected: width,
                found: record.len(),
            });
        }
        table.push_row(record.iter().map(non_empty).collect());
    }

    for d in &diagnostics {
        log::warn!("loader: {kind}: {d:?}");
    }

    Ok(LoadedSource {
        kind,
        table,
        diagnostics,
        decoded_legacy,
    })
}

/// UTF-8 when valid (BOM stripped), otherwise Windows-1252.
pub fn decode_text(bytes: &[u8]) -> (Cow<'_, str>, bool) {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => (Cow::Borrowed(s), false),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            (decoded, true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_bytes_do_not_fail() {
        let bytes = b"ent_num,SDN_Type,Sanctions Program,SDN_Name\n1,individual,SDGT,Jos\xe9\n";
        let loaded = parse_source(bytes, SourceKind::Entities, &EngineConfig::default()).unwrap();
        assert!(loaded.decoded_legacy);
        assert_eq!(loaded.table.value(0, 3), Some("José"));
    }

    #[test]
    fn bom_is_stripped_from_first_header() {
        let bytes = b"\xEF\xBB\xBFent_num,Address,Country\n1,Main St,Cuba\n";
        let loaded = parse_source(bytes, SourceKind::Addresses, &EngineConfig::default()).unwrap();
        assert_eq!(loaded.table.headers()[0], "ent_num");
        assert!(loaded.diagnostics.is_empty());
    }

    #[test]
    fn ragged_rows_are_reported_not_truncated_silently() {
        let bytes = b"ent_num,SDN_Type,Sanctions Program\n1,individual\n2,entity,IRAN,extra\n";
        let loaded = parse_source(bytes, SourceKind::Entities, &EngineConfig::default()).unwrap();
        assert_eq!(loaded.table.len(), 2);
        assert_eq!(
            loaded.diagnostics,
            vec![
                LoadDiagnostic::RaggedRow { line: 2, expected: 3, found: 2 },
                LoadDiagnostic::RaggedRow { line: 3, expected: 3, found: 4 },
            ]
        );
        assert_eq!(loaded.table.value(0, 2), None);
    }

    #[test]
    fn missing_expected_columns_are_reported() {
        let bytes = b"ent_num,Name\n1,X\n";
        let loaded = parse_source(bytes, SourceKind::Entities, &EngineConfig::default()).unwrap();
        assert!(loaded.diagnostics.contains(&LoadDiagnostic::MissingColumn {
            column: "SDN_Type".into()
        }));
    }

    #[test]
    fn empty_input_has_no_header() {
        let err = parse_source(b"", SourceKind::Entities, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::MissingRequiredSource { .. }));
    }
}
