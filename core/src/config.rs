use crate::{
    error::{EngineError, EngineResult},
    risk::RiskScale,
};
use serde::{Deserialize, Serialize};

/// Column names of the three input sources.
///
/// Defaults match the OFAC SDN CSV exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Join key shared by the entity and address sources.
    pub entity_id: String,
    pub entity_type: String,
    pub country: String,
    /// Program code on the entity source.
    pub program: String,
    /// Program code column on the program map, aliased to `program`
    /// before joining.
    pub map_code: String,
    pub map_description: String,
    /// Optional per-row precomputed risk score.
    pub risk_score: String,
    /// Value of `entity_type` that marks an individual (case-insensitive).
    pub individual_type: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            entity_id: "ent_num".into(),
            entity_type: "SDN_Type".into(),
            country: "Country".into(),
            program: "Sanctions Program".into(),
            map_code: "Sanction codes".into(),
            map_description: "Active Sanctions Programs".into(),
            risk_score: "Risk_Score".into(),
            individual_type: "individual".into(),
        }
    }
}

/// Engine configuration, passed explicitly into every component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub columns: ColumnConfig,
    /// Literal the upstream list uses for "no country".
    pub country_placeholder: String,
    /// Canonical replacement for the placeholder country.
    pub unknown_country: String,
    pub risk_scale: RiskScale,
    /// Pivots longer than this are down-sampled. `None` disables the cap.
    pub pivot_row_cap: Option<usize>,
    pub sample_seed: u64,
    /// Number of countries listed in the data story.
    pub story_top_countries: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            columns: ColumnConfig::default(),
            country_placeholder: "-0-".into(),
            unknown_country: "Unknown".into(),
            risk_scale: RiskScale::default(),
            pivot_row_cap: Some(20_000),
            sample_seed: 42,
            story_top_countries: 5,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    /// In tests, use EngineConfig::default().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate().map_err(|e| anyhow::anyhow!("{path}: {e}"))?;
        log::info!("config: loaded {path}");
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.risk_scale.validate().map_err(EngineError::InvalidConfig)?;
        let c = &self.columns;
        for (field, value) in [
            ("columns.entity_id", &c.entity_id),
            ("columns.entity_type", &c.entity_type),
            ("columns.country", &c.country),
            ("columns.program", &c.program),
            ("columns.map_code", &c.map_code),
            ("columns.risk_score", &c.risk_score),
            ("unknown_country", &self.unknown_country),
        ] {
            if value.trim().is_empty() {
                return Err(EngineError::InvalidConfig(format!("{field} must not be empty")));
            }
        }
        if self.pivot_row_cap == Some(0) {
            return Err(EngineError::InvalidConfig("pivot_row_cap must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{ "unknown_country": "Unknown", "columns": { "country": "Jurisdiction" } }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.columns.country, "Jurisdiction");
        assert_eq!(config.columns.entity_id, "ent_num");
        assert_eq!(config.pivot_row_cap, Some(20_000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_row_cap_is_invalid() {
        let config = EngineConfig {
            pivot_row_cap: Some(0),
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }
}
