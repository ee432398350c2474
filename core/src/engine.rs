//! The risk engine — the single entry point for a pipeline run.
//!
//! PIPELINE ORDER (fixed):
//!   1. Loader        — entities (required), addresses, program map
//!   2. Joiner        — master table + join report
//!   3. Country metrics over the full master (memoized)
//!   4. KPI / KRI summary over the full country metrics
//!   5. Top-N selection, composed with the user's selections
//!   6. Program pivot over the narrowed master (memoized)
//!   7. Data story over the visible country metrics
//!
//! RULES:
//!   - Loader and Joiner failures stop the run.
//!   - Each aggregation carries its own Result, so a broken pivot never
//!     hides the country metrics.
//!   - Nothing here renders, writes files, or talks to the network.
//!   - Result caches are bounded; a long-lived engine does not grow with
//!     the number of distinct views it has served.

use crate::{
    config::EngineConfig,
    country_metrics::{compute_country_metrics, country_totals, CountryMetricsRecord},
    error::{EngineError, EngineResult, SourceKind},
    filter::{compose_selection, filter_and_rank, narrow_master, top_values, Dimension, RankMetric},
    joiner::{join, JoinReport},
    kpi::KpiSummary,
    loader::{load_optional, load_source, SourcePaths},
    memo::{MemoCache, MemoKey},
    program_pivot::{compute_program_pivot, program_totals, ProgramPivotRecord, ProgramTotal},
    report::{build_data_story, tier_distribution, DataStory, TierCount},
    table::MasterTable,
};
use serde::{Deserialize, Serialize};

/// User-facing view parameters for one recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewRequest {
    pub selected_countries: Vec<String>,
    pub selected_programs: Vec<String>,
    pub top_n_countries: usize,
    pub top_n_programs: usize,
}

impl Default for ViewRequest {
    fn default() -> Self {
        Self {
            selected_countries: Vec::new(),
            selected_programs: Vec::new(),
            top_n_countries: 10,
            top_n_programs: 10,
        }
    }
}

/// Everything a renderer needs for one view. Each aggregation is
/// independent.
#[derive(Debug)]
pub struct Dashboard {
    /// Full country metrics, every observed country.
    pub country_metrics: EngineResult<Vec<CountryMetricsRecord>>,
    /// Country metrics filtered by the user's countries, top-N by total.
    pub visible_countries: EngineResult<Vec<CountryMetricsRecord>>,
    pub kpis: EngineResult<KpiSummary>,
    pub program_totals: EngineResult<Vec<ProgramTotal>>,
    pub program_pivot: EngineResult<Vec<ProgramPivotRecord>>,
    pub story: EngineResult<DataStory>,
    pub tier_distribution: EngineResult<Vec<TierCount>>,
    /// Selections actually applied to the pivot after composing with top-N.
    pub chosen_countries: Vec<String>,
    pub chosen_programs: Vec<String>,
}

pub struct RiskEngine {
    config: EngineConfig,
    metrics_cache: MemoCache<Vec<CountryMetricsRecord>>,
    pivot_cache: MemoCache<Vec<ProgramPivotRecord>>,
}

impl RiskEngine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            metrics_cache: MemoCache::new(),
            pivot_cache: MemoCache::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load the three sources and join them. Only the entity source is
    /// required.
    pub fn load_master(&self, paths: &SourcePaths) -> EngineResult<(MasterTable, JoinReport)> {
        let config = &self.config;
        let entities_path = paths
            .entities
            .as_deref()
            .ok_or_else(|| EngineError::MissingRequiredSource {
                kind: SourceKind::Entities,
                path: String::new(),
                reason: "no path given".into(),
            })?;
        let entities = load_source(entities_path, SourceKind::Entities, config)?;
        let addresses = load_optional(paths.addresses.as_deref(), SourceKind::Addresses, config);
        let programs = load_optional(paths.programs.as_deref(), SourceKind::Programs, config);

        Ok(join(
            &entities.table,
            addresses.as_ref().map(|s| &s.table),
            programs.as_ref().map(|s| &s.table),
            config,
        ))
    }

    pub fn country_metrics(
        &mut self,
        master: &MasterTable,
    ) -> EngineResult<Vec<CountryMetricsRecord>> {
        let config = &self.config;
        self.metrics_cache.get_or_try_insert(MemoKey::new(master, "country_metrics"), || {
            compute_country_metrics(master, config)
        })
    }

    pub fn program_pivot(&mut self, master: &MasterTable) -> EngineResult<Vec<ProgramPivotRecord>> {
        let config = &self.config;
        self.pivot_cache.get_or_try_insert(MemoKey::new(master, "program_pivot"), || {
            compute_program_pivot(master, config)
        })
    }

    /// Recompute every view table for `request`.
    pub fn dashboard(&mut self, master: &MasterTable, request: &ViewRequest) -> Dashboard {
        let metrics = self.country_metrics(master);
        let totals = program_totals(master, &self.config);

        let top_countries = match &metrics {
            Ok(m) => top_values(
                &country_totals(m),
                Dimension::Country,
                RankMetric::TotalEntities,
                request.top_n_countries,
            ),
            Err(_) => Vec::new(),
        };
        let top_programs = match &totals {
            Ok(t) => top_values(
                t,
                Dimension::Program,
                RankMetric::TotalEntities,
                request.top_n_programs,
            ),
            Err(_) => Vec::new(),
        };
        let chosen_countries = compose_selection(&request.selected_countries, &top_countries);
        let chosen_programs = compose_selection(&request.selected_programs, &top_programs);

        let narrowed = narrow_master(master, &chosen_countries, &chosen_programs, &self.config);
        let program_pivot = self.program_pivot(&narrowed);

        let visible = match &metrics {
            Ok(m) => Ok(filter_and_rank(
                m,
                Dimension::Country,
                &request.selected_countries,
                RankMetric::TotalEntities,
                Some(request.top_n_countries),
            )),
            Err(e) => Err(e.reissue()),
        };
        let kpis = match &metrics {
            Ok(m) => Ok(KpiSummary::compute(m)),
            Err(e) => Err(e.reissue()),
        };
        let story = match &visible {
            Ok(v) => Ok(build_data_story(v, &self.config)),
            Err(e) => Err(e.reissue()),
        };
        let distribution = match &visible {
            Ok(v) => Ok(tier_distribution(v, &self.config)),
            Err(e) => Err(e.reissue()),
        };

        for (name, failed) in [
            ("country_metrics", metrics.as_ref().err()),
            ("program_totals", totals.as_ref().err()),
            ("program_pivot", program_pivot.as_ref().err()),
        ] {
            if let Some(e) = failed {
                log::warn!("engine: {name} unavailable: {e}");
            }
        }

        Dashboard {
            country_metrics: metrics,
            visible_countries: visible,
            kpis,
            program_totals: totals,
            program_pivot,
            story,
            tier_distribution: distribution,
            chosen_countries,
            chosen_programs,
        }
    }

    /// Load, join and compute in one call.
    pub fn run(
        &mut self,
        paths: &SourcePaths,
        request: &ViewRequest,
    ) -> EngineResult<(Dashboard, JoinReport)> {
        let (master, report) = self.load_master(paths)?;
        Ok((self.dashboard(&master, request), report))
    }

    /// Entries currently held across both result caches.
    pub fn cached_entries(&self) -> usize {
        self.metrics_cache.len() + self.pivot_cache.len()
    }

    pub fn cache_stats(&self) -> (u64, u64) {
        (
            self.metrics_cache.hits() + self.pivot_cache.hits(),
            self.metrics_cache.misses() + self.pivot_cache.misses(),
        )
    }
}
