//! Sanctions risk aggregation engine.
//!
//! Loads sanctions-list tables, joins them into one master record set,
//! and derives country metrics, a country × program pivot and KPI/KRI
//! summaries for downstream renderers.

pub mod config;
pub mod country_metrics;
pub mod engine;
pub mod error;
pub mod filter;
pub mod joiner;
pub mod kpi;
pub mod loader;
pub mod memo;
pub mod output;
pub mod program_pivot;
pub mod report;
pub mod risk;
pub mod rng;
pub mod table;
pub mod types;
