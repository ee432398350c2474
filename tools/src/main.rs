//! risk-runner: headless pipeline runner for the sanctions risk engine.
//!
//! Usage:
//!   risk-runner --entities sdn.csv --addresses add.csv --programs map.csv --out-dir out
//!   risk-runner --entities sdn.csv --country Iran --country Syria --top-countries 20

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sanctions_risk_core::{
    config::EngineConfig,
    engine::{Dashboard, RiskEngine, ViewRequest},
    joiner::JoinReport,
    kpi::KpiSummary,
    loader::SourcePaths,
    output,
};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "risk-runner",
    about = "Aggregates sanctions-list data into country and program risk tables"
)]
struct Args {
    /// Entity records (required)
    #[arg(long)]
    entities: String,

    /// Address records, joined on the entity id
    #[arg(long)]
    addresses: Option<String>,

    /// Program code to description map
    #[arg(long)]
    programs: Option<String>,

    /// JSON engine configuration; defaults apply when omitted
    #[arg(long)]
    config: Option<String>,

    /// Restrict to these countries (repeatable)
    #[arg(long = "country")]
    countries: Vec<String>,

    /// Restrict to these sanctions programs (repeatable)
    #[arg(long = "program")]
    programs_selected: Vec<String>,

    #[arg(long, default_value_t = 10)]
    top_countries: usize,

    #[arg(long, default_value_t = 10)]
    top_programs: usize,

    /// Directory for the output tables; nothing is written when omitted
    #[arg(long)]
    out_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "csv")]
    format: Format,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let mut engine = RiskEngine::new(config)?;

    let paths = SourcePaths {
        entities: Some(args.entities.clone()),
        addresses: args.addresses.clone(),
        programs: args.programs.clone(),
    };
    let request = ViewRequest {
        selected_countries: args.countries.clone(),
        selected_programs: args.programs_selected.clone(),
        top_n_countries: args.top_countries,
        top_n_programs: args.top_programs,
    };

    let (dashboard, report) = engine.run(&paths, &request)?;
    let (hits, misses) = engine.cache_stats();
    log::debug!("risk-runner: cache hits={hits} misses={misses}");
    print_summary(&dashboard, &report);

    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        write_tables(&dashboard, dir, args.format)?;
        println!();
        println!("Tables written to {}", dir.display());
    }
    Ok(())
}

fn print_summary(dashboard: &Dashboard, report: &JoinReport) {
    println!("=== JOIN ===");
    for miss in &report.unresolved {
        println!("  {} rows without {} match on '{}'", miss.rows, miss.source, miss.key_column);
    }
    for skipped in &report.skipped {
        println!("  {skipped} join skipped (key column missing)");
    }
    println!("  countries normalized: {}", report.countries_normalized);

    println!();
    println!("=== KPI / KRI ===");
    match &dashboard.kpis {
        Ok(kpis) => print_indicators(kpis),
        Err(e) => println!("  unavailable: {e}"),
    }

    println!();
    println!("=== DATA STORY ===");
    match &dashboard.story {
        Ok(story) => {
            for line in story.render_text() {
                println!("  {line}");
            }
        }
        Err(e) => println!("  unavailable: {e}"),
    }

    println!();
    println!("=== PROGRAM PIVOT ===");
    println!("  countries: {}", dashboard.chosen_countries.join(", "));
    println!("  programs:  {}", dashboard.chosen_programs.join(", "));
    match &dashboard.program_pivot {
        Ok(pivot) => println!("  cells:     {}", pivot.len()),
        Err(e) => println!("  unavailable: {e}"),
    }
}

fn print_indicators(kpis: &KpiSummary) {
    for (name, indicator) in kpis.indicators() {
        println!("  {name:<30} {:>10}  {}", indicator.value.to_string(), indicator.description);
    }
}

fn write_tables(dashboard: &Dashboard, dir: &Path, format: Format) -> Result<()> {
    let ext = match format {
        Format::Csv => "csv",
        Format::Json => "json",
    };
    let path = |name: &str| dir.join(format!("{name}.{ext}"));

    if let Ok(metrics) = &dashboard.country_metrics {
        match format {
            Format::Csv => output::save_csv(metrics, &path("country_metrics"))?,
            Format::Json => output::save_json(metrics, &path("country_metrics"))?,
        }
    }
    if let Ok(pivot) = &dashboard.program_pivot {
        match format {
            Format::Csv => output::save_csv(pivot, &path("program_pivot"))?,
            Format::Json => output::save_json(pivot, &path("program_pivot"))?,
        }
    }
    if let Ok(kpis) = &dashboard.kpis {
        output::save_json(&kpis.indicators(), &dir.join("kpi_summary.json"))?;
    }
    if let Ok(story) = &dashboard.story {
        output::save_json(story, &dir.join("data_story.json"))?;
    }
    Ok(())
}
