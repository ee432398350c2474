//! Program pivot: count-derived and precomputed score paths, row cap.

use sanctions_risk_core::{
    config::EngineConfig,
    error::EngineError,
    joiner::join,
    program_pivot::{compute_program_pivot, program_totals},
    risk::RiskTier,
    table::{MasterTable, ScoreSource, Table},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn sample_master(config: &EngineConfig) -> MasterTable {
    let entities = Table::from_rows(
        "entities",
        &["ent_num", "SDN_Type", "Country", "Sanctions Program"],
        &[
            vec!["1", "individual", "Russia", "IRAN"],
            vec!["2", "entity", "Russia", "IRAN"],
            vec!["3", "entity", "Iran", "RUSSIA"],
            vec!["4", "individual", "China", "CHINA"],
            vec!["5", "entity", "Mexico", "MEX"],
            vec!["6", "entity", "Mexico", "MEX"],
            vec!["7", "individual", "UAE", "UAE"],
            vec!["8", "entity", "Colombia", "COL"],
            vec!["9", "entity", "Turkey", "TUR"],
            vec!["10", "individual", "Lebanon", "LEB"],
        ],
    );
    join(&entities, None, None, config).0
}

fn scored_master(config: &EngineConfig, rows: &[Vec<&str>]) -> MasterTable {
    let entities = Table::from_rows(
        "entities",
        &["ent_num", "SDN_Type", "Country", "Sanctions Program", "Risk_Score"],
        rows,
    );
    join(&entities, None, None, config).0
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Every cell of the reference sample has 1 or 2 entities and rates Low.
#[test]
fn reference_sample_is_all_low() {
    let config = EngineConfig::default();
    let master = sample_master(&config);
    assert_eq!(master.score_source(), &ScoreSource::CountDerived);

    let pivot = compute_program_pivot(&master, &config).unwrap();
    assert_eq!(pivot.len(), 8, "One cell per observed (country, program) pair");
    for cell in &pivot {
        assert!(cell.entity_count == 1 || cell.entity_count == 2);
        assert_eq!(cell.avg_risk_score, 1.0);
        assert_eq!(cell.risk_level, RiskTier::Low);
        assert_eq!(cell.risk_color, "#2E4A1E");
    }
    let russia = pivot.iter().find(|c| c.country == "Russia").unwrap();
    assert_eq!((russia.program.as_str(), russia.entity_count), ("IRAN", 2));
}

/// Pairs never observed together are never emitted.
#[test]
fn no_cross_product_cells() {
    let config = EngineConfig::default();
    let pivot = compute_program_pivot(&sample_master(&config), &config).unwrap();
    assert!(pivot.iter().all(|c| c.entity_count > 0));
    assert!(!pivot.iter().any(|c| c.country == "Russia" && c.program == "MEX"));
}

/// Precomputed scores are averaged per cell and rounded to two decimals.
#[test]
fn precomputed_scores_are_averaged() {
    let config = EngineConfig::default();
    let master = scored_master(
        &config,
        &[
            vec!["1", "entity", "Iran", "IRAN", "3"],
            vec!["2", "entity", "Iran", "IRAN", "4"],
            vec!["3", "entity", "Iran", "IRAN", "4"],
            vec!["4", "entity", "Syria", "SYRIA", "2.5"],
        ],
    );
    assert!(matches!(master.score_source(), ScoreSource::Precomputed { .. }));

    let pivot = compute_program_pivot(&master, &config).unwrap();
    let iran = pivot.iter().find(|c| c.country == "Iran").unwrap();
    assert_eq!(iran.entity_count, 3);
    assert_eq!(iran.avg_risk_score, 3.67);
    assert_eq!(iran.risk_level, RiskTier::MediumHigh);

    let syria = pivot.iter().find(|c| c.country == "Syria").unwrap();
    assert_eq!(syria.risk_level, RiskTier::Medium, "A .5 mean resolves to the higher tier");
}

/// A cell whose scores are all absent falls back to its count.
#[test]
fn cells_without_scores_fall_back_to_count() {
    let config = EngineConfig::default();
    let master = scored_master(
        &config,
        &[
            vec!["1", "entity", "Cuba", "CUBA", ""],
            vec!["2", "entity", "Iran", "IRAN", "6"],
        ],
    );
    let pivot = compute_program_pivot(&master, &config).unwrap();
    let cuba = pivot.iter().find(|c| c.country == "Cuba").unwrap();
    assert_eq!(cuba.avg_risk_score, 1.0);
    let iran = pivot.iter().find(|c| c.country == "Iran").unwrap();
    assert_eq!(iran.risk_level, RiskTier::Critical);
}

/// Pivots above the row cap are sampled down, deterministically.
#[test]
fn row_cap_samples_deterministically() {
    let config = EngineConfig {
        pivot_row_cap: Some(25),
        ..EngineConfig::default()
    };
    let mut entities = Table::new(
        "entities",
        ["ent_num", "SDN_Type", "Country", "Sanctions Program"]
            .iter()
            .map(|h| h.to_string())
            .collect(),
    );
    for i in 0..100 {
        entities.push_row(vec![
            Some(i.to_string()),
            Some("entity".into()),
            Some(format!("Country{i:03}")),
            Some("SDGT".into()),
        ]);
    }
    let master = join(&entities, None, None, &config).0;

    let a = compute_program_pivot(&master, &config).unwrap();
    let b = compute_program_pivot(&master, &config).unwrap();
    assert_eq!(a.len(), 25);
    assert_eq!(a, b, "Same seed must keep the same cells");
    assert!(
        a.windows(2).all(|w| w[0].country < w[1].country),
        "Sampled cells keep their original order"
    );

    let other_seed = EngineConfig {
        sample_seed: 7,
        ..config.clone()
    };
    let c = compute_program_pivot(&master, &other_seed).unwrap();
    assert_eq!(c.len(), 25);
}

/// A missing program column aborts only the pivot.
#[test]
fn missing_program_column_is_schema_violation() {
    let config = EngineConfig::default();
    let entities = Table::from_rows(
        "entities",
        &["ent_num", "SDN_Type", "Country"],
        &[vec!["1", "entity", "Iran"]],
    );
    let master = join(&entities, None, None, &config).0;
    let err = compute_program_pivot(&master, &config).unwrap_err();
    assert!(matches!(
        err,
        EngineError::SchemaViolation { ref column, .. } if column == "Sanctions Program"
    ));
}

/// Program totals count distinct entities and sort descending.
#[test]
fn program_totals_sorted() {
    let config = EngineConfig::default();
    let totals = program_totals(&sample_master(&config), &config).unwrap();
    assert_eq!(totals[0].program, "IRAN");
    assert_eq!(totals[0].total_entities, 2);
    assert_eq!(totals[1].program, "MEX");
    assert_eq!(totals.len(), 8);
}
