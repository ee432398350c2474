//! Top-N / filter layer contracts.

use sanctions_risk_core::{
    config::EngineConfig,
    country_metrics::{compute_country_metrics, CountryMetricsRecord},
    filter::{filter_and_rank, narrow_master, top_values, Dimension, RankMetric},
    joiner::join,
    risk::RiskScale,
    table::Table,
};

fn record(country: &str, individuals: u64, non_individuals: u64) -> CountryMetricsRecord {
    let scale = RiskScale::default();
    CountryMetricsRecord::from_counts(country.into(), individuals, non_individuals, &scale)
}

fn sample() -> Vec<CountryMetricsRecord> {
    vec![
        record("Cuba", 10, 5),
        record("Iran", 300, 500),
        record("Russia", 400, 900),
        record("Syria", 100, 150),
        record("Yemen", 5, 10),
        record("Venezuela", 50, 100),
    ]
}

fn names(rows: &[CountryMetricsRecord]) -> Vec<&str> {
    rows.iter().map(|r| r.country.as_str()).collect()
}

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

/// An empty selection is a pass-through, ranked and truncated.
#[test]
fn empty_selection_means_no_filter() {
    let rows = sample();
    let out = filter_and_rank(&rows, Dimension::Country, &[], RankMetric::TotalEntities, Some(3));
    assert_eq!(names(&out), vec!["Russia", "Iran", "Syria"]);

    let all = filter_and_rank(&rows, Dimension::Country, &[], RankMetric::TotalEntities, None);
    assert_eq!(all.len(), rows.len());
}

/// A non-empty selection keeps only the selected values.
#[test]
fn selection_filters_before_ranking() {
    let rows = sample();
    let out = filter_and_rank(
        &rows,
        Dimension::Country,
        &strings(&["Cuba", "Yemen", "Atlantis"]),
        RankMetric::TotalEntities,
        Some(10),
    );
    assert_eq!(names(&out), vec!["Cuba", "Yemen"]);
}

/// Applying the same filter twice changes nothing.
#[test]
fn filter_and_rank_is_idempotent() {
    let rows = sample();
    let selected = strings(&["Iran", "Syria", "Cuba", "Venezuela"]);
    for n in [None, Some(0), Some(2), Some(10)] {
        let metric = RankMetric::TotalEntities;
        let once = filter_and_rank(&rows, Dimension::Country, &selected, metric, n);
        let twice = filter_and_rank(&once, Dimension::Country, &selected, metric, n);
        assert_eq!(once, twice, "Not idempotent for top_n={n:?}");
    }
}

/// Ties keep their original row order.
#[test]
fn ties_keep_input_order() {
    let rows = vec![record("B", 1, 1), record("A", 1, 1), record("C", 5, 5), record("D", 2, 0)];
    let out = filter_and_rank(&rows, Dimension::Country, &[], RankMetric::TotalEntities, None);
    assert_eq!(names(&out), vec!["C", "B", "A", "D"]);
}

/// Ranking can use any declared metric.
#[test]
fn rank_by_individuals() {
    let rows = sample();
    let top = top_values(&rows, Dimension::Country, RankMetric::IndividualEntities, 2);
    assert_eq!(top, strings(&["Russia", "Iran"]));
}

/// Narrowing the master table with empty lists keeps every row.
#[test]
fn narrow_master_respects_empty_lists() {
    let config = EngineConfig::default();
    let entities = Table::from_rows(
        "entities",
        &["ent_num", "SDN_Type", "Country", "Sanctions Program"],
        &[
            vec!["1", "entity", "Iran", "IRAN"],
            vec!["2", "entity", "Iran", "SDGT"],
            vec!["3", "entity", "Syria", "SYRIA"],
        ],
    );
    let master = join(&entities, None, None, &config).0;

    assert_eq!(narrow_master(&master, &[], &[], &config).len(), 3);
    assert_eq!(narrow_master(&master, &strings(&["Iran"]), &[], &config).len(), 2);
    assert_eq!(narrow_master(&master, &strings(&["Iran"]), &strings(&["SDGT"]), &config).len(), 1);

    let narrowed = narrow_master(&master, &strings(&["Syria"]), &[], &config);
    let metrics = compute_country_metrics(&narrowed, &config).unwrap();
    assert_eq!(names(&metrics), vec!["Syria"]);
}
