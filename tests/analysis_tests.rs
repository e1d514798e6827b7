use complaint_report::analysis::{
    build_report, compare_dimension, dominant_segment, filter_period, paired_counts,
    rank_improved, rank_worsened, trend_series, variation,
};
use complaint_report::loader::clean_from_reader;
use complaint_report::types::{
    AnalysisOptions, ChannelScope, ComplaintRecord, Month, Period,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::io::Cursor;

fn rec(
    year: i32,
    month: Month,
    segment: &str,
    channel: &str,
    nature: &str,
    reason: &str,
) -> ComplaintRecord {
    ComplaintRecord {
        year,
        month,
        segment: segment.to_string(),
        channel: channel.to_string(),
        nature: nature.to_string(),
        reason: reason.to_string(),
        causal_factor: "desconhecido".to_string(),
    }
}

fn refs(records: &[ComplaintRecord]) -> Vec<&ComplaintRecord> {
    records.iter().collect()
}

// ===========================================================================
// Variation calculator
// ===========================================================================

#[test]
fn variation_zero_policy() {
    assert_eq!(variation(0, 0), (0.0, 0));
    assert_eq!(variation(1, 0), (100.0, 1));
    assert_eq!(variation(1000, 0), (100.0, 1)); // flat sentinel, not 100000%
}

#[test]
fn variation_is_signed_percentage_of_the_reference() {
    assert_eq!(variation(150, 100), (50.0, 1));
    assert_eq!(variation(50, 100), (-50.0, -1));
    assert_eq!(variation(100, 100), (0.0, 0));
    assert_eq!(variation(0, 4), (-100.0, -1));
}

#[test]
fn variation_is_finite_over_small_count_grid() {
    for cur in 0u64..20 {
        for refc in 0u64..20 {
            let (percent, direction) = variation(cur, refc);
            assert!(percent.is_finite(), "({}, {}) not finite", cur, refc);
            assert_eq!(direction > 0, percent > 0.0);
            assert_eq!(direction < 0, percent < 0.0);
        }
    }
}

// ===========================================================================
// Period filter and aggregation
// ===========================================================================

#[test]
fn filter_is_exact_and_absent_periods_yield_empty() {
    let records = vec![
        rec(2025, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Tarifa"),
        rec(2024, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Tarifa"),
    ];
    assert_eq!(filter_period(&records, Period::new(2025, Month::Janeiro)).len(), 1);
    assert_eq!(filter_period(&records, Period::new(2023, Month::Janeiro)).len(), 0);
}

#[test]
fn aggregated_keys_are_exactly_the_union_of_both_sides() {
    let current = vec![
        rec(2025, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Tarifa"),
        rec(2025, Month::Janeiro, "Varejo", "Procon", "Atendimento", "Demora"),
    ];
    let reference = vec![
        rec(2024, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Tarifa"),
        rec(2024, Month::Janeiro, "Varejo", "Procon", "Crédito", "Juros"),
    ];
    let counts = paired_counts(&refs(&current), &refs(&reference), |r| r.nature.clone());

    let got: BTreeSet<&str> = counts.keys().map(|k| k.as_str()).collect();
    let expected: BTreeSet<&str> =
        ["Cobrança", "Atendimento", "Crédito"].into_iter().collect();
    assert_eq!(got, expected);

    // One-sided keys carry an explicit zero, never an absent entry.
    assert_eq!(counts["Atendimento"], (1, 0));
    assert_eq!(counts["Crédito"], (0, 1));
    assert_eq!(counts["Cobrança"], (1, 1));
}

// ===========================================================================
// Ranker
// ===========================================================================

fn natures_with_deltas(deltas: &[(&str, i64)]) -> Vec<complaint_report::types::VariationResult> {
    // Build through the aggregator so enumeration order is the real one.
    let mut current = Vec::new();
    let mut reference = Vec::new();
    for (nature, delta) in deltas {
        let (cur, refc) = if *delta >= 0 { (*delta as u64 + 1, 1) } else { (1, (-delta) as u64 + 1) };
        for _ in 0..cur {
            current.push(rec(2025, Month::Janeiro, "S", "Procon", nature, "r"));
        }
        for _ in 0..refc {
            reference.push(rec(2024, Month::Janeiro, "S", "Procon", nature, "r"));
        }
    }
    compare_dimension(&refs(&current), &refs(&reference), |r| r.nature.clone())
}

#[test]
fn ranked_lists_are_capped_and_never_include_zero_deltas() {
    let natures = natures_with_deltas(&[
        ("a", -4),
        ("b", -1),
        ("c", 0),
        ("d", 2),
        ("e", 7),
        ("f", 3),
        ("g", 1),
        ("h", 5),
        ("i", 4),
        ("j", 6),
    ]);
    let improved = rank_improved(&natures);
    let worsened = rank_worsened(&natures);

    let improved_keys: Vec<&str> = improved.iter().map(|v| v.category.as_str()).collect();
    assert_eq!(improved_keys, vec!["a", "b"]);

    let worsened_keys: Vec<&str> = worsened.iter().map(|v| v.category.as_str()).collect();
    assert_eq!(worsened_keys, vec!["e", "j", "h", "i", "f"]);
    assert_eq!(worsened.len(), 5);
    assert!(worsened.iter().all(|v| v.delta > 0));
    assert!(improved.iter().all(|v| v.delta < 0));
}

#[test]
fn ranking_is_idempotent() {
    let natures = natures_with_deltas(&[("a", -3), ("b", 4), ("c", -1), ("d", 2)]);
    let once = rank_improved(&natures);
    let twice = rank_improved(&once);
    let once_keys: Vec<&str> = once.iter().map(|v| v.category.as_str()).collect();
    let twice_keys: Vec<&str> = twice.iter().map(|v| v.category.as_str()).collect();
    assert_eq!(once_keys, twice_keys);
}

#[test]
fn tied_deltas_keep_a_stable_deterministic_order() {
    // Scenario: two natures both at delta -3. The aggregator enumerates
    // lexically, and the stable sort must preserve that on ties.
    let natures = natures_with_deltas(&[("zulu", -3), ("alpha", -3)]);
    for _ in 0..3 {
        let improved = rank_improved(&natures);
        let keys: Vec<&str> = improved.iter().map(|v| v.category.as_str()).collect();
        assert_eq!(keys, vec!["alpha", "zulu"]);
    }
}

#[test]
fn appearance_from_zero_ranks_as_worsened_with_the_sentinel_percent() {
    // Scenario: nature present only in the current period, count 10.
    let current: Vec<ComplaintRecord> = (0..10)
        .map(|_| rec(2025, Month::Janeiro, "S", "Procon", "Cobrança", "Tarifa"))
        .collect();
    let reference: Vec<ComplaintRecord> = Vec::new();
    let natures = compare_dimension(&refs(&current), &refs(&reference), |r| r.nature.clone());
    let worsened = rank_worsened(&natures);

    assert_eq!(worsened.len(), 1);
    assert_eq!(worsened[0].delta, 10);
    assert_eq!(worsened[0].percent, 100.0);
}

// ===========================================================================
// Trend series and dominant segment
// ===========================================================================

#[test]
fn trend_series_is_chronological_across_year_boundaries() {
    let records = vec![
        rec(2025, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Tarifa"),
        rec(2024, Month::Dezembro, "Varejo", "Procon", "Cobrança", "Tarifa"),
        rec(2024, Month::Dezembro, "Varejo", "Ouvidoria", "Cobrança", "Tarifa"),
        rec(2024, Month::Abril, "Varejo", "Procon", "Cobrança", "Tarifa"),
        rec(2025, Month::Janeiro, "Outro", "Procon", "Cobrança", "Tarifa"),
    ];
    let series = trend_series(&records, "Varejo");

    let periods: Vec<Period> = series.iter().map(|t| t.period).collect();
    assert_eq!(
        periods,
        vec![
            Period::new(2024, Month::Abril),
            Period::new(2024, Month::Dezembro),
            Period::new(2025, Month::Janeiro),
        ]
    );
    let counts: Vec<u64> = series.iter().map(|t| t.count).collect();
    assert_eq!(counts, vec![1, 2, 1]);
    assert!(series.iter().all(|t| t.segment == "Varejo"));
}

#[test]
fn dominant_segment_takes_the_largest_current_share() {
    let current = vec![
        rec(2025, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Tarifa"),
        rec(2025, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Tarifa"),
        rec(2025, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Tarifa"),
        rec(2025, Month::Janeiro, "Cartões", "Procon", "Cobrança", "Tarifa"),
    ];
    let dominant = dominant_segment(&refs(&current)).unwrap();
    assert_eq!(dominant.segment, "Varejo");
    assert_eq!(dominant.share_percent, 75.0);

    assert!(dominant_segment(&[]).is_none());
}

// ===========================================================================
// Report assembly
// ===========================================================================

#[test]
fn channel_scopes_with_no_records_on_either_side_are_omitted() {
    let records = vec![
        rec(2025, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Tarifa"),
        rec(2024, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Tarifa"),
    ];
    let report = build_report(
        &records,
        AnalysisOptions {
            current: Period::new(2025, Month::Janeiro),
            reference: Period::new(2024, Month::Janeiro),
        },
    );

    let channels: Vec<ChannelScope> = report
        .channel_tables
        .iter()
        .map(|t| t.channel)
        .collect();
    // No Ouvidoria records anywhere: only Procon and Overall survive.
    assert_eq!(channels, vec![ChannelScope::Procon, ChannelScope::Overall]);
}

#[test]
fn overall_scope_unites_the_channels() {
    let records = vec![
        rec(2025, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Tarifa"),
        rec(2025, Month::Janeiro, "Varejo", "Ouvidoria", "Cobrança", "Tarifa"),
        rec(2024, Month::Janeiro, "Varejo", "Ouvidoria", "Cobrança", "Tarifa"),
    ];
    let report = build_report(
        &records,
        AnalysisOptions {
            current: Period::new(2025, Month::Janeiro),
            reference: Period::new(2024, Month::Janeiro),
        },
    );

    let overall = report
        .channel_tables
        .iter()
        .find(|t| t.channel == ChannelScope::Overall)
        .unwrap();
    assert_eq!(overall.natures[0].count_current, 2);
    assert_eq!(overall.natures[0].count_reference, 1);

    let procon = report
        .channel_tables
        .iter()
        .find(|t| t.channel == ChannelScope::Procon)
        .unwrap();
    assert_eq!(procon.natures[0].count_current, 1);
    assert_eq!(procon.natures[0].count_reference, 0);
}

#[test]
fn empty_comparison_is_not_an_error() {
    let records = vec![rec(2025, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Tarifa")];
    let report = build_report(
        &records,
        AnalysisOptions {
            current: Period::new(2030, Month::Janeiro),
            reference: Period::new(2031, Month::Janeiro),
        },
    );

    assert_eq!(report.summary.count_current, 0);
    assert_eq!(report.summary.count_reference, 0);
    assert_eq!(report.summary.percent, 0.0);
    assert_eq!(report.summary.direction, 0);
    assert!(report.dominant_segment.is_none());
    assert!(report.channel_tables.is_empty());
    assert!(report.rankings.iter().all(|r| r.improved.is_empty() && r.worsened.is_empty()));
    // Trends cover the full history regardless of the selected periods.
    assert_eq!(report.trends.len(), 1);
}

#[test]
fn ranked_natures_carry_current_keyed_reason_breakdowns() {
    let mut records = Vec::new();
    // Current: nature "Cobrança" with reasons Tarifa x2 and Juros x1.
    records.push(rec(2025, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Tarifa"));
    records.push(rec(2025, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Tarifa"));
    records.push(rec(2025, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Juros"));
    // Reference: Tarifa x1 plus a reason that disappeared entirely.
    records.push(rec(2024, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Tarifa"));
    records.push(rec(2024, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Anuidade"));

    let report = build_report(
        &records,
        AnalysisOptions {
            current: Period::new(2025, Month::Janeiro),
            reference: Period::new(2024, Month::Janeiro),
        },
    );

    let ranking = &report.rankings[0];
    assert_eq!(ranking.worsened.len(), 1);
    let entry = &ranking.worsened[0];
    assert_eq!(entry.variation.category, "Cobrança");
    assert_eq!(entry.variation.delta, 1);

    // Current-side reasons only, most frequent first; the reference-only
    // reason "Anuidade" does not appear.
    let reasons: Vec<&str> = entry.reasons.iter().map(|v| v.category.as_str()).collect();
    assert_eq!(reasons, vec!["Tarifa", "Juros"]);
    assert_eq!(entry.reasons[0].count_reference, 1);
    assert_eq!(entry.reasons[1].count_reference, 0);
    assert_eq!(entry.reasons[1].percent, 100.0);
}

#[test]
fn causal_factor_top_five_is_capped_and_count_ordered() {
    let mut records = Vec::new();
    for (factor, n) in [("f1", 6), ("f2", 5), ("f3", 4), ("f4", 3), ("f5", 2), ("f6", 1)] {
        for _ in 0..n {
            let mut r = rec(2025, Month::Janeiro, "Varejo", "Procon", "Cobrança", "Tarifa");
            r.causal_factor = factor.to_string();
            records.push(r);
        }
    }
    let report = build_report(
        &records,
        AnalysisOptions {
            current: Period::new(2025, Month::Janeiro),
            reference: Period::new(2024, Month::Janeiro),
        },
    );

    let entry = &report.rankings[0].worsened[0];
    let factors: Vec<(&str, u64)> = entry
        .causal_factors
        .iter()
        .map(|f| (f.causal_factor.as_str(), f.count))
        .collect();
    assert_eq!(
        factors,
        vec![("f1", 6), ("f2", 5), ("f3", 4), ("f4", 3), ("f5", 2)]
    );
}

// ===========================================================================
// End-to-end: load then compare
// ===========================================================================

#[test]
fn scenario_two_january_rows_against_one() {
    let csv = "\
ano;mes;segmento;ds_canal;natureza;motivo
2025;jan;Varejo;Procon;Cobrança;Tarifa
2025;janeiro;Varejo;Procon;Cobrança;Tarifa
2024;jan;Varejo;Procon;Cobrança;Tarifa";
    let (records, _) = clean_from_reader(Cursor::new(csv.to_string())).unwrap();
    let report = build_report(
        &records,
        AnalysisOptions {
            current: Period::new(2025, Month::Janeiro),
            reference: Period::new(2024, Month::Janeiro),
        },
    );

    assert_eq!(report.summary.count_current, 2);
    assert_eq!(report.summary.count_reference, 1);
    assert_eq!(report.summary.percent, 100.0);
    assert_eq!(report.summary.direction, 1);
}

#[test]
fn dropped_rows_never_reach_aggregations_or_trends() {
    let csv = "\
ano;mes;segmento;ds_canal;natureza;motivo
2025;xyz;Varejo;Procon;Cobrança;Tarifa
2025;jan;Varejo;Procon;Cobrança;Tarifa";
    let (records, report) = clean_from_reader(Cursor::new(csv.to_string())).unwrap();
    assert_eq!(report.dropped_rows, 1);

    let analysis = build_report(
        &records,
        AnalysisOptions {
            current: Period::new(2025, Month::Janeiro),
            reference: Period::new(2024, Month::Janeiro),
        },
    );
    assert_eq!(analysis.summary.count_current, 1);
    assert_eq!(analysis.trends.len(), 1);
    assert_eq!(analysis.trends[0].count, 1);
}
