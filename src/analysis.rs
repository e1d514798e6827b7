//! The comparative engine: period filtering, variation arithmetic,
//! hierarchical aggregation, ranking and trend building. Every function is
//! a pure pass over the immutable normalized record set; nothing here holds
//! state between calls.

use crate::types::{
    AnalysisOptions, AnalysisReport, CausalFactorCount, ChannelComparison, ChannelScope,
    ComplaintRecord, DominantSegment, OverallSummary, Period, RankedNature, SegmentRanking,
    TrendPoint, VariationResult,
};
use log::debug;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

/// How many categories each ranked list may carry.
const TOP_N: usize = 5;

/// Signed percentage variation between two counts, with the zero policy the
/// reported numbers depend on: an appearance from zero is always reported as
/// exactly 100%, regardless of magnitude, and two zero counts are no change.
/// Total over non-negative integers; the result is always finite.
pub fn variation(count_current: u64, count_reference: u64) -> (f64, i8) {
    if count_reference == 0 {
        if count_current == 0 {
            return (0.0, 0);
        }
        return (100.0, 1);
    }
    let percent =
        (count_current as f64 - count_reference as f64) / count_reference as f64 * 100.0;
    let direction = if percent > 0.0 {
        1
    } else if percent < 0.0 {
        -1
    } else {
        0
    };
    (percent, direction)
}

/// Records belonging exactly to `period`. An absent period is an empty
/// subset, never an error.
pub fn filter_period<'a>(records: &'a [ComplaintRecord], period: Period) -> Vec<&'a ComplaintRecord> {
    records.iter().filter(|r| r.period() == period).collect()
}

/// Paired current/reference counts per group key, covering the union of keys
/// observed on either side. A key seen only on one side carries an explicit
/// zero on the other. `BTreeMap` fixes the enumeration order the ranking
/// tie-break relies on.
pub fn paired_counts<'a, K, F>(
    current: &[&'a ComplaintRecord],
    reference: &[&'a ComplaintRecord],
    key: F,
) -> BTreeMap<K, (u64, u64)>
where
    K: Ord,
    F: Fn(&ComplaintRecord) -> K,
{
    let mut map: BTreeMap<K, (u64, u64)> = BTreeMap::new();
    for &r in current {
        map.entry(key(r)).or_insert((0, 0)).0 += 1;
    }
    for &r in reference {
        map.entry(key(r)).or_insert((0, 0)).1 += 1;
    }
    map
}

/// One [`VariationResult`] per group key of the selected dimension, in the
/// aggregator's enumeration order.
pub fn compare_dimension<F>(
    current: &[&ComplaintRecord],
    reference: &[&ComplaintRecord],
    key: F,
) -> Vec<VariationResult>
where
    F: Fn(&ComplaintRecord) -> String,
{
    paired_counts(current, reference, key)
        .into_iter()
        .map(|(category, (cur, refc))| {
            let (percent, _) = variation(cur, refc);
            VariationResult {
                category,
                count_current: cur,
                count_reference: refc,
                delta: cur as i64 - refc as i64,
                percent,
            }
        })
        .collect()
}

/// Strictly negative deltas, most negative first, capped at [`TOP_N`].
/// The sort is stable, so tied deltas keep the aggregator's order.
pub fn rank_improved(natures: &[VariationResult]) -> Vec<VariationResult> {
    let mut improved: Vec<VariationResult> =
        natures.iter().filter(|v| v.delta < 0).cloned().collect();
    improved.sort_by_key(|v| v.delta);
    improved.truncate(TOP_N);
    improved
}

/// Strictly positive deltas, most positive first, capped at [`TOP_N`].
pub fn rank_worsened(natures: &[VariationResult]) -> Vec<VariationResult> {
    let mut worsened: Vec<VariationResult> =
        natures.iter().filter(|v| v.delta > 0).cloned().collect();
    worsened.sort_by_key(|v| Reverse(v.delta));
    worsened.truncate(TOP_N);
    worsened
}

/// Secondary pass for one ranked nature: the reason-level comparison keyed by
/// the reasons observed in the current subset (reference counts looked up,
/// zero when absent), plus the top causal factors among current records.
fn nature_breakdown(
    seg_current: &[&ComplaintRecord],
    seg_reference: &[&ComplaintRecord],
    nature: &str,
) -> (Vec<VariationResult>, Vec<CausalFactorCount>) {
    let cur_nature: Vec<&ComplaintRecord> = seg_current
        .iter()
        .copied()
        .filter(|r| r.nature == nature)
        .collect();

    let mut cur_reasons: BTreeMap<&str, u64> = BTreeMap::new();
    for r in &cur_nature {
        *cur_reasons.entry(r.reason.as_str()).or_insert(0) += 1;
    }
    let mut ref_reasons: BTreeMap<&str, u64> = BTreeMap::new();
    for r in seg_reference.iter().filter(|r| r.nature == nature) {
        *ref_reasons.entry(r.reason.as_str()).or_insert(0) += 1;
    }

    let mut reasons: Vec<VariationResult> = cur_reasons
        .iter()
        .map(|(reason, cur)| {
            let refc = ref_reasons.get(reason).copied().unwrap_or(0);
            let (percent, _) = variation(*cur, refc);
            VariationResult {
                category: (*reason).to_string(),
                count_current: *cur,
                count_reference: refc,
                delta: *cur as i64 - refc as i64,
                percent,
            }
        })
        .collect();
    // Most frequent current reasons first; stable, so ties stay lexical.
    reasons.sort_by_key(|v| Reverse(v.count_current));

    let mut factors: BTreeMap<&str, u64> = BTreeMap::new();
    for r in &cur_nature {
        *factors.entry(r.causal_factor.as_str()).or_insert(0) += 1;
    }
    let mut causal_factors: Vec<CausalFactorCount> = factors
        .into_iter()
        .map(|(causal_factor, count)| CausalFactorCount {
            causal_factor: causal_factor.to_string(),
            count,
        })
        .collect();
    causal_factors.sort_by_key(|c| Reverse(c.count));
    causal_factors.truncate(TOP_N);

    (reasons, causal_factors)
}

fn annotate(
    natures: Vec<VariationResult>,
    seg_current: &[&ComplaintRecord],
    seg_reference: &[&ComplaintRecord],
) -> Vec<RankedNature> {
    natures
        .into_iter()
        .map(|nature| {
            let (reasons, causal_factors) =
                nature_breakdown(seg_current, seg_reference, &nature.category);
            RankedNature {
                variation: nature,
                reasons,
                causal_factors,
            }
        })
        .collect()
}

/// One point per `(year, month)` present for `segment` across the entire
/// record set, chronological. Independent of the selected periods.
pub fn trend_series(records: &[ComplaintRecord], segment: &str) -> Vec<TrendPoint> {
    let mut counts: BTreeMap<Period, u64> = BTreeMap::new();
    for r in records.iter().filter(|r| r.segment == segment) {
        *counts.entry(r.period()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(period, count)| TrendPoint {
            segment: segment.to_string(),
            period,
            count,
        })
        .collect()
}

/// The segment with the largest share of the current subset, or `None` when
/// the subset is empty. Ties resolve to the lexically smallest segment.
pub fn dominant_segment(current: &[&ComplaintRecord]) -> Option<DominantSegment> {
    if current.is_empty() {
        return None;
    }
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for r in current {
        *counts.entry(r.segment.as_str()).or_insert(0) += 1;
    }
    let mut best_segment = "";
    let mut best_count = 0u64;
    for (&segment, &count) in &counts {
        if count > best_count {
            best_count = count;
            best_segment = segment;
        }
    }
    Some(DominantSegment {
        segment: best_segment.to_string(),
        share_percent: best_count as f64 / current.len() as f64 * 100.0,
    })
}

/// One complete analysis pass: filter both periods, compare per segment and
/// channel scope, rank, and build trends. Re-enterable from scratch on every
/// call; `records` is only read.
pub fn build_report(records: &[ComplaintRecord], options: AnalysisOptions) -> AnalysisReport {
    let current = filter_period(records, options.current);
    let reference = filter_period(records, options.reference);
    debug!(
        "comparing {} ({} records) against {} ({} records)",
        options.current.label(),
        current.len(),
        options.reference.label(),
        reference.len()
    );

    let (percent, direction) = variation(current.len() as u64, reference.len() as u64);
    let summary = OverallSummary {
        count_reference: reference.len() as u64,
        count_current: current.len() as u64,
        percent,
        direction,
    };
    let dominant = dominant_segment(&current);

    let segments: BTreeSet<&str> = records.iter().map(|r| r.segment.as_str()).collect();
    let mut channel_tables: Vec<ChannelComparison> = Vec::new();
    let mut rankings: Vec<SegmentRanking> = Vec::new();
    let mut trends: Vec<TrendPoint> = Vec::new();

    for segment in &segments {
        let seg_current: Vec<&ComplaintRecord> = current
            .iter()
            .copied()
            .filter(|r| r.segment == *segment)
            .collect();
        let seg_reference: Vec<&ComplaintRecord> = reference
            .iter()
            .copied()
            .filter(|r| r.segment == *segment)
            .collect();

        for channel in ChannelScope::ALL {
            let chan_current: Vec<&ComplaintRecord> = seg_current
                .iter()
                .copied()
                .filter(|&r| channel.matches(r))
                .collect();
            let chan_reference: Vec<&ComplaintRecord> = seg_reference
                .iter()
                .copied()
                .filter(|&r| channel.matches(r))
                .collect();
            // A scope with no records on either side is omitted entirely.
            if chan_current.is_empty() && chan_reference.is_empty() {
                continue;
            }
            channel_tables.push(ChannelComparison {
                segment: (*segment).to_string(),
                channel,
                natures: compare_dimension(&chan_current, &chan_reference, |r| r.nature.clone()),
                reasons: compare_dimension(&chan_current, &chan_reference, |r| r.reason.clone()),
            });
        }

        // Ranking runs over the whole segment, channels united.
        let natures = compare_dimension(&seg_current, &seg_reference, |r| r.nature.clone());
        rankings.push(SegmentRanking {
            segment: (*segment).to_string(),
            improved: annotate(rank_improved(&natures), &seg_current, &seg_reference),
            worsened: annotate(rank_worsened(&natures), &seg_current, &seg_reference),
        });

        trends.extend(trend_series(records, segment));
    }

    AnalysisReport {
        options,
        summary,
        dominant_segment: dominant,
        channel_tables,
        trends,
        rankings,
    }
}
