use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use tabled::Tabled;

use crate::util::capitalize;

/// Sentinel category for missing values. Every categorical gap is coerced to
/// this marker at load time so the analysis never deals with empty strings.
pub const UNKNOWN: &str = "desconhecido";

/// Calendar month with a fixed ordinal. Declaration order drives `Ord`, so
/// period comparisons and chronological sorts never fall back to lexical
/// string order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Month {
    #[serde(rename = "janeiro")]
    Janeiro,
    #[serde(rename = "fevereiro")]
    Fevereiro,
    #[serde(rename = "março")]
    Marco,
    #[serde(rename = "abril")]
    Abril,
    #[serde(rename = "maio")]
    Maio,
    #[serde(rename = "junho")]
    Junho,
    #[serde(rename = "julho")]
    Julho,
    #[serde(rename = "agosto")]
    Agosto,
    #[serde(rename = "setembro")]
    Setembro,
    #[serde(rename = "outubro")]
    Outubro,
    #[serde(rename = "novembro")]
    Novembro,
    #[serde(rename = "dezembro")]
    Dezembro,
}

// Accepted spellings: full canonical names plus the standard three-letter
// abbreviations, all matched after lowercasing and trimming.
static MONTH_LOOKUP: Lazy<HashMap<&'static str, Month>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for m in Month::ALL {
        map.insert(m.name(), m);
        map.insert(m.abbrev(), m);
    }
    map
});

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Janeiro,
        Month::Fevereiro,
        Month::Marco,
        Month::Abril,
        Month::Maio,
        Month::Junho,
        Month::Julho,
        Month::Agosto,
        Month::Setembro,
        Month::Outubro,
        Month::Novembro,
        Month::Dezembro,
    ];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Month::Janeiro => "janeiro",
            Month::Fevereiro => "fevereiro",
            Month::Marco => "março",
            Month::Abril => "abril",
            Month::Maio => "maio",
            Month::Junho => "junho",
            Month::Julho => "julho",
            Month::Agosto => "agosto",
            Month::Setembro => "setembro",
            Month::Outubro => "outubro",
            Month::Novembro => "novembro",
            Month::Dezembro => "dezembro",
        }
    }

    fn abbrev(self) -> &'static str {
        match self {
            Month::Janeiro => "jan",
            Month::Fevereiro => "fev",
            Month::Marco => "mar",
            Month::Abril => "abr",
            Month::Maio => "mai",
            Month::Junho => "jun",
            Month::Julho => "jul",
            Month::Agosto => "ago",
            Month::Setembro => "set",
            Month::Outubro => "out",
            Month::Novembro => "nov",
            Month::Dezembro => "dez",
        }
    }

    /// Resolve a raw cell to a canonical month. Returns `None` for anything
    /// that is not a full name or three-letter abbreviation after
    /// lowercasing and trimming; callers drop those rows.
    pub fn parse(raw: &str) -> Option<Month> {
        let norm = raw.trim().to_lowercase();
        MONTH_LOOKUP.get(norm.as_str()).copied()
    }
}

/// A reporting interval. `Ord` is year-major, then month ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Period {
    pub year: i32,
    pub month: Month,
}

impl Period {
    pub fn new(year: i32, month: Month) -> Self {
        Period { year, month }
    }

    /// Display label, e.g. "Janeiro 2025".
    pub fn label(&self) -> String {
        format!("{} {}", capitalize(self.month.name()), self.year)
    }
}

/// One normalized input row. Categorical fields are never empty: gaps are
/// filled with [`UNKNOWN`] at load time.
#[derive(Debug, Clone)]
pub struct ComplaintRecord {
    pub year: i32,
    pub month: Month,
    pub segment: String,
    pub channel: String,
    pub nature: String,
    pub reason: String,
    pub causal_factor: String,
}

impl ComplaintRecord {
    pub fn period(&self) -> Period {
        Period::new(self.year, self.month)
    }
}

/// Channel scope for the per-segment comparison tables. `Overall` is the
/// union across intake channels, the other two match their data labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChannelScope {
    Procon,
    Ombudsman,
    Overall,
}

impl ChannelScope {
    pub const ALL: [ChannelScope; 3] = [
        ChannelScope::Procon,
        ChannelScope::Ombudsman,
        ChannelScope::Overall,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChannelScope::Procon => "Procon",
            ChannelScope::Ombudsman => "Ombudsman",
            ChannelScope::Overall => "Overall",
        }
    }

    /// Whether a record belongs to this scope. The ombudsman channel appears
    /// in the source data as "Ouvidoria".
    pub fn matches(self, record: &ComplaintRecord) -> bool {
        match self {
            ChannelScope::Procon => record.channel.eq_ignore_ascii_case("procon"),
            ChannelScope::Ombudsman => {
                record.channel.eq_ignore_ascii_case("ouvidoria")
                    || record.channel.eq_ignore_ascii_case("ombudsman")
            }
            ChannelScope::Overall => true,
        }
    }
}

/// Current-versus-reference comparison for one category value.
#[derive(Debug, Clone, Serialize)]
pub struct VariationResult {
    pub category: String,
    pub count_current: u64,
    pub count_reference: u64,
    pub delta: i64,
    pub percent: f64,
}

/// One point of a segment's monthly history.
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub segment: String,
    pub period: Period,
    pub count: u64,
}

/// Causal-factor frequency among current-period records of a ranked nature.
#[derive(Debug, Clone, Serialize)]
pub struct CausalFactorCount {
    pub causal_factor: String,
    pub count: u64,
}

/// A top-ranked nature with its secondary breakdowns.
#[derive(Debug, Clone, Serialize)]
pub struct RankedNature {
    pub variation: VariationResult,
    pub reasons: Vec<VariationResult>,
    pub causal_factors: Vec<CausalFactorCount>,
}

/// Top-5 improved/worsened natures for one segment.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentRanking {
    pub segment: String,
    pub improved: Vec<RankedNature>,
    pub worsened: Vec<RankedNature>,
}

/// Scalar comparison of the two selected periods.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OverallSummary {
    pub count_reference: u64,
    pub count_current: u64,
    pub percent: f64,
    pub direction: i8,
}

/// The segment holding the largest share of current-period complaints.
#[derive(Debug, Clone, Serialize)]
pub struct DominantSegment {
    pub segment: String,
    pub share_percent: f64,
}

/// Nature and reason comparison tables for one (segment, channel) scope.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelComparison {
    pub segment: String,
    pub channel: ChannelScope,
    pub natures: Vec<VariationResult>,
    pub reasons: Vec<VariationResult>,
}

/// Contents of the `summary.json` artifact.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryArtifact {
    pub current_period: String,
    pub reference_period: String,
    pub summary: OverallSummary,
    pub dominant_segment: Option<DominantSegment>,
}

/// Caller-selected periods for one analysis pass.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AnalysisOptions {
    pub current: Period,
    pub reference: Period,
}

/// Everything one analysis pass produces.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub options: AnalysisOptions,
    pub summary: OverallSummary,
    pub dominant_segment: Option<DominantSegment>,
    pub channel_tables: Vec<ChannelComparison>,
    pub trends: Vec<TrendPoint>,
    pub rankings: Vec<SegmentRanking>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct VariationRow {
    #[serde(rename = "Segment")]
    #[tabled(rename = "Segment")]
    pub segment: String,
    #[serde(rename = "Channel")]
    #[tabled(rename = "Channel")]
    pub channel: String,
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Reference")]
    #[tabled(rename = "Reference")]
    pub reference: u64,
    #[serde(rename = "Current")]
    #[tabled(rename = "Current")]
    pub current: u64,
    #[serde(rename = "Delta")]
    #[tabled(rename = "Delta")]
    pub delta: i64,
    #[serde(rename = "Variation")]
    #[tabled(rename = "Variation")]
    pub variation: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TrendRow {
    #[serde(rename = "Segment")]
    #[tabled(rename = "Segment")]
    pub segment: String,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "Complaints")]
    #[tabled(rename = "Complaints")]
    pub complaints: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_names_abbreviations_case_and_whitespace() {
        assert_eq!(Month::parse("janeiro"), Some(Month::Janeiro));
        assert_eq!(Month::parse("jan"), Some(Month::Janeiro));
        assert_eq!(Month::parse("  FEV "), Some(Month::Fevereiro));
        assert_eq!(Month::parse("Março"), Some(Month::Marco));
        assert_eq!(Month::parse("MAR"), Some(Month::Marco));
        assert_eq!(Month::parse(" dezembro\t"), Some(Month::Dezembro));
    }

    #[test]
    fn rejects_anything_else() {
        assert_eq!(Month::parse("xyz"), None);
        assert_eq!(Month::parse(""), None);
        assert_eq!(Month::parse("janeiro 2025"), None);
        assert_eq!(Month::parse("ja"), None);
    }

    #[test]
    fn month_order_is_ordinal_not_lexical() {
        // Lexically "abril" < "janeiro"; the ordinal puts January first.
        assert!(Month::Janeiro < Month::Abril);
        assert!(Month::Dezembro > Month::Novembro);
    }

    #[test]
    fn period_order_is_year_major() {
        let dec_2024 = Period::new(2024, Month::Dezembro);
        let jan_2025 = Period::new(2025, Month::Janeiro);
        assert!(dec_2024 < jan_2025);
    }

    #[test]
    fn period_label_is_capitalized() {
        assert_eq!(Period::new(2025, Month::Janeiro).label(), "Janeiro 2025");
        assert_eq!(Period::new(2024, Month::Marco).label(), "Março 2024");
    }
}
