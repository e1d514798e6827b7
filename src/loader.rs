use crate::error::{ReportError, Result};
use crate::types::{ComplaintRecord, Month, UNKNOWN};
use crate::util::{normalize_text, parse_year_safe};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info, warn};
use std::fs::File;
use std::io::Read;

/// Diagnostics for one load, printed after ingestion and logged.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub retained_rows: usize,
    /// Rows rejected for a missing or unparseable year/month. The only
    /// row-level rejection; every other gap is filled, never dropped.
    pub dropped_rows: usize,
    /// Categorical cells coerced to the sentinel category.
    pub filled_unknowns: usize,
}

// Accepted header spellings per canonical field, matched after lowercasing
// and trimming. "mês" is the accented alias the source exports use.
const YEAR_ALIASES: &[&str] = &["ano", "year"];
const MONTH_ALIASES: &[&str] = &["mes", "mês", "month"];
const SEGMENT_ALIASES: &[&str] = &["segmento", "segment"];
const CHANNEL_ALIASES: &[&str] = &["ds_canal", "canal", "channel"];
const NATURE_ALIASES: &[&str] = &["natureza", "nature"];
const REASON_ALIASES: &[&str] = &["motivo", "reason"];
const CAUSAL_FACTOR_ALIASES: &[&str] = &[
    "fato_gerador_fato_gerador",
    "fato_gerador",
    "causal_factor",
];

/// Column indexes resolved once per load. Year and month are mandatory;
/// absent optional columns synthesize the sentinel for every record.
#[derive(Debug)]
struct Schema {
    year: usize,
    month: usize,
    segment: Option<usize>,
    channel: Option<usize>,
    nature: Option<usize>,
    reason: Option<usize>,
    causal_factor: Option<usize>,
}

impl Schema {
    fn resolve(headers: &StringRecord) -> Result<Schema> {
        let normalized: Vec<String> = headers.iter().map(normalize_text).collect();
        let find = |aliases: &[&str]| {
            normalized
                .iter()
                .position(|h| aliases.contains(&h.as_str()))
        };
        let schema = Schema {
            year: find(YEAR_ALIASES).ok_or(ReportError::MissingColumn("year"))?,
            month: find(MONTH_ALIASES).ok_or(ReportError::MissingColumn("month"))?,
            segment: find(SEGMENT_ALIASES),
            channel: find(CHANNEL_ALIASES),
            nature: find(NATURE_ALIASES),
            reason: find(REASON_ALIASES),
            causal_factor: find(CAUSAL_FACTOR_ALIASES),
        };
        debug!("resolved column schema: {:?}", schema);
        Ok(schema)
    }
}

/// Read a categorical cell, falling back to the sentinel when the column is
/// absent or the cell is empty.
fn categorical(row: &StringRecord, idx: Option<usize>, filled: &mut usize) -> String {
    match idx.and_then(|i| row.get(i)) {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => {
            *filled += 1;
            UNKNOWN.to_string()
        }
    }
}

/// Load and normalize the `;`-delimited complaint table at `path`.
pub fn load_and_clean(path: &str) -> Result<(Vec<ComplaintRecord>, LoadReport)> {
    let file = File::open(path)?;
    let result = clean_from_reader(file);
    if let Ok((records, report)) = &result {
        info!(
            "loaded {}: {} rows read, {} retained, {} dropped",
            path,
            report.total_rows,
            records.len(),
            report.dropped_rows
        );
    }
    result
}

/// Normalize a complaint table from any reader.
///
/// A missing year or month column is an ingestion failure and yields an
/// error; the caller must treat it as "no usable data". Per-row problems
/// never error: rows that cannot resolve a valid `(year, month)` are dropped
/// and counted, all other gaps become the sentinel category.
pub fn clean_from_reader<R: Read>(input: R) -> Result<(Vec<ComplaintRecord>, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(input);
    let schema = Schema::resolve(rdr.headers()?)?;

    let mut report = LoadReport::default();
    let mut records: Vec<ComplaintRecord> = Vec::new();

    for row in rdr.records() {
        report.total_rows += 1;
        let row = match row {
            Ok(r) => r,
            Err(_) => {
                report.dropped_rows += 1;
                continue;
            }
        };

        let year = match row.get(schema.year).and_then(parse_year_safe) {
            Some(y) => y,
            None => {
                report.dropped_rows += 1;
                continue;
            }
        };
        let month = match row.get(schema.month).and_then(Month::parse) {
            Some(m) => m,
            None => {
                report.dropped_rows += 1;
                continue;
            }
        };

        records.push(ComplaintRecord {
            year,
            month,
            segment: categorical(&row, schema.segment, &mut report.filled_unknowns),
            channel: categorical(&row, schema.channel, &mut report.filled_unknowns),
            nature: categorical(&row, schema.nature, &mut report.filled_unknowns),
            reason: categorical(&row, schema.reason, &mut report.filled_unknowns),
            causal_factor: categorical(&row, schema.causal_factor, &mut report.filled_unknowns),
        });
    }

    report.retained_rows = records.len();
    if report.dropped_rows > 0 {
        warn!(
            "{} of {} rows dropped for missing year/month",
            report.dropped_rows, report.total_rows
        );
    }
    Ok((records, report))
}
