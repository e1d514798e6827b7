use crate::error::Result;
use crate::types::{AnalysisReport, TrendRow, VariationRow};
use crate::util::{capitalize, format_number};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Print the first `max_rows` rows as a markdown table.
pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Flatten the per-(segment, channel) comparison tables into display rows,
/// natures and reasons separately.
pub fn variation_rows(report: &AnalysisReport) -> (Vec<VariationRow>, Vec<VariationRow>) {
    let mut natures: Vec<VariationRow> = Vec::new();
    let mut reasons: Vec<VariationRow> = Vec::new();
    for table in &report.channel_tables {
        for v in &table.natures {
            natures.push(VariationRow {
                segment: table.segment.clone(),
                channel: table.channel.label().to_string(),
                category: v.category.clone(),
                reference: v.count_reference,
                current: v.count_current,
                delta: v.delta,
                variation: format!("{}%", format_number(v.percent, 2)),
            });
        }
        for v in &table.reasons {
            reasons.push(VariationRow {
                segment: table.segment.clone(),
                channel: table.channel.label().to_string(),
                category: v.category.clone(),
                reference: v.count_reference,
                current: v.count_current,
                delta: v.delta,
                variation: format!("{}%", format_number(v.percent, 2)),
            });
        }
    }
    (natures, reasons)
}

/// One display row per trend point, chronological per segment.
pub fn trend_rows(report: &AnalysisReport) -> Vec<TrendRow> {
    report
        .trends
        .iter()
        .map(|t| TrendRow {
            segment: t.segment.clone(),
            year: t.period.year,
            month: capitalize(t.period.month.name()),
            complaints: t.count,
        })
        .collect()
}
