// Entry point and high-level CLI flow.
//
// - Option [1] loads and normalizes the complaint CSV, printing diagnostics.
// - Option [2] asks for the current and reference periods, runs one full
//   comparison pass, prints previews and writes the report artifacts.
// - After an analysis the user can go back to the menu or exit.

use complaint_report::analysis;
use complaint_report::loader;
use complaint_report::output;
use complaint_report::types::{
    AnalysisOptions, AnalysisReport, ComplaintRecord, Month, Period, RankedNature, SummaryArtifact,
};
use complaint_report::util::{format_int, format_number};
use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::sync::Mutex;

// Simple in-memory app state so we only load/normalize the CSV once but can
// run several comparisons in a single session.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Vec<ComplaintRecord>>,
}

/// Print `prompt` and read one trimmed line of input.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask whether to go back to the menu after an analysis.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        match read_line("Back to menu (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn prompt_year(label: &str) -> i32 {
    loop {
        let raw = read_line(&format!("{} year: ", label));
        match raw.parse::<i32>() {
            Ok(y) => return y,
            Err(_) => println!("Invalid year. Please enter a number like 2025."),
        }
    }
}

fn prompt_month(label: &str) -> Month {
    loop {
        let raw = read_line(&format!("{} month (name or abbreviation): ", label));
        match Month::parse(&raw) {
            Some(m) => return m,
            None => println!("Invalid month. Use names like \"janeiro\" or \"jan\"."),
        }
    }
}

/// Handle option [1]: load and normalize the CSV file.
///
/// On success, we store the record set in `APP_STATE` and print a short
/// textual summary of what happened. A failed load leaves the previous data
/// (if any) untouched.
fn handle_load() {
    let input = read_line("CSV path [reclamacoes.csv]: ");
    let path = if input.is_empty() {
        "reclamacoes.csv".to_string()
    } else {
        input
    };
    match loader::load_and_clean(&path) {
        Ok((data, report)) => {
            println!(
                "Processing dataset... ({} rows read, {} retained)",
                format_int(report.total_rows as i64),
                format_int(report.retained_rows as i64)
            );
            if report.dropped_rows > 0 {
                println!(
                    "Note: {} rows dropped for a missing or invalid year/month.",
                    format_int(report.dropped_rows as i64)
                );
            }
            if report.filled_unknowns > 0 {
                println!(
                    "Info: {} empty cells treated as \"desconhecido\".",
                    format_int(report.filled_unknowns as i64)
                );
            }
            println!();
            let mut state = APP_STATE.lock().unwrap();
            state.data = Some(data);
        }
        Err(e) => {
            eprintln!("Failed to load file: {} — no usable data.\n", e);
        }
    }
}

fn print_summary(report: &AnalysisReport) {
    let s = &report.summary;
    println!("Summary");
    println!(
        "In {}, complaints varied {}% against {}.",
        report.options.current.label(),
        format_number(s.percent, 2),
        report.options.reference.label()
    );
    println!(
        "Total complaints: {} → {}",
        format_int(s.count_reference),
        format_int(s.count_current)
    );
    if let Some(dominant) = &report.dominant_segment {
        println!(
            "Segment \"{}\" accounts for {}% of current complaints.",
            dominant.segment,
            format_number(dominant.share_percent, 2)
        );
    }
    println!();
}

fn print_ranked(title: &str, ranked: &[RankedNature]) {
    if ranked.is_empty() {
        return;
    }
    println!("  {}:", title);
    for entry in ranked {
        let v = &entry.variation;
        println!(
            "    {} ({} → {}, delta {})",
            v.category, v.count_reference, v.count_current, v.delta
        );
        for reason in &entry.reasons {
            println!(
                "      - {}: {} → {} ({}%)",
                reason.category,
                reason.count_reference,
                reason.count_current,
                format_number(reason.percent, 2)
            );
        }
        if !entry.causal_factors.is_empty() {
            println!("      Most common causal factors:");
            for f in &entry.causal_factors {
                println!("        {}: {} occurrences", f.causal_factor, f.count);
            }
        }
    }
}

fn print_rankings(report: &AnalysisReport) {
    for ranking in &report.rankings {
        if ranking.improved.is_empty() && ranking.worsened.is_empty() {
            continue;
        }
        println!("Segment: {}", ranking.segment);
        print_ranked("Most improved natures", &ranking.improved);
        print_ranked("Most worsened natures", &ranking.worsened);
        println!();
    }
}

/// Handle option [2]: run one comparison pass and emit the report.
///
/// This function is intentionally side-effectful: it writes three CSV files
/// and two JSON artifacts, and prints Markdown previews to the console.
fn handle_analyze() {
    let data = {
        let state = APP_STATE.lock().unwrap();
        state.data.clone()
    };
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };

    let years: BTreeSet<i32> = data.iter().map(|r| r.year).collect();
    let years_desc: Vec<String> = years.iter().rev().map(|y| y.to_string()).collect();
    println!("Years present in the data: {}", years_desc.join(", "));

    let current = Period::new(prompt_year("Current"), prompt_month("Current"));
    let reference = Period::new(prompt_year("Reference"), prompt_month("Reference"));

    println!("\nGenerating comparison...\n");
    let report = analysis::build_report(&data, AnalysisOptions { current, reference });

    print_summary(&report);

    let (nature_rows, reason_rows) = output::variation_rows(&report);
    if let Err(e) = output::write_csv("nature_comparison.csv", &nature_rows) {
        eprintln!("Write error: {}", e);
    }
    println!("Nature comparison by segment and channel:");
    output::preview_table_rows(&nature_rows, 10);
    println!("(Full table exported to nature_comparison.csv)\n");

    if let Err(e) = output::write_csv("reason_comparison.csv", &reason_rows) {
        eprintln!("Write error: {}", e);
    }
    println!("Reason comparison by segment and channel:");
    output::preview_table_rows(&reason_rows, 10);
    println!("(Full table exported to reason_comparison.csv)\n");

    let trend_rows = output::trend_rows(&report);
    if let Err(e) = output::write_csv("trend_series.csv", &trend_rows) {
        eprintln!("Write error: {}", e);
    }
    println!("Monthly trend by segment:");
    output::preview_table_rows(&trend_rows, 10);
    println!("(Full series exported to trend_series.csv)\n");

    print_rankings(&report);
    if let Err(e) = output::write_json("rankings.json", &report.rankings) {
        eprintln!("Write error: {}", e);
    }
    println!("(Rankings exported to rankings.json)\n");

    let artifact = SummaryArtifact {
        current_period: report.options.current.label(),
        reference_period: report.options.reference.label(),
        summary: report.summary,
        dominant_segment: report.dominant_segment.clone(),
    };
    if let Err(e) = output::write_json("summary.json", &artifact) {
        eprintln!("Write error: {}", e);
    }
    println!("(Summary exported to summary.json)\n");
}

fn main() {
    env_logger::init();
    loop {
        println!("Monthly complaint comparison");
        println!("[1] Load the file");
        println!("[2] Run comparative analysis\n");
        match read_line("Enter choice: ").as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                println!();
                handle_analyze();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}
