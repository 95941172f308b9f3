//! Aggregate the results CSV into comparison tables, with JSON export.

use crate::{BenchError, BenchResult};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TrialRow {
    #[allow(dead_code)]
    ts: String,
    db: String,
    dataset: String,
    scenario: String,
    #[allow(dead_code)]
    repeat: u32,
    elapsed_ms: f64,
    #[allow(dead_code)]
    notes: String,
}

/// Aggregated trials for one (db, dataset, scenario) group.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioSummary {
    pub db: String,
    pub dataset: String,
    pub scenario: String,
    pub trials: u64,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
}

// ────────────────────────────────────────────────────────────────────────────────
// Aggregation
// ────────────────────────────────────────────────────────────────────────────────

/// Read a results CSV and fold it into per-group summaries, preserving
/// the order groups first appear in the file.
pub fn load_summaries(results: &Path) -> BenchResult<Vec<ScenarioSummary>> {
    let mut reader = csv::Reader::from_path(results)?;

    struct Acc {
        hist: Histogram<u64>,
        sum: f64,
        min: f64,
        max: f64,
        n: u64,
    }

    let mut groups: HashMap<(String, String, String), Acc> = HashMap::new();
    let mut order: Vec<(String, String, String)> = Vec::new();

    for row in reader.deserialize::<TrialRow>() {
        let row = row?;
        let key = (row.db, row.dataset, row.scenario);
        let acc = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Acc {
                // Microsecond resolution, 3 significant digits.
                hist: Histogram::new(3).expect("histogram sigfig in range"),
                sum: 0.0,
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
                n: 0,
            }
        });
        let micros = (row.elapsed_ms * 1000.0).max(0.0) as u64;
        acc.hist
            .record(micros)
            .map_err(|e| BenchError::Config(format!("elapsed out of range: {}", e)))?;
        acc.sum += row.elapsed_ms;
        acc.min = acc.min.min(row.elapsed_ms);
        acc.max = acc.max.max(row.elapsed_ms);
        acc.n += 1;
    }

    let mut summaries = Vec::with_capacity(order.len());
    for key in order {
        let acc = &groups[&key];
        summaries.push(ScenarioSummary {
            db: key.0,
            dataset: key.1,
            scenario: key.2,
            trials: acc.n,
            avg_ms: acc.sum / acc.n as f64,
            min_ms: acc.min,
            max_ms: acc.max,
            p50_ms: acc.hist.value_at_quantile(0.5) as f64 / 1000.0,
        });
    }
    Ok(summaries)
}

// ────────────────────────────────────────────────────────────────────────────────
// Terminal output
// ────────────────────────────────────────────────────────────────────────────────

/// Print a comparison table for one (dataset, scenario) across all
/// databases that ran it.
fn print_scenario_comparison(dataset: &str, scenario: &str, rows: &[&ScenarioSummary]) {
    if rows.is_empty() {
        return;
    }

    println!(
        "\n{}",
        format!("━━━ {} / {} ━━━", dataset, scenario).bold().cyan()
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(vec![
        "Database",
        "Trials",
        "Avg (ms)",
        "Min (ms)",
        "p50 (ms)",
        "Max (ms)",
    ]);

    // Lowest average is best.
    let best_avg = rows.iter().map(|r| r.avg_ms).fold(f64::INFINITY, f64::min);

    for r in rows {
        let is_best = (r.avg_ms - best_avg).abs() < 1e-9;
        let name = if is_best {
            format!("★ {}", r.db)
        } else {
            r.db.clone()
        };
        let name_cell = if is_best {
            Cell::new(name).fg(Color::Green)
        } else {
            Cell::new(name)
        };
        let avg_cell = if is_best {
            Cell::new(format!("{:.2}", r.avg_ms)).fg(Color::Green)
        } else {
            Cell::new(format!("{:.2}", r.avg_ms))
        };

        table.add_row(vec![
            name_cell,
            Cell::new(r.trials.to_string()),
            avg_cell,
            Cell::new(format!("{:.2}", r.min_ms)),
            Cell::new(format!("{:.2}", r.p50_ms)),
            Cell::new(format!("{:.2}", r.max_ms)),
        ]);
    }

    println!("{table}");
}

/// Print the full report: one table per (dataset, scenario), then a
/// wins-per-database tally.
pub fn print_report(summaries: &[ScenarioSummary]) {
    if summaries.is_empty() {
        println!("{}", "no trials recorded yet".yellow());
        return;
    }

    let mut by_group: HashMap<(String, String), Vec<&ScenarioSummary>> = HashMap::new();
    let mut group_order: Vec<(String, String)> = Vec::new();
    for s in summaries {
        let key = (s.dataset.clone(), s.scenario.clone());
        if !by_group.contains_key(&key) {
            group_order.push(key.clone());
        }
        by_group.entry(key).or_default().push(s);
    }

    for (dataset, scenario) in &group_order {
        if let Some(rows) = by_group.get(&(dataset.clone(), scenario.clone())) {
            print_scenario_comparison(dataset, scenario, rows);
        }
    }

    println!("\n{}", "── Summary: Wins by Database ──".bold().yellow());
    let mut wins: HashMap<String, usize> = HashMap::new();
    for rows in by_group.values() {
        if let Some(best) = rows
            .iter()
            .min_by(|a, b| a.avg_ms.partial_cmp(&b.avg_ms).unwrap())
        {
            *wins.entry(best.db.clone()).or_default() += 1;
        }
    }
    let mut win_list: Vec<_> = wins.into_iter().collect();
    win_list.sort_by(|a, b| b.1.cmp(&a.1));
    for (db, count) in &win_list {
        println!("  {} {} wins", format!("{:>12}", db).bold(), count);
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// JSON export
// ────────────────────────────────────────────────────────────────────────────────

pub fn export_json(summaries: &[ScenarioSummary], path: &Path) -> BenchResult<()> {
    let json = serde_json::to_string_pretty(summaries)
        .map_err(|e| BenchError::Config(format!("JSON export: {}", e)))?;
    std::fs::write(path, json)?;
    println!("  JSON exported to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_results(dir: &TempDir, rows: &[&str]) -> std::path::PathBuf {
        let path = dir.path().join("results.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "ts,db,dataset,scenario,repeat,elapsed_ms,notes").unwrap();
        for row in rows {
            writeln!(f, "{}", row).unwrap();
        }
        path
    }

    #[test]
    fn summaries_fold_repeats_into_one_group() {
        let dir = TempDir::new().unwrap();
        let path = write_results(
            &dir,
            &[
                "2026-01-01T00:00:00Z,sqlite,flights_10000,add_flight,1,2.00,ok",
                "2026-01-01T00:00:01Z,sqlite,flights_10000,add_flight,2,4.00,ok",
                "2026-01-01T00:00:02Z,sqlite,flights_10000,add_flight,3,6.00,ok",
            ],
        );

        let summaries = load_summaries(&path).unwrap();
        assert_eq!(summaries.len(), 1);
        let s = &summaries[0];
        assert_eq!(s.trials, 3);
        assert!((s.avg_ms - 4.0).abs() < 1e-9);
        assert!((s.min_ms - 2.0).abs() < 1e-9);
        assert!((s.max_ms - 6.0).abs() < 1e-9);
        assert!(s.p50_ms >= 3.9 && s.p50_ms <= 4.1);
    }

    #[test]
    fn group_order_follows_first_appearance() {
        let dir = TempDir::new().unwrap();
        let path = write_results(
            &dir,
            &[
                "2026-01-01T00:00:00Z,sqlite,ds,top_routes_month,1,1.00,ok",
                "2026-01-01T00:00:01Z,sqlite,ds,add_flight,1,1.00,ok",
                "2026-01-01T00:00:02Z,duckdb,ds,top_routes_month,1,1.00,ok",
            ],
        );

        let summaries = load_summaries(&path).unwrap();
        let keys: Vec<(&str, &str)> = summaries
            .iter()
            .map(|s| (s.db.as_str(), s.scenario.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("sqlite", "top_routes_month"),
                ("sqlite", "add_flight"),
                ("duckdb", "top_routes_month"),
            ]
        );
    }

    #[test]
    fn json_export_writes_every_group() {
        let dir = TempDir::new().unwrap();
        let path = write_results(
            &dir,
            &[
                "2026-01-01T00:00:00Z,sqlite,ds,add_flight,1,1.50,ok",
                "2026-01-01T00:00:01Z,duckdb,ds,add_flight,1,2.50,ok",
            ],
        );
        let summaries = load_summaries(&path).unwrap();
        let out = dir.path().join("report.json");
        export_json(&summaries, &out).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }
}
