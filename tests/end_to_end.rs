//! Full pipeline: sample a synthetic source CSV, import into SQLite,
//! run the whole scenario registry, and check the durable results.

use flightbench::adapters::sqlite_adapter::SqliteAdapter;
use flightbench::config::BenchConfig;
use flightbench::engine::run_scenarios;
use flightbench::sampler::make_samples;
use flightbench::scenarios;
use flightbench::sink::ResultsSink;
use flightbench::FlightStore;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CARRIERS: [&str; 4] = ["AA", "DL", "UA", "WN"];
const ROUTES: [(&str, &str); 3] = [("JFK", "LAX"), ("ATL", "ORD"), ("SEA", "DEN")];

/// Deterministic synthetic source: `rows` flights spread over carriers,
/// routes and the first six months of 2024.
fn write_source(dir: &Path, rows: usize) -> PathBuf {
    let path = dir.join("flights.csv");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(
        f,
        "year,month,day_of_month,fl_date,op_unique_carrier,op_carrier_fl_num,origin,dest,dep_delay,arr_delay,cancelled"
    )
    .unwrap();
    for i in 0..rows {
        let month = (i % 6) + 1;
        let day = (i % 28) + 1;
        let carrier = CARRIERS[i % CARRIERS.len()];
        let (origin, dest) = ROUTES[i % ROUTES.len()];
        let cancelled = if i % 97 == 0 { 1 } else { 0 };
        writeln!(
            f,
            "2024,{},{},2024-{:02}-{:02},{},{},{},{},{},{},{}",
            month,
            day,
            month,
            day,
            carrier,
            1000 + i,
            origin,
            dest,
            (i % 40) as i64 - 10,
            (i % 90) as i64 - 20,
            cancelled
        )
        .unwrap();
    }
    path
}

fn write_config(dir: &Path, dataset: &Path) -> PathBuf {
    let yaml = format!(
        r#"
repeats: 2
datasets:
  - label: flights_200
    path: {}
queries:
  read_by_carrier_day:
    carrier: AA
    date_from: "2024-01-01"
    date_to: "2024-06-30"
    limit: 500
  top_routes_month:
    limit: 5
  histogram_arr_delay:
    bins: [-60, -30, 0, 30, 60, 120]
  find_all_flights_on_route:
    limit: 1000
    routes:
      - {{origin: JFK, dest: LAX, date_from: "2024-01-01", date_to: "2024-06-30"}}
      - {{origin: ATL, dest: ORD, date_from: "2024-01-01", date_to: "2024-06-30"}}
  airlines_ranking:
    limit: 10
    cancellation_weight: 3.0
  insert_flight:
    flights:
      - {{fl_date: "2024-07-01", origin: BOS, dest: MIA, op_unique_carrier: B6, op_carrier_fl_num: "700", year: 2024, month: 7}}
      - {{fl_date: "2024-07-02", origin: MIA, dest: BOS, op_unique_carrier: B6, op_carrier_fl_num: "701", year: 2024, month: 7}}
  update_flight:
    flight_performance:
      - {{dep_delay: 5, arr_delay: 12}}
      - {{dep_delay: 0, arr_delay: -3}}
    flights_delayed:
      - {{flight_index: 0, carrier_delay: 12, weather_delay: 0}}
crud:
  sample_size_for_writes: 100
"#,
        dataset.display()
    );
    let path = dir.join("bench_config.yml");
    std::fs::write(&path, yaml).unwrap();
    path
}

#[test]
fn sample_import_run_report_pipeline() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), 500);

    // Sampling: both sizes come out exact and nested.
    let out = dir.path().join("data");
    let outcomes = make_samples(&source, &out, &[50, 200], 7).unwrap();
    assert_eq!(outcomes.len(), 2);
    let sample = out.join("flights_200.csv");
    {
        let mut reader = csv::Reader::from_path(&sample).unwrap();
        assert_eq!(reader.records().count(), 200);
    }

    let cfg = BenchConfig::load(&write_config(dir.path(), &sample)).unwrap();
    assert_eq!(cfg.repeats, 2);
    assert_eq!(cfg.datasets.len(), 1);

    // Import into a fresh backend.
    let mut store = SqliteAdapter::new(dir.path()).unwrap();
    store.reset().unwrap();
    assert_eq!(store.import(&sample).unwrap(), 200);

    // Run the whole registry; every repeat must succeed and write a row.
    let results = dir.path().join("results.csv");
    let mut sink = ResultsSink::open(&results).unwrap();
    let registry = scenarios::registry();
    let stats = run_scenarios(
        &mut store,
        &cfg.datasets[0].label,
        &cfg,
        &registry,
        &mut sink,
    )
    .unwrap();
    assert_eq!(stats.failures, 0);
    assert_eq!(stats.trials as usize, registry.len() * 2);

    // Durable rows: header plus one row per trial, all well-formed.
    let mut reader = csv::Reader::from_path(&results).unwrap();
    assert_eq!(
        reader.headers().unwrap(),
        &csv::StringRecord::from(vec![
            "ts", "db", "dataset", "scenario", "repeat", "elapsed_ms", "notes"
        ])
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), registry.len() * 2);
    for row in &rows {
        assert_eq!(row.get(1), Some("sqlite"));
        assert_eq!(row.get(2), Some("flights_200"));
        let elapsed: f64 = row.get(5).unwrap().parse().unwrap();
        assert!(elapsed >= 0.0);
    }

    // The synthetic carrier cleans up after itself.
    assert_eq!(store.delete_by_carrier("ZZ").unwrap(), 0);

    // Aggregation sees one group per scenario.
    let summaries = flightbench::report::load_summaries(&results).unwrap();
    assert_eq!(summaries.len(), registry.len());
    for s in &summaries {
        assert_eq!(s.trials, 2);
        assert!(s.min_ms <= s.avg_ms && s.avg_ms <= s.max_ms);
    }
}

#[test]
fn rerun_appends_without_duplicating_the_header() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), 120);
    let out = dir.path().join("data");
    make_samples(&source, &out, &[100], 7).unwrap();
    let sample = out.join("flights_100.csv");

    let cfg = BenchConfig::load(&write_config(dir.path(), &sample)).unwrap();
    let mut store = SqliteAdapter::new(dir.path()).unwrap();
    let results = dir.path().join("results.csv");
    let registry = scenarios::registry();

    for _ in 0..2 {
        store.reset().unwrap();
        store.import(&sample).unwrap();
        let mut sink = ResultsSink::open(&results).unwrap();
        run_scenarios(&mut store, "flights_100", &cfg, &registry, &mut sink).unwrap();
    }

    let content = std::fs::read_to_string(&results).unwrap();
    assert_eq!(content.matches("ts,db,dataset").count(), 1);
    let mut reader = csv::Reader::from_path(&results).unwrap();
    assert_eq!(reader.records().count(), registry.len() * 2 * 2);
}
