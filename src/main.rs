//! Flight-data benchmark runner.
//!
//! Usage:
//!   flightbench sample --src flights.csv --out data/        # carve nested samples
//!   flightbench run --config bench_config.yml               # run all backends
//!   flightbench run --config bench_config.yml --skip duckdb # skip a backend
//!   flightbench report --results results.csv                # aggregate trials

use clap::{Parser, Subcommand};
use colored::Colorize;
use flightbench::adapters::sqlite_adapter::SqliteAdapter;
use flightbench::config::BenchConfig;
use flightbench::engine::run_scenarios;
use flightbench::sink::ResultsSink;
use flightbench::{report, sampler, scenarios, BenchError, BenchResult, FlightStore};
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(Parser, Debug)]
#[command(name = "flightbench", about = "Comparative flight-data database benchmark")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Carve uniform random samples out of a large source CSV.
    Sample {
        /// Source CSV with one header row.
        #[arg(long)]
        src: PathBuf,

        /// Output directory for the sample files.
        #[arg(long, default_value = "data")]
        out: PathBuf,

        /// Sample sizes, in rows.
        #[arg(long, value_delimiter = ',', default_values_t = [10_000usize, 100_000, 1_000_000])]
        sizes: Vec<usize>,

        /// RNG seed; identical seeds over identical sources reproduce the
        /// same samples.
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Run the scenario suite against every backend and dataset.
    Run {
        /// Benchmark configuration file.
        #[arg(long, default_value = "bench_config.yml")]
        config: PathBuf,

        /// Results CSV, appended to across runs.
        #[arg(long, default_value = "results.csv")]
        results: PathBuf,

        /// Skip backends (comma-separated: sqlite, duckdb).
        #[arg(long, value_delimiter = ',')]
        skip: Vec<String>,

        /// Directory for backend data files; a temporary directory is
        /// used when omitted.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Aggregate and print the results CSV.
    Report {
        /// Results CSV produced by `run`.
        #[arg(long, default_value = "results.csv")]
        results: PathBuf,

        /// Also export the aggregation as JSON to this path.
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

fn main() -> BenchResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Sample { src, out, sizes, seed } => {
            sampler::make_samples(&src, &out, &sizes, seed)?;
            Ok(())
        }
        Command::Run { config, results, skip, data_dir } => run(config, results, skip, data_dir),
        Command::Report { results, export } => {
            let summaries = report::load_summaries(&results)?;
            report::print_report(&summaries);
            if let Some(path) = export {
                report::export_json(&summaries, &path)?;
            }
            Ok(())
        }
    }
}

fn run(
    config: PathBuf,
    results: PathBuf,
    skip: Vec<String>,
    data_dir: Option<PathBuf>,
) -> BenchResult<()> {
    let cfg = BenchConfig::load(&config)?;
    let skip: Vec<String> = skip.iter().map(|s| s.to_lowercase()).collect();

    println!(
        "\n{}",
        "╔══════════════════════════════════════════════════════╗".bold().blue()
    );
    println!(
        "{}",
        "║        Flight-Data Comparative Benchmark            ║".bold().blue()
    );
    println!(
        "{}",
        "╚══════════════════════════════════════════════════════╝".bold().blue()
    );
    println!("  Repeats: {}  Datasets: {}", cfg.repeats, cfg.datasets.len());

    // Backend files live under --data-dir when given, otherwise a
    // temporary directory cleaned up at exit.
    let tmp;
    let dir = match &data_dir {
        Some(d) => {
            std::fs::create_dir_all(d)?;
            d.clone()
        }
        None => {
            tmp = TempDir::new()?;
            tmp.path().to_path_buf()
        }
    };

    let mut backends: Vec<Box<dyn FlightStore>> = Vec::new();
    if !skip.contains(&"sqlite".to_string()) {
        match SqliteAdapter::new(&dir) {
            Ok(db) => backends.push(Box::new(db)),
            Err(e) => eprintln!("  {} SQLite: {}", "SKIP".yellow(), e),
        }
    }
    #[cfg(feature = "duckdb-bench")]
    {
        if !skip.contains(&"duckdb".to_string()) {
            use flightbench::adapters::duckdb_adapter::DuckDbAdapter;
            match DuckDbAdapter::new(&dir) {
                Ok(db) => backends.push(Box::new(db)),
                Err(e) => eprintln!("  {} DuckDB: {}", "SKIP".yellow(), e),
            }
        }
    }

    if backends.is_empty() {
        return Err(BenchError::Config(
            "No backends to benchmark. Check --skip flags.".into(),
        ));
    }
    println!(
        "  Backends: {}",
        backends.iter().map(|b| b.name()).collect::<Vec<_>>().join(", ")
    );

    let mut sink = ResultsSink::open(&results)?;
    let registry = scenarios::registry();

    for backend in &mut backends {
        for dataset in &cfg.datasets {
            println!(
                "\n{} {} / {}",
                "▶".bold().green(),
                backend.name().bold(),
                dataset.label
            );

            // A backend that cannot be prepared for this dataset skips
            // only this backend × dataset pair.
            if let Err(e) = backend.reset() {
                eprintln!("  {} reset: {}", "SKIP".yellow(), e);
                continue;
            }
            match backend.import(&dataset.path) {
                Ok(rows) => println!("  imported {} rows from {}", rows, dataset.path.display()),
                Err(e) => {
                    eprintln!("  {} import {}: {}", "SKIP".yellow(), dataset.path.display(), e);
                    continue;
                }
            }

            let stats =
                run_scenarios(backend.as_mut(), &dataset.label, &cfg, &registry, &mut sink)?;
            println!(
                "  {} trials, {} failures",
                stats.trials,
                if stats.failures > 0 {
                    stats.failures.to_string().red().to_string()
                } else {
                    stats.failures.to_string()
                }
            );
        }
    }

    println!("\n  results appended to {}", results.display());
    Ok(())
}
