//! Scenario execution engine.
//!
//! Strictly sequential: scenarios run in registration order, repeats run
//! `1..=repeats` in order (later repeats of stateful scenarios depend on
//! earlier ones), and every repeat is an isolated failure domain — a
//! failed invocation is reported with backend, scenario and repeat index,
//! writes no trial row, and never stops the remaining repeats or the next
//! scenario.

use crate::config::BenchConfig;
use crate::sink::{ResultsSink, TrialRecord};
use crate::{BenchResult, FlightId, FlightStore};
use colored::Colorize;
use std::collections::HashMap;

// ────────────────────────────────────────────────────────────────────────────────
// Run context
// ────────────────────────────────────────────────────────────────────────────────

/// Run-scoped state shared between scenarios of one backend × dataset
/// run. Created empty by [`run_scenarios`], mutated only by scenario
/// functions, dropped when the run ends — it never leaks across datasets
/// or backends.
#[derive(Debug, Default)]
pub struct RunContext {
    inserted: HashMap<(String, u32), FlightId>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the identifier produced by `scenario` at `iteration`.
    pub fn publish_id(&mut self, scenario: &str, iteration: u32, id: FlightId) {
        self.inserted.insert((scenario.to_string(), iteration), id);
    }

    /// Look up the identifier published by `scenario` at `iteration`.
    pub fn resolve_id(&self, scenario: &str, iteration: u32) -> Option<FlightId> {
        self.inserted
            .get(&(scenario.to_string(), iteration))
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Scenario contract
// ────────────────────────────────────────────────────────────────────────────────

/// Outcome of one successful scenario invocation: the duration measured
/// strictly around the backend-facing call, and a short note describing
/// the outcome cardinality (used for sanity-checking results, not just
/// logging).
#[derive(Debug, Clone)]
pub struct Invocation {
    pub elapsed_ms: f64,
    pub note: String,
}

/// Scenario function signature. `iteration` is the 1-based repeat counter
/// within the current scenario's run.
pub type ScenarioFn =
    fn(&mut dyn FlightStore, &BenchConfig, &mut RunContext, u32) -> BenchResult<Invocation>;

/// A named, timed unit of work executed against a backend under test.
pub struct Scenario {
    pub name: &'static str,
    pub run: ScenarioFn,
}

// ────────────────────────────────────────────────────────────────────────────────
// Engine loop
// ────────────────────────────────────────────────────────────────────────────────

/// Counters for one backend × dataset run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunStats {
    pub trials: u32,
    pub failures: u32,
}

/// Run every registered scenario `repeats` times against one backend and
/// one loaded dataset, appending a trial row per successful invocation.
///
/// Only a sink write failure aborts the run; scenario failures are scoped
/// to their own repeat.
pub fn run_scenarios(
    store: &mut dyn FlightStore,
    dataset: &str,
    cfg: &BenchConfig,
    registry: &[Scenario],
    sink: &mut ResultsSink,
) -> BenchResult<RunStats> {
    let db = store.name().to_string();
    let mut ctx = RunContext::new();
    let mut stats = RunStats::default();

    for scenario in registry {
        for repeat in 1..=cfg.repeats {
            match (scenario.run)(store, cfg, &mut ctx, repeat) {
                Ok(inv) => {
                    sink.append(&TrialRecord::new(
                        &db,
                        dataset,
                        scenario.name,
                        repeat,
                        inv.elapsed_ms,
                        inv.note.clone(),
                    ))?;
                    println!(
                        "[{}][{}][run={}] {:.2} ms :: {}",
                        db, scenario.name, repeat, inv.elapsed_ms, inv.note
                    );
                    stats.trials += 1;
                }
                Err(e) => {
                    eprintln!(
                        "  {} [{}][{}][run={}] {}",
                        "FAIL".red().bold(),
                        db,
                        scenario.name,
                        repeat,
                        e
                    );
                    stats.failures += 1;
                }
            }
        }
    }
    Ok(stats)
}
