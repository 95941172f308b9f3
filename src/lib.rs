//! Shared types, the backend contract and error handling for flightbench.
//!
//! The crate drives repeatable, timed workloads against interchangeable
//! flight-data storage backends: a single-pass reservoir sampler carves
//! nested random subsets out of a large source CSV, and the execution
//! engine runs an ordered scenario registry against every backend that
//! implements [`FlightStore`], logging one durable trial row per timed
//! invocation.

pub mod adapters;
pub mod config;
pub mod engine;
pub mod report;
pub mod sampler;
pub mod scenarios;
pub mod sink;

use serde::Deserialize;
use std::path::Path;

/// Carrier code used by the synthetic bulk-write scenarios. Rows tagged
/// with it are created, mutated and deleted inside one run and never
/// overlap imported data.
pub const SYNTH_CARRIER: &str = "ZZ";

// ────────────────────────────────────────────────────────────────────────────────
// Error type
// ────────────────────────────────────────────────────────────────────────────────

pub type BenchResult<T> = std::result::Result<T, BenchError>;

#[derive(Debug)]
pub enum BenchError {
    Io(std::io::Error),
    Csv(csv::Error),
    Database(String),
    Config(String),
}

impl std::fmt::Display for BenchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchError::Io(e) => write!(f, "IO error: {}", e),
            BenchError::Csv(e) => write!(f, "CSV error: {}", e),
            BenchError::Database(s) => write!(f, "Database error: {}", s),
            BenchError::Config(s) => write!(f, "Config error: {}", s),
        }
    }
}

impl std::error::Error for BenchError {}

impl From<std::io::Error> for BenchError {
    fn from(e: std::io::Error) -> Self {
        BenchError::Io(e)
    }
}

impl From<csv::Error> for BenchError {
    fn from(e: csv::Error) -> Self {
        BenchError::Csv(e)
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Flight data model
// ────────────────────────────────────────────────────────────────────────────────

/// Backend-assigned identifier of one logical flight row.
pub type FlightId = i64;

/// One scheduled flight, as configured for the insert scenarios.
#[derive(Debug, Clone, Deserialize)]
pub struct Flight {
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub month: u32,
    #[serde(default)]
    pub day_of_month: u32,
    #[serde(default)]
    pub day_of_week: u32,
    pub fl_date: String,
    #[serde(default = "default_carrier")]
    pub op_unique_carrier: String,
    #[serde(default)]
    pub op_carrier_fl_num: String,
    pub origin: String,
    pub dest: String,
    #[serde(default)]
    pub crs_dep_time: i32,
    #[serde(default)]
    pub crs_arr_time: i32,
    #[serde(default)]
    pub crs_elapsed_time: i32,
    #[serde(default)]
    pub distance: i32,
}

fn default_carrier() -> String {
    SYNTH_CARRIER.to_string()
}

/// Per-flight performance figures attached by the stats scenario.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlightPerf {
    #[serde(default)]
    pub dep_time: i32,
    #[serde(default)]
    pub dep_delay: i32,
    #[serde(default)]
    pub taxi_out: i32,
    #[serde(default)]
    pub wheels_off: i32,
    #[serde(default)]
    pub wheels_on: i32,
    #[serde(default)]
    pub taxi_in: i32,
    #[serde(default)]
    pub arr_time: i32,
    #[serde(default)]
    pub arr_delay: i32,
    #[serde(default)]
    pub actual_elapsed_time: i32,
    #[serde(default)]
    pub air_time: i32,
    #[serde(default)]
    pub diverted: bool,
}

/// Delay breakdown for flights that were delayed; `flight_index` selects
/// which insert iteration (0-based) the breakdown belongs to.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DelayBreakdown {
    #[serde(default)]
    pub flight_index: u32,
    #[serde(default)]
    pub carrier_delay: i32,
    #[serde(default)]
    pub weather_delay: i32,
    #[serde(default)]
    pub nas_delay: i32,
    #[serde(default)]
    pub security_delay: i32,
    #[serde(default)]
    pub late_aircraft_delay: i32,
}

/// One route with its flight count, as returned by the top-routes query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteCount {
    pub origin: String,
    pub dest: String,
    pub flights: u64,
}

/// One carrier with its punctuality score (lower is better).
#[derive(Debug, Clone)]
pub struct AirlineScore {
    pub carrier: String,
    pub avg_arr_delay: f64,
    pub cancelled: u64,
    pub total_flights: u64,
    pub score: f64,
}

// ────────────────────────────────────────────────────────────────────────────────
// FlightStore trait — every backend adapter implements this
// ────────────────────────────────────────────────────────────────────────────────

/// Unified backend contract. The engine never branches on backend
/// identity beyond the `name()` label; adding a backend means
/// implementing this trait, nothing else changes.
pub trait FlightStore {
    fn name(&self) -> &str;

    // ── lifecycle hooks ──

    /// Clear all prior trial data before a dataset's run begins.
    fn reset(&mut self) -> BenchResult<()>;

    /// Bulk-load a sample CSV produced by the sampler. Returns the number
    /// of flight rows imported.
    fn import(&mut self, sample: &Path) -> BenchResult<usize>;

    // ── stateful writes ──

    fn insert_flight(&mut self, flight: &Flight) -> BenchResult<FlightId>;

    fn insert_flight_stats(
        &mut self,
        id: FlightId,
        perf: &FlightPerf,
        delay: Option<&DelayBreakdown>,
    ) -> BenchResult<()>;

    /// Recovery query for the stats scenario: the most recently inserted
    /// flight that has no performance row yet.
    fn latest_flight_without_stats(&mut self) -> BenchResult<Option<FlightId>>;

    // ── reads and aggregations ──

    fn count_by_carrier_in_range(
        &mut self,
        carrier: &str,
        date_from: &str,
        date_to: &str,
        limit: u32,
    ) -> BenchResult<usize>;

    /// Routes of one calendar month ranked by flight count, descending.
    fn top_routes_for_month(&mut self, month: u32, limit: u32) -> BenchResult<Vec<RouteCount>>;

    /// Arrival-delay histogram: one count per `[bins[i], bins[i+1])`
    /// bucket plus a trailing out-of-range bucket.
    fn arr_delay_histogram(&mut self, bins: &[i64]) -> BenchResult<Vec<u64>>;

    fn route_with_stats(
        &mut self,
        origin: &str,
        dest: &str,
        date_from: &str,
        date_to: &str,
        limit: u32,
    ) -> BenchResult<usize>;

    fn rank_airlines(
        &mut self,
        month: u32,
        cancellation_weight: f64,
        limit: u32,
    ) -> BenchResult<Vec<AirlineScore>>;

    // ── bulk mutations on the synthetic carrier ──

    fn insert_synthetic_batch(&mut self, carrier: &str, count: u32) -> BenchResult<usize>;

    fn bump_delay_for_carrier(&mut self, carrier: &str, minutes: i64) -> BenchResult<usize>;

    fn delete_by_carrier(&mut self, carrier: &str) -> BenchResult<usize>;
}
