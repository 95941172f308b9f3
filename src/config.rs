//! Benchmark configuration loaded from YAML.
//!
//! Every field carries a default so a minimal config (or none at all)
//! still produces a runnable benchmark; `BenchConfig::load` is the only
//! file I/O entry point.

use crate::{BenchError, BenchResult, DelayBreakdown, Flight, FlightPerf};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level benchmark configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BenchConfig {
    /// Trial count per scenario. Repeats run sequentially because later
    /// repeats of stateful scenarios depend on earlier ones.
    #[serde(default = "default_repeats")]
    pub repeats: u32,
    /// Sample files to benchmark, each a full backend load.
    #[serde(default)]
    pub datasets: Vec<DatasetSpec>,
    #[serde(default)]
    pub queries: Queries,
    #[serde(default)]
    pub crud: CrudConfig,
}

fn default_repeats() -> u32 {
    3
}

/// One dataset: a label for the results log and the sample file to import.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetSpec {
    pub label: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Queries {
    #[serde(default)]
    pub read_by_carrier_day: CarrierDayQuery,
    #[serde(default)]
    pub top_routes_month: TopRoutesQuery,
    #[serde(default)]
    pub histogram_arr_delay: HistogramQuery,
    #[serde(default)]
    pub find_all_flights_on_route: RouteQueries,
    #[serde(default)]
    pub airlines_ranking: RankingQuery,
    #[serde(default)]
    pub insert_flight: InsertFlightConfig,
    #[serde(default)]
    pub update_flight: UpdateFlightConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CarrierDayQuery {
    pub carrier: String,
    pub date_from: String,
    pub date_to: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for CarrierDayQuery {
    fn default() -> Self {
        Self {
            carrier: "AA".to_string(),
            date_from: "2024-01-01".to_string(),
            date_to: "2024-01-07".to_string(),
            limit: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopRoutesQuery {
    #[serde(default = "default_top_limit")]
    pub limit: u32,
}

impl Default for TopRoutesQuery {
    fn default() -> Self {
        Self {
            limit: default_top_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistogramQuery {
    /// Bucket boundaries in minutes of arrival delay, ascending.
    #[serde(default = "default_bins")]
    pub bins: Vec<i64>,
}

impl Default for HistogramQuery {
    fn default() -> Self {
        Self {
            bins: default_bins(),
        }
    }
}

fn default_bins() -> Vec<i64> {
    vec![-60, -30, 0, 30, 60, 120]
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteQueries {
    #[serde(default = "default_limit_1000")]
    pub limit: u32,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

impl Default for RouteQueries {
    fn default() -> Self {
        Self {
            limit: default_limit_1000(),
            routes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteSpec {
    pub origin: String,
    pub dest: String,
    pub date_from: String,
    pub date_to: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingQuery {
    #[serde(default = "default_top_limit")]
    pub limit: u32,
    #[serde(default = "default_cancellation_weight")]
    pub cancellation_weight: f64,
}

impl Default for RankingQuery {
    fn default() -> Self {
        Self {
            limit: default_top_limit(),
            cancellation_weight: default_cancellation_weight(),
        }
    }
}

fn default_cancellation_weight() -> f64 {
    3.0
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsertFlightConfig {
    /// Flights consumed round-robin by the `add_flight` scenario, one per
    /// iteration.
    #[serde(default)]
    pub flights: Vec<Flight>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFlightConfig {
    /// Performance rows consumed by `add_flight_stats`, matched to insert
    /// iterations by position.
    #[serde(default)]
    pub flight_performance: Vec<FlightPerf>,
    /// Sparse delay breakdowns keyed by 0-based `flight_index`.
    #[serde(default)]
    pub flights_delayed: Vec<DelayBreakdown>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrudConfig {
    #[serde(default = "default_write_sample")]
    pub sample_size_for_writes: u32,
}

impl Default for CrudConfig {
    fn default() -> Self {
        Self {
            sample_size_for_writes: default_write_sample(),
        }
    }
}

fn default_write_sample() -> u32 {
    1000
}

fn default_limit() -> u32 {
    500
}

fn default_limit_1000() -> u32 {
    1000
}

fn default_top_limit() -> u32 {
    10
}

impl BenchConfig {
    /// Load a benchmark configuration from a YAML file.
    pub fn load(path: &Path) -> BenchResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| BenchError::Config(format!("read {}: {}", path.display(), e)))?;
        serde_yaml::from_str(&content)
            .map_err(|e| BenchError::Config(format!("parse {}: {}", path.display(), e)))
    }
}
