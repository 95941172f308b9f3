//! Backend adapters implementing the [`FlightStore`](crate::FlightStore) contract.

pub mod sqlite_adapter;

#[cfg(feature = "duckdb-bench")]
pub mod duckdb_adapter;
