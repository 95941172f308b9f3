//! DuckDB adapter, behind the `duckdb-bench` feature.
//!
//! Same relational layout as the SQLite adapter. DuckDB has no
//! `last_insert_rowid`, so flight ids are assigned client-side from a
//! counter seeded off `MAX(flight_id)` at open.

use crate::{
    AirlineScore, BenchError, BenchResult, DelayBreakdown, Flight, FlightId, FlightPerf,
    FlightStore, RouteCount,
};
use duckdb::{params, Connection};
use std::collections::HashMap;
use std::path::Path;

pub struct DuckDbAdapter {
    conn: Connection,
    next_id: FlightId,
}

impl DuckDbAdapter {
    pub fn new(dir: &Path) -> BenchResult<Self> {
        let path = dir.join("flightbench.duckdb");
        let conn = Connection::open(&path)
            .map_err(|e| BenchError::Database(format!("DuckDB open: {}", e)))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS flights (
                flight_id         BIGINT PRIMARY KEY,
                year              INTEGER,
                month             INTEGER,
                day_of_month      INTEGER,
                day_of_week      INTEGER,
                fl_date           VARCHAR NOT NULL,
                op_unique_carrier VARCHAR,
                op_carrier_fl_num VARCHAR,
                origin            VARCHAR,
                dest              VARCHAR,
                crs_dep_time      INTEGER,
                crs_arr_time      INTEGER,
                crs_elapsed_time  INTEGER,
                distance          INTEGER
            );
            CREATE TABLE IF NOT EXISTS flights_performance (
                flight_id           BIGINT PRIMARY KEY,
                dep_time            INTEGER,
                dep_delay           INTEGER,
                taxi_out            INTEGER,
                wheels_off          INTEGER,
                wheels_on           INTEGER,
                taxi_in             INTEGER,
                arr_time            INTEGER,
                arr_delay           INTEGER,
                actual_elapsed_time INTEGER,
                air_time            INTEGER,
                diverted            INTEGER
            );
            CREATE TABLE IF NOT EXISTS flights_delayed (
                flight_id           BIGINT PRIMARY KEY,
                carrier_delay       INTEGER,
                weather_delay       INTEGER,
                nas_delay           INTEGER,
                security_delay      INTEGER,
                late_aircraft_delay INTEGER
            );
            CREATE TABLE IF NOT EXISTS flights_cancelled (
                flight_id         BIGINT PRIMARY KEY,
                cancellation_code VARCHAR
            );",
        )
        .map_err(|e| BenchError::Database(format!("DuckDB schema: {}", e)))?;

        let next_id: FlightId = conn
            .query_row("SELECT COALESCE(MAX(flight_id), 0) + 1 FROM flights", [], |row| {
                row.get(0)
            })
            .map_err(|e| BenchError::Database(format!("DuckDB seed id: {}", e)))?;

        Ok(Self { conn, next_id })
    }

    fn take_id(&mut self) -> FlightId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

struct ColumnMap(HashMap<String, usize>);

impl ColumnMap {
    fn new(header: &csv::StringRecord) -> Self {
        Self(
            header
                .iter()
                .enumerate()
                .map(|(i, name)| (name.trim().to_ascii_lowercase(), i))
                .collect(),
        )
    }

    fn text<'r>(&self, record: &'r csv::StringRecord, name: &str) -> Option<&'r str> {
        self.0
            .get(name)
            .and_then(|&i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn int(&self, record: &csv::StringRecord, name: &str) -> Option<i64> {
        self.text(record, name)
            .and_then(|s| s.parse::<f64>().ok())
            .map(|v| v as i64)
    }
}

impl FlightStore for DuckDbAdapter {
    fn name(&self) -> &str {
        "duckdb"
    }

    fn reset(&mut self) -> BenchResult<()> {
        self.conn
            .execute_batch(
                "DELETE FROM flights_performance;
                 DELETE FROM flights_delayed;
                 DELETE FROM flights_cancelled;
                 DELETE FROM flights;",
            )
            .map_err(|e| BenchError::Database(format!("reset: {}", e)))?;
        self.next_id = 1;
        Ok(())
    }

    fn import(&mut self, sample: &Path) -> BenchResult<usize> {
        let mut reader = csv::Reader::from_path(sample)?;
        let columns = ColumnMap::new(reader.headers()?);

        let mut next_id = self.next_id;
        let tx = self
            .conn
            .transaction()
            .map_err(|e| BenchError::Database(format!("begin import: {}", e)))?;
        let mut imported = 0usize;
        {
            let mut insert_flight = tx
                .prepare_cached(
                    "INSERT INTO flights (flight_id, year, month, day_of_month, day_of_week,
                        fl_date, op_unique_carrier, op_carrier_fl_num, origin, dest,
                        crs_dep_time, crs_arr_time, crs_elapsed_time, distance)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .map_err(|e| BenchError::Database(format!("prepare import: {}", e)))?;
            let mut insert_perf = tx
                .prepare_cached(
                    "INSERT INTO flights_performance (flight_id, dep_time, dep_delay, taxi_out,
                        wheels_off, wheels_on, taxi_in, arr_time, arr_delay,
                        actual_elapsed_time, air_time, diverted)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .map_err(|e| BenchError::Database(format!("prepare import: {}", e)))?;
            let mut insert_cancelled = tx
                .prepare_cached(
                    "INSERT INTO flights_cancelled (flight_id, cancellation_code) VALUES (?, ?)",
                )
                .map_err(|e| BenchError::Database(format!("prepare import: {}", e)))?;

            for record in reader.records() {
                let record = record?;
                let fl_date = match columns.text(&record, "fl_date") {
                    Some(d) => d,
                    None => continue,
                };
                let flight_id = next_id;
                next_id += 1;
                insert_flight
                    .execute(params![
                        flight_id,
                        columns.int(&record, "year"),
                        columns.int(&record, "month"),
                        columns.int(&record, "day_of_month"),
                        columns.int(&record, "day_of_week"),
                        fl_date,
                        columns.text(&record, "op_unique_carrier"),
                        columns.text(&record, "op_carrier_fl_num"),
                        columns.text(&record, "origin"),
                        columns.text(&record, "dest"),
                        columns.int(&record, "crs_dep_time"),
                        columns.int(&record, "crs_arr_time"),
                        columns.int(&record, "crs_elapsed_time"),
                        columns.int(&record, "distance"),
                    ])
                    .map_err(|e| BenchError::Database(format!("import flight: {}", e)))?;
                imported += 1;

                let has_perf = columns.int(&record, "arr_delay").is_some()
                    || columns.int(&record, "dep_delay").is_some()
                    || columns.int(&record, "dep_time").is_some();
                if has_perf {
                    insert_perf
                        .execute(params![
                            flight_id,
                            columns.int(&record, "dep_time"),
                            columns.int(&record, "dep_delay"),
                            columns.int(&record, "taxi_out"),
                            columns.int(&record, "wheels_off"),
                            columns.int(&record, "wheels_on"),
                            columns.int(&record, "taxi_in"),
                            columns.int(&record, "arr_time"),
                            columns.int(&record, "arr_delay"),
                            columns.int(&record, "actual_elapsed_time"),
                            columns.int(&record, "air_time"),
                            columns.int(&record, "diverted").unwrap_or(0),
                        ])
                        .map_err(|e| BenchError::Database(format!("import perf: {}", e)))?;
                }

                if columns.int(&record, "cancelled").unwrap_or(0) == 1 {
                    insert_cancelled
                        .execute(params![flight_id, columns.text(&record, "cancellation_code")])
                        .map_err(|e| BenchError::Database(format!("import cancelled: {}", e)))?;
                }
            }
        }
        tx.commit()
            .map_err(|e| BenchError::Database(format!("commit import: {}", e)))?;
        self.next_id = next_id;
        Ok(imported)
    }

    fn insert_flight(&mut self, flight: &Flight) -> BenchResult<FlightId> {
        let id = self.take_id();
        self.conn
            .execute(
                "INSERT INTO flights (flight_id, year, month, day_of_month, day_of_week,
                    fl_date, op_unique_carrier, op_carrier_fl_num, origin, dest,
                    crs_dep_time, crs_arr_time, crs_elapsed_time, distance)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    id,
                    flight.year,
                    flight.month,
                    flight.day_of_month,
                    flight.day_of_week,
                    flight.fl_date,
                    flight.op_unique_carrier,
                    flight.op_carrier_fl_num,
                    flight.origin,
                    flight.dest,
                    flight.crs_dep_time,
                    flight.crs_arr_time,
                    flight.crs_elapsed_time,
                    flight.distance,
                ],
            )
            .map_err(|e| BenchError::Database(format!("insert flight: {}", e)))?;
        Ok(id)
    }

    fn insert_flight_stats(
        &mut self,
        id: FlightId,
        perf: &FlightPerf,
        delay: Option<&DelayBreakdown>,
    ) -> BenchResult<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| BenchError::Database(format!("begin stats: {}", e)))?;
        if let Some(d) = delay {
            tx.execute(
                "INSERT INTO flights_delayed (flight_id, carrier_delay, weather_delay,
                    nas_delay, security_delay, late_aircraft_delay)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    id,
                    d.carrier_delay,
                    d.weather_delay,
                    d.nas_delay,
                    d.security_delay,
                    d.late_aircraft_delay,
                ],
            )
            .map_err(|e| BenchError::Database(format!("insert delayed: {}", e)))?;
        }
        tx.execute(
            "INSERT INTO flights_performance (flight_id, dep_time, dep_delay, taxi_out,
                wheels_off, wheels_on, taxi_in, arr_time, arr_delay,
                actual_elapsed_time, air_time, diverted)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                perf.dep_time,
                perf.dep_delay,
                perf.taxi_out,
                perf.wheels_off,
                perf.wheels_on,
                perf.taxi_in,
                perf.arr_time,
                perf.arr_delay,
                perf.actual_elapsed_time,
                perf.air_time,
                perf.diverted,
            ],
        )
        .map_err(|e| BenchError::Database(format!("insert performance: {}", e)))?;
        tx.commit()
            .map_err(|e| BenchError::Database(format!("commit stats: {}", e)))?;
        Ok(())
    }

    fn latest_flight_without_stats(&mut self) -> BenchResult<Option<FlightId>> {
        self.conn
            .query_row(
                "SELECT MAX(f.flight_id) FROM flights f
                 WHERE NOT EXISTS (
                     SELECT 1 FROM flights_performance p WHERE p.flight_id = f.flight_id
                 )",
                [],
                |row| row.get(0),
            )
            .map_err(|e| BenchError::Database(format!("recovery: {}", e)))
    }

    fn count_by_carrier_in_range(
        &mut self,
        carrier: &str,
        date_from: &str,
        date_to: &str,
        limit: u32,
    ) -> BenchResult<usize> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM (
                     SELECT 1 FROM flights
                     WHERE op_unique_carrier = ? AND fl_date BETWEEN ? AND ?
                     LIMIT ?
                 )",
                params![carrier, date_from, date_to, limit],
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n as usize)
            .map_err(|e| BenchError::Database(format!("carrier read: {}", e)))
    }

    fn top_routes_for_month(&mut self, month: u32, limit: u32) -> BenchResult<Vec<RouteCount>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT origin, dest, COUNT(*) AS flights_count
                 FROM flights
                 WHERE month = ?
                 GROUP BY origin, dest
                 ORDER BY flights_count DESC
                 LIMIT ?",
            )
            .map_err(|e| BenchError::Database(format!("prepare top routes: {}", e)))?;
        let rows = stmt
            .query_map(params![month, limit], |row| {
                Ok(RouteCount {
                    origin: row.get(0)?,
                    dest: row.get(1)?,
                    flights: row.get::<_, i64>(2)? as u64,
                })
            })
            .map_err(|e| BenchError::Database(format!("top routes: {}", e)))?;
        let mut routes = Vec::new();
        for r in rows {
            routes.push(r.map_err(|e| BenchError::Database(format!("row: {}", e)))?);
        }
        Ok(routes)
    }

    fn arr_delay_histogram(&mut self, bins: &[i64]) -> BenchResult<Vec<u64>> {
        if bins.len() < 2 {
            return Ok(Vec::new());
        }
        let mut parts = Vec::with_capacity(bins.len());
        for window in bins.windows(2) {
            parts.push(format!(
                "COALESCE(SUM(CASE WHEN arr_delay >= {} AND arr_delay < {} THEN 1 ELSE 0 END), 0)",
                window[0], window[1]
            ));
        }
        parts.push(format!(
            "COALESCE(SUM(CASE WHEN arr_delay < {} OR arr_delay >= {} OR arr_delay IS NULL \
             THEN 1 ELSE 0 END), 0)",
            bins[0],
            bins[bins.len() - 1]
        ));
        let sql = format!("SELECT {} FROM flights_performance", parts.join(", "));

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| BenchError::Database(format!("prepare histogram: {}", e)))?;
        let counts: Vec<u64> = stmt
            .query_row([], |row| {
                let mut out = Vec::with_capacity(bins.len());
                for i in 0..bins.len() {
                    out.push(row.get::<_, i64>(i)? as u64);
                }
                Ok(out)
            })
            .map_err(|e| BenchError::Database(format!("histogram: {}", e)))?;
        Ok(counts)
    }

    fn route_with_stats(
        &mut self,
        origin: &str,
        dest: &str,
        date_from: &str,
        date_to: &str,
        limit: u32,
    ) -> BenchResult<usize> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM (
                     SELECT f.flight_id
                     FROM flights f
                     LEFT JOIN flights_performance p ON f.flight_id = p.flight_id
                     LEFT JOIN flights_delayed d ON f.flight_id = d.flight_id
                     LEFT JOIN flights_cancelled c ON f.flight_id = c.flight_id
                     WHERE f.origin = ? AND f.dest = ?
                       AND f.fl_date BETWEEN ? AND ?
                     LIMIT ?
                 )",
                params![origin, dest, date_from, date_to, limit],
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n as usize)
            .map_err(|e| BenchError::Database(format!("route stats: {}", e)))
    }

    fn rank_airlines(
        &mut self,
        month: u32,
        cancellation_weight: f64,
        limit: u32,
    ) -> BenchResult<Vec<AirlineScore>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT f.op_unique_carrier AS carrier,
                        COALESCE(AVG(p.arr_delay), 0.0) AS avg_arr_delay,
                        SUM(CASE WHEN c.flight_id IS NOT NULL THEN 1 ELSE 0 END) AS cancelled_count,
                        COUNT(f.flight_id) AS total_flights,
                        (COALESCE(AVG(p.arr_delay), 0.0)
                         + (SUM(CASE WHEN c.flight_id IS NOT NULL THEN 1 ELSE 0 END) * ?
                            / GREATEST(COUNT(f.flight_id), 1)) * 100) AS score
                 FROM flights f
                 LEFT JOIN flights_performance p ON f.flight_id = p.flight_id
                 LEFT JOIN flights_cancelled c ON f.flight_id = c.flight_id
                 WHERE f.month = ? AND f.op_unique_carrier IS NOT NULL
                 GROUP BY f.op_unique_carrier
                 HAVING COUNT(f.flight_id) > 0
                 ORDER BY score ASC
                 LIMIT ?",
            )
            .map_err(|e| BenchError::Database(format!("prepare ranking: {}", e)))?;
        let rows = stmt
            .query_map(params![cancellation_weight, month, limit], |row| {
                Ok(AirlineScore {
                    carrier: row.get(0)?,
                    avg_arr_delay: row.get(1)?,
                    cancelled: row.get::<_, i64>(2)? as u64,
                    total_flights: row.get::<_, i64>(3)? as u64,
                    score: row.get(4)?,
                })
            })
            .map_err(|e| BenchError::Database(format!("ranking: {}", e)))?;
        let mut ranked = Vec::new();
        for r in rows {
            ranked.push(r.map_err(|e| BenchError::Database(format!("row: {}", e)))?);
        }
        Ok(ranked)
    }

    fn insert_synthetic_batch(&mut self, carrier: &str, count: u32) -> BenchResult<usize> {
        let mut next_id = self.next_id;
        let tx = self
            .conn
            .transaction()
            .map_err(|e| BenchError::Database(format!("begin batch: {}", e)))?;
        {
            let mut insert_flight = tx
                .prepare_cached(
                    "INSERT INTO flights (flight_id, year, month, day_of_month, day_of_week,
                        fl_date, op_unique_carrier, op_carrier_fl_num, origin, dest,
                        crs_dep_time, crs_arr_time, crs_elapsed_time, distance)
                     VALUES (?, 2024, 2, 1, 4, '2024-02-01', ?, ?, 'AAA', 'BBB', 0, 0, 0, 0)",
                )
                .map_err(|e| BenchError::Database(format!("prepare batch: {}", e)))?;
            let mut insert_perf = tx
                .prepare_cached(
                    "INSERT INTO flights_performance (flight_id, dep_delay, arr_delay, diverted)
                     VALUES (?, ?, ?, 0)",
                )
                .map_err(|e| BenchError::Database(format!("prepare batch: {}", e)))?;
            for i in 0..count {
                let id = next_id;
                next_id += 1;
                insert_flight
                    .execute(params![id, carrier, i.to_string()])
                    .map_err(|e| BenchError::Database(format!("batch flight: {}", e)))?;
                insert_perf
                    .execute(params![id, i % 30, i % 60])
                    .map_err(|e| BenchError::Database(format!("batch perf: {}", e)))?;
            }
        }
        tx.commit()
            .map_err(|e| BenchError::Database(format!("commit batch: {}", e)))?;
        self.next_id = next_id;
        Ok(count as usize)
    }

    fn bump_delay_for_carrier(&mut self, carrier: &str, minutes: i64) -> BenchResult<usize> {
        self.conn
            .execute(
                "UPDATE flights_performance
                 SET arr_delay = arr_delay + ?
                 WHERE flight_id IN (
                     SELECT flight_id FROM flights WHERE op_unique_carrier = ?
                 )",
                params![minutes, carrier],
            )
            .map_err(|e| BenchError::Database(format!("bump delay: {}", e)))
    }

    fn delete_by_carrier(&mut self, carrier: &str) -> BenchResult<usize> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| BenchError::Database(format!("begin delete: {}", e)))?;
        for table in ["flights_performance", "flights_delayed", "flights_cancelled"] {
            tx.execute(
                &format!(
                    "DELETE FROM {} WHERE flight_id IN (
                         SELECT flight_id FROM flights WHERE op_unique_carrier = ?
                     )",
                    table
                ),
                params![carrier],
            )
            .map_err(|e| BenchError::Database(format!("delete {}: {}", table, e)))?;
        }
        let deleted = tx
            .execute(
                "DELETE FROM flights WHERE op_unique_carrier = ?",
                params![carrier],
            )
            .map_err(|e| BenchError::Database(format!("delete flights: {}", e)))?;
        tx.commit()
            .map_err(|e| BenchError::Database(format!("commit delete: {}", e)))?;
        Ok(deleted)
    }
}
