//! SQLite adapter (via rusqlite).
//!
//! Relational layout: `flights` plus satellite tables
//! `flights_performance`, `flights_delayed` and `flights_cancelled`,
//! keyed by `flight_id`. Configuration: WAL mode, NORMAL synchronous.

use crate::{
    AirlineScore, BenchError, BenchResult, DelayBreakdown, Flight, FlightId, FlightPerf,
    FlightStore, RouteCount,
};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;

pub struct SqliteAdapter {
    conn: Connection,
}

impl SqliteAdapter {
    pub fn new(dir: &Path) -> BenchResult<Self> {
        let path = dir.join("flightbench.sqlite3");
        let conn = Connection::open(&path)
            .map_err(|e| BenchError::Database(format!("SQLite open: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA temp_store = MEMORY;",
        )
        .map_err(|e| BenchError::Database(format!("SQLite pragma: {}", e)))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS flights (
                flight_id         INTEGER PRIMARY KEY,
                year              INTEGER,
                month             INTEGER,
                day_of_month      INTEGER,
                day_of_week       INTEGER,
                fl_date           TEXT NOT NULL,
                op_unique_carrier TEXT,
                op_carrier_fl_num TEXT,
                origin            TEXT,
                dest              TEXT,
                crs_dep_time      INTEGER,
                crs_arr_time      INTEGER,
                crs_elapsed_time  INTEGER,
                distance          INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_flights_carrier_date
                ON flights(op_unique_carrier, fl_date);
            CREATE INDEX IF NOT EXISTS idx_flights_route
                ON flights(origin, dest, fl_date);
            CREATE INDEX IF NOT EXISTS idx_flights_month
                ON flights(month);
            CREATE TABLE IF NOT EXISTS flights_performance (
                flight_id           INTEGER PRIMARY KEY REFERENCES flights(flight_id),
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
                flight_id           INTEGER PRIMARY KEY REFERENCES flights(flight_id),
                carrier_delay       INTEGER,
                weather_delay       INTEGER,
                nas_delay           INTEGER,
                security_delay      INTEGER,
                late_aircraft_delay INTEGER
            );
            CREATE TABLE IF NOT EXISTS flights_cancelled (
                flight_id         INTEGER PRIMARY KEY REFERENCES flights(flight_id),
                cancellation_code TEXT
            );",
        )
        .map_err(|e| BenchError::Database(format!("SQLite schema: {}", e)))?;

        Ok(Self { conn })
    }
}

/// Case-insensitive header lookup for sample CSVs; numeric BTS columns
/// often carry a trailing `.0`, so integers are parsed through f64.
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

impl FlightStore for SqliteAdapter {
    fn name(&self) -> &str {
        "sqlite"
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
        Ok(())
    }

    fn import(&mut self, sample: &Path) -> BenchResult<usize> {
        let mut reader = csv::Reader::from_path(sample)?;
        let columns = ColumnMap::new(reader.headers()?);

        let tx = self
            .conn
            .transaction()
            .map_err(|e| BenchError::Database(format!("begin import: {}", e)))?;
        let mut imported = 0usize;
        {
            let mut insert_flight = tx
                .prepare_cached(
                    "INSERT INTO flights (year, month, day_of_month, day_of_week, fl_date,
                        op_unique_carrier, op_carrier_fl_num, origin, dest,
                        crs_dep_time, crs_arr_time, crs_elapsed_time, distance)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                )
                .map_err(|e| BenchError::Database(format!("prepare import: {}", e)))?;
            let mut insert_perf = tx
                .prepare_cached(
                    "INSERT INTO flights_performance (flight_id, dep_time, dep_delay, taxi_out,
                        wheels_off, wheels_on, taxi_in, arr_time, arr_delay,
                        actual_elapsed_time, air_time, diverted)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                )
                .map_err(|e| BenchError::Database(format!("prepare import: {}", e)))?;
            let mut insert_cancelled = tx
                .prepare_cached(
                    "INSERT INTO flights_cancelled (flight_id, cancellation_code)
                     VALUES (?1, ?2)",
                )
                .map_err(|e| BenchError::Database(format!("prepare import: {}", e)))?;

            for record in reader.records() {
                let record = record?;
                let fl_date = match columns.text(&record, "fl_date") {
                    Some(d) => d,
                    None => continue, // row without a date is unusable
                };
                insert_flight
                    .execute(params![
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
                let flight_id = tx.last_insert_rowid();
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
        Ok(imported)
    }

    fn insert_flight(&mut self, flight: &Flight) -> BenchResult<FlightId> {
        self.conn
            .execute(
                "INSERT INTO flights (year, month, day_of_month, day_of_week, fl_date,
                    op_unique_carrier, op_carrier_fl_num, origin, dest,
                    crs_dep_time, crs_arr_time, crs_elapsed_time, distance)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
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
        Ok(self.conn.last_insert_rowid())
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
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
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
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
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
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT MAX(f.flight_id) FROM flights f
                 WHERE NOT EXISTS (
                     SELECT 1 FROM flights_performance p WHERE p.flight_id = f.flight_id
                 )",
            )
            .map_err(|e| BenchError::Database(format!("prepare recovery: {}", e)))?;
        let id: Option<FlightId> = stmt
            .query_row([], |row| row.get(0))
            .map_err(|e| BenchError::Database(format!("recovery: {}", e)))?;
        Ok(id)
    }

    fn count_by_carrier_in_range(
        &mut self,
        carrier: &str,
        date_from: &str,
        date_to: &str,
        limit: u32,
    ) -> BenchResult<usize> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT COUNT(*) FROM (
                     SELECT 1 FROM flights
                     WHERE op_unique_carrier = ?1 AND fl_date BETWEEN ?2 AND ?3
                     LIMIT ?4
                 )",
            )
            .map_err(|e| BenchError::Database(format!("prepare carrier read: {}", e)))?;
        let count: usize = stmt
            .query_row(params![carrier, date_from, date_to, limit], |row| row.get(0))
            .map_err(|e| BenchError::Database(format!("carrier read: {}", e)))?;
        Ok(count)
    }

    fn top_routes_for_month(&mut self, month: u32, limit: u32) -> BenchResult<Vec<RouteCount>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT origin, dest, COUNT(*) AS flights_count
                 FROM flights
                 WHERE month = ?1
                 GROUP BY origin, dest
                 ORDER BY flights_count DESC
                 LIMIT ?2",
            )
            .map_err(|e| BenchError::Database(format!("prepare top routes: {}", e)))?;
        let rows = stmt
            .query_map(params![month, limit], |row| {
                Ok(RouteCount {
                    origin: row.get(0)?,
                    dest: row.get(1)?,
                    flights: row.get(2)?,
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
        // One pass over flights_performance: per-bucket CASE sums plus a
        // trailing out-of-range bucket.
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
                    out.push(row.get::<_, u64>(i)?);
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
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT COUNT(*) FROM (
                     SELECT f.flight_id
                     FROM flights f
                     LEFT JOIN flights_performance p ON f.flight_id = p.flight_id
                     LEFT JOIN flights_delayed d ON f.flight_id = d.flight_id
                     LEFT JOIN flights_cancelled c ON f.flight_id = c.flight_id
                     WHERE f.origin = ?1 AND f.dest = ?2
                       AND f.fl_date BETWEEN ?3 AND ?4
                     LIMIT ?5
                 )",
            )
            .map_err(|e| BenchError::Database(format!("prepare route stats: {}", e)))?;
        let count: usize = stmt
            .query_row(params![origin, dest, date_from, date_to, limit], |row| {
                row.get(0)
            })
            .map_err(|e| BenchError::Database(format!("route stats: {}", e)))?;
        Ok(count)
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
                         + (SUM(CASE WHEN c.flight_id IS NOT NULL THEN 1 ELSE 0 END) * ?1
                            / MAX(COUNT(f.flight_id), 1)) * 100) AS score
                 FROM flights f
                 LEFT JOIN flights_performance p ON f.flight_id = p.flight_id
                 LEFT JOIN flights_cancelled c ON f.flight_id = c.flight_id
                 WHERE f.month = ?2 AND f.op_unique_carrier IS NOT NULL
                 GROUP BY f.op_unique_carrier
                 HAVING COUNT(f.flight_id) > 0
                 ORDER BY score ASC
                 LIMIT ?3",
            )
            .map_err(|e| BenchError::Database(format!("prepare ranking: {}", e)))?;
        let rows = stmt
            .query_map(params![cancellation_weight, month, limit], |row| {
                Ok(AirlineScore {
                    carrier: row.get(0)?,
                    avg_arr_delay: row.get(1)?,
                    cancelled: row.get(2)?,
                    total_flights: row.get(3)?,
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
        let tx = self
            .conn
            .transaction()
            .map_err(|e| BenchError::Database(format!("begin batch: {}", e)))?;
        {
            let mut insert_flight = tx
                .prepare_cached(
                    "INSERT INTO flights (year, month, day_of_month, day_of_week, fl_date,
                        op_unique_carrier, op_carrier_fl_num, origin, dest,
                        crs_dep_time, crs_arr_time, crs_elapsed_time, distance)
                     VALUES (2024, 2, 1, 4, '2024-02-01', ?1, ?2, 'AAA', 'BBB', 0, 0, 0, 0)",
                )
                .map_err(|e| BenchError::Database(format!("prepare batch: {}", e)))?;
            let mut insert_perf = tx
                .prepare_cached(
                    "INSERT INTO flights_performance (flight_id, dep_delay, arr_delay, diverted)
                     VALUES (?1, ?2, ?3, 0)",
                )
                .map_err(|e| BenchError::Database(format!("prepare batch: {}", e)))?;
            for i in 0..count {
                insert_flight
                    .execute(params![carrier, i.to_string()])
                    .map_err(|e| BenchError::Database(format!("batch flight: {}", e)))?;
                let id = tx.last_insert_rowid();
                insert_perf
                    .execute(params![id, i % 30, i % 60])
                    .map_err(|e| BenchError::Database(format!("batch perf: {}", e)))?;
            }
        }
        tx.commit()
            .map_err(|e| BenchError::Database(format!("commit batch: {}", e)))?;
        Ok(count as usize)
    }

    fn bump_delay_for_carrier(&mut self, carrier: &str, minutes: i64) -> BenchResult<usize> {
        let modified = self
            .conn
            .execute(
                "UPDATE flights_performance
                 SET arr_delay = arr_delay + ?1
                 WHERE flight_id IN (
                     SELECT flight_id FROM flights WHERE op_unique_carrier = ?2
                 )",
                params![minutes, carrier],
            )
            .map_err(|e| BenchError::Database(format!("bump delay: {}", e)))?;
        Ok(modified)
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
                         SELECT flight_id FROM flights WHERE op_unique_carrier = ?1
                     )",
                    table
                ),
                params![carrier],
            )
            .map_err(|e| BenchError::Database(format!("delete {}: {}", table, e)))?;
        }
        let deleted = tx
            .execute(
                "DELETE FROM flights WHERE op_unique_carrier = ?1",
                params![carrier],
            )
            .map_err(|e| BenchError::Database(format!("delete flights: {}", e)))?;
        tx.commit()
            .map_err(|e| BenchError::Database(format!("commit delete: {}", e)))?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn flight(carrier: &str, origin: &str, dest: &str, date: &str, month: u32) -> Flight {
        Flight {
            year: 2024,
            month,
            day_of_month: 1,
            day_of_week: 1,
            fl_date: date.to_string(),
            op_unique_carrier: carrier.to_string(),
            op_carrier_fl_num: "1".to_string(),
            origin: origin.to_string(),
            dest: dest.to_string(),
            crs_dep_time: 800,
            crs_arr_time: 1100,
            crs_elapsed_time: 180,
            distance: 700,
        }
    }

    fn perf(arr_delay: i32) -> FlightPerf {
        FlightPerf {
            arr_delay,
            ..FlightPerf::default()
        }
    }

    #[test]
    fn insert_assigns_increasing_ids_and_recovery_finds_latest() {
        let dir = TempDir::new().unwrap();
        let mut db = SqliteAdapter::new(dir.path()).unwrap();

        let a = db.insert_flight(&flight("AA", "JFK", "LAX", "2024-01-01", 1)).unwrap();
        let b = db.insert_flight(&flight("AA", "JFK", "LAX", "2024-01-02", 1)).unwrap();
        assert!(b > a);

        assert_eq!(db.latest_flight_without_stats().unwrap(), Some(b));
        db.insert_flight_stats(b, &perf(10), None).unwrap();
        assert_eq!(db.latest_flight_without_stats().unwrap(), Some(a));
        db.insert_flight_stats(a, &perf(0), None).unwrap();
        assert_eq!(db.latest_flight_without_stats().unwrap(), None);
    }

    #[test]
    fn import_loads_flights_and_performance_rows() {
        let dir = TempDir::new().unwrap();
        let sample = dir.path().join("sample.csv");
        let mut f = std::fs::File::create(&sample).unwrap();
        writeln!(
            f,
            "year,month,fl_date,op_unique_carrier,origin,dest,arr_delay,dep_delay,cancelled"
        )
        .unwrap();
        writeln!(f, "2024,1,2024-01-05,AA,JFK,LAX,15.0,5.0,0").unwrap();
        writeln!(f, "2024,1,2024-01-06,DL,ATL,ORD,-4.0,0.0,0").unwrap();
        writeln!(f, "2024,2,2024-02-01,AA,JFK,LAX,,,1").unwrap();

        let mut db = SqliteAdapter::new(dir.path()).unwrap();
        let imported = db.import(&sample).unwrap();
        assert_eq!(imported, 3);

        let found = db
            .count_by_carrier_in_range("AA", "2024-01-01", "2024-01-31", 100)
            .unwrap();
        assert_eq!(found, 1);

        // Two delayed rows land in the histogram, the cancelled one has
        // no performance row at all.
        let counts = db.arr_delay_histogram(&[-60, 0, 60]).unwrap();
        assert_eq!(counts.iter().sum::<u64>(), 2);
        assert_eq!(counts[0], 1);
        assert_eq!(counts[1], 1);
    }

    #[test]
    fn top_routes_are_frequency_ranked() {
        let dir = TempDir::new().unwrap();
        let mut db = SqliteAdapter::new(dir.path()).unwrap();
        for _ in 0..3 {
            db.insert_flight(&flight("AA", "JFK", "LAX", "2024-01-01", 1)).unwrap();
        }
        db.insert_flight(&flight("DL", "ATL", "ORD", "2024-01-02", 1)).unwrap();
        db.insert_flight(&flight("DL", "ATL", "ORD", "2024-03-02", 3)).unwrap();

        let routes = db.top_routes_for_month(1, 10).unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(
            routes[0],
            RouteCount {
                origin: "JFK".into(),
                dest: "LAX".into(),
                flights: 3
            }
        );
    }

    #[test]
    fn ranking_prefers_punctual_carriers_and_penalizes_cancellations() {
        let dir = TempDir::new().unwrap();
        let mut db = SqliteAdapter::new(dir.path()).unwrap();

        let a = db.insert_flight(&flight("AA", "JFK", "LAX", "2024-01-01", 1)).unwrap();
        db.insert_flight_stats(a, &perf(40), None).unwrap();
        let d = db.insert_flight(&flight("DL", "ATL", "ORD", "2024-01-02", 1)).unwrap();
        db.insert_flight_stats(d, &perf(2), None).unwrap();

        let ranked = db.rank_airlines(1, 3.0, 10).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].carrier, "DL");
        assert!(ranked[0].score < ranked[1].score);
    }

    #[test]
    fn synthetic_batch_lifecycle() {
        let dir = TempDir::new().unwrap();
        let mut db = SqliteAdapter::new(dir.path()).unwrap();

        assert_eq!(db.insert_synthetic_batch("ZZ", 50).unwrap(), 50);
        assert_eq!(db.bump_delay_for_carrier("ZZ", 1).unwrap(), 50);
        assert_eq!(db.delete_by_carrier("ZZ").unwrap(), 50);
        assert_eq!(db.bump_delay_for_carrier("ZZ", 1).unwrap(), 0);
    }

    #[test]
    fn reset_clears_all_tables() {
        let dir = TempDir::new().unwrap();
        let mut db = SqliteAdapter::new(dir.path()).unwrap();

        let id = db.insert_flight(&flight("AA", "JFK", "LAX", "2024-01-01", 1)).unwrap();
        db.insert_flight_stats(id, &perf(5), None).unwrap();
        db.reset().unwrap();

        assert_eq!(
            db.count_by_carrier_in_range("AA", "2024-01-01", "2024-12-31", 100)
                .unwrap(),
            0
        );
        assert_eq!(db.arr_delay_histogram(&[-60, 0, 60]).unwrap().iter().sum::<u64>(), 0);
        assert_eq!(db.latest_flight_without_stats().unwrap(), None);
    }
}
