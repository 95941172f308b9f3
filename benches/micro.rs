//! Criterion microbenchmarks for the reservoir sampler and the SQLite
//! adapter's hot paths.
//!
//! Run with: `cargo bench --bench micro`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use csv::StringRecord;
use flightbench::adapters::sqlite_adapter::SqliteAdapter;
use flightbench::sampler::Reservoir;
use flightbench::{Flight, FlightStore};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

fn bench_reservoir_offer(c: &mut Criterion) {
    let mut group = c.benchmark_group("reservoir_offer");

    for capacity in [1_000usize, 10_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &cap| {
                let record = StringRecord::from(vec![
                    "2024", "1", "2024-01-01", "AA", "JFK", "LAX", "15", "5",
                ]);
                let mut rng = ChaCha8Rng::seed_from_u64(42);
                let mut reservoir = Reservoir::new(cap).unwrap();

                b.iter(|| {
                    reservoir.offer(record.clone(), &mut rng);
                });
            },
        );
    }
    group.finish();
}

fn bench_sqlite_insert_flight(c: &mut Criterion) {
    c.bench_function("sqlite_insert_flight", |b| {
        let tmp = TempDir::new().unwrap();
        let mut db = SqliteAdapter::new(tmp.path()).unwrap();
        let flight = Flight {
            year: 2024,
            month: 1,
            day_of_month: 1,
            day_of_week: 1,
            fl_date: "2024-01-01".to_string(),
            op_unique_carrier: "AA".to_string(),
            op_carrier_fl_num: "100".to_string(),
            origin: "JFK".to_string(),
            dest: "LAX".to_string(),
            crs_dep_time: 800,
            crs_arr_time: 1100,
            crs_elapsed_time: 360,
            distance: 2475,
        };

        b.iter(|| {
            db.insert_flight(&flight).unwrap();
        });
    });
}

fn bench_sqlite_top_routes(c: &mut Criterion) {
    c.bench_function("sqlite_top_routes_month", |b| {
        let tmp = TempDir::new().unwrap();
        let mut db = SqliteAdapter::new(tmp.path()).unwrap();

        let routes = [("JFK", "LAX"), ("ATL", "ORD"), ("SEA", "DEN"), ("BOS", "MIA")];
        for i in 0..10_000usize {
            let (origin, dest) = routes[i % routes.len()];
            let flight = Flight {
                year: 2024,
                month: ((i % 12) + 1) as u32,
                day_of_month: 1,
                day_of_week: 1,
                fl_date: format!("2024-{:02}-01", (i % 12) + 1),
                op_unique_carrier: "AA".to_string(),
                op_carrier_fl_num: i.to_string(),
                origin: origin.to_string(),
                dest: dest.to_string(),
                crs_dep_time: 800,
                crs_arr_time: 1100,
                crs_elapsed_time: 360,
                distance: 2475,
            };
            db.insert_flight(&flight).unwrap();
        }

        b.iter(|| {
            db.top_routes_for_month(1, 10).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_reservoir_offer,
    bench_sqlite_insert_flight,
    bench_sqlite_top_routes
);
criterion_main!(benches);
