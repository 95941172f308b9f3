//! The ordered, backend-agnostic scenario registry.
//!
//! Every scenario prepares its arguments first and times only the
//! backend-facing call, so elapsed figures stay comparable across
//! backends. Stateful scenarios communicate through the [`RunContext`]:
//! `add_flight` publishes the identifier it created, `add_flight_stats`
//! resolves the identifier of the same iteration and falls back to the
//! backend's recovery query when it is absent (later pipeline stages may
//! run scenarios in isolation, so the miss is not an error).

use crate::config::BenchConfig;
use crate::engine::{Invocation, RunContext, Scenario};
use crate::{BenchError, BenchResult, FlightStore, SYNTH_CARRIER};
use std::time::Instant;

/// All scenarios in registration (and therefore execution) order.
pub fn registry() -> Vec<Scenario> {
    vec![
        Scenario { name: "add_flight", run: add_flight },
        Scenario { name: "add_flight_stats", run: add_flight_stats },
        Scenario { name: "top_routes_month", run: top_routes_month },
        Scenario { name: "histogram_arr_delay", run: histogram_arr_delay },
        Scenario { name: "find_route_with_stats", run: find_route_with_stats },
        Scenario { name: "rank_punctual_airlines", run: rank_punctual_airlines },
        Scenario { name: "read_by_carrier_day", run: read_by_carrier_day },
        Scenario { name: "insert_batch", run: insert_batch },
        Scenario { name: "update_many", run: update_many },
        Scenario { name: "delete_many", run: delete_many },
    ]
}

fn millis(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Map a 1-based iteration onto a calendar month.
fn month_of(iteration: u32) -> u32 {
    ((iteration - 1) % 12) + 1
}

fn add_flight(
    store: &mut dyn FlightStore,
    cfg: &BenchConfig,
    ctx: &mut RunContext,
    iteration: u32,
) -> BenchResult<Invocation> {
    let flights = &cfg.queries.insert_flight.flights;
    if flights.is_empty() {
        return Err(BenchError::Config(
            "no flights configured for add_flight".into(),
        ));
    }
    let flight = &flights[((iteration - 1) as usize) % flights.len()];

    let t = Instant::now();
    let id = store.insert_flight(flight)?;
    let elapsed_ms = millis(t);

    ctx.publish_id("add_flight", iteration, id);
    Ok(Invocation {
        elapsed_ms,
        note: format!("flight_id={}", id),
    })
}

fn add_flight_stats(
    store: &mut dyn FlightStore,
    cfg: &BenchConfig,
    ctx: &mut RunContext,
    iteration: u32,
) -> BenchResult<Invocation> {
    let update = &cfg.queries.update_flight;
    let perfs = &update.flight_performance;
    if perfs.is_empty() {
        return Err(BenchError::Config(
            "no flight_performance configured for add_flight_stats".into(),
        ));
    }
    let perf = &perfs[((iteration - 1) as usize) % perfs.len()];
    let delay = update
        .flights_delayed
        .iter()
        .find(|d| d.flight_index == iteration - 1);

    // Resolution happens outside the timer; only the write is measured.
    let id = match ctx.resolve_id("add_flight", iteration) {
        Some(id) => id,
        None => store.latest_flight_without_stats()?.ok_or_else(|| {
            BenchError::Database("no candidate flight for stats attach".into())
        })?,
    };

    let t = Instant::now();
    store.insert_flight_stats(id, perf, delay)?;
    let elapsed_ms = millis(t);

    let mut note = format!("flight_id={}, perf_inserted=1", id);
    if delay.is_some() {
        note.push_str(", delayed_inserted=1");
    }
    Ok(Invocation { elapsed_ms, note })
}

fn top_routes_month(
    store: &mut dyn FlightStore,
    cfg: &BenchConfig,
    _ctx: &mut RunContext,
    iteration: u32,
) -> BenchResult<Invocation> {
    let limit = cfg.queries.top_routes_month.limit;
    let month = month_of(iteration);

    let t = Instant::now();
    let routes = store.top_routes_for_month(month, limit)?;
    let elapsed_ms = millis(t);

    let note = if routes.is_empty() {
        "no_results".to_string()
    } else {
        routes
            .iter()
            .map(|r| format!("{}-{}({})", r.origin, r.dest, r.flights))
            .collect::<Vec<_>>()
            .join(";")
    };
    Ok(Invocation { elapsed_ms, note })
}

fn histogram_arr_delay(
    store: &mut dyn FlightStore,
    cfg: &BenchConfig,
    _ctx: &mut RunContext,
    _iteration: u32,
) -> BenchResult<Invocation> {
    let bins = &cfg.queries.histogram_arr_delay.bins;
    if bins.len() < 2 {
        return Ok(Invocation {
            elapsed_ms: 0.0,
            note: "buckets=0".into(),
        });
    }

    let t = Instant::now();
    let counts = store.arr_delay_histogram(bins)?;
    let elapsed_ms = millis(t);

    Ok(Invocation {
        elapsed_ms,
        note: format!(
            "buckets={}, first_bucket={}",
            counts.len(),
            counts.first().copied().unwrap_or(0)
        ),
    })
}

fn find_route_with_stats(
    store: &mut dyn FlightStore,
    cfg: &BenchConfig,
    _ctx: &mut RunContext,
    iteration: u32,
) -> BenchResult<Invocation> {
    let q = &cfg.queries.find_all_flights_on_route;
    if q.routes.is_empty() {
        return Err(BenchError::Config(
            "no routes configured for find_route_with_stats".into(),
        ));
    }
    let route = &q.routes[((iteration - 1) as usize) % q.routes.len()];

    let t = Instant::now();
    let count = store.route_with_stats(
        &route.origin,
        &route.dest,
        &route.date_from,
        &route.date_to,
        q.limit,
    )?;
    let elapsed_ms = millis(t);

    Ok(Invocation {
        elapsed_ms,
        note: format!("count={}", count),
    })
}

fn rank_punctual_airlines(
    store: &mut dyn FlightStore,
    cfg: &BenchConfig,
    _ctx: &mut RunContext,
    iteration: u32,
) -> BenchResult<Invocation> {
    let q = &cfg.queries.airlines_ranking;
    let month = month_of(iteration);

    let t = Instant::now();
    let ranked = store.rank_airlines(month, q.cancellation_weight, q.limit)?;
    let elapsed_ms = millis(t);

    let note = match ranked.first() {
        Some(best) => format!("month={}, most_punctual={}", month, best.carrier),
        None => "no_results".to_string(),
    };
    Ok(Invocation { elapsed_ms, note })
}

fn read_by_carrier_day(
    store: &mut dyn FlightStore,
    cfg: &BenchConfig,
    _ctx: &mut RunContext,
    _iteration: u32,
) -> BenchResult<Invocation> {
    let q = &cfg.queries.read_by_carrier_day;

    let t = Instant::now();
    let found = store.count_by_carrier_in_range(&q.carrier, &q.date_from, &q.date_to, q.limit)?;
    let elapsed_ms = millis(t);

    Ok(Invocation {
        elapsed_ms,
        note: format!("found={}", found),
    })
}

fn insert_batch(
    store: &mut dyn FlightStore,
    cfg: &BenchConfig,
    _ctx: &mut RunContext,
    _iteration: u32,
) -> BenchResult<Invocation> {
    let n = cfg.crud.sample_size_for_writes;

    let t = Instant::now();
    let inserted = store.insert_synthetic_batch(SYNTH_CARRIER, n)?;
    let elapsed_ms = millis(t);

    Ok(Invocation {
        elapsed_ms,
        note: format!("inserted={}", inserted),
    })
}

fn update_many(
    store: &mut dyn FlightStore,
    _cfg: &BenchConfig,
    _ctx: &mut RunContext,
    _iteration: u32,
) -> BenchResult<Invocation> {
    let t = Instant::now();
    let modified = store.bump_delay_for_carrier(SYNTH_CARRIER, 1)?;
    let elapsed_ms = millis(t);

    Ok(Invocation {
        elapsed_ms,
        note: format!("modified={}", modified),
    })
}

fn delete_many(
    store: &mut dyn FlightStore,
    _cfg: &BenchConfig,
    _ctx: &mut RunContext,
    _iteration: u32,
) -> BenchResult<Invocation> {
    let t = Instant::now();
    let deleted = store.delete_by_carrier(SYNTH_CARRIER)?;
    let elapsed_ms = millis(t);

    Ok(Invocation {
        elapsed_ms,
        note: format!("deleted={}", deleted),
    })
}
