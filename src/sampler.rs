//! Single-pass reservoir sampling over CSV record streams.
//!
//! One linear pass over the source feeds a capacity-`max(sizes)` buffer;
//! after the scan the buffer is shuffled once and every requested size is
//! materialized as a prefix slice. Each slice is an independently uniform
//! sample of the whole stream, and all of them come from the same pass,
//! so the output sets are nested.

use crate::{BenchError, BenchResult};
use csv::StringRecord;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};

// ────────────────────────────────────────────────────────────────────────────────
// Reservoir
// ────────────────────────────────────────────────────────────────────────────────

/// Fixed-capacity uniform sample of an unbounded record stream.
///
/// Invariant: after `offer` has seen `n` records, every one of them has
/// had probability exactly `capacity / n` of being in the buffer. Holds
/// for any prefix of the stream, not only at the end.
pub struct Reservoir {
    capacity: usize,
    buffer: Vec<StringRecord>,
    seen: u64,
}

impl Reservoir {
    pub fn new(capacity: usize) -> BenchResult<Self> {
        if capacity == 0 {
            return Err(BenchError::Config("reservoir capacity must be positive".into()));
        }
        Ok(Self {
            capacity,
            buffer: Vec::with_capacity(capacity),
            seen: 0,
        })
    }

    /// Offer one record. The record is either retained (possibly evicting
    /// an earlier one) or discarded; it is never mutated.
    pub fn offer<R: Rng>(&mut self, record: StringRecord, rng: &mut R) {
        self.seen += 1;
        if self.buffer.len() < self.capacity {
            self.buffer.push(record);
            return;
        }
        let j = rng.gen_range(0..self.seen);
        if (j as usize) < self.capacity {
            self.buffer[j as usize] = record;
        }
    }

    /// Records observed so far.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// Records currently retained: `min(capacity, seen)`.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Consume the reservoir, shuffling once to remove the positional
    /// bias left by the overwrite pattern.
    pub fn into_shuffled<R: Rng>(self, rng: &mut R) -> Vec<StringRecord> {
        let mut buffer = self.buffer;
        buffer.shuffle(rng);
        buffer
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Sample file production
// ────────────────────────────────────────────────────────────────────────────────

/// Result of producing one sample file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleOutcome {
    /// The requested size was fully satisfied.
    Written {
        size: usize,
        path: PathBuf,
        rows: usize,
    },
    /// The source was shorter than the requested size; the file holds the
    /// entire source instead of a strict sample.
    Insufficient {
        size: usize,
        path: PathBuf,
        rows: usize,
        total: u64,
    },
}

/// Stream `src` once and write one `flights_<size>.csv` per requested
/// size into `out_dir`, each a uniform random sample with the source
/// header on top. A source without data rows is fatal; a size larger
/// than the source is reported per size and the other sizes are still
/// produced.
pub fn make_samples(
    src: &Path,
    out_dir: &Path,
    sizes: &[usize],
    seed: u64,
) -> BenchResult<Vec<SampleOutcome>> {
    let mut sizes: Vec<usize> = sizes.to_vec();
    sizes.sort_unstable();
    sizes.dedup();
    if sizes.is_empty() || sizes[0] == 0 {
        return Err(BenchError::Config("sample sizes must be positive".into()));
    }
    let capacity = *sizes.last().unwrap_or(&0);

    let mut reader = csv::Reader::from_path(src)?;
    let header = reader.headers()?.clone();
    if header.len() == 0 {
        return Err(BenchError::Config(format!(
            "source file {} is empty",
            src.display()
        )));
    }

    // One well-seeded RNG threaded through the whole pass; re-seeding per
    // record would break the uniformity guarantee.
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut reservoir = Reservoir::new(capacity)?;
    for record in reader.records() {
        reservoir.offer(record?, &mut rng);
    }

    let total = reservoir.seen();
    if total == 0 {
        return Err(BenchError::Config(format!(
            "source file {} has no data rows",
            src.display()
        )));
    }

    std::fs::create_dir_all(out_dir)?;
    let shuffled = reservoir.into_shuffled(&mut rng);

    let mut outcomes = Vec::with_capacity(sizes.len());
    for &size in &sizes {
        let path = out_dir.join(format!("flights_{}.csv", size));
        let rows = size.min(shuffled.len());
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(&header)?;
        for record in &shuffled[..rows] {
            writer.write_record(record)?;
        }
        writer.flush()?;

        if (size as u64) <= total {
            println!("wrote {} ({} rows)", path.display(), rows);
            outcomes.push(SampleOutcome::Written { size, path, rows });
        } else {
            println!("source has {} rows; cannot make {}", total, size);
            outcomes.push(SampleOutcome::Insufficient {
                size,
                path,
                rows,
                total,
            });
        }
    }
    Ok(outcomes)
}
