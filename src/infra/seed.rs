//! Seed derivation for reproducible runs
//!
//! The run seed is the processing date written as the integer `YYYYMMDD`.
//! Every concurrent task owns its own generator seeded from its parent's seed and
//! its stable index, so results never depend on task scheduling order.

use chrono::{Datelike, NaiveDate};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Generator type used by every generation task
pub type SimRng = ChaCha8Rng;

/// Integer seed built from the calendar date digits (2024-01-01 -> 20240101)
pub fn date_seed(date: NaiveDate) -> u64 {
    date.year() as u64 * 10_000 + date.month() as u64 * 100 + date.day() as u64
}

/// Derive a child seed from a parent seed and a stable task index (splitmix64 finalizer)
pub fn child_seed(parent: u64, index: u64) -> u64 {
    let mut z = parent
        .wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[inline]
pub fn rng_from_seed(seed: u64) -> SimRng {
    ChaCha8Rng::seed_from_u64(seed)
}
