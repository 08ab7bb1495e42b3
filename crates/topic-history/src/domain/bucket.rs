//! # Bucket Clock
//!
//! Maps Unix timestamps to time-partition indices.
//!
//! The epoch and bucket size are hardcoded on purpose. Writers compute the
//! same bucket for every message they persist, so changing either value
//! after data exists requires running both layouts side by side until the
//! old rows expire through their TTL.

use serde::{Deserialize, Serialize};

/// Bucket index. Zero is the floor for anything at or before the epoch.
pub type Bucket = u64;

/// 2018-01-01T00:00:00Z.
pub const EPOCH_START: i64 = 1_514_764_800;

/// Seconds in one day.
pub const DAY_SECS: i64 = 24 * 60 * 60;

/// Three days per bucket.
pub const BUCKET_SIZE_SECS: i64 = 3 * DAY_SECS;

/// Computes bucket numbers from timestamps and bucket windows for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketClock {
    start: i64,
    bucket_size_secs: i64,
}

impl Default for BucketClock {
    fn default() -> Self {
        Self {
            start: EPOCH_START,
            bucket_size_secs: BUCKET_SIZE_SECS,
        }
    }
}

impl BucketClock {
    /// Clock with an explicit epoch and bucket size.
    ///
    /// A non-positive size is clamped to one second so `get` never divides
    /// by zero.
    pub fn with_epoch(start: i64, bucket_size_secs: i64) -> Self {
        Self {
            start,
            bucket_size_secs: bucket_size_secs.max(1),
        }
    }

    /// Epoch start (Unix seconds).
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Bucket width in seconds.
    pub fn bucket_size_secs(&self) -> i64 {
        self.bucket_size_secs
    }

    /// Number of whole buckets elapsed between the epoch and `timestamp`.
    pub fn get(&self, timestamp: i64) -> Bucket {
        let elapsed = timestamp.saturating_sub(self.start);
        if elapsed <= 0 {
            return 0;
        }
        (elapsed / self.bucket_size_secs) as Bucket
    }

    /// Every bucket between `to` and `from`, newest first.
    ///
    /// Empty when `from` lands in an older bucket than `to`.
    pub fn range(&self, from: i64, to: i64) -> Vec<Bucket> {
        let newest = self.get(from);
        let oldest = self.get(to);
        if newest < oldest {
            return Vec::new();
        }
        (oldest..=newest).rev().collect()
    }

    /// Up to `count` buckets walking backward from the bucket of `from`.
    ///
    /// The walk ends after bucket 0, so fewer than `count` entries come back
    /// for timestamps close to the epoch.
    pub fn buckets(&self, from: i64, count: usize) -> Vec<Bucket> {
        let current = self.get(from);
        let available = usize::try_from(current).map_or(usize::MAX, |c| c.saturating_add(1));
        (0..count.min(available))
            .map(|offset| current - offset as Bucket)
            .collect()
    }
}
