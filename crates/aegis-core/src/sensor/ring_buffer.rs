//! Bounded ring buffer of `MetricSnapshot`s backing both `Latest()` and
//! `Window(seconds)` queries. Fixed capacity so long uptimes never grow
//! memory use (§4.3 "a bounded history, not an unbounded log").

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use aegis_models::MetricSnapshot;

pub const DEFAULT_CAPACITY: usize = 720;

pub struct SnapshotRing {
    capacity: usize,
    samples: VecDeque<MetricSnapshot>,
}

impl SnapshotRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            samples: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn push(&mut self, snapshot: MetricSnapshot) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(snapshot);
    }

    pub fn latest(&self) -> Option<MetricSnapshot> {
        self.samples.back().copied()
    }

    /// All samples with `timestamp >= now - seconds`, oldest first.
    pub fn window(&self, seconds: u64) -> Vec<MetricSnapshot> {
        let cutoff = Utc::now() - chrono::Duration::seconds(seconds as i64);
        self.samples
            .iter()
            .filter(|s| s.timestamp >= cutoff)
            .copied()
            .collect()
    }

    pub fn since(&self, start: DateTime<Utc>) -> Vec<MetricSnapshot> {
        self.samples.iter().filter(|s| s.timestamp >= start).copied().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
