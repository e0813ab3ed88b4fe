//! Time-ordered holding area for particles awaiting their window.
//!
//! Keys are `(absolute time, insertion sequence)`: equal times keep the
//! order in which particles were inserted, which is decay generation order
//! and then particle order within a decay. This makes a seeded stream
//! reproducible down to the order of simultaneous particles.

use std::collections::BTreeMap;

use hifreq_core::types::Particle;
use ordered_float::OrderedFloat;

type Key = (OrderedFloat<f64>, u64);

#[derive(Debug, Clone, Default)]
pub struct PendingBuffer {
    entries: BTreeMap<Key, Particle>,
    next_seq: u64,
}

impl PendingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a particle keyed by its (absolute) `time`.
    pub fn insert(&mut self, particle: Particle) {
        debug_assert!(!particle.time.is_nan(), "particle time is NaN");
        let key = (OrderedFloat(particle.time), self.next_seq);
        self.next_seq += 1;
        self.entries.insert(key, particle);
    }

    pub fn earliest_time(&self) -> Option<f64> {
        self.entries.keys().next().map(|(t, _)| t.0)
    }

    pub fn latest_time(&self) -> Option<f64> {
        self.entries.keys().next_back().map(|(t, _)| t.0)
    }

    /// Remove and return, in ascending order, every particle with
    /// `time < upper`. Everything at or after `upper` stays buffered, so the
    /// buffer never holds a particle earlier than the last edge drained to.
    ///
    /// Callers pass the same `upper` they advance their clock to. Offsets
    /// re-based to a lower edge are then below `upper - lower`, which is the
    /// window width up to the rounding of `lower + width`.
    pub fn drain_before(&mut self, upper: f64) -> Vec<Particle> {
        let rest = self.entries.split_off(&(OrderedFloat(upper), 0));
        std::mem::replace(&mut self.entries, rest)
            .into_values()
            .collect()
    }

    /// Iterate in ascending time order without removing anything.
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.entries.values()
    }
}
