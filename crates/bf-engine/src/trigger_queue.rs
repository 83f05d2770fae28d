//! Queue of swung triggers waiting for their sub-tick time.

use bf_ir::Timestamp;

use crate::scheduler::Trigger;

/// Pending triggers sorted by timestamp.
#[derive(Clone, Debug, Default)]
pub struct TriggerQueue {
    entries: Vec<(Timestamp, Trigger)>,
}

impl TriggerQueue {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Insert keeping time order; equal times keep insertion order.
    pub fn push(&mut self, time: Timestamp, trigger: Trigger) {
        let pos = self.entries.partition_point(|(t, _)| *t <= time);
        self.entries.insert(pos, (time, trigger));
    }

    /// Remove and return every trigger due at or before `time`.
    pub fn pop_until(&mut self, time: Timestamp) -> Vec<Trigger> {
        let due = self.entries.partition_point(|(t, _)| *t <= time);
        self.entries.drain(..due).map(|(_, trigger)| trigger).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
