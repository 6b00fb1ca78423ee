//! Rolling per-instance sample history with time-based retention.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use instmon::RawSample;

pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    if dq.len() == cap {
        dq.pop_front();
    }
    dq.push_back(v);
}

pub struct History {
    per_instance: HashMap<String, VecDeque<RawSample>>,
    retention: chrono::Duration,
    cap: usize,
}

impl History {
    pub fn new(retention: Duration, cap: usize) -> Self {
        Self {
            per_instance: HashMap::new(),
            retention: chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::MAX),
            cap: cap.max(1),
        }
    }

    /// Append a sample and drop everything older than the retention window
    /// measured back from `now`.
    pub fn record(&mut self, instance_id: &str, sample: RawSample, now: DateTime<Utc>) {
        let cutoff = now.checked_sub_signed(self.retention);
        let dq = self
            .per_instance
            .entry(instance_id.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.cap.min(1024)));
        push_capped(dq, sample, self.cap);
        if let Some(cutoff) = cutoff {
            while dq.front().is_some_and(|s| s.timestamp <= cutoff) {
                dq.pop_front();
            }
        }
    }

    pub fn contains(&self, instance_id: &str) -> bool {
        self.per_instance
            .get(instance_id)
            .is_some_and(|dq| !dq.is_empty())
    }

    pub fn len(&self, instance_id: &str) -> usize {
        self.per_instance.get(instance_id).map_or(0, VecDeque::len)
    }

    pub fn latest(&self, instance_id: &str) -> Option<&RawSample> {
        self.per_instance.get(instance_id).and_then(|dq| dq.back())
    }

    pub fn latest_all(&self) -> BTreeMap<String, RawSample> {
        self.per_instance
            .iter()
            .filter_map(|(id, dq)| dq.back().map(|s| (id.clone(), s.clone())))
            .collect()
    }

    /// Samples with `start <= timestamp <= end`, oldest first. Unknown ids yield nothing.
    pub fn range(&self, instance_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<RawSample> {
        self.per_instance
            .get(instance_id)
            .map(|dq| {
                dq.iter()
                    .filter(|s| start <= s.timestamp && s.timestamp <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}
