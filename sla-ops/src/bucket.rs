use std::collections::HashMap;

use chrono::NaiveDateTime;
use sla_core::{metrics, Error, MinuteKey, RawEvent, Result};

/// Sum and count of the durations that landed in one minute.
/// `sum` is widened so any count of `u64` durations fits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinuteBucket {
    pub sum: u128,
    pub count: u64,
}

impl MinuteBucket {
    fn add(&mut self, duration: u64) {
        self.sum += u128::from(duration);
        self.count += 1;
    }
}

/// Sparse per-minute aggregates. Minutes without events have no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketMap {
    buckets: HashMap<MinuteKey, MinuteBucket>,
}

impl BucketMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, minute: MinuteKey, duration: u64) {
        self.buckets.entry(minute).or_default().add(duration);
    }

    pub fn get(&self, minute: MinuteKey) -> Option<&MinuteBucket> {
        self.buckets.get(&minute)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MinuteKey, &MinuteBucket)> {
        self.buckets.iter().map(|(k, v)| (*k, v))
    }
}

impl FromIterator<(MinuteKey, u64)> for BucketMap {
    fn from_iter<I: IntoIterator<Item = (MinuteKey, u64)>>(iter: I) -> Self {
        let mut map = BucketMap::new();
        for (minute, duration) in iter {
            map.observe(minute, duration);
        }
        map
    }
}

/// Bucketed events together with the inclusive output range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucketed {
    pub buckets: BucketMap,
    /// First event in stream order, floored to its minute.
    pub first: MinuteKey,
    /// Last event in stream order, ceiled to the next minute boundary.
    pub last: MinuteKey,
}

/// Single-pass accumulator folding events into minute buckets.
#[derive(Debug, Default)]
pub struct MinuteBucketer {
    buckets: BucketMap,
    first: Option<NaiveDateTime>,
    last: Option<NaiveDateTime>,
}

impl MinuteBucketer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, event: &RawEvent) {
        self.buckets
            .observe(MinuteKey::floor(event.timestamp), event.duration);
        self.first.get_or_insert(event.timestamp);
        self.last = Some(event.timestamp);
        metrics::EVENTS_PARSED.inc();
        metrics::EVENT_DURATION.observe(event.duration as f64);
    }

    pub fn finish(self) -> Result<Bucketed> {
        let (Some(first), Some(last)) = (self.first, self.last) else {
            return Err(Error::NoEvents);
        };
        metrics::BUCKETS.set(self.buckets.len() as i64);
        Ok(Bucketed {
            buckets: self.buckets,
            first: MinuteKey::floor(first),
            last: MinuteKey::ceil(last),
        })
    }
}

/// Folds a stream of decoded events, stopping at the first error.
pub fn bucket_events<I>(events: I) -> Result<Bucketed>
where
    I: IntoIterator<Item = Result<RawEvent>>,
{
    let mut bucketer = MinuteBucketer::new();
    for event in events {
        bucketer.observe(&event?);
    }
    bucketer.finish()
}
