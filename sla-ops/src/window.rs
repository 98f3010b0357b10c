use sla_core::{MinuteKey, WindowSize};
use tracing::{debug, instrument};

use crate::bucket::{BucketMap, MinuteBucket};

/// One output minute and the mean duration over the window ending at it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputRecord {
    pub minute: MinuteKey,
    /// `None` when no event fell inside the window.
    pub average: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Totals {
    sum: u128,
    count: u64,
}

impl Totals {
    fn add(&mut self, b: &MinuteBucket) {
        self.sum += b.sum;
        self.count += b.count;
    }

    fn remove(&mut self, b: &MinuteBucket) {
        self.sum -= b.sum;
        self.count -= b.count;
    }

    fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

/// Trailing-window mean over a read-only bucket map.
///
/// The window ending at minute `m` covers `m - size + 1 ..= m`.
pub struct WindowAverager<'a> {
    buckets: &'a BucketMap,
    window: WindowSize,
}

impl<'a> WindowAverager<'a> {
    pub fn new(buckets: &'a BucketMap, window: WindowSize) -> Self {
        Self { buckets, window }
    }

    fn window_start(&self, minute: MinuteKey) -> MinuteKey {
        minute.offset(1 - self.window.minutes())
    }

    fn totals_at(&self, minute: MinuteKey) -> Totals {
        let start = self.window_start(minute);
        let mut totals = Totals::default();
        for (key, bucket) in self.buckets.iter() {
            if start <= key && key <= minute {
                totals.add(bucket);
            }
        }
        totals
    }

    /// Mean of the window ending at `minute`, computed from scratch.
    pub fn average_at(&self, minute: MinuteKey) -> Option<f64> {
        self.totals_at(minute).average()
    }

    /// One record per minute of `first ..= last`, ascending. Empty when `last < first`.
    #[instrument(name = "window_averages", skip(self), fields(window = %self.window))]
    pub fn averages(&self, first: MinuteKey, last: MinuteKey) -> Vec<OutputRecord> {
        let span = first.minutes_until(last);
        if span < 0 {
            debug!(%first, %last, "range is empty");
            return Vec::new();
        }
        let mut out = Vec::with_capacity(span as usize + 1);
        let mut totals = self.totals_at(first);
        let mut minute = first;
        loop {
            out.push(OutputRecord {
                minute,
                average: totals.average(),
            });
            if minute == last {
                break;
            }
            // slide: the oldest minute leaves, the next one enters
            if let Some(b) = self.buckets.get(self.window_start(minute)) {
                totals.remove(b);
            }
            minute = minute.next();
            if let Some(b) = self.buckets.get(minute) {
                totals.add(b);
            }
        }
        debug!(minutes = out.len(), buckets = self.buckets.len(), "averaged");
        out
    }
}
