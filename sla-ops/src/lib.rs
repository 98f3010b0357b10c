//! sla-ops: the moving-average transformation built on top of sla-core.
//!
//! Stages, in order:
//! - parse: `sla_core::parse_events` decodes one event per line
//! - `bucket`: per-minute sum/count plus the floored first and ceiled last minute
//! - `window`: trailing-window mean for every minute of the range
//! - `format`: one output line per minute
//!
//! ```
//! use sla_core::WindowSize;
//! let input = r#"{"timestamp": "2018-12-26 18:11:00.000000", "duration": 20}"#;
//! let out = sla_ops::moving_average(input, WindowSize::default()).unwrap();
//! assert_eq!(out, r#"{"date": "2018-12-26 18:11:00", "average_delivery_time": 20}"#);
//! ```

use sla_core::{metrics, parse_events, Operator, Result, WindowSize};
use tracing::{debug, instrument};

pub mod bucket;
pub mod format;
pub mod window;

pub use bucket::{bucket_events, BucketMap, Bucketed, MinuteBucket, MinuteBucketer};
pub use format::{format_average, render, render_record};
pub use window::{OutputRecord, WindowAverager};

/// Computes the per-minute moving average for `input`.
///
/// Fails on the first malformed line, and with `Error::NoEvents` when the
/// input holds no events at all.
#[instrument(name = "moving_average", skip(input), fields(bytes = input.len()))]
pub fn moving_average(input: &str, window: WindowSize) -> Result<String> {
    let records = moving_average_records(input, window)?;
    Ok(render(&records))
}

/// Same as [`moving_average`] but returns the records before rendering.
pub fn moving_average_records(input: &str, window: WindowSize) -> Result<Vec<OutputRecord>> {
    let bucketed = bucket_events(parse_events(input))?;
    debug!(
        buckets = bucketed.buckets.len(),
        first = %bucketed.first,
        last = %bucketed.last,
        "bucketed events"
    );
    let records = WindowAverager::new(&bucketed.buckets, window).averages(bucketed.first, bucketed.last);
    for r in &records {
        let label = if r.average.is_some() { "value" } else { "empty" };
        metrics::MINUTES_EMITTED.with_label_values(&[label]).inc();
    }
    Ok(records)
}

/// Operator form of [`moving_average`], for use with `sla_core::Executor`.
///
/// ```no_run
/// use sla_ops::MovingAverage;
/// let op = MovingAverage::new(sla_core::WindowSize::default());
/// # let _ = op;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MovingAverage {
    window: WindowSize,
}

impl MovingAverage {
    pub fn new(window: WindowSize) -> Self {
        Self { window }
    }
}

impl Operator for MovingAverage {
    fn apply(&mut self, input: &str) -> Result<String> {
        moving_average(input, self.window)
    }
}

pub mod prelude {
    pub use super::{
        bucket_events, moving_average, BucketMap, Bucketed, MinuteBucket, MovingAverage,
        OutputRecord, WindowAverager,
    };
}
