//! sla-core: fundamental types, traits and a basic executor for the
//! translation delivery-time SLA pipeline.
//!
//! Provides:
//! - `RawEvent` decoding (see [`event`]), `MinuteKey`, `WindowSize`
//! - the crate-wide `Error`
//! - traits: `Source`, `Operator`, `Sink`
//! - an `Executor` wiring one source, one operator and one sink
//!
//! Quick example:
//! ```no_run
//! use sla_core::{Operator, Sink, Source};
//! # #[tokio::main]
//! # async fn main() -> sla_core::Result<()> {
//! struct Lines;
//! #[async_trait::async_trait]
//! impl Source for Lines {
//!     async fn read(&mut self) -> sla_core::Result<String> { Ok(String::new()) }
//! }
//!
//! struct Upper;
//! impl Operator for Upper {
//!     fn apply(&mut self, input: &str) -> sla_core::Result<String> { Ok(input.to_uppercase()) }
//! }
//!
//! struct Discard;
//! #[async_trait::async_trait]
//! impl Sink for Discard {
//!     async fn write(&mut self, _output: &str) -> sla_core::Result<()> { Ok(()) }
//! }
//!
//! let mut exec = sla_core::Executor::new();
//! exec.source(Lines).operator(Upper).sink(Discard);
//! exec.run().await?;
//! # Ok(()) }
//! ```

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub mod config;
pub mod event;
pub mod metrics;

pub use event::{parse_events, EventMeta, ParseError, RawEvent};

/// Layout of the minute timestamps written to the output.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A calendar minute, counted in whole minutes since the Unix epoch (UTC).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinuteKey(pub i64);

impl MinuteKey {
    /// Truncates `ts` down to the start of its minute.
    pub fn floor(ts: NaiveDateTime) -> Self {
        MinuteKey(ts.and_utc().timestamp().div_euclid(60))
    }

    /// Rounds `ts` up to the next minute boundary unless it already sits on one.
    pub fn ceil(ts: NaiveDateTime) -> Self {
        let floor = Self::floor(ts);
        if ts.second() == 0 && ts.nanosecond() == 0 {
            floor
        } else {
            floor.next()
        }
    }

    pub fn next(self) -> Self {
        MinuteKey(self.0 + 1)
    }

    /// Minutes between `self` and a later `other`; negative when `other` is earlier.
    pub fn minutes_until(self, other: MinuteKey) -> i64 {
        other.0 - self.0
    }

    pub fn offset(self, minutes: i64) -> Self {
        MinuteKey(self.0 + minutes)
    }

    pub fn to_datetime(self) -> Option<NaiveDateTime> {
        DateTime::<Utc>::from_timestamp(self.0.checked_mul(60)?, 0).map(|dt| dt.naive_utc())
    }
}

impl From<NaiveDateTime> for MinuteKey {
    fn from(ts: NaiveDateTime) -> Self {
        MinuteKey::floor(ts)
    }
}

impl fmt::Display for MinuteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format(DATE_FORMAT)),
            None => write!(f, "minute#{}", self.0),
        }
    }
}

/// Number of trailing minutes (current minute included) averaged per output point.
/// Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowSize(u32);

impl WindowSize {
    pub const DEFAULT_MINUTES: u32 = 10;

    pub fn new(minutes: i64) -> Result<Self> {
        match u32::try_from(minutes) {
            Ok(m) if m > 0 => Ok(WindowSize(m)),
            _ => Err(Error::InvalidWindowSize(minutes)),
        }
    }

    pub fn minutes(self) -> i64 {
        i64::from(self.0)
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        WindowSize(Self::DEFAULT_MINUTES)
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("line {line}: {source}")]
    Parse { line: usize, source: ParseError },
    #[error("no events")]
    NoEvents,
    #[error("invalid window size {0}: must be a positive number of minutes")]
    InvalidWindowSize(i64),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Supplies the whole input text in one read.
#[async_trait::async_trait]
pub trait Source: Send {
    async fn read(&mut self) -> Result<String>;
}

/// Synchronous text-to-text transformation run between the source and the sink.
pub trait Operator: Send {
    fn apply(&mut self, input: &str) -> Result<String>;
}

/// Receives the output text produced by the operator.
#[async_trait::async_trait]
pub trait Sink: Send {
    async fn write(&mut self, output: &str) -> Result<()>;
}

#[derive(Default)]
pub struct Executor {
    source: Option<Box<dyn Source>>,
    operator: Option<Box<dyn Operator>>,
    sink: Option<Box<dyn Sink>>,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source<S: Source + 'static>(&mut self, s: S) -> &mut Self {
        self.source = Some(Box::new(s));
        self
    }

    pub fn operator<O: Operator + 'static>(&mut self, o: O) -> &mut Self {
        self.operator = Some(Box::new(o));
        self
    }

    pub fn sink<K: Sink + 'static>(&mut self, s: K) -> &mut Self {
        self.sink = Some(Box::new(s));
        self
    }

    /// Reads the source, applies the operator and hands the result to the sink.
    /// Nothing reaches the sink if reading or the operator fails.
    #[instrument(name = "executor_run", skip_all)]
    pub async fn run(&mut self) -> Result<()> {
        let mut source = self.source.take().ok_or_else(|| anyhow::anyhow!("no source"))?;
        let mut operator = self.operator.take().ok_or_else(|| anyhow::anyhow!("no operator"))?;
        let mut sink = self.sink.take().ok_or_else(|| anyhow::anyhow!("no sink"))?;

        let input = source.read().await?;
        debug!(bytes = input.len(), "source read");
        let output = operator.apply(&input)?;
        debug!(bytes = output.len(), "operator applied");
        sink.write(&output).await?;
        Ok(())
    }
}

pub mod prelude {
    pub use super::{
        Error, Executor, MinuteKey, Operator, RawEvent, Result, Sink, Source, WindowSize,
    };
}
