//! Progress reporting for scrape runs.
//!
//! The driver talks to a [`ProgressEmitter`], which owns the run's
//! percentage bookkeeping and forwards [`ProgressEvent`]s to a
//! [`ProgressSink`]. Sinks decide where events go: nowhere
//! ([`NullSink`]), into memory ([`CollectingSink`]), onto an SSE channel
//! or onto a terminal progress bar.

use std::sync::Mutex;

use serde::Serialize;

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// Completion in `[0, 100]`, one decimal place.
    pub percent: f64,
    /// Last page fetched, 0 before the first.
    pub page: u32,
    /// Pages the run intends to fetch, 0 when unknown.
    pub total_pages: u32,
    /// Human-readable status line.
    pub message: String,
}

/// The consumer of a [`ProgressSink`] is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("progress sink closed")]
pub struct SinkClosed;

/// Receives progress events, in order, from a single run.
///
/// Implementations must be `Send + Sync` so a sink can be shared with a
/// spawned task.
pub trait ProgressSink: Send + Sync {
    /// Delivers one event.
    ///
    /// # Errors
    ///
    /// Returns [`SinkClosed`] when nobody is listening any more; the run
    /// stops at its next checkpoint.
    fn send(&self, event: ProgressEvent) -> Result<(), SinkClosed>;

    /// Whether the next [`Self::send`] is already known to fail. Checked
    /// before each page fetch so a departed consumer costs no further
    /// requests.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn send(&self, _event: ProgressEvent) -> Result<(), SinkClosed> {
        Ok(())
    }
}

/// Records events in memory.
///
/// Optionally stops accepting after a fixed number of events, which
/// simulates a consumer that disconnects mid-run.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ProgressEvent>>,
    capacity: Option<usize>,
}

impl CollectingSink {
    /// A sink that keeps every event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that accepts `capacity` events and reports closed after.
    #[must_use]
    pub fn closing_after(capacity: usize) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            capacity: Some(capacity),
        }
    }

    /// Events received so far.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl ProgressSink for CollectingSink {
    fn send(&self, event: ProgressEvent) -> Result<(), SinkClosed> {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if self.capacity.is_some_and(|cap| events.len() >= cap) {
            return Err(SinkClosed);
        }
        events.push(event);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        let events = self
            .events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.capacity.is_some_and(|cap| events.len() >= cap)
    }
}

/// Turns raw percentages into a non-decreasing event stream.
pub struct ProgressEmitter<'a> {
    sink: &'a dyn ProgressSink,
    last_percent: f64,
}

impl<'a> ProgressEmitter<'a> {
    /// Starts a run at 0%.
    #[must_use]
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            sink,
            last_percent: 0.0,
        }
    }

    /// Sends one event. `percent` is clamped to `[0, 100]`, rounded to one
    /// decimal and never allowed below the previous event's value.
    ///
    /// # Errors
    ///
    /// Returns [`SinkClosed`] if the sink rejected the event.
    pub fn emit(
        &mut self,
        percent: f64,
        page: u32,
        total_pages: u32,
        message: impl Into<String>,
    ) -> Result<(), SinkClosed> {
        let percent = round1(percent.clamp(0.0, 100.0)).max(self.last_percent);
        self.last_percent = percent;

        self.sink.send(ProgressEvent {
            percent,
            page,
            total_pages,
            message: message.into(),
        })
    }

    /// Percentage of the most recent event.
    #[must_use]
    pub const fn last_percent(&self) -> f64 {
        self.last_percent
    }

    /// Whether the sink has stopped accepting events.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sink.is_closed()
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
