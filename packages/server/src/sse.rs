//! Server-sent event plumbing for `/scrape`.
//!
//! The pipeline reports progress synchronously through a
//! [`ProgressSink`]; [`ChannelSink`] forwards each event onto an unbounded
//! channel whose receiver feeds the HTTP response stream. When the client
//! disconnects actix drops the stream, the receiver goes with it, and the
//! next send fails, which stops the run.

use actix_web::web::Bytes;
use dissident_pipeline::{ProgressEvent, ProgressSink, SinkClosed};
use dissident_server_models::StreamEvent;
use tokio::sync::mpsc::UnboundedSender;

/// [`ProgressSink`] that forwards events to an SSE response.
pub struct ChannelSink {
    tx: UnboundedSender<StreamEvent>,
}

impl ChannelSink {
    /// Wraps the sending half of the response channel.
    #[must_use]
    pub const fn new(tx: UnboundedSender<StreamEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn send(&self, event: ProgressEvent) -> Result<(), SinkClosed> {
        self.tx
            .send(StreamEvent::from(event))
            .map_err(|_| SinkClosed)
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Encodes one event as an SSE `data:` frame.
///
/// # Errors
///
/// Returns the serializer error if the event cannot be encoded.
pub fn frame(event: &StreamEvent) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_string(event)?;
    Ok(Bytes::from(format!("data: {json}\n\n")))
}
