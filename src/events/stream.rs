//! Async event stream for external consumers.
//!
//! The core publishes synchronously; an indexer running on tokio can take the
//! [`EventStream`] half and drive it with `StreamExt::next` or `tokio::select!`.

use super::{EventSink, GovernanceEvent};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;

/// Receiving half: a `Stream` of committed events, in commit order.
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<GovernanceEvent>,
}

impl EventStream {
    /// Create a connected stream/sink pair.
    pub fn channel() -> (Self, ChannelSink) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { receiver }, ChannelSink { sender })
    }
}

impl Stream for EventStream {
    type Item = GovernanceEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Sending half, installed on the ledger as its sink.
#[derive(Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<GovernanceEvent>,
}

impl EventSink for ChannelSink {
    fn publish(&self, event: &GovernanceEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!(event = event.name(), "event stream closed, dropping event");
        }
    }
}
