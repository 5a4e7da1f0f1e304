//! Completion notification handlers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

use crate::state::TimerId;

/// Handler invoked once when a timer reaches its target duration.
///
/// Called from the worker thread of the finished timer, after the registry
/// lock has been released.
pub trait CompletionSink: Send + Sync {
    fn on_complete(&self, id: TimerId, name: &str);
}

impl<F> CompletionSink for F
where
    F: Fn(TimerId, &str) + Send + Sync,
{
    fn on_complete(&self, id: TimerId, name: &str) {
        self(id, name)
    }
}

/// A finished timer, as delivered by [`ChannelSink`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub id: TimerId,
    pub name: String,
    pub finished_at: DateTime<Utc>,
}

/// Forwards completions to an async receiver instead of handling them on the worker thread
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Completion>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<Completion>) -> Self {
        Self { tx }
    }

    /// Create a sink together with the receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl CompletionSink for ChannelSink {
    fn on_complete(&self, id: TimerId, name: &str) {
        let completion = Completion {
            id,
            name: name.to_string(),
            finished_at: Utc::now(),
        };
        if let Err(e) = self.tx.send(completion) {
            warn!("Failed to forward completion of timer {}: receiver closed ({})", id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_forwards_completion() {
        let (sink, mut rx) = ChannelSink::channel();
        sink.on_complete(TimerId(3), "Tea");

        let completion = rx.try_recv().unwrap();
        assert_eq!(completion.id, TimerId(3));
        assert_eq!(completion.name, "Tea");
    }

    #[test]
    fn closed_receiver_is_not_fatal() {
        let (sink, rx) = ChannelSink::channel();
        drop(rx);
        sink.on_complete(TimerId(1), "Tea");
    }

    #[test]
    fn closures_are_sinks() {
        let seen = parking_lot::Mutex::new(Vec::new());
        let sink = |id: TimerId, name: &str| seen.lock().push((id, name.to_string()));
        sink.on_complete(TimerId(2), "Eggs");
        assert_eq!(seen.lock().as_slice(), &[(TimerId(2), "Eggs".to_string())]);
    }
}
