use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::bounded;
use md_types::MarketDataUpdate;

/// Downstream publisher boundary
///
/// Fire-and-forget from the dispatcher's perspective; a sink failure is the
/// collaborator's concern and must never block the admission path.
pub trait PublishSink: Send + Sync {
    fn publish(&self, update: MarketDataUpdate);
}

/// Sink handing admitted updates to a consumer thread over a bounded channel
pub struct ChannelSink {
    sender: Sender<MarketDataUpdate>,
}

impl ChannelSink {
    /// Create a sink together with the consumer end of its channel
    pub fn bounded(capacity: usize) -> (Self, Receiver<MarketDataUpdate>) {
        let (tx, rx) = bounded(capacity);
        (Self { sender: tx }, rx)
    }
}

impl PublishSink for ChannelSink {
    fn publish(&self, update: MarketDataUpdate) {
        if self.sender.try_send(update).is_err() {
            tracing::error!("Warning: Publish queue full, dropping update");
        }
    }
}
