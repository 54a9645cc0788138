use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_BUFFER: usize = 64;

/// One rendered broadcast line for listening observers (chat bridges, overlays).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadcastMessage {
    pub timestamp_ms: i64,
    pub color: String,
    pub text: String,
}

pub struct BroadcastHub {
    sender: broadcast::Sender<BroadcastMessage>,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        let (sender, _rx) = broadcast::channel(CHANNEL_BUFFER);
        Self { sender }
    }
}

impl BroadcastHub {
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastMessage> {
        self.sender.subscribe()
    }

    /// Sends to current subscribers; returns how many received it.
    pub fn publish(&self, message: BroadcastMessage) -> usize {
        self.sender.send(message).unwrap_or(0)
    }
}
