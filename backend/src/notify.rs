use shared::ChangeEvent;
use tokio::sync::broadcast;
use tracing::debug;

pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Fan-out of ledger changes to dashboards.
///
/// Publishing never blocks and never fails the caller; slow subscribers lag
/// and drop events instead of applying back-pressure.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: ChangeEvent) {
        match self.sender.send(event) {
            Ok(receivers) => debug!("Published change event to {} subscribers", receivers),
            Err(broadcast::error::SendError(event)) => debug!("No subscribers for {:?}", event),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}
