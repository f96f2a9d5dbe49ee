use async_trait::async_trait;
use roomcall_core::{RelayMessage, SignalEnvelope};
use roomcall_session::{RelayChannel, RelayError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, mpsc};

/// Relay that captures everything the session emits.
#[derive(Clone)]
pub struct MockRelay {
    /// Channel to send captured messages.
    tx: mpsc::UnboundedSender<RelayMessage>,
    /// All captured messages (for verification).
    emitted: Arc<Mutex<Vec<RelayMessage>>>,
    disconnected: Arc<AtomicBool>,
}

impl MockRelay {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RelayMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let relay = Self {
            tx,
            emitted: Arc::new(Mutex::new(Vec::new())),
            disconnected: Arc::new(AtomicBool::new(false)),
        };
        (relay, rx)
    }

    pub async fn emitted(&self) -> Vec<RelayMessage> {
        self.emitted.lock().await.clone()
    }

    pub async fn signals(&self) -> Vec<SignalEnvelope> {
        self.emitted
            .lock()
            .await
            .iter()
            .filter_map(|m| match m {
                RelayMessage::Signal(envelope) => Some(envelope.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelayChannel for MockRelay {
    async fn emit(&self, message: RelayMessage) -> Result<(), RelayError> {
        if self.is_disconnected() {
            return Err(RelayError::Closed);
        }
        tracing::debug!("[MockRelay] emit {:?}", message);

        self.emitted.lock().await.push(message.clone());
        let _ = self.tx.send(message);
        Ok(())
    }

    async fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }
}
