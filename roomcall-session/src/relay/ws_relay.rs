use crate::error::RelayError;
use crate::relay::{RelayChannel, RelayEvent};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use roomcall_core::RelayMessage;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

enum Outgoing {
    Text(String),
    Close,
}

/// [`RelayChannel`] over a WebSocket connection to the rendezvous relay.
pub struct WsRelayChannel {
    tx: mpsc::UnboundedSender<Outgoing>,
}

impl WsRelayChannel {
    /// Opens the socket and returns the channel together with the inbound
    /// event stream. The stream ends with [`RelayEvent::Closed`].
    pub async fn connect(url: &str) -> Result<(Self, mpsc::Receiver<RelayEvent>), RelayError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| RelayError::Connect(e.to_string()))?;
        info!("Connected to relay at {}", url);

        let (mut sink, mut stream) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Outgoing>();
        let (event_tx, event_rx) = mpsc::channel(256);

        tokio::spawn(async move {
            while let Some(out) = rx.recv().await {
                match out {
                    Outgoing::Text(json) => {
                        if let Err(e) = sink.send(Message::Text(json.into())).await {
                            warn!("Failed to write to relay: {}", e);
                            break;
                        }
                    }
                    Outgoing::Close => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                let msg = match frame {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!("Relay read error: {}", e);
                        break;
                    }
                };

                match msg {
                    Message::Text(text) => match serde_json::from_str::<RelayMessage>(&text) {
                        Ok(message) => {
                            debug!("Relay IN: {:?}", message);
                            let Some(event) = RelayEvent::from_message(message) else {
                                continue;
                            };
                            if event_tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid relay message: {:?}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }

            let _ = event_tx.send(RelayEvent::Closed).await;
            info!("Relay connection closed");
        });

        Ok((Self { tx }, event_rx))
    }
}

#[async_trait]
impl RelayChannel for WsRelayChannel {
    async fn emit(&self, message: RelayMessage) -> Result<(), RelayError> {
        let json =
            serde_json::to_string(&message).map_err(|e| RelayError::Encode(e.to_string()))?;
        self.tx
            .send(Outgoing::Text(json))
            .map_err(|_| RelayError::Closed)
    }

    async fn disconnect(&self) {
        let _ = self.tx.send(Outgoing::Close);
    }
}
