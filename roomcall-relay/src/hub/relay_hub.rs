use roomcall_core::{PeerId, RelayMessage, RoomId, SignalEnvelope};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct PeerEntry {
    tx: mpsc::UnboundedSender<RelayMessage>,
    room: Option<RoomId>,
}

struct HubInner {
    peers: DashMap<PeerId, PeerEntry>,
    rooms: DashMap<RoomId, Vec<PeerId>>,
    room_capacity: usize,
}

/// Routing core of the relay, independent of the transport.
///
/// Every peer owns one unbounded outbound channel, so messages to a given
/// peer are delivered in the order the hub produced them.
#[derive(Clone)]
pub struct RelayHub {
    inner: Arc<HubInner>,
}

impl RelayHub {
    pub fn new(room_capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                peers: DashMap::new(),
                rooms: DashMap::new(),
                room_capacity: room_capacity.max(1),
            }),
        }
    }

    /// Assigns an id to a new connection and greets it with `connected`.
    pub fn register(&self, tx: mpsc::UnboundedSender<RelayMessage>) -> PeerId {
        let peer = PeerId::generate();
        let _ = tx.send(RelayMessage::Connected { peer: peer.clone() });
        self.inner
            .peers
            .insert(peer.clone(), PeerEntry { tx, room: None });
        info!("Peer {} connected", peer);
        peer
    }

    /// Dispatches one client message.
    pub fn handle_message(&self, peer: &PeerId, message: RelayMessage) {
        match message {
            RelayMessage::JoinRoom { room } => self.join(peer, room),
            RelayMessage::Signal(envelope) => self.forward(peer, envelope),
            other => {
                warn!("Peer {} sent a relay-only message: {:?}", peer, other);
                self.send_to(
                    peer,
                    RelayMessage::Error {
                        message: "unexpected message".into(),
                    },
                );
            }
        }
    }

    /// Admits `peer` into `room` and announces it to everyone already there.
    ///
    /// Joining a different room leaves the current one first. A full room
    /// answers the joiner with `room-full` and changes nothing.
    pub fn join(&self, peer: &PeerId, room: RoomId) {
        let current = match self.inner.peers.get(peer) {
            Some(entry) => entry.room.clone(),
            None => {
                warn!("join-room from unknown peer {}", peer);
                return;
            }
        };

        if current.as_ref() == Some(&room) {
            debug!("Peer {} is already in room '{}'", peer, room);
            return;
        }

        let existing = {
            let mut members = self.inner.rooms.entry(room.clone()).or_default();
            if members.len() >= self.inner.room_capacity {
                None
            } else {
                let existing = members.clone();
                members.push(peer.clone());
                Some(existing)
            }
        };

        let Some(existing) = existing else {
            warn!("Room '{}' is full, refusing {}", room, peer);
            self.send_to(peer, RelayMessage::RoomFull { room });
            return;
        };

        if let Some(previous) = current {
            self.remove_from_room(peer, &previous);
        }
        if let Some(mut entry) = self.inner.peers.get_mut(peer) {
            entry.room = Some(room.clone());
        }

        info!(
            "Peer {} joined room '{}' ({} already present)",
            peer,
            room,
            existing.len()
        );
        for member in existing {
            self.send_to(&member, RelayMessage::UserConnected { peer: peer.clone() });
        }
    }

    /// Relays a signal with the sender stamped as `from`.
    ///
    /// `to` is resolved as a peer first, then as a room (every other member
    /// receives it). Anything else is dropped.
    pub fn forward(&self, from: &PeerId, envelope: SignalEnvelope) {
        let envelope = SignalEnvelope {
            from: from.clone(),
            ..envelope
        };
        let kind = envelope.payload.kind_name();

        if self.inner.peers.contains_key(&envelope.to) {
            debug!("Forwarding {} {} -> {}", kind, from, envelope.to);
            let to = envelope.to.clone();
            self.send_to(&to, RelayMessage::Signal(envelope));
            return;
        }

        let members = RoomId::parse(envelope.to.as_str())
            .ok()
            .and_then(|room| self.inner.rooms.get(&room).map(|m| m.value().clone()));

        match members {
            Some(members) => {
                debug!("Broadcasting {} from {} to room '{}'", kind, from, envelope.to);
                for member in members.iter().filter(|m| *m != from) {
                    self.send_to(member, RelayMessage::Signal(envelope.clone()));
                }
            }
            None => warn!("Dropping {} from {}: unknown target '{}'", kind, from, envelope.to),
        }
    }

    /// Forgets a closed connection and tells its room.
    pub fn leave(&self, peer: &PeerId) {
        let Some((_, entry)) = self.inner.peers.remove(peer) else {
            return;
        };
        if let Some(room) = entry.room {
            self.remove_from_room(peer, &room);
        }
        info!("Peer {} disconnected", peer);
    }

    pub fn peer_count(&self) -> usize {
        self.inner.peers.len()
    }

    pub fn room_members(&self, room: &RoomId) -> Vec<PeerId> {
        self.inner
            .rooms
            .get(room)
            .map(|m| m.value().clone())
            .unwrap_or_default()
    }

    fn remove_from_room(&self, peer: &PeerId, room: &RoomId) {
        let remaining = {
            let Some(mut members) = self.inner.rooms.get_mut(room) else {
                return;
            };
            members.retain(|m| m != peer);
            members.clone()
        };

        if remaining.is_empty() {
            self.inner.rooms.remove_if(room, |_, members| members.is_empty());
            debug!("Room '{}' is empty, removed", room);
        }

        for member in remaining {
            self.send_to(
                &member,
                RelayMessage::UserDisconnected { peer: peer.clone() },
            );
        }
    }

    fn send_to(&self, peer: &PeerId, message: RelayMessage) {
        let tx = match self.inner.peers.get(peer) {
            Some(entry) => entry.tx.clone(),
            None => {
                warn!("Attempted to send to disconnected peer {}", peer);
                return;
            }
        };
        if tx.send(message).is_err() {
            warn!("Outbound channel of {} is closed", peer);
        }
    }
}
