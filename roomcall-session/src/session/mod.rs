use crate::agent::{AgentEvent, AgentFactory, ConnectionState, NegotiationAgent, RemoteTrack};
use crate::error::SessionError;
use crate::media::{LocalMediaState, LocalStream, LocalTrack, MediaDevices};
use crate::relay::{RelayChannel, RelayEvent};
use roomcall_core::{
    CallConfig, IceCandidate, PeerId, RelayMessage, RoomId, SessionDescription, SignalEnvelope,
    SignalPayload,
};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

mod candidate_queue;
mod end_impl;
mod handle;
mod handle_signal_impl;
mod peer_joined_impl;
mod share_impl;
mod start_impl;
mod toggle_impl;

pub use handle::SessionHandle;

use candidate_queue::CandidateQueue;

/// Lifecycle of one call. `Ended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Joining,
    AwaitingPeer,
    Negotiating,
    Connected,
    Ended,
}

/// What the presentation layer gets to render or toast.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged(SessionState),
    LocalStream(LocalStream),
    RemoteTrack(RemoteTrack),
    ConnectionStateChanged(ConnectionState),
    MediaChanged(LocalMediaState),
    PeerLeft(PeerId),
    RoomFull(RoomId),
    ShareStopped,
    /// A failure the call survived.
    Recoverable(SessionError),
}

pub type SessionEvents = mpsc::UnboundedReceiver<SessionEvent>;

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

pub(crate) enum Command {
    Start { room: RoomId, reply: Reply<()> },
    ToggleAudio { reply: Reply<bool> },
    ToggleVideo { reply: Reply<bool> },
    ToggleScreenShare { reply: Reply<bool> },
    End,
}

/// Capabilities and configuration a session is built from.
pub struct SessionDeps {
    pub config: CallConfig,
    pub devices: Arc<dyn MediaDevices>,
    pub agents: Arc<dyn AgentFactory>,
    pub relay: Arc<dyn RelayChannel>,
    pub relay_events: mpsc::Receiver<RelayEvent>,
}

/// Where the offer/answer exchange stands for the current agent.
#[derive(Debug, Default)]
struct Negotiation {
    /// Our offer is applied locally and its answer has not arrived.
    local_offer_outstanding: bool,
    /// Most recent description accepted by `set_remote_description`.
    last_remote: Option<SessionDescription>,
}

impl Negotiation {
    fn has_remote_description(&self) -> bool {
        self.last_remote.is_some()
    }
}

/// The room session controller.
///
/// Owns the single negotiation agent, the local capture and the relay for
/// one call. All transitions run inside [`RoomSession::run`], one at a time;
/// relay and agent events that arrive while a step is suspended wait in
/// their channels.
pub struct RoomSession {
    config: CallConfig,
    devices: Arc<dyn MediaDevices>,
    agents: Arc<dyn AgentFactory>,
    relay: Arc<dyn RelayChannel>,

    command_rx: mpsc::Receiver<Command>,
    relay_rx: mpsc::Receiver<RelayEvent>,
    relay_open: bool,
    agent_rx: Option<mpsc::Receiver<AgentEvent>>,
    share_ended_tx: mpsc::UnboundedSender<String>,
    share_ended_rx: mpsc::UnboundedReceiver<String>,

    state_tx: watch::Sender<SessionState>,
    media_tx: watch::Sender<LocalMediaState>,
    ended_tx: Arc<watch::Sender<bool>>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,

    room: Option<RoomId>,
    local_peer: Option<PeerId>,
    remote_peer: Option<PeerId>,
    /// Arrival notifications are acted on only after `start`.
    listening: bool,

    agent: Option<Arc<dyn NegotiationAgent>>,
    local_stream: Option<LocalStream>,
    screen_track: Option<LocalTrack>,
    negotiation: Negotiation,
    pending_candidates: CandidateQueue,
    applied_candidates: HashSet<IceCandidate>,
}

impl RoomSession {
    pub fn new(deps: SessionDeps) -> (Self, SessionHandle, SessionEvents) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (share_ended_tx, share_ended_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        let (media_tx, media_rx) = watch::channel(LocalMediaState::default());
        let (ended_tx, _) = watch::channel(false);
        let ended_tx = Arc::new(ended_tx);

        let pending_candidates = CandidateQueue::new(deps.config.candidate_queue_limit);

        let session = Self {
            config: deps.config,
            devices: deps.devices,
            agents: deps.agents,
            relay: deps.relay,
            command_rx,
            relay_rx: deps.relay_events,
            relay_open: true,
            agent_rx: None,
            share_ended_tx,
            share_ended_rx,
            state_tx,
            media_tx,
            ended_tx: ended_tx.clone(),
            event_tx,
            room: None,
            local_peer: None,
            remote_peer: None,
            listening: false,
            agent: None,
            local_stream: None,
            screen_track: None,
            negotiation: Negotiation::default(),
            pending_candidates,
            applied_candidates: HashSet::new(),
        };

        let handle = SessionHandle::new(command_tx, ended_tx, state_rx, media_rx);

        (session, handle, event_rx)
    }

    pub async fn run(mut self) {
        info!("Room session loop started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All session handles dropped. Ending call.");
                            self.ended_tx.send_replace(true);
                            self.end().await;
                        }
                    }
                }

                evt = self.relay_rx.recv(), if self.relay_open => {
                    match evt {
                        Some(e) => self.handle_relay_event(e).await,
                        None => {
                            warn!("Relay event stream closed unexpectedly");
                            self.relay_open = false;
                        }
                    }
                }

                evt = next_agent_event(&mut self.agent_rx) => {
                    match evt {
                        Some(e) => self.handle_agent_event(e).await,
                        None => self.agent_rx = None,
                    }
                }

                Some(track_id) = self.share_ended_rx.recv() => {
                    self.on_share_ended(track_id).await;
                }
            }

            if self.state() == SessionState::Ended {
                break;
            }
        }

        info!("Room session loop finished");
    }

    async fn handle_command(&mut self, cmd: Command) {
        if self.is_ending() && !matches!(cmd, Command::End) {
            reply_ended(cmd);
            return;
        }

        match cmd {
            Command::Start { room, reply } => {
                let result = self.start(room).await;
                let _ = reply.send(result);
            }
            Command::ToggleAudio { reply } => {
                let _ = reply.send(self.toggle_audio());
            }
            Command::ToggleVideo { reply } => {
                let _ = reply.send(self.toggle_video());
            }
            Command::ToggleScreenShare { reply } => {
                let result = self.toggle_screen_share().await;
                let _ = reply.send(result);
            }
            Command::End => self.end().await,
        }
    }

    async fn handle_relay_event(&mut self, event: RelayEvent) {
        if self.is_ending() {
            debug!("Dropping relay event after end(): {:?}", event);
            return;
        }

        match event {
            RelayEvent::Connected(peer) => {
                info!("Relay assigned local peer id {}", peer);
                self.local_peer = Some(peer);
            }

            RelayEvent::UserConnected(peer) => {
                if !self.listening {
                    debug!("Ignoring user-connected({}) before start", peer);
                    return;
                }
                self.on_peer_joined(peer).await;
            }

            RelayEvent::UserDisconnected(peer) => {
                if self.remote_peer.as_ref() == Some(&peer) {
                    info!("Remote peer {} left the room", peer);
                    self.notify(SessionEvent::PeerLeft(peer));
                }
            }

            RelayEvent::RoomFull(room) => {
                warn!("Room '{}' is full", room);
                self.notify(SessionEvent::RoomFull(room));
            }

            RelayEvent::Signal(envelope) => {
                if !self.listening {
                    debug!("Ignoring {} signal before start", envelope.payload.kind_name());
                    return;
                }
                self.on_signal(envelope).await;
            }

            RelayEvent::Closed => {
                warn!("Relay channel closed");
                self.relay_open = false;
            }
        }
    }

    async fn handle_agent_event(&mut self, event: AgentEvent) {
        if self.is_ending() {
            return;
        }

        match event {
            AgentEvent::LocalCandidate(candidate) => {
                let Some(remote) = self.remote_peer.clone() else {
                    debug!("Local candidate before a remote peer is known, dropping");
                    return;
                };
                self.emit_signal(remote, SignalPayload::Candidate(candidate))
                    .await;
            }

            AgentEvent::RemoteTrack(track) => {
                info!("Remote {} track {} arrived", track.kind, track.id);
                self.notify(SessionEvent::RemoteTrack(track));
            }

            AgentEvent::ConnectionStateChanged(state) => {
                info!("Peer connection state changed: {:?}", state);
                self.notify(SessionEvent::ConnectionStateChanged(state));
            }
        }
    }

    /// Runs one suspension point. Yields `None`, dropping the result, when
    /// `end()` was requested before or while the step was pending.
    async fn guarded<F, T>(&self, step: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let mut ended = self.ended_tx.subscribe();
        let end_requested = async move {
            let _ = ended.wait_for(|ended| *ended).await;
        };
        tokio::select! {
            biased;
            _ = end_requested => {
                debug!("Discarding step that resolved after end()");
                None
            }
            out = step => {
                if self.is_ending() { None } else { Some(out) }
            }
        }
    }

    async fn emit_signal(&self, to: PeerId, payload: SignalPayload) {
        if self.is_ending() {
            debug!("Suppressing {} signal after end()", payload.kind_name());
            return;
        }

        let kind = payload.kind_name();
        let from = self.local_peer.clone().unwrap_or_default();
        let message = RelayMessage::Signal(SignalEnvelope::new(to.clone(), from, payload));

        match self.relay.emit(message).await {
            Ok(()) => debug!("Sent {} to {}", kind, to),
            Err(e) => {
                warn!("Failed to relay {} to {}: {}", kind, to, e);
                self.notify(SessionEvent::Recoverable(e.into()));
            }
        }
    }

    fn is_ending(&self) -> bool {
        *self.ended_tx.borrow()
    }

    fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    fn set_state(&self, next: SessionState) {
        let prev = self.state_tx.send_replace(next);
        if prev != next {
            info!("Session state {:?} -> {:?}", prev, next);
            self.notify(SessionEvent::StateChanged(next));
        }
    }

    fn update_media(&self, update: impl FnOnce(&mut LocalMediaState)) {
        let mut media = *self.media_tx.borrow();
        update(&mut media);
        self.media_tx.send_replace(media);
        self.notify(SessionEvent::MediaChanged(media));
    }

    fn notify(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    fn recoverable(&self, context: &str, err: SessionError) {
        warn!("{}: {}", context, err);
        self.notify(SessionEvent::Recoverable(err));
    }
}

async fn next_agent_event(rx: &mut Option<mpsc::Receiver<AgentEvent>>) -> Option<AgentEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn reply_ended(cmd: Command) {
    match cmd {
        Command::Start { reply, .. } => {
            let _ = reply.send(Err(SessionError::Ended));
        }
        Command::ToggleAudio { reply }
        | Command::ToggleVideo { reply }
        | Command::ToggleScreenShare { reply } => {
            let _ = reply.send(Err(SessionError::Ended));
        }
        Command::End => {}
    }
}
