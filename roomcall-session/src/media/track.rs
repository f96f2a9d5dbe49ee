use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;

static NEXT_TRACK_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => write!(f, "audio"),
            TrackKind::Video => write!(f, "video"),
        }
    }
}

#[derive(Debug)]
struct TrackInner {
    id: String,
    kind: TrackKind,
    label: String,
    enabled: AtomicBool,
    ended: watch::Sender<bool>,
}

/// Handle to one locally captured track. Clones share state.
///
/// `enabled` gates what the capture pipeline forwards; a disabled track keeps
/// its sender slot so toggling never needs renegotiation.
#[derive(Debug, Clone)]
pub struct LocalTrack {
    inner: Arc<TrackInner>,
}

impl LocalTrack {
    pub fn new(kind: TrackKind, label: impl Into<String>) -> Self {
        let n = NEXT_TRACK_ID.fetch_add(1, Ordering::Relaxed);
        let (ended, _) = watch::channel(false);
        Self {
            inner: Arc::new(TrackInner {
                id: format!("{kind}-{n}"),
                kind,
                label: label.into(),
                enabled: AtomicBool::new(true),
                ended,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_ended(&self) -> bool {
        *self.inner.ended.borrow()
    }

    /// Stops capture. Idempotent; wakes every [`LocalTrack::ended`] waiter.
    pub fn stop(&self) {
        self.inner.enabled.store(false, Ordering::Release);
        self.inner.ended.send_replace(true);
    }

    /// Resolves once the track has been stopped, locally or by the platform.
    pub async fn ended(&self) {
        let mut rx = self.inner.ended.subscribe();
        // The sender lives in `inner`, which `self` keeps alive.
        let _ = rx.wait_for(|ended| *ended).await;
    }
}

/// Camera + microphone capture as one unit.
#[derive(Debug, Clone)]
pub struct LocalStream {
    audio: LocalTrack,
    video: LocalTrack,
}

impl LocalStream {
    pub fn new(audio: LocalTrack, video: LocalTrack) -> Self {
        Self { audio, video }
    }

    pub fn track(&self, kind: TrackKind) -> &LocalTrack {
        match kind {
            TrackKind::Audio => &self.audio,
            TrackKind::Video => &self.video,
        }
    }

    pub fn tracks(&self) -> [&LocalTrack; 2] {
        [&self.audio, &self.video]
    }

    pub fn stop(&self) {
        for track in self.tracks() {
            track.stop();
        }
    }
}
