use roomcall_core::IceCandidate;
use std::collections::VecDeque;
use tracing::warn;

/// Remote candidates that arrived before any remote description.
///
/// FIFO, bounded, and free of duplicates. When full the oldest entry is
/// dropped to make room.
#[derive(Debug)]
pub(super) struct CandidateQueue {
    items: VecDeque<IceCandidate>,
    limit: usize,
}

impl CandidateQueue {
    pub(super) fn new(limit: usize) -> Self {
        Self {
            items: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Returns `false` if the candidate was already queued.
    pub(super) fn push(&mut self, candidate: IceCandidate) -> bool {
        if self.items.contains(&candidate) {
            return false;
        }

        if self.items.len() >= self.limit {
            if let Some(dropped) = self.items.pop_front() {
                warn!(
                    "Candidate queue full ({}), dropping oldest: {}",
                    self.limit, dropped.candidate
                );
            }
        }

        self.items.push_back(candidate);
        true
    }

    pub(super) fn drain(&mut self) -> Vec<IceCandidate> {
        self.items.drain(..).collect()
    }

    pub(super) fn clear(&mut self) {
        self.items.clear();
    }

    pub(super) fn len(&self) -> usize {
        self.items.len()
    }
}
