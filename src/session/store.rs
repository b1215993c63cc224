//! Ordered log of chat turns with single-writer mutation semantics
//!
//! Only the pipeline and the history loader mutate; the UI reads snapshots.
//! Mutations that target the tail are guarded on the tail being an
//! in-progress model turn and silently no-op otherwise. That guard is what
//! makes completion side effects of a backgrounded run safe after the
//! conversation was cleared or reloaded in the interim.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::types::{Role, Turn};

#[derive(Default)]
pub struct ConversationStore {
    turns: RwLock<Vec<Turn>>,
    generating: AtomicBool,
    next_id: AtomicU64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonically increasing local id for turns created before persistence.
    pub fn next_local_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("local-{n}")
    }

    pub fn append(&self, turn: Turn) {
        let mut turns = self.turns.write().expect("conversation lock");
        turns.push(turn);
    }

    /// Replace the content of the tail turn, if it is an in-progress model
    /// turn. No-op otherwise: finalize may already have run.
    pub fn update_in_progress_content(&self, content: &str) {
        let mut turns = self.turns.write().expect("conversation lock");
        if let Some(tail) = turns.last_mut() {
            if tail.role == Role::Model && tail.in_progress {
                tail.content = content.to_string();
            }
        }
    }

    /// Mark the tail model turn complete and attach its resolved movie ids.
    /// Same tail guard as `update_in_progress_content`.
    pub fn finalize(&self, movie_ids: Vec<i64>) {
        let mut turns = self.turns.write().expect("conversation lock");
        if let Some(tail) = turns.last_mut() {
            if tail.role == Role::Model && tail.in_progress {
                tail.movie_ids = movie_ids;
                tail.in_progress = false;
            }
        }
    }

    pub fn set_generating(&self, generating: bool) {
        self.generating.store(generating, Ordering::SeqCst);
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::SeqCst)
    }

    /// Atomically claim the generating gate. Returns false if a run is
    /// already in flight.
    pub fn try_begin_generating(&self) -> bool {
        self.generating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn clear(&self) {
        let mut turns = self.turns.write().expect("conversation lock");
        turns.clear();
    }

    /// Wholesale replacement, used by history loading.
    pub fn replace_all(&self, new_turns: Vec<Turn>) {
        let mut turns = self.turns.write().expect("conversation lock");
        *turns = new_turns;
    }

    /// Snapshot of the current turn sequence.
    pub fn turns(&self) -> Vec<Turn> {
        self.turns.read().expect("conversation lock").clone()
    }

    pub fn len(&self) -> usize {
        self.turns.read().expect("conversation lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tail(&self) -> Option<Turn> {
        self.turns.read().expect("conversation lock").last().cloned()
    }
}
