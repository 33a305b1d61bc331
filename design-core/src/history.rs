//! Linear undo/redo over product snapshots.
//!
//! The first entry is the baseline the history was created (or reset) with.
//! A checkpoint discards everything after the cursor. Rapid edits to the same
//! property of the same element coalesce into a single entry, and an explicit
//! recording (a slider drag, say) suppresses intermediate checkpoints until it
//! ends.

use std::time::{Duration, Instant};

use crate::element::ElementId;
use crate::product::Product;
use crate::{DesignError, DesignResult};

/// Identifies a continuous edit for coalescing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoalesceKey {
    /// Edited element.
    pub element: ElementId,
    /// Edited property or control name.
    pub property: String,
}

impl CoalesceKey {
    /// Build a key.
    #[must_use]
    pub fn new(element: ElementId, property: impl Into<String>) -> Self {
        Self {
            element,
            property: property.into(),
        }
    }
}

/// One recorded point in history.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    seq: u64,
    label: String,
    snapshot: Product,
    key: Option<CoalesceKey>,
    at: Instant,
}

impl HistoryEntry {
    /// Monotonic sequence number.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Description of the action that produced this state.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Product state after the action.
    #[must_use]
    pub const fn snapshot(&self) -> &Product {
        &self.snapshot
    }
}

/// Recording state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryState {
    /// Checkpoints are recorded as they arrive.
    Idle,
    /// An interactive edit is in progress; checkpoints are deferred.
    Recording {
        /// Label of the edit in progress.
        label: String,
    },
}

/// Undo/redo history.
#[derive(Debug)]
pub struct History {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    next_seq: u64,
    state: HistoryState,
    max_depth: usize,
    window: Duration,
}

impl History {
    /// Start a history whose baseline is `initial`.
    #[must_use]
    pub fn new(initial: &Product, max_depth: usize, window: Duration) -> Self {
        let mut history = Self {
            entries: Vec::new(),
            cursor: 0,
            next_seq: 0,
            state: HistoryState::Idle,
            max_depth: max_depth.max(1),
            window,
        };
        history.reset(initial);
        history
    }

    /// Drop all entries and start over from `initial`.
    pub fn reset(&mut self, initial: &Product) {
        self.entries.clear();
        self.state = HistoryState::Idle;
        let entry = self.entry(initial, "initial", None, Instant::now());
        self.entries.push(entry);
        self.cursor = 0;
    }

    fn entry(
        &mut self,
        product: &Product,
        label: &str,
        key: Option<CoalesceKey>,
        at: Instant,
    ) -> HistoryEntry {
        let seq = self.next_seq;
        self.next_seq += 1;
        HistoryEntry {
            seq,
            label: label.to_string(),
            snapshot: product.clone(),
            key,
            at,
        }
    }

    /// Current recording state.
    #[must_use]
    pub const fn state(&self) -> &HistoryState {
        &self.state
    }

    /// Whether an interactive edit is being recorded.
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        matches!(self.state, HistoryState::Recording { .. })
    }

    /// Record `product` as a new state. Returns the entry's sequence number,
    /// or `None` while recording.
    pub fn checkpoint(&mut self, product: &Product, label: &str) -> Option<u64> {
        if self.is_recording() {
            return None;
        }
        Some(self.push(product, label, None, Instant::now()))
    }

    /// Record `product`, merging into the latest entry when it carries the
    /// same key and is younger than the coalescing window.
    pub fn checkpoint_coalesced(
        &mut self,
        product: &Product,
        label: &str,
        key: CoalesceKey,
        now: Instant,
    ) -> Option<u64> {
        if self.is_recording() {
            return None;
        }
        // The baseline and entries behind the cursor never absorb edits.
        let at_tip = self.cursor > 0 && self.cursor + 1 == self.entries.len();
        let window = self.window;
        if let Some(last) = self.entries.last_mut().filter(|_| at_tip) {
            let fresh = now.saturating_duration_since(last.at) <= window;
            if fresh && last.key.as_ref() == Some(&key) {
                last.snapshot = product.clone();
                last.at = now;
                tracing::trace!(seq = last.seq, %label, "coalesced checkpoint");
                return Some(last.seq);
            }
        }
        Some(self.push(product, label, Some(key), now))
    }

    fn push(&mut self, product: &Product, label: &str, key: Option<CoalesceKey>, at: Instant) -> u64 {
        self.entries.truncate(self.cursor + 1);
        let entry = self.entry(product, label, key, at);
        let seq = entry.seq;
        self.entries.push(entry);
        if self.entries.len() > self.max_depth {
            let excess = self.entries.len() - self.max_depth;
            self.entries.drain(..excess);
        }
        self.cursor = self.entries.len() - 1;
        tracing::debug!(seq, %label, depth = self.entries.len(), "checkpoint");
        seq
    }

    /// Enter the recording state.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::InvalidState`] if already recording.
    pub fn begin_recording(&mut self, label: &str) -> DesignResult<()> {
        if let HistoryState::Recording { label: current } = &self.state {
            return Err(DesignError::InvalidState(format!(
                "already recording {current:?}"
            )));
        }
        self.state = HistoryState::Recording {
            label: label.to_string(),
        };
        Ok(())
    }

    /// Leave the recording state, recording one checkpoint of `product`.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::InvalidState`] if not recording.
    pub fn end_recording(&mut self, product: &Product) -> DesignResult<u64> {
        let HistoryState::Recording { label } =
            std::mem::replace(&mut self.state, HistoryState::Idle)
        else {
            return Err(DesignError::InvalidState("not recording".to_string()));
        };
        Ok(self.push(product, &label, None, Instant::now()))
    }

    /// Abandon a recording without a checkpoint.
    pub fn cancel_recording(&mut self) {
        self.state = HistoryState::Idle;
    }

    /// Step back. Returns the state to restore, or `None` at the baseline.
    ///
    /// While recording, the unfinished edit is abandoned and the current
    /// entry is returned without moving the cursor.
    pub fn undo(&mut self) -> Option<Product> {
        if self.is_recording() {
            self.cancel_recording();
            return Some(self.entries[self.cursor].snapshot.clone());
        }
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor].snapshot.clone())
    }

    /// Step forward. Returns the state to restore, or `None` at the tip.
    /// An unfinished recording is abandoned.
    pub fn redo(&mut self) -> Option<Product> {
        self.cancel_recording();
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries[self.cursor].snapshot.clone())
    }

    /// Whether [`History::undo`] would change state.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Whether [`History::redo`] would change state.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// The entry the cursor points at.
    #[must_use]
    pub fn current(&self) -> &HistoryEntry {
        &self.entries[self.cursor]
    }

    /// All retained entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}
