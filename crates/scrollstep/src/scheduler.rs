//! Per-frame update coalescing
//!
//! Progress and resize signals arrive in bursts from the host observers.
//! The scheduler keeps at most one pending progress entry per step (later
//! signals overwrite earlier ones) and at most one pending re-geometry per
//! step, and asks for at most one host frame callback while anything is
//! pending. The frame handler drains everything in one pass, so calling
//! code never observes two deliveries for the same step within one frame.

use indexmap::{IndexMap, IndexSet};
use scrollstep_core::Direction;

/// Latest unflushed progress reading for one step, with the direction
/// captured at signal time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PendingProgress {
    pub progress: f64,
    pub direction: Direction,
}

#[derive(Debug, Default)]
pub(crate) struct UpdateScheduler {
    progress: IndexMap<usize, PendingProgress>,
    resize: IndexSet<usize>,
    frame_requested: bool,
}

impl UpdateScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a progress reading, overwriting any pending entry for the
    /// step. Returns `true` when the caller must request a frame callback.
    pub fn queue_progress(&mut self, index: usize, update: PendingProgress) -> bool {
        self.progress.insert(index, update);
        self.mark()
    }

    /// Queue a re-geometry pass for the step. Returns `true` when the
    /// caller must request a frame callback.
    pub fn queue_resize(&mut self, index: usize) -> bool {
        self.resize.insert(index);
        self.mark()
    }

    fn mark(&mut self) -> bool {
        if self.frame_requested {
            false
        } else {
            self.frame_requested = true;
            true
        }
    }

    /// Drop any pending progress entry for the step. Exit snapping delivers
    /// the final reading out of band, so a stale coalesced entry must not
    /// survive it.
    pub fn cancel_progress(&mut self, index: usize) {
        self.progress.shift_remove(&index);
    }

    /// Begin a frame: clears the request flag so signals arriving during
    /// the flush can schedule the next one.
    pub fn begin_frame(&mut self) {
        self.frame_requested = false;
    }

    /// Take the pending progress batch, in signal arrival order.
    pub fn take_progress(&mut self) -> Vec<(usize, PendingProgress)> {
        self.progress.drain(..).collect()
    }

    /// Take the pending re-geometry batch, in signal arrival order.
    pub fn take_resize(&mut self) -> Vec<usize> {
        self.resize.drain(..).collect()
    }

    /// Drop everything so an already-requested frame callback finds nothing
    /// to drain.
    pub fn clear(&mut self) {
        self.progress.clear();
        self.resize.clear();
        self.frame_requested = false;
    }
}
