use std::sync::atomic::{AtomicI64, Ordering};

/// Sentinel meaning "no seek pending".
const NO_SEEK: i64 = -1;

/// Single-slot seek coordinator.
///
/// Any thread may overwrite the slot at any time; only the video loop reads
/// it, once per frame iteration, via [`SeekSlot::take`]. Seeks are never
/// queued: a request issued before the previous one was consumed silently
/// replaces it, so only the most recent target survives (last-write-wins).
pub struct SeekSlot {
    pending: AtomicI64,
}

impl SeekSlot {
    pub fn new() -> Self {
        Self {
            pending: AtomicI64::new(NO_SEEK),
        }
    }

    /// Request a seek to `target_ms`, clamped to `[0, duration_ms]`.
    ///
    /// Never blocks; safe to call from the UI thread while both loops are
    /// mid-read.
    pub fn request(&self, target_ms: u64, duration_ms: u64) {
        let clamped = target_ms.min(duration_ms);
        log::debug!("seek requested: {}ms (clamped to {}ms)", target_ms, clamped);
        self.pending.store(clamped as i64, Ordering::SeqCst);
    }

    /// Atomically read-and-clear the pending target.
    ///
    /// Called only by the video loop at the top of each frame iteration,
    /// never while a pipe read is in flight.
    pub fn take(&self) -> Option<u64> {
        match self.pending.swap(NO_SEEK, Ordering::SeqCst) {
            NO_SEEK => None,
            target => Some(target as u64),
        }
    }

    /// Discard any unconsumed target (used when a new file is loaded).
    pub fn clear(&self) {
        self.pending.store(NO_SEEK, Ordering::SeqCst);
    }
}

impl Default for SeekSlot {
    fn default() -> Self {
        Self::new()
    }
}
