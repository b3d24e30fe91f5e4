use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// Fallbacks used when the metadata probe fails (degrade, don't abort).
pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Shared mutable state for one loaded media file.
///
/// Every field here is read or written from more than one thread (UI facade,
/// video loop, audio loop), so each is an individual atomic. No lock ever
/// spans a whole read-and-render iteration; a termination request must never
/// wait behind a long blocking pipe read.
pub struct PlaybackSession {
    current_time_ms: AtomicU64,
    duration_ms: AtomicU64,
    playing: AtomicBool,
    stop_requested: AtomicBool,
    width: AtomicU32,
    height: AtomicU32,
    frame_rate_bits: AtomicU64,
    volume_bits: AtomicU32,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self {
            current_time_ms: AtomicU64::new(0),
            duration_ms: AtomicU64::new(0),
            playing: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            width: AtomicU32::new(DEFAULT_WIDTH),
            height: AtomicU32::new(DEFAULT_HEIGHT),
            frame_rate_bits: AtomicU64::new(DEFAULT_FRAME_RATE.to_bits()),
            volume_bits: AtomicU32::new(1.0f32.to_bits()),
        }
    }

    pub fn current_time_ms(&self) -> u64 {
        self.current_time_ms.load(Ordering::SeqCst)
    }

    pub fn set_current_time_ms(&self, ms: u64) {
        self.current_time_ms.store(ms, Ordering::SeqCst);
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms.load(Ordering::SeqCst)
    }

    /// Fixed once per loaded file; only `load_video` calls this.
    pub fn set_duration_ms(&self, ms: u64) {
        self.duration_ms.store(ms, Ordering::SeqCst);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    pub fn set_stop_requested(&self, stop: bool) {
        self.stop_requested.store(stop, Ordering::SeqCst);
    }

    pub fn resolution(&self) -> (u32, u32) {
        (
            self.width.load(Ordering::SeqCst),
            self.height.load(Ordering::SeqCst),
        )
    }

    pub fn set_resolution(&self, width: u32, height: u32) {
        self.width.store(width, Ordering::SeqCst);
        self.height.store(height, Ordering::SeqCst);
    }

    pub fn frame_rate(&self) -> f64 {
        f64::from_bits(self.frame_rate_bits.load(Ordering::SeqCst))
    }

    pub fn set_frame_rate(&self, fps: f64) {
        let fps = if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            DEFAULT_FRAME_RATE
        };
        self.frame_rate_bits.store(fps.to_bits(), Ordering::SeqCst);
    }

    /// Linear volume in `[0, 1]`, read by the audio loop every chunk.
    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::SeqCst))
    }

    pub fn set_volume(&self, volume: f32) {
        let clamped = volume.clamp(0.0, 1.0);
        self.volume_bits.store(clamped.to_bits(), Ordering::SeqCst);
    }

    /// Reset per-file state for a newly loaded path.
    pub fn reset_for_load(&self) {
        self.set_current_time_ms(0);
        self.set_duration_ms(0);
        self.set_playing(false);
        self.set_stop_requested(false);
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}
