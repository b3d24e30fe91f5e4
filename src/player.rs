use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::core::{PlaybackClock, PlaybackSession, PlayerConfig, SeekSlot};
use crate::video::async_probe::{AsyncProbeLoader, ProbeResult};
use crate::video::frame::FrameConverter;
use crate::video::pipeline::PipelineHandle;
use crate::video::playback_loop;
use crate::audio;

/// Step applied by `seek_forward`/`seek_backward`.
const SEEK_STEP_MS: i64 = 10_000;
/// Head start given to the audio loop before the video loop spawns, so the
/// sink has something buffered when the first frame shows.
const AUDIO_LEAD: Duration = Duration::from_millis(50);
/// How long pause/stop waits for a loop thread before abandoning it. The
/// thread's pipeline is already dead by then, so it can't do further harm.
const JOIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Callbacks the engine fires toward the presentation layer.
///
/// All of these are invoked from engine threads; marshaling onto a UI
/// thread is the receiver's responsibility.
pub trait PlayerEvents: Send + Sync {
    /// A newly loaded file's metadata is known (possibly degraded defaults).
    fn video_loaded(&self, duration_ms: u64);
    /// Playback started or stopped (user action or end of stream).
    fn playing_changed(&self, playing: bool);
    /// Fired once per rendered-or-dropped frame with the clock position.
    fn time_updated(&self, current_ms: u64, duration_ms: u64);
    /// A converted frame is ready for display. Frames arrive in completion
    /// order; the receiver should simply show the most recent one.
    fn frame_ready(&self, frame: RgbaImage);
    /// A fatal playback failure (decoder unstartable). Engine is stopped.
    fn playback_error(&self, message: &str) {
        let _ = message;
    }
}

/// Playback backend seam: the transport surface a player presents to the
/// application, independent of how decoding is implemented.
pub trait VideoPlayer {
    fn load_video(&mut self, path: &Path);
    fn play(&mut self);
    fn pause(&mut self);
    fn toggle_play_pause(&mut self);
    /// Clamped to `[0, duration]`; applied at the video loop's next
    /// checkpoint, never synchronously.
    fn seek(&mut self, time_ms: i64);
    fn seek_forward(&mut self);
    fn seek_backward(&mut self);
    /// Volume as a percentage, 0..=100.
    fn set_volume(&mut self, volume: i32);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
}

/// Everything both loops and the facade share. One instance per player,
/// behind an `Arc`; the individual fields carry their own synchronization.
pub(crate) struct EngineShared {
    pub session: PlaybackSession,
    pub clock: PlaybackClock,
    pub seek: SeekSlot,
    pub config: PlayerConfig,
    pub events: Arc<dyn PlayerEvents>,
    pub converter: FrameConverter,
    pub media_path: Mutex<Option<PathBuf>>,
    pub video_pipeline: Mutex<Option<PipelineHandle>>,
    pub audio_pipeline: Mutex<Option<PipelineHandle>>,
    pub audio_thread: Mutex<Option<JoinHandle<()>>>,
}

/// The ffmpeg-subprocess playback engine.
///
/// Owns one video timing loop thread and one audio streaming loop thread
/// while playing; each loop owns its own decoder pipeline. All transport
/// methods return promptly; long work happens on the loop threads.
pub struct FfmpegPlayer {
    shared: Arc<EngineShared>,
    probe_loader: AsyncProbeLoader,
    video_thread: Option<JoinHandle<()>>,
}

impl FfmpegPlayer {
    pub fn new(config: PlayerConfig, events: Arc<dyn PlayerEvents>) -> Self {
        let session = PlaybackSession::new();
        session.set_volume(config.initial_volume);

        let shared = Arc::new(EngineShared {
            session,
            clock: PlaybackClock::new(),
            seek: SeekSlot::new(),
            converter: FrameConverter::new(Arc::clone(&events)),
            config,
            events,
            media_path: Mutex::new(None),
            video_pipeline: Mutex::new(None),
            audio_pipeline: Mutex::new(None),
            audio_thread: Mutex::new(None),
        });

        let probe_shared = Arc::clone(&shared);
        let probe_loader = AsyncProbeLoader::new(move |result: ProbeResult| {
            Self::on_probe_result(&probe_shared, result);
        });

        Self {
            shared,
            probe_loader,
            video_thread: None,
        }
    }

    fn on_probe_result(shared: &Arc<EngineShared>, result: ProbeResult) {
        // A result for a file that is no longer loaded is stale; drop it.
        {
            let current = shared.media_path.lock().unwrap();
            if current.as_deref() != Some(result.media_path.as_path()) {
                log::debug!("Discarding stale probe result for {:?}", result.media_path);
                return;
            }
        }

        match result.result {
            Ok(info) => {
                log::info!(
                    "Loaded {:?}: {}ms, {}x{} @ {:.2} fps",
                    result.media_path,
                    info.duration_ms,
                    info.width,
                    info.height,
                    info.frame_rate
                );
                shared.session.set_duration_ms(info.duration_ms);
                shared.session.set_resolution(info.width, info.height);
                shared.session.set_frame_rate(info.frame_rate);
            }
            Err(e) => {
                // Degrade, don't fail: play at the configured fallbacks.
                log::warn!(
                    "Probe failed for {:?} ({}), using fallback {}x{} @ {} fps",
                    result.media_path,
                    e,
                    shared.config.fallback_width,
                    shared.config.fallback_height,
                    shared.config.fallback_frame_rate
                );
                shared
                    .session
                    .set_resolution(shared.config.fallback_width, shared.config.fallback_height);
                shared.session.set_frame_rate(shared.config.fallback_frame_rate);
            }
        }

        shared.events.video_loaded(shared.session.duration_ms());
    }

    /// Force-terminate both pipelines and bounded-join both loop threads.
    /// Safe to call in any state; terminating dead pipelines is a no-op.
    fn teardown(&mut self) -> bool {
        let was_playing = self.shared.session.is_playing();
        self.shared.session.set_playing(false);
        self.shared.session.set_stop_requested(true);

        if let Some(handle) = self.shared.video_pipeline.lock().unwrap().take() {
            handle.terminate();
        }
        if let Some(handle) = self.shared.audio_pipeline.lock().unwrap().take() {
            handle.terminate();
        }

        if let Some(thread) = self.video_thread.take() {
            join_bounded(thread, JOIN_TIMEOUT);
        }
        let audio_thread = self.shared.audio_thread.lock().unwrap().take();
        if let Some(thread) = audio_thread {
            join_bounded(thread, JOIN_TIMEOUT);
        }

        was_playing
    }
}

impl VideoPlayer for FfmpegPlayer {
    fn load_video(&mut self, path: &Path) {
        log::info!("Loading: {:?}", path);
        self.teardown();

        *self.shared.media_path.lock().unwrap() = Some(path.to_path_buf());
        self.shared.session.reset_for_load();
        self.shared.seek.clear();

        self.probe_loader
            .request(self.shared.config.ffprobe(), path.to_path_buf());
    }

    fn play(&mut self) {
        if self.shared.session.is_playing() {
            return;
        }
        if self.shared.media_path.lock().unwrap().is_none() {
            log::warn!("play() called with no file loaded");
            return;
        }

        log::info!(
            "Starting playback at {}ms",
            self.shared.session.current_time_ms()
        );
        self.shared.session.set_stop_requested(false);
        self.shared.session.set_playing(true);
        self.shared.events.playing_changed(true);

        // Audio first so its hardware buffer has a head start.
        audio::stream_loop::start(&self.shared);
        thread::sleep(AUDIO_LEAD);

        let loop_shared = Arc::clone(&self.shared);
        match thread::Builder::new()
            .name("video-loop".to_string())
            .spawn(move || playback_loop::run(loop_shared))
        {
            Ok(handle) => self.video_thread = Some(handle),
            Err(e) => {
                log::error!("Failed to start video thread: {}", e);
                self.teardown();
                self.shared.events.playing_changed(false);
            }
        }
    }

    fn pause(&mut self) {
        if !self.shared.session.is_playing() {
            return;
        }
        log::info!(
            "Paused at {}ms",
            self.shared.session.current_time_ms()
        );
        if self.teardown() {
            self.shared.events.playing_changed(false);
        }
    }

    fn toggle_play_pause(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    fn seek(&mut self, time_ms: i64) {
        let target = time_ms.max(0) as u64;
        self.shared
            .seek
            .request(target, self.shared.session.duration_ms());
    }

    fn seek_forward(&mut self) {
        self.seek(self.shared.session.current_time_ms() as i64 + SEEK_STEP_MS);
    }

    fn seek_backward(&mut self) {
        self.seek(self.shared.session.current_time_ms() as i64 - SEEK_STEP_MS);
    }

    fn set_volume(&mut self, volume: i32) {
        let linear = (volume as f32 / 100.0).clamp(0.0, 1.0);
        log::debug!("Volume: {}% ({:.2})", volume, linear);
        // The audio loop picks this up on its next chunk: software scaling
        // plus the derived sink gain.
        self.shared.session.set_volume(linear);
    }

    fn stop(&mut self) {
        if self.teardown() {
            self.shared.events.playing_changed(false);
        }
    }

    fn is_playing(&self) -> bool {
        self.shared.session.is_playing()
    }
}

impl Drop for FfmpegPlayer {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Wait up to `timeout` for a loop thread to finish, then abandon it. The
/// caller has already killed the thread's pipeline, so a stuck thread can
/// only be in a short sleep.
pub(crate) fn join_bounded(handle: JoinHandle<()>, timeout: Duration) {
    let start_time = Instant::now();
    while !handle.is_finished() && start_time.elapsed() < timeout {
        thread::sleep(Duration::from_millis(10));
    }

    if handle.is_finished() {
        if let Err(e) = handle.join() {
            log::warn!("Loop thread panicked: {:?}", e);
        }
    } else {
        log::warn!("Loop thread did not exit within {:?}, abandoning", timeout);
    }
}
