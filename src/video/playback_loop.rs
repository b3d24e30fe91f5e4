use std::sync::Arc;
use std::time::Duration;

use crate::audio;
use crate::player::EngineShared;
use crate::video::commands::video_stream_command;
use crate::video::frame::RawFrame;
use crate::video::pipeline::{DecoderPipeline, ReadOutcome};

/// What to do with a frame that just came off the pipe, given its scheduled
/// display time and the clock's current position.
#[derive(Debug, PartialEq, Eq)]
pub enum Pacing {
    /// The frame is early; sleep this many milliseconds, then render.
    Wait(u64),
    /// The frame is on schedule (or tolerably late); render now.
    Render,
    /// The frame is more than two intervals behind; skip it entirely.
    Drop,
}

/// Frames later than two intervals are dropped instead of rendered behind
/// schedule; earlier frames are held back. Deriving lateness from the clock
/// rather than a frame counter makes the policy self-correcting across
/// decoder stalls.
pub fn pacing_decision(scheduled_ms: u64, now_ms: u64, frame_interval_ms: f64) -> Pacing {
    if scheduled_ms > now_ms {
        Pacing::Wait(scheduled_ms - now_ms)
    } else if (now_ms - scheduled_ms) as f64 > 2.0 * frame_interval_ms {
        Pacing::Drop
    } else {
        Pacing::Render
    }
}

/// The video timing loop. One dedicated thread per playback session.
///
/// Outer loop: one iteration per pipeline lifetime (initial start plus one
/// per consumed seek). Inner loop: one iteration per decoded frame. The
/// seek slot is only checked here, between frame reads, never mid-read.
pub(crate) fn run(shared: Arc<EngineShared>) {
    'session: while shared.session.is_playing() && !shared.session.stop_requested() {
        let Some(path) = shared.media_path.lock().unwrap().clone() else {
            log::warn!("Video loop started without a loaded file");
            break;
        };

        let start_ms = shared.session.current_time_ms();
        let (width, height) = shared.session.resolution();
        let frame_rate = shared.session.frame_rate();
        let frame_interval_ms = 1000.0 / frame_rate;
        let duration_ms = shared.session.duration_ms();

        shared.clock.start(start_ms);
        shared.converter.reset();

        let cmd = video_stream_command(
            &shared.config.ffmpeg(),
            &path,
            start_ms,
            width,
            height,
            frame_rate,
        );
        let mut pipeline = match DecoderPipeline::spawn(cmd) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                log::error!("Video decoder spawn failed: {}", e);
                shared.session.set_playing(false);
                shared.session.set_stop_requested(true);
                if let Some(handle) = shared.audio_pipeline.lock().unwrap().take() {
                    handle.terminate();
                }
                shared.events.playing_changed(false);
                shared.events.playback_error(&e.to_string());
                break;
            }
        };
        *shared.video_pipeline.lock().unwrap() = Some(pipeline.handle());
        log::info!(
            "Video pipeline started at {}ms ({}x{} @ {:.2} fps)",
            start_ms,
            width,
            height,
            frame_rate
        );

        let frame_size = (width as usize) * (height as usize) * 3;
        let mut frame_buf = vec![0u8; frame_size];
        let mut frame_index: u64 = 0;

        loop {
            if shared.session.stop_requested() {
                pipeline.terminate();
                break 'session;
            }

            // Seek checkpoint. A target equal to the current position is a
            // no-op so the pipelines are not churned for nothing.
            if let Some(target_ms) = shared.seek.take() {
                if target_ms != shared.session.current_time_ms() {
                    log::info!(
                        "Seek: {}ms -> {}ms",
                        shared.session.current_time_ms(),
                        target_ms
                    );
                    shared.session.set_current_time_ms(target_ms);
                    pipeline.terminate();
                    audio::stream_loop::restart(&shared);
                    continue 'session;
                }
            }

            match pipeline.read_exact(&mut frame_buf) {
                Ok(ReadOutcome::Full) => {}
                Ok(ReadOutcome::Eof) | Ok(ReadOutcome::Short(_)) => {
                    pipeline.terminate();
                    // A pause/stop kills the pipeline out from under the
                    // read; that EOF is a cancellation, not end of stream,
                    // and must not move the position to the duration.
                    if shared.session.stop_requested() {
                        break 'session;
                    }
                    log::info!("Video stream ended after {} frames", frame_index);
                    finish_at_end(&shared, duration_ms);
                    break 'session;
                }
                Err(e) => {
                    pipeline.terminate();
                    if shared.session.stop_requested() {
                        break 'session;
                    }
                    log::warn!("Video pipe read failed: {}", e);
                    finish_at_end(&shared, duration_ms);
                    break 'session;
                }
            }

            let scheduled_ms = start_ms + (frame_index as f64 * frame_interval_ms).round() as u64;
            match pacing_decision(scheduled_ms, shared.clock.now_ms(), frame_interval_ms) {
                Pacing::Wait(ms) => {
                    std::thread::sleep(Duration::from_millis(ms));
                    render(&shared, &frame_buf, width, height, frame_index);
                }
                Pacing::Render => {
                    render(&shared, &frame_buf, width, height, frame_index);
                }
                Pacing::Drop => {
                    log::debug!("Dropping late frame {}", frame_index);
                }
            }

            frame_index += 1;
            if frame_index % 300 == 0 {
                log::debug!("Frame {} @ {}ms", frame_index, shared.session.current_time_ms());
            }

            // Position comes from the clock, not a frame counter, so drops
            // and decode stalls don't accumulate drift.
            let now_ms = if duration_ms > 0 {
                shared.clock.now_ms().min(duration_ms)
            } else {
                shared.clock.now_ms()
            };
            shared.session.set_current_time_ms(now_ms);
            shared.events.time_updated(now_ms, duration_ms);
        }
    }

    *shared.video_pipeline.lock().unwrap() = None;
    log::debug!("Video loop exiting");
}

fn render(shared: &Arc<EngineShared>, frame_buf: &[u8], width: u32, height: u32, index: u64) {
    shared.converter.submit(RawFrame {
        data: frame_buf.to_vec(),
        width,
        height,
        index,
    });
}

/// Natural end of stream: position snaps to the duration and playback stops
/// terminally (no pipeline restart until the user plays or seeks again).
fn finish_at_end(shared: &Arc<EngineShared>, duration_ms: u64) {
    let end_ms = if duration_ms > 0 {
        duration_ms
    } else {
        shared.session.current_time_ms()
    };
    shared.session.set_current_time_ms(end_ms);
    shared.session.set_playing(false);
    shared.events.playing_changed(false);
    shared.events.time_updated(end_ms, duration_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PlaybackClock, PlaybackSession, PlayerConfig, SeekSlot};
    use crate::player::PlayerEvents;
    use crate::video::frame::FrameConverter;
    use image::RgbaImage;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::sync::mpsc::{self, Sender};
    use std::sync::Mutex;

    const INTERVAL: f64 = 1000.0 / 30.0;

    #[derive(Debug, PartialEq)]
    enum LoopEvent {
        Playing(bool),
        Time(u64, u64),
    }

    struct LoopEvents {
        tx: Sender<LoopEvent>,
    }

    impl PlayerEvents for LoopEvents {
        fn video_loaded(&self, _duration_ms: u64) {}
        fn playing_changed(&self, playing: bool) {
            let _ = self.tx.send(LoopEvent::Playing(playing));
        }
        fn time_updated(&self, current_ms: u64, duration_ms: u64) {
            let _ = self.tx.send(LoopEvent::Time(current_ms, duration_ms));
        }
        fn frame_ready(&self, _frame: RgbaImage) {}
    }

    /// Executable shell script standing in for ffmpeg: ignores its argv and
    /// runs `body`.
    fn stub_decoder(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", name, std::process::id()));
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn shared_with_decoder(
        decoder: PathBuf,
    ) -> (Arc<EngineShared>, mpsc::Receiver<LoopEvent>) {
        let (tx, rx) = mpsc::channel();
        let events: Arc<dyn PlayerEvents> = Arc::new(LoopEvents { tx });
        let mut config = PlayerConfig::default();
        config.ffmpeg_path = Some(decoder);
        let session = PlaybackSession::new();
        session.set_resolution(4, 4);
        session.set_frame_rate(30.0);
        let shared = Arc::new(EngineShared {
            session,
            clock: PlaybackClock::new(),
            seek: SeekSlot::new(),
            converter: FrameConverter::new(Arc::clone(&events)),
            config,
            events,
            media_path: Mutex::new(Some(PathBuf::from("/videos/a.mkv"))),
            video_pipeline: Mutex::new(None),
            audio_pipeline: Mutex::new(None),
            audio_thread: Mutex::new(None),
        });
        (shared, rx)
    }

    #[test]
    fn test_end_of_stream_snaps_position_to_duration_and_stops() {
        // Exactly two 4x4 RGB24 frames, then EOF.
        let decoder = stub_decoder("pipe-player-eof", "head -c 96 /dev/zero");
        let (shared, rx) = shared_with_decoder(decoder.clone());
        shared.session.set_duration_ms(120_000);
        shared.session.set_playing(true);

        run(Arc::clone(&shared));

        assert_eq!(shared.session.current_time_ms(), 120_000);
        assert!(!shared.session.is_playing());

        let mut saw_stop = false;
        let mut final_time = None;
        while let Ok(event) = rx.try_recv() {
            match event {
                LoopEvent::Playing(false) => saw_stop = true,
                LoopEvent::Time(current, duration) => final_time = Some((current, duration)),
                _ => {}
            }
        }
        assert!(saw_stop);
        assert_eq!(final_time, Some((120_000, 120_000)));
        let _ = fs::remove_file(decoder);
    }

    #[test]
    fn test_playback_resumes_decoding_from_session_position() {
        let capture = std::env::temp_dir()
            .join(format!("pipe-player-resume-args-{}", std::process::id()));
        let decoder = stub_decoder(
            "pipe-player-resume",
            &format!("printf '%s\\n' \"$@\" > {}", capture.display()),
        );
        let (shared, _rx) = shared_with_decoder(decoder.clone());
        shared.session.set_duration_ms(120_000);
        // The position a pause left behind; play must not rewind to zero.
        shared.session.set_current_time_ms(60_000);
        shared.session.set_playing(true);

        run(Arc::clone(&shared));

        let args = fs::read_to_string(&capture).unwrap();
        let mut lines = args.lines();
        assert_eq!(lines.next(), Some("-ss"));
        assert_eq!(lines.next(), Some("60.000"));
        assert!(shared.clock.now_ms() >= 60_000);
        let _ = fs::remove_file(decoder);
        let _ = fs::remove_file(capture);
    }

    #[test]
    fn test_early_frame_waits_until_schedule() {
        assert_eq!(pacing_decision(1000, 970, INTERVAL), Pacing::Wait(30));
    }

    #[test]
    fn test_on_time_frame_renders() {
        assert_eq!(pacing_decision(1000, 1000, INTERVAL), Pacing::Render);
    }

    #[test]
    fn test_slightly_late_frame_still_renders() {
        // Lateness up to two frame intervals is tolerated.
        assert_eq!(pacing_decision(1000, 1050, INTERVAL), Pacing::Render);
    }

    #[test]
    fn test_frame_more_than_two_intervals_late_is_dropped() {
        assert_eq!(pacing_decision(1000, 1067, INTERVAL), Pacing::Drop);
        assert_eq!(pacing_decision(1000, 2000, INTERVAL), Pacing::Drop);
    }

    #[test]
    fn test_consecutive_schedule_times_differ_by_one_interval() {
        // With F = 25 fps the scheduled times step by exactly 1000/F = 40ms.
        let start_ms = 5000u64;
        let interval = 1000.0 / 25.0;
        let schedule: Vec<u64> = (0..5)
            .map(|i| start_ms + (i as f64 * interval).round() as u64)
            .collect();
        assert_eq!(schedule, vec![5000, 5040, 5080, 5120, 5160]);
    }
}
