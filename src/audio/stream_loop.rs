use rodio::buffer::SamplesBuffer;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::audio::output::AudioOutput;
use crate::audio::volume::{apply_volume, pcm_bytes_to_samples};
use crate::player::{join_bounded, EngineShared};
use crate::video::commands::{
    audio_stream_command, AUDIO_CHANNELS, AUDIO_CHUNK_BYTES, AUDIO_SAMPLE_RATE,
};
use crate::video::pipeline::{DecoderPipeline, ReadOutcome};

/// Chunks the loop keeps queued in the sink before throttling the pipe
/// reads. 4096-byte chunks at 44.1kHz stereo s16 are ~23ms each, so this is
/// roughly 200ms of buffered audio.
const MAX_QUEUED_CHUNKS: usize = 8;

/// How long a seek restart waits for the previous audio thread. Shorter
/// than the pause/stop join so seeks stay snappy; the old pipeline is
/// already dead by the time this runs.
const SEEK_JOIN_TIMEOUT: Duration = Duration::from_millis(100);

/// Spawn the audio streaming loop for the session's current position.
pub(crate) fn start(shared: &Arc<EngineShared>) {
    let loop_shared = Arc::clone(shared);
    match thread::Builder::new()
        .name("audio-stream".to_string())
        .spawn(move || run(loop_shared))
    {
        Ok(handle) => {
            *shared.audio_thread.lock().unwrap() = Some(handle);
        }
        Err(e) => {
            log::error!("Failed to start audio thread: {}", e);
        }
    }
}

/// Tear down the running audio loop and start a fresh one. Called by the
/// video loop when it consumes a seek; the audio loop never observes the
/// seek slot itself.
pub(crate) fn restart(shared: &Arc<EngineShared>) {
    if let Some(handle) = shared.audio_pipeline.lock().unwrap().take() {
        handle.terminate();
    }
    // Take the handle out of the slot before joining; holding the mutex
    // across the wait would block a concurrent teardown.
    let previous = shared.audio_thread.lock().unwrap().take();
    if let Some(thread) = previous {
        join_bounded(thread, SEEK_JOIN_TIMEOUT);
    }
    start(shared);
}

/// The audio streaming loop body: STARTING -> STREAMING -> ENDED.
fn run(shared: Arc<EngineShared>) {
    // A teardown can land between this thread being spawned and getting
    // scheduled; don't start a decoder that nobody will stop.
    if shared.session.stop_requested() {
        return;
    }
    let Some(path) = shared.media_path.lock().unwrap().clone() else {
        log::warn!("Audio loop started without a loaded file");
        return;
    };
    let start_ms = shared.session.current_time_ms();

    let cmd = audio_stream_command(&shared.config.ffmpeg(), &path, start_ms);
    let mut pipeline = match DecoderPipeline::spawn(cmd) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            log::error!("Audio decoder spawn failed: {}", e);
            return;
        }
    };
    *shared.audio_pipeline.lock().unwrap() = Some(pipeline.handle());

    // Device failure ends the audio loop only; video plays on silently.
    let output = match AudioOutput::open(shared.config.audio_device_name.as_deref()) {
        Ok(output) => output,
        Err(e) => {
            log::error!("{}", e);
            pipeline.terminate();
            return;
        }
    };
    log::info!(
        "Audio playing: {}Hz, 16-bit, {} channels (from {}ms)",
        AUDIO_SAMPLE_RATE,
        AUDIO_CHANNELS,
        start_ms
    );

    let mut chunk = vec![0u8; AUDIO_CHUNK_BYTES];
    let mut ended_naturally = false;

    loop {
        if shared.session.stop_requested() {
            break;
        }

        // The sink stays at its default gain: rodio's sink volume is
        // another software multiplier, so scaling both the samples and the
        // sink would apply the volume twice.
        let volume = shared.session.volume();

        match pipeline.read_exact(&mut chunk) {
            Ok(ReadOutcome::Full) => {
                queue_chunk(&output, &chunk, volume);
            }
            Ok(ReadOutcome::Short(n)) => {
                queue_chunk(&output, &chunk[..n], volume);
                ended_naturally = true;
                break;
            }
            Ok(ReadOutcome::Eof) => {
                ended_naturally = true;
                break;
            }
            Err(e) => {
                log::warn!("Audio pipe read failed: {}", e);
                ended_naturally = true;
                break;
            }
        }

        // Back-pressure: let the device drain before reading more, so the
        // hardware buffer stays small and pacing follows the sound card.
        while output.sink.len() > MAX_QUEUED_CHUNKS && !shared.session.stop_requested() {
            thread::sleep(Duration::from_millis(5));
        }
    }

    if ended_naturally {
        // Flush what's already queued, but stay cancellable.
        while output.sink.len() > 0 && !shared.session.stop_requested() {
            thread::sleep(Duration::from_millis(10));
        }
    }
    output.sink.stop();
    pipeline.terminate();
    *shared.audio_pipeline.lock().unwrap() = None;
    log::debug!("Audio loop exiting");
}

fn queue_chunk(output: &AudioOutput, bytes: &[u8], volume: f32) {
    let samples = scaled_samples(bytes, volume);
    if samples.is_empty() {
        return;
    }
    output
        .sink
        .append(SamplesBuffer::new(AUDIO_CHANNELS, AUDIO_SAMPLE_RATE, samples));
}

/// PCM bytes to samples with the session volume applied in place. This is
/// the only attenuation in the playback path.
fn scaled_samples(bytes: &[u8], volume: f32) -> Vec<i16> {
    let mut samples = pcm_bytes_to_samples(bytes);
    if volume < 1.0 {
        apply_volume(&mut samples, volume);
    }
    samples
}
