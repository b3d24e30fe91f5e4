use std::path::Path;
use std::process::Command;

/// PCM format the audio pipeline always produces: 16-bit signed LE,
/// 44.1 kHz, stereo.
pub const AUDIO_SAMPLE_RATE: u32 = 44_100;
pub const AUDIO_CHANNELS: u16 = 2;
/// One blocking read's worth of PCM, in bytes.
pub const AUDIO_CHUNK_BYTES: usize = 4096;

/// Build the ffmpeg invocation for the video pipeline: raw interleaved
/// RGB24 frames at the source frame rate, scaled to the target resolution,
/// audio stripped, streamed to stdout.
pub fn video_stream_command(
    ffmpeg: &Path,
    input: &Path,
    start_ms: u64,
    width: u32,
    height: u32,
    frame_rate: f64,
) -> Command {
    let mut cmd = Command::new(ffmpeg);
    if start_ms > 0 {
        cmd.arg("-ss").arg(format!("{:.3}", start_ms as f64 / 1000.0));
    }
    cmd.arg("-i")
        .arg(input)
        .arg("-f")
        .arg("rawvideo")
        .arg("-pix_fmt")
        .arg("rgb24")
        .arg("-vf")
        .arg(format!("scale={}:{}", width, height))
        .arg("-r")
        .arg(format!("{}", frame_rate))
        .arg("-an")
        .arg("-");
    cmd
}

/// Build the ffmpeg invocation for the audio pipeline: s16le PCM at
/// 44.1 kHz stereo on stdout. `-analyzeduration 0 -probesize 32` skips the
/// input analysis pass so seeks start producing sound sooner.
pub fn audio_stream_command(ffmpeg: &Path, input: &Path, start_ms: u64) -> Command {
    let mut cmd = Command::new(ffmpeg);
    if start_ms > 0 {
        cmd.arg("-ss").arg(format!("{:.3}", start_ms as f64 / 1000.0));
    }
    cmd.arg("-analyzeduration")
        .arg("0")
        .arg("-probesize")
        .arg("32")
        .arg("-i")
        .arg(input)
        .arg("-f")
        .arg("s16le")
        .arg("-acodec")
        .arg("pcm_s16le")
        .arg("-ar")
        .arg(format!("{}", AUDIO_SAMPLE_RATE))
        .arg("-ac")
        .arg(format!("{}", AUDIO_CHANNELS))
        .arg("-");
    cmd
}
