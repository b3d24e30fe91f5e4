use thiserror::Error;

/// Errors surfaced by the playback engine.
///
/// End-of-stream is deliberately not represented here: a decoder process
/// closing its pipe is the normal way playback ends, not a failure.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The decoder executable could not be started. Fatal to the playback
    /// attempt; the engine stays stopped.
    #[error("failed to spawn decoder process: {0}")]
    Spawn(#[source] std::io::Error),

    /// The decoder's output pipe broke mid-stream. Treated like EOF by the
    /// loops, but logged distinctly.
    #[error("decoder pipe read failed: {0}")]
    Read(#[source] std::io::Error),

    /// ffprobe failed or produced unusable metadata. The engine degrades to
    /// fallback resolution/frame-rate constants instead of aborting.
    #[error("media probe failed: {0}")]
    Probe(String),

    /// No usable audio output device. The audio loop exits; video playback
    /// continues silently.
    #[error("audio output unavailable: {0}")]
    AudioDevice(String),
}
