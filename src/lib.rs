//! Playback engine that drives two ffmpeg decoder subprocesses (raw RGB24
//! frames on one pipe, s16le PCM on the other) into a synchronized
//! timeline, with kill-and-restart seeking while playback is live.
//!
//! The engine knows nothing about containers or codecs; ffmpeg is a black
//! box that turns a file plus a seek offset into deterministic raw byte
//! streams. GUI, file selection, and decoder installation live outside this
//! crate and talk to it through [`VideoPlayer`] and [`PlayerEvents`].

pub mod audio;
pub mod core;
pub mod error;
pub mod player;
pub mod video;


pub use error::PlayerError;
pub use player::{FfmpegPlayer, PlayerEvents, VideoPlayer};
