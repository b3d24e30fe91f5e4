pub mod async_probe;
pub mod commands;
pub mod frame;
pub mod pipeline;
pub mod playback_loop;
pub mod probe;

pub use async_probe::*;
pub use commands::*;
pub use frame::*;
pub use pipeline::*;
pub use playback_loop::{pacing_decision, Pacing};
pub use probe::*;
