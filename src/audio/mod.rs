pub mod output;
pub mod stream_loop;
pub mod volume;

pub use output::AudioOutput;
pub use volume::{apply_volume, db_to_amplitude, pcm_bytes_to_samples, volume_to_db, MIN_GAIN_DB};
