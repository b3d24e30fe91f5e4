use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::session::{DEFAULT_FRAME_RATE, DEFAULT_HEIGHT, DEFAULT_WIDTH};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Explicit path to the ffmpeg executable; `None` means resolve "ffmpeg"
    /// from PATH.
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit path to ffprobe; `None` means resolve "ffprobe" from PATH.
    pub ffprobe_path: Option<PathBuf>,
    /// Preferred audio output device; `None` means the system default.
    pub audio_device_name: Option<String>,
    /// Resolution used when the metadata probe fails.
    #[serde(default = "default_width")]
    pub fallback_width: u32,
    #[serde(default = "default_height")]
    pub fallback_height: u32,
    /// Frame rate used when the metadata probe fails.
    #[serde(default = "default_frame_rate")]
    pub fallback_frame_rate: f64,
    /// Linear volume applied at startup, 0.0..=1.0.
    #[serde(default = "default_volume")]
    pub initial_volume: f32,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_frame_rate() -> f64 {
    DEFAULT_FRAME_RATE
}

fn default_volume() -> f32 {
    1.0
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            audio_device_name: None,
            fallback_width: DEFAULT_WIDTH,
            fallback_height: DEFAULT_HEIGHT,
            fallback_frame_rate: DEFAULT_FRAME_RATE,
            initial_volume: 1.0,
        }
    }
}

impl PlayerConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path).map_err(|e| {
                anyhow::anyhow!("Failed to read config file at {}: {}", config_path.display(), e)
            })?;

            // If the file is unreadable as config, fall back to defaults and
            // rewrite it rather than refusing to start.
            match serde_json::from_str::<Self>(&content) {
                Ok(config) => {
                    log::info!("Loaded existing config from {}", config_path.display());
                    Ok(config)
                }
                Err(e) => {
                    log::warn!("Config file exists but has issues ({}), recreating with defaults", e);
                    let new_config = Self::default();
                    new_config.save()?;
                    Ok(new_config)
                }
            }
        } else {
            log::info!("No config file found, creating default config");
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pipe-player")
            .join("config.json")
    }

    /// Command name or path for the ffmpeg executable.
    pub fn ffmpeg(&self) -> PathBuf {
        self.ffmpeg_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("ffmpeg"))
    }

    /// Command name or path for the ffprobe executable.
    pub fn ffprobe(&self) -> PathBuf {
        self.ffprobe_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("ffprobe"))
    }
}
