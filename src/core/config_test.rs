#[cfg(test)]
mod tests {

    use crate::core::{PlayerConfig, DEFAULT_FRAME_RATE, DEFAULT_HEIGHT, DEFAULT_WIDTH};
    use std::path::PathBuf;

    #[test]
    fn test_player_config_default() {
        let config = PlayerConfig::default();
        assert!(config.ffmpeg_path.is_none());
        assert!(config.ffprobe_path.is_none());
        assert!(config.audio_device_name.is_none());
        assert_eq!(config.fallback_width, DEFAULT_WIDTH);
        assert_eq!(config.fallback_height, DEFAULT_HEIGHT);
        assert_eq!(config.fallback_frame_rate, DEFAULT_FRAME_RATE);
        assert_eq!(config.initial_volume, 1.0);
    }

    #[test]
    fn test_executable_resolution_defaults_to_path_lookup() {
        let config = PlayerConfig::default();
        assert_eq!(config.ffmpeg(), PathBuf::from("ffmpeg"));
        assert_eq!(config.ffprobe(), PathBuf::from("ffprobe"));
    }

    #[test]
    fn test_executable_resolution_honors_overrides() {
        let mut config = PlayerConfig::default();
        config.ffmpeg_path = Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        config.ffprobe_path = Some(PathBuf::from("/opt/ffmpeg/bin/ffprobe"));
        assert_eq!(config.ffmpeg(), PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.ffprobe(), PathBuf::from("/opt/ffmpeg/bin/ffprobe"));
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let mut config = PlayerConfig::default();
        config.ffmpeg_path = Some(PathBuf::from("/usr/local/bin/ffmpeg"));
        config.audio_device_name = Some("USB DAC".to_string());
        config.initial_volume = 0.8;

        let serialized = serde_json::to_string(&config).expect("Failed to serialize config");
        let deserialized: PlayerConfig =
            serde_json::from_str(&serialized).expect("Failed to deserialize config");

        assert_eq!(config.ffmpeg_path, deserialized.ffmpeg_path);
        assert_eq!(config.audio_device_name, deserialized.audio_device_name);
        assert_eq!(config.initial_volume, deserialized.initial_volume);
    }

    #[test]
    fn test_config_backward_compatibility() {
        // Old config files without the fallback fields should still load.
        let old_config_json = r#"{
            "ffmpeg_path": null,
            "ffprobe_path": null,
            "audio_device_name": null
        }"#;

        let config: PlayerConfig =
            serde_json::from_str(old_config_json).expect("Failed to parse old config");
        assert_eq!(config.fallback_width, DEFAULT_WIDTH);
        assert_eq!(config.fallback_height, DEFAULT_HEIGHT);
        assert_eq!(config.fallback_frame_rate, DEFAULT_FRAME_RATE);
        assert_eq!(config.initial_volume, 1.0);
    }
}
