/// Floor for the derived gain; anything quieter is treated as silence.
pub const MIN_GAIN_DB: f32 = -80.0;

/// Scale 16-bit signed samples in place. `volume` is linear in `[0, 1]`, so
/// the product can never leave the i16 range and no clamp is needed.
pub fn apply_volume(samples: &mut [i16], volume: f32) {
    for sample in samples {
        *sample = (*sample as f32 * volume) as i16;
    }
}

/// Reinterpret little-endian s16 PCM bytes as samples. A trailing odd byte
/// (truncated final sample on EOF) is discarded.
pub fn pcm_bytes_to_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Linear volume to decibels, floored at [`MIN_GAIN_DB`].
pub fn volume_to_db(volume: f32) -> f32 {
    if volume > 0.0 {
        (20.0 * volume.log10()).max(MIN_GAIN_DB)
    } else {
        MIN_GAIN_DB
    }
}

/// Inverse of [`volume_to_db`], used to feed the sink's linear gain control.
pub fn db_to_amplitude(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_volume_is_identity() {
        let mut samples = vec![0i16, 1, -1, 1000, -1000, i16::MAX, i16::MIN];
        let original = samples.clone();
        apply_volume(&mut samples, 1.0);
        assert_eq!(samples, original);
    }

    #[test]
    fn test_half_volume_halves_within_one_lsb() {
        let mut samples = vec![100i16, -100, 2001, -2001, 32000, -32000];
        let original = samples.clone();
        apply_volume(&mut samples, 0.5);
        for (scaled, orig) in samples.iter().zip(&original) {
            let expected = orig / 2;
            assert!(
                (scaled - expected).abs() <= 1,
                "sample {} scaled to {}, expected about {}",
                orig,
                scaled,
                expected
            );
        }
    }

    #[test]
    fn test_zero_volume_silences() {
        let mut samples = vec![i16::MAX, i16::MIN, 1234];
        apply_volume(&mut samples, 0.0);
        assert!(samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_pcm_bytes_round_trip() {
        let samples = vec![0i16, 1, -1, 32767, -32768];
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        assert_eq!(pcm_bytes_to_samples(&bytes), samples);
    }

    #[test]
    fn test_pcm_bytes_discards_trailing_odd_byte() {
        let bytes = vec![0x34, 0x12, 0xFF];
        assert_eq!(pcm_bytes_to_samples(&bytes), vec![0x1234]);
    }

    #[test]
    fn test_volume_to_db() {
        assert_eq!(volume_to_db(1.0), 0.0);
        assert!((volume_to_db(0.5) - (-6.0206)).abs() < 0.01);
        assert_eq!(volume_to_db(0.0), MIN_GAIN_DB);
        // Tiny volumes bottom out at the silence floor.
        assert_eq!(volume_to_db(1e-9), MIN_GAIN_DB);
    }

    #[test]
    fn test_db_amplitude_round_trip() {
        for &v in &[1.0f32, 0.5, 0.25, 0.1] {
            let round_tripped = db_to_amplitude(volume_to_db(v));
            assert!((round_tripped - v).abs() < 1e-4);
        }
    }
}
