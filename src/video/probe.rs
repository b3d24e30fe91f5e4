use std::path::Path;
use std::process::Command;

/// Stream metadata the engine needs before it can build decoder commands.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub duration_ms: u64,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

/// Probe a media file with ffprobe.
///
/// Callers treat failure as `ProbeFailure` and degrade to the configured
/// fallback resolution and frame rate rather than refusing to play.
pub fn probe_media(ffprobe: &Path, media_path: &Path) -> anyhow::Result<MediaInfo> {
    let output = Command::new(ffprobe)
        .arg("-v")
        .arg("quiet")
        .arg("-print_format")
        .arg("json")
        .arg("-show_format")
        .arg("-show_streams")
        .arg(media_path)
        .output()?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("ffprobe failed with {}", output.status));
    }

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    parse_probe_output(&json)
}

/// Extract duration, resolution, and frame rate from ffprobe's JSON.
pub fn parse_probe_output(json: &serde_json::Value) -> anyhow::Result<MediaInfo> {
    let duration = json["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| anyhow::anyhow!("Duration not found"))?;

    let streams = json["streams"]
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("No streams found"))?;
    let video_stream = streams
        .iter()
        .find(|s| s["codec_type"] == "video")
        .ok_or_else(|| anyhow::anyhow!("No video stream found"))?;

    let width = video_stream["width"]
        .as_u64()
        .ok_or_else(|| anyhow::anyhow!("Width not found"))? as u32;
    let height = video_stream["height"]
        .as_u64()
        .ok_or_else(|| anyhow::anyhow!("Height not found"))? as u32;

    let fps_str = video_stream["r_frame_rate"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Framerate not found"))?;
    let frame_rate = parse_frame_rate(fps_str)
        .ok_or_else(|| anyhow::anyhow!("Unparseable framerate: {}", fps_str))?;

    Ok(MediaInfo {
        duration_ms: (duration * 1000.0) as u64,
        width,
        height,
        frame_rate,
    })
}

/// Parse a frame rate expressed either as a rational "num/den" (ffprobe's
/// usual form, e.g. "30000/1001") or as a plain decimal.
pub fn parse_frame_rate(s: &str) -> Option<f64> {
    let fps = if let Some((num, den)) = s.split_once('/') {
        let numerator: f64 = num.trim().parse().ok()?;
        let denominator: f64 = den.trim().parse().ok()?;
        if denominator == 0.0 {
            return None;
        }
        numerator / denominator
    } else {
        s.trim().parse().ok()?
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}
