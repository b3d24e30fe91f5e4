use cpal::traits::{DeviceTrait, HostTrait};
use rodio::{OutputStream, OutputStreamHandle, Sink};

use crate::error::PlayerError;

/// One opened audio output: the OS stream plus a sink to queue PCM into.
///
/// The sink's internal queue is the hardware-side buffer that makes audio
/// the practical timing reference during steady-state playback. Built and
/// used entirely on the audio loop's thread (the stream is not `Send`).
pub struct AudioOutput {
    // Dropping the stream tears down the device; keep it alive alongside
    // the sink.
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    pub sink: Sink,
}

impl AudioOutput {
    /// Open the named output device, or the system default when no name is
    /// configured or the name doesn't match any device.
    pub fn open(device_name: Option<&str>) -> Result<Self, PlayerError> {
        let (stream, handle) = match device_name.and_then(find_output_device) {
            Some(device) => OutputStream::try_from_device(&device)
                .map_err(|e| PlayerError::AudioDevice(e.to_string()))?,
            None => OutputStream::try_default()
                .map_err(|e| PlayerError::AudioDevice(e.to_string()))?,
        };

        let sink =
            Sink::try_new(&handle).map_err(|e| PlayerError::AudioDevice(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            _handle: handle,
            sink,
        })
    }
}

fn find_output_device(name: &str) -> Option<cpal::Device> {
    let host = cpal::default_host();
    let devices = match host.output_devices() {
        Ok(devices) => devices,
        Err(e) => {
            log::warn!("Failed to enumerate audio output devices: {}", e);
            return None;
        }
    };

    for device in devices {
        if let Ok(device_name) = device.name() {
            if device_name == name {
                log::debug!("Found requested audio device: {}", name);
                return Some(device);
            }
        }
    }

    log::warn!("Audio device '{}' not found, falling back to default", name);
    None
}
