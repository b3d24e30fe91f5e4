use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;

use crate::video::probe::{self, MediaInfo};

/// Request to probe one media file.
#[derive(Debug, Clone)]
struct ProbeRequest {
    ffprobe: PathBuf,
    media_path: PathBuf,
}

/// Outcome of a background probe, delivered to the loader's callback.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub media_path: PathBuf,
    pub result: Result<MediaInfo, String>,
}

/// Runs ffprobe off the caller's thread so `load_video` never blocks on an
/// external process.
///
/// A dedicated worker thread owns a tokio runtime; each request is probed on
/// the blocking pool and the result handed to the callback from there. The
/// callback is responsible for any marshaling the presentation layer needs.
pub struct AsyncProbeLoader {
    request_sender: mpsc::UnboundedSender<ProbeRequest>,
}

impl AsyncProbeLoader {
    pub fn new<F>(on_result: F) -> Self
    where
        F: Fn(ProbeResult) + Send + Sync + 'static,
    {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<ProbeRequest>();
        let handler = Arc::new(on_result);

        thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Failed to create probe runtime: {}", e);
                    return;
                }
            };

            rt.block_on(async {
                while let Some(request) = request_rx.recv().await {
                    let handler = Arc::clone(&handler);

                    tokio::task::spawn_blocking(move || {
                        log::debug!("Probing media: {:?}", request.media_path);

                        let result = match probe::probe_media(&request.ffprobe, &request.media_path)
                        {
                            Ok(info) => {
                                log::debug!(
                                    "Probe succeeded for {:?} (duration: {}ms, {}x{} @ {:.2} fps)",
                                    request.media_path,
                                    info.duration_ms,
                                    info.width,
                                    info.height,
                                    info.frame_rate
                                );
                                Ok(info)
                            }
                            Err(e) => {
                                log::debug!("Probe failed for {:?}: {}", request.media_path, e);
                                Err(e.to_string())
                            }
                        };

                        handler(ProbeResult {
                            media_path: request.media_path,
                            result,
                        });
                    });
                }
            });
        });

        Self {
            request_sender: request_tx,
        }
    }

    /// Queue a probe (non-blocking). The result arrives via the callback.
    pub fn request(&self, ffprobe: PathBuf, media_path: PathBuf) {
        let request = ProbeRequest { ffprobe, media_path };
        if let Err(e) = self.request_sender.send(request) {
            log::error!("Failed to queue probe request: {}", e);
        }
    }
}
