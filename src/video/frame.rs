use image::RgbaImage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::player::PlayerEvents;

/// Number of conversion workers (matches the original's render pool of 2).
const WORKER_COUNT: usize = 2;
/// Frames queued beyond this are dropped; rendering is best-effort.
const QUEUE_DEPTH: usize = 2;

/// One decoded video frame as it comes off the pipe: interleaved 8-bit
/// R,G,B, `width * height * 3` bytes.
#[derive(Debug)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Position in decoder output order, monotonic within one pipeline.
    pub index: u64,
}

/// Expand interleaved RGB24 into RGBA8 with an opaque alpha channel.
pub fn rgb_to_rgba(rgb: &[u8], width: u32, height: u32) -> Option<RgbaImage> {
    let expected = (width as usize) * (height as usize) * 3;
    if rgb.len() != expected {
        log::warn!("Unexpected frame size: {} (expected {})", rgb.len(), expected);
        return None;
    }

    let mut rgba = Vec::with_capacity((width as usize) * (height as usize) * 4);
    for chunk in rgb.chunks_exact(3) {
        rgba.push(chunk[0]);
        rgba.push(chunk[1]);
        rgba.push(chunk[2]);
        rgba.push(255);
    }

    RgbaImage::from_raw(width, height, rgba)
}

/// Low 32 bits of the published word; the high 32 hold the generation.
const INDEX_MASK: u64 = 0xFFFF_FFFF;

/// A frame queued for conversion, stamped with the pipeline generation it
/// came from.
struct PooledFrame {
    frame: RawFrame,
    generation: u64,
}

/// Bounded worker pool that converts raw frames off the video loop's thread
/// and publishes them through `frame_ready`.
///
/// Conversion is fire-and-forget: a full queue drops the submission, and a
/// result that finishes after a newer frame has already been published is
/// discarded, so the UI only ever moves forward.
///
/// `published` packs the pipeline generation (high 32 bits) with the next
/// expected frame index (low 32 bits). `reset` bumps the generation and
/// clears the index in a single store, so a conversion still in flight from
/// the previous pipeline can never re-raise the index for the new one.
pub struct FrameConverter {
    sender: Option<SyncSender<PooledFrame>>,
    workers: Vec<JoinHandle<()>>,
    published: Arc<AtomicU64>,
}

impl FrameConverter {
    pub fn new(events: Arc<dyn PlayerEvents>) -> Self {
        let (sender, receiver) = mpsc::sync_channel::<PooledFrame>(QUEUE_DEPTH);
        let receiver = Arc::new(Mutex::new(receiver));
        let published = Arc::new(AtomicU64::new(0));

        let workers = (0..WORKER_COUNT)
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                let events = Arc::clone(&events);
                let published = Arc::clone(&published);
                thread::spawn(move || Self::worker(receiver, events, published))
            })
            .collect();

        Self {
            sender: Some(sender),
            workers,
            published,
        }
    }

    fn worker(
        receiver: Arc<Mutex<Receiver<PooledFrame>>>,
        events: Arc<dyn PlayerEvents>,
        published: Arc<AtomicU64>,
    ) {
        loop {
            let pooled = {
                let receiver = receiver.lock().unwrap();
                match receiver.recv() {
                    Ok(pooled) => pooled,
                    Err(_) => break,
                }
            };
            let frame = pooled.frame;

            let Some(image) = rgb_to_rgba(&frame.data, frame.width, frame.height) else {
                continue;
            };

            // Publish only within the frame's own generation, and only if no
            // newer frame beat this one to completion.
            let target = (pooled.generation << 32) | ((frame.index + 1) & INDEX_MASK);
            let mut current = published.load(Ordering::SeqCst);
            loop {
                if current >> 32 != pooled.generation {
                    // The pipeline restarted while this frame was converting.
                    break;
                }
                if (current & INDEX_MASK) > (frame.index & INDEX_MASK) {
                    break;
                }
                match published.compare_exchange(
                    current,
                    target,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                ) {
                    Ok(_) => {
                        events.frame_ready(image);
                        break;
                    }
                    Err(actual) => current = actual,
                }
            }
        }
    }

    /// Queue a frame for conversion. Drops the frame if the pool is busy.
    pub fn submit(&self, frame: RawFrame) {
        let Some(sender) = &self.sender else { return };
        let generation = self.published.load(Ordering::SeqCst) >> 32;
        match sender.try_send(PooledFrame { frame, generation }) {
            Ok(()) => {}
            Err(TrySendError::Full(pooled)) => {
                log::debug!("Conversion queue full, dropping frame {}", pooled.frame.index);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Open a new publication generation for a restarted pipeline. Its frame
    /// 0 is not mistaken for a stale result, and results still in flight
    /// from the old pipeline are discarded instead of published.
    pub fn reset(&self) {
        let mut current = self.published.load(Ordering::SeqCst);
        loop {
            let next = (((current >> 32) + 1) & INDEX_MASK) << 32;
            match self
                .published
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Drop for FrameConverter {
    fn drop(&mut self) {
        // Closing the channel lets the workers drain and exit.
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
