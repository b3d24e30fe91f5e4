use std::sync::Mutex;
use std::time::Instant;

/// Maps wall-clock time onto the video timeline.
///
/// The clock is anchored to a recorded (instant, position) pair and rebased
/// on every play and every completed seek. `Instant` is monotonic, so the
/// derived position never goes backwards between rebases even if the system
/// clock is adjusted.
pub struct PlaybackClock {
    origin: Mutex<ClockOrigin>,
}

#[derive(Clone, Copy)]
struct ClockOrigin {
    wall: Instant,
    position_ms: u64,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self {
            origin: Mutex::new(ClockOrigin {
                wall: Instant::now(),
                position_ms: 0,
            }),
        }
    }

    /// Rebase the clock so that `position_ms` corresponds to "now".
    ///
    /// The origin is swapped under a mutex, so a concurrent `now_ms` reader
    /// never observes a mix of the old instant and the new position.
    pub fn start(&self, position_ms: u64) {
        let mut origin = self.origin.lock().unwrap();
        *origin = ClockOrigin {
            wall: Instant::now(),
            position_ms,
        };
    }

    /// Current position on the video timeline, in milliseconds.
    pub fn now_ms(&self) -> u64 {
        let origin = *self.origin.lock().unwrap();
        origin.position_ms + origin.wall.elapsed().as_millis() as u64
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_clock_starts_at_position() {
        let clock = PlaybackClock::new();
        clock.start(5000);
        let now = clock.now_ms();
        assert!(now >= 5000);
        assert!(now < 5100, "clock advanced {}ms immediately", now - 5000);
    }

    #[test]
    fn test_clock_advances_monotonically() {
        let clock = PlaybackClock::new();
        clock.start(0);
        let a = clock.now_ms();
        std::thread::sleep(Duration::from_millis(20));
        let b = clock.now_ms();
        assert!(b > a);
        assert!(b >= 20);
    }

    #[test]
    fn test_rebase_jumps_to_new_position() {
        let clock = PlaybackClock::new();
        clock.start(60_000);
        std::thread::sleep(Duration::from_millis(10));
        clock.start(1000);
        let now = clock.now_ms();
        assert!(now >= 1000 && now < 1100);
    }
}
