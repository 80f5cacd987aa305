//! Frame time tracking

use std::time::{Duration, Instant};

/// Per-frame clock.
///
/// Copied into script contexts each frame, so hooks read a consistent
/// snapshot even while the engine clock keeps moving.
#[derive(Debug, Clone, Copy)]
pub struct Time {
    start: Instant,
    last: Instant,
    delta: Duration,
    frame: u64,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Start the clock at zero elapsed time.
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            delta: Duration::ZERO,
            frame: 0,
        }
    }

    /// Advance to the next frame.
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta = now - self.last;
        self.last = now;
        self.frame += 1;
    }

    /// Time the last frame took.
    #[must_use]
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Last frame time in seconds.
    #[must_use]
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Time since the clock started, measured at the current frame.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.last - self.start
    }

    /// Number of completed [`Time::update`] calls.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_advances_frame_and_delta() {
        let mut time = Time::new();
        assert_eq!(time.frame_count(), 0);
        assert_eq!(time.delta(), Duration::ZERO);

        std::thread::sleep(Duration::from_millis(2));
        time.update();
        assert_eq!(time.frame_count(), 1);
        assert!(time.delta() >= Duration::from_millis(2));
        assert!(time.elapsed() >= time.delta());
    }
}
