//! Frame statistics

use std::collections::VecDeque;
use std::time::Duration;

/// Rolling frame-time tracker.
#[derive(Debug)]
pub struct FrameStats {
    /// Frame time history for averaging
    frame_times: VecDeque<Duration>,
    /// Maximum samples to keep
    max_samples: usize,
    /// Current FPS over the sample window
    fps: f32,
    /// Average frame time in milliseconds
    avg_frame_time_ms: f32,
    /// Total frames recorded
    total_frames: u64,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(120)
    }
}

impl FrameStats {
    /// Tracker averaging over the last `max_samples` frames.
    #[must_use]
    pub fn new(max_samples: usize) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            fps: 0.0,
            avg_frame_time_ms: 0.0,
            total_frames: 0,
        }
    }

    /// Record a frame with the given delta time.
    pub fn record_frame(&mut self, delta: Duration) {
        self.total_frames += 1;
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(delta);

        let total: Duration = self.frame_times.iter().sum();
        let total_secs = total.as_secs_f32();
        let count = self.frame_times.len() as f32;
        if total_secs > 0.0 {
            self.avg_frame_time_ms = (total_secs / count) * 1000.0;
            self.fps = count / total_secs;
        } else {
            self.avg_frame_time_ms = 0.0;
            self.fps = 0.0;
        }
    }

    /// Frames per second over the sample window.
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Average frame time in milliseconds over the sample window.
    #[must_use]
    pub fn avg_frame_time_ms(&self) -> f32 {
        self.avg_frame_time_ms
    }

    /// Total frames recorded since creation.
    #[must_use]
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}
