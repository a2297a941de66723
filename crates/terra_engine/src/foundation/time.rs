//! Frame timing

use std::time::Instant;

/// Longest frame fed to animation, in seconds
///
/// A stalled frame (window drag, breakpoint) would otherwise jump the water
/// and sky animation forward in one step.
pub const MAX_FRAME_TIME: f32 = 0.25;

/// Frame timer used by window surfaces to report per-frame delta time
#[derive(Debug, Clone)]
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Start timing now
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Mark the end of a frame
    pub fn update(&mut self) {
        let now = Instant::now();
        self.record(now.duration_since(self.last_frame).as_secs_f32());
        self.last_frame = now;
    }

    fn record(&mut self, elapsed: f32) {
        self.delta_time = elapsed.clamp(0.0, MAX_FRAME_TIME);
        self.total_time += elapsed;
        self.frame_count += 1;
    }

    /// Duration of the last frame, capped at [`MAX_FRAME_TIME`]
    pub const fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Wall-clock seconds across all recorded frames
    pub const fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Frames recorded
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Mean frames per second since the timer started
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_counts_frames() {
        let mut timer = Timer::new();
        timer.update();
        timer.update();
        assert_eq!(timer.frame_count(), 2);
        assert!(timer.delta_time() >= 0.0);
        assert!(timer.total_time() >= timer.delta_time());
    }

    #[test]
    fn test_stalled_frame_is_capped() {
        let mut timer = Timer::new();
        timer.record(3.0);
        assert!((timer.delta_time() - MAX_FRAME_TIME).abs() < f32::EPSILON);
        assert!((timer.total_time() - 3.0).abs() < f32::EPSILON);
        assert!((timer.average_fps() - 1.0 / 3.0).abs() < 1e-6);
    }
}
