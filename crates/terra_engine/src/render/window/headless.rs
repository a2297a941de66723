//! Window surface without a window

use crate::render::api::Viewport;
use crate::render::window::WindowSurface;

/// Fixed-size surface with a constant frame time
///
/// Counts presented frames and reports `should_close` once an optional
/// frame limit is reached.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    size: Viewport,
    frame_time: f32,
    frames: u64,
    frame_limit: Option<u64>,
}

impl HeadlessSurface {
    /// Surface of the given size at 60 frames per second
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Viewport::new(width, height),
            frame_time: 1.0 / 60.0,
            frames: 0,
            frame_limit: None,
        }
    }

    /// Use a different frame time
    pub fn with_frame_time(mut self, seconds: f32) -> Self {
        self.frame_time = seconds;
        self
    }

    /// Close after `frames` presented frames
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Change the reported size
    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = Viewport::new(width, height);
    }

    /// Frames presented so far
    pub const fn frames(&self) -> u64 {
        self.frames
    }
}

impl WindowSurface for HeadlessSurface {
    fn size(&self) -> Viewport {
        self.size
    }

    fn frame_time(&self) -> f32 {
        self.frame_time
    }

    fn should_close(&self) -> bool {
        self.frame_limit.is_some_and(|limit| self.frames >= limit)
    }

    fn swap_buffers(&mut self) {
        self.frames += 1;
    }

    fn poll_events(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_limit() {
        let mut surface = HeadlessSurface::new(320, 200).with_frame_limit(2);
        assert!(!surface.should_close());
        surface.swap_buffers();
        surface.swap_buffers();
        assert!(surface.should_close());
        assert_eq!(surface.frames(), 2);
        assert!((surface.size().aspect_ratio() - 1.6).abs() < 1e-6);
    }
}
