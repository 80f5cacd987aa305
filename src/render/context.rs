//! Render target state tracking
//!
//! The context stands in for the GPU-facing side of a frame: viewport,
//! clear state, and draw accounting. It tracks what was last submitted so
//! callers can set state unconditionally while redundant submissions are
//! filtered here, in one place.

use bitflags::bitflags;
use glam::Vec4;

bitflags! {
    /// Which buffers a clear touches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

/// Per-target render state.
#[derive(Debug)]
pub struct RenderContext {
    width: u32,
    height: u32,

    submitted_clear_color: Option<Vec4>,
    clear_color_submissions: u32,
    last_clear_flags: Option<ClearFlags>,
    clear_count: u32,
    viewport_applications: u32,
    draw_calls: u32,
}

impl RenderContext {
    /// Context for a target of the given pixel size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            submitted_clear_color: None,
            clear_color_submissions: 0,
            last_clear_flags: None,
            clear_count: 0,
            viewport_applications: 0,
            draw_calls: 0,
        }
    }

    /// Resize the target, e.g. on a window resize event.
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Width over height; 1.0 for a degenerate target.
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }

    /// Submit the full-target viewport rectangle.
    pub fn apply_viewport(&mut self) {
        self.viewport_applications += 1;
    }

    /// Submit a clear color, skipping the call when it matches the color
    /// already submitted.
    pub fn set_clear_color(&mut self, color: Vec4) {
        if self.submitted_clear_color == Some(color) {
            return;
        }
        self.submitted_clear_color = Some(color);
        self.clear_color_submissions += 1;
    }

    /// Clear the selected buffers. An empty flag set is a no-op.
    pub fn clear(&mut self, flags: ClearFlags) {
        if flags.is_empty() {
            return;
        }
        self.last_clear_flags = Some(flags);
        self.clear_count += 1;
    }

    /// Record one draw submission.
    pub fn record_draw_call(&mut self) {
        self.draw_calls += 1;
    }

    #[must_use]
    pub fn viewport_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn last_clear_color(&self) -> Option<Vec4> {
        self.submitted_clear_color
    }

    #[must_use]
    pub fn clear_color_submissions(&self) -> u32 {
        self.clear_color_submissions
    }

    #[must_use]
    pub fn last_clear_flags(&self) -> Option<ClearFlags> {
        self.last_clear_flags
    }

    #[must_use]
    pub fn clear_count(&self) -> u32 {
        self.clear_count
    }

    #[must_use]
    pub fn viewport_applications(&self) -> u32 {
        self.viewport_applications
    }

    #[must_use]
    pub fn draw_calls(&self) -> u32 {
        self.draw_calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redundant_clear_colors_are_filtered() {
        let mut ctx = RenderContext::new(100, 100);
        ctx.set_clear_color(Vec4::ONE);
        ctx.set_clear_color(Vec4::ONE);
        ctx.set_clear_color(Vec4::ZERO);
        assert_eq!(ctx.clear_color_submissions(), 2);
        assert_eq!(ctx.last_clear_color(), Some(Vec4::ZERO));
    }

    #[test]
    fn empty_clear_is_a_no_op() {
        let mut ctx = RenderContext::new(100, 100);
        ctx.clear(ClearFlags::empty());
        assert_eq!(ctx.clear_count(), 0);
        ctx.clear(ClearFlags::DEPTH);
        assert_eq!(ctx.last_clear_flags(), Some(ClearFlags::DEPTH));
    }

    #[test]
    fn aspect_ratio_handles_degenerate_targets() {
        assert_eq!(RenderContext::new(200, 100).aspect_ratio(), 2.0);
        assert_eq!(RenderContext::new(200, 0).aspect_ratio(), 1.0);
    }
}
