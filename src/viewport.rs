//! Window size bookkeeping.
//!
//! Sizes are tracked in logical pixels plus a pixel ratio capped at 2, so a
//! 4x display renders sprites at the same apparent size as a 2x one.

use glam::Vec2;
use winit::dpi::PhysicalSize;

/// Upper bound applied to the display scale factor.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Current viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in logical pixels.
    pub width: f32,
    /// Height in logical pixels.
    pub height: f32,
    /// Device pixel ratio, capped at [`MAX_PIXEL_RATIO`].
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, scale_factor: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: scale_factor.min(MAX_PIXEL_RATIO),
        }
    }

    /// Build from a winit physical size and the window scale factor.
    pub fn from_physical(size: PhysicalSize<u32>, scale_factor: f64) -> Self {
        let scale = scale_factor.max(f64::EPSILON);
        Self::new(
            (size.width as f64 / scale) as f32,
            (size.height as f64 / scale) as f32,
            scale_factor as f32,
        )
    }

    /// Apply a resize event. Returns the new render resolution.
    pub fn resize(&mut self, width: f32, height: f32, scale_factor: f32) -> Vec2 {
        *self = Self::new(width, height, scale_factor);
        self.resolution()
    }

    /// Render resolution in physical pixels, as fed to the sprite shader.
    #[inline]
    pub fn resolution(&self) -> Vec2 {
        Vec2::new(self.width * self.pixel_ratio, self.height * self.pixel_ratio)
    }

    /// Width over height; 1.0 for a degenerate viewport.
    #[inline]
    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Whether either dimension is zero (minimised window).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}
