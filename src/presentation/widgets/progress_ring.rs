//! Gradient progress ring drawn around the avatar.

use std::f32::consts::TAU;

use image::{Rgba, RgbaImage};

/// Default stroke width in pixels.
pub const DEFAULT_RING_WIDTH: f32 = 10.0;

const START_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
const END_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Arc stroked along the avatar circle, swept clockwise from angle zero
/// (the right-hand side) in proportion to the download progress.
///
/// Colors follow a vertical gradient, green at the top to red at the bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRing {
    progress: f32,
    line_width: f32,
}

impl ProgressRing {
    /// Creates an empty ring.
    #[must_use]
    pub fn new(line_width: f32) -> Self {
        Self {
            progress: 0.0,
            line_width: line_width.max(0.0),
        }
    }

    /// Sets the swept fraction, clamped to `0.0..=1.0`.
    pub fn set_progress(&mut self, progress: f32) {
        self.progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
    }

    /// Resets to an empty sweep.
    pub fn reset(&mut self) {
        self.progress = 0.0;
    }

    /// Returns the swept fraction.
    #[must_use]
    pub const fn progress(&self) -> f32 {
        self.progress
    }

    /// Returns the sweep rounded to whole percent. Sweeps closer than one
    /// step draw the same ring at avatar sizes.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percent(&self) -> u8 {
        (self.progress * 100.0).round() as u8
    }

    /// Returns the swept angle in radians.
    #[must_use]
    pub fn sweep_angle(&self) -> f32 {
        self.progress * TAU
    }

    /// Returns true if nothing would be drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.progress <= 0.0 || self.line_width <= 0.0
    }

    /// Returns true if the pixel at `(x, y)` lies on the swept arc of a
    /// circle inscribed in a `width` x `height` canvas.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn covers(&self, x: u32, y: u32, width: u32, height: u32) -> bool {
        if self.is_empty() {
            return false;
        }

        let cx = width as f32 / 2.0;
        let cy = height as f32 / 2.0;
        let radius = width.min(height) as f32 / 2.0;
        let half_width = self.line_width / 2.0;

        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        let distance = dx.hypot(dy);
        if (distance - radius).abs() > half_width {
            return false;
        }

        // Image rows grow downwards, so increasing atan2 turns clockwise.
        let angle = dy.atan2(dx).rem_euclid(TAU);
        angle <= self.sweep_angle()
    }

    /// Gradient color for row `y` of a canvas `height` pixels tall.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn color_at(y: u32, height: u32) -> Rgba<u8> {
        let t = if height > 1 {
            (y as f32 / (height - 1) as f32).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;

        Rgba([
            mix(START_COLOR[0], END_COLOR[0]),
            mix(START_COLOR[1], END_COLOR[1]),
            mix(START_COLOR[2], END_COLOR[2]),
            255,
        ])
    }

    /// Strokes the swept arc onto `canvas`.
    pub fn draw(&self, canvas: &mut RgbaImage) {
        if self.is_empty() {
            return;
        }

        let (width, height) = canvas.dimensions();
        for (x, y, pixel) in canvas.enumerate_pixels_mut() {
            if self.covers(x, y, width, height) {
                *pixel = Self::color_at(y, height);
            }
        }
    }
}

impl Default for ProgressRing {
    fn default() -> Self {
        Self::new(DEFAULT_RING_WIDTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(-0.5, 0.0 ; "negative_clamps_to_zero")]
    #[test_case(0.25, 0.25 ; "quarter")]
    #[test_case(1.5, 1.0 ; "overflow_clamps_to_one")]
    #[test_case(f32::NAN, 0.0 ; "nan_is_empty")]
    fn test_set_progress_clamps(input: f32, expected: f32) {
        let mut ring = ProgressRing::default();
        ring.set_progress(input);
        assert!((ring.progress() - expected).abs() < f32::EPSILON);
    }

    #[test]
    fn test_sweep_angle() {
        let mut ring = ProgressRing::default();
        ring.set_progress(0.5);
        assert!((ring.sweep_angle() - std::f32::consts::PI).abs() < 1e-6);

        ring.reset();
        assert!(ring.is_empty());
        assert!(ring.sweep_angle().abs() < f32::EPSILON);
    }

    #[test_case(0.0, 0 ; "empty")]
    #[test_case(0.004, 0 ; "rounds_down")]
    #[test_case(0.306, 31 ; "rounds_up")]
    #[test_case(1.0, 100 ; "full")]
    fn test_percent_steps(progress: f32, expected: u8) {
        let mut ring = ProgressRing::default();
        ring.set_progress(progress);
        assert_eq!(ring.percent(), expected);
    }

    #[test]
    fn test_half_ring_covers_bottom_not_top() {
        let mut ring = ProgressRing::new(10.0);
        ring.set_progress(0.5);

        assert!(ring.covers(50, 97, 100, 100));
        assert!(ring.covers(97, 50, 100, 100));
        assert!(!ring.covers(50, 2, 100, 100));
        assert!(!ring.covers(50, 50, 100, 100));
    }

    #[test]
    fn test_empty_ring_draws_nothing() {
        let ring = ProgressRing::default();
        let mut canvas = RgbaImage::new(40, 40);

        ring.draw(&mut canvas);

        assert!(canvas.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_full_ring_gradient() {
        let mut ring = ProgressRing::new(10.0);
        ring.set_progress(1.0);
        let mut canvas = RgbaImage::new(100, 100);

        ring.draw(&mut canvas);

        let top = canvas.get_pixel(50, 2);
        let bottom = canvas.get_pixel(50, 97);
        assert_eq!(top[3], 255);
        assert!(top[1] > top[0]);
        assert!(bottom[0] > bottom[1]);
        assert_eq!(canvas.get_pixel(50, 50)[3], 0);
    }

    #[test]
    fn test_gradient_endpoints() {
        assert_eq!(ProgressRing::color_at(0, 100), START_COLOR);
        assert_eq!(ProgressRing::color_at(99, 100), END_COLOR);
    }
}
