//! Circular avatar surface.

use std::sync::Arc;

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};

use crate::domain::ports::AvatarViewPort;

use super::progress_ring::ProgressRing;

/// Circle inscribed in the view bounds; pixels outside it are transparent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleMask {
    center_x: f32,
    center_y: f32,
    radius: f32,
}

impl CircleMask {
    /// Creates the mask for a `width` x `height` view.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn for_size(width: u32, height: u32) -> Self {
        Self {
            center_x: width as f32 / 2.0,
            center_y: height as f32 / 2.0,
            radius: width.min(height) as f32 / 2.0,
        }
    }

    /// Returns true if the pixel center at `(x, y)` is inside the circle.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        let dx = x as f32 + 0.5 - self.center_x;
        let dy = y as f32 + 0.5 - self.center_y;
        dx.hypot(dy) <= self.radius
    }

    /// Clears every pixel outside the circle.
    pub fn apply(&self, canvas: &mut RgbaImage) {
        for (x, y, pixel) in canvas.enumerate_pixels_mut() {
            if !self.contains(x, y) {
                *pixel = Rgba([0, 0, 0, 0]);
            }
        }
    }
}

/// The view an avatar is loaded into.
///
/// Keeps the current image, a circle mask fixed at construction and the
/// progress ring. The image is resized and masked once per `set_image`;
/// [`AvatarView::compose`] only strokes the ring over that base frame.
#[derive(Debug, Clone)]
pub struct AvatarView {
    width: u32,
    height: u32,
    image: Option<Arc<image::DynamicImage>>,
    base: RgbaImage,
    mask: CircleMask,
    ring: ProgressRing,
    revision: u64,
}

impl AvatarView {
    /// Creates an empty view of the given pixel size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            image: None,
            base: RgbaImage::new(width, height),
            mask: CircleMask::for_size(width, height),
            ring: ProgressRing::default(),
            revision: 0,
        }
    }

    /// Sets the ring stroke width.
    #[must_use]
    pub fn with_ring_width(mut self, line_width: f32) -> Self {
        self.ring = ProgressRing::new(line_width);
        self
    }

    /// Returns the image currently shown.
    #[must_use]
    pub const fn image(&self) -> Option<&Arc<image::DynamicImage>> {
        self.image.as_ref()
    }

    /// Returns the progress ring.
    #[must_use]
    pub const fn ring(&self) -> &ProgressRing {
        &self.ring
    }

    /// Counter bumped on every change; lets renderers skip unchanged frames.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Renders the masked image with the ring on top into one RGBA frame.
    #[must_use]
    pub fn compose(&self) -> RgbaImage {
        let mut canvas = self.base.clone();
        if !self.ring.is_empty() {
            self.ring.draw(&mut canvas);
            self.mask.apply(&mut canvas);
        }
        canvas
    }

    /// The image fills the bounds keeping its aspect ratio, cropped to the
    /// center, then masked.
    fn render_base(&self, image: &image::DynamicImage) -> RgbaImage {
        let mut base = if (image.width(), image.height()) == (self.width, self.height) {
            image.to_rgba8()
        } else {
            image
                .resize_to_fill(self.width, self.height, FilterType::Triangle)
                .to_rgba8()
        };
        self.mask.apply(&mut base);
        base
    }

    fn set_ring(&mut self, progress: f32) {
        let before = self.ring.percent();
        self.ring.set_progress(progress);
        if self.ring.percent() != before {
            self.revision += 1;
        }
    }
}

impl AvatarViewPort for AvatarView {
    fn set_image(&mut self, image: Arc<image::DynamicImage>) {
        self.base = self.render_base(&image);
        self.image = Some(image);
        self.revision += 1;
    }

    fn set_progress(&mut self, progress: f32) {
        self.set_ring(progress);
    }

    fn reset_progress(&mut self) {
        self.set_ring(0.0);
    }
}
