#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::consts::{WHEEL_ZOOM_FACTOR, ZOOM_MAX, ZOOM_MIN, ZOOM_STEP_FACTOR};

/// A point in either screen or image space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Direction of an explicit zoom command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Wheel / trackpad scroll delta in pixels. Negative `dy` zooms in.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    pub dx: f64,
    pub dy: f64,
}

/// Pan/zoom state for the bounded image viewport.
///
/// `offset_x` / `offset_y` are in screen pixels. `scale` is clamped to
/// `[ZOOM_MIN, ZOOM_MAX]` by every mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { scale: 1.0, offset_x: 0.0, offset_y: 0.0 }
    }
}

fn clamp_scale(scale: f64) -> f64 {
    scale.clamp(ZOOM_MIN, ZOOM_MAX)
}

impl Viewport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert an image-space point to screen coordinates.
    #[must_use]
    pub fn image_to_screen(&self, image: Point) -> Point {
        Point {
            x: image.x * self.scale + self.offset_x,
            y: image.y * self.scale + self.offset_y,
        }
    }

    /// Convert a screen-space point to image coordinates. Exact inverse of
    /// [`Viewport::image_to_screen`].
    #[must_use]
    pub fn screen_to_image(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.offset_x) / self.scale,
            y: (screen.y - self.offset_y) / self.scale,
        }
    }

    /// Apply an explicit zoom command around the viewport origin.
    pub fn zoom(&mut self, direction: ZoomDirection) {
        let next = match direction {
            ZoomDirection::In => self.scale * ZOOM_STEP_FACTOR,
            ZoomDirection::Out => self.scale / ZOOM_STEP_FACTOR,
        };
        self.scale = clamp_scale(next);
    }

    /// Apply a wheel zoom anchored at `pointer`: the image point under the
    /// pointer is identical before and after the scale change.
    pub fn zoom_at(&mut self, delta: WheelDelta, pointer: Point) {
        let anchor = self.screen_to_image(pointer);
        let next = if delta.dy < 0.0 {
            self.scale * WHEEL_ZOOM_FACTOR
        } else {
            self.scale / WHEEL_ZOOM_FACTOR
        };
        self.scale = clamp_scale(next);
        self.offset_x = pointer.x - anchor.x * self.scale;
        self.offset_y = pointer.y - anchor.y * self.scale;
    }

    /// Translate the viewport. Panning past the image bounds is allowed.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Restore the identity view.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Scale the image to fit the container, never enlarging past 1:1, and
    /// drop any pan offset.
    pub fn fit_to_container(&mut self, container: Size, image: Size) {
        let scale_x = container.width / image.width;
        let scale_y = container.height / image.height;
        self.scale = clamp_scale(scale_x.min(scale_y).min(1.0));
        self.offset_x = 0.0;
        self.offset_y = 0.0;
    }

    /// Current zoom as a whole percentage, for the toolbar readout.
    #[must_use]
    pub fn zoom_percent(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            (self.scale * 100.0).round() as u32
        }
    }
}
