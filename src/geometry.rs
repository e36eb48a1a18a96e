//! Logical/physical sizes and the layout that ties them together.

/// A position in logical (CSS pixel) surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LogicalSize {
    pub width:  f64,
    pub height: f64
}

/// Backing-buffer size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhysicalSize {
    pub width:  u32,
    pub height: u32
}

impl PhysicalSize {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// What the host reports about the pad's container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Rendered width of the container, in CSS pixels.
    pub container_width: f64,
    /// Device pixel ratio.
    pub scale_factor:    f64
}

impl Viewport {
    pub const fn new(container_width: f64, scale_factor: f64) -> Self {
        Self {
            container_width,
            scale_factor
        }
    }

    /// Scale factor actually applied: anything non-finite or non-positive
    /// falls back to 1.0.
    pub fn effective_scale(&self) -> f64 {
        if self.scale_factor.is_finite() && self.scale_factor > 0.0 {
            self.scale_factor
        } else {
            1.0
        }
    }
}

/// Result of a successful surface configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceLayout {
    pub logical:  LogicalSize,
    pub physical: PhysicalSize,
    pub scale:    f64
}

impl SurfaceLayout {
    /// Physical dimensions are truncated to whole pixels, the same way a
    /// canvas `width`/`height` assignment converts them.
    pub fn new(logical: LogicalSize, scale: f64) -> Self {
        let physical = PhysicalSize {
            width:  to_device_pixels(logical.width * scale),
            height: to_device_pixels(logical.height * scale)
        };
        Self {
            logical,
            physical,
            scale
        }
    }
}

fn to_device_pixels(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.floor().min(u32::MAX as f64) as u32
    } else {
        0
    }
}
