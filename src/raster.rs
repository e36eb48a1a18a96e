//! In-memory surface backed by a tiny-skia pixmap.
//!
//! Behaves like a browser canvas for everything the pad relies on: resizing
//! drops the pixels and the context state, drawing happens through a
//! scale transform in logical coordinates, and export is a PNG of the full
//! device-pixel buffer.

use tiny_skia::{
    Color, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform
};

use crate::{
    config::StrokeStyle,
    error::SigError,
    geometry::{LogicalSize, PhysicalSize, Point},
    surface::Surface
};

pub struct RasterSurface {
    pixmap:    Option<Pixmap>,
    transform: Transform,
    paint:     Paint<'static>,
    stroke:    Stroke
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterSurface {
    /// Unconfigured surface; the first `resize` allocates the buffer.
    pub fn new() -> Self {
        Self {
            pixmap:    None,
            transform: Transform::identity(),
            paint:     default_paint(),
            stroke:    default_stroke()
        }
    }

    /// Rendered pixels, if the surface has been sized.
    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    /// Alpha of a physical pixel; `None` outside the buffer.
    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        self.pixmap
            .as_ref()
            .and_then(|p| p.pixel(x, y))
            .map(|px| px.alpha())
    }
}

fn default_paint() -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(Color::BLACK);
    paint.anti_alias = true;
    paint
}

// Canvas defaults: 1px, butt caps, miter joins.
fn default_stroke() -> Stroke {
    Stroke {
        width: 1.0,
        ..Stroke::default()
    }
}

impl Surface for RasterSurface {
    type Snapshot = Pixmap;

    fn physical_size(&self) -> PhysicalSize {
        self.pixmap
            .as_ref()
            .map(|p| PhysicalSize {
                width:  p.width(),
                height: p.height()
            })
            .unwrap_or_default()
    }

    fn capture(&self) -> Option<Pixmap> {
        self.pixmap.clone()
    }

    fn resize(&mut self, size: PhysicalSize) -> Result<(), SigError> {
        let pixmap = Pixmap::new(size.width, size.height).ok_or(SigError::SurfaceAllocation {
            width:  size.width,
            height: size.height
        })?;
        self.pixmap = Some(pixmap);
        self.transform = Transform::identity();
        self.paint = default_paint();
        self.stroke = default_stroke();
        Ok(())
    }

    fn set_scale(&mut self, scale: f64) {
        self.transform = Transform::from_scale(scale as f32, scale as f32);
    }

    fn apply_style(&mut self, style: &StrokeStyle) {
        let c = style.color;
        self.paint.set_color_rgba8(c.r, c.g, c.b, 255);
        self.stroke = Stroke {
            width: style.width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
    }

    fn draw_snapshot(&mut self, snapshot: &Pixmap, logical: LogicalSize) {
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };
        let sx = logical.width as f32 / snapshot.width() as f32;
        let sy = logical.height as f32 / snapshot.height() as f32;
        let transform = self.transform.pre_scale(sx, sy);
        pixmap.draw_pixmap(
            0,
            0,
            snapshot.as_ref(),
            &PixmapPaint::default(),
            transform,
            None
        );
    }

    fn stroke_segment(&mut self, from: Point, to: Point) {
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };
        let mut pb = PathBuilder::new();
        pb.move_to(from.x as f32, from.y as f32);
        pb.line_to(to.x as f32, to.y as f32);
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &self.paint, &self.stroke, self.transform, None);
        }
    }

    fn clear_all(&mut self) {
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill(Color::TRANSPARENT);
        }
    }

    fn encode_png(&self) -> Result<Vec<u8>, SigError> {
        let pixmap = self.pixmap.as_ref().ok_or(SigError::NotConfigured)?;
        pixmap
            .encode_png()
            .map_err(|e| SigError::Encode(e.to_string()))
    }
}
