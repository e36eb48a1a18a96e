// src/web.rs
// feature = "web"

use base64::{engine::general_purpose::STANDARD, Engine as _};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::{
    config::StrokeStyle,
    error::SigError,
    geometry::{LogicalSize, PhysicalSize, Point},
    surface::{Surface, PNG_DATA_URL_PREFIX}
};

/// `Surface` over a `<canvas>` element and its 2D context.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx:    CanvasRenderingContext2d
}

impl CanvasSurface {
    /// Create a surface from an existing <canvas> element.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, SigError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|_| SigError::NoContext2d)?
            .ok_or(SigError::NoContext2d)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| SigError::NoContext2d)?;
        Ok(Self { canvas, ctx })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl Surface for CanvasSurface {
    /// Previous frame, decoded asynchronously by the browser. The host waits
    /// for its `load` event before calling `finish_redraw`.
    type Snapshot = HtmlImageElement;

    fn physical_size(&self) -> PhysicalSize {
        PhysicalSize {
            width:  self.canvas.width(),
            height: self.canvas.height()
        }
    }

    fn capture(&self) -> Option<HtmlImageElement> {
        let data_url = self.canvas.to_data_url_with_type("image/png").ok()?;
        let image = HtmlImageElement::new().ok()?;
        image.set_src(&data_url);
        Some(image)
    }

    fn resize(&mut self, size: PhysicalSize) -> Result<(), SigError> {
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
        Ok(())
    }

    fn set_scale(&mut self, scale: f64) {
        let _ = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        let _ = self.ctx.scale(scale, scale);
    }

    fn apply_style(&mut self, style: &StrokeStyle) {
        self.ctx.set_line_width(style.width);
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
        self.ctx.set_stroke_style_str(&style.color.to_css());
    }

    fn draw_snapshot(&mut self, snapshot: &HtmlImageElement, logical: LogicalSize) {
        let _ = self
            .ctx
            .draw_image_with_html_image_element_and_dw_and_dh(
                snapshot,
                0.0,
                0.0,
                logical.width,
                logical.height
            );
    }

    fn stroke_segment(&mut self, from: Point, to: Point) {
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.ctx.stroke();
    }

    fn clear_all(&mut self) {
        let w = self.canvas.width() as f64;
        let h = self.canvas.height() as f64;
        // Erase in device pixels, not through the scale transform.
        self.ctx.save();
        let _ = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        self.ctx.clear_rect(0.0, 0.0, w, h);
        self.ctx.restore();
    }

    fn encode_png(&self) -> Result<Vec<u8>, SigError> {
        let data_url = self.png_data_url()?;
        let b64 = data_url
            .strip_prefix(PNG_DATA_URL_PREFIX)
            .ok_or_else(|| SigError::OpFailed("unexpected data URL".into()))?;
        STANDARD
            .decode(b64)
            .map_err(|e| SigError::Encode(e.to_string()))
    }

    fn png_data_url(&self) -> Result<String, SigError> {
        self.canvas
            .to_data_url_with_type("image/png")
            .map_err(|_| SigError::OpFailed("to_data_url".into()))
    }
}
