use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{
    config::StrokeStyle,
    error::SigError,
    geometry::{LogicalSize, PhysicalSize, Point}
};

pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Drawing backend behind a [`SignaturePad`](crate::SignaturePad).
///
/// Mirrors the subset of a 2D canvas context the pad needs. Resizing behaves
/// like a canvas: the buffer is cleared and the transform and stroke style are
/// reset, so the pad always follows `resize` with `set_scale` and
/// `apply_style`.
pub trait Surface {
    /// Captured frame that can be painted back after a resize. The pad keeps
    /// a copy until the frame is actually painted.
    type Snapshot: Clone;

    fn physical_size(&self) -> PhysicalSize;

    /// Best-effort copy of the current pixels.
    fn capture(&self) -> Option<Self::Snapshot>;

    fn resize(&mut self, size: PhysicalSize) -> Result<(), SigError>;

    /// Reset the transform to identity, then scale by `scale`.
    fn set_scale(&mut self, scale: f64);

    fn apply_style(&mut self, style: &StrokeStyle);

    /// Paint `snapshot` at (0,0) stretched to `logical` under the current
    /// transform.
    fn draw_snapshot(&mut self, snapshot: &Self::Snapshot, logical: LogicalSize);

    /// Stroke one straight segment, in logical coordinates.
    fn stroke_segment(&mut self, from: Point, to: Point);

    /// Erase every physical pixel, regardless of the current transform.
    fn clear_all(&mut self);

    fn encode_png(&self) -> Result<Vec<u8>, SigError>;

    fn png_data_url(&self) -> Result<String, SigError> {
        let png = self.encode_png()?;
        Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(png)))
    }
}
