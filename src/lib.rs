//! Signature capture pad.
//!
//! [`SignaturePad`] tracks strokes over a device-pixel-ratio scaled
//! [`Surface`] and exports the result as PNG. [`RasterSurface`] draws into
//! memory; with the `web` feature the pad binds to a `<canvas>` and the DOM.

mod config;
mod error;
mod geometry;
mod input;
mod raster;
mod signature_core;
mod surface;

#[cfg(feature = "web")]
mod ui_common;
#[cfg(feature = "web")]
mod web;

#[cfg(feature = "yew")]
mod yew;

pub use config::{ClearPolicy, PadConfig, StrokeColor, StrokeStyle};
pub use error::SigError;
pub use geometry::{LogicalSize, PhysicalSize, Point, SurfaceLayout, Viewport};
pub use input::{resolve_point, PointerInput};
pub use raster::RasterSurface;
pub use signature_core::{PadEvent, PendingRedraw, SignaturePad, StrokeState};
pub use surface::{Surface, PNG_DATA_URL_PREFIX};

#[cfg(feature = "web")]
pub use crate::ui_common::{
    mount_signature_pad, MountOptions, MountPoints, MountedPad, SignaturePadHandle
};
#[cfg(feature = "web")]
pub use crate::web::CanvasSurface;
#[cfg(feature = "yew")]
pub use crate::yew::{SignaturePadYew, SignatureProps, SignatureStyle};
