use thiserror::Error;

#[derive(Debug, Error)]
pub enum SigError {
    #[error("DOM not available")]
    DomUnavailable,
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    #[error("Canvas context unavailable")]
    NoContext2d,
    #[error("Operation failed: {0}")]
    OpFailed(String),
    #[error("Invalid pad configuration: {0}")]
    InvalidConfig(String),
    #[error("Cannot allocate a {width}x{height} surface")]
    SurfaceAllocation { width: u32, height: u32 },
    #[error("Surface has not been configured yet")]
    NotConfigured,
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("Please sign before saving")]
    EmptySignature
}

#[cfg(feature = "web")]
impl From<SigError> for wasm_bindgen::JsValue {
    fn from(err: SigError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}
