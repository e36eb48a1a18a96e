use crate::error::SigError;

/// Solid pen color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8
}

impl StrokeColor {
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    /// CSS hex form, e.g. `#000000`.
    pub fn to_css(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Pen settings reapplied after every surface reconfiguration.
/// Caps and joins are always round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    /// Line width in logical pixels.
    pub width: f64,
    pub color: StrokeColor
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 2.0,
            color: StrokeColor::BLACK
        }
    }
}

/// What `clear()` does to a stroke that is still in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearPolicy {
    /// Force the pad back to idle; the next move needs a fresh pointer-down.
    #[default]
    AbandonStroke,
    /// Keep drawing from the pre-clear point, as the old widget did.
    Legacy
}

#[derive(Debug, Clone, PartialEq)]
pub struct PadConfig {
    /// Fixed logical height of the drawing surface, in CSS pixels.
    pub logical_height: f64,
    pub stroke:         StrokeStyle,
    pub clear_policy:   ClearPolicy
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            logical_height: 200.0,
            stroke:         StrokeStyle::default(),
            clear_policy:   ClearPolicy::default()
        }
    }
}

impl PadConfig {
    pub fn with_logical_height(mut self, height: f64) -> Self {
        self.logical_height = height;
        self
    }

    pub fn with_stroke(mut self, stroke: StrokeStyle) -> Self {
        self.stroke = stroke;
        self
    }

    pub fn with_clear_policy(mut self, policy: ClearPolicy) -> Self {
        self.clear_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), SigError> {
        if !(self.logical_height.is_finite() && self.logical_height > 0.0) {
            return Err(SigError::InvalidConfig(format!(
                "logical height must be positive, got {}",
                self.logical_height
            )));
        }
        if !(self.stroke.width.is_finite() && self.stroke.width > 0.0) {
            return Err(SigError::InvalidConfig(format!(
                "line width must be positive, got {}",
                self.stroke.width
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PadConfig::default().validate().is_ok());
        assert_eq!(StrokeColor::BLACK.to_css(), "#000000");
    }

    #[test]
    fn rejects_non_positive_height() {
        let err = PadConfig::default()
            .with_logical_height(0.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, SigError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_bad_line_width() {
        let cfg = PadConfig::default().with_stroke(StrokeStyle {
            width: f64::NAN,
            color: StrokeColor { r: 10, g: 20, b: 30 }
        });
        assert!(cfg.validate().is_err());
    }
}
