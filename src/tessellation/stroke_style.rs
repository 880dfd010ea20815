use crate::error::{ConfigError, Result};

/// Validated ribbon thickness.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrokeStyle {
    thickness: f64,
}

impl StrokeStyle {
    /// Creates a new stroke style.
    ///
    /// # Errors
    ///
    /// Returns an error if `thickness` is not a positive finite number.
    pub fn new(thickness: f64) -> Result<Self> {
        if !thickness.is_finite() || thickness <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "thickness",
                value: thickness,
                reason: "must be positive",
            }
            .into());
        }
        Ok(Self { thickness })
    }

    /// Returns the full ribbon thickness.
    #[must_use]
    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Returns half the ribbon thickness.
    #[must_use]
    pub fn half_thickness(&self) -> f64 {
        self.thickness * 0.5
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_with_valid_thickness() {
        let style = StrokeStyle::new(3.0).unwrap();
        assert!((style.thickness() - 3.0).abs() < f64::EPSILON);
        assert!((style.half_thickness() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn new_with_zero_thickness_fails() {
        assert!(StrokeStyle::new(0.0).is_err());
    }

    #[test]
    fn new_with_nan_thickness_fails() {
        assert!(StrokeStyle::new(f64::NAN).is_err());
    }
}
