//! Domain checks applied before any value is sent to an instrument.

use crate::error::ValidationError;

/// An inclusive numeric domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Numbers {
    pub min: f64,
    pub max: f64,
}

impl Numbers {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns the value unchanged if it lies within the domain. `NaN` never does.
    pub fn check(&self, value: f64) -> Result<f64, ValidationError> {
        if value >= self.min && value <= self.max {
            Ok(value)
        } else {
            Err(ValidationError::OutOfRange {
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}
