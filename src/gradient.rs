use defmt::Format;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::DecoError;

/// Gradient factor interpolated linearly from `gf_low` at the first stop to
/// `gf_high` at the surface.
#[derive(Debug, Format, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gradient {
    gf_low: f64,
    gf_high: f64,
    gf: f64,
    gf_slope: f64,
    gf_set: bool,
}

impl Gradient {
    pub fn new(gf_low: f64, gf_high: f64) -> Result<Self, DecoError> {
        if !(0.0..=1.0).contains(&gf_low) || !(0.0..=1.0).contains(&gf_high) {
            return Err(DecoError::InvalidGradientFactor { gf_low, gf_high });
        }
        Ok(Gradient {
            gf_low,
            gf_high,
            gf: gf_low,
            gf_slope: 1.0,
            gf_set: false,
        })
    }

    pub fn gf_low(&self) -> f64 {
        self.gf_low
    }

    pub fn gf_high(&self) -> f64 {
        self.gf_high
    }

    /// Current gradient factor, never below `gf_low`.
    pub fn gf(&self) -> f64 {
        f64::max(self.gf, self.gf_low)
    }

    pub fn gf_slope(&self) -> Option<f64> {
        self.gf_set.then_some(self.gf_slope)
    }

    /// Anchor the slope at the first stop depth.
    pub fn set_gf_slope_at_depth(&mut self, depth: f64) {
        if depth > 0.0 {
            self.gf_slope = (self.gf_high - self.gf_low) / (0.0 - depth);
            self.gf_set = true;
            defmt::debug!("gf slope anchored at {=f64}m: {=f64}", depth, self.gf_slope);
        }
    }

    /// Interpolate the gradient factor for `depth`. No-op until the slope is
    /// anchored.
    pub fn set_gf_at_depth(&mut self, depth: f64) {
        if self.gf_set {
            self.gf = f64::max(self.gf_slope * depth + self.gf_high, self.gf_low);
        }
    }
}

#[test]
fn test_gf_is_low_until_slope_set() {
    let mut gradient = Gradient::new(0.3, 0.8).unwrap();
    gradient.set_gf_at_depth(3.0);
    assert_eq!(gradient.gf(), 0.3);
    assert_eq!(gradient.gf_slope(), None);
}

#[test]
fn test_gf_reaches_high_at_surface() {
    let mut gradient = Gradient::new(0.3, 0.8).unwrap();
    gradient.set_gf_slope_at_depth(21.0);
    gradient.set_gf_at_depth(0.0);
    assert_eq!(gradient.gf(), 0.8);
}
