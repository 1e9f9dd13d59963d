use serde::{Deserialize, Serialize};

use super::spline::Curve;

/// How a [`CurvePosition`] value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PositionMode {
    /// Fraction of the total arc length.
    #[default]
    Normalized,
    /// Distance along the curve.
    Distance,
    /// Raw curve parameter, wrapped into `[0, 1)`.
    Simple,
}

/// A location on a curve expressed in one of the [`PositionMode`]s.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CurvePosition {
    pub mode: PositionMode,
    pub value: f64,
}

impl CurvePosition {
    #[must_use]
    pub const fn new(value: f64, mode: PositionMode) -> Self {
        Self { mode, value }
    }

    #[must_use]
    pub const fn normalized(value: f64) -> Self {
        Self::new(value, PositionMode::Normalized)
    }

    #[must_use]
    pub const fn distance(value: f64) -> Self {
        Self::new(value, PositionMode::Distance)
    }

    #[must_use]
    pub const fn simple(value: f64) -> Self {
        Self::new(value, PositionMode::Simple)
    }

    /// Curve parameter this position refers to on `curve`.
    #[must_use]
    pub fn parameter(&self, curve: &Curve) -> f64 {
        match self.mode {
            PositionMode::Normalized => curve.param_from_normalized(self.value),
            PositionMode::Distance => curve.param_from_length(self.value),
            PositionMode::Simple => {
                if self.value.is_finite() {
                    self.value.rem_euclid(1.0)
                } else {
                    0.0
                }
            }
        }
    }

    /// Distance along `curve` to this position.
    #[must_use]
    pub fn length_on(&self, curve: &Curve) -> f64 {
        curve.length_at(self.parameter(curve))
    }
}

impl From<f64> for CurvePosition {
    fn from(value: f64) -> Self {
        Self::normalized(value)
    }
}
