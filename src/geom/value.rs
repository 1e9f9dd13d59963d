//! Position-dependent 2D values used for ring offset and scale.
//!
//! A [`Vec2Provider`] is evaluated at a normalized curve position `t` in
//! `[0, 1]`. Random variants draw from a generator seeded with both the
//! provider seed and `t`, so the same provider always yields the same value at
//! the same position and rebuilding a mesh does not make it flicker.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::core::Vec2;

/// One key of a [`Keyframes`] curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub value: f64,
}

/// Piecewise-linear scalar curve. Keys are kept sorted by time; evaluation
/// outside the key range holds the first or last value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct Keyframes {
    keys: Vec<Keyframe>,
}

impl Keyframes {
    #[must_use]
    pub fn new(keys: impl IntoIterator<Item = Keyframe>) -> Self {
        let mut keys: Vec<Keyframe> = keys
            .into_iter()
            .filter(|k| k.time.is_finite() && k.value.is_finite())
            .collect();
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new([Keyframe { time: 0.0, value }])
    }

    /// Straight ramp from `start` at `t = 0` to `end` at `t = 1`.
    #[must_use]
    pub fn linear(start: f64, end: f64) -> Self {
        Self::new([
            Keyframe { time: 0.0, value: start },
            Keyframe { time: 1.0, value: end },
        ])
    }

    #[must_use]
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Value at `time`; an empty curve evaluates to `0`.
    #[must_use]
    pub fn evaluate(&self, time: f64) -> f64 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if time <= first.time || time.is_nan() {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        let upper = self.keys.partition_point(|k| k.time <= time);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let span = b.time - a.time;
        if span <= 0.0 {
            return b.value;
        }
        a.value + (b.value - a.value) * ((time - a.time) / span)
    }
}

impl From<Vec<Keyframe>> for Keyframes {
    fn from(keys: Vec<Keyframe>) -> Self {
        Self::new(keys)
    }
}

impl From<Keyframes> for Vec<Keyframe> {
    fn from(curve: Keyframes) -> Self {
        curve.keys
    }
}

/// Closed set of strategies for producing a 2D value along a curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Vec2Provider {
    /// The same vector everywhere.
    Constant { value: Vec2 },
    /// The same scalar on both axes.
    Scalar { value: f64 },
    /// Each axis drawn independently between `min` and `max`.
    RandomBetween { min: Vec2, max: Vec2, seed: u64 },
    /// One draw between `min` and `max`, used on both axes.
    RandomBetweenScalars { min: f64, max: f64, seed: u64 },
    /// One keyframe curve per axis.
    Curve { x: Keyframes, y: Keyframes },
    /// One keyframe curve used on both axes.
    ScalarCurve { curve: Keyframes },
    /// Each axis drawn between two keyframe curves evaluated at `t`.
    RandomBetweenCurves {
        min_x: Keyframes,
        min_y: Keyframes,
        max_x: Keyframes,
        max_y: Keyframes,
        seed: u64,
    },
}

impl Default for Vec2Provider {
    fn default() -> Self {
        Self::Constant { value: Vec2::ZERO }
    }
}

impl From<Vec2> for Vec2Provider {
    fn from(value: Vec2) -> Self {
        Self::Constant { value }
    }
}

impl From<f64> for Vec2Provider {
    fn from(value: f64) -> Self {
        Self::Scalar { value }
    }
}

impl Vec2Provider {
    #[must_use]
    pub fn constant(x: f64, y: f64) -> Self {
        Self::Constant { value: Vec2::new(x, y) }
    }

    #[must_use]
    pub fn evaluate(&self, t: f64) -> Vec2 {
        match self {
            Self::Constant { value } => *value,
            Self::Scalar { value } => Vec2::splat(*value),
            Self::RandomBetween { min, max, seed } => {
                let mut rng = seeded_rng(*seed, t);
                Vec2::new(draw(&mut rng, min.x, max.x), draw(&mut rng, min.y, max.y))
            }
            Self::RandomBetweenScalars { min, max, seed } => {
                let mut rng = seeded_rng(*seed, t);
                Vec2::splat(draw(&mut rng, *min, *max))
            }
            Self::Curve { x, y } => Vec2::new(x.evaluate(t), y.evaluate(t)),
            Self::ScalarCurve { curve } => Vec2::splat(curve.evaluate(t)),
            Self::RandomBetweenCurves {
                min_x,
                min_y,
                max_x,
                max_y,
                seed,
            } => {
                let mut rng = seeded_rng(*seed, t);
                Vec2::new(
                    draw(&mut rng, min_x.evaluate(t), max_x.evaluate(t)),
                    draw(&mut rng, min_y.evaluate(t), max_y.evaluate(t)),
                )
            }
        }
    }

    /// True when every position evaluates to the same value.
    #[must_use]
    pub fn is_uniform(&self) -> bool {
        matches!(self, Self::Constant { .. } | Self::Scalar { .. })
    }
}

fn seeded_rng(seed: u64, t: f64) -> StdRng {
    let position = if t == 0.0 { 0u64 } else { t.to_bits() };
    StdRng::seed_from_u64(seed ^ position.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Uniform draw in the closed range spanned by `a` and `b`, in either order.
fn draw(rng: &mut StdRng, a: f64, b: f64) -> f64 {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    if high <= low || !low.is_finite() || !high.is_finite() {
        return low;
    }
    rng.random_range(low..=high)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyframes_interpolate_and_hold() {
        let curve = Keyframes::new([
            Keyframe { time: 1.0, value: 0.0 },
            Keyframe { time: 0.0, value: 2.0 },
            Keyframe { time: 0.5, value: 1.0 },
        ]);
        assert_eq!(curve.keys()[0].time, 0.0);
        assert!((curve.evaluate(0.25) - 1.5).abs() < 1e-12);
        assert!((curve.evaluate(0.75) - 0.5).abs() < 1e-12);
        assert_eq!(curve.evaluate(-1.0), 2.0);
        assert_eq!(curve.evaluate(3.0), 0.0);
        assert_eq!(Keyframes::default().evaluate(0.5), 0.0);
    }

    #[test]
    fn test_constant_and_scalar() {
        assert_eq!(Vec2Provider::constant(1.0, 2.0).evaluate(0.3), Vec2::new(1.0, 2.0));
        assert_eq!(Vec2Provider::from(0.5).evaluate(0.9), Vec2::new(0.5, 0.5));
        assert_eq!(Vec2Provider::default().evaluate(0.1), Vec2::ZERO);
    }

    #[test]
    fn test_random_is_deterministic_and_bounded() {
        let provider = Vec2Provider::RandomBetween {
            min: Vec2::new(-1.0, 2.0),
            max: Vec2::new(1.0, 3.0),
            seed: 7,
        };
        for i in 0..50 {
            let t = i as f64 / 49.0;
            let a = provider.evaluate(t);
            assert_eq!(a, provider.evaluate(t));
            assert!((-1.0..=1.0).contains(&a.x));
            assert!((2.0..=3.0).contains(&a.y));
        }
    }

    #[test]
    fn test_random_scalars_share_axes() {
        let provider = Vec2Provider::RandomBetweenScalars {
            min: 0.5,
            max: 0.25,
            seed: 3,
        };
        let v = provider.evaluate(0.4);
        assert_eq!(v.x, v.y);
        assert!((0.25..=0.5).contains(&v.x));
    }

    #[test]
    fn test_random_between_curves_follows_bounds() {
        let provider = Vec2Provider::RandomBetweenCurves {
            min_x: Keyframes::constant(1.0),
            min_y: Keyframes::linear(0.0, 1.0),
            max_x: Keyframes::constant(1.0),
            max_y: Keyframes::linear(0.0, 1.0),
            seed: 11,
        };
        let v = provider.evaluate(0.5);
        assert_eq!(v.x, 1.0);
        assert!((v.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_provider_json_layout() {
        let provider: Vec2Provider =
            serde_json::from_str(r#"{"type":"scalar_curve","curve":[{"time":0.0,"value":1.0},{"time":1.0,"value":0.0}]}"#)
                .unwrap();
        assert!((provider.evaluate(0.5).x - 0.5).abs() < 1e-12);

        let json = serde_json::to_string(&Vec2Provider::constant(1.0, 1.0)).unwrap();
        assert_eq!(json, r#"{"type":"constant","value":[1.0,1.0]}"#);
    }
}
