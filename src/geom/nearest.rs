//! Approximate nearest-point search along a curve.
//!
//! A coarse scan over evenly spaced arc-length positions picks the closest
//! sample, then a fixed number of bisection rounds narrows a bracket around
//! it. The search is a bounded heuristic: it never does worse than the coarse
//! scan but can settle on a local minimum when the curve passes close to the
//! target more than once.

use super::core::{Point3, Vec2};
use super::spline::Curve;

/// Scan density and refinement rounds used when callers have no preference.
pub const DEFAULT_NEAREST_ITERATIONS: usize = 10;

/// Curve parameter minimising `distance` over world-space curve points.
///
/// `iterations` controls both the coarse density (`iterations` samples per
/// segment) and the number of refinement rounds.
pub fn nearest_parameter(curve: &Curve, iterations: usize, distance: impl Fn(Point3) -> f64) -> f64 {
    let iterations = iterations.max(1);
    let steps = iterations * curve.segment_count().max(1);
    let step = 1.0 / steps as f64;

    let wrap = |n: f64| {
        if curve.is_looped() {
            n.rem_euclid(1.0)
        } else {
            n.clamp(0.0, 1.0)
        }
    };
    let measure = |n: f64| distance(curve.world_point(curve.param_from_normalized(wrap(n))));

    let mut best = 0.0;
    let mut best_distance = measure(0.0);
    for i in 1..=steps {
        let n = i as f64 * step;
        let d = measure(n);
        if d < best_distance {
            best_distance = d;
            best = n;
        }
    }

    let mut low = best - step;
    let mut high = best + step;
    for _ in 0..iterations {
        let half = (high - low) * 0.5;
        if measure(low) < measure(high) {
            high -= half;
        } else {
            low += half;
        }
    }

    let (low_distance, high_distance) = (measure(low), measure(high));
    let (refined, refined_distance) = if low_distance < high_distance {
        (low, low_distance)
    } else {
        (high, high_distance)
    };

    let answer = if refined_distance <= best_distance { refined } else { best };
    curve.param_from_normalized(wrap(answer))
}

/// Parameter of the curve point closest to `target` in world space.
pub fn nearest_point(curve: &Curve, target: Point3, iterations: usize) -> f64 {
    nearest_parameter(curve, iterations, |p| p.distance_to(target))
}

/// Parameter of the curve point whose screen projection is closest to
/// `screen`. `projector` maps world points to screen coordinates.
pub fn nearest_point_to_screen(
    curve: &Curve,
    screen: Vec2,
    iterations: usize,
    projector: impl Fn(Point3) -> Vec2,
) -> f64 {
    nearest_parameter(curve, iterations, |p| projector(p).distance_to(screen))
}
