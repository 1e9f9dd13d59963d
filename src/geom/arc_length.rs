//! Cumulative arc-length table used to convert between a curve's parametric
//! position and travelled distance.
//!
//! The table stores `N + 1` cumulative distances for the uniform parameters
//! `t = i / N`, `i = 0..=N`, so the first entry is always `0` and the last one
//! is the full length of the sampled curve.

use serde::{Deserialize, Serialize};

use super::core::Point3;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArcLengthTable {
    samples: Vec<f64>,
}

impl ArcLengthTable {
    /// Samples `point_at` at `length_samples * segment_count` uniform steps
    /// over `[0, 1]` and accumulates the chord lengths.
    #[must_use]
    pub fn generate(
        mut point_at: impl FnMut(f64) -> Point3,
        segment_count: usize,
        length_samples: usize,
    ) -> Self {
        let steps = sample_count(segment_count, length_samples);
        let mut samples = Vec::with_capacity(steps + 1);
        let mut previous = point_at(0.0);
        let mut total = 0.0;
        samples.push(total);

        for i in 1..=steps {
            let point = point_at(i as f64 / steps as f64);
            let step_length = (point - previous).length();
            if step_length.is_finite() {
                total += step_length;
            }
            samples.push(total);
            previous = point;
        }

        Self { samples }
    }

    /// Wraps previously generated samples without checking them; see
    /// [`ArcLengthTable::is_valid_for`].
    #[must_use]
    pub fn from_samples(samples: Vec<f64>) -> Self {
        Self { samples }
    }

    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total length: the last entry, or `0` for an empty table.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.samples.last().copied().unwrap_or(0.0)
    }

    /// Distance travelled at parameter `t`, linearly interpolated.
    /// Parameters outside `[0, 1]` return the boundary entries.
    #[must_use]
    pub fn sample(&self, t: f64) -> f64 {
        let count = self.samples.len();
        match count {
            0 => return 0.0,
            1 => return self.samples[0],
            _ => {}
        }

        let f = t * (count - 1) as f64;
        if !f.is_finite() || f < 0.0 {
            return self.samples[0];
        }
        let lower = f.floor() as usize;
        if lower + 1 >= count {
            return self.samples[count - 1];
        }

        let a = self.samples[lower];
        let b = self.samples[lower + 1];
        a + (b - a) * (f - lower as f64)
    }

    /// Parameter at which the travelled distance equals `length`.
    ///
    /// Binary search for the bracketing pair followed by linear interpolation.
    /// Tables with fewer than two entries always answer `0`.
    #[must_use]
    pub fn inverse_sample(&self, length: f64) -> f64 {
        let count = self.samples.len();
        if count < 2 || length.is_nan() {
            return 0.0;
        }

        let step = 1.0 / (count - 1) as f64;
        let upper = self.samples.partition_point(|&s| s < length).min(count - 1);
        let lower = upper.saturating_sub(1);

        let low_value = self.samples[lower];
        let span = self.samples[upper] - low_value;
        if span <= 0.0 {
            return step * lower as f64;
        }

        let share = ((length - low_value) / span).clamp(0.0, 1.0);
        step * lower as f64 + step * share
    }

    /// Entries never decrease.
    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        self.samples.windows(2).all(|w| w[0] <= w[1])
    }

    /// True when the table has the shape `generate` would produce for the
    /// given counts: right entry count, starts at zero, non-decreasing.
    #[must_use]
    pub fn is_valid_for(&self, segment_count: usize, length_samples: usize) -> bool {
        self.samples.len() == sample_count(segment_count, length_samples) + 1
            && self.samples.first().is_some_and(|&first| first == 0.0)
            && self.samples.iter().all(|s| s.is_finite())
            && self.is_monotonic()
    }
}

fn sample_count(segment_count: usize, length_samples: usize) -> usize {
    length_samples.max(1) * segment_count.max(1)
}
