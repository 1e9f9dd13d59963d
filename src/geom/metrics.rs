//! Opt-in per-phase timing for mesh extrusion.
//!
//! Timing is only collected when the `extrude_metrics` feature is enabled and
//! the target is not WASM (`std::time::Instant` is unavailable there). In every
//! other build the calls compile down to plain closure invocations.

use serde::Serialize;

/// Phases of one extrusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Sampling ring frames along the curve.
    RingSampling,
    /// Dropping redundant rings.
    Optimization,
    /// Overlap probing and segment re-aiming.
    Intersection,
    /// Writing ring vertices and end caps.
    Vertices,
    /// Snapping overlapping vertices together.
    VertexMerge,
    /// Building the index buffer.
    Triangulation,
}

/// Cumulative nanoseconds per phase.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExtrudeTimingReport {
    pub ring_sampling_ns: u64,
    pub optimization_ns: u64,
    pub intersection_ns: u64,
    pub vertices_ns: u64,
    pub vertex_merge_ns: u64,
    pub triangulation_ns: u64,
}

impl ExtrudeTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.ring_sampling_ns
            .saturating_add(self.optimization_ns)
            .saturating_add(self.intersection_ns)
            .saturating_add(self.vertices_ns)
            .saturating_add(self.vertex_merge_ns)
            .saturating_add(self.triangulation_ns)
    }

    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }
}

/// Accumulator handed through one extrusion.
///
/// [`end`](Self::end) returns `None` unless timing is compiled in.
#[derive(Debug, Default)]
pub struct ExtrudeMetrics {
    #[cfg(all(feature = "extrude_metrics", not(target_arch = "wasm32")))]
    report: ExtrudeTimingReport,
}

impl ExtrudeMetrics {
    pub fn begin(&mut self) {
        #[cfg(all(feature = "extrude_metrics", not(target_arch = "wasm32")))]
        {
            self.report = ExtrudeTimingReport::default();
        }
    }

    #[must_use]
    pub fn end(&self) -> Option<ExtrudeTimingReport> {
        #[cfg(all(feature = "extrude_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "extrude_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Runs `f`, adding its wall time to `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "extrude_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            self.add_to_bucket(bucket, nanos);
            result
        }

        #[cfg(not(all(feature = "extrude_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }

    #[cfg(all(feature = "extrude_metrics", not(target_arch = "wasm32")))]
    fn add_to_bucket(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = match bucket {
            TimingBucket::RingSampling => &mut self.report.ring_sampling_ns,
            TimingBucket::Optimization => &mut self.report.optimization_ns,
            TimingBucket::Intersection => &mut self.report.intersection_ns,
            TimingBucket::Vertices => &mut self.report.vertices_ns,
            TimingBucket::VertexMerge => &mut self.report.vertex_merge_ns,
            TimingBucket::Triangulation => &mut self.report.triangulation_ns,
        };
        *slot = slot.saturating_add(nanos);
    }
}

/// Wall-clock stopwatch for the whole rebuild; reads zero on WASM.
#[derive(Debug)]
pub(crate) struct Stopwatch {
    #[cfg(not(target_arch = "wasm32"))]
    start: std::time::Instant,
}

impl Stopwatch {
    pub(crate) fn start() -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            start: std::time::Instant::now(),
        }
    }

    pub(crate) fn elapsed_ms(&self) -> f64 {
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.start.elapsed().as_secs_f64() * 1000.0
        }
        #[cfg(target_arch = "wasm32")]
        {
            0.0
        }
    }
}
