//! Read-only statistics about the last extrusion.

use std::fmt;

use serde::Serialize;

use super::metrics::ExtrudeTimingReport;

/// Counts reported alongside every [`MeshBuildResult`](super::MeshBuildResult).
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ExtrudeDiagnostics {
    /// Swept intervals in the final mesh, end caps included.
    pub segments: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,

    /// Rings dropped by the optimization pass.
    pub rings_saved: usize,
    pub vertices_saved: usize,
    pub triangles_saved: usize,

    /// Rings found inside the profile bounds of an earlier ring.
    pub overlapping_rings: usize,

    /// Wall time of the last rebuild. Always `0` on WASM.
    pub rebuild_duration_ms: f64,

    /// Per-phase timing; only populated with the `extrude_metrics` feature on
    /// native targets.
    pub timing: Option<ExtrudeTimingReport>,

    pub warnings: Vec<String>,
}

impl ExtrudeDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// One-line summary for logs, e.g. `"S:40 V:328 T:640 saved:3"`.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "S:{} V:{} T:{}",
            self.segments, self.vertex_count, self.triangle_count
        )];

        if self.rings_saved > 0 {
            parts.push(format!("saved:{}", self.rings_saved));
        }
        if self.overlapping_rings > 0 {
            parts.push(format!("overlap:{}", self.overlapping_rings));
        }
        if !self.warnings.is_empty() {
            parts.push(format!("warnings:{}", self.warnings.len()));
        }

        parts.join(" ")
    }
}

impl fmt::Display for ExtrudeDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Extrude Diagnostics:")?;
        writeln!(f, "  Segments: {}", self.segments)?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;

        if self.rings_saved > 0 {
            writeln!(f, "  Optimization:")?;
            writeln!(f, "    - Rings saved: {}", self.rings_saved)?;
            writeln!(f, "    - Vertices saved: {}", self.vertices_saved)?;
            writeln!(f, "    - Triangles saved: {}", self.triangles_saved)?;
        }

        if self.overlapping_rings > 0 {
            writeln!(f, "  Overlapping rings: {}", self.overlapping_rings)?;
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {}", warning)?;
            }
        }

        writeln!(f, "  Rebuild: {:.3} ms", self.rebuild_duration_ms)?;
        if let Some(ref timing) = self.timing {
            writeln!(f, "  Timing: {} ms total", timing.total_ms())?;
        }

        Ok(())
    }
}
