//! Sweeping a profile along a curve.
//!
//! Extrusion samples rings (oriented frames) at a fixed arc-length spacing,
//! drops rings that add no visible detail, optionally probes for rings that
//! fold back into earlier ones, adds tapered end caps and finally stitches
//! neighbouring rings into quads, two triangles per profile edge.
//!
//! Overlap handling is a heuristic: the re-aiming and vertex snapping hide
//! most self-crossings on tight bends but are not an exact intersection
//! resolver.
//!
//! # Example
//!
//! ```ignore
//! use spline_extrude::geom::{Curve, ExtrudeOptions, ProfileShape, extrude_curve};
//!
//! let curve = Curve::new();
//! let profile = ProfileShape::circle(12, 0.25)?;
//! let (mesh, diagnostics) = extrude_curve(&curve, &profile, &ExtrudeOptions::default())?;
//! println!("{}", diagnostics.summary());
//! ```

use serde::{Deserialize, Serialize};

use super::core::{Quat, Rect2, Tolerance, Vec2, Vec3};
use super::diagnostics::ExtrudeDiagnostics;
use super::frame::OrientedFrame;
use super::listeners::CurveListener;
use super::mesh::{COLOR_CAP, COLOR_NEUTRAL, COLOR_OVERLAP, MeshBuildResult};
use super::metrics::{ExtrudeMetrics, Stopwatch, TimingBucket};
use super::profile::ProfileShape;
use super::spline::Curve;
use super::value::Vec2Provider;

/// Smallest ring spacing accepted.
pub const MIN_SPACING: f64 = 0.01;
/// Rings added at each end for non-flat endings.
pub const END_CAP_RINGS: usize = 10;

/// Twist differences are measured in degrees and scaled by this factor before
/// being compared with the optimization tolerance.
const TWIST_TOLERANCE_FACTOR: f64 = 0.005;
/// Extra bounds margin and probe tolerance used when snapping vertices.
const VERTEX_MERGE_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntersectionAvoidance {
    #[default]
    None,
    /// Re-aim the rings of an overlapping span away from its midpoint.
    SegmentBased,
    /// Snap overlapping profile vertices together.
    VertexBased,
    Both,
}

impl IntersectionAvoidance {
    #[must_use]
    pub fn is_segment_based(self) -> bool {
        matches!(self, Self::SegmentBased | Self::Both)
    }

    #[must_use]
    pub fn is_vertex_based(self) -> bool {
        matches!(self, Self::VertexBased | Self::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EndingStyle {
    #[default]
    Flat,
    /// Linear taper to a point.
    Pointy,
    /// Elliptical taper.
    Rounded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrudeOptions {
    /// Desired distance between rings; clamped to [`MIN_SPACING`].
    pub spacing: f64,
    pub optimize: bool,
    /// Position, scale and twist tolerance of the optimization pass.
    pub optimization_offset: f64,
    /// Ring offset in the ring's local XY plane, by normalized position.
    pub offset: Vec2Provider,
    /// Profile scale, by normalized position.
    pub scale: Vec2Provider,
    pub intersection_avoidance: IntersectionAvoidance,
    pub ending_style: EndingStyle,
    /// Color rings that overlap earlier rings.
    pub show_overlap: bool,
    /// Width over height of the texture mapped onto the mesh.
    pub texture_aspect: f64,
}

impl Default for ExtrudeOptions {
    fn default() -> Self {
        Self {
            spacing: 0.1,
            optimize: true,
            optimization_offset: 0.01,
            offset: Vec2Provider::Constant { value: Vec2::ZERO },
            scale: Vec2Provider::Constant { value: Vec2::ONE },
            intersection_avoidance: IntersectionAvoidance::None,
            ending_style: EndingStyle::Flat,
            show_overlap: false,
            texture_aspect: 1.0,
        }
    }
}

impl ExtrudeOptions {
    #[must_use]
    pub fn effective_spacing(&self) -> f64 {
        if self.spacing.is_finite() {
            self.spacing.max(MIN_SPACING)
        } else {
            Self::default().spacing
        }
    }

    #[must_use]
    pub fn effective_optimization_offset(&self) -> f64 {
        if self.optimization_offset.is_finite() {
            self.optimization_offset.max(0.0)
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn effective_texture_aspect(&self) -> f64 {
        if self.texture_aspect.is_finite() && self.texture_aspect > 0.0 {
            self.texture_aspect
        } else {
            1.0
        }
    }

    fn probes_overlap(&self) -> bool {
        self.show_overlap || self.intersection_avoidance != IntersectionAvoidance::None
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtrudeError {
    #[error("profile has no vertices")]
    EmptyProfile,
    #[error("curve needs at least two control points")]
    TooFewControlPoints,
    #[error("mesh has {0} vertices, more than a u32 index buffer can address")]
    TooManyVertices(usize),
    #[error("extruded mesh is invalid: {0}")]
    NonFiniteGeometry(String),
}

/// One sampled cross-section.
#[derive(Debug, Clone, Copy)]
struct Ring {
    frame: OrientedFrame,
    /// Normalized curve position the ring was sampled at.
    position: f64,
    color: [f32; 4],
}

/// Extrudes `profile` along `curve` in the curve's local space.
pub fn extrude_curve(
    curve: &Curve,
    profile: &ProfileShape,
    options: &ExtrudeOptions,
) -> Result<(MeshBuildResult, ExtrudeDiagnostics), ExtrudeError> {
    let watch = Stopwatch::start();
    let mut metrics = ExtrudeMetrics::default();
    metrics.begin();

    if profile.is_empty() {
        return Err(ExtrudeError::EmptyProfile);
    }
    if curve.control_point_count() < 2 {
        return Err(ExtrudeError::TooFewControlPoints);
    }
    let length = curve.length();
    if !length.is_finite() {
        return Err(ExtrudeError::NonFiniteGeometry(
            "curve length is not finite".to_string(),
        ));
    }

    let mut diagnostics = ExtrudeDiagnostics::new();
    let extrusion = Extrusion::new(curve, profile, options, &mut diagnostics);
    let sampled_segments = ((length / options.effective_spacing()).floor() as usize).max(1);

    let mut rings = metrics.time(TimingBucket::RingSampling, || {
        extrusion.sample_rings(sampled_segments)
    });

    if options.optimize {
        let saved = metrics.time(TimingBucket::Optimization, || {
            extrusion.optimize_rings(&mut rings)
        });
        diagnostics.rings_saved = saved;
        diagnostics.vertices_saved = profile.vertex_count() * saved;
        diagnostics.triangles_saved = profile.edges().len() * saved;
    }

    let overlap = if options.probes_overlap() {
        metrics.time(TimingBucket::Intersection, || {
            extrusion.resolve_overlaps(&mut rings, sampled_segments / 4)
        })
    } else {
        vec![0; rings.len()]
    };
    diagnostics.overlapping_rings = overlap.iter().sum();

    let cap_rings = match options.ending_style {
        EndingStyle::Flat => 0,
        EndingStyle::Pointy | EndingStyle::Rounded => END_CAP_RINGS,
    };
    let segments = rings.len() - 1 + 2 * cap_rings;
    let vertex_count = profile.vertex_count() * (segments + 1);
    if u32::try_from(vertex_count).is_err() {
        return Err(ExtrudeError::TooManyVertices(vertex_count));
    }

    let mut mesh = metrics.time(TimingBucket::Vertices, || {
        let mut mesh = MeshBuildResult::with_vertex_count(
            vertex_count,
            profile.edges().len() * segments * 3,
        );
        extrusion.write_rings(&mut mesh, &rings, cap_rings);
        if cap_rings > 0 {
            extrusion.write_start_cap(&mut mesh, &rings, cap_rings);
            extrusion.write_end_cap(&mut mesh, &rings, cap_rings);
        }
        mesh
    });

    if options.intersection_avoidance.is_vertex_based() {
        metrics.time(TimingBucket::VertexMerge, || {
            extrusion.merge_overlapping_vertices(&mut mesh, &rings, &overlap, cap_rings);
        });
    }

    metrics.time(TimingBucket::Triangulation, || {
        triangulate(&mut mesh, profile, segments);
    });

    mesh.validate().map_err(ExtrudeError::NonFiniteGeometry)?;

    diagnostics.segments = segments;
    diagnostics.vertex_count = mesh.vertex_count();
    diagnostics.triangle_count = mesh.triangle_count();
    diagnostics.timing = metrics.end();
    diagnostics.rebuild_duration_ms = watch.elapsed_ms();

    Ok((mesh, diagnostics))
}

/// Shared inputs of one extrusion.
struct Extrusion<'a> {
    curve: &'a Curve,
    profile: &'a ProfileShape,
    options: &'a ExtrudeOptions,
    bounds: Rect2,
    /// Curve length over profile perimeter, times texture aspect: converts a
    /// normalized position to `v`.
    v_per_position: f64,
    /// Converts a local distance to a `v` offset.
    v_per_unit: f64,
}

impl<'a> Extrusion<'a> {
    fn new(
        curve: &'a Curve,
        profile: &'a ProfileShape,
        options: &'a ExtrudeOptions,
        diagnostics: &mut ExtrudeDiagnostics,
    ) -> Self {
        let mut u_span = profile.u_span();
        if u_span <= Tolerance::ZERO_LENGTH.eps {
            diagnostics.add_warning("profile has no edge length; texture v uses unit span");
            u_span = 1.0;
        }
        if profile.edge_count() == 0 {
            diagnostics.add_warning("profile has no edges; mesh has no triangles");
        }
        let aspect = options.effective_texture_aspect();

        Self {
            curve,
            profile,
            options,
            bounds: profile.bounds(),
            v_per_position: curve.length() / u_span * aspect,
            v_per_unit: aspect / u_span,
        }
    }

    fn scale_at(&self, position: f64) -> Vec2 {
        self.options.scale.evaluate(position)
    }

    fn sample_rings(&self, segments: usize) -> Vec<Ring> {
        (0..=segments)
            .map(|i| {
                let position = i as f64 / segments as f64;
                let mut frame = self
                    .curve
                    .local_frame(self.curve.param_from_normalized(position));
                let offset = self.options.offset.evaluate(position);
                frame.position = frame.position + frame.rotation.rotate(offset.extend(0.0));
                Ring {
                    frame,
                    position,
                    color: COLOR_NEUTRAL,
                }
            })
            .collect()
    }

    /// Drops rings that sit on the axis of the last kept ring with the same
    /// scale and twist. The last ring is always kept. Returns the number of
    /// rings removed.
    fn optimize_rings(&self, rings: &mut Vec<Ring>) -> usize {
        let tolerance = self.options.effective_optimization_offset();
        let mut removable = Vec::new();
        let mut kept = 0;

        for i in 0..rings.len().saturating_sub(1) {
            let reference = rings[kept];
            let ring = rings[i];

            let local = reference.frame.world_to_local(ring.frame.position);
            let on_axis = local.x.abs() < tolerance && local.y.abs() < tolerance;
            let same_scale = self
                .scale_at(reference.position)
                .distance_to(self.scale_at(ring.position))
                < tolerance;
            let same_twist = twist_degrees(reference.frame.rotation, ring.frame.rotation)
                * TWIST_TOLERANCE_FACTOR
                < tolerance;

            if on_axis && same_scale && same_twist {
                removable.push(i);
            } else {
                kept = i;
            }
        }

        // The first candidate is the reference ring itself.
        let mut keep = vec![true; rings.len()];
        for &i in removable.iter().skip(1) {
            keep[i] = false;
        }
        let mut index = 0;
        rings.retain(|_| {
            let k = keep[index];
            index += 1;
            k
        });

        removable.len().saturating_sub(1)
    }

    /// Counts rings after `index` whose copy of `local_position` lands behind
    /// ring `index` and inside its scaled profile bounds. Up to `ignores`
    /// misses are skipped over; a miss followed by a hit counts as overlap.
    fn count_overlaps(
        &self,
        rings: &[Ring],
        local_position: Vec2,
        bounds: Rect2,
        index: usize,
        mut ignores: usize,
        tolerance: f64,
    ) -> usize {
        let origin = rings[index];
        let probe = bounds
            .expand_by(tolerance)
            .scaled(self.scale_at(origin.position));

        let mut count = 0;
        let mut jumps = 0;
        for ring in &rings[index + 1..] {
            let world = ring
                .frame
                .local_to_world(local_position.scale(self.scale_at(ring.position)).extend(0.0));
            let local = origin.frame.world_to_local(world);

            if local.z < tolerance && probe.contains(local.truncate()) {
                count += 1 + jumps;
                jumps = 0;
            } else if ignores == 0 {
                return count;
            } else {
                jumps += 1;
                ignores -= 1;
            }
        }
        count
    }

    /// Probes every ring for later rings folding back into it. Returns the
    /// overlap count per ring; rings inside a span are skipped.
    fn resolve_overlaps(&self, rings: &mut [Ring], ignores: usize) -> Vec<usize> {
        let mut overlap = vec![0; rings.len()];
        let mut i = 0;

        while i < rings.len() {
            let mut corner = self.bounds.min;
            let mut count = self.count_overlaps(rings, corner, self.bounds, i, ignores, 0.0);
            if count == 0 {
                corner = self.bounds.max;
                count = self.count_overlaps(rings, corner, self.bounds, i, ignores, 0.0);
            }
            overlap[i] = count;

            if count > 0 {
                let last = (i + count).min(rings.len() - 1);
                if self.options.show_overlap {
                    for ring in &mut rings[i..=last] {
                        ring.color = COLOR_OVERLAP;
                    }
                }
                if self.options.intersection_avoidance.is_segment_based() {
                    self.reaim_span(&mut rings[i..=last], corner.x);
                }
                i += count;
            }
            i += 1;
        }

        overlap
    }

    /// Turns every ring of `span` so it faces away from the span's midpoint on
    /// the side of the probed corner.
    fn reaim_span(&self, span: &mut [Ring], corner_x: f64) {
        let (Some(&first), Some(&last)) = (span.first(), span.last()) else {
            return;
        };
        let local = Vec3::new(corner_x, 0.0, 0.0);
        let p1 = first
            .frame
            .local_to_world(local * self.scale_at(first.position).x);
        let p2 = last
            .frame
            .local_to_world(local * self.scale_at(last.position).x);
        let middle = p1.lerp(p2, 0.5);

        for ring in span {
            let up = ring.frame.up();
            let side = if corner_x <= 0.0 {
                ring.frame.position - middle
            } else {
                middle - ring.frame.position
            };
            if let Some(rotation) = Quat::look_rotation(side.cross(up), up) {
                ring.frame.rotation = rotation;
            }
        }
    }

    fn write_rings(&self, mesh: &mut MeshBuildResult, rings: &[Ring], cap_rings: usize) {
        let vertices = self.profile.vertices();
        let last = rings.len() - 1;

        for (i, ring) in rings.iter().enumerate() {
            let base = (cap_rings + i) * vertices.len();
            // A closed tube reuses the first ring's scale at the seam.
            let scale = if self.curve.is_looped() && i == last {
                self.scale_at(0.0)
            } else {
                self.scale_at(ring.position)
            };
            let v = ring.position * self.v_per_position;

            for (j, vertex) in vertices.iter().enumerate() {
                let id = base + j;
                mesh.positions[id] = ring
                    .frame
                    .local_to_world(vertex.position.scale(scale).extend(0.0))
                    .to_array();
                mesh.normals[id] = ring
                    .frame
                    .local_to_world_direction(vertex.normal.extend(0.0))
                    .to_array();
                mesh.uvs[id] = [vertex.u, v];
                mesh.colors[id] = ring.color;
            }
        }
    }

    /// Tapers from a point behind the first ring up to the first ring's scale.
    fn write_start_cap(&self, mesh: &mut MeshBuildResult, rings: &[Ring], cap_rings: usize) {
        let Some(start) = rings.first() else {
            return;
        };
        let vertices = self.profile.vertices();
        let scale = self.scale_at(0.0);

        for i in 0..cap_rings {
            let n = i as f64 / cap_rings as f64;
            let (offset, taper) = match self.options.ending_style {
                EndingStyle::Pointy => (-scale + scale * n, Vec2::ZERO.lerp(scale, n)),
                EndingStyle::Rounded => {
                    let offset = -scale + scale * (n * n);
                    let taper = Vec2::new(
                        elliptic_extent(scale.x, offset.x),
                        elliptic_extent(scale.y, offset.y),
                    );
                    (offset, taper)
                }
                EndingStyle::Flat => (Vec2::ZERO, scale),
            };
            let z = offset.x + (offset.y - offset.x) * 0.5;
            let v = offset.x * self.v_per_unit;

            for (j, vertex) in vertices.iter().enumerate() {
                let id = i * vertices.len() + j;
                let local = Vec3::new(vertex.position.x * taper.x, vertex.position.y * taper.y, z);
                mesh.positions[id] = start.frame.local_to_world(local).to_array();
                mesh.normals[id] = start
                    .frame
                    .local_to_world_direction(vertex.normal.extend(0.0))
                    .to_array();
                mesh.uvs[id] = [vertex.u, v];
                mesh.colors[id] = COLOR_CAP;
            }
        }
    }

    /// Closes the mesh past the last ring. The cap radius is half the scaled
    /// profile width; each vertex is pushed forward in proportion to its
    /// distance from the profile centre.
    fn write_end_cap(&self, mesh: &mut MeshBuildResult, rings: &[Ring], cap_rings: usize) {
        let Some(end) = rings.last() else {
            return;
        };
        let vertices = self.profile.vertices();
        let scale = self.scale_at(1.0);
        let radius = self.bounds.width() * scale.x * 0.5;
        let v_end = end.position * self.v_per_position;
        let reach = vertices
            .iter()
            .map(|v| v.position.length())
            .fold(0.0_f64, f64::max);
        let first_ring = cap_rings + rings.len() - 1;

        for i in 1..=cap_rings {
            let n = 1.0 - i as f64 / cap_rings as f64;
            let (along, taper) = match self.options.ending_style {
                EndingStyle::Pointy => (1.0 - n, n),
                EndingStyle::Rounded => {
                    let along = 1.0 - n * n;
                    (along, elliptic_extent(1.0, along))
                }
                EndingStyle::Flat => (0.0, 1.0),
            };
            let offset = along * radius;
            let v = v_end + offset * self.v_per_unit;

            for (j, vertex) in vertices.iter().enumerate() {
                let id = (first_ring + i) * vertices.len() + j;
                let push = if reach > Tolerance::ZERO_LENGTH.eps {
                    vertex.position.length() / reach
                } else {
                    1.0
                };
                let xy = vertex.position.scale(scale) * taper;
                let local = Vec3::new(xy.x, xy.y, offset * push);
                mesh.positions[id] = end.frame.local_to_world(local).to_array();
                mesh.normals[id] = end
                    .frame
                    .local_to_world_direction(vertex.normal.extend(0.0))
                    .to_array();
                mesh.uvs[id] = [vertex.u, v];
                mesh.colors[id] = COLOR_CAP;
            }
        }
    }

    /// Within every overlapping span, moves the copies of each profile vertex
    /// that fold back onto the midpoint between the span's first and last copy.
    fn merge_overlapping_vertices(
        &self,
        mesh: &mut MeshBuildResult,
        rings: &[Ring],
        overlap: &[usize],
        cap_rings: usize,
    ) {
        let vertices = self.profile.vertices();
        let bounds = self.bounds.expand_by(VERTEX_MERGE_TOLERANCE);
        let last = rings.len() - 1;

        for (i, &span) in overlap.iter().enumerate() {
            if span == 0 {
                continue;
            }
            let end = (i + span).min(last);

            for (j, vertex) in vertices.iter().enumerate() {
                let count = self.count_overlaps(
                    rings,
                    vertex.position,
                    bounds,
                    i,
                    span,
                    VERTEX_MERGE_TOLERANCE,
                );
                if count == 0 {
                    continue;
                }

                let p1 = rings[i]
                    .frame
                    .local_to_world(vertex.position.scale(self.scale_at(rings[i].position)).extend(0.0));
                let p2 = rings[end]
                    .frame
                    .local_to_world(vertex.position.scale(self.scale_at(rings[end].position)).extend(0.0));
                let middle = p1.lerp(p2, 0.5).to_array();

                for k in i.saturating_sub(1)..=(i + count).min(last) {
                    mesh.positions[(cap_rings + k) * vertices.len() + j] = middle;
                }
            }
        }
    }
}

/// Emits two triangles per profile edge for every interval between rings.
fn triangulate(mesh: &mut MeshBuildResult, profile: &ProfileShape, segments: usize) {
    // Vertex count was checked against u32 by the caller.
    let ring = profile.vertex_count() as u32;
    for i in 0..segments as u32 {
        let base = i * ring;
        for (a, b) in profile.edge_pairs() {
            let next_a = base + a + ring;
            let this_a = base + a;
            let this_b = base + b;
            let next_b = base + b + ring;
            mesh.indices
                .extend_from_slice(&[next_a, this_a, this_b, this_b, next_b, next_a]);
        }
    }
}

/// Half-chord of an ellipse-like cap at `offset` from its centre; `0` where
/// the offset exceeds the radius.
fn elliptic_extent(radius: f64, offset: f64) -> f64 {
    let extent = (radius * radius - offset * offset).sqrt();
    if extent.is_nan() { 0.0 } else { extent }
}

/// Smallest roll, in degrees, that turns `a` into `b` about `a`'s forward axis.
fn twist_degrees(a: Quat, b: Quat) -> f64 {
    let roll = (a.inverse() * b).roll_degrees();
    roll.min(360.0 - roll)
}

/// Keeps the last successful extrusion of a profile along a curve.
///
/// Subscribe it to a curve (wrapped in `Rc<RefCell<_>>`) to rebuild on every
/// edit. A failed rebuild leaves the previous mesh and diagnostics in place.
#[derive(Debug, Clone, Default)]
pub struct MeshExtruder {
    profile: ProfileShape,
    options: ExtrudeOptions,
    mesh: Option<MeshBuildResult>,
    diagnostics: ExtrudeDiagnostics,
    rebuilds: usize,
}

impl MeshExtruder {
    #[must_use]
    pub fn new(profile: ProfileShape, options: ExtrudeOptions) -> Self {
        Self {
            profile,
            options,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn profile(&self) -> &ProfileShape {
        &self.profile
    }

    #[must_use]
    pub fn options(&self) -> &ExtrudeOptions {
        &self.options
    }

    pub fn set_profile(&mut self, profile: ProfileShape) {
        self.profile = profile;
    }

    pub fn set_options(&mut self, options: ExtrudeOptions) {
        self.options = options;
    }

    #[must_use]
    pub fn mesh(&self) -> Option<&MeshBuildResult> {
        self.mesh.as_ref()
    }

    #[must_use]
    pub fn diagnostics(&self) -> &ExtrudeDiagnostics {
        &self.diagnostics
    }

    /// Number of successful rebuilds so far.
    #[must_use]
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    pub fn rebuild(&mut self, curve: &Curve) -> Result<(), ExtrudeError> {
        match extrude_curve(curve, &self.profile, &self.options) {
            Ok((mesh, diagnostics)) => {
                log::debug!("extrude rebuild: {}", diagnostics.summary());
                self.mesh = Some(mesh);
                self.diagnostics = diagnostics;
                self.rebuilds += 1;
                Ok(())
            }
            Err(err) => {
                log::warn!("extrude rebuild skipped, keeping previous mesh: {err}");
                Err(err)
            }
        }
    }
}

impl CurveListener for MeshExtruder {
    fn curve_changed(&mut self, curve: &Curve) {
        // Failures are logged by `rebuild` and the previous mesh stays.
        let _ = self.rebuild(curve);
    }
}
