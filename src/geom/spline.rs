//! Piecewise cubic Bezier curve with oriented control points.
//!
//! Control points, tangent handles and continuity modes are stored as parallel
//! sequences (`handles.len() == 2 * (control_points.len() - 1)`). Segment `i`
//! runs from control point `i` through handles `2i` and `2i + 1` to control
//! point `i + 1`. A looping curve repeats its first control point at the end,
//! so the closing segment is an ordinary segment.
//!
//! Every mutation re-applies continuity constraints, regenerates the arc-length
//! table and notifies the subscribed listeners before returning.

use std::cell::RefCell;
use std::rc::Rc;

use super::arc_length::ArcLengthTable;
use super::bezier::CubicBezier3;
use super::constraint::{self, ContinuityMode, HandleLayout};
use super::core::{Point3, Quat, Tolerance, Vec2, Vec3};
use super::frame::OrientedFrame;
use super::listeners::{CurveListener, ListenerId, ListenerRegistry};
use super::nearest;

/// Length samples per segment for new curves.
pub const DEFAULT_LENGTH_SAMPLES: usize = 100;

/// Distance used when extrapolating past the end of a curve with no usable
/// neighbour spacing.
const DEFAULT_EXTRAPOLATION_DISTANCE: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CurveError {
    #[error("index {index} is out of range (len {len})")]
    InvalidIndex { index: usize, len: usize },
    #[error("curve would be left with too few control points")]
    TooFewControlPoints,
    #[error("expected {expected} tangent handles, found {found}")]
    HandleCountMismatch { expected: usize, found: usize },
    #[error("expected {expected} continuity modes, found {found}")]
    ModeCountMismatch { expected: usize, found: usize },
}

/// Side of the reference control point a new point is inserted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertPosition {
    Before,
    #[default]
    After,
}

#[derive(Debug, Clone)]
pub struct Curve {
    control_points: Vec<OrientedFrame>,
    handles: Vec<Point3>,
    modes: Vec<ContinuityMode>,
    looped: bool,
    length_samples: usize,
    placement: OrientedFrame,
    arc_lengths: ArcLengthTable,
    listeners: ListenerRegistry,
}

impl Default for Curve {
    fn default() -> Self {
        Self::new()
    }
}

impl Curve {
    /// Two free control points at `(0,0,0)` and `(0,0,3)` with handles at
    /// `(0,0,1)` and `(0,0,2)`.
    #[must_use]
    pub fn new() -> Self {
        let mut curve = Self {
            control_points: vec![
                OrientedFrame::at(Point3::new(0.0, 0.0, 0.0)),
                OrientedFrame::at(Point3::new(0.0, 0.0, 3.0)),
            ],
            handles: vec![Point3::new(0.0, 0.0, 1.0), Point3::new(0.0, 0.0, 2.0)],
            modes: vec![ContinuityMode::Free; 2],
            looped: false,
            length_samples: DEFAULT_LENGTH_SAMPLES,
            placement: OrientedFrame::IDENTITY,
            arc_lengths: ArcLengthTable::default(),
            listeners: ListenerRegistry::new(),
        };
        curve.regenerate_arc_lengths();
        curve
    }

    /// Builds a curve from raw parallel sequences. Looping curves get their
    /// last control point forced onto the first.
    pub fn from_points(
        control_points: Vec<OrientedFrame>,
        handles: Vec<Point3>,
        modes: Vec<ContinuityMode>,
        looped: bool,
    ) -> Result<Self, CurveError> {
        validate_layout(&control_points, &handles, &modes)?;

        let mut curve = Self {
            control_points,
            handles,
            modes,
            looped,
            length_samples: DEFAULT_LENGTH_SAMPLES,
            placement: OrientedFrame::IDENTITY,
            arc_lengths: ArcLengthTable::default(),
            listeners: ListenerRegistry::new(),
        };
        if looped {
            curve.enforce_loop();
        }
        curve.regenerate_arc_lengths();
        Ok(curve)
    }

    /// Convenience constructor for a curve through `positions` whose handles
    /// sit at the thirds of every chord.
    pub fn through_points(positions: &[Point3], looped: bool) -> Result<Self, CurveError> {
        if positions.len() < 2 {
            return Err(CurveError::TooFewControlPoints);
        }

        let mut handles = Vec::with_capacity(2 * (positions.len() - 1));
        for pair in positions.windows(2) {
            handles.push(pair[0].lerp(pair[1], 1.0 / 3.0));
            handles.push(pair[0].lerp(pair[1], 2.0 / 3.0));
        }

        let control_points = positions
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                let towards = positions
                    .get(i + 1)
                    .map(|&next| next - position)
                    .unwrap_or_else(|| position - positions[i - 1]);
                let rotation = Quat::look_rotation(towards, Vec3::Y).unwrap_or(Quat::IDENTITY);
                OrientedFrame::new(position, rotation)
            })
            .collect();

        Self::from_points(
            control_points,
            handles,
            vec![ContinuityMode::Free; positions.len()],
            looped,
        )
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    #[must_use]
    pub fn control_point(&self, index: usize) -> OrientedFrame {
        self.control_points[index]
    }

    #[must_use]
    pub fn control_point_mode(&self, index: usize) -> ContinuityMode {
        self.modes[index]
    }

    #[must_use]
    pub fn tangent_handle(&self, index: usize) -> Point3 {
        self.handles[index]
    }

    #[must_use]
    pub fn control_points(&self) -> &[OrientedFrame] {
        &self.control_points
    }

    #[must_use]
    pub fn tangent_handles(&self) -> &[Point3] {
        &self.handles
    }

    #[must_use]
    pub fn modes(&self) -> &[ContinuityMode] {
        &self.modes
    }

    #[must_use]
    pub fn control_point_count(&self) -> usize {
        self.control_points.len()
    }

    #[must_use]
    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.control_points.len().saturating_sub(1)
    }

    #[must_use]
    pub fn is_looped(&self) -> bool {
        self.looped
    }

    #[must_use]
    pub fn length_samples(&self) -> usize {
        self.length_samples
    }

    #[must_use]
    pub fn placement(&self) -> OrientedFrame {
        self.placement
    }

    #[must_use]
    pub fn arc_lengths(&self) -> &ArcLengthTable {
        &self.arc_lengths
    }

    #[must_use]
    pub fn layout(&self) -> HandleLayout {
        HandleLayout::new(self.control_points.len(), self.looped)
    }

    /// Parallel sequences agree in length and there are at least two points.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        validate_layout(&self.control_points, &self.handles, &self.modes).is_ok()
    }

    /// The Bezier segment `index` (`0..segment_count()`).
    #[must_use]
    pub fn segment(&self, index: usize) -> CubicBezier3 {
        CubicBezier3::new(
            self.control_points[index].position,
            self.handles[2 * index],
            self.handles[2 * index + 1],
            self.control_points[index + 1].position,
        )
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    /// Maps a global parameter to `(segment, local_t)`.
    #[must_use]
    pub fn resolve_segment(&self, t: f64) -> (usize, f64) {
        let segments = self.segment_count().max(1);
        let mut t = if t.is_finite() { t } else { 0.0 };

        if self.looped {
            t = t.rem_euclid(1.0);
        } else if t >= 1.0 {
            return (segments - 1, 1.0);
        }

        let scaled = t.clamp(0.0, 1.0) * segments as f64;
        let index = (scaled.floor() as usize).min(segments - 1);
        (index, scaled - index as f64)
    }

    /// Up vector used for frames on segment `index`: the control point
    /// rotations blended along the segment.
    fn blended_up(&self, index: usize, local_t: f64) -> Vec3 {
        let start = self.control_points[index].rotation;
        let end = self.control_points[index + 1].rotation;
        start.slerp(end, local_t).up()
    }

    #[must_use]
    pub fn point(&self, t: f64) -> Point3 {
        let (index, local_t) = self.resolve_segment(t);
        self.segment(index).point_at(local_t)
    }

    /// Unit tangent; falls back to the blended control point forward on a
    /// collapsed segment.
    #[must_use]
    pub fn tangent(&self, t: f64) -> Vec3 {
        let (index, local_t) = self.resolve_segment(t);
        self.segment(index).tangent_at(local_t).unwrap_or_else(|| {
            let start = self.control_points[index].rotation;
            let end = self.control_points[index + 1].rotation;
            start.slerp(end, local_t).forward()
        })
    }

    #[must_use]
    pub fn normal(&self, t: f64) -> Vec3 {
        let (index, local_t) = self.resolve_segment(t);
        self.segment(index)
            .normal_at(local_t, self.blended_up(index, local_t))
    }

    #[must_use]
    pub fn orientation(&self, t: f64) -> Quat {
        self.local_frame(t).rotation
    }

    /// Frame at `t` in the curve's own space.
    #[must_use]
    pub fn local_frame(&self, t: f64) -> OrientedFrame {
        let (index, local_t) = self.resolve_segment(t);
        self.segment(index)
            .frame_at(local_t, self.blended_up(index, local_t))
    }

    /// Frame at `t` after applying the curve's placement.
    #[must_use]
    pub fn world_frame(&self, t: f64) -> OrientedFrame {
        self.placement.then(self.local_frame(t))
    }

    #[must_use]
    pub fn world_point(&self, t: f64) -> Point3 {
        self.placement.local_to_world(self.point(t).to_vec3())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Arc length
    // ─────────────────────────────────────────────────────────────────────

    #[must_use]
    pub fn length(&self) -> f64 {
        self.arc_lengths.length()
    }

    /// Distance travelled up to parameter `t`. On a loop a negative `t`
    /// measures backwards from the start and yields a negative distance, and
    /// `t > 1` wraps around like [`Curve::point`] does.
    #[must_use]
    pub fn length_at(&self, t: f64) -> f64 {
        if t < 0.0 {
            if !self.looped {
                return 0.0;
            }
            return self.arc_lengths.sample(1.0 + t) - self.length();
        }
        if self.looped && t > 1.0 {
            return self.arc_lengths.sample(t.rem_euclid(1.0));
        }
        self.arc_lengths.sample(t)
    }

    /// Parameter at distance `length`, wrapped on loops and clamped otherwise.
    #[must_use]
    pub fn param_from_length(&self, length: f64) -> f64 {
        let total = self.length();
        if self.arc_lengths.is_empty() || total <= 0.0 || !length.is_finite() {
            return 0.0;
        }
        let length = if self.looped {
            length.rem_euclid(total)
        } else {
            length.clamp(0.0, total)
        };
        self.arc_lengths.inverse_sample(length)
    }

    #[must_use]
    pub fn param_from_normalized(&self, normalized: f64) -> f64 {
        self.param_from_length(normalized * self.length())
    }

    #[must_use]
    pub fn normalized_from_length(&self, length: f64) -> f64 {
        let total = self.length();
        if total <= 0.0 { 0.0 } else { length / total }
    }

    #[must_use]
    pub fn normalized_position(&self, t: f64) -> f64 {
        self.normalized_from_length(self.length_at(t))
    }

    /// Global parameter of control point `index`.
    #[must_use]
    pub fn control_point_param(&self, index: usize) -> f64 {
        index as f64 / self.segment_count().max(1) as f64
    }

    // ─────────────────────────────────────────────────────────────────────
    // Nearest point
    // ─────────────────────────────────────────────────────────────────────

    /// Approximate parameter of the curve point nearest to `point` (world
    /// space).
    #[must_use]
    pub fn nearest_point(&self, point: Point3, iterations: usize) -> f64 {
        nearest::nearest_point(self, point, iterations)
    }

    /// Approximate parameter of the curve point whose projection lands nearest
    /// to `screen`.
    #[must_use]
    pub fn nearest_point_to_screen(
        &self,
        screen: Vec2,
        iterations: usize,
        projector: impl Fn(Point3) -> Vec2,
    ) -> f64 {
        nearest::nearest_point_to_screen(self, screen, iterations, projector)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Listeners
    // ─────────────────────────────────────────────────────────────────────

    pub fn subscribe(&mut self, listener: Rc<RefCell<dyn CurveListener>>) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn unsubscribe_listener(&mut self, listener: &Rc<RefCell<dyn CurveListener>>) -> bool {
        self.listeners.unsubscribe_listener(listener)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────

    /// Inserts a control point next to `index` and returns the index it landed
    /// at.
    ///
    /// Past an open end the new point is extrapolated along the end point's
    /// forward axis. Between two points it is placed halfway along the arc
    /// length with handles one unit either side. On a loop, inserts at either
    /// end are redirected into the closing segments.
    pub fn insert_control_point(
        &mut self,
        index: usize,
        position: InsertPosition,
    ) -> Result<usize, CurveError> {
        let count = self.control_points.len();
        self.check_control_point(index)?;

        let mut insert = match position {
            InsertPosition::Before => index,
            InsertPosition::After => index + 1,
        };
        if self.looped {
            if insert == count {
                insert = 1;
            }
            if insert == 0 {
                insert = count - 1;
            }
        }

        // `first` and `second` land at handle indices `handle_at` and
        // `handle_at + 1`.
        let (frame, first, second, handle_at) = if insert >= count {
            let (frame, first, second) = self.extrapolate_end();
            insert = count;
            (frame, first, second, self.handles.len())
        } else if insert == 0 {
            let (frame, first, second) = self.extrapolate_start();
            (frame, first, second, 0)
        } else {
            let previous = self.length_at(self.control_point_param(insert - 1));
            let next = self.length_at(self.control_point_param(insert));
            let t = self.param_from_length(previous + (next - previous) * 0.5);
            let frame = self.local_frame(t);
            let forward = frame.forward();
            (
                frame,
                frame.position - forward,
                frame.position + forward,
                2 * insert - 1,
            )
        };

        let mode = self.modes[index];
        self.control_points.insert(insert, frame);
        self.modes.insert(insert, mode);
        self.handles.insert(handle_at, second);
        self.handles.insert(handle_at, first);

        let layout = self.layout();
        constraint::enforce_point(
            layout,
            &mut self.control_points,
            &mut self.handles,
            &self.modes,
            insert,
        );
        if self.looped {
            self.enforce_loop();
        }

        log::debug!("inserted control point {insert} ({} total)", self.control_points.len());
        self.finish_edit();
        Ok(insert)
    }

    /// New end point plus the two handles joining it, the old end's first.
    fn extrapolate_end(&self) -> (OrientedFrame, Point3, Point3) {
        let last = self.control_points.len() - 1;
        let anchor = self.control_points[last];
        let distance = extrapolation_distance(anchor.position, self.control_points[last - 1].position);

        let position = anchor.position + anchor.forward() * distance;
        let rotation = Quat::look_rotation(position - anchor.position, anchor.up())
            .unwrap_or(anchor.rotation);
        let frame = OrientedFrame::new(position, rotation);
        let forward = frame.forward();
        (
            frame,
            position - forward * (distance * 2.0 / 3.0),
            position - forward * (distance / 3.0),
        )
    }

    /// New start point plus the two handles joining it, its own first.
    fn extrapolate_start(&self) -> (OrientedFrame, Point3, Point3) {
        let anchor = self.control_points[0];
        let distance = extrapolation_distance(anchor.position, self.control_points[1].position);

        let position = anchor.position - anchor.forward() * distance;
        let rotation = Quat::look_rotation(anchor.position - position, anchor.up())
            .unwrap_or(anchor.rotation);
        let frame = OrientedFrame::new(position, rotation);
        let forward = frame.forward();
        (
            frame,
            position + forward * (distance / 3.0),
            position + forward * (distance * 2.0 / 3.0),
        )
    }

    /// Removes control point `index` together with two adjacent handles.
    pub fn remove_control_point(&mut self, index: usize) -> Result<(), CurveError> {
        self.check_control_point(index)?;
        let minimum = if self.looped { 3 } else { 2 };
        if self.control_points.len() <= minimum {
            return Err(CurveError::TooFewControlPoints);
        }

        let handle_count = self.handles.len();
        let first_handle = if index == 0 {
            0
        } else if 2 * index - 1 >= handle_count - 1 {
            let start = handle_count - 2;
            if self.looped { start - 1 } else { start }
        } else {
            2 * index - 1
        };

        self.control_points.remove(index);
        self.modes.remove(index);
        self.handles.drain(first_handle..first_handle + 2);

        if self.looped {
            self.enforce_loop();
        }

        log::debug!("removed control point {index} ({} left)", self.control_points.len());
        self.finish_edit();
        Ok(())
    }

    /// Moves control point `index` to `frame`, carrying both of its handles
    /// along in its local space.
    pub fn set_control_point(&mut self, index: usize, frame: OrientedFrame) -> Result<(), CurveError> {
        self.check_control_point(index)?;
        let layout = self.layout();
        let old = self.control_points[index];

        let carried = [layout.previous_handle(index), layout.next_handle(index)];
        for handle in carried.into_iter().flatten() {
            let local = old.world_to_local(self.handles[handle]);
            self.handles[handle] = frame.local_to_world(local);
        }

        self.control_points[index] = frame;
        if self.looped {
            let last = self.control_points.len() - 1;
            if index == 0 {
                self.control_points[last] = frame;
            } else if index == last {
                self.control_points[0] = frame;
            }
        }

        constraint::enforce_point(
            layout,
            &mut self.control_points,
            &mut self.handles,
            &self.modes,
            index,
        );
        self.finish_edit();
        Ok(())
    }

    pub fn set_tangent_handle(&mut self, index: usize, position: Point3) -> Result<(), CurveError> {
        self.check_handle(index)?;
        self.handles[index] = position;
        let layout = self.layout();
        constraint::enforce(
            layout,
            &mut self.control_points,
            &mut self.handles,
            &self.modes,
            index,
        );
        self.finish_edit();
        Ok(())
    }

    pub fn set_control_point_mode(&mut self, index: usize, mode: ContinuityMode) -> Result<(), CurveError> {
        self.check_control_point(index)?;
        self.assign_mode(index, mode);
        let layout = self.layout();
        constraint::enforce_point(
            layout,
            &mut self.control_points,
            &mut self.handles,
            &self.modes,
            index,
        );
        self.finish_edit();
        Ok(())
    }

    /// Sets the mode of the control point owning `handle`, treating `handle` as
    /// the one that stays put.
    pub fn set_handle_mode(&mut self, handle: usize, mode: ContinuityMode) -> Result<(), CurveError> {
        self.check_handle(handle)?;
        self.assign_mode(HandleLayout::control_point_of_handle(handle), mode);
        let layout = self.layout();
        constraint::enforce(
            layout,
            &mut self.control_points,
            &mut self.handles,
            &self.modes,
            handle,
        );
        self.finish_edit();
        Ok(())
    }

    pub fn set_looped(&mut self, looped: bool) {
        if looped == self.looped {
            return;
        }
        self.looped = looped;
        if looped {
            self.enforce_loop();
        }
        self.finish_edit();
    }

    /// Samples per segment for the arc-length table; at least one.
    pub fn set_length_samples(&mut self, samples: usize) {
        self.length_samples = samples.max(1);
        self.finish_edit();
    }

    pub fn set_placement(&mut self, placement: OrientedFrame) {
        self.placement = placement;
        self.listeners.notify(self);
    }

    /// Re-orients control point `index` so it keeps facing its current forward
    /// direction with `up` as the up hint.
    pub fn align_control_point_up(&mut self, index: usize, up: Vec3) -> Result<(), CurveError> {
        self.check_control_point(index)?;
        let frame = self.control_points[index];
        let rotation = Quat::look_rotation(frame.forward(), up).unwrap_or(frame.rotation);
        self.set_control_point(index, OrientedFrame::new(frame.position, rotation))
    }

    /// Re-applies loop closure and notifies listeners without changing any
    /// data.
    pub fn refresh(&mut self) {
        if self.looped {
            self.enforce_loop();
        }
        self.finish_edit();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    pub(crate) fn set_length_samples_silently(&mut self, samples: usize) {
        self.length_samples = samples.max(1);
    }

    pub(crate) fn set_arc_lengths(&mut self, table: ArcLengthTable) {
        self.arc_lengths = table;
    }

    pub(crate) fn regenerate_arc_lengths(&mut self) {
        let table = ArcLengthTable::generate(
            |t| self.point(t),
            self.segment_count(),
            self.length_samples,
        );
        self.arc_lengths = table;
    }

    fn assign_mode(&mut self, index: usize, mode: ContinuityMode) {
        self.modes[index] = mode;
        if self.looped {
            let last = self.modes.len() - 1;
            if index == 0 {
                self.modes[last] = mode;
            } else if index == last {
                self.modes[0] = mode;
            }
        }
    }

    fn enforce_loop(&mut self) {
        let layout = self.layout();
        constraint::enforce_loop(
            layout,
            &mut self.control_points,
            &mut self.handles,
            &mut self.modes,
        );
    }

    fn finish_edit(&mut self) {
        debug_assert!(self.is_consistent(), "curve layout broken after edit");
        self.regenerate_arc_lengths();
        self.listeners.notify(self);
    }

    fn check_control_point(&self, index: usize) -> Result<(), CurveError> {
        let len = self.control_points.len();
        if index < len {
            Ok(())
        } else {
            Err(CurveError::InvalidIndex { index, len })
        }
    }

    fn check_handle(&self, index: usize) -> Result<(), CurveError> {
        let len = self.handles.len();
        if index < len {
            Ok(())
        } else {
            Err(CurveError::InvalidIndex { index, len })
        }
    }
}

fn extrapolation_distance(a: Point3, b: Point3) -> f64 {
    let distance = a.distance_to(b);
    if distance.is_finite() && distance > Tolerance::DEFAULT.eps {
        distance
    } else {
        DEFAULT_EXTRAPOLATION_DISTANCE
    }
}

fn validate_layout(
    control_points: &[OrientedFrame],
    handles: &[Point3],
    modes: &[ContinuityMode],
) -> Result<(), CurveError> {
    if control_points.len() < 2 {
        return Err(CurveError::TooFewControlPoints);
    }
    let expected = 2 * (control_points.len() - 1);
    if handles.len() != expected {
        return Err(CurveError::HandleCountMismatch {
            expected,
            found: handles.len(),
        });
    }
    if modes.len() != control_points.len() {
        return Err(CurveError::ModeCountMismatch {
            expected: control_points.len(),
            found: modes.len(),
        });
    }
    Ok(())
}
