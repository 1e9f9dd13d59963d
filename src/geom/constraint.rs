//! Tangent handle continuity between the two sides of a control point.
//!
//! Handles live in one flat sequence next to the control points: handle `2i`
//! leaves control point `i` and handle `2i - 1` enters it. On a looping curve
//! the first and last control points are the same point, so the first
//! point's incoming handle is the last handle of the sequence.

use serde::{Deserialize, Serialize};

use super::core::{Point3, Quat};
use super::frame::OrientedFrame;

/// How the two handles of a control point are tied together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContinuityMode {
    /// Handles move independently.
    #[default]
    Free,
    /// Handles stay colinear through the control point; each keeps its length.
    Aligned,
    /// One handle is the point reflection of the other.
    Mirrored,
}

/// Index arithmetic for a handle sequence belonging to `control_points`
/// points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleLayout {
    pub control_points: usize,
    pub looped: bool,
}

impl HandleLayout {
    #[must_use]
    pub const fn new(control_points: usize, looped: bool) -> Self {
        Self {
            control_points,
            looped,
        }
    }

    #[must_use]
    pub const fn handle_count(self) -> usize {
        2 * self.control_points.saturating_sub(1)
    }

    #[must_use]
    pub const fn control_point_of_handle(handle: usize) -> usize {
        (handle + 1) / 2
    }

    /// Incoming handle of control point `index`.
    #[must_use]
    pub fn previous_handle(self, index: usize) -> Option<usize> {
        let count = self.handle_count();
        if count == 0 {
            return None;
        }
        if index == 0 {
            return self.looped.then(|| count - 1);
        }
        let handle = 2 * index - 1;
        (handle < count).then_some(handle)
    }

    /// Outgoing handle of control point `index`.
    #[must_use]
    pub fn next_handle(self, index: usize) -> Option<usize> {
        let count = self.handle_count();
        let handle = 2 * index;
        if handle < count {
            Some(handle)
        } else if self.looped && count > 0 {
            Some(0)
        } else {
            None
        }
    }

    /// The last control point of a loop is an alias of the first.
    #[must_use]
    pub fn canonical_point(self, index: usize) -> usize {
        if self.looped && self.control_points > 1 && index == self.control_points - 1 {
            0
        } else {
            index
        }
    }

    #[must_use]
    pub fn is_open_end_handle(self, handle: usize) -> bool {
        !self.looped && (handle == 0 || handle + 1 == self.handle_count())
    }
}

/// Re-applies the continuity constraint after `handle` moved.
///
/// Unless the point is free or `handle` is an open end handle, the opposite
/// handle is rebuilt from `handle` according to the point's mode. Then the
/// owning control point is turned to face its outgoing handle (or away from
/// its incoming handle at the open end), keeping its up axis.
pub fn enforce(
    layout: HandleLayout,
    frames: &mut [OrientedFrame],
    handles: &mut [Point3],
    modes: &[ContinuityMode],
    handle: usize,
) {
    if handle >= handles.len() || frames.is_empty() {
        return;
    }

    let point = layout.canonical_point(HandleLayout::control_point_of_handle(handle));
    let previous = layout.previous_handle(point);
    let next = layout.next_handle(point);

    let mode = modes.get(point).copied().unwrap_or_default();
    if mode != ContinuityMode::Free && !layout.is_open_end_handle(handle) {
        let opposite = if previous == Some(handle) { next } else { previous };
        if let Some(enforced) = opposite.filter(|&h| h != handle) {
            let middle = frames[point].position;
            if let Some(target) =
                constrained_handle(mode, middle, handles[handle], handles[enforced])
            {
                handles[enforced] = target;
            }
        }
    }

    reorient(frames, handles, point, previous, next);
    if layout.looped {
        mirror_loop_end(frames);
    }
}

fn constrained_handle(
    mode: ContinuityMode,
    middle: Point3,
    fixed: Point3,
    enforced: Point3,
) -> Option<Point3> {
    let reflected = middle - fixed;
    let offset = match mode {
        ContinuityMode::Mirrored => reflected,
        ContinuityMode::Aligned => reflected.normalized()? * middle.distance_to(enforced),
        ContinuityMode::Free => return None,
    };
    Some(middle + offset)
}

/// Re-enforces around control point `index`, starting from its incoming handle
/// (or its outgoing one when it has none).
pub fn enforce_point(
    layout: HandleLayout,
    frames: &mut [OrientedFrame],
    handles: &mut [Point3],
    modes: &[ContinuityMode],
    index: usize,
) {
    let point = layout.canonical_point(index);
    if let Some(handle) = layout.previous_handle(point).or_else(|| layout.next_handle(point)) {
        enforce(layout, frames, handles, modes, handle);
    }
}

/// Makes the last control point of a loop identical to the first, then
/// re-enforces the first point's handles.
pub fn enforce_loop(
    layout: HandleLayout,
    frames: &mut [OrientedFrame],
    handles: &mut [Point3],
    modes: &mut [ContinuityMode],
) {
    if !layout.looped || frames.len() < 2 || modes.len() < 2 {
        return;
    }
    let last = modes.len() - 1;
    modes[last] = modes[0];
    mirror_loop_end(frames);
    enforce_point(layout, frames, handles, modes, 0);
}

fn mirror_loop_end(frames: &mut [OrientedFrame]) {
    if let Some(last) = frames.len().checked_sub(1) {
        frames[last] = frames[0];
    }
}

fn reorient(
    frames: &mut [OrientedFrame],
    handles: &[Point3],
    point: usize,
    previous: Option<usize>,
    next: Option<usize>,
) {
    let frame = frames[point];
    let direction = match (next, previous) {
        (Some(next), _) => handles[next] - frame.position,
        (None, Some(previous)) => frame.position - handles[previous],
        (None, None) => return,
    };
    if let Some(rotation) = Quat::look_rotation(direction, frame.up()) {
        frames[point].rotation = rotation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::core::{Tolerance, Vec3};

    fn three_points() -> (Vec<OrientedFrame>, Vec<Point3>) {
        let frames = vec![
            OrientedFrame::at(Point3::new(0.0, 0.0, 0.0)),
            OrientedFrame::at(Point3::new(0.0, 0.0, 3.0)),
            OrientedFrame::at(Point3::new(0.0, 0.0, 6.0)),
        ];
        let handles = vec![
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 2.0),
            Point3::new(1.0, 0.0, 5.0),
            Point3::new(0.0, 0.0, 5.0),
        ];
        (frames, handles)
    }

    #[test]
    fn test_handle_index_helpers() {
        let open = HandleLayout::new(3, false);
        assert_eq!(open.handle_count(), 4);
        assert_eq!(HandleLayout::control_point_of_handle(0), 0);
        assert_eq!(HandleLayout::control_point_of_handle(1), 1);
        assert_eq!(HandleLayout::control_point_of_handle(2), 1);
        assert_eq!(HandleLayout::control_point_of_handle(3), 2);
        assert_eq!(open.previous_handle(0), None);
        assert_eq!(open.previous_handle(1), Some(1));
        assert_eq!(open.next_handle(1), Some(2));
        assert_eq!(open.next_handle(2), None);

        let looped = HandleLayout::new(3, true);
        assert_eq!(looped.previous_handle(0), Some(3));
        assert_eq!(looped.next_handle(2), Some(0));
        assert_eq!(looped.canonical_point(2), 0);
    }

    #[test]
    fn test_mirrored_reflects_fixed_handle() {
        let (mut frames, mut handles) = three_points();
        let modes = [ContinuityMode::Free, ContinuityMode::Mirrored, ContinuityMode::Free];
        enforce(HandleLayout::new(3, false), &mut frames, &mut handles, &modes, 1);

        assert!(Tolerance::LOOSE.approx_eq_point3(handles[2], Point3::new(0.0, -1.0, 4.0)));
        let middle = frames[1].position;
        assert!((middle.distance_to(handles[1]) - middle.distance_to(handles[2])).abs() < 1e-9);
    }

    #[test]
    fn test_aligned_keeps_enforced_distance() {
        let (mut frames, mut handles) = three_points();
        let modes = [ContinuityMode::Free, ContinuityMode::Aligned, ContinuityMode::Free];
        let middle = frames[1].position;
        let before = middle.distance_to(handles[1]);
        enforce(HandleLayout::new(3, false), &mut frames, &mut handles, &modes, 2);

        assert!((middle.distance_to(handles[1]) - before).abs() < 1e-9);
        let a = (handles[1] - middle).normalized().unwrap();
        let b = (handles[2] - middle).normalized().unwrap();
        assert!((a.dot(b) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_open_end_handles_are_exempt() {
        let (mut frames, mut handles) = three_points();
        let original = handles.clone();
        let modes = [ContinuityMode::Mirrored; 3];
        enforce(HandleLayout::new(3, false), &mut frames, &mut handles, &modes, 0);
        enforce(HandleLayout::new(3, false), &mut frames, &mut handles, &modes, 3);
        assert_eq!(handles, original);
    }

    #[test]
    fn test_control_point_faces_outgoing_handle() {
        let (mut frames, mut handles) = three_points();
        let modes = [ContinuityMode::Free; 3];
        enforce(HandleLayout::new(3, false), &mut frames, &mut handles, &modes, 2);
        let expected = (handles[2] - frames[1].position).normalized().unwrap();
        assert!(Tolerance::LOOSE.approx_eq_vec3(frames[1].forward(), expected));

        enforce(HandleLayout::new(3, false), &mut frames, &mut handles, &modes, 3);
        assert!(Tolerance::LOOSE.approx_eq_vec3(frames[2].forward(), Vec3::Z));
    }

    #[test]
    fn test_enforce_loop_copies_first_point() {
        let (mut frames, mut handles) = three_points();
        let mut modes = vec![ContinuityMode::Mirrored, ContinuityMode::Free, ContinuityMode::Free];
        enforce_loop(HandleLayout::new(3, true), &mut frames, &mut handles, &mut modes);

        assert_eq!(modes[2], ContinuityMode::Mirrored);
        assert_eq!(frames[2], frames[0]);
        let middle = frames[0].position;
        assert!((middle.distance_to(handles[0]) - middle.distance_to(handles[3])).abs() < 1e-9);
    }
}
