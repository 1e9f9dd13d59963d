use serde::{Deserialize, Serialize};

use super::core::{Point3, Quat, Vec3};

/// A position paired with a rotation. Every curve query hands these out by
/// value; control points are stored as frames in the curve's local space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrientedFrame {
    pub position: Point3,
    pub rotation: Quat,
}

impl OrientedFrame {
    pub const IDENTITY: Self = Self::new(Point3::ORIGIN, Quat::IDENTITY);

    #[must_use]
    pub const fn new(position: Point3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    #[must_use]
    pub const fn at(position: Point3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation.forward()
    }

    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.rotation.up()
    }

    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.rotation.right()
    }

    #[must_use]
    pub fn local_to_world(&self, local: Vec3) -> Point3 {
        self.position + self.rotation.rotate(local)
    }

    #[must_use]
    pub fn world_to_local(&self, world: Point3) -> Vec3 {
        self.rotation.inverse().rotate(world - self.position)
    }

    #[must_use]
    pub fn local_to_world_direction(&self, direction: Vec3) -> Vec3 {
        self.rotation.rotate(direction)
    }

    #[must_use]
    pub fn world_to_local_direction(&self, direction: Vec3) -> Vec3 {
        self.rotation.inverse().rotate(direction)
    }

    /// Expresses `child` (given in this frame's local space) in the space this
    /// frame lives in.
    #[must_use]
    pub fn then(&self, child: Self) -> Self {
        Self::new(
            self.local_to_world(child.position.to_vec3()),
            (self.rotation * child.rotation).normalized(),
        )
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.rotation.x.is_finite()
            && self.rotation.y.is_finite()
            && self.rotation.z.is_finite()
            && self.rotation.w.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;

    #[test]
    fn test_local_world_round_trip() {
        let rotation = Quat::from_axis_angle(Vec3::Y, 0.7).unwrap();
        let frame = OrientedFrame::new(Point3::new(1.0, -2.0, 5.0), rotation);
        let local = Vec3::new(0.3, 0.4, -1.2);

        let world = frame.local_to_world(local);
        assert!(Tolerance::LOOSE.approx_eq_vec3(frame.world_to_local(world), local));

        let dir = frame.local_to_world_direction(Vec3::Z);
        assert!(Tolerance::LOOSE.approx_eq_vec3(dir, frame.forward()));
        assert!(Tolerance::LOOSE.approx_eq_vec3(frame.world_to_local_direction(dir), Vec3::Z));
    }

    #[test]
    fn test_then_composes_placement() {
        let placement = OrientedFrame::new(
            Point3::new(10.0, 0.0, 0.0),
            Quat::from_axis_angle(Vec3::Y, std::f64::consts::FRAC_PI_2).unwrap(),
        );
        let child = OrientedFrame::at(Point3::new(0.0, 0.0, 1.0));
        let world = placement.then(child);
        assert!(Tolerance::LOOSE.approx_eq_point3(world.position, Point3::new(11.0, 0.0, 0.0)));
        assert!(Tolerance::LOOSE.approx_eq_vec3(world.forward(), Vec3::X));
    }
}
