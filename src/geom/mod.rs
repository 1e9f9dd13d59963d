mod arc_length;
mod asset;
mod bezier;
mod constraint;
mod core;
mod diagnostics;
mod extrude;
mod frame;
mod listeners;
mod mesh;
mod metrics;
mod nearest;
mod position;
mod profile;
mod spline;
mod value;

pub use arc_length::ArcLengthTable;
pub use asset::{
    AssetError, CurveState, ProfileAsset, ProfileVertexState, curve_from_json, curve_to_json,
    load_curve_json, load_options_json, load_profile_json, options_from_json, profile_from_json,
    profile_to_json, save_curve_json, save_profile_json,
};
pub use bezier::CubicBezier3;
pub use constraint::{ContinuityMode, HandleLayout, enforce, enforce_loop, enforce_point};
pub use core::{Point3, Quat, Rect2, Tolerance, Vec2, Vec3};
pub use diagnostics::ExtrudeDiagnostics;
pub use extrude::{
    END_CAP_RINGS, EndingStyle, ExtrudeError, ExtrudeOptions, IntersectionAvoidance, MIN_SPACING,
    MeshExtruder, extrude_curve,
};
pub use frame::OrientedFrame;
pub use listeners::{CurveListener, ListenerId, ListenerRegistry, SharedListener};
pub use mesh::{COLOR_CAP, COLOR_NEUTRAL, COLOR_OVERLAP, MeshBuildResult};
pub use metrics::{ExtrudeMetrics, ExtrudeTimingReport, TimingBucket};
pub use nearest::{DEFAULT_NEAREST_ITERATIONS, nearest_parameter, nearest_point, nearest_point_to_screen};
pub use position::{CurvePosition, PositionMode};
pub use profile::{ProfileError, ProfileShape, ProfileVertex};
pub use spline::{Curve, CurveError, DEFAULT_LENGTH_SAMPLES, InsertPosition};
pub use value::{Keyframe, Keyframes, Vec2Provider};

#[cfg(test)]
mod tests;
