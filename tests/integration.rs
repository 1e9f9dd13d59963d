use std::cell::RefCell;
use std::rc::Rc;

use spline_extrude::Engine;
use spline_extrude::geom::{
    ContinuityMode, Curve, EndingStyle, ExtrudeOptions, InsertPosition, MeshExtruder, Point3,
    ProfileShape, Vec2Provider, curve_from_json, curve_to_json, load_curve_json,
    save_curve_json,
};

fn s_curve() -> Curve {
    Curve::through_points(
        &[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 4.0),
            Point3::new(0.0, 1.0, 8.0),
            Point3::new(2.0, 1.0, 12.0),
        ],
        false,
    )
    .expect("four points")
}

#[test]
fn engine_starts_with_a_mesh() {
    let engine = Engine::new();
    assert_eq!(engine.control_point_count(), 2);
    assert!((engine.length() - 3.0).abs() < 1e-6);
    assert_eq!(engine.positions().len() % 3, 0);
    assert_eq!(engine.indices().len() % 3, 0);
    assert!(!engine.diagnostics_summary().is_empty());
}

#[test]
fn engine_edits_follow_the_curve() {
    let mut engine = Engine::new();
    let before = engine.positions().len();

    assert_eq!(engine.insert_control_point(1, false), 2);
    engine
        .set_control_point_mode(1, "mirrored")
        .expect("known mode");
    engine
        .set_control_point_position(2, 2.0, 0.0, 8.0)
        .expect("valid point");

    assert!(engine.length() > 3.0);
    assert_ne!(engine.positions().len(), before);
    let end = engine.point_at(1.0);
    assert!((end[0] - 2.0).abs() < 1e-9 && (end[2] - 8.0).abs() < 1e-9);
}

#[test]
fn edited_curve_extrudes_through_listener() {
    let profile = ProfileShape::circle(10, 0.3).expect("valid circle");
    let options = ExtrudeOptions {
        ending_style: EndingStyle::Pointy,
        scale: Vec2Provider::RandomBetweenScalars {
            min: 0.8,
            max: 1.2,
            seed: 11,
        },
        ..ExtrudeOptions::default()
    };
    let extruder = Rc::new(RefCell::new(MeshExtruder::new(profile, options)));

    let mut curve = s_curve();
    curve.subscribe(extruder.clone());
    curve
        .set_control_point_mode(1, ContinuityMode::Aligned)
        .expect("valid point");
    let first = extruder.borrow().mesh().cloned().expect("mesh after first edit");

    curve
        .insert_control_point(2, InsertPosition::Before)
        .expect("valid point");
    let second = extruder.borrow().mesh().cloned().expect("mesh after insert");

    assert!(first.validate().is_ok());
    assert!(second.validate().is_ok());
    assert_eq!(extruder.borrow().rebuild_count(), 2);

    // Random scale is seeded by position, so rebuilding the same curve is stable.
    extruder.borrow_mut().rebuild(&curve).expect("rebuild");
    assert_eq!(extruder.borrow().mesh(), Some(&second));
}

#[test]
fn curve_survives_a_file_round_trip() {
    let curve = s_curve();
    let dir = std::env::temp_dir().join(format!("spline-extrude-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("s_curve.json");

    save_curve_json(&curve, &path).expect("save");
    let loaded = load_curve_json(&path).expect("load");
    std::fs::remove_dir_all(&dir).ok();

    assert_eq!(loaded.control_points(), curve.control_points());
    assert!((loaded.length() - curve.length()).abs() < 1e-12);
    assert_eq!(
        curve_to_json(&loaded).expect("serializes"),
        curve_to_json(&curve).expect("serializes")
    );
}

#[test]
fn loaded_loop_stays_closed() {
    let mut curve = s_curve();
    curve.set_looped(true);
    let json = curve_to_json(&curve).expect("serializes");

    let loaded = curve_from_json(&json).expect("deserializes");
    let last = loaded.control_point_count() - 1;
    assert!(loaded.is_looped());
    assert_eq!(loaded.control_point(0), loaded.control_point(last));
}
