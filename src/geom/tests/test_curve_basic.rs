use crate::geom::{
    ContinuityMode, Curve, CurveError, CurvePosition, InsertPosition, OrientedFrame, Point3,
    Tolerance, Vec3,
};

fn straight() -> Curve {
    Curve::through_points(&[Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 10.0)], false)
        .expect("two points")
}

fn square_loop() -> Curve {
    Curve::through_points(
        &[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 4.0),
            Point3::new(0.0, 0.0, 4.0),
            Point3::new(0.0, 0.0, 0.0),
        ],
        true,
    )
    .expect("closed square")
}

fn bend() -> Curve {
    Curve::through_points(
        &[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 3.0),
            Point3::new(0.0, 0.0, 6.0),
        ],
        false,
    )
    .expect("three points")
}

#[test]
fn straight_curve_length_and_midpoint() {
    let curve = straight();
    let tol = Tolerance::LOOSE;

    assert!(tol.approx_eq_f64(curve.length(), 10.0), "length {}", curve.length());
    assert!(tol.approx_eq_point3(curve.point(0.5), Point3::new(0.0, 0.0, 5.0)));
    assert!(tol.approx_eq_vec3(curve.tangent(0.25), Vec3::Z));
    assert!(tol.approx_eq_vec3(curve.local_frame(0.5).forward(), Vec3::Z));
}

#[test]
fn arc_length_table_has_one_entry_per_step_plus_one() {
    let curve = bend();
    let table = curve.arc_lengths();

    assert_eq!(table.len(), curve.segment_count() * curve.length_samples() + 1);
    assert_eq!(table.samples()[0], 0.0);
    assert!(table.is_monotonic());
    assert!(table.is_valid_for(curve.segment_count(), curve.length_samples()));
}

#[test]
fn parameter_length_round_trip() {
    let curve = bend();
    for i in 0..=20 {
        let t = f64::from(i) / 20.0;
        let back = curve.param_from_length(curve.length_at(t));
        assert!((back - t).abs() < 1e-9, "t={t} came back as {back}");
    }
}

#[test]
fn open_curve_clamps_out_of_range_queries() {
    let curve = straight();

    assert_eq!(curve.length_at(-0.5), 0.0);
    assert!((curve.param_from_length(25.0) - 1.0).abs() < 1e-12);
    assert_eq!(curve.param_from_length(-3.0), 0.0);
    assert!(Tolerance::LOOSE.approx_eq_point3(curve.point(1.5), Point3::new(0.0, 0.0, 10.0)));
}

#[test]
fn looped_square_wraps_parameters_and_lengths() {
    let curve = square_loop();
    let tol = Tolerance::LOOSE;

    assert!(curve.is_looped());
    assert!(tol.approx_eq_f64(curve.length(), 16.0), "length {}", curve.length());
    assert!(tol.approx_eq_point3(curve.point(0.0), curve.point(1.0)));
    assert_eq!(curve.control_point(0), curve.control_point(curve.control_point_count() - 1));

    assert!(tol.approx_eq_f64(curve.param_from_length(20.0), 0.25));
    assert!(tol.approx_eq_f64(curve.length_at(-0.25), -4.0));
    assert!(tol.approx_eq_f64(curve.length_at(1.0), 16.0));
    assert!(tol.approx_eq_f64(curve.length_at(1.25), curve.length_at(0.25)));
    assert!(tol.approx_eq_point3(curve.point(1.25), curve.point(0.25)));
}

#[test]
fn curve_positions_resolve_by_mode() {
    let curve = straight();
    let tol = Tolerance::LOOSE;

    assert!(tol.approx_eq_f64(CurvePosition::normalized(0.5).parameter(&curve), 0.5));
    assert!(tol.approx_eq_f64(CurvePosition::distance(2.5).parameter(&curve), 0.25));
    assert!(tol.approx_eq_f64(CurvePosition::simple(1.25).parameter(&curve), 0.25));
    assert!(tol.approx_eq_f64(CurvePosition::from(0.3).length_on(&curve), 3.0));
}

#[test]
fn placement_moves_world_queries_only() {
    let mut curve = straight();
    curve.set_placement(OrientedFrame::at(Point3::new(1.0, 0.0, 0.0)));

    let tol = Tolerance::LOOSE;
    assert!(tol.approx_eq_point3(curve.point(0.0), Point3::new(0.0, 0.0, 0.0)));
    assert!(tol.approx_eq_point3(curve.world_point(0.0), Point3::new(1.0, 0.0, 0.0)));
    assert!(tol.approx_eq_point3(curve.world_frame(1.0).position, Point3::new(1.0, 0.0, 10.0)));
    assert!(tol.approx_eq_f64(curve.length(), 10.0));
}

#[test]
fn insert_between_points_keeps_layout_consistent() {
    let mut curve = bend();
    let length = curve.length();

    let inserted = curve
        .insert_control_point(0, InsertPosition::After)
        .expect("valid index");

    assert_eq!(inserted, 1);
    assert_eq!(curve.control_point_count(), 4);
    assert_eq!(curve.handle_count(), 6);
    assert_eq!(curve.modes().len(), 4);
    assert!(curve.is_consistent());
    assert!(curve.length() > 0.0 && curve.length().is_finite());
    // The new point sits on the old curve, so the shape barely moves.
    assert!((curve.length() - length).abs() < length * 0.5);
}

#[test]
fn insert_past_open_ends_extrapolates() {
    let mut curve = straight();

    let end = curve
        .insert_control_point(1, InsertPosition::After)
        .expect("end insert");
    assert_eq!(end, 2);
    assert!(curve.control_point(2).position.z > 10.0);

    let start = curve
        .insert_control_point(0, InsertPosition::Before)
        .expect("start insert");
    assert_eq!(start, 0);
    assert!(curve.control_point(0).position.z < 0.0);

    // Handles of the new first segment stay ordered along the chord.
    let segment = curve.segment(0);
    assert!(segment.p0.z < segment.p1.z);
    assert!(segment.p1.z < segment.p2.z);
    assert!(segment.p2.z < segment.p3.z);
    assert!(curve.is_consistent());
}

#[test]
fn insert_on_loop_end_goes_into_the_closing_segment() {
    let mut curve = square_loop();
    let last = curve.control_point_count() - 1;

    let inserted = curve
        .insert_control_point(last, InsertPosition::After)
        .expect("loop insert");

    assert_eq!(inserted, 1);
    assert_eq!(curve.control_point_count(), 6);
    assert_eq!(curve.control_point(0), curve.control_point(5));
    assert!(curve.is_consistent());
}

#[test]
fn remove_respects_minimum_point_counts() {
    let mut open = straight();
    assert_eq!(open.remove_control_point(0), Err(CurveError::TooFewControlPoints));

    let mut triangle = Curve::through_points(
        &[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 2.0),
            Point3::new(0.0, 0.0, 0.0),
        ],
        true,
    )
    .expect("closed triangle");
    triangle.remove_control_point(1).expect("four points may lose one");
    assert_eq!(triangle.control_point_count(), 3);
    assert_eq!(triangle.handle_count(), 4);
    assert_eq!(
        triangle.remove_control_point(1),
        Err(CurveError::TooFewControlPoints)
    );
}

#[test]
fn insert_then_remove_restores_counts() {
    let mut curve = bend();
    let index = curve
        .insert_control_point(1, InsertPosition::Before)
        .expect("interior insert");
    curve.remove_control_point(index).expect("remove it again");

    assert_eq!(curve.control_point_count(), 3);
    assert_eq!(curve.handle_count(), 4);
    assert!(curve.is_consistent());
}

#[test]
fn rejects_invalid_indices_and_layouts() {
    let mut curve = straight();
    assert_eq!(
        curve.set_control_point(9, OrientedFrame::IDENTITY),
        Err(CurveError::InvalidIndex { index: 9, len: 2 })
    );
    assert_eq!(
        curve.set_tangent_handle(2, Point3::ORIGIN),
        Err(CurveError::InvalidIndex { index: 2, len: 2 })
    );

    let frames = vec![OrientedFrame::IDENTITY; 2];
    assert_eq!(
        Curve::from_points(frames.clone(), vec![Point3::ORIGIN], vec![ContinuityMode::Free; 2], false)
            .map(|_| ()),
        Err(CurveError::HandleCountMismatch { expected: 2, found: 1 })
    );
    assert_eq!(
        Curve::from_points(frames, vec![Point3::ORIGIN; 2], vec![ContinuityMode::Free], false)
            .map(|_| ()),
        Err(CurveError::ModeCountMismatch { expected: 2, found: 1 })
    );
    assert_eq!(
        Curve::through_points(&[Point3::ORIGIN], false).map(|_| ()),
        Err(CurveError::TooFewControlPoints)
    );
}

#[test]
fn toggling_loop_closes_the_curve() {
    let mut curve = bend();
    curve.set_looped(true);

    let last = curve.control_point_count() - 1;
    assert_eq!(curve.control_point(0), curve.control_point(last));
    assert!(Tolerance::LOOSE.approx_eq_point3(curve.point(0.0), curve.point(1.0)));
}

#[test]
fn length_samples_resize_the_table() {
    let mut curve = bend();
    curve.set_length_samples(10);
    assert_eq!(curve.arc_lengths().len(), curve.segment_count() * 10 + 1);

    curve.set_length_samples(0);
    assert_eq!(curve.length_samples(), 1);
}
