use std::cell::RefCell;
use std::rc::Rc;

use crate::geom::{
    Curve, CurveListener, ExtrudeOptions, MeshExtruder, Point3, ProfileShape, SharedListener, Vec3,
};

struct Recorder {
    name: &'static str,
    log: Rc<RefCell<Vec<&'static str>>>,
    last_length: f64,
}

impl CurveListener for Recorder {
    fn curve_changed(&mut self, curve: &Curve) {
        self.log.borrow_mut().push(self.name);
        self.last_length = curve.length();
    }
}

fn recorder(name: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Rc<RefCell<Recorder>> {
    Rc::new(RefCell::new(Recorder {
        name,
        log: Rc::clone(log),
        last_length: 0.0,
    }))
}

fn nudge(curve: &mut Curve) {
    let mut frame = curve.control_point(1);
    frame.position = frame.position + Vec3::new(0.0, 0.0, 1.0);
    curve.set_control_point(1, frame).expect("valid point");
}

#[test]
fn listeners_run_once_per_edit_in_subscription_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let first = recorder("first", &log);
    let second = recorder("second", &log);

    let mut curve = Curve::new();
    curve.subscribe(first.clone());
    curve.subscribe(second.clone());
    nudge(&mut curve);

    assert_eq!(*log.borrow(), vec!["first", "second"]);
    assert!((first.borrow().last_length - curve.length()).abs() < 1e-12);
}

#[test]
fn subscribing_twice_keeps_one_entry() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let listener = recorder("only", &log);

    let mut curve = Curve::new();
    curve.subscribe(listener.clone());
    curve.subscribe(listener.clone());
    assert_eq!(curve.listener_count(), 1);

    nudge(&mut curve);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn unsubscribed_listeners_are_not_called() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let by_id = recorder("by_id", &log);
    let by_ref = recorder("by_ref", &log);

    let mut curve = Curve::new();
    let id = curve.subscribe(by_id.clone());
    let shared: SharedListener = by_ref.clone();
    curve.subscribe(Rc::clone(&shared));

    assert!(curve.unsubscribe(id));
    assert!(curve.unsubscribe_listener(&shared));
    assert!(!curve.unsubscribe(id));
    assert_eq!(curve.listener_count(), 0);

    nudge(&mut curve);
    assert!(log.borrow().is_empty());
}

#[test]
fn cloned_curves_start_without_listeners() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut curve = Curve::new();
    curve.subscribe(recorder("original", &log));

    let mut copy = curve.clone();
    assert_eq!(copy.listener_count(), 0);
    nudge(&mut copy);
    assert!(log.borrow().is_empty());
}

#[test]
fn busy_listener_is_skipped() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let listener = recorder("busy", &log);

    let mut curve = Curve::new();
    curve.subscribe(listener.clone());

    let guard = listener.borrow_mut();
    nudge(&mut curve);
    drop(guard);

    assert!(log.borrow().is_empty());
}

#[test]
fn subscribed_extruder_rebuilds_on_every_edit() {
    let profile = ProfileShape::circle(6, 0.2).expect("valid circle");
    let extruder = Rc::new(RefCell::new(MeshExtruder::new(profile, ExtrudeOptions::default())));

    let mut curve = Curve::through_points(
        &[Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 4.0)],
        false,
    )
    .expect("two points");
    curve.subscribe(extruder.clone());

    nudge(&mut curve);
    curve.set_looped(false);
    curve.refresh();

    let extruder = extruder.borrow();
    assert_eq!(extruder.rebuild_count(), 2);
    assert!(extruder.mesh().is_some_and(|mesh| !mesh.is_empty()));
}
