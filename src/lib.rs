#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use geom::{
    ContinuityMode, Curve, ExtrudeOptions, InsertPosition, MeshExtruder, OrientedFrame, Point3,
    ProfileShape, SharedListener,
};
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Public entry point for hosts: one editable curve and the mesh extruded
/// along it. Every curve edit rebuilds the mesh.
#[wasm_bindgen]
pub struct Engine {
    curve: Curve,
    extruder: Rc<RefCell<MeshExtruder>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Engine {
        let profile = ProfileShape::circle(12, 0.25).unwrap_or_default();
        let extruder = Rc::new(RefCell::new(MeshExtruder::new(
            profile,
            ExtrudeOptions::default(),
        )));
        let mut engine = Engine {
            curve: Curve::new(),
            extruder,
        };
        engine.attach();
        engine
    }

    /// Replaces the curve with one restored from JSON.
    #[wasm_bindgen]
    pub fn load_curve(&mut self, json: &str) -> Result<(), JsValue> {
        self.curve = geom::curve_from_json(json).map_err(to_js_error)?;
        self.attach();
        Ok(())
    }

    #[wasm_bindgen]
    pub fn save_curve(&self) -> Result<String, JsValue> {
        geom::curve_to_json(&self.curve).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn load_profile(&mut self, json: &str) -> Result<(), JsValue> {
        let profile = geom::profile_from_json(json).map_err(to_js_error)?;
        self.extruder.borrow_mut().set_profile(profile);
        self.rebuild()
    }

    #[wasm_bindgen]
    pub fn set_options(&mut self, json: &str) -> Result<(), JsValue> {
        let options = geom::options_from_json(json).map_err(to_js_error)?;
        self.extruder.borrow_mut().set_options(options);
        self.rebuild()
    }

    #[wasm_bindgen]
    pub fn rebuild(&mut self) -> Result<(), JsValue> {
        self.extruder
            .borrow_mut()
            .rebuild(&self.curve)
            .map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn control_point_count(&self) -> usize {
        self.curve.control_point_count()
    }

    #[wasm_bindgen]
    pub fn length(&self) -> f64 {
        self.curve.length()
    }

    #[wasm_bindgen]
    pub fn is_looped(&self) -> bool {
        self.curve.is_looped()
    }

    /// World-space point at parameter `t` as `[x, y, z]`.
    #[wasm_bindgen]
    pub fn point_at(&self, t: f64) -> Vec<f64> {
        self.curve.world_point(t).to_array().to_vec()
    }

    #[wasm_bindgen]
    pub fn nearest_point(&self, x: f64, y: f64, z: f64) -> f64 {
        self.curve
            .nearest_point(Point3::new(x, y, z), geom::DEFAULT_NEAREST_ITERATIONS)
    }

    #[wasm_bindgen]
    pub fn set_control_point_position(
        &mut self,
        index: usize,
        x: f64,
        y: f64,
        z: f64,
    ) -> Result<(), JsValue> {
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(js_error("control point coordinates must be finite"));
        }
        if index >= self.curve.control_point_count() {
            return Err(js_error("unknown control point"));
        }
        let rotation = self.curve.control_point(index).rotation;
        self.curve
            .set_control_point(index, OrientedFrame::new(Point3::new(x, y, z), rotation))
            .map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn set_tangent_handle(&mut self, index: usize, x: f64, y: f64, z: f64) -> Result<(), JsValue> {
        self.curve
            .set_tangent_handle(index, Point3::new(x, y, z))
            .map_err(to_js_error)
    }

    /// `mode` is one of `free`, `aligned` or `mirrored`.
    #[wasm_bindgen]
    pub fn set_control_point_mode(&mut self, index: usize, mode: &str) -> Result<(), JsValue> {
        let mode = parse_mode(mode).ok_or_else(|| js_error("unknown continuity mode"))?;
        self.curve
            .set_control_point_mode(index, mode)
            .map_err(to_js_error)
    }

    /// Returns the new point's index, or `-1` when `index` is out of range.
    #[wasm_bindgen]
    pub fn insert_control_point(&mut self, index: usize, before: bool) -> i32 {
        let position = if before {
            InsertPosition::Before
        } else {
            InsertPosition::After
        };
        match self.curve.insert_control_point(index, position) {
            Ok(inserted) => i32::try_from(inserted).unwrap_or(-1),
            Err(err) => {
                debug_log!("insert_control_point failed: {err}");
                -1
            }
        }
    }

    #[wasm_bindgen]
    pub fn remove_control_point(&mut self, index: usize) -> Result<(), JsValue> {
        self.curve.remove_control_point(index).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn set_looped(&mut self, looped: bool) {
        self.curve.set_looped(looped);
    }

    #[wasm_bindgen]
    pub fn positions(&self) -> Vec<f64> {
        self.with_mesh(|mesh| mesh.positions_flat().to_vec())
    }

    #[wasm_bindgen]
    pub fn normals(&self) -> Vec<f64> {
        self.with_mesh(|mesh| mesh.normals_flat().to_vec())
    }

    #[wasm_bindgen]
    pub fn uvs(&self) -> Vec<f64> {
        self.with_mesh(|mesh| mesh.uvs_flat().to_vec())
    }

    #[wasm_bindgen]
    pub fn colors(&self) -> Vec<f32> {
        self.with_mesh(|mesh| mesh.colors_flat().to_vec())
    }

    #[wasm_bindgen]
    pub fn indices(&self) -> Vec<u32> {
        self.with_mesh(|mesh| mesh.indices.clone())
    }

    #[wasm_bindgen]
    pub fn get_diagnostics(&self) -> Result<JsValue, JsValue> {
        let extruder = self.extruder.borrow();
        serde_wasm_bindgen::to_value(extruder.diagnostics())
            .map_err(|err| JsError::new(&err.to_string()).into())
    }

    #[wasm_bindgen]
    pub fn diagnostics_summary(&self) -> String {
        self.extruder.borrow().diagnostics().summary()
    }
}

impl Engine {
    /// Subscribes the extruder to the current curve and builds the first mesh.
    fn attach(&mut self) {
        let listener: SharedListener = self.extruder.clone();
        self.curve.subscribe(listener);
        if let Err(err) = self.extruder.borrow_mut().rebuild(&self.curve) {
            debug_log!("initial extrusion failed: {err}");
        }
    }

    fn with_mesh<T: Default>(&self, f: impl FnOnce(&geom::MeshBuildResult) -> T) -> T {
        self.extruder.borrow().mesh().map(f).unwrap_or_default()
    }

    #[must_use]
    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    #[must_use]
    pub fn extruder(&self) -> Rc<RefCell<MeshExtruder>> {
        Rc::clone(&self.extruder)
    }
}

fn parse_mode(mode: &str) -> Option<ContinuityMode> {
    match mode.trim().to_lowercase().as_str() {
        "free" => Some(ContinuityMode::Free),
        "aligned" => Some(ContinuityMode::Aligned),
        "mirrored" => Some(ContinuityMode::Mirrored),
        _ => None,
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
