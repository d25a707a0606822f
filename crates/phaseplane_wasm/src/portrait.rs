//! Phase portrait session exposed to JavaScript.

use crate::system::{build_system, point_to_vec, view_to_vec};
use anyhow::{Context, Result};
use js_sys::{Array, Float64Array};
use phaseplane_core::expression::ExpressionSystem;
use phaseplane_core::geometry::{flatten_points, Point};
use phaseplane_core::integrator::Trajectory;
use phaseplane_core::session::{PhasePlane, PortraitSettings};
use phaseplane_core::view::ViewRect;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", err))
}

fn flat_pair(trajectory: &Trajectory) -> Array {
    let out = Array::new();
    out.push(&Float64Array::from(flatten_points(&trajectory.forward).as_slice()));
    out.push(&Float64Array::from(flatten_points(&trajectory.backward).as_slice()));
    out
}

#[wasm_bindgen]
pub struct WasmPhasePlane {
    plane: PhasePlane<ExpressionSystem>,
    equations: [String; 2],
}

impl WasmPhasePlane {
    pub(crate) fn create(
        f: &str,
        g: &str,
        param_names: &[String],
        params: &[f64],
    ) -> Result<Self> {
        let system = build_system(f, g, param_names, params)?;
        Ok(Self {
            plane: PhasePlane::new(system),
            equations: [f.to_string(), g.to_string()],
        })
    }

    pub(crate) fn replace_equations(
        &mut self,
        f: &str,
        g: &str,
        param_names: &[String],
        params: &[f64],
    ) -> Result<()> {
        let system = build_system(f, g, param_names, params)?;
        self.plane.set_system(system);
        self.equations = [f.to_string(), g.to_string()];
        Ok(())
    }

    pub(crate) fn replace_view(
        &mut self,
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
    ) -> Result<()> {
        let view = ViewRect::new(xmin, xmax, ymin, ymax)?;
        self.plane.set_view(view)
    }

    pub(crate) fn replace_settings(&mut self, settings: PortraitSettings) -> Result<()> {
        self.plane
            .set_settings(settings)
            .context("Settings rejected.")
    }
}

#[wasm_bindgen]
impl WasmPhasePlane {
    #[wasm_bindgen(constructor)]
    pub fn new(
        f: &str,
        g: &str,
        param_names: Vec<String>,
        params: Vec<f64>,
    ) -> Result<WasmPhasePlane, JsValue> {
        console_error_panic_hook::set_once();
        Self::create(f, g, &param_names, &params).map_err(to_js_error)
    }

    /// Recompiles both right-hand sides. Drops all trajectories on success;
    /// on failure the previous system is kept.
    pub fn set_equations(
        &mut self,
        f: &str,
        g: &str,
        param_names: Vec<String>,
        params: Vec<f64>,
    ) -> Result<(), JsValue> {
        self.replace_equations(f, g, &param_names, &params)
            .map_err(to_js_error)
    }

    pub fn equations(&self) -> Vec<String> {
        self.equations.to_vec()
    }

    pub fn set_view(&mut self, xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Result<(), JsValue> {
        self.replace_view(xmin, xmax, ymin, ymax)
            .map_err(to_js_error)
    }

    /// `[xmin, xmax, ymin, ymax]`.
    pub fn view(&self) -> Vec<f64> {
        view_to_vec(&self.plane.view())
    }

    /// View changes that would leave a degenerate or non-finite rectangle are
    /// rejected and the current view is kept.
    pub fn pan(&mut self, dx: f64, dy: f64) -> Result<(), JsValue> {
        self.plane.pan(dx, dy).map_err(to_js_error)
    }

    pub fn pan_screen(
        &mut self,
        width: f64,
        height: f64,
        dx_px: f64,
        dy_px: f64,
    ) -> Result<(), JsValue> {
        self.plane
            .pan_screen(width, height, dx_px, dy_px)
            .map_err(to_js_error)
    }

    pub fn zoom_at(&mut self, cx: f64, cy: f64, factor: f64) -> Result<(), JsValue> {
        self.plane.zoom_at(cx, cy, factor).map_err(to_js_error)
    }

    pub fn zoom_at_screen(
        &mut self,
        width: f64,
        height: f64,
        sx: f64,
        sy: f64,
        factor: f64,
    ) -> Result<(), JsValue> {
        self.plane
            .zoom_at_screen(width, height, sx, sy, factor)
            .map_err(to_js_error)
    }

    pub fn reset(&mut self) {
        self.plane.reset();
    }

    pub fn clear_trajectories(&mut self) {
        self.plane.clear_trajectories();
    }

    /// Seeds a trajectory at a world point. Returns `[forward, backward]`,
    /// each a flat `[x0, y0, x1, y1, ...]` array starting at the seed.
    pub fn seed(&mut self, x: f64, y: f64) -> Result<Array, JsValue> {
        self.plane
            .seed(Point::new(x, y))
            .map(flat_pair)
            .map_err(to_js_error)
    }

    /// Seeds at the world point under a device-space position.
    pub fn seed_screen(
        &mut self,
        width: f64,
        height: f64,
        sx: f64,
        sy: f64,
    ) -> Result<Array, JsValue> {
        let world = self.plane.view().to_world(width, height, Point::new(sx, sy));
        self.plane.seed(world).map(flat_pair).map_err(to_js_error)
    }

    pub fn reseed_all(&mut self) {
        self.plane.reseed_all();
    }

    pub fn trajectory_count(&self) -> usize {
        self.plane.history().len()
    }

    pub fn trajectories(&self) -> Result<JsValue, JsValue> {
        let all: Vec<&Trajectory> = self.plane.history().iter().collect();
        to_value(&all).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn nullclines(&self) -> Result<JsValue, JsValue> {
        to_value(&self.plane.nullclines())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Nullclines already mapped onto a `width` x `height` device surface.
    pub fn nullclines_screen(&self, width: f64, height: f64) -> Result<JsValue, JsValue> {
        let screen = self
            .plane
            .nullclines()
            .to_screen(&self.plane.view(), width, height);
        to_value(&screen).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Equilibria in the current view as a flat `[x0, y0, x1, y1, ...]` array.
    pub fn equilibria(&self) -> Float64Array {
        Float64Array::from(flatten_points(&self.plane.equilibria()).as_slice())
    }

    pub fn to_screen(&self, width: f64, height: f64, x: f64, y: f64) -> Vec<f64> {
        point_to_vec(self.plane.view().to_screen(width, height, Point::new(x, y)))
    }

    pub fn to_world(&self, width: f64, height: f64, sx: f64, sy: f64) -> Vec<f64> {
        point_to_vec(self.plane.view().to_world(width, height, Point::new(sx, sy)))
    }

    pub fn settings(&self) -> Result<JsValue, JsValue> {
        to_value(self.plane.settings())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn set_settings(&mut self, settings_val: JsValue) -> Result<(), JsValue> {
        let settings: PortraitSettings = from_value(settings_val)
            .map_err(|e| JsValue::from_str(&format!("Invalid settings: {}", e)))?;
        self.replace_settings(settings).map_err(to_js_error)
    }
}

#[cfg(test)]
mod tests {
    use super::WasmPhasePlane;
    use phaseplane_core::geometry::Point;
    use phaseplane_core::session::PortraitSettings;

    fn lotka_volterra() -> WasmPhasePlane {
        let names: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        WasmPhasePlane::create("a*x - b*x*y", "-c*y + d*x*y", &names, &[1.1, 0.4, 0.4, 0.1])
            .expect("plane")
    }

    #[test]
    fn create_rejects_bad_equations() {
        assert!(WasmPhasePlane::create("x *", "y", &[], &[]).is_err());
        assert!(WasmPhasePlane::create("x", "y", &["k".to_string()], &[]).is_err());
    }

    #[test]
    fn view_and_coordinate_helpers() {
        let mut plane = lotka_volterra();
        assert_eq!(plane.view(), vec![-10.0, 10.0, -10.0, 10.0]);

        let screen = plane.to_screen(800.0, 600.0, 0.0, 0.0);
        assert!((screen[0] - 400.0).abs() < 1e-9);
        assert!((screen[1] - 300.0).abs() < 1e-9);
        let world = plane.to_world(800.0, 600.0, screen[0], screen[1]);
        assert!(world[0].abs() < 1e-9 && world[1].abs() < 1e-9);

        plane.pan(1.0, -2.0).expect("pan");
        assert_eq!(plane.view(), vec![-9.0, 11.0, -12.0, 8.0]);

        plane.reset();
        plane.zoom_at(0.0, 0.0, 2.0).expect("zoom");
        assert_eq!(plane.view(), vec![-5.0, 5.0, -5.0, 5.0]);
    }

    #[test]
    fn replace_view_validates() {
        let mut plane = lotka_volterra();
        assert!(plane.replace_view(1.0, 1.0, 0.0, 1.0).is_err());
        assert!(plane.replace_view(0.0, 8.0, -1.0, 5.0).is_ok());
        assert_eq!(plane.view(), vec![0.0, 8.0, -1.0, 5.0]);
    }

    #[test]
    fn replacing_equations_clears_history() {
        let mut plane = lotka_volterra();
        plane.reseed_all();
        assert_eq!(plane.trajectory_count(), 0);

        plane
            .plane
            .seed(Point::new(1.0, 1.0))
            .expect("seed");
        assert_eq!(plane.trajectory_count(), 1);

        assert!(plane.replace_equations("x +", "y", &[], &[]).is_err());
        assert_eq!(plane.trajectory_count(), 1, "failed replace keeps state");
        assert_eq!(plane.equations()[0], "a*x - b*x*y");

        plane.replace_equations("-y", "x", &[], &[]).expect("replace");
        assert_eq!(plane.trajectory_count(), 0);
        assert_eq!(plane.equations(), vec!["-y".to_string(), "x".to_string()]);
    }

    #[test]
    fn replace_settings_validates() {
        let mut plane = lotka_volterra();
        let mut settings = PortraitSettings::default();
        settings.history_capacity = 0;
        assert!(plane.replace_settings(settings).is_err());

        settings.history_capacity = 2;
        plane.replace_settings(settings).expect("settings");
        for i in 0..4 {
            plane
                .plane
                .seed(Point::new(i as f64, 1.0))
                .expect("seed");
        }
        assert_eq!(plane.trajectory_count(), 2);
    }
}
