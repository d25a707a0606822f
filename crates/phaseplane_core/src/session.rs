//! Caller-side portrait state: the current system, the view, and the
//! trajectories seeded so far.

use crate::equilibrium::{find_equilibria_with, EquilibriumSettings};
use crate::geometry::Point;
use crate::integrator::{integrate_bidirectional, IntegrationSettings, Trajectory};
use crate::nullcline::{compute_nullclines, ContourSettings, Nullclines};
use crate::traits::PlanarSystem;
use crate::view::{integration_bounds_for, ViewRect};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortraitSettings {
    pub integration: IntegrationSettings,
    pub contour: ContourSettings,
    pub equilibrium: EquilibriumSettings,
    pub history_capacity: usize,
    pub min_zoom_factor: f64,
    pub max_zoom_factor: f64,
}

impl Default for PortraitSettings {
    fn default() -> Self {
        Self {
            integration: IntegrationSettings::default(),
            contour: ContourSettings::default(),
            equilibrium: EquilibriumSettings::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            min_zoom_factor: 0.01,
            max_zoom_factor: 100.0,
        }
    }
}

impl PortraitSettings {
    pub fn validate(&self) -> Result<()> {
        self.integration
            .validate()
            .context("Invalid integration settings.")?;
        self.contour.validate().context("Invalid contour settings.")?;
        self.equilibrium
            .validate()
            .context("Invalid equilibrium settings.")?;
        if self.history_capacity == 0 {
            bail!("history_capacity must be at least 1.");
        }
        if !(self.min_zoom_factor > 0.0
            && self.min_zoom_factor <= self.max_zoom_factor
            && self.max_zoom_factor.is_finite())
        {
            bail!("Zoom factor range must satisfy 0 < min <= max < inf.");
        }
        Ok(())
    }
}

/// Most-recent-N trajectory store; the oldest entry is evicted first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryHistory {
    capacity: usize,
    entries: VecDeque<Trajectory>,
}

impl TrajectoryHistory {
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
        }
    }

    /// Stores `trajectory`, evicting the oldest entries beyond capacity, and
    /// returns the stored value.
    pub fn push(&mut self, trajectory: Trajectory) -> &Trajectory {
        while self.entries.len() >= self.capacity.max(1) {
            self.entries.pop_front();
        }
        self.entries.push_back(trajectory);
        &self.entries[self.entries.len() - 1]
    }

    pub fn latest(&self) -> Option<&Trajectory> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Trajectory> {
        self.entries.iter()
    }

    fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }
}

/// Holds the state slots a phase portrait front end mutates: the system, the
/// view and the trajectory history. All geometry is computed on demand by the
/// pure functions of this crate.
pub struct PhasePlane<S: PlanarSystem> {
    system: S,
    view: ViewRect,
    settings: PortraitSettings,
    history: TrajectoryHistory,
}

impl<S: PlanarSystem> PhasePlane<S> {
    pub fn new(system: S) -> Self {
        let settings = PortraitSettings::default();
        Self {
            system,
            view: ViewRect::default(),
            history: TrajectoryHistory::with_capacity(settings.history_capacity),
            settings,
        }
    }

    pub fn with_settings(system: S, settings: PortraitSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            system,
            view: ViewRect::default(),
            history: TrajectoryHistory::with_capacity(settings.history_capacity),
            settings,
        })
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    pub fn view(&self) -> ViewRect {
        self.view
    }

    pub fn settings(&self) -> &PortraitSettings {
        &self.settings
    }

    pub fn history(&self) -> &TrajectoryHistory {
        &self.history
    }

    /// Replaces the system. Existing trajectories belong to the old vector
    /// field and are dropped.
    pub fn set_system(&mut self, system: S) {
        debug!(cleared = self.history.len(), "system replaced");
        self.system = system;
        self.history.clear();
    }

    pub fn set_settings(&mut self, settings: PortraitSettings) -> Result<()> {
        settings.validate()?;
        self.history.set_capacity(settings.history_capacity);
        self.settings = settings;
        Ok(())
    }

    /// Installs `view` if it is a valid rectangle; otherwise the current view
    /// is kept.
    pub fn set_view(&mut self, view: ViewRect) -> Result<()> {
        self.view = ViewRect::new(view.xmin, view.xmax, view.ymin, view.ymax)?;
        Ok(())
    }

    /// Clears all trajectories and restores the default view.
    pub fn reset(&mut self) {
        debug!(cleared = self.history.len(), "portrait reset");
        self.history.clear();
        self.view = ViewRect::default();
    }

    pub fn clear_trajectories(&mut self) {
        self.history.clear();
    }

    fn apply_view(&mut self, candidate: ViewRect, action: &'static str) -> Result<()> {
        self.set_view(candidate).map_err(|err| {
            debug!(action, %err, "view change rejected");
            err
        })?;
        Ok(())
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> Result<()> {
        let candidate = self.view.pan(dx, dy);
        self.apply_view(candidate, "pan")
            .with_context(|| format!("Cannot pan by ({dx}, {dy})."))
    }

    pub fn pan_screen(&mut self, w: f64, h: f64, dx_px: f64, dy_px: f64) -> Result<()> {
        if !(w > 0.0 && h > 0.0) {
            bail!("Surface size must be positive (got {w} x {h}).");
        }
        let candidate = self.view.pan_screen(w, h, dx_px, dy_px);
        self.apply_view(candidate, "pan_screen")
            .context("Cannot pan by a screen drag.")
    }

    /// Zooms about a world point, clamping `factor` to the configured range.
    /// A zoom that would collapse the view below floating-point resolution
    /// leaves it unchanged and returns an error.
    pub fn zoom_at(&mut self, cx: f64, cy: f64, factor: f64) -> Result<()> {
        let factor = if factor.is_finite() {
            factor.clamp(self.settings.min_zoom_factor, self.settings.max_zoom_factor)
        } else {
            1.0
        };
        let candidate = self.view.zoom(cx, cy, factor);
        self.apply_view(candidate, "zoom")
            .with_context(|| format!("Cannot zoom by {factor} about ({cx}, {cy})."))
    }

    /// Zooms about the world point under a device-space pointer position.
    pub fn zoom_at_screen(
        &mut self,
        w: f64,
        h: f64,
        sx: f64,
        sy: f64,
        factor: f64,
    ) -> Result<()> {
        if !(w > 0.0 && h > 0.0) {
            bail!("Surface size must be positive (got {w} x {h}).");
        }
        let anchor = self.view.to_world(w, h, Point::new(sx, sy));
        self.zoom_at(anchor.x, anchor.y, factor)
    }

    fn integrate(&self, seed: Point) -> Trajectory {
        let integration = &self.settings.integration;
        let bounds = integration_bounds_for(&self.view, seed, integration.bounds_factor);
        integrate_bidirectional(
            &self.system,
            seed,
            integration.dt,
            integration.steps,
            &bounds,
        )
    }

    /// Integrates through `seed` in both directions and records the result.
    /// Non-finite seeds are rejected and leave the history untouched.
    pub fn seed(&mut self, seed: Point) -> Result<&Trajectory> {
        if !seed.is_finite() {
            bail!("Seed must be finite (got ({}, {})).", seed.x, seed.y);
        }
        let trajectory = self.integrate(seed);
        debug!(
            x = seed.x,
            y = seed.y,
            forward = trajectory.forward.len(),
            backward = trajectory.backward.len(),
            "trajectory seeded"
        );
        Ok(self.history.push(trajectory))
    }

    /// Recomputes every retained trajectory from its seed against the
    /// current view, keeping history order.
    pub fn reseed_all(&mut self) {
        let seeds: Vec<Point> = self.history.iter().map(|t| t.seed).collect();
        let mut refreshed = TrajectoryHistory::with_capacity(self.history.capacity());
        for seed in seeds {
            refreshed.push(self.integrate(seed));
        }
        debug!(trajectories = refreshed.len(), "trajectories reseeded");
        self.history = refreshed;
    }

    pub fn nullclines(&self) -> Nullclines {
        compute_nullclines(&self.view, &self.system, &self.settings.contour)
    }

    pub fn equilibria(&self) -> Vec<Point> {
        find_equilibria_with(&self.view, &self.system, &self.settings.equilibrium)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::test_systems::{linear, lotka_volterra};

    fn small_settings() -> PortraitSettings {
        PortraitSettings {
            integration: IntegrationSettings {
                dt: 0.05,
                steps: 20,
                ..IntegrationSettings::default()
            },
            history_capacity: 3,
            ..PortraitSettings::default()
        }
    }

    #[test]
    fn history_evicts_oldest_first() {
        let mut plane =
            PhasePlane::with_settings(lotka_volterra(), small_settings()).expect("valid settings");
        for i in 0..5 {
            plane.seed(Point::new(1.0 + i as f64, 1.0)).expect("finite seed");
        }
        let seeds: Vec<f64> = plane.history().iter().map(|t| t.seed.x).collect();
        assert_eq!(seeds, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn zero_capacity_history_still_keeps_latest() {
        let mut history = TrajectoryHistory::with_capacity(0);
        let trajectory = Trajectory {
            seed: Point::new(1.0, 2.0),
            forward: vec![Point::new(1.0, 2.0)],
            backward: vec![Point::new(1.0, 2.0)],
        };
        history.push(trajectory.clone());
        history.push(trajectory.clone());
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest(), Some(&trajectory));
    }

    #[test]
    fn default_history_capacity_is_one_thousand() {
        let plane = PhasePlane::new(lotka_volterra());
        assert_eq!(plane.history().capacity(), 1000);
    }

    #[test]
    fn seed_returns_anchored_trajectory() {
        let mut plane = PhasePlane::new(lotka_volterra());
        let seed = Point::new(2.0, 1.5);
        let trajectory = plane.seed(seed).expect("finite seed");
        assert_eq!(trajectory.forward[0], seed);
        assert_eq!(trajectory.backward[0], seed);
        assert_eq!(plane.history().len(), 1);
    }

    #[test]
    fn seed_outside_view_is_not_clipped() {
        let mut plane =
            PhasePlane::with_settings(linear(0.0, 0.0, 0.0, 0.0), small_settings())
                .expect("valid settings");
        let seed = Point::new(500.0, -500.0);
        let trajectory = plane.seed(seed).expect("finite seed").clone();
        assert_eq!(trajectory.forward.len(), 21);
        assert_eq!(trajectory.backward.len(), 21);
    }

    #[test]
    fn changing_system_clears_history() {
        let mut plane = PhasePlane::new(linear(-1.0, 0.0, 0.0, -1.0));
        plane.seed(Point::new(1.0, 1.0)).expect("finite seed");
        plane.seed(Point::new(-1.0, 2.0)).expect("finite seed");
        assert_eq!(plane.history().len(), 2);
        plane.set_system(linear(1.0, 0.0, 0.0, 1.0));
        assert!(plane.history().is_empty());
    }

    #[test]
    fn reset_restores_default_view() {
        let mut plane = PhasePlane::new(lotka_volterra());
        plane.pan(3.0, 4.0).expect("valid view");
        plane.zoom_at(0.0, 0.0, 2.0).expect("valid view");
        plane.seed(Point::new(1.0, 1.0)).expect("finite seed");
        plane.reset();
        assert_eq!(plane.view(), ViewRect::default());
        assert!(plane.history().is_empty());
    }

    #[test]
    fn zoom_factor_is_clamped() {
        let mut plane = PhasePlane::new(lotka_volterra());
        plane.zoom_at(0.0, 0.0, 1e9).expect("valid view");
        let width = plane.view().width();
        assert!((width - 20.0 / 100.0).abs() < 1e-12, "width {width}");

        let before = plane.view();
        plane.zoom_at(0.0, 0.0, f64::INFINITY).expect("valid view");
        assert_eq!(plane.view(), before);
    }

    #[test]
    fn zoom_at_screen_keeps_pointer_anchor() {
        let mut plane = PhasePlane::new(lotka_volterra());
        let anchor_before = plane.view().to_world(400.0, 400.0, Point::new(100.0, 300.0));
        plane.zoom_at_screen(400.0, 400.0, 100.0, 300.0, 2.0).expect("valid view");
        let anchor_after = plane.view().to_world(400.0, 400.0, Point::new(100.0, 300.0));
        assert!(anchor_before.distance(&anchor_after) < 1e-12);
    }

    #[test]
    fn reseed_all_keeps_seeds_and_order() {
        let mut plane =
            PhasePlane::with_settings(lotka_volterra(), small_settings()).expect("valid settings");
        plane.seed(Point::new(1.0, 1.0)).expect("finite seed");
        plane.seed(Point::new(2.0, 2.0)).expect("finite seed");
        plane.pan(1.0, 0.0).expect("valid view");
        plane.reseed_all();
        let seeds: Vec<Point> = plane.history().iter().map(|t| t.seed).collect();
        assert_eq!(seeds, vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)]);
    }

    #[test]
    fn shrinking_capacity_drops_oldest() {
        let mut plane = PhasePlane::new(lotka_volterra());
        for i in 0..4 {
            plane.seed(Point::new(i as f64, 1.0)).expect("finite seed");
        }
        let settings = PortraitSettings {
            history_capacity: 2,
            ..PortraitSettings::default()
        };
        plane.set_settings(settings).expect("valid settings");
        let seeds: Vec<f64> = plane.history().iter().map(|t| t.seed.x).collect();
        assert_eq!(seeds, vec![2.0, 3.0]);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = PortraitSettings {
            min_zoom_factor: 0.0,
            ..PortraitSettings::default()
        };
        assert!(PhasePlane::with_settings(lotka_volterra(), settings).is_err());

        let mut plane = PhasePlane::new(lotka_volterra());
        let bad_view = ViewRect {
            xmin: 1.0,
            xmax: -1.0,
            ymin: 0.0,
            ymax: 1.0,
        };
        assert!(plane.set_view(bad_view).is_err());
        assert_eq!(plane.view(), ViewRect::default());
    }

    #[test]
    fn equilibria_and_nullclines_follow_view() {
        let plane = PhasePlane::new(lotka_volterra());
        assert_eq!(plane.equilibria().len(), 2);
        let nullclines = plane.nullclines();
        assert!(!nullclines.x_nullcline.is_empty());
        assert!(!nullclines.y_nullcline.is_empty());
    }

    #[test]
    fn zoom_that_collapses_the_view_is_rejected() {
        let mut plane = PhasePlane::new(lotka_volterra());
        plane
            .set_view(ViewRect::new(1e6 - 10.0, 1e6 + 10.0, -10.0, 10.0).expect("valid rect"))
            .expect("valid view");
        let mut rejected = false;
        for _ in 0..6 {
            let before = plane.view();
            if plane.zoom_at(1e6 + 1.0, 0.0, 100.0).is_err() {
                assert_eq!(plane.view(), before);
                rejected = true;
            }
            let view = plane.view();
            assert!(view.xmin < view.xmax && view.ymin < view.ymax, "degenerate {view:?}");
        }
        assert!(rejected, "extent should have hit floating-point resolution");
    }

    #[test]
    fn degenerate_pans_keep_the_view() {
        let mut plane = PhasePlane::new(lotka_volterra());
        assert!(plane.pan_screen(0.0, 0.0, 5.0, 5.0).is_err());
        assert!(plane.pan(f64::NAN, 0.0).is_err());
        assert!(plane.pan(0.0, f64::INFINITY).is_err());
        assert!(plane.zoom_at_screen(0.0, 400.0, 10.0, 10.0, 2.0).is_err());
        assert_eq!(plane.view(), ViewRect::default());

        plane.pan_screen(200.0, 200.0, 10.0, 0.0).expect("valid drag");
        assert!((plane.view().xmin - (-11.0)).abs() < 1e-12);
    }

    #[test]
    fn non_finite_seed_is_rejected() {
        let mut plane = PhasePlane::new(lotka_volterra());
        assert!(plane.seed(Point::new(f64::NAN, 1.0)).is_err());
        assert!(plane.seed(Point::new(1.0, f64::NEG_INFINITY)).is_err());
        assert!(plane.history().is_empty());
    }
}
