//! Equilibrium detection: nullcline intersection followed by Newton polish.
//!
//! This is a resolution-bounded heuristic. Equilibria closer together than
//! the sampling grid can merge into one or be missed.

use crate::contour::zero_contour_segments;
use crate::geometry::{Point, Segment};
use crate::system::{FComponent, GComponent};
use crate::traits::PlanarSystem;
use crate::view::ViewRect;
use anyhow::{bail, Result};
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::debug;

const PARALLEL_EPS: f64 = 1e-20;
const PARAM_SLACK: f64 = 1e-9;
const SINGULAR_EPS: f64 = 1e-20;
const CONVERGED_STEP: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumSettings {
    /// Grid cells per axis used for both nullcline extractions.
    pub density: usize,
    /// Candidate merge radius. Defaults to 0.75 of the smaller cell side.
    pub merge_tolerance: Option<f64>,
    pub newton_iterations: usize,
}

impl Default for EquilibriumSettings {
    fn default() -> Self {
        Self {
            density: 120,
            merge_tolerance: None,
            newton_iterations: 3,
        }
    }
}

impl EquilibriumSettings {
    pub fn with_density(density: usize) -> Self {
        Self {
            density,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.density == 0 {
            bail!("Equilibrium grid density must be at least 1.");
        }
        if let Some(tol) = self.merge_tolerance {
            if !tol.is_finite() || tol <= 0.0 {
                bail!("merge_tolerance must be finite and positive.");
            }
        }
        Ok(())
    }
}

/// [`find_equilibria_with`] using default settings at `density`.
pub fn find_equilibria<S: PlanarSystem + ?Sized>(
    rect: &ViewRect,
    system: &S,
    density: usize,
) -> Vec<Point> {
    find_equilibria_with(rect, system, &EquilibriumSettings::with_density(density))
}

/// Locates points where both `f` and `g` vanish inside `rect`.
///
/// Candidates are intersections of the two zero contours, merged greedily in
/// generation order (a candidate is dropped when an already kept point lies
/// within the merge tolerance), then refined by a few Newton steps using a
/// central-difference Jacobian.
pub fn find_equilibria_with<S: PlanarSystem + ?Sized>(
    rect: &ViewRect,
    system: &S,
    settings: &EquilibriumSettings,
) -> Vec<Point> {
    let density = settings.density;
    if density == 0 {
        return Vec::new();
    }

    let f_segments = zero_contour_segments(rect, &FComponent(system), density, density);
    let g_segments = zero_contour_segments(rect, &GComponent(system), density, density);

    let mut candidates = Vec::new();
    for fs in &f_segments {
        for gs in &g_segments {
            if let Some(p) = segment_intersection(fs, gs) {
                candidates.push(p);
            }
        }
    }

    let cell_w = rect.width() / density as f64;
    let cell_h = rect.height() / density as f64;
    let tol = settings
        .merge_tolerance
        .unwrap_or(0.75 * cell_w.min(cell_h));
    let merged = merge_candidates(&candidates, tol);

    let fd_step = 0.5 * tol;
    let refined: Vec<Point> = merged
        .into_iter()
        .map(|p| newton_refine(system, p, fd_step, settings.newton_iterations))
        .collect();

    debug!(
        f_segments = f_segments.len(),
        g_segments = g_segments.len(),
        candidates = candidates.len(),
        equilibria = refined.len(),
        "equilibrium search finished"
    );
    refined
}

/// Parametric intersection of two segments, tolerant of endpoint touches.
pub fn segment_intersection(s1: &Segment, s2: &Segment) -> Option<Point> {
    let (rx, ry) = (s1.b.x - s1.a.x, s1.b.y - s1.a.y);
    let (sx, sy) = (s2.b.x - s2.a.x, s2.b.y - s2.a.y);
    let det = rx * sy - ry * sx;
    if det.abs() < PARALLEL_EPS {
        return None;
    }

    let (qx, qy) = (s2.a.x - s1.a.x, s2.a.y - s1.a.y);
    let t = (qx * sy - qy * sx) / det;
    let u = (qx * ry - qy * rx) / det;
    let in_range = |v: f64| (-PARAM_SLACK..=1.0 + PARAM_SLACK).contains(&v);
    if !in_range(t) || !in_range(u) {
        return None;
    }

    Some(Point::new(s1.a.x + t * rx, s1.a.y + t * ry))
}

/// Greedy first-seen-wins deduplication.
fn merge_candidates(candidates: &[Point], tol: f64) -> Vec<Point> {
    let mut kept: Vec<Point> = Vec::new();
    for c in candidates {
        if kept.iter().all(|k| k.distance(c) > tol) {
            kept.push(*c);
        }
    }
    kept
}

fn residual<S: PlanarSystem + ?Sized>(system: &S, p: Point) -> Vector2<f64> {
    Vector2::new(system.f(p.x, p.y), system.g(p.x, p.y))
}

fn central_difference_jacobian<S: PlanarSystem + ?Sized>(
    system: &S,
    p: Point,
    h: f64,
) -> Matrix2<f64> {
    let inv = 1.0 / (2.0 * h);
    let dx = (residual(system, Point::new(p.x + h, p.y))
        - residual(system, Point::new(p.x - h, p.y)))
        * inv;
    let dy = (residual(system, Point::new(p.x, p.y + h))
        - residual(system, Point::new(p.x, p.y - h)))
        * inv;
    Matrix2::new(dx[0], dy[0], dx[1], dy[1])
}

fn newton_refine<S: PlanarSystem + ?Sized>(
    system: &S,
    start: Point,
    h: f64,
    max_steps: usize,
) -> Point {
    let mut p = start;
    for _ in 0..max_steps {
        let jacobian = central_difference_jacobian(system, p, h);
        if jacobian.determinant().abs() < SINGULAR_EPS {
            break;
        }
        let rhs = -residual(system, p);
        let Some(delta) = jacobian.lu().solve(&rhs) else {
            break;
        };
        if !(delta[0].is_finite() && delta[1].is_finite()) {
            break;
        }
        p = Point::new(p.x + delta[0], p.y + delta[1]);
        if delta.norm() < CONVERGED_STEP {
            break;
        }
    }
    p
}
