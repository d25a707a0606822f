//! Fixed-step trajectory integration bounded by a world rectangle.

use crate::geometry::Point;
use crate::solvers::RK4;
use crate::system::Flow;
use crate::traits::{DynamicalSystem, PlanarSystem, Steppable};
use crate::view::{ViewRect, DEFAULT_BOUNDS_FACTOR};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegrationSettings {
    pub dt: f64,
    pub steps: usize,
    pub bounds_factor: f64,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            dt: 0.01,
            steps: 5000,
            bounds_factor: DEFAULT_BOUNDS_FACTOR,
        }
    }
}

impl IntegrationSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            bail!("Step size dt must be finite and positive.");
        }
        if !self.bounds_factor.is_finite() || self.bounds_factor < 1.0 {
            bail!("bounds_factor must be finite and at least 1.");
        }
        Ok(())
    }
}

/// A seed with the orbits through it in both time directions. Both
/// sequences begin with the seed itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub seed: Point,
    pub forward: Vec<Point>,
    pub backward: Vec<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
    StepCap,
    NonFinite,
    OutOfBounds,
}

/// Integrates from `p0` with signed step `dt` for at most `steps` RK4 steps.
///
/// Stops at the first sample that is non-finite or outside `bounds`
/// (inclusive); that sample is not part of the result. The returned sequence
/// always starts with `p0`.
pub fn rk4<S: PlanarSystem + ?Sized>(
    system: &S,
    p0: Point,
    dt: f64,
    steps: usize,
    bounds: &ViewRect,
) -> Vec<Point> {
    let flow = Flow(system);
    let mut stepper = RK4::new(flow.dimension());
    let mut state = [p0.x, p0.y];
    let mut t = 0.0;
    let mut points = Vec::with_capacity(steps.min(1 << 16) + 1);
    points.push(p0);

    let mut termination = Termination::StepCap;
    for _ in 0..steps {
        stepper.step(&flow, &mut t, &mut state, dt);
        let next = Point::new(state[0], state[1]);
        if !next.is_finite() {
            termination = Termination::NonFinite;
            break;
        }
        if !bounds.contains(next) {
            termination = Termination::OutOfBounds;
            break;
        }
        points.push(next);
    }

    trace!(
        dt,
        accepted = points.len(),
        ?termination,
        "rk4 integration finished"
    );
    points
}

/// Runs [`rk4`] forward (`+dt`) and backward (`-dt`) from the same seed.
/// The two runs share no state.
pub fn integrate_bidirectional<S: PlanarSystem + ?Sized>(
    system: &S,
    seed: Point,
    dt: f64,
    steps: usize,
    bounds: &ViewRect,
) -> Trajectory {
    Trajectory {
        seed,
        forward: rk4(system, seed, dt, steps, bounds),
        backward: rk4(system, seed, -dt, steps, bounds),
    }
}
