use num_traits::{Float, FromPrimitive};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Numeric types the generic steppers accept.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// A first-order ODE `dx/dt = F(t, x)` on a state vector of fixed length.
pub trait DynamicalSystem<T: Scalar> {
    /// Length of the state vector `apply` reads and writes.
    fn dimension(&self) -> usize;

    /// Writes `F(t, x)` into `out`. Both slices have length `dimension()`.
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

/// Advances a [`DynamicalSystem`] by one step in place.
pub trait Steppable<T: Scalar> {
    /// Moves `state` from `t` to `t + dt` and updates `t`. A negative `dt`
    /// runs time backward.
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T);
}

/// A pure scalar function of the plane, `(x, y) -> value`.
///
/// Any closure `Fn(f64, f64) -> f64` is a field, so callers can pass compiled
/// expressions, hand-written functions, or captured-parameter closures alike.
pub trait ScalarField {
    fn eval(&self, x: f64, y: f64) -> f64;
}

impl<F> ScalarField for F
where
    F: Fn(f64, f64) -> f64,
{
    fn eval(&self, x: f64, y: f64) -> f64 {
        self(x, y)
    }
}

/// Named numeric parameters a system's fields close over.
pub type ParamMap = BTreeMap<String, f64>;

/// A planar autonomous system `dx/dt = f(x, y)`, `dy/dt = g(x, y)`.
pub trait PlanarSystem {
    fn f(&self, x: f64, y: f64) -> f64;

    fn g(&self, x: f64, y: f64) -> f64;

    /// Parameter values the fields were built from. Informational only; the
    /// fields have already captured them.
    fn params(&self) -> &ParamMap;
}
