pub mod contour;
pub mod equilibrium;
pub mod expression;
pub mod geometry;
pub mod integrator;
pub mod nullcline;
pub mod session;
pub mod solvers;
pub mod stitch;
pub mod system;
/// The `phaseplane_core` crate is the numerical engine behind phase portraits of
/// planar autonomous systems `dx/dt = f(x, y)`, `dy/dt = g(x, y)`.
///
/// Key components:
/// - **Traits**: `ScalarField` and `PlanarSystem` (the system capability), plus the
///   generic `DynamicalSystem`/`Steppable` pair the steppers run on.
/// - **View**: world rectangle, screen mapping, pan/zoom and integration bounds.
/// - **Integrator**: bounded fixed-step RK4 trajectories in both time directions.
/// - **Contour / Stitch**: marching-squares zero sets and polyline reassembly.
/// - **Equilibrium**: nullcline intersection with Newton refinement.
/// - **Session**: view, system and bounded trajectory history for a front end.
/// - **Expression**: compiles user-entered algebra into scalar fields.
pub mod traits;
pub mod view;
