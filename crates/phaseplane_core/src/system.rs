use crate::traits::{DynamicalSystem, ParamMap, PlanarSystem, ScalarField};

/// A planar system assembled from two scalar fields and the parameters they
/// were built from. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct System<F, G> {
    f: F,
    g: G,
    params: ParamMap,
}

impl<F: ScalarField, G: ScalarField> System<F, G> {
    pub fn new(f: F, g: G, params: ParamMap) -> Self {
        Self { f, g, params }
    }

    pub fn f_field(&self) -> &F {
        &self.f
    }

    pub fn g_field(&self) -> &G {
        &self.g
    }
}

impl<F: ScalarField, G: ScalarField> PlanarSystem for System<F, G> {
    fn f(&self, x: f64, y: f64) -> f64 {
        self.f.eval(x, y)
    }

    fn g(&self, x: f64, y: f64) -> f64 {
        self.g.eval(x, y)
    }

    fn params(&self) -> &ParamMap {
        &self.params
    }
}

/// Views a [`PlanarSystem`] as a two-dimensional autonomous
/// [`DynamicalSystem`] so the generic steppers can drive it.
pub struct Flow<'a, S: ?Sized>(pub &'a S);

impl<S: PlanarSystem + ?Sized> DynamicalSystem<f64> for Flow<'_, S> {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        out[0] = self.0.f(x[0], x[1]);
        out[1] = self.0.g(x[0], x[1]);
    }
}

/// Field view of the first component, for contouring the x-nullcline.
pub struct FComponent<'a, S: ?Sized>(pub &'a S);

impl<S: PlanarSystem + ?Sized> ScalarField for FComponent<'_, S> {
    fn eval(&self, x: f64, y: f64) -> f64 {
        self.0.f(x, y)
    }
}

/// Field view of the second component, for contouring the y-nullcline.
pub struct GComponent<'a, S: ?Sized>(pub &'a S);

impl<S: PlanarSystem + ?Sized> ScalarField for GComponent<'_, S> {
    fn eval(&self, x: f64, y: f64) -> f64 {
        self.0.g(x, y)
    }
}


#[cfg(test)]
mod tests {
    use super::test_systems::lotka_volterra;
    use super::*;

    #[test]
    fn flow_adapter_evaluates_both_components() {
        let system = lotka_volterra();
        let flow = Flow(&system);
        let mut out = [0.0; 2];
        flow.apply(0.0, &[2.0, 1.0], &mut out);
        assert!((out[0] - (1.1 * 2.0 - 0.4 * 2.0)).abs() < 1e-12);
        assert!((out[1] - (-0.4 + 0.1 * 2.0)).abs() < 1e-12);
        assert_eq!(flow.dimension(), 2);
    }

    #[test]
    fn system_keeps_parameters() {
        let system = lotka_volterra();
        assert_eq!(system.params().get("c"), Some(&0.4));
        assert_eq!(system.params().len(), 4);
    }
}
