//! Expression system construction and small conversion helpers.

use anyhow::{bail, Result};
use phaseplane_core::expression::{compile_system, ExpressionSystem};
use phaseplane_core::geometry::Point;
use phaseplane_core::traits::ParamMap;
use phaseplane_core::view::ViewRect;

pub(crate) fn build_param_map(param_names: &[String], params: &[f64]) -> Result<ParamMap> {
    if param_names.len() != params.len() {
        bail!(
            "Parameter count mismatch: {} names, {} values.",
            param_names.len(),
            params.len()
        );
    }
    let mut map = ParamMap::new();
    for (name, value) in param_names.iter().zip(params) {
        let name = name.trim();
        if name.is_empty() {
            bail!("Parameter names must not be empty.");
        }
        if map.insert(name.to_string(), *value).is_some() {
            bail!("Duplicate parameter name '{}'.", name);
        }
    }
    Ok(map)
}

pub(crate) fn build_system(
    f: &str,
    g: &str,
    param_names: &[String],
    params: &[f64],
) -> Result<ExpressionSystem> {
    let map = build_param_map(param_names, params)?;
    let system = compile_system(f, g, map)?;
    Ok(system)
}

pub(crate) fn view_to_vec(view: &ViewRect) -> Vec<f64> {
    vec![view.xmin, view.xmax, view.ymin, view.ymax]
}

pub(crate) fn point_to_vec(p: Point) -> Vec<f64> {
    vec![p.x, p.y]
}

#[cfg(test)]
mod tests {
    use super::*;
    use phaseplane_core::traits::PlanarSystem;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builds_lotka_volterra() {
        let system = build_system(
            "a*x - b*x*y",
            "-c*y + d*x*y",
            &names(&["a", "b", "c", "d"]),
            &[1.1, 0.4, 0.4, 0.1],
        )
        .expect("system");
        assert!((system.f(4.0, 2.75)).abs() < 1e-12);
        assert!((system.g(4.0, 2.75)).abs() < 1e-12);
    }

    #[test]
    fn rejects_mismatched_parameters() {
        let err = build_system("a*x", "y", &names(&["a", "b"]), &[1.0])
            .expect_err("mismatch should fail");
        assert!(err.to_string().contains("mismatch"));
    }

    #[test]
    fn rejects_duplicate_parameter_names() {
        assert!(build_param_map(&names(&["a", "a"]), &[1.0, 2.0]).is_err());
        assert!(build_param_map(&names(&[" "]), &[1.0]).is_err());
    }

    #[test]
    fn surfaces_expression_errors() {
        let err = build_system("x +", "y", &[], &[]).expect_err("parse should fail");
        assert!(!err.to_string().is_empty());
        assert!(build_system("q * x", "y", &[], &[]).is_err());
    }

    #[test]
    fn flattening_helpers_keep_order() {
        let view = ViewRect::new(-1.0, 2.0, -3.0, 4.0).expect("view");
        assert_eq!(view_to_vec(&view), vec![-1.0, 2.0, -3.0, 4.0]);
        assert_eq!(point_to_vec(Point::new(0.5, -0.5)), vec![0.5, -0.5]);
    }
}
