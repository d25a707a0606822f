use crate::contour::zero_contour_segments;
use crate::geometry::Polyline;
use crate::stitch::stitch_segments_with_tolerance;
use crate::system::{FComponent, GComponent};
use crate::traits::{PlanarSystem, ScalarField};
use crate::view::ViewRect;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourSettings {
    /// Grid cells per axis.
    pub density: usize,
    /// Endpoint matching quantum in world units. Defaults to 1% of the
    /// smaller grid cell side.
    pub stitch_tolerance: Option<f64>,
}

impl Default for ContourSettings {
    fn default() -> Self {
        Self {
            density: 120,
            stitch_tolerance: None,
        }
    }
}

impl ContourSettings {
    pub fn validate(&self) -> Result<()> {
        if self.density == 0 {
            bail!("Contour grid density must be at least 1.");
        }
        if let Some(tol) = self.stitch_tolerance {
            if !tol.is_finite() || tol <= 0.0 {
                bail!("stitch_tolerance must be finite and positive.");
            }
        }
        Ok(())
    }

    fn tolerance_for(&self, rect: &ViewRect) -> f64 {
        self.stitch_tolerance.unwrap_or_else(|| {
            let d = self.density.max(1) as f64;
            0.01 * (rect.width() / d).min(rect.height() / d)
        })
    }
}

/// The zero sets of `f` (where horizontal motion stops) and of `g` (where
/// vertical motion stops), as world-space polylines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nullclines {
    pub x_nullcline: Vec<Polyline>,
    pub y_nullcline: Vec<Polyline>,
}

impl Nullclines {
    /// Maps every polyline onto a `w` x `h` device surface.
    pub fn to_screen(&self, view: &ViewRect, w: f64, h: f64) -> Nullclines {
        let map = |lines: &[Polyline]| -> Vec<Polyline> {
            lines
                .iter()
                .map(|line| line.iter().map(|p| view.to_screen(w, h, *p)).collect())
                .collect()
        };
        Nullclines {
            x_nullcline: map(&self.x_nullcline),
            y_nullcline: map(&self.y_nullcline),
        }
    }
}

/// Extracts and stitches the zero contour of a single field.
pub fn contour_polylines<F: ScalarField + ?Sized>(
    rect: &ViewRect,
    field: &F,
    settings: &ContourSettings,
) -> Vec<Polyline> {
    let segments = zero_contour_segments(rect, field, settings.density, settings.density);
    stitch_segments_with_tolerance(&segments, settings.tolerance_for(rect))
}

pub fn compute_nullclines<S: PlanarSystem + ?Sized>(
    rect: &ViewRect,
    system: &S,
    settings: &ContourSettings,
) -> Nullclines {
    let nullclines = Nullclines {
        x_nullcline: contour_polylines(rect, &FComponent(system), settings),
        y_nullcline: contour_polylines(rect, &GComponent(system), settings),
    };
    debug!(
        x_polylines = nullclines.x_nullcline.len(),
        y_polylines = nullclines.y_nullcline.len(),
        "nullclines computed"
    );
    nullclines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::test_systems::linear;

    #[test]
    fn straight_nullcline_is_one_polyline() {
        let system = linear(1.0, 0.0, 0.0, 1.0);
        let rect = ViewRect::new(-5.0, 5.3, -5.1, 5.0).expect("valid rect");
        let settings = ContourSettings {
            density: 50,
            ..ContourSettings::default()
        };
        let nullclines = compute_nullclines(&rect, &system, &settings);

        assert_eq!(nullclines.x_nullcline.len(), 1);
        assert_eq!(nullclines.y_nullcline.len(), 1);
        let x_line = &nullclines.x_nullcline[0];
        assert_eq!(x_line.len(), 51, "one point per row crossing");
        assert!(x_line.iter().all(|p| p.x.abs() < 1e-9));
        let y_line = &nullclines.y_nullcline[0];
        assert!(y_line.iter().all(|p| p.y.abs() < 1e-9));
    }

    #[test]
    fn to_screen_maps_every_point() {
        let system = linear(1.0, 0.0, 0.0, 1.0);
        let view = ViewRect::new(-5.0, 5.3, -5.1, 5.0).expect("valid rect");
        let nullclines = compute_nullclines(&view, &system, &ContourSettings::default());
        let screen = nullclines.to_screen(&view, 800.0, 600.0);
        assert_eq!(screen.x_nullcline.len(), nullclines.x_nullcline.len());
        for (world, device) in nullclines.x_nullcline[0].iter().zip(&screen.x_nullcline[0]) {
            let back = view.to_world(800.0, 600.0, *device);
            assert!(back.distance(world) < 1e-9);
        }
    }

    #[test]
    fn validation_rejects_zero_density() {
        let settings = ContourSettings {
            density: 0,
            ..ContourSettings::default()
        };
        assert!(settings.validate().is_err());
        assert!(ContourSettings::default().validate().is_ok());
    }
}
