//! World-space viewing rectangle, screen mapping and integration bounds.

use crate::geometry::Point;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Default half-extent multiplier used when bounding integration.
pub const DEFAULT_BOUNDS_FACTOR: f64 = 3.0;

/// An axis-aligned world-space rectangle. Always `xmin < xmax` and
/// `ymin < ymax`. Transforms return a new value; the caller keeps the
/// current one in its own state slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewRect {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Default for ViewRect {
    fn default() -> Self {
        Self {
            xmin: -10.0,
            xmax: 10.0,
            ymin: -10.0,
            ymax: 10.0,
        }
    }
}

impl ViewRect {
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Result<Self> {
        if !(xmin.is_finite() && xmax.is_finite() && ymin.is_finite() && ymax.is_finite()) {
            bail!("View bounds must be finite.");
        }
        if xmin >= xmax || ymin >= ymax {
            bail!(
                "View bounds must satisfy xmin < xmax and ymin < ymax (got x: [{xmin}, {xmax}], y: [{ymin}, {ymax}])."
            );
        }
        Ok(Self {
            xmin,
            xmax,
            ymin,
            ymax,
        })
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn center(&self) -> Point {
        Point::new(
            0.5 * (self.xmin + self.xmax),
            0.5 * (self.ymin + self.ymax),
        )
    }

    /// Inclusive containment.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.xmin && p.x <= self.xmax && p.y >= self.ymin && p.y <= self.ymax
    }

    /// Maps a world point onto a `w` x `h` device surface. Device y grows
    /// downward, world y grows upward.
    pub fn to_screen(&self, w: f64, h: f64, p: Point) -> Point {
        Point::new(
            (p.x - self.xmin) / self.width() * w,
            h - (p.y - self.ymin) / self.height() * h,
        )
    }

    /// Inverse of [`ViewRect::to_screen`].
    pub fn to_world(&self, w: f64, h: f64, p: Point) -> Point {
        Point::new(
            self.xmin + p.x / w * self.width(),
            self.ymin + (h - p.y) / h * self.height(),
        )
    }

    /// Rescales both extents by `1 / factor` about the world point `(cx, cy)`,
    /// which keeps its relative position in the rectangle. `factor > 1` zooms in.
    /// Callers bound `factor` away from zero and infinity.
    pub fn zoom(&self, cx: f64, cy: f64, factor: f64) -> Self {
        debug_assert!(factor > 0.0, "zoom factor must be positive");
        Self {
            xmin: cx - (cx - self.xmin) / factor,
            xmax: cx + (self.xmax - cx) / factor,
            ymin: cy - (cy - self.ymin) / factor,
            ymax: cy + (self.ymax - cy) / factor,
        }
    }

    pub fn pan(&self, dx: f64, dy: f64) -> Self {
        Self {
            xmin: self.xmin + dx,
            xmax: self.xmax + dx,
            ymin: self.ymin + dy,
            ymax: self.ymax + dy,
        }
    }

    /// Pans by a drag of `(dx_px, dy_px)` device pixels so the world follows
    /// the pointer.
    pub fn pan_screen(&self, w: f64, h: f64, dx_px: f64, dy_px: f64) -> Self {
        let dx = -dx_px / w * self.width();
        let dy = dy_px / h * self.height();
        self.pan(dx, dy)
    }
}

/// Same center as `view`, each half-extent multiplied by `factor`.
pub fn expanded_bounds_from_view(view: &ViewRect, factor: f64) -> ViewRect {
    let c = view.center();
    let hw = 0.5 * view.width() * factor;
    let hh = 0.5 * view.height() * factor;
    ViewRect {
        xmin: c.x - hw,
        xmax: c.x + hw,
        ymin: c.y - hh,
        ymax: c.y + hh,
    }
}

/// Expanded view bounds, grown further if needed so they contain `seed`.
pub fn integration_bounds_for(view: &ViewRect, seed: Point, factor: f64) -> ViewRect {
    let expanded = expanded_bounds_from_view(view, factor);
    ViewRect {
        xmin: expanded.xmin.min(seed.x),
        xmax: expanded.xmax.max(seed.x),
        ymin: expanded.ymin.min(seed.y),
        ymax: expanded.ymax.max(seed.y),
    }
}
