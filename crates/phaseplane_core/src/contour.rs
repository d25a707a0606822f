//! Zero-level-set extraction by marching squares.
//!
//! The field is sampled on a regular grid and every cell whose corners
//! disagree in sign contributes one or two straight segments. Known
//! limitation: the two saddle cases (codes 5 and 10) use a fixed edge pairing
//! rather than sampling the cell center, so contours passing close to a
//! saddle of the field can be misconnected.

use crate::geometry::{Point, Segment};
use crate::traits::ScalarField;
use crate::view::ViewRect;
use tracing::trace;

/// Samples whose magnitude is below this are nudged to `±ZERO_EPS`.
pub const ZERO_EPS: f64 = 1e-15;

/// Cell edges, counter-clockwise from the left side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Left,
    Bottom,
    Right,
    Top,
}

/// Segment emission table indexed by corner code (bit 0 bottom-left,
/// bit 1 bottom-right, bit 2 top-right, bit 3 top-left; set when positive).
fn marching_squares_edge_pairs(code: u8) -> &'static [(Edge, Edge)] {
    use Edge::*;
    match code {
        1 | 14 => &[(Left, Bottom)],
        2 | 13 => &[(Bottom, Right)],
        3 | 12 => &[(Left, Right)],
        4 | 11 => &[(Right, Top)],
        7 | 8 => &[(Left, Top)],
        6 | 9 => &[(Bottom, Top)],
        5 => &[(Left, Bottom), (Right, Top)],
        10 => &[(Left, Right), (Bottom, Top)],
        _ => &[],
    }
}

fn bias_away_from_zero(value: f64) -> f64 {
    if value.abs() < ZERO_EPS {
        if value.is_sign_negative() && value != 0.0 {
            -ZERO_EPS
        } else {
            ZERO_EPS
        }
    } else {
        value
    }
}

/// Linear zero crossing between `p1` (value `v1`) and `p2` (value `v2`).
fn interpolate_crossing(p1: Point, p2: Point, v1: f64, v2: f64) -> Point {
    let t = v1 / (v1 - v2);
    Point::new(p1.x + (p2.x - p1.x) * t, p1.y + (p2.y - p1.y) * t)
}

struct Cell {
    corners: [Point; 4],
    values: [f64; 4],
}

impl Cell {
    fn code(&self) -> u8 {
        self.values
            .iter()
            .enumerate()
            .fold(0u8, |code, (bit, v)| if *v > 0.0 { code | (1 << bit) } else { code })
    }

    // Every edge runs from its lower/left corner to its upper/right corner so
    // neighbouring cells compute bit-identical points on the edge they share.
    fn crossing(&self, edge: Edge) -> Point {
        let (a, b) = match edge {
            Edge::Left => (0, 3),
            Edge::Bottom => (0, 1),
            Edge::Right => (1, 2),
            Edge::Top => (3, 2),
        };
        interpolate_crossing(self.corners[a], self.corners[b], self.values[a], self.values[b])
    }
}

/// Extracts the zero contour of `field` over `rect` as unordered segments,
/// sampling a `(cols + 1) x (rows + 1)` grid.
pub fn zero_contour_segments<F: ScalarField + ?Sized>(
    rect: &ViewRect,
    field: &F,
    cols: usize,
    rows: usize,
) -> Vec<Segment> {
    if cols == 0 || rows == 0 {
        return Vec::new();
    }

    let nx = cols + 1;
    let ny = rows + 1;
    let step_x = rect.width() / cols as f64;
    let step_y = rect.height() / rows as f64;
    let grid_x = |ix: usize| rect.xmin + step_x * ix as f64;
    let grid_y = |iy: usize| rect.ymin + step_y * iy as f64;
    let index = |ix: usize, iy: usize| -> usize { ix + iy * nx };

    let mut values = vec![0.0; nx * ny];
    for iy in 0..ny {
        let y = grid_y(iy);
        for ix in 0..nx {
            values[index(ix, iy)] = bias_away_from_zero(field.eval(grid_x(ix), y));
        }
    }

    let mut segments = Vec::new();
    let mut skipped = 0usize;
    for iy in 0..rows {
        let y0 = grid_y(iy);
        let y1 = grid_y(iy + 1);
        for ix in 0..cols {
            let x0 = grid_x(ix);
            let x1 = grid_x(ix + 1);
            let cell = Cell {
                corners: [
                    Point::new(x0, y0),
                    Point::new(x1, y0),
                    Point::new(x1, y1),
                    Point::new(x0, y1),
                ],
                values: [
                    values[index(ix, iy)],
                    values[index(ix + 1, iy)],
                    values[index(ix + 1, iy + 1)],
                    values[index(ix, iy + 1)],
                ],
            };
            // Poles, NaN domains and overflow give no usable crossing.
            if !cell.values.iter().all(|v| v.is_finite()) {
                skipped += 1;
                continue;
            }

            for &(edge_a, edge_b) in marching_squares_edge_pairs(cell.code()) {
                segments.push(Segment::new(cell.crossing(edge_a), cell.crossing(edge_b)));
            }
        }
    }

    trace!(
        cols,
        rows,
        segments = segments.len(),
        skipped_cells = skipped,
        "zero contour extracted"
    );
    segments
}
