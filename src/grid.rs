use nalgebra as na;

use crate::error::{FlowError, Result};

/// Smallest step count per axis that leaves an interior node.
pub const MIN_STEPS: usize = 3;

/// Uniform rectangular domain `[0, X] × [0, Y]`.
///
/// Coordinate matrices follow meshgrid layout: `ny` rows by `nx` columns,
/// row 0 at `y = 0`.
#[derive(Debug, Clone)]
pub struct Grid {
    pub nx: usize,
    pub ny: usize,
    pub x_extent: f64,
    pub y_extent: f64,
    pub hx: f64,
    pub hy: f64,
    pub xx: na::DMatrix<f64>,
    pub yy: na::DMatrix<f64>,
}

impl Grid {
    pub fn new(x_extent: f64, y_extent: f64, nx: usize, ny: usize) -> Result<Self> {
        if nx < MIN_STEPS || ny < MIN_STEPS {
            return Err(FlowError::InvalidGridSpec(format!(
                "need at least {MIN_STEPS} steps per axis, got NX={nx}, NY={ny}"
            )));
        }
        if !(x_extent.is_finite() && x_extent > 0.0) || !(y_extent.is_finite() && y_extent > 0.0) {
            return Err(FlowError::InvalidGridSpec(format!(
                "extents must be positive, got X={x_extent}, Y={y_extent}"
            )));
        }

        let x = linspace(0.0, x_extent, nx);
        let y = linspace(0.0, y_extent, ny);

        let xx = na::DMatrix::from_fn(ny, nx, |_, j| x[j]);
        let yy = na::DMatrix::from_fn(ny, nx, |i, _| y[i]);

        Ok(Grid {
            nx,
            ny,
            x_extent,
            y_extent,
            hx: x_extent / (nx - 1) as f64,
            hy: y_extent / (ny - 1) as f64,
            xx,
            yy,
        })
    }

    pub fn x_at(&self, col: usize) -> f64 {
        self.xx[(0, col)]
    }

    pub fn y_at(&self, row: usize) -> f64 {
        self.yy[(row, 0)]
    }

    /// Outer edge of the domain, held at its far-field value.
    pub fn is_boundary(&self, row: usize, col: usize) -> bool {
        row == 0 || col == 0 || row == self.ny - 1 || col == self.nx - 1
    }
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    let step = (end - start) / (n - 1) as f64;
    (0..n)
        .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
        .collect()
}

/// A vertical plate: column `px`, rows `py .. py + points`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plate {
    pub px: usize,
    pub py: usize,
    pub points: usize,
}

impl Plate {
    pub fn new(px: usize, py: usize, points: usize) -> Self {
        Plate { px, py, points }
    }

    /// Default placement: `px = NX/2`, `py = NY/3`, `P = NY - 2·py`.
    pub fn centered(grid: &Grid) -> Self {
        let px = grid.nx / 2;
        let py = grid.ny / 3;
        Plate {
            px,
            py,
            points: grid.ny - 2 * py,
        }
    }

    /// Checks the plate fits strictly inside the grid with a free column on
    /// each side for central differences.
    pub fn validate(&self, grid: &Grid) -> Result<()> {
        self.validate_shape(grid.ny, grid.nx)
    }

    /// Same as [`Plate::validate`] against a bare `rows × cols` field.
    pub fn validate_shape(&self, rows: usize, cols: usize) -> Result<()> {
        if self.points == 0 {
            return Err(FlowError::InvalidPlateGeometry(
                "plate has no points".to_string(),
            ));
        }
        if self.px < 1 || self.px + 1 >= cols {
            return Err(FlowError::InvalidPlateGeometry(format!(
                "column {} leaves no neighbour on both sides (NX={})",
                self.px, cols
            )));
        }
        if self.py == 0 || self.py + self.points > rows {
            return Err(FlowError::InvalidPlateGeometry(format!(
                "rows {}..{} do not fit in 1..{}",
                self.py,
                self.py + self.points,
                rows
            )));
        }
        Ok(())
    }

    pub fn rows(&self) -> std::ops::Range<usize> {
        self.py..self.py + self.points
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        col == self.px && self.rows().contains(&row)
    }

    /// Row of the plate midpoint, rounded down.
    pub fn mid_row(&self) -> usize {
        self.py + (self.points.saturating_sub(1)) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spacing_and_meshgrid() {
        let grid = Grid::new(1.0, 1.2, 50, 60).unwrap();
        assert!((grid.hx - 1.0 / 49.0).abs() < 1e-15);
        assert!((grid.hy - 1.2 / 59.0).abs() < 1e-15);
        assert_eq!(grid.xx.shape(), (60, 50));
        assert_eq!(grid.yy.shape(), (60, 50));
        assert_eq!(grid.x_at(0), 0.0);
        assert_eq!(grid.x_at(49), 1.0);
        assert_eq!(grid.y_at(59), 1.2);
        // x varies along columns only, y along rows only
        assert_eq!(grid.xx[(0, 7)], grid.xx[(33, 7)]);
        assert_eq!(grid.yy[(12, 0)], grid.yy[(12, 40)]);
    }

    #[test]
    fn test_rejects_small_grid() {
        assert!(matches!(
            Grid::new(1.0, 1.0, 2, 10),
            Err(FlowError::InvalidGridSpec(_))
        ));
        assert!(matches!(
            Grid::new(1.0, 1.0, 10, 0),
            Err(FlowError::InvalidGridSpec(_))
        ));
    }

    #[test]
    fn test_rejects_bad_extent() {
        assert!(Grid::new(0.0, 1.0, 10, 10).is_err());
        assert!(Grid::new(1.0, -1.0, 10, 10).is_err());
        assert!(Grid::new(f64::NAN, 1.0, 10, 10).is_err());
    }

    #[test]
    fn test_centered_plate() {
        let grid = Grid::new(1.0, 1.2, 50, 60).unwrap();
        let plate = Plate::centered(&grid);
        assert_eq!(plate, Plate::new(25, 20, 20));
        assert!(plate.validate(&grid).is_ok());
        assert!(plate.contains(20, 25));
        assert!(plate.contains(39, 25));
        assert!(!plate.contains(40, 25));
        assert!(!plate.contains(20, 24));
    }

    #[test]
    fn test_minimal_grid_plate() {
        let grid = Grid::new(1.0, 1.0, 3, 3).unwrap();
        let plate = Plate::centered(&grid);
        assert_eq!(plate, Plate::new(1, 1, 1));
        assert!(plate.validate(&grid).is_ok());
    }

    #[test]
    fn test_plate_on_edge_rejected() {
        let grid = Grid::new(1.0, 1.0, 10, 10).unwrap();
        for plate in [
            Plate::new(0, 3, 3),
            Plate::new(9, 3, 3),
            Plate::new(5, 0, 3),
            Plate::new(5, 3, 0),
            Plate::new(5, 8, 3),
        ] {
            assert!(
                matches!(plate.validate(&grid), Err(FlowError::InvalidPlateGeometry(_))),
                "{:?} should be rejected",
                plate
            );
        }
    }

    #[test]
    fn test_boundary_nodes() {
        let grid = Grid::new(1.0, 1.0, 4, 5).unwrap();
        assert!(grid.is_boundary(0, 2));
        assert!(grid.is_boundary(4, 2));
        assert!(grid.is_boundary(2, 0));
        assert!(grid.is_boundary(2, 3));
        assert!(!grid.is_boundary(2, 2));
    }
}
