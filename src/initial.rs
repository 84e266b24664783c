use std::f64::consts::PI;

use nalgebra as na;

use crate::grid::Grid;

/// Stream function of undisturbed uniform flow at angle of attack
/// `alpha_deg`.
pub fn stream_function(x: f64, y: f64, alpha_deg: f64) -> f64 {
    let alpha = alpha_deg * PI / 180.0;
    f64::cos(alpha) * y - f64::sin(alpha) * x
}

/// Initial guess over the whole domain. Its outer ring doubles as the
/// far-field boundary condition.
pub fn uniform_flow(grid: &Grid, alpha_deg: f64) -> na::DMatrix<f64> {
    grid.xx.zip_map(&grid.yy, |x, y| stream_function(x, y, alpha_deg))
}
