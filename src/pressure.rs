use crate::error::{FlowError, Result};
use crate::grid::Plate;
use crate::relax::Field;

/// Pressure coefficient samples along the plate.
///
/// `positions` are chordwise coordinates normalized to `[-0.5, 0.5]`, so the
/// numerical and theoretical curves share an axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PressureDistribution {
    pub positions: Vec<f64>,
    pub cp: Vec<f64>,
}

impl PressureDistribution {
    pub fn len(&self) -> usize {
        self.cp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cp.is_empty()
    }

    /// `(position, cp)` pairs, ready for plotting.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.positions
            .iter()
            .zip(self.cp.iter())
            .map(|(&x, &cp)| [x, cp])
            .collect()
    }
}

/// Pressure coefficient from the central-difference tangential velocity
/// across the plate.
///
/// Samples rows `py + 1 ..= py + P - 1`: every plate point except the first,
/// `P - 1` values in total.
pub fn surface_pressure(field: &Field, hx: f64, plate: &Plate) -> Result<PressureDistribution> {
    plate.validate_shape(field.nrows(), field.ncols())?;
    if !(hx.is_finite() && hx > 0.0) {
        return Err(FlowError::InvalidPlateGeometry(format!(
            "grid spacing must be positive, got {hx}"
        )));
    }

    let px = plate.px;
    let span = plate.points.saturating_sub(1).max(1) as f64;
    let mut dist = PressureDistribution {
        positions: Vec::with_capacity(plate.points.saturating_sub(1)),
        cp: Vec::with_capacity(plate.points.saturating_sub(1)),
    };

    for k in plate.py + 1..plate.py + plate.points {
        let v = (field[(k, px - 1)] - field[(k, px + 1)]) / (2.0 * hx);
        dist.cp.push(1.0 - v * v);
        dist.positions.push((k - plate.py) as f64 / span - 0.5);
    }

    Ok(dist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::initial::uniform_flow;
    use crate::relax::{relax, PlateCondition, RelaxSettings, UpdatePolicy};

    #[test]
    fn test_length_is_points_minus_one() {
        let grid = Grid::new(1.0, 1.2, 50, 60).unwrap();
        let plate = Plate::centered(&grid);
        let psi = uniform_flow(&grid, 15.0);
        let dist = surface_pressure(&psi, grid.hx, &plate).unwrap();
        assert_eq!(dist.len(), plate.points - 1);
        assert_eq!(dist.positions.len(), dist.cp.len());
        assert!((dist.positions[dist.len() - 1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_flow_cp() {
        // ψ = cos α·y − sin α·x gives v = sin α across the plate.
        let grid = Grid::new(1.0, 1.2, 21, 30).unwrap();
        let plate = Plate::centered(&grid);
        let psi = uniform_flow(&grid, 15.0);
        let dist = surface_pressure(&psi, grid.hx, &plate).unwrap();
        let expected = 15.0_f64.to_radians().cos().powi(2);
        for cp in &dist.cp {
            assert!((cp - expected).abs() < 1e-10, "cp={} expected={}", cp, expected);
        }
    }

    #[test]
    fn test_point_symmetric_plate() {
        // Plate centred on node (10, 10). Reflecting through that node maps the
        // boundary and plate onto themselves with ψ - ψ_mid changing sign, so
        // the velocity on row k equals the velocity on row 20 - k.
        let grid = Grid::new(1.0, 1.0, 21, 21).unwrap();
        let plate = Plate::new(10, 6, 9);
        let psi = uniform_flow(&grid, 15.0);
        let settings = RelaxSettings {
            eps: 1e-10,
            max_iter: 100_000,
            policy: UpdatePolicy::GaussSeidel,
            plate: PlateCondition::Streamline,
            log_every: 0,
        };
        let out = relax(psi, plate, settings).unwrap();
        assert!(out.is_converged());

        let dist = surface_pressure(&out.field, grid.hx, &plate).unwrap();
        assert_eq!(dist.len(), plate.points - 1);

        let max = dist.cp.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = dist.cp.iter().cloned().fold(f64::INFINITY, f64::min);
        assert!(max - min > 1e-3, "cp is flat: min={} max={}", min, max);

        let mid = plate.mid_row();
        let mut compared = 0;
        for k in plate.py + 1..plate.py + plate.points {
            let mirror = 2 * mid - k;
            if mirror <= plate.py {
                continue;
            }
            let a = dist.cp[k - plate.py - 1];
            let b = dist.cp[mirror - plate.py - 1];
            assert!((a - b).abs() < 1e-6, "row {} cp={} vs row {} cp={}", k, a, mirror, b);
            compared += 1;
        }
        assert_eq!(compared, plate.points - 2);
    }

    #[test]
    fn test_minimal_plate_is_empty() {
        let grid = Grid::new(1.0, 1.0, 3, 3).unwrap();
        let plate = Plate::centered(&grid);
        let psi = uniform_flow(&grid, 10.0);
        let dist = surface_pressure(&psi, grid.hx, &plate).unwrap();
        assert!(dist.is_empty());
    }

    #[test]
    fn test_plate_at_edge_rejected() {
        let grid = Grid::new(1.0, 1.0, 10, 10).unwrap();
        let psi = uniform_flow(&grid, 10.0);
        let res = surface_pressure(&psi, grid.hx, &Plate::new(9, 3, 4));
        assert!(matches!(res, Err(FlowError::InvalidPlateGeometry(_))));
    }
}
