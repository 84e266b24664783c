use std::time::{Duration, Instant};

use log::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::grid::{Grid, Plate};
use crate::initial::uniform_flow;
use crate::pressure::{surface_pressure, PressureDistribution};
use crate::relax::{Relaxation, RelaxSettings, RelaxationOutcome};
use crate::theory::{ConformalPlate, PressureReference};

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct Solution {
    pub grid: Grid,
    pub plate: Plate,
    pub outcome: RelaxationOutcome,
    pub numerical: PressureDistribution,
    pub theoretical: PressureDistribution,
    pub elapsed: Duration,
}

pub struct Simulation;

impl Simulation {
    /// Grid → initial field → relaxation → surface pressure, plus the
    /// closed-form reference curve for the same angle.
    pub fn run(config: &Config) -> Result<Solution> {
        Self::run_with(config, &ConformalPlate::default())
    }

    pub fn run_with(config: &Config, reference: &dyn PressureReference) -> Result<Solution> {
        let flow = &config.flow;
        let grid = Grid::new(flow.x_extent, flow.y_extent, flow.nx, flow.ny)?;
        let plate = Plate::centered(&grid);
        plate.validate(&grid)?;
        debug!(
            "grid {}x{} (hx={:.4}, hy={:.4}), plate at column {} rows {}..{}",
            grid.nx,
            grid.ny,
            grid.hx,
            grid.hy,
            plate.px,
            plate.py,
            plate.py + plate.points
        );

        let initial = uniform_flow(&grid, flow.alpha);
        let settings = RelaxSettings::from_config(&config.solver, flow.eps);

        let start = Instant::now();
        let outcome = Relaxation::new(initial, plate, settings)?.run();
        let elapsed = start.elapsed();
        info!(
            "calculation end: {} ({} iterations, {:.2}s)",
            outcome.status,
            outcome.iterations,
            elapsed.as_secs_f64()
        );

        let numerical = surface_pressure(&outcome.field, grid.hx, &plate)?;
        let theoretical = reference.distribution(flow.alpha);

        Ok(Solution {
            grid,
            plate,
            outcome,
            numerical,
            theoretical,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowError;
    use crate::relax::{PlateCondition, SolveStatus};

    #[test]
    fn test_reference_case() {
        let cfg = Config::default();
        let sol = Simulation::run(&cfg).unwrap();
        assert_eq!(sol.outcome.status, SolveStatus::Converged);
        assert!(sol.outcome.iterations <= cfg.solver.max_iter);
        assert_eq!(sol.plate, Plate::new(25, 20, 20));
        assert_eq!(sol.numerical.len(), 19);
        assert_eq!(sol.theoretical.len(), 150);
        let peak = sol.theoretical.cp.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!((peak - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_streamline_plate_converges() {
        let mut cfg = Config::default();
        cfg.flow.nx = 20;
        cfg.flow.ny = 24;
        cfg.solver.plate = PlateCondition::Streamline;
        let sol = Simulation::run(&cfg).unwrap();
        assert!(sol.outcome.is_converged());
        assert!(sol.outcome.iterations > 1);
        assert_eq!(sol.numerical.len(), sol.plate.points - 1);
        assert!(sol.numerical.cp.iter().all(|cp| cp.is_finite()));
    }

    #[test]
    fn test_invalid_grid_propagates() {
        let mut cfg = Config::default();
        cfg.flow.nx = 2;
        assert!(matches!(
            Simulation::run(&cfg),
            Err(FlowError::InvalidGridSpec(_))
        ));
    }

    #[test]
    fn test_minimal_grid_runs() {
        let mut cfg = Config::default();
        cfg.flow.nx = 3;
        cfg.flow.ny = 3;
        let sol = Simulation::run(&cfg).unwrap();
        assert_eq!(sol.outcome.status, SolveStatus::Converged);
        assert!(sol.numerical.is_empty());
    }
}
