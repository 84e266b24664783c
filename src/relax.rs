//! Fixed-point relaxation of the discrete Laplace equation for the stream
//! function around a plate.
//!
//! Every interior node that is not on the plate is replaced by the average of
//! its four neighbours. The outer ring of the field keeps its initial value
//! (far-field Dirichlet condition) and plate nodes keep their pinned value,
//! so neither is ever written once the engine is constructed.

use std::fmt;

use log::{debug, info, warn};
use nalgebra as na;
use serde::Deserialize;

use crate::config::SolverConfig;
use crate::error::{FlowError, Result};
use crate::grid::Plate;

/// Stream function values, `ny` rows by `nx` columns, row 0 at `y = 0`.
pub type Field = na::DMatrix<f64>;

/// How a sweep reads neighbour values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdatePolicy {
    /// Double buffer: every update reads the previous sweep only. The two
    /// buffers are swapped after each sweep.
    #[default]
    Jacobi,
    /// Single buffer updated in place, rows bottom to top and columns left
    /// to right, so already-updated neighbours are read within the sweep.
    GaussSeidel,
}

/// Value the plate nodes are held at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlateCondition {
    /// Each plate node keeps its own initial-condition value.
    #[default]
    Initial,
    /// All plate nodes take the initial-condition value at the plate
    /// midpoint, turning the plate into a single streamline.
    Streamline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Running,
    Converged,
    MaxIterExceeded,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Running => "running",
            SolveStatus::Converged => "converged",
            SolveStatus::MaxIterExceeded => "max iterations exceeded",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelaxSettings {
    /// Stop once the max-norm change of a sweep drops below this. A
    /// non-positive tolerance can never be met and runs to `max_iter`.
    pub eps: f64,
    pub max_iter: usize,
    pub policy: UpdatePolicy,
    pub plate: PlateCondition,
    pub log_every: usize,
}

impl Default for RelaxSettings {
    fn default() -> Self {
        Self::from_config(&SolverConfig::default(), 0.001)
    }
}

impl RelaxSettings {
    pub fn from_config(solver: &SolverConfig, eps: f64) -> Self {
        RelaxSettings {
            eps,
            max_iter: solver.max_iter,
            policy: solver.policy,
            plate: solver.plate,
            log_every: solver.log_every,
        }
    }
}

/// Relaxation state machine. Owns the field exclusively until a terminal
/// state is reached and [`Relaxation::finish`] hands it off.
#[derive(Debug)]
pub struct Relaxation {
    current: Field,
    // Jacobi target buffer. Shares boundary and plate values with `current`.
    next: Field,
    plate: Plate,
    settings: RelaxSettings,
    status: SolveStatus,
    iterations: usize,
    delta: f64,
    residuals: Vec<f64>,
}

impl Relaxation {
    pub fn new(initial: Field, plate: Plate, settings: RelaxSettings) -> Result<Self> {
        plate.validate_shape(initial.nrows(), initial.ncols())?;

        let mut current = initial;
        if settings.plate == PlateCondition::Streamline {
            let value = current[(plate.mid_row(), plate.px)];
            for row in plate.rows() {
                current[(row, plate.px)] = value;
            }
        }
        let next = current.clone();

        Ok(Relaxation {
            current,
            next,
            plate,
            settings: RelaxSettings {
                max_iter: settings.max_iter.max(1),
                ..settings
            },
            status: SolveStatus::Running,
            iterations: 0,
            delta: f64::INFINITY,
            residuals: Vec::new(),
        })
    }

    pub fn state(&self) -> SolveStatus {
        self.status
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Max-norm change of the latest sweep; infinite before the first.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    pub fn field(&self) -> &Field {
        &self.current
    }

    /// Performs one sweep and advances the state machine. Does nothing once
    /// a terminal state has been reached.
    pub fn sweep(&mut self) -> SolveStatus {
        if self.status != SolveStatus::Running {
            return self.status;
        }

        let delta = match self.settings.policy {
            UpdatePolicy::Jacobi => self.jacobi_sweep(),
            UpdatePolicy::GaussSeidel => self.gauss_seidel_sweep(),
        };

        self.iterations += 1;
        self.delta = delta;
        self.residuals.push(delta);

        if delta < self.settings.eps {
            self.status = SolveStatus::Converged;
            info!(
                "relaxation converged after {} iterations (delta {:e})",
                self.iterations, delta
            );
        } else if self.iterations >= self.settings.max_iter {
            self.status = SolveStatus::MaxIterExceeded;
            warn!(
                "relaxation stopped at iteration cap {} without converging (delta {:e}, eps {:e})",
                self.iterations, delta, self.settings.eps
            );
        } else if self.settings.log_every > 0 && self.iterations % self.settings.log_every == 0 {
            debug!("iteration {}: delta {:e}", self.iterations, delta);
        }

        self.status
    }

    /// Sweeps until converged or the iteration cap is hit.
    pub fn run(mut self) -> RelaxationOutcome {
        while self.sweep() == SolveStatus::Running {}
        self.finish()
    }

    pub fn finish(self) -> RelaxationOutcome {
        RelaxationOutcome {
            field: self.current,
            status: self.status,
            iterations: self.iterations,
            delta: self.delta,
            residuals: self.residuals,
        }
    }

    fn jacobi_sweep(&mut self) -> f64 {
        let (rows, cols) = self.current.shape();
        let mut delta: f64 = 0.0;

        for i in 1..rows - 1 {
            for j in 1..cols - 1 {
                if self.plate.contains(i, j) {
                    continue;
                }
                let cur = &self.current;
                let value = 0.25
                    * (cur[(i - 1, j)] + cur[(i + 1, j)] + cur[(i, j - 1)] + cur[(i, j + 1)]);
                delta = delta.max((value - cur[(i, j)]).abs());
                self.next[(i, j)] = value;
            }
        }

        std::mem::swap(&mut self.current, &mut self.next);
        delta
    }

    fn gauss_seidel_sweep(&mut self) -> f64 {
        let (rows, cols) = self.current.shape();
        let x = &mut self.current;
        let mut delta: f64 = 0.0;

        for i in 1..rows - 1 {
            for j in 1..cols - 1 {
                if self.plate.contains(i, j) {
                    continue;
                }
                let value = 0.25 * (x[(i - 1, j)] + x[(i + 1, j)] + x[(i, j - 1)] + x[(i, j + 1)]);
                delta = delta.max((value - x[(i, j)]).abs());
                x[(i, j)] = value;
            }
        }

        delta
    }
}

/// Terminal result of a relaxation run. The field is the last one computed,
/// whether or not the tolerance was met.
#[derive(Debug, Clone)]
pub struct RelaxationOutcome {
    pub field: Field,
    pub status: SolveStatus,
    pub iterations: usize,
    pub delta: f64,
    pub residuals: Vec<f64>,
}

impl RelaxationOutcome {
    pub fn is_converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }

    /// Turns an unconverged run into [`FlowError::NonConvergence`].
    pub fn require_converged(self) -> Result<Field> {
        if self.is_converged() {
            Ok(self.field)
        } else {
            Err(FlowError::NonConvergence {
                iterations: self.iterations,
                delta: self.delta,
            })
        }
    }
}

pub fn relax(initial: Field, plate: Plate, settings: RelaxSettings) -> Result<RelaxationOutcome> {
    Ok(Relaxation::new(initial, plate, settings)?.run())
}
