//! Potential flow past a flat plate at an angle of attack: finite-difference
//! relaxation of the stream function, surface pressure from the converged
//! field, and the closed-form conformal-mapping curve to compare against.

pub mod config;
pub mod error;
pub mod grid;
pub mod initial;
pub mod output;
pub mod plot;
pub mod pressure;
pub mod relax;
pub mod simulation;
pub mod theory;
pub mod viewer;

pub use config::{Config, FlowParams, SolverConfig};
pub use error::{FlowError, Result};
pub use grid::{Grid, Plate};
pub use pressure::PressureDistribution;
pub use relax::{Field, Relaxation, RelaxationOutcome, SolveStatus};
pub use simulation::{Simulation, Solution};
