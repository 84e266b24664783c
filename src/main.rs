use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::info;

use plateflow::config;
use plateflow::output::{self, RowOrder};
use plateflow::plot;
use plateflow::relax::{PlateCondition, UpdatePolicy};
use plateflow::{viewer, FlowError, Simulation};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliPolicy {
    #[value(name = "jacobi")]
    Jacobi,
    #[value(name = "gauss-seidel")]
    GaussSeidel,
}

impl From<CliPolicy> for UpdatePolicy {
    fn from(value: CliPolicy) -> Self {
        match value {
            CliPolicy::Jacobi => UpdatePolicy::Jacobi,
            CliPolicy::GaussSeidel => UpdatePolicy::GaussSeidel,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliPlate {
    #[value(name = "initial")]
    Initial,
    #[value(name = "streamline")]
    Streamline,
}

impl From<CliPlate> for PlateCondition {
    fn from(value: CliPlate) -> Self {
        match value {
            CliPlate::Initial => PlateCondition::Initial,
            CliPlate::Streamline => PlateCondition::Streamline,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliRowOrder {
    #[value(name = "ascending-y")]
    AscendingY,
    #[value(name = "descending-y")]
    DescendingY,
}

impl From<CliRowOrder> for RowOrder {
    fn from(value: CliRowOrder) -> Self {
        match value {
            CliRowOrder::AscendingY => RowOrder::AscendingY,
            CliRowOrder::DescendingY => RowOrder::DescendingY,
        }
    }
}

/// Plateflow - stream function relaxation around a flat plate
#[derive(Parser, Debug)]
#[command(name = "plateflow", version, about)]
struct Cli {
    /// Configuration file: YAML, or a `.csv` parameter record (NX;NY;X;Y;alpha;eps)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for the CSV results
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Directory for the SVG plots
    #[arg(long, value_name = "DIR")]
    img_dir: Option<PathBuf>,

    /// Skip writing the SVG plots
    #[arg(long)]
    no_plots: bool,

    /// Iteration cap for the relaxation
    #[arg(long)]
    max_iter: Option<usize>,

    /// Sweep update policy
    #[arg(long, value_enum)]
    policy: Option<CliPolicy>,

    /// How plate nodes are pinned
    #[arg(long, value_enum)]
    plate: Option<CliPlate>,

    /// Row order of the written stream function table
    #[arg(long, value_enum)]
    row_order: Option<CliRowOrder>,

    /// Fail instead of writing results when the iteration cap is hit
    #[arg(long)]
    strict: bool,

    /// Open the interactive viewer instead of writing files
    #[arg(long)]
    gui: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => config::load(path)?,
        None => config::load_default(),
    };
    if let Some(max_iter) = cli.max_iter {
        cfg.solver.max_iter = max_iter;
    }
    if let Some(policy) = cli.policy {
        cfg.solver.policy = policy.into();
    }
    if let Some(plate) = cli.plate {
        cfg.solver.plate = plate.into();
    }
    if let Some(order) = cli.row_order {
        cfg.output.row_order = order.into();
    }
    if let Some(dir) = &cli.output {
        cfg.output.dir = dir.display().to_string();
    }
    if let Some(dir) = &cli.img_dir {
        cfg.output.img_dir = dir.display().to_string();
    }
    info!("{:?}", cfg);

    if cli.gui {
        viewer::run(cfg).map_err(|e| format!("viewer failed: {e}"))?;
        return Ok(());
    }

    let solution = Simulation::run(&cfg)?;
    let outcome = &solution.outcome;
    println!(
        "Calculation end: {} iteration ({})\nTime: {:.2}",
        outcome.iterations,
        outcome.status,
        solution.elapsed.as_secs_f64()
    );

    if cli.strict && !outcome.is_converged() {
        return Err(FlowError::NonConvergence {
            iterations: outcome.iterations,
            delta: outcome.delta,
        }
        .into());
    }

    let dir = PathBuf::from(&cfg.output.dir);
    let written = output::save_solution(&dir, &solution, cfg.flow.eps, cfg.output.row_order)?;
    for path in &written {
        println!("  {}", path.display());
    }
    println!("Data saved");

    if !cli.no_plots {
        let img_dir = PathBuf::from(&cfg.output.img_dir);
        for path in plot::save_plots(&img_dir, &solution, cfg.flow.eps)? {
            println!("  {}", path.display());
        }
        println!("Plots saved");
    }

    Ok(())
}
