use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

use crate::error::Result;
use crate::grid::Grid;
use crate::relax::Field;
use crate::simulation::Solution;

const SEP: char = ';';

/// Row order used when presenting a field. Field row 0 is always the
/// minimum y coordinate; this only affects how it is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowOrder {
    AscendingY,
    /// Largest y first, as the field appears on a plot.
    #[default]
    DescendingY,
}

impl RowOrder {
    pub fn rows(self, ny: usize) -> Box<dyn Iterator<Item = usize>> {
        match self {
            RowOrder::AscendingY => Box::new(0..ny),
            RowOrder::DescendingY => Box::new((0..ny).rev()),
        }
    }
}

/// Writes the field as a table: a header of x coordinates (first cell
/// empty), then one line per row led by its y coordinate.
pub fn write_field<W: Write>(out: &mut W, field: &Field, grid: &Grid, order: RowOrder) -> Result<()> {
    for j in 0..grid.nx {
        write!(out, "{SEP}{}", grid.x_at(j))?;
    }
    writeln!(out)?;

    for i in order.rows(grid.ny) {
        write!(out, "{}", grid.y_at(i))?;
        for j in 0..grid.nx {
            write!(out, "{SEP}{}", field[(i, j)])?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// One value per line.
pub fn write_series<W: Write>(out: &mut W, values: &[f64]) -> Result<()> {
    for v in values {
        writeln!(out, "{v:e}")?;
    }
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

/// Writes `psi_{eps}.csv`, `cp_th_{eps}.csv` and `cp_ch_{eps}.csv` into
/// `dir`, creating it if needed. Returns the written paths.
pub fn save_solution(dir: &Path, solution: &Solution, eps: f64, order: RowOrder) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let psi_path = dir.join(format!("psi_{eps}.csv"));
    let th_path = dir.join(format!("cp_th_{eps}.csv"));
    let ch_path = dir.join(format!("cp_ch_{eps}.csv"));

    let mut out = create(&psi_path)?;
    write_field(&mut out, &solution.outcome.field, &solution.grid, order)?;
    out.flush()?;

    let mut out = create(&th_path)?;
    write_series(&mut out, &solution.theoretical.cp)?;
    out.flush()?;

    let mut out = create(&ch_path)?;
    write_series(&mut out, &solution.numerical.cp)?;
    out.flush()?;

    info!("results written to {}", dir.display());
    Ok(vec![psi_path, th_path, ch_path])
}
