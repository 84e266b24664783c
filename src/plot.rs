//! Static plots for headless runs: the Cp comparison and the stream
//! function contours, written as SVG next to the CSV results.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::error::Result;
use crate::grid::{Grid, Plate};
use crate::pressure::PressureDistribution;
use crate::relax::Field;
use crate::simulation::Solution;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 480.0;
const MARGIN: f64 = 40.0;
const CONTOUR_LEVELS: usize = 30;

const NUMERICAL_COLOR: &str = "rgb(255,100,100)";
const THEORY_COLOR: &str = "rgb(100,100,255)";
const PLATE_COLOR: &str = "rgb(139,0,0)";

/// Points where the field crosses `level`, linearly interpolated along grid
/// edges in both directions. A node sitting exactly on the level is counted
/// once, from the edge that arrives at it from below.
pub fn contour_points(field: &Field, grid: &Grid, level: f64) -> Vec<[f64; 2]> {
    let mut points = Vec::new();

    for i in 0..grid.ny {
        for j in 0..grid.nx {
            let f0 = field[(i, j)] - level;
            if j + 1 < grid.nx {
                let f1 = field[(i, j + 1)] - level;
                if (f0 < 0.0) != (f1 < 0.0) {
                    let t = f0 / (f0 - f1);
                    points.push([grid.x_at(j) + t * grid.hx, grid.y_at(i)]);
                }
            }
            if i + 1 < grid.ny {
                let f1 = field[(i + 1, j)] - level;
                if (f0 < 0.0) != (f1 < 0.0) {
                    let t = f0 / (f0 - f1);
                    points.push([grid.x_at(j), grid.y_at(i) + t * grid.hy]);
                }
            }
        }
    }

    points
}

/// `n - 1` evenly spaced levels strictly between the field extremes, each
/// with its crossing points.
pub fn contour_levels(field: &Field, grid: &Grid, n: usize) -> Vec<(f64, Vec<[f64; 2]>)> {
    let (min, max) = (field.min(), field.max());
    let n = n.max(2);
    let step = (max - min) / n as f64;
    (1..n)
        .map(|k| {
            let value = min + step * k as f64;
            (value, contour_points(field, grid, value))
        })
        .collect()
}

/// Blue (t = 0) to red (t = 1), green peaking in the middle.
pub fn level_color(t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let r = (t * 255.0) as u8;
    let g = (((1.0 - t) * t * 4.0) * 255.0) as u8;
    let b = ((1.0 - t) * 255.0) as u8;
    [r, g, b]
}

/// Data window mapped onto the drawing area, y axis pointing up.
struct Frame {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn around<'a>(points: impl Iterator<Item = &'a [f64; 2]>, width: f64, height: f64) -> Self {
        let mut frame = Frame {
            x_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_min: f64::INFINITY,
            y_max: f64::NEG_INFINITY,
            width,
            height,
        };
        for p in points.filter(|p| p[0].is_finite() && p[1].is_finite()) {
            frame.x_min = frame.x_min.min(p[0]);
            frame.x_max = frame.x_max.max(p[0]);
            frame.y_min = frame.y_min.min(p[1]);
            frame.y_max = frame.y_max.max(p[1]);
        }
        if frame.x_min > frame.x_max {
            (frame.x_min, frame.x_max) = (0.0, 1.0);
        }
        if frame.y_min > frame.y_max {
            (frame.y_min, frame.y_max) = (0.0, 1.0);
        }
        // Flat data still needs a non-zero span
        if frame.x_max - frame.x_min < 1e-12 {
            frame.x_min -= 0.5;
            frame.x_max += 0.5;
        }
        if frame.y_max - frame.y_min < 1e-12 {
            frame.y_min -= 0.5;
            frame.y_max += 0.5;
        }
        frame
    }

    fn map(&self, p: [f64; 2]) -> (f64, f64) {
        let sx = MARGIN + (p[0] - self.x_min) / (self.x_max - self.x_min) * (self.width - 2.0 * MARGIN);
        let sy = MARGIN + (self.y_max - p[1]) / (self.y_max - self.y_min) * (self.height - 2.0 * MARGIN);
        (sx, sy)
    }
}

fn svg_open<W: Write>(out: &mut W, frame: &Frame, title: &str) -> Result<()> {
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = frame.width,
        h = frame.height
    )?;
    writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
    writeln!(
        out,
        r#"<rect x="{m}" y="{m}" width="{}" height="{}" fill="none" stroke="gray"/>"#,
        frame.width - 2.0 * MARGIN,
        frame.height - 2.0 * MARGIN,
        m = MARGIN
    )?;
    writeln!(out, r#"<text x="{}" y="{}" font-size="14">{title}</text>"#, MARGIN, MARGIN - 12.0)?;
    writeln!(
        out,
        r#"<text x="{}" y="{}" font-size="10">x: {:.3} .. {:.3}, y: {:.3} .. {:.3}</text>"#,
        MARGIN,
        frame.height - 12.0,
        frame.x_min,
        frame.x_max,
        frame.y_min,
        frame.y_max
    )?;
    Ok(())
}

fn polyline<W: Write>(out: &mut W, frame: &Frame, points: &[[f64; 2]], color: &str, width: f64) -> Result<()> {
    if points.len() < 2 {
        return Ok(());
    }
    write!(out, r#"<polyline fill="none" stroke="{color}" stroke-width="{width}" points=""#)?;
    for &p in points {
        let (x, y) = frame.map(p);
        write!(out, "{x:.2},{y:.2} ")?;
    }
    writeln!(out, r#""/>"#)?;
    Ok(())
}

/// Numerical and theoretical Cp over the normalized chord.
pub fn write_cp_svg<W: Write>(
    out: &mut W,
    numerical: &PressureDistribution,
    theoretical: &PressureDistribution,
) -> Result<()> {
    let numerical_points = numerical.points();
    let theory_points = theoretical.points();
    let frame = Frame::around(numerical_points.iter().chain(theory_points.iter()), WIDTH, HEIGHT);

    svg_open(out, &frame, "Pressure coefficient: numerical (red), theory (blue)")?;
    polyline(out, &frame, &theory_points, THEORY_COLOR, 2.0)?;
    polyline(out, &frame, &numerical_points, NUMERICAL_COLOR, 2.0)?;
    for &p in &numerical_points {
        let (x, y) = frame.map(p);
        writeln!(out, r#"<circle cx="{x:.2}" cy="{y:.2}" r="2.5" fill="{NUMERICAL_COLOR}"/>"#)?;
    }
    writeln!(out, "</svg>")?;
    Ok(())
}

/// Stream function contours over the domain with the plate drawn on top.
pub fn write_psi_svg<W: Write>(out: &mut W, field: &Field, grid: &Grid, plate: &Plate) -> Result<()> {
    let corners = [[0.0, 0.0], [grid.x_extent, grid.y_extent]];
    let height = ((WIDTH - 2.0 * MARGIN) * grid.y_extent / grid.x_extent + 2.0 * MARGIN).clamp(200.0, 1200.0);
    let frame = Frame::around(corners.iter(), WIDTH, height);

    svg_open(out, &frame, "Stream function")?;

    let (min, max) = (field.min(), field.max());
    let span = max - min;
    for (value, points) in contour_levels(field, grid, CONTOUR_LEVELS) {
        let t = if span > 0.0 { (value - min) / span } else { 0.5 };
        let [r, g, b] = level_color(t);
        for p in points {
            let (x, y) = frame.map(p);
            writeln!(out, r#"<circle cx="{x:.2}" cy="{y:.2}" r="1" fill="rgb({r},{g},{b})"/>"#)?;
        }
    }

    let x = grid.x_at(plate.px);
    let ends = [
        [x, grid.y_at(plate.py)],
        [x, grid.y_at(plate.py + plate.points - 1)],
    ];
    let (x0, y0) = frame.map(ends[0]);
    let (x1, y1) = frame.map(ends[1]);
    writeln!(
        out,
        r#"<line x1="{x0:.2}" y1="{y0:.2}" x2="{x1:.2}" y2="{y1:.2}" stroke="{PLATE_COLOR}" stroke-width="3"/>"#
    )?;
    writeln!(out, "</svg>")?;
    Ok(())
}

/// Writes `cp_{eps}.svg` and `psi_{eps}.svg` into `dir`, creating it if
/// needed. Returns the written paths.
pub fn save_plots(dir: &Path, solution: &Solution, eps: f64) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let cp_path = dir.join(format!("cp_{eps}.svg"));
    let psi_path = dir.join(format!("psi_{eps}.svg"));

    let mut out = BufWriter::new(File::create(&cp_path)?);
    write_cp_svg(&mut out, &solution.numerical, &solution.theoretical)?;
    out.flush()?;

    let mut out = BufWriter::new(File::create(&psi_path)?);
    write_psi_svg(&mut out, &solution.outcome.field, &solution.grid, &solution.plate)?;
    out.flush()?;

    info!("plots written to {}", dir.display());
    Ok(vec![cp_path, psi_path])
}
