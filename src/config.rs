use std::path::Path;

use log::warn;
use serde::Deserialize;

use crate::error::{FlowError, Result};
use crate::output::RowOrder;
use crate::relax::{PlateCondition, UpdatePolicy};

const DEFAULT_CONFIG_FILE: &str = "plateflow.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub flow: FlowParams,
    pub solver: SolverConfig,
    pub output: OutputConfig,
}

/// The six-field input record: grid steps, domain extents, angle of attack
/// (degrees) and convergence tolerance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FlowParams {
    pub nx: usize,
    pub ny: usize,
    pub x_extent: f64,
    pub y_extent: f64,
    pub alpha: f64,
    pub eps: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub max_iter: usize,
    pub policy: UpdatePolicy,
    pub plate: PlateCondition,
    /// Sweeps between progress messages at debug level.
    pub log_every: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
    /// Directory for the SVG plots written in headless mode.
    pub img_dir: String,
    pub row_order: RowOrder,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            nx: 50,
            ny: 60,
            x_extent: 1.0,
            y_extent: 1.2,
            alpha: 15.0,
            eps: 0.001,
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iter: 100_000,
            policy: UpdatePolicy::Jacobi,
            plate: PlateCondition::Initial,
            log_every: 1000,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "results".to_string(),
            img_dir: "img".to_string(),
            row_order: RowOrder::DescendingY,
        }
    }
}

impl FlowParams {
    /// Parses the legacy parameter file: a header line followed by
    /// `NX;NY;X;Y;alpha;eps`.
    pub fn from_record(contents: &str) -> Result<Self> {
        let line = contents
            .lines()
            .skip(1)
            .map(str::trim)
            .find(|l| !l.is_empty())
            .ok_or_else(|| FlowError::ParamRecord("no data line after header".to_string()))?;

        let values = line
            .split(';')
            .map(|field| {
                field.trim().parse::<f64>().map_err(|e| {
                    FlowError::ParamRecord(format!("cannot parse '{}': {e}", field.trim()))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        if values.len() != 6 {
            return Err(FlowError::ParamRecord(format!(
                "expected 6 fields, found {}",
                values.len()
            )));
        }

        Ok(Self {
            nx: record_count(values[0], "NX")?,
            ny: record_count(values[1], "NY")?,
            x_extent: values[2],
            y_extent: values[3],
            alpha: values[4],
            eps: values[5],
        })
    }
}

// Step counts are often written as reals (`50.0`) in the legacy file.
fn record_count(value: f64, name: &str) -> Result<usize> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as usize)
    } else {
        Err(FlowError::ParamRecord(format!(
            "{name} must be a non-negative integer, got {value}"
        )))
    }
}

/// Loads a configuration file. Files ending in `.csv` are read as the legacy
/// parameter record with solver and output defaults; anything else is YAML.
pub fn load(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)?;
    let is_record = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"));

    if is_record {
        Ok(Config {
            flow: FlowParams::from_record(&contents)?,
            ..Config::default()
        })
    } else {
        Ok(serde_yaml::from_str(&contents)?)
    }
}

pub fn load_default() -> Config {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if !path.exists() {
        return Config::default();
    }
    match load(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("failed to load {DEFAULT_CONFIG_FILE}: {e}; using defaults");
            Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.flow.nx, 50);
        assert_eq!(cfg.flow.ny, 60);
        assert_eq!(cfg.flow.x_extent, 1.0);
        assert_eq!(cfg.flow.y_extent, 1.2);
        assert_eq!(cfg.flow.alpha, 15.0);
        assert_eq!(cfg.flow.eps, 0.001);
        assert_eq!(cfg.solver.max_iter, 100_000);
        assert_eq!(cfg.solver.policy, UpdatePolicy::Jacobi);
        assert_eq!(cfg.solver.plate, PlateCondition::Initial);
        assert_eq!(cfg.output.dir, "results");
        assert_eq!(cfg.output.img_dir, "img");
        assert_eq!(cfg.output.row_order, RowOrder::DescendingY);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = "flow:\n  alpha: 5.0\nsolver:\n  policy: gauss-seidel\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.flow.alpha, 5.0);
        assert_eq!(cfg.flow.nx, 50); // default
        assert_eq!(cfg.solver.policy, UpdatePolicy::GaussSeidel);
        assert_eq!(cfg.solver.max_iter, 100_000); // default
        assert_eq!(cfg.output.dir, "results"); // default
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
flow:
  nx: 20
  ny: 30
  x_extent: 2.0
  y_extent: 3.0
  alpha: 10.0
  eps: 0.0001
solver:
  max_iter: 500
  policy: jacobi
  plate: streamline
  log_every: 10
output:
  dir: out
  img_dir: plots
  row_order: ascending-y
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.flow.nx, 20);
        assert_eq!(cfg.flow.ny, 30);
        assert_eq!(cfg.flow.x_extent, 2.0);
        assert_eq!(cfg.flow.y_extent, 3.0);
        assert_eq!(cfg.flow.alpha, 10.0);
        assert_eq!(cfg.flow.eps, 0.0001);
        assert_eq!(cfg.solver.max_iter, 500);
        assert_eq!(cfg.solver.plate, PlateCondition::Streamline);
        assert_eq!(cfg.solver.log_every, 10);
        assert_eq!(cfg.output.dir, "out");
        assert_eq!(cfg.output.img_dir, "plots");
        assert_eq!(cfg.output.row_order, RowOrder::AscendingY);
    }

    #[test]
    fn test_legacy_record() {
        let record = "NX;NY;X;Y;alpha;eps\n50.0;60.0;1.0;1.2;15.0;0.001\n";
        let params = FlowParams::from_record(record).unwrap();
        assert_eq!(params, FlowParams::default());
    }

    #[test]
    fn test_legacy_record_wrong_field_count() {
        let record = "NX;NY;X;Y;alpha;eps\n50;60;1.0;1.2\n";
        assert!(matches!(
            FlowParams::from_record(record),
            Err(FlowError::ParamRecord(_))
        ));
    }

    #[test]
    fn test_legacy_record_fractional_count() {
        let record = "header\n50.5;60;1.0;1.2;15.0;0.001\n";
        assert!(FlowParams::from_record(record).is_err());
    }

    #[test]
    fn test_load_record_file() {
        let path = std::env::temp_dir().join("plateflow_config_test_record.csv");
        std::fs::write(&path, "NX;NY;X;Y;alpha;eps\n10;12;1.0;1.2;5.0;0.01\n").unwrap();
        let cfg = load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(cfg.flow.nx, 10);
        assert_eq!(cfg.flow.ny, 12);
        assert_eq!(cfg.flow.eps, 0.01);
        assert_eq!(cfg.solver.max_iter, 100_000);
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("plateflow_definitely_missing.yaml");
        assert!(matches!(load(&path), Err(FlowError::Io(_))));
    }
}
