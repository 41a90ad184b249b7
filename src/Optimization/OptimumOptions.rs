use super::OptimumProblem::OptimError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Options of the per-iteration diagnostic trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// emit the iteration table when true
    pub active: bool,
    /// number of significant digits of the printed values
    pub precision: usize,
    pub xprefix: String,
    pub yprefix: String,
    pub zprefix: String,
    /// explicit column names; when shorter than the variable count the
    /// remaining columns fall back to prefix + index
    pub xnames: Vec<String>,
    pub ynames: Vec<String>,
    pub znames: Vec<String>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            active: false,
            precision: 6,
            xprefix: "x".to_string(),
            yprefix: "y".to_string(),
            zprefix: "z".to_string(),
            xnames: Vec::new(),
            ynames: Vec::new(),
            znames: Vec::new(),
        }
    }
}

/// Options forwarded to the KKT linear system solver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct KktOptions {
    /// use full pivoting for the dense saddle-point factorization; slower
    /// but tolerates more ill-conditioning than partial pivoting
    pub full_pivoting: bool,
}

impl Default for KktOptions {
    fn default() -> Self {
        Self {
            full_pivoting: false,
        }
    }
}

/// Configuration of the optimization calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimumOptions {
    /// convergence threshold on max(optimality error, feasibility error)
    pub tolerance: f64,
    /// iteration cap of the outer Newton loop; 0 stops before the first step
    pub max_iterations: usize,
    /// rho of the convex regularization term; 0 disables regularization
    pub regularization: f64,
    pub kkt: KktOptions,
    pub output: OutputOptions,
}

impl Default for OptimumOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 200,
            regularization: 0.0,
            kkt: KktOptions::default(),
            output: OutputOptions::default(),
        }
    }
}

impl OptimumOptions {
    pub fn validate(&self) -> Result<(), OptimError> {
        if !(self.tolerance > 0.0) || !self.tolerance.is_finite() {
            return Err(OptimError::InvalidOptions(format!(
                "tolerance must be a positive finite number, got {}",
                self.tolerance
            )));
        }
        if !(self.regularization >= 0.0) || !self.regularization.is_finite() {
            return Err(OptimError::InvalidOptions(format!(
                "regularization must be a nonnegative finite number, got {}",
                self.regularization
            )));
        }
        Ok(())
    }

    /// Loads options from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(file_name: &str) -> Result<Self, OptimError> {
        let path = Path::new(file_name);
        if !path.exists() {
            return Err(OptimError::InvalidOptions(format!(
                "options file '{}' does not exist",
                file_name
            )));
        }
        let file = File::open(path).map_err(|e| {
            OptimError::InvalidOptions(format!("failed to open options file '{}': {}", file_name, e))
        })?;
        let options: OptimumOptions = serde_json::from_reader(file).map_err(|e| {
            OptimError::InvalidOptions(format!("failed to parse options file '{}': {}", file_name, e))
        })?;
        options.validate()?;
        Ok(options)
    }
}
