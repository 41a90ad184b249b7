use serde::{Deserialize, Serialize};

/// Outcome of a single solve call. Created fresh per call and returned by
/// value; `succeeded` must be inspected before trusting the iterate left in
/// the state. Times are in seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimumResult {
    /// number of iterations of the outer Newton loop
    pub iterations: usize,
    /// wall time of the whole calculation
    pub time: f64,
    /// cumulative time spent decomposing and solving KKT linear systems
    pub time_linear_systems: f64,
    /// final combined error max(optimality, feasibility)
    pub error: f64,
    /// true when the combined error dropped below the tolerance
    pub succeeded: bool,
}
