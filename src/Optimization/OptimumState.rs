use nalgebra::DVector;

/// Iterate of the optimization calculation, owned by the caller and mutated
/// in place by every solve call.
///
/// `x` are the primal variables (mole amounts in the equilibrium setting),
/// `y` the multipliers of the equality constraints, `z` the multipliers of
/// the lower bound constraints and `f` the objective value at the last
/// evaluated point. A clone is a deep copy, so two concurrent solves never
/// share iterate storage.
#[derive(Debug, Clone)]
pub struct OptimumState {
    pub x: DVector<f64>,
    pub y: DVector<f64>,
    pub z: DVector<f64>,
    pub f: f64,
}

impl OptimumState {
    pub fn new() -> Self {
        Self {
            x: DVector::zeros(0),
            y: DVector::zeros(0),
            z: DVector::zeros(0),
            f: 0.0,
        }
    }
}

impl Default for OptimumState {
    fn default() -> Self {
        Self::new()
    }
}
