use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/////////////////////ERROR HANDLING////////////////////////////////////////////////////////

#[derive(Debug, Error)]
pub enum OptimError {
    #[error(
        "unsupported Hessian representation `{0}`: the active-set Newton solver accepts only Dense or Diagonal Hessians"
    )]
    UnsupportedHessian(String),
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("invalid problem: {0}")]
    InvalidProblem(String),
}

////////////////////////////////////////////////////////////////////////////////////////////

/// Representation of the Hessian of the objective function. The active-set
/// Newton solver handles `Dense` and `Diagonal`; `Inverse` is produced by
/// quasi-Newton callers and is rejected by it.
#[derive(Debug, Clone)]
pub enum Hessian {
    Dense(DMatrix<f64>),
    Diagonal(DVector<f64>),
    Inverse(DMatrix<f64>),
}

impl Hessian {
    pub fn mode_name(&self) -> &'static str {
        match self {
            Hessian::Dense(_) => "Dense",
            Hessian::Diagonal(_) => "Diagonal",
            Hessian::Inverse(_) => "Inverse",
        }
    }
}

/// Value, gradient and Hessian of the objective function at a point.
#[derive(Debug, Clone)]
pub struct ObjectiveEval {
    pub val: f64,
    pub grad: DVector<f64>,
    pub hessian: Hessian,
}

pub type ObjectiveFn = Box<dyn Fn(&DVector<f64>) -> ObjectiveEval>;

/// Definition of the optimization problem
///
/// min f(x)  subject to  A*x = b,  x >= l
///
/// where `A` is the m x n equality constraint matrix (for chemical
/// equilibrium, the element composition matrix), `b` the m-vector of
/// right-hand sides (element abundances) and `l` the n-vector of lower
/// bounds on the primal variables.
pub struct OptimumProblem {
    pub A: DMatrix<f64>,
    pub b: DVector<f64>,
    pub l: DVector<f64>,
    pub objective: ObjectiveFn,
}

impl OptimumProblem {
    pub fn new(A: DMatrix<f64>, b: DVector<f64>, l: DVector<f64>, objective: ObjectiveFn) -> Self {
        Self { A, b, l, objective }
    }

    pub fn num_variables(&self) -> usize {
        self.A.ncols()
    }

    pub fn num_constraints(&self) -> usize {
        self.A.nrows()
    }

    /// Checks the shape invariants A.ncols == l.len and A.nrows == b.len
    pub fn validate(&self) -> Result<(), OptimError> {
        if self.A.ncols() != self.l.len() {
            return Err(OptimError::DimensionMismatch(format!(
                "constraint matrix has {} columns but the lower bound vector has {} entries",
                self.A.ncols(),
                self.l.len()
            )));
        }
        if self.A.nrows() != self.b.len() {
            return Err(OptimError::DimensionMismatch(format!(
                "constraint matrix has {} rows but the right-hand side vector has {} entries",
                self.A.nrows(),
                self.b.len()
            )));
        }
        Ok(())
    }

    pub fn eval(&self, x: &DVector<f64>) -> ObjectiveEval {
        (self.objective)(x)
    }
}

/// Convex regularization of the objective
///
/// f(x) + 0.5*rho*||D o x||^2,  D = 1/sqrt(max(x0, l))
///
/// applied elementwise to the value, the gradient and the Hessian diagonal.
/// The scaling D grows for variables that start near their lower bound, which
/// is where the Gibbs objective Hessian loses conditioning. With rho == 0 the
/// transform is the identity: `apply` returns its input untouched, so the
/// arithmetic path of the objective is not perturbed.
#[derive(Debug, Clone)]
pub struct Regularization {
    d: DVector<f64>,
    rho: f64,
}

impl Regularization {
    pub fn new(x0: &DVector<f64>, l: &DVector<f64>, rho: f64) -> Self {
        let d = if rho > 0.0 {
            x0.zip_map(l, |xi, li| 1.0 / xi.max(li).sqrt())
        } else {
            DVector::zeros(l.len())
        };
        Self { d, rho }
    }

    pub fn apply(&self, f: ObjectiveEval, x: &DVector<f64>) -> ObjectiveEval {
        if self.rho == 0.0 {
            return f;
        }
        let mut f = f;
        let dd = self.d.component_mul(&self.d);
        let dx = self.d.component_mul(x);
        f.val += 0.5 * self.rho * dx.norm_squared();
        f.grad += self.rho * dd.component_mul(x);
        match &mut f.hessian {
            Hessian::Dense(h) => {
                for i in 0..h.nrows() {
                    h[(i, i)] += self.rho * dd[i];
                }
            }
            Hessian::Diagonal(h) => {
                *h += self.rho * dd;
            }
            Hessian::Inverse(_) => {}
        }
        f
    }
}
