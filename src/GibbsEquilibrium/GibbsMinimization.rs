use crate::Optimization::OptimumOptions::OptimumOptions;
use crate::Optimization::OptimumProblem::{
    Hessian, ObjectiveEval, OptimError, ObjectiveFn, OptimumProblem,
};
use crate::Optimization::OptimumResult::OptimumResult;
use crate::Optimization::OptimumSolverActNewton::OptimumSolverActNewton;
use crate::Optimization::OptimumState::OptimumState;
use log::{info, warn};
use nalgebra::{DMatrix, DVector};

/// Representation of the Gibbs objective Hessian handed to the solver.
/// `Dense` is the exact curvature of the ideal mixture, `Diagonal` the
/// cheap approximation diag(1/n) that skips the mole-fraction coupling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GibbsHessianMode {
    Dense,
    Diagonal,
}

/// Gibbs free energy minimization task of a single-phase ideal mixture
///
/// min G/RT = SUM_i n_i*(mu0_i/RT + ln(P/P°) + ln(n_i/N)),  N = SUM_i n_i
///
/// subject to the element conservation conditions SUM_j(a_ij*n_j) = b_i
/// for every element i. The element composition matrix is stored with one
/// row per substance and one column per element; its transpose is the
/// constraint matrix of the optimization problem.
///
/// The standard chemical potentials are taken already divided by RT, so
/// this structure embeds no thermodynamic correlation: the caller computes
/// mu0 from its own database at the temperature of interest.
pub struct GibbsMinimization {
    pub vec_of_subs: Vec<String>,
    /// n_subs x n_elements matrix of element counts per substance
    pub elem_composition_matrix: DMatrix<f64>,
    /// element abundances b_i in moles
    pub b0: DVector<f64>,
    /// standard chemical potentials mu0_i/RT
    pub mu0: DVector<f64>,
    /// P/P°, enters each chemical potential as ln(P/P°)
    pub pressure_ratio: f64,
    /// lower bound on every mole amount; must stay positive so ln(n_i)
    /// is finite on the bound itself
    pub n_lower_bound: f64,
    pub hessian_mode: GibbsHessianMode,
}

impl GibbsMinimization {
    pub fn new(
        vec_of_subs: Vec<String>,
        elem_composition_matrix: DMatrix<f64>,
        b0: DVector<f64>,
        mu0: DVector<f64>,
    ) -> Self {
        Self {
            vec_of_subs,
            elem_composition_matrix,
            b0,
            mu0,
            pressure_ratio: 1.0,
            n_lower_bound: 1e-12,
            hessian_mode: GibbsHessianMode::Dense,
        }
    }

    pub fn set_pressure_ratio(&mut self, pressure_ratio: f64) {
        self.pressure_ratio = pressure_ratio;
    }

    pub fn set_hessian_mode(&mut self, mode: GibbsHessianMode) {
        self.hessian_mode = mode;
    }

    pub fn validate(&self) -> Result<(), OptimError> {
        let n_subs = self.elem_composition_matrix.nrows();
        let n_elements = self.elem_composition_matrix.ncols();
        if self.vec_of_subs.len() != n_subs {
            return Err(OptimError::InvalidProblem(format!(
                "element composition matrix has {} substance rows but {} substances are named",
                n_subs,
                self.vec_of_subs.len()
            )));
        }
        if self.b0.len() != n_elements {
            return Err(OptimError::InvalidProblem(format!(
                "element composition matrix has {} element columns but {} abundances are given",
                n_elements,
                self.b0.len()
            )));
        }
        if self.mu0.len() != n_subs {
            return Err(OptimError::InvalidProblem(format!(
                "{} substances but {} chemical potentials are given",
                n_subs,
                self.mu0.len()
            )));
        }
        if !(self.pressure_ratio > 0.0) {
            return Err(OptimError::InvalidProblem(format!(
                "pressure ratio must be positive, got {}",
                self.pressure_ratio
            )));
        }
        if !(self.n_lower_bound > 0.0) {
            return Err(OptimError::InvalidProblem(format!(
                "mole amount lower bound must be positive, got {}",
                self.n_lower_bound
            )));
        }
        Ok(())
    }

    /// Assembles the bound-constrained optimization problem of this task.
    pub fn to_optimum_problem(&self) -> Result<OptimumProblem, OptimError> {
        self.validate()?;
        let n_subs = self.elem_composition_matrix.nrows();
        let a = self.elem_composition_matrix.transpose();
        let b = self.b0.clone();
        let l = DVector::from_element(n_subs, self.n_lower_bound);

        let mu0 = self.mu0.clone();
        let lnp = self.pressure_ratio.ln();
        let mode = self.hessian_mode;
        let objective: ObjectiveFn = Box::new(move |n: &DVector<f64>| {
            let ntot = n.sum();
            let grad = DVector::from_fn(n.len(), |i, _| mu0[i] + lnp + (n[i] / ntot).ln());
            let val = n.dot(&grad);
            let hessian = match mode {
                GibbsHessianMode::Dense => {
                    let mut h = DMatrix::from_element(n.len(), n.len(), -1.0 / ntot);
                    for i in 0..n.len() {
                        h[(i, i)] += 1.0 / n[i];
                    }
                    Hessian::Dense(h)
                }
                GibbsHessianMode::Diagonal => Hessian::Diagonal(n.map(|ni| 1.0 / ni)),
            };
            ObjectiveEval { val, grad, hessian }
        });
        Ok(OptimumProblem::new(a, b, l, objective))
    }

    /// Computes the equilibrium composition starting from the mole amounts
    /// `n0`. Returns the final state together with the solver result; the
    /// composition in the state is only an equilibrium one when
    /// `result.succeeded` is true.
    pub fn equilibrate(
        &self,
        n0: &DVector<f64>,
        options: &OptimumOptions,
    ) -> Result<(OptimumState, OptimumResult), OptimError> {
        let problem = self.to_optimum_problem()?;
        let mut state = OptimumState::new();
        state.x = n0.clone();
        let mut solver = OptimumSolverActNewton::new();
        let result = solver.solve_with_options(&problem, &mut state, options)?;
        if result.succeeded {
            info!(
                "equilibrium composition of {} substances found in {} iterations, error {:e}",
                self.vec_of_subs.len(),
                result.iterations,
                result.error
            );
        } else {
            warn!(
                "equilibrium calculation did not converge after {} iterations, error {:e}",
                result.iterations, result.error
            );
        }
        Ok((state, result))
    }
}
