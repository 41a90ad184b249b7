use super::KktSolver::{KktMatrix, KktSolution, KktSolver, KktVector};
use super::OptimumOptions::OptimumOptions;
use super::OptimumProblem::{
    Hessian, ObjectiveEval, OptimError, OptimumProblem, Regularization,
};
use super::OptimumResult::OptimumResult;
use super::OptimumState::OptimumState;
use super::Outputter::Outputter;
use super::Utils::{
    cols, fraction_to_the_boundary, multi_kahan_sum, norminf, push_row, rows, set_rows, submatrix,
    swap_remove_row,
};
use log::{info, warn};
use nalgebra::{DMatrix, DVector};
use std::time::Instant;

/// Active-set Newton solver for problems of the form
///
/// min f(x)  subject to  A*x = b,  x >= l
///
/// The variables are partitioned into the free set F (strictly above their
/// bound) and the lower-active set L (pinned at the bound). Each iteration
/// solves the KKT system restricted to F for a Newton step, walks along it
/// up to the first bound with a shared step fraction, and lets at most one
/// variable cross between the sets: the bound variable with the most
/// negative multiplier is priced into F, the free variable that hits its
/// bound first is pinned into L.
///
/// Numerical breakdowns (non-finite objective, gradient or step) terminate
/// the loop with `succeeded == false` and leave the partial iterate in the
/// state for inspection. The only hard error is an objective callback that
/// reports its Hessian in a representation other than Dense or Diagonal.
pub struct OptimumSolverActNewton {
    kkt: KktSolver,
    F: Vec<usize>,
    L: Vec<usize>,
}

impl OptimumSolverActNewton {
    pub fn new() -> Self {
        Self {
            kkt: KktSolver::new(),
            F: Vec::new(),
            L: Vec::new(),
        }
    }

    /// Free and lower-active index sets of the last solve, in no particular
    /// order. Together they cover every variable index exactly once.
    pub fn partition(&self) -> (&[usize], &[usize]) {
        (&self.F, &self.L)
    }

    /// Solves the problem with default options.
    pub fn solve(
        &mut self,
        problem: &OptimumProblem,
        state: &mut OptimumState,
    ) -> Result<OptimumResult, OptimError> {
        self.solve_with_options(problem, state, &OptimumOptions::default())
    }

    /// Solves the problem, mutating `state` in place. Check
    /// `result.succeeded` before trusting the final iterate.
    pub fn solve_with_options(
        &mut self,
        problem: &OptimumProblem,
        state: &mut OptimumState,
        options: &OptimumOptions,
    ) -> Result<OptimumResult, OptimError> {
        problem.validate()?;
        options.validate()?;
        let begin = Instant::now();

        let n = problem.num_variables();
        let m = problem.num_constraints();
        if state.x.len() == 0 {
            state.x = problem.l.clone();
        } else if state.x.len() != n {
            return Err(OptimError::DimensionMismatch(format!(
                "state has {} primal variables but the problem has {}",
                state.x.len(),
                n
            )));
        }
        if state.y.len() != m {
            state.y = DVector::zeros(m);
        }
        if state.z.len() != n {
            state.z = DVector::zeros(n);
        }

        self.kkt.set_options(&options.kkt);

        let reg = Regularization::new(&state.x, &problem.l, options.regularization);
        let regularized = |x: &DVector<f64>| reg.apply((problem.objective)(x), x);
        let objective: &dyn Fn(&DVector<f64>) -> ObjectiveEval = if options.regularization > 0.0 {
            &regularized
        } else {
            &*problem.objective
        };

        let mut ctx = ActNewtonLoop {
            a: &problem.A,
            b: &problem.b,
            l: &problem.l,
            objective,
            options,
            kkt: &mut self.kkt,
            state,
            outputter: Outputter::new(&options.output),
            n,
            m,
            F: Vec::new(),
            L: Vec::new(),
            xF: DVector::zeros(0),
            gF: DVector::zeros(0),
            hF: Hessian::Diagonal(DVector::zeros(0)),
            aF: DMatrix::zeros(m, 0),
            aL: DMatrix::zeros(m, 0),
            grad: DVector::zeros(0),
            h: DVector::zeros(m),
            rhs: KktVector::zeros(0, m),
            sol: KktSolution::zeros(0, m),
            alpha: 0.0,
            errorf: 0.0,
            errorh: 0.0,
            error: 0.0,
            result: OptimumResult::default(),
        };
        let outcome = ctx.run();
        let ActNewtonLoop {
            F, L, mut result, ..
        } = ctx;
        self.F = F;
        self.L = L;
        outcome?;

        result.time = begin.elapsed().as_secs_f64();
        if result.succeeded {
            info!(
                "active-set Newton converged in {} iterations, error {:e}, {:.3e} s ({:.3e} s in linear systems)",
                result.iterations, result.error, result.time, result.time_linear_systems
            );
        } else {
            warn!(
                "active-set Newton did not converge: {} iterations, error {:e}",
                result.iterations, result.error
            );
        }
        Ok(result)
    }
}

impl Default for OptimumSolverActNewton {
    fn default() -> Self {
        Self::new()
    }
}

/// One solve call of the active-set loop. The phases of an iteration are
/// named methods sharing this context instead of a web of capturing
/// closures, in the fixed order: newton step, iterate update, state update,
/// error update, convergence check.
struct ActNewtonLoop<'a> {
    a: &'a DMatrix<f64>,
    b: &'a DVector<f64>,
    l: &'a DVector<f64>,
    objective: &'a dyn Fn(&DVector<f64>) -> ObjectiveEval,
    options: &'a OptimumOptions,
    kkt: &'a mut KktSolver,
    state: &'a mut OptimumState,
    outputter: Outputter,
    n: usize,
    m: usize,
    F: Vec<usize>,
    L: Vec<usize>,
    xF: DVector<f64>,
    gF: DVector<f64>,
    hF: Hessian,
    aF: DMatrix<f64>,
    aL: DMatrix<f64>,
    grad: DVector<f64>,
    h: DVector<f64>,
    rhs: KktVector,
    sol: KktSolution,
    alpha: f64,
    errorf: f64,
    errorh: f64,
    error: f64,
    result: OptimumResult,
}

impl ActNewtonLoop<'_> {
    fn run(&mut self) -> Result<(), OptimError> {
        self.initialize();
        self.update_state()?;
        self.output_header();
        loop {
            self.result.iterations += 1;
            if self.result.iterations > self.options.max_iterations {
                break;
            }
            self.compute_newton_step()?;
            if self.newton_step_failed() {
                warn!(
                    "Newton step contains non-finite entries at iteration {}",
                    self.result.iterations
                );
                break;
            }
            self.update_iterates();
            self.update_state()?;
            if self.update_state_failed() {
                warn!(
                    "objective evaluation produced non-finite values at iteration {}",
                    self.result.iterations
                );
                break;
            }
            self.update_errors();
            self.output_state();
            if self.converged() {
                break;
            }
        }
        self.outputter.print();
        Ok(())
    }

    /// Clamps the iterate onto the feasible box and partitions the variables
    /// into the free and lower-active sets.
    fn initialize(&mut self) {
        self.state.x = self.state.x.zip_map(self.l, |xi, li| xi.max(li));
        for i in 0..self.n {
            if self.state.x[i] == self.l[i] {
                self.L.push(i);
            } else {
                self.F.push(i);
            }
        }
        self.aF = cols(self.a, &self.F);
        self.aL = cols(self.a, &self.L);
        self.xF = rows(&self.state.x, &self.F);
    }

    /// Re-evaluates the objective and the constraint residual at the current
    /// partition, refreshes the bound multipliers and prices at most one
    /// bound variable back into the free set.
    fn update_state(&mut self) -> Result<(), OptimError> {
        set_rows(&mut self.state.x, &self.F, &self.xF);
        for &i in &self.L {
            self.state.x[i] = self.l[i];
        }

        let f = (self.objective)(&self.state.x);
        self.state.f = f.val;
        self.grad = f.grad;

        self.h = multi_kahan_sum(self.a, &self.state.x);
        self.h -= self.b;

        // bootstrap the equality multipliers from the stationarity condition
        // of the free variables when the caller supplied none
        if self.state.y.norm() == 0.0 && !self.F.is_empty() {
            let gf = rows(&self.grad, &self.F);
            let aft = self.aF.transpose();
            self.state.y = aft
                .svd(true, true)
                .solve(&gf, 1e-14)
                .unwrap_or_else(|_| DVector::zeros(self.m));
        }

        let gl = rows(&self.grad, &self.L);
        let zl = &gl - self.aL.transpose() * &self.state.y;
        set_rows(&mut self.state.z, &self.L, &zl);

        if !self.L.is_empty() {
            let mut iminz = 0;
            let mut minz = zl[0];
            for i in 1..zl.len() {
                if zl[i] < minz {
                    minz = zl[i];
                    iminz = i;
                }
            }
            // a negative multiplier means the objective decreases along that
            // bound variable; admit the worst one. With every variable
            // pinned the KKT system is vacuous, so admit one unconditionally.
            if minz < 0.0 || self.F.is_empty() {
                let released = self.L.swap_remove(iminz);
                self.F.push(released);
                let xf = std::mem::replace(&mut self.xF, DVector::zeros(0));
                self.xF = push_row(xf, self.l[released]);
                self.aF = cols(self.a, &self.F);
                self.aL = cols(self.a, &self.L);
            }
        }

        self.gF = rows(&self.grad, &self.F);
        self.hF = match &f.hessian {
            Hessian::Dense(dense) => Hessian::Dense(submatrix(dense, &self.F, &self.F)),
            Hessian::Diagonal(diagonal) => Hessian::Diagonal(rows(diagonal, &self.F)),
            other => {
                return Err(OptimError::UnsupportedHessian(
                    other.mode_name().to_string(),
                ));
            }
        };
        Ok(())
    }

    fn update_state_failed(&self) -> bool {
        let f_finite = self.state.f.is_finite();
        let g_finite = self.grad.iter().all(|v| v.is_finite());
        !(f_finite && g_finite)
    }

    /// Solves the KKT system restricted to the free variables for the Newton
    /// step of (x_F, y).
    fn compute_newton_step(&mut self) -> Result<(), OptimError> {
        let nf = self.F.len();
        let zf = DVector::zeros(nf);
        let lhs = KktMatrix {
            hessian: &self.hF,
            A: &self.aF,
            x: &self.xF,
            z: &zf,
        };
        self.kkt.decompose(&lhs)?;

        self.rhs.rx = -(&self.gF - self.aF.transpose() * &self.state.y);
        self.rhs.ry = -self.h.clone();
        self.rhs.rz = DVector::zeros(nf);

        self.sol = KktSolution::zeros(nf, self.m);
        self.kkt.solve(&self.rhs, &mut self.sol)?;

        self.result.time_linear_systems += self.kkt.result().time_decompose;
        self.result.time_linear_systems += self.kkt.result().time_solve;
        Ok(())
    }

    fn newton_step_failed(&self) -> bool {
        let dx_finite = self.sol.dx.iter().all(|v| v.is_finite());
        let dy_finite = self.sol.dy.iter().all(|v| v.is_finite());
        let dz_finite = self.sol.dz.iter().all(|v| v.is_finite());
        !(dx_finite && dy_finite && dz_finite)
    }

    /// Walks along the Newton step with the largest shared fraction that
    /// keeps every free variable on or above its bound; the limiting
    /// variable, if any, becomes lower-active.
    fn update_iterates(&mut self) {
        let lf = rows(self.l, &self.F);
        let p = &self.xF - &lf;
        let (alpha, ilimiting) = fraction_to_the_boundary(&p, &self.sol.dx, 1.0);
        self.alpha = alpha;

        self.xF += &self.sol.dx * alpha;
        self.state.y += &self.sol.dy * alpha;
        set_rows(&mut self.state.x, &self.F, &self.xF);

        if let Some(i) = ilimiting {
            let pinned = self.F.swap_remove(i);
            self.L.push(pinned);
            let xf = std::mem::replace(&mut self.xF, DVector::zeros(0));
            self.xF = swap_remove_row(xf, i);
            self.aF = cols(self.a, &self.F);
            self.aL = cols(self.a, &self.L);
        }
    }

    fn update_errors(&mut self) {
        self.errorf = norminf(&(&self.gF - self.aF.transpose() * &self.state.y));
        self.errorh = norminf(&self.h);
        self.error = self.errorf.max(self.errorh);
        self.result.error = self.error;
    }

    fn converged(&mut self) -> bool {
        if self.error < self.options.tolerance {
            self.result.succeeded = true;
            return true;
        }
        false
    }

    fn output_header(&mut self) {
        self.outputter.header(self.n, self.m);
        self.outputter.state(
            self.result.iterations,
            &self.state.x,
            &self.state.y,
            &self.state.z,
            self.state.f,
            norminf(&self.h),
            None,
        );
    }

    fn output_state(&mut self) {
        self.outputter.state(
            self.result.iterations,
            &self.state.x,
            &self.state.y,
            &self.state.z,
            self.state.f,
            norminf(&self.h),
            Some((self.errorf, self.errorh, self.error, self.alpha)),
        );
    }
}
