#[cfg(test)]
mod tests {
    use crate::GibbsEquilibrium::GibbsMinimization::{GibbsHessianMode, GibbsMinimization};
    use crate::Optimization::OptimumOptions::OptimumOptions;
    use crate::Optimization::OptimumProblem::{Hessian, OptimError};
    use crate::Optimization::Utils::norminf;
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};

    /// H <-> H2 system: one element, two substances. At equilibrium the
    /// stationarity conditions give ln(x_H^2 / x_H2) = mu0_H2 - 2*mu0_H
    /// independently of the total amount.
    fn dissociation_task() -> GibbsMinimization {
        GibbsMinimization::new(
            vec!["H".to_string(), "H2".to_string()],
            DMatrix::from_row_slice(2, 1, &[1.0, 2.0]),
            DVector::from_vec(vec![1.0]),
            DVector::from_vec(vec![2.0, 0.0]),
        )
    }

    fn check_dissociation_equilibrium(task: &GibbsMinimization, max_iterations: usize) {
        let mut options = OptimumOptions::default();
        options.max_iterations = max_iterations;
        let n0 = DVector::from_vec(vec![0.1, 0.45]);
        let (state, result) = task.equilibrate(&n0, &options).unwrap();
        println!(
            "n_H = {:.6e}, n_H2 = {:.6e}, iterations = {}",
            state.x[0], state.x[1], result.iterations
        );
        assert!(result.succeeded);
        // element conservation: n_H + 2*n_H2 = 1
        assert_relative_eq!(state.x[0] + 2.0 * state.x[1], 1.0, epsilon = 1e-8);
        // law of mass action
        let ntot = state.x.sum();
        let x_h = state.x[0] / ntot;
        let x_h2 = state.x[1] / ntot;
        assert_relative_eq!((x_h * x_h / x_h2).ln(), -4.0, epsilon = 1e-6);
    }

    #[test]
    fn test_dissociation_equilibrium_dense_hessian() {
        let task = dissociation_task();
        check_dissociation_equilibrium(&task, 100);
    }

    #[test]
    fn test_dissociation_equilibrium_diagonal_hessian() {
        let mut task = dissociation_task();
        task.set_hessian_mode(GibbsHessianMode::Diagonal);
        check_dissociation_equilibrium(&task, 500);
    }

    #[test]
    fn test_combustion_products_equilibrium() {
        // CO, CO2, O2 over the elements C and O
        let task = GibbsMinimization::new(
            vec!["CO".to_string(), "CO2".to_string(), "O2".to_string()],
            DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 1.0, 2.0, 0.0, 2.0]),
            DVector::from_vec(vec![1.0, 1.5]),
            DVector::from_vec(vec![-10.0, -12.0, 0.0]),
        );
        let problem = task.to_optimum_problem().unwrap();
        let mut options = OptimumOptions::default();
        options.max_iterations = 300;
        // feasible start: C balance 1.0, O balance 0.6 + 0.8 + 0.1 = 1.5
        let n0 = DVector::from_vec(vec![0.6, 0.4, 0.05]);
        let (state, result) = task.equilibrate(&n0, &options).unwrap();
        assert!(result.succeeded);
        let residual = &problem.A * &state.x - &problem.b;
        assert!(norminf(&residual) < options.tolerance);
        assert!(result.error < options.tolerance);
        // law of mass action of CO + 1/2 O2 <-> CO2:
        // ln(x_CO2 / (x_CO * sqrt(x_O2))) = mu0_CO + 0.5*mu0_O2 - mu0_CO2 = 2
        let ntot = state.x.sum();
        let x_co = state.x[0] / ntot;
        let x_co2 = state.x[1] / ntot;
        let x_o2 = state.x[2] / ntot;
        assert_relative_eq!((x_co2 / (x_co * x_o2.sqrt())).ln(), 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_objective_value_and_gradient() {
        let task = dissociation_task();
        let problem = task.to_optimum_problem().unwrap();
        let n = DVector::from_vec(vec![0.25, 0.25]);
        let f = problem.eval(&n);
        // both mole fractions are 0.5
        let half_ln = 0.5f64.ln();
        assert_relative_eq!(f.grad[0], 2.0 + half_ln, epsilon = 1e-14);
        assert_relative_eq!(f.grad[1], half_ln, epsilon = 1e-14);
        assert_relative_eq!(f.val, 0.25 * (2.0 + half_ln) + 0.25 * half_ln, epsilon = 1e-14);
        match f.hessian {
            Hessian::Dense(h) => {
                // 1/n_i - 1/N on the diagonal, -1/N off it
                assert_relative_eq!(h[(0, 0)], 4.0 - 2.0, epsilon = 1e-14);
                assert_relative_eq!(h[(0, 1)], -2.0, epsilon = 1e-14);
            }
            _ => panic!("dense mode must produce a dense Hessian"),
        }
    }

    #[test]
    fn test_incoherent_task_rejected() {
        let mut task = dissociation_task();
        task.b0 = DVector::from_vec(vec![1.0, 2.0]);
        assert!(matches!(
            task.to_optimum_problem(),
            Err(OptimError::InvalidProblem(_))
        ));
        let mut task = dissociation_task();
        task.mu0 = DVector::from_vec(vec![0.0]);
        assert!(matches!(task.validate(), Err(OptimError::InvalidProblem(_))));
        let mut task = dissociation_task();
        task.n_lower_bound = 0.0;
        assert!(task.validate().is_err());
    }
}
