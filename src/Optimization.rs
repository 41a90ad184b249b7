/// KKT linear system solver: dense saddle-point factorization and Schur
/// complement path for diagonal Hessians
pub mod KktSolver;
/// configuration of the optimization calculation
pub mod OptimumOptions;
/// definition of the constrained optimization problem: equality constraints,
/// lower bounds and the objective callback with its Hessian representation
pub mod OptimumProblem;
/// result record of an optimization calculation
pub mod OptimumResult;
/// active-set Newton solver for bound-constrained minimization with linear
/// equality constraints
pub mod OptimumSolverActNewton;
/// iterate of the optimization calculation: primal variables and dual
/// multipliers of the equality and bound constraints
pub mod OptimumState;
/// tabular per-iteration trace of the solver
pub mod Outputter;
/// numeric helpers shared by the solvers
pub mod Utils;
