use super::OptimumOptions::KktOptions;
use super::OptimumProblem::{Hessian, OptimError};
use nalgebra::{Cholesky, DMatrix, DVector, Dyn, FullPivLU, LU};
use std::time::Instant;

/// Left-hand side of the KKT equations restricted to the free variables:
/// the Hessian block, the constraint submatrix and the primal/dual
/// subvectors of the bound constraints.
pub struct KktMatrix<'a> {
    pub hessian: &'a Hessian,
    pub A: &'a DMatrix<f64>,
    pub x: &'a DVector<f64>,
    pub z: &'a DVector<f64>,
}

/// Right-hand side of the KKT equations.
#[derive(Debug, Clone)]
pub struct KktVector {
    pub rx: DVector<f64>,
    pub ry: DVector<f64>,
    pub rz: DVector<f64>,
}

impl KktVector {
    pub fn zeros(nf: usize, m: usize) -> Self {
        Self {
            rx: DVector::zeros(nf),
            ry: DVector::zeros(m),
            rz: DVector::zeros(nf),
        }
    }
}

/// Newton step solved from the KKT equations.
#[derive(Debug, Clone)]
pub struct KktSolution {
    pub dx: DVector<f64>,
    pub dy: DVector<f64>,
    pub dz: DVector<f64>,
}

impl KktSolution {
    pub fn zeros(nf: usize, m: usize) -> Self {
        Self {
            dx: DVector::zeros(nf),
            dy: DVector::zeros(m),
            dz: DVector::zeros(nf),
        }
    }
}

/// Timing record of the last decompose/solve pair, in seconds.
#[derive(Debug, Clone, Default)]
pub struct KktResult {
    pub time_decompose: f64,
    pub time_solve: f64,
}

enum DenseFactor {
    Partial(LU<f64, Dyn, Dyn>),
    Full(FullPivLU<f64, Dyn, Dyn>),
}

enum SchurFactor {
    Cholesky(Cholesky<f64, Dyn>),
    Lu(LU<f64, Dyn, Dyn>),
}

enum Decomposition {
    None,
    Dense {
        factor: DenseFactor,
    },
    Diagonal {
        hinv: DVector<f64>,
        // A with its columns scaled by 1/h, so ah = A*H^-1
        ah: DMatrix<f64>,
        at: DMatrix<f64>,
        factor: SchurFactor,
    },
}

/// Solver of the KKT equations
///
/// H*dx - A'*dy       = rx
/// A*dx               = ry
/// Z*dx       + X*dz  = rz
///
/// For a dense Hessian the saddle matrix [[H, -A'], [A, 0]] is factorized
/// with LU (partial pivoting by default, full pivoting on request). For a
/// diagonal Hessian no dense factorization is formed at all: dy comes from
/// the m x m Schur complement A*H^-1*A' (Cholesky with LU fallback) and dx
/// from the diagonal back-substitution.
pub struct KktSolver {
    options: KktOptions,
    result: KktResult,
    decomposition: Decomposition,
    nf: usize,
    m: usize,
    x: DVector<f64>,
    z: DVector<f64>,
}

impl KktSolver {
    pub fn new() -> Self {
        Self {
            options: KktOptions::default(),
            result: KktResult::default(),
            decomposition: Decomposition::None,
            nf: 0,
            m: 0,
            x: DVector::zeros(0),
            z: DVector::zeros(0),
        }
    }

    pub fn set_options(&mut self, options: &KktOptions) {
        self.options = *options;
    }

    pub fn result(&self) -> &KktResult {
        &self.result
    }

    /// Factorizes the KKT matrix. Fails only on an unsupported Hessian
    /// representation or on incoherent block shapes; a singular matrix is
    /// detected later, in `solve`, as a non-finite step.
    pub fn decompose(&mut self, lhs: &KktMatrix) -> Result<(), OptimError> {
        let begin = Instant::now();
        let nf = lhs.A.ncols();
        let m = lhs.A.nrows();
        if lhs.x.len() != nf || lhs.z.len() != nf {
            return Err(OptimError::DimensionMismatch(format!(
                "KKT subvectors have lengths {} and {} but the constraint submatrix has {} columns",
                lhs.x.len(),
                lhs.z.len(),
                nf
            )));
        }
        self.nf = nf;
        self.m = m;
        self.x = lhs.x.clone();
        self.z = lhs.z.clone();

        self.decomposition = match lhs.hessian {
            Hessian::Dense(h) => {
                if h.nrows() != nf || h.ncols() != nf {
                    return Err(OptimError::DimensionMismatch(format!(
                        "dense Hessian block is {}x{} but {} free variables are expected",
                        h.nrows(),
                        h.ncols(),
                        nf
                    )));
                }
                let mut k = DMatrix::zeros(nf + m, nf + m);
                k.view_mut((0, 0), (nf, nf)).copy_from(h);
                k.view_mut((0, nf), (nf, m))
                    .copy_from(&(-lhs.A.transpose()));
                k.view_mut((nf, 0), (m, nf)).copy_from(lhs.A);
                let factor = if self.options.full_pivoting {
                    DenseFactor::Full(k.full_piv_lu())
                } else {
                    DenseFactor::Partial(k.lu())
                };
                Decomposition::Dense { factor }
            }
            Hessian::Diagonal(h) => {
                if h.len() != nf {
                    return Err(OptimError::DimensionMismatch(format!(
                        "diagonal Hessian block has {} entries but {} free variables are expected",
                        h.len(),
                        nf
                    )));
                }
                let hinv = h.map(|v| 1.0 / v);
                let at = lhs.A.transpose();
                let mut ah = lhs.A.clone();
                for j in 0..nf {
                    ah.column_mut(j).scale_mut(hinv[j]);
                }
                let s = &ah * &at;
                let factor = match Cholesky::new(s.clone()) {
                    Some(cholesky) => SchurFactor::Cholesky(cholesky),
                    None => SchurFactor::Lu(s.lu()),
                };
                Decomposition::Diagonal {
                    hinv,
                    ah,
                    at,
                    factor,
                }
            }
            other => {
                return Err(OptimError::UnsupportedHessian(
                    other.mode_name().to_string(),
                ));
            }
        };
        self.result.time_decompose = begin.elapsed().as_secs_f64();
        Ok(())
    }

    /// Solves for the step of the last decomposed KKT matrix. A singular
    /// factorization yields a non-finite step rather than an error, so the
    /// caller can report it as a numerical failure of the iteration.
    pub fn solve(&mut self, rhs: &KktVector, sol: &mut KktSolution) -> Result<(), OptimError> {
        let begin = Instant::now();
        let (nf, m) = (self.nf, self.m);
        if rhs.rx.len() != nf || rhs.ry.len() != m || rhs.rz.len() != nf {
            return Err(OptimError::DimensionMismatch(format!(
                "KKT right-hand side has lengths ({}, {}, {}), expected ({}, {}, {})",
                rhs.rx.len(),
                rhs.ry.len(),
                rhs.rz.len(),
                nf,
                m,
                nf
            )));
        }
        match &self.decomposition {
            Decomposition::None => {
                return Err(OptimError::InvalidProblem(
                    "KKT solve called before decompose".to_string(),
                ));
            }
            Decomposition::Dense { factor } => {
                let mut r = DVector::zeros(nf + m);
                r.view_mut((0, 0), (nf, 1)).copy_from(&rhs.rx);
                r.view_mut((nf, 0), (m, 1)).copy_from(&rhs.ry);
                let s = match factor {
                    DenseFactor::Partial(lu) => lu.solve(&r),
                    DenseFactor::Full(lu) => lu.solve(&r),
                };
                let s = s.unwrap_or_else(|| DVector::from_element(nf + m, f64::NAN));
                sol.dx = s.rows(0, nf).into_owned();
                sol.dy = s.rows(nf, m).into_owned();
            }
            Decomposition::Diagonal {
                hinv,
                ah,
                at,
                factor,
            } => {
                // substituting dx = H^-1*(rx + A'*dy) into A*dx = ry gives
                // (A*H^-1*A')*dy = ry - A*H^-1*rx
                let ry_schur = &rhs.ry - ah * &rhs.rx;
                sol.dy = match factor {
                    SchurFactor::Cholesky(cholesky) => cholesky.solve(&ry_schur),
                    SchurFactor::Lu(lu) => lu
                        .solve(&ry_schur)
                        .unwrap_or_else(|| DVector::from_element(m, f64::NAN)),
                };
                sol.dx = (&rhs.rx + at * &sol.dy).component_mul(hinv);
            }
        }
        // bound dual block: with z identically zero the third KKT equation
        // reduces to X*dz = rz
        if self.z.iter().all(|&zi| zi == 0.0) {
            sol.dz = rhs
                .rz
                .zip_map(&self.x, |rzi, xi| if rzi == 0.0 { 0.0 } else { rzi / xi });
        } else {
            sol.dz = DVector::from_fn(nf, |i, _| (rhs.rz[i] - self.z[i] * sol.dx[i]) / self.x[i]);
        }
        self.result.time_solve = begin.elapsed().as_secs_f64();
        Ok(())
    }
}

impl Default for KktSolver {
    fn default() -> Self {
        Self::new()
    }
}
