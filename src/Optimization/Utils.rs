use nalgebra::{DMatrix, DVector};

/// Computes the residual vector res = A*x row by row with Kahan compensated
/// summation. Constraint residuals of mass-balance matrices mix entries of
/// very different magnitude, so the plain dot product loses digits there.
pub fn multi_kahan_sum(a: &DMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    let mut res = DVector::zeros(a.nrows());
    for i in 0..a.nrows() {
        let mut c = 0.0;
        for j in 0..a.ncols() {
            let y = a[(i, j)] * x[j] - c;
            let t = res[i] + y;
            c = (t - res[i]) - y;
            res[i] = t;
        }
    }
    res
}

/// Largest step fraction alpha in (0, 1] such that p + alpha*dp >= (1 - tau)*p
/// componentwise, together with the index of the limiting component.
/// Returns (1.0, None) when no component limits the step.
pub fn fraction_to_the_boundary(
    p: &DVector<f64>,
    dp: &DVector<f64>,
    tau: f64,
) -> (f64, Option<usize>) {
    let mut alpha = 1.0;
    let mut ilimiting = None;
    for i in 0..p.len() {
        if dp[i] < 0.0 {
            let alpha_i = -tau * p[i] / dp[i];
            if alpha_i < alpha {
                alpha = alpha_i;
                ilimiting = Some(i);
            }
        }
    }
    (alpha, ilimiting)
}

/// Max-norm of a vector, zero for the empty vector.
pub fn norminf(v: &DVector<f64>) -> f64 {
    v.iter().fold(0.0, |acc: f64, &x| acc.max(x.abs()))
}

/// Subvector of `v` at the given indices.
pub fn rows(v: &DVector<f64>, idx: &[usize]) -> DVector<f64> {
    v.select_rows(idx.iter())
}

/// Submatrix of `a` made of the given columns.
pub fn cols(a: &DMatrix<f64>, idx: &[usize]) -> DMatrix<f64> {
    a.select_columns(idx.iter())
}

/// Submatrix of `a` at the given row and column indices.
pub fn submatrix(a: &DMatrix<f64>, irows: &[usize], icols: &[usize]) -> DMatrix<f64> {
    a.select_rows(irows.iter()).select_columns(icols.iter())
}

/// Scatters `values` back into `v` at the given indices.
pub fn set_rows(v: &mut DVector<f64>, idx: &[usize], values: &DVector<f64>) {
    for (k, &i) in idx.iter().enumerate() {
        v[i] = values[k];
    }
}

/// Removes entry `i` by swapping the last entry into its place. The entry
/// order mirrors the index vectors of the active-set partition, which use
/// Vec::swap_remove, so both must shrink the same way.
pub fn swap_remove_row(v: DVector<f64>, i: usize) -> DVector<f64> {
    let mut v = v;
    let last = v.len() - 1;
    v.swap_rows(i, last);
    v.remove_row(last)
}

/// Appends a single entry at the end of the vector.
pub fn push_row(v: DVector<f64>, value: f64) -> DVector<f64> {
    let n = v.len();
    v.insert_row(n, value)
}
