//! Small dense linear-algebra helpers over `ndarray`.
//!
//! smartcore fits the models; these routines cover what it does not expose:
//! rank checks, `(XᵀX)⁻¹` for standard errors, and repeated least-squares
//! solves against one design (Box-Cox profiling, VIF, subset search).

use ndarray::{s, Array1, Array2};

/// Relative residual norm below which a column counts as linearly dependent.
pub const RANK_TOLERANCE: f64 = 1e-7;

/// Prepends a column of ones.
pub fn with_intercept(x: &Array2<f64>) -> Array2<f64> {
    let (n, p) = x.dim();
    let mut out = Array2::ones((n, p + 1));
    out.slice_mut(s![.., 1..]).assign(x);
    out
}

/// Indices of columns that are (numerically) linear combinations of the
/// columns before them.
///
/// Modified Gram-Schmidt with one re-orthogonalisation pass. A column is
/// dependent when its residual norm is at most `tol` times its own norm.
pub fn dependent_columns(x: &Array2<f64>, tol: f64) -> Vec<usize> {
    let mut basis: Vec<Array1<f64>> = Vec::new();
    let mut dependent = Vec::new();

    for (j, column) in x.columns().into_iter().enumerate() {
        let norm = column.dot(&column).sqrt();
        if norm == 0.0 {
            dependent.push(j);
            continue;
        }
        let mut v = column.to_owned();
        for _ in 0..2 {
            for q in &basis {
                let c = q.dot(&v);
                v.scaled_add(-c, q);
            }
        }
        let r = v.dot(&v).sqrt();
        if r <= tol * norm {
            dependent.push(j);
        } else {
            basis.push(v / r);
        }
    }
    dependent
}

/// Lower-triangular Cholesky factor of a symmetric positive definite matrix.
pub fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return None;
    }
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[[i, j]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }
    Some(l)
}

/// Solves `L Lᵀ x = b` given the Cholesky factor `L`.
pub fn cholesky_solve(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * z[k];
        }
        z[i] = sum / l[[i, i]];
    }
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    x
}

/// Inverse of a symmetric positive definite matrix, `None` if it is singular.
pub fn spd_inverse(a: &Array2<f64>) -> Option<Array2<f64>> {
    let l = cholesky(a)?;
    let n = a.nrows();
    let mut inv = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut e = Array1::<f64>::zeros(n);
        e[j] = 1.0;
        inv.column_mut(j).assign(&cholesky_solve(&l, &e));
    }
    Some(inv)
}

/// Normal-equation least squares against one fixed design.
///
/// Factorises `XᵀX` once so many responses can be solved cheaply.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    x: Array2<f64>,
    factor: Array2<f64>,
}

impl LeastSquares {
    /// `None` when `XᵀX` is not positive definite.
    pub fn new(x: Array2<f64>) -> Option<Self> {
        let gram = x.t().dot(&x);
        let factor = cholesky(&gram)?;
        Some(Self { x, factor })
    }

    pub fn n_cols(&self) -> usize {
        self.x.ncols()
    }

    pub fn coefficients(&self, y: &Array1<f64>) -> Array1<f64> {
        let xty = self.x.t().dot(y);
        cholesky_solve(&self.factor, &xty)
    }

    /// Residual sum of squares of the fit of `y`.
    pub fn rss(&self, y: &Array1<f64>) -> f64 {
        let beta = self.coefficients(y);
        let fitted = self.x.dot(&beta);
        (y - &fitted).mapv(|r| r * r).sum()
    }
}

/// Builds an `n x p` array from row vectors; all rows must have length `p`.
pub fn rows_to_array(rows: &[Vec<f64>], p: usize) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros((rows.len(), p));
    for (i, row) in rows.iter().enumerate() {
        for (j, v) in row.iter().enumerate().take(p) {
            out[[i, j]] = *v;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn detects_exact_linear_combination() {
        // third column = first + 2 * second
        let x = array![
            [294.0, 110.25, 514.5],
            [318.5, 122.5, 563.5],
            [294.0, 147.0, 588.0],
            [343.0, 147.0, 637.0],
            [245.0, 220.5, 686.0],
        ];
        assert_eq!(dependent_columns(&with_intercept(&x), RANK_TOLERANCE), vec![3]);
    }

    #[test]
    fn independent_columns_pass() {
        let x = array![[1.0, 2.0], [2.0, 1.0], [3.0, 5.0], [4.0, 3.0]];
        assert!(dependent_columns(&with_intercept(&x), RANK_TOLERANCE).is_empty());
    }

    #[test]
    fn constant_column_is_aliased_with_intercept() {
        let x = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
        assert_eq!(dependent_columns(&with_intercept(&x), RANK_TOLERANCE), vec![2]);
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let a = array![[4.0, 2.0, 0.6], [2.0, 5.0, 1.0], [0.6, 1.0, 3.0]];
        let inv = spd_inverse(&a).unwrap();
        let id = a.dot(&inv);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((id[[i, j]] - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        assert!(spd_inverse(&a).is_none());
    }

    #[test]
    fn least_squares_recovers_exact_line() {
        let x = with_intercept(&array![[0.0], [1.0], [2.0], [3.0]]);
        let y = array![1.0, 3.0, 5.0, 7.0];
        let ls = LeastSquares::new(x).unwrap();
        let beta = ls.coefficients(&y);
        assert!((beta[0] - 1.0).abs() < 1e-10);
        assert!((beta[1] - 2.0).abs() < 1e-10);
        assert!(ls.rss(&y) < 1e-20);
    }
}
