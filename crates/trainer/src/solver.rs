//! L2-regularized binary logistic regression
//!
//! Minimizes `C * sum(log_loss) + 0.5 * ||w||^2` with Newton steps and a
//! backtracking line search. The intercept is not penalized. The problem
//! is strictly convex, so the result only depends on the data and the
//! parameters, never on the iteration path.

use crate::errors::{Result, TrainerError};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use stockwatch_core::{sigmoid, CoreError, LogisticModel};
use tracing::{debug, warn};

/// Solver configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    /// Inverse regularization strength
    pub c: f64,
    pub max_iter: usize,
    /// Stop once every gradient component is within this bound
    pub tol: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            tol: 1e-4,
        }
    }
}

impl LogisticRegression {
    pub fn new(c: f64, max_iter: usize, tol: f64) -> Self {
        Self { c, max_iter, tol }
    }

    /// Fit on scaled features `x` and 0/1 labels `y`.
    ///
    /// Running out of iterations is not an error: the current estimate is
    /// returned with `converged == false` and a warning is logged.
    pub fn fit(&self, x: ArrayView2<'_, f64>, y: &[u8], feature_names: Vec<String>) -> Result<LogisticModel> {
        let (n, p) = x.dim();
        if n == 0 {
            return Err(CoreError::InvalidRecord("cannot fit on zero rows".into()).into());
        }
        if y.len() != n {
            return Err(CoreError::DimensionMismatch { expected: n, got: y.len() }.into());
        }
        if feature_names.len() != p {
            return Err(CoreError::DimensionMismatch {
                expected: p,
                got: feature_names.len(),
            }
            .into());
        }
        if self.c <= 0.0 {
            return Err(TrainerError::Core(CoreError::Config(format!(
                "C must be positive, got {}",
                self.c
            ))));
        }

        // Design matrix with a trailing intercept column.
        let mut xa = Array2::<f64>::ones((n, p + 1));
        xa.slice_mut(s![.., ..p]).assign(&x);
        let labels: Array1<f64> = y.iter().map(|&v| f64::from(v)).collect();

        let mut theta = Array1::<f64>::zeros(p + 1);
        let mut iterations = 0;
        let mut converged = false;

        loop {
            let z = xa.dot(&theta);
            let prob = z.mapv(sigmoid);
            let residual = &prob - &labels;

            let mut grad = xa.t().dot(&residual) * self.c;
            for j in 0..p {
                grad[j] += theta[j];
            }
            let grad_max = grad.iter().fold(0.0_f64, |m, g| m.max(g.abs()));
            let objective = self.objective(&z, &labels, theta.view(), p);
            debug!(iteration = iterations, objective, grad_max, "solver step");

            if grad_max <= self.tol {
                converged = true;
                break;
            }
            if iterations >= self.max_iter {
                break;
            }

            let weights = prob.mapv(|q| self.c * q * (1.0 - q));
            let weighted = &xa * &weights.view().insert_axis(Axis(1));
            let mut hessian = xa.t().dot(&weighted);
            for j in 0..p {
                hessian[[j, j]] += 1.0;
            }
            let direction = solve_spd(&hessian, &grad);

            // Backtracking line search on the objective (Armijo condition).
            let slope = grad.dot(&direction);
            let mut step = 1.0;
            loop {
                let candidate = &theta - &(&direction * step);
                let value = self.objective(&xa.dot(&candidate), &labels, candidate.view(), p);
                if value <= objective - 1e-4 * step * slope || step < 1e-10 {
                    theta = candidate;
                    break;
                }
                step *= 0.5;
            }
            iterations += 1;
        }

        if !converged {
            warn!(
                max_iter = self.max_iter,
                "ConvergenceWarning: solver did not converge; increase max_iter or scale the data"
            );
        }

        Ok(LogisticModel {
            feature_names,
            coefficients: theta.slice(s![..p]).to_vec(),
            intercept: theta[p],
            iterations,
            converged,
        })
    }

    fn objective(&self, z: &Array1<f64>, labels: &Array1<f64>, theta: ArrayView1<'_, f64>, p: usize) -> f64 {
        let data_term: f64 = z
            .iter()
            .zip(labels.iter())
            .map(|(&zi, &yi)| softplus(zi) - yi * zi)
            .sum();
        let penalty = theta.slice(s![..p]).dot(&theta.slice(s![..p]));
        self.c * data_term + 0.5 * penalty
    }
}

/// `ln(1 + e^z)` without overflow.
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

/// Solve `a * x = b` for symmetric positive definite `a` by Cholesky.
///
/// A diagonal jitter is added when the factorization breaks down; if that
/// keeps failing the gradient itself is returned as the direction.
fn solve_spd(a: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let scale = a.diag().iter().fold(0.0_f64, |m, v| m.max(v.abs())).max(1.0);
    let mut jitter = 0.0;
    for _ in 0..8 {
        let mut shifted = a.clone();
        if jitter > 0.0 {
            shifted.diag_mut().mapv_inplace(|v| v + jitter);
        }
        if let Some(l) = cholesky(&shifted) {
            return cholesky_solve(&l, b);
        }
        jitter = if jitter == 0.0 { 1e-10 * scale } else { jitter * 100.0 };
    }
    b.clone()
}

fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }
    Some(l)
}

fn cholesky_solve(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();
    // L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * z[k];
        }
        z[i] = sum / l[[i, i]];
    }
    // L^T x = z
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

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(p: usize) -> Vec<String> {
        (0..p).map(|i| format!("x{i}")).collect()
    }

    #[test]
    fn cholesky_solves_small_system() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![2.0, 1.0];
        let x = solve_spd(&a, &b);
        let back = a.dot(&x);
        assert!((back[0] - 2.0).abs() < 1e-12);
        assert!((back[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn fit_reaches_stationary_point() {
        let x = array![[-2.0, 0.5], [-1.0, -0.3], [-0.5, 1.0], [0.5, -1.0], [1.0, 0.2], [2.0, 0.0]];
        let y = [0u8, 0, 1, 0, 1, 1];
        let solver = LogisticRegression::default();
        let model = solver.fit(x.view(), &y, names(2)).unwrap();
        assert!(model.converged);
        assert!(model.coefficients[0] > 0.0);

        // Gradient of the penalized objective vanishes at the solution.
        let probs = model.predict_proba_matrix(x.view()).unwrap();
        let resid: Vec<f64> = probs.iter().zip(&y).map(|(p, &t)| p - f64::from(t)).collect();
        for j in 0..2 {
            let g: f64 = resid.iter().zip(x.column(j)).map(|(r, v)| r * v).sum::<f64>()
                + model.coefficients[j];
            assert!(g.abs() <= 1e-4);
        }
        assert!(resid.iter().sum::<f64>().abs() <= 1e-4);
    }

    #[test]
    fn separable_data_stays_finite() {
        let x = array![[-1.0], [-0.5], [0.5], [1.0]];
        let model = LogisticRegression::default().fit(x.view(), &[0, 0, 1, 1], names(1)).unwrap();
        assert!(model.coefficients[0].is_finite());
        assert!(model.converged);
    }

    #[test]
    fn iteration_cap_returns_unconverged_model() {
        let x = array![[-2.0], [-1.0], [1.0], [2.0], [0.1]];
        let solver = LogisticRegression::new(1.0, 0, 1e-12);
        let model = solver.fit(x.view(), &[0, 1, 0, 1, 1], names(1)).unwrap();
        assert!(!model.converged);
        assert_eq!(model.iterations, 0);
        assert_eq!(model.coefficients, vec![0.0]);
    }

    #[test]
    fn label_count_must_match_rows() {
        let x = array![[1.0], [2.0]];
        assert!(LogisticRegression::default().fit(x.view(), &[1], names(1)).is_err());
    }

    #[test]
    fn softplus_matches_naive_form() {
        for z in [-5.0, -0.1, 0.0, 0.7, 4.0] {
            assert!((softplus(z) - (1.0 + f64::exp(z)).ln()).abs() < 1e-12);
        }
        assert!(softplus(1000.0).is_finite());
    }
}
