//! Closed-form multivariate complex Gaussian integrals.
//!
//! Every Gaussian-family overlap reduces to
//!
//! $$
//! I = \int_{\mathbb{R}^n} \exp\!\left(-\mathbf{x}^T \mathbf{M} \mathbf{x}
//!     + \mathbf{b}^T\mathbf{x} + c\right) d^n x
//! $$
//!
//! with $\mathbf{M}$ complex symmetric and $\mathrm{Re}\,\mathbf{M}$ positive
//! definite. The variables are integrated out one at a time:
//!
//! $$
//! \int e^{-a x^2 + \beta x}\, dx = \sqrt{\pi / a}\; e^{\beta^2 / 4a},
//! $$
//!
//! and the remaining quadratic form is updated with the Schur complement.
//! Each pivot keeps a positive real part, so the principal branch of the
//! square root is always the correct one (a determinant formula would have
//! to track the branch separately).

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::error::{HomError, Result};

/// A Gaussian exponent written about its centre:
/// $\ln N - (\mathbf{x}-\mathbf{m})^T \mathbf{Q} (\mathbf{x}-\mathbf{m})$.
#[derive(Debug, Clone)]
pub struct CentredExponent {
    /// Symmetric quadratic coefficient matrix $\mathbf{Q}$.
    pub quadratic: Array2<Complex64>,
    /// Centre $\mathbf{m}$.
    pub centre: Vec<f64>,
    /// Logarithm of the normalisation prefactor.
    pub ln_norm: Complex64,
}

impl CentredExponent {
    pub fn dim(&self) -> usize {
        self.centre.len()
    }

    /// Evaluate $\exp(\cdot)$ at a point.
    pub fn evaluate(&self, x: &[f64]) -> Complex64 {
        let n = self.dim();
        let mut exponent = self.ln_norm;
        for i in 0..n {
            for j in 0..n {
                exponent -= self.quadratic[[i, j]] * (x[i] - self.centre[i]) * (x[j] - self.centre[j]);
            }
        }
        exponent.exp()
    }
}

/// The integrand $\exp(-\mathbf{x}^T\mathbf{M}\mathbf{x} + \mathbf{b}^T\mathbf{x} + c)$.
#[derive(Debug, Clone)]
pub struct GaussianForm {
    m: Array2<Complex64>,
    b: Array1<Complex64>,
    c: Complex64,
}

impl GaussianForm {
    /// The constant integrand $1$ over `dim` variables.
    pub fn new(dim: usize) -> Self {
        Self {
            m: Array2::zeros((dim, dim)),
            b: Array1::zeros(dim),
            c: Complex64::from(0.0),
        }
    }

    pub fn dim(&self) -> usize {
        self.b.len()
    }

    /// Multiply by a factor $e^{E(\mathbf{y})}$ (or its complex conjugate),
    /// where $\mathbf{y}$ are the variables `vars` of this form.
    pub fn absorb(&mut self, term: &CentredExponent, vars: &[usize], conjugate: bool) {
        let k = |z: Complex64| if conjugate { z.conj() } else { z };
        let n = term.dim();
        debug_assert_eq!(n, vars.len());

        // −(y−m)ᵀQ(y−m) = −yᵀQy + 2(Qm)ᵀy − mᵀQm
        for a in 0..n {
            let mut qm = Complex64::from(0.0);
            for b in 0..n {
                let q = k(term.quadratic[[a, b]]);
                self.m[[vars[a], vars[b]]] += q;
                qm += q * term.centre[b];
            }
            self.b[vars[a]] += 2.0 * qm;
            self.c -= qm * term.centre[a];
        }
        self.c += k(term.ln_norm);
    }

    /// Multiply by $e^{\kappa x_i}$.
    pub fn add_linear(&mut self, var: usize, kappa: Complex64) {
        self.b[var] += kappa;
    }

    /// Multiply by $e^{c}$.
    pub fn add_constant(&mut self, c: Complex64) {
        self.c += c;
    }

    /// Integrate over all variables.
    ///
    /// Fails with [`HomError::InvalidParameter`] if a pivot has a
    /// non-positive real part, i.e. the integral diverges.
    pub fn integrate(&self) -> Result<Complex64> {
        let mut m = self.m.clone();
        let mut b = self.b.clone();
        let mut log_value = self.c;
        let ln_pi = std::f64::consts::PI.ln();

        for last in (0..self.dim()).rev() {
            let pivot = m[[last, last]];
            if !(pivot.re > 0.0) {
                return Err(HomError::invalid(
                    "gaussian_form",
                    pivot.re,
                    "quadratic form is not positive definite; the overlap integral diverges",
                ));
            }
            let b_last = b[last];
            log_value += 0.5 * (ln_pi - pivot.ln()) + b_last * b_last / (4.0 * pivot);

            for i in 0..last {
                let m_il = m[[i, last]];
                b[i] -= b_last * m_il / pivot;
                for j in 0..last {
                    let update = m_il * m[[last, j]] / pivot;
                    m[[i, j]] -= update;
                }
            }
        }

        Ok(log_value.exp())
    }
}
