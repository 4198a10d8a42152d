//! Multi-mode photons as weighted Schmidt-mode superpositions.
//!
//! A photon from a spectrally entangled pair is, after tracing out its
//! partner, in the mixed state
//!
//! $$
//! \rho(\omega,\omega') = \sum_k \lambda_k\, \psi_k(\omega)\, \psi_k^*(\omega'),
//! \qquad \sum_k \lambda_k = 1,
//! $$
//!
//! with normalised mode functions $\psi_k$. The mode functions here are
//! Hermite–Gauss functions, which are the exact Schmidt modes of a Gaussian
//! joint spectrum and a complete basis for anything else. Modes that share
//! centre, width and chirp are orthonormal; modes that do not may overlap,
//! and the purity then carries their cross terms.

use std::f64::consts::PI;

use num_complex::Complex64;
use serde::Serialize;

use super::gaussian::{validate_centre, validate_chirp, validate_width};
use super::SpectralAmplitude;
use crate::error::{HomError, Result};
use crate::overlap::quadrature::gauss_legendre_panels;

/// Widths beyond the turning point integrated by [`mode_overlap`].
const OVERLAP_WINDOW: f64 = 10.0;

/// Upper bound on Gauss–Legendre panels for one mode overlap.
const MAX_OVERLAP_PANELS: f64 = 100_000.0;

/// A normalised Hermite–Gauss mode with optional quadratic spectral phase.
///
/// $\psi_n(\omega) = w^{-1/2}\, h_n\!\left(\frac{\omega-\omega_0}{w}\right) e^{i\beta(\omega-\omega_0)^2/2}$
/// where $h_n$ is the $n$-th Hermite function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HermiteGauss {
    pub order: usize,
    pub omega0: f64,
    pub width: f64,
    pub chirp: f64,
}

impl HermiteGauss {
    pub fn new(order: usize, omega0: f64, width: f64, chirp: f64) -> Result<Self> {
        Ok(Self {
            order,
            omega0: validate_centre("omega0", omega0)?,
            width: validate_width("width", width)?,
            chirp: validate_chirp(chirp)?,
        })
    }

    pub fn evaluate(&self, omega: f64) -> Complex64 {
        let s = omega - self.omega0;
        let envelope = hermite_function(self.order, s / self.width) / self.width.sqrt();
        Complex64::from_polar(envelope, 0.5 * self.chirp * s * s)
    }

    /// Frequency window that holds the mode to `window_factor` widths
    /// beyond its classical turning point $\sqrt{2n+1}$.
    pub fn support(&self, window_factor: f64) -> (f64, f64) {
        let half = (window_factor + ((2 * self.order + 1) as f64).sqrt()) * self.width;
        (self.omega0 - half, self.omega0 + half)
    }
}

/// $\langle a|b\rangle = \int \psi_a^*(\omega)\, \psi_b(\omega)\, d\omega$.
///
/// Modes with equal centre, width and chirp are orthonormal by order. Other
/// pairs are integrated over the intersection of their supports with a panel
/// count that resolves the narrower width, both Hermite orders and the chirp
/// phase.
pub fn mode_overlap(a: &HermiteGauss, b: &HermiteGauss) -> Complex64 {
    if a.omega0 == b.omega0 && a.width == b.width && a.chirp == b.chirp {
        return Complex64::from(if a.order == b.order { 1.0 } else { 0.0 });
    }
    let (a_lo, a_hi) = a.support(OVERLAP_WINDOW);
    let (b_lo, b_hi) = b.support(OVERLAP_WINDOW);
    let (lo, hi) = (a_lo.max(b_lo), a_hi.min(b_hi));
    if lo >= hi {
        return Complex64::new(0.0, 0.0);
    }

    let reach = |m: &HermiteGauss| (hi - m.omega0).abs().max((lo - m.omega0).abs());
    let phase = 0.5 * (a.chirp.abs() * reach(a).powi(2) + b.chirp.abs() * reach(b).powi(2));
    let panels = (2.0 * (hi - lo) / a.width.min(b.width)
        + 2.0 * (a.order + b.order) as f64
        + phase)
        .ceil()
        .clamp(8.0, MAX_OVERLAP_PANELS) as usize;

    let (nodes, weights) = gauss_legendre_panels(lo, hi, panels);
    nodes
        .iter()
        .zip(&weights)
        .map(|(&w, &q)| q * a.evaluate(w).conj() * b.evaluate(w))
        .sum()
}

/// Normalised Hermite function $h_n(x) = (2^n n! \sqrt\pi)^{-1/2} H_n(x) e^{-x^2/2}$
/// by the stable three-term recurrence.
pub fn hermite_function(order: usize, x: f64) -> f64 {
    let h0 = PI.powf(-0.25) * (-0.5 * x * x).exp();
    if order == 0 {
        return h0;
    }
    let mut prev = h0;
    let mut curr = std::f64::consts::SQRT_2 * x * h0;
    for k in 1..order {
        let kf = k as f64;
        let next = (2.0 / (kf + 1.0)).sqrt() * x * curr - (kf / (kf + 1.0)).sqrt() * prev;
        prev = curr;
        curr = next;
    }
    curr
}

/// One term of a Schmidt decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SchmidtMode {
    pub weight: f64,
    pub function: HermiteGauss,
}

/// A photon described by an explicit set of Schmidt modes.
///
/// Weights are rescaled to sum to one at construction. Each mode function is
/// normalised but the set need not be orthogonal: the purity is
/// $\sum_{jk} \lambda_j \lambda_k |\langle\psi_j|\psi_k\rangle|^2$, which
/// reduces to $\sum_k \lambda_k^2$ for distinct orders on a shared grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchmidtSuperposition {
    modes: Vec<SchmidtMode>,
}

impl SchmidtSuperposition {
    pub fn new(modes: Vec<SchmidtMode>) -> Result<Self> {
        if modes.is_empty() {
            return Err(HomError::invalid("modes", 0.0, "at least one Schmidt mode is required"));
        }
        for mode in &modes {
            if !mode.weight.is_finite() || mode.weight < 0.0 {
                return Err(HomError::invalid("weight", mode.weight, "must be finite and non-negative"));
            }
            HermiteGauss::new(
                mode.function.order,
                mode.function.omega0,
                mode.function.width,
                mode.function.chirp,
            )?;
        }
        let total: f64 = modes.iter().map(|m| m.weight).sum();
        if total <= 0.0 {
            return Err(HomError::invalid("weight", total, "Schmidt weights sum to zero"));
        }
        Ok(Self::from_normalised(modes))
    }

    /// Build from already-validated modes, rescaling the weights.
    pub(crate) fn from_normalised(mut modes: Vec<SchmidtMode>) -> Self {
        let total: f64 = modes.iter().map(|m| m.weight).sum();
        for mode in &mut modes {
            mode.weight /= total;
        }
        Self { modes }
    }

    pub fn modes(&self) -> &[SchmidtMode] {
        &self.modes
    }

    /// Partner mode paired with the `k`-th Schmidt mode: Hermite–Gauss of
    /// order `k` about the mean centre and width, so that partner modes are
    /// orthonormal.
    fn partner_mode(&self, k: usize) -> HermiteGauss {
        HermiteGauss {
            order: k,
            omega0: self.centre(),
            width: self.bandwidth(),
            chirp: 0.0,
        }
    }
}

impl SpectralAmplitude for SchmidtSuperposition {
    fn evaluate(&self, omega: f64) -> Complex64 {
        if let [single] = self.modes.as_slice() {
            return single.function.evaluate(omega);
        }
        let intensity: f64 = self
            .modes
            .iter()
            .map(|m| m.weight * m.function.evaluate(omega).norm_sqr())
            .sum();
        Complex64::from(intensity.sqrt())
    }

    fn evaluate_joint(&self, omega: f64, omega_partner: f64) -> Complex64 {
        self.modes
            .iter()
            .enumerate()
            .map(|(k, m)| {
                m.weight.sqrt()
                    * m.function.evaluate(omega)
                    * self.partner_mode(k).evaluate(omega_partner)
            })
            .sum()
    }

    fn centre(&self) -> f64 {
        self.modes.iter().map(|m| m.weight * m.function.omega0).sum()
    }

    fn bandwidth(&self) -> f64 {
        self.modes.iter().map(|m| m.weight * m.function.width).sum()
    }

    fn purity(&self) -> f64 {
        let mut total = 0.0;
        for (j, a) in self.modes.iter().enumerate() {
            total += a.weight * a.weight;
            for b in &self.modes[j + 1..] {
                let cross = mode_overlap(&a.function, &b.function).norm_sqr();
                total += 2.0 * a.weight * b.weight * cross;
            }
        }
        total
    }

    fn support(&self, window_factor: f64) -> (f64, f64) {
        self.modes
            .iter()
            .map(|m| m.function.support(window_factor))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (a, b)| {
                (lo.min(a), hi.max(b))
            })
    }

    fn schmidt_decomposition(&self, _tail: f64) -> SchmidtSuperposition {
        self.clone()
    }
}
