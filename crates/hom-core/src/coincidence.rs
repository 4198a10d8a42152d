//! The HOM coincidence formula.
//!
//! For two photons meeting at a balanced beamsplitter the coincidence
//! probability is the accidental level $\tfrac12$ minus half the two-photon
//! interference term:
//!
//! $$
//! P(\tau) = \tfrac12\left[1 - I(\tau)\right]
//! $$
//!
//! with $I = |\Lambda|^2$ for pure photons, $\sum\lambda_j\mu_k|\Lambda_{jk}|^2$
//! (equivalently $\mathrm{Tr}[\rho_A\rho_B(\tau)]$) for mixed ones, and
//! $\mathrm{Re}\,E(\tau)$ for the exchange overlap of a pair source.

use serde::Serialize;

use crate::overlap::Overlap;

/// Default slack outside [0, 1] tolerated before a warning is raised.
pub const DEFAULT_RANGE_EPSILON: f64 = 1e-9;

/// A raw probability that left [0, 1] by more than the model's epsilon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericRangeWarning {
    pub delay: f64,
    /// Value before clamping.
    pub raw: f64,
}

/// Coincidence probability at one delay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coincidence {
    pub delay: f64,
    /// Clamped to [0, 1].
    pub probability: f64,
    pub raw: f64,
    pub warning: Option<NumericRangeWarning>,
}

/// Maps overlaps to coincidence probabilities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoincidenceModel {
    pub epsilon: f64,
}

impl Default for CoincidenceModel {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_RANGE_EPSILON,
        }
    }
}

impl CoincidenceModel {
    pub fn probability(&self, overlap: &Overlap, delay: f64) -> Coincidence {
        let raw = 0.5 * (1.0 - overlap.interference());

        let warning = if raw < -self.epsilon || raw > 1.0 + self.epsilon {
            log::warn!("coincidence probability {raw:.3e} at τ = {delay} is outside [0, 1]; clamping");
            Some(NumericRangeWarning { delay, raw })
        } else {
            None
        };

        Coincidence {
            delay,
            probability: raw.clamp(0.0, 1.0),
            raw,
            warning,
        }
    }
}
