//! Spectral amplitude models.
//!
//! Every photon description implements [`SpectralAmplitude`], which evaluates
//! the single-photon (marginal) amplitude $\phi(\omega)$ and the joint
//! amplitude $f(\omega, \omega_p)$ with the photon's partner. The
//! [`SpectralProfile`] enum is the closed set of shapes the overlap
//! integrators understand; dispatch is a `match`, never a trait object.
//!
//! All amplitudes are normalised so that $\int |\phi(\omega)|^2 d\omega = 1$
//! and $\iint |f(\omega,\omega_p)|^2 d\omega\, d\omega_p = 1$.
//!
//! | Variant | Closed form | Modes |
//! |---------|-------------|-------|
//! | [`Gaussian`] | yes | 1, or a geometric Hermite–Gauss series if correlated |
//! | [`ChirpedGaussian`] | yes | as above, with quadratic spectral phase |
//! | [`SchmidtSuperposition`] | no | explicit weighted Hermite–Gauss modes |

pub mod gaussian;
pub mod pair;
pub mod schmidt;

use num_complex::Complex64;
use serde::Serialize;

pub use gaussian::{ChirpedGaussian, Gaussian};
pub use pair::JointSpectrum;
pub use schmidt::{HermiteGauss, SchmidtMode, SchmidtSuperposition};

use crate::error::Result;
use gaussian::GaussianShape;

/// Default cut-off on the discarded Schmidt weight when a correlated
/// Gaussian is expanded into modes.
pub const DEFAULT_SCHMIDT_TAIL: f64 = 1e-12;

/// The evaluation contract shared by all spectral shapes.
pub trait SpectralAmplitude {
    /// Single-photon amplitude $\phi(\omega)$.
    ///
    /// For a photon entangled with a partner this is the marginal amplitude
    /// $\sqrt{\rho(\omega,\omega)}$ carrying the photon's own spectral phase.
    fn evaluate(&self, omega: f64) -> Complex64;

    /// Joint amplitude $f(\omega, \omega_p)$ of the photon and its partner.
    fn evaluate_joint(&self, omega: f64, omega_partner: f64) -> Complex64;

    /// Central angular frequency.
    fn centre(&self) -> f64;

    /// Characteristic amplitude width $\sigma$.
    fn bandwidth(&self) -> f64;

    /// Purity $\mathrm{Tr}\,\rho^2$ of the heralded single-photon state.
    fn purity(&self) -> f64;

    /// Frequency window that holds the amplitude to the given number of widths.
    fn support(&self, window_factor: f64) -> (f64, f64);

    /// Expansion of the single-photon density matrix into weighted
    /// orthonormal modes, discarding at most `tail` of the total weight.
    fn schmidt_decomposition(&self, tail: f64) -> SchmidtSuperposition;

    /// Coherence time $1/\sigma$.
    fn coherence_time(&self) -> f64 {
        1.0 / self.bandwidth()
    }
}

/// A validated single-photon spectral profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpectralProfile {
    Gaussian(Gaussian),
    ChirpedGaussian(ChirpedGaussian),
    Schmidt(SchmidtSuperposition),
}

impl SpectralProfile {
    /// A transform-limited, unentangled Gaussian.
    pub fn gaussian(omega0: f64, sigma: f64) -> Result<Self> {
        Ok(Self::Gaussian(Gaussian::new(omega0, sigma)?))
    }

    /// A Gaussian with group-delay dispersion `chirp`.
    pub fn chirped_gaussian(omega0: f64, sigma: f64, chirp: f64) -> Result<Self> {
        Ok(Self::ChirpedGaussian(ChirpedGaussian::new(omega0, sigma, chirp)?))
    }

    /// An explicit set of Schmidt modes.
    pub fn schmidt(modes: Vec<SchmidtMode>) -> Result<Self> {
        Ok(Self::Schmidt(SchmidtSuperposition::new(modes)?))
    }

    /// Entangle a Gaussian-family profile with a partner photon.
    ///
    /// Schmidt profiles already carry their correlations and are returned
    /// unchanged only for `r == 0`.
    pub fn with_correlation(self, correlation: f64) -> Result<Self> {
        match self {
            Self::Gaussian(g) => Ok(Self::Gaussian(g.with_correlation(correlation)?)),
            Self::ChirpedGaussian(g) => Ok(Self::ChirpedGaussian(g.with_correlation(correlation)?)),
            Self::Schmidt(s) if correlation == 0.0 => Ok(Self::Schmidt(s)),
            Self::Schmidt(_) => Err(crate::error::HomError::invalid(
                "correlation",
                correlation,
                "Schmidt profiles define their correlations through their modes",
            )),
        }
    }

    /// Whether this profile is an explicit multi-mode superposition.
    pub fn is_multimode(&self) -> bool {
        matches!(self, Self::Schmidt(s) if s.modes().len() > 1)
    }

    /// Gaussian parameters, if this profile has a closed-form amplitude.
    pub(crate) fn gaussian_shape(&self) -> Option<GaussianShape> {
        match self {
            Self::Gaussian(g) => Some(g.shape()),
            Self::ChirpedGaussian(g) => Some(g.shape()),
            Self::Schmidt(_) => None,
        }
    }
}

impl SpectralAmplitude for SpectralProfile {
    fn evaluate(&self, omega: f64) -> Complex64 {
        match self {
            Self::Gaussian(g) => g.evaluate(omega),
            Self::ChirpedGaussian(g) => g.evaluate(omega),
            Self::Schmidt(s) => s.evaluate(omega),
        }
    }

    fn evaluate_joint(&self, omega: f64, omega_partner: f64) -> Complex64 {
        match self {
            Self::Gaussian(g) => g.evaluate_joint(omega, omega_partner),
            Self::ChirpedGaussian(g) => g.evaluate_joint(omega, omega_partner),
            Self::Schmidt(s) => s.evaluate_joint(omega, omega_partner),
        }
    }

    fn centre(&self) -> f64 {
        match self {
            Self::Gaussian(g) => g.centre(),
            Self::ChirpedGaussian(g) => g.centre(),
            Self::Schmidt(s) => s.centre(),
        }
    }

    fn bandwidth(&self) -> f64 {
        match self {
            Self::Gaussian(g) => g.bandwidth(),
            Self::ChirpedGaussian(g) => g.bandwidth(),
            Self::Schmidt(s) => s.bandwidth(),
        }
    }

    fn purity(&self) -> f64 {
        match self {
            Self::Gaussian(g) => g.purity(),
            Self::ChirpedGaussian(g) => g.purity(),
            Self::Schmidt(s) => s.purity(),
        }
    }

    fn support(&self, window_factor: f64) -> (f64, f64) {
        match self {
            Self::Gaussian(g) => g.support(window_factor),
            Self::ChirpedGaussian(g) => g.support(window_factor),
            Self::Schmidt(s) => s.support(window_factor),
        }
    }

    fn schmidt_decomposition(&self, tail: f64) -> SchmidtSuperposition {
        match self {
            Self::Gaussian(g) => g.schmidt_decomposition(tail),
            Self::ChirpedGaussian(g) => g.schmidt_decomposition(tail),
            Self::Schmidt(s) => s.schmidt_decomposition(tail),
        }
    }
}

impl From<Gaussian> for SpectralProfile {
    fn from(g: Gaussian) -> Self {
        Self::Gaussian(g)
    }
}

impl From<ChirpedGaussian> for SpectralProfile {
    fn from(g: ChirpedGaussian) -> Self {
        Self::ChirpedGaussian(g)
    }
}

impl From<SchmidtSuperposition> for SpectralProfile {
    fn from(s: SchmidtSuperposition) -> Self {
        Self::Schmidt(s)
    }
}
