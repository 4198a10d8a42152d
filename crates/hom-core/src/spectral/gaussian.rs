//! Gaussian and chirped-Gaussian spectral amplitudes.
//!
//! The single-photon amplitude is
//!
//! $$
//! \phi(\omega) = (\pi\sigma^2)^{-1/4}
//!   \exp\!\left(-\frac{(\omega-\omega_0)^2}{2\sigma^2}\right)
//!   \exp\!\left(\frac{i\beta}{2}(\omega-\omega_0)^2\right)
//! $$
//!
//! where $\beta$ is the group-delay dispersion (chirp). A photon entangled
//! with a partner is the signal half of the bivariate Gaussian
//!
//! $$
//! f(\omega,\omega_p) = \left(\pi\sigma^2\sqrt{1-r^2}\right)^{-1/2}
//!   \exp\!\left(-\frac{s^2 - 2rsp + p^2}{2\sigma^2(1-r^2)}\right)
//!   e^{i\beta s^2/2},
//! \qquad s = \omega-\omega_0,\; p = \omega_p-\omega_0,
//! $$
//!
//! whose marginal spectrum is independent of $r$ and whose heralded purity
//! is $\sqrt{1-r^2}$.

use std::f64::consts::PI;

use hom_materials::units::{angular_frequency_from_wavelength, bandwidth_from_fwhm};
use hom_materials::DispersiveMedium;
use ndarray::array;
use num_complex::Complex64;
use serde::Serialize;

use super::schmidt::{HermiteGauss, SchmidtMode, SchmidtSuperposition};
use super::SpectralAmplitude;
use crate::error::{HomError, Result};
use crate::overlap::gaussian_form::CentredExponent;

pub(crate) fn validate_centre(name: &'static str, omega0: f64) -> Result<f64> {
    if !omega0.is_finite() || omega0 <= 0.0 {
        return Err(HomError::invalid(name, omega0, "must be finite and positive"));
    }
    Ok(omega0)
}

pub(crate) fn validate_width(name: &'static str, width: f64) -> Result<f64> {
    if !width.is_finite() || width <= 0.0 {
        return Err(HomError::invalid(name, width, "must be finite and positive"));
    }
    Ok(width)
}

pub(crate) fn validate_chirp(chirp: f64) -> Result<f64> {
    if !chirp.is_finite() {
        return Err(HomError::invalid("chirp", chirp, "must be finite"));
    }
    Ok(chirp)
}

fn validate_correlation(correlation: f64) -> Result<f64> {
    // |r| = 1 makes the joint covariance singular.
    if !correlation.is_finite() || correlation.abs() >= 1.0 {
        return Err(HomError::invalid(
            "correlation",
            correlation,
            "must satisfy |r| < 1",
        ));
    }
    Ok(correlation)
}

/// The parameters shared by both Gaussian variants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GaussianShape {
    pub omega0: f64,
    pub sigma: f64,
    pub chirp: f64,
    pub correlation: f64,
}

impl GaussianShape {
    fn spectral_phase(&self, s: f64) -> Complex64 {
        Complex64::from_polar(1.0, 0.5 * self.chirp * s * s)
    }

    fn evaluate(&self, omega: f64) -> Complex64 {
        let s = omega - self.omega0;
        let envelope = (PI * self.sigma * self.sigma).powf(-0.25)
            * (-s * s / (2.0 * self.sigma * self.sigma)).exp();
        envelope * self.spectral_phase(s)
    }

    fn evaluate_joint(&self, omega: f64, omega_partner: f64) -> Complex64 {
        let s = omega - self.omega0;
        let p = omega_partner - self.omega0;
        let r = self.correlation;
        let one_minus_r2 = 1.0 - r * r;
        let sigma2 = self.sigma * self.sigma;
        let norm = (PI * sigma2 * one_minus_r2.sqrt()).powf(-0.5);
        let envelope = (-(s * s - 2.0 * r * s * p + p * p) / (2.0 * sigma2 * one_minus_r2)).exp();
        norm * envelope * self.spectral_phase(s)
    }

    fn purity(&self) -> f64 {
        (1.0 - self.correlation * self.correlation).sqrt()
    }

    fn support(&self, window_factor: f64) -> (f64, f64) {
        let half = window_factor * self.sigma;
        (self.omega0 - half, self.omega0 + half)
    }

    /// Exponent of the pure single-photon amplitude in $\nu = \omega - \omega_{\mathrm{ref}}$.
    pub fn amplitude_exponent(&self, reference: f64) -> CentredExponent {
        let q = Complex64::new(1.0 / (2.0 * self.sigma * self.sigma), -0.5 * self.chirp);
        CentredExponent {
            quadratic: array![[q]],
            centre: vec![self.omega0 - reference],
            ln_norm: Complex64::from(-0.25 * (PI * self.sigma * self.sigma).ln()),
        }
    }

    /// Exponent of the joint amplitude in $(\nu, \nu_p)$ about the reference.
    pub fn joint_exponent(&self, reference: f64) -> CentredExponent {
        let r = self.correlation;
        let one_minus_r2 = 1.0 - r * r;
        let sigma2 = self.sigma * self.sigma;
        let kappa = 1.0 / (2.0 * sigma2 * one_minus_r2);
        let a_ss = Complex64::new(kappa, -0.5 * self.chirp);
        let a_sp = Complex64::from(-kappa * r);
        let a_pp = Complex64::from(kappa);
        let d = self.omega0 - reference;
        CentredExponent {
            quadratic: array![[a_ss, a_sp], [a_sp, a_pp]],
            centre: vec![d, d],
            ln_norm: Complex64::from(-0.5 * (PI * sigma2 * one_minus_r2.sqrt()).ln()),
        }
    }

    /// Hermite–Gauss Schmidt series of the heralded state.
    ///
    /// The reduced density matrix $\rho(s,s') \propto e^{-A(s^2+s'^2)+Bss'}$
    /// has eigenvalues $\lambda_n = (1-t)t^n$ (Mehler's formula) with
    /// $t = (1-P)/(1+P)$, $P$ the purity, and eigenfunctions Hermite–Gauss
    /// of width $w^2 = (1+t^2) / (2A(1-t^2))$.
    fn schmidt_decomposition(&self, tail: f64) -> SchmidtSuperposition {
        let r = self.correlation;
        let purity = self.purity();
        let t = (1.0 - purity) / (1.0 + purity);
        let kappa = 1.0 / (2.0 * self.sigma * self.sigma * (1.0 - r * r));
        let a = kappa * (1.0 - 0.5 * r * r);
        let width = ((1.0 + t * t) / (2.0 * a * (1.0 - t * t))).sqrt();

        let n_modes = if t <= 0.0 {
            1
        } else {
            let tail = tail.clamp(f64::MIN_POSITIVE, 0.5);
            (tail.ln() / t.ln()).ceil().max(1.0) as usize
        };

        let modes = (0..n_modes)
            .map(|n| SchmidtMode {
                weight: (1.0 - t) * t.powi(n as i32),
                function: HermiteGauss {
                    order: n,
                    omega0: self.omega0,
                    width,
                    chirp: self.chirp,
                },
            })
            .collect();
        SchmidtSuperposition::from_normalised(modes)
    }
}

/// A Gaussian spectral amplitude, optionally entangled with a partner photon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Gaussian {
    omega0: f64,
    sigma: f64,
    correlation: f64,
}

impl Gaussian {
    /// Create a transform-limited, unentangled Gaussian.
    ///
    /// # Arguments
    /// * `omega0` - Central angular frequency (finite, > 0).
    /// * `sigma` - Amplitude width $\sigma$ (finite, > 0).
    pub fn new(omega0: f64, sigma: f64) -> Result<Self> {
        Ok(Self {
            omega0: validate_centre("omega0", omega0)?,
            sigma: validate_width("bandwidth", sigma)?,
            correlation: 0.0,
        })
    }

    /// Create a Gaussian from lab units: central wavelength (nm) and the
    /// intensity FWHM of the transform-limited pulse (ps).
    ///
    /// The resulting frequencies are in rad/ps, so delays are in ps.
    pub fn from_pulse(wavelength_nm: f64, fwhm_ps: f64) -> Result<Self> {
        let wavelength_nm = validate_width("wavelength_nm", wavelength_nm)?;
        let fwhm_ps = validate_width("fwhm_ps", fwhm_ps)?;
        Self::new(
            angular_frequency_from_wavelength(wavelength_nm),
            bandwidth_from_fwhm(fwhm_ps),
        )
    }

    /// Entangle with a partner photon through the correlation coefficient `r`.
    pub fn with_correlation(mut self, correlation: f64) -> Result<Self> {
        self.correlation = validate_correlation(correlation)?;
        Ok(self)
    }

    /// Chirp acquired by propagating `length_m` metres through a dispersive
    /// medium. Frequencies must be in rad/ps.
    pub fn propagate(
        self,
        medium: &dyn DispersiveMedium,
        length_m: f64,
    ) -> Result<ChirpedGaussian> {
        ChirpedGaussian::from_gaussian(self, 0.0)?.propagate(medium, length_m)
    }

    pub fn omega0(&self) -> f64 {
        self.omega0
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn correlation(&self) -> f64 {
        self.correlation
    }

    pub(crate) fn shape(&self) -> GaussianShape {
        GaussianShape {
            omega0: self.omega0,
            sigma: self.sigma,
            chirp: 0.0,
            correlation: self.correlation,
        }
    }
}

/// A Gaussian spectral amplitude with quadratic spectral phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChirpedGaussian {
    #[serde(flatten)]
    base: Gaussian,
    chirp: f64,
}

impl ChirpedGaussian {
    /// Create a chirped Gaussian with group-delay dispersion `chirp`
    /// (units of time², may be zero or negative).
    pub fn new(omega0: f64, sigma: f64, chirp: f64) -> Result<Self> {
        Self::from_gaussian(Gaussian::new(omega0, sigma)?, chirp)
    }

    /// Add a chirp to an existing Gaussian, keeping its correlation.
    pub fn from_gaussian(base: Gaussian, chirp: f64) -> Result<Self> {
        Ok(Self {
            base,
            chirp: validate_chirp(chirp)?,
        })
    }

    pub fn with_correlation(self, correlation: f64) -> Result<Self> {
        Ok(Self {
            base: self.base.with_correlation(correlation)?,
            chirp: self.chirp,
        })
    }

    /// Add the group-delay dispersion of `length_m` metres of `medium`,
    /// evaluated at the central frequency (rad/ps).
    pub fn propagate(self, medium: &dyn DispersiveMedium, length_m: f64) -> Result<Self> {
        if !length_m.is_finite() || length_m < 0.0 {
            return Err(HomError::invalid("length_m", length_m, "must be finite and non-negative"));
        }
        let gdd = medium.group_delay_dispersion(self.base.omega0, length_m)?;
        log::debug!(
            "{} over {:.3e} m adds GDD {:.4e} ps² at ω₀ = {:.2} rad/ps",
            medium.name(),
            length_m,
            gdd,
            self.base.omega0
        );
        Self::from_gaussian(self.base, self.chirp + gdd)
    }

    pub fn base(&self) -> &Gaussian {
        &self.base
    }

    pub fn chirp(&self) -> f64 {
        self.chirp
    }

    pub(crate) fn shape(&self) -> GaussianShape {
        GaussianShape {
            chirp: self.chirp,
            ..self.base.shape()
        }
    }
}

macro_rules! impl_gaussian_amplitude {
    ($ty:ty) => {
        impl SpectralAmplitude for $ty {
            fn evaluate(&self, omega: f64) -> Complex64 {
                self.shape().evaluate(omega)
            }

            fn evaluate_joint(&self, omega: f64, omega_partner: f64) -> Complex64 {
                self.shape().evaluate_joint(omega, omega_partner)
            }

            fn centre(&self) -> f64 {
                self.shape().omega0
            }

            fn bandwidth(&self) -> f64 {
                self.shape().sigma
            }

            fn purity(&self) -> f64 {
                self.shape().purity()
            }

            fn support(&self, window_factor: f64) -> (f64, f64) {
                self.shape().support(window_factor)
            }

            fn schmidt_decomposition(&self, tail: f64) -> SchmidtSuperposition {
                self.shape().schmidt_decomposition(tail)
            }
        }
    };
}

impl_gaussian_amplitude!(Gaussian);
impl_gaussian_amplitude!(ChirpedGaussian);
