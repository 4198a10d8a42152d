//! Closed-form overlaps for the Gaussian family.
//!
//! Every overlap needed by the coincidence formula is a Gaussian integral
//! once the amplitudes are written as [`CentredExponent`]s, so it reduces
//! exactly through [`GaussianForm::integrate`]. Frequencies are measured
//! from the mean of the two centres.
//!
//! | Inputs | Variables | Result |
//! |--------|-----------|--------|
//! | two pure photons | $\omega$ | $\Lambda(\tau)$ |
//! | any correlated photon | $\omega, \omega', p, q$ | $\mathrm{Tr}[\rho_A \rho_B(\tau)]$ |
//! | one pair source | $\omega_1, \omega_2$ | exchange overlap $E(\tau)$ |

use num_complex::Complex64;

use super::gaussian_form::{CentredExponent, GaussianForm};
use super::{Overlap, OverlapIntegrator};
use crate::error::{HomError, Result};
use crate::spectral::gaussian::GaussianShape;
use crate::spectral::{JointSpectrum, SpectralProfile};

/// Exact Gaussian-integral reduction.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticIntegrator;

impl AnalyticIntegrator {
    /// Whether both profiles have a closed-form amplitude.
    pub fn supports(a: &SpectralProfile, b: &SpectralProfile) -> bool {
        a.gaussian_shape().is_some() && b.gaussian_shape().is_some()
    }

    pub(crate) fn overlap_shapes(a: &GaussianShape, b: &GaussianShape, delay: f64) -> Result<Overlap> {
        if a.correlation == 0.0 && b.correlation == 0.0 {
            Ok(Overlap::Amplitude(pure_amplitude(a, b, delay)?))
        } else {
            Ok(Overlap::Trace(density_trace(a, b, delay)?))
        }
    }
}

/// $\Lambda(\tau) = \int \phi_A^*(\omega)\phi_B(\omega)e^{i\omega\tau}d\omega$.
fn pure_amplitude(a: &GaussianShape, b: &GaussianShape, delay: f64) -> Result<Complex64> {
    let reference = 0.5 * (a.omega0 + b.omega0);
    let mut form = GaussianForm::new(1);
    form.absorb(&a.amplitude_exponent(reference), &[0], true);
    form.absorb(&b.amplitude_exponent(reference), &[0], false);
    form.add_linear(0, Complex64::new(0.0, delay));
    form.add_constant(Complex64::new(0.0, reference * delay));
    form.integrate()
}

/// $\mathrm{Tr}[\rho_A\rho_B(\tau)] = \iint \rho_A(\omega',\omega)\rho_B(\omega,\omega')
/// e^{i(\omega-\omega')\tau}d\omega\,d\omega'$ with
/// $\rho(x,y) = \int f(x,p)f^*(y,p)\,dp$.
///
/// Variables: 0 = ω, 1 = ω′, 2 = partner of A, 3 = partner of B.
fn density_trace(a: &GaussianShape, b: &GaussianShape, delay: f64) -> Result<f64> {
    let reference = 0.5 * (a.omega0 + b.omega0);
    let fa = a.joint_exponent(reference);
    let fb = b.joint_exponent(reference);

    let mut form = GaussianForm::new(4);
    form.absorb(&fa, &[1, 2], false);
    form.absorb(&fa, &[0, 2], true);
    form.absorb(&fb, &[0, 3], false);
    form.absorb(&fb, &[1, 3], true);
    form.add_linear(0, Complex64::new(0.0, delay));
    form.add_linear(1, Complex64::new(0.0, -delay));
    Ok(form.integrate()?.re)
}

/// $E(\tau) = \iint f(\omega_1,\omega_2)f^*(\omega_2,\omega_1)e^{i(\omega_1-\omega_2)\tau}$.
fn exchange_amplitude(exponent: &CentredExponent, delay: f64) -> Result<Complex64> {
    let mut form = GaussianForm::new(2);
    form.absorb(exponent, &[0, 1], false);
    form.absorb(exponent, &[1, 0], true);
    form.add_linear(0, Complex64::new(0.0, delay));
    form.add_linear(1, Complex64::new(0.0, -delay));
    form.integrate()
}

impl OverlapIntegrator for AnalyticIntegrator {
    fn overlap(&self, a: &SpectralProfile, b: &SpectralProfile, delay: f64) -> Result<Overlap> {
        match (a.gaussian_shape(), b.gaussian_shape()) {
            (Some(sa), Some(sb)) => Self::overlap_shapes(&sa, &sb, delay),
            _ => Err(HomError::invalid(
                "integration_method",
                delay,
                "Schmidt-mode profiles have no closed-form overlap",
            )),
        }
    }

    fn exchange(&self, pair: &JointSpectrum, delay: f64) -> Result<Overlap> {
        let exponent = pair.exponent(pair.reference());
        Ok(Overlap::Exchange(exchange_amplitude(&exponent, delay)?))
    }

    fn method_name(&self) -> &str {
        "analytic (Gaussian reduction)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn profile(omega0: f64, sigma: f64) -> SpectralProfile {
        SpectralProfile::gaussian(omega0, sigma).unwrap()
    }

    #[test]
    fn test_identical_photons_overlap_fully() {
        let a = profile(1.0, 0.1);
        let overlap = AnalyticIntegrator.overlap(&a, &a, 0.0).unwrap();
        assert_relative_eq!(overlap.interference(), 1.0, epsilon = 1e-14);
    }

    #[test]
    fn test_amplitude_carries_carrier_phase() {
        let a = profile(3.0, 0.2);
        let tau = 0.7;
        match AnalyticIntegrator.overlap(&a, &a, tau).unwrap() {
            Overlap::Amplitude(lambda) => {
                let expected = Complex64::from_polar((-0.01 * tau * tau).exp(), 3.0 * tau);
                assert_relative_eq!(lambda.re, expected.re, epsilon = 1e-13);
                assert_relative_eq!(lambda.im, expected.im, epsilon = 1e-13);
            }
            other => panic!("expected amplitude, got {other:?}"),
        }
    }

    #[test]
    fn test_detuned_gaussians() {
        let (sa, sb, detuning) = (0.1, 0.15, 0.08);
        let a = profile(1.0, sa);
        let b = profile(1.0 + detuning, sb);
        let s2 = sa * sa + sb * sb;
        for &tau in &[0.0, 3.0, 10.0] {
            let overlap = AnalyticIntegrator.overlap(&a, &b, tau).unwrap();
            let expected = 2.0 * sa * sb / s2
                * (-sa * sa * sb * sb * tau * tau / s2).exp()
                * (-detuning * detuning / s2).exp();
            assert_relative_eq!(overlap.interference(), expected, epsilon = 1e-13);
        }
    }

    #[test]
    fn test_trace_reduces_to_amplitude_for_pure_photons() {
        let a = SpectralProfile::chirped_gaussian(1.0, 0.1, 20.0).unwrap();
        let b = SpectralProfile::chirped_gaussian(1.02, 0.12, -5.0).unwrap();
        let (sa, sb) = (a.gaussian_shape().unwrap(), b.gaussian_shape().unwrap());
        for &tau in &[-4.0, 0.0, 6.0] {
            let lambda = pure_amplitude(&sa, &sb, tau).unwrap();
            let trace = density_trace(&sa, &sb, tau).unwrap();
            assert_relative_eq!(trace, lambda.norm_sqr(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_identical_correlated_photons_give_purity() {
        let r = 0.9;
        let a = profile(1.0, 0.1).with_correlation(r).unwrap();
        let overlap = AnalyticIntegrator.overlap(&a, &a, 0.0).unwrap();
        assert!(matches!(overlap, Overlap::Trace(_)));
        assert_relative_eq!(overlap.interference(), (1.0 - r * r).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_pair_exchange() {
        let tc = 0.8;
        let pair = JointSpectrum::degenerate(5.0, 4.0, tc).unwrap();
        for &tau in &[0.0, 0.5, 2.0] {
            let overlap = AnalyticIntegrator.exchange(&pair, tau).unwrap();
            assert_relative_eq!(
                overlap.interference(),
                (-tau * tau / (2.0 * tc * tc)).exp(),
                epsilon = 1e-13
            );
        }
    }

    #[test]
    fn test_non_degenerate_pair_exchange() {
        let tc = 1.0;
        let detuning = 0.6;
        let pair = JointSpectrum::new(5.0 + 0.5 * detuning, 5.0 - 0.5 * detuning, 2.0, tc).unwrap();
        let tau = 0.9;
        let overlap = AnalyticIntegrator.exchange(&pair, tau).unwrap();
        let expected = (-detuning * detuning * tc * tc / 2.0).exp() * (-tau * tau / (2.0 * tc * tc)).exp();
        assert_relative_eq!(overlap.interference(), expected, epsilon = 1e-13);
    }

    #[test]
    fn test_schmidt_profiles_are_not_supported() {
        let mode = crate::spectral::HermiteGauss::new(0, 1.0, 0.1, 0.0).unwrap();
        let s = SpectralProfile::schmidt(vec![crate::spectral::SchmidtMode { weight: 1.0, function: mode }]).unwrap();
        let g = profile(1.0, 0.1);
        assert!(!AnalyticIntegrator::supports(&s, &g));
        assert!(AnalyticIntegrator.overlap(&s, &g, 0.0).is_err());
    }
}
