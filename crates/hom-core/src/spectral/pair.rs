//! Joint spectral amplitude of a photon pair from a single source.
//!
//! The double-Gaussian JSA of a pulsed down-conversion source is
//!
//! $$
//! f(\omega_1,\omega_2) = \sqrt{\frac{T_p T_c}{\pi}}
//!   \exp\!\left(-\frac{(\omega_1-\omega_2-\Delta)^2 T_c^2}{4}\right)
//!   \exp\!\left(-\frac{(\omega_1+\omega_2-\Sigma)^2 T_p^2}{4}\right)
//! $$
//!
//! with $T_p$ the effective pump pulse duration, $T_c$ the coherence time,
//! $\Delta = \omega_s-\omega_i$ and $\Sigma = \omega_s+\omega_i$. When both
//! photons of the pair meet at the beamsplitter, the coincidence probability
//! depends on the exchange overlap of $f$ with its photon-swapped copy.

use hom_materials::units::angular_frequency_from_wavelength;
use ndarray::array;
use num_complex::Complex64;
use serde::Serialize;

use super::gaussian::{validate_centre, validate_width};
use crate::error::Result;
use crate::overlap::gaussian_form::CentredExponent;

/// Double-Gaussian JSA of a photon pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JointSpectrum {
    omega_signal: f64,
    omega_idler: f64,
    pulse_duration: f64,
    coherence_time: f64,
}

impl JointSpectrum {
    /// Create a JSA with signal and idler centred at `omega_signal` and
    /// `omega_idler`.
    pub fn new(
        omega_signal: f64,
        omega_idler: f64,
        pulse_duration: f64,
        coherence_time: f64,
    ) -> Result<Self> {
        Ok(Self {
            omega_signal: validate_centre("omega_signal", omega_signal)?,
            omega_idler: validate_centre("omega_idler", omega_idler)?,
            pulse_duration: validate_width("pulse_duration", pulse_duration)?,
            coherence_time: validate_width("coherence_time", coherence_time)?,
        })
    }

    /// Frequency-degenerate pair centred at `omega0`.
    pub fn degenerate(omega0: f64, pulse_duration: f64, coherence_time: f64) -> Result<Self> {
        Self::new(omega0, omega0, pulse_duration, coherence_time)
    }

    /// Degenerate pair in lab units: central wavelength (nm), pulse duration
    /// and coherence time (ps). Frequencies come out in rad/ps.
    pub fn from_lab_units(
        wavelength_nm: f64,
        pulse_duration_ps: f64,
        coherence_time_ps: f64,
    ) -> Result<Self> {
        let wavelength_nm = validate_width("wavelength_nm", wavelength_nm)?;
        Self::degenerate(
            angular_frequency_from_wavelength(wavelength_nm),
            pulse_duration_ps,
            coherence_time_ps,
        )
    }

    pub fn omega_signal(&self) -> f64 {
        self.omega_signal
    }

    pub fn omega_idler(&self) -> f64 {
        self.omega_idler
    }

    pub fn pulse_duration(&self) -> f64 {
        self.pulse_duration
    }

    pub fn coherence_time(&self) -> f64 {
        self.coherence_time
    }

    /// Mean of the signal and idler centre frequencies.
    pub fn reference(&self) -> f64 {
        0.5 * (self.omega_signal + self.omega_idler)
    }

    pub fn evaluate(&self, omega_1: f64, omega_2: f64) -> Complex64 {
        let tp = self.pulse_duration;
        let tc = self.coherence_time;
        let u = omega_1 - omega_2 - (self.omega_signal - self.omega_idler);
        let v = omega_1 + omega_2 - (self.omega_signal + self.omega_idler);
        let norm = (tp * tc / std::f64::consts::PI).sqrt();
        Complex64::from(norm * (-u * u * tc * tc / 4.0 - v * v * tp * tp / 4.0).exp())
    }

    /// Symmetric frequency window (same for both photons) holding the JSA
    /// to `window_factor` amplitude widths.
    pub fn support(&self, window_factor: f64) -> (f64, f64) {
        let tp2 = self.pulse_duration * self.pulse_duration;
        let tc2 = self.coherence_time * self.coherence_time;
        // Amplitude standard deviation of ω₁ (and ω₂) along the JSA axes.
        let width = (0.5 * (1.0 / tc2 + 1.0 / tp2)).sqrt();
        let half = 0.5 * (self.omega_signal - self.omega_idler).abs() + window_factor * width;
        let centre = self.reference();
        (centre - half, centre + half)
    }

    /// Exponent of $f$ in $(\nu_1, \nu_2) = (\omega_1, \omega_2) - \omega_{\mathrm{ref}}$.
    pub(crate) fn exponent(&self, reference: f64) -> CentredExponent {
        let tp2 = self.pulse_duration * self.pulse_duration;
        let tc2 = self.coherence_time * self.coherence_time;
        let diag = Complex64::from((tc2 + tp2) / 4.0);
        let off = Complex64::from((tp2 - tc2) / 4.0);
        CentredExponent {
            quadratic: array![[diag, off], [off, diag]],
            centre: vec![self.omega_signal - reference, self.omega_idler - reference],
            ln_norm: Complex64::from(0.5 * (self.pulse_duration * self.coherence_time / std::f64::consts::PI).ln()),
        }
    }

    /// Bit pattern of the parameters, for grid caching.
    pub(crate) fn cache_key(&self) -> [u64; 4] {
        [
            self.omega_signal.to_bits(),
            self.omega_idler.to_bits(),
            self.pulse_duration.to_bits(),
            self.coherence_time.to_bits(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_jsa_is_normalised() {
        let jsa = JointSpectrum::degenerate(10.0, 2.0, 0.5).unwrap();
        let (lo, hi) = jsa.support(8.0);
        let n = 600;
        let h = (hi - lo) / n as f64;
        let mut mass = 0.0;
        for i in 0..=n {
            for j in 0..=n {
                mass += jsa.evaluate(lo + i as f64 * h, lo + j as f64 * h).norm_sqr();
            }
        }
        assert_relative_eq!(mass * h * h, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_exponent_matches_direct_evaluation() {
        let jsa = JointSpectrum::new(10.2, 9.8, 3.0, 1.0).unwrap();
        let reference = jsa.reference();
        let exponent = jsa.exponent(reference);
        for &(w1, w2) in &[(10.0, 10.0), (10.3, 9.7), (9.9, 10.25)] {
            let via_form = exponent.evaluate(&[w1 - reference, w2 - reference]);
            let direct = jsa.evaluate(w1, w2);
            assert_relative_eq!(via_form.re, direct.re, epsilon = 1e-12);
            assert_relative_eq!(via_form.im, direct.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_invalid_times_are_rejected() {
        assert!(JointSpectrum::degenerate(10.0, 0.0, 1.0).is_err());
        assert!(JointSpectrum::degenerate(10.0, 1.0, -1.0).is_err());
        assert!(JointSpectrum::new(10.0, 0.0, 1.0, 1.0).is_err());
    }
}
