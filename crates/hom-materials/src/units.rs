//! Lab-unit conversions between wavelength and angular frequency.
//!
//! Angular frequencies are expressed in rad/ps and times in ps throughout
//! the lab-unit helpers.

use std::f64::consts::PI;

/// Speed of light in vacuum (m/s).
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Angular frequency (rad/ps) of light with the given vacuum wavelength (nm).
///
/// $\omega = 2\pi c / \lambda$
pub fn angular_frequency_from_wavelength(wavelength_nm: f64) -> f64 {
    // 2πc [m/s] / (λ [nm] · 1e-9) = rad/s, then 1e-12 for rad/ps.
    2.0 * PI * SPEED_OF_LIGHT * 1e-3 / wavelength_nm
}

/// Vacuum wavelength (nm) of light with the given angular frequency (rad/ps).
pub fn wavelength_from_angular_frequency(omega_rad_per_ps: f64) -> f64 {
    2.0 * PI * SPEED_OF_LIGHT * 1e-3 / omega_rad_per_ps
}

/// Spectral amplitude width $\sigma$ (rad/ps) of a transform-limited Gaussian
/// pulse with the given intensity FWHM in time (ps).
///
/// $\sigma = 2\sqrt{\ln 2} / \mathrm{FWHM}$, matching the amplitude convention
/// $\phi(\omega) \propto \exp(-(\omega-\omega_0)^2 / 2\sigma^2)$.
pub fn bandwidth_from_fwhm(fwhm_ps: f64) -> f64 {
    2.0 * std::f64::consts::LN_2.sqrt() / fwhm_ps
}
