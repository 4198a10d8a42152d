//! Dispersive medium trait.
//!
//! All material models implement [`DispersiveMedium`], which returns a
//! wavelength-dependent refractive index. Wave number and dispersion
//! coefficients are derived from it.

use thiserror::Error;

use crate::units::{wavelength_from_angular_frequency, SPEED_OF_LIGHT};

/// Errors from material models.
#[derive(Debug, Error)]
pub enum MaterialError {
    #[error("Wavelength {wavelength_nm} nm is outside the model range [{min}, {max}] nm")]
    OutOfRange {
        wavelength_nm: f64,
        min: f64,
        max: f64,
    },

    #[error("Refractive index is not real at {wavelength_nm} nm (n² = {n_squared:.4})")]
    NonPhysical { wavelength_nm: f64, n_squared: f64 },

    #[error("Invalid material parameter: {0}")]
    InvalidParameter(String),
}

/// Provides the refractive index of a transparent, dispersive medium.
pub trait DispersiveMedium: Send + Sync {
    /// Human-readable name of this medium.
    fn name(&self) -> &str;

    /// Wavelength range over which the model is valid (nm).
    fn wavelength_range(&self) -> (f64, f64);

    /// Real refractive index $n(\lambda)$ at a vacuum wavelength (nm).
    fn refractive_index(&self, wavelength_nm: f64) -> Result<f64, MaterialError>;

    /// Wave number $k(\omega) = n(\omega)\,\omega / c$ in rad/m, for an
    /// angular frequency in rad/ps.
    fn wave_number(&self, omega_rad_per_ps: f64) -> Result<f64, MaterialError> {
        let n = self.refractive_index(wavelength_from_angular_frequency(omega_rad_per_ps))?;
        Ok(n * omega_rad_per_ps * 1e12 / SPEED_OF_LIGHT)
    }

    /// Group-velocity dispersion $\beta_2 = d^2k/d\omega^2$ in ps²/m.
    ///
    /// Evaluated by a central second difference with a relative step of 1e-3.
    fn group_velocity_dispersion(&self, omega_rad_per_ps: f64) -> Result<f64, MaterialError> {
        let h = omega_rad_per_ps * 1e-3;
        let k_minus = self.wave_number(omega_rad_per_ps - h)?;
        let k_centre = self.wave_number(omega_rad_per_ps)?;
        let k_plus = self.wave_number(omega_rad_per_ps + h)?;
        Ok((k_plus - 2.0 * k_centre + k_minus) / (h * h))
    }

    /// Group-delay dispersion (ps²) accumulated over `length_m` metres.
    fn group_delay_dispersion(
        &self,
        omega_rad_per_ps: f64,
        length_m: f64,
    ) -> Result<f64, MaterialError> {
        Ok(self.group_velocity_dispersion(omega_rad_per_ps)? * length_m)
    }
}
