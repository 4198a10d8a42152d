//! Four-term Sellmeier refractive-index model.
//!
//! $$
//! n^2(\lambda) = A_1 + \frac{A_2}{\lambda^2 - A_3} - A_4 \lambda^2
//! $$
//!
//! with $\lambda$ in micrometres. This form is the one commonly tabulated
//! for nonlinear crystals such as β-barium borate.
//!
//! ## Presets
//!
//! | Identifier | Constructor | Range |
//! |-----------|-------------|-------|
//! | `BBO_o` | [`SellmeierMedium::bbo_ordinary()`] | 220–3000 nm |
//! | `BBO_e` | [`SellmeierMedium::bbo_extraordinary()`] | 220–3000 nm |

use serde::{Deserialize, Serialize};

use crate::medium::{DispersiveMedium, MaterialError};

/// Sellmeier coefficients $(A_1, A_2, A_3, A_4)$, λ in µm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SellmeierCoefficients {
    pub a1: f64,
    pub a2: f64,
    pub a3: f64,
    pub a4: f64,
}

/// A transparent medium described by a Sellmeier equation.
#[derive(Debug, Clone)]
pub struct SellmeierMedium {
    name: String,
    coefficients: SellmeierCoefficients,
    range_nm: (f64, f64),
}

impl SellmeierMedium {
    /// Construct a medium from its coefficients and valid wavelength range (nm).
    pub fn new(
        name: impl Into<String>,
        coefficients: SellmeierCoefficients,
        range_nm: (f64, f64),
    ) -> Result<Self, MaterialError> {
        let SellmeierCoefficients { a1, a2, a3, a4 } = coefficients;
        if ![a1, a2, a3, a4].iter().all(|c| c.is_finite()) {
            return Err(MaterialError::InvalidParameter(
                "Sellmeier coefficients must be finite".into(),
            ));
        }
        if !(range_nm.0 > 0.0 && range_nm.1 > range_nm.0) {
            return Err(MaterialError::InvalidParameter(format!(
                "wavelength range [{}, {}] nm must be positive and increasing",
                range_nm.0, range_nm.1
            )));
        }
        Ok(Self {
            name: name.into(),
            coefficients,
            range_nm,
        })
    }

    /// β-barium borate, ordinary ray.
    pub fn bbo_ordinary() -> Self {
        Self {
            name: "BBO_o".into(),
            coefficients: SellmeierCoefficients {
                a1: 2.7359,
                a2: 0.01878,
                a3: 0.01822,
                a4: 0.01354,
            },
            range_nm: (220.0, 3000.0),
        }
    }

    /// β-barium borate, extraordinary ray.
    pub fn bbo_extraordinary() -> Self {
        Self {
            name: "BBO_e".into(),
            coefficients: SellmeierCoefficients {
                a1: 2.3753,
                a2: 0.01224,
                a3: 0.01667,
                a4: 0.01516,
            },
            range_nm: (220.0, 3000.0),
        }
    }

    pub fn coefficients(&self) -> &SellmeierCoefficients {
        &self.coefficients
    }
}

impl DispersiveMedium for SellmeierMedium {
    fn name(&self) -> &str {
        &self.name
    }

    fn wavelength_range(&self) -> (f64, f64) {
        self.range_nm
    }

    fn refractive_index(&self, wavelength_nm: f64) -> Result<f64, MaterialError> {
        let (min, max) = self.range_nm;
        if !(min..=max).contains(&wavelength_nm) {
            return Err(MaterialError::OutOfRange { wavelength_nm, min, max });
        }

        let SellmeierCoefficients { a1, a2, a3, a4 } = self.coefficients;
        let lambda_um = wavelength_nm * 1e-3;
        let l2 = lambda_um * lambda_um;
        let n_squared = a1 + a2 / (l2 - a3) - a4 * l2;
        if !(n_squared > 0.0) {
            return Err(MaterialError::NonPhysical { wavelength_nm, n_squared });
        }
        Ok(n_squared.sqrt())
    }
}
