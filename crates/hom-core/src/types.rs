//! Core types shared across the HOM model.
//!
//! This module defines the sweep configuration, the delay grid and the
//! finished curve with its provenance.

use serde::{Deserialize, Serialize};

use crate::coincidence::{Coincidence, NumericRangeWarning};
use crate::error::{HomError, Result};
use crate::spectral::{JointSpectrum, SpectralAmplitude, SpectralProfile};

/// Largest accepted 2-D refinement cap; each level quadruples the grid.
pub const MAX_REFINEMENT_LEVELS: usize = 6;

/// How overlap integrals are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationMethod {
    /// Closed-form Gaussian reduction, with quadrature for profiles that
    /// have no closed form.
    #[default]
    Analytic,
    /// Numerical quadrature throughout.
    Quadrature,
}

/// Parameters of a delay sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    pub integration_method: IntegrationMethod,
    /// Absolute error target of each numerical overlap.
    pub quadrature_tolerance: f64,
    /// Half-width of the integration window in units of the bandwidth.
    pub frequency_window_factor: f64,
    /// Interval cap of the adaptive 1-D quadrature.
    pub max_subdivisions: usize,
    /// Number of grid doublings of the 2-D exchange quadrature.
    pub max_refinements: usize,
    /// Allow explicit multi-mode Schmidt profiles.
    pub multimode: bool,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            integration_method: IntegrationMethod::Analytic,
            quadrature_tolerance: 1e-9,
            frequency_window_factor: 8.0,
            max_subdivisions: 200,
            max_refinements: 4,
            multimode: false,
        }
    }
}

impl CurveConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.quadrature_tolerance.is_finite() && self.quadrature_tolerance > 0.0) {
            return Err(HomError::invalid(
                "quadrature_tolerance",
                self.quadrature_tolerance,
                "must be finite and positive",
            ));
        }
        if !(self.frequency_window_factor.is_finite() && self.frequency_window_factor > 0.0) {
            return Err(HomError::invalid(
                "frequency_window_factor",
                self.frequency_window_factor,
                "must be finite and positive",
            ));
        }
        if self.max_subdivisions == 0 {
            return Err(HomError::invalid("max_subdivisions", 0.0, "must be at least 1"));
        }
        if self.max_refinements == 0 || self.max_refinements > MAX_REFINEMENT_LEVELS {
            return Err(HomError::invalid(
                "max_refinements",
                self.max_refinements as f64,
                format!("must be between 1 and {MAX_REFINEMENT_LEVELS}"),
            ));
        }
        Ok(())
    }
}

/// A strictly increasing, finite, non-empty sequence of delays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelaySweep {
    values: Vec<f64>,
}

impl DelaySweep {
    /// `count` evenly spaced delays from `min` to `max` inclusive.
    pub fn uniform(min: f64, max: f64, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(HomError::EmptySweep);
        }
        if !min.is_finite() {
            return Err(HomError::invalid("min", min, "must be finite"));
        }
        if !max.is_finite() {
            return Err(HomError::invalid("max", max, "must be finite"));
        }
        if count == 1 {
            return Ok(Self { values: vec![min] });
        }
        if min >= max {
            return Err(HomError::invalid("max", max, "must exceed min for more than one delay"));
        }
        let step = (max - min) / (count - 1) as f64;
        let mut values: Vec<f64> = (0..count).map(|i| min + i as f64 * step).collect();
        values[count - 1] = max;
        Self::explicit(values)
    }

    /// An explicit list of delays.
    pub fn explicit(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(HomError::EmptySweep);
        }
        if let Some(&bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(HomError::invalid("delay", bad, "must be finite"));
        }
        if let Some(pair) = values.windows(2).find(|w| w[1] <= w[0]) {
            return Err(HomError::invalid("delay", pair[1], "delays must be strictly increasing"));
        }
        Ok(Self { values })
    }

    /// `count` delays spread evenly over `[-half_span, half_span]`.
    pub fn centred(half_span: f64, count: usize) -> Result<Self> {
        if !(half_span.is_finite() && half_span > 0.0) {
            return Err(HomError::invalid("half_span", half_span, "must be finite and positive"));
        }
        Self::uniform(-half_span, half_span, count)
    }

    /// A sweep over ±5 coherence times of the narrower-band photon.
    pub fn suggested_for(a: &SpectralProfile, b: &SpectralProfile, count: usize) -> Result<Self> {
        Self::centred(5.0 * a.coherence_time().max(b.coherence_time()), count)
    }

    /// A sweep over ±5 coherence times of a pair source.
    pub fn suggested_for_pair(pair: &JointSpectrum, count: usize) -> Result<Self> {
        Self::centred(5.0 * pair.coherence_time(), count)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// What was swept.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceDescription {
    /// Two independent photons.
    Independent {
        photon_a: SpectralProfile,
        photon_b: SpectralProfile,
    },
    /// Both photons of one pair source.
    Pair { jsa: JointSpectrum },
}

/// Inputs and settings that produced a curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provenance {
    pub source: SourceDescription,
    pub config: CurveConfig,
    pub backend: String,
    pub method: String,
    pub version: String,
}

/// Coincidence probability against delay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoincidenceCurve {
    delays: Vec<f64>,
    probabilities: Vec<f64>,
    provenance: Provenance,
    warnings: Vec<NumericRangeWarning>,
}

impl CoincidenceCurve {
    /// Assemble a curve from per-delay results in sweep order.
    pub(crate) fn new(points: Vec<Coincidence>, provenance: Provenance) -> Self {
        let warnings = points.iter().filter_map(|c| c.warning).collect();
        let (delays, probabilities) = points.iter().map(|c| (c.delay, c.probability)).unzip();
        Self {
            delays,
            probabilities,
            provenance,
            warnings,
        }
    }

    pub fn delays(&self) -> &[f64] {
        &self.delays
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn warnings(&self) -> &[NumericRangeWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.delays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    /// `(delay, probability)` pairs in sweep order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.delays.iter().copied().zip(self.probabilities.iter().copied())
    }

    /// Delay and probability of the lowest point (the first one on ties).
    pub fn minimum(&self) -> (f64, f64) {
        self.points()
            .fold((f64::NAN, f64::INFINITY), |best, p| if p.1 < best.1 { p } else { best })
    }

    /// Dip visibility $(\tfrac12 - P_{\min}) / \tfrac12$.
    pub fn visibility(&self) -> f64 {
        1.0 - 2.0 * self.minimum().1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_uniform_sweep_endpoints() {
        let sweep = DelaySweep::uniform(-50.0, 50.0, 201).unwrap();
        assert_eq!(sweep.len(), 201);
        assert_eq!(sweep.values()[0], -50.0);
        assert_eq!(sweep.values()[200], 50.0);
        assert_relative_eq!(sweep.values()[100], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_point_sweep() {
        assert_eq!(DelaySweep::uniform(3.0, 3.0, 1).unwrap().values(), &[3.0]);
    }

    #[test]
    fn test_empty_sweeps_are_rejected() {
        assert!(matches!(DelaySweep::uniform(0.0, 1.0, 0), Err(HomError::EmptySweep)));
        assert!(matches!(DelaySweep::explicit(Vec::new()), Err(HomError::EmptySweep)));
    }

    #[test]
    fn test_sweep_must_increase() {
        assert!(DelaySweep::explicit(vec![0.0, 1.0, 1.0]).is_err());
        assert!(DelaySweep::explicit(vec![0.0, f64::NAN]).is_err());
        assert!(DelaySweep::uniform(1.0, 0.0, 5).is_err());
        assert!(DelaySweep::explicit(vec![-2.0, 0.5, 7.0]).is_ok());
    }

    #[test]
    fn test_suggested_sweep_follows_narrower_band() {
        let a = SpectralProfile::gaussian(1.0, 0.1).unwrap();
        let b = SpectralProfile::gaussian(1.0, 0.2).unwrap();
        let sweep = DelaySweep::suggested_for(&a, &b, 11).unwrap();
        assert_relative_eq!(sweep.values()[10], 50.0, epsilon = 1e-12);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(CurveConfig::default().validate().is_ok());
        let bad = CurveConfig {
            quadrature_tolerance: 0.0,
            ..CurveConfig::default()
        };
        assert!(bad.validate().is_err());
        let too_fine = CurveConfig {
            max_refinements: 9,
            ..CurveConfig::default()
        };
        assert!(too_fine.validate().is_err());
    }

    #[test]
    fn test_config_deserialises_with_defaults() {
        let config: CurveConfig =
            serde_json::from_str(r#"{"integration_method": "quadrature", "multimode": true}"#).unwrap();
        assert_eq!(config.integration_method, IntegrationMethod::Quadrature);
        assert!(config.multimode);
        assert_eq!(config.max_subdivisions, 200);
    }
}
