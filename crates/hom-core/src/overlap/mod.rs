//! Overlap integrals between photon spectra.
//!
//! The [`OverlapIntegrator`] trait defines the interface that both
//! integration methods implement. [`AnalyticIntegrator`] reduces Gaussian
//! overlaps in closed form; [`QuadratureIntegrator`] integrates any profile
//! numerically. The curve builder does not call either directly: it builds
//! an [`OverlapPlan`] (or [`ExchangePlan`]) once per sweep, which chooses the
//! method and does all delay-independent work up front.

pub mod analytic;
pub mod gaussian_form;
pub mod grid;
pub mod quadrature;

use std::sync::Arc;

use num_complex::Complex64;
use serde::Serialize;

pub use analytic::AnalyticIntegrator;
pub use grid::{GridCache, JsaLadder};
pub use quadrature::{PreparedModes, QuadratureIntegrator};

use crate::error::Result;
use crate::spectral::{JointSpectrum, SpectralProfile};
use crate::types::{CurveConfig, IntegrationMethod};

/// One Schmidt mode-pair contribution $\lambda_j\mu_k$, $\Lambda_{jk}(\tau)$.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModeTerm {
    pub weight: f64,
    pub amplitude: Complex64,
}

/// The overlap quantity the coincidence formula needs at one delay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Overlap {
    /// Normalised amplitude overlap $\Lambda(\tau)$ of two pure photons.
    Amplitude(Complex64),
    /// Weighted mode-pair overlaps of mixed or multi-mode photons.
    ModeSum(Vec<ModeTerm>),
    /// Closed-form $\mathrm{Tr}[\rho_A\rho_B(\tau)]$.
    Trace(f64),
    /// Exchange overlap of a single pair source.
    Exchange(Complex64),
}

impl Overlap {
    /// The two-photon interference term subtracted from the accidental
    /// coincidence level: $P = \tfrac12(1 - \text{interference})$.
    pub fn interference(&self) -> f64 {
        match self {
            Overlap::Amplitude(lambda) => lambda.norm_sqr(),
            Overlap::ModeSum(terms) => terms
                .iter()
                .map(|t| t.weight * t.amplitude.norm_sqr())
                .sum(),
            Overlap::Trace(trace) => *trace,
            Overlap::Exchange(e) => e.re,
        }
    }
}

/// The interface every overlap method implements.
pub trait OverlapIntegrator: Send + Sync {
    /// Overlap of two independent photons at `delay`.
    fn overlap(&self, a: &SpectralProfile, b: &SpectralProfile, delay: f64) -> Result<Overlap>;

    /// Exchange overlap of both photons of one pair source at `delay`.
    fn exchange(&self, pair: &JointSpectrum, delay: f64) -> Result<Overlap>;

    /// Human-readable name of the method.
    fn method_name(&self) -> &str;
}

/// Per-sweep evaluator for two independent photons.
#[derive(Debug, Clone)]
pub enum OverlapPlan {
    Analytic {
        a: SpectralProfile,
        b: SpectralProfile,
    },
    Quadrature(PreparedModes),
}

impl OverlapPlan {
    /// Choose the integration method for this pair of profiles.
    ///
    /// The analytic method falls back to quadrature for profiles without a
    /// closed form.
    pub fn new(config: &CurveConfig, a: &SpectralProfile, b: &SpectralProfile) -> Self {
        let analytic = match config.integration_method {
            IntegrationMethod::Analytic if AnalyticIntegrator::supports(a, b) => true,
            IntegrationMethod::Analytic => {
                log::debug!("no closed form for Schmidt-mode profiles, falling back to quadrature");
                false
            }
            IntegrationMethod::Quadrature => false,
        };

        if analytic {
            OverlapPlan::Analytic {
                a: a.clone(),
                b: b.clone(),
            }
        } else {
            OverlapPlan::Quadrature(QuadratureIntegrator::from_config(config).prepare(a, b))
        }
    }

    pub fn evaluate(&self, delay: f64) -> Result<Overlap> {
        match self {
            OverlapPlan::Analytic { a, b } => AnalyticIntegrator.overlap(a, b, delay),
            OverlapPlan::Quadrature(prepared) => prepared.evaluate(delay),
        }
    }

    pub fn method_name(&self) -> &'static str {
        match self {
            OverlapPlan::Analytic { .. } => "analytic (Gaussian reduction)",
            OverlapPlan::Quadrature(_) => "quadrature (Gauss-Kronrod 7/15)",
        }
    }
}

/// Per-sweep evaluator for a single pair source.
#[derive(Debug, Clone)]
pub enum ExchangePlan {
    Analytic(JointSpectrum),
    Quadrature {
        ladder: Arc<JsaLadder>,
        tolerance: f64,
    },
}

impl ExchangePlan {
    /// Choose the method; the quadrature ladder comes from `cache`.
    pub fn new(config: &CurveConfig, pair: &JointSpectrum, cache: &mut GridCache) -> Result<Self> {
        match config.integration_method {
            IntegrationMethod::Analytic => Ok(ExchangePlan::Analytic(*pair)),
            IntegrationMethod::Quadrature => Ok(ExchangePlan::Quadrature {
                ladder: cache.ladder(pair, config.frequency_window_factor, config.max_refinements)?,
                tolerance: config.quadrature_tolerance,
            }),
        }
    }

    pub fn evaluate(&self, delay: f64) -> Result<Overlap> {
        match self {
            ExchangePlan::Analytic(pair) => AnalyticIntegrator.exchange(pair, delay),
            ExchangePlan::Quadrature { ladder, tolerance } => {
                Ok(Overlap::Exchange(ladder.exchange(delay, *tolerance)?))
            }
        }
    }

    pub fn method_name(&self) -> &'static str {
        match self {
            ExchangePlan::Analytic(_) => "analytic (Gaussian reduction)",
            ExchangePlan::Quadrature { .. } => "quadrature (Gauss-Legendre panels)",
        }
    }
}
