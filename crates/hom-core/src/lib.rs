//! # HOM Core
//!
//! The numerical model behind Hong-Ou-Mandel coincidence curves: the
//! probability that two photons meeting at a balanced beamsplitter leave by
//! different ports, as a function of their relative delay.
//!
//! ## Architecture
//!
//! Photons are described by a [`spectral::SpectralProfile`] (or, for both
//! photons of one source, a [`spectral::JointSpectrum`]). Overlap integrals
//! between them are evaluated by an [`overlap::OverlapIntegrator`], either in
//! closed form ([`overlap::AnalyticIntegrator`]) or numerically
//! ([`overlap::QuadratureIntegrator`]). The [`coincidence::CoincidenceModel`]
//! turns an overlap into a probability, and the [`curve::CurveBuilder`] sweeps
//! delay on a `hom-compute` backend.
//!
//! ## Modules
//!
//! - [`spectral`]: Gaussian, chirped-Gaussian and Schmidt-mode photons; pair JSAs.
//! - [`overlap`]: Gaussian-form reduction, adaptive quadrature, JSA grid cache.
//! - [`coincidence`]: Coincidence formula with range checking.
//! - [`curve`]: Parallel delay sweeps.
//! - [`types`]: Configuration, delay sweeps and curves.
//! - [`error`]: Error taxonomy.
//!
//! ## Units
//!
//! Any consistent pair of frequency and time units works. The lab-unit
//! constructors produce rad/ps, so delays are then in ps and chirps in ps².

pub mod coincidence;
pub mod curve;
pub mod error;
pub mod overlap;
pub mod spectral;
pub mod types;

pub use coincidence::{Coincidence, CoincidenceModel, NumericRangeWarning};
pub use curve::CurveBuilder;
pub use error::{HomError, Result};
pub use overlap::{GridCache, Overlap, OverlapIntegrator};
pub use spectral::{JointSpectrum, SpectralAmplitude, SpectralProfile};
pub use types::{CoincidenceCurve, CurveConfig, DelaySweep, IntegrationMethod, Provenance};
