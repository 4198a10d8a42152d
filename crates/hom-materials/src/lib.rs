//! # HOM Materials
//!
//! Dispersive media for the HOM framework. Every medium implements the
//! [`DispersiveMedium`](medium::DispersiveMedium) trait, which provides a
//! real refractive index and, from it, the wave number and group-velocity
//! dispersion used to chirp spectral profiles.
//!
//! ## Available models
//!
//! | Model | Module | Status |
//! |-------|--------|--------|
//! | Sellmeier (4-term, BBO presets) | [`sellmeier`] | Implemented |
//!
//! ## Units
//!
//! Wavelengths are given in nanometres at the API boundary, angular
//! frequencies in rad/ps and propagation lengths in metres, so that a
//! group-delay dispersion comes out in ps². See [`units`].

pub mod medium;
pub mod sellmeier;
pub mod units;

pub use medium::{DispersiveMedium, MaterialError};
pub use sellmeier::SellmeierMedium;
