//! Error taxonomy for the HOM model.
//!
//! All errors are deterministic functions of the inputs; nothing here is
//! transient or worth retrying.

use hom_compute::ComputeError;
use hom_materials::MaterialError;
use thiserror::Error;

/// Errors raised while constructing inputs or evaluating a coincidence curve.
#[derive(Debug, Error)]
pub enum HomError {
    #[error("Invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: String,
    },

    #[error(
        "Integration did not reach tolerance {tolerance:.1e} (error estimate {error_estimate:.2e}) \
         after {refinements} refinements"
    )]
    IntegrationTolerance {
        error_estimate: f64,
        tolerance: f64,
        refinements: usize,
    },

    #[error("Delay sweep is empty")]
    EmptySweep,

    #[error("At delay τ = {delay}: {source}")]
    AtDelay {
        delay: f64,
        #[source]
        source: Box<HomError>,
    },

    #[error("Material error: {0}")]
    Material(#[from] MaterialError),

    #[error("Compute backend error: {0}")]
    Compute(#[from] ComputeError),
}

impl HomError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: impl Into<String>) -> Self {
        HomError::InvalidParameter {
            name,
            value,
            reason: reason.into(),
        }
    }

    /// Attach the delay at which this error occurred.
    pub fn at_delay(self, delay: f64) -> Self {
        HomError::AtDelay {
            delay,
            source: Box::new(self),
        }
    }

    /// The error with any delay context stripped.
    pub fn root(&self) -> &HomError {
        match self {
            HomError::AtDelay { source, .. } => source.root(),
            other => other,
        }
    }

    /// The delay attached to this error, if any.
    pub fn delay(&self) -> Option<f64> {
        match self {
            HomError::AtDelay { delay, .. } => Some(*delay),
            _ => None,
        }
    }
}

pub type Result<T, E = HomError> = std::result::Result<T, E>;
