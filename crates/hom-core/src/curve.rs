//! Delay sweeps.
//!
//! [`CurveBuilder`] prepares an overlap plan once, then evaluates every delay
//! as an independent task on its compute backend. Each task writes only its
//! own result slot. After the sweep the slots are read in delay order; slots a
//! backend skipped after a failure are evaluated then, so the error returned
//! is always the one at the lowest failing delay.

use std::sync::{Arc, OnceLock};

use hom_compute::{default_backend, ComputeBackend, ComputeError};

use crate::coincidence::{Coincidence, CoincidenceModel};
use crate::error::{HomError, Result};
use crate::overlap::{ExchangePlan, GridCache, Overlap, OverlapPlan};
use crate::spectral::{JointSpectrum, SpectralProfile};
use crate::types::{CoincidenceCurve, CurveConfig, DelaySweep, Provenance, SourceDescription};

/// Builds coincidence curves for a fixed configuration and backend.
pub struct CurveBuilder {
    config: CurveConfig,
    backend: Arc<dyn ComputeBackend>,
    model: CoincidenceModel,
}

impl CurveBuilder {
    /// A builder on the default backend.
    pub fn new(config: CurveConfig) -> Result<Self> {
        Self::with_backend(config, default_backend())
    }

    pub fn with_backend(config: CurveConfig, backend: Arc<dyn ComputeBackend>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            backend,
            model: CoincidenceModel::default(),
        })
    }

    pub fn config(&self) -> &CurveConfig {
        &self.config
    }

    /// Sweep the delay between two independent photons.
    pub fn build_curve(
        &self,
        a: &SpectralProfile,
        b: &SpectralProfile,
        sweep: &DelaySweep,
    ) -> Result<CoincidenceCurve> {
        if sweep.is_empty() {
            return Err(HomError::EmptySweep);
        }
        for profile in [a, b] {
            if profile.is_multimode() && !self.config.multimode {
                let modes = match profile {
                    SpectralProfile::Schmidt(s) => s.modes().len(),
                    _ => 1,
                };
                return Err(HomError::invalid(
                    "multimode",
                    modes as f64,
                    "multi-mode Schmidt profiles require `multimode = true`",
                ));
            }
        }

        let plan = OverlapPlan::new(&self.config, a, b);
        let points = self.sweep(sweep.values(), |delay| plan.evaluate(delay))?;
        Ok(CoincidenceCurve::new(
            points,
            self.provenance(
                SourceDescription::Independent {
                    photon_a: a.clone(),
                    photon_b: b.clone(),
                },
                plan.method_name(),
            ),
        ))
    }

    /// Sweep the delay between the two photons of one pair source.
    ///
    /// With quadrature the sampled JSA is taken from (or stored in) `cache`
    /// before any delay is evaluated.
    pub fn build_pair_curve(
        &self,
        pair: &JointSpectrum,
        sweep: &DelaySweep,
        cache: &mut GridCache,
    ) -> Result<CoincidenceCurve> {
        if sweep.is_empty() {
            return Err(HomError::EmptySweep);
        }
        let plan = ExchangePlan::new(&self.config, pair, cache)?;
        let points = self.sweep(sweep.values(), |delay| plan.evaluate(delay))?;
        if let ExchangePlan::Quadrature { ladder, .. } = &plan {
            log::debug!(
                "sampled {} of {} JSA levels",
                ladder.sampled_levels(),
                ladder.level_count()
            );
        }
        Ok(CoincidenceCurve::new(
            points,
            self.provenance(SourceDescription::Pair { jsa: *pair }, plan.method_name()),
        ))
    }

    fn sweep(
        &self,
        delays: &[f64],
        evaluate: impl Fn(f64) -> Result<Overlap> + Sync,
    ) -> Result<Vec<Coincidence>> {
        let device = self.backend.device_info();
        log::debug!("sweeping {} delays on {}", delays.len(), device.name);

        let model = self.model;
        let run = |i: usize| {
            let delay = delays[i];
            evaluate(delay)
                .map(|overlap| model.probability(&overlap, delay))
                .map_err(|e| e.at_delay(delay))
        };

        let slots: Vec<OnceLock<Result<Coincidence>>> =
            (0..delays.len()).map(|_| OnceLock::new()).collect();
        let task = |i: usize| {
            let outcome = run(i);
            let ok = outcome.is_ok();
            let _ = slots[i].set(outcome);
            ok
        };
        let completed = self.backend.for_each_index(delays.len(), &task)?;

        let mut points = Vec::with_capacity(delays.len());
        for (i, slot) in slots.into_iter().enumerate() {
            let outcome = match slot.into_inner() {
                Some(outcome) => outcome,
                // Skipped once some other task failed. Evaluate it here so the
                // reported error is always the one at the lowest delay index.
                None if !completed => run(i),
                None => {
                    return Err(ComputeError::Unavailable(format!(
                        "delay task {i} of {} did not run",
                        delays.len()
                    ))
                    .into())
                }
            };
            points.push(outcome?);
        }
        Ok(points)
    }

    fn provenance(&self, source: SourceDescription, method: &str) -> Provenance {
        Provenance {
            source,
            config: self.config.clone(),
            backend: self.backend.device_info().name,
            method: method.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hom_compute::{BackendType, DeviceInfo, SerialBackend};
    use num_complex::Complex64;

    /// Runs tasks from the last index down, stopping at the first failure.
    struct ReverseBackend;

    impl ComputeBackend for ReverseBackend {
        fn device_info(&self) -> DeviceInfo {
            DeviceInfo {
                name: "Reverse".into(),
                backend_type: BackendType::Serial,
                threads: 1,
            }
        }

        fn for_each_index(
            &self,
            len: usize,
            task: &(dyn Fn(usize) -> bool + Send + Sync),
        ) -> std::result::Result<bool, ComputeError> {
            Ok((0..len).rev().all(task))
        }
    }

    fn failing_from(threshold: f64) -> impl Fn(f64) -> Result<Overlap> + Sync {
        move |delay| {
            if delay >= threshold {
                Err(HomError::invalid("delay", delay, "outside the test window"))
            } else {
                Ok(Overlap::Amplitude(Complex64::new(1.0, 0.0)))
            }
        }
    }

    #[test]
    fn test_lowest_failing_delay_is_reported_regardless_of_order() {
        let delays = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let backends: [Arc<dyn ComputeBackend>; 2] = [Arc::new(SerialBackend), Arc::new(ReverseBackend)];
        for backend in backends {
            let builder = CurveBuilder::with_backend(CurveConfig::default(), backend).unwrap();
            let err = builder.sweep(&delays, failing_from(3.0)).unwrap_err();
            assert_eq!(err.delay(), Some(3.0));
        }
    }

    #[test]
    fn test_reverse_order_sweep_keeps_delay_order() {
        let delays = [-1.0, 0.0, 1.0];
        let builder = CurveBuilder::with_backend(CurveConfig::default(), Arc::new(ReverseBackend)).unwrap();
        let points = builder.sweep(&delays, failing_from(f64::INFINITY)).unwrap();
        let taus: Vec<f64> = points.iter().map(|c| c.delay).collect();
        assert_eq!(taus, delays);
    }

    #[test]
    fn test_overlong_pair_fails_before_sweeping() {
        let config = CurveConfig {
            integration_method: crate::types::IntegrationMethod::Quadrature,
            ..CurveConfig::default()
        };
        let builder = CurveBuilder::with_backend(config, Arc::new(SerialBackend)).unwrap();
        let pair = JointSpectrum::degenerate(10.0, 1e18, 1.0).unwrap();
        let sweep = DelaySweep::centred(5.0, 11).unwrap();
        let mut cache = GridCache::new();

        let err = builder.build_pair_curve(&pair, &sweep, &mut cache).unwrap_err();
        assert!(matches!(err, HomError::InvalidParameter { name: "pulse_duration", .. }));
        assert!(cache.is_empty());
    }
}
