//! Sampled joint spectra for the two-dimensional exchange integral.
//!
//! The exchange overlap
//!
//! $$
//! E(\tau) = \iint f(\omega_1,\omega_2)\, f^*(\omega_2,\omega_1)\,
//!   e^{i(\omega_1-\omega_2)\tau}\, d\omega_1\, d\omega_2
//! $$
//!
//! is evaluated with a tensor-product composite Gauss–Legendre rule. Both
//! axes share one node set, so the swapped amplitude is the transposed
//! sample matrix and the delay-independent part
//! $G_{ij} = w_i w_j f_{ij} f^*_{ji}$ is stored once per refinement level,
//! sampled only when a delay first needs that level.
//! Each delay then costs one matrix-vector product per level.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use super::quadrature::gauss_legendre_panels;
use crate::error::{HomError, Result};
use crate::spectral::JointSpectrum;

/// Largest node count per axis a refinement level may have.
pub const MAX_GRID_NODES: usize = 4096;

/// One refinement level of the sampled JSA.
#[derive(Debug, Clone)]
pub struct JsaGrid {
    /// Node offsets $\nu_i$ from the ladder reference frequency.
    nodes: Array1<f64>,
    /// $w_i w_j f(\nu_i,\nu_j) f^*(\nu_j,\nu_i)$.
    weighted: Array2<Complex64>,
}

impl JsaGrid {
    fn sample(jsa: &JointSpectrum, reference: f64, lo: f64, hi: f64, panels: usize) -> Self {
        let (nodes, weights) = gauss_legendre_panels(lo - reference, hi - reference, panels);
        let n = nodes.len();
        let weighted = Array2::from_shape_fn((n, n), |(i, j)| {
            let (wi, wj) = (reference + nodes[i], reference + nodes[j]);
            weights[i] * weights[j] * jsa.evaluate(wi, wj) * jsa.evaluate(wj, wi).conj()
        });
        Self {
            nodes: Array1::from(nodes),
            weighted,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// $\sum_{ij} G_{ij}\, e^{i\nu_i\tau} e^{-i\nu_j\tau}$.
    pub fn exchange(&self, delay: f64) -> Complex64 {
        let phase = self.nodes.mapv(|nu| Complex64::from_polar(1.0, nu * delay));
        let conj_phase = phase.mapv(|p| p.conj());
        phase.dot(&self.weighted.dot(&conj_phase))
    }
}

/// Successively doubled grids for one joint spectrum.
///
/// Level sizes are fixed at build time; each level is sampled the first time
/// an exchange evaluation reaches it.
#[derive(Debug, Clone)]
pub struct JsaLadder {
    jsa: JointSpectrum,
    reference: f64,
    lo: f64,
    hi: f64,
    panels: Vec<usize>,
    levels: Vec<OnceLock<JsaGrid>>,
}

impl JsaLadder {
    /// Plan up to `max_refinements + 1` levels for `jsa`.
    ///
    /// The coarsest level puts two panels across the narrowest JSA feature;
    /// levels whose node count would exceed [`MAX_GRID_NODES`] are dropped.
    /// Fewer than two usable levels is an error.
    pub fn build(jsa: &JointSpectrum, window_factor: f64, max_refinements: usize) -> Result<Self> {
        let (lo, hi) = jsa.support(window_factor);
        let tp = jsa.pulse_duration();
        let tc = jsa.coherence_time();
        // Standard deviation of |f|² along one frequency axis.
        let feature = 1.0 / (tp * tp + tc * tc).sqrt();
        let max_panels = MAX_GRID_NODES / 5;

        // Sized in f64 first: huge pulse durations would overflow usize.
        let base = ((hi - lo) / (2.0 * feature)).ceil();
        if !base.is_finite() || 2.0 * base.max(4.0) > max_panels as f64 {
            return Err(elongated(tp));
        }
        let base_panels = (base as usize).max(4);

        let panels: Vec<usize> = (0..=max_refinements)
            .map_while(|level| {
                u32::try_from(level)
                    .ok()
                    .and_then(|shift| 1usize.checked_shl(shift))
                    .and_then(|factor| base_panels.checked_mul(factor))
                    .filter(|&p| p <= max_panels)
            })
            .collect();
        if panels.len() < 2 {
            return Err(elongated(tp));
        }
        log::debug!(
            "JSA ladder: {} levels, {} to {} nodes per axis",
            panels.len(),
            5 * panels[0],
            5 * panels[panels.len() - 1]
        );

        let levels = panels.iter().map(|_| OnceLock::new()).collect();
        Ok(Self {
            jsa: *jsa,
            reference: jsa.reference(),
            lo,
            hi,
            panels,
            levels,
        })
    }

    /// Number of refinement levels available.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Number of levels sampled so far.
    pub fn sampled_levels(&self) -> usize {
        self.levels.iter().filter(|l| l.get().is_some()).count()
    }

    fn level(&self, index: usize) -> &JsaGrid {
        self.levels[index].get_or_init(|| {
            JsaGrid::sample(&self.jsa, self.reference, self.lo, self.hi, self.panels[index])
        })
    }

    /// Exchange integral at `delay`, refined until successive levels agree
    /// to `tolerance`.
    pub fn exchange(&self, delay: f64, tolerance: f64) -> Result<Complex64> {
        let mut previous = self.level(0).exchange(delay);
        let mut estimate = f64::INFINITY;
        for index in 1..self.levels.len() {
            let current = self.level(index).exchange(delay);
            estimate = (current - previous).norm();
            if estimate <= tolerance {
                return Ok(current);
            }
            previous = current;
        }
        Err(HomError::IntegrationTolerance {
            error_estimate: estimate,
            tolerance,
            refinements: self.levels.len() - 1,
        })
    }
}

fn elongated(pulse_duration: f64) -> HomError {
    HomError::invalid(
        "pulse_duration",
        pulse_duration,
        "joint spectrum is too elongated for the quadrature grid; use the analytic method",
    )
}

type GridKey = ([u64; 4], u64, usize);

/// Caller-owned store of sampled JSA ladders.
///
/// Keyed by the JSA parameters, window factor and refinement cap. Sweeping
/// the same source twice with one cache samples it once.
#[derive(Debug, Default)]
pub struct GridCache {
    ladders: HashMap<GridKey, Arc<JsaLadder>>,
}

impl GridCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ladders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ladders.is_empty()
    }

    pub fn clear(&mut self) {
        self.ladders.clear();
    }

    /// Fetch the ladder for `jsa`, sampling it on a miss.
    pub fn ladder(
        &mut self,
        jsa: &JointSpectrum,
        window_factor: f64,
        max_refinements: usize,
    ) -> Result<Arc<JsaLadder>> {
        let key = (jsa.cache_key(), window_factor.to_bits(), max_refinements);
        if let Some(ladder) = self.ladders.get(&key) {
            log::debug!("JSA ladder cache hit");
            return Ok(Arc::clone(ladder));
        }
        let ladder = Arc::new(JsaLadder::build(jsa, window_factor, max_refinements)?);
        self.ladders.insert(key, Arc::clone(&ladder));
        Ok(ladder)
    }
}
