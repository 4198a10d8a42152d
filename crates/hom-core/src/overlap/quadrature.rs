//! Numerical overlap integrals.
//!
//! One-dimensional overlaps use globally adaptive Gauss–Kronrod (7/15)
//! quadrature: the interval with the largest error estimate is bisected until
//! the summed estimate drops below the tolerance or the subdivision cap is
//! hit. Mixed and multi-mode photons are expanded into Schmidt modes and the
//! interference term is assembled from the pairwise mode overlaps
//!
//! $$
//! \sum_{j,k} \lambda_j \mu_k \left|\Lambda_{jk}(\tau)\right|^2,\qquad
//! \Lambda_{jk}(\tau) = \frac{\int \psi_j^*(\omega)\chi_k(\omega)e^{i\omega\tau}d\omega}
//!   {\lVert\psi_j\rVert\,\lVert\chi_k\rVert}.
//! $$
//!
//! Mode norms are computed once, when the overlap is prepared, so every delay
//! of a sweep divides by the same numbers.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use num_complex::Complex64;

use super::grid::JsaLadder;
use super::{ModeTerm, Overlap, OverlapIntegrator};
use crate::error::{HomError, Result};
use crate::spectral::{
    HermiteGauss, JointSpectrum, SpectralAmplitude, SpectralProfile, DEFAULT_SCHMIDT_TAIL,
};
use crate::types::CurveConfig;

/// Kronrod abscissae on [-1, 1] (non-negative half, descending).
const XGK: [f64; 8] = [
    0.991_455_371_120_812_639_206_854_697_526_329,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.586_087_235_467_691_130_294_144_845_693_013,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0.0,
];

/// Kronrod weights matching [`XGK`].
const WGK: [f64; 8] = [
    0.022_935_322_010_529_224_963_732_008_058_970,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.209_482_141_084_727_828_012_999_174_891_714,
];

/// Gauss weights for the odd-indexed Kronrod abscissae `XGK[1], XGK[3], XGK[5], XGK[7]`.
const WG: [f64; 4] = [
    0.129_484_966_168_869_693_270_611_432_679_082,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.417_959_183_673_469_387_755_102_040_816_327,
];

/// Uniform panels the adaptive scheme starts from.
const INITIAL_PANELS: usize = 8;

/// Five-point Gauss–Legendre abscissae on [-1, 1].
const GL5_NODES: [f64; 5] = [
    -0.906_179_845_938_664_0,
    -0.538_469_310_105_683_1,
    0.0,
    0.538_469_310_105_683_1,
    0.906_179_845_938_664_0,
];

const GL5_WEIGHTS: [f64; 5] = [
    0.236_926_885_056_189_1,
    0.478_628_670_499_366_5,
    0.568_888_888_888_888_9,
    0.478_628_670_499_366_5,
    0.236_926_885_056_189_1,
];

/// Nodes and weights of a composite five-point Gauss–Legendre rule with
/// `panels` equal panels on `[lo, hi]`.
pub fn gauss_legendre_panels(lo: f64, hi: f64, panels: usize) -> (Vec<f64>, Vec<f64>) {
    let h = (hi - lo) / panels as f64;
    let mut nodes = Vec::with_capacity(5 * panels);
    let mut weights = Vec::with_capacity(5 * panels);
    for p in 0..panels {
        let mid = lo + (p as f64 + 0.5) * h;
        for (x, w) in GL5_NODES.iter().zip(GL5_WEIGHTS.iter()) {
            nodes.push(mid + 0.5 * h * x);
            weights.push(0.5 * h * w);
        }
    }
    (nodes, weights)
}

/// Result of an adaptive integration.
#[derive(Debug, Clone, Copy)]
pub struct Integral {
    pub value: Complex64,
    pub error_estimate: f64,
    pub subdivisions: usize,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    lo: f64,
    hi: f64,
    value: Complex64,
    error: f64,
}

impl Segment {
    fn new(f: &impl Fn(f64) -> Complex64, lo: f64, hi: f64) -> Self {
        let centre = 0.5 * (lo + hi);
        let half = 0.5 * (hi - lo);
        let mut kronrod = Complex64::from(0.0);
        let mut gauss = Complex64::from(0.0);

        let fc = f(centre);
        kronrod += WGK[7] * fc;
        gauss += WG[3] * fc;
        for j in 0..7 {
            let dx = half * XGK[j];
            let pair = f(centre - dx) + f(centre + dx);
            kronrod += WGK[j] * pair;
            if j % 2 == 1 {
                gauss += WG[j / 2] * pair;
            }
        }

        Self {
            lo,
            hi,
            value: kronrod * half,
            error: ((kronrod - gauss) * half).norm(),
        }
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.error.total_cmp(&other.error) == Ordering::Equal
    }
}

impl Eq for Segment {}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.error.total_cmp(&other.error)
    }
}

/// Integrate a complex function over `[lo, hi]` by globally adaptive
/// Gauss–Kronrod quadrature.
///
/// Fails with [`HomError::IntegrationTolerance`] if the summed error
/// estimate is still above `tolerance` once `max_subdivisions` intervals
/// exist.
pub fn integrate_adaptive(
    f: impl Fn(f64) -> Complex64,
    lo: f64,
    hi: f64,
    tolerance: f64,
    max_subdivisions: usize,
) -> Result<Integral> {
    let max_subdivisions = max_subdivisions.max(1);
    let panels = INITIAL_PANELS.min(max_subdivisions);
    let h = (hi - lo) / panels as f64;

    let mut heap: BinaryHeap<Segment> = (0..panels)
        .map(|p| {
            let a = lo + p as f64 * h;
            let b = if p + 1 == panels { hi } else { a + h };
            Segment::new(&f, a, b)
        })
        .collect();

    let mut refinements = 0;
    loop {
        let value: Complex64 = heap.iter().map(|s| s.value).sum();
        let error: f64 = heap.iter().map(|s| s.error).sum();

        if error <= tolerance {
            return Ok(Integral {
                value,
                error_estimate: error,
                subdivisions: heap.len(),
            });
        }
        if heap.len() >= max_subdivisions {
            return Err(HomError::IntegrationTolerance {
                error_estimate: error,
                tolerance,
                refinements,
            });
        }

        if let Some(worst) = heap.pop() {
            let mid = 0.5 * (worst.lo + worst.hi);
            heap.push(Segment::new(&f, worst.lo, mid));
            heap.push(Segment::new(&f, mid, worst.hi));
            refinements += 1;
        }
    }
}

/// Overlap integrator by numerical quadrature.
///
/// Works for every [`SpectralProfile`]. Gaussian photons are expanded into
/// their Hermite–Gauss Schmidt series first.
#[derive(Debug, Clone, Copy)]
pub struct QuadratureIntegrator {
    pub tolerance: f64,
    pub window_factor: f64,
    pub max_subdivisions: usize,
    pub max_refinements: usize,
    /// Schmidt weight discarded when expanding correlated Gaussians.
    pub schmidt_tail: f64,
}

impl Default for QuadratureIntegrator {
    fn default() -> Self {
        Self::from_config(&CurveConfig::default())
    }
}

impl QuadratureIntegrator {
    pub fn from_config(config: &CurveConfig) -> Self {
        Self {
            tolerance: config.quadrature_tolerance,
            window_factor: config.frequency_window_factor,
            max_subdivisions: config.max_subdivisions,
            max_refinements: config.max_refinements,
            schmidt_tail: DEFAULT_SCHMIDT_TAIL,
        }
    }

    /// Decompose both photons into modes and normalise every mode once.
    pub fn prepare(&self, a: &SpectralProfile, b: &SpectralProfile) -> PreparedModes {
        let modes_a = a.schmidt_decomposition(self.schmidt_tail);
        let modes_b = b.schmidt_decomposition(self.schmidt_tail);

        let norms_a: Vec<f64> = modes_a.modes().iter().map(|m| self.mode_norm(&m.function)).collect();
        let norms_b: Vec<f64> = modes_b.modes().iter().map(|m| self.mode_norm(&m.function)).collect();

        let mut pairs = Vec::new();
        for (ma, na) in modes_a.modes().iter().zip(&norms_a) {
            for (mb, nb) in modes_b.modes().iter().zip(&norms_b) {
                let weight = ma.weight * mb.weight;
                if weight < self.schmidt_tail {
                    continue;
                }
                let (lo_a, hi_a) = ma.function.support(self.window_factor);
                let (lo_b, hi_b) = mb.function.support(self.window_factor);
                pairs.push(ModePair {
                    weight,
                    bra: ma.function,
                    ket: mb.function,
                    window: (lo_a.min(lo_b), hi_a.max(hi_b)),
                    norm: na * nb,
                });
            }
        }

        log::debug!(
            "quadrature overlap: {} x {} modes, {} mode pairs kept",
            modes_a.modes().len(),
            modes_b.modes().len(),
            pairs.len()
        );

        PreparedModes {
            pairs,
            pure: modes_a.modes().len() == 1 && modes_b.modes().len() == 1,
            reference: 0.5 * (a.centre() + b.centre()),
            tolerance: self.tolerance,
            max_subdivisions: self.max_subdivisions,
        }
    }

    /// Sample the JSA on the refinement ladder used for the exchange integral.
    pub fn prepare_pair(&self, pair: &JointSpectrum) -> Result<JsaLadder> {
        JsaLadder::build(pair, self.window_factor, self.max_refinements)
    }

    /// Norm of a mode over its window, by a fixed Gauss–Legendre rule fine
    /// enough to resolve every oscillation of the Hermite polynomial.
    fn mode_norm(&self, mode: &HermiteGauss) -> f64 {
        let (lo, hi) = mode.support(self.window_factor);
        let (nodes, weights) = gauss_legendre_panels(lo, hi, 8 * (mode.order + 8));
        nodes
            .iter()
            .zip(&weights)
            .map(|(&w, weight)| weight * mode.evaluate(w).norm_sqr())
            .sum::<f64>()
            .sqrt()
    }
}

impl OverlapIntegrator for QuadratureIntegrator {
    fn overlap(&self, a: &SpectralProfile, b: &SpectralProfile, delay: f64) -> Result<Overlap> {
        self.prepare(a, b).evaluate(delay)
    }

    fn exchange(&self, pair: &JointSpectrum, delay: f64) -> Result<Overlap> {
        let value = self.prepare_pair(pair)?.exchange(delay, self.tolerance)?;
        Ok(Overlap::Exchange(value))
    }

    fn method_name(&self) -> &str {
        "quadrature (Gauss-Kronrod 7/15)"
    }
}

#[derive(Debug, Clone, Copy)]
struct ModePair {
    weight: f64,
    bra: HermiteGauss,
    ket: HermiteGauss,
    window: (f64, f64),
    norm: f64,
}

/// Mode pairs of two photons with their norms, ready to be swept over delay.
#[derive(Debug, Clone)]
pub struct PreparedModes {
    pairs: Vec<ModePair>,
    pure: bool,
    reference: f64,
    tolerance: f64,
    max_subdivisions: usize,
}

impl PreparedModes {
    /// Number of mode pairs contributing to the interference term.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn evaluate(&self, delay: f64) -> Result<Overlap> {
        let reference = self.reference;
        let mut terms = Vec::with_capacity(self.pairs.len());
        for pair in &self.pairs {
            // e^{iωτ} = e^{iω_ref τ} e^{iντ}; only the ν part is integrated.
            let integral = integrate_adaptive(
                |nu| {
                    let w = reference + nu;
                    pair.bra.evaluate(w).conj()
                        * pair.ket.evaluate(w)
                        * Complex64::from_polar(1.0, nu * delay)
                },
                pair.window.0 - reference,
                pair.window.1 - reference,
                self.tolerance,
                self.max_subdivisions,
            )?;
            terms.push(ModeTerm {
                weight: pair.weight,
                amplitude: integral.value / pair.norm,
            });
        }

        if self.pure {
            if let [term] = terms.as_slice() {
                let phase = Complex64::from_polar(1.0, reference * delay);
                return Ok(Overlap::Amplitude(term.amplitude * phase));
            }
        }
        Ok(Overlap::ModeSum(terms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_gauss_kronrod_integrates_gaussian() {
        let integral = integrate_adaptive(
            |x| Complex64::from((-x * x).exp()),
            -10.0,
            10.0,
            1e-12,
            100,
        )
        .unwrap();
        assert_relative_eq!(integral.value.re, PI.sqrt(), epsilon = 1e-12);
        assert!(integral.error_estimate <= 1e-12);
    }

    #[test]
    fn test_oscillatory_integrand_is_refined() {
        // ∫ exp(−x²/2) e^{i·6x} dx = √(2π) e^{−18}
        let integral = integrate_adaptive(
            |x| Complex64::from((-0.5 * x * x).exp()) * Complex64::from_polar(1.0, 6.0 * x),
            -12.0,
            12.0,
            1e-13,
            400,
        )
        .unwrap();
        assert_relative_eq!(integral.value.re, (2.0 * PI).sqrt() * (-18.0f64).exp(), epsilon = 1e-12);
        assert!(integral.value.im.abs() < 1e-12);
        assert!(integral.subdivisions > INITIAL_PANELS);
    }

    #[test]
    fn test_subdivision_cap_reports_estimate() {
        let err = integrate_adaptive(
            |x| Complex64::from_polar(1.0, 40.0 * x * x),
            -3.0,
            3.0,
            1e-14,
            10,
        )
        .unwrap_err();
        match err {
            HomError::IntegrationTolerance { error_estimate, tolerance, refinements } => {
                assert!(error_estimate > tolerance);
                assert_eq!(refinements, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_gauss_legendre_panels_are_exact_for_polynomials() {
        let (nodes, weights) = gauss_legendre_panels(-1.0, 2.0, 3);
        assert_eq!(nodes.len(), 15);
        let integral: f64 = nodes
            .iter()
            .zip(&weights)
            .map(|(x, w)| w * x.powi(9))
            .sum();
        assert_relative_eq!(integral, (2f64.powi(10) - 1.0) / 10.0, epsilon = 1e-10);
    }

    #[test]
    fn test_pure_profiles_give_single_amplitude() {
        let a = SpectralProfile::gaussian(1.0, 0.1).unwrap();
        let prepared = QuadratureIntegrator::default().prepare(&a, &a);
        assert_eq!(prepared.len(), 1);
        match prepared.evaluate(0.0).unwrap() {
            Overlap::Amplitude(lambda) => assert_relative_eq!(lambda.norm(), 1.0, epsilon = 1e-9),
            other => panic!("expected amplitude, got {other:?}"),
        }
    }

    #[test]
    fn test_correlated_profiles_give_mode_sum() {
        let a = SpectralProfile::gaussian(1.0, 0.1)
            .unwrap()
            .with_correlation(0.6)
            .unwrap();
        let overlap = QuadratureIntegrator::default().overlap(&a, &a, 0.0).unwrap();
        assert!(matches!(overlap, Overlap::ModeSum(_)));
        // Tr ρ² = √(1 − r²)
        assert_relative_eq!(overlap.interference(), 0.8, epsilon = 1e-7);
    }
}
