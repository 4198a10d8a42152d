//! HOM dip scenarios for two independent photons.

use std::sync::Arc;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use hom_compute::{CpuBackend, SerialBackend};
use hom_core::overlap::quadrature::integrate_adaptive;
use hom_core::spectral::{HermiteGauss, SchmidtMode, SpectralAmplitude};
use hom_core::{CurveBuilder, CurveConfig, DelaySweep, HomError, SpectralProfile};
use num_complex::Complex64;

fn gaussian(omega0: f64, sigma: f64) -> SpectralProfile {
    SpectralProfile::gaussian(omega0, sigma).unwrap()
}

fn standard_sweep() -> DelaySweep {
    DelaySweep::uniform(-50.0, 50.0, 201).unwrap()
}

// ─── Normalisation ──────────────────────────────────────────────────────────

#[test]
fn test_all_profiles_are_normalised() {
    let mode = |n| HermiteGauss::new(n, 1.0, 0.1, 3.0).unwrap();
    let profiles = vec![
        gaussian(1.0, 0.1),
        SpectralProfile::chirped_gaussian(1.0, 0.1, 40.0).unwrap(),
        gaussian(1.0, 0.1).with_correlation(0.9).unwrap(),
        SpectralProfile::schmidt(vec![
            SchmidtMode { weight: 2.0, function: mode(0) },
            SchmidtMode { weight: 1.0, function: mode(3) },
        ])
        .unwrap(),
    ];

    for profile in &profiles {
        let (lo, hi) = profile.support(8.0);
        let mass = integrate_adaptive(
            |w| Complex64::from(profile.evaluate(w).norm_sqr()),
            lo,
            hi,
            1e-12,
            200,
        )
        .unwrap();
        eprintln!("{profile:?}: mass = {:.15}", mass.value.re);
        assert_relative_eq!(mass.value.re, 1.0, epsilon = 1e-9);
    }
}

// ─── Identical Gaussian photons ─────────────────────────────────────────────

#[test]
fn test_identical_gaussians_give_full_dip() {
    let a = gaussian(1.0, 0.1);
    let curve = CurveBuilder::new(CurveConfig::default())
        .unwrap()
        .build_curve(&a, &a, &standard_sweep())
        .unwrap();

    assert_eq!(curve.len(), 201);
    let (tau_min, p_min) = curve.minimum();
    assert_abs_diff_eq!(tau_min, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(p_min, 0.0, epsilon = 1e-12);
    assert_relative_eq!(curve.visibility(), 1.0, epsilon = 1e-12);
    assert!(curve.warnings().is_empty());

    // ½ − ½ exp(−σ²τ²/2)
    for (tau, p) in curve.points() {
        let expected = 0.5 - 0.5 * (-0.005 * tau * tau).exp();
        assert_abs_diff_eq!(p, expected, epsilon = 1e-12);
    }
}

#[test]
fn test_dip_plateaus_at_half() {
    let a = gaussian(1.0, 0.1);
    let curve = CurveBuilder::new(CurveConfig::default())
        .unwrap()
        .build_curve(&a, &a, &standard_sweep())
        .unwrap();

    for (tau, p) in curve.points() {
        assert!((0.0..=1.0).contains(&p), "P({tau}) = {p} out of range");
        if tau.abs() >= 30.0 {
            assert!(p > 0.494 && p <= 0.5, "P({tau}) = {p} not on the plateau");
        }
    }

    // Monotonic from the centre outwards.
    let probabilities = curve.probabilities();
    for i in 100..200 {
        assert!(probabilities[i + 1] >= probabilities[i]);
        assert!(probabilities[200 - i - 1] >= probabilities[200 - i]);
    }
}

#[test]
fn test_dip_is_symmetric() {
    let a = SpectralProfile::chirped_gaussian(1.0, 0.1, 25.0).unwrap();
    let curve = CurveBuilder::new(CurveConfig::default())
        .unwrap()
        .build_curve(&a, &a, &standard_sweep())
        .unwrap();
    let p = curve.probabilities();
    for i in 0..=100 {
        assert_abs_diff_eq!(p[i], p[200 - i], epsilon = 1e-12);
    }
}

#[test]
fn test_repeated_builds_are_identical() {
    let a = gaussian(1.0, 0.1);
    let b = gaussian(1.02, 0.12).with_correlation(0.4).unwrap();
    let builder = CurveBuilder::new(CurveConfig::default()).unwrap();
    let first = builder.build_curve(&a, &b, &standard_sweep()).unwrap();
    let second = builder.build_curve(&a, &b, &standard_sweep()).unwrap();
    assert_eq!(first.probabilities(), second.probabilities());
    assert_eq!(first, second);
}

// ─── Correlated photons ─────────────────────────────────────────────────────

#[test]
fn test_entanglement_reduces_visibility() {
    let r = 0.9;
    let pure = gaussian(1.0, 0.1);
    let entangled = pure.clone().with_correlation(r).unwrap();
    let builder = CurveBuilder::new(CurveConfig::default()).unwrap();

    let pure_curve = builder.build_curve(&pure, &pure, &standard_sweep()).unwrap();
    let entangled_curve = builder.build_curve(&entangled, &entangled, &standard_sweep()).unwrap();

    let (tau_min, p_min) = entangled_curve.minimum();
    eprintln!("r = {r}: P_min = {p_min:.6} at τ = {tau_min}");
    assert_abs_diff_eq!(tau_min, 0.0, epsilon = 1e-12);
    assert_relative_eq!(p_min, 0.5 * (1.0 - (1.0 - r * r).sqrt()), epsilon = 1e-10);
    assert!(p_min > pure_curve.minimum().1 + 0.2);
    assert_relative_eq!(entangled_curve.visibility(), (1.0 - r * r).sqrt(), epsilon = 1e-10);
}

// ─── Chirp and detuning ─────────────────────────────────────────────────────

#[test]
fn test_matched_chirp_leaves_dip_unchanged() {
    let builder = CurveBuilder::new(CurveConfig::default()).unwrap();
    let plain = gaussian(1.0, 0.1);
    let chirped = SpectralProfile::chirped_gaussian(1.0, 0.1, 60.0).unwrap();

    let reference = builder.build_curve(&plain, &plain, &standard_sweep()).unwrap();
    let matched = builder.build_curve(&chirped, &chirped, &standard_sweep()).unwrap();
    for (p, q) in reference.probabilities().iter().zip(matched.probabilities()) {
        assert_abs_diff_eq!(p, q, epsilon = 1e-12);
    }
}

#[test]
fn test_mismatched_chirp_reduces_visibility() {
    let builder = CurveBuilder::new(CurveConfig::default()).unwrap();
    let a = SpectralProfile::chirped_gaussian(1.0, 0.1, 60.0).unwrap();
    let b = SpectralProfile::chirped_gaussian(1.0, 0.1, -60.0).unwrap();
    let curve = builder.build_curve(&a, &b, &standard_sweep()).unwrap();

    // |Λ(0)|² = 1/√(1 + (Δβσ²/2)²) for a chirp difference Δβ.
    let x: f64 = 0.5 * 120.0 * 0.01;
    let expected = 0.5 * (1.0 - 1.0 / (1.0 + x * x).sqrt());
    assert_relative_eq!(curve.minimum().1, expected, epsilon = 1e-10);
    assert!(curve.visibility() < 0.9);
}

#[test]
fn test_detuned_gaussians_follow_closed_form() {
    let (sa, sb, detuning) = (0.1, 0.15, 0.05);
    let a = gaussian(1.0, sa);
    let b = gaussian(1.0 + detuning, sb);
    let curve = CurveBuilder::new(CurveConfig::default())
        .unwrap()
        .build_curve(&a, &b, &standard_sweep())
        .unwrap();

    let s2 = sa * sa + sb * sb;
    for (tau, p) in curve.points() {
        let expected = 0.5
            - sa * sb / s2 * (-sa * sa * sb * sb * tau * tau / s2).exp() * (-detuning * detuning / s2).exp();
        assert_abs_diff_eq!(p, expected, epsilon = 1e-12);
    }
}

// ─── Errors ─────────────────────────────────────────────────────────────────

#[test]
fn test_zero_bandwidth_is_invalid() {
    let err = SpectralProfile::gaussian(1.0, 0.0).unwrap_err();
    assert!(matches!(err, HomError::InvalidParameter { .. }), "{err}");
}

#[test]
fn test_empty_sweep_is_rejected() {
    assert!(matches!(DelaySweep::explicit(Vec::new()), Err(HomError::EmptySweep)));
    assert!(matches!(DelaySweep::uniform(-1.0, 1.0, 0), Err(HomError::EmptySweep)));
}

#[test]
fn test_impossible_tolerance_reports_delay() {
    let config = CurveConfig {
        integration_method: hom_core::IntegrationMethod::Quadrature,
        quadrature_tolerance: 1e-30,
        max_subdivisions: 8,
        ..CurveConfig::default()
    };
    let builder = CurveBuilder::with_backend(config, Arc::new(SerialBackend)).unwrap();
    let a = gaussian(1.0, 0.1);
    let sweep = DelaySweep::explicit(vec![5.0, 10.0, 20.0]).unwrap();

    let err = builder.build_curve(&a, &a, &sweep).unwrap_err();
    eprintln!("{err}");
    assert_eq!(err.delay(), Some(5.0));
    assert!(matches!(
        err.root(),
        HomError::IntegrationTolerance { tolerance, .. } if *tolerance == 1e-30
    ));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = CurveConfig {
        frequency_window_factor: -1.0,
        ..CurveConfig::default()
    };
    assert!(CurveBuilder::new(config).is_err());
}

// ─── Multi-mode profiles ────────────────────────────────────────────────────

#[test]
fn test_multimode_requires_opt_in() {
    let mode = |n| HermiteGauss::new(n, 1.0, 0.1, 0.0).unwrap();
    let multimode = SpectralProfile::schmidt(vec![
        SchmidtMode { weight: 0.7, function: mode(0) },
        SchmidtMode { weight: 0.3, function: mode(1) },
    ])
    .unwrap();
    let sweep = DelaySweep::centred(20.0, 9).unwrap();

    let err = CurveBuilder::new(CurveConfig::default())
        .unwrap()
        .build_curve(&multimode, &multimode, &sweep)
        .unwrap_err();
    assert!(matches!(err, HomError::InvalidParameter { name: "multimode", .. }));

    let config = CurveConfig {
        multimode: true,
        ..CurveConfig::default()
    };
    let curve = CurveBuilder::new(config)
        .unwrap()
        .build_curve(&multimode, &multimode, &sweep)
        .unwrap();
    // Purity 0.7² + 0.3² = 0.58.
    assert_relative_eq!(curve.minimum().1, 0.5 * (1.0 - 0.58), epsilon = 1e-8);
    assert!(curve.provenance().method.starts_with("quadrature"));
}

#[test]
fn test_overlapping_modes_dip_matches_purity() {
    let a = HermiteGauss::new(0, 1.0, 0.1, 0.0).unwrap();
    let b = HermiteGauss::new(0, 1.1, 0.1, 0.0).unwrap();
    let profile = SpectralProfile::schmidt(vec![
        SchmidtMode { weight: 0.5, function: a },
        SchmidtMode { weight: 0.5, function: b },
    ])
    .unwrap();
    let config = CurveConfig {
        multimode: true,
        ..CurveConfig::default()
    };
    let sweep = DelaySweep::explicit(vec![0.0]).unwrap();

    let curve = CurveBuilder::new(config)
        .unwrap()
        .build_curve(&profile, &profile, &sweep)
        .unwrap();
    let purity = profile.purity();
    assert!(purity > 0.5 && purity < 1.0);
    assert_relative_eq!(curve.probabilities()[0], 0.5 * (1.0 - purity), epsilon = 1e-8);
}

#[test]
fn test_schmidt_series_matches_correlated_gaussian() {
    let correlated = gaussian(1.0, 0.1).with_correlation(0.5).unwrap();
    let series = SpectralProfile::from(correlated.schmidt_decomposition(1e-12));
    let config = CurveConfig {
        multimode: true,
        ..CurveConfig::default()
    };
    let builder = CurveBuilder::new(config).unwrap();
    let sweep = DelaySweep::centred(30.0, 7).unwrap();

    let closed = builder.build_curve(&correlated, &correlated, &sweep).unwrap();
    let numeric = builder.build_curve(&series, &series, &sweep).unwrap();
    for (p, q) in closed.probabilities().iter().zip(numeric.probabilities()) {
        assert_abs_diff_eq!(p, q, epsilon = 1e-8);
    }
}

// ─── Backends and provenance ────────────────────────────────────────────────

#[test]
fn test_backends_agree() {
    let a = gaussian(1.0, 0.1);
    let b = SpectralProfile::chirped_gaussian(1.01, 0.1, 10.0).unwrap();
    let config = CurveConfig {
        integration_method: hom_core::IntegrationMethod::Quadrature,
        ..CurveConfig::default()
    };
    let serial = CurveBuilder::with_backend(config.clone(), Arc::new(SerialBackend)).unwrap();
    let parallel = CurveBuilder::with_backend(config, Arc::new(CpuBackend::with_threads(4))).unwrap();
    let sweep = DelaySweep::uniform(-30.0, 30.0, 41).unwrap();

    let s = serial.build_curve(&a, &b, &sweep).unwrap();
    let p = parallel.build_curve(&a, &b, &sweep).unwrap();
    assert_eq!(s.probabilities(), p.probabilities());
    assert_ne!(s.provenance().backend, p.provenance().backend);
}

#[test]
fn test_parallel_failure_reports_same_delay_as_serial() {
    let a = gaussian(1.0, 0.1);
    let config = CurveConfig {
        integration_method: hom_core::IntegrationMethod::Quadrature,
        max_subdivisions: 24,
        ..CurveConfig::default()
    };
    let sweep = DelaySweep::uniform(0.0, 2000.0, 400).unwrap();

    let serial = CurveBuilder::with_backend(config.clone(), Arc::new(SerialBackend)).unwrap();
    let expected = serial.build_curve(&a, &a, &sweep).unwrap_err().delay();
    assert!(expected.is_some());

    let parallel = CurveBuilder::with_backend(config, Arc::new(CpuBackend::with_threads(8))).unwrap();
    for _ in 0..10 {
        let err = parallel.build_curve(&a, &a, &sweep).unwrap_err();
        assert_eq!(err.delay(), expected);
    }
}

#[test]
fn test_curve_serialises_with_provenance() {
    let a = gaussian(1.0, 0.1);
    let curve = CurveBuilder::new(CurveConfig::default())
        .unwrap()
        .build_curve(&a, &a, &DelaySweep::centred(10.0, 5).unwrap())
        .unwrap();
    let json = serde_json::to_value(&curve).unwrap();

    assert_eq!(json["delays"].as_array().unwrap().len(), 5);
    assert_eq!(json["provenance"]["source"]["kind"], "independent");
    assert_eq!(json["provenance"]["source"]["photon_a"]["type"], "gaussian");
    assert_eq!(json["provenance"]["config"]["integration_method"], "analytic");
    assert_eq!(json["provenance"]["version"], env!("CARGO_PKG_VERSION"));
}
