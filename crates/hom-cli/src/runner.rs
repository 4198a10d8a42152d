//! Sweep runner: ties together photon sources, materials, and the curve builder.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use hom_compute::{ComputeBackend, CpuBackend, SerialBackend};
use hom_core::spectral::{ChirpedGaussian, Gaussian, HermiteGauss, SchmidtMode};
use hom_core::types::SourceDescription;
use hom_core::{CoincidenceCurve, CurveBuilder, DelaySweep, GridCache, JointSpectrum, SpectralProfile};
use hom_materials::units::{angular_frequency_from_wavelength, bandwidth_from_fwhm};
use hom_materials::SellmeierMedium;

use crate::config::{
    CrystalConfig, DelaySpec, JobConfig, PairConfig, PhotonConfig, SourceConfig,
    DEFAULT_SUGGESTED_POINTS,
};

/// A source resolved from the job file.
#[derive(Debug)]
pub enum Source {
    Independent(SpectralProfile, SpectralProfile),
    Pair(JointSpectrum),
}

impl Source {
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        match config {
            SourceConfig::Independent { photon_a, photon_b } => Ok(Source::Independent(
                build_photon("photon_a", photon_a)?,
                build_photon("photon_b", photon_b)?,
            )),
            SourceConfig::Pair(pair) => Ok(Source::Pair(build_pair(pair)?)),
        }
    }

    fn suggested_sweep(&self, points: usize) -> Result<DelaySweep> {
        let sweep = match self {
            Source::Independent(a, b) => DelaySweep::suggested_for(a, b, points)?,
            Source::Pair(pair) => DelaySweep::suggested_for_pair(pair, points)?,
        };
        Ok(sweep)
    }
}

/// Everything a run needs, checked up front.
pub struct PreparedJob {
    pub source: Source,
    pub sweep: DelaySweep,
    pub builder: CurveBuilder,
}

/// Resolve and validate a job without evaluating any delay.
pub fn prepare_job(job: &JobConfig) -> Result<PreparedJob> {
    let source = Source::from_config(&job.source)?;
    let sweep = build_sweep(job.delays.as_ref(), &source)?;
    let backend = create_backend(&job.simulation.backend, job.simulation.threads)?;
    let builder = CurveBuilder::with_backend(job.simulation.curve.clone(), backend)
        .context("Invalid [simulation] settings")?;
    Ok(PreparedJob { source, sweep, builder })
}

/// Run a full sweep from a parsed job configuration.
pub fn run_job(job: &JobConfig) -> Result<CoincidenceCurve> {
    let PreparedJob { source, sweep, builder } = prepare_job(job)?;
    let delays = sweep.values();
    println!(
        "Delays: {} points over [{:.4}, {:.4}]",
        sweep.len(),
        delays[0],
        delays[delays.len() - 1]
    );

    let curve = match &source {
        Source::Independent(a, b) => builder.build_curve(a, b, &sweep),
        Source::Pair(pair) => builder.build_pair_curve(pair, &sweep, &mut GridCache::new()),
    }
    .context("Coincidence sweep failed")?;

    let provenance = curve.provenance();
    println!("Method: {}", provenance.method);
    println!("Backend: {}", provenance.backend);
    let (tau, p_min) = curve.minimum();
    println!(
        "Minimum P = {:.6} at τ = {:.4} (visibility {:.4})",
        p_min,
        tau,
        curve.visibility()
    );
    for warning in curve.warnings() {
        eprintln!(
            "Warning: raw probability {:.3e} at τ = {} was clamped to [0, 1]",
            warning.raw, warning.delay
        );
    }

    Ok(curve)
}

/// Build a spectral profile from a photon table.
fn build_photon(name: &str, photon: &PhotonConfig) -> Result<SpectralProfile> {
    let omega0 = match (photon.omega0, photon.wavelength_nm) {
        (Some(omega0), None) => omega0,
        (None, Some(nm)) => angular_frequency_from_wavelength(nm),
        (Some(_), Some(_)) => {
            anyhow::bail!("{}: give either 'omega0' or 'wavelength_nm', not both", name)
        }
        (None, None) => anyhow::bail!("{}: requires 'omega0' or 'wavelength_nm'", name),
    };
    let bandwidth = match (photon.bandwidth, photon.fwhm_ps) {
        (Some(bandwidth), None) => bandwidth,
        (None, Some(fwhm)) => bandwidth_from_fwhm(fwhm),
        (Some(_), Some(_)) => {
            anyhow::bail!("{}: give either 'bandwidth' or 'fwhm_ps', not both", name)
        }
        (None, None) => anyhow::bail!("{}: requires 'bandwidth' or 'fwhm_ps'", name),
    };

    if let Some(modes) = &photon.schmidt {
        if photon.crystal.is_some() {
            anyhow::bail!("{}: a crystal cannot be combined with explicit Schmidt modes", name);
        }
        let modes = modes
            .iter()
            .map(|m| {
                let function = HermiteGauss::new(
                    m.order,
                    omega0,
                    m.width.unwrap_or(bandwidth),
                    m.chirp.unwrap_or(photon.chirp),
                )?;
                Ok(SchmidtMode { weight: m.weight, function })
            })
            .collect::<hom_core::Result<Vec<_>>>()
            .with_context(|| format!("{}: invalid Schmidt mode", name))?;
        let profile = SpectralProfile::schmidt(modes)
            .and_then(|p| p.with_correlation(photon.correlation))
            .with_context(|| format!("{}: invalid Schmidt profile", name))?;
        return Ok(profile);
    }

    let gaussian = Gaussian::new(omega0, bandwidth)
        .and_then(|g| g.with_correlation(photon.correlation))
        .with_context(|| format!("{}: invalid Gaussian parameters", name))?;
    let profile: SpectralProfile = match &photon.crystal {
        None if photon.chirp == 0.0 => gaussian.into(),
        None => ChirpedGaussian::from_gaussian(gaussian, photon.chirp)
            .with_context(|| format!("{}: invalid chirp", name))?
            .into(),
        Some(crystal) => {
            let medium = build_medium(crystal)?;
            let chirped = ChirpedGaussian::from_gaussian(gaussian, photon.chirp)
                .and_then(|g| g.propagate(&medium, crystal.length_m))
                .with_context(|| {
                    format!("{}: propagation through {} failed", name, crystal.material)
                })?;
            println!(
                "  {}: {} mm of {} gives total chirp {:.4e} ps²",
                name,
                crystal.length_m * 1e3,
                crystal.material,
                chirped.chirp()
            );
            chirped.into()
        }
    };
    Ok(profile)
}

/// Build a Sellmeier medium from a crystal table.
fn build_medium(crystal: &CrystalConfig) -> Result<SellmeierMedium> {
    match crystal.material.as_str() {
        "BBO_o" => Ok(SellmeierMedium::bbo_ordinary()),
        "BBO_e" => Ok(SellmeierMedium::bbo_extraordinary()),
        "custom" => {
            let coefficients = crystal
                .sellmeier
                .context("A custom crystal requires 'sellmeier = { a1, a2, a3, a4 }'")?;
            let medium = SellmeierMedium::new(
                "custom",
                coefficients,
                (crystal.range_nm[0], crystal.range_nm[1]),
            )?;
            Ok(medium)
        }
        other => anyhow::bail!(
            "Unknown crystal material '{}'. Valid identifiers: BBO_o, BBO_e, custom",
            other
        ),
    }
}

fn build_pair(pair: &PairConfig) -> Result<JointSpectrum> {
    let jsa = match (pair.wavelength_nm, pair.omega_signal, pair.omega_idler) {
        (Some(nm), None, None) => {
            JointSpectrum::from_lab_units(nm, pair.pulse_duration, pair.coherence_time)
        }
        (None, Some(signal), Some(idler)) => {
            JointSpectrum::new(signal, idler, pair.pulse_duration, pair.coherence_time)
        }
        _ => anyhow::bail!(
            "A pair source requires either 'wavelength_nm' or both 'omega_signal' and 'omega_idler'"
        ),
    };
    jsa.context("Invalid pair source parameters")
}

fn build_sweep(spec: Option<&DelaySpec>, source: &Source) -> Result<DelaySweep> {
    let sweep = match spec {
        Some(DelaySpec::Range { range, points }) => {
            DelaySweep::uniform(range[0], range[1], *points).context("Invalid [delays] range")?
        }
        Some(DelaySpec::List { values }) => {
            DelaySweep::explicit(values.clone()).context("Invalid [delays] values")?
        }
        Some(DelaySpec::Suggested { points }) => source.suggested_sweep(*points)?,
        None => source.suggested_sweep(DEFAULT_SUGGESTED_POINTS)?,
    };
    Ok(sweep)
}

/// Write a coincidence curve to a CSV file with a metadata header.
pub fn write_curve_csv(curve: &CoincidenceCurve, path: &Path) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::File::create(path)?;
    let provenance = curve.provenance();

    // Metadata header
    writeln!(file, "# HOM Coincidence Curve")?;
    writeln!(file, "# Version: {}", provenance.version)?;
    let kind = match &provenance.source {
        SourceDescription::Independent { .. } => "independent photons",
        SourceDescription::Pair { .. } => "pair source",
    };
    writeln!(file, "# source: {}", kind)?;
    writeln!(file, "# method: {}", provenance.method)?;
    writeln!(file, "# backend: {}", provenance.backend)?;
    writeln!(file, "# quadrature_tolerance: {:e}", provenance.config.quadrature_tolerance)?;
    writeln!(file, "# visibility: {:.6}", curve.visibility())?;
    for warning in curve.warnings() {
        writeln!(
            file,
            "# warning: raw probability {:.6e} clamped at delay {}",
            warning.raw, warning.delay
        )?;
    }
    writeln!(file, "#")?;
    writeln!(file, "delay,probability")?;

    for (delay, probability) in curve.points() {
        writeln!(file, "{:.6e},{:.9e}", delay, probability)?;
    }

    println!("Curve written to: {}", path.display());
    Ok(())
}

/// Write a coincidence curve, with provenance, to a JSON file.
pub fn write_curve_json(curve: &CoincidenceCurve, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(curve)
        .map_err(|e| anyhow::anyhow!("JSON serialisation error: {}", e))?;
    std::fs::write(path, json)?;

    println!("Curve (JSON) written to: {}", path.display());
    Ok(())
}

/// Create a compute backend from the user's preference string.
///
/// - `"cpu"` (default): Rayon, optionally on a dedicated pool of `threads`.
/// - `"serial"`: one delay at a time, in sweep order.
fn create_backend(preference: &str, threads: Option<usize>) -> Result<Arc<dyn ComputeBackend>> {
    let backend: Arc<dyn ComputeBackend> = match preference {
        "cpu" => match threads {
            Some(n) => Arc::new(CpuBackend::with_threads(n)),
            None => Arc::new(CpuBackend::new()),
        },
        "serial" => {
            if threads.is_some() {
                log::warn!("'threads' is ignored by the serial backend");
            }
            Arc::new(SerialBackend)
        }
        other => anyhow::bail!("Unknown backend '{}'. Valid backends: cpu, serial", other),
    };
    log::info!("backend: {}", backend.device_info().name);
    Ok(backend)
}
