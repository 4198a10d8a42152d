//! TOML configuration deserialisation for sweep jobs.

use serde::Deserialize;

use hom_core::CurveConfig;
use hom_materials::sellmeier::SellmeierCoefficients;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Omitted: ±5 coherence times, [`DEFAULT_SUGGESTED_POINTS`] delays.
    #[serde(default)]
    pub delays: Option<DelaySpec>,
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Number of delays in a suggested sweep.
pub const DEFAULT_SUGGESTED_POINTS: usize = 201;

/// Integration settings plus the execution backend.
#[derive(Debug, Deserialize)]
pub struct SimulationConfig {
    #[serde(flatten)]
    pub curve: CurveConfig,
    /// Compute backend: "cpu" or "serial". Default: "cpu".
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Worker threads for the CPU backend (default: all cores).
    #[serde(default)]
    pub threads: Option<usize>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            curve: CurveConfig::default(),
            backend: default_backend(),
            threads: None,
        }
    }
}

fn default_backend() -> String {
    "cpu".into()
}

/// Delay specification: a range, an explicit list, or just a point count
/// for the suggested span.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DelaySpec {
    Range { range: [f64; 2], points: usize },
    List { values: Vec<f64> },
    Suggested { points: usize },
}

/// What is being interfered.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Two photons from separate sources.
    Independent {
        photon_a: PhotonConfig,
        photon_b: PhotonConfig,
    },
    /// Signal and idler of one down-conversion source.
    Pair(PairConfig),
}

/// A single photon. The centre is given either as `omega0` (angular units)
/// or `wavelength_nm`; the width as `bandwidth` or `fwhm_ps`.
#[derive(Debug, Deserialize)]
pub struct PhotonConfig {
    #[serde(default)]
    pub omega0: Option<f64>,
    #[serde(default)]
    pub wavelength_nm: Option<f64>,
    #[serde(default)]
    pub bandwidth: Option<f64>,
    #[serde(default)]
    pub fwhm_ps: Option<f64>,
    #[serde(default)]
    pub chirp: f64,
    #[serde(default)]
    pub correlation: f64,
    /// Dispersive element the photon passes through before the beamsplitter.
    #[serde(default)]
    pub crystal: Option<CrystalConfig>,
    /// Explicit Hermite-Gauss Schmidt modes around the photon centre.
    #[serde(default)]
    pub schmidt: Option<Vec<ModeConfig>>,
}

/// One Hermite-Gauss Schmidt mode. Width and chirp default to the photon's.
#[derive(Debug, Deserialize)]
pub struct ModeConfig {
    pub weight: f64,
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub chirp: Option<f64>,
}

/// A length of dispersive crystal, either a preset or custom Sellmeier
/// coefficients.
#[derive(Debug, Deserialize)]
pub struct CrystalConfig {
    /// Preset identifier ("BBO_o", "BBO_e") or "custom".
    #[serde(default = "default_material")]
    pub material: String,
    /// Propagation length in metres.
    pub length_m: f64,
    /// Required when `material = "custom"`.
    #[serde(default)]
    pub sellmeier: Option<SellmeierCoefficients>,
    /// Validity range for custom coefficients (nm).
    #[serde(default = "default_range_nm")]
    pub range_nm: [f64; 2],
}

fn default_material() -> String {
    "custom".into()
}
fn default_range_nm() -> [f64; 2] {
    [200.0, 3000.0]
}

/// Double-Gaussian JSA parameters. Give `wavelength_nm` for a degenerate
/// pair in lab units, or `omega_signal` and `omega_idler`.
#[derive(Debug, Deserialize)]
pub struct PairConfig {
    #[serde(default)]
    pub wavelength_nm: Option<f64>,
    #[serde(default)]
    pub omega_signal: Option<f64>,
    #[serde(default)]
    pub omega_idler: Option<f64>,
    pub pulse_duration: f64,
    pub coherence_time: f64,
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Whether to save the curve as CSV (default: true).
    #[serde(default = "default_true")]
    pub save_csv: bool,
    /// Whether to also save the curve and provenance as JSON (default: false).
    #[serde(default)]
    pub save_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            save_csv: true,
            save_json: false,
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}
fn default_true() -> bool {
    true
}

/// Parse a TOML job configuration.
pub fn parse_config(content: &str) -> anyhow::Result<JobConfig> {
    let config: JobConfig = toml::from_str(content)?;
    Ok(config)
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}
