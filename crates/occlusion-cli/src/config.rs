//! Tool configuration – reads `~/.occlusion/config.toml`.
//!
//! Every field is optional in the file; missing fields take the defaults
//! below.  `OCCLUSION_*` environment variables are applied on top of the
//! file, and command-line flags on top of both.

use occlusion_core::DetectorConfig;
use occlusion_core::config::DEFAULT_NEAR_MAX_TOLERANCE;
use occlusion_records::{AngleSettings, OutputFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted configuration of the `occlusion-detect` tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    #[serde(default = "default_min_segment_beams")]
    pub min_segment_beams: usize,

    #[serde(default = "default_gap_merge_beams")]
    pub gap_merge_beams: usize,

    #[serde(default = "default_drift_tolerance_beams")]
    pub drift_tolerance_beams: usize,

    #[serde(default = "default_persistence_threshold")]
    pub persistence_threshold: f64,

    #[serde(default = "default_min_occlusion_width_deg")]
    pub min_occlusion_width_deg: f64,

    /// Tabular scans spell out missing returns as `inf`, so max-range
    /// readings are kept as valid unless asked otherwise.
    #[serde(default)]
    pub treat_near_max_as_invalid: bool,

    #[serde(default = "default_near_max_tolerance")]
    pub near_max_tolerance: f64,

    /// Bearing of `lidar_0` (degrees).
    #[serde(default = "default_angle_min_deg")]
    pub angle_min_deg: f64,

    /// Angle covered by all beam columns (degrees).
    #[serde(default = "default_angle_span_deg")]
    pub angle_span_deg: f64,

    #[serde(default)]
    pub output_format: OutputFormat,
}

fn default_history_size() -> usize {
    30
}
fn default_min_segment_beams() -> usize {
    5
}
fn default_gap_merge_beams() -> usize {
    2
}
fn default_drift_tolerance_beams() -> usize {
    3
}
fn default_persistence_threshold() -> f64 {
    0.7
}
fn default_min_occlusion_width_deg() -> f64 {
    5.0
}
fn default_near_max_tolerance() -> f64 {
    DEFAULT_NEAR_MAX_TOLERANCE
}
fn default_angle_min_deg() -> f64 {
    -180.0
}
fn default_angle_span_deg() -> f64 {
    360.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            min_segment_beams: default_min_segment_beams(),
            gap_merge_beams: default_gap_merge_beams(),
            drift_tolerance_beams: default_drift_tolerance_beams(),
            persistence_threshold: default_persistence_threshold(),
            min_occlusion_width_deg: default_min_occlusion_width_deg(),
            treat_near_max_as_invalid: false,
            near_max_tolerance: default_near_max_tolerance(),
            angle_min_deg: default_angle_min_deg(),
            angle_span_deg: default_angle_span_deg(),
            output_format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// The detector part of the configuration.  Validation happens when the
    /// detector is built.
    pub fn detector(&self) -> DetectorConfig {
        DetectorConfig {
            history_size: self.history_size,
            min_segment_beams: self.min_segment_beams,
            gap_merge_beams: self.gap_merge_beams,
            drift_tolerance_beams: self.drift_tolerance_beams,
            persistence_threshold: self.persistence_threshold,
            min_occlusion_width_deg: self.min_occlusion_width_deg,
            treat_near_max_as_invalid: self.treat_near_max_as_invalid,
            near_max_tolerance: self.near_max_tolerance,
        }
    }

    pub fn angles(&self) -> AngleSettings {
        AngleSettings {
            angle_min_deg: self.angle_min_deg,
            angle_span_deg: self.angle_span_deg,
        }
    }
}

/// Return the path to `~/.occlusion/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".occlusion").join("config.toml")
}

/// Load the config from `path`, or from [`config_path`] when `None`.
///
/// A missing default file yields the defaults; a missing explicit file is an
/// error.  Environment overrides are applied in both cases.
pub fn load(path: Option<&Path>) -> Result<Config, String> {
    let mut cfg = match path {
        Some(p) => load_from(p)?.ok_or_else(|| format!("Config file {} not found", p.display()))?,
        None => load_from(&config_path())?.unwrap_or_default(),
    };
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Parse the config at `path`.  Returns `None` if the file does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `OCCLUSION_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `OCCLUSION_HISTORY_SIZE` | `history_size` |
/// | `OCCLUSION_MIN_SEGMENT_BEAMS` | `min_segment_beams` |
/// | `OCCLUSION_GAP_MERGE_BEAMS` | `gap_merge_beams` |
/// | `OCCLUSION_DRIFT_TOLERANCE_BEAMS` | `drift_tolerance_beams` |
/// | `OCCLUSION_PERSISTENCE_THRESHOLD` | `persistence_threshold` |
/// | `OCCLUSION_MIN_WIDTH_DEG` | `min_occlusion_width_deg` |
/// | `OCCLUSION_TREAT_NEAR_MAX_AS_INVALID` | `treat_near_max_as_invalid` (`true`/`false`/`1`/`0`) |
/// | `OCCLUSION_ANGLE_MIN_DEG` | `angle_min_deg` |
/// | `OCCLUSION_ANGLE_SPAN_DEG` | `angle_span_deg` |
/// | `OCCLUSION_OUTPUT_FORMAT` | `output_format` |
///
/// Values that fail to parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Some(v) = env_parse("OCCLUSION_HISTORY_SIZE") {
        cfg.history_size = v;
    }
    if let Some(v) = env_parse("OCCLUSION_MIN_SEGMENT_BEAMS") {
        cfg.min_segment_beams = v;
    }
    if let Some(v) = env_parse("OCCLUSION_GAP_MERGE_BEAMS") {
        cfg.gap_merge_beams = v;
    }
    if let Some(v) = env_parse("OCCLUSION_DRIFT_TOLERANCE_BEAMS") {
        cfg.drift_tolerance_beams = v;
    }
    if let Some(v) = env_parse("OCCLUSION_PERSISTENCE_THRESHOLD") {
        cfg.persistence_threshold = v;
    }
    if let Some(v) = env_parse("OCCLUSION_MIN_WIDTH_DEG") {
        cfg.min_occlusion_width_deg = v;
    }
    if let Some(v) = env_flag("OCCLUSION_TREAT_NEAR_MAX_AS_INVALID") {
        cfg.treat_near_max_as_invalid = v;
    }
    if let Some(v) = env_parse("OCCLUSION_ANGLE_MIN_DEG") {
        cfg.angle_min_deg = v;
    }
    if let Some(v) = env_parse("OCCLUSION_ANGLE_SPAN_DEG") {
        cfg.angle_span_deg = v;
    }
    if let Some(v) = env_parse("OCCLUSION_OUTPUT_FORMAT") {
        cfg.output_format = v;
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.trim().parse().ok()
}

fn env_flag(name: &str) -> Option<bool> {
    match std::env::var(name).ok()?.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
