use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_clip_seconds")]
    pub clip_seconds: f32,
}

/// Transcription thresholds. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,
    #[serde(default = "default_hop_size")]
    pub hop_size: usize,
    #[serde(default = "default_low_hz")]
    pub low_hz: f64,
    #[serde(default = "default_high_hz")]
    pub high_hz: f64,
    #[serde(default = "default_filter_order")]
    pub filter_order: usize,
    #[serde(default = "default_clarity_threshold")]
    pub clarity_threshold: f64,
    #[serde(default = "default_energy_fraction")]
    pub energy_fraction: f64,
    #[serde(default = "default_median_window")]
    pub median_window: usize,
    #[serde(default = "default_min_note_frames")]
    pub min_note_frames: usize,
    #[serde(default = "default_min_midi")]
    pub min_midi: i32,
    #[serde(default = "default_max_midi")]
    pub max_midi: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            clip_seconds: default_clip_seconds(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_size: default_frame_size(),
            hop_size: default_hop_size(),
            low_hz: default_low_hz(),
            high_hz: default_high_hz(),
            filter_order: default_filter_order(),
            clarity_threshold: default_clarity_threshold(),
            energy_fraction: default_energy_fraction(),
            median_window: default_median_window(),
            min_note_frames: default_min_note_frames(),
            min_midi: default_min_midi(),
            max_midi: default_max_midi(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_sample_rate() -> u32 { 44100 }
fn default_clip_seconds() -> f32 { 5.0 }
fn default_frame_size() -> usize { 4096 }
fn default_hop_size() -> usize { 2048 }
fn default_low_hz() -> f64 { 80.0 }
fn default_high_hz() -> f64 { 1200.0 }
fn default_filter_order() -> usize { 4 }
fn default_clarity_threshold() -> f64 { 0.7 }
fn default_energy_fraction() -> f64 { 0.01 }
fn default_median_window() -> usize { 5 }
fn default_min_note_frames() -> usize { 3 }
fn default_min_midi() -> i32 { 47 }
fn default_max_midi() -> i32 { 64 }
fn default_max_attempts() -> u32 { 3 }
fn default_backoff_ms() -> u64 { 100 }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::warn!("Invalid config {}: {}", path.display(), err);
            None
        }
    }
}

/// Explicit path first, then `./melodex.toml`, then the per-user config dirs.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("melodex.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("melodex").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("melodex").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
