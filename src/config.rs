use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::animator::DEFAULT_BATCH_FRACTION;
use crate::catalog::ImageCatalog;
use crate::error::ConfigError;
use crate::palette::PaletteMapping;
use crate::sampler::{ImageSource, Sampler};

pub const DEFAULT_ROWS: usize = 60;
pub const DEFAULT_COLS: usize = 140;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;
pub const DEFAULT_ROTATION_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 10_000;

/// Backdrop settings as read from YAML.
///
/// ```yaml
/// rows: 60
/// cols: 140
/// tick_interval_ms: 50
/// rotation_interval_ms: 5000
/// images:
///   - https://example.com/one.jpeg
///   - art/two.png
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackdropConfig {
    #[serde(default = "default_rows")]
    pub rows: usize,
    #[serde(default = "default_cols")]
    pub cols: usize,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_rotation_interval_ms")]
    pub rotation_interval_ms: u64,
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,
    #[serde(default = "default_batch_fraction")]
    pub batch_fraction: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub invert: bool,
    #[serde(default)]
    pub images: Vec<String>,
    /// Directory relative image paths resolve against. Set by the loader.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

fn default_rows() -> usize {
    DEFAULT_ROWS
}

fn default_cols() -> usize {
    DEFAULT_COLS
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_rotation_interval_ms() -> u64 {
    DEFAULT_ROTATION_INTERVAL_MS
}

fn default_load_timeout_ms() -> u64 {
    DEFAULT_LOAD_TIMEOUT_MS
}

fn default_batch_fraction() -> f64 {
    DEFAULT_BATCH_FRACTION
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            rotation_interval_ms: DEFAULT_ROTATION_INTERVAL_MS,
            load_timeout_ms: DEFAULT_LOAD_TIMEOUT_MS,
            batch_fraction: DEFAULT_BATCH_FRACTION,
            seed: None,
            invert: false,
            images: Vec::new(),
            base_dir: None,
        }
    }
}

impl BackdropConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::ZeroDimension {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("tick_interval_ms"));
        }
        if self.rotation_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("rotation_interval_ms"));
        }
        if self.load_timeout_ms == 0 {
            return Err(ConfigError::ZeroInterval("load_timeout_ms"));
        }
        if !(self.batch_fraction > 0.0 && self.batch_fraction <= 1.0) {
            return Err(ConfigError::BatchFraction(self.batch_fraction));
        }
        self.catalog().map(|_| ())
    }

    pub fn catalog(&self) -> Result<ImageCatalog, ConfigError> {
        let sources = self
            .images
            .iter()
            .map(|raw| ImageSource::parse(raw, self.base_dir.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;
        ImageCatalog::new(sources)
    }

    pub fn sampler(&self) -> Sampler {
        Sampler::new(self.rows, self.cols)
            .with_mapping(PaletteMapping::from_invert(self.invert))
            .with_timeout(self.load_timeout())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn rotation_interval(&self) -> Duration {
        Duration::from_millis(self.rotation_interval_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

pub fn parse_config(contents: &str, path: &Path) -> Result<BackdropConfig, ConfigError> {
    let mut config: BackdropConfig =
        serde_yaml::from_str(contents).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            location: error
                .location()
                .map(|location| format!("line {}, column {}", location.line(), location.column()))
                .unwrap_or_else(|| "unknown location".to_owned()),
            message: error.to_string(),
        })?;
    config.base_dir = Some(
        path.parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
    );
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<BackdropConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|error| ConfigError::Read {
        path: path.to_path_buf(),
        error,
    })?;
    parse_config(&contents, path)
}

pub fn load_and_validate_config(path: &Path) -> Result<BackdropConfig, ConfigError> {
    let config = load_config(path)?;
    config.validate()?;
    Ok(config)
}
