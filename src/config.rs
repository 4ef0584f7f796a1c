use crate::map::{DEFAULT_CENTER, DEFAULT_FIT_PADDING, DEFAULT_ZOOM};
use crate::rain::DEFAULT_TICK;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings read from `config.toml`; every field has a default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path or http(s) URL of the place document
    pub source: String,
    pub loader: LoaderConfig,
    pub map: MapConfig,
    pub rain: RainConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Hold a successful load back this long before showing it
    pub min_latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// [lat, lng]
    pub center: [f64; 2],
    pub zoom: f64,
    /// GeoJSON drawn under the markers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basemap: Option<PathBuf>,
    /// Braille pixels kept around fitted markers
    pub fit_padding: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RainConfig {
    pub enabled: bool,
    pub tick_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Used when RUST_LOG is not set
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: "places.json".to_string(),
            loader: LoaderConfig::default(),
            map: MapConfig::default(),
            rain: RainConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { min_latency_ms: 500 }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: [DEFAULT_CENTER.lat, DEFAULT_CENTER.lng],
            zoom: DEFAULT_ZOOM,
            basemap: None,
            fit_padding: DEFAULT_FIT_PADDING,
        }
    }
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_ms: DEFAULT_TICK.as_millis() as u64,
            seed: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`. A
    /// missing file gives the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path(),
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("placemap")
            .join("config.toml")
    }

    /// Log file from the config, else `placemap.log` in the data dir
    pub fn log_path(&self) -> PathBuf {
        self.log.file.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("placemap")
                .join("placemap.log")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_round_trip() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "source = \"https://example.org/places.json\"\n[map]\nzoom = 14.0\n[rain]\nenabled = false"
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.source, "https://example.org/places.json");
        assert_eq!(config.map.zoom, 14.0);
        assert_eq!(config.map.center, [40.7580, -73.9855]);
        assert!(!config.rain.enabled);
        assert_eq!(config.rain.tick_ms, 50);
        assert_eq!(config.loader.min_latency_ms, 500);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(dir.path().join("nope.toml").as_path())).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[map\nzoom = ").unwrap();
        assert!(Config::load(Some(file.path())).is_err());
    }
}
