//! RON configuration for a scan.
//!
//! Every field has a default, so a config file only lists what it overrides.
//! Secrets never live here; they come from flags or the environment.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use scout_engine::{
    ExtractorSelectors, PacingSettings, RelaySettings, ScanSettings, SiteSettings,
    WebDriverSettings, DEFAULT_MAX_ROUNDS,
};
use scout_logging::{LogDestination, DEFAULT_LOG_FILE};
use serde::Deserialize;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "lead_scout.ron";

pub const DEFAULT_TERMS: [&str; 10] = [
    "pool cleaning",
    "window washing",
    "bin cleaning",
    "lawn care",
    "spa cleaning",
    "pest control",
    "exterminator",
    "pressure washing",
    "house cleaning",
    "gutter cleaning",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub destination: LogDestination,
    pub file: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            destination: LogDestination::Both,
            file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NotifierSettings {
    /// Base URL of the filter/notify/report webhook; `None` logs only.
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub terms: Vec<String>,
    pub max_rounds: u32,
    pub output_dir: PathBuf,
    /// Program and arguments run when the browser cannot be quit cleanly.
    pub force_kill: Option<Vec<String>>,
    pub log: LogSettings,
    pub notifier: NotifierSettings,
    pub webdriver: WebDriverSettings,
    pub relay: RelaySettings,
    pub pacing: PacingSettings,
    pub site: SiteSettings,
    pub extractor: ExtractorSelectors,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            terms: DEFAULT_TERMS.iter().map(|t| t.to_string()).collect(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            output_dir: PathBuf::from("."),
            force_kill: ScanSettings::default().force_kill,
            log: LogSettings::default(),
            notifier: NotifierSettings::default(),
            webdriver: WebDriverSettings::default(),
            relay: RelaySettings::default(),
            pacing: PacingSettings::default(),
            site: SiteSettings::default(),
            extractor: ExtractorSelectors::default(),
        }
    }
}

impl AppConfig {
    pub fn from_ron(text: &str) -> Result<Self> {
        let config = ron::from_str(text).context("invalid RON configuration")?;
        Ok(config)
    }

    /// Loads `path` when given; it must exist. Without a path the default
    /// file is used if present, otherwise built-in defaults apply.
    ///
    /// Runs before the logger is up, so problems surface as errors only.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()));
            }
        };

        Self::from_ron(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            max_rounds: self.max_rounds,
            force_kill: self.force_kill.clone(),
        }
    }
}
