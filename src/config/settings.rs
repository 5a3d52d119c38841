//! Scan settings and paths.
//!
//! Settings live in an XDG-compliant config directory as JSON. A missing
//! file means defaults; command-line flags override whatever is loaded.

use crate::banner::DEFAULT_BANNER_CAP;
use crate::detect::{BannerDetector, DetectorKind};
use crate::error::{ConfigError, ConfigResult};
use crate::scanner::{ScanOptions, TcpProber, MAX_CONCURRENCY};
use crate::services::Service;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/hunt)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the platform directories. Nothing is created on disk.
    pub fn new() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "hunt", "hunt").ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// A user-supplied greeting rule, e.g. `{"service": "ftp", "pattern": "^220[ -]"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerPattern {
    pub service: Service,
    /// Regular expression matched against the raw banner bytes.
    pub pattern: String,
}

/// Everything that shapes a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// How long to wait for an unsolicited banner, in milliseconds.
    pub banner_timeout_ms: u64,
    /// Maximum banner bytes kept per port.
    pub banner_cap: usize,
    /// Write deadline for active detectors, in milliseconds.
    pub detector_write_timeout_ms: u64,
    /// Read deadline for active detectors, in milliseconds.
    pub detector_read_timeout_ms: u64,
    /// Maximum number of simultaneous probes.
    pub concurrency: usize,
    /// Detectors to run on open ports, in order.
    pub detectors: Vec<DetectorKind>,
    /// Extra banner rules, tried after the built-in detectors.
    pub banner_patterns: Vec<BannerPattern>,
    /// Fixed user agent for HTTP detection; random from a pool when unset.
    pub user_agent: Option<String>,
    /// Overall time budget for a scan, in milliseconds.
    pub scan_deadline_ms: Option<u64>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 1000,
            banner_timeout_ms: 1000,
            banner_cap: DEFAULT_BANNER_CAP,
            detector_write_timeout_ms: 5000,
            detector_read_timeout_ms: 1000,
            concurrency: 100,
            detectors: vec![DetectorKind::Http],
            banner_patterns: Vec::new(),
            user_agent: None,
            scan_deadline_ms: None,
        }
    }
}

impl ScanSettings {
    /// Load settings from the default location.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::new()?.settings_file();

        if !file.exists() {
            debug!(path = %file.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        settings.validate()?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Save settings to the default location.
    pub fn save(&self) -> ConfigResult<PathBuf> {
        let paths = Paths::new()?;
        fs::create_dir_all(&paths.config_dir).map_err(|e| ConfigError::WriteFailed {
            path: paths.config_dir.clone(),
            reason: e.to_string(),
        })?;

        let file = paths.settings_file();
        self.save_to(&file)?;
        Ok(file)
    }

    /// Save settings to a specific file.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Reject values no scan can run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::InvalidValue {
                field: "concurrency",
                reason: format!("must be between 1 and {}", MAX_CONCURRENCY),
            });
        }
        if self.banner_cap == 0 {
            return Err(ConfigError::InvalidValue {
                field: "banner_cap",
                reason: "must be greater than zero".to_string(),
            });
        }
        for rule in &self.banner_patterns {
            BannerDetector::new(rule.service, &rule.pattern)?;
        }
        if self.scan_deadline_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "scan_deadline_ms",
                reason: "must be greater than zero when set".to_string(),
            });
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn banner_timeout(&self) -> Duration {
        Duration::from_millis(self.banner_timeout_ms)
    }

    pub fn detector_write_timeout(&self) -> Duration {
        Duration::from_millis(self.detector_write_timeout_ms)
    }

    pub fn detector_read_timeout(&self) -> Duration {
        Duration::from_millis(self.detector_read_timeout_ms)
    }

    /// Prober configured from these settings, without detectors.
    pub fn prober(&self) -> TcpProber {
        TcpProber::new(self.connect_timeout())
            .with_banner_timeout(self.banner_timeout())
            .with_banner_cap(self.banner_cap)
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            concurrency: self.concurrency,
            scan_deadline: self.scan_deadline_ms.map(Duration::from_millis),
        }
    }
}
