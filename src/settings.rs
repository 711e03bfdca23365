//! Conversion settings with persistence
//!
//! Settings are read from `~/.config/meshpack/settings.toml` unless a file
//! is given with `--config`. Command-line flags override file values.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use meshpack_assets::PostProcess;
use meshpack_format::IndexRebase;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cli::CliArgs;

/// All conversion settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertSettings {
    pub import: ImportSettings,
    pub export: ExportSettings,
    pub report: ReportSettings,
}

impl ConvertSettings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("meshpack"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from the default location, or return defaults if the
    /// file is missing or unusable
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };

        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Load settings from an explicitly requested file. Unlike `load`, any
    /// problem with the file is an error.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {:?}", path))?;
        let settings = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse settings file {:?}", path))?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Resolve settings for a run: the `--config` file if given, otherwise
    /// the default location, then command-line overrides.
    pub fn resolve(args: &CliArgs) -> anyhow::Result<Self> {
        let mut settings = match &args.config {
            Some(path) => Self::load_from(path)?,
            None => Self::load(),
        };
        settings.apply_overrides(args);
        Ok(settings)
    }

    /// Apply command-line flags on top of file settings
    pub fn apply_overrides(&mut self, args: &CliArgs) {
        if let Some(rebase) = args.index_rebase {
            self.export.index_rebase = rebase;
        }
        if args.no_report {
            self.report.enabled = false;
        }
    }
}

/// Import post-processing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Split polygons into triangles
    pub triangulate: bool,
    /// Merge vertices with identical attributes
    pub join_identical_vertices: bool,
    /// Split meshes that mix points, lines and triangles
    pub sort_by_primitive_type: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            triangulate: true,
            join_identical_vertices: true,
            sort_by_primitive_type: true,
        }
    }
}

impl ImportSettings {
    pub fn post_process(&self) -> PostProcess {
        PostProcess {
            triangulate: self.triangulate,
            join_identical_vertices: self.join_identical_vertices,
            sort_by_primitive_type: self.sort_by_primitive_type,
        }
    }
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Offset applied to face indices when flattening
    pub index_rebase: IndexRebase,
    /// Write through a temporary file and rename on success
    pub atomic_write: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            index_rebase: IndexRebase::IndexBase,
            atomic_write: true,
        }
    }
}

/// Console report settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Print the report after flattening
    pub enabled: bool,
    pub format: ReportFormat,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            format: ReportFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}
