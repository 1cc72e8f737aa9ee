//! Configuration management for GraphCalibrate
//!
//! Axis bounds are stored in display units, exactly as a user types them.
//! Unit prefixes are resolved into multipliers when the settings are turned
//! into an [`AxisConfig`], never later.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::calibration::{AxisConfig, CalibrationRegion, PixelRegion};
use crate::transform::LogRepresentation;

/// Axis scale kind
///
/// Serialized as `"Linear"` / `"Logarithmic"`, the strings used by the
/// persisted `x_scale` / `y_scale` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScaleKind {
    #[default]
    Linear,
    /// Axis bounds are base-10 exponents (`-2` means 10^-2)
    Logarithmic,
}

impl ScaleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleKind::Linear => "Linear",
            ScaleKind::Logarithmic => "Logarithmic",
        }
    }

    pub fn is_logarithmic(&self) -> bool {
        matches!(self, ScaleKind::Logarithmic)
    }
}

impl fmt::Display for ScaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit prefix attached to an axis, e.g. `"u"` for micro or `"1e-6"`
///
/// Either an SI prefix symbol or a literal numeric factor. Anything that
/// does not resolve to a positive finite factor means "no prefix".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct UnitPrefix(String);

impl UnitPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Positive multiplicative factor for this prefix
    pub fn multiplier(&self) -> f64 {
        let raw = self.0.trim();
        let factor = match raw {
            "" => 1.0,
            "p" => 1e-12,
            "n" => 1e-9,
            "u" | "µ" | "μ" => 1e-6,
            "m" => 1e-3,
            "k" => 1e3,
            "M" => 1e6,
            "G" => 1e9,
            other => other.parse::<f64>().unwrap_or(1.0),
        };

        if factor.is_finite() && factor > 0.0 {
            factor
        } else {
            tracing::debug!("Unit prefix {:?} has no usable factor, using 1", raw);
            1.0
        }
    }
}

/// Per-axis settings in display units
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AxisSettings {
    #[serde(default)]
    pub scale: ScaleKind,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub unit: UnitPrefix,
}

impl Default for AxisSettings {
    fn default() -> Self {
        Self {
            scale: ScaleKind::Linear,
            min: 0.0,
            max: 100.0,
            unit: UnitPrefix::default(),
        }
    }
}

impl AxisSettings {
    /// Axis configuration carrying the prefix as a multiplier
    ///
    /// Bounds stay in display units; [`AxisConfig::resolve`] applies the
    /// multiplier.
    pub fn to_axis_config(&self) -> AxisConfig {
        AxisConfig::new(self.scale, self.min, self.max, self.unit.multiplier())
    }
}

/// The calibration rectangle as drawn, possibly with negative extents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct RegionSettings {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<RegionSettings> for PixelRegion {
    fn from(r: RegionSettings) -> Self {
        PixelRegion::new(r.x, r.y, r.width, r.height)
    }
}

impl From<PixelRegion> for RegionSettings {
    fn from(r: PixelRegion) -> Self {
        Self {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        }
    }
}

/// Calibration section: the drawn box and both axes
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CalibrationSettings {
    /// No box is drawn by default, so a fresh config is not yet usable
    #[serde(default)]
    pub region: RegionSettings,

    #[serde(default)]
    pub x_axis: AxisSettings,

    #[serde(default)]
    pub y_axis: AxisSettings,
}

impl CalibrationSettings {
    /// Build the calibration region, applying unit multipliers once
    pub fn to_region(&self) -> CalibrationRegion {
        CalibrationRegion::new(
            self.region.into(),
            self.x_axis.to_axis_config(),
            self.y_axis.to_axis_config(),
        )
    }
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportSettings {
    /// How values on logarithmic axes are stored and exported
    #[serde(default)]
    pub log_representation: LogRepresentation,

    /// Decimal places in CSV output
    #[serde(default = "default_precision")]
    pub precision: usize,
}

fn default_precision() -> usize {
    6
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            log_representation: LogRepresentation::default(),
            precision: default_precision(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub calibration: CalibrationSettings,

    #[serde(default)]
    pub export: ExportSettings,
}

impl Config {
    /// Load configuration from a file, or create default if it doesn't exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config from {:?}", path))?;
            tracing::info!("Loaded configuration from {:?}", path);
            Ok(config)
        } else {
            let config = Config::default();
            config.save(path)?;
            tracing::info!("Created default configuration at {:?}", path);
            Ok(config)
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory {:?}", parent))?;
            }
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}
