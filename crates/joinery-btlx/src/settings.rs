//! Derivation and output settings.

use crate::ConfigError;
use joinery_kernel_math::Tolerance;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Dovetail cutter used for dovetail tenons and mortises.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DovetailTool {
    /// Flank angle in degrees.
    pub angle: f64,
    /// Cutter diameter in mm.
    pub diameter: f64,
    /// Usable cutting height in mm.
    pub height: f64,
}

impl DovetailTool {
    /// Corner radius left by the cutter.
    pub fn radius(&self) -> f64 {
        self.diameter * 0.5
    }
}

impl Default for DovetailTool {
    fn default() -> Self {
        Self {
            angle: 15.0,
            diameter: 60.0,
            height: 28.0,
        }
    }
}

/// Settings shared by every derivation.
///
/// ```toml
/// precision = 3
///
/// [tolerance]
/// linear = 1e-6
/// angular = 1e-9
///
/// [dovetail_tool]
/// angle = 15.0
/// diameter = 60.0
/// height = 28.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BtlxSettings {
    /// Fractional digits of formatted floats.
    pub precision: usize,
    /// Geometric comparison tolerance.
    pub tolerance: Tolerance,
    /// Cutter for dovetail features.
    pub dovetail_tool: DovetailTool,
}

impl Default for BtlxSettings {
    fn default() -> Self {
        Self {
            precision: 3,
            tolerance: Tolerance::DEFAULT,
            dovetail_tool: DovetailTool::default(),
        }
    }
}

impl BtlxSettings {
    /// Parse settings from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.precision > 12 {
            return Err(ConfigError::Invalid {
                field: "precision",
                reason: format!("{} fractional digits (at most 12)", self.precision),
            });
        }
        let tool = &self.dovetail_tool;
        if !(5.0..=35.0).contains(&tool.angle) {
            return Err(ConfigError::Invalid {
                field: "dovetail_tool.angle",
                reason: format!("{} is outside [5, 35]", tool.angle),
            });
        }
        if !(tool.diameter > 0.0 && tool.height > 0.0) {
            return Err(ConfigError::Invalid {
                field: "dovetail_tool",
                reason: "diameter and height must be positive".to_string(),
            });
        }
        if !(self.tolerance.linear > 0.0 && self.tolerance.angular > 0.0) {
            return Err(ConfigError::Invalid {
                field: "tolerance",
                reason: "tolerances must be positive".to_string(),
            });
        }
        Ok(())
    }
}
