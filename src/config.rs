//! Parameter files describing the SLM, the illuminating beam and the grating carrier.
//!
//! # Example TOML
//!
//! ```toml
//! [slm]
//! width = 15.36
//! height = 8.64
//! resX = 1920
//! resY = 1080
//! max_modulation = 82
//!
//! [incoming]
//! xoffset = 0
//! yoffset = 0
//! waist = 2.3
//!
//! [grating]
//! xperiod = 4
//! yperiod = -4
//! ```
//!
//! `[input]` is accepted as another name for the `[incoming]` section.

use crate::grid::GridParameters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Display geometry and calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlmSection {
    /// Physical width of the active area.
    pub width: f64,
    /// Physical height of the active area, same units as `width`.
    pub height: f64,
    #[serde(rename = "resX")]
    pub res_x: usize,
    #[serde(rename = "resY")]
    pub res_y: usize,
    /// Grey level corresponding to a 2π phase shift.
    #[serde(default = "default_max_modulation")]
    pub max_modulation: f64,
}

fn default_max_modulation() -> f64 {
    255.0
}

/// The beam illuminating the SLM, assumed to be a fundamental Gaussian.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingSection {
    /// Horizontal offset in pixels between the desired and incoming beams.
    #[serde(default)]
    pub xoffset: i64,
    /// Vertical offset in pixels between the desired and incoming beams.
    #[serde(default)]
    pub yoffset: i64,
    pub waist: f64,
}

/// Grating carrier periods, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GratingSection {
    pub xperiod: f64,
    pub yperiod: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlmConfig {
    pub slm: SlmSection,
    #[serde(alias = "input")]
    pub incoming: IncomingSection,
    pub grating: GratingSection,
}

impl SlmConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    pub fn grid_parameters(&self) -> GridParameters {
        GridParameters {
            width: self.slm.width,
            height: self.slm.height,
            res_x: self.slm.res_x,
            res_y: self.slm.res_y,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let slm = &self.slm;
        if !(slm.width > 0.0 && slm.height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "slm size must be positive, got {}x{}",
                slm.width, slm.height
            )));
        }
        if slm.res_x == 0 || slm.res_y == 0 {
            return Err(ConfigError::Invalid(format!(
                "slm resolution must be non-zero, got {}x{}",
                slm.res_x, slm.res_y
            )));
        }
        if !(slm.max_modulation > 0.0 && slm.max_modulation <= 255.0) {
            return Err(ConfigError::Invalid(format!(
                "max_modulation must be in (0, 255], got {}",
                slm.max_modulation
            )));
        }
        if !(self.incoming.waist > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "waist must be positive, got {}",
                self.incoming.waist
            )));
        }
        let g = &self.grating;
        if !(g.xperiod.is_finite() && g.yperiod.is_finite()) || g.xperiod == 0.0 || g.yperiod == 0.0
        {
            return Err(ConfigError::Invalid(format!(
                "grating periods must be finite and non-zero, got ({}, {})",
                g.xperiod, g.yperiod
            )));
        }
        Ok(())
    }
}

impl FromStr for SlmConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        let config: SlmConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
[slm]
width = 10.0
height = 10.0
resX = 100
resY = 100
max_modulation = 255

[incoming]
xoffset = 0
yoffset = 0
waist = 1.0

[grating]
xperiod = 10
yperiod = 10
"#;

    #[test]
    fn parse_example() {
        let config: SlmConfig = EXAMPLE.parse().expect("should parse");
        assert_eq!(config.slm.res_x, 100);
        assert_eq!(config.slm.max_modulation, 255.0);
        assert_eq!(config.incoming.waist, 1.0);
        assert_eq!(config.grating.xperiod, 10.0);
        assert_eq!(
            config.grid_parameters(),
            GridParameters {
                width: 10.0,
                height: 10.0,
                res_x: 100,
                res_y: 100
            }
        );
    }

    #[test]
    fn input_is_an_alias_of_incoming() {
        let content = EXAMPLE.replace("[incoming]\nxoffset = 0", "[input]\nxoffset = 3");
        let config: SlmConfig = content.parse().expect("should parse");
        assert_eq!(config.incoming.xoffset, 3);
    }

    #[test]
    fn defaults() {
        let content = r#"
[slm]
width = 1.0
height = 2.0
resX = 10
resY = 20

[incoming]
waist = 0.5

[grating]
xperiod = 4
yperiod = -4
"#;
        let config: SlmConfig = content.parse().expect("should parse");
        assert_eq!(config.slm.max_modulation, 255.0);
        assert_eq!((config.incoming.xoffset, config.incoming.yoffset), (0, 0));
        assert_eq!(config.grating.yperiod, -4.0);
    }

    #[test]
    fn invalid_values() {
        let content = EXAMPLE.replace("max_modulation = 255", "max_modulation = 300");
        assert!(matches!(content.parse::<SlmConfig>(), Err(ConfigError::Invalid(_))));

        let content = EXAMPLE.replace("waist = 1.0", "waist = 0.0");
        assert!(matches!(content.parse::<SlmConfig>(), Err(ConfigError::Invalid(_))));

        let content = EXAMPLE.replace("xperiod = 10", "xperiod = 0");
        assert!(matches!(content.parse::<SlmConfig>(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_section() {
        let content = EXAMPLE.replace("[grating]\nxperiod = 10\nyperiod = 10\n", "");
        assert!(matches!(content.parse::<SlmConfig>(), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            SlmConfig::from_file("/definitely/not/here.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
