//! User-selectable processing options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How foreground pixels of the screenshot are recolored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Force every foreground pixel to pure white.
    #[default]
    White,
    /// Keep original colors, darkening dark pixels for contrast.
    Black,
}

/// Tuning preset for content detection and overlay sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropSensitivity {
    /// Dark pixels only, top-region priority, symmetric margins.
    #[default]
    Standard,
    /// Dark or colored pixels, top and bottom priority, asymmetric margins.
    Extended,
}

/// Error returned when parsing an unknown option name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}', expected one of: {expected}")]
pub struct ParseOptionError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

impl FromStr for ColorMode {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Ok(Self::White),
            "black" => Ok(Self::Black),
            _ => Err(ParseOptionError {
                kind: "color mode",
                value: s.to_string(),
                expected: "white, black",
            }),
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => f.write_str("white"),
            Self::Black => f.write_str("black"),
        }
    }
}

impl FromStr for CropSensitivity {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "extended" => Ok(Self::Extended),
            _ => Err(ParseOptionError {
                kind: "crop sensitivity",
                value: s.to_string(),
                expected: "standard, extended",
            }),
        }
    }
}

impl fmt::Display for CropSensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Extended => f.write_str("extended"),
        }
    }
}
