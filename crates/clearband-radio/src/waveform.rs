//! Waveform kinds a transmit source can generate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::params::ConfigError;

/// Signal source waveform.
///
/// The closed set of kinds the transmit chain knows how to generate. An
/// unrecognized kind is a hard validation failure at the parse boundary,
/// so a config holding a `Waveform` is already legal in this respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Waveform {
    Constant,
    Cosine,
    Square,
    Triangle,
    Sawtooth,
    Sine,
}

impl Waveform {
    /// All recognized kinds, in wire order.
    pub const ALL: [Waveform; 6] = [
        Waveform::Constant,
        Waveform::Cosine,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::Sawtooth,
        Waveform::Sine,
    ];

    /// Wire spelling of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Constant => "CONSTANT",
            Self::Cosine => "COSINE",
            Self::Square => "SQUARE",
            Self::Triangle => "TRIANGLE",
            Self::Sawtooth => "SAWTOOTH",
            Self::Sine => "SINE",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Waveform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONSTANT" => Ok(Self::Constant),
            "COSINE" => Ok(Self::Cosine),
            "SQUARE" => Ok(Self::Square),
            "TRIANGLE" => Ok(Self::Triangle),
            "SAWTOOTH" => Ok(Self::Sawtooth),
            "SINE" => Ok(Self::Sine),
            other => Err(ConfigError::UnknownWaveform(other.to_string())),
        }
    }
}
