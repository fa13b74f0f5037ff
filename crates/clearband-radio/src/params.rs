//! Radio configuration types, hard validation, and the clamping policy.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::waveform::Waveform;

/// Lower transmit gain limit of the supported hardware.
pub const TX_GAIN_MIN_DB: f64 = 0.0;
/// Upper transmit gain limit of the supported hardware.
pub const TX_GAIN_MAX_DB: f64 = 31.5;
/// Lower bound for the signal source amplitude (transmitter off).
pub const SOURCE_AMPLITUDE_MIN: f64 = 0.0;
/// Upper bound for the signal source amplitude (full scale).
pub const SOURCE_AMPLITUDE_MAX: f64 = 1.0;
/// Default number of FFT power bins probed from the receive chain.
pub const DEFAULT_SPECTRUM_BINS: usize = 1024;

/// A radio configuration the hardware cannot accept.
///
/// These are hard failures: the offending value is nonsensical for any
/// device, so no controller is created. Out-of-range-but-meaningful values
/// (gain and amplitude on a TX/RX chain) go through the clamping policy
/// instead and never produce one of these.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("center frequency must be positive, got {0} Hz")]
    NonPositiveFrequency(f64),

    #[error("bandwidth must be positive, got {0} Hz")]
    NonPositiveBandwidth(f64),

    #[error("gain must be non-negative, got {0} dB")]
    NegativeGain(f64),

    #[error("source amplitude must be non-negative, got {0}")]
    NegativeAmplitude(f64),

    #[error("spectrum bin count must be positive")]
    ZeroSpectrumBins,

    #[error("unrecognized waveform kind: {0}")]
    UnknownWaveform(String),
}

/// Parameters for a transmit-only controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxRadioConfig {
    /// Center frequency of the transmitted band, in Hz.
    pub center_freq_hz: f64,
    /// Transmit gain in dB.
    pub gain_db: f64,
    /// Signal bandwidth in Hz.
    pub bandwidth_hz: f64,
    /// Signal source amplitude, 0 (off) to 1 (full scale).
    pub source_amplitude: f64,
    /// Waveform the signal source generates.
    pub waveform: Waveform,
}

impl TxRadioConfig {
    /// Check the physical parameters. Nothing is constructed on failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.center_freq_hz <= 0.0 {
            return Err(ConfigError::NonPositiveFrequency(self.center_freq_hz));
        }
        if self.gain_db < 0.0 {
            return Err(ConfigError::NegativeGain(self.gain_db));
        }
        if self.bandwidth_hz <= 0.0 {
            return Err(ConfigError::NonPositiveBandwidth(self.bandwidth_hz));
        }
        if self.source_amplitude < 0.0 {
            return Err(ConfigError::NegativeAmplitude(self.source_amplitude));
        }
        Ok(())
    }
}

/// Parameters for a receive-only controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RxRadioConfig {
    /// Center frequency of the sensed band, in Hz.
    pub center_freq_hz: f64,
    /// Receive gain in dB.
    pub gain_db: f64,
    /// Receive bandwidth in Hz.
    pub bandwidth_hz: f64,
    /// Number of FFT power bins the spectrum probe reports.
    pub spectrum_bins: usize,
}

impl RxRadioConfig {
    /// Config with the default probe depth of [`DEFAULT_SPECTRUM_BINS`].
    #[must_use]
    pub fn new(center_freq_hz: f64, gain_db: f64, bandwidth_hz: f64) -> Self {
        Self {
            center_freq_hz,
            gain_db,
            bandwidth_hz,
            spectrum_bins: DEFAULT_SPECTRUM_BINS,
        }
    }

    /// Override the spectrum probe depth.
    #[must_use]
    pub fn with_spectrum_bins(mut self, bins: usize) -> Self {
        self.spectrum_bins = bins;
        self
    }

    /// Check the physical parameters. Nothing is constructed on failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.center_freq_hz <= 0.0 {
            return Err(ConfigError::NonPositiveFrequency(self.center_freq_hz));
        }
        if self.gain_db < 0.0 {
            return Err(ConfigError::NegativeGain(self.gain_db));
        }
        if self.bandwidth_hz <= 0.0 {
            return Err(ConfigError::NonPositiveBandwidth(self.bandwidth_hz));
        }
        if self.spectrum_bins == 0 {
            return Err(ConfigError::ZeroSpectrumBins);
        }
        Ok(())
    }
}

/// Transmit-chain parameters of a combined TX/RX controller.
///
/// The combined controller feeds its transmit chain from a noise source, so
/// unlike [`TxRadioConfig`] there is no waveform to pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxChainConfig {
    /// Center frequency of the transmitted band, in Hz.
    pub center_freq_hz: f64,
    /// Transmit gain in dB.
    pub gain_db: f64,
    /// Signal bandwidth in Hz.
    pub bandwidth_hz: f64,
    /// Signal source amplitude, 0 (off) to 1 (full scale).
    pub source_amplitude: f64,
}

/// Parameters for a combined TX/RX controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxRxRadioConfig {
    /// Transmit chain.
    pub tx: TxChainConfig,
    /// Receive chain.
    pub rx: RxRadioConfig,
}

impl TxRxRadioConfig {
    /// Apply the clamping policy to the transmit chain.
    ///
    /// Gain is pulled into `[TX_GAIN_MIN_DB, TX_GAIN_MAX_DB]` and source
    /// amplitude into `[SOURCE_AMPLITUDE_MIN, SOURCE_AMPLITUDE_MAX]`.
    /// Out-of-range values are common caller mistakes (percentage-style or
    /// unscaled input), so they are clamped to the nearest bound and logged,
    /// never rejected.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        if self.tx.gain_db > TX_GAIN_MAX_DB {
            warn!(
                requested_db = self.tx.gain_db,
                limit_db = TX_GAIN_MAX_DB,
                "tx gain exceeds hardware limit, clamping"
            );
            self.tx.gain_db = TX_GAIN_MAX_DB;
        } else if self.tx.gain_db < TX_GAIN_MIN_DB {
            warn!(
                requested_db = self.tx.gain_db,
                limit_db = TX_GAIN_MIN_DB,
                "tx gain below hardware minimum, clamping"
            );
            self.tx.gain_db = TX_GAIN_MIN_DB;
        }

        if self.tx.source_amplitude > SOURCE_AMPLITUDE_MAX {
            warn!(
                requested = self.tx.source_amplitude,
                limit = SOURCE_AMPLITUDE_MAX,
                "source amplitude exceeds full scale, clamping"
            );
            self.tx.source_amplitude = SOURCE_AMPLITUDE_MAX;
        } else if self.tx.source_amplitude < SOURCE_AMPLITUDE_MIN {
            warn!(
                requested = self.tx.source_amplitude,
                limit = SOURCE_AMPLITUDE_MIN,
                "source amplitude below zero, clamping to off"
            );
            self.tx.source_amplitude = SOURCE_AMPLITUDE_MIN;
        }

        self
    }

    /// Check the physical parameters of both chains.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tx.center_freq_hz <= 0.0 {
            return Err(ConfigError::NonPositiveFrequency(self.tx.center_freq_hz));
        }
        if self.tx.gain_db < 0.0 {
            return Err(ConfigError::NegativeGain(self.tx.gain_db));
        }
        if self.tx.bandwidth_hz <= 0.0 {
            return Err(ConfigError::NonPositiveBandwidth(self.tx.bandwidth_hz));
        }
        if self.tx.source_amplitude < 0.0 {
            return Err(ConfigError::NegativeAmplitude(self.tx.source_amplitude));
        }
        self.rx.validate()
    }
}

/// Optional-field update set for a transmit chain.
///
/// Fields left `None` are not forwarded to the controller and keep their
/// current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TxTuning {
    pub center_freq_hz: Option<f64>,
    pub bandwidth_hz: Option<f64>,
    pub gain_db: Option<f64>,
    pub source_amplitude: Option<f64>,
    pub waveform: Option<Waveform>,
}

impl TxTuning {
    #[must_use]
    pub fn with_center_frequency(mut self, hz: f64) -> Self {
        self.center_freq_hz = Some(hz);
        self
    }

    #[must_use]
    pub fn with_bandwidth(mut self, hz: f64) -> Self {
        self.bandwidth_hz = Some(hz);
        self
    }

    #[must_use]
    pub fn with_gain(mut self, db: f64) -> Self {
        self.gain_db = Some(db);
        self
    }

    #[must_use]
    pub fn with_source_amplitude(mut self, amplitude: f64) -> Self {
        self.source_amplitude = Some(amplitude);
        self
    }

    #[must_use]
    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = Some(waveform);
        self
    }

    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Optional-field update set for a receive chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RxTuning {
    pub center_freq_hz: Option<f64>,
    pub bandwidth_hz: Option<f64>,
    pub gain_db: Option<f64>,
}

impl RxTuning {
    #[must_use]
    pub fn with_center_frequency(mut self, hz: f64) -> Self {
        self.center_freq_hz = Some(hz);
        self
    }

    #[must_use]
    pub fn with_bandwidth(mut self, hz: f64) -> Self {
        self.bandwidth_hz = Some(hz);
        self
    }

    #[must_use]
    pub fn with_gain(mut self, db: f64) -> Self {
        self.gain_db = Some(db);
        self
    }

    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
